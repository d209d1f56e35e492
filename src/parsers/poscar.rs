//! # VASP POSCAR 格式读写
//!
//! 读取 POSCAR/CONTCAR 作为工作流的母结构，
//! 也用于把生成的超胞和扰动结构导出检查。
//!
//! ```text
//! Comment line (structure name)
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vector a
//! b1 b2 b3               # lattice vector b
//! c1 c2 c3               # lattice vector c
//! Element1 Element2 ...  # element symbols (VASP 5+)
//! n1 n2 ...              # number of atoms per element
//! Selective dynamics     # optional
//! Direct/Cartesian       # coordinate type
//! x1 y1 z1               # atom positions
//! ```
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs`、`commands/csld.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{FlowError, Result};
use crate::models::{Atom, Crystal, Lattice};

use std::fs;
use std::path::Path;

/// 解析 POSCAR/CONTCAR 文件
pub fn parse_poscar_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| FlowError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    parse_poscar_content(&content, stem).map_err(|e| match e {
        FlowError::ParseError { format, reason, .. } => FlowError::ParseError {
            format,
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// 从字符串内容解析 POSCAR 格式
///
/// 只接受 VASP 5 及以上带元素行的格式：工作流的化学式需要真实元素符号。
pub fn parse_poscar_content(content: &str, default_name: &str) -> Result<Crystal> {
    let fail = |reason: String| FlowError::ParseError {
        format: "poscar".to_string(),
        path: default_name.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(fail("File too short".to_string()));
    }

    let name = match lines[0].trim() {
        "" => default_name.to_string(),
        comment => comment.to_string(),
    };

    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| fail(format!("Invalid scaling factor '{}'", lines[1].trim())))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let v = parse_vector(lines[2 + i])
            .ok_or_else(|| fail(format!("Invalid lattice vector at line {}", 3 + i)))?;
        *row = v.map(|x| x * scale);
    }
    let lattice = Lattice::from_vectors(matrix);

    let elements: Vec<&str> = lines[5].split_whitespace().collect();
    if elements.is_empty() || elements[0].parse::<usize>().is_ok() {
        return Err(fail(
            "Missing element symbol line (VASP 4 format is not supported)".to_string(),
        ));
    }
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|s| s.parse())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| fail(format!("Invalid atom counts '{}'", lines[6].trim())))?;
    if counts.len() != elements.len() {
        return Err(fail(format!(
            "{} element symbols but {} counts",
            elements.len(),
            counts.len()
        )));
    }

    let mut coord_line = 7;
    if lines[coord_line].trim().to_lowercase().starts_with('s') {
        coord_line += 1;
    }
    let coord_type = lines
        .get(coord_line)
        .ok_or_else(|| fail("Missing coordinate type line".to_string()))?
        .trim()
        .to_lowercase();
    let is_cartesian = coord_type.starts_with('c') || coord_type.starts_with('k');

    let mut positions = lines[coord_line + 1..].iter();
    let mut atoms = Vec::with_capacity(counts.iter().sum());
    for (elem, &count) in elements.iter().zip(&counts) {
        for _ in 0..count {
            let v = positions
                .next()
                .and_then(|l| parse_vector(l))
                .ok_or_else(|| {
                    fail(format!(
                        "Expected {} positions",
                        counts.iter().sum::<usize>()
                    ))
                })?;
            let position = if is_cartesian {
                lattice.cart_to_frac(v.map(|x| x * scale))
            } else {
                v
            };
            atoms.push(Atom::new(*elem, position));
        }
    }

    Ok(Crystal::new(name, lattice, atoms))
}

fn parse_vector(line: &str) -> Option<[f64; 3]> {
    let mut parts = line.split_whitespace().map(|s| s.parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some([x, y, z]),
        _ => None,
    }
}

/// 将 Crystal 转换为 POSCAR 格式字符串（元素按首次出现顺序分组）
pub fn to_poscar_string(crystal: &Crystal) -> String {
    let mut groups: Vec<(&str, Vec<[f64; 3]>)> = Vec::new();
    for atom in &crystal.atoms {
        match groups.iter_mut().find(|(el, _)| *el == atom.element) {
            Some((_, positions)) => positions.push(atom.position),
            None => groups.push((atom.element.as_str(), vec![atom.position])),
        }
    }

    let mut out = format!("{}\n1.0\n", crystal.name);
    for row in &crystal.lattice.matrix {
        out.push_str(&format!(
            "  {:16.10}  {:16.10}  {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }

    let symbols: Vec<&str> = groups.iter().map(|(el, _)| *el).collect();
    let counts: Vec<String> = groups.iter().map(|(_, p)| p.len().to_string()).collect();
    out.push_str(&format!("   {}\n", symbols.join("   ")));
    out.push_str(&format!("   {}\n", counts.join("   ")));
    out.push_str("Direct\n");

    for (_, positions) in &groups {
        for p in positions {
            out.push_str(&format!("  {:16.10}  {:16.10}  {:16.10}\n", p[0], p[1], p[2]));
        }
    }
    out
}

/// 写出 POSCAR 文件
pub fn write_poscar_file(crystal: &Crystal, path: &Path) -> Result<()> {
    fs::write(path, to_poscar_string(crystal)).map_err(|e| FlowError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SI: &str = r#"Si2
1.0
3.8401979337 0.00 0.00
1.9200989668 3.3257101909 0.00
0.00 -2.2171384943 3.1355090603
Si
2
Direct
0.0 0.0 0.0
0.75 0.5 0.75
"#;

    #[test]
    fn test_parse_poscar() {
        let crystal = parse_poscar_content(SI, "fallback").unwrap();
        assert_eq!(crystal.name, "Si2");
        assert_eq!(crystal.num_sites(), 2);
        assert_eq!(crystal.reduced_formula(), "Si");
        assert_eq!(crystal.atoms[1].position, [0.75, 0.5, 0.75]);
    }

    #[test]
    fn test_parse_cartesian_with_scale_and_selective() {
        let content = r#"Fe
2.0
1.435 0.0 0.0
0.0 1.435 0.0
0.0 0.0 1.435
Fe
2
Selective dynamics
Cartesian
0.0 0.0 0.0 T T T
0.7175 0.7175 0.7175 F F F
"#;
        let crystal = parse_poscar_content(content, "Fe").unwrap();
        let (a, _, _, _, _, _) = crystal.lattice.parameters();
        assert!((a - 2.87).abs() < 1e-9);
        for x in crystal.atoms[1].position {
            assert!((x - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_vasp4_and_short_files() {
        let vasp4 = SI.replace("Si\n2\n", "2\n");
        assert!(parse_poscar_content(&vasp4, "x").is_err());
        assert!(parse_poscar_content("Si\n1.0\n", "x").is_err());

        let missing_atom = SI.replace("0.75 0.5 0.75\n", "");
        assert!(parse_poscar_content(&missing_atom, "x").is_err());
    }

    #[test]
    fn test_written_poscar_reads_back() {
        let crystal = parse_poscar_content(SI, "x").unwrap();
        let reread = parse_poscar_content(&to_poscar_string(&crystal), "y").unwrap();

        assert_eq!(reread.formula(), crystal.formula());
        for (a, b) in reread.atoms.iter().zip(&crystal.atoms) {
            for k in 0..3 {
                assert!((a.position[k] - b.position[k]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_file_errors_carry_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("POSCAR");
        fs::write(&path, "broken\n").unwrap();

        match parse_poscar_file(&path) {
            Err(FlowError::ParseError { path: p, .. }) => assert!(p.ends_with("POSCAR")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}

//! # 超胞构建
//!
//! 沿三个晶格向量做对角扩胞，使每个方向的面间距至少覆盖
//! `num_nn_dists` 个最近邻距离，同时满足原子数上下限。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{FlowError, Result};
use crate::models::{Atom, Crystal};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// 单个方向扩胞倍数上限
const MAX_SCALE: u32 = 1000;

/// 超胞原子数上限，未给出 `max_atoms` 时同样生效
const MAX_SUPERCELL_SITES: usize = 1_000_000;

/// 超胞尺寸约束
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSupercell {
    pub min_atoms: Option<usize>,
    pub max_atoms: Option<usize>,
    /// 超胞宽度以最近邻距离为单位的下限
    pub num_nn_dists: f64,
}

impl Default for CubicSupercell {
    fn default() -> Self {
        CubicSupercell {
            min_atoms: None,
            max_atoms: None,
            num_nn_dists: 5.0,
        }
    }
}

/// 超胞变换信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupercellInfo {
    /// 沿 a, b, c 的扩胞倍数
    pub scaling: [u32; 3],
}

impl SupercellInfo {
    /// 整数变换矩阵（对角）
    pub fn transformation_matrix(&self) -> [[i32; 3]; 3] {
        let [a, b, c] = self.scaling.map(|n| n as i32);
        [[a, 0, 0], [0, b, 0], [0, 0, c]]
    }

    pub fn num_cells(&self) -> usize {
        self.scaling.iter().map(|&n| n as usize).product()
    }
}

impl CubicSupercell {
    /// 构建超胞，约束无法满足时返回 `ValidationError`
    pub fn apply(&self, parent: &Crystal) -> Result<(Crystal, SupercellInfo)> {
        let scaling = self.find_scaling(parent)?;
        let info = SupercellInfo { scaling };
        let supercell = replicate(parent, scaling);

        debug!(
            scaling = ?scaling,
            sites = supercell.num_sites(),
            "built supercell of {}",
            parent.name
        );
        Ok((supercell, info))
    }

    fn find_scaling(&self, parent: &Crystal) -> Result<[u32; 3]> {
        if !(self.num_nn_dists > 0.0) {
            return Err(FlowError::ValidationError(format!(
                "num_nn_dists must be positive, got {}",
                self.num_nn_dists
            )));
        }
        if let (Some(min), Some(max)) = (self.min_atoms, self.max_atoms) {
            if min > max {
                return Err(FlowError::ValidationError(format!(
                    "min_atoms ({}) exceeds max_atoms ({})",
                    min, max
                )));
            }
        }

        let nn_dist = parent.nearest_neighbor_distance().ok_or_else(|| {
            FlowError::ValidationError(format!("structure '{}' has no atoms", parent.name))
        })?;

        let target = self.num_nn_dists * nn_dist;
        let spacings = parent.lattice.plane_spacings();
        let mut scaling = [1u32; 3];
        for (n, &d) in scaling.iter_mut().zip(spacings.iter()) {
            let scale = ((target / d) - 1e-8).ceil().max(1.0);
            if !scale.is_finite() || scale > MAX_SCALE as f64 {
                return Err(FlowError::ValidationError(format!(
                    "spanning {} nearest-neighbour distances ({:.3} Å) in '{}' needs a \
                     scaling above {} along one axis",
                    self.num_nn_dists, target, parent.name, MAX_SCALE
                )));
            }
            *n = scale as u32;
        }

        let sites_per_cell = parent.num_sites();
        let too_large = |s: &[u32; 3]| {
            FlowError::ValidationError(format!(
                "supercell {:?} of '{}' would exceed {} atoms",
                s, parent.name, MAX_SUPERCELL_SITES
            ))
        };
        let count = |s: &[u32; 3]| {
            s.iter()
                .try_fold(sites_per_cell, |acc, &n| acc.checked_mul(n as usize))
                .filter(|&total| total <= MAX_SUPERCELL_SITES)
                .ok_or_else(|| too_large(s))
        };
        count(&scaling)?;

        if let Some(min_atoms) = self.min_atoms {
            if min_atoms > MAX_SUPERCELL_SITES {
                return Err(FlowError::ValidationError(format!(
                    "min_atoms ({}) exceeds the supported limit of {} atoms",
                    min_atoms, MAX_SUPERCELL_SITES
                )));
            }
            while count(&scaling)? < min_atoms {
                // 加宽当前最窄的方向
                let narrowest = (0..3)
                    .min_by(|&i, &j| {
                        let wi = spacings[i] * scaling[i] as f64;
                        let wj = spacings[j] * scaling[j] as f64;
                        wi.total_cmp(&wj)
                    })
                    .unwrap_or(0);
                scaling[narrowest] += 1;
            }
        }

        if let Some(max_atoms) = self.max_atoms {
            let total = count(&scaling)?;
            if total > max_atoms {
                return Err(FlowError::ValidationError(format!(
                    "no supercell of '{}' with at most {} atoms spans {} nearest-neighbour \
                     distances ({:.3} Å); smallest candidate {:?} has {} atoms",
                    parent.name,
                    max_atoms,
                    self.num_nn_dists,
                    target,
                    scaling,
                    total
                )));
            }
        }

        Ok(scaling)
    }
}

/// 对角扩胞：每个原子复制到所有 `scaling` 平移后的位置
///
/// `scaling` 须已经过 `find_scaling` 的原子数上限检查。
fn replicate(parent: &Crystal, scaling: [u32; 3]) -> Crystal {
    let [na, nb, nc] = scaling;
    let cells = SupercellInfo { scaling }.num_cells();
    let mut atoms = Vec::with_capacity(parent.num_sites() * cells);

    for atom in &parent.atoms {
        for i in 0..na {
            for j in 0..nb {
                for k in 0..nc {
                    let position = [
                        (atom.position[0] + i as f64) / na as f64,
                        (atom.position[1] + j as f64) / nb as f64,
                        (atom.position[2] + k as f64) / nc as f64,
                    ];
                    atoms.push(Atom::new(atom.element.clone(), position));
                }
            }
        }
    }

    Crystal::new(
        format!("{} supercell", parent.name),
        parent.lattice.scaled(scaling),
        atoms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Lattice;

    fn simple_cubic(a: f64) -> Crystal {
        let lattice = Lattice::from_parameters(a, a, a, 90.0, 90.0, 90.0);
        Crystal::new("Po", lattice, vec![Atom::new("Po", [0.0, 0.0, 0.0])])
    }

    #[test]
    fn test_scaling_covers_nn_distances() {
        let transform = CubicSupercell {
            num_nn_dists: 3.0,
            ..Default::default()
        };
        let (supercell, info) = transform.apply(&simple_cubic(3.0)).unwrap();

        assert_eq!(info.scaling, [3, 3, 3]);
        assert_eq!(info.num_cells(), 27);
        assert_eq!(supercell.num_sites(), 27);
        assert_eq!(supercell.reduced_formula(), "Po");
        assert!((supercell.lattice.volume() - 729.0).abs() < 1e-6);
        assert_eq!(info.transformation_matrix(), [[3, 0, 0], [0, 3, 0], [0, 0, 3]]);
    }

    #[test]
    fn test_min_atoms_grows_cell() {
        let transform = CubicSupercell {
            min_atoms: Some(10),
            num_nn_dists: 1.0,
            ..Default::default()
        };
        let (supercell, info) = transform.apply(&simple_cubic(3.0)).unwrap();
        assert!(supercell.num_sites() >= 10);
        assert_eq!(supercell.num_sites(), info.num_cells());
    }

    #[test]
    fn test_max_atoms_unsatisfiable() {
        let transform = CubicSupercell {
            max_atoms: Some(8),
            num_nn_dists: 5.0,
            ..Default::default()
        };
        let err = transform.apply(&simple_cubic(3.0)).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_constraints() {
        let inverted = CubicSupercell {
            min_atoms: Some(100),
            max_atoms: Some(10),
            ..Default::default()
        };
        assert!(inverted.apply(&simple_cubic(3.0)).is_err());

        let lattice = Lattice::from_parameters(3.0, 3.0, 3.0, 90.0, 90.0, 90.0);
        let empty = Crystal::new("empty", lattice, vec![]);
        assert!(CubicSupercell::default().apply(&empty).is_err());
    }

    #[test]
    fn test_oversized_supercell_is_rejected() {
        let wide = CubicSupercell {
            num_nn_dists: 5000.0,
            ..Default::default()
        };
        let err = wide.apply(&simple_cubic(3.0)).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));

        // 单方向倍数在上限内，但总原子数超限
        let bulky = CubicSupercell {
            num_nn_dists: 500.0,
            ..Default::default()
        };
        assert!(matches!(
            bulky.apply(&simple_cubic(3.0)),
            Err(FlowError::ValidationError(_))
        ));

        let crowded = CubicSupercell {
            min_atoms: Some(usize::MAX),
            num_nn_dists: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            crowded.apply(&simple_cubic(3.0)),
            Err(FlowError::ValidationError(_))
        ));
    }

    #[test]
    fn test_replicated_positions_stay_in_cell() {
        let transform = CubicSupercell {
            num_nn_dists: 2.0,
            ..Default::default()
        };
        let (supercell, _) = transform.apply(&simple_cubic(3.0)).unwrap();
        for atom in &supercell.atoms {
            for x in atom.position {
                assert!((0.0..1.0).contains(&x));
            }
        }
    }
}

//! # 随机位点扰动
//!
//! 对超胞中所有原子施加随机位移，生成一组用于计算受力的扰动结构。
//!
//! 位移幅度在 `[min_displacement, max_displacement]` 上等间距取
//! `num_displacements` 个值，每个幅度生成 `supercells_per_displacement_distance`
//! 个结构。第 i 个结构使用种子 `seed + i` 的独立随机数发生器，
//! 因此给定种子时输出与并行度无关、完全确定。
//!
//! ## 依赖关系
//! - 被 `workflow/csld.rs` 使用
//! - 使用 `rand` 采样、`rayon` 并行生成

use crate::error::{FlowError, Result};
use crate::models::{Atom, Crystal};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 带有自身位移幅度的扰动结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedStructure {
    /// 生成顺序中的位置
    pub index: usize,
    /// 位移幅度 (Å)
    pub displacement: f64,
    pub structure: Crystal,
}

/// 扰动参数
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbSites {
    pub min_displacement: f64,
    pub max_displacement: f64,
    pub num_displacements: usize,
    pub supercells_per_displacement_distance: usize,
    /// 设置后每个原子的位移长度在 `[min_random_distance, 幅度]` 上均匀采样
    pub min_random_distance: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for PerturbSites {
    fn default() -> Self {
        PerturbSites {
            min_displacement: 0.01,
            max_displacement: 0.1,
            num_displacements: 10,
            supercells_per_displacement_distance: 1,
            min_random_distance: None,
            seed: None,
        }
    }
}

impl PerturbSites {
    /// 所有结构的位移幅度（已按每幅度样本数重复）
    pub fn displacements(&self) -> Vec<f64> {
        let n = self.num_displacements;
        let step = if n > 1 {
            (self.max_displacement - self.min_displacement) / (n - 1) as f64
        } else {
            0.0
        };

        (0..n)
            .map(|i| self.min_displacement + step * i as f64)
            .flat_map(|d| std::iter::repeat(d).take(self.supercells_per_displacement_distance))
            .collect()
    }

    /// 校验参数
    pub fn validate(&self) -> Result<()> {
        if self.num_displacements == 0 || self.supercells_per_displacement_distance == 0 {
            return Err(FlowError::ValidationError(
                "perturbation would produce no structures".to_string(),
            ));
        }
        if !(self.min_displacement >= 0.0) || !(self.max_displacement >= self.min_displacement) {
            return Err(FlowError::ValidationError(format!(
                "displacement bounds must satisfy 0 <= min <= max, got [{}, {}]",
                self.min_displacement, self.max_displacement
            )));
        }
        if let Some(d) = self.min_random_distance {
            if !(d >= 0.0) || d > self.min_displacement {
                return Err(FlowError::ValidationError(format!(
                    "min_random_distance ({}) must lie in [0, min_displacement = {}]",
                    d, self.min_displacement
                )));
            }
        }
        Ok(())
    }

    /// 生成扰动结构，返回实际使用的种子
    pub fn apply(&self, base: &Crystal) -> Result<(Vec<DerivedStructure>, u64)> {
        self.validate()?;

        let seed = self.seed.unwrap_or_else(rand::random);
        let displacements = self.displacements();
        debug!(
            count = displacements.len(),
            seed, "perturbing sites of {}", base.name
        );

        let derived = displacements
            .into_par_iter()
            .enumerate()
            .map(|(index, displacement)| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
                DerivedStructure {
                    index,
                    displacement,
                    structure: self.perturb(base, displacement, index, &mut rng),
                }
            })
            .collect();

        Ok((derived, seed))
    }

    fn perturb(&self, base: &Crystal, magnitude: f64, index: usize, rng: &mut StdRng) -> Crystal {
        let atoms = base
            .atoms
            .iter()
            .map(|atom| {
                let length = match self.min_random_distance {
                    Some(lo) if magnitude > lo => rng.gen_range(lo..=magnitude),
                    _ => magnitude,
                };
                let dir = random_unit_vector(rng);
                let cart = base.lattice.frac_to_cart(atom.position);
                let moved = [
                    cart[0] + dir[0] * length,
                    cart[1] + dir[1] * length,
                    cart[2] + dir[2] * length,
                ];
                Atom::new(atom.element.clone(), base.lattice.cart_to_frac(moved))
            })
            .collect();

        Crystal::new(
            format!("{} perturbed {}", base.name, index),
            base.lattice.clone(),
            atoms,
        )
    }
}

/// 单位球内拒绝采样后归一化
fn random_unit_vector(rng: &mut StdRng) -> [f64; 3] {
    loop {
        let v: [f64; 3] = [
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        ];
        let n2 = v[0] * v[0] + v[1] * v[1] + v[2] * v[2];
        if n2 > 1e-12 && n2 <= 1.0 {
            let n = n2.sqrt();
            return [v[0] / n, v[1] / n, v[2] / n];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::structure::norm;
    use crate::models::Lattice;

    fn base() -> Crystal {
        let lattice = Lattice::from_parameters(5.43, 5.43, 5.43, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Si", [0.0, 0.0, 0.0]),
            Atom::new("Si", [0.25, 0.25, 0.25]),
            Atom::new("Si", [0.5, 0.5, 0.0]),
        ];
        Crystal::new("Si", lattice, atoms)
    }

    /// 原子 i 的笛卡尔位移长度
    fn displacement_of(base: &Crystal, moved: &Crystal, i: usize) -> f64 {
        let a = base.lattice.frac_to_cart(base.atoms[i].position);
        let b = moved.lattice.frac_to_cart(moved.atoms[i].position);
        norm([b[0] - a[0], b[1] - a[1], b[2] - a[2]])
    }

    #[test]
    fn test_displacements_linspace_and_repeat() {
        let params = PerturbSites {
            min_displacement: 0.01,
            max_displacement: 0.05,
            num_displacements: 3,
            supercells_per_displacement_distance: 2,
            ..Default::default()
        };
        let d = params.displacements();
        assert_eq!(d.len(), 6);
        assert!((d[0] - 0.01).abs() < 1e-12 && (d[1] - 0.01).abs() < 1e-12);
        assert!((d[2] - 0.03).abs() < 1e-12);
        assert!((d[5] - 0.05).abs() < 1e-12);

        let single = PerturbSites {
            num_displacements: 1,
            ..Default::default()
        };
        assert_eq!(single.displacements(), vec![0.01]);
    }

    #[test]
    fn test_count_order_and_exact_magnitudes() {
        let params = PerturbSites {
            num_displacements: 4,
            supercells_per_displacement_distance: 2,
            seed: Some(7),
            ..Default::default()
        };
        let base = base();
        let (derived, seed) = params.apply(&base).unwrap();

        assert_eq!(seed, 7);
        assert_eq!(derived.len(), 8);
        for (i, d) in derived.iter().enumerate() {
            assert_eq!(d.index, i);
            assert!(d.displacement >= 0.01 - 1e-12 && d.displacement <= 0.1 + 1e-12);
            assert_eq!(d.structure.num_sites(), base.num_sites());
            for atom in 0..base.num_sites() {
                let moved = displacement_of(&base, &d.structure, atom);
                assert!((moved - d.displacement).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let params = PerturbSites {
            num_displacements: 3,
            seed: Some(42),
            ..Default::default()
        };
        let (a, _) = params.apply(&base()).unwrap();
        let (b, _) = params.apply(&base()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_min_random_distance_bounds() {
        let params = PerturbSites {
            min_displacement: 0.02,
            max_displacement: 0.1,
            num_displacements: 5,
            min_random_distance: Some(0.01),
            seed: Some(3),
            ..Default::default()
        };
        let base = base();
        let (derived, _) = params.apply(&base).unwrap();
        for d in &derived {
            for atom in 0..base.num_sites() {
                let moved = displacement_of(&base, &d.structure, atom);
                assert!(moved >= 0.01 - 1e-9 && moved <= d.displacement + 1e-9);
            }
        }
    }

    #[test]
    fn test_invalid_params() {
        let empty = PerturbSites {
            num_displacements: 0,
            ..Default::default()
        };
        assert!(matches!(
            empty.apply(&base()),
            Err(FlowError::ValidationError(_))
        ));

        let inverted = PerturbSites {
            min_displacement: 0.2,
            max_displacement: 0.1,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let too_far = PerturbSites {
            min_random_distance: Some(0.05),
            ..Default::default()
        };
        assert!(too_far.validate().is_err());
    }
}

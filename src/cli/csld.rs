//! # csld 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/csld.rs`

use super::common::{OutputArgs, RunConfigArgs};

use clap::Args;
use std::path::PathBuf;

/// csld 子命令参数
#[derive(Args, Debug)]
pub struct CsldArgs {
    /// Parent structure (POSCAR/CONTCAR/*.vasp or Crystal JSON)
    #[arg(short, long)]
    pub structure: PathBuf,

    // ─────────────────────────────────────────────────────────────
    // Supercell options
    // ─────────────────────────────────────────────────────────────
    /// Minimum number of atoms in the supercell
    #[arg(long)]
    pub min_atoms: Option<usize>,

    /// Maximum number of atoms in the supercell
    #[arg(long)]
    pub max_atoms: Option<usize>,

    /// Minimum supercell width in nearest-neighbour distances
    #[arg(long, default_value_t = 5.0)]
    pub num_nn_dists: f64,

    // ─────────────────────────────────────────────────────────────
    // Perturbation options
    // ─────────────────────────────────────────────────────────────
    /// Smallest displacement magnitude (Å)
    #[arg(long, default_value_t = 0.01)]
    pub min_displacement: f64,

    /// Largest displacement magnitude (Å)
    #[arg(long, default_value_t = 0.1)]
    pub max_displacement: f64,

    /// Number of displacement magnitudes
    #[arg(long, default_value_t = 10)]
    pub num_displacements: usize,

    /// Perturbed supercells per displacement magnitude
    #[arg(long, default_value_t = 1)]
    pub supercells_per_displacement: usize,

    /// Draw each site's displacement length from [this, magnitude]
    #[arg(long)]
    pub min_random_distance: Option<f64>,

    /// Random seed; drawn from the OS and reported if omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of parallel jobs for generating perturbations (0 = auto)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub jobs: usize,

    /// Export the supercell and perturbed structures as POSCAR files
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunConfigArgs,

    #[command(flatten)]
    pub out: OutputArgs,
}

//! # csld 命令实现
//!
//! 读取母结构 -> 扩胞 -> 扰动 -> 组装工作流 -> 保存/提交。
//!
//! ## 依赖关系
//! - 使用 `cli/csld.rs` 定义的参数
//! - 使用 `parsers/`、`transform/`、`workflow/csld.rs`、`utils/output.rs`

use crate::cli::csld::CsldArgs;
use crate::error::{FlowError, Result};
use crate::parsers::{self, poscar};
use crate::transform::{CubicSupercell, PerturbSites};
use crate::utils::output;
use crate::workflow::{CsldSettings, CsldWorkflow};

use std::fs;
use std::path::Path;
use tracing::debug;

/// 执行 csld 命令
pub fn execute(args: CsldArgs) -> Result<()> {
    output::print_header("Compressed Sensing Lattice Dynamics Workflow");

    let config = super::resolve_run_config(&args.run)?;
    let parent = parsers::parse_structure_file(&args.structure)?;
    output::print_info(&format!(
        "Loaded '{}' ({}, {} sites)",
        parent.name,
        parent.formula(),
        parent.num_sites()
    ));

    let settings = CsldSettings {
        supercell: CubicSupercell {
            min_atoms: args.min_atoms,
            max_atoms: args.max_atoms,
            num_nn_dists: args.num_nn_dists,
        },
        perturbation: PerturbSites {
            min_displacement: args.min_displacement,
            max_displacement: args.max_displacement,
            num_displacements: args.num_displacements,
            supercells_per_displacement_distance: args.supercells_per_displacement,
            min_random_distance: args.min_random_distance,
            seed: args.seed,
        },
    };

    // 配置 rayon 线程池
    let mut pool = rayon::ThreadPoolBuilder::new();
    if args.jobs > 0 {
        pool = pool.num_threads(args.jobs);
    }
    let pool = pool
        .build()
        .map_err(|e| FlowError::InvalidArgument(format!("thread pool: {}", e)))?;
    let csld = pool.install(|| CsldWorkflow::new(parent, &settings))?;

    let (a, b, c, _, _, _) = csld.supercell().lattice.parameters();
    output::print_info(&format!(
        "Supercell {:?} ({} cells, {} sites), a={:.3} b={:.3} c={:.3}",
        csld.trans_info().scaling,
        csld.trans_info().num_cells(),
        csld.supercell().num_sites(),
        a,
        b,
        c
    ));
    output::print_info(&format!(
        "Generated {} perturbed supercells (seed {})",
        csld.derived().len(),
        csld.seed().map_or_else(|| "-".to_string(), |s| s.to_string())
    ));

    if let Some(dir) = &args.export_dir {
        export_structures(&csld, dir)?;
        output::print_success(&format!("Structures exported to '{}'", dir.display()));
    }

    let workflow = csld.get_wf(&config)?;
    debug!(wf_uuid = csld.uuid(), "csld workflow assembled");
    output::print_separator();
    super::emit_workflow(workflow, &args.out)?;

    output::print_done("Workflow ready for submission");
    Ok(())
}

/// 导出超胞与所有扰动结构为 POSCAR
fn export_structures(csld: &CsldWorkflow, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| FlowError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    poscar::write_poscar_file(csld.supercell(), &dir.join("POSCAR_supercell"))?;
    for derived in csld.derived() {
        let path = dir.join(format!(
            "POSCAR_{:03}_disp{:.3}",
            derived.index, derived.displacement
        ));
        poscar::write_poscar_file(&derived.structure, &path)?;
    }
    Ok(())
}

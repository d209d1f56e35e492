//! # 压缩感知晶格动力学 (CSLD) 工作流
//!
//! 流程：
//! 1. 母结构扩胞
//! 2. 对超胞做随机位点扰动，得到一组扰动超胞
//! 3. 每个扰动超胞一条静态计算分支（写输入 -> VASP -> 入库）
//! 4. 单个聚合任务等待所有分支完成，汇总受力拟合力常数并入库
//!
//! 聚合任务的父任务恰好是各分支的末端任务，顺序与扰动结构的生成顺序一致；
//! 每条受力样本自带位移幅度，不依赖与父任务列表的位置对应。
//!
//! ## 依赖关系
//! - 被 `commands/csld.rs` 使用
//! - 使用 `transform/`、`tasks/`、`workflow/builder.rs`、`workflow/tagger.rs`

use crate::config::RunConfig;
use crate::error::{FlowError, Result};
use crate::models::{Crystal, ForceSample, TaskAction, TaskDraft, Workflow};
use crate::tasks::TaskFactory;
use crate::transform::{CubicSupercell, DerivedStructure, PerturbSites, SupercellInfo};
use crate::workflow::{MetadataTagger, WorkflowBuilder};

use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

/// 工作流类型名，写入 `wf_meta`
pub const CSLD_WF_NAME: &str = "CompressedSensingLatticeDynamicsWF";

/// 聚合任务名
pub const CSLD_TASK_NAME: &str = "Compressed Sensing Lattice Dynamics";

/// 扩胞与扰动参数
#[derive(Debug, Clone, Default)]
pub struct CsldSettings {
    pub supercell: CubicSupercell,
    pub perturbation: PerturbSites,
}

/// 已完成结构准备的 CSLD 工作流
#[derive(Debug, Clone)]
pub struct CsldWorkflow {
    uuid: String,
    parent: Crystal,
    supercell: Crystal,
    trans_info: SupercellInfo,
    derived: Vec<DerivedStructure>,
    seed: Option<u64>,
}

impl CsldWorkflow {
    /// 对母结构扩胞、扰动
    pub fn new(parent: Crystal, settings: &CsldSettings) -> Result<Self> {
        let (supercell, trans_info) = settings.supercell.apply(&parent)?;
        let (derived, seed) = settings.perturbation.apply(&supercell)?;

        let mut wf = Self::from_parts(parent, supercell, trans_info, derived)?;
        wf.seed = Some(seed);
        Ok(wf)
    }

    /// 使用已经准备好的超胞和扰动结构，扰动结构列表不能为空
    pub fn from_parts(
        parent: Crystal,
        supercell: Crystal,
        trans_info: SupercellInfo,
        derived: Vec<DerivedStructure>,
    ) -> Result<Self> {
        if derived.is_empty() {
            return Err(FlowError::ValidationError(
                "no perturbed structures to compute; the aggregation task would have no parents"
                    .to_string(),
            ));
        }

        Ok(CsldWorkflow {
            uuid: Uuid::new_v4().to_string(),
            parent,
            supercell,
            trans_info,
            derived,
            seed: None,
        })
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn supercell(&self) -> &Crystal {
        &self.supercell
    }

    pub fn trans_info(&self) -> &SupercellInfo {
        &self.trans_info
    }

    pub fn derived(&self) -> &[DerivedStructure] {
        &self.derived
    }

    /// 工作流名：约化化学式 + 固定后缀
    pub fn name(&self) -> String {
        format!(
            "{} - compressed sensing lattice dynamics",
            self.parent.reduced_formula()
        )
    }

    /// 供数据库查询用的共享元数据
    pub fn wf_meta(&self) -> serde_json::Value {
        json!({
            "wf_uuid": self.uuid,
            "wf_name": CSLD_WF_NAME,
        })
    }

    /// 组装任务图
    pub fn get_wf(&self, config: &RunConfig) -> Result<Workflow> {
        config.validate()?;

        let factory = TaskFactory::new(config);
        let mut builder = WorkflowBuilder::with_uuid(self.name(), CSLD_WF_NAME, &self.uuid);

        let mut samples = Vec::with_capacity(self.derived.len());
        for derived in &self.derived {
            let terminal = builder
                .add_chain(factory.static_branch(derived), &[])
                .ok_or_else(|| {
                    FlowError::ValidationError(format!("branch {} is empty", derived.index))
                })?;
            samples.push(ForceSample {
                index: derived.index,
                displacement: derived.displacement,
                task: terminal,
            });
        }

        let branch_terminals: Vec<_> = samples.iter().map(|s| s.task).collect();
        let aggregation = TaskAction::CsldForceConstantsToDb {
            db_file: config.db_file.clone(),
            wf_uuid: self.uuid.clone(),
            parent_structure: self.parent.clone(),
            supercell_structure: self.supercell.clone(),
            trans_mat: self.trans_info.transformation_matrix(),
            samples,
            seed: self.seed,
            additional_fields: BTreeMap::new(),
        };
        builder.add_task(TaskDraft::new(CSLD_TASK_NAME, aggregation), &branch_terminals);

        let workflow = builder.build()?;
        info!(
            branches = self.derived.len(),
            tasks = workflow.len(),
            "assembled '{}'",
            workflow.name()
        );

        let mut fields = BTreeMap::new();
        fields.insert("wf_meta".to_string(), self.wf_meta());
        Ok(MetadataTagger::new(fields, "VaspToDb").tag(workflow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice, TaskId};

    fn silicon() -> Crystal {
        let lattice = Lattice::from_vectors([
            [3.8401979337, 0.0, 0.0],
            [1.9200989668, 3.3257101909, 0.0],
            [0.0, -2.2171384943, 3.1355090603],
        ]);
        let atoms = vec![
            Atom::new("Si", [0.0, 0.0, 0.0]),
            Atom::new("Si", [0.75, 0.5, 0.75]),
        ];
        Crystal::new("Si", lattice, atoms)
    }

    fn prepared(disps: &[f64]) -> CsldWorkflow {
        let parent = silicon();
        let derived = disps
            .iter()
            .enumerate()
            .map(|(index, &displacement)| DerivedStructure {
                index,
                displacement,
                structure: parent.clone(),
            })
            .collect();
        let info = SupercellInfo { scaling: [1, 1, 1] };
        CsldWorkflow::from_parts(parent.clone(), parent, info, derived).unwrap()
    }

    fn aggregation(wf: &Workflow) -> &crate::models::Task {
        wf.tasks().last().unwrap()
    }

    #[test]
    fn test_si_example_shape() {
        let csld = prepared(&[0.01, 0.05, 0.10]);
        let wf = csld.get_wf(&RunConfig::default()).unwrap();

        assert_eq!(wf.name(), "Si - compressed sensing lattice dynamics");
        assert_eq!(wf.len(), 3 * 3 + 1);

        let agg = aggregation(&wf);
        assert_eq!(agg.name, CSLD_TASK_NAME);
        assert_eq!(agg.parents, vec![TaskId(2), TaskId(5), TaskId(8)]);
        assert_eq!(agg.action.displacements().unwrap(), vec![0.01, 0.05, 0.10]);
        assert_eq!(wf.leaves(), vec![agg.id]);
        assert_eq!(wf.roots(), vec![TaskId(0), TaskId(3), TaskId(6)]);
    }

    #[test]
    fn test_aggregation_parents_are_branch_terminals_in_order() {
        let disps: Vec<f64> = (0..7).map(|i| 0.01 + 0.01 * i as f64).collect();
        let wf = prepared(&disps).get_wf(&RunConfig::default()).unwrap();
        let agg = aggregation(&wf);

        assert_eq!(agg.parents.len(), disps.len());
        match &agg.action {
            TaskAction::CsldForceConstantsToDb { samples, .. } => {
                for (i, (sample, parent)) in samples.iter().zip(&agg.parents).enumerate() {
                    assert_eq!(sample.index, i);
                    assert_eq!(sample.task, *parent);
                    assert_eq!(sample.displacement, disps[i]);

                    let terminal = wf.task(*parent).unwrap();
                    assert_eq!(terminal.action.label(), "VaspToDb");
                    assert!(terminal.name.contains(&format!("idx: {},", i)));
                }
            }
            other => panic!("unexpected aggregation action: {:?}", other),
        }
    }

    #[test]
    fn test_vasp_to_db_tasks_tagged_with_wf_meta() {
        let csld = prepared(&[0.01, 0.02]);
        let wf = csld.get_wf(&RunConfig::default()).unwrap();

        for task in wf.tasks() {
            let fields = task.action.output_fields();
            match task.action.label() {
                "VaspToDb" => {
                    let meta = &fields.unwrap()["wf_meta"];
                    assert_eq!(meta["wf_uuid"], csld.uuid());
                    assert_eq!(meta["wf_name"], CSLD_WF_NAME);
                }
                "CsldForceConstantsToDb" => assert!(fields.unwrap().is_empty()),
                _ => assert!(fields.is_none()),
            }
        }
        assert_eq!(wf.metadata().wf_uuid, csld.uuid());
    }

    #[test]
    fn test_empty_derived_rejected() {
        let parent = silicon();
        let info = SupercellInfo { scaling: [1, 1, 1] };
        let err = CsldWorkflow::from_parts(parent.clone(), parent, info, vec![]).unwrap_err();
        assert!(matches!(err, FlowError::ValidationError(_)));
    }

    #[test]
    fn test_bad_config_fails_before_building() {
        let csld = prepared(&[0.01]);
        let config = RunConfig {
            db_file: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            csld.get_wf(&config),
            Err(FlowError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_end_to_end_from_parent_structure() {
        let settings = CsldSettings {
            supercell: CubicSupercell {
                num_nn_dists: 2.0,
                ..Default::default()
            },
            perturbation: PerturbSites {
                num_displacements: 4,
                supercells_per_displacement_distance: 2,
                seed: Some(11),
                ..Default::default()
            },
        };
        let csld = CsldWorkflow::new(silicon(), &settings).unwrap();
        assert_eq!(csld.seed(), Some(11));
        assert_eq!(csld.derived().len(), 8);
        assert_eq!(
            csld.supercell().num_sites(),
            2 * csld.trans_info().num_cells()
        );

        let wf = csld.get_wf(&RunConfig::default()).unwrap();
        assert_eq!(wf.len(), 8 * 3 + 1);
        let disps = aggregation(&wf).action.displacements().unwrap();
        assert_eq!(disps.len(), 8);
        assert!(disps.iter().all(|&d| (0.01..=0.1 + 1e-12).contains(&d)));
    }
}

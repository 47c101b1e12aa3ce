//! Description loading: JSON files into the core data model
//!
//! The evaluator itself never parses files; this module is the default
//! loader collaborator that turns serde description structs into validated
//! [`Workload`]/[`Architecture`]/[`Mapping`] values. A description file may
//! carry any subset of the three sections; `load_descriptions` merges the
//! given files and requires each section to appear exactly once overall.
//!
//! # Format
//!
//! ```json
//! {
//!   "workload": {
//!     "ranks": [{ "name": "i", "bound": 64 }],
//!     "operands": [
//!       { "name": "A", "kind": "input", "ranks": ["i"], "element_size": 1 }
//!     ]
//!   },
//!   "architecture": {
//!     "components": [
//!       { "kind": "storage", "name": "Buffer", "capacity": 512,
//!         "read_energy": 2.0, "write_energy": 3.0, "bandwidth": 64.0 },
//!       { "kind": "compute", "name": "MAC", "parent": "Buffer",
//!         "energy_per_op": 0.5, "cycles_per_op": 1.0, "width": 1 }
//!     ]
//!   },
//!   "mapping": {
//!     "loops": [
//!       { "rank": "i", "factor": 8, "level": 0 },
//!       { "rank": "i", "factor": 8, "level": 1 }
//!     ],
//!     "storage": [{ "level": 0, "keep": ["A"] }]
//!   }
//! }
//! ```

use anyhow::{bail, Context, Result};
use looptree_core::architecture::{Architecture, ArchitectureNode, Component};
use looptree_core::mapping::{LoopKind, LoopNode, Mapping, StorageAnnotation};
use looptree_core::workload::{Operand, OperandKind, Rank, Workload};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct RankDesc {
    pub name: String,
    pub bound: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandKindDesc {
    Input,
    Output,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperandDesc {
    pub name: String,
    pub kind: OperandKindDesc,
    pub ranks: Vec<String>,
    #[serde(default = "default_element_size")]
    pub element_size: u64,
}

fn default_element_size() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadDesc {
    pub ranks: Vec<RankDesc>,
    pub operands: Vec<OperandDesc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ComponentDesc {
    Storage {
        name: String,
        #[serde(default)]
        parent: Option<String>,
        capacity: u64,
        read_energy: f64,
        write_energy: f64,
        bandwidth: f64,
    },
    Compute {
        name: String,
        #[serde(default)]
        parent: Option<String>,
        energy_per_op: f64,
        cycles_per_op: f64,
        width: u64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureDesc {
    pub components: Vec<ComponentDesc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopKindDesc {
    Temporal,
    Spatial,
}

impl Default for LoopKindDesc {
    fn default() -> Self {
        LoopKindDesc::Temporal
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoopDesc {
    pub rank: String,
    pub factor: u64,
    #[serde(default)]
    pub kind: LoopKindDesc,
    pub level: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageDesc {
    pub level: usize,
    pub keep: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingDesc {
    pub loops: Vec<LoopDesc>,
    #[serde(default)]
    pub storage: Vec<StorageDesc>,
}

/// One description file: any subset of the three sections
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigDesc {
    #[serde(default)]
    pub workload: Option<WorkloadDesc>,
    #[serde(default)]
    pub architecture: Option<ArchitectureDesc>,
    #[serde(default)]
    pub mapping: Option<MappingDesc>,
}

impl WorkloadDesc {
    /// Convert into the validated core workload
    pub fn build(&self) -> Result<Workload> {
        let ranks = self
            .ranks
            .iter()
            .map(|r| Rank::new(&r.name, r.bound))
            .collect();
        let operands = self
            .operands
            .iter()
            .map(|o| Operand {
                name: o.name.clone(),
                kind: match o.kind {
                    OperandKindDesc::Input => OperandKind::Input,
                    OperandKindDesc::Output => OperandKind::Output,
                },
                ranks: o.ranks.clone(),
                element_size: o.element_size,
            })
            .collect();
        Ok(Workload::new(ranks, operands)?)
    }
}

impl ArchitectureDesc {
    /// Convert into the validated core architecture
    pub fn build(&self) -> Result<Architecture> {
        let nodes = self
            .components
            .iter()
            .map(|c| match c {
                ComponentDesc::Storage {
                    name,
                    parent,
                    capacity,
                    read_energy,
                    write_energy,
                    bandwidth,
                } => ArchitectureNode {
                    component: Component::storage(
                        name,
                        *capacity,
                        *read_energy,
                        *write_energy,
                        *bandwidth,
                    ),
                    parent: parent.clone(),
                },
                ComponentDesc::Compute {
                    name,
                    parent,
                    energy_per_op,
                    cycles_per_op,
                    width,
                } => ArchitectureNode {
                    component: Component::compute(name, *energy_per_op, *cycles_per_op, *width),
                    parent: parent.clone(),
                },
            })
            .collect();
        Ok(Architecture::new(nodes)?)
    }
}

impl MappingDesc {
    /// Convert into the validated core mapping
    pub fn build(&self) -> Result<Mapping> {
        let loops = self
            .loops
            .iter()
            .map(|l| LoopNode {
                rank: l.rank.clone(),
                factor: l.factor,
                kind: match l.kind {
                    LoopKindDesc::Temporal => LoopKind::Temporal,
                    LoopKindDesc::Spatial => LoopKind::Spatial,
                },
                level: l.level,
            })
            .collect();
        let retention = self
            .storage
            .iter()
            .map(|s| StorageAnnotation {
                level: s.level,
                keep: s.keep.clone(),
            })
            .collect();
        Ok(Mapping::new(loops, retention)?)
    }
}

/// Read and merge description files from a configuration directory
///
/// Relative file paths are resolved against `config_dir`. Each of the three
/// sections must appear in exactly one of the files.
pub fn load_descriptions(
    config_dir: &Path,
    config_files: &[impl AsRef<Path>],
) -> Result<(Workload, Architecture, Mapping)> {
    let mut workload: Option<WorkloadDesc> = None;
    let mut architecture: Option<ArchitectureDesc> = None;
    let mut mapping: Option<MappingDesc> = None;

    for file in config_files {
        let path = config_dir.join(file.as_ref());
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading description file {}", path.display()))?;
        let desc: ConfigDesc = serde_json::from_str(&text)
            .with_context(|| format!("parsing description file {}", path.display()))?;

        if let Some(section) = desc.workload {
            if workload.replace(section).is_some() {
                bail!("workload section appears more than once ({})", path.display());
            }
        }
        if let Some(section) = desc.architecture {
            if architecture.replace(section).is_some() {
                bail!(
                    "architecture section appears more than once ({})",
                    path.display()
                );
            }
        }
        if let Some(section) = desc.mapping {
            if mapping.replace(section).is_some() {
                bail!("mapping section appears more than once ({})", path.display());
            }
        }
    }

    let workload = workload.context("no workload section in any description file")?;
    let architecture = architecture.context("no architecture section in any description file")?;
    let mapping = mapping.context("no mapping section in any description file")?;

    Ok((workload.build()?, architecture.build()?, mapping.build()?))
}

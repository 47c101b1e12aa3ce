//! Result object: immutable stats with per-level breakdowns
//!
//! [`aggregate`] only packages what the estimators produced; the breakdowns
//! are preserved unmodified for introspection. `Stats` serializes so the
//! entry point can persist an artifact for offline inspection.

use crate::energy::EnergyEstimate;
use crate::latency::LatencyEstimate;
use crate::tally::Evaluation;
use looptree_core::architecture::Architecture;
use looptree_core::binding::ResolvedBinding;
use looptree_core::error::{ModelError, Result};
use looptree_core::workload::Workload;
use serde::Serialize;

/// Per-operand access breakdown at one level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperandStats {
    /// Operand name
    pub operand: String,
    /// Accesses reading data out of the level
    pub reads: u64,
    /// Accesses writing data into the level
    pub writes: u64,
    /// Bytes moved through the level for this operand
    pub bytes: u64,
    /// Resident tile size in elements, when the operand is kept here
    pub working_set: Option<u64>,
}

/// Breakdown for one storage level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStats {
    /// Hierarchy level (0 = topmost storage)
    pub level: usize,
    /// Bound component name
    pub component: String,
    /// Cumulative iteration count at this level
    pub iterations: u64,
    /// Access energy spent at this level
    pub energy: f64,
    /// Transfer time in cycles (bytes / bandwidth)
    pub transfer_time: f64,
    /// Per-operand tallies
    pub operands: Vec<OperandStats>,
}

/// Breakdown for the compute level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeStats {
    /// Hierarchy level bound to the compute component
    pub level: usize,
    /// Bound component name
    pub component: String,
    /// Total operations executed
    pub operations: u64,
    /// Compute energy
    pub energy: f64,
    /// Compute time in cycles
    pub time: f64,
}

/// The immutable evaluation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    /// Critical-path latency in cycles
    pub latency: f64,
    /// Total energy
    pub energy: f64,
    /// Per-storage-level breakdowns, outermost first
    pub levels: Vec<LevelStats>,
    /// Compute-level breakdown
    pub compute: ComputeStats,
}

impl Stats {
    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Latency: {:.1} cycles | Energy: {:.1} | {} storage levels | {} ops",
            self.latency,
            self.energy,
            self.levels.len(),
            self.compute.operations
        )
    }
}

/// Package estimator outputs into a [`Stats`]
pub fn aggregate(
    evaluation: &Evaluation,
    latency: &LatencyEstimate,
    energy: &EnergyEstimate,
    workload: &Workload,
    architecture: &Architecture,
    binding: &ResolvedBinding,
) -> Result<Stats> {
    let mut levels = Vec::new();
    for level in binding.levels() {
        if level == evaluation.compute_level {
            continue;
        }
        let id = binding
            .component_of(level)
            .ok_or(ModelError::BindingIncomplete { level })?;

        let mut operands = Vec::new();
        for operand in 0..workload.num_operands() {
            let counts = match evaluation.tally.get(level, operand) {
                Some(counts) => *counts,
                None => continue,
            };
            operands.push(OperandStats {
                operand: workload.operand(operand).name.clone(),
                reads: counts.reads,
                writes: counts.writes,
                bytes: counts.bytes,
                working_set: evaluation.working_sets.get(&(level, operand)).copied(),
            });
        }

        levels.push(LevelStats {
            level,
            component: architecture.component(id).name.clone(),
            iterations: evaluation.level_iterations.get(&level).copied().unwrap_or(1),
            energy: energy.per_level.get(&level).copied().unwrap_or(0.0),
            transfer_time: latency.transfer.get(&level).copied().unwrap_or(0.0),
            operands,
        });
    }

    let compute_id =
        binding
            .component_of(evaluation.compute_level)
            .ok_or(ModelError::BindingIncomplete {
                level: evaluation.compute_level,
            })?;

    Ok(Stats {
        latency: latency.total,
        energy: energy.total,
        levels,
        compute: ComputeStats {
            level: evaluation.compute_level,
            component: architecture.component(compute_id).name.clone(),
            operations: evaluation.compute_iterations(),
            energy: energy.compute,
            time: latency.compute,
        },
    })
}

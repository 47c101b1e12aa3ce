//! Latency estimation from iteration counts and access tallies
//!
//! Levels pipeline rather than serialize when buffering allows overlap, so
//! the total latency is the critical path: the maximum of the compute term
//! and each storage level's transfer term, not their sum. A storage level
//! whose traffic can be hidden under the compute below it contributes a
//! smaller term that the maximum ignores; a level that cannot keep up is
//! memory-bound and dominates.

use crate::tally::Evaluation;
use log::warn;
use looptree_core::architecture::{Architecture, ComponentAttrs};
use looptree_core::binding::ResolvedBinding;
use looptree_core::error::{ModelError, Result};
use std::collections::BTreeMap;

/// Latency breakdown in cycles
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyEstimate {
    /// Critical-path latency: the maximum over all terms
    pub total: f64,
    /// Compute term: temporal iterations x cycles per op, with spatial
    /// iterations folded into the parallel width by ceiling division
    pub compute: f64,
    /// Per-storage-level transfer terms (bytes moved / bandwidth)
    pub transfer: BTreeMap<usize, f64>,
}

impl LatencyEstimate {
    /// The level whose term dominates the critical path, if any storage
    /// level beats the compute term
    pub fn bound_level(&self) -> Option<usize> {
        self.transfer
            .iter()
            .filter(|(_, t)| **t >= self.compute)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(level, _)| *level)
    }

    /// True when the compute term dominates
    pub fn is_compute_bound(&self) -> bool {
        self.bound_level().is_none()
    }
}

/// Fold an evaluation into a total time estimate
pub fn estimate_latency(
    evaluation: &Evaluation,
    architecture: &Architecture,
    binding: &ResolvedBinding,
) -> Result<LatencyEstimate> {
    let compute_id = binding
        .component_of(evaluation.compute_level)
        .ok_or(ModelError::BindingIncomplete {
            level: evaluation.compute_level,
        })?;
    let component = architecture.component(compute_id);
    let compute = match component.attrs {
        ComponentAttrs::Compute {
            cycles_per_op,
            width,
            ..
        } => {
            let rounds = evaluation.spatial_iterations.div_ceil(width);
            if evaluation.spatial_iterations > width {
                warn!(
                    "spatial extent {} exceeds width {} of '{}': serializing into {} rounds",
                    evaluation.spatial_iterations, width, component.name, rounds
                );
            }
            cycles_per_op * evaluation.temporal_iterations as f64 * rounds as f64
        }
        ComponentAttrs::Storage { .. } => {
            return Err(ModelError::BindingInvalid {
                reason: format!(
                    "innermost level {} is bound to storage component '{}'",
                    evaluation.compute_level, component.name
                ),
            });
        }
    };

    let mut transfer = BTreeMap::new();
    for level in binding.levels() {
        if level == evaluation.compute_level {
            continue;
        }
        let id = binding
            .component_of(level)
            .ok_or(ModelError::BindingIncomplete { level })?;
        if let ComponentAttrs::Storage { bandwidth, .. } = architecture.component(id).attrs {
            let bytes = evaluation.tally.bytes_at(level);
            // A fully reused level moves nothing and costs nothing.
            let time = if bytes == 0 {
                0.0
            } else {
                bytes as f64 / bandwidth
            };
            transfer.insert(level, time);
        }
    }

    let slowest_transfer = transfer.values().fold(0.0f64, |acc, t| acc.max(*t));
    Ok(LatencyEstimate {
        total: compute.max(slowest_transfer),
        compute,
        transfer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::evaluate;
    use looptree_core::architecture::Component;
    use looptree_core::binding::Binding;
    use looptree_core::mapping::{LoopNode, Mapping, StorageAnnotation};
    use looptree_core::workload::{Operand, Rank, Workload};

    fn setup(bandwidth: f64, width: u64, spatial: bool) -> LatencyEstimate {
        let workload = Workload::new(
            vec![Rank::new("i", 64)],
            vec![Operand::input("A", &["i"], 1)],
        )
        .unwrap();
        let arch = Architecture::chain(vec![
            Component::storage("Buffer", 512, 1.0, 1.0, bandwidth),
            Component::compute("MAC", 0.25, 2.0, width),
        ])
        .unwrap();
        let inner = if spatial {
            LoopNode::spatial("i", 8, 1)
        } else {
            LoopNode::temporal("i", 8, 1)
        };
        let mapping = Mapping::new(
            vec![LoopNode::temporal("i", 8, 0), inner],
            vec![StorageAnnotation::keep(0, &["A"])],
        )
        .unwrap();
        let binding = Binding::new([(0, "Buffer".to_string()), (1, "MAC".to_string())])
            .resolve(&arch, &mapping)
            .unwrap();
        let eval = evaluate(&workload, &arch, &mapping, &binding).unwrap();
        estimate_latency(&eval, &arch, &binding).unwrap()
    }

    #[test]
    fn test_compute_bound_with_ample_bandwidth() {
        let estimate = setup(1e12, 1, false);
        // 64 temporal iterations x 2 cycles per op.
        assert_eq!(estimate.compute, 128.0);
        assert_eq!(estimate.total, 128.0);
        assert!(estimate.is_compute_bound());
    }

    #[test]
    fn test_memory_bound_with_starved_bandwidth() {
        // 64 bytes over 0.1 bytes/cycle = 640 cycles > 128 compute cycles.
        let estimate = setup(0.1, 1, false);
        assert_eq!(estimate.total, 640.0);
        assert_eq!(estimate.bound_level(), Some(0));
        assert!(!estimate.is_compute_bound());
    }

    #[test]
    fn test_spatial_ceiling_division() {
        // 8 spatial iterations over width 3: 3 serialized rounds.
        let estimate = setup(1e12, 3, true);
        // 8 temporal x 2 cycles x 3 rounds.
        assert_eq!(estimate.compute, 48.0);
    }

    #[test]
    fn test_spatial_within_width_single_round() {
        let estimate = setup(1e12, 8, true);
        assert_eq!(estimate.compute, 16.0);
    }
}

//! Property-based tests for the evaluator

use crate::api::evaluate_mapping_default;
use crate::stats::Stats;
use looptree_core::architecture::{Architecture, Component};
use looptree_core::binding::Binding;
use looptree_core::error::ModelError;
use looptree_core::mapping::{LoopNode, Mapping, StorageAnnotation};
use looptree_core::workload::{Operand, Rank, Workload};
use proptest::prelude::*;

fn single_rank_stats(bound: u64, outer: u64, inner: u64) -> Result<Stats, ModelError> {
    let workload = Workload::new(
        vec![Rank::new("i", bound)],
        vec![Operand::input("A", &["i"], 1)],
    )?;
    let architecture = Architecture::chain(vec![
        Component::storage("Buffer", bound.max(1), 2.0, 3.0, 64.0),
        Component::compute("MAC", 0.5, 1.0, 1),
    ])?;
    let mapping = Mapping::new(
        vec![
            LoopNode::temporal("i", outer, 0),
            LoopNode::temporal("i", inner, 1),
        ],
        vec![StorageAnnotation::keep(0, &["A"])],
    )?;
    let binding = Binding::new([(0, "Buffer".to_string()), (1, "MAC".to_string())]);
    evaluate_mapping_default(&workload, &architecture, &mapping, &binding)
}

proptest! {
    /// Any exact factorization of the bound evaluates successfully and
    /// counts every compute iteration exactly once.
    #[test]
    fn prop_complete_tilings_evaluate(outer in 1u64..=16, inner in 1u64..=16) {
        let stats = single_rank_stats(outer * inner, outer, inner).unwrap();
        prop_assert_eq!(stats.compute.operations, outer * inner);
    }

    /// A factorization whose product misses the bound is rejected before
    /// any estimate is produced.
    #[test]
    fn prop_incomplete_tilings_rejected(outer in 2u64..=16, inner in 1u64..=16) {
        let result = single_rank_stats(outer * inner + 1, outer, inner);
        let rejected = matches!(result, Err(ModelError::MappingInconsistency { .. }));
        prop_assert!(rejected);
    }

    /// Identical inputs yield bitwise-identical stats.
    #[test]
    fn prop_evaluation_deterministic(outer in 1u64..=16, inner in 1u64..=16) {
        let bound = outer * inner;
        let first = single_rank_stats(bound, outer, inner).unwrap();
        let second = single_rank_stats(bound, outer, inner).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Moving a loop factor inward (under the kept level) never increases
    /// the fetch count from the serving level.
    #[test]
    fn prop_reuse_monotone(x in 1u64..=6, y in 1u64..=6, z in 1u64..=6) {
        let bound = x * y * z;
        let coarse = single_rank_stats(bound, x * y, z).unwrap();
        let fine = single_rank_stats(bound, x, y * z).unwrap();
        let coarse_reads: u64 = coarse.levels.iter()
            .flat_map(|l| l.operands.iter().map(|o| o.reads))
            .sum();
        let fine_reads: u64 = fine.levels.iter()
            .flat_map(|l| l.operands.iter().map(|o| o.reads))
            .sum();
        prop_assert!(coarse_reads >= fine_reads);
    }

    /// The energy total is exactly the sum of its reported parts.
    #[test]
    fn prop_energy_additive(outer in 1u64..=16, inner in 1u64..=16) {
        let stats = single_rank_stats(outer * inner, outer, inner).unwrap();
        let parts: f64 = stats.levels.iter().map(|l| l.energy).sum::<f64>()
            + stats.compute.energy;
        prop_assert_eq!(stats.energy, parts);
    }
}

#![deny(warnings)]
//! # looptree
//!
//! Analytical evaluation of tiled loop-nest mappings over an accelerator
//! storage hierarchy.
//!
//! This is the **meta crate** that re-exports the looptree components for
//! convenient access.
//!
//! ## Quick Start
//!
//! ```
//! use looptree::prelude::*;
//!
//! // One iteration dimension of 64, one input tensor over it.
//! let workload = Workload::new(
//!     vec![Rank::new("i", 64)],
//!     vec![Operand::input("A", &["i"], 1)],
//! )?;
//!
//! // A buffer feeding a single multiply-accumulate unit.
//! let architecture = Architecture::chain(vec![
//!     Component::storage("Buffer", 512, 2.0, 3.0, 64.0),
//!     Component::compute("MAC", 0.5, 1.0, 1),
//! ])?;
//!
//! // Tile the dimension [8, 8]; keep A resident in the buffer.
//! let mapping = Mapping::new(
//!     vec![LoopNode::temporal("i", 8, 0), LoopNode::temporal("i", 8, 1)],
//!     vec![StorageAnnotation::keep(0, &["A"])],
//! )?;
//! let binding = Binding::new([(0, "Buffer".to_string()), (1, "MAC".to_string())]);
//!
//! let stats = evaluate_mapping_default(&workload, &architecture, &mapping, &binding)?;
//! assert_eq!(stats.compute.operations, 64);
//! assert_eq!(stats.latency, 64.0);
//! # Ok::<(), looptree::ModelError>(())
//! ```
//!
//! ## Components
//!
//! ### Data Model ([`core`])
//!
//! Immutable workload, architecture, mapping, and binding structures,
//! constructed once by a loader and passed by reference into the evaluator.
//!
//! ### Evaluator ([`model`])
//!
//! The loop-tree walk producing access tallies, working sets, and iteration
//! counts, plus the latency and energy estimators and the [`Stats`]
//! aggregator. JSON description loading lives in [`model::config`].

pub use looptree_core as core;
pub use looptree_model as model;

pub use looptree_core::{
    Architecture, ArchitectureNode, Binding, Component, ComponentAttrs, LoopKind, LoopNode,
    Mapping, ModelError, Operand, OperandKind, Rank, ResolvedBinding, StorageAnnotation, Workload,
};
pub use looptree_model::{
    evaluate_mapping, evaluate_mapping_default, run_looptree, run_looptree_with_model,
    ComponentTableModel, EnergyModel, LatencyEstimate, MemoizedModel, Stats,
};

/// Common imports for evaluator users
pub mod prelude {
    pub use looptree_core::prelude::*;
    pub use looptree_model::api::{
        evaluate_mapping, evaluate_mapping_default, run_looptree, run_looptree_with_model,
    };
    pub use looptree_model::energy::{ComponentTableModel, EnergyModel, MemoizedModel};
    pub use looptree_model::stats::Stats;
}

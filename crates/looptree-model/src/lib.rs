#![deny(warnings)]
//! # looptree-model
//!
//! Analytical evaluation of loop-nest mappings over a storage hierarchy.
//!
//! Given a workload, an architecture, a mapping, and a level binding (all
//! from `looptree-core`), this crate computes access tallies, working sets,
//! and iteration counts ([`tally`]), folds them into latency ([`latency`])
//! and energy ([`energy`]) estimates, and packages the results as
//! serializable [`stats::Stats`]. The [`api`] module exposes the one-call
//! entry points; [`config`] loads JSON descriptions.
//!
//! ```
//! use looptree_core::prelude::*;
//! use looptree_model::api::evaluate_mapping_default;
//!
//! let workload = Workload::new(
//!     vec![Rank::new("i", 64)],
//!     vec![Operand::input("A", &["i"], 1)],
//! )?;
//! let architecture = Architecture::chain(vec![
//!     Component::storage("Buffer", 512, 2.0, 3.0, 64.0),
//!     Component::compute("MAC", 0.5, 1.0, 1),
//! ])?;
//! let mapping = Mapping::new(
//!     vec![LoopNode::temporal("i", 8, 0), LoopNode::temporal("i", 8, 1)],
//!     vec![StorageAnnotation::keep(0, &["A"])],
//! )?;
//! let binding = Binding::new([(0, "Buffer".to_string()), (1, "MAC".to_string())]);
//!
//! let stats = evaluate_mapping_default(&workload, &architecture, &mapping, &binding)?;
//! assert_eq!(stats.compute.operations, 64);
//! # Ok::<(), looptree_core::error::ModelError>(())
//! ```

pub mod api;
pub mod config;
pub mod energy;
pub mod latency;
pub mod stats;
pub mod tally;

#[cfg(test)]
mod property_tests;

pub use api::{evaluate_mapping, evaluate_mapping_default, run_looptree, run_looptree_with_model};
pub use energy::{ComponentTableModel, EnergyEstimate, EnergyModel, MemoizedModel};
pub use latency::LatencyEstimate;
pub use stats::Stats;
pub use tally::{evaluate, AccessCounts, AccessTally, Evaluation};

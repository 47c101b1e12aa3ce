//! # looptree-core
//!
//! Immutable data model for the looptree mapping evaluator.
//!
//! This crate defines the four read-only inputs of one evaluation:
//!
//! - [`workload`]: ranks (iteration dimensions) and operands (tensors)
//! - [`architecture`]: a tree of storage and compute components
//! - [`mapping`]: the nested loop structure with storage annotations
//! - [`binding`]: the assignment of components to abstract hierarchy levels
//!
//! plus the shared [`error`] surface. The evaluator itself lives in
//! `looptree-model`; everything here is constructed once by a loader and
//! then only read.
//!
//! ## Quick Start
//!
//! ```
//! use looptree_core::prelude::*;
//!
//! let workload = Workload::new(
//!     vec![Rank::new("i", 64)],
//!     vec![Operand::input("A", &["i"], 2)],
//! )
//! .unwrap();
//!
//! let arch = Architecture::chain(vec![
//!     Component::storage("Buffer", 512, 1.0, 1.0, 64.0),
//!     Component::compute("MAC", 0.25, 1.0, 1),
//! ])
//! .unwrap();
//!
//! assert_eq!(workload.num_ranks(), 1);
//! assert_eq!(arch.num_components(), 2);
//! ```

#![deny(warnings)]

pub mod architecture;
pub mod binding;
pub mod error;
pub mod mapping;
pub mod workload;

// Re-exports
pub use architecture::{Architecture, ArchitectureNode, Component, ComponentAttrs, ComponentId};
pub use binding::{Binding, ResolvedBinding};
pub use error::ModelError;
pub use mapping::{LoopKind, LoopNode, Mapping, StorageAnnotation};
pub use workload::{Operand, OperandId, OperandKind, Rank, RankId, Workload};

/// Common imports for downstream crates
pub mod prelude {
    pub use crate::architecture::{Architecture, ArchitectureNode, Component, ComponentAttrs};
    pub use crate::binding::{Binding, ResolvedBinding};
    pub use crate::error::ModelError;
    pub use crate::mapping::{LoopKind, LoopNode, Mapping, StorageAnnotation};
    pub use crate::workload::{Operand, OperandKind, Rank, Workload};
}

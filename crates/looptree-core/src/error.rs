//! Unified error types for the looptree model
//!
//! Every failure mode of the evaluator and its input model is a variant of
//! [`ModelError`], carrying enough context (level, operand, rank, sizes) to
//! diagnose the offending description without re-running anything.
//!
//! # Examples
//!
//! ```
//! use looptree_core::error::ModelError;
//!
//! let err = ModelError::MappingInconsistency {
//!     rank: "k".to_string(),
//!     bound: 64,
//!     tiled: 32,
//! };
//! assert!(err.to_string().contains("rank 'k'"));
//! ```

use thiserror::Error;

/// Convenience alias used throughout the looptree crates
pub type Result<T> = std::result::Result<T, ModelError>;

/// Top-level error type for model construction and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A rank's tile factors do not reconstruct its declared bound
    #[error(
        "mapping inconsistency: rank '{rank}' has bound {bound} \
         but its tile factors multiply to {tiled}"
    )]
    MappingInconsistency {
        rank: String,
        bound: u64,
        tiled: u64,
    },

    /// An operand is bypassed at the outermost storage level, leaving it
    /// with no source to be fetched from
    #[error(
        "mapping inconsistency: operand '{operand}' is not kept at the \
         outermost storage level {level}"
    )]
    UnretainedOperand { operand: String, level: usize },

    /// The kept working sets at a storage level do not fit its capacity
    #[error(
        "capacity exceeded at level {level} ('{component}'): kept tiles \
         occupy {required} elements, capacity is {capacity} \
         (kept operands: {operands:?})"
    )]
    CapacityExceeded {
        level: usize,
        component: String,
        required: u64,
        capacity: u64,
        operands: Vec<String>,
    },

    /// A hierarchy level used by the mapping has no bound component
    #[error("binding incomplete: level {level} used by the mapping has no bound component")]
    BindingIncomplete { level: usize },

    /// The binding exists but violates totality, injectivity or the
    /// architecture's tree order
    #[error("binding invalid: {reason}")]
    BindingInvalid { reason: String },

    /// The external energy estimator failed or omitted a coefficient
    #[error("energy model unavailable for component '{component}': {reason}")]
    EnergyModelUnavailable { component: String, reason: String },

    /// Workload construction failed validation
    #[error("invalid workload: {reason}")]
    WorkloadInvalid { reason: String },

    /// Architecture construction failed validation
    #[error("invalid architecture: {reason}")]
    ArchitectureInvalid { reason: String },

    /// Mapping construction or resolution failed validation
    #[error("invalid mapping: {reason}")]
    MappingInvalid { reason: String },
}

impl ModelError {
    /// True for the error kinds that indicate a structurally invalid
    /// mapping (as opposed to a bad architecture or workload description)
    pub fn is_mapping_fault(&self) -> bool {
        matches!(
            self,
            ModelError::MappingInconsistency { .. }
                | ModelError::UnretainedOperand { .. }
                | ModelError::CapacityExceeded { .. }
                | ModelError::MappingInvalid { .. }
        )
    }
}

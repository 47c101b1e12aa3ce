//! Energy estimation from access tallies
//!
//! Per-access energy coefficients come from an [`EnergyModel`], an injected
//! capability so tests can substitute deterministic stubs for the external
//! estimator. [`ComponentTableModel`] reads the coefficients declared on the
//! architecture components; [`MemoizedModel`] wraps any model with a
//! per-configuration cache so an external estimator is consulted at most
//! once per distinct component within an evaluation.
//!
//! A failing or incomplete model is a hard
//! [`ModelError::EnergyModelUnavailable`]: a silently zero-filled
//! coefficient would corrupt the aggregate.

use crate::tally::Evaluation;
use looptree_core::architecture::{Architecture, Component, ComponentAttrs};
use looptree_core::binding::ResolvedBinding;
use looptree_core::error::{ModelError, Result};
use looptree_core::workload::Workload;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Per-access energy figures for one component configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyCoefficients {
    /// Storage component: energy per read and per write access
    Storage { read: f64, write: f64 },
    /// Compute component: energy per operation
    Compute { op: f64 },
}

/// The injected energy-estimation capability
///
/// Treated as a pure function by the model: the same component always
/// yields the same coefficients.
pub trait EnergyModel {
    /// Coefficients for one component configuration
    fn coefficients(&self, component: &Component) -> Result<EnergyCoefficients>;
}

/// Default model: coefficients declared on the architecture itself
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentTableModel;

impl EnergyModel for ComponentTableModel {
    fn coefficients(&self, component: &Component) -> Result<EnergyCoefficients> {
        Ok(match component.attrs {
            ComponentAttrs::Storage {
                read_energy,
                write_energy,
                ..
            } => EnergyCoefficients::Storage {
                read: read_energy,
                write: write_energy,
            },
            ComponentAttrs::Compute { energy_per_op, .. } => {
                EnergyCoefficients::Compute { op: energy_per_op }
            }
        })
    }
}

/// Memoizing wrapper: at most one underlying call per distinct component
///
/// # Examples
///
/// ```
/// use looptree_core::architecture::Component;
/// use looptree_model::energy::{ComponentTableModel, EnergyModel, MemoizedModel};
///
/// let model = MemoizedModel::new(ComponentTableModel);
/// let buffer = Component::storage("Buffer", 512, 2.0, 2.5, 64.0);
///
/// let first = model.coefficients(&buffer).unwrap();
/// let second = model.coefficients(&buffer).unwrap();
/// assert_eq!(first, second);
/// assert_eq!(model.misses(), 1);
/// ```
#[derive(Debug)]
pub struct MemoizedModel<M> {
    inner: M,
    cache: Mutex<BTreeMap<String, EnergyCoefficients>>,
    misses: Mutex<u64>,
}

impl<M: EnergyModel> MemoizedModel<M> {
    /// Wrap a model with a per-component-name cache
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: Mutex::new(BTreeMap::new()),
            misses: Mutex::new(0),
        }
    }

    /// Number of underlying model invocations so far
    pub fn misses(&self) -> u64 {
        *self.misses.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<M: EnergyModel> EnergyModel for MemoizedModel<M> {
    fn coefficients(&self, component: &Component) -> Result<EnergyCoefficients> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(coefficients) = cache.get(&component.name) {
            return Ok(*coefficients);
        }
        let coefficients = self.inner.coefficients(component)?;
        *self.misses.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        cache.insert(component.name.clone(), coefficients);
        Ok(coefficients)
    }
}

/// Energy breakdown
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyEstimate {
    /// Sum of every per-level and compute contribution
    pub total: f64,
    /// Access energy per storage level
    pub per_level: BTreeMap<usize, f64>,
    /// Energy spent by the compute component
    pub compute: f64,
}

/// Convert an access tally into total energy
///
/// Every `(level, operand)` entry contributes
/// `reads x read-energy + writes x write-energy` using the bound
/// component's coefficients; the compute component contributes
/// `operations x energy-per-op`. The total is the exact sum of all
/// contributions.
pub fn estimate_energy(
    evaluation: &Evaluation,
    workload: &Workload,
    architecture: &Architecture,
    binding: &ResolvedBinding,
    model: &dyn EnergyModel,
) -> Result<EnergyEstimate> {
    let mut per_level: BTreeMap<usize, f64> = BTreeMap::new();

    for ((level, operand), counts) in evaluation.tally.iter() {
        let id = binding
            .component_of(*level)
            .ok_or(ModelError::BindingIncomplete { level: *level })?;
        let component = architecture.component(id);
        match model.coefficients(component)? {
            EnergyCoefficients::Storage { read, write } => {
                let contribution = counts.reads as f64 * read + counts.writes as f64 * write;
                *per_level.entry(*level).or_insert(0.0) += contribution;
            }
            EnergyCoefficients::Compute { .. } => {
                return Err(ModelError::EnergyModelUnavailable {
                    component: component.name.clone(),
                    reason: format!(
                        "model returned per-op coefficients for storage accesses \
                         of operand '{}'",
                        workload.operand(*operand).name
                    ),
                });
            }
        }
    }

    let compute_id =
        binding
            .component_of(evaluation.compute_level)
            .ok_or(ModelError::BindingIncomplete {
                level: evaluation.compute_level,
            })?;
    let compute_component = architecture.component(compute_id);
    let compute = match model.coefficients(compute_component)? {
        EnergyCoefficients::Compute { op } => evaluation.compute_iterations() as f64 * op,
        EnergyCoefficients::Storage { .. } => {
            return Err(ModelError::EnergyModelUnavailable {
                component: compute_component.name.clone(),
                reason: "model returned storage coefficients for a compute component".to_string(),
            });
        }
    };

    let total = per_level.values().sum::<f64>() + compute;
    Ok(EnergyEstimate {
        total,
        per_level,
        compute,
    })
}

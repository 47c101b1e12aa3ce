//! Top-level evaluation entry points
//!
//! [`evaluate_mapping`] is the in-process API: it takes already-built
//! descriptions and returns combined [`Stats`]. [`run_looptree`] is the
//! file-driven front: it loads JSON descriptions, evaluates, and optionally
//! writes a `stats.json` artifact.

use crate::config::load_descriptions;
use crate::energy::{estimate_energy, ComponentTableModel, EnergyModel, MemoizedModel};
use crate::latency::estimate_latency;
use crate::stats::{aggregate, Stats};
use crate::tally::evaluate;
use anyhow::{Context, Result};
use looptree_core::architecture::Architecture;
use looptree_core::binding::Binding;
use looptree_core::error::ModelError;
use looptree_core::mapping::Mapping;
use looptree_core::workload::Workload;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Evaluate one mapping against one architecture and return combined stats
///
/// The binding is resolved and validated here; any fault in the inputs is
/// returned as a [`ModelError`] and no partial stats are produced. Access
/// energy is priced through `model`, so a plugin-backed model makes this the
/// single place where external coefficients enter the evaluation.
pub fn evaluate_mapping(
    workload: &Workload,
    architecture: &Architecture,
    mapping: &Mapping,
    binding: &Binding,
    model: &dyn EnergyModel,
) -> std::result::Result<Stats, ModelError> {
    let resolved = binding.resolve(architecture, mapping)?;
    let evaluation = evaluate(workload, architecture, mapping, &resolved)?;
    let latency = estimate_latency(&evaluation, architecture, &resolved)?;
    let energy = estimate_energy(&evaluation, workload, architecture, &resolved, model)?;
    aggregate(&evaluation, &latency, &energy, workload, architecture, &resolved)
}

/// Evaluate a mapping with the architecture's own energy coefficients
pub fn evaluate_mapping_default(
    workload: &Workload,
    architecture: &Architecture,
    mapping: &Mapping,
    binding: &Binding,
) -> std::result::Result<Stats, ModelError> {
    let model = MemoizedModel::new(ComponentTableModel);
    evaluate_mapping(workload, architecture, mapping, binding, &model)
}

/// Load descriptions from files, evaluate, and optionally emit `stats.json`
///
/// `bindings` maps mapping levels to component names. With
/// `call_external = true` the caller has requested an external energy
/// plugin; this front has none to offer, so the evaluation fails with
/// [`ModelError::EnergyModelUnavailable`] rather than silently falling back
/// to the built-in table. Use [`run_looptree_with_model`] to supply one.
pub fn run_looptree(
    config_dir: &Path,
    config_files: &[impl AsRef<Path>],
    output_dir: Option<&Path>,
    bindings: &BTreeMap<usize, String>,
    call_external: bool,
) -> Result<Stats> {
    if call_external {
        let (_, architecture, _) = load_descriptions(config_dir, config_files)?;
        let root = architecture.component(architecture.root()).name.clone();
        return Err(ModelError::EnergyModelUnavailable {
            component: root,
            reason: "external energy plugin requested but none configured".to_string(),
        }
        .into());
    }
    let model = MemoizedModel::new(ComponentTableModel);
    run_looptree_with_model(config_dir, config_files, output_dir, bindings, &model)
}

/// [`run_looptree`] with a caller-supplied energy model
pub fn run_looptree_with_model(
    config_dir: &Path,
    config_files: &[impl AsRef<Path>],
    output_dir: Option<&Path>,
    bindings: &BTreeMap<usize, String>,
    model: &dyn EnergyModel,
) -> Result<Stats> {
    let (workload, architecture, mapping) = load_descriptions(config_dir, config_files)?;
    let binding = Binding::new(
        bindings
            .iter()
            .map(|(&level, name)| (level, name.clone())),
    );

    let stats = evaluate_mapping(&workload, &architecture, &mapping, &binding, model)?;
    log::debug!("{}", stats.summary());

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        let path = dir.join("stats.json");
        let json = serde_json::to_string_pretty(&stats).context("serializing stats")?;
        fs::write(&path, json)
            .with_context(|| format!("writing statistics to {}", path.display()))?;
    }

    Ok(stats)
}

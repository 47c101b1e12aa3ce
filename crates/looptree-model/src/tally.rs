//! The loop-tree evaluator
//!
//! Walks the mapping's loop nest outermost-in and produces, per hierarchy
//! level: iteration counts, kept working-set sizes, and the reuse-adjusted
//! access tally between adjacent storage levels. This is a pure function of
//! its inputs; evaluating the same description twice yields identical
//! results.
//!
//! # Model
//!
//! Level 0 is the topmost storage; levels grow toward the compute leaf. A
//! loop tagged with level `l` scans sub-tiles of the data resident at `l`,
//! so the tile of operand `o` held at level `l` is the product of the
//! extents of `o`'s ranks *entering* `l` (after all loops at levels above).
//!
//! Reuse is decided per loop and per operand: a loop whose rank the operand
//! does not depend on leaves the operand's tile untouched across its
//! iterations, so it contributes a factor of 1 (instead of its tile factor)
//! to the operand's refill count. The refill count of a consumer level is
//! therefore the product of the dependent factors of every loop above it.
//!
//! Each refill is one tally event at both endpoints: a read at the serving
//! level and a write at the consuming storage level for inputs, the reverse
//! for output writebacks. Byte volumes are events x tile size x element
//! size. Operands bypassed at a level generate no tally entries there; the
//! consumer below is served by the nearest keeping ancestor.

use log::debug;
use looptree_core::architecture::{Architecture, ComponentAttrs, ComponentId};
use looptree_core::binding::ResolvedBinding;
use looptree_core::error::{ModelError, Result};
use looptree_core::mapping::{LoopKind, Mapping};
use looptree_core::workload::{OperandId, OperandKind, RankId, Workload};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Read/write/byte counters for one `(level, operand)` pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessCounts {
    /// Accesses that read data out of the level
    pub reads: u64,
    /// Accesses that write data into the level
    pub writes: u64,
    /// Bytes moved through the level for this operand
    pub bytes: u64,
}

/// Access counters for every `(level, operand)` pair touched by the mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTally {
    entries: BTreeMap<(usize, OperandId), AccessCounts>,
}

impl AccessTally {
    /// Counters for one level/operand pair, if any accesses were recorded
    pub fn get(&self, level: usize, operand: OperandId) -> Option<&AccessCounts> {
        self.entries.get(&(level, operand))
    }

    /// All recorded entries, ordered by level then operand
    pub fn iter(&self) -> impl Iterator<Item = (&(usize, OperandId), &AccessCounts)> {
        self.entries.iter()
    }

    /// Total bytes moved through one level
    pub fn bytes_at(&self, level: usize) -> u64 {
        self.entries
            .iter()
            .filter(|((l, _), _)| *l == level)
            .map(|(_, c)| c.bytes)
            .sum()
    }

    fn entry(&mut self, level: usize, operand: OperandId) -> &mut AccessCounts {
        self.entries.entry((level, operand)).or_default()
    }
}

/// Everything the evaluator derives from one (workload, architecture,
/// mapping, binding) quadruple
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Access counters per storage level and operand
    pub tally: AccessTally,
    /// Cumulative iteration count per level: the product of the factors of
    /// every loop at this level or above
    pub level_iterations: BTreeMap<usize, u64>,
    /// Working-set size in elements per kept `(level, operand)` pair
    pub working_sets: BTreeMap<(usize, OperandId), u64>,
    /// Product of all temporal loop factors
    pub temporal_iterations: u64,
    /// Product of all spatial loop factors
    pub spatial_iterations: u64,
    /// The level bound to the compute component (the innermost level)
    pub compute_level: usize,
}

impl Evaluation {
    /// Total number of compute operations (all loop factors multiplied)
    pub fn compute_iterations(&self) -> u64 {
        self.temporal_iterations * self.spatial_iterations
    }
}

struct ResolvedLoop {
    rank: RankId,
    factor: u64,
    kind: LoopKind,
    level: usize,
}

/// Evaluate a mapping: the core contract of the model
///
/// Inputs must satisfy the data-model invariants; a tiling that does not
/// reconstruct a rank's bound is reported as
/// [`ModelError::MappingInconsistency`], and a kept working set larger than
/// its level's capacity as [`ModelError::CapacityExceeded`]. The binding is
/// assumed already resolved (see [`Binding::resolve`]).
///
/// [`Binding::resolve`]: looptree_core::binding::Binding::resolve
pub fn evaluate(
    workload: &Workload,
    architecture: &Architecture,
    mapping: &Mapping,
    binding: &ResolvedBinding,
) -> Result<Evaluation> {
    let loops = resolve_loops(workload, mapping)?;
    check_tiling_completeness(workload, &loops)?;

    let levels = mapping.levels_used();
    let (storage, compute_level) = classify_levels(architecture, binding, &levels)?;
    let storage_levels: Vec<usize> = storage.iter().map(|(l, _)| *l).collect();
    let retention = resolve_retention(workload, mapping, &storage_levels)?;

    // Walk the nest once, recording per-level entry state: the extent of
    // every rank and the refill count of every operand on entry to each
    // level, plus cumulative iteration products.
    let mut extent: Vec<u64> = (0..workload.num_ranks()).map(|r| workload.bound(r)).collect();
    let mut refills: Vec<u64> = vec![1; workload.num_operands()];
    let mut iterations: u64 = 1;
    let mut temporal_iterations: u64 = 1;
    let mut spatial_iterations: u64 = 1;

    let mut extent_entry: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
    let mut refills_entry: BTreeMap<usize, Vec<u64>> = BTreeMap::new();
    let mut level_iterations: BTreeMap<usize, u64> = BTreeMap::new();

    let mut cursor = 0;
    for &level in &levels {
        extent_entry.insert(level, extent.clone());
        refills_entry.insert(level, refills.clone());

        while cursor < loops.len() && loops[cursor].level == level {
            let node = &loops[cursor];
            // Partial factor products always divide the bound exactly
            // because the full product reconstructs it.
            extent[node.rank] /= node.factor;
            iterations *= node.factor;
            match node.kind {
                LoopKind::Temporal => temporal_iterations *= node.factor,
                LoopKind::Spatial => spatial_iterations *= node.factor,
            }
            for operand in 0..workload.num_operands() {
                if workload.depends_on(operand, node.rank) {
                    refills[operand] *= node.factor;
                }
            }
            cursor += 1;
        }
        level_iterations.insert(level, iterations);
    }

    // Working sets and capacity checks at every storage level.
    let mut working_sets = BTreeMap::new();
    for &(level, component_id) in &storage {
        let kept = &retention[&level];
        let entry = &extent_entry[&level];
        let mut occupied: u64 = 0;
        for &operand in kept {
            let tile = tile_elements(workload, operand, entry);
            working_sets.insert((level, operand), tile);
            occupied += tile;
        }

        let component = architecture.component(component_id);
        if let ComponentAttrs::Storage { capacity, .. } = component.attrs {
            debug!(
                "level {} ('{}'): {} kept operands, {} of {} elements occupied",
                level,
                component.name,
                kept.len(),
                occupied,
                capacity
            );
            if occupied > capacity {
                let mut operands: Vec<String> = kept
                    .iter()
                    .map(|&o| workload.operand(o).name.clone())
                    .collect();
                operands.sort();
                return Err(ModelError::CapacityExceeded {
                    level,
                    component: component.name.clone(),
                    required: occupied,
                    capacity,
                    operands,
                });
            }
        }
    }

    // Access tallies along each operand's serving chain: its keeper levels
    // outermost-in, ending at the compute level.
    let mut tally = AccessTally::default();
    for operand in 0..workload.num_operands() {
        let mut chain: Vec<usize> = storage_levels
            .iter()
            .copied()
            .filter(|l| retention[l].contains(&operand))
            .collect();
        chain.push(compute_level);

        let element_size = workload.operand(operand).element_size;
        let written = workload.operand(operand).kind == OperandKind::Output;
        for pair in chain.windows(2) {
            let (server, consumer) = (pair[0], pair[1]);
            let events = refills_entry[&consumer][operand];
            let tile = tile_elements(workload, operand, &extent_entry[&consumer]);
            let bytes = events * tile * element_size;

            let consumer_is_storage = consumer != compute_level;
            if written {
                tally.entry(server, operand).writes += events;
                tally.entry(server, operand).bytes += bytes;
                if consumer_is_storage {
                    tally.entry(consumer, operand).reads += events;
                    tally.entry(consumer, operand).bytes += bytes;
                }
            } else {
                tally.entry(server, operand).reads += events;
                tally.entry(server, operand).bytes += bytes;
                if consumer_is_storage {
                    tally.entry(consumer, operand).writes += events;
                    tally.entry(consumer, operand).bytes += bytes;
                }
            }
        }
    }

    Ok(Evaluation {
        tally,
        level_iterations,
        working_sets,
        temporal_iterations,
        spatial_iterations,
        compute_level,
    })
}

fn resolve_loops(workload: &Workload, mapping: &Mapping) -> Result<Vec<ResolvedLoop>> {
    mapping
        .loops()
        .iter()
        .map(|node| {
            let rank = workload
                .rank_id(&node.rank)
                .ok_or_else(|| ModelError::MappingInvalid {
                    reason: format!("loop references unknown rank '{}'", node.rank),
                })?;
            Ok(ResolvedLoop {
                rank,
                factor: node.factor,
                kind: node.kind,
                level: node.level,
            })
        })
        .collect()
}

fn check_tiling_completeness(workload: &Workload, loops: &[ResolvedLoop]) -> Result<()> {
    let mut tiled: Vec<u64> = vec![1; workload.num_ranks()];
    for node in loops {
        tiled[node.rank] *= node.factor;
    }
    for (rank, &product) in tiled.iter().enumerate() {
        let bound = workload.bound(rank);
        if product != bound {
            return Err(ModelError::MappingInconsistency {
                rank: workload.rank(rank).name.clone(),
                bound,
                tiled: product,
            });
        }
    }
    Ok(())
}

/// Split the used levels into storage levels and the single compute level
fn classify_levels(
    architecture: &Architecture,
    binding: &ResolvedBinding,
    levels: &[usize],
) -> Result<(Vec<(usize, ComponentId)>, usize)> {
    let mut storage_levels = Vec::new();
    let mut compute_level = None;
    for &level in levels {
        let id = binding
            .component_of(level)
            .ok_or(ModelError::BindingIncomplete { level })?;
        match architecture.component(id).attrs {
            ComponentAttrs::Storage { .. } => storage_levels.push((level, id)),
            ComponentAttrs::Compute { .. } => {
                if compute_level.is_some() {
                    return Err(ModelError::BindingInvalid {
                        reason: "more than one level is bound to a compute component".to_string(),
                    });
                }
                compute_level = Some(level);
            }
        }
    }
    let compute_level = compute_level.ok_or_else(|| ModelError::BindingInvalid {
        reason: "no level is bound to a compute component".to_string(),
    })?;
    if compute_level != *levels.last().unwrap_or(&compute_level) {
        return Err(ModelError::BindingInvalid {
            reason: "the compute component must be bound to the innermost level".to_string(),
        });
    }
    if storage_levels.is_empty() {
        return Err(ModelError::MappingInvalid {
            reason: "mapping uses no storage level".to_string(),
        });
    }
    Ok((storage_levels, compute_level))
}

/// Resolve kept-operand names per storage level; the outermost level must
/// keep every operand (it is the data's only source)
fn resolve_retention(
    workload: &Workload,
    mapping: &Mapping,
    storage_levels: &[usize],
) -> Result<HashMap<usize, HashSet<OperandId>>> {
    let mut retention = HashMap::new();
    for &level in storage_levels {
        let mut kept = HashSet::new();
        for name in mapping.kept_at(level) {
            let id = workload
                .operand_id(name)
                .ok_or_else(|| ModelError::MappingInvalid {
                    reason: format!(
                        "storage annotation at level {} references unknown operand '{}'",
                        level, name
                    ),
                })?;
            kept.insert(id);
        }
        retention.insert(level, kept);
    }

    let outermost = storage_levels[0];
    for operand in 0..workload.num_operands() {
        if !retention[&outermost].contains(&operand) {
            return Err(ModelError::UnretainedOperand {
                operand: workload.operand(operand).name.clone(),
                level: outermost,
            });
        }
    }

    // Keeping an operand at a level not declared as storage is meaningless.
    for annotation in mapping.retention() {
        if !storage_levels.contains(&annotation.level) {
            return Err(ModelError::MappingInvalid {
                reason: format!(
                    "storage annotation at level {} which is not bound to storage",
                    annotation.level
                ),
            });
        }
    }

    Ok(retention)
}

fn tile_elements(workload: &Workload, operand: OperandId, extents: &[u64]) -> u64 {
    workload
        .operand_ranks(operand)
        .iter()
        .map(|&r| extents[r])
        .product()
}

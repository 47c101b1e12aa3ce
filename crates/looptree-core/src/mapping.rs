//! Mapping model: the loop tree and its storage annotations
//!
//! A [`Mapping`] is an ordered sequence of [`LoopNode`]s, outermost first.
//! Each loop carries the rank it tiles, a tile factor, a temporal-or-spatial
//! marker, and the hierarchy level it belongs to. A loop tagged with level
//! `l` iterates over the sub-tiles resident at level `l`; levels therefore
//! must not decrease along the sequence. Per-level [`StorageAnnotation`]s
//! declare which operands a storage level keeps; all other operands bypass
//! it and are served from the nearest keeping ancestor.
//!
//! Validation here is purely structural (positive factors, monotone levels,
//! no duplicate annotations). Whether the factors actually reconstruct each
//! rank's bound is checked against the workload by the evaluator, which
//! reports [`MappingInconsistency`](crate::error::ModelError::MappingInconsistency)
//! without crashing on malformed tilings.

use crate::error::{ModelError, Result};
use std::collections::BTreeSet;

/// Whether a loop's iterations run in sequence or across parallel instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// Iterations execute one after another
    Temporal,
    /// Iterations are distributed across parallel hardware instances
    Spatial,
}

/// One loop of the nest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopNode {
    /// Name of the rank this loop tiles
    pub rank: String,
    /// Tile factor: the number of iterations of this loop
    pub factor: u64,
    /// Temporal or spatial execution
    pub kind: LoopKind,
    /// Hierarchy level this loop belongs to (0 = topmost storage)
    pub level: usize,
}

impl LoopNode {
    /// Create a temporal loop
    pub fn temporal(rank: impl Into<String>, factor: u64, level: usize) -> Self {
        Self {
            rank: rank.into(),
            factor,
            kind: LoopKind::Temporal,
            level,
        }
    }

    /// Create a spatial loop
    pub fn spatial(rank: impl Into<String>, factor: u64, level: usize) -> Self {
        Self {
            rank: rank.into(),
            factor,
            kind: LoopKind::Spatial,
            level,
        }
    }
}

/// Operands a storage level retains; everything else bypasses the level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageAnnotation {
    /// The annotated hierarchy level
    pub level: usize,
    /// Names of the operands kept at this level
    pub keep: Vec<String>,
}

impl StorageAnnotation {
    /// Annotate a level with the operands it keeps
    pub fn keep(level: usize, operands: &[&str]) -> Self {
        Self {
            level,
            keep: operands.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// An ordered, nested loop structure with storage annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    loops: Vec<LoopNode>,
    retention: Vec<StorageAnnotation>,
}

impl Mapping {
    /// Construct and structurally validate a mapping
    ///
    /// Fails if any tile factor is zero, the level sequence decreases along
    /// the nest, or a level carries more than one storage annotation.
    pub fn new(loops: Vec<LoopNode>, retention: Vec<StorageAnnotation>) -> Result<Self> {
        let mut previous_level = 0usize;
        for (i, node) in loops.iter().enumerate() {
            if node.factor == 0 {
                return Err(ModelError::MappingInvalid {
                    reason: format!("loop {} over rank '{}' has zero tile factor", i, node.rank),
                });
            }
            if i > 0 && node.level < previous_level {
                return Err(ModelError::MappingInvalid {
                    reason: format!(
                        "loop {} over rank '{}' is at level {} inside level {}",
                        i, node.rank, node.level, previous_level
                    ),
                });
            }
            previous_level = node.level;
        }

        let mut annotated = BTreeSet::new();
        for annotation in &retention {
            if !annotated.insert(annotation.level) {
                return Err(ModelError::MappingInvalid {
                    reason: format!("level {} has more than one storage annotation", annotation.level),
                });
            }
        }

        Ok(Self { loops, retention })
    }

    /// The loop nest, outermost first
    pub fn loops(&self) -> &[LoopNode] {
        &self.loops
    }

    /// The storage annotations
    pub fn retention(&self) -> &[StorageAnnotation] {
        &self.retention
    }

    /// All hierarchy levels referenced by loops or annotations, ascending
    pub fn levels_used(&self) -> Vec<usize> {
        let mut levels: BTreeSet<usize> = self.loops.iter().map(|l| l.level).collect();
        levels.extend(self.retention.iter().map(|a| a.level));
        levels.into_iter().collect()
    }

    /// Operand names kept at a level (empty if the level has no annotation)
    pub fn kept_at(&self, level: usize) -> &[String] {
        self.retention
            .iter()
            .find(|a| a.level == level)
            .map(|a| a.keep.as_slice())
            .unwrap_or(&[])
    }
}

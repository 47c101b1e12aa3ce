//! Workload model: ranks and operands of a tensor computation
//!
//! A [`Workload`] describes the iteration space of a tensor computation as a
//! set of named ranks (iteration dimensions) with integer bounds, and the
//! operands (tensors) the computation touches, each depending on a subset of
//! the ranks. The workload is immutable once constructed; the evaluator only
//! ever reads it.
//!
//! # Examples
//!
//! ```
//! use looptree_core::workload::{Operand, Rank, Workload};
//!
//! // C[m,n] += A[m,k] * B[k,n]
//! let workload = Workload::new(
//!     vec![Rank::new("m", 16), Rank::new("n", 16), Rank::new("k", 64)],
//!     vec![
//!         Operand::input("A", &["m", "k"], 2),
//!         Operand::input("B", &["k", "n"], 2),
//!         Operand::output("C", &["m", "n"], 2),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(workload.num_ranks(), 3);
//! let k = workload.rank_id("k").unwrap();
//! let a = workload.operand_id("A").unwrap();
//! assert!(workload.depends_on(a, k));
//! ```

use crate::error::{ModelError, Result};
use std::collections::{HashMap, HashSet};

/// Index of a rank within its workload
pub type RankId = usize;

/// Index of an operand within its workload
pub type OperandId = usize;

/// A named iteration dimension with an integer bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    /// Rank identifier (e.g. "m", "k")
    pub name: String,
    /// Iteration extent; must be positive
    pub bound: u64,
}

impl Rank {
    /// Create a rank with the given name and bound
    pub fn new(name: impl Into<String>, bound: u64) -> Self {
        Self {
            name: name.into(),
            bound,
        }
    }
}

/// Whether an operand is read or written by the computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Read-only input tensor
    Input,
    /// Written output tensor (e.g. an accumulation target)
    Output,
}

/// A tensor read or written by the computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// Operand identifier (e.g. "A")
    pub name: String,
    /// Read or write direction
    pub kind: OperandKind,
    /// Names of the ranks this operand's access pattern depends on
    pub ranks: Vec<String>,
    /// Size of one element in bytes
    pub element_size: u64,
}

impl Operand {
    /// Create an input operand depending on the given ranks
    pub fn input(name: impl Into<String>, ranks: &[&str], element_size: u64) -> Self {
        Self {
            name: name.into(),
            kind: OperandKind::Input,
            ranks: ranks.iter().map(|r| r.to_string()).collect(),
            element_size,
        }
    }

    /// Create an output operand depending on the given ranks
    pub fn output(name: impl Into<String>, ranks: &[&str], element_size: u64) -> Self {
        Self {
            name: name.into(),
            kind: OperandKind::Output,
            ranks: ranks.iter().map(|r| r.to_string()).collect(),
            element_size,
        }
    }

    /// True if the operand is written by the computation
    pub fn is_written(&self) -> bool {
        self.kind == OperandKind::Output
    }
}

/// An immutable tensor-computation description
#[derive(Debug, Clone)]
pub struct Workload {
    ranks: Vec<Rank>,
    operands: Vec<Operand>,
    rank_ids: HashMap<String, RankId>,
    operand_ids: HashMap<String, OperandId>,
    /// Per operand, the resolved set of rank ids it depends on
    dependence: Vec<HashSet<RankId>>,
}

impl Workload {
    /// Construct and validate a workload
    ///
    /// Fails if a rank or operand name is duplicated, a rank bound is zero,
    /// an operand's element size is zero, or an operand references a rank
    /// that does not exist.
    pub fn new(ranks: Vec<Rank>, operands: Vec<Operand>) -> Result<Self> {
        let mut rank_ids = HashMap::new();
        for (id, rank) in ranks.iter().enumerate() {
            if rank.bound == 0 {
                return Err(ModelError::WorkloadInvalid {
                    reason: format!("rank '{}' has zero bound", rank.name),
                });
            }
            if rank_ids.insert(rank.name.clone(), id).is_some() {
                return Err(ModelError::WorkloadInvalid {
                    reason: format!("duplicate rank '{}'", rank.name),
                });
            }
        }

        let mut operand_ids = HashMap::new();
        let mut dependence = Vec::with_capacity(operands.len());
        for (id, operand) in operands.iter().enumerate() {
            if operand.element_size == 0 {
                return Err(ModelError::WorkloadInvalid {
                    reason: format!("operand '{}' has zero element size", operand.name),
                });
            }
            if operand_ids.insert(operand.name.clone(), id).is_some() {
                return Err(ModelError::WorkloadInvalid {
                    reason: format!("duplicate operand '{}'", operand.name),
                });
            }
            let mut deps = HashSet::new();
            for rank_name in &operand.ranks {
                let rank_id =
                    rank_ids
                        .get(rank_name)
                        .copied()
                        .ok_or_else(|| ModelError::WorkloadInvalid {
                            reason: format!(
                                "operand '{}' references unknown rank '{}'",
                                operand.name, rank_name
                            ),
                        })?;
                deps.insert(rank_id);
            }
            dependence.push(deps);
        }

        Ok(Self {
            ranks,
            operands,
            rank_ids,
            operand_ids,
            dependence,
        })
    }

    /// Number of ranks
    pub fn num_ranks(&self) -> usize {
        self.ranks.len()
    }

    /// Number of operands
    pub fn num_operands(&self) -> usize {
        self.operands.len()
    }

    /// All ranks, in declaration order
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    /// All operands, in declaration order
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Look up a rank by id
    pub fn rank(&self, id: RankId) -> &Rank {
        &self.ranks[id]
    }

    /// Look up an operand by id
    pub fn operand(&self, id: OperandId) -> &Operand {
        &self.operands[id]
    }

    /// Resolve a rank name to its id
    pub fn rank_id(&self, name: &str) -> Option<RankId> {
        self.rank_ids.get(name).copied()
    }

    /// Resolve an operand name to its id
    pub fn operand_id(&self, name: &str) -> Option<OperandId> {
        self.operand_ids.get(name).copied()
    }

    /// Iteration bound of a rank
    pub fn bound(&self, rank: RankId) -> u64 {
        self.ranks[rank].bound
    }

    /// True if the operand's access pattern varies with the given rank
    pub fn depends_on(&self, operand: OperandId, rank: RankId) -> bool {
        self.dependence[operand].contains(&rank)
    }

    /// Resolved rank ids an operand depends on
    pub fn operand_ranks(&self, operand: OperandId) -> &HashSet<RankId> {
        &self.dependence[operand]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matmul() -> Workload {
        Workload::new(
            vec![Rank::new("m", 8), Rank::new("n", 8), Rank::new("k", 32)],
            vec![
                Operand::input("A", &["m", "k"], 4),
                Operand::input("B", &["k", "n"], 4),
                Operand::output("C", &["m", "n"], 4),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_construction_and_lookup() {
        let w = matmul();
        assert_eq!(w.num_ranks(), 3);
        assert_eq!(w.num_operands(), 3);
        assert_eq!(w.bound(w.rank_id("k").unwrap()), 32);
        assert_eq!(w.operand(w.operand_id("C").unwrap()).kind, OperandKind::Output);
    }

    #[test]
    fn test_dependence() {
        let w = matmul();
        let a = w.operand_id("A").unwrap();
        let n = w.rank_id("n").unwrap();
        let k = w.rank_id("k").unwrap();
        assert!(w.depends_on(a, k));
        assert!(!w.depends_on(a, n));
    }

    #[test]
    fn test_unknown_rank_rejected() {
        let result = Workload::new(
            vec![Rank::new("m", 8)],
            vec![Operand::input("A", &["m", "q"], 4)],
        );
        assert!(matches!(result, Err(ModelError::WorkloadInvalid { .. })));
    }

    #[test]
    fn test_duplicate_rank_rejected() {
        let result = Workload::new(vec![Rank::new("m", 8), Rank::new("m", 4)], vec![]);
        assert!(matches!(result, Err(ModelError::WorkloadInvalid { .. })));
    }

    #[test]
    fn test_zero_bound_rejected() {
        let result = Workload::new(vec![Rank::new("m", 0)], vec![]);
        assert!(matches!(result, Err(ModelError::WorkloadInvalid { .. })));
    }

    #[test]
    fn test_zero_element_size_rejected() {
        let result = Workload::new(
            vec![Rank::new("m", 8)],
            vec![Operand::input("A", &["m"], 0)],
        );
        assert!(matches!(result, Err(ModelError::WorkloadInvalid { .. })));
    }
}

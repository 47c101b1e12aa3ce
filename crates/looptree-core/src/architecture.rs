//! Architecture model: a tree of storage and compute components
//!
//! An [`Architecture`] is a tree whose nodes are hardware [`Component`]s.
//! The root is the topmost memory (e.g. DRAM), interior nodes are buffers on
//! the data path, and every leaf is a compute component. Parent-child edges
//! represent the path data travels between levels.
//!
//! Component behavior differs only by its kind, expressed as a closed tagged
//! variant ([`ComponentAttrs`]) and matched exhaustively wherever the two
//! kinds diverge.
//!
//! # Examples
//!
//! ```
//! use looptree_core::architecture::{Architecture, Component};
//!
//! let arch = Architecture::chain(vec![
//!     Component::storage("MainMemory", 1 << 30, 100.0, 100.0, 16.0),
//!     Component::storage("GlobalBuffer", 4096, 2.0, 2.5, 64.0),
//!     Component::compute("MACC", 0.5, 1.0, 16),
//! ])
//! .unwrap();
//!
//! let gb = arch.component_id("GlobalBuffer").unwrap();
//! assert!(arch.component(arch.root()).is_storage());
//! assert!(arch.is_ancestor(arch.root(), gb));
//! ```

use crate::error::{ModelError, Result};
use std::collections::HashMap;

/// Index of a component within its architecture
pub type ComponentId = usize;

/// Kind-specific hardware parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentAttrs {
    /// A buffer or memory on the data path
    Storage {
        /// Capacity in elements
        capacity: u64,
        /// Energy per read access
        read_energy: f64,
        /// Energy per write access
        write_energy: f64,
        /// Sustained bandwidth in bytes per cycle
        bandwidth: f64,
    },
    /// A compute unit at a leaf of the tree
    Compute {
        /// Energy per operation
        energy_per_op: f64,
        /// Cycles per operation
        cycles_per_op: f64,
        /// Number of parallel instances a spatial loop can occupy
        width: u64,
    },
}

/// A hardware component: identifier plus kind-specific attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Component identifier, unique within the architecture
    pub name: String,
    /// Kind discriminator and parameters
    pub attrs: ComponentAttrs,
}

impl Component {
    /// Create a storage component
    pub fn storage(
        name: impl Into<String>,
        capacity: u64,
        read_energy: f64,
        write_energy: f64,
        bandwidth: f64,
    ) -> Self {
        Self {
            name: name.into(),
            attrs: ComponentAttrs::Storage {
                capacity,
                read_energy,
                write_energy,
                bandwidth,
            },
        }
    }

    /// Create a compute component
    pub fn compute(
        name: impl Into<String>,
        energy_per_op: f64,
        cycles_per_op: f64,
        width: u64,
    ) -> Self {
        Self {
            name: name.into(),
            attrs: ComponentAttrs::Compute {
                energy_per_op,
                cycles_per_op,
                width,
            },
        }
    }

    /// True if this is a storage component
    pub fn is_storage(&self) -> bool {
        matches!(self.attrs, ComponentAttrs::Storage { .. })
    }

    /// True if this is a compute component
    pub fn is_compute(&self) -> bool {
        matches!(self.attrs, ComponentAttrs::Compute { .. })
    }
}

/// A component together with the name of its parent (`None` for the root)
#[derive(Debug, Clone)]
pub struct ArchitectureNode {
    pub component: Component,
    pub parent: Option<String>,
}

/// An immutable component tree
#[derive(Debug, Clone)]
pub struct Architecture {
    components: Vec<Component>,
    parent: Vec<Option<ComponentId>>,
    root: ComponentId,
    ids: HashMap<String, ComponentId>,
}

impl Architecture {
    /// Construct and validate an architecture from parent-annotated nodes
    ///
    /// Validation enforces the tree invariants: unique component names,
    /// exactly one root, every parent exists and is a storage component,
    /// no cycles, every leaf is a compute component, and storage parameters
    /// are physically meaningful (positive capacity and bandwidth).
    pub fn new(nodes: Vec<ArchitectureNode>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(ModelError::ArchitectureInvalid {
                reason: "architecture has no components".to_string(),
            });
        }

        let mut ids = HashMap::new();
        for (id, node) in nodes.iter().enumerate() {
            if ids.insert(node.component.name.clone(), id).is_some() {
                return Err(ModelError::ArchitectureInvalid {
                    reason: format!("duplicate component '{}'", node.component.name),
                });
            }
            match node.component.attrs {
                ComponentAttrs::Storage {
                    capacity,
                    bandwidth,
                    ..
                } => {
                    if capacity == 0 || bandwidth <= 0.0 {
                        return Err(ModelError::ArchitectureInvalid {
                            reason: format!(
                                "storage '{}' needs positive capacity and bandwidth",
                                node.component.name
                            ),
                        });
                    }
                }
                ComponentAttrs::Compute {
                    cycles_per_op,
                    width,
                    ..
                } => {
                    if width == 0 || cycles_per_op <= 0.0 {
                        return Err(ModelError::ArchitectureInvalid {
                            reason: format!(
                                "compute '{}' needs positive width and cycle time",
                                node.component.name
                            ),
                        });
                    }
                }
            }
        }

        let mut parent = vec![None; nodes.len()];
        let mut root = None;
        for (id, node) in nodes.iter().enumerate() {
            match &node.parent {
                None => {
                    if root.is_some() {
                        return Err(ModelError::ArchitectureInvalid {
                            reason: "more than one root component".to_string(),
                        });
                    }
                    root = Some(id);
                }
                Some(parent_name) => {
                    let parent_id = ids.get(parent_name).copied().ok_or_else(|| {
                        ModelError::ArchitectureInvalid {
                            reason: format!(
                                "component '{}' has unknown parent '{}'",
                                node.component.name, parent_name
                            ),
                        }
                    })?;
                    if !nodes[parent_id].component.is_storage() {
                        return Err(ModelError::ArchitectureInvalid {
                            reason: format!(
                                "component '{}' is attached below compute component '{}'",
                                node.component.name, parent_name
                            ),
                        });
                    }
                    parent[id] = Some(parent_id);
                }
            }
        }
        let root = root.ok_or_else(|| ModelError::ArchitectureInvalid {
            reason: "no root component (every component has a parent)".to_string(),
        })?;

        // Cycle check: every component must reach the root.
        for id in 0..nodes.len() {
            let mut cursor = id;
            let mut hops = 0;
            while let Some(up) = parent[cursor] {
                cursor = up;
                hops += 1;
                if hops > nodes.len() {
                    return Err(ModelError::ArchitectureInvalid {
                        reason: "cycle in component tree".to_string(),
                    });
                }
            }
            if cursor != root {
                return Err(ModelError::ArchitectureInvalid {
                    reason: format!(
                        "component '{}' is not connected to the root",
                        nodes[id].component.name
                    ),
                });
            }
        }

        // Leaves must be compute components.
        let mut has_child = vec![false; nodes.len()];
        for p in parent.iter().flatten() {
            has_child[*p] = true;
        }
        for (id, node) in nodes.iter().enumerate() {
            if !has_child[id] && !node.component.is_compute() {
                return Err(ModelError::ArchitectureInvalid {
                    reason: format!("leaf component '{}' is not a compute unit", node.component.name),
                });
            }
        }

        let components = nodes.into_iter().map(|n| n.component).collect();
        Ok(Self {
            components,
            parent,
            root,
            ids,
        })
    }

    /// Construct a linear hierarchy from a top-down chain of components
    ///
    /// The first component becomes the root; each subsequent component is the
    /// child of the previous one. This covers the common single-path
    /// accelerator hierarchy (e.g. DRAM -> buffer -> MAC array).
    pub fn chain(components: Vec<Component>) -> Result<Self> {
        let mut nodes = Vec::with_capacity(components.len());
        let mut previous: Option<String> = None;
        for component in components {
            let name = component.name.clone();
            nodes.push(ArchitectureNode {
                component,
                parent: previous,
            });
            previous = Some(name);
        }
        Self::new(nodes)
    }

    /// The root (topmost memory) component id
    pub fn root(&self) -> ComponentId {
        self.root
    }

    /// Number of components
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Look up a component by id
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id]
    }

    /// Resolve a component name to its id
    pub fn component_id(&self, name: &str) -> Option<ComponentId> {
        self.ids.get(name).copied()
    }

    /// Parent of a component on the access path (`None` for the root)
    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.parent[id]
    }

    /// True if `ancestor` lies strictly above `descendant` on the access path
    pub fn is_ancestor(&self, ancestor: ComponentId, descendant: ComponentId) -> bool {
        let mut cursor = self.parent[descendant];
        while let Some(up) = cursor {
            if up == ancestor {
                return true;
            }
            cursor = self.parent[up];
        }
        false
    }
}

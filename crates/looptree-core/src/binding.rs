//! Binding: assignment of concrete components to abstract hierarchy levels
//!
//! A mapping talks about abstract levels 0, 1, 2, ...; a [`Binding`] names
//! the architecture component standing behind each level. Resolution checks
//! the binding is a total, injective function from the levels the mapping
//! uses into the component tree, and that level order follows the tree's
//! access-path order (the component bound to a deeper level must live below
//! the component bound to the level above it).
//!
//! # Examples
//!
//! ```
//! use looptree_core::architecture::{Architecture, Component};
//! use looptree_core::binding::Binding;
//! use looptree_core::mapping::{LoopNode, Mapping, StorageAnnotation};
//!
//! let arch = Architecture::chain(vec![
//!     Component::storage("MainMemory", 1 << 30, 100.0, 100.0, 16.0),
//!     Component::storage("GlobalBuffer", 4096, 2.0, 2.5, 64.0),
//!     Component::compute("MACC", 0.5, 1.0, 16),
//! ])
//! .unwrap();
//! let mapping = Mapping::new(
//!     vec![LoopNode::temporal("m", 8, 0), LoopNode::temporal("m", 8, 2)],
//!     vec![
//!         StorageAnnotation::keep(0, &["A"]),
//!         StorageAnnotation::keep(1, &["A"]),
//!     ],
//! )
//! .unwrap();
//!
//! let binding = Binding::new([
//!     (0, "MainMemory".to_string()),
//!     (1, "GlobalBuffer".to_string()),
//!     (2, "MACC".to_string()),
//! ]);
//! let resolved = binding.resolve(&arch, &mapping).unwrap();
//! assert_eq!(resolved.component_of(1), Some(arch.component_id("GlobalBuffer").unwrap()));
//! ```

use crate::architecture::{Architecture, ComponentId};
use crate::error::{ModelError, Result};
use crate::mapping::Mapping;
use std::collections::{BTreeMap, HashSet};

/// Raw level-to-component-name assignment, as supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    levels: BTreeMap<usize, String>,
}

impl Binding {
    /// Build a binding from `(level, component name)` pairs
    pub fn new(levels: impl IntoIterator<Item = (usize, String)>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// Component name bound to a level, if any
    pub fn component_name(&self, level: usize) -> Option<&str> {
        self.levels.get(&level).map(|s| s.as_str())
    }

    /// Validate this binding against an architecture and a mapping
    pub fn resolve(&self, architecture: &Architecture, mapping: &Mapping) -> Result<ResolvedBinding> {
        let mut components = BTreeMap::new();
        let mut seen = HashSet::new();

        for level in mapping.levels_used() {
            let name = self
                .levels
                .get(&level)
                .ok_or(ModelError::BindingIncomplete { level })?;
            let id = architecture
                .component_id(name)
                .ok_or_else(|| ModelError::BindingInvalid {
                    reason: format!("level {} is bound to unknown component '{}'", level, name),
                })?;
            if !seen.insert(id) {
                return Err(ModelError::BindingInvalid {
                    reason: format!("component '{}' is bound to more than one level", name),
                });
            }
            components.insert(level, id);
        }

        // Deeper levels must sit below shallower levels on the access path.
        let ordered: Vec<(usize, ComponentId)> = components.iter().map(|(l, c)| (*l, *c)).collect();
        for pair in ordered.windows(2) {
            let (outer_level, outer_comp) = pair[0];
            let (inner_level, inner_comp) = pair[1];
            if !architecture.is_ancestor(outer_comp, inner_comp) {
                return Err(ModelError::BindingInvalid {
                    reason: format!(
                        "level {} ('{}') is not below level {} ('{}') in the architecture",
                        inner_level,
                        architecture.component(inner_comp).name,
                        outer_level,
                        architecture.component(outer_comp).name
                    ),
                });
            }
        }

        Ok(ResolvedBinding { components })
    }
}

/// A validated binding: every level the mapping uses maps to a component id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    components: BTreeMap<usize, ComponentId>,
}

impl ResolvedBinding {
    /// Component bound to a level
    pub fn component_of(&self, level: usize) -> Option<ComponentId> {
        self.components.get(&level).copied()
    }

    /// Bound levels in ascending order
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.components.keys().copied()
    }

    /// The innermost (deepest) bound level
    pub fn innermost_level(&self) -> Option<usize> {
        self.components.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Component;
    use crate::mapping::{LoopNode, StorageAnnotation};

    fn arch() -> Architecture {
        Architecture::chain(vec![
            Component::storage("MainMemory", 1 << 30, 100.0, 100.0, 16.0),
            Component::storage("GlobalBuffer", 4096, 2.0, 2.5, 64.0),
            Component::compute("MACC", 0.5, 1.0, 16),
        ])
        .unwrap()
    }

    fn mapping() -> Mapping {
        Mapping::new(
            vec![
                LoopNode::temporal("m", 4, 0),
                LoopNode::temporal("m", 4, 1),
                LoopNode::temporal("m", 4, 2),
            ],
            vec![
                StorageAnnotation::keep(0, &["A"]),
                StorageAnnotation::keep(1, &["A"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_complete_binding() {
        let binding = Binding::new([
            (0, "MainMemory".to_string()),
            (1, "GlobalBuffer".to_string()),
            (2, "MACC".to_string()),
        ]);
        let resolved = binding.resolve(&arch(), &mapping()).unwrap();
        assert_eq!(resolved.innermost_level(), Some(2));
        assert_eq!(resolved.levels().count(), 3);
    }

    #[test]
    fn test_missing_level_reported() {
        let binding = Binding::new([(0, "MainMemory".to_string()), (2, "MACC".to_string())]);
        let result = binding.resolve(&arch(), &mapping());
        assert_eq!(result, Err(ModelError::BindingIncomplete { level: 1 }));
    }

    #[test]
    fn test_unknown_component_rejected() {
        let binding = Binding::new([
            (0, "MainMemory".to_string()),
            (1, "ScratchPad".to_string()),
            (2, "MACC".to_string()),
        ]);
        assert!(matches!(
            binding.resolve(&arch(), &mapping()),
            Err(ModelError::BindingInvalid { .. })
        ));
    }

    #[test]
    fn test_non_injective_rejected() {
        let binding = Binding::new([
            (0, "MainMemory".to_string()),
            (1, "MainMemory".to_string()),
            (2, "MACC".to_string()),
        ]);
        assert!(matches!(
            binding.resolve(&arch(), &mapping()),
            Err(ModelError::BindingInvalid { .. })
        ));
    }

    #[test]
    fn test_tree_order_enforced() {
        // GlobalBuffer above MainMemory contradicts the access path.
        let binding = Binding::new([
            (0, "GlobalBuffer".to_string()),
            (1, "MainMemory".to_string()),
            (2, "MACC".to_string()),
        ]);
        assert!(matches!(
            binding.resolve(&arch(), &mapping()),
            Err(ModelError::BindingInvalid { .. })
        ));
    }
}

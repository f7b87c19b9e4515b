//! Borrowed arena view over a flattened component list.
//!
//! The IR arrives as a flat `Vec<ComponentInstance>` linked by ids. Every
//! pass works on `&ComponentInstance` handles looked up here; nothing is
//! cloned or mutated during generation.

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::validate::ComponentInstance;

#[derive(Debug, Clone)]
pub struct ComponentTree<'a> {
    nodes: IndexMap<&'a str, &'a ComponentInstance>,
    roots: Vec<&'a str>,
}

impl<'a> ComponentTree<'a> {
    /// Index a component list. Later duplicates win; validation reports them.
    pub fn new(components: &'a [ComponentInstance]) -> Self {
        let mut nodes = IndexMap::with_capacity(components.len());
        let mut roots = Vec::new();
        for component in components {
            nodes.insert(component.id.as_str(), component);
            if component.is_root() {
                roots.push(component.id.as_str());
            }
        }
        Self { nodes, roots }
    }

    pub fn get(&self, id: &str) -> Option<&'a ComponentInstance> {
        self.nodes.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn roots(&self) -> &[&'a str] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in input order.
    pub fn iter(&self) -> impl Iterator<Item = &'a ComponentInstance> + '_ {
        self.nodes.values().copied()
    }

    /// Resolvable children of a node, in rendering order.
    pub fn children(&self, id: &str) -> Vec<&'a ComponentInstance> {
        self.get(id)
            .map(|node| {
                node.child_ids
                    .iter()
                    .filter_map(|child| self.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Depth-first pre-order walk from the given roots. Ids already visited
    /// are skipped, so malformed (cyclic) input terminates.
    pub fn walk(&self, root_ids: &[&str]) -> Vec<&'a ComponentInstance> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<&str> = root_ids.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.get(id) else {
                continue;
            };
            out.push(node);
            for child in node.child_ids.iter().rev() {
                if !seen.contains(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }
        out
    }

    /// Maximum depth over child edges; a lone root has depth 1.
    pub fn max_depth(&self) -> usize {
        let mut visiting = HashSet::new();
        self.roots
            .iter()
            .map(|root| self.depth_of(root, &mut visiting))
            .max()
            .unwrap_or(0)
    }

    fn depth_of(&self, id: &str, visiting: &mut HashSet<String>) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        if !visiting.insert(id.to_string()) {
            return 0;
        }
        let deepest = node
            .child_ids
            .iter()
            .map(|child| self.depth_of(child, visiting))
            .max()
            .unwrap_or(0);
        visiting.remove(id);
        deepest + 1
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<&'a ComponentInstance> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.get(id).and_then(|n| n.parent_id.as_deref());
        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            out.push(parent);
            current = parent.parent_id.as_deref();
        }
        out
    }
}

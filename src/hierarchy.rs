//! Forest construction from flat parent-referencing nodes
//!
//! Class hierarchies (`rdfs:subClassOf`) and taxonomies (`skos:broader`) both
//! arrive as unordered rows where each node names its direct parents.
//! [`HierarchyBuilder`] turns such a list into a [`Hierarchy`]: an arena that
//! owns every node exactly once and records parent/child links as indices.
//!
//! - Multi-parent nodes are linked under every parent present in the input.
//! - Parent ids that are not in the input are ignored.
//! - Owned trees ([`TreeNode`]) are materialised on demand with a depth
//!   ceiling and a cycle guard, since source data is not guaranteed acyclic.

use crate::model::{TaxonomyNode, TypeNode};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A node that names its direct parents by id
pub trait HierarchyItem {
    fn id(&self) -> &str;
    fn parent_ids(&self) -> &[String];
}

impl HierarchyItem for TypeNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_ids(&self) -> &[String] {
        &self.parents
    }
}

impl HierarchyItem for TaxonomyNode {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_ids(&self) -> &[String] {
        &self.parents
    }
}

/// Index of a node inside one [`Hierarchy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// Hierarchy arena
// =============================================================================

#[derive(Debug, Clone)]
pub struct Hierarchy<T> {
    nodes: Vec<T>,
    index: AHashMap<String, NodeId>,
    children: Vec<Vec<NodeId>>,
    parents: Vec<Vec<NodeId>>,
}

impl<T: HierarchyItem> Hierarchy<T> {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every input node, in input order
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id.0]
    }

    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.0]
    }

    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        &self.parents[id.0]
    }

    /// Nodes without any parent present in the input
    pub fn roots(&self) -> Vec<NodeId> {
        self.ids().filter(|id| self.parents[id.0].is_empty()).collect()
    }

    /// Roots when no target is given, otherwise the target alone.
    ///
    /// An unknown target selects nothing.
    pub fn select(&self, target: Option<&str>) -> Vec<NodeId> {
        match target {
            None => self.roots(),
            Some(id) => self.find(id).into_iter().collect(),
        }
    }

    /// Nodes reachable below `id`, each once, breadth first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.nodes.len()];
        seen[id.0] = true;
        let mut queue = std::collections::VecDeque::from([id]);
        let mut found = Vec::new();

        while let Some(current) = queue.pop_front() {
            for &child in &self.children[current.0] {
                if !seen[child.0] {
                    seen[child.0] = true;
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.nodes
    }
}

impl<T: HierarchyItem + Clone> Hierarchy<T> {
    /// Owned subtree rooted at `id`.
    ///
    /// Expansion stops at `max_depth` levels below the root and whenever a
    /// node would repeat one of its own ancestors; such nodes are marked
    /// `truncated`.
    pub fn to_tree(&self, id: NodeId, max_depth: usize) -> TreeNode<T> {
        let mut path = Vec::new();
        self.build_tree(id, 0, max_depth, &mut path)
    }

    /// Owned trees for every root
    pub fn forest(&self, max_depth: usize) -> Vec<TreeNode<T>> {
        self.roots()
            .into_iter()
            .map(|root| self.to_tree(root, max_depth))
            .collect()
    }

    fn build_tree(&self, id: NodeId, depth: usize, max_depth: usize, path: &mut Vec<NodeId>) -> TreeNode<T> {
        let mut tree = TreeNode {
            node: self.nodes[id.0].clone(),
            children: Vec::new(),
            truncated: false,
        };

        let children = &self.children[id.0];
        if children.is_empty() {
            return tree;
        }

        if depth >= max_depth {
            tracing::warn!(node = self.nodes[id.0].id(), depth, "hierarchy depth limit reached");
            tree.truncated = true;
            return tree;
        }

        path.push(id);
        for &child in children {
            if path.contains(&child) {
                tracing::warn!(
                    node = self.nodes[id.0].id(),
                    child = self.nodes[child.0].id(),
                    "cycle in hierarchy"
                );
                tree.truncated = true;
                continue;
            }
            tree.children.push(self.build_tree(child, depth + 1, max_depth, path));
        }
        path.pop();

        tree
    }
}

/// Owned node with its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub node: T,
    #[serde(default)]
    pub children: Vec<TreeNode<T>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl<T> TreeNode<T> {
    /// Number of nodes in this tree, root included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

// =============================================================================
// Builder
// =============================================================================

pub struct HierarchyBuilder;

impl HierarchyBuilder {
    /// Link every node under each of its parents that is present.
    pub fn build<T, I>(items: I) -> Hierarchy<T>
    where
        T: HierarchyItem,
        I: IntoIterator<Item = T>,
    {
        let items = items.into_iter();
        let mut nodes: Vec<T> = Vec::with_capacity(items.size_hint().0);
        let mut index = AHashMap::with_capacity(nodes.capacity());

        for node in items {
            if index.contains_key(node.id()) {
                tracing::warn!(node = node.id(), "duplicate node id, keeping the first occurrence");
                continue;
            }
            index.insert(node.id().to_string(), NodeId(nodes.len()));
            nodes.push(node);
        }

        let mut children = vec![Vec::new(); nodes.len()];
        let mut parents = vec![Vec::new(); nodes.len()];
        let mut dangling = 0usize;

        for (position, node) in nodes.iter().enumerate() {
            let child = NodeId(position);
            for parent_id in node.parent_ids() {
                if parent_id == node.id() {
                    continue;
                }
                let Some(&parent) = index.get(parent_id.as_str()) else {
                    dangling += 1;
                    continue;
                };
                if !parents[position].contains(&parent) {
                    parents[position].push(parent);
                    children[parent.0].push(child);
                }
            }
        }

        if dangling > 0 {
            tracing::debug!(dangling, "ignored parent references outside the node set");
        }

        Hierarchy {
            nodes,
            index,
            children,
            parents,
        }
    }
}

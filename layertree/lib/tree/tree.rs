use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{LayerTreeError, LayerTreeResult};

use super::{Node, NodeId};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A single-parent graph of nodes keyed by their [`NodeId`].
///
/// Every non-root node has exactly one parent and a node is never its own parent. Nodes without
/// a parent entry are roots. Children are kept ordered by id so traversals are deterministic.
#[derive(Debug, Clone)]
pub struct Tree<N> {
    /// All nodes in the tree
    nodes: BTreeMap<NodeId, N>,

    /// The children of every node that has at least one child
    children: HashMap<NodeId, BTreeSet<NodeId>>,

    /// The parent of every non-root node
    parent: HashMap<NodeId, NodeId>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<N: Node> Tree<N> {
    /// Creates a new empty tree.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            children: HashMap::new(),
            parent: HashMap::new(),
        }
    }

    /// Creates a new tree containing only the given root node.
    pub fn with_root(root: N) -> Self {
        let mut tree = Self::new();
        tree.nodes.insert(root.id(), root);
        tree
    }

    /// Returns the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if a node with the given id is in the tree.
    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the node with the given id.
    pub fn node(&self, id: &NodeId) -> Option<&N> {
        self.nodes.get(id)
    }

    /// Returns all nodes in the tree, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.values()
    }

    /// Returns all nodes that have no parent.
    pub fn roots(&self) -> Vec<&N> {
        self.nodes
            .iter()
            .filter(|(id, _)| !self.parent.contains_key(*id))
            .map(|(_, node)| node)
            .collect()
    }

    /// Returns the direct children of the node with the given id, ordered by id.
    pub fn children(&self, id: &NodeId) -> Vec<&N> {
        self.child_ids(id)
            .filter_map(|child| self.nodes.get(child))
            .collect()
    }

    /// Returns the ids of the direct children of the node with the given id, ordered by id.
    pub fn child_ids(&self, id: &NodeId) -> impl DoubleEndedIterator<Item = &NodeId> {
        self.children.get(id).into_iter().flat_map(|ids| ids.iter())
    }

    /// Returns the parent of the node with the given id.
    pub fn parent(&self, id: &NodeId) -> Option<&N> {
        self.parent.get(id).and_then(|parent| self.nodes.get(parent))
    }

    /// Adds a node without a parent.
    ///
    /// ## Errors
    ///
    /// Returns `NodeAlreadyExists` if a node with the same id is already in the tree.
    pub fn add_root(&mut self, node: N) -> LayerTreeResult<()> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(LayerTreeError::NodeAlreadyExists(id));
        }

        self.nodes.insert(id, node);
        Ok(())
    }

    /// Adds `child` under `parent`. If `parent` is not in the tree yet it is added as a root.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - `child` and `parent` share the same id
    /// - a node with the id of `child` is already in the tree
    pub fn add_child(&mut self, parent: &N, child: N) -> LayerTreeResult<()> {
        let parent_id = parent.id();
        let child_id = child.id();

        if parent_id == child_id {
            return Err(LayerTreeError::SelfEdge(child_id));
        }

        if self.nodes.contains_key(&child_id) {
            return Err(LayerTreeError::NodeAlreadyExists(child_id));
        }

        if !self.nodes.contains_key(&parent_id) {
            self.nodes.insert(parent_id.clone(), parent.clone());
        }

        self.children
            .entry(parent_id.clone())
            .or_default()
            .insert(child_id.clone());
        self.parent.insert(child_id.clone(), parent_id);
        self.nodes.insert(child_id, child);

        Ok(())
    }

    /// Removes the node with the given id along with its entire subtree.
    ///
    /// The removed nodes are returned in pre-order, starting with the node itself.
    ///
    /// ## Errors
    ///
    /// Returns `NodeNotFound` if the node is not in the tree.
    pub fn remove_node(&mut self, id: &NodeId) -> LayerTreeResult<Vec<N>> {
        if !self.nodes.contains_key(id) {
            return Err(LayerTreeError::NodeNotFound(id.clone()));
        }

        // Detach the subtree from its parent first
        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.remove(id);
                if siblings.is_empty() {
                    self.children.remove(&parent_id);
                }
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(children) = self.children.remove(&current) {
                stack.extend(children.into_iter().rev());
            }

            self.parent.remove(&current);
            if let Some(node) = self.nodes.remove(&current) {
                removed.push(node);
            }
        }

        Ok(removed)
    }

    /// Replaces the node with id `old` by `new`, keeping its position in the tree.
    ///
    /// When the ids differ, the children of the old node are re-parented under the new node and
    /// the parent's child set is re-keyed.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - the old node is not in the tree
    /// - the new node has a different id that is already used by another node
    pub fn replace(&mut self, old: &NodeId, new: N) -> LayerTreeResult<()> {
        if !self.nodes.contains_key(old) {
            return Err(LayerTreeError::NodeNotFound(old.clone()));
        }

        let new_id = new.id();
        if &new_id == old {
            self.nodes.insert(new_id, new);
            return Ok(());
        }

        if self.nodes.contains_key(&new_id) {
            return Err(LayerTreeError::NodeAlreadyExists(new_id));
        }

        if let Some(children) = self.children.remove(old) {
            for child in children.iter() {
                self.parent.insert(child.clone(), new_id.clone());
            }
            self.children.insert(new_id.clone(), children);
        }

        if let Some(parent_id) = self.parent.remove(old) {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.remove(old);
                siblings.insert(new_id.clone());
            }
            self.parent.insert(new_id.clone(), parent_id);
        }

        self.nodes.remove(old);
        self.nodes.insert(new_id, new);

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<N: Node> Default for Tree<N> {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

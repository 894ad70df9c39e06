use crate::LayerTreeResult;

use super::{Node, NodeId, Tree};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

type Predicate<'a, N> = Box<dyn Fn(&N) -> bool + 'a>;

/// Conditions that steer a [`DepthFirstWalker`].
///
/// - `should_terminate`: stops the whole walk when it returns `true` for a node
/// - `should_visit`: skips the visitor for a node when it returns `false`
/// - `should_continue_branch`: prunes the children of a node when it returns `false`
///
/// A missing condition never terminates, always visits and always continues.
pub struct WalkConditions<'a, N> {
    should_terminate: Option<Predicate<'a, N>>,
    should_visit: Option<Predicate<'a, N>>,
    should_continue_branch: Option<Predicate<'a, N>>,
}

/// Walks a [`Tree`] depth first, visiting every node before its children.
///
/// Children are walked in id order, so the visiting order of a given tree is stable.
pub struct DepthFirstWalker<'a, N> {
    tree: &'a Tree<N>,
    conditions: WalkConditions<'a, N>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a, N> WalkConditions<'a, N> {
    /// Creates conditions that visit every node.
    pub fn new() -> Self {
        Self {
            should_terminate: None,
            should_visit: None,
            should_continue_branch: None,
        }
    }

    /// Sets the condition that stops the walk.
    pub fn with_should_terminate(mut self, condition: impl Fn(&N) -> bool + 'a) -> Self {
        self.should_terminate = Some(Box::new(condition));
        self
    }

    /// Sets the condition that decides whether a node is passed to the visitor.
    pub fn with_should_visit(mut self, condition: impl Fn(&N) -> bool + 'a) -> Self {
        self.should_visit = Some(Box::new(condition));
        self
    }

    /// Sets the condition that decides whether the children of a node are walked.
    pub fn with_should_continue_branch(mut self, condition: impl Fn(&N) -> bool + 'a) -> Self {
        self.should_continue_branch = Some(Box::new(condition));
        self
    }

    fn terminates(&self, node: &N) -> bool {
        self.should_terminate
            .as_ref()
            .map(|condition| condition(node))
            .unwrap_or(false)
    }

    fn visits(&self, node: &N) -> bool {
        self.should_visit
            .as_ref()
            .map(|condition| condition(node))
            .unwrap_or(true)
    }

    fn continues(&self, node: &N) -> bool {
        self.should_continue_branch
            .as_ref()
            .map(|condition| condition(node))
            .unwrap_or(true)
    }
}

impl<'a, N: Node> DepthFirstWalker<'a, N> {
    /// Creates a new walker over `tree`.
    pub fn new(tree: &'a Tree<N>, conditions: WalkConditions<'a, N>) -> Self {
        Self { tree, conditions }
    }

    /// Walks every root of the tree.
    ///
    /// The walk stops at the first error returned by `visitor`.
    pub fn walk(&self, visitor: impl FnMut(&N) -> LayerTreeResult<()>) -> LayerTreeResult<()> {
        let roots = self.tree.roots().into_iter().map(Node::id).collect();
        self.walk_from(roots, visitor)
    }

    /// Walks the subtree rooted at the node with the given id.
    pub fn walk_subtree(
        &self,
        from: &NodeId,
        visitor: impl FnMut(&N) -> LayerTreeResult<()>,
    ) -> LayerTreeResult<()> {
        self.walk_from(vec![from.clone()], visitor)
    }

    fn walk_from(
        &self,
        starts: Vec<NodeId>,
        mut visitor: impl FnMut(&N) -> LayerTreeResult<()>,
    ) -> LayerTreeResult<()> {
        let mut stack: Vec<NodeId> = starts.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.tree.node(&id) else {
                continue;
            };

            if self.conditions.terminates(node) {
                break;
            }

            if self.conditions.visits(node) {
                visitor(node)?;
            }

            if self.conditions.continues(node) {
                stack.extend(self.tree.child_ids(&id).rev().cloned());
            }
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<N> Default for WalkConditions<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

use crate::LayerTreeResult;

use super::FileTree;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An ordered stack of layer trees, lowest layer first.
#[derive(Debug, Clone, Default)]
pub struct UnionTree<'a> {
    trees: Vec<&'a FileTree>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> UnionTree<'a> {
    /// Creates an empty union.
    pub fn new() -> Self {
        Self { trees: Vec::new() }
    }

    /// Creates a union of the given layers, lowest layer first.
    pub fn from_layers(trees: impl IntoIterator<Item = &'a FileTree>) -> Self {
        Self {
            trees: trees.into_iter().collect(),
        }
    }

    /// Puts `tree` on top of the stack.
    pub fn push_tree(&mut self, tree: &'a FileTree) {
        self.trees.push(tree);
    }

    /// Returns the number of layers in the union.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns `true` if the union has no layers.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Squashes the layers into a single tree.
    ///
    /// The lowest layer is copied and every following layer is merged onto the copy with
    /// [`FileTree::merge`]. The layers themselves are left untouched.
    ///
    /// ## Errors
    ///
    /// Returns `LayerTreeError::Layer` carrying the position of the layer that failed to merge.
    pub fn squash(&self) -> LayerTreeResult<FileTree> {
        let Some((lowest, upper)) = self.trees.split_first() else {
            return Ok(FileTree::new());
        };

        let mut squashed = lowest.copy();
        for (index, layer) in upper.iter().enumerate() {
            let index = index + 1;
            tracing::debug!(layer = index, nodes = layer.len(), "squashing layer");
            squashed
                .merge(layer)
                .map_err(|error| error.in_layer(index))?;
        }

        Ok(squashed)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

use std::collections::{BTreeSet, HashSet};

use crate::{
    file::{FilePath, FileResolution, FileType, Reference, ReferenceIdGenerator},
    tree::{DepthFirstWalker, Node, NodeId, Tree, WalkConditions},
    LayerTreeError, LayerTreeResult,
};

use super::{FileNode, LinkResolutionOption, LinkResolutionStrategy, NodeAccess, NodeKind};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The filesystem of a single image layer, or of several layers squashed together.
///
/// Every tree starts with a root directory at `/` that carries no reference until a layer
/// describes `/` explicitly. Paths are resolved the way a container runtime would resolve them:
/// links in ancestor segments and links in the final segment can be followed independently, see
/// [`LinkResolutionStrategy`].
///
/// Trees that belong to the same image should share one [`ReferenceIdGenerator`] so references
/// stay unique after squashing.
#[derive(Debug, Clone)]
pub struct FileTree {
    /// The nodes of the tree, keyed by real path
    tree: Tree<FileNode>,

    /// The generator of references for files added to this tree
    id_generator: ReferenceIdGenerator,
}

//--------------------------------------------------------------------------------------------------
// Methods: Construction
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Creates a new tree with its own reference id generator.
    pub fn new() -> Self {
        Self::with_id_generator(ReferenceIdGenerator::new())
    }

    /// Creates a new tree that allocates references from `id_generator`.
    pub fn with_id_generator(id_generator: ReferenceIdGenerator) -> Self {
        Self {
            tree: Tree::with_root(FileNode::implicit_dir(FilePath::root())),
            id_generator,
        }
    }

    /// Returns the reference id generator of the tree.
    pub fn get_id_generator(&self) -> &ReferenceIdGenerator {
        &self.id_generator
    }

    /// Returns an independent copy of the tree that shares its id generator.
    pub fn copy(&self) -> FileTree {
        self.clone()
    }

    /// Returns the number of nodes in the tree, including the root and implicit directories.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.tree.len() <= 1
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: Resolution
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Resolves `path` to a node using the given strategy.
    ///
    /// Returns `None` if the path does not exist, or if it ends in a dead link that should be
    /// followed.
    ///
    /// ## Errors
    ///
    /// Returns `LinkCycleDetected` if following links revisits a path.
    pub fn resolve(
        &self,
        path: impl Into<FilePath>,
        strategy: LinkResolutionStrategy,
    ) -> LayerTreeResult<Option<NodeAccess>> {
        let request = path.into();
        if !strategy.follows_links() {
            return Ok(self.node_access(&request));
        }

        let mut attempted = HashSet::new();
        let current = if strategy.get_follow_ancestor_links() {
            self.resolve_ancestor_links(&request, &mut attempted)?
        } else {
            self.node_access(&request)
        };

        let current = match current {
            Some(access) if strategy.get_follow_basename_links() => self.resolve_node_links(
                access,
                !strategy.get_do_not_follow_dead_basename_links(),
                &mut attempted,
            )?,
            current => current,
        };

        Ok(current.map(|access| access.with_request_path(request)))
    }

    /// Resolves `path` like [`FileTree::file`] but returns the node itself.
    pub fn file_access(
        &self,
        path: impl Into<FilePath>,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Option<NodeAccess>> {
        let path = path.into();
        let strategy = LinkResolutionStrategy::from_options(options);

        if let Some(access) = self.node_access(&path) {
            if !access.get_node().is_link() || !strategy.get_follow_basename_links() {
                return Ok(Some(access));
            }
        }

        self.resolve(path, strategy)
    }

    /// Resolves `path` to the file it names.
    ///
    /// Links in ancestor segments are always followed. A link in the final segment is only
    /// followed when requested through `options`.
    pub fn file(
        &self,
        path: impl Into<FilePath>,
        options: &[LinkResolutionOption],
    ) -> LayerTreeResult<Option<FileResolution>> {
        Ok(self
            .file_access(path, options)?
            .map(NodeAccess::into_resolution))
    }

    /// Returns `true` if `path` resolves to a node.
    ///
    /// Paths that cannot be resolved because of a link cycle do not exist.
    pub fn has_path(&self, path: impl Into<FilePath>, options: &[LinkResolutionOption]) -> bool {
        matches!(self.file_access(path, options), Ok(Some(_)))
    }

    fn node_access(&self, path: &FilePath) -> Option<NodeAccess> {
        self.tree
            .node(&NodeId::from(path))
            .map(|node| NodeAccess::new(path.clone(), node.clone()))
    }

    /// Resolves every link in the ancestor segments of `path`, leaving the final segment alone.
    fn resolve_ancestor_links(
        &self,
        path: &FilePath,
        attempted: &mut HashSet<FilePath>,
    ) -> LayerTreeResult<Option<NodeAccess>> {
        // Real paths need no ancestor resolution
        if let Some(access) = self.node_access(path) {
            return Ok(Some(access));
        }

        let segments: Vec<&str> = path.segments().collect();
        let mut current = FilePath::root();
        let mut resolved = None;

        for (index, segment) in segments.iter().enumerate() {
            let Some(node) = self.tree.node(&NodeId::from(&current.join(segment))) else {
                return Ok(None);
            };

            current = node.real_path.clone();

            let is_last = index + 1 == segments.len();
            if node.reference.is_none() || is_last || !node.is_link() {
                resolved = Some(node.clone());
                continue;
            }

            let link = NodeAccess::new(current.clone(), node.clone());
            let Some(target) = self.resolve_node_links(link, true, attempted)? else {
                return Ok(None);
            };

            current = target.get_node().real_path.clone();
            resolved = Some(target.into_node());
        }

        Ok(resolved.map(|node| NodeAccess::new(path.clone(), node)))
    }

    /// Follows the link chain starting at `start` until a non-link node is reached.
    ///
    /// When the chain ends in a missing path, `None` is returned if `follow_dead` is set,
    /// otherwise the last link of the chain is returned.
    fn resolve_node_links(
        &self,
        start: NodeAccess,
        follow_dead: bool,
        attempted: &mut HashSet<FilePath>,
    ) -> LayerTreeResult<Option<NodeAccess>> {
        let mut chain: Vec<NodeAccess> = Vec::new();
        let mut seen: HashSet<FilePath> = HashSet::new();
        let mut current = start;

        loop {
            let node = current.get_node();
            if seen.contains(&node.real_path) {
                return Err(LayerTreeError::LinkCycleDetected(node.real_path.clone()));
            }

            if !node.is_link() {
                break;
            }

            seen.insert(node.real_path.clone());

            // A link without a target ends the chain
            let Some(next_path) = node.link_target() else {
                break;
            };

            // Cycles through paths that do not exist never reach a node twice
            if attempted.contains(&next_path) {
                return Err(LayerTreeError::LinkCycleDetected(next_path));
            }

            tracing::trace!(from = %node.real_path, to = %next_path, "following link");

            attempted.insert(next_path.clone());
            let next = self.resolve_ancestor_links(&next_path, attempted);
            attempted.remove(&next_path);

            match next? {
                Some(next) => {
                    chain.push(current);
                    current = next;
                }
                None if follow_dead => return Ok(None),
                None => return Ok(Some(current.with_link_resolution(chain))),
            }
        }

        Ok(Some(current.with_link_resolution(chain)))
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: Mutation
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Adds a regular file at `real_path` and returns its reference.
    ///
    /// ## Errors
    ///
    /// Returns `TypeMismatch` if the path already exists with another type.
    pub fn add_file(&mut self, real_path: impl Into<FilePath>) -> LayerTreeResult<Reference> {
        self.add_node(real_path.into(), NodeKind::Regular)
    }

    /// Adds a directory at `real_path` and returns its reference.
    ///
    /// An implicitly created directory receives its reference here.
    pub fn add_dir(&mut self, real_path: impl Into<FilePath>) -> LayerTreeResult<Reference> {
        self.add_node(real_path.into(), NodeKind::Directory)
    }

    /// Adds a symlink at `real_path` pointing at the raw `target`.
    ///
    /// Relative targets are resolved against the directory holding the link when the link is
    /// followed. An empty target makes the link the end of any chain through it.
    pub fn add_symlink(
        &mut self,
        real_path: impl Into<FilePath>,
        target: impl Into<String>,
    ) -> LayerTreeResult<Reference> {
        self.add_node(real_path.into(), NodeKind::SymLink(target.into()))
    }

    /// Adds a hardlink at `real_path` pointing at `target`, which is anchored at the root.
    pub fn add_hardlink(
        &mut self,
        real_path: impl Into<FilePath>,
        target: impl Into<FilePath>,
    ) -> LayerTreeResult<Reference> {
        self.add_node(real_path.into(), NodeKind::HardLink(target.into()))
    }

    /// Removes the node at `path` and everything below it.
    ///
    /// Links in ancestor segments are followed, a link in the final segment is removed itself.
    /// Removing a path that does not exist is a no-op.
    ///
    /// ## Errors
    ///
    /// Returns `RemovingRoot` if `path` is `/`.
    pub fn remove_path(&mut self, path: impl Into<FilePath>) -> LayerTreeResult<()> {
        let path = path.into();
        if path.is_root() {
            return Err(LayerTreeError::RemovingRoot);
        }

        let strategy = LinkResolutionStrategy::builder()
            .follow_ancestor_links(true)
            .build();

        let Some(access) = self.resolve(path, strategy)? else {
            return Ok(());
        };

        let node = access.into_node();
        if node.real_path.is_root() {
            return Err(LayerTreeError::RemovingRoot);
        }

        self.tree.remove_node(&node.id())?;
        Ok(())
    }

    /// Removes everything below the directory at `path`, keeping the directory itself.
    ///
    /// Links are followed in every segment. Removing below a path that does not exist is a no-op.
    pub fn remove_child_paths(&mut self, path: impl Into<FilePath>) -> LayerTreeResult<()> {
        let strategy = LinkResolutionStrategy::from_options(&[
            LinkResolutionOption::FollowBasenameLinks,
        ]);

        let Some(access) = self.resolve(path, strategy)? else {
            return Ok(());
        };

        let id = access.get_node().id();
        let children: Vec<NodeId> = self.tree.child_ids(&id).cloned().collect();
        for child in children {
            self.tree.remove_node(&child)?;
        }

        Ok(())
    }

    fn add_node(&mut self, path: FilePath, kind: NodeKind) -> LayerTreeResult<Reference> {
        let id = NodeId::from(&path);

        if let Some(existing) = self.tree.node(&id) {
            if existing.file_type() != kind.file_type() {
                return Err(LayerTreeError::TypeMismatch {
                    path,
                    existing: existing.file_type(),
                    requested: kind.file_type(),
                });
            }

            let mut updated = existing.clone();
            updated.kind = kind;

            let reference = match &updated.reference {
                Some(reference) => reference.clone(),
                None => {
                    let reference = self.id_generator.create_reference(path);
                    updated.reference = Some(reference.clone());
                    reference
                }
            };

            self.tree.replace(&id, updated)?;
            return Ok(reference);
        }

        let reference = self.id_generator.create_reference(path.clone());
        self.attach(FileNode::new(path, kind, Some(reference.clone())))?;

        Ok(reference)
    }

    /// Puts `node` under its parent directory, creating missing ancestors without references.
    fn attach(&mut self, node: FileNode) -> LayerTreeResult<()> {
        let Some(parent_path) = node.real_path.parent() else {
            return Err(LayerTreeError::NodeAlreadyExists(node.id()));
        };

        self.add_parent_paths(&node.real_path)?;

        let parent = self
            .tree
            .node(&NodeId::from(&parent_path))
            .cloned()
            .ok_or(LayerTreeError::ParentNotFound(parent_path))?;

        self.tree.add_child(&parent, node)
    }

    fn add_parent_paths(&mut self, path: &FilePath) -> LayerTreeResult<()> {
        for ancestor in path.ancestors() {
            if ancestor.is_root() || self.tree.has_node(&NodeId::from(&ancestor)) {
                continue;
            }

            let parent_path = ancestor.parent().unwrap_or_else(FilePath::root);
            let parent = self
                .tree
                .node(&NodeId::from(&parent_path))
                .cloned()
                .ok_or(LayerTreeError::ParentNotFound(parent_path))?;

            self.tree.add_child(&parent, FileNode::implicit_dir(ancestor))?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: Queries
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Returns the references of every file of the given types, or of every type if `types` is
    /// empty. Implicit directories have no reference and are never returned.
    pub fn all_files(&self, types: &[FileType]) -> Vec<Reference> {
        self.tree
            .nodes()
            .filter(|node| types.is_empty() || types.contains(&node.file_type()))
            .filter_map(|node| node.reference.clone())
            .collect()
    }

    /// Returns the real path of every node in the tree.
    pub fn all_real_paths(&self) -> Vec<FilePath> {
        self.tree
            .nodes()
            .map(|node| node.real_path.clone())
            .collect()
    }

    /// Lists the entries of the directory at `dir`, following links in every segment.
    ///
    /// The returned paths are joined onto `dir` as requested, not onto the resolved directory.
    /// Paths that do not exist or are not directories list nothing.
    pub fn list_paths(&self, dir: impl Into<FilePath>) -> LayerTreeResult<Vec<FilePath>> {
        let dir = dir.into();
        let strategy = LinkResolutionStrategy::from_options(&[
            LinkResolutionOption::FollowBasenameLinks,
        ]);

        let Some(access) = self.resolve(dir.clone(), strategy)? else {
            return Ok(Vec::new());
        };

        if !access.get_node().is_dir() {
            return Ok(Vec::new());
        }

        Ok(self
            .tree
            .children(&access.get_node().id())
            .into_iter()
            .map(|child| dir.join(child.real_path.basename()))
            .collect())
    }

    /// Walks the tree depth first, calling `visitor` with every node the conditions allow.
    pub fn walk(
        &self,
        mut visitor: impl FnMut(&FilePath, &FileNode) -> LayerTreeResult<()>,
        conditions: WalkConditions<'_, FileNode>,
    ) -> LayerTreeResult<()> {
        DepthFirstWalker::new(&self.tree, conditions).walk(|node| visitor(&node.real_path, node))
    }

    /// Returns `true` if both trees hold the same nodes with the same references.
    pub fn equal(&self, other: &FileTree) -> bool {
        self.tree.len() == other.tree.len()
            && self
                .tree
                .nodes()
                .all(|node| other.tree.node(&node.id()) == Some(node))
    }

    /// Compares the real paths of both trees.
    ///
    /// Returns the paths only `other` has, followed by the paths only `self` has.
    pub fn path_diff(&self, other: &FileTree) -> (Vec<FilePath>, Vec<FilePath>) {
        let ours: BTreeSet<FilePath> = self.all_real_paths().into_iter().collect();
        let theirs: BTreeSet<FilePath> = other.all_real_paths().into_iter().collect();

        let extra = theirs.difference(&ours).cloned().collect();
        let missing = ours.difference(&theirs).cloned().collect();

        (extra, missing)
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: Merge
//--------------------------------------------------------------------------------------------------

impl FileTree {
    /// Overlays `upper` onto this tree.
    ///
    /// Directories of `upper` are applied before their entries. Each directory replaces the node
    /// at its path, then its opaque marker removes everything below it and its whiteouts remove
    /// the paths they hide, and only then are its other entries grafted. Whiteouts therefore
    /// only hide paths of the layers below `upper`. A node without a reference keeps the
    /// reference of the node it replaces if both have the same type.
    pub fn merge(&mut self, upper: &FileTree) -> LayerTreeResult<()> {
        let conditions = WalkConditions::new()
            .with_should_continue_branch(|node: &FileNode| !node.real_path.is_whiteout())
            .with_should_visit(|node: &FileNode| !node.real_path.is_whiteout());

        DepthFirstWalker::new(&upper.tree, conditions).walk(|node| {
            self.graft(node)?;
            if !node.is_dir() {
                return Ok(());
            }

            if upper.has_opaque_directory(&node.real_path) {
                tracing::debug!(path = %node.real_path, "applying opaque directory");
                self.remove_exact_child_paths(&node.real_path)?;
            }

            for child in upper.tree.children(&node.id()) {
                if !child.real_path.is_whiteout() || child.real_path.is_opaque_whiteout() {
                    continue;
                }

                let hidden = child.real_path.un_whiteout()?;
                tracing::debug!(path = %hidden, "applying whiteout");
                self.remove_path(hidden)?;
            }

            Ok(())
        })
    }

    /// Returns `true` if the directory at `dir` holds an opaque marker.
    pub fn has_opaque_directory(&self, dir: &FilePath) -> bool {
        self.tree.has_node(&NodeId::from(&dir.opaque_whiteout()))
    }

    fn graft(&mut self, node: &FileNode) -> LayerTreeResult<()> {
        let id = node.id();
        let mut copy = node.clone();

        let Some(existing) = self.tree.node(&id).cloned() else {
            return self.attach(copy);
        };

        if existing.file_type() != node.file_type() && existing.is_dir() {
            self.remove_child_paths(existing.real_path.clone())?;
        }

        if existing.file_type() == node.file_type() && copy.reference.is_none() {
            copy.reference = existing.reference;
        }

        self.tree.replace(&id, copy)
    }

    /// Removes the children of the directory at exactly `dir`, following no links.
    fn remove_exact_child_paths(&mut self, dir: &FilePath) -> LayerTreeResult<()> {
        let id = NodeId::from(dir);
        if !self.tree.node(&id).is_some_and(FileNode::is_dir) {
            return Ok(());
        }

        let children: Vec<NodeId> = self.tree.child_ids(&id).cloned().collect();
        for child in children {
            self.tree.remove_node(&child)?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

use futures::{Stream, StreamExt};

use crate::{
    file::{FileType, Metadata, Reference},
    index::Index,
    LayerTreeError, LayerTreeResult,
};

use super::FileTree;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Builds the tree of one layer from archive entry metadata, recording every entry in an index.
///
/// Entries are applied in the order they arrive. Devices, fifos, sockets and irregular entries
/// become regular file nodes, while the index keeps their exact [`FileType`].
pub struct LayerBuilder<'a> {
    tree: &'a mut FileTree,
    index: &'a Index,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> LayerBuilder<'a> {
    /// Creates a builder that adds entries to `tree` and `index`.
    pub fn new(tree: &'a mut FileTree, index: &'a Index) -> Self {
        Self { tree, index }
    }

    /// Adds a single entry and returns the reference of its node.
    ///
    /// A symlink without a destination ends every chain through it.
    ///
    /// ## Errors
    ///
    /// Returns an error if the entry conflicts with a node already in the tree, or if a hardlink
    /// has no destination.
    pub fn add(&mut self, metadata: Metadata) -> LayerTreeResult<Reference> {
        let path = metadata.get_path().clone();
        let destination = metadata.get_link_destination().clone();

        let result = match metadata.get_file_type() {
            FileType::Directory => self.tree.add_dir(path.clone()),
            FileType::SymLink => self
                .tree
                .add_symlink(path.clone(), destination.unwrap_or_default()),
            FileType::HardLink => match destination.filter(|target| !target.is_empty()) {
                Some(target) => self.tree.add_hardlink(path.clone(), target),
                None => Err(LayerTreeError::custom(anyhow::anyhow!(
                    "hardlink without destination: {path}"
                ))),
            },
            FileType::Regular
            | FileType::CharacterDevice
            | FileType::BlockDevice
            | FileType::Fifo
            | FileType::Socket
            | FileType::Irregular => self.tree.add_file(path.clone()),
        };

        match result {
            Ok(reference) => {
                self.index.add(reference.clone(), metadata);
                Ok(reference)
            }
            Err(error) => {
                tracing::warn!(%path, %error, "failed to add entry to layer");
                Err(error)
            }
        }
    }

    /// Adds every entry in order and returns how many were added.
    ///
    /// Stops at the first entry that cannot be added.
    pub fn add_all(
        &mut self,
        entries: impl IntoIterator<Item = Metadata>,
    ) -> LayerTreeResult<usize> {
        let mut count = 0;
        for metadata in entries {
            self.add(metadata)?;
            count += 1;
        }

        Ok(count)
    }

    /// Adds every entry of an asynchronous stream in order and returns how many were added.
    ///
    /// Stops at the first entry that cannot be added.
    pub async fn add_stream(
        &mut self,
        entries: impl Stream<Item = Metadata>,
    ) -> LayerTreeResult<usize> {
        futures::pin_mut!(entries);

        let mut count = 0;
        while let Some(metadata) = entries.next().await {
            self.add(metadata)?;
            count += 1;
        }

        tracing::debug!(count, "finished layer stream");
        Ok(count)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use futures::stream;

    use crate::file::FilePath;

    use super::*;

    fn entry(path: &str, file_type: FileType) -> Metadata {
        Metadata::builder().path(path).file_type(file_type).build()
    }

    #[test_log::test]
    fn test_layer_builder_maps_file_types() -> anyhow::Result<()> {
        let mut tree = FileTree::new();
        let index = Index::new();

        let count = LayerBuilder::new(&mut tree, &index).add_all([
            entry("/dev", FileType::Directory),
            entry("/dev/null", FileType::CharacterDevice),
            Metadata::builder()
                .path("/dev/stdin")
                .file_type(FileType::SymLink)
                .link_destination("/proc/self/fd/0")
                .build(),
            Metadata::builder()
                .path("/dev/zero2")
                .file_type(FileType::HardLink)
                .link_destination("dev/null")
                .build(),
        ])?;

        assert_eq!(count, 4);
        assert_eq!(index.len(), 4);
        assert_eq!(tree.len(), 5);
        assert_eq!(index.get_by_file_type(FileType::CharacterDevice).len(), 1);

        let resolution = tree
            .file("/dev/zero2", &[crate::filetree::LinkResolutionOption::FollowBasenameLinks])?
            .and_then(|resolution| resolution.reference);
        assert_eq!(
            resolution.map(|reference| reference.real_path),
            Some(FilePath::new("/dev/null"))
        );

        Ok(())
    }

    #[test_log::test]
    fn test_layer_builder_stops_at_first_error() -> anyhow::Result<()> {
        let mut tree = FileTree::new();
        let index = Index::new();

        let result = LayerBuilder::new(&mut tree, &index).add_all([
            entry("/etc", FileType::Directory),
            entry("/etc", FileType::Regular),
            entry("/etc/hosts", FileType::Regular),
        ]);

        assert!(matches!(result, Err(LayerTreeError::TypeMismatch { .. })));
        assert_eq!(index.len(), 1);
        assert!(!tree.has_path("/etc/hosts", &[]));

        let result = LayerBuilder::new(&mut tree, &index)
            .add(entry("/bin/ln", FileType::HardLink));
        assert!(matches!(result, Err(LayerTreeError::Custom(_))));

        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_layer_builder_add_stream() -> anyhow::Result<()> {
        let mut tree = FileTree::new();
        let index = Index::new();

        let entries = stream::iter(vec![
            entry("/usr/bin/env", FileType::Regular),
            entry("/usr/bin/awk", FileType::Regular),
        ]);

        let count = LayerBuilder::new(&mut tree, &index)
            .add_stream(entries)
            .await?;

        assert_eq!(count, 2);
        assert!(tree.has_path("/usr/bin/awk", &[]));
        assert_eq!(index.get_by_basename("env")?.len(), 1);

        Ok(())
    }
}

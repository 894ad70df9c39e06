use futures::stream;
use layertree::{
    file::{FilePath, FileType, Metadata, ReferenceIdGenerator},
    filetree::{FileTree, LayerBuilder, LinkResolutionOption, UnionTree},
    index::{Index, SearchContext},
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Entries of a base layer, as a tar decoder would emit them
const BASE_LAYER: &str = r#"[
    { "path": "bin", "file_type": "directory", "mode": 16877 },
    { "path": "bin/busybox", "file_type": "regular", "size": 919304, "mode": 33261, "mime_type": "application/x-executable" },
    { "path": "bin/sh", "file_type": "sym-link", "link_destination": "/bin/busybox", "mode": 41471 },
    { "path": "bin/ls", "file_type": "hard-link", "link_destination": "bin/busybox", "mode": 33261 },
    { "path": "dev/console", "file_type": "character-device", "mode": 8576 },
    { "path": "etc/os-release", "file_type": "regular", "size": 164, "mode": 33188, "mod_time": "2024-06-01T12:00:00Z" },
    { "path": "etc/motd", "file_type": "regular", "size": 283, "mode": 33188 }
]"#;

/// Entries of a layer on top of the base layer
const UPPER_LAYER: &str = r#"[
    { "path": "etc/.wh.motd", "file_type": "regular" },
    { "path": "etc/os-release", "file_type": "regular", "size": 170, "mode": 33188 },
    { "path": "usr/local/bin/app", "file_type": "regular", "size": 4096, "mode": 33261, "mime_type": "application/x-executable" }
]"#;

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test(tokio::test)]
async fn test_layers_from_decoded_records() -> anyhow::Result<()> {
    let generator = ReferenceIdGenerator::new();
    let index = Index::new();

    let base = build_layer(&generator, &index, BASE_LAYER).await?;
    let upper = build_layer(&generator, &index, UPPER_LAYER).await?;
    assert_eq!(index.len(), 10);

    let squashed = UnionTree::from_layers([&base, &upper]).squash()?;

    assert!(!squashed.has_path("/etc/motd", &[]));
    assert!(squashed.has_path("/dev/console", &[]));
    assert!(squashed.has_path("/usr/local/bin/app", &[]));

    let ls = squashed
        .file("/bin/ls", &[LinkResolutionOption::FollowBasenameLinks])?
        .and_then(|resolution| resolution.reference)
        .map(|reference| reference.real_path);
    assert_eq!(ls, Some(FilePath::new("/bin/busybox")));

    let os_release = squashed
        .file("/etc/os-release", &[])?
        .and_then(|resolution| resolution.reference)
        .and_then(|reference| index.get(reference.id));
    assert_eq!(
        os_release.map(|entry| *entry.metadata.get_size()),
        Some(170)
    );

    let devices = index.get_by_file_type(FileType::CharacterDevice);
    assert_eq!(devices.len(), 1);
    assert_eq!(*devices[0].metadata.get_mode(), 8576);
    assert_eq!(FileType::from_mode(8576), FileType::CharacterDevice);

    let context = SearchContext::new(&squashed, Some(&index));
    let executables = context.search_by_mime_type(&["application/x-executable"])?;
    assert_eq!(
        executables
            .iter()
            .map(|resolution| resolution.request_path.to_string())
            .collect::<Vec<_>>(),
        vec!["/bin/busybox", "/usr/local/bin/app"]
    );

    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_layers_concurrent_lookups_on_squashed_tree() -> anyhow::Result<()> {
    let generator = ReferenceIdGenerator::new();
    let index = Index::new();

    let base = build_layer(&generator, &index, BASE_LAYER).await?;
    let squashed = std::sync::Arc::new(UnionTree::from_layers([&base]).squash()?);

    let mut handles = Vec::new();
    for path in ["/bin/sh", "/bin/ls", "/etc/os-release", "/missing"] {
        let squashed = squashed.clone();
        handles.push(tokio::spawn(async move {
            squashed.has_path(path, &[LinkResolutionOption::FollowBasenameLinks])
        }));
    }

    let mut found = Vec::new();
    for handle in handles {
        found.push(handle.await?);
    }
    assert_eq!(found, vec![true, true, true, false]);

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

async fn build_layer(
    generator: &ReferenceIdGenerator,
    index: &Index,
    records: &str,
) -> anyhow::Result<FileTree> {
    let entries: Vec<Metadata> = serde_json::from_str(records)?;

    let mut tree = FileTree::with_id_generator(generator.clone());
    LayerBuilder::new(&mut tree, index)
        .add_stream(stream::iter(entries))
        .await?;

    Ok(tree)
}

use layertree::{
    file::{FilePath, FileResolution, FileType, Metadata, ReferenceIdGenerator},
    filetree::{FileTree, LayerBuilder, UnionTree},
    index::{Index, SearchContext},
    LayerTreeError,
};

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[test_log::test]
fn test_search_by_glob_with_index_skips_stale_entries() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let context = SearchContext::new(&squashed, Some(&index));

    // The lower layer's copy of app.jar was replaced, the old.jar was whited out
    let jars = context.search_by_glob("**/*.jar", &[])?;
    assert_eq!(request_paths(&jars), vec!["/opt/app/app.jar"]);

    let upper_jar = index
        .get_by_basename("app.jar")?
        .into_iter()
        .map(|entry| entry.reference)
        .last();
    assert_eq!(jars[0].reference, upper_jar);

    Ok(())
}

#[test_log::test]
fn test_search_with_and_without_index_agree() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let indexed = SearchContext::new(&squashed, Some(&index));
    let unindexed = SearchContext::builder().tree(&squashed).build();

    for pattern in ["**/*.jar", "**/os-release", "**/lib*.so*", "/usr/lib/**/*.so"] {
        let mut with_index = request_paths(&indexed.search_by_glob(pattern, &[])?);
        let mut without_index = request_paths(&unindexed.search_by_glob(pattern, &[])?);
        with_index.sort();
        without_index.sort();
        assert_eq!(with_index, without_index, "pattern {pattern}");
    }

    Ok(())
}

#[test_log::test]
fn test_search_by_glob_applies_requirement() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let context = SearchContext::new(&squashed, Some(&index));

    assert_eq!(
        request_paths(&context.search_by_glob("/usr/lib/**/*.so", &[])?),
        vec!["/usr/lib/x86_64/libz.so"]
    );
    assert_eq!(
        request_paths(&context.search_by_glob("**/*.so", &[])?),
        vec!["/usr/lib/x86_64/libz.so", "/opt/app/native/libjni.so"]
    );

    Ok(())
}

#[test_log::test]
fn test_search_by_path_follows_basename_links() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let context = SearchContext::new(&squashed, Some(&index));

    let found = context.search_by_path("/usr/bin/java", &[])?;
    assert_eq!(found.len(), 1);
    assert_eq!(
        found[0].reference.as_ref().map(|reference| reference.real_path.clone()),
        Some(FilePath::new("/opt/jdk/bin/java"))
    );

    assert!(context.search_by_path("/opt/app/old.jar", &[])?.is_empty());
    assert!(context.search_by_path("/opt", &[])?.is_empty());

    Ok(())
}

#[test_log::test]
fn test_search_by_basename_extension_and_mime_type() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let indexed = SearchContext::new(&squashed, Some(&index));
    let unindexed = SearchContext::new(&squashed, None);

    assert_eq!(
        request_paths(&indexed.search_by_basename("os-release", &[])?),
        vec!["/etc/os-release"]
    );
    assert_eq!(
        request_paths(&unindexed.search_by_basename("os-release", &[])?),
        vec!["/etc/os-release"]
    );
    assert_eq!(
        request_paths(&indexed.search_by_basename_glob("lib*", &[])?),
        vec!["/usr/lib/x86_64/libz.so", "/opt/app/native/libjni.so"]
    );
    assert_eq!(
        request_paths(&indexed.search_by_extension(".jar", &[])?),
        vec!["/opt/app/app.jar"]
    );
    assert_eq!(
        request_paths(&unindexed.search_by_extension("jar", &[])?),
        vec!["/opt/app/app.jar"]
    );
    assert_eq!(
        request_paths(&indexed.search_by_mime_type(&["application/java-archive"])?),
        vec!["/opt/app/app.jar"]
    );

    assert!(matches!(
        unindexed.search_by_mime_type(&["application/java-archive"]),
        Err(LayerTreeError::MissingIndex(_))
    ));
    assert!(matches!(
        indexed.search_by_basename("bin/java", &[]),
        Err(LayerTreeError::InvalidGlob(_))
    ));
    assert!(matches!(
        unindexed.search_by_basename_glob("**", &[]),
        Err(LayerTreeError::InvalidGlob(_))
    ));

    Ok(())
}

#[test_log::test]
fn test_search_by_glob_full_path_and_fallback() -> anyhow::Result<()> {
    let (squashed, index) = sample_image()?;
    let context = SearchContext::new(&squashed, Some(&index));

    assert_eq!(
        request_paths(&context.search_by_glob("/etc/os-release", &[])?),
        vec!["/etc/os-release"]
    );
    assert_eq!(
        request_paths(&context.search_by_glob("/opt/app/*", &[])?),
        vec!["/opt/app/app.jar"]
    );
    assert_eq!(
        request_paths(&context.search_by_glob("**/*.{jar,so}", &[])?),
        vec!["/opt/app/app.jar", "/opt/app/native/libjni.so", "/usr/lib/x86_64/libz.so"]
    );

    Ok(())
}

#[test_log::test]
fn test_search_relative_and_bare_extension_patterns_agree() -> anyhow::Result<()> {
    let index = Index::new();
    let mut tree = FileTree::new();
    LayerBuilder::new(&mut tree, &index).add_all([
        file("/a/bar.py", None),
        file("/bar2.py", None),
        file("/a/foo.", None),
    ])?;

    let indexed = SearchContext::new(&tree, Some(&index));
    let unindexed = SearchContext::new(&tree, None);

    assert_eq!(request_paths(&indexed.search_by_glob("*.py", &[])?), vec!["/bar2.py"]);
    assert_eq!(request_paths(&unindexed.search_by_glob("*.py", &[])?), vec!["/bar2.py"]);
    assert_eq!(request_paths(&indexed.search_by_glob("**/*.", &[])?), vec!["/a/foo."]);
    assert_eq!(request_paths(&unindexed.search_by_glob("**/*.", &[])?), vec!["/a/foo."]);

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn sample_image() -> anyhow::Result<(FileTree, Index)> {
    let generator = ReferenceIdGenerator::new();
    let index = Index::new();

    let mut lower = FileTree::with_id_generator(generator.clone());
    LayerBuilder::new(&mut lower, &index).add_all([
        file("/etc/os-release", None),
        file("/usr/lib/x86_64/libz.so", None),
        file("/opt/jdk/bin/java", Some("application/x-executable")),
        symlink("/usr/bin/java", "/opt/jdk/bin/java"),
        file("/opt/app/app.jar", Some("application/java-archive")),
        file("/opt/app/old.jar", Some("application/java-archive")),
    ])?;

    let mut upper = FileTree::with_id_generator(generator.clone());
    LayerBuilder::new(&mut upper, &index).add_all([
        file("/opt/app/app.jar", Some("application/java-archive")),
        file("/opt/app/.wh.old.jar", None),
        file("/opt/app/native/libjni.so", None),
    ])?;

    let squashed = UnionTree::from_layers([&lower, &upper]).squash()?;
    Ok((squashed, index))
}

fn file(path: &str, mime_type: Option<&str>) -> Metadata {
    match mime_type {
        Some(mime_type) => Metadata::builder()
            .path(path)
            .file_type(FileType::Regular)
            .mime_type(mime_type)
            .build(),
        None => Metadata::builder()
            .path(path)
            .file_type(FileType::Regular)
            .build(),
    }
}

fn symlink(path: &str, target: &str) -> Metadata {
    Metadata::builder()
        .path(path)
        .file_type(FileType::SymLink)
        .link_destination(target)
        .build()
}

fn request_paths(resolutions: &[FileResolution]) -> Vec<String> {
    resolutions
        .iter()
        .map(|resolution| resolution.request_path.to_string())
        .collect()
}

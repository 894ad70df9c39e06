use std::collections::{BTreeSet, HashMap};

use globset::GlobBuilder;
use parking_lot::RwLock;

use crate::{
    file::{FileType, Metadata, Reference, ReferenceId},
    LayerTreeError, LayerTreeResult, DIR_SEPARATOR,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A file recorded in an [`Index`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// The file the entry describes
    pub reference: Reference,

    /// The archive metadata of the file
    pub metadata: Metadata,
}

/// Lookup tables over every file described by the layers of an image.
///
/// The index is independent of any tree. It remembers every entry ever added, so lookups may
/// return files that a later layer removed; [`SearchContext`](super::SearchContext) filters
/// results against a squashed tree.
///
/// All methods take `&self`. Lookups run concurrently, additions are serialized.
#[derive(Debug, Default)]
pub struct Index {
    tables: RwLock<IndexTables>,
}

#[derive(Debug, Default)]
struct IndexTables {
    entries: HashMap<ReferenceId, IndexEntry>,
    by_basename: HashMap<String, BTreeSet<ReferenceId>>,
    by_extension: HashMap<String, BTreeSet<ReferenceId>>,
    by_mime_type: HashMap<String, BTreeSet<ReferenceId>>,
    by_file_type: HashMap<FileType, BTreeSet<ReferenceId>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Index {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `metadata` for the file behind `reference`.
    ///
    /// Adding a reference that is already indexed replaces its entry.
    pub fn add(&self, reference: Reference, metadata: Metadata) {
        let mut tables = self.tables.write();
        let id = reference.id;

        if let Some(previous) = tables.entries.remove(&id) {
            tracing::debug!(%id, path = %reference.real_path, "overwriting index entry");
            tables.unlink(&previous);
        }

        let entry = IndexEntry {
            reference,
            metadata,
        };
        tables.link(&entry);
        tables.entries.insert(id, entry);
    }

    /// Returns the entry of the reference with the given id.
    pub fn get(&self, id: ReferenceId) -> Option<IndexEntry> {
        self.tables.read().entries.get(&id).cloned()
    }

    /// Returns `true` if the reference with the given id is indexed.
    pub fn exists(&self, id: ReferenceId) -> bool {
        self.tables.read().entries.contains_key(&id)
    }

    /// Returns the number of indexed files.
    pub fn len(&self) -> usize {
        self.tables.read().entries.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.tables.read().entries.is_empty()
    }

    /// Returns every distinct basename in the index, sorted.
    pub fn basenames(&self) -> Vec<String> {
        let tables = self.tables.read();
        let mut basenames: Vec<String> = tables.by_basename.keys().cloned().collect();
        basenames.sort();
        basenames
    }

    /// Returns the files named exactly `basename`.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidGlob` if `basename` contains a `/`.
    pub fn get_by_basename(&self, basename: &str) -> LayerTreeResult<Vec<IndexEntry>> {
        validate_basename(basename)?;

        let tables = self.tables.read();
        Ok(tables.entries_for(tables.by_basename.get(basename)))
    }

    /// Returns the files whose basename matches the single-segment glob `pattern`.
    ///
    /// ## Errors
    ///
    /// Returns an error if `pattern` contains `/` or `**`, or if it is not a valid glob.
    pub fn get_by_basename_glob(&self, pattern: &str) -> LayerTreeResult<Vec<IndexEntry>> {
        validate_basename_glob(pattern)?;

        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()?
            .compile_matcher();

        let tables = self.tables.read();
        let ids: BTreeSet<ReferenceId> = tables
            .by_basename
            .iter()
            .filter(|(basename, _)| matcher.is_match(basename.as_str()))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();

        Ok(tables.entries_for(Some(&ids)))
    }

    /// Returns the files whose basename ends in `extension`, e.g. `.gz` or `.tar.gz`.
    ///
    /// A missing leading `.` is added.
    pub fn get_by_extension(&self, extension: &str) -> Vec<IndexEntry> {
        let extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };

        let tables = self.tables.read();
        tables.entries_for(tables.by_extension.get(&extension))
    }

    /// Returns the files with the given MIME type.
    pub fn get_by_mime_type(&self, mime_type: &str) -> Vec<IndexEntry> {
        let tables = self.tables.read();
        tables.entries_for(tables.by_mime_type.get(mime_type))
    }

    /// Returns the files of the given type.
    pub fn get_by_file_type(&self, file_type: FileType) -> Vec<IndexEntry> {
        let tables = self.tables.read();
        tables.entries_for(tables.by_file_type.get(&file_type))
    }
}

impl IndexTables {
    fn link(&mut self, entry: &IndexEntry) {
        let id = entry.reference.id;
        let basename = entry.metadata.get_path().basename();

        self.by_basename
            .entry(basename.to_string())
            .or_default()
            .insert(id);

        for extension in file_extensions(basename) {
            self.by_extension.entry(extension).or_default().insert(id);
        }

        if let Some(mime_type) = entry.metadata.get_mime_type() {
            if !mime_type.is_empty() {
                self.by_mime_type
                    .entry(mime_type.clone())
                    .or_default()
                    .insert(id);
            }
        }

        self.by_file_type
            .entry(*entry.metadata.get_file_type())
            .or_default()
            .insert(id);
    }

    fn unlink(&mut self, entry: &IndexEntry) {
        let id = entry.reference.id;
        let basename = entry.metadata.get_path().basename();

        remove_id(&mut self.by_basename, basename, id);
        for extension in file_extensions(basename) {
            remove_id(&mut self.by_extension, &extension, id);
        }

        if let Some(mime_type) = entry.metadata.get_mime_type() {
            remove_id(&mut self.by_mime_type, mime_type, id);
        }

        if let Some(ids) = self.by_file_type.get_mut(entry.metadata.get_file_type()) {
            ids.remove(&id);
        }
    }

    /// Joins ids with their entries, in id order.
    fn entries_for(&self, ids: Option<&BTreeSet<ReferenceId>>) -> Vec<IndexEntry> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.entries.get(id).cloned())
            .collect()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns every extension of `basename`, longest first.
///
/// Each extension starts at a `.` of the basename. Leading dots do not start an extension and a
/// basename ending in `.` has none, so `a.tar.gz` yields `.tar.gz` and `.gz` while `.bashrc`
/// yields nothing.
pub fn file_extensions(basename: &str) -> Vec<String> {
    let trimmed = basename.trim_start_matches('.');
    if trimmed.ends_with('.') {
        return Vec::new();
    }

    trimmed
        .match_indices('.')
        .map(|(position, _)| trimmed[position..].to_string())
        .collect()
}

pub(crate) fn validate_basename(basename: &str) -> LayerTreeResult<()> {
    if basename.contains(DIR_SEPARATOR) {
        return Err(LayerTreeError::InvalidGlob(format!(
            "basename cannot contain a path separator: {basename}"
        )));
    }

    Ok(())
}

pub(crate) fn validate_basename_glob(pattern: &str) -> LayerTreeResult<()> {
    validate_basename(pattern)?;
    if pattern.contains("**") {
        return Err(LayerTreeError::InvalidGlob(format!(
            "basename glob cannot contain '**': {pattern}"
        )));
    }

    Ok(())
}

fn remove_id(table: &mut HashMap<String, BTreeSet<ReferenceId>>, key: &str, id: ReferenceId) {
    if let Some(ids) = table.get_mut(key) {
        ids.remove(&id);
        if ids.is_empty() {
            table.remove(key);
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

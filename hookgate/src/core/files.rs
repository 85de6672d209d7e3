//! Project-relative file entries and the ordered collection handed to tasks.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::core::path::{display_slash, normalize};

/// A file path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: normalize(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Containing directory (empty for files at the project root).
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }

    /// Path rendered with `/` separators, as passed to external tools.
    pub fn to_slash(&self) -> String {
        display_slash(&self.path)
    }
}

/// Ordered, duplicate-free set of [`FileEntry`] values.
///
/// Insertion order is preserved; inserting a path that is already present is a no-op.
#[derive(Debug, Clone, Default)]
pub struct FilesCollection {
    entries: Vec<FileEntry>,
    seen: HashSet<PathBuf>,
}

impl FilesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry`, returning false if the path was already present.
    pub fn insert(&mut self, entry: FileEntry) -> bool {
        if !self.seen.insert(entry.path.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    /// Keep entries whose extension matches one of `extensions` (case-insensitive,
    /// without the leading dot).
    pub fn extensions<S: AsRef<str>>(&self, extensions: &[S]) -> FilesCollection {
        self.filter(|entry| {
            entry.extension().is_some_and(|ext| {
                extensions
                    .iter()
                    .any(|wanted| wanted.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
        })
    }

    /// Keep entries whose path matches at least one glob pattern.
    pub fn names_matching<S: AsRef<str>>(&self, patterns: &[S]) -> Result<FilesCollection> {
        let set = build_glob_set(patterns)?;
        Ok(self.filter(|entry| set.is_match(entry.path())))
    }

    /// Drop entries whose path matches any glob pattern.
    pub fn ignore_patterns<S: AsRef<str>>(&self, patterns: &[S]) -> Result<FilesCollection> {
        if patterns.is_empty() {
            return Ok(self.clone());
        }
        let set = build_glob_set(patterns)?;
        Ok(self.filter(|entry| !set.is_match(entry.path())))
    }

    pub fn filter(&self, mut keep: impl FnMut(&FileEntry) -> bool) -> FilesCollection {
        self.entries.iter().filter(|e| keep(*e)).cloned().collect()
    }
}

impl PartialEq for FilesCollection {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for FilesCollection {}

impl FromIterator<FileEntry> for FilesCollection {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        let mut files = FilesCollection::new();
        for entry in iter {
            files.insert(entry);
        }
        files
    }
}

impl<'a> IntoIterator for &'a FilesCollection {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn build_glob_set<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{pattern}'"))?);
    }
    builder.build().context("build glob set")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(paths: &[&str]) -> FilesCollection {
        paths.iter().map(FileEntry::new).collect()
    }

    fn names(files: &FilesCollection) -> Vec<String> {
        files.iter().map(FileEntry::to_slash).collect()
    }

    #[test]
    fn entry_exposes_directory_and_name() {
        let entry = FileEntry::new("./src/core/files.rs");
        assert_eq!(entry.path(), Path::new("src/core/files.rs"));
        assert_eq!(entry.directory(), Path::new("src/core"));
        assert_eq!(entry.file_name(), "files.rs");
        assert_eq!(entry.extension(), Some("rs"));

        let root = FileEntry::new("Makefile");
        assert_eq!(root.directory(), Path::new(""));
        assert_eq!(root.extension(), None);
    }

    #[test]
    fn insert_deduplicates_and_keeps_order() {
        let files = collection(&["b.js", "a.js", "./b.js", "c.js"]);
        assert_eq!(names(&files), vec!["b.js", "a.js", "c.js"]);
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn extensions_filter_is_case_insensitive() {
        let files = collection(&["a.feature", "b.FEATURE", "c.rs", "Makefile"]);
        let features = files.extensions(&["feature"]);
        assert_eq!(names(&features), vec!["a.feature", "b.FEATURE"]);
        assert!(files.extensions(&[".php"]).is_empty());
    }

    #[test]
    fn names_matching_uses_globs() {
        let files = collection(&["src/a.ts", "tests/b.ts", "src/c.rs"]);
        let matched = files.names_matching(&["src/*.ts"]).expect("glob");
        assert_eq!(names(&matched), vec!["src/a.ts"]);
    }

    #[test]
    fn ignore_patterns_drops_matches() {
        let files = collection(&["vendor/x.js", "app.js"]);
        let kept = files.ignore_patterns(&["vendor/**"]).expect("glob");
        assert_eq!(names(&kept), vec!["app.js"]);
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let files = collection(&["a.js"]);
        let err = files.names_matching(&["a[.js"]).unwrap_err();
        assert!(err.to_string().contains("invalid glob"));
    }
}

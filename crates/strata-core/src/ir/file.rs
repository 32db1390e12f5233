//! Emittable files.

use indexmap::IndexMap;

use crate::ir::{
    package::{Dialect, Package},
    store::NodeRef,
};

/// One output file: a package plus the ordered nodes rendered into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittableFile {
    /// Path relative to the output root.
    pub path: String,
    pub package: Package,
    pub dialect: Dialect,
    pub nodes: Vec<NodeRef>,
    pub doc: Option<String>,
}

impl EmittableFile {
    pub fn new(path: impl Into<String>, package: Package, dialect: Dialect) -> Self {
        Self {
            path: path.into(),
            package,
            dialect,
            nodes: Vec::new(),
            doc: None,
        }
    }
}

/// Every file of a run, keyed and ordered by path of first creation.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    files: IndexMap<String, EmittableFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the file at `path`.
    pub fn file(&mut self, path: &str, package: &Package, dialect: Dialect) -> &mut EmittableFile {
        self.files
            .entry(path.to_string())
            .or_insert_with(|| EmittableFile::new(path, package.clone(), dialect))
    }

    pub fn push(&mut self, path: &str, package: &Package, dialect: Dialect, node: NodeRef) {
        self.file(path, package, dialect).nodes.push(node);
    }

    pub fn get(&self, path: &str) -> Option<&EmittableFile> {
        self.files.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmittableFile> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn into_files(self) -> Vec<EmittableFile> {
        self.files.into_values().collect()
    }
}

//! Core domain types: case identifiers, test node paths, catalog entries,
//! the linkage mapping, and the coverage snapshot.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One documented case read from the catalog. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseEntry {
    /// Metadata keys other than `title` and `tags`, passed through untouched.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_yml::Value>,
    /// Directory name of the case.
    pub id: CaseId,
    /// Path to the `case.md` content file.
    pub path: PathBuf,
    /// Tags in document order; empty when the metadata has none.
    pub tags: Vec<String>,
    /// Required, non-empty title from the metadata block.
    pub title: String,
}

/// A case identifier such as `"001"`.
///
/// Equality is on the string form only: `"1"` and `"001"` are different
/// identifiers. Ordering is lexicographic, which matches numeric ordering
/// as long as identifiers share a fixed zero-padded width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(
    /// The raw identifier text.
    String,
);

impl CaseId {
    /// The identifier text.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Wrap an identifier string without validation. Marker arguments are
    /// kept verbatim so malformed ones surface as dangling references.
    pub fn new(raw: impl Into<String>) -> Self {
        return Self(raw.into());
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Snapshot of the relation between the catalog and the linkage mapping.
/// Recomputed on every analysis; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageResult {
    /// Number of identifiers in the catalog.
    pub catalog_size: usize,
    /// Catalog identifiers that at least one test links to.
    pub covered: BTreeSet<CaseId>,
    /// Linked identifiers with no catalog entry.
    pub dangling: BTreeSet<CaseId>,
    /// The full mapping the result was computed from.
    pub linkage: LinkageMapping,
    /// Catalog identifiers no test links to.
    pub uncovered: BTreeSet<CaseId>,
}

impl CoverageResult {
    /// True when every catalog case is covered and no test links to an unknown case.
    pub fn is_complete(&self) -> bool {
        return self.uncovered.is_empty() && self.dangling.is_empty();
    }

    /// Covered share of the catalog in percent. An empty catalog is 100.
    pub fn percentage(&self) -> f64 {
        if self.catalog_size == 0 {
            return 100.0;
        }
        let covered = f64::from(u32::try_from(self.covered.len()).unwrap_or(u32::MAX));
        let total = f64::from(u32::try_from(self.catalog_size).unwrap_or(u32::MAX));
        return covered / total * 100.0;
    }
}

/// Case identifier to the test node paths that link to it.
///
/// Values keep insertion order and duplicates: traversal order of files,
/// then top-to-bottom order within a file. Keys iterate in string order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LinkageMapping(
    /// Backing map.
    BTreeMap<CaseId, Vec<TestId>>,
);

impl LinkageMapping {
    /// Tests linked to `id`, in insertion order.
    pub fn get(&self, id: &CaseId) -> Option<&[TestId]> {
        return self.0.get(id).map(Vec::as_slice);
    }

    /// True when no test links to any case.
    pub fn is_empty(&self) -> bool {
        return self.0.is_empty();
    }

    /// Iterate `(case, tests)` pairs in case order.
    pub fn iter(&self) -> impl Iterator<Item = (&CaseId, &[TestId])> {
        return self.0.iter().map(|(id, tests)| return (id, tests.as_slice()));
    }

    /// All linked case identifiers.
    pub fn keys(&self) -> BTreeSet<CaseId> {
        return self.0.keys().cloned().collect();
    }

    /// Number of distinct linked case identifiers.
    pub fn len(&self) -> usize {
        return self.0.len();
    }

    /// Append `test` to the sequence for `id`, creating it on first sight.
    pub fn push(&mut self, id: CaseId, test: TestId) {
        self.0.entry(id).or_default().push(test);
    }
}

/// One `(case, test)` pair found by the decorator extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Identifier given as the marker's string argument.
    pub case_id: CaseId,
    /// Node path of the decorated function or method.
    pub test_id: TestId,
}

/// Node path of one test: `path/to/test_x.py::func` or
/// `path/to/test_x.py::Class::method`. The path part is always root-relative
/// and slash-separated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(
    /// The full node path.
    String,
);

impl TestId {
    /// The node path text.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// Build a node path for a module-level function or a class method.
    pub fn new(file: &str, class: Option<&str>, function: &str) -> Self {
        return match class {
            Some(class) => Self(format!("{file}::{class}::{function}")),
            None => Self(format!("{file}::{function}")),
        };
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// Non-empty and ASCII digits only.
pub fn is_all_digits(name: &str) -> bool {
    return !name.is_empty() && name.bytes().all(|b| return b.is_ascii_digit());
}

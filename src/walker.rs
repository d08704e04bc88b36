//! Source tree walking: which files under a root are candidate test files.
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::config::SourceFilter;

/// File name prefix pytest collects by default.
const TEST_FILE_PREFIX: &str = "test_";

/// Extension of scanned source files.
const TEST_FILE_SUFFIX: &str = ".py";

/// Lazily walk `root` and yield every `test_*.py` file the filter admits.
///
/// Recurses without a depth limit. Entries are visited in file-name order
/// within each directory, so repeated walks over an unchanged tree yield the
/// same sequence. Each call starts a fresh walk. Unreadable directory entries
/// are skipped.
pub fn test_files<'a>(root: &'a Path, filter: &'a SourceFilter) -> impl Iterator<Item = PathBuf> + 'a {
    return WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return !e.file_type().is_dir() && is_test_file_name(e.file_name()))
        .filter(move |e| return filter.should_scan(&relative_slash_path(root, e.path())))
        .map(walkdir::DirEntry::into_path);
}

/// Whether a file name follows the `test_*.py` convention.
fn is_test_file_name(name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    return name.starts_with(TEST_FILE_PREFIX) && name.ends_with(TEST_FILE_SUFFIX);
}

/// Render `path` relative to `root` with `/` separators on every platform.
/// Paths outside `root` are rendered whole.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    return relative
        .components()
        .filter_map(|c| {
            return match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                Component::CurDir | Component::ParentDir | Component::Prefix(_) | Component::RootDir => None,
            };
        })
        .collect::<Vec<_>>()
        .join("/");
}

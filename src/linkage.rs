//! Linkage aggregation: scan a source tree and merge per-file markers into
//! one case-to-tests mapping.
use std::path::Path;

use crate::config::SourceFilter;
use crate::error::{Diagnostic, Error, SourceError};
use crate::extractor;
use crate::types::{LinkageMapping, Marker};
use crate::walker;

/// Linkage mapping for a source tree plus the files that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkageScan {
    /// One entry per unreadable or unparsable source file, in walk order.
    pub diagnostics: Vec<Diagnostic>,
    /// Case identifier to linked node paths.
    pub mapping: LinkageMapping,
}

/// Merge per-file marker lists, given in walk order, into one mapping.
/// Every pair is appended; nothing is deduplicated.
pub fn aggregate<I>(per_file: I) -> LinkageMapping
where
    I: IntoIterator<Item = Vec<Marker>>,
{
    let mut mapping = LinkageMapping::default();
    for marker in per_file.into_iter().flatten() {
        mapping.push(marker.case_id, marker.test_id);
    }
    return mapping;
}

/// Scan every `test_*.py` under `root` and build the linkage mapping.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if `root` does not exist.
pub fn extract_linkage(root: &Path) -> Result<LinkageScan, Error> {
    return extract_linkage_filtered(root, &SourceFilter::default());
}

/// Like [`extract_linkage`], restricted to files the filter admits.
///
/// Files are read and parsed one at a time in walk order. A file that can't
/// be read or parsed contributes nothing and is reported as a diagnostic.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if `root` does not exist.
pub fn extract_linkage_filtered(root: &Path, filter: &SourceFilter) -> Result<LinkageScan, Error> {
    if !root.is_dir() {
        return Err(Error::MissingRoot { path: root.to_path_buf() });
    }

    let mut diagnostics = Vec::new();
    let mut per_file = Vec::new();

    for path in walker::test_files(root, filter) {
        let relative = walker::relative_slash_path(root, &path);
        let scanned = std::fs::read_to_string(&path)
            .map_err(SourceError::Unreadable)
            .and_then(|source| return extractor::extract_markers(&relative, &source));

        match scanned {
            Err(e) => diagnostics.push(Diagnostic::UnparsableSourceFile {
                path,
                reason: e.to_string(),
            }),
            Ok(markers) => per_file.push(markers),
        }
    }

    return Ok(LinkageScan {
        diagnostics,
        mapping: aggregate(per_file),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaseId, TestId};

    fn marker(case: &str, test: &str) -> Marker {
        Marker {
            case_id: CaseId::new(case),
            test_id: TestId::new("test_a.py", None, test),
        }
    }

    #[test]
    fn aggregate_preserves_file_then_source_order() {
        let mapping = aggregate(vec![
            vec![marker("002", "test_x"), marker("001", "test_y")],
            vec![],
            vec![marker("001", "test_z"), marker("001", "test_y")],
        ]);

        let tests: Vec<&str> = mapping
            .get(&CaseId::new("001"))
            .unwrap()
            .iter()
            .map(TestId::as_str)
            .collect();
        assert_eq!(tests, ["test_a.py::test_y", "test_a.py::test_z", "test_a.py::test_y"]);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn aggregate_of_nothing_is_empty() {
        assert!(aggregate(Vec::<Vec<Marker>>::new()).is_empty());
    }

    #[test]
    fn unparsable_files_become_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test_good.py"), "@tc(\"001\")\ndef test_ok():\n    pass\n").unwrap();
        std::fs::write(dir.path().join("test_bad.py"), "def test_broken(:\n").unwrap();
        std::fs::write(dir.path().join("test_binary.py"), [0xff_u8, 0xfe, 0x00]).unwrap();

        let scan = extract_linkage(dir.path()).unwrap();
        assert_eq!(scan.mapping.len(), 1);
        assert_eq!(scan.diagnostics.len(), 2);
        assert!(
            scan.diagnostics
                .iter()
                .all(|d| matches!(d, Diagnostic::UnparsableSourceFile { .. }))
        );

        let reasons: Vec<String> = scan
            .diagnostics
            .iter()
            .map(|d| match d {
                Diagnostic::UnparsableSourceFile { reason, .. } => reason.clone(),
                other => other.to_string(),
            })
            .collect();
        assert!(reasons[0].starts_with("syntax error at line "), "{}", reasons[0]);
        assert!(reasons[1].starts_with("unreadable: "), "{}", reasons[1]);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(extract_linkage(&missing), Err(Error::MissingRoot { .. })));
    }
}

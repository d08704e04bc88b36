//! Link markdown test-case documents to pytest tests.
//!
//! A catalog directory holds one all-digit directory per documented case,
//! each with a `case.md`. Test functions link to a case with a decorator
//! such as `@tc("001")`. The analyzer reads the catalog, scans the test tree
//! statically (nothing is imported or run) and reports which cases are
//! covered, which are not, and which decorators point at unknown cases.
//!
//! The two entry points are [`analyze`] and [`extract_linkage`]. Both are
//! pure functions of the paths they are given: no state survives between
//! calls, and concurrent calls on different trees don't interact.

pub mod catalog;
pub mod config;
pub mod coverage;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod grammar;
pub mod linkage;
pub mod report;
pub mod types;
pub mod walker;

use std::path::Path;

pub use crate::config::SourceFilter;
pub use crate::error::{Diagnostic, Error, SourceError};
pub use crate::linkage::{LinkageScan, extract_linkage};
pub use crate::types::{CaseEntry, CaseId, CoverageResult, LinkageMapping, TestId};

/// Everything one analysis run produced.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Valid catalog entries, sorted by identifier.
    pub cases: Vec<CaseEntry>,
    /// Coverage relation between the catalog and the linkage mapping.
    pub coverage: CoverageResult,
    /// Skipped case directories first, then skipped source files.
    pub diagnostics: Vec<Diagnostic>,
}

/// Read the catalog, scan the source tree, and resolve coverage.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if either root does not exist,
/// or `Error::Io` if the catalog directory cannot be listed.
pub fn analyze(catalog_root: &Path, source_root: &Path) -> Result<Analysis, Error> {
    return analyze_filtered(catalog_root, source_root, &SourceFilter::default());
}

/// Like [`analyze`], scanning only source files the filter admits.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if either root does not exist,
/// or `Error::Io` if the catalog directory cannot be listed.
pub fn analyze_filtered(catalog_root: &Path, source_root: &Path, filter: &SourceFilter) -> Result<Analysis, Error> {
    let catalog = catalog::read_catalog(catalog_root)?;
    let scan = linkage::extract_linkage_filtered(source_root, filter)?;
    let coverage = coverage::resolve(&catalog.ids(), &scan.mapping);

    let mut diagnostics = catalog.diagnostics;
    diagnostics.extend(scan.diagnostics);

    return Ok(Analysis {
        cases: catalog.entries,
        coverage,
        diagnostics,
    });
}

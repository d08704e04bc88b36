//! Text and JSON rendering of analysis results for the CLI.
use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::Analysis;
use crate::error::{Diagnostic, Error};
use crate::types::{CaseEntry, CaseId, CoverageResult, LinkageMapping};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Machine-readable JSON on stdout.
    Json,
    /// Aligned, human-readable lines.
    #[default]
    Text,
}

/// JSON shape of a coverage report.
#[derive(Serialize)]
struct CoverageReport<'a> {
    /// Number of cases in the catalog.
    catalog_size: usize,
    /// Covered case identifiers.
    covered: &'a BTreeSet<CaseId>,
    /// Identifiers linked from tests but absent from the catalog.
    dangling: &'a BTreeSet<CaseId>,
    /// Skipped case directories and source files.
    diagnostics: &'a [Diagnostic],
    /// Case identifier to linked node paths.
    linkage: &'a LinkageMapping,
    /// Covered share of the catalog, in percent.
    percentage: f64,
    /// Catalog identifiers with no linked test.
    uncovered: &'a BTreeSet<CaseId>,
}

/// Render the case list.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_cases(cases: &[CaseEntry], format: OutputFormat) -> Result<String, Error> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(cases)?);
    }

    let mut out = String::new();
    for case in cases {
        let _ = write!(out, "{}  {}", case.id, case.title);
        if !case.tags.is_empty() {
            let _ = write!(out, "  [{}]", case.tags.join(", "));
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{} cases", cases.len());
    return Ok(out);
}

/// Render a full coverage report.
///
/// Text output lists every catalog case as `COVERED` or `UNCOVERED`, then
/// every dangling reference with the tests that carry it, then a summary line.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_coverage(analysis: &Analysis, format: OutputFormat) -> Result<String, Error> {
    let coverage = &analysis.coverage;
    if format == OutputFormat::Json {
        let report = CoverageReport {
            catalog_size: coverage.catalog_size,
            covered: &coverage.covered,
            dangling: &coverage.dangling,
            diagnostics: &analysis.diagnostics,
            linkage: &coverage.linkage,
            percentage: coverage.percentage(),
            uncovered: &coverage.uncovered,
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut out = String::new();
    for case in &analysis.cases {
        write_case_line(&mut out, coverage, &case.id, &case.title);
    }
    for id in &coverage.dangling {
        for test in coverage.linkage.get(id).unwrap_or_default() {
            let _ = writeln!(out, "DANGLING   {id}  {test}");
        }
    }

    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "{}", summary_line(coverage));
    return Ok(out);
}

/// Render the bare linkage mapping.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_linkage(mapping: &LinkageMapping, format: OutputFormat) -> Result<String, Error> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(mapping)?);
    }

    let mut out = String::new();
    for (id, tests) in mapping.iter() {
        for test in tests {
            let _ = writeln!(out, "{id}  {test}");
        }
    }
    return Ok(out);
}

/// `N/M cases covered (P%), U uncovered, D dangling`.
pub fn summary_line(coverage: &CoverageResult) -> String {
    return format!(
        "{}/{} cases covered ({:.2}%), {} uncovered, {} dangling",
        coverage.covered.len(),
        coverage.catalog_size,
        coverage.percentage(),
        coverage.uncovered.len(),
        coverage.dangling.len(),
    );
}

/// One `COVERED`/`UNCOVERED` line for a catalog case.
fn write_case_line(out: &mut String, coverage: &CoverageResult, id: &CaseId, title: &str) {
    let tests = coverage.linkage.get(id).map_or(0, <[_]>::len);
    if tests == 0 {
        let _ = writeln!(out, "UNCOVERED  {id}  {title}");
    } else {
        let noun = if tests == 1 { "test" } else { "tests" };
        let _ = writeln!(out, "COVERED    {id}  {title} ({tests} {noun})");
    }
}

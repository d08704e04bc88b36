//! CLI commands: init, add, list, check, linkage.

use std::path::PathBuf;
use std::process::ExitCode;

use plaintest::catalog;
use plaintest::config::Config;
use plaintest::diagnostics;
use plaintest::error::Error;
use plaintest::linkage;
use plaintest::report::{self, OutputFormat};

/// Create a case document for `title` under the next free identifier.
///
/// # Errors
///
/// Returns errors from config loading or writing the case file.
pub fn add(title: &str) -> Result<(), Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let (id, path) = catalog::create_case(&config.test_cases_dir, title)?;
    eprintln!("Created case {id}");
    println!("{}", path.display());
    return Ok(());
}

/// Analyze the project and print the coverage report.
/// Exits 0 when every case is covered and nothing dangles, 1 otherwise.
///
/// # Errors
///
/// Returns errors from config loading, missing roots, or report rendering.
pub fn check(format: OutputFormat) -> Result<ExitCode, Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let analysis = plaintest::analyze_filtered(&config.test_cases_dir, &config.tests_dir, &config.filter)?;

    diagnostics::print_warnings(&analysis.diagnostics);
    print!("{}", report::render_coverage(&analysis, format)?);

    if analysis.coverage.is_complete() {
        return Ok(ExitCode::SUCCESS);
    }
    print_gap_hints(&analysis.coverage);
    return Ok(ExitCode::from(1));
}

/// Create the configured test-cases directory.
///
/// # Errors
///
/// Returns errors from config loading or directory creation.
pub fn init() -> Result<(), Error> {
    let config = Config::load(&PathBuf::from("."))?;
    std::fs::create_dir_all(&config.test_cases_dir)?;
    eprintln!("Initialized {}", config.test_cases_dir.display());
    return Ok(());
}

/// Print the linkage mapping without consulting the catalog.
///
/// # Errors
///
/// Returns errors from config loading, a missing tests root, or rendering.
pub fn linkage(format: OutputFormat) -> Result<(), Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let scan = linkage::extract_linkage_filtered(&config.tests_dir, &config.filter)?;

    diagnostics::print_warnings(&scan.diagnostics);
    print!("{}", report::render_linkage(&scan.mapping, format)?);
    return Ok(());
}

/// List every documented case.
///
/// # Errors
///
/// Returns errors from config loading, a missing catalog root, or rendering.
pub fn list(format: OutputFormat) -> Result<(), Error> {
    let config = Config::load(&PathBuf::from("."))?;
    let catalog = catalog::read_catalog(&config.test_cases_dir)?;

    diagnostics::print_warnings(&catalog.diagnostics);
    print!("{}", report::render_cases(&catalog.entries, format)?);
    return Ok(());
}

/// Print recovery hints to stderr for uncovered and dangling cases.
fn print_gap_hints(coverage: &plaintest::CoverageResult) {
    if !coverage.uncovered.is_empty() {
        eprintln!();
        eprintln!("hint: link a test to an uncovered case with a decorator:");
        if let Some(first) = coverage.uncovered.first() {
            eprintln!("  @tc(\"{first}\")");
        }
    }
    if !coverage.dangling.is_empty() {
        eprintln!();
        eprintln!("hint: dangling identifiers have no case directory; fix the decorator or run:");
        eprintln!("  plaintest add <title>");
    }
    return;
}

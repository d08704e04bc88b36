//! File watcher: runs `check` on startup, then re-runs on catalog or test changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::RecursiveMode;

use plaintest::catalog::CASE_FILE_NAME;
use plaintest::config::Config;
use plaintest::error::Error;
use plaintest::report::OutputFormat;

use crate::commands;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on changes to case documents or Python files.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return is_relevant_path(p))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return Error::WatchFailed {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Whether a changed path can affect the analysis. Directory events carry no
/// extension, so they count too (a case directory may have appeared).
fn is_relevant_path(path: &Path) -> bool {
    return match path.extension().and_then(|e| return e.to_str()) {
        None => true,
        Some("md") => path.file_name().is_some_and(|n| return n == CASE_FILE_NAME),
        Some("py") => true,
        Some(_) => false,
    };
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches the catalog and tests roots
/// recursively and re-checks on changes.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run(format: OutputFormat) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");

    eprintln!("watch: initial check");
    let mut last_code = run_check(format);

    let config = Config::load(&root)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    let watched = watch_roots(&mut watcher, &[config.test_cases_dir.as_path(), config.tests_dir.as_path()])?;
    eprintln!("watch: monitoring {watched} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(format);
    }

    return Ok(last_code);
}

/// Watch each existing root recursively. Returns how many were registered.
///
/// # Errors
///
/// Returns `Error::WatchFailed` if no root could be watched.
fn watch_roots(watcher: &mut impl notify::Watcher, roots: &[&Path]) -> Result<usize, Error> {
    let mut watched = 0_usize;
    let mut failures = Vec::new();
    for dir in roots {
        if !dir.exists() {
            failures.push(format!("{}: not found", dir.display()));
            continue;
        }
        match watcher.watch(dir, RecursiveMode::Recursive) {
            Err(e) => failures.push(format!("{}: {e}", dir.display())),
            Ok(()) => watched = watched.saturating_add(1),
        }
    }

    if watched == 0 {
        return Err(Error::WatchFailed {
            reason: format!("no directory could be watched ({})", failures.join("; ")),
        });
    }
    return Ok(watched);
}

/// Run check once and print result. Returns the exit code from check.
fn run_check(format: OutputFormat) -> ExitCode {
    return match commands::check(format) {
        Ok(code) => code,
        Err(e) => {
            plaintest::diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_case_documents_and_python_files_trigger() {
        assert!(is_relevant_path(Path::new("test-cases/004/case.md")));
        assert!(is_relevant_path(Path::new("tests/test_auth.py")));
        assert!(is_relevant_path(Path::new("test-cases/005")));
        assert!(!is_relevant_path(Path::new("README.md")));
        assert!(!is_relevant_path(Path::new("target/debug/plaintest.d")));
    }

    #[test]
    fn nothing_to_watch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut watcher = create_watcher(tx).unwrap();

        let missing = dir.path().join("test-cases");
        let also_missing = dir.path().join("tests");
        let err = watch_roots(&mut watcher, &[missing.as_path(), also_missing.as_path()]).unwrap_err();
        assert!(matches!(err, Error::WatchFailed { reason } if reason.contains("not found")));

        assert_eq!(watch_roots(&mut watcher, &[missing.as_path(), dir.path()]).unwrap(), 1);
    }
}

use std::path::Path;

use crate::error::{Diagnostic, Error};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Print one `warning:` line per non-fatal diagnostic to stderr.
pub fn print_warnings(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("warning: {d}");
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MissingRoot { path } => render_missing_root(path),
        Error::TomlDe(e) => format!("\
# Error: Invalid pyproject.toml

{e}

## Fix

Check the `[tool.plaintest]` table in `pyproject.toml`.
"),
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON Serialization

{e}
"),
        Error::Template(e) => format!("\
# Error: Template

{e}

## Fix

Check the `.template` file in the test-cases directory.
"),
        Error::WatchFailed { reason } => format!("\
# Error: Watch Failed

{reason}
"),
        Error::YamlSer(e) => format!("\
# Error: YAML Serialization

{e}
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_missing_root(path: &Path) -> String {
    return format!("\
# Error: Directory Not Found

`{}` does not exist.

## Fix

Create the test-cases directory:

    plaintest init

Or point `test_cases_dir` / `tests_dir` in `[tool.plaintest]` at existing directories.
", path.display());
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_root_suggests_init() {
        let md = render_error(&Error::MissingRoot { path: PathBuf::from("test-cases") });
        assert!(md.starts_with("# Error: Directory Not Found"));
        assert!(md.contains("`test-cases` does not exist."));
        assert!(md.contains("plaintest init"));
    }

    #[test]
    fn watch_failures_carry_the_reason() {
        let md = render_error(&Error::WatchFailed {
            reason: "no watchable directories".to_string(),
        });
        assert!(md.starts_with("# Error: Watch Failed"));
        assert!(md.contains("no watchable directories"));
    }
}

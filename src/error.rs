//! Crate-level error and diagnostic types.
use std::fmt;
use std::path::PathBuf;

/// Fatal errors. Each variant names the path or reason for failure so it can
/// be rendered as a useful diagnostic without a debugger.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as plaintest::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a report failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The catalog root or the source root does not exist.
    #[error("root not found: {}", path.display())]
    MissingRoot {
        /// The path that was given as a root.
        path: PathBuf,
    },

    /// A `.template` override could not be rendered.
    #[error("template: {0}")]
    Template(
        /// The wrapped template error.
        #[from]
        tera::Error,
    ),

    /// `pyproject.toml` exists but is not valid TOML for the expected shape.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch failed: {reason}")]
    WatchFailed {
        /// Description of the watcher failure.
        reason: String,
    },

    /// Case metadata could not be serialized when scaffolding a new case.
    #[error("yaml serialize: {0}")]
    YamlSer(
        /// The wrapped YAML error.
        #[from]
        serde_yml::Error,
    ),
}

/// Why one source file yielded no markers. Never fatal: the scan turns it
/// into a [`Diagnostic::UnparsableSourceFile`] carrying the path.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Source file exceeds the size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes})")]
    FileTooLarge {
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// Tree-sitter could not parse the file.
    #[error("{reason}")]
    ParseFailed {
        /// Description of the parse failure.
        reason: String,
    },

    /// The file could not be read as UTF-8 text.
    #[error("unreadable: {0}")]
    Unreadable(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// No tree-sitter grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },
}

/// A problem confined to one case directory or one source file.
/// Collected and returned next to the result; never aborts an analysis.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `case.md` has no metadata block, invalid YAML, or no title.
    MalformedCaseDocument {
        /// The offending content file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },
    /// A case directory holds no `case.md`.
    MissingCaseFile {
        /// The case directory.
        dir: PathBuf,
    },
    /// A candidate source file could not be read or parsed.
    UnparsableSourceFile {
        /// The offending source file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Diagnostic::MalformedCaseDocument { path, reason } => {
                write!(f, "skipped case {}: {reason}", path.display())
            },
            Diagnostic::MissingCaseFile { dir } => {
                write!(f, "case directory {} has no case.md", dir.display())
            },
            Diagnostic::UnparsableSourceFile { path, reason } => {
                write!(f, "skipped {}: {reason}", path.display())
            },
        };
    }
}

use std::path::{Path, PathBuf};

use crate::error::Error;

/// Default catalog directory, relative to the project root.
const DEFAULT_TEST_CASES_DIR: &str = "test-cases";

/// Default source root, relative to the project root.
const DEFAULT_TESTS_DIR: &str = ".";

/// Project configuration loaded from the `[tool.plaintest]` table of `pyproject.toml`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Include/exclude prefixes for candidate source files.
    pub filter: SourceFilter,
    /// Catalog root: one all-digit directory per case.
    pub test_cases_dir: PathBuf,
    /// Source root scanned for `test_*.py` files.
    pub tests_dir: PathBuf,
}

/// Raw top level of `pyproject.toml`. Only `[tool]` is of interest.
#[derive(serde::Deserialize)]
struct PyprojectToml {
    #[serde(default)]
    tool: ToolTable,
}

/// Raw `[tool.plaintest]` table.
#[derive(Default, serde::Deserialize)]
struct PlaintestTable {
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    include: Vec<String>,
    test_cases_dir: Option<String>,
    tests_dir: Option<String>,
}

/// Root-relative path prefixes deciding which test files are scanned.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    /// Files under any of these prefixes are skipped.
    pub exclude: Vec<String>,
    /// When non-empty, only files under one of these prefixes are scanned.
    pub include: Vec<String>,
}

/// Raw `[tool]` table; other tools' sections are ignored.
#[derive(Default, serde::Deserialize)]
struct ToolTable {
    #[serde(default)]
    plaintest: PlaintestTable,
}

impl Config {
    /// Load config from `pyproject.toml` in the given root directory.
    /// Returns defaults if the file or the `[tool.plaintest]` table doesn't exist.
    /// Returns an error if the file exists but is malformed; a file the user
    /// wrote is never silently replaced with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join("pyproject.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::defaults_under(root)),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: PyprojectToml = toml::from_str(&content)?;
        let table = raw.tool.plaintest;
        let test_cases_dir = table.test_cases_dir.as_deref().unwrap_or(DEFAULT_TEST_CASES_DIR);
        let tests_dir = table.tests_dir.as_deref().unwrap_or(DEFAULT_TESTS_DIR);

        return Ok(Self {
            filter: SourceFilter {
                exclude: table.exclude,
                include: table.include,
            },
            test_cases_dir: root.join(test_cases_dir),
            tests_dir: root.join(tests_dir),
        });
    }

    /// Default config: `test-cases/` catalog, whole project scanned.
    fn defaults_under(root: &Path) -> Self {
        return Self {
            filter: SourceFilter::default(),
            test_cases_dir: root.join(DEFAULT_TEST_CASES_DIR),
            tests_dir: root.join(DEFAULT_TESTS_DIR),
        };
    }
}

impl SourceFilter {
    /// Check whether a root-relative, slash-separated source path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

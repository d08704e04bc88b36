//! Case catalog: reading `NNN/case.md` documents, allocating the next
//! identifier, and scaffolding new cases.
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{Diagnostic, Error};
use crate::types::{CaseEntry, CaseId, is_all_digits};

/// Content file expected inside every case directory.
pub const CASE_FILE_NAME: &str = "case.md";

/// Optional scaffold override inside the catalog root.
pub const TEMPLATE_FILE_NAME: &str = ".template";

/// Minimum width of generated identifiers (`001`).
const ID_WIDTH: usize = 3;

/// Line that opens and closes the metadata block.
const METADATA_FENCE: &str = "---";

/// Result of reading a catalog: the valid entries sorted by identifier, plus
/// one diagnostic per case directory that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Per-directory problems, in directory order.
    pub diagnostics: Vec<Diagnostic>,
    /// Valid entries, sorted by identifier.
    pub entries: Vec<CaseEntry>,
}

/// Metadata written into a freshly scaffolded `case.md`.
#[derive(serde::Serialize)]
struct NewCaseMetadata<'a> {
    /// Title with only its first letter uppercased.
    title: &'a str,
    /// Always empty for new cases.
    tags: Vec<String>,
}

impl Catalog {
    /// Identifiers of every valid entry.
    pub fn ids(&self) -> BTreeSet<CaseId> {
        return self.entries.iter().map(|e| return e.id.clone()).collect();
    }
}

/// Read every case under `root`.
///
/// Only immediate subdirectories with all-digit names are cases; anything
/// else is skipped silently. A case directory without `case.md`, or whose
/// document has no usable title, is skipped with a diagnostic and never
/// aborts the read.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if `root` does not exist,
/// or `Error::Io` if the directory cannot be listed.
pub fn read_catalog(root: &Path) -> Result<Catalog, Error> {
    let mut catalog = Catalog::default();

    for (id, dir) in case_directories(root)? {
        let path = dir.join(CASE_FILE_NAME);
        if !path.is_file() {
            catalog.diagnostics.push(Diagnostic::MissingCaseFile { dir });
            continue;
        }

        match read_case_entry(id, &path) {
            Err(reason) => catalog.diagnostics.push(Diagnostic::MalformedCaseDocument { path, reason }),
            Ok(entry) => catalog.entries.push(entry),
        }
    }

    catalog.entries.sort_by(|a, b| return a.id.cmp(&b.id));
    return Ok(catalog);
}

/// All-digit subdirectories of `root` as `(id, path)`, sorted by name.
///
/// # Errors
///
/// Returns `Error::MissingRoot` if `root` does not exist, or `Error::Io` on listing failure.
fn case_directories(root: &Path) -> Result<Vec<(CaseId, PathBuf)>, Error> {
    if !root.is_dir() {
        return Err(Error::MissingRoot { path: root.to_path_buf() });
    }

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        if is_all_digits(&name) {
            dirs.push((CaseId::new(name), entry.path()));
        }
    }

    dirs.sort();
    return Ok(dirs);
}

/// Read and parse one `case.md`. The error string becomes the diagnostic reason.
fn read_case_entry(id: CaseId, path: &Path) -> Result<CaseEntry, String> {
    let content = std::fs::read_to_string(path).map_err(|e| return format!("unreadable: {e}"))?;
    let mut metadata = parse_metadata_block(&content)?;

    let title = match metadata.remove("title") {
        Some(serde_yml::Value::String(title)) if !title.trim().is_empty() => title.trim().to_string(),
        Some(_) | None => return Err("metadata has no title".to_string()),
    };
    let tags = metadata.remove("tags").map(tags_from_value).unwrap_or_default();

    return Ok(CaseEntry {
        extra: metadata,
        id,
        path: path.to_path_buf(),
        tags,
        title,
    });
}

/// Split off the leading `---` fenced block and decode it as a YAML mapping.
fn parse_metadata_block(content: &str) -> Result<BTreeMap<String, serde_yml::Value>, String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();
    if lines.next().map(str::trim_end) != Some(METADATA_FENCE) {
        return Err("no metadata block".to_string());
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == METADATA_FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
        yaml.push('\n');
    }
    if !closed {
        return Err("metadata block is not closed".to_string());
    }
    if yaml.trim().is_empty() {
        return Err("metadata has no title".to_string());
    }

    return serde_yml::from_str(&yaml).map_err(|e| return format!("invalid metadata: {e}"));
}

/// Tags as strings. A single string counts as one tag; non-string items are dropped.
fn tags_from_value(value: serde_yml::Value) -> Vec<String> {
    return match value {
        serde_yml::Value::Sequence(items) => items
            .into_iter()
            .filter_map(|item| {
                return match item {
                    serde_yml::Value::String(tag) => Some(tag),
                    _ => None,
                };
            })
            .collect(),
        serde_yml::Value::String(tag) => vec![tag],
        _ => Vec::new(),
    };
}

/// The identifier a new case should get: the largest all-digit directory
/// name plus one, zero-padded to at least three digits. Recomputed from
/// disk on every call; a missing root yields `001`.
///
/// # Errors
///
/// Returns `Error::Io` if an existing root cannot be listed.
pub fn next_case_id(root: &Path) -> Result<CaseId, Error> {
    let dirs = match case_directories(root) {
        Err(Error::MissingRoot { .. }) => Vec::new(),
        Err(e) => return Err(e),
        Ok(dirs) => dirs,
    };

    let max = dirs
        .iter()
        .filter_map(|(id, _)| return id.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let next = max.saturating_add(1);
    return Ok(CaseId::new(format!("{next:0ID_WIDTH$}")));
}

/// Create `<next id>/case.md` under `root`. Creates `root` if needed.
///
/// The document is rendered from `root/.template` when that file exists,
/// with `title` and `id` in scope. Otherwise it gets a metadata block with
/// the capitalized title and an empty steps/expected skeleton.
///
/// # Errors
///
/// Returns `Error::Io` if the directory or file cannot be written,
/// `Error::Template` if `.template` fails to render,
/// or `Error::YamlSer` if the metadata cannot be serialized.
pub fn create_case(root: &Path, title: &str) -> Result<(CaseId, PathBuf), Error> {
    let id = next_case_id(root)?;
    let document = render_case_document(root, &id, title.trim())?;

    let dir = root.join(id.as_str());
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(CASE_FILE_NAME);
    std::fs::write(&path, document)?;
    return Ok((id, path));
}

/// Contents of a new `case.md`, from the `.template` override or the default skeleton.
fn render_case_document(root: &Path, id: &CaseId, title: &str) -> Result<String, Error> {
    let template_path = root.join(TEMPLATE_FILE_NAME);
    if template_path.is_file() {
        let template = std::fs::read_to_string(&template_path)?;
        let mut context = tera::Context::new();
        context.insert("id", id.as_str());
        context.insert("title", title);
        return Ok(tera::Tera::one_off(&template, &context, false)?);
    }

    let mut metadata = serde_yml::to_string(&NewCaseMetadata {
        title: &capitalize(title),
        tags: Vec::new(),
    })?;
    if !metadata.ends_with('\n') {
        metadata.push('\n');
    }
    return Ok(format!("{METADATA_FENCE}\n{metadata}{METADATA_FENCE}\n\n## Steps\n1. \n\n## Expected\n\n"));
}

/// Uppercase the first character and lowercase the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    return match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_case(root: &Path, id: &str, content: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CASE_FILE_NAME), content).unwrap();
    }

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn reads_standard_structure() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "002", "---\ntitle: Test 2\n---\n");
        write_case(dir.path(), "001", "---\ntitle: Test 1\ntags: [auth, smoke]\n---\n\n## Steps\n");
        write_case(dir.path(), "010", "---\ntitle: Test 10\n---\n");

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(ids(&catalog), ["001", "002", "010"]);
        assert!(catalog.diagnostics.is_empty());

        let first = &catalog.entries[0];
        assert_eq!(first.title, "Test 1");
        assert_eq!(first.tags, ["auth", "smoke"]);
        assert_eq!(first.path, dir.path().join("001").join("case.md"));
    }

    #[test]
    fn non_digit_directories_are_skipped_silently() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "001", "---\ntitle: Test 1\n---\n");
        write_case(dir.path(), "not-a-test", "---\ntitle: Test\n---\n");
        write_case(dir.path(), "002", "---\ntitle: Test 2\n---\n");
        std::fs::write(dir.path().join(".template"), "---\ntitle: x\n---\n").unwrap();
        std::fs::write(dir.path().join("003"), "a file, not a directory").unwrap();

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(ids(&catalog), ["001", "002"]);
        assert!(catalog.diagnostics.is_empty());
    }

    #[test]
    fn missing_case_file_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "001", "---\ntitle: Test 1\n---\n");
        std::fs::create_dir_all(dir.path().join("002")).unwrap();
        write_case(dir.path(), "003", "---\ntitle: Test 3\n---\n");

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(ids(&catalog), ["001", "003"]);
        assert_eq!(
            catalog.diagnostics,
            [Diagnostic::MissingCaseFile { dir: dir.path().join("002") }]
        );
    }

    #[test]
    fn documents_without_title_are_excluded_with_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "001", "---\ntags: [a]\n---\n");
        write_case(dir.path(), "002", "no metadata at all\n");
        write_case(dir.path(), "003", "---\ntitle: \"   \"\n---\n");
        write_case(dir.path(), "004", "---\ntitle: [unclosed\n---\n");
        write_case(dir.path(), "005", "---\ntitle: Fine\n---\n");
        write_case(dir.path(), "006", "---\ntitle: never closed\n");

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(ids(&catalog), ["005"]);
        assert_eq!(catalog.diagnostics.len(), 5);
        assert!(
            catalog
                .diagnostics
                .iter()
                .all(|d| matches!(d, Diagnostic::MalformedCaseDocument { .. }))
        );
    }

    #[test]
    fn extra_metadata_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        write_case(dir.path(), "001", "---\ntitle: Login\ntags: smoke\npriority: high\nowner: qa\n---\n");

        let catalog = read_catalog(dir.path()).unwrap();
        let entry = &catalog.entries[0];
        assert_eq!(entry.tags, ["smoke"]);
        assert_eq!(entry.extra.len(), 2);
        assert_eq!(entry.extra.get("priority"), Some(&serde_yml::Value::String("high".to_string())));
    }

    #[test]
    fn empty_root_is_an_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = read_catalog(dir.path()).unwrap();
        assert!(catalog.entries.is_empty());
        assert!(catalog.diagnostics.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nonexistent");
        assert!(matches!(read_catalog(&missing), Err(Error::MissingRoot { path }) if path == missing));
    }

    #[test]
    fn next_id_follows_the_largest_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(next_case_id(&dir.path().join("absent")).unwrap().as_str(), "001");
        assert_eq!(next_case_id(dir.path()).unwrap().as_str(), "001");

        std::fs::create_dir_all(dir.path().join("001")).unwrap();
        std::fs::create_dir_all(dir.path().join("007")).unwrap();
        std::fs::create_dir_all(dir.path().join("draft-99")).unwrap();
        assert_eq!(next_case_id(dir.path()).unwrap().as_str(), "008");

        std::fs::create_dir_all(dir.path().join("1200")).unwrap();
        assert_eq!(next_case_id(dir.path()).unwrap().as_str(), "1201");
    }

    #[test]
    fn created_case_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("test-cases");

        let (first, path) = create_case(&root, "user can log in: happy path").unwrap();
        assert_eq!(first.as_str(), "001");
        assert!(path.ends_with("001/case.md"));
        let (second, _) = create_case(&root, "logout").unwrap();
        assert_eq!(second.as_str(), "002");

        let catalog = read_catalog(&root).unwrap();
        assert_eq!(ids(&catalog), ["001", "002"]);
        assert_eq!(catalog.entries[0].title, "User can log in: happy path");
        assert!(catalog.entries[0].tags.is_empty());
        assert_eq!(catalog.entries[1].title, "Logout");

        let document = std::fs::read_to_string(path).unwrap();
        assert!(document.contains("\ntags: []\n---\n"), "{document}");
    }

    #[test]
    fn created_title_is_capitalized() {
        let dir = tempfile::tempdir().unwrap();
        create_case(dir.path(), "  log in via SSO ").unwrap();

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(catalog.entries[0].title, "Log in via sso");
    }

    #[test]
    fn template_override_renders_new_cases() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPLATE_FILE_NAME),
            "---\ntitle: {{ title | capitalize }}\nowner: qa\n---\n\nScenario {{ id }}: {{ title }}\n",
        )
        .unwrap();

        let (id, path) = create_case(dir.path(), "checkout with saved CARD").unwrap();
        assert_eq!(id.as_str(), "001");
        let document = std::fs::read_to_string(path).unwrap();
        assert!(document.contains("Scenario 001: checkout with saved CARD"), "{document}");
        assert!(!document.contains("## Steps"));

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(catalog.entries[0].title, "Checkout with saved card");
        assert_eq!(catalog.entries[0].extra.get("owner"), Some(&serde_yml::Value::String("qa".to_string())));
    }

    #[test]
    fn broken_template_is_an_error_and_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TEMPLATE_FILE_NAME), "title: {{ title \n").unwrap();

        assert!(matches!(create_case(dir.path(), "x"), Err(Error::Template(_))));
        assert!(!dir.path().join("001").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_case_directories_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        write_case(elsewhere.path(), "shared", "---\ntitle: Shared case\n---\n");
        std::os::unix::fs::symlink(elsewhere.path().join("shared"), dir.path().join("004")).unwrap();

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(ids(&catalog), ["004"]);
        assert_eq!(catalog.entries[0].title, "Shared case");
    }
}

//! Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::SourceError;

/// Map a source file extension to its tree-sitter language.
///
/// # Errors
///
/// Returns `SourceError::UnsupportedLanguage` for anything but Python sources.
pub fn language_for_path(path: &Path) -> Result<Language, SourceError> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "py" => Ok(tree_sitter_python::LANGUAGE.into()),
        _ => Err(SourceError::UnsupportedLanguage {
            ext: ext.to_string(),
        }),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_files_get_a_grammar() {
        assert!(language_for_path(Path::new("tests/test_auth.py")).is_ok());
    }

    #[test]
    fn other_extensions_are_rejected() {
        let err = language_for_path(Path::new("notes/case.md")).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedLanguage { ext } if ext == "md"));
    }
}

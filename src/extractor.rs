//! Static extraction of case-linking decorators from Python test files.
//!
//! Files are parsed with tree-sitter and never imported or evaluated. Only
//! module-level functions and the methods of module-level classes are
//! inspected; anything nested deeper is ignored.
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use tree_sitter::{Language, Node, Parser, Point, Tree};

use crate::error::SourceError;
use crate::grammar;
use crate::types::{CaseId, Marker, TestId};

/// Callee spellings recognized as the linking marker.
const MARKER_CALLEES: [&str; 3] = ["plaintest.tc", "pytest.mark.test_case", "tc"];

/// Maximum source file size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Extract every `(case, test)` pair from one Python source file, in source order.
///
/// `relative_path` is the root-relative, slash-separated path used as the
/// file part of each node path. A function carrying several markers yields
/// one pair per marker, in decorator order.
///
/// # Errors
///
/// Returns `SourceError::UnsupportedLanguage` if the path isn't a Python file,
/// `SourceError::FileTooLarge` if the source exceeds the size limit,
/// or `SourceError::ParseFailed` if tree-sitter reports a syntax error.
pub fn extract_markers(relative_path: &str, source: &str) -> Result<Vec<Marker>, SourceError> {
    let source_len: u64 = source.len().try_into().unwrap_or(u64::MAX);
    if source_len > MAX_FILE_SIZE {
        return Err(SourceError::FileTooLarge {
            max_bytes: MAX_FILE_SIZE,
            size_bytes: source_len,
        });
    }

    let language = grammar::language_for_path(Path::new(relative_path))?;
    let tree = parse_source(source, &language)?;
    let root = tree.root_node();
    if let Some(point) = first_syntax_error(root) {
        return Err(SourceError::ParseFailed {
            reason: format!("syntax error at line {}", point.row.saturating_add(1)),
        });
    }

    let mut markers = Vec::new();
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        collect_module_item(node, source, relative_path, &mut markers);
    }

    return Ok(markers);
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `SourceError::ParseFailed` if the language cannot be set or parsing fails.
fn parse_source(source: &str, language: &Language) -> Result<Tree, SourceError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| return SourceError::ParseFailed { reason: e.to_string() })?;

    return parser.parse(source, None).ok_or_else(|| {
        return SourceError::ParseFailed {
            reason: "tree-sitter returned None".to_string(),
        };
    });
}

/// Position of the first `ERROR` or `MISSING` node, depth-first.
fn first_syntax_error(node: Node<'_>) -> Option<Point> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position());
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(point) = first_syntax_error(child) {
            return Some(point);
        }
    }
    return None;
}

// ── Definitions ────────────────────────────────────────────────────────

/// Collect markers from one top-level statement of the module.
fn collect_module_item(node: Node<'_>, source: &str, file: &str, markers: &mut Vec<Marker>) {
    let (decorators, definition) = split_decorated_definition(node);

    match definition.kind() {
        // Class decorators never link a case; only the methods are inspected.
        "class_definition" => collect_class_methods(definition, source, file, markers),
        "function_definition" => collect_function_markers(&decorators, definition, source, file, None, markers),
        _ => {},
    }
}

/// Collect markers from the methods directly inside a module-level class.
/// Nested classes are not descended into.
fn collect_class_methods(class: Node<'_>, source: &str, file: &str, markers: &mut Vec<Marker>) {
    let Some(class_name) = definition_name(class, source) else {
        return;
    };
    let Some(body) = class.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let (decorators, definition) = split_decorated_definition(child);
        if definition.kind() == "function_definition" {
            collect_function_markers(&decorators, definition, source, file, Some(class_name), markers);
        }
    }
}

/// Push one marker per linking decorator on a function or method.
fn collect_function_markers(
    decorators: &[Node<'_>],
    function: Node<'_>,
    source: &str,
    file: &str,
    class_name: Option<&str>,
    markers: &mut Vec<Marker>,
) {
    let Some(function_name) = definition_name(function, source) else {
        return;
    };

    for decorator in decorators {
        let Some(case_id) = marker_case_id(*decorator, source) else {
            continue;
        };
        markers.push(Marker {
            case_id,
            test_id: TestId::new(file, class_name, function_name),
        });
    }
}

/// Text of a definition's `name` field.
fn definition_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    return node.child_by_field_name("name")?.utf8_text(source.as_bytes()).ok();
}

/// Unwrap a `decorated_definition` into its decorators (in source order) and
/// the wrapped definition. Any other node comes back with no decorators.
fn split_decorated_definition<'t>(node: Node<'t>) -> (Vec<Node<'t>>, Node<'t>) {
    if node.kind() != "decorated_definition" {
        return (Vec::new(), node);
    }
    let Some(definition) = node.child_by_field_name("definition") else {
        return (Vec::new(), node);
    };

    let mut cursor = node.walk();
    let decorators = node
        .named_children(&mut cursor)
        .filter(|c| return c.kind() == "decorator")
        .collect();
    return (decorators, definition);
}

// ── Decorators ─────────────────────────────────────────────────────────

/// Render an identifier or attribute chain (`pytest.mark.test_case`) as dotted text.
/// Any other expression (subscripts, calls) has no static name.
fn dotted_callee_name(node: Node<'_>, source: &str) -> Option<String> {
    return match node.kind() {
        "attribute" => {
            let object = dotted_callee_name(node.child_by_field_name("object")?, source)?;
            let attribute = node.child_by_field_name("attribute")?.utf8_text(source.as_bytes()).ok()?;
            Some(format!("{object}.{attribute}"))
        },
        "identifier" => node.utf8_text(source.as_bytes()).ok().map(String::from),
        _ => None,
    };
}

/// The case identifier of a linking decorator, or `None` if the decorator
/// isn't one. A marker call must have exactly one argument and it must be a
/// plain string literal; variables, f-strings and concatenations are never
/// evaluated and count as no marker.
fn marker_case_id(decorator: Node<'_>, source: &str) -> Option<CaseId> {
    let mut cursor = decorator.walk();
    let call = decorator
        .named_children(&mut cursor)
        .find(|c| return c.kind() != "comment")?;
    if call.kind() != "call" {
        return None;
    }

    let callee = dotted_callee_name(call.child_by_field_name("function")?, source)?;
    if !MARKER_CALLEES.contains(&callee.as_str()) {
        return None;
    }

    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "argument_list" {
        return None;
    }
    let mut arg_cursor = arguments.walk();
    let args: Vec<Node<'_>> = arguments
        .named_children(&mut arg_cursor)
        .filter(|a| return a.kind() != "comment")
        .collect();
    let [only] = args.as_slice() else {
        return None;
    };

    return plain_string_literal(*only, source).map(CaseId::new);
}

/// Value of a single plain, raw or unicode-prefixed string literal. Escapes
/// are decoded unless the literal is raw. Byte strings, f-strings, t-strings
/// and `\N{...}` escapes are rejected.
fn plain_string_literal(node: Node<'_>, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut content_start = None;
    let mut content_end = None;
    let mut raw = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "interpolation" => return None,
            "string_end" => content_end = Some(child.start_byte()),
            "string_start" => {
                let prefix = string_prefix(child.utf8_text(source.as_bytes()).ok()?);
                if prefix.chars().any(|c| return matches!(c.to_ascii_lowercase(), 'b' | 'f' | 't')) {
                    return None;
                }
                raw = prefix.chars().any(|c| return c.eq_ignore_ascii_case(&'r'));
                content_start = Some(child.end_byte());
            },
            _ => {},
        }
    }

    let body = source.get(content_start?..content_end?)?;
    if raw {
        return Some(body.to_string());
    }
    return decode_escapes(body);
}

/// Prefix letters of a string opener such as `r"` or `"""`.
fn string_prefix(opener: &str) -> &str {
    return opener.trim_end_matches(['"', '\'']);
}

/// Decode the backslash escapes of a non-raw string body. Unknown escapes
/// stay as written; malformed numeric escapes and `\N{...}` give `None`.
fn decode_escapes(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            '\n' => {},
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            },
            '\\' | '\'' | '"' => out.push(escaped),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{b}'),
            'x' => out.push(hex_escape(&mut chars, 2)?),
            'u' => out.push(hex_escape(&mut chars, 4)?),
            'U' => out.push(hex_escape(&mut chars, 8)?),
            '0'..='7' => out.push(octal_escape(escaped, &mut chars)?),
            'N' => return None,
            other => {
                out.push('\\');
                out.push(other);
            },
        }
    }

    return Some(out);
}

/// Exactly `digits` hex digits as one character.
fn hex_escape(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    let mut value = 0_u32;
    for _ in 0..digits {
        let digit = chars.next()?.to_digit(16)?;
        value = value.checked_mul(16)?.checked_add(digit)?;
    }
    return char::from_u32(value);
}

/// One to three octal digits, the first already consumed.
fn octal_escape(first: char, chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let mut value = first.to_digit(8)?;
    for _ in 0..2 {
        let Some(digit) = chars.next_if(|c| return c.is_digit(8)).and_then(|c| return c.to_digit(8)) else {
            break;
        };
        value = value.checked_mul(8)?.checked_add(digit)?;
    }
    return char::from_u32(value);
}

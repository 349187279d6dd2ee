//! Inline formatting removal for TEXT and MTEXT content.
//!
//! This is a substitution pass, not an interpreter: directives are removed
//! and only paragraph breaks survive (as `\n`).

use std::sync::LazyLock;

use regex::Regex;

// Private-use placeholders for escaped literals while braces are stripped.
const LBRACE: char = '\u{E000}';
const RBRACE: char = '\u{E001}';
const BACKSLASH: char = '\u{E002}';

static PARAGRAPH_PROPS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\p[^;\\]*;").expect("valid regex"));

static VALUE_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[fFhHwWqQtTaAcC][^;]*;").expect("valid regex"));

static STACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\S([^;^/#]*)[\^/#]([^;]*);").expect("valid regex"));

static TOGGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[lLoOkK]").expect("valid regex"));

static REMAINING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[^;\\]*;").expect("valid regex"));

/// Remove MTEXT inline formatting.
///
/// - `\P` becomes a newline; `\~` becomes a space
/// - font, height, width, oblique, tracking, alignment and color directives
///   (`\f...;`, `\H...;`, `\C...;` and friends) are removed
/// - stacked fractions `\Sa^b;` become `a/b`
/// - underline, overline and strike toggles are removed
/// - grouping braces are removed; escaped `\{`, `\}` and `\\` survive as
///   literals
///
/// The result is trimmed.
pub fn strip_mtext(raw: &str) -> String {
    let text = raw
        .replace("\\\\", &BACKSLASH.to_string())
        .replace("\\{", &LBRACE.to_string())
        .replace("\\}", &RBRACE.to_string());
    let text = PARAGRAPH_PROPS_RE.replace_all(&text, "");
    let text = text.replace("\\P", "\n").replace("\\p", "\n").replace("\\~", " ");
    let text = STACK_RE.replace_all(&text, "$1/$2");
    let text = VALUE_DIRECTIVE_RE.replace_all(&text, "");
    let text = TOGGLE_RE.replace_all(&text, "");
    let text = REMAINING_RE.replace_all(&text, "");
    let text: String = text
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .map(|c| match c {
            LBRACE => '{',
            RBRACE => '}',
            BACKSLASH => '\\',
            other => other,
        })
        .collect();
    text.trim().to_string()
}

/// Decode TEXT control codes: `%%d` degree, `%%p` plus-minus,
/// `%%c` diameter, `%%%` percent; `%%u`/`%%o` toggles are dropped.
pub fn decode_text_codes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(idx) = rest.find("%%") {
        out.push_str(&rest[..idx]);
        let code = rest[idx + 2..].chars().next();
        let replacement = match code.map(|c| c.to_ascii_lowercase()) {
            Some('d') => Some("\u{00B0}"),
            Some('p') => Some("\u{00B1}"),
            Some('c') => Some("\u{2300}"),
            Some('%') => Some("%"),
            Some('u') | Some('o') | Some('k') => Some(""),
            _ => None,
        };
        match (replacement, code) {
            (Some(r), Some(c)) => {
                out.push_str(r);
                rest = &rest[idx + 2 + c.len_utf8()..];
            }
            _ => {
                out.push_str("%%");
                rest = &rest[idx + 2..];
            }
        }
    }
    out.push_str(rest);
    out.trim().to_string()
}

//! Free-text input cleanup applied before any user text reaches the model,
//! the search provider or the database.
//!
//! The pipeline strips markup, folds line breaks into spaces, escapes the
//! characters that could re-open markup and trims surrounding whitespace.
//! `&` is left alone so that running the pipeline twice gives the same text.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on sanitized input, in characters.
pub const MAX_INPUT_CHARS: usize = 8_000;

/// Tags, closing tags, comments and doctypes: `<b>`, `</p>`, `<!-- x -->`.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z!][^<>]*>").expect("markup pattern is valid")
});

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Sanitize user-supplied text.
///
/// Returns an empty string when nothing but whitespace or markup was given.
pub fn sanitize_input(raw: &str) -> String {
    let stripped = MARKUP.replace_all(raw, "");
    let single_line = LINE_BREAK.replace_all(&stripped, " ");
    let escaped = escape_html(&single_line);
    cap_length(escaped.trim()).to_string()
}

/// Entities produced by [`escape_html`].
const ENTITIES: [&str; 4] = ["&lt;", "&gt;", "&quot;", "&#39;"];

/// Cut to [`MAX_INPUT_CHARS`] without leaving half an entity at the end.
fn cap_length(text: &str) -> &str {
    let Some((cut, _)) = text.char_indices().nth(MAX_INPUT_CHARS) else {
        return text;
    };
    let mut head = &text[..cut];
    if let Some(amp) = head.rfind('&') {
        let tail = &head[amp..];
        if ENTITIES
            .iter()
            .any(|e| e.len() > tail.len() && e.starts_with(tail))
        {
            head = &head[..amp];
        }
    }
    head.trim_end()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

//! Rendering boundary for backend-produced markup.
//!
//! The simplify endpoint returns pre-rendered HTML. It is kept verbatim inside
//! [`TrustedHtml`]; nothing is sanitized. Callers that need text (the chat
//! payload, a terminal) go through the projections here.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BREAK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static LIST_ITEM_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<li\b[^>]*>").unwrap());
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(p|div|h[1-6]|ul|ol|blockquote|pre|table|tr|hr)\b[^>]*>").unwrap()
});
static BOLD_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</?(strong|b)>").unwrap());
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static NUMERIC_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());
static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Markup accepted from the backend without sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    /// Trusts `html` as-is. This is the only way to construct the type.
    pub fn from_backend(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// What a reader sees: tags dropped, blocks on their own lines, entities decoded.
    pub fn plain_text(&self) -> String {
        html_to_text(&self.0, false)
    }

    /// Like [`plain_text`](Self::plain_text) but keeps bold runs as `**bold**`.
    pub fn display_text(&self) -> String {
        html_to_text(&self.0, true)
    }
}

fn html_to_text(html: &str, keep_bold: bool) -> String {
    // Source whitespace collapses the way a browser lays it out
    let text = WHITESPACE.replace_all(html, " ");
    let text = BREAK_TAG.replace_all(&text, "\n");
    let text = LIST_ITEM_TAG.replace_all(&text, "\n• ");
    let mut text = BLOCK_TAG.replace_all(&text, "\n").into_owned();
    if keep_bold {
        text = BOLD_TAG.replace_all(&text, "**").into_owned();
    }
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    let text = text
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    // &amp; last so "&amp;lt;" stays "&lt;"
    decoded
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

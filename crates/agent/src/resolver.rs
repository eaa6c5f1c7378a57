//! Response resolver — splits a settled response into prose and an
//! optional structured block.
//!
//! A `---`-delimited frontmatter block at the very top of the response, or
//! else the first fenced ```` ```json ````/```` ```yaml ````/```` ```yml ````
//! block, is taken as the structured part and cut out of the prose. A `---`
//! anywhere else is a scene break and stays in the prose. Unterminated
//! delimiters leave the text as plain prose.

use inkwell_core::MarkdownRenderer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Prose shown when the model returned nothing but whitespace.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "_The model returned an empty response._";

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*(?i:json|yaml|yml)[^\n]*\n(.*?)```").expect("fence pattern is valid")
});

static FRONTMATTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)\A\s*---[ \t]*\r?\n(.*?)^---[ \t]*\r?$")
        .expect("frontmatter pattern is valid")
});

/// A settled response, split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResponse {
    pub prose: String,
    pub structured: Option<String>,
    /// Set when the response was blank and `prose` is the placeholder.
    pub is_placeholder: bool,
}

impl ResolvedResponse {
    /// The structured block parsed as JSON, when it is valid JSON.
    pub fn structured_json(&self) -> Option<serde_json::Value> {
        self.structured
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Split `text` into prose and structured parts.
pub fn resolve(text: &str) -> ResolvedResponse {
    if text.trim().is_empty() {
        return ResolvedResponse {
            prose: EMPTY_RESPONSE_PLACEHOLDER.to_string(),
            structured: None,
            is_placeholder: true,
        };
    }

    let block = FRONTMATTER_RE
        .captures(text)
        .or_else(|| FENCE_RE.captures(text));

    let Some(caps) = block else {
        return ResolvedResponse {
            prose: text.trim().to_string(),
            structured: None,
            is_placeholder: false,
        };
    };
    let (Some(span), Some(inner)) = (caps.get(0), caps.get(1)) else {
        return ResolvedResponse {
            prose: text.trim().to_string(),
            structured: None,
            is_placeholder: false,
        };
    };

    let before = text[..span.start()].trim_end();
    let after = text[span.end()..].trim_start();
    let prose = match (before.is_empty(), after.is_empty()) {
        (true, _) => after.trim_end().to_string(),
        (false, true) => before.trim_start().to_string(),
        (false, false) => format!("{}\n\n{}", before.trim_start(), after.trim_end()),
    };
    let inner = inner.as_str().trim();

    ResolvedResponse {
        prose,
        structured: (!inner.is_empty()).then(|| inner.to_string()),
        is_placeholder: false,
    }
}

/// Render prose with the host's renderer, or as escaped preformatted text
/// when there is none.
pub fn render_prose(renderer: Option<&dyn MarkdownRenderer>, prose: &str) -> String {
    match renderer {
        Some(r) => r.render(prose),
        None => format!("<pre>{}</pre>", escape_html(prose)),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

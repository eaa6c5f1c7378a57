//! Markdown renderer collaborator.

/// A pure markdown → markup renderer supplied by the host.
///
/// The renderer may be absent; callers fall back to escaped preformatted
/// text in that case.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

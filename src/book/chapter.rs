use crate::resolve::ExternalReferences;
use scraper::{ElementRef, Html, Node};

/// A chapter to add with [`Book::add_chapter`](crate::Book::add_chapter).
///
/// A chapter without content is either a link to an anchor of an
/// existing chapter (`path#anchor`) or, when its path is the file name of
/// the table of contents, places the table of contents in the reading order.
///
/// # Examples
/// ```
/// # use bindery::Chapter;
/// # use bindery::resolve::ExternalReferences;
/// let chapter = Chapter::new("Chapter 1", "Text/chapter1.xhtml")
///     .content("<h1>Chapter 1</h1><p>It was a dark and stormy night.</p>")
///     .external_references(ExternalReferences::Embed)
///     .base_dir("manuscript");
/// ```
#[derive(Clone, Debug)]
pub struct Chapter {
    pub(crate) title: String,
    pub(crate) path: String,
    pub(crate) parts: Vec<String>,
    pub(crate) auto_split: bool,
    pub(crate) policy: ExternalReferences,
    pub(crate) base_dir: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            parts: Vec::new(),
            auto_split: false,
            policy: ExternalReferences::default(),
            base_dir: String::new(),
        }
    }

    /// The chapter's HTML, either a complete document or a body fragment.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.parts = vec![content.into()];
        self
    }

    /// Content already split into parts, each stored as its own file.
    pub fn parts<I>(mut self, parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.parts = parts.into_iter().map(Into::into).collect();
        self
    }

    /// Split content exceeding [`BookOptions::split_size`](crate::BookOptions::split_size).
    ///
    /// Default: `false`
    pub fn auto_split(mut self, auto_split: bool) -> Self {
        self.auto_split = auto_split;
        self
    }

    /// Default: [`ExternalReferences::Ignore`]
    pub fn external_references(mut self, policy: ExternalReferences) -> Self {
        self.policy = policy;
        self
    }

    /// Directory local references of the content are relative to.
    pub fn base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn has_content(&self) -> bool {
        self.parts.iter().any(|part| !part.trim().is_empty())
    }
}

/// Splits oversized chapter content into parts.
pub trait ChapterSplitter {
    /// Split `content` into parts of roughly `max_size` bytes.
    /// Returning a single part leaves the chapter whole.
    fn split(&self, content: &str, max_size: usize) -> Vec<String>;
}

/// Splits between the top-level blocks of the body, repeating the
/// document head in every part.
///
/// A block larger than the limit becomes a part of its own.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlockSplitter;

impl BlockSplitter {
    fn blocks(body: ElementRef<'_>) -> Vec<String> {
        body.children()
            .filter_map(|child| match child.value() {
                Node::Element(_) => ElementRef::wrap(child).map(|element| element.html()),
                Node::Text(text) if !text.trim().is_empty() => Some(escape_text(text)),
                _ => None,
            })
            .collect()
    }
}

impl ChapterSplitter for BlockSplitter {
    fn split(&self, content: &str, max_size: usize) -> Vec<String> {
        if content.len() <= max_size {
            return vec![content.to_owned()];
        }
        let document = Html::parse_document(content);
        let root = document.root_element();
        let child = |name: &str| {
            root.children()
                .filter_map(ElementRef::wrap)
                .find(|element| element.value().name() == name)
        };
        let head = child("head").map(|head| head.inner_html()).unwrap_or_default();
        let Some(body) = child("body") else {
            return vec![content.to_owned()];
        };

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for block in Self::blocks(body) {
            if !current.is_empty() && current.len() + block.len() > max_size {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(&block);
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        if chunks.len() <= 1 {
            return vec![content.to_owned()];
        }
        tracing::debug!(parts = chunks.len(), max_size, "split oversized chapter");
        chunks
            .into_iter()
            .map(|chunk| format!("<html><head>{head}</head><body>{chunk}</body></html>"))
            .collect()
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_splitter() {
        let content = format!(
            "<html><head><title>Long</title></head><body>{}</body></html>",
            (1..=6).map(|n| format!("<p>Paragraph {n} {}</p>", "x".repeat(40))).collect::<String>()
        );
        let parts = BlockSplitter.split(&content, 120);

        assert_eq!(3, parts.len());
        for part in &parts {
            assert!(part.starts_with("<html><head><title>Long</title></head><body><p>"));
        }
        assert!(parts[0].contains("Paragraph 1") && parts[0].contains("Paragraph 2"));
        assert!(parts[2].contains("Paragraph 6"));
    }

    #[test]
    fn test_short_content_is_kept() {
        let parts = BlockSplitter.split("<p>short</p>", 100);
        assert_eq!(vec!["<p>short</p>".to_owned()], parts);
    }

    #[test]
    fn test_chapter_builder() {
        let chapter = Chapter::new("Notes", "notes.xhtml#n1");
        assert!(!chapter.has_content());

        let chapter = chapter.parts(["<p>a</p>", "<p>b</p>"]);
        assert!(chapter.has_content());
        assert_eq!(2, chapter.parts.len());
    }
}

//! Parsing of author HTML and its serialization as well-formed XHTML.

use crate::consts::xhtml;
use crate::version::EpubVersion;
use crate::writer::WriterResult;
use crate::writer::xml::XmlWriter;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Element;
use scraper::{Html, Node};
use std::collections::HashMap;

/// HTML5 elements without an XHTML 1.1 counterpart, and their replacement.
#[rustfmt::skip]
const LEGACY_RENAMES: &[(&str, &str)] = &[
    ("section", xhtml::DIV), ("nav", xhtml::DIV), ("article", xhtml::DIV),
    ("aside", xhtml::DIV), ("header", xhtml::DIV), ("footer", xhtml::DIV),
    ("main", xhtml::DIV), ("figure", xhtml::DIV), ("figcaption", xhtml::DIV),
    ("time", xhtml::SPAN), ("mark", xhtml::SPAN),
];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Parsed author content.
pub(crate) struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parse a full document or a body fragment. Parsing never fails;
    /// malformed markup is repaired the way browsers repair it.
    pub(crate) fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    /// Elements named `name`, in document order.
    pub(crate) fn elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (NodeId, &'a Element)> + 'a {
        self.html.tree.root().descendants().filter_map(move |node| {
            node.value()
                .as_element()
                .filter(|element| element.name() == name)
                .map(|element| (node.id(), element))
        })
    }

    /// The concatenated text children of a node (e.g., `<style>` content).
    pub(crate) fn text_of(&self, id: NodeId) -> String {
        self.html
            .tree
            .get(id)
            .map(|node| {
                node.children()
                    .filter_map(|child| child.value().as_text().map(|text| &**text))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every `id` attribute value, in document order.
    pub(crate) fn ids(&self) -> Vec<String> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(|node| node.value().as_element()?.id().map(str::to_owned))
            .collect()
    }

    fn html_element(&self) -> Option<NodeRef<'_, Node>> {
        self.html
            .tree
            .root()
            .children()
            .find(|node| node.value().as_element().is_some_and(|e| e.name() == xhtml::HTML))
    }
}

/// Substitute content for a removed element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Replacement {
    /// `<em>{text}</em>`
    Emphasis(String),
    /// Bare text.
    Text(String),
}

#[derive(Default)]
struct Edit {
    remove: bool,
    replacement: Option<Replacement>,
    attributes: Vec<(String, String)>,
    text: Option<String>,
}

/// Pending modifications to an [`HtmlDocument`], applied during serialization.
#[derive(Default)]
pub(crate) struct Edits {
    edits: HashMap<NodeId, Edit>,
}

impl Edits {
    pub(crate) fn remove(&mut self, id: NodeId) {
        self.edits.entry(id).or_default().remove = true;
    }

    pub(crate) fn replace(&mut self, id: NodeId, replacement: Replacement) {
        self.edits.entry(id).or_default().replacement = Some(replacement);
    }

    pub(crate) fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let edit = self.edits.entry(id).or_default();
        edit.attributes.retain(|(existing, _)| existing != name);
        edit.attributes.push((name.to_owned(), value.into()));
    }

    /// Replace all children of the element with `text`.
    pub(crate) fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.edits.entry(id).or_default().text = Some(text.into());
    }

    fn get(&self, id: NodeId) -> Option<&Edit> {
        self.edits.get(&id)
    }
}

/// Document-level values used when the content lacks them.
pub(crate) struct XhtmlOptions<'a> {
    pub(crate) version: EpubVersion,
    pub(crate) language: &'a str,
    pub(crate) title: &'a str,
}

/// Serialize `document` with `edits` applied as an XHTML content document.
pub(crate) fn serialize(
    document: &HtmlDocument,
    edits: &Edits,
    options: &XhtmlOptions<'_>,
) -> WriterResult<String> {
    let mut serializer = XhtmlSerializer {
        writer: XmlWriter::compact(Vec::new()),
        edits,
        options,
    };
    serializer.write_document(document)?;

    let bytes = serializer.writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

struct XhtmlSerializer<'d, 'o> {
    writer: XmlWriter<'d, Vec<u8>>,
    edits: &'o Edits,
    options: &'o XhtmlOptions<'o>,
}

impl<'d, 'o> XhtmlSerializer<'d, 'o> {
    fn legacy(&self) -> bool {
        self.options.version.is_legacy()
    }

    fn write_document(&mut self, document: &'d HtmlDocument) -> WriterResult<()> {
        self.writer.write_utf8_declaration()?;
        let doctype = if self.legacy() { xhtml::XHTML11_DOCTYPE } else { xhtml::HTML5_DOCTYPE };
        self.writer.write_doctype(doctype)?;

        let Some(html) = document.html_element() else {
            return Ok(());
        };
        let Some(element) = html.value().as_element() else {
            return Ok(());
        };

        self.writer
            .start_element(xhtml::HTML)?
            .add_attribute(xml_ns(), xhtml::XHTML_NS);
        if !self.legacy() {
            self.writer.add_attribute(xhtml::XMLNS_EPUB, xhtml::EPUB_NS);
        }
        self.write_attributes(html.id(), element)?;

        if element.attr(xhtml_lang_attr()).is_none() {
            self.writer.add_attribute(xhtml_lang_attr(), self.options.language);
        }
        if !self.legacy() && element.attr(xhtml::LANG).is_none() {
            self.writer.add_attribute(xhtml::LANG, self.options.language);
        }

        for child in html.children() {
            match child.value().as_element() {
                Some(element) if element.name() == xhtml::HEAD => self.write_head(child)?,
                _ => self.write_node(child)?,
            }
        }
        self.writer.finish_end_element(xhtml::HTML)
    }

    fn write_head(&mut self, head: NodeRef<'d, Node>) -> WriterResult<()> {
        let mut has_title = false;
        let mut has_content_type = false;

        for child in head.children() {
            if let Some(element) = child.value().as_element() {
                has_title |= element.name() == xhtml::TITLE;
                has_content_type |= element
                    .attr(xhtml::HTTP_EQUIV)
                    .is_some_and(|value| value.eq_ignore_ascii_case(xhtml::CONTENT_TYPE));
            }
        }

        self.writer.start_element(xhtml::HEAD)?;
        self.writer.finish_start_element()?;

        if self.legacy() && !has_content_type {
            self.writer
                .start_element(xhtml::META)?
                .add_attribute(xhtml::HTTP_EQUIV, xhtml::CONTENT_TYPE)
                .add_attribute(xhtml::CONTENT, xhtml::CONTENT_TYPE_VALUE);
            self.writer.finish_empty_element()?;
        }

        for child in head.children() {
            let is_charset_meta = child.value().as_element().is_some_and(|element| {
                element.name() == xhtml::META && element.attr(xhtml::CHARSET).is_some()
            });
            // `<meta charset>` is replaced by the http-equiv declaration above
            if self.legacy() && is_charset_meta {
                continue;
            }
            self.write_node(child)?;
        }

        if !has_title {
            self.writer.start_element(xhtml::TITLE)?;
            self.writer.finish_text_element(self.options.title)?;
        }
        self.writer.finish_end_element(xhtml::HEAD)
    }

    fn write_node(&mut self, node: NodeRef<'d, Node>) -> WriterResult<()> {
        match node.value() {
            Node::Text(text) => self.writer.write_text(text),
            Node::Element(element) => self.write_element(node, element),
            // Comments, doctypes and processing instructions are dropped
            _ => Ok(()),
        }
    }

    fn write_element(&mut self, node: NodeRef<'d, Node>, element: &'d Element) -> WriterResult<()> {
        let edits = self.edits;
        let edit = edits.get(node.id());

        if let Some(edit) = edit {
            if edit.remove {
                return Ok(());
            }
            match &edit.replacement {
                Some(Replacement::Emphasis(text)) => {
                    self.writer.start_element(xhtml::EM)?;
                    return self.writer.finish_text_element(text);
                }
                Some(Replacement::Text(text)) => return self.writer.write_text(text),
                None => {}
            }
        }

        let name = self.element_name(element);
        self.writer.start_element(name)?;

        // Foreign content roots declare their own namespace
        let namespace: &str = &element.name.ns;
        let parent_namespace = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name.ns.to_string()));
        if (namespace == xhtml::SVG_NS || namespace == xhtml::MATHML_NS)
            && parent_namespace.as_deref() != Some(namespace)
        {
            self.writer.add_attribute(xml_ns(), namespace);
        }
        self.write_attributes(node.id(), element)?;

        if let Some(text) = edit.and_then(|edit| edit.text.as_deref()) {
            self.writer.write_text(text)?;
            return self.writer.finish_end_element(name);
        }

        let is_html = namespace == xhtml::XHTML_NS;
        if !node.has_children() && (!is_html || VOID_ELEMENTS.contains(&name)) {
            return self.writer.finish_empty_element();
        }
        for child in node.children() {
            self.write_node(child)?;
        }
        self.writer.finish_end_element(name)
    }

    fn element_name(&self, element: &'d Element) -> &'d str {
        let name = element.name();
        if self.legacy() {
            if let Some((_, renamed)) = LEGACY_RENAMES.iter().find(|(from, _)| *from == name) {
                return *renamed;
            }
        }
        name
    }

    fn write_attributes(&mut self, id: NodeId, element: &'d Element) -> WriterResult<()> {
        let legacy = self.legacy();
        let edits = self.edits;
        let overrides = edits
            .get(id)
            .map(|edit| edit.attributes.as_slice())
            .unwrap_or_default();

        for (name, value) in element.attrs() {
            let skip = !is_xml_name(name)
                || name == xml_ns()
                || name.starts_with("xmlns:")
                || legacy && (name.starts_with("epub:") || name == xhtml::CHARSET);
            if skip {
                continue;
            }
            let value = overrides
                .iter()
                .find(|(overridden, _)| overridden == name)
                .map_or(value, |(_, value)| value.as_str());
            self.writer.add_attribute(name, value);
        }

        for (name, value) in overrides {
            if element.attr(name).is_none() {
                self.writer.add_attribute(name, value.as_str());
            }
        }
        Ok(())
    }
}

fn xml_ns() -> &'static str {
    crate::consts::xml::XMLNS
}

fn xhtml_lang_attr() -> &'static str {
    crate::consts::xml::LANG
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}

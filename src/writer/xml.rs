use crate::writer::WriterResult;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::borrow::Cow;
use std::io::Write;

/// Thin state machine over [`quick_xml::Writer`] that keeps the
/// current start tag open so attributes can be appended to it.
pub(crate) struct XmlWriter<'a, W> {
    writer: quick_xml::Writer<W>,
    start_element: Option<BytesStart<'a>>,
}

impl<'a, W: Write> XmlWriter<'a, W> {
    /// Writer for generated package documents (two-space indentation).
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: quick_xml::Writer::new_with_indent(writer, b' ', 2),
            start_element: None,
        }
    }

    /// Writer for author content, where whitespace is significant.
    pub(crate) fn compact(writer: W) -> Self {
        Self {
            writer: quick_xml::Writer::new(writer),
            start_element: None,
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub(crate) fn write_utf8_declaration(&mut self) -> WriterResult<&mut Self> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(self)
    }

    /// `<!DOCTYPE {declaration}>`
    pub(crate) fn write_doctype(&mut self, declaration: &str) -> WriterResult<()> {
        self.writer
            .write_event(Event::DocType(BytesText::from_escaped(declaration)))?;
        Ok(())
    }

    /// Start an element: `<tag`
    pub(crate) fn start_element(&mut self, tag: &'a str) -> WriterResult<&mut Self> {
        // Close the pending parent first (e.g., `<parent><nested`)
        self.finish_start_element()?;

        self.start_element = Some(BytesStart::new(tag));
        Ok(self)
    }

    /// Append an attribute to the [started](Self::start_element) element: `<tag name="value"`
    ///
    /// `None` values are skipped.
    pub(crate) fn add_attribute<'b>(
        &mut self,
        name: &str,
        value: impl Into<Option<&'b str>>,
    ) -> &mut Self {
        if let (Some(element), Some(value)) = (&mut self.start_element, value.into()) {
            element.push_attribute(new_escaped_attribute(name, value));
        }
        self
    }

    pub(crate) fn add_attributes<'b>(
        &mut self,
        iter: impl IntoIterator<Item = (&'b str, &'b str)>,
    ) -> &mut Self {
        if let Some(element) = &mut self.start_element {
            element.extend_attributes(
                iter.into_iter()
                    .map(|(name, value)| new_escaped_attribute(name, value)),
            );
        }
        self
    }

    /// Write character data inside the current element.
    /// The given `text` is **unescaped**.
    pub(crate) fn write_text(&mut self, text: &str) -> WriterResult<()> {
        self.finish_start_element()?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(escape(text, Escape::Text))))?;
        Ok(())
    }

    // End states
    /// Finish writing a start element: **`<parent>`**
    ///
    /// See [`Self::finish_end_element`] to write the closing tag.
    pub(crate) fn finish_start_element(&mut self) -> WriterResult<()> {
        if let Some(element) = self.start_element.take() {
            self.writer.write_event(Event::Start(element))?;
        }
        Ok(())
    }

    /// Finish writing a parent element: **`<parent><inner/></parent>`**
    pub(crate) fn finish_end_element(&mut self, tag: &str) -> WriterResult<()> {
        // A pending start tag gets its `>` so the result is `<tag></tag>`, not `<tag/>`
        self.finish_start_element()?;

        self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        Ok(())
    }

    /// Finish writing a text element: **`<elem>text</elem>`**
    ///
    /// The given `text` is **unescaped**.
    pub(crate) fn finish_text_element(&mut self, text: &str) -> WriterResult<()> {
        if let Some(element) = self.start_element.take() {
            let text = BytesText::from_escaped(escape(text, Escape::Text));
            self.writer.write_event(Event::Start(element.borrow()))?;
            self.writer.write_event(Event::Text(text))?;
            self.writer.write_event(Event::End(element.to_end()))?;
        }
        Ok(())
    }

    /// Finish writing a self-closing element: **`<elem/>`**
    pub(crate) fn finish_empty_element(&mut self) -> WriterResult<()> {
        if let Some(element) = self.start_element.take() {
            self.writer.write_event(Event::Empty(element))?;
        }
        Ok(())
    }
}

fn new_escaped_attribute<'a>(name: &'a str, value: &'a str) -> Attribute<'a> {
    Attribute {
        key: quick_xml::name::QName(name.as_bytes()),
        value: match escape(value.trim(), Escape::Attribute) {
            Cow::Borrowed(borrowed) => Cow::Borrowed(borrowed.as_bytes()),
            Cow::Owned(owned) => Cow::Owned(owned.into_bytes()),
        },
    }
}

#[derive(Copy, Clone)]
enum Escape {
    /// Markup characters only.
    Text,
    /// Markup characters, quotes and whitespace that attribute
    /// normalization would otherwise collapse.
    Attribute,
}

fn escape(input: &str, mode: Escape) -> Cow<'_, str> {
    fn entity(c: char, mode: Escape) -> Option<&'static str> {
        match (c, mode) {
            ('<', _) => Some("&lt;"),
            ('>', _) => Some("&gt;"),
            ('&', _) => Some("&amp;"),
            ('"', Escape::Attribute) => Some("&quot;"),
            ('\'', Escape::Attribute) => Some("&apos;"),
            ('\t', Escape::Attribute) => Some("&#9;"),
            ('\n', Escape::Attribute) => Some("&#10;"),
            ('\r', Escape::Attribute) => Some("&#13;"),
            ('\u{00A0}', _) => Some("&#160;"),
            _ => None,
        }
    }

    let Some(first) = input.find(|c| entity(c, mode).is_some()) else {
        return Cow::Borrowed(input);
    };

    let mut escaped = String::with_capacity(input.len() + 16);
    escaped.push_str(&input[..first]);

    for c in input[first..].chars() {
        match entity(c, mode) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

macro_rules! write_element {
    // Empty (self-closing) element
    (writer: $w:expr, tag: $t:expr, $(attributes: $attrs:tt)?) => {
        $crate::writer::xml::write_element!(@helper $w, $t, $($attrs)?)
        .finish_empty_element()
    };
    // Text element
    (writer: $w:expr, tag: $t:expr, text: $text:expr, $(attributes: $attrs:tt)?) => {
        $crate::writer::xml::write_element!(@helper $w, $t, $($attrs)?)
        .finish_text_element($text)
    };
    // Parent element with inner content
    (writer: $w:expr, tag: $t:expr, $(attributes: $attrs:tt)? inner_content: $inner:block) => {{
        let tag = $t;
        $crate::writer::xml::write_element!(@helper $w, tag, $($attrs)?);
        $w.finish_start_element()?;
        $inner
        $w.finish_end_element(tag)
    }};

    //////////////////////////////////
    // HELPERS
    //////////////////////////////////

    (@helper $w:expr, $t:expr, { $($name:path $(where $cond:expr)? => $val:expr,)* ..$iter:expr, }) => {
        $crate::writer::xml::write_element!(@helper $w, $t, { $($name $(where $cond)? => $val,)* })
        // Explicit attributes win over the iterator
        .add_attributes($iter.filter(|(name, _)| match *name {
            $($name)|* => false,
            _ => true,
        }))
    };
    (@helper $w:expr, $t:expr, { $($name:path $(where $cond:expr)? => $val:expr,)* }) => {{
        let mut element = $w.start_element($t)?;
        $(
        $(if $cond)? {
            element = element.add_attribute($name, $val);
        }
        )*
        element
    }};
    (@helper $w:expr, $t:expr,) => {
        $w.start_element($t)?
    };
}

pub(crate) use write_element;

#[cfg(test)]
mod tests {
    use super::{Escape, XmlWriter, escape};

    #[test]
    fn test_escape_attribute() {
        #[rustfmt::skip]
        let expected = [
            ("&lt;&gt;&apos;&quot;&amp;&#13;&#10;&#9;&#160;", "<>'\"&\r\n\t\u{00A0}"),
            ("abc xyz", "abc xyz"),
            ("1 &lt; 2 &amp; 3", "1 < 2 & 3"),
            ("&quot;&apos;quoted&apos;&quot;", "\"'quoted'\""),
        ];

        for (expected_escaped, original) in expected {
            assert_eq!(expected_escaped, escape(original, Escape::Attribute));
        }
    }

    #[test]
    fn test_escape_text() {
        #[rustfmt::skip]
        let expected = [
            ("\"quoted\" it's", "\"quoted\" it's"),
            ("a &amp; b\nc", "a & b\nc"),
            ("&lt;p&gt;", "<p>"),
        ];

        for (expected_escaped, original) in expected {
            assert_eq!(expected_escaped, escape(original, Escape::Text));
        }
    }

    #[test]
    fn test_compact_writer() {
        let mut writer = XmlWriter::compact(Vec::new());
        writer.start_element("p").unwrap();
        writer.add_attribute("class", "a&b");
        writer.add_attribute("id", None);
        writer.write_text("1 < 2").unwrap();
        writer.start_element("br").unwrap();
        writer.finish_empty_element().unwrap();
        writer.finish_end_element("p").unwrap();

        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(r#"<p class="a&amp;b">1 &lt; 2<br/></p>"#, xml);
    }
}

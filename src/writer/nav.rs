use crate::consts::{xhtml, xml};
use crate::nav::{NavHandle, Navigation};
use crate::package::ReferenceOrder;
use crate::util::uri;
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::io::Write;

/// Inputs of the EPUB 3 navigation document.
pub(crate) struct NavDocument<'a> {
    pub(crate) nav: &'a Navigation,
    pub(crate) order: &'a ReferenceOrder,
    /// Root-relative path of the navigation document.
    pub(crate) location: &'a str,
    pub(crate) language: &'a str,
    /// Heading of the `toc` nav.
    pub(crate) title: &'a str,
    /// Root-relative path of an optional stylesheet.
    pub(crate) stylesheet: Option<&'a str>,
}

struct XhtmlNavWriter<'a, W> {
    doc: &'a NavDocument<'a>,
    writer: XmlWriter<'a, W>,
}

impl<'a, W: Write> XhtmlNavWriter<'a, W> {
    fn new(doc: &'a NavDocument<'a>, writer: W) -> Self {
        Self {
            doc,
            writer: XmlWriter::new(writer),
        }
    }

    /// An href relative to the navigation document.
    fn relativize(&self, href: &str) -> String {
        uri::relativize(uri::parent(self.doc.location), href)
    }

    fn write_xhtml(mut self) -> WriterResult<W> {
        let doc = self.doc;

        self.writer.write_utf8_declaration()?;
        self.writer.write_doctype(xhtml::HTML5_DOCTYPE)?;

        write_element! {
            writer: self.writer,
            tag: xhtml::HTML,
            attributes: {
                xml::XMLNS        => xhtml::XHTML_NS,
                xhtml::XMLNS_EPUB => xhtml::EPUB_NS,
                xml::LANG         => doc.language,
                xhtml::LANG       => doc.language,
            }
            inner_content: {
                self.write_nav_head()?;
                self.write_nav_body()?;
            }
        }?;
        Ok(self.writer.into_inner())
    }

    fn write_nav_head(&mut self) -> WriterResult<()> {
        let doc = self.doc;
        let stylesheet = doc.stylesheet.map(|href| self.relativize(href));

        write_element! {
            writer: self.writer,
            tag: xhtml::HEAD,
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: xhtml::META,
                    attributes: {
                        xhtml::CHARSET => xhtml::UTF_8,
                    }
                }?;
                write_element! {
                    writer: self.writer,
                    tag: xhtml::TITLE,
                    text: doc.title,
                }?;
                if let Some(href) = stylesheet.as_deref() {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::LINK,
                        attributes: {
                            xhtml::REL  => xhtml::STYLESHEET,
                            xhtml::TYPE => crate::consts::mime::CSS,
                            xhtml::HREF => href,
                        }
                    }?;
                }
            }
        }
    }

    fn write_nav_body(&mut self) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: xhtml::BODY,
            inner_content: {
                self.write_toc_nav()?;
                self.write_landmarks_nav()?;
            }
        }
    }

    fn write_toc_nav(&mut self) -> WriterResult<()> {
        let doc = self.doc;

        write_element! {
            writer: self.writer,
            tag: xhtml::NAV,
            attributes: {
                xhtml::EPUB_TYPE => xhtml::TOC,
                xml::ID          => xhtml::TOC,
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: xhtml::H2,
                    text: doc.title,
                }?;
                self.write_list(NavHandle::ROOT)?;
            }
        }
    }

    /// `<ol>` of the children of `parent`; omitted when there are none.
    fn write_list(&mut self, parent: NavHandle) -> WriterResult<()> {
        let nav = self.doc.nav;
        if nav.point(parent).children().is_empty() {
            return Ok(());
        }

        write_element! {
            writer: self.writer,
            tag: xhtml::OL,
            inner_content: {
                for (child, _) in nav.children_of(parent) {
                    self.write_list_item(child)?;
                }
            }
        }
    }

    fn write_list_item(&mut self, handle: NavHandle) -> WriterResult<()> {
        let nav = self.doc.nav;
        let point = nav.point(handle);
        let href = point.src().map(|src| self.relativize(src));

        write_element! {
            writer: self.writer,
            tag: xhtml::LI,
            attributes: {
                xml::ID              => point.id(),
                xhtml::CLASS         => point.class(),
                xml::DIR             => point.direction().map(|direction| direction.as_str()),
                xhtml::HIDDEN where point.is_hidden() => xhtml::HIDDEN,
            }
            inner_content: {
                match href.as_deref() {
                    Some(href) => write_element! {
                        writer: self.writer,
                        tag: xhtml::A,
                        text: point.label(),
                        attributes: {
                            xhtml::HREF => href,
                        }
                    }?,
                    // Headings without a target
                    None => write_element! {
                        writer: self.writer,
                        tag: xhtml::SPAN,
                        text: point.label(),
                    }?,
                }
                self.write_list(handle)?;
            }
        }
    }

    fn write_landmarks_nav(&mut self) -> WriterResult<()> {
        let doc = self.doc;
        let landmarks = doc.nav.ordered_landmarks(doc.order);
        if landmarks.is_empty() {
            return Ok(());
        }

        write_element! {
            writer: self.writer,
            tag: xhtml::NAV,
            attributes: {
                xhtml::EPUB_TYPE => xhtml::LANDMARKS,
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: xhtml::H2,
                    text: doc.nav.references_title(),
                }?;
                write_element! {
                    writer: self.writer,
                    tag: xhtml::OL,
                    inner_content: {
                        for landmark in landmarks {
                            let href = self.relativize(landmark.href());
                            let title = match landmark.title() {
                                "" => doc.order.title(landmark.kind()).unwrap_or_default(),
                                title => title,
                            };
                            write_element! {
                                writer: self.writer,
                                tag: xhtml::LI,
                                inner_content: {
                                    write_element! {
                                        writer: self.writer,
                                        tag: xhtml::A,
                                        text: title,
                                        attributes: {
                                            xhtml::EPUB_TYPE => landmark.kind().landmark_type(),
                                            xhtml::HREF      => href.as_str(),
                                        }
                                    }?;
                                }
                            }?;
                        }
                    }
                }?;
            }
        }
    }
}

/// Serialize the EPUB 3 navigation document.
pub(crate) fn write_nav_document(doc: &NavDocument<'_>) -> WriterResult<Vec<u8>> {
    XhtmlNavWriter::new(doc, Vec::new()).write_xhtml()
}

#[cfg(test)]
mod tests {
    use super::{NavDocument, write_nav_document};
    use crate::nav::{Navigation, SubLevel};
    use crate::package::{ReferenceOrder, ReferenceType};

    #[test]
    fn test_write_nav_document() {
        let mut nav = Navigation::default();
        nav.add_nav_point("One", Some("Text/chapter1.xhtml".into()));
        nav.sub_level(SubLevel::titled("Hidden part").hidden(true));
        nav.add_nav_point("Two", Some("Text/chapter2.xhtml".into()));
        nav.add_landmark(ReferenceType::Text, "Text/chapter1.xhtml", "");
        nav.add_landmark(ReferenceType::Cover, "CoverPage.xhtml", "Cover");

        let order = ReferenceOrder::default();
        let doc = NavDocument {
            nav: &nav,
            order: &order,
            location: "nav/epub3toc.xhtml",
            language: "en",
            title: "Contents",
            stylesheet: None,
        };
        let xhtml = String::from_utf8(write_nav_document(&doc).unwrap()).unwrap();

        assert!(xhtml.contains("<!DOCTYPE html>"));
        assert!(xhtml.contains(r#"<nav epub:type="toc" id="toc">"#));
        assert!(xhtml.contains(r#"<a href="../Text/chapter1.xhtml">One</a>"#));
        assert!(xhtml.contains(r#"<li hidden="hidden">"#));
        assert!(xhtml.contains("<span>Hidden part</span>"));
        assert!(xhtml.contains(r#"<nav epub:type="landmarks">"#));

        let cover = xhtml.find(r#"<a epub:type="cover" href="../CoverPage.xhtml">Cover</a>"#);
        let text = xhtml.find(r#"<a epub:type="bodymatter" href="../Text/chapter1.xhtml">First Page</a>"#);
        assert!(cover.is_some() && text.is_some() && cover < text);
    }
}

use crate::consts::{mime, xhtml, xml};
use crate::util::uri;
use crate::version::EpubVersion;
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::io::Write;

/// A content document generated by the book itself (cover page, table of contents).
pub(crate) struct Page<'a> {
    pub(crate) version: EpubVersion,
    /// Root-relative path of the page.
    pub(crate) location: &'a str,
    pub(crate) language: &'a str,
    pub(crate) title: &'a str,
    /// Root-relative paths of linked stylesheets.
    pub(crate) stylesheets: &'a [&'a str],
    /// Inline `<style>` content.
    pub(crate) style: Option<&'a str>,
    /// `<meta name="viewport">` content.
    pub(crate) viewport: Option<&'a str>,
    pub(crate) body: PageBody<'a>,
}

pub(crate) enum PageBody<'a> {
    Cover { image: &'a str, alt: &'a str },
    Toc { class: &'a str, heading: &'a str, rows: &'a [TocRow] },
}

/// One line of a generated table of contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TocRow {
    pub(crate) level: usize,
    pub(crate) reference: bool,
    pub(crate) label: String,
    /// Root-relative target.
    pub(crate) href: Option<String>,
}

struct PageWriter<'a, W> {
    page: &'a Page<'a>,
    writer: XmlWriter<'a, W>,
}

impl<'a, W: Write> PageWriter<'a, W> {
    fn legacy(&self) -> bool {
        self.page.version.is_legacy()
    }

    fn relativize(&self, href: &str) -> String {
        uri::relativize(uri::parent(self.page.location), href)
    }

    fn write_page(mut self) -> WriterResult<W> {
        let page = self.page;
        let legacy = self.legacy();

        self.writer.write_utf8_declaration()?;
        self.writer.write_doctype(if legacy { xhtml::XHTML11_DOCTYPE } else { xhtml::HTML5_DOCTYPE })?;

        write_element! {
            writer: self.writer,
            tag: xhtml::HTML,
            attributes: {
                xml::XMLNS                         => xhtml::XHTML_NS,
                xhtml::XMLNS_EPUB where !legacy    => xhtml::EPUB_NS,
                xml::LANG                          => page.language,
                xhtml::LANG where !legacy          => page.language,
            }
            inner_content: {
                self.write_head()?;
                write_element! {
                    writer: self.writer,
                    tag: xhtml::BODY,
                    inner_content: {
                        match &page.body {
                            PageBody::Cover { image, alt } => self.write_cover(image, alt)?,
                            PageBody::Toc { class, heading, rows } => self.write_toc(class, heading, rows)?,
                        }
                    }
                }?;
            }
        }?;
        Ok(self.writer.into_inner())
    }

    fn write_head(&mut self) -> WriterResult<()> {
        let page = self.page;
        let stylesheets: Vec<String> = page.stylesheets.iter().map(|href| self.relativize(href)).collect();

        write_element! {
            writer: self.writer,
            tag: xhtml::HEAD,
            inner_content: {
                if self.legacy() {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::META,
                        attributes: {
                            xhtml::HTTP_EQUIV => xhtml::CONTENT_TYPE,
                            xhtml::CONTENT    => xhtml::CONTENT_TYPE_VALUE,
                        }
                    }?;
                } else {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::META,
                        attributes: {
                            xhtml::CHARSET => xhtml::UTF_8,
                        }
                    }?;
                }
                if let Some(viewport) = page.viewport {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::META,
                        attributes: {
                            xhtml::NAME    => xhtml::VIEWPORT,
                            xhtml::CONTENT => viewport,
                        }
                    }?;
                }
                write_element! {
                    writer: self.writer,
                    tag: xhtml::TITLE,
                    text: page.title,
                }?;
                for href in &stylesheets {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::LINK,
                        attributes: {
                            xhtml::REL  => xhtml::STYLESHEET,
                            xhtml::TYPE => mime::CSS,
                            xhtml::HREF => href.as_str(),
                        }
                    }?;
                }
                if let Some(style) = page.style {
                    write_element! {
                        writer: self.writer,
                        tag: xhtml::STYLE,
                        text: style,
                        attributes: {
                            xhtml::TYPE => mime::CSS,
                        }
                    }?;
                }
            }
        }
    }

    fn write_cover(&mut self, image: &str, alt: &str) -> WriterResult<()> {
        let legacy = self.legacy();
        let src = self.relativize(image);
        let tag = if legacy { xhtml::DIV } else { xhtml::SECTION };

        write_element! {
            writer: self.writer,
            tag: tag,
            attributes: {
                xml::ID                          => "cover-image",
                xhtml::EPUB_TYPE where !legacy   => xhtml::COVER,
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: xhtml::IMG,
                    attributes: {
                        xhtml::SRC => src.as_str(),
                        xhtml::ALT => alt,
                    }
                }?;
            }
        }
    }

    fn write_toc(&mut self, class: &str, heading: &str, rows: &[TocRow]) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: xhtml::DIV,
            attributes: {
                xhtml::CLASS => class,
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: xhtml::H3,
                    text: heading,
                }?;
                for row in rows {
                    self.write_toc_row(row)?;
                }
            }
        }
    }

    fn write_toc_row(&mut self, row: &TocRow) -> WriterResult<()> {
        let class = match row.reference {
            true => format!("level{} reference", row.level),
            false => format!("level{}", row.level),
        };
        let href = row.href.as_deref().map(|href| self.relativize(href));

        write_element! {
            writer: self.writer,
            tag: xhtml::P,
            attributes: {
                xhtml::CLASS => class.as_str(),
            }
            inner_content: {
                match href.as_deref() {
                    Some(href) => write_element! {
                        writer: self.writer,
                        tag: xhtml::A,
                        text: &row.label,
                        attributes: {
                            xhtml::HREF => href,
                        }
                    }?,
                    None => self.writer.write_text(&row.label)?,
                }
            }
        }
    }
}

/// Indentation rules for the `levelN` rows of a generated table of contents.
pub(crate) fn toc_style(class: &str, depth: usize) -> String {
    (1..=depth.max(1))
        .map(|level| format!(".{class} .level{level} {{ margin-left: {}em; }}\n", (level - 1) * 2))
        .collect()
}

pub(crate) fn write_page(page: &Page<'_>) -> WriterResult<Vec<u8>> {
    PageWriter {
        page,
        writer: XmlWriter::new(Vec::new()),
    }
    .write_page()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page<'a>(version: EpubVersion, body: PageBody<'a>) -> Page<'a> {
        Page {
            version,
            location: "Text/page.xhtml",
            language: "fr",
            title: "Page",
            stylesheets: &["Styles/CoverPage.css"],
            style: None,
            viewport: Some("width=600, height=800"),
            body,
        }
    }

    #[test]
    fn test_cover_page() {
        let body = || PageBody::Cover {
            image: "images/cover.jpg",
            alt: "Cover",
        };
        let modern = String::from_utf8(write_page(&page(EpubVersion::Epub3, body())).unwrap()).unwrap();
        let legacy = String::from_utf8(write_page(&page(EpubVersion::Epub2, body())).unwrap()).unwrap();

        assert!(modern.contains(r#"<section id="cover-image" epub:type="cover">"#));
        assert!(modern.contains(r#"<img src="../images/cover.jpg" alt="Cover"/>"#));
        assert!(modern.contains(r#"<link rel="stylesheet" type="text/css" href="../Styles/CoverPage.css"/>"#));
        assert!(modern.contains(r#"<meta name="viewport" content="width=600, height=800"/>"#));

        assert!(legacy.contains(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN""#));
        assert!(!legacy.contains("epub:"));
        assert!(legacy.contains(r#"<div id="cover-image">"#));
        assert!(legacy.contains(r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>"#));
    }

    #[test]
    fn test_toc_page() {
        let rows = [
            TocRow { level: 1, reference: true, label: "Cover Page".into(), href: Some("CoverPage.xhtml".into()) },
            TocRow { level: 1, reference: false, label: "Part & One".into(), href: None },
            TocRow { level: 2, reference: false, label: "Chapter 1".into(), href: Some("Text/c1.xhtml".into()) },
        ];
        let body = PageBody::Toc {
            class: "toc",
            heading: "Contents",
            rows: &rows,
        };
        let xhtml = String::from_utf8(write_page(&page(EpubVersion::Epub3, body)).unwrap()).unwrap();

        assert!(xhtml.contains(r#"<p class="level1 reference">"#));
        assert!(xhtml.contains(r#"<a href="../CoverPage.xhtml">Cover Page</a>"#));
        assert!(xhtml.contains(r#"<p class="level1">Part &amp; One</p>"#));
        assert!(xhtml.contains(r#"<p class="level2">"#));
        assert!(xhtml.contains(r#"<a href="c1.xhtml">Chapter 1</a>"#));
    }

    #[test]
    fn test_toc_style() {
        assert_eq!(
            ".toc .level1 { margin-left: 0em; }\n.toc .level2 { margin-left: 2em; }\n",
            toc_style("toc", 2)
        );
    }
}

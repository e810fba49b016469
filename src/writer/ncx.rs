use crate::consts::{ncx, xml};
use crate::nav::{NavHandle, Navigation};
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::collections::HashMap;
use std::io::Write;

/// Book-level values written into the NCX head and titles.
pub(crate) struct NcxHead<'a> {
    pub(crate) uid: &'a str,
    pub(crate) title: &'a str,
    pub(crate) author: Option<&'a str>,
    pub(crate) generator: Option<&'a str>,
}

struct NcxWriter<'a, W> {
    nav: &'a Navigation,
    head: &'a NcxHead<'a>,
    writer: XmlWriter<'a, W>,
    /// `playOrder` of each target written so far; points sharing a
    /// target share its `playOrder`.
    play_orders: HashMap<&'a str, usize>,
    /// NavPoints written so far.
    points: usize,
}

impl<'a, W: Write> NcxWriter<'a, W> {
    const NAV_POINT_ID_PREFIX: &'static str = "nav-point-";

    fn new(nav: &'a Navigation, head: &'a NcxHead<'a>, writer: W) -> Self {
        Self {
            nav,
            head,
            writer: XmlWriter::new(writer),
            play_orders: HashMap::new(),
            points: 0,
        }
    }

    fn write_ncx(mut self) -> WriterResult<W> {
        self.writer.write_utf8_declaration()?;

        write_element! {
            writer: self.writer,
            tag: ncx::NCX,
            attributes: {
                xml::XMLNS   => ncx::NCX_NS,
                ncx::VERSION => ncx::NCX_VERSION,
            }
            inner_content: {
                self.write_ncx_head()?;
                self.write_ncx_titles()?;
                self.write_ncx_nav_map()?;
            }
        }?;
        Ok(self.writer.into_inner())
    }

    fn write_ncx_head(&mut self) -> WriterResult<()> {
        const ZERO: &str = "0";
        let depth = self.nav.depth().to_string();

        write_element! {
            writer: self.writer,
            tag: ncx::HEAD,
            inner_content: {
                self.write_ncx_meta(ncx::DTB_UID, self.head.uid)?;
                self.write_ncx_meta(ncx::DTB_DEPTH, &depth)?;
                self.write_ncx_meta(ncx::DTB_TOTAL_PAGE_COUNT, ZERO)?;
                self.write_ncx_meta(ncx::DTB_MAX_PAGE_NUMBER, ZERO)?;
                if let Some(generator) = self.head.generator {
                    self.write_ncx_meta(ncx::DTB_GENERATOR, generator)?;
                }
            }
        }
    }

    fn write_ncx_meta(&mut self, name: &str, content: &str) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: ncx::META,
            attributes: {
                ncx::NAME    => name,
                ncx::CONTENT => content,
            }
        }
    }

    fn write_ncx_titles(&mut self) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: ncx::DOC_TITLE,
            inner_content: {
                self.write_ncx_text(self.head.title)?;
            }
        }?;

        let Some(author) = self.head.author else {
            return Ok(());
        };
        write_element! {
            writer: self.writer,
            tag: ncx::DOC_AUTHOR,
            inner_content: {
                self.write_ncx_text(author)?;
            }
        }
    }

    fn write_ncx_nav_map(&mut self) -> WriterResult<()> {
        let nav = self.nav;

        write_element! {
            writer: self.writer,
            tag: ncx::NAV_MAP,
            inner_content: {
                for (handle, _) in nav.children_of(NavHandle::ROOT) {
                    self.write_ncx_nav_point(handle)?;
                }
            }
        }
    }

    fn write_ncx_nav_point(&mut self, handle: NavHandle) -> WriterResult<()> {
        let nav = self.nav;
        let point = nav.point(handle);

        // Grouping points target their first descendant
        let Some(src) = nav.first_target(handle) else {
            return Ok(());
        };

        let next = self.play_orders.len() + 1;
        let play_order = self.play_orders.entry(src).or_insert(next).to_string();
        self.points += 1;
        // `navPoint` elements require an id
        let generated_id = point
            .id()
            .is_none()
            .then(|| format!("{}{}", Self::NAV_POINT_ID_PREFIX, self.points));

        write_element! {
            writer: self.writer,
            tag: ncx::NAV_POINT,
            attributes: {
                xml::ID         => point.id().or(generated_id.as_deref()),
                ncx::CLASS      => point.class(),
                ncx::PLAY_ORDER => play_order.as_str(),
            }
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: ncx::NAV_LABEL,
                    inner_content: {
                        self.write_ncx_text(point.label())?;
                    }
                }?;
                write_element! {
                    writer: self.writer,
                    tag: ncx::CONTENT,
                    attributes: {
                        ncx::SRC => src,
                    }
                }?;
                for (child, _) in nav.children_of(handle) {
                    self.write_ncx_nav_point(child)?;
                }
            }
        }
    }

    fn write_ncx_text(&mut self, text: &str) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: ncx::TEXT,
            text: text,
        }
    }
}

/// Serialize the navigation tree as an NCX document.
pub(crate) fn write_ncx(nav: &Navigation, head: &NcxHead<'_>) -> WriterResult<Vec<u8>> {
    NcxWriter::new(nav, head, Vec::new()).write_ncx()
}

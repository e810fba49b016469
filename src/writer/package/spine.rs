use crate::consts::{ncx, opf};
use crate::package::SpineEntry;
use crate::version::TextDirection;
use crate::writer::WriterResult;
use crate::writer::package::PackageWriter;
use crate::writer::xml::write_element;
use std::io::Write;

impl<W: Write> PackageWriter<'_, W> {
    pub(super) fn write_spine(&mut self) -> WriterResult<()> {
        let package = self.package;
        // Page progression direction is an EPUB 3 feature
        let rtl = package.version.is_modern() && package.direction == TextDirection::Rtl;

        write_element! {
            writer: self.writer,
            tag: opf::SPINE,
            attributes: {
                opf::TOC => ncx::NCX_ID,
                opf::PAGE_PROGRESSION_DIRECTION where rtl => package.direction.as_str(),
            }
            inner_content: {
                for entry in package.spine.iter() {
                    self.write_itemref(entry)?;
                }
            }
        }
    }

    fn write_itemref(&mut self, itemref: &SpineEntry) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: opf::ITEMREF,
            attributes: {
                opf::IDREF => itemref.idref(),
                // A `linear` attribute with a value of `yes` is redundant
                opf::LINEAR where !itemref.is_linear() => opf::NO,
            }
        }
    }
}

use crate::consts::opf;
use crate::package::GuideReference;
use crate::writer::WriterResult;
use crate::writer::package::PackageWriter;
use crate::writer::xml::write_element;
use std::io::Write;

impl<W: Write> PackageWriter<'_, W> {
    pub(super) fn write_guide(&mut self) -> WriterResult<()> {
        let package = self.package;
        let guide = &package.guide;
        if guide.is_empty() {
            return Ok(());
        }

        write_element! {
            writer: self.writer,
            tag: opf::GUIDE,
            inner_content: {
                for reference in guide.iter() {
                    self.write_reference(reference)?;
                }
            }
        }
    }

    fn write_reference(&mut self, reference: &GuideReference) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: opf::REFERENCE,
            attributes: {
                opf::TYPE  => reference.kind().guide_type(),
                opf::TITLE => reference.title(),
                opf::HREF  => reference.href(),
            }
        }
    }
}

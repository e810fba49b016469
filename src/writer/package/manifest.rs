use crate::consts::{opf, xml};
use crate::package::ManifestItem;
use crate::writer::WriterResult;
use crate::writer::package::PackageWriter;
use crate::writer::xml::write_element;
use std::io::Write;

impl<W: Write> PackageWriter<'_, W> {
    pub(super) fn write_manifest(&mut self) -> WriterResult<()> {
        let package = self.package;
        let manifest = &package.manifest;

        write_element! {
            writer: self.writer,
            tag: opf::MANIFEST,
            inner_content: {
                for item in manifest.iter() {
                    self.write_item(item)?;
                }
            }
        }
    }

    fn write_item(&mut self, item: &ManifestItem) -> WriterResult<()> {
        let modern = self.package.version.is_modern();
        let properties = item.properties();

        write_element! {
            writer: self.writer,
            tag: opf::ITEM,
            attributes: {
                xml::ID                 => item.id(),
                opf::HREF               => item.href(),
                opf::MEDIA_TYPE         => item.media_type(),
                opf::FALLBACK           => item.fallback(),
                opf::FALLBACK_STYLE     => item.fallback_style(),
                opf::REQUIRED_NAMESPACE => item.required_namespace(),
                opf::REQUIRED_MODULES   => item.required_modules(),

                // EPUB 3 attributes
                opf::PROPERTIES    where modern => properties.as_deref(),
                opf::MEDIA_OVERLAY where modern => item.media_overlay(),
            }
        }
    }
}

use crate::consts::{mime, ocf, xml};
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::io::Write;

struct ContainerWriter<'a, W> {
    package_path: &'a str,
    writer: XmlWriter<'a, W>,
}

impl<'a, W: Write> ContainerWriter<'a, W> {
    fn new(package_path: &'a str, writer: W) -> Self {
        Self {
            package_path,
            writer: XmlWriter::new(writer),
        }
    }

    fn write_container(mut self) -> WriterResult<W> {
        self.writer.write_utf8_declaration()?;

        write_element! {
            writer: self.writer,
            tag: ocf::CONTAINER,
            attributes: {
                ocf::VERSION => ocf::CONTAINER_VERSION,
                xml::XMLNS   => ocf::CONTAINER_NS,
            }
            inner_content: {
                self.write_root_files()?;
            }
        }?;
        Ok(self.writer.into_inner())
    }

    fn write_root_files(&mut self) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: ocf::ROOT_FILES,
            inner_content: {
                write_element! {
                    writer: self.writer,
                    tag: ocf::ROOT_FILE,
                    attributes: {
                        // Root file paths must not be prefixed with '/'
                        ocf::FULL_PATH  => self.package_path.trim_start_matches('/'),
                        ocf::MEDIA_TYPE => mime::OEBPS_PACKAGE,
                    }
                }?;
            }
        }
    }
}

/// `META-INF/container.xml` pointing at the package document.
pub(crate) fn write_container(package_path: &str) -> WriterResult<Vec<u8>> {
    ContainerWriter::new(package_path, Vec::new()).write_container()
}

#[cfg(test)]
mod tests {
    use super::write_container;

    #[test]
    fn test_write_container() {
        let xml = String::from_utf8(write_container("OEBPS/book.opf").unwrap()).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">"#));
        assert!(xml.contains(r#"<rootfile full-path="OEBPS/book.opf" media-type="application/oebps-package+xml"/>"#));
    }
}

use crate::consts::{dc, opf, xml};
use crate::package::{MetaValue, PackageDocument};
use crate::writer::WriterResult;
use crate::writer::xml::{XmlWriter, write_element};
use std::io::Write;

mod guide;
mod manifest;
mod metadata;
mod spine;

pub(super) struct PackageWriter<'pkg, W> {
    package: &'pkg PackageDocument,
    /// `dcterms:modified` value, used unless the metadata declares one.
    modified: &'pkg str,
    writer: XmlWriter<'pkg, W>,
}

impl<'pkg, W: Write> PackageWriter<'pkg, W> {
    fn new(package: &'pkg PackageDocument, modified: &'pkg str, writer: W) -> Self {
        Self {
            package,
            modified,
            writer: XmlWriter::new(writer),
        }
    }

    fn write_opf(mut self) -> WriterResult<W> {
        let package = self.package;
        let modern = package.version.is_modern();
        let language = package.metadata.value(dc::LANGUAGE).map(MetaValue::value);
        let prefixes = package.namespaces.prefix_attribute();
        let namespaces: Vec<(String, &str)> = package
            .namespaces
            .namespaces()
            .map(|(name, uri)| (format!("{}:{name}", xml::XMLNS), uri))
            .collect();

        self.writer.write_utf8_declaration()?;

        write_element! {
            writer: self.writer,
            tag: opf::PACKAGE,
            attributes: {
                xml::XMLNS             => opf::OPF_NS,
                opf::VERSION           => package.version.as_str(),
                opf::UNIQUE_IDENTIFIER => opf::UNIQUE_IDENTIFIER_ID,

                // EPUB 3 attributes
                xml::LANG   where modern => language,
                opf::PREFIX where modern => prefixes.as_deref(),

                ..namespaces.iter().map(|(name, uri)| (name.as_str(), *uri)),
            }
            inner_content: {
                self.write_metadata()?;
                self.write_manifest()?;
                self.write_spine()?;
                self.write_guide()?;
            }
        }?;
        Ok(self.writer.into_inner())
    }
}

/// Serialize the package document (`.opf`).
pub(crate) fn write_package(package: &PackageDocument, modified: &str) -> WriterResult<Vec<u8>> {
    PackageWriter::new(package, modified, Vec::new()).write_opf()
}

#[cfg(test)]
mod tests {
    use super::write_package;
    use crate::package::{ManifestItem, MetaProperty, MetaValue, PackageDocument, ReferenceType};
    use crate::version::{EpubVersion, TextDirection};

    const MODIFIED: &str = "2024-01-02T03:04:05Z";

    fn package(version: EpubVersion) -> PackageDocument {
        let mut package = PackageDocument::new(version, TextDirection::Rtl);
        let metadata = &mut package.metadata;
        metadata.add_value(MetaValue::new("dc:title", "Test & Title"));
        metadata.add_value(MetaValue::new("dc:language", "en"));
        metadata.add_value(MetaValue::new("dc:identifier", "urn:uuid:1").with_attribute("id", "BookId"));
        metadata.add_value(
            MetaValue::new("dc:creator", "Jane Doe")
                .with_opf_attribute("file-as", "Doe, Jane")
                .with_opf_attribute("role", "aut"),
        );
        metadata.add_property(MetaProperty::new("schema:accessMode", "textual"));
        metadata.add_property(MetaProperty::new("media:duration", "0:00:10").refining("smil_1"));
        metadata.add_meta("generator", "bindery");

        package.manifest.add_item(
            ManifestItem::new("chapter1", "chapter1.xhtml", "application/xhtml+xml").with_property("svg"),
        );
        package.manifest.add_item(ManifestItem::new("ref_toc", "TOC.xhtml", "application/xhtml+xml"));
        package.spine.add_itemref("chapter1", true);
        package.spine.add_itemref("ref_toc", false);
        package.guide.add_reference(ReferenceType::Text, "First Page", "chapter1.xhtml");
        package.namespaces.add_namespace("calibre", "http://calibre.kovidgoyal.net/2009/metadata");
        package.namespaces.add_prefix("schema", "http://schema.org/");
        package
    }

    fn render(version: EpubVersion) -> String {
        String::from_utf8(write_package(&package(version), MODIFIED).unwrap()).unwrap()
    }

    #[test]
    fn test_modern_package() {
        let opf = render(EpubVersion::Epub3);

        assert!(opf.contains(
            r#"<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId" xml:lang="en" prefix="schema: http://schema.org/" xmlns:calibre="http://calibre.kovidgoyal.net/2009/metadata">"#
        ));
        assert!(opf.contains(r#"<metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">"#));
        assert!(opf.contains("<dc:title>Test &amp; Title</dc:title>"));
        assert!(opf.contains(r#"<dc:creator id="creator_3">Jane Doe</dc:creator>"#));
        assert!(opf.contains(r##"<meta property="file-as" refines="#creator_3">Doe, Jane</meta>"##));
        assert!(opf.contains(r##"<meta property="role" refines="#creator_3" scheme="marc:relators">aut</meta>"##));
        assert!(opf.contains(r##"<meta property="media:duration" refines="#smil_1">0:00:10</meta>"##));
        assert!(opf.contains(r#"<meta property="dcterms:modified">2024-01-02T03:04:05Z</meta>"#));
        assert!(opf.contains(r#"<item id="chapter1" href="chapter1.xhtml" media-type="application/xhtml+xml" properties="svg"/>"#));
        assert!(opf.contains(r#"<spine toc="ncx" page-progression-direction="rtl">"#));
        assert!(opf.contains(r#"<itemref idref="ref_toc" linear="no"/>"#));
        assert!(opf.contains(r#"<reference type="text" title="First Page" href="chapter1.xhtml"/>"#));
    }

    #[test]
    fn test_legacy_package() {
        let opf = render(EpubVersion::Epub2);

        assert!(opf.contains(r#"version="2.0""#));
        assert!(!opf.contains("prefix="));
        assert!(!opf.contains("xml:lang"));
        assert!(opf.contains(r#"xmlns:opf="http://www.idpf.org/2007/opf""#));
        assert!(opf.contains(r#"<dc:creator opf:file-as="Doe, Jane" opf:role="aut">Jane Doe</dc:creator>"#));
        assert!(opf.contains(r#"<meta name="schema:accessMode" content="textual"/>"#));
        assert!(!opf.contains("media:duration"));
        assert!(!opf.contains("dcterms:modified"));
        assert!(!opf.contains("properties="));
        assert!(opf.contains(r#"<spine toc="ncx">"#));
    }
}

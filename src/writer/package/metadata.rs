use crate::consts::{dc, opf, xml};
use crate::package::{MetaProperty, MetaValue};
use crate::writer::WriterResult;
use crate::writer::package::PackageWriter;
use crate::writer::xml::write_element;
use std::io::Write;

/// Opf attributes expressed as `refines` metas in EPUB 3.
const REFINED_ATTRIBUTES: &[&str] = &[opf::FILE_AS, opf::ROLE];

impl<'pkg, W: Write> PackageWriter<'pkg, W> {
    pub(super) fn write_metadata(&mut self) -> WriterResult<()> {
        let package = self.package;
        let metadata = &package.metadata;
        let legacy = package.version.is_legacy();
        let mut refinements = Vec::new();

        write_element! {
            writer: self.writer,
            tag: opf::METADATA,
            attributes: {
                dc::XMLNS_DC      where metadata.has_dublin_core() => dc::DUBLIN_CORE_NS,
                // Legacy `opf:*` attributes
                opf::XMLNS_OPF    where legacy => opf::OPF_NS,
                dc::XMLNS_DCTERMS where !legacy => dc::DCTERMS_NS,
            }
            inner_content: {
                for (index, value) in metadata.values().iter().enumerate() {
                    self.write_meta_value(value, index, &mut refinements)?;
                }
                for property in metadata.properties().iter().chain(&refinements) {
                    self.write_meta_property(property)?;
                }
                if !legacy && metadata.property(dc::MODIFIED).is_none() {
                    write_element! {
                        writer: self.writer,
                        tag: opf::META,
                        text: self.modified,
                        attributes: {
                            opf::PROPERTY => dc::MODIFIED,
                        }
                    }?;
                }
                for (name, content) in metadata.metas() {
                    self.write_named_meta(name, content)?;
                }
            }
        }
    }

    fn write_meta_value(
        &mut self,
        value: &'pkg MetaValue,
        index: usize,
        refinements: &mut Vec<MetaProperty>,
    ) -> WriterResult<()> {
        let legacy = self.package.version.is_legacy();
        let mut id = value.attribute(xml::ID).map(str::to_owned);

        let opf_attributes: Vec<(String, &str)> = if legacy {
            value
                .opf_attributes()
                .map(|(name, value)| (format!("opf:{name}"), value))
                .collect()
        } else {
            // Other opf attributes have no EPUB 3 counterpart
            let refined = value
                .opf_attributes()
                .filter(|(name, _)| REFINED_ATTRIBUTES.contains(name))
                .collect::<Vec<_>>();

            if !refined.is_empty() {
                let local_name = value.name().rsplit(':').next().unwrap_or(value.name());
                let id = id.get_or_insert_with(|| format!("{local_name}_{index}"));

                refinements.extend(refined.into_iter().map(|(name, content)| {
                    let property = MetaProperty::new(name, content).refining(id);
                    match name {
                        opf::ROLE => property.with_scheme(opf::MARC_RELATORS),
                        _ => property,
                    }
                }));
            }
            Vec::new()
        };

        write_element! {
            writer: self.writer,
            tag: value.name(),
            text: value.value(),
            attributes: {
                xml::ID => id.as_deref(),
                ..value
                    .attributes()
                    .chain(opf_attributes.iter().map(|(name, value)| (name.as_str(), *value))),
            }
        }
    }

    fn write_meta_property(&mut self, property: &MetaProperty) -> WriterResult<()> {
        if self.package.version.is_legacy() {
            // EPUB 2 has no refinements
            return match property.refines() {
                Some(_) => Ok(()),
                None => self.write_named_meta(property.property(), property.value()),
            };
        }

        write_element! {
            writer: self.writer,
            tag: opf::META,
            text: property.value(),
            attributes: {
                opf::PROPERTY => property.property(),
                opf::REFINES  => property.refines(),
                opf::SCHEME   => property.scheme(),
            }
        }
    }

    fn write_named_meta(&mut self, name: &str, content: &str) -> WriterResult<()> {
        write_element! {
            writer: self.writer,
            tag: opf::META,
            attributes: {
                opf::NAME    => name,
                opf::CONTENT => content,
            }
        }
    }
}

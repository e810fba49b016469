use crate::book::pages::{COVER_IMAGE_ID, TOC_ID};
use crate::book::stage::{Sources, check_entry, list_item, start_container, storage_for};
use crate::book::{Book, ClockValue, IdentifierScheme};
use crate::consts::{dc, mime, ncx, opf, rendition, schema, xml};
use crate::errors::{BookResult, StateError};
use crate::nav::Navigation;
use crate::package::{ManifestItem, MetaProperty, MetaValue, Metadata, PackageDocument, ReferenceType};
use crate::util::path;
use crate::writer::zip::Storage;
use crate::writer::{NavDocument, NcxHead, SmilClip, write_nav_document, write_ncx, write_package, write_smil};
use chrono::{DateTime, Utc};

const TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";
const SHORT_DATE: &str = "%Y-%m-%d";
const NAV_ID: &str = "toc";

/// Working copies of the models a finalize pass changes, plus the
/// generated entries waiting to be committed.
///
/// Nothing reaches the book until every document is serialized.
struct Draft<'a> {
    root: &'a str,
    package: PackageDocument,
    nav: Navigation,
    sources: Sources,
    entries: Vec<(String, Vec<u8>, Storage)>,
}

impl Draft<'_> {
    fn add(&mut self, href: &str, id: &str, data: Vec<u8>, media_type: &str) -> BookResult<String> {
        let href = check_entry(self.root, &self.sources, &self.package.manifest, href, id)?;
        let full_path = format!("{}{href}", self.root);

        list_item(&mut self.package.manifest, ManifestItem::new(id, &href, media_type))?;
        self.sources.insert(full_path.clone(), id.to_owned());
        self.entries.push((full_path, data, storage_for(media_type)));
        Ok(href)
    }
}

impl Book {
    /// Write the package document, the navigation documents and any
    /// generated pages, then seal the container.
    ///
    /// Called implicitly by [`Book::to_vec`], [`Book::write_to`],
    /// [`Book::save`] and [`Book::size`]. Every check runs before the
    /// first entry is committed; on error the book is left unchanged.
    ///
    /// # Errors
    /// - [`StateError::NoChapters`], [`StateError::MissingTitle`] and
    ///   [`StateError::MissingLanguage`] when the book is incomplete.
    /// - [`StateError::DanglingSpineEntry`] when the reading order names
    ///   a missing item, such as a table of contents placeholder without
    ///   a [`Book::build_toc`] request.
    /// - [`StateError::Finalized`] on a second call.
    pub fn finalize(&mut self) -> BookResult<()> {
        self.ensure_open()?;
        let Some(first_chapter) = self.first_chapter.clone() else {
            return Err(StateError::NoChapters.into());
        };
        if self.details.title.trim().is_empty() {
            return Err(StateError::MissingTitle.into());
        }
        if self.details.language.is_empty() {
            return Err(StateError::MissingLanguage.into());
        }

        let now = Utc::now();
        let identifier = match &self.details.identifier {
            Some((value, scheme)) => (value.clone(), *scheme),
            None => (format!("urn:uuid:{}", uuid::Uuid::new_v4()), IdentifierScheme::Uuid),
        };
        let generator = self
            .details
            .generator
            .clone()
            .unwrap_or_else(|| format!("bindery v{}", env!("CARGO_PKG_VERSION")));

        let mut draft = Draft {
            root: &self.root,
            package: self.package.clone(),
            nav: self.nav.clone(),
            sources: self.sources.clone(),
            entries: Vec::new(),
        };
        draft.package.metadata = self.package_metadata(&identifier, &generator, now);
        if self.options.version.is_modern() && !self.details.rendition.is_empty() {
            draft.package.namespaces.add_prefix(rendition::PREFIX, rendition::PREFIX_URI);
        }

        let text_title = self.order.title(ReferenceType::Text).unwrap_or("Text");
        draft.package.guide.add_reference(ReferenceType::Text, text_title, &first_chapter);
        draft.nav.add_landmark(ReferenceType::Text, &first_chapter, text_title);

        // Chapter rows exclude the references group added below
        let chapters = Self::chapter_rows(&draft.nav);
        if self.references_in_toc {
            draft.nav.finalize_references(&self.order);
        }

        if let Some(toc) = &self.toc {
            let page = self.toc_page(toc, &draft.nav, chapters)?;
            draft.add(&toc.file_name, TOC_ID, page, mime::XHTML)?;
        }

        if self.options.version.is_modern() {
            let location = path::sanitize_zip_path(&self.options.nav_file_name)?;
            let title = self.toc.as_ref().map_or("Table of Contents", |toc| toc.title.as_str());
            let document = write_nav_document(&NavDocument {
                nav: &draft.nav,
                order: &self.order,
                location: &location,
                language: self.page_language(),
                title,
                stylesheet: self.toc.as_ref().and_then(|toc| toc.css_file.as_deref()),
            })?;
            draft.add(&location, NAV_ID, document, mime::XHTML)?;
            if let Some(item) = draft.package.manifest.by_id_mut(NAV_ID) {
                item.add_property(opf::NAV_PROPERTY);
            }
        }

        for overlay in &self.overlays {
            let clips: Vec<SmilClip<'_>> = overlay
                .clips
                .iter()
                .map(|clip| SmilClip {
                    text: &clip.text,
                    audio: &clip.audio,
                    clip_begin: &clip.begin,
                    clip_end: &clip.end,
                })
                .collect();
            let smil = write_smil(&overlay.textref, &clips)?;
            draft.add(&overlay.smil_href, &overlay.smil_id, smil, mime::SMIL)?;
        }

        // The NCX path is reserved, so it bypasses the entry checks
        if !draft
            .package
            .manifest
            .add_item(ManifestItem::new(ncx::NCX_ID, ncx::NCX_FILE, mime::NCX))
        {
            return Err(StateError::DuplicateId(ncx::NCX_ID.to_owned()).into());
        }
        draft.package.check_spine()?;

        let package_document = write_package(&draft.package, &now.format(TIMESTAMP).to_string())?;
        let ncx_document = write_ncx(
            &draft.nav,
            &NcxHead {
                uid: &identifier.0,
                title: &self.details.title,
                author: self.details.author.as_ref().map(|(name, _)| name.as_str()),
                generator: Some(generator.as_str()),
            },
        )?;

        let Draft {
            package,
            nav,
            sources,
            entries,
            ..
        } = draft;
        let entry_count = entries.len();

        start_container(&mut self.container, &self.root)?;
        for (full_path, data, storage) in entries {
            self.container.add(&full_path, &data, storage)?;
        }
        self.container
            .add(&format!("{}{}", self.root, opf::PACKAGE_FILE), &package_document, Storage::Compressed)?;
        self.container
            .add(&format!("{}{}", self.root, ncx::NCX_FILE), &ncx_document, Storage::Compressed)?;
        self.container.seal()?;

        self.package = package;
        self.nav = nav;
        self.sources = sources;
        self.finalized = true;
        tracing::info!(
            title = %self.details.title,
            identifier = %identifier.0,
            generated = entry_count + 2,
            "finalized book"
        );
        Ok(())
    }

    /// Book-level metadata, followed by the custom entries added so far.
    fn package_metadata(
        &self,
        (identifier, scheme): &(String, IdentifierScheme),
        generator: &str,
        now: DateTime<Utc>,
    ) -> Metadata {
        let details = &self.details;
        let legacy = self.options.version.is_legacy();
        let mut metadata = Metadata::default();

        metadata.add_value(MetaValue::new(dc::TITLE, &details.title));
        metadata.add_value(MetaValue::new(dc::LANGUAGE, &details.language));
        metadata.add_value(
            MetaValue::new(dc::IDENTIFIER, identifier)
                .with_attribute(xml::ID, opf::UNIQUE_IDENTIFIER_ID)
                .with_opf_attribute(opf::SCHEME, scheme.as_str()),
        );

        let format = if details.short_date { SHORT_DATE } else { TIMESTAMP };
        let date = details.date.unwrap_or(now).format(format).to_string();
        metadata.add_value(MetaValue::new(dc::DATE, date).with_opf_attribute(opf::EVENT, opf::PUBLICATION));

        add_text(&mut metadata, dc::DESCRIPTION, details.description.as_deref());
        if let Some((name, url)) = &details.publisher {
            add_text(&mut metadata, dc::PUBLISHER, Some(name));
            add_text(&mut metadata, dc::RELATION, Some(url));
        }
        if let Some((name, sort_key)) = &details.author {
            metadata.add_value(
                MetaValue::new(dc::CREATOR, name)
                    .with_opf_attribute(opf::FILE_AS, sort_key)
                    .with_opf_attribute(opf::ROLE, opf::AUTHOR_ROLE),
            );
        }
        add_text(&mut metadata, dc::RIGHTS, details.rights.as_deref());
        add_text(&mut metadata, dc::COVERAGE, details.coverage.as_deref());
        add_text(&mut metadata, dc::SOURCE, details.source_url.as_deref());
        add_text(&mut metadata, dc::RELATION, details.relation.as_deref());
        for subject in &details.subjects {
            add_text(&mut metadata, dc::SUBJECT, Some(subject));
        }

        let accessibility = details
            .accessibility_summary
            .iter()
            .map(|summary| (schema::ACCESSIBILITY_SUMMARY, summary))
            .chain(details.access_modes.iter().map(|mode| (schema::ACCESS_MODE, mode)))
            .chain(details.accessibility_features.iter().map(|feature| (schema::ACCESSIBILITY_FEATURE, feature)))
            .chain(details.accessibility_hazards.iter().map(|hazard| (schema::ACCESSIBILITY_HAZARD, hazard)))
            .chain(details.conforms_to.iter().map(|reference| (dc::CONFORMS_TO, reference)));
        for (property, value) in accessibility {
            // EPUB 2 has no refinement syntax
            if legacy {
                metadata.add_meta(property, value);
            } else {
                metadata.add_property(MetaProperty::new(property, value));
            }
        }

        if !legacy {
            for (property, value) in details.rendition.properties() {
                metadata.add_property(MetaProperty::new(property, value));
            }
        }

        if self.cover {
            metadata.add_meta(opf::COVER, COVER_IMAGE_ID);
        }
        metadata.add_meta(opf::GENERATOR, generator);

        if !self.overlays.is_empty() {
            let total: ClockValue = self.overlays.iter().map(|overlay| overlay.duration).sum();
            metadata.add_property(MetaProperty::new(schema::MEDIA_DURATION, total.to_clock_string()));
        }

        let custom = &self.package.metadata;
        for value in custom.values() {
            metadata.add_value(value.clone());
        }
        for property in custom.properties() {
            metadata.add_property(property.clone());
        }
        for (name, content) in custom.metas() {
            metadata.add_meta(name, content);
        }
        metadata
    }
}

fn add_text(metadata: &mut Metadata, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.trim().is_empty()) {
        metadata.add_value(MetaValue::new(name, value));
    }
}

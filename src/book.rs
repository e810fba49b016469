//! The [`Book`] orchestrator: collects metadata, content and navigation,
//! then finalizes everything into an EPUB container.

mod audio;
mod chapter;
mod finalize;
mod options;
mod pages;
mod rendition;
mod stage;

pub use self::audio::{AudioClip, AudioOverlay, ClockValue};
pub use self::chapter::{BlockSplitter, Chapter, ChapterSplitter};
pub use self::options::{BookOptions, IdentifierScheme, Viewport};
pub use self::pages::{CoverImage, ReferencePage, TocOptions};
pub use self::rendition::{Layout, Orientation, Rendition, Spread};

use self::audio::PendingOverlay;
use self::stage::{Sources, Stage, check_entry};
use crate::consts::mime;
use crate::errors::{BookResult, StateError};
use crate::nav::{NavHandle, Navigation, SubLevel};
use crate::package::{DublinCore, MetaProperty, MetaValue, PackageDocument, ReferenceOrder};
use crate::resolve::html::{HtmlDocument, XhtmlOptions};
use crate::resolve::{ContentResolver, Context, DefaultFetcher, ExternalReferences, ResourceFetcher};
use crate::util::str::StrExt;
use crate::util::{path, str as strings, uri};
use crate::version::EpubVersion;
use crate::writer::zip::Container;
use chrono::{DateTime, Utc};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Book-level values written into the package metadata at finalize.
#[derive(Clone, Debug, Default)]
struct Details {
    title: String,
    language: String,
    identifier: Option<(String, IdentifierScheme)>,
    /// Name and sort key.
    author: Option<(String, String)>,
    /// Name and URL.
    publisher: Option<(String, String)>,
    date: Option<DateTime<Utc>>,
    short_date: bool,
    description: Option<String>,
    rights: Option<String>,
    source_url: Option<String>,
    coverage: Option<String>,
    relation: Option<String>,
    generator: Option<String>,
    subjects: Vec<String>,
    accessibility_summary: Option<String>,
    access_modes: Vec<String>,
    accessibility_features: Vec<String>,
    accessibility_hazards: Vec<String>,
    conforms_to: Option<String>,
    viewport: Option<Viewport>,
    rendition: Rendition,
}

/// An EPUB under construction.
///
/// Content is staged into a scratch container as it is added; the
/// package document and navigation files are written once by
/// [`Book::finalize`], after which the book is read-only.
///
/// # Examples
/// ```no_run
/// # use bindery::{Book, BookOptions, Chapter, EpubVersion};
/// # fn main() -> bindery::errors::BookResult<()> {
/// let mut book = Book::new(BookOptions::default().version(EpubVersion::Epub3));
/// book.set_title("A Short Story")?;
/// book.set_language("en")?;
/// book.set_author("Jane Doe", "Doe, Jane")?;
///
/// book.add_chapter(Chapter::new("Chapter 1", "Text/chapter1.xhtml").content("<p>Once upon a time.</p>"))?;
/// book.save("short-story")?; // Writes `short-story.epub`
/// # Ok(())
/// # }
/// ```
pub struct Book {
    options: BookOptions,
    details: Details,
    package: PackageDocument,
    nav: Navigation,
    root: String,
    container: Container,
    sources: Sources,
    fetcher: Arc<dyn ResourceFetcher>,
    chapter_count: usize,
    /// Root-relative href of the first chapter, the `text` landmark.
    first_chapter: Option<String>,
    order: ReferenceOrder,
    references_in_toc: bool,
    toc: Option<TocOptions>,
    /// The table of contents was placed in the reading order by a chapter.
    toc_navigable: bool,
    cover: bool,
    overlays: Vec<PendingOverlay>,
    finalized: bool,
}

impl Default for Book {
    fn default() -> Self {
        Self::new(BookOptions::default())
    }
}

impl std::fmt::Debug for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Book")
            .field("options", &self.options)
            .field("details", &self.details)
            .field("package", &self.package)
            .field("root", &self.root)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl Book {
    pub fn new(options: BookOptions) -> Self {
        let fetcher: Arc<dyn ResourceFetcher> = match &options.fetcher {
            Some(fetcher) => Arc::clone(fetcher),
            None => Arc::new(DefaultFetcher::new(options.doc_root.clone())),
        };
        let root = path::normalize_root(&options.book_root).unwrap_or_else(|error| {
            tracing::warn!(%error, root = %options.book_root, "invalid book root, using the container root");
            String::new()
        });

        Self {
            details: Details::default(),
            package: PackageDocument::new(options.version, options.direction),
            nav: Navigation::default(),
            root,
            container: Container::new(options.compression, Utc::now()),
            sources: Sources::new(),
            fetcher,
            chapter_count: 0,
            first_chapter: None,
            order: ReferenceOrder::default(),
            references_in_toc: true,
            toc: None,
            toc_navigable: false,
            cover: false,
            overlays: Vec::new(),
            finalized: false,
            options,
        }
    }

    pub fn version(&self) -> EpubVersion {
        self.options.version
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The package document as currently assembled.
    pub fn package(&self) -> &PackageDocument {
        &self.package
    }

    pub fn navigation(&self) -> &Navigation {
        &self.nav
    }

    /// The directory holding the package document, empty or ending with `/`.
    pub fn book_root(&self) -> &str {
        &self.root
    }

    fn ensure_open(&self) -> BookResult<()> {
        if self.finalized {
            return Err(StateError::Finalized.into());
        }
        Ok(())
    }

    /// The language of generated pages.
    fn page_language(&self) -> &str {
        match self.details.language.as_str() {
            "" => &self.options.language,
            language => language,
        }
    }

    fn resolver_and_stage(&mut self) -> (ContentResolver<'_>, Stage<'_>) {
        let resolver = ContentResolver::new(&*self.fetcher, self.options.version);
        let stage = Stage {
            root: &self.root,
            container: &mut self.container,
            manifest: &mut self.package.manifest,
            sources: &mut self.sources,
        };
        (resolver, stage)
    }

    fn stage(&mut self) -> Stage<'_> {
        self.resolver_and_stage().1
    }

    /// Render author content as a content document stored at `href`.
    ///
    /// Returns the document and its anchor ids.
    fn render_content(
        &mut self,
        content: &str,
        href: &str,
        title: &str,
        policy: ExternalReferences,
        base_dir: &str,
    ) -> BookResult<(String, Vec<String>)> {
        let version = self.options.version;

        // Complete EPUB 3 documents are stored as written
        if policy == ExternalReferences::Ignore && version.is_modern() && content.contains_ignore_case("<html") {
            return Ok((content.to_owned(), HtmlDocument::parse(content).ids()));
        }
        let language = self.page_language().to_owned();
        let options = XhtmlOptions {
            version,
            language: &language,
            title,
        };
        let context = Context {
            policy,
            base_dir,
            content_dir: uri::parent(href),
        };
        let (resolver, mut stage) = self.resolver_and_stage();
        resolver.resolve_document(&mut stage, content, context, &options)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Metadata
    ////////////////////////////////////////////////////////////////////////////////

    pub fn set_title(&mut self, title: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.title = title.into();
        Ok(())
    }

    /// Set the two-letter language code of the book (e.g., `en`).
    pub fn set_language(&mut self, language: &str) -> BookResult<()> {
        self.ensure_open()?;
        let language = language.trim();
        if language.len() != 2 || !language.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(StateError::InvalidLanguage(language.to_owned()).into());
        }
        self.details.language = language.to_ascii_lowercase();
        Ok(())
    }

    /// Set the primary identifier. Without one, a `urn:uuid` is generated at finalize.
    pub fn set_identifier(&mut self, identifier: impl Into<String>, scheme: IdentifierScheme) -> BookResult<()> {
        self.ensure_open()?;
        self.details.identifier = Some((identifier.into(), scheme));
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.description = Some(description.into());
        Ok(())
    }

    /// `sort_key` is the name as it is sorted (e.g., `Doe, Jane`).
    pub fn set_author(&mut self, name: impl Into<String>, sort_key: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.author = Some((name.into(), sort_key.into()));
        Ok(())
    }

    pub fn set_publisher(&mut self, name: impl Into<String>, url: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.publisher = Some((name.into(), url.into()));
        Ok(())
    }

    /// The publication date. Defaults to the time of finalizing.
    pub fn set_date(&mut self, date: DateTime<Utc>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.date = Some(date);
        Ok(())
    }

    /// Write the publication date as `CCYY-MM-DD` instead of a full timestamp.
    pub fn set_short_date_format(&mut self, short: bool) -> BookResult<()> {
        self.ensure_open()?;
        self.details.short_date = short;
        Ok(())
    }

    pub fn set_rights(&mut self, rights: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.rights = Some(rights.into());
        Ok(())
    }

    pub fn add_subject(&mut self, subject: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        let subject = subject.into();
        if !subject.trim().is_empty() && !self.details.subjects.contains(&subject) {
            self.details.subjects.push(subject);
        }
        Ok(())
    }

    /// The URL the book content was taken from (`dc:source`).
    pub fn set_source_url(&mut self, url: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.source_url = Some(url.into());
        Ok(())
    }

    pub fn set_coverage(&mut self, coverage: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.coverage = Some(coverage.into());
        Ok(())
    }

    pub fn set_relation(&mut self, relation: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.relation = Some(relation.into());
        Ok(())
    }

    /// Default: `bindery v<version>`
    pub fn set_generator(&mut self, generator: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.generator = Some(generator.into());
        Ok(())
    }

    /// Rendering dimensions declared by generated pages.
    pub fn set_viewport(&mut self, viewport: Viewport) -> BookResult<()> {
        self.ensure_open()?;
        self.details.viewport = Some(viewport);
        Ok(())
    }

    /// Fixed-layout rendition properties, replacing any set before.
    ///
    /// Ignored for EPUB 2 output.
    pub fn set_rendition(&mut self, rendition: Rendition) -> BookResult<()> {
        self.ensure_open()?;
        if self.options.version.is_legacy() {
            tracing::debug!("rendition properties are not written for EPUB 2");
        }
        self.details.rendition = rendition;
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Accessibility
    ////////////////////////////////////////////////////////////////////////////////

    pub fn set_accessibility_summary(&mut self, summary: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.accessibility_summary = Some(summary.into());
        Ok(())
    }

    /// e.g., `textual`, `visual`
    pub fn add_access_mode(&mut self, mode: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        push_unique(&mut self.details.access_modes, mode.into());
        Ok(())
    }

    /// e.g., `tableOfContents`, `alternativeText`
    pub fn add_accessibility_feature(&mut self, feature: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        push_unique(&mut self.details.accessibility_features, feature.into());
        Ok(())
    }

    /// e.g., `none`, `flashing`
    pub fn add_accessibility_hazard(&mut self, hazard: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        push_unique(&mut self.details.accessibility_hazards, hazard.into());
        Ok(())
    }

    /// The accessibility specification the book conforms to (`dcterms:conformsTo`).
    pub fn set_accessibility_conforms_to(&mut self, reference: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.details.conforms_to = Some(reference.into());
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Custom metadata
    ////////////////////////////////////////////////////////////////////////////////

    /// Declare `xmlns:{name}` on the package element.
    pub fn add_custom_namespace(&mut self, name: impl Into<String>, uri: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.package.namespaces.add_namespace(name, uri);
        Ok(())
    }

    /// Declare a metadata vocabulary within the EPUB 3 `prefix` attribute.
    pub fn add_custom_prefix(&mut self, name: impl Into<String>, uri: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.package.namespaces.add_prefix(name, uri);
        Ok(())
    }

    pub fn add_custom_meta_value(&mut self, value: MetaValue) -> BookResult<()> {
        self.ensure_open()?;
        self.package.metadata.add_value(value);
        Ok(())
    }

    pub fn add_custom_meta_property(&mut self, property: MetaProperty) -> BookResult<()> {
        self.ensure_open()?;
        self.package.metadata.add_property(property);
        Ok(())
    }

    /// Add `<meta name="{name}" content="{content}"/>`.
    pub fn add_custom_metadata(&mut self, name: impl Into<String>, content: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.package.metadata.add_meta(name, content);
        Ok(())
    }

    pub fn add_dublin_core_metadata(&mut self, element: DublinCore, value: impl Into<String>) -> BookResult<()> {
        self.ensure_open()?;
        self.package.metadata.add_value(MetaValue::new(element.as_str(), value));
        Ok(())
    }

    /// `role` is a MARC relator code (e.g., `edt`, `ill`).
    pub fn add_contributor(
        &mut self,
        name: impl Into<String>,
        sort_key: impl Into<String>,
        role: impl Into<String>,
    ) -> BookResult<()> {
        self.ensure_open()?;
        let contributor = MetaValue::new(DublinCore::Contributor.as_str(), name)
            .with_opf_attribute("file-as", sort_key)
            .with_opf_attribute("role", role);
        self.package.metadata.add_value(contributor);
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // References
    ////////////////////////////////////////////////////////////////////////////////

    /// Title, `id` and `class` of the navigation level grouping the reference pages.
    pub fn set_references_title(
        &mut self,
        title: impl Into<String>,
        id: Option<String>,
        class: Option<String>,
    ) -> BookResult<()> {
        self.ensure_open()?;
        self.nav.set_references_title(title, id, class);
        Ok(())
    }

    /// List reference pages in the navigation under the references title.
    ///
    /// Default: `true`
    pub fn set_references_added_to_toc(&mut self, added: bool) -> BookResult<()> {
        self.ensure_open()?;
        self.references_in_toc = added;
        Ok(())
    }

    /// The order and default titles of reference pages.
    pub fn set_references_order(&mut self, order: ReferenceOrder) -> BookResult<()> {
        self.ensure_open()?;
        self.order = order;
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Structure
    ////////////////////////////////////////////////////////////////////////////////

    /// Change the directory holding the package document.
    ///
    /// Only possible before the first entry is added.
    /// `""` and `"/"` place everything at the container root.
    pub fn set_book_root(&mut self, root: &str) -> BookResult<()> {
        self.ensure_open()?;
        if self.container.is_started() {
            return Err(StateError::RootLocked.into());
        }
        self.root = path::normalize_root(root)?;
        Ok(())
    }

    /// Descend one navigation level; see [`Navigation::sub_level`].
    pub fn sub_level(&mut self, level: SubLevel) -> BookResult<Option<NavHandle>> {
        self.ensure_open()?;
        Ok(self.nav.sub_level(level))
    }

    /// Ascend one navigation level. Returns `false` at the root.
    pub fn back_level(&mut self) -> BookResult<bool> {
        self.ensure_open()?;
        Ok(self.nav.back_level())
    }

    pub fn root_level(&mut self) -> BookResult<()> {
        self.ensure_open()?;
        self.nav.root_level();
        Ok(())
    }

    pub fn set_current_level(&mut self, level: usize) -> BookResult<()> {
        self.ensure_open()?;
        self.nav.set_current_level(level);
        Ok(())
    }

    pub fn current_level(&self) -> usize {
        self.nav.current_level()
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Chapters
    ////////////////////////////////////////////////////////////////////////////////

    /// Add a chapter, returning its navigation point.
    ///
    /// # Errors
    /// - [`StateError::MissingContent`] for a chapter without content that
    ///   is neither a fragment link nor the table of contents placeholder.
    /// - [`StateError::DuplicateHref`] and [`PathError`](crate::errors::PathError)
    ///   when the chapter path is occupied or unsafe.
    pub fn add_chapter(&mut self, chapter: Chapter) -> BookResult<NavHandle> {
        self.ensure_open()?;

        if !chapter.has_content() {
            return match chapter.path.split_once('#') {
                Some((file, anchor)) => self.add_fragment_link(&chapter.title, file, anchor),
                None => self.add_toc_placeholder(&chapter),
            };
        }

        let href = path::sanitize_zip_path(&chapter.path)?;
        let number = self.chapter_count + 1;
        let parts = match chapter.parts.as_slice() {
            [content] if chapter.auto_split && content.len() > self.options.split_size => {
                self.options.splitter.split(content, self.options.split_size)
            }
            _ => chapter.parts.clone(),
        };

        let entries: Vec<(String, String)> = match parts.len() {
            1 => vec![(href, format!("chapter{number}"))],
            _ => {
                let (stem, extension) = uri::split_extension(&href);
                let name = uri::file_name(stem);
                (1..=parts.len())
                    .map(|k| {
                        let part_href = match extension {
                            Some(extension) => format!("{stem}_{k}.{extension}"),
                            None => format!("{stem}_{k}"),
                        };
                        (part_href, strings::xml_id(&format!("{name}_{k}")))
                    })
                    .collect()
            }
        };

        // Every part is checked before anything is written
        for (index, (part_href, id)) in entries.iter().enumerate() {
            check_entry(&self.root, &self.sources, &self.package.manifest, part_href, id)?;
            if entries[..index].iter().any(|(other, _)| other == part_href) {
                return Err(StateError::DuplicateHref(part_href.clone()).into());
            }
        }

        // Every part is rendered before the first one is staged
        let mut rendered = Vec::with_capacity(parts.len());
        for ((part_href, _), content) in entries.iter().zip(&parts) {
            rendered.push(self.render_content(content, part_href, &chapter.title, chapter.policy, &chapter.base_dir)?);
        }

        for ((part_href, id), (xhtml, ids)) in entries.iter().zip(rendered) {
            self.stage().add(part_href, id, xhtml.as_bytes(), mime::XHTML, &chapter.path)?;

            if let Some(item) = self.package.manifest.by_id_mut(id) {
                item.set_index_points(ids);
            }
            self.package.spine.add_itemref(id.as_str(), true);
        }

        let first_href = entries[0].0.clone();
        self.chapter_count = number;
        self.first_chapter.get_or_insert_with(|| first_href.clone());

        let handle = self.nav.add_nav_point(&chapter.title, Some(first_href));
        self.nav.register_chapter(&chapter.title, handle);
        tracing::debug!(title = %chapter.title, parts = parts.len(), "added chapter");
        Ok(handle)
    }

    /// A navigation point to an anchor within a chapter already added,
    /// following the anchor into split parts.
    fn add_fragment_link(&mut self, title: &str, file: &str, anchor: &str) -> BookResult<NavHandle> {
        let file = path::sanitize_zip_path(file)?;
        let (stem, _) = uri::split_extension(&file);
        let target = self
            .package
            .manifest
            .by_href_prefix(stem)
            .find(|item| item.has_index_point(anchor))
            .map(|item| format!("{}#{anchor}", item.href()))
            .unwrap_or_else(|| format!("{file}#{anchor}"));

        self.chapter_count += 1;
        let handle = self.nav.add_nav_point(title, Some(target));
        self.nav.set_point_id(handle, format!("chapter{}", self.chapter_count));
        self.nav.register_chapter(title, handle);
        Ok(handle)
    }

    /// Place the generated table of contents in the reading order.
    fn add_toc_placeholder(&mut self, chapter: &Chapter) -> BookResult<NavHandle> {
        let file_name = self.toc_file_name().to_owned();
        let matches = path::sanitize_zip_path(&chapter.path).is_ok_and(|href| href == file_name);
        if !matches {
            return Err(StateError::MissingContent(chapter.title.clone()).into());
        }

        self.package.spine.add_itemref(pages::TOC_ID, true);
        let handle = self.nav.add_nav_point(&chapter.title, Some(file_name));
        self.nav.register_chapter(&chapter.title, handle);
        self.toc_navigable = true;
        Ok(handle)
    }

    fn toc_file_name(&self) -> &str {
        self.toc
            .as_ref()
            .map_or(TocOptions::DEFAULT_FILE_NAME, |toc| toc.file_name.as_str())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Files
    ////////////////////////////////////////////////////////////////////////////////

    /// Add a file to the manifest, returning its sanitized path.
    pub fn add_file(&mut self, path: &str, id: &str, data: &[u8], media_type: &str) -> BookResult<String> {
        self.ensure_open()?;
        self.stage().add(path, id, data, media_type, path)
    }

    /// Add a stylesheet with id `css_{id}`, embedding its `url(...)`
    /// references according to `policy`.
    pub fn add_css_file(
        &mut self,
        path: &str,
        id: &str,
        css: &str,
        policy: ExternalReferences,
        base_dir: &str,
    ) -> BookResult<String> {
        self.ensure_open()?;
        let id = format!("css_{id}");
        let href = check_entry(&self.root, &self.sources, &self.package.manifest, path, &id)?;

        let context = Context {
            policy,
            base_dir,
            content_dir: uri::parent(&href),
        };
        let (resolver, mut stage) = self.resolver_and_stage();
        let css = resolver.resolve_css(&mut stage, css, context)?;
        stage.add(&href, &id, css.as_bytes(), mime::CSS, path)
    }

    /// Stream a file from disk into the container.
    pub fn add_large_file(
        &mut self,
        path: &str,
        id: &str,
        disk_path: impl AsRef<Path>,
        media_type: &str,
    ) -> BookResult<String> {
        self.ensure_open()?;
        let disk_path = disk_path.as_ref();
        if !disk_path.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", disk_path.display()),
            )
            .into());
        }
        self.stage().add_file(path, id, disk_path, media_type)
    }

    /// Add an unlisted file below `META-INF/` (e.g., `encryption.xml`).
    pub fn add_file_to_meta_inf(&mut self, name: &str, data: &[u8]) -> BookResult<String> {
        self.ensure_open()?;
        self.stage().add_meta_inf(name, data)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Output
    ////////////////////////////////////////////////////////////////////////////////

    fn reader(&mut self) -> BookResult<impl Read + '_> {
        if !self.finalized {
            self.finalize()?;
        }
        self.container.reader()
    }

    /// The finished EPUB, finalizing the book if needed.
    pub fn to_vec(&mut self) -> BookResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.reader()?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Write the finished EPUB to `writer`, finalizing the book if needed.
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> BookResult<W> {
        std::io::copy(&mut self.reader()?, &mut writer)?;
        writer.flush()?;
        Ok(writer)
    }

    /// Save the finished EPUB, finalizing the book if needed.
    ///
    /// `.epub` is appended when `path` has no extension.
    /// Returns the path written to.
    pub fn save(&mut self, path: impl AsRef<Path>) -> BookResult<PathBuf> {
        const TEMP: &str = "bindery.tmp";

        let mut path = path.as_ref().to_path_buf();
        if path.extension().is_none() {
            path.set_extension("epub");
        }
        let temp = path.with_extension(TEMP);

        let write_result = (|| -> BookResult<()> {
            let file = std::fs::File::create(&temp)?;
            self.write_to(std::io::BufWriter::new(file))?;
            std::fs::rename(&temp, &path)?;
            Ok(())
        })();

        if let Err(error) = write_result {
            // Original error takes precedence
            let _ = std::fs::remove_file(&temp);
            return Err(error);
        }
        tracing::info!(path = %path.display(), "saved book");
        Ok(path)
    }

    /// The size of the finished EPUB in bytes, finalizing the book if needed.
    pub fn size(&mut self) -> BookResult<u64> {
        if !self.finalized {
            self.finalize()?;
        }
        self.container.size()
    }
}

fn push_unique(values: &mut Vec<String>, value: String) {
    if !value.trim().is_empty() && !values.contains(&value) {
        values.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BookError;

    #[test]
    fn test_language_validation() {
        let mut book = Book::default();

        #[rustfmt::skip]
        let expected = [
            (true, "en"),
            (true, " FR "),
            (false, "eng"),
            (false, "e1"),
            (false, ""),
        ];

        for (valid, language) in expected {
            assert_eq!(valid, book.set_language(language).is_ok(), "{language}");
        }
        assert_eq!("fr", book.details.language);
    }

    #[test]
    fn test_root_locked_after_first_entry() {
        let mut book = Book::default();
        book.set_book_root("/").unwrap();
        assert_eq!("", book.book_root());

        book.add_file("Styles/a.css", "a", b"p {}", "text/css").unwrap();
        assert!(matches!(
            book.set_book_root("content"),
            Err(BookError::State(StateError::RootLocked))
        ));
    }

    #[test]
    fn test_split_chapter() {
        let mut book = Book::new(BookOptions::default().split_size(10));
        let content = "<html><head><title>T</title></head><body><p>first paragraph</p><p>second paragraph</p></body></html>";
        book.add_chapter(Chapter::new("Long", "Text/long.xhtml").content(content).auto_split(true))
            .unwrap();

        let manifest = book.package().manifest();
        assert_eq!(Some("Text/long_1.xhtml"), manifest.by_id("long_1").map(|item| item.href()));
        assert_eq!(Some("Text/long_2.xhtml"), manifest.by_id("long_2").map(|item| item.href()));
        assert_eq!(2, book.package().spine().len());

        let (_, point) = book.navigation().chapters().next().unwrap();
        assert_eq!(Some("Text/long_1.xhtml"), point.src());
    }

    #[test]
    fn test_fragment_link_follows_split_parts() {
        let mut book = Book::default();
        book.add_chapter(Chapter::new("Part", "notes.xhtml").parts(["<p id=\"a\">A</p>", "<p id=\"b\">B</p>"]))
            .unwrap();
        let handle = book.add_chapter(Chapter::new("Note B", "notes.xhtml#b")).unwrap();

        let point = book.navigation().point(handle);
        assert_eq!(Some("notes_2.xhtml#b"), point.src());
        assert_eq!(Some("chapter2"), point.id());
    }

    #[test]
    fn test_missing_content() {
        let mut book = Book::default();
        assert!(matches!(
            book.add_chapter(Chapter::new("Empty", "empty.xhtml")),
            Err(BookError::State(StateError::MissingContent(_)))
        ));

        book.add_chapter(Chapter::new("Contents", "TOC.xhtml")).unwrap();
        assert!(book.package().spine().contains("ref_toc"));
    }
}

use crate::book::Book;
use crate::book::stage::check_entry;
use crate::consts::mime;
use crate::errors::{BookResult, StateError};
use crate::nav::Navigation;
use crate::package::ReferenceType;
use crate::resolve::ExternalReferences;
use crate::util::{path, str as strings, uri};
use crate::writer::{Page, PageBody, TocRow, toc_style, write_page};

/// Manifest id of the generated table of contents page.
pub(crate) const TOC_ID: &str = "ref_toc";
pub(crate) const COVER_IMAGE_ID: &str = "CoverImage";
const COVER_PAGE: &str = "CoverPage.xhtml";
const COVER_CSS: &str = "Styles/CoverPage.css";
const COVER_CSS_ID: &str = "css_CoverPageCss";
const COVER_STYLE: &str = "@page { margin: 0; padding: 0; }\n\
body { margin: 0; padding: 0; text-align: center; }\n\
#cover-image { height: 100%; }\n\
#cover-image img { max-width: 100%; max-height: 100%; }\n";

/// The cover image of a book.
///
/// # Examples
/// ```
/// # use bindery::CoverImage;
/// let cover = CoverImage::new("cover.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0]).alt("A lighthouse at dusk");
/// ```
#[derive(Clone, Debug)]
pub struct CoverImage {
    pub(crate) file_name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) media_type: Option<String>,
    pub(crate) alt: String,
}

impl CoverImage {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
            media_type: None,
            alt: "Cover Image".to_owned(),
        }
    }

    /// Default: sniffed from the image data, then derived from the file name
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Default: `Cover Image`
    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    fn resolve_media_type(&self) -> String {
        self.media_type
            .as_deref()
            .or_else(|| mime::sniff_image(&self.data))
            .or_else(|| mime::from_path(&self.file_name))
            .unwrap_or(mime::OCTET_STREAM)
            .to_owned()
    }
}

/// A structural page such as a title page, a dedication or a glossary.
#[derive(Clone, Debug)]
pub struct ReferencePage {
    pub(crate) kind: ReferenceType,
    pub(crate) title: String,
    pub(crate) path: String,
    pub(crate) content: String,
    pub(crate) policy: ExternalReferences,
    pub(crate) base_dir: String,
}

impl ReferencePage {
    pub fn new(
        kind: ReferenceType,
        title: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            path: path.into(),
            content: content.into(),
            policy: ExternalReferences::default(),
            base_dir: String::new(),
        }
    }

    /// Default: [`ExternalReferences::Ignore`]
    pub fn external_references(mut self, policy: ExternalReferences) -> Self {
        self.policy = policy;
        self
    }

    pub fn base_dir(mut self, base_dir: impl Into<String>) -> Self {
        self.base_dir = base_dir.into();
        self
    }
}

/// Options of the generated table of contents page; see [`Book::build_toc`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocOptions {
    pub(crate) css_file: Option<String>,
    pub(crate) class: String,
    pub(crate) title: String,
    pub(crate) add_references: bool,
    pub(crate) add_to_index: bool,
    pub(crate) file_name: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            css_file: None,
            class: "toc".to_owned(),
            title: "Table of Contents".to_owned(),
            add_references: true,
            add_to_index: false,
            file_name: Self::DEFAULT_FILE_NAME.to_owned(),
        }
    }
}

impl TocOptions {
    pub(crate) const DEFAULT_FILE_NAME: &'static str = "TOC.xhtml";

    /// A stylesheet already added to the book, linked from the page.
    pub fn css_file(mut self, path: impl Into<String>) -> Self {
        self.css_file = Some(path.into());
        self
    }

    /// Default: `toc`
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Default: `Table of Contents`
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// List reference pages alongside the chapters.
    ///
    /// Default: `true`
    pub fn add_references(mut self, add: bool) -> Self {
        self.add_references = add;
        self
    }

    /// Add the page itself to the navigation instead of the landmarks.
    ///
    /// Default: `false`
    pub fn add_to_index(mut self, add: bool) -> Self {
        self.add_to_index = add;
        self
    }

    /// Default: `TOC.xhtml`
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl Book {
    /// Set the cover image, generating its cover page.
    ///
    /// The cover page is placed in the reading order when called, so set
    /// the cover before adding chapters.
    pub fn set_cover_image(&mut self, cover: CoverImage) -> BookResult<()> {
        self.ensure_open()?;
        if self.cover {
            return Err(StateError::CoverAlreadySet.into());
        }

        let mut name = strings::sanitize_file_name(uri::file_name(&cover.file_name.replace('\\', "/")));
        let media_type = cover.resolve_media_type();
        if name.is_empty() {
            name = format!("cover.{}", mime::image_extension(&media_type).unwrap_or("img"));
        }
        let image_href = format!("images/{name}");
        let entries = [(image_href.as_str(), COVER_IMAGE_ID), (COVER_CSS, COVER_CSS_ID), (COVER_PAGE, "ref_cover")];
        for (href, id) in entries {
            check_entry(&self.root, &self.sources, &self.package.manifest, href, id)?;
        }

        let language = self.page_language().to_owned();
        let title = self
            .order
            .title(ReferenceType::Cover)
            .unwrap_or("Cover Page")
            .to_owned();
        let viewport = self.details.viewport.map(|viewport| viewport.content());
        let page = write_page(&Page {
            version: self.options.version,
            location: COVER_PAGE,
            language: &language,
            title: &title,
            stylesheets: &[COVER_CSS],
            style: None,
            viewport: viewport.as_deref(),
            body: PageBody::Cover {
                image: &image_href,
                alt: &cover.alt,
            },
        })?;

        let mut stage = self.stage();
        stage.add(&image_href, COVER_IMAGE_ID, &cover.data, &media_type, &cover.file_name)?;
        stage.add(COVER_CSS, COVER_CSS_ID, COVER_STYLE.as_bytes(), mime::CSS, COVER_CSS)?;
        stage.add(COVER_PAGE, "ref_cover", &page, mime::XHTML, COVER_PAGE)?;

        if self.options.version.is_modern()
            && let Some(item) = self.package.manifest.by_id_mut(COVER_IMAGE_ID)
        {
            item.add_property(crate::consts::opf::COVER_IMAGE);
        }
        self.package.spine.add_itemref("ref_cover", true);
        self.package.guide.add_reference(ReferenceType::Cover, &title, COVER_PAGE);
        self.nav.add_landmark(ReferenceType::Cover, COVER_PAGE, &title);
        self.cover = true;
        Ok(())
    }

    /// Add a reference page, listing it in the guide and landmarks.
    ///
    /// # Errors
    /// [`StateError::TocAlreadySet`] for a table of contents page when
    /// one was already added or requested through [`Book::build_toc`].
    pub fn add_reference_page(&mut self, page: ReferencePage) -> BookResult<String> {
        self.ensure_open()?;
        if page.content.trim().is_empty() {
            return Err(StateError::MissingContent(page.title).into());
        }
        if page.kind == ReferenceType::Toc && self.has_toc() {
            return Err(StateError::TocAlreadySet.into());
        }

        let id = format!("ref_{}", page.kind.id_suffix());
        let href = check_entry(&self.root, &self.sources, &self.package.manifest, &page.path, &id)?;
        let (xhtml, _) = self.render_content(&page.content, &href, &page.title, page.policy, &page.base_dir)?;
        let href = self.stage().add(&href, &id, xhtml.as_bytes(), mime::XHTML, &page.path)?;

        self.package.spine.add_itemref(id.as_str(), true);
        self.package.guide.add_reference(page.kind, &page.title, &href);
        self.nav.add_landmark(page.kind, &href, &page.title);
        Ok(href)
    }

    /// A table of contents page was added or requested.
    fn has_toc(&self) -> bool {
        self.toc.is_some() || self.package.manifest.by_id(TOC_ID).is_some()
    }

    /// Request a generated table of contents page, written at finalize.
    ///
    /// Only the first request takes effect.
    ///
    /// # Errors
    /// [`StateError::TocAlreadySet`] when a table of contents page was
    /// added through [`Book::add_reference_page`].
    pub fn build_toc(&mut self, options: TocOptions) -> BookResult<()> {
        self.ensure_open()?;
        if self.toc.is_some() {
            tracing::warn!("a table of contents was already requested");
            return Ok(());
        }
        if self.has_toc() {
            return Err(StateError::TocAlreadySet.into());
        }

        let mut options = options;
        options.file_name = path::sanitize_zip_path(&options.file_name)?;
        if let Some(css_file) = &options.css_file {
            options.css_file = Some(path::sanitize_zip_path(css_file)?);
        }

        self.package
            .guide
            .add_reference(ReferenceType::Toc, &options.title, &options.file_name);
        if !self.toc_navigable {
            self.package.spine.add_itemref(TOC_ID, false);
        }
        if options.add_to_index {
            let handle = self.nav.add_nav_point(&options.title, Some(options.file_name.clone()));
            self.nav.register_chapter(&options.title, handle);
        } else {
            self.nav
                .add_landmark(ReferenceType::Toc, &options.file_name, &options.title);
        }
        self.toc = Some(options);
        Ok(())
    }

    /// Rows for every navigation point, at their depth.
    pub(crate) fn chapter_rows(nav: &Navigation) -> Vec<TocRow> {
        nav.walk()
            .into_iter()
            .map(|(_, point)| TocRow {
                level: point.depth(),
                reference: false,
                label: point.label().to_owned(),
                href: point.src().map(str::to_owned),
            })
            .collect()
    }

    /// The generated table of contents page. Chapters fill the `text`
    /// slot of the reference order, or follow the references without one.
    pub(crate) fn toc_page(&self, toc: &TocOptions, nav: &Navigation, chapters: Vec<TocRow>) -> BookResult<Vec<u8>> {
        let mut rows = Vec::new();
        let mut chapters = Some(chapters);

        for (kind, default_title) in self.order.iter() {
            if kind == ReferenceType::Text {
                rows.extend(chapters.take().unwrap_or_default());
                continue;
            }
            if !toc.add_references || kind == ReferenceType::Toc {
                continue;
            }
            if let Some(landmark) = nav.landmark(kind) {
                let label = match landmark.title() {
                    "" => default_title,
                    title => title,
                };
                rows.push(TocRow {
                    level: 1,
                    reference: true,
                    label: label.to_owned(),
                    href: Some(landmark.href().to_owned()),
                });
            }
        }
        rows.extend(chapters.unwrap_or_default());

        let depth = rows.iter().map(|row| row.level).max().unwrap_or(1);
        let style = toc_style(&toc.class, depth);
        let stylesheets: Vec<&str> = toc.css_file.as_deref().into_iter().collect();
        let viewport = self.details.viewport.map(|viewport| viewport.content());

        write_page(&Page {
            version: self.options.version,
            location: &toc.file_name,
            language: self.page_language(),
            title: &toc.title,
            stylesheets: &stylesheets,
            style: Some(&style),
            viewport: viewport.as_deref(),
            body: PageBody::Toc {
                class: &toc.class,
                heading: &toc.title,
                rows: &rows,
            },
        })
    }
}

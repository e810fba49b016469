//! Resolution of the external references found in content documents and
//! stylesheets: stylesheets, images, media sources and CSS `url(...)`.

mod css;
mod fetch;
pub(crate) mod html;

pub use self::fetch::{DefaultFetcher, FetchError, FetchResult, Fetched, FileSystemFetcher, ResourceFetcher};
#[cfg(feature = "remote")]
pub use self::fetch::HttpFetcher;

use self::css::UrlRewrite;
use self::html::{Edits, HtmlDocument, Replacement, XhtmlOptions};
use crate::consts::{mime, xhtml};
use crate::errors::BookResult;
use crate::util::{path, str as strings, uri};
use crate::version::EpubVersion;
use std::path::Path;

/// How external references within content are handled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExternalReferences {
    /// Leave every reference untouched.
    #[default]
    Ignore,
    /// Copy referenced files into the package and rewrite the references.
    Embed,
    /// Remove images, media sources and CSS `url(...)` references.
    /// Linked stylesheets are still embedded.
    RemoveMedia,
    /// Replace images with `<em>[alt]</em>` and media sources with `[alt]`;
    /// CSS `url(...)` references are removed.
    /// Linked stylesheets are still embedded.
    ReplaceMedia,
}

/// Receives the resources a [`ContentResolver`] embeds.
///
/// Paths are relative to the book root and already sanitized.
pub(crate) trait EmbedTarget {
    /// Whether an entry occupies `path` already.
    fn contains(&self, path: &str) -> bool;

    /// Store `data` at `path`, returning the manifest id used.
    fn embed(&mut self, path: &str, id: &str, data: &[u8], media_type: &str) -> BookResult<String>;

    /// Stream the file at `source` to `path`, returning the manifest id used.
    fn embed_file(&mut self, path: &str, id: &str, source: &Path, media_type: &str) -> BookResult<String>;
}

/// Outcome of embedding one reference.
enum Resolution {
    /// The root-relative path of the embedded entry.
    Embedded(String),
    Failed { remote: bool },
}

/// Where a reference appears.
#[derive(Copy, Clone)]
pub(crate) struct Context<'a> {
    pub(crate) policy: ExternalReferences,
    /// Directory local references are read relative to.
    pub(crate) base_dir: &'a str,
    /// Root-relative directory of the document holding the references.
    pub(crate) content_dir: &'a str,
}

/// Resource bucket of embedded files.
#[derive(Copy, Clone)]
enum Bucket {
    Images,
    Media,
}

impl Bucket {
    fn dir(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Media => "media",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            Self::Images => "i_",
            Self::Media => "m_",
        }
    }
}

pub(crate) struct ContentResolver<'a> {
    fetcher: &'a dyn ResourceFetcher,
    version: EpubVersion,
}

impl<'a> ContentResolver<'a> {
    pub(crate) fn new(fetcher: &'a dyn ResourceFetcher, version: EpubVersion) -> Self {
        Self { fetcher, version }
    }

    /// Rewrite a content document as XHTML, embedding its references
    /// according to `context.policy`.
    ///
    /// Returns the document and its `id` values (index points).
    pub(crate) fn resolve_document(
        &self,
        target: &mut dyn EmbedTarget,
        content: &str,
        context: Context<'_>,
        options: &XhtmlOptions<'_>,
    ) -> BookResult<(String, Vec<String>)> {
        let document = HtmlDocument::parse(content);
        let mut edits = Edits::default();

        if context.policy != ExternalReferences::Ignore {
            self.resolve_styles(target, &document, &mut edits, context)?;
            self.resolve_links(target, &document, &mut edits, context)?;
            self.resolve_images(target, &document, &mut edits, context)?;
        }
        self.resolve_sources(target, &document, &mut edits, context)?;

        let xhtml = html::serialize(&document, &edits, options)?;
        Ok((xhtml, document.ids()))
    }

    /// Rewrite the `url(...)` references of a stylesheet located in `context.content_dir`.
    pub(crate) fn resolve_css(
        &self,
        target: &mut dyn EmbedTarget,
        css: &str,
        context: Context<'_>,
    ) -> BookResult<String> {
        let back_path = uri::back_path(context.content_dir);
        let mut error = None;

        let rewritten = css::rewrite_urls(css, |href| {
            if uri::is_inline(href) || error.is_some() {
                return UrlRewrite::Keep;
            }
            match context.policy {
                ExternalReferences::Ignore => UrlRewrite::Keep,
                ExternalReferences::RemoveMedia | ExternalReferences::ReplaceMedia => {
                    UrlRewrite::Remove
                }
                ExternalReferences::Embed => {
                    match self.resolve_resource(target, href, context, Bucket::Images) {
                        Ok(Resolution::Embedded(path)) => UrlRewrite::Replace(format!("{back_path}{path}")),
                        Ok(Resolution::Failed { remote: true }) => UrlRewrite::Remove,
                        Ok(Resolution::Failed { remote: false }) => UrlRewrite::Keep,
                        Err(e) => {
                            error = Some(e);
                            UrlRewrite::Keep
                        }
                    }
                }
            }
        });

        match error {
            Some(error) => Err(error),
            None => Ok(rewritten),
        }
    }

    fn resolve_styles(
        &self,
        target: &mut dyn EmbedTarget,
        document: &HtmlDocument,
        edits: &mut Edits,
        context: Context<'_>,
    ) -> BookResult<()> {
        for (id, _) in document.elements(xhtml::STYLE) {
            let css = css::strip_cdata(&document.text_of(id));
            let resolved = self.resolve_css(target, &css, context)?;
            edits.set_text(id, resolved);
        }
        Ok(())
    }

    fn resolve_links(
        &self,
        target: &mut dyn EmbedTarget,
        document: &HtmlDocument,
        edits: &mut Edits,
        context: Context<'_>,
    ) -> BookResult<()> {
        let back_path = uri::back_path(context.content_dir);

        for (id, element) in document.elements(xhtml::LINK) {
            let Some(href) = element.attr(xhtml::HREF).map(str::trim) else {
                continue;
            };
            if uri::is_inline(href) {
                continue;
            }
            let is_css = element
                .attr(xhtml::TYPE)
                .is_some_and(|kind| kind.eq_ignore_ascii_case(mime::CSS))
                || element
                    .attr(xhtml::REL)
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case(xhtml::STYLESHEET)));
            let media_type = match element.attr(xhtml::TYPE) {
                Some(kind) => kind.to_owned(),
                None if is_css => mime::CSS.to_owned(),
                None => mime::from_path(uri::strip_query(href)).unwrap_or(mime::TEXT).to_owned(),
            };

            match self.resolve_link(target, href, &media_type, is_css, context)? {
                Resolution::Embedded(path) => {
                    edits.set_attribute(id, xhtml::HREF, format!("{back_path}{path}"))
                }
                Resolution::Failed { remote: true } => edits.remove(id),
                Resolution::Failed { remote: false } => {}
            }
        }
        Ok(())
    }

    fn resolve_link(
        &self,
        target: &mut dyn EmbedTarget,
        href: &str,
        media_type: &str,
        is_css: bool,
        context: Context<'_>,
    ) -> BookResult<Resolution> {
        let remote = uri::is_remote(href);
        let (location, internal) = if remote {
            let url_path = uri::split_url(href).map(|(_, _, path)| path).unwrap_or_default();
            let base = format!("{}/", context.base_dir.trim_matches('/'));
            let name = match url_path.find(base.as_str()) {
                Some(index) if base.len() > 1 => &url_path[index + base.len()..],
                _ => uri::file_name(url_path),
            };
            (href.to_owned(), uri::decode(name).into_owned())
        } else {
            let relative = uri::decode(uri::strip_query(href)).into_owned();
            (join(context.base_dir, href), uri::normalize(&relative))
        };

        let internal = match path::sanitize_zip_path(&internal) {
            Ok(internal) => internal,
            // Traversal outside the root keeps only the file name
            Err(_) => match path::sanitize_zip_path(&strings::sanitize_file_name(uri::file_name(&internal))) {
                Ok(internal) => internal,
                Err(_) => return Ok(Resolution::Failed { remote }),
            },
        };
        if target.contains(&internal) {
            return Ok(Resolution::Embedded(internal));
        }

        let fetched = match self.fetcher.fetch(&location) {
            Ok(fetched) => fetched,
            Err(error) => {
                log_fetch_failure(&location, remote, &error);
                return Ok(Resolution::Failed { remote });
            }
        };
        let name = uri::file_name(&internal).to_owned();

        if is_css {
            let css = String::from_utf8_lossy(&fetched.data).into_owned();
            let css_context = Context {
                policy: context.policy,
                base_dir: if remote { "" } else { uri::parent(&location) },
                content_dir: uri::parent(&internal),
            };
            let css = match (remote, context.policy) {
                // Relative references of remote stylesheets cannot be read locally
                (true, _) => css,
                _ => self.resolve_css(target, &css, css_context)?,
            };
            target.embed(&internal, &strings::xml_id(&format!("css_{name}")), css.as_bytes(), mime::CSS)?;
        } else {
            target.embed(&internal, &strings::xml_id(&name), &fetched.data, media_type)?;
        }
        Ok(Resolution::Embedded(internal))
    }

    fn resolve_images(
        &self,
        target: &mut dyn EmbedTarget,
        document: &HtmlDocument,
        edits: &mut Edits,
        context: Context<'_>,
    ) -> BookResult<()> {
        let back_path = uri::back_path(context.content_dir);

        for (id, element) in document.elements(xhtml::IMG) {
            match context.policy {
                ExternalReferences::Ignore => {}
                ExternalReferences::RemoveMedia => edits.remove(id),
                ExternalReferences::ReplaceMedia => {
                    edits.replace(id, Replacement::Emphasis(placeholder(element.attr(xhtml::ALT))))
                }
                ExternalReferences::Embed => {
                    let Some(src) = element.attr(xhtml::SRC).map(str::trim) else {
                        continue;
                    };
                    if uri::is_inline(src) {
                        continue;
                    }
                    match self.resolve_resource(target, src, context, Bucket::Images)? {
                        Resolution::Embedded(path) => {
                            edits.set_attribute(id, xhtml::SRC, format!("{back_path}{path}"))
                        }
                        Resolution::Failed { remote: true } => edits.remove(id),
                        Resolution::Failed { remote: false } => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_sources(
        &self,
        target: &mut dyn EmbedTarget,
        document: &HtmlDocument,
        edits: &mut Edits,
        context: Context<'_>,
    ) -> BookResult<()> {
        let back_path = uri::back_path(context.content_dir);

        for (id, element) in document.elements(xhtml::SOURCE) {
            // `<source>` has no EPUB 2 counterpart
            if self.version.is_legacy() {
                edits.remove(id);
                continue;
            }
            match context.policy {
                ExternalReferences::Ignore => {}
                ExternalReferences::RemoveMedia => edits.remove(id),
                ExternalReferences::ReplaceMedia => {
                    edits.replace(id, Replacement::Text(placeholder(element.attr(xhtml::ALT))))
                }
                ExternalReferences::Embed => {
                    let Some(src) = element.attr(xhtml::SRC).map(str::trim) else {
                        continue;
                    };
                    if uri::is_inline(src) {
                        continue;
                    }
                    match self.resolve_resource(target, src, context, Bucket::Media)? {
                        Resolution::Embedded(path) => {
                            edits.set_attribute(id, xhtml::SRC, format!("{back_path}{path}"))
                        }
                        Resolution::Failed { remote: true } => edits.remove(id),
                        Resolution::Failed { remote: false } => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Embed an image or media file below its bucket directory, keyed by
    /// where it originates from.
    fn resolve_resource(
        &self,
        target: &mut dyn EmbedTarget,
        src: &str,
        context: Context<'_>,
        bucket: Bucket,
    ) -> BookResult<Resolution> {
        let remote = uri::is_remote(src);
        let (location, origin_dir, file_name) = if remote {
            let Some((scheme, host, url_path)) = uri::split_url(src) else {
                return Ok(Resolution::Failed { remote });
            };
            let origin = format!("{scheme}/{host}/{}", uri::parent(url_path).trim_matches('/'));
            (src.to_owned(), origin, uri::file_name(url_path).to_owned())
        } else {
            let relative = uri::decode(uri::strip_query(src)).into_owned();
            let (location, origin) = if relative.starts_with('/') {
                (relative.clone(), uri::parent(&relative).to_owned())
            } else {
                let origin = uri::normalize(&format!("{}/{}", context.content_dir, uri::parent(&relative)));
                (join(context.base_dir, &relative), origin)
            };
            (location, origin, uri::file_name(&relative).to_owned())
        };

        let mut name = strings::sanitize_file_name(&uri::decode(&file_name));
        if name.is_empty() {
            name = bucket.dir().trim_end_matches('s').to_owned();
        }
        let internal_path = |name: &str| {
            let origin = origin_dir.trim_matches(['/', '.']);
            path::sanitize_zip_path(&uri::normalize(&format!("{}/{origin}/{name}", bucket.dir())))
        };

        let Ok(mut internal) = internal_path(&name) else {
            return Ok(Resolution::Failed { remote });
        };
        if target.contains(&internal) {
            return Ok(Resolution::Embedded(internal));
        }

        // Large local media is streamed from disk
        if let Bucket::Media = bucket
            && let Some(disk_path) = self.fetcher.locate(&location)
        {
            let media_type = mime::from_path(&name).unwrap_or(mime::OCTET_STREAM);
            let id = strings::xml_id(&format!("{}{name}", bucket.id_prefix()));
            target.embed_file(&internal, &id, &disk_path, media_type)?;
            return Ok(Resolution::Embedded(internal));
        }

        let fetched = match self.fetcher.fetch(&location) {
            Ok(fetched) => fetched,
            Err(error) => {
                log_fetch_failure(&location, remote, &error);
                return Ok(Resolution::Failed { remote });
            }
        };
        let media_type = fetched.resolve_media_type(&name);

        // Correct the extension of mislabeled images
        if let Some(extension) = mime::image_extension(&media_type) {
            let (stem, current) = uri::split_extension(&name);
            let matches = current.is_some_and(|current| {
                current.eq_ignore_ascii_case(extension)
                    || mime::from_path(&name) == Some(media_type.as_str())
            });
            if !matches {
                name = format!("{stem}.{extension}");
                let Ok(corrected) = internal_path(&name) else {
                    return Ok(Resolution::Failed { remote });
                };
                internal = corrected;
                if target.contains(&internal) {
                    return Ok(Resolution::Embedded(internal));
                }
            }
        }

        let id = strings::xml_id(&format!("{}{name}", bucket.id_prefix()));
        target.embed(&internal, &id, &fetched.data, &media_type)?;
        tracing::debug!(%location, path = %internal, "embedded referenced resource");
        Ok(Resolution::Embedded(internal))
    }
}

fn placeholder(alt: Option<&str>) -> String {
    let alt = alt.map(str::trim).filter(|alt| !alt.is_empty()).unwrap_or("image");
    format!("[{alt}]")
}

fn join(base_dir: &str, relative: &str) -> String {
    if base_dir.is_empty() {
        relative.to_owned()
    } else {
        format!("{}/{relative}", base_dir.trim_end_matches('/'))
    }
}

fn log_fetch_failure(location: &str, remote: bool, error: &FetchError) {
    if remote {
        tracing::warn!(%location, %error, "dropping unreachable remote reference");
    } else {
        tracing::debug!(%location, %error, "keeping unresolved local reference");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Target {
        entries: Vec<(String, String, String)>,
    }

    impl EmbedTarget for Target {
        fn contains(&self, path: &str) -> bool {
            self.entries.iter().any(|(existing, _, _)| existing == path)
        }

        fn embed(&mut self, path: &str, id: &str, _: &[u8], media_type: &str) -> BookResult<String> {
            self.entries.push((path.to_owned(), id.to_owned(), media_type.to_owned()));
            Ok(id.to_owned())
        }

        fn embed_file(&mut self, path: &str, id: &str, _: &Path, media_type: &str) -> BookResult<String> {
            self.entries.push((path.to_owned(), id.to_owned(), media_type.to_owned()));
            Ok(id.to_owned())
        }
    }

    struct Memory(HashMap<&'static str, &'static [u8]>);

    impl ResourceFetcher for Memory {
        fn fetch(&self, location: &str) -> FetchResult<Fetched> {
            self.0
                .get(location)
                .map(|data| Fetched::new(data.to_vec(), None))
                .ok_or_else(|| FetchError::NotFound(location.to_owned()))
        }
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

    fn context(policy: ExternalReferences) -> Context<'static> {
        Context {
            policy,
            base_dir: "src",
            content_dir: "text",
        }
    }

    #[test]
    fn test_css_urls() {
        let fetcher = Memory(HashMap::from([("src/img/bg.png", PNG)]));
        let resolver = ContentResolver::new(&fetcher, EpubVersion::Epub3);
        let mut target = Target::default();

        let css = "a { background: url(img/bg.png) } b { background: url('img/missing.png') }";
        let resolved = resolver
            .resolve_css(&mut target, css, context(ExternalReferences::Embed))
            .unwrap();

        assert_eq!(
            "a { background: url('../images/text/img/bg.png') } b { background: url('img/missing.png') }",
            resolved
        );
        assert_eq!(
            vec![("images/text/img/bg.png".to_owned(), "i_bg.png".to_owned(), "image/png".to_owned())],
            target.entries
        );
    }

    #[test]
    fn test_extension_is_corrected() {
        let fetcher = Memory(HashMap::from([("src/photo.gif", PNG)]));
        let resolver = ContentResolver::new(&fetcher, EpubVersion::Epub3);
        let mut target = Target::default();

        let resolution = resolver
            .resolve_resource(&mut target, "photo.gif", context(ExternalReferences::Embed), Bucket::Images)
            .unwrap();

        assert!(matches!(resolution, Resolution::Embedded(path) if path == "images/text/photo.png"));
    }

    #[test]
    fn test_placeholders() {
        let fetcher = Memory(HashMap::new());
        let resolver = ContentResolver::new(&fetcher, EpubVersion::Epub3);
        let mut target = Target::default();
        let options = XhtmlOptions {
            version: EpubVersion::Epub3,
            language: "en",
            title: "T",
        };

        let content = r#"<p><img src="a.png" alt="A cat"><img src="b.png"></p><video><source src="v.mp4" alt="clip"></video>"#;
        let (xhtml, _) = resolver
            .resolve_document(&mut target, content, context(ExternalReferences::ReplaceMedia), &options)
            .unwrap();

        assert!(xhtml.contains("<em>[A cat]</em><em>[image]</em>"));
        assert!(xhtml.contains("<video>[clip]</video>"));
        assert!(target.entries.is_empty());
    }

    #[test]
    fn test_legacy_drops_sources() {
        let fetcher = Memory(HashMap::new());
        let resolver = ContentResolver::new(&fetcher, EpubVersion::Epub2);
        let mut target = Target::default();
        let options = XhtmlOptions {
            version: EpubVersion::Epub2,
            language: "en",
            title: "T",
        };

        let (xhtml, _) = resolver
            .resolve_document(
                &mut target,
                r#"<audio><source src="a.mp3"></audio>"#,
                context(ExternalReferences::Ignore),
                &options,
            )
            .unwrap();

        assert!(!xhtml.contains("source"));
    }
}

use crate::book::chapter::{BlockSplitter, ChapterSplitter};
use crate::resolve::ResourceFetcher;
use crate::version::{EpubVersion, TextDirection};
use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Options applied when a [`Book`](crate::Book) is created.
///
/// # Examples
/// ```
/// # use bindery::{BookOptions, EpubVersion};
/// let options = BookOptions::default()
///     .version(EpubVersion::Epub2)
///     .book_root("content/")
///     .compression(9)
///     .doc_root("/srv/books/assets");
/// ```
#[derive(Clone)]
pub struct BookOptions {
    pub(crate) version: EpubVersion,
    pub(crate) book_root: String,
    pub(crate) split_size: usize,
    pub(crate) compression: u8,
    pub(crate) doc_root: Option<PathBuf>,
    pub(crate) nav_file_name: String,
    pub(crate) direction: TextDirection,
    pub(crate) language: String,
    pub(crate) fetcher: Option<Arc<dyn ResourceFetcher>>,
    pub(crate) splitter: Arc<dyn ChapterSplitter>,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            version: EpubVersion::default(),
            book_root: "OEBPS/".to_owned(),
            split_size: 250_000,
            compression: 6,
            doc_root: None,
            nav_file_name: "epub3toc.xhtml".to_owned(),
            direction: TextDirection::default(),
            language: "en".to_owned(),
            fetcher: None,
            splitter: Arc::new(BlockSplitter),
        }
    }
}

impl Debug for BookOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookOptions")
            .field("version", &self.version)
            .field("book_root", &self.book_root)
            .field("split_size", &self.split_size)
            .field("compression", &self.compression)
            .field("doc_root", &self.doc_root)
            .field("nav_file_name", &self.nav_file_name)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl BookOptions {
    /// The EPUB version to produce.
    ///
    /// Default: [`EpubVersion::Epub3`]
    pub fn version(mut self, version: EpubVersion) -> Self {
        self.version = version;
        self
    }

    /// The directory holding the package document and content.
    /// `""` and `"/"` place everything at the container root.
    ///
    /// Default: `OEBPS/`
    pub fn book_root(mut self, root: impl Into<String>) -> Self {
        self.book_root = root.into();
        self
    }

    /// Content longer than this many bytes is split into parts when a
    /// chapter requests [auto-splitting](crate::Chapter::auto_split).
    ///
    /// Default: `250000`
    pub fn split_size(mut self, split_size: usize) -> Self {
        self.split_size = split_size.max(1);
        self
    }

    /// Deflate level from `0` (stored) to `9`.
    ///
    /// Default: `6`
    pub fn compression(mut self, level: u8) -> Self {
        self.compression = level.min(9);
        self
    }

    /// Directory that local references are also looked up in.
    pub fn doc_root(mut self, doc_root: impl Into<PathBuf>) -> Self {
        self.doc_root = Some(doc_root.into());
        self
    }

    /// File name of the EPUB 3 navigation document.
    ///
    /// Default: `epub3toc.xhtml`
    pub fn nav_file_name(mut self, name: impl Into<String>) -> Self {
        self.nav_file_name = name.into();
        self
    }

    /// Default: [`TextDirection::Ltr`]
    pub fn direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Language of generated pages until [`Book::set_language`](crate::Book::set_language) is called.
    ///
    /// Default: `en`
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Retrieves referenced resources.
    /// Without one, a [`DefaultFetcher`](crate::resolve::DefaultFetcher)
    /// rooted at [`Self::doc_root`] is used.
    pub fn fetcher(mut self, fetcher: impl ResourceFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Splits oversized chapters.
    ///
    /// Default: [`BlockSplitter`]
    pub fn splitter(mut self, splitter: impl ChapterSplitter + 'static) -> Self {
        self.splitter = Arc::new(splitter);
        self
    }
}

/// The scheme of the primary identifier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum IdentifierScheme {
    Uri,
    Isbn,
    #[default]
    Uuid,
}

impl IdentifierScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uri => "URI",
            Self::Isbn => "ISBN",
            Self::Uuid => "UUID",
        }
    }
}

impl FromStr for IdentifierScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uri" | "url" => Ok(Self::Uri),
            "isbn" => Ok(Self::Isbn),
            "uuid" => Ok(Self::Uuid),
            other => Err(format!("unknown identifier scheme: {other}")),
        }
    }
}

/// Rendering dimensions declared by generated pages
/// (`<meta name="viewport">`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[rustfmt::skip]
    const PRESETS: &[(&str, u32, u32)] = &[
        ("small", 600, 800),
        ("medium", 720, 1280), ("720p", 720, 1280),
        ("ipad", 768, 1024),
        ("large", 1080, 1920), ("2k", 1080, 1920), ("1080p", 1080, 1920),
        ("ipad3", 1536, 2048),
        ("4k", 2160, 3840),
    ];

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A named device preset (e.g., `ipad`, `1080p`).
    pub fn preset(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::PRESETS
            .iter()
            .find(|(preset, _, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, width, height)| Self::new(*width, *height))
    }

    pub(crate) fn content(&self) -> String {
        format!("width={}, height={}", self.width, self.height)
    }
}

impl FromStr for Viewport {
    type Err = String;

    /// A preset name or `<width>x<height>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(preset) = Self::preset(s) {
            return Ok(preset);
        }
        s.trim()
            .split_once(['x', 'X'])
            .and_then(|(width, height)| Some(Self::new(width.trim().parse().ok()?, height.trim().parse().ok()?)))
            .ok_or_else(|| format!("invalid viewport: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport() {
        #[rustfmt::skip]
        let expected = [
            (Some((600, 800)), "small"),
            (Some((720, 1280)), "720P"),
            (Some((1536, 2048)), "ipad3"),
            (Some((2160, 3840)), "4k"),
            (Some((100, 200)), "100x200"),
            (None, "huge"),
        ];

        for (expected, input) in expected {
            let parsed = input.parse::<Viewport>().ok().map(|v| (v.width, v.height));
            assert_eq!(expected, parsed, "{input}");
        }
        assert_eq!("width=768, height=1024", Viewport::preset("ipad").unwrap().content());
    }

    #[test]
    fn test_options() {
        let options = BookOptions::default().compression(12).split_size(0);

        assert_eq!(9, options.compression);
        assert_eq!(1, options.split_size);
        assert_eq!("OEBPS/", options.book_root);
    }
}

use anyhow::{Context, Result, bail};
use bindery::{
    Book, BookOptions, Chapter, CoverImage, EpubVersion, ExternalReferences, IdentifierScheme, Rendition, SubLevel,
    TocOptions,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct BuildCommand {
    /// A JSON book description
    pub description: PathBuf,

    /// Where to write the EPUB [default: the description's `output`, else its file stem]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// The EPUB version to write (2.0, 3.0, 3.0.1, 3.1 or 3.2)
    #[arg(long = "epub-version")]
    version: Option<EpubVersion>,
}

impl BuildCommand {
    pub fn build(&self) -> Result<()> {
        let json = std::fs::read_to_string(&self.description)
            .with_context(|| format!("could not read {}", self.description.display()))?;
        let description: BookDescription = serde_json::from_str(&json)
            .with_context(|| format!("invalid book description: {}", self.description.display()))?;

        // Relative paths within the description resolve against its directory
        let base = self.description.parent().unwrap_or(Path::new(""));
        let output = self
            .output
            .clone()
            .or_else(|| description.output.as_ref().map(|output| base.join(output)))
            .unwrap_or_else(|| self.description.with_extension(""));

        let mut book = description.assemble(base, self.version)?;
        let written = book.save(&output)?;
        println!("{}", written.display());
        Ok(())
    }
}

/// The JSON input of `bindery build`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookDescription {
    pub title: String,
    pub language: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub identifier: Option<Identifier>,
    #[serde(default)]
    pub author: Option<Person>,
    #[serde(default)]
    pub publisher: Option<Publisher>,
    #[serde(default)]
    pub description: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub rights: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// An image file used as the cover.
    #[serde(default)]
    pub cover: Option<PathBuf>,
    #[serde(default)]
    pub stylesheets: Vec<Stylesheet>,
    #[serde(default)]
    pub toc: Option<Toc>,
    /// Fixed-layout properties, written for EPUB 3 only
    #[serde(default)]
    pub rendition: Option<RenditionDescription>,
    pub chapters: Vec<ChapterDescription>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    pub value: String,
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub sort_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Publisher {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stylesheet {
    /// Path within the book
    pub path: String,
    pub id: String,
    /// Source file, relative to the description
    pub file: PathBuf,
    #[serde(default)]
    pub references: References,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenditionDescription {
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub orientation: Option<String>,
    #[serde(default)]
    pub spread: Option<String>,
}

impl RenditionDescription {
    fn to_rendition(&self) -> Result<Rendition> {
        let mut rendition = Rendition::default();
        if let Some(layout) = &self.layout {
            rendition = rendition.layout(layout.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(orientation) = &self.orientation {
            rendition = rendition.orientation(orientation.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(spread) = &self.spread {
            rendition = rendition.spread(spread.parse().map_err(anyhow::Error::msg)?);
        }
        Ok(rendition)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Toc {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub css_file: Option<String>,
    #[serde(default)]
    pub add_to_index: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChapterDescription {
    pub title: String,
    /// Path within the book
    pub path: String,
    /// Source file, relative to the description
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Inline content, used when `file` is absent
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub references: References,
    #[serde(default)]
    pub children: Vec<ChapterDescription>,
}

/// [`ExternalReferences`] as written in JSON.
#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum References {
    #[default]
    Ignore,
    Embed,
    RemoveMedia,
    ReplaceMedia,
}

impl From<References> for ExternalReferences {
    fn from(references: References) -> Self {
        match references {
            References::Ignore => Self::Ignore,
            References::Embed => Self::Embed,
            References::RemoveMedia => Self::RemoveMedia,
            References::ReplaceMedia => Self::ReplaceMedia,
        }
    }
}

impl BookDescription {
    /// Assemble a book from the description, reading sources below `base`.
    ///
    /// `version` overrides the description's own version.
    pub fn assemble(&self, base: &Path, version: Option<EpubVersion>) -> Result<Book> {
        let version = match (version, &self.version) {
            (Some(version), _) => version,
            (None, Some(version)) => version.parse().map_err(anyhow::Error::msg)?,
            (None, None) => EpubVersion::default(),
        };
        let options = BookOptions::default()
            .version(version)
            .doc_root(base)
            .language(self.language.clone());
        let mut book = Book::new(options);

        self.add_metadata(&mut book)?;

        if let Some(cover) = &self.cover {
            let data = read(base, cover)?;
            let name = cover.file_name().map_or("cover".into(), |name| name.to_string_lossy());
            book.set_cover_image(CoverImage::new(name, data))?;
        }
        for stylesheet in &self.stylesheets {
            let css = String::from_utf8(read(base, &stylesheet.file)?)
                .with_context(|| format!("{} is not UTF-8", stylesheet.file.display()))?;
            let base_dir = parent_dir(&stylesheet.file);
            book.add_css_file(&stylesheet.path, &stylesheet.id, &css, stylesheet.references.into(), &base_dir)?;
        }
        if self.chapters.is_empty() {
            bail!("the book description lists no chapters");
        }
        for chapter in &self.chapters {
            add_chapter(&mut book, base, chapter)?;
        }
        if let Some(toc) = &self.toc {
            let mut options = TocOptions::default().add_to_index(toc.add_to_index);
            if let Some(title) = &toc.title {
                options = options.title(title);
            }
            if let Some(css_file) = &toc.css_file {
                options = options.css_file(css_file);
            }
            book.build_toc(options)?;
        }

        tracing::debug!(title = %self.title, chapters = self.chapters.len(), "assembled book description");
        Ok(book)
    }

    fn add_metadata(&self, book: &mut Book) -> Result<()> {
        book.set_title(&self.title)?;
        book.set_language(&self.language)?;

        if let Some(identifier) = &self.identifier {
            let scheme = match &identifier.scheme {
                Some(scheme) => scheme.parse::<IdentifierScheme>().map_err(anyhow::Error::msg)?,
                None => IdentifierScheme::Uri,
            };
            book.set_identifier(&identifier.value, scheme)?;
        }
        if let Some(author) = &self.author {
            book.set_author(&author.name, author.sort_key.as_deref().unwrap_or(&author.name))?;
        }
        if let Some(publisher) = &self.publisher {
            book.set_publisher(&publisher.name, &publisher.url)?;
        }
        if let Some(description) = &self.description {
            book.set_description(description)?;
        }
        if let Some(date) = &self.date {
            book.set_date(parse_date(date)?)?;
        }
        if let Some(rights) = &self.rights {
            book.set_rights(rights)?;
        }
        for subject in &self.subjects {
            book.add_subject(subject)?;
        }
        if let Some(rendition) = &self.rendition {
            book.set_rendition(rendition.to_rendition()?)?;
        }
        Ok(())
    }
}

fn add_chapter(book: &mut Book, base: &Path, description: &ChapterDescription) -> Result<()> {
    let mut chapter = Chapter::new(&description.title, &description.path)
        .external_references(description.references.into());

    match (&description.file, &description.content) {
        (Some(file), _) => {
            let content = String::from_utf8(read(base, file)?)
                .with_context(|| format!("{} is not UTF-8", file.display()))?;
            chapter = chapter.content(content).base_dir(parent_dir(file));
        }
        (None, Some(content)) => chapter = chapter.content(content),
        // Fragment links and the table of contents placeholder
        (None, None) => {}
    }
    book.add_chapter(chapter)
        .with_context(|| format!("could not add chapter `{}`", description.title))?;

    if !description.children.is_empty() {
        book.sub_level(SubLevel::last())?;
        for child in &description.children {
            add_chapter(book, base, child)?;
        }
        book.back_level()?;
    }
    Ok(())
}

fn read(base: &Path, file: &Path) -> Result<Vec<u8>> {
    let path = base.join(file);
    std::fs::read(&path).with_context(|| format!("could not read {}", path.display()))
}

/// The directory of a source file, relative to the description.
fn parent_dir(file: &Path) -> String {
    file.parent()
        .map(|parent| parent.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn parse_date(date: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(date) {
        return Ok(date.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").with_context(|| format!("invalid date: {date}"))?;
    day.and_hms_opt(0, 0, 0)
        .map(|time| time.and_utc())
        .with_context(|| format!("invalid date: {date}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"{
        "title": "A Short Story",
        "language": "en",
        "version": "3.0",
        "author": { "name": "Jane Doe", "sort_key": "Doe, Jane" },
        "date": "2024-05-01",
        "subjects": ["Fiction"],
        "toc": { "title": "Contents" },
        "rendition": { "layout": "pre-paginated", "spread": "none" },
        "chapters": [
            {
                "title": "Part One",
                "path": "Text/part1.xhtml",
                "content": "<p id=\"start\">Begin.</p>",
                "children": [
                    { "title": "Chapter 1", "path": "Text/chapter1.xhtml", "content": "<p>One.</p>" }
                ]
            },
            { "title": "Chapter 2", "path": "Text/chapter2.xhtml", "content": "<p>Two.</p>", "references": "remove-media" }
        ]
    }"#;

    #[test]
    fn test_assemble() {
        let description: BookDescription = serde_json::from_str(DESCRIPTION).unwrap();
        let mut book = description.assemble(Path::new(""), None).unwrap();

        assert_eq!(EpubVersion::Epub3, book.version());
        let spine: Vec<_> = book.package().spine().iter().map(|entry| entry.idref().to_owned()).collect();
        assert_eq!(vec!["chapter1", "chapter2", "chapter3", "ref_toc"], spine);
        let depths: Vec<_> = book
            .navigation()
            .walk()
            .into_iter()
            .map(|(_, point)| (point.label().to_owned(), point.depth()))
            .collect();
        assert_eq!(
            vec![
                ("Part One".to_owned(), 1),
                ("Chapter 1".to_owned(), 2),
                ("Chapter 2".to_owned(), 1)
            ],
            depths
        );

        book.finalize().unwrap();
        assert!(book.package().manifest().by_id("ref_toc").is_some());
        let layout = book.package().metadata().property("rendition:layout");
        assert_eq!(Some("pre-paginated"), layout.map(|property| property.value()));
    }

    #[test]
    fn test_invalid_rendition() {
        let json = DESCRIPTION.replace("pre-paginated", "fixed");
        let description: BookDescription = serde_json::from_str(&json).unwrap();
        assert!(description.assemble(Path::new(""), None).is_err());
    }

    #[test]
    fn test_version_override() {
        let description: BookDescription = serde_json::from_str(DESCRIPTION).unwrap();
        let book = description.assemble(Path::new(""), Some(EpubVersion::Epub2)).unwrap();
        assert_eq!(EpubVersion::Epub2, book.version());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = serde_json::from_str::<BookDescription>(r#"{"title":"T","language":"en","chapters":[],"extra":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_date() {
        #[rustfmt::skip]
        let expected = [
            ("2024-05-01T00:00:00+00:00", "2024-05-01"),
            ("2024-05-01T10:30:00+00:00", "2024-05-01T12:30:00+02:00"),
        ];

        for (expected, date) in expected {
            assert_eq!(expected, parse_date(date).unwrap().to_rfc3339());
        }
        assert!(parse_date("May 1st").is_err());
    }
}

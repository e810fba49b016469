use crate::book::{entry_names, new_book, open, read_entry};
use bindery::resolve::{FetchError, FetchResult, Fetched, ResourceFetcher};
use bindery::{Book, BookOptions, Chapter, EpubVersion, ExternalReferences};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n0000";

/// Serves a PNG for every location named `pic.png`, fails everything else.
struct Pictures;

impl ResourceFetcher for Pictures {
    fn fetch(&self, location: &str) -> FetchResult<Fetched> {
        match location.rsplit('/').next() {
            Some("pic.png") => Ok(Fetched::new(PNG.to_vec(), None)),
            _ => Err(FetchError::NotFound(location.to_owned())),
        }
    }
}

fn book_with_fetcher(version: EpubVersion) -> Book {
    let mut book = Book::new(BookOptions::default().version(version).fetcher(Pictures));
    book.set_title("Pictures").unwrap();
    book.set_language("en").unwrap();
    book
}

#[test]
fn test_failed_remote_css_url_is_removed() {
    let mut book = book_with_fetcher(EpubVersion::Epub3);
    let css = "body { background: url(http://example.com/gone/bg.jpg) } h1 { color: red }";
    book.add_css_file("Styles/main.css", "main", css, ExternalReferences::Embed, "")
        .unwrap();
    book.add_chapter(Chapter::new("One", "Text/one.xhtml").content("<p>One</p>"))
        .unwrap();

    let manifest = book.package().manifest();
    assert_eq!(Some("Styles/main.css"), manifest.by_id("css_main").map(|item| item.href()));
    assert!(manifest.iter().all(|item| !item.href().ends_with("bg.jpg")));

    let mut archive = open(book.to_vec().unwrap());
    let stored = read_entry(&mut archive, "OEBPS/Styles/main.css");
    assert!(!stored.contains("example.com"));
    assert!(stored.contains("h1 { color: red }"));
}

#[test]
fn test_local_css_url_is_embedded() {
    let mut book = book_with_fetcher(EpubVersion::Epub3);
    let css = "body { background: url(img/pic.png) }";
    book.add_css_file("Styles/main.css", "main", css, ExternalReferences::Embed, "")
        .unwrap();
    book.add_chapter(Chapter::new("One", "Text/one.xhtml").content("<p>One</p>"))
        .unwrap();

    let image = book
        .package()
        .manifest()
        .iter()
        .find(|item| item.href().ends_with("pic.png"))
        .unwrap();
    assert_eq!("image/png", image.media_type());

    let mut archive = open(book.to_vec().unwrap());
    let stored = read_entry(&mut archive, "OEBPS/Styles/main.css");
    assert!(stored.contains("url('../images/"));
}

#[test]
fn test_shared_image_is_embedded_once() {
    let mut book = book_with_fetcher(EpubVersion::Epub3);
    let content = r#"<p><img src="pic.png" alt="A picture"/></p>"#;
    for (title, path) in [("One", "Text/one.xhtml"), ("Two", "Text/two.xhtml")] {
        book.add_chapter(
            Chapter::new(title, path)
                .content(content)
                .external_references(ExternalReferences::Embed),
        )
        .unwrap();
    }

    let images = book
        .package()
        .manifest()
        .iter()
        .filter(|item| item.media_type() == "image/png")
        .count();
    assert_eq!(1, images);

    let mut archive = open(book.to_vec().unwrap());
    let names = entry_names(&archive);
    assert_eq!(1, names.iter().filter(|name| name.ends_with("/pic.png")).count());

    let one = read_entry(&mut archive, "OEBPS/Text/one.xhtml");
    let two = read_entry(&mut archive, "OEBPS/Text/two.xhtml");
    assert!(one.contains(r#"src="../images/"#));
    assert!(!one.contains(r#"src="pic.png""#));
    assert!(two.contains(r#"src="../images/"#));
}

#[test]
fn test_missing_remote_image_is_dropped() {
    let mut book = book_with_fetcher(EpubVersion::Epub3);
    let content = r#"<p>Text<img src="https://example.com/missing.png" alt="gone"/></p>"#;
    book.add_chapter(
        Chapter::new("One", "Text/one.xhtml")
            .content(content)
            .external_references(ExternalReferences::Embed),
    )
    .unwrap();

    let mut archive = open(book.to_vec().unwrap());
    let one = read_entry(&mut archive, "OEBPS/Text/one.xhtml");
    assert!(!one.contains("example.com"));
    assert!(one.contains("Text"));
}

#[test]
fn test_legacy_html5_rewrite() {
    let mut book = new_book(EpubVersion::Epub2);
    let content = "<section><header>Heading</header><p>A <mark>marked</mark> word.</p></section>";
    book.add_chapter(Chapter::new("One", "Text/one.xhtml").content(content))
        .unwrap();

    let mut archive = open(book.to_vec().unwrap());
    let one = read_entry(&mut archive, "OEBPS/Text/one.xhtml");
    for element in ["<section", "<header", "<mark"] {
        assert!(!one.contains(element), "{element} survived: {one}");
    }
    assert!(one.contains("<div>"));
    assert!(one.contains("<span>marked</span>"));
}

#[test]
fn test_modern_keeps_html5() {
    let mut book = new_book(EpubVersion::Epub3);
    book.add_chapter(Chapter::new("One", "Text/one.xhtml").content("<section><p>Kept</p></section>"))
        .unwrap();

    let mut archive = open(book.to_vec().unwrap());
    let one = read_entry(&mut archive, "OEBPS/Text/one.xhtml");
    assert!(one.contains("<section>"));
    assert!(one.contains(r#"xml:lang="en""#));
}

#[test]
fn test_split_chapter_parts() {
    let mut book = new_book(EpubVersion::Epub3);
    book.add_chapter(Chapter::new("Long", "Text/long.xhtml").parts(["<p>First</p>", "<p>Second</p>"]))
        .unwrap();

    let manifest = book.package().manifest();
    assert!(manifest.by_href("Text/long_1.xhtml").is_some());
    assert!(manifest.by_href("Text/long_2.xhtml").is_some());

    let spine: Vec<_> = book.package().spine().iter().map(|entry| entry.idref().to_owned()).collect();
    assert_eq!(vec!["long_1", "long_2"], spine);
}

/// Locates every media file at a path that does not exist.
struct VanishedMedia;

impl ResourceFetcher for VanishedMedia {
    fn fetch(&self, location: &str) -> FetchResult<Fetched> {
        Err(FetchError::NotFound(location.to_owned()))
    }

    fn locate(&self, location: &str) -> Option<std::path::PathBuf> {
        Some(std::path::Path::new("/nonexistent").join(location))
    }
}

#[test]
fn test_failed_part_stages_nothing() {
    let mut book = Book::new(BookOptions::default().version(EpubVersion::Epub3).fetcher(VanishedMedia));
    book.set_title("Vanished").unwrap();
    book.set_language("en").unwrap();

    let chapter = Chapter::new("Long", "Text/long.xhtml")
        .parts(["<p>First</p>", r#"<audio><source src="clip.mp3"/></audio>"#])
        .external_references(ExternalReferences::Embed);
    assert!(book.add_chapter(chapter).is_err());

    assert!(book.package().manifest().is_empty());
    assert!(book.package().spine().is_empty());

    book.add_chapter(Chapter::new("Long", "Text/long.xhtml").parts(["<p>First</p>", "<p>Second</p>"]))
        .unwrap();
    let archive = open(book.to_vec().unwrap());
    let names = entry_names(&archive);
    assert!(names.contains(&"OEBPS/Text/long_1.xhtml".to_owned()));
    assert!(names.contains(&"OEBPS/Text/long_2.xhtml".to_owned()));
}

use crate::book::{entry_names, minimal_book, open, read_entry};
use bindery::EpubVersion;
use bindery::tool::epubcheck::inspect_container;
use zip::CompressionMethod;

#[test]
fn test_minimal_book_layout() {
    let mut book = minimal_book(EpubVersion::Epub3);
    let mut archive = open(book.to_vec().unwrap());

    let mimetype = archive.by_index(0).unwrap();
    assert_eq!("mimetype", mimetype.name());
    assert_eq!(CompressionMethod::Stored, mimetype.compression());
    drop(mimetype);
    assert_eq!("application/epub+zip", read_entry(&mut archive, "mimetype"));

    let names = entry_names(&archive);
    for expected in [
        "META-INF/container.xml",
        "OEBPS/book.opf",
        "OEBPS/book.ncx",
        "OEBPS/Text/chapter1.xhtml",
    ] {
        assert!(names.iter().any(|name| name == expected), "missing {expected}: {names:?}");
    }

    let container = read_entry(&mut archive, "META-INF/container.xml");
    assert!(container.contains(r#"full-path="OEBPS/book.opf""#));
    assert!(container.contains(r#"media-type="application/oebps-package+xml""#));

    let package = read_entry(&mut archive, "OEBPS/book.opf");
    assert_eq!(1, package.matches("<itemref ").count());
    assert!(package.contains(r#"idref="chapter1""#));
    assert!(package.contains(r#"properties="nav""#));
    assert!(package.contains("<dc:title>A Short Story</dc:title>"));
    assert!(package.contains("<dc:language>en</dc:language>"));
}

#[test]
fn test_legacy_layout() {
    let mut book = minimal_book(EpubVersion::Epub2);
    let mut archive = open(book.to_vec().unwrap());

    let package = read_entry(&mut archive, "OEBPS/book.opf");
    assert!(package.contains(r#"version="2.0""#));
    assert!(!package.contains(r#"properties="nav""#));
    assert!(package.contains(r#"toc="ncx""#));

    let ncx = read_entry(&mut archive, "OEBPS/book.ncx");
    assert!(ncx.contains("Text/chapter1.xhtml"));
    assert!(ncx.contains("Chapter 1"));
}

#[test]
fn test_save_and_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = minimal_book(EpubVersion::Epub3);

    let path = book.save(dir.path().join("story")).unwrap();
    assert_eq!(dir.path().join("story.epub"), path);
    assert!(!dir.path().join("story.bindery.tmp").exists());
    assert_eq!(std::fs::read(&path).unwrap(), book.to_vec().unwrap());

    let report = inspect_container(&path).unwrap();
    assert!(report.is_valid());
    assert_eq!(Some("OEBPS/book.opf"), report.package.as_deref());
    assert!(report.ncx && report.nav);
}

#[test]
fn test_size_matches_output() {
    let mut book = minimal_book(EpubVersion::Epub3);
    let size = book.size().unwrap();
    assert_eq!(size, book.to_vec().unwrap().len() as u64);
}

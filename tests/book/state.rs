use crate::book::{entry_names, minimal_book, new_book, open};
use bindery::errors::{BookError, PathError, StateError};
use bindery::{Chapter, EpubVersion, TocOptions};
use proptest::prelude::*;

#[test]
fn test_finalize_requirements() {
    let mut book = bindery::Book::default();
    assert!(matches!(book.finalize(), Err(BookError::State(StateError::NoChapters))));

    book.add_chapter(Chapter::new("One", "one.xhtml").content("<p>One</p>"))
        .unwrap();
    assert!(matches!(book.finalize(), Err(BookError::State(StateError::MissingTitle))));

    book.set_title("Title").unwrap();
    assert!(matches!(book.finalize(), Err(BookError::State(StateError::MissingLanguage))));
    assert!(!book.is_finalized());

    book.set_language("en").unwrap();
    book.finalize().unwrap();
    assert!(book.is_finalized());
}

#[test]
fn test_rejected_mutation_keeps_output() {
    let mut book = minimal_book(EpubVersion::Epub3);
    let before = book.to_vec().unwrap();

    #[rustfmt::skip]
    let rejected = [
        book.set_title("Other").map(|_| ()),
        book.add_chapter(Chapter::new("Two", "two.xhtml").content("<p>Two</p>")).map(|_| ()),
        book.add_file("extra.txt", "extra", b"extra", "text/plain").map(|_| ()),
        book.build_toc(TocOptions::default()),
        book.finalize(),
    ];
    for result in rejected {
        assert!(matches!(result, Err(BookError::State(StateError::Finalized))));
    }

    assert_eq!(before, book.to_vec().unwrap());
}

#[test]
fn test_invalid_language() {
    let mut book = new_book(EpubVersion::Epub3);
    assert!(matches!(
        book.set_language("english"),
        Err(BookError::State(StateError::InvalidLanguage(_)))
    ));
}

#[test]
fn test_reserved_entries() {
    let mut book = new_book(EpubVersion::Epub3);
    for path in ["book.opf", "book.ncx", "../mimetype"] {
        assert!(book.add_file(path, "reserved", b"x", "text/plain").is_err(), "{path}");
    }
}

#[test]
fn test_incomplete_item_is_never_written() {
    let mut book = minimal_book(EpubVersion::Epub3);

    #[rustfmt::skip]
    let rejected = [
        book.add_file("extra.txt", "", b"data", "text/plain"),
        book.add_file("extra.txt", "extra", b"data", " "),
    ];
    for result in rejected {
        assert!(matches!(result, Err(BookError::State(StateError::IncompleteItem(href))) if href == "extra.txt"));
    }
    assert!(book.package().manifest().by_href("extra.txt").is_none());

    let archive = open(book.to_vec().unwrap());
    assert!(!entry_names(&archive).contains(&"OEBPS/extra.txt".to_owned()));
}

#[test]
fn test_toc_placeholder_without_toc() {
    let mut book = new_book(EpubVersion::Epub3);
    book.add_chapter(Chapter::new("One", "one.xhtml").content("<p>One</p>"))
        .unwrap();
    book.add_chapter(Chapter::new("Contents", "TOC.xhtml")).unwrap();

    assert!(matches!(
        book.finalize(),
        Err(BookError::State(StateError::DanglingSpineEntry(idref))) if idref == "ref_toc"
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_duplicate_href_is_rejected(name in "[a-z]{1,8}") {
        let mut book = new_book(EpubVersion::Epub3);
        let path = format!("Text/{name}.xhtml");
        book.add_chapter(Chapter::new("First", path.as_str()).content("<p>1</p>")).unwrap();

        let duplicate = book.add_chapter(Chapter::new("Second", path.as_str()).content("<p>2</p>"));
        prop_assert!(matches!(duplicate, Err(BookError::State(StateError::DuplicateHref(_)))));

        let file = book.add_file(&format!("./Text//{name}.xhtml"), "other", b"x", "text/plain");
        prop_assert!(matches!(file, Err(BookError::State(StateError::DuplicateHref(_)))));
        prop_assert_eq!(1, book.package().manifest().len());
    }

    #[test]
    fn test_traversal_never_reaches_the_container(depth in 1usize..5, name in "[a-z]{1,8}") {
        let mut book = minimal_book(EpubVersion::Epub3);
        let path = format!("{}etc/{name}", "../".repeat(depth));

        let added = book.add_file(&path, "escape", b"secret", "text/plain");
        prop_assert!(matches!(added, Err(BookError::Path(PathError::Traversal(_)))));
        let chapter = book.add_chapter(Chapter::new("Escape", path.as_str()).content("<p>x</p>"));
        prop_assert!(matches!(chapter, Err(BookError::Path(PathError::Traversal(_)))));

        let archive = open(book.to_vec().unwrap());
        for entry in entry_names(&archive) {
            prop_assert!(!entry.contains(".."));
            let suffix = format!("etc/{name}");
            prop_assert!(!entry.ends_with(&suffix));
        }
    }

    #[test]
    fn test_spine_follows_chapter_order(count in 1usize..8) {
        let mut book = new_book(EpubVersion::Epub3);
        for n in 1..=count {
            book.add_chapter(Chapter::new(format!("Chapter {n}"), format!("Text/c{n}.xhtml")).content("<p>x</p>"))
                .unwrap();
        }
        book.finalize().unwrap();

        let package = book.package();
        let idrefs: Vec<_> = package.spine().iter().map(|entry| entry.idref().to_owned()).collect();
        let expected: Vec<_> = (1..=count).map(|n| format!("chapter{n}")).collect();
        prop_assert_eq!(expected, idrefs);

        for entry in package.spine().iter() {
            let item = package.manifest().by_id(entry.idref());
            prop_assert!(item.is_some_and(|item| item.media_type() == "application/xhtml+xml"));
        }
        prop_assert_eq!(count, book.navigation().walk().len());
    }
}

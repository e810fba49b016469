/// Book assembly integration tests
mod book {
    mod container;
    mod content;
    mod state;

    use bindery::{Book, BookOptions, Chapter, EpubVersion};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    /// A book with the required metadata and no content.
    fn new_book(version: EpubVersion) -> Book {
        let mut book = Book::new(BookOptions::default().version(version));
        book.set_title("A Short Story").unwrap();
        book.set_language("en").unwrap();
        book.set_author("Jane Doe", "Doe, Jane").unwrap();
        book
    }

    fn minimal_book(version: EpubVersion) -> Book {
        let mut book = new_book(version);
        book.add_chapter(Chapter::new("Chapter 1", "Text/chapter1.xhtml").content("<p id=\"p1\">Once upon a time.</p>"))
            .unwrap();
        book
    }

    fn open(bytes: Vec<u8>) -> ZipArchive<Cursor<Vec<u8>>> {
        ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut content = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut content).unwrap();
        content
    }

    fn entry_names(archive: &ZipArchive<Cursor<Vec<u8>>>) -> Vec<String> {
        archive.file_names().map(str::to_owned).collect()
    }
}

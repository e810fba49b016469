//! # bindery
//! An EPUB 2 and 3 assembly library: collect metadata, chapters, images
//! and stylesheets, then write a standards-conformant EPUB container.
//!
//! Assembly is driven through [`Book`], which owns the package model
//! ([`package`]), the navigation tree ([`nav`]) and a scratch zip container.
//! References within content (stylesheets, images, media and CSS `url(...)`)
//! are handled according to an [`ExternalReferences`] policy by the
//! [`resolve`] module.
//!
//! ## Examples
//! Assembling an EPUB 3 book:
//! ```no_run
//! use bindery::{Book, BookOptions, Chapter, EpubVersion, ExternalReferences, TocOptions};
//!
//! # fn main() -> bindery::errors::BookResult<()> {
//! let mut book = Book::new(BookOptions::default().version(EpubVersion::Epub3));
//! book.set_title("Moby-Dick")?;
//! book.set_language("en")?;
//! book.set_author("Herman Melville", "Melville, Herman")?;
//!
//! book.add_css_file("Styles/main.css", "main", "p { text-indent: 1em; }", ExternalReferences::Ignore, "")?;
//! book.add_chapter(Chapter::new("Loomings", "Text/chapter1.xhtml").content("<p>Call me Ishmael.</p>"))?;
//! book.build_toc(TocOptions::default().css_file("Styles/main.css"))?;
//!
//! book.save("moby-dick")?; // Finalizes and writes `moby-dick.epub`
//! # Ok(())
//! # }
//! ```
//! Nesting chapters within the navigation:
//! ```no_run
//! # use bindery::{Book, Chapter, SubLevel};
//! # fn main() -> bindery::errors::BookResult<()> {
//! # let mut book = Book::default();
//! book.sub_level(SubLevel::titled("Part One"))?;
//! book.add_chapter(Chapter::new("Chapter 1", "part1/chapter1.xhtml").content("<p>...</p>"))?;
//! book.add_chapter(Chapter::new("Chapter 2", "part1/chapter2.xhtml").content("<p>...</p>"))?;
//! book.back_level()?;
//! # Ok(())
//! # }
//! ```

mod book;
mod consts;
mod util;
mod writer;

pub mod errors;
pub mod nav;
pub mod package;
pub mod resolve;
pub mod tool;
pub mod version;

pub use self::book::{
    AudioClip, AudioOverlay, BlockSplitter, Book, BookOptions, Chapter, ChapterSplitter, ClockValue, CoverImage,
    IdentifierScheme, Layout, Orientation, ReferencePage, Rendition, Spread, TocOptions, Viewport,
};
pub use self::nav::{NavHandle, Navigation, SubLevel};
pub use self::package::{ReferenceOrder, ReferenceType};
pub use self::resolve::ExternalReferences;
pub use self::version::{EpubVersion, TextDirection};

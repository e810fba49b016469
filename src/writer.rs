//! Serializers for the generated documents and the zip container.

mod container;
mod nav;
mod ncx;
mod package;
mod page;
mod smil;
pub(crate) mod xml;
pub(crate) mod zip;

pub(crate) use self::container::write_container;
pub(crate) use self::nav::{NavDocument, write_nav_document};
pub(crate) use self::ncx::{NcxHead, write_ncx};
pub(crate) use self::package::write_package;
pub(crate) use self::page::{Page, PageBody, TocRow, toc_style, write_page};
pub(crate) use self::smil::{SmilClip, write_smil};

pub(crate) type WriterResult<T> = crate::errors::BookResult<T>;

use clap::Subcommand;

mod build;
mod check;
mod convert;

pub use self::build::{BookDescription, BuildCommand};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assemble an EPUB from a JSON book description.
    Build(build::BuildCommand),
    /// Validate an EPUB with EPUBCheck, or inspect its container when
    /// EPUBCheck is unavailable.
    Check(check::CheckCommand),
    /// Convert an EPUB to another format with Calibre's `ebook-convert`.
    Convert(convert::ConvertCommand),
}

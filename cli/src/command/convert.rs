use anyhow::{Context, Result};
use bindery::tool::convert::Converter;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct ConvertCommand {
    /// The EPUB file to convert
    pub epub: PathBuf,

    /// The output file; its extension selects the format (e.g., `.azw3`, `.pdf`)
    pub output: PathBuf,

    /// An explicit `ebook-convert` executable
    #[arg(long)]
    program: Option<PathBuf>,

    /// Seconds to wait before giving up
    #[arg(long, default_value_t = Converter::DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,
}

impl ConvertCommand {
    pub fn convert(&self) -> Result<()> {
        let converter = match &self.program {
            Some(program) => Converter::with_program(program),
            None => Converter::locate()?,
        }
        .timeout(Duration::from_secs(self.timeout));

        let written = converter
            .convert(&self.epub, &self.output)
            .with_context(|| format!("could not convert {}", self.epub.display()))?;
        println!("{}", written.display());
        Ok(())
    }
}

use anyhow::{Context, Result, ensure};
use bindery::errors::{ToolError, ToolResult};
use bindery::tool::epubcheck::{Validator, inspect_container};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// The EPUB file to validate
    pub epub: PathBuf,

    /// An `epubcheck.jar` to run with `java`
    #[arg(long)]
    jar: Option<PathBuf>,

    /// Only inspect the container structure
    #[arg(long)]
    structure_only: bool,
}

impl CheckCommand {
    pub fn check(&self) -> Result<()> {
        if !self.structure_only {
            match self.validator() {
                Ok(validator) => return self.validate(&validator),
                Err(ToolError::NotFound(tool)) => {
                    tracing::warn!(%tool, "EPUBCheck is unavailable, inspecting the container only");
                }
                Err(error) => return Err(error.into()),
            }
        }
        self.inspect()
    }

    fn validator(&self) -> ToolResult<Validator> {
        match &self.jar {
            Some(jar) => Validator::with_jar(jar),
            None => Validator::locate(),
        }
    }

    fn validate(&self, validator: &Validator) -> Result<()> {
        let report = validator
            .validate(&self.epub)
            .with_context(|| format!("EPUBCheck rejected {}", self.epub.display()))?;

        for message in report.messages() {
            println!("{message}");
        }
        println!("{}: valid", self.epub.display());
        Ok(())
    }

    fn inspect(&self) -> Result<()> {
        let report = inspect_container(&self.epub)
            .with_context(|| format!("could not read {}", self.epub.display()))?;

        println!("mimetype: {}", if report.mimetype { "ok" } else { "missing or misplaced" });
        println!("package:  {}", report.package.as_deref().unwrap_or("missing"));
        println!("ncx:      {}", report.ncx);
        println!("nav:      {}", report.nav);

        ensure!(report.is_valid(), "{} is not a well-formed EPUB container", self.epub.display());
        Ok(())
    }
}

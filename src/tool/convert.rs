//! Conversion to other ebook formats with Calibre's `ebook-convert`.

use crate::errors::{ToolError, ToolResult};
use crate::tool;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROGRAM: &str = "ebook-convert";

/// Where Calibre installs `ebook-convert` when it is not on `PATH`.
const COMMON_LOCATIONS: &[&str] = &[
    "/usr/bin/ebook-convert",
    "/usr/local/bin/ebook-convert",
    "/opt/calibre/ebook-convert",
    "/Applications/calibre.app/Contents/MacOS/ebook-convert",
    r"C:\Program Files\Calibre2\ebook-convert.exe",
];

/// A located `ebook-convert` executable.
///
/// The output format follows the extension of the output path
/// (e.g., `.azw3`, `.mobi`, `.pdf`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Converter {
    program: PathBuf,
    timeout: Duration,
}

impl Converter {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    /// Find `ebook-convert` on `PATH` or in a common install location.
    pub fn locate() -> ToolResult<Self> {
        tool::which(PROGRAM)
            .or_else(|| {
                COMMON_LOCATIONS
                    .iter()
                    .map(PathBuf::from)
                    .find(|candidate| candidate.is_file())
            })
            .map(Self::with_program)
            .ok_or_else(|| ToolError::NotFound(PROGRAM.to_owned()))
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Default: 300 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Convert `epub` into `output`, returning the path written.
    ///
    /// # Errors
    /// [`ToolError::Failed`] carries the converter's stderr.
    pub fn convert(&self, epub: impl AsRef<Path>, output: impl AsRef<Path>) -> ToolResult<PathBuf> {
        let (epub, output) = (epub.as_ref(), output.as_ref());
        if !epub.is_file() {
            return Err(ToolError::MissingInput(epub.to_path_buf()));
        }

        tool::run(&self.program, [epub.as_os_str(), output.as_os_str()], self.timeout)?.check(&self.program)?;
        tracing::info!(input = %epub.display(), output = %output.display(), "converted book");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input() {
        let converter = Converter::with_program("ebook-convert").timeout(Duration::from_secs(5));
        assert!(matches!(
            converter.convert("/nonexistent/book.epub", "book.azw3"),
            Err(ToolError::MissingInput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("book.epub");
        std::fs::write(&epub, b"not an epub").unwrap();

        // `false` ignores its arguments and exits with 1
        let converter = Converter::with_program(tool::which("false").unwrap());
        let result = converter.convert(&epub, dir.path().join("book.azw3"));
        assert!(matches!(result, Err(ToolError::Failed { status: 1, .. })));
    }
}

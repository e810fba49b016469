//! Validation with [EPUBCheck](https://www.w3.org/publishing/epubcheck/).

use crate::consts::{mime, ocf};
use crate::errors::{BookResult, ToolError, ToolResult};
use crate::tool::{self, Output};
use crate::writer::zip::from_zip_error;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an `epubcheck.jar`.
pub const JAR_VARIABLE: &str = "EPUBCHECK_JAR";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Launcher {
    Binary(PathBuf),
    Jar { java: PathBuf, jar: PathBuf },
}

/// A located EPUBCheck installation.
///
/// # Examples
/// ```no_run
/// # use bindery::tool::epubcheck::Validator;
/// # fn main() -> bindery::errors::ToolResult<()> {
/// let report = Validator::locate()?.validate("moby-dick.epub")?;
/// for warning in report.warnings() {
///     println!("{warning}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    launcher: Launcher,
}

impl Validator {
    /// Timeout of the native `epubcheck` launcher.
    pub const BINARY_TIMEOUT: Duration = Duration::from_secs(60);
    /// Timeout of `java -jar epubcheck.jar`.
    pub const JAR_TIMEOUT: Duration = Duration::from_secs(120);

    /// Find `epubcheck` on `PATH`, else `java` plus the jar named by
    /// [`JAR_VARIABLE`].
    pub fn locate() -> ToolResult<Self> {
        if let Some(binary) = tool::which("epubcheck") {
            return Ok(Self::with_binary(binary));
        }
        match std::env::var_os(JAR_VARIABLE) {
            Some(jar) => Self::with_jar(jar),
            None => Err(ToolError::NotFound("epubcheck".to_owned())),
        }
    }

    /// Use an explicit `epubcheck` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            launcher: Launcher::Binary(binary.into()),
        }
    }

    /// Use an explicit `epubcheck.jar`, run with `java` from `PATH`.
    pub fn with_jar(jar: impl Into<PathBuf>) -> ToolResult<Self> {
        let jar = jar.into();
        if !jar.is_file() {
            return Err(ToolError::NotFound(jar.display().to_string()));
        }
        let java = tool::which("java").ok_or_else(|| ToolError::NotFound("java".to_owned()))?;
        Ok(Self {
            launcher: Launcher::Jar { java, jar },
        })
    }

    /// The effective timeout of [`Self::validate`].
    pub fn timeout(&self) -> Duration {
        match self.launcher {
            Launcher::Binary(_) => Self::BINARY_TIMEOUT,
            Launcher::Jar { .. } => Self::JAR_TIMEOUT,
        }
    }

    /// Validate the EPUB at `epub`.
    ///
    /// # Errors
    /// [`ToolError::Failed`] carries the reported errors when EPUBCheck
    /// rejects the publication.
    pub fn validate(&self, epub: impl AsRef<Path>) -> ToolResult<ValidationReport> {
        let epub = epub.as_ref();
        if !epub.is_file() {
            return Err(ToolError::MissingInput(epub.to_path_buf()));
        }

        let (program, output) = match &self.launcher {
            Launcher::Binary(binary) => (binary, tool::run(binary, [epub.as_os_str()], self.timeout())?),
            Launcher::Jar { java, jar } => {
                let args = [OsStr::new("-jar"), jar.as_os_str(), epub.as_os_str()];
                (java, tool::run(java, args, self.timeout())?)
            }
        };
        let output = output.check(program)?;
        tracing::info!(epub = %epub.display(), "epubcheck passed");
        Ok(ValidationReport::parse(&output))
    }
}

/// Severity of an EPUBCheck message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Usage,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn parse(label: &str) -> Option<Self> {
        Some(match label {
            "USAGE" => Self::Usage,
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "FATAL" => Self::Fatal,
            _ => return None,
        })
    }
}

/// One line of EPUBCheck output: `WARNING(CODE): location: message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationMessage {
    pub severity: Severity,
    /// e.g., `RSC-005`
    pub code: Option<String>,
    pub message: String,
}

impl ValidationMessage {
    fn parse(line: &str) -> Option<Self> {
        let (label, rest) = line.split_once(['(', ':'])?;
        let severity = Severity::parse(label.trim())?;
        let (code, message) = match line[label.len()..].strip_prefix('(') {
            Some(coded) => {
                let (code, message) = coded.split_once(')')?;
                (Some(code.to_owned()), message)
            }
            None => (None, rest),
        };
        Some(Self {
            severity,
            code,
            message: message.trim_start_matches(':').trim().to_owned(),
        })
    }
}

impl std::fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{:?}({code}): {}", self.severity, self.message),
            None => write!(f, "{:?}: {}", self.severity, self.message),
        }
    }
}

/// Messages of a successful EPUBCheck run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    messages: Vec<ValidationMessage>,
    output: String,
}

impl ValidationReport {
    fn parse(output: &Output) -> Self {
        let messages = output
            .stdout
            .lines()
            .chain(output.stderr.lines())
            .filter_map(ValidationMessage::parse)
            .collect();
        Self {
            messages,
            output: output.stdout.clone(),
        }
    }

    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages
            .iter()
            .filter(|message| message.severity == Severity::Warning)
    }

    /// `true` when EPUBCheck reported nothing above [`Severity::Info`].
    pub fn is_clean(&self) -> bool {
        self.messages.iter().all(|message| message.severity <= Severity::Info)
    }

    /// The raw standard output.
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Structural facts about an EPUB container, gathered without EPUBCheck.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainerReport {
    /// `mimetype` is the first entry and reads `application/epub+zip`.
    pub mimetype: bool,
    /// The package document named by `META-INF/container.xml`, if present.
    pub package: Option<String>,
    /// The package lists an NCX.
    pub ncx: bool,
    /// The package lists an EPUB 3 navigation document.
    pub nav: bool,
}

impl ContainerReport {
    /// A mimetype, a package document and at least one navigation file.
    pub fn is_valid(&self) -> bool {
        self.mimetype && self.package.is_some() && (self.ncx || self.nav)
    }
}

/// Check the container structure of `epub` directly, for when EPUBCheck
/// is unavailable.
pub fn inspect_container(epub: impl AsRef<Path>) -> BookResult<ContainerReport> {
    let file = File::open(epub.as_ref())?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(from_zip_error)?;
    let mut report = ContainerReport::default();

    if let Ok(mut first) = archive.by_index(0)
        && first.name() == ocf::MIMETYPE
    {
        let mut content = String::new();
        first.read_to_string(&mut content)?;
        report.mimetype = content == mime::EPUB;
    }

    let Some(container) = read_entry(&mut archive, ocf::CONTAINER_PATH)? else {
        return Ok(report);
    };
    let Some(package_path) = root_file(&container)? else {
        return Ok(report);
    };
    let Some(package) = read_entry(&mut archive, &package_path)? else {
        return Ok(report);
    };

    let package = String::from_utf8_lossy(&package);
    report.ncx = package.contains(mime::NCX);
    report.nav = package.contains(r#"properties="nav""#) || package.contains("properties='nav'");
    report.package = Some(package_path);
    Ok(report)
}

fn read_entry<R: Read + std::io::Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> BookResult<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(error) => return Err(from_zip_error(error)),
    };
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

/// The `full-path` of the first `rootfile`.
fn root_file(container: &[u8]) -> BookResult<Option<String>> {
    let mut reader = Reader::from_reader(container);

    loop {
        let el = match reader.read_event()? {
            Event::Start(el) | Event::Empty(el) if el.local_name().as_ref() == ocf::ROOT_FILE.as_bytes() => el,
            Event::Eof => return Ok(None),
            _ => continue,
        };
        if let Some(attribute) = el.try_get_attribute(ocf::FULL_PATH).map_err(quick_xml::Error::from)? {
            return Ok(Some(String::from_utf8_lossy(&attribute.value).into_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message() {
        #[rustfmt::skip]
        let expected = [
            (Some((Severity::Error, Some("RSC-005"), "book.epub/OEBPS/a.xhtml(3,7): bad")), "ERROR(RSC-005): book.epub/OEBPS/a.xhtml(3,7): bad"),
            (Some((Severity::Warning, None, "something odd")), "WARNING: something odd"),
            (None, "Validating using EPUB version 3.3 rules."),
            (None, "No errors or warnings detected."),
        ];

        for (message, line) in expected {
            let parsed = ValidationMessage::parse(line);
            let parsed = parsed
                .as_ref()
                .map(|message| (message.severity, message.code.as_deref(), message.message.as_str()));
            assert_eq!(message, parsed, "{line}");
        }
    }

    #[test]
    fn test_report() {
        let output = Output {
            status: 0,
            stdout: "WARNING(OPF-085): book.epub/OEBPS/book.opf: uuid\nINFO: done\n".to_owned(),
            stderr: String::new(),
        };
        let report = ValidationReport::parse(&output);

        assert_eq!(2, report.messages().len());
        assert_eq!(1, report.warnings().count());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_missing_input() {
        let validator = Validator::with_binary("epubcheck");
        assert!(matches!(
            validator.validate("/nonexistent/book.epub"),
            Err(ToolError::MissingInput(_))
        ));
        assert_eq!(Validator::BINARY_TIMEOUT, validator.timeout());
    }

    #[test]
    fn test_missing_jar() {
        assert!(matches!(
            Validator::with_jar("/nonexistent/epubcheck.jar"),
            Err(ToolError::NotFound(_))
        ));
    }
}

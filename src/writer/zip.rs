use crate::consts::{mime, ocf};
use crate::errors::{BookError, StateError};
use crate::writer::WriterResult;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime as ZipDateTime};

/// How an entry is stored within the container.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Storage {
    /// Uncompressed; required for the `mimetype` entry.
    Stored,
    /// Deflated with the configured compression level.
    #[default]
    Compressed,
}

pub(crate) trait ZipFileOptionsExt {
    fn zip_compression_level(self, level: u8) -> Self;

    fn zip_last_modified_date(self, date: DateTime<Utc>) -> Self;
}

impl ZipFileOptionsExt for SimpleFileOptions {
    fn zip_compression_level(self, level: u8) -> Self {
        if level == 0 {
            self.compression_method(CompressionMethod::Stored)
        } else {
            self.compression_method(CompressionMethod::Deflated)
                .compression_level(Some(level.min(9) as i64))
        }
    }

    fn zip_last_modified_date(self, datetime: DateTime<Utc>) -> Self {
        let datetime = ZipDateTime::from_date_and_time(
            datetime.year().clamp(1980, 2107) as u16,
            datetime.month() as u8,
            datetime.day() as u8,
            datetime.hour() as u8,
            datetime.minute() as u8,
            datetime.second().min(59) as u8,
        )
        .unwrap_or_default();

        self.last_modified_time(datetime)
    }
}

enum State {
    /// No scratch file has been acquired yet.
    Idle,
    Open(zip::ZipWriter<File>),
    Sealed(File),
}

/// EPUB container backed by an anonymous scratch file.
///
/// The scratch file is acquired when the first entry is staged and
/// released when the container is dropped.
pub(crate) struct Container {
    state: State,
    options: SimpleFileOptions,
}

impl Container {
    pub(crate) fn new(compression_level: u8, modified: DateTime<Utc>) -> Self {
        Self {
            state: State::Idle,
            options: SimpleFileOptions::default()
                .zip_compression_level(compression_level)
                .zip_last_modified_date(modified),
        }
    }

    pub(crate) fn is_started(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// Acquire the scratch file and write the mandatory leading entries:
    /// an uncompressed `mimetype` followed by `META-INF/container.xml`.
    pub(crate) fn start(&mut self, container_xml: &[u8]) -> WriterResult<()> {
        if self.is_started() {
            return Ok(());
        }
        let scratch = tempfile::tempfile()?;
        tracing::debug!("acquired scratch container");

        self.state = State::Open(zip::ZipWriter::new(scratch));
        self.add(ocf::MIMETYPE, mime::EPUB.as_bytes(), Storage::Stored)?;
        self.add(ocf::CONTAINER_PATH, container_xml, Storage::Compressed)
    }

    fn writer(&mut self) -> WriterResult<&mut zip::ZipWriter<File>> {
        match &mut self.state {
            State::Open(writer) => Ok(writer),
            State::Sealed(_) => Err(StateError::Finalized.into()),
            State::Idle => Err(BookError::Io(std::io::Error::other(
                "the container has not been started",
            ))),
        }
    }

    fn start_entry(&mut self, name: &str, storage: Storage, large: bool) -> WriterResult<()> {
        let options = match storage {
            // Stored entries must not carry a compression level
            Storage::Stored => self
                .options
                .compression_method(CompressionMethod::Stored)
                .compression_level(None),
            Storage::Compressed => self.options,
        }
        .large_file(large);

        self.writer()?
            // `zip::ZipWriter` does not need the root prefix to specify the container root
            .start_file(name.trim_start_matches('/'), options)
            .map_err(from_zip_error)
    }

    pub(crate) fn add(&mut self, name: &str, data: &[u8], storage: Storage) -> WriterResult<()> {
        self.start_entry(name, storage, data.len() as u64 >= u32::MAX as u64)?;
        self.writer()?.write_all(data)?;
        Ok(())
    }

    /// Stream a file from disk into the container without buffering it whole.
    pub(crate) fn add_file(&mut self, source: &Path, name: &str, storage: Storage) -> WriterResult<u64> {
        let mut file = File::open(source)?;
        let len = file.metadata()?.len();

        self.start_entry(name, storage, len >= u32::MAX as u64)?;
        Ok(std::io::copy(&mut file, self.writer()?)?)
    }

    /// Write the central directory. No entries can be added afterward.
    pub(crate) fn seal(&mut self) -> WriterResult<()> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Open(writer) => {
                let file = writer.finish().map_err(from_zip_error)?;
                self.state = State::Sealed(file);
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// A reader over the sealed archive, positioned at its start.
    pub(crate) fn reader(&self) -> WriterResult<impl Read + '_> {
        let State::Sealed(file) = &self.state else {
            return Err(BookError::Io(std::io::Error::other(
                "the container has not been sealed",
            )));
        };
        let mut file = file;
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }

    pub(crate) fn size(&self) -> WriterResult<u64> {
        match &self.state {
            State::Sealed(file) => Ok(file.metadata()?.len()),
            _ => Ok(0),
        }
    }
}

pub(crate) fn from_zip_error(error: zip::result::ZipError) -> BookError {
    BookError::Io(match error {
        zip::result::ZipError::Io(error) => error,
        error => std::io::Error::other(error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn entry_names(container: &Container) -> Vec<String> {
        let mut bytes = Vec::new();
        container.reader().unwrap().read_to_end(&mut bytes).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        names.sort();
        names
    }

    #[test]
    fn test_mimetype_first_and_stored() {
        let mut container = Container::new(6, Utc::now());
        assert!(!container.is_started());

        container.start(b"<container/>").unwrap();
        container.add("OEBPS/a.txt", b"hello", Storage::Compressed).unwrap();
        container.add("OEBPS/a.png", b"\x89PNG", Storage::Stored).unwrap();
        container.seal().unwrap();

        let mut bytes = Vec::new();
        container.reader().unwrap().read_to_end(&mut bytes).unwrap();
        // The first local file header must name `mimetype`
        assert_eq!(b"mimetype", &bytes[30..38]);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mimetype = archive.by_index(0).unwrap();
        assert_eq!("mimetype", mimetype.name());
        assert_eq!(CompressionMethod::Stored, mimetype.compression());
        drop(mimetype);

        assert_eq!(CompressionMethod::Deflated, archive.by_name("OEBPS/a.txt").unwrap().compression());
        assert_eq!(CompressionMethod::Stored, archive.by_name("OEBPS/a.png").unwrap().compression());
    }

    #[test]
    fn test_sealed_container_rejects_entries() {
        let mut container = Container::new(0, Utc::now());
        container.start(b"<container/>").unwrap();
        container.seal().unwrap();

        assert!(container.is_started());
        assert!(container.add("late.txt", b"x", Storage::Stored).is_err());
        assert_eq!(
            vec!["META-INF/container.xml", "mimetype"],
            entry_names(&container)
        );
    }
}

use crate::book::stage::check_entry;
use crate::book::{Book, Chapter};
use crate::consts::{mime, schema};
use crate::errors::{BookResult, StateError};
use crate::nav::NavHandle;
use crate::package::MetaProperty;
use crate::util::{str as strings, uri};
use std::path::PathBuf;
use std::str::FromStr;

/// A SMIL clock value, in milliseconds.
///
/// Parses full and partial clock values (`1:02:03.5`, `02:03`) and
/// timecounts (`3.5s`, `250ms`, `2min`, `1h`, `90`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockValue(u64);

impl ClockValue {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// `h:mm:ss.fff`
    pub fn to_clock_string(&self) -> String {
        let millis = self.0 % 1000;
        let seconds = self.0 / 1000;
        format!("{}:{:02}:{:02}.{millis:03}", seconds / 3600, seconds / 60 % 60, seconds % 60)
    }
}

impl std::ops::Add for ClockValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for ClockValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |sum, value| sum + value)
    }
}

impl FromStr for ClockValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn seconds(value: &str) -> Option<f64> {
            value.parse::<f64>().ok().filter(|value| value.is_finite() && *value >= 0.0)
        }

        let trimmed = s.trim();
        let error = || format!("invalid clock value: {s}");

        let total_seconds = if trimmed.contains(':') {
            let mut fields: Vec<&str> = trimmed.split(':').collect();
            if fields.len() > 3 {
                return Err(error());
            }
            let last = seconds(fields.pop().ok_or_else(error)?).ok_or_else(error)?;
            fields.iter().rev().enumerate().try_fold(last, |total, (index, field)| {
                let unit = if index == 0 { 60.0 } else { 3600.0 };
                field.parse::<u64>().map(|value| total + value as f64 * unit).map_err(|_| error())
            })?
        } else {
            #[rustfmt::skip]
            const UNITS: &[(&str, f64)] = &[("ms", 0.001), ("min", 60.0), ("h", 3600.0), ("s", 1.0)];

            let (number, factor) = UNITS
                .iter()
                .find_map(|(suffix, factor)| trimmed.strip_suffix(suffix).map(|number| (number, *factor)))
                .unwrap_or((trimmed, 1.0));
            seconds(number.trim()).ok_or_else(error)? * factor
        };

        Ok(Self((total_seconds * 1000.0).round() as u64))
    }
}

/// Where the audio of an overlay comes from.
#[derive(Clone, Debug)]
pub(crate) enum AudioSource {
    Data(Vec<u8>),
    File(PathBuf),
}

/// One synchronized span: a text fragment and the audio interval read with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub(crate) fragment: Option<String>,
    pub(crate) begin: ClockValue,
    pub(crate) end: ClockValue,
}

impl AudioClip {
    /// `fragment` is an anchor id within the chapter; `None` targets the chapter itself.
    pub fn new(fragment: Option<String>, begin: ClockValue, end: ClockValue) -> Self {
        Self { fragment, begin, end }
    }
}

/// Narration synchronized with a chapter (an EPUB 3 media overlay).
///
/// Without explicit clips, a single clip reads the chapter's first
/// anchor for the whole duration.
#[derive(Clone, Debug)]
pub struct AudioOverlay {
    pub(crate) file_name: String,
    pub(crate) media_type: Option<String>,
    pub(crate) source: AudioSource,
    pub(crate) duration: ClockValue,
    pub(crate) clips: Vec<AudioClip>,
}

impl AudioOverlay {
    /// Audio held in memory.
    pub fn new(file_name: impl Into<String>, data: Vec<u8>, duration: ClockValue) -> Self {
        Self::with_source(file_name.into(), AudioSource::Data(data), duration)
    }

    /// Audio streamed from disk when the book is assembled.
    pub fn from_file(path: impl Into<PathBuf>, duration: ClockValue) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::with_source(file_name, AudioSource::File(path), duration)
    }

    fn with_source(file_name: String, source: AudioSource, duration: ClockValue) -> Self {
        Self {
            file_name,
            media_type: None,
            source,
            duration,
            clips: Vec::new(),
        }
    }

    /// Default: derived from the file extension
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn clip(mut self, clip: AudioClip) -> Self {
        self.clips.push(clip);
        self
    }

    pub fn duration(&self) -> ClockValue {
        self.duration
    }
}

/// A media overlay whose SMIL document is written at finalize.
#[derive(Clone, Debug)]
pub(crate) struct PendingOverlay {
    pub(crate) smil_id: String,
    /// Root-relative.
    pub(crate) smil_href: String,
    pub(crate) duration: ClockValue,
    /// The chapter, relative to the SMIL document.
    pub(crate) textref: String,
    pub(crate) clips: Vec<PendingClip>,
}

/// A clip with its hrefs relative to the SMIL document.
#[derive(Clone, Debug)]
pub(crate) struct PendingClip {
    pub(crate) text: String,
    pub(crate) audio: String,
    pub(crate) begin: String,
    pub(crate) end: String,
}

const SMIL_DIR: &str = "smil";
const AUDIO_DIR: &str = "audio";

impl Book {
    /// Add a chapter narrated by `overlay`.
    ///
    /// The audio is stored under `audio/` and its SMIL document under
    /// `smil/`, written at finalize. Only EPUB 3 supports media overlays.
    pub fn add_chapter_with_audio(&mut self, chapter: Chapter, overlay: AudioOverlay) -> BookResult<NavHandle> {
        self.ensure_open()?;
        if self.options.version.is_legacy() {
            return Err(StateError::RequiresModernVersion.into());
        }

        let number = self.overlays.len() + 1;
        let audio_id = format!("audio_{number}");
        let smil_id = format!("smil_{number}");

        let media_type = overlay
            .media_type
            .clone()
            .or_else(|| mime::from_path(&overlay.file_name).map(str::to_owned))
            .unwrap_or_else(|| mime::OCTET_STREAM.to_owned());
        let name = match strings::sanitize_file_name(uri::file_name(&overlay.file_name.replace('\\', "/"))) {
            name if name.is_empty() => format!("{audio_id}.audio"),
            name => name,
        };
        let audio_href = format!("{AUDIO_DIR}/{name}");
        let smil_href = format!("{SMIL_DIR}/{}.smil", uri::split_extension(&name).0);

        // Both entries are checked before the chapter is added
        check_entry(&self.root, &self.sources, &self.package.manifest, &audio_href, &audio_id)?;
        check_entry(&self.root, &self.sources, &self.package.manifest, &smil_href, &smil_id)?;
        if self.overlays.iter().any(|pending| pending.smil_href == smil_href) {
            return Err(StateError::DuplicateHref(smil_href).into());
        }

        let handle = self.add_chapter(chapter)?;
        let chapter_href = self
            .nav
            .point(handle)
            .src()
            .map(|src| src.split('#').next().unwrap_or(src).to_owned())
            .unwrap_or_default();

        let mut stage = self.stage();
        match &overlay.source {
            AudioSource::Data(data) => stage.add(&audio_href, &audio_id, data, &media_type, &overlay.file_name)?,
            AudioSource::File(path) => stage.add_file(&audio_href, &audio_id, path, &media_type)?,
        };

        let first_anchor = match self.package.manifest.by_href_mut(&chapter_href) {
            Some(item) => {
                item.set_media_overlay(&smil_id);
                item.index_points().first().cloned()
            }
            None => None,
        };

        let clips = match overlay.clips.as_slice() {
            [] => vec![AudioClip::new(first_anchor, ClockValue::default(), overlay.duration)],
            clips => clips.to_vec(),
        };
        let audio_src = uri::relativize(SMIL_DIR, &audio_href);
        let clips = clips
            .into_iter()
            .map(|clip| {
                let target = match &clip.fragment {
                    Some(fragment) => format!("{chapter_href}#{fragment}"),
                    None => chapter_href.clone(),
                };
                PendingClip {
                    text: uri::relativize(SMIL_DIR, &target),
                    audio: audio_src.clone(),
                    begin: clip.begin.to_clock_string(),
                    end: clip.end.to_clock_string(),
                }
            })
            .collect();

        self.package.metadata.add_property(
            MetaProperty::new(schema::MEDIA_DURATION, overlay.duration.to_clock_string()).refining(&smil_id),
        );
        self.overlays.push(PendingOverlay {
            smil_id,
            textref: uri::relativize(SMIL_DIR, &chapter_href),
            smil_href,
            duration: overlay.duration,
            clips,
        });
        tracing::debug!(audio = %audio_href, "added media overlay");
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookOptions;
    use crate::errors::BookError;
    use crate::version::EpubVersion;

    #[test]
    fn test_parse_clock_value() {
        #[rustfmt::skip]
        let expected = [
            (Some(3_723_500), "1:02:03.5"),
            (Some(123_000), "02:03"),
            (Some(3_500), "3.5s"),
            (Some(250), "250ms"),
            (Some(120_000), "2min"),
            (Some(3_600_000), "1h"),
            (Some(90_000), "90"),
            (None, "1:2:3:4"),
            (None, "-5s"),
            (None, "soon"),
        ];

        for (millis, input) in expected {
            let parsed = input.parse::<ClockValue>().ok().map(|value| value.as_millis());
            assert_eq!(millis, parsed, "{input}");
        }
    }

    #[test]
    fn test_clock_string() {
        #[rustfmt::skip]
        let expected = [
            ("0:00:00.000", 0),
            ("0:01:05.250", 65_250),
            ("2:00:00.001", 7_200_001),
        ];

        for (clock, millis) in expected {
            assert_eq!(clock, ClockValue::from_millis(millis).to_clock_string());
        }
        let total: ClockValue = [ClockValue::from_millis(500), ClockValue::from_millis(1_500)].into_iter().sum();
        assert_eq!(2_000, total.as_millis());
    }

    #[test]
    fn test_chapter_with_audio() {
        let mut book = Book::default();
        let chapter = Chapter::new("Chapter 1", "Text/chapter1.xhtml").content("<p id=\"p1\">Call me Ishmael.</p>");
        let overlay = AudioOverlay::new("Chapter 1.mp3", vec![0; 16], ClockValue::from_millis(65_250));
        book.add_chapter_with_audio(chapter, overlay).unwrap();

        let manifest = book.package().manifest();
        let audio = manifest.by_id("audio_1").unwrap();
        assert_eq!("audio/Chapter-1.mp3", audio.href());
        assert_eq!("audio/mpeg", audio.media_type());
        assert_eq!(Some("smil_1"), manifest.by_id("chapter1").and_then(|item| item.media_overlay()));

        let duration = book.package().metadata().property("media:duration").unwrap();
        assert_eq!("0:01:05.250", duration.value());
        assert_eq!(Some("#smil_1"), duration.refines());

        let pending = &book.overlays[0];
        assert_eq!("smil/Chapter-1.smil", pending.smil_href);
        assert_eq!("../Text/chapter1.xhtml", pending.textref);
        assert_eq!("../Text/chapter1.xhtml#p1", pending.clips[0].text);
        assert_eq!("../audio/Chapter-1.mp3", pending.clips[0].audio);
    }

    #[test]
    fn test_audio_requires_modern_version() {
        let mut book = Book::new(BookOptions::default().version(EpubVersion::Epub2));
        let result = book.add_chapter_with_audio(
            Chapter::new("Chapter 1", "chapter1.xhtml").content("<p>Text</p>"),
            AudioOverlay::new("a.mp3", Vec::new(), ClockValue::default()),
        );
        assert!(matches!(result, Err(BookError::State(StateError::RequiresModernVersion))));
        assert!(book.package().manifest().is_empty());
    }
}

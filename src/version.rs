use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The EPUB version a [`Book`](crate::Book) is serialized as.
///
/// [`Epub2`](EpubVersion::Epub2) is the *legacy* version, all others form the
/// *modern* family and share EPUB 3 serialization rules.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EpubVersion {
    /// EPUB 2.0.1
    Epub2,
    /// EPUB 3.0
    #[default]
    Epub3,
    /// EPUB 3.0.1
    Epub301,
    /// EPUB 3.1
    Epub31,
    /// EPUB 3.2
    Epub32,
}

impl EpubVersion {
    /// The value of the package `version` attribute.
    ///
    /// EPUB 3.0.1 and 3.2 packages declare `3.0`, as their specifications require.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Epub2 => "2.0",
            Self::Epub3 | Self::Epub301 | Self::Epub32 => "3.0",
            Self::Epub31 => "3.1",
        }
    }

    /// `true` for EPUB 2 output.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Epub2)
    }

    /// `true` for any EPUB 3 output.
    pub fn is_modern(&self) -> bool {
        !self.is_legacy()
    }
}

impl Display for EpubVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Epub2 => "2.0",
            Self::Epub3 => "3.0",
            Self::Epub301 => "3.0.1",
            Self::Epub31 => "3.1",
            Self::Epub32 => "3.2",
        };
        f.write_str(name)
    }
}

impl FromStr for EpubVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "2" | "2.0" | "2.0.1" => Ok(Self::Epub2),
            "3" | "3.0" => Ok(Self::Epub3),
            "3.0.1" => Ok(Self::Epub301),
            "3.1" => Ok(Self::Epub31),
            "3.2" => Ok(Self::Epub32),
            other => Err(format!("unsupported EPUB version: {other}")),
        }
    }
}

/// The reading direction of a book's text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EpubVersion;

    #[test]
    fn test_version_attribute() {
        #[rustfmt::skip]
        let expected = [
            ("2.0", true, EpubVersion::Epub2),
            ("3.0", false, EpubVersion::Epub3),
            ("3.0", false, EpubVersion::Epub301),
            ("3.1", false, EpubVersion::Epub31),
            ("3.0", false, EpubVersion::Epub32),
        ];

        for (attribute, legacy, version) in expected {
            assert_eq!(attribute, version.as_str());
            assert_eq!(legacy, version.is_legacy());
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Ok(EpubVersion::Epub2), "2.0".parse());
        assert_eq!(Ok(EpubVersion::Epub301), "v3.0.1".parse());
        assert!("4".parse::<EpubVersion>().is_err());
    }
}

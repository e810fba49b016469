use crate::consts::rendition;
use std::str::FromStr;

/// Whether content reflows or is laid out page by page (`rendition:layout`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    Reflowable,
    PrePaginated,
}

/// Orientation the book is intended for (`rendition:orientation`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Auto,
    Landscape,
    Portrait,
}

/// When pages are shown side by side (`rendition:spread`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Spread {
    None,
    Auto,
    Landscape,
    Portrait,
    Both,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reflowable => "reflowable",
            Self::PrePaginated => "pre-paginated",
        }
    }
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }
}

impl Spread {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Auto => "auto",
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Both => "both",
        }
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "reflowable" => Ok(Self::Reflowable),
            "pre-paginated" => Ok(Self::PrePaginated),
            other => Err(format!("unknown rendition layout: {other}")),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(Self::Auto),
            "landscape" => Ok(Self::Landscape),
            "portrait" => Ok(Self::Portrait),
            other => Err(format!("unknown rendition orientation: {other}")),
        }
    }
}

impl FromStr for Spread {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(Self::None),
            "auto" => Ok(Self::Auto),
            "landscape" => Ok(Self::Landscape),
            "portrait" => Ok(Self::Portrait),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown rendition spread: {other}")),
        }
    }
}

/// Fixed-layout rendition properties of an EPUB 3 book.
///
/// EPUB 2 has no rendition vocabulary, so legacy output leaves them out.
///
/// # Examples
/// ```
/// # use bindery::{Layout, Rendition, Spread};
/// let rendition = Rendition::default()
///     .layout(Layout::PrePaginated)
///     .spread(Spread::None);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rendition {
    pub(crate) layout: Option<Layout>,
    pub(crate) orientation: Option<Orientation>,
    pub(crate) spread: Option<Spread>,
}

impl Rendition {
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn spread(mut self, spread: Spread) -> Self {
        self.spread = Some(spread);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_none() && self.orientation.is_none() && self.spread.is_none()
    }

    /// The `<meta property>` entries to write, in vocabulary order.
    pub(crate) fn properties(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        [
            self.layout.map(|layout| (rendition::LAYOUT, layout.as_str())),
            self.orientation
                .map(|orientation| (rendition::ORIENTATION, orientation.as_str())),
            self.spread.map(|spread| (rendition::SPREAD, spread.as_str())),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties() {
        let rendition = Rendition::default()
            .layout(Layout::PrePaginated)
            .spread(Spread::Both);

        assert_eq!(
            vec![("rendition:layout", "pre-paginated"), ("rendition:spread", "both")],
            rendition.properties().collect::<Vec<_>>()
        );
        assert!(Rendition::default().is_empty());
        assert_eq!(0, Rendition::default().properties().count());
    }

    #[test]
    fn test_closed_values() {
        assert_eq!(Ok(Layout::Reflowable), "reflowable".parse());
        assert_eq!(Ok(Orientation::Portrait), " portrait ".parse());
        assert_eq!(Ok(Spread::None), "none".parse());
        assert!("fixed".parse::<Layout>().is_err());
        assert!("sideways".parse::<Orientation>().is_err());
        assert!("all".parse::<Spread>().is_err());
    }
}

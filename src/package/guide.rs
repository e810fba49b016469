use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Structural component types of a book, shared by the EPUB 2 guide and
/// the EPUB 3 landmarks navigation.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    Cover,
    TitlePage,
    Acknowledgements,
    Bibliography,
    Colophon,
    CopyrightPage,
    Dedication,
    Epigraph,
    Foreword,
    Toc,
    Notes,
    Preface,
    /// The first page of the main text.
    Text,
    ListOfIllustrations,
    ListOfTables,
    Glossary,
    Index,
    Frontmatter,
    Bodymatter,
    Backmatter,
}

impl ReferenceType {
    /// The EPUB 2 guide `type` value.
    pub fn guide_type(&self) -> &'static str {
        match self {
            Self::Cover => "cover",
            Self::TitlePage => "title-page",
            Self::Acknowledgements => "acknowledgements",
            Self::Bibliography => "bibliography",
            Self::Colophon => "colophon",
            Self::CopyrightPage => "copyright-page",
            Self::Dedication => "dedication",
            Self::Epigraph => "epigraph",
            Self::Foreword => "foreword",
            Self::Toc => "toc",
            Self::Notes => "notes",
            Self::Preface => "preface",
            Self::Text => "text",
            Self::ListOfIllustrations => "loi",
            Self::ListOfTables => "lot",
            Self::Glossary => "glossary",
            Self::Index => "index",
            // Non-standard guide types must use the `other.` prefix
            Self::Frontmatter => "other.frontmatter",
            Self::Bodymatter => "other.bodymatter",
            Self::Backmatter => "other.backmatter",
        }
    }

    /// The EPUB 3 structural semantics (`epub:type`) value used by landmarks.
    pub fn landmark_type(&self) -> &'static str {
        match self {
            Self::TitlePage => "titlepage",
            Self::Acknowledgements => "acknowledgments",
            Self::Notes => "endnotes",
            Self::Text | Self::Bodymatter => "bodymatter",
            Self::Frontmatter => "frontmatter",
            Self::Backmatter => "backmatter",
            other => other.guide_type(),
        }
    }

    /// Suffix of manifest ids generated for reference pages (`ref_{suffix}`).
    pub(crate) fn id_suffix(&self) -> &'static str {
        self.guide_type().trim_start_matches("other.")
    }
}

impl Display for ReferenceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.guide_type())
    }
}

impl FromStr for ReferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().trim_start_matches("other.") {
            "cover" => Self::Cover,
            "title-page" | "titlepage" => Self::TitlePage,
            "acknowledgements" | "acknowledgments" => Self::Acknowledgements,
            "bibliography" => Self::Bibliography,
            "colophon" => Self::Colophon,
            "copyright-page" => Self::CopyrightPage,
            "dedication" => Self::Dedication,
            "epigraph" => Self::Epigraph,
            "foreword" => Self::Foreword,
            "toc" => Self::Toc,
            "notes" | "endnotes" => Self::Notes,
            "preface" => Self::Preface,
            "text" => Self::Text,
            "loi" => Self::ListOfIllustrations,
            "lot" => Self::ListOfTables,
            "glossary" => Self::Glossary,
            "index" => Self::Index,
            "frontmatter" => Self::Frontmatter,
            "bodymatter" => Self::Bodymatter,
            "backmatter" => Self::Backmatter,
            other => return Err(format!("unknown reference type: {other}")),
        };
        Ok(kind)
    }
}

/// A `<reference>` within the EPUB 2 guide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuideReference {
    kind: ReferenceType,
    title: String,
    href: String,
}

impl GuideReference {
    pub fn kind(&self) -> ReferenceType {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn href(&self) -> &str {
        &self.href
    }
}

/// The `<guide>` element. Omitted from the package when empty.
#[derive(Clone, Debug, Default)]
pub struct Guide {
    references: Vec<GuideReference>,
}

impl Guide {
    /// Append a reference.
    ///
    /// A table of contents reference is only accepted once;
    /// returns `false` when one exists already.
    pub fn add_reference(
        &mut self,
        kind: ReferenceType,
        title: impl Into<String>,
        href: impl Into<String>,
    ) -> bool {
        if kind == ReferenceType::Toc && self.by_type(ReferenceType::Toc).is_some() {
            return false;
        }
        self.references.push(GuideReference {
            kind,
            title: title.into(),
            href: href.into(),
        });
        true
    }

    pub fn by_type(&self, kind: ReferenceType) -> Option<&GuideReference> {
        self.references.iter().find(|reference| reference.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GuideReference> {
        self.references.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// The order in which reference pages appear in generated tables of
/// contents and landmarks, with the default title of each.
///
/// The [`ReferenceType::Text`] slot stands for the chapter list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceOrder(Vec<(ReferenceType, String)>);

impl ReferenceOrder {
    pub fn new(order: impl IntoIterator<Item = (ReferenceType, String)>) -> Self {
        Self(order.into_iter().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReferenceType, &str)> {
        self.0.iter().map(|(kind, title)| (*kind, title.as_str()))
    }

    pub fn title(&self, kind: ReferenceType) -> Option<&str> {
        self.iter().find(|(k, _)| *k == kind).map(|(_, title)| title)
    }
}

impl Default for ReferenceOrder {
    fn default() -> Self {
        use ReferenceType::*;

        #[rustfmt::skip]
        let order = [
            (Cover, "Cover Page"),
            (TitlePage, "Title Page"),
            (Acknowledgements, "Acknowledgements"),
            (Bibliography, "Bibliography"),
            (Colophon, "Colophon"),
            (CopyrightPage, "Copyright"),
            (Dedication, "Dedication"),
            (Epigraph, "Epigraph"),
            (Foreword, "Foreword"),
            (Toc, "Table of Contents"),
            (Notes, "Notes"),
            (Preface, "Preface"),
            (Text, "First Page"),
            (ListOfIllustrations, "List of Illustrations"),
            (ListOfTables, "List of Tables"),
            (Glossary, "Glossary"),
            (Index, "Index"),
        ];

        Self::new(order.into_iter().map(|(kind, title)| (kind, title.to_owned())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_toc_reference() {
        let mut guide = Guide::default();
        assert!(guide.is_empty());
        assert!(guide.add_reference(ReferenceType::Toc, "Contents", "TOC.xhtml"));
        assert!(!guide.add_reference(ReferenceType::Toc, "Contents 2", "TOC2.xhtml"));
        assert!(guide.add_reference(ReferenceType::Text, "Begin", "c1.xhtml"));

        assert_eq!(Some("TOC.xhtml"), guide.by_type(ReferenceType::Toc).map(GuideReference::href));
        assert_eq!(2, guide.iter().count());
    }

    #[test]
    fn test_vocabularies() {
        #[rustfmt::skip]
        let expected = [
            ("title-page", "titlepage", "title-page", ReferenceType::TitlePage),
            ("text", "bodymatter", "text", ReferenceType::Text),
            ("acknowledgements", "acknowledgments", "acknowledgements", ReferenceType::Acknowledgements),
            ("other.frontmatter", "frontmatter", "frontmatter", ReferenceType::Frontmatter),
            ("loi", "loi", "loi", ReferenceType::ListOfIllustrations),
        ];

        for (guide, landmark, suffix, kind) in expected {
            assert_eq!(guide, kind.guide_type());
            assert_eq!(landmark, kind.landmark_type());
            assert_eq!(suffix, kind.id_suffix());
            assert_eq!(Ok(kind), guide.parse());
        }
    }

    #[test]
    fn test_default_order() {
        let order = ReferenceOrder::default();
        assert_eq!(Some(ReferenceType::Cover), order.iter().next().map(|(kind, _)| kind));
        assert_eq!(Some("First Page"), order.title(ReferenceType::Text));
    }
}

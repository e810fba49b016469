use crate::consts::dc;

/// The fifteen Dublin Core elements permitted within `<metadata>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DublinCore {
    Contributor,
    Coverage,
    Creator,
    Date,
    Description,
    Format,
    Identifier,
    Language,
    Publisher,
    Relation,
    Rights,
    Source,
    Subject,
    Title,
    Type,
}

impl DublinCore {
    /// The qualified element name (e.g., `dc:title`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contributor => dc::CONTRIBUTOR,
            Self::Coverage => dc::COVERAGE,
            Self::Creator => dc::CREATOR,
            Self::Date => dc::DATE,
            Self::Description => dc::DESCRIPTION,
            Self::Format => "dc:format",
            Self::Identifier => dc::IDENTIFIER,
            Self::Language => dc::LANGUAGE,
            Self::Publisher => dc::PUBLISHER,
            Self::Relation => dc::RELATION,
            Self::Rights => dc::RIGHTS,
            Self::Source => dc::SOURCE,
            Self::Subject => dc::SUBJECT,
            Self::Title => dc::TITLE,
            Self::Type => "dc:type",
        }
    }
}

/// A metadata element with a text value, such as `<dc:creator>`.
///
/// Attributes are written verbatim, while *opf attributes* (`file-as`,
/// `role`, `scheme`, `event`, ...) depend on the output version:
/// - EPUB 2: written as `opf:{name}` attributes.
/// - EPUB 3: `file-as` and `role` become `refines` meta properties;
///   the remaining opf attributes are dropped.
///
/// # Examples
/// ```
/// # use bindery::package::MetaValue;
/// let creator = MetaValue::new("dc:creator", "Jane Doe")
///     .with_attribute("id", "creator-1")
///     .with_opf_attribute("file-as", "Doe, Jane")
///     .with_opf_attribute("role", "aut");
///
/// assert_eq!(Some("Doe, Jane"), creator.opf_attribute("file-as"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaValue {
    name: String,
    value: String,
    attributes: Vec<(String, String)>,
    opf_attributes: Vec<(String, String)>,
}

impl MetaValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: Vec::new(),
            opf_attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set(&mut self.attributes, name.into(), value.into());
        self
    }

    /// Sets an opf attribute; the `opf:` prefix is optional.
    pub fn with_opf_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.strip_prefix("opf:").map(str::to_owned).unwrap_or(name);
        set(&mut self.opf_attributes, name, value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        get(&self.attributes, name)
    }

    pub fn opf_attribute(&self, name: &str) -> Option<&str> {
        get(&self.opf_attributes, name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn opf_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.opf_attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_dublin_core(&self) -> bool {
        self.name.starts_with(dc::PREFIX)
    }
}

/// An EPUB 3 `<meta property="...">value</meta>` entry.
///
/// For EPUB 2 output, properties without `refines` are written as
/// `<meta name="..." content="..."/>` and refining properties are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaProperty {
    property: String,
    value: String,
    refines: Option<String>,
    scheme: Option<String>,
}

impl MetaProperty {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            refines: None,
            scheme: None,
        }
    }

    /// Refine another element; a leading `#` is added if missing.
    pub fn refining(mut self, id: &str) -> Self {
        let id = id.trim_start_matches('#');
        self.refines = Some(format!("#{id}"));
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn refines(&self) -> Option<&str> {
        self.refines.as_deref()
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }
}

/// The `<metadata>` element of the package document.
///
/// Holds three groups, serialized in this order: Dublin Core values,
/// meta properties and named metas.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    values: Vec<MetaValue>,
    properties: Vec<MetaProperty>,
    metas: Vec<(String, String)>,
}

impl Metadata {
    /// Append a metadata value. Values are never de-duplicated.
    pub fn add_value(&mut self, value: MetaValue) {
        self.values.push(value);
    }

    /// Append a meta property unless an identical one
    /// (property, value and refines) exists already.
    ///
    /// Returns `false` if the property was a duplicate.
    pub fn add_property(&mut self, property: MetaProperty) -> bool {
        let duplicate = self.properties.iter().any(|existing| {
            existing.property == property.property
                && existing.value == property.value
                && existing.refines == property.refines
        });
        if !duplicate {
            self.properties.push(property);
        }
        !duplicate
    }

    /// Append `<meta name="{name}" content="{content}"/>`.
    pub fn add_meta(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.metas.push((name.into(), content.into()));
    }

    pub fn values(&self) -> &[MetaValue] {
        &self.values
    }

    pub fn properties(&self) -> &[MetaProperty] {
        &self.properties
    }

    pub fn metas(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metas.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The first value with the given element name (e.g., `dc:title`).
    pub fn value(&self, name: &str) -> Option<&MetaValue> {
        self.values.iter().find(|value| value.name == name)
    }

    pub fn values_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaValue> + 'a {
        self.values.iter().filter(move |value| value.name == name)
    }

    /// The first non-refining property with the given name.
    pub fn property(&self, property: &str) -> Option<&MetaProperty> {
        self.properties
            .iter()
            .find(|entry| entry.property == property && entry.refines.is_none())
    }

    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, content)| content.as_str())
    }

    pub fn has_dublin_core(&self) -> bool {
        self.values.iter().any(MetaValue::is_dublin_core)
    }
}

fn set(entries: &mut Vec<(String, String)>, name: String, value: String) {
    match entries.iter_mut().find(|(key, _)| *key == name) {
        Some((_, existing)) => *existing = value,
        None => entries.push((name, value)),
    }
}

fn get<'a>(entries: &'a [(String, String)], name: &str) -> Option<&'a str> {
    entries
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_deduplication() {
        let mut metadata = Metadata::default();

        #[rustfmt::skip]
        let expected = [
            (true, MetaProperty::new("schema:accessMode", "textual")),
            (false, MetaProperty::new("schema:accessMode", "textual")),
            (true, MetaProperty::new("schema:accessMode", "visual")),
            (true, MetaProperty::new("media:duration", "0:10:00").refining("smil_1")),
            (true, MetaProperty::new("media:duration", "0:10:00")),
            (false, MetaProperty::new("media:duration", "0:10:00").refining("#smil_1")),
        ];

        for (added, property) in expected {
            assert_eq!(added, metadata.add_property(property));
        }
        assert_eq!(4, metadata.properties().len());
    }

    #[test]
    fn test_values_are_append_only() {
        let mut metadata = Metadata::default();
        metadata.add_value(MetaValue::new(dc::SUBJECT, "Fiction"));
        metadata.add_value(MetaValue::new(dc::SUBJECT, "Fiction"));
        metadata.add_meta("cover", "CoverImage");

        assert_eq!(2, metadata.values_named(dc::SUBJECT).count());
        assert_eq!(Some("CoverImage"), metadata.meta("cover"));
        assert!(metadata.has_dublin_core());
    }

    #[test]
    fn test_opf_attribute_prefix() {
        let value = MetaValue::new(dc::IDENTIFIER, "urn:isbn:123")
            .with_opf_attribute("opf:scheme", "ISBN")
            .with_opf_attribute("scheme", "ISBN");

        assert_eq!(vec![("scheme", "ISBN")], value.opf_attributes().collect::<Vec<_>>());
    }
}

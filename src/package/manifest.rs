/// A `<manifest>` item: one resource of the package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: Vec<String>,
    media_overlay: Option<String>,
    fallback: Option<String>,
    fallback_style: Option<String>,
    required_namespace: Option<String>,
    required_modules: Option<String>,
    index_points: Vec<String>,
}

impl ManifestItem {
    /// Create an item; `href` is relative to the package document.
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            properties: Vec::new(),
            media_overlay: None,
            fallback: None,
            fallback_style: None,
            required_namespace: None,
            required_modules: None,
            index_points: Vec::new(),
        }
    }

    /// Add a space-separated property (e.g., `nav`, `cover-image`).
    /// Properties are written for EPUB 3 output only.
    pub fn with_property(mut self, property: &str) -> Self {
        self.add_property(property);
        self
    }

    pub fn with_fallback(mut self, id: impl Into<String>) -> Self {
        self.fallback = Some(id.into());
        self
    }

    pub fn with_fallback_style(mut self, id: impl Into<String>) -> Self {
        self.fallback_style = Some(id.into());
        self
    }

    pub fn with_required_namespace(
        mut self,
        namespace: impl Into<String>,
        modules: Option<String>,
    ) -> Self {
        self.required_namespace = Some(namespace.into());
        self.required_modules = modules;
        self
    }

    pub(crate) fn add_property(&mut self, property: &str) {
        for property in property.split_whitespace() {
            if !self.properties.iter().any(|existing| existing == property) {
                self.properties.push(property.to_owned());
            }
        }
    }

    pub(crate) fn set_media_overlay(&mut self, id: impl Into<String>) {
        self.media_overlay = Some(id.into());
    }

    pub(crate) fn set_index_points(&mut self, ids: Vec<String>) {
        self.index_points = ids;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The properties joined by spaces, if any.
    pub fn properties(&self) -> Option<String> {
        (!self.properties.is_empty()).then(|| self.properties.join(" "))
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.iter().any(|existing| existing == property)
    }

    pub fn media_overlay(&self) -> Option<&str> {
        self.media_overlay.as_deref()
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    pub fn fallback_style(&self) -> Option<&str> {
        self.fallback_style.as_deref()
    }

    pub fn required_namespace(&self) -> Option<&str> {
        self.required_namespace.as_deref()
    }

    pub fn required_modules(&self) -> Option<&str> {
        self.required_modules.as_deref()
    }

    /// Anchor ids declared in the item's content.
    pub fn index_points(&self) -> &[String] {
        &self.index_points
    }

    pub fn has_index_point(&self, id: &str) -> bool {
        self.index_points.iter().any(|point| point == id)
    }
}

/// The `<manifest>` element: every resource of the package, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    items: Vec<ManifestItem>,
}

impl Manifest {
    /// Append an item.
    ///
    /// Items missing an id, href or media type are ignored, as are
    /// items whose id or href is already taken.
    /// Returns `true` if the item was added.
    pub fn add_item(&mut self, item: ManifestItem) -> bool {
        let incomplete =
            item.id.trim().is_empty() || item.href.trim().is_empty() || item.media_type.trim().is_empty();
        if incomplete || self.by_id(&item.id).is_some() || self.by_href(&item.href).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub(crate) fn by_id_mut(&mut self, id: &str) -> Option<&mut ManifestItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    pub fn by_href(&self, href: &str) -> Option<&ManifestItem> {
        self.items.iter().find(|item| item.href == href)
    }

    pub(crate) fn by_href_mut(&mut self, href: &str) -> Option<&mut ManifestItem> {
        self.items.iter_mut().find(|item| item.href == href)
    }

    /// All items whose href starts with `prefix`, in insertion order.
    pub fn by_href_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a ManifestItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.href.starts_with(prefix))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestItem;
    type IntoIter = std::slice::Iter<'a, ManifestItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item() {
        let mut manifest = Manifest::default();

        #[rustfmt::skip]
        let expected = [
            (true, ManifestItem::new("c1", "text/c1.xhtml", "application/xhtml+xml")),
            (false, ManifestItem::new("c1", "text/other.xhtml", "application/xhtml+xml")),
            (false, ManifestItem::new("c2", "text/c1.xhtml", "application/xhtml+xml")),
            (false, ManifestItem::new("", "text/c3.xhtml", "application/xhtml+xml")),
            (false, ManifestItem::new("c4", "", "application/xhtml+xml")),
            (false, ManifestItem::new("c5", "c5.xhtml", " ")),
            (true, ManifestItem::new("c6", "text/c6.xhtml", "application/xhtml+xml")),
        ];

        for (added, item) in expected {
            assert_eq!(added, manifest.add_item(item));
        }
        assert_eq!(2, manifest.len());
    }

    #[test]
    fn test_lookup() {
        let mut manifest = Manifest::default();
        manifest.add_item(ManifestItem::new("part_1", "text/part_1.xhtml", "application/xhtml+xml"));
        manifest.add_item(ManifestItem::new("part_2", "text/part_2.xhtml", "application/xhtml+xml"));
        manifest.add_item(ManifestItem::new("css", "Styles/a.css", "text/css"));

        assert_eq!(Some("text/part_2.xhtml"), manifest.by_id("part_2").map(ManifestItem::href));
        assert_eq!(Some("css"), manifest.by_href("Styles/a.css").map(ManifestItem::id));
        assert_eq!(2, manifest.by_href_prefix("text/part").count());
    }

    #[test]
    fn test_properties() {
        let item = ManifestItem::new("toc", "nav.xhtml", "application/xhtml+xml")
            .with_property("nav")
            .with_property("nav scripted");

        assert_eq!(Some("nav scripted".into()), item.properties());
        assert!(item.has_property("scripted"));
    }
}

/// Custom XML namespaces (`xmlns:*` on the package element) and
/// EPUB 3 metadata vocabularies (the package `prefix` attribute).
///
/// The first registration of a name wins; later registrations of the
/// same name are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceRegistry {
    namespaces: Vec<(String, String)>,
    prefixes: Vec<(String, String)>,
}

impl NamespaceRegistry {
    /// Register `xmlns:{name}="{uri}"`.
    ///
    /// Returns `false` if the name was already registered.
    pub fn add_namespace(&mut self, name: impl Into<String>, uri: impl Into<String>) -> bool {
        insert_first(&mut self.namespaces, name.into(), uri.into())
    }

    /// Register `{name}: {uri}` within the package `prefix` attribute.
    ///
    /// Returns `false` if the name was already registered.
    pub fn add_prefix(&mut self, name: impl Into<String>, uri: impl Into<String>) -> bool {
        insert_first(&mut self.prefixes, name.into(), uri.into())
    }

    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> {
        self.namespaces
            .iter()
            .map(|(name, uri)| (name.as_str(), uri.as_str()))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(name, uri)| (name.as_str(), uri.as_str()))
    }

    /// The serialized `prefix` attribute value, if any prefix is registered.
    pub fn prefix_attribute(&self) -> Option<String> {
        if self.prefixes.is_empty() {
            return None;
        }
        let value = self
            .prefixes
            .iter()
            .map(|(name, uri)| format!("{name}: {uri}"))
            .collect::<Vec<_>>()
            .join(" ");
        Some(value)
    }
}

fn insert_first(entries: &mut Vec<(String, String)>, name: String, uri: String) -> bool {
    let name = name.trim().trim_end_matches(':').to_owned();
    if name.is_empty() || entries.iter().any(|(existing, _)| *existing == name) {
        return false;
    }
    entries.push((name, uri));
    true
}

#[cfg(test)]
mod tests {
    use super::NamespaceRegistry;

    #[test]
    fn test_first_registration_wins() {
        let mut registry = NamespaceRegistry::default();
        assert!(registry.add_namespace("calibre", "http://calibre.kovidgoyal.net/2009/metadata"));
        assert!(!registry.add_namespace("calibre", "http://example.org/other"));

        assert_eq!(
            vec![("calibre", "http://calibre.kovidgoyal.net/2009/metadata")],
            registry.namespaces().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_prefix_attribute() {
        let mut registry = NamespaceRegistry::default();
        assert_eq!(None, registry.prefix_attribute());

        registry.add_prefix("rendition:", "http://www.idpf.org/vocab/rendition/#");
        registry.add_prefix("schema", "http://schema.org/");
        assert_eq!(
            Some("rendition: http://www.idpf.org/vocab/rendition/# schema: http://schema.org/".into()),
            registry.prefix_attribute()
        );
    }
}

/// An `<itemref>` within the spine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpineEntry {
    idref: String,
    linear: bool,
}

impl SpineEntry {
    pub fn idref(&self) -> &str {
        &self.idref
    }

    /// `false` for auxiliary content, written as `linear="no"`.
    pub fn is_linear(&self) -> bool {
        self.linear
    }
}

/// The reading order: manifest ids, each at most once, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Spine {
    entries: Vec<SpineEntry>,
}

impl Spine {
    /// Append an itemref. Re-adding an existing idref is a no-op.
    ///
    /// Returns `true` if the entry was added.
    pub fn add_itemref(&mut self, idref: impl Into<String>, linear: bool) -> bool {
        let idref = idref.into();
        if idref.is_empty() || self.contains(&idref) {
            return false;
        }
        self.entries.push(SpineEntry { idref, linear });
        true
    }

    pub fn contains(&self, idref: &str) -> bool {
        self.entries.iter().any(|entry| entry.idref == idref)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpineEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Spine {
    type Item = &'a SpineEntry;
    type IntoIter = std::slice::Iter<'a, SpineEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

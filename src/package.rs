//! The in-memory package document (`.opf`) model.

mod guide;
mod manifest;
mod metadata;
mod namespace;
mod spine;

pub use self::guide::{Guide, GuideReference, ReferenceOrder, ReferenceType};
pub use self::manifest::{Manifest, ManifestItem};
pub use self::metadata::{DublinCore, MetaProperty, MetaValue, Metadata};
pub use self::namespace::NamespaceRegistry;
pub use self::spine::{Spine, SpineEntry};

use crate::errors::StateError;
use crate::version::{EpubVersion, TextDirection};

/// The package document of a [`Book`](crate::Book): metadata, manifest,
/// spine, guide and the custom namespaces referenced by the metadata.
///
/// Every spine entry must reference a manifest item by the time the
/// package is serialized; see [`PackageDocument::dangling_spine_entry`].
#[derive(Clone, Debug)]
pub struct PackageDocument {
    pub(crate) version: EpubVersion,
    pub(crate) direction: TextDirection,
    pub(crate) metadata: Metadata,
    pub(crate) manifest: Manifest,
    pub(crate) spine: Spine,
    pub(crate) guide: Guide,
    pub(crate) namespaces: NamespaceRegistry,
}

impl PackageDocument {
    pub(crate) fn new(version: EpubVersion, direction: TextDirection) -> Self {
        Self {
            version,
            direction,
            metadata: Metadata::default(),
            manifest: Manifest::default(),
            spine: Spine::default(),
            guide: Guide::default(),
            namespaces: NamespaceRegistry::default(),
        }
    }

    pub fn version(&self) -> EpubVersion {
        self.version
    }

    pub fn direction(&self) -> TextDirection {
        self.direction
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn spine(&self) -> &Spine {
        &self.spine
    }

    pub fn guide(&self) -> &Guide {
        &self.guide
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    /// The first spine idref with no matching manifest item, if any.
    pub fn dangling_spine_entry(&self) -> Option<&str> {
        self.spine
            .iter()
            .map(SpineEntry::idref)
            .find(|idref| self.manifest.by_id(idref).is_none())
    }

    pub(crate) fn check_spine(&self) -> Result<(), StateError> {
        match self.dangling_spine_entry() {
            Some(idref) => Err(StateError::DanglingSpineEntry(idref.to_owned())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_spine_entry() {
        let mut package = PackageDocument::new(EpubVersion::Epub3, TextDirection::Ltr);
        package
            .manifest
            .add_item(ManifestItem::new("chapter1", "c1.xhtml", "application/xhtml+xml"));
        package.spine.add_itemref("chapter1", true);
        assert_eq!(None, package.dangling_spine_entry());

        package.spine.add_itemref("ref_toc", true);
        assert_eq!(Some("ref_toc"), package.dangling_spine_entry());
        assert_eq!(
            Err(StateError::DanglingSpineEntry("ref_toc".into())),
            package.check_spine()
        );
    }
}

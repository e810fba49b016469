use crate::consts::{mime, ocf, opf};
use crate::errors::{BookResult, StateError};
use crate::package::{Manifest, ManifestItem};
use crate::resolve::EmbedTarget;
use crate::util::path;
use crate::writer::write_container;
use crate::writer::zip::{Container, Storage};
use std::collections::BTreeMap;
use std::path::Path;

/// Entries already written to the container, keyed by archive path,
/// mapped to where their content came from.
pub(crate) type Sources = BTreeMap<String, String>;

/// Check a new manifest entry before anything is written.
///
/// Returns the sanitized root-relative path.
pub(crate) fn check_entry(
    root: &str,
    sources: &Sources,
    manifest: &Manifest,
    href: &str,
    id: &str,
) -> BookResult<String> {
    let href = path::sanitize_zip_path(href)?;
    let full_path = format!("{root}{href}");
    path::check_reserved(&full_path, root, false)?;

    if id.trim().is_empty() {
        return Err(StateError::IncompleteItem(href).into());
    }

    if sources.contains_key(&full_path) || manifest.by_href(&href).is_some() {
        return Err(StateError::DuplicateHref(href).into());
    }
    if manifest.by_id(id).is_some() {
        return Err(StateError::DuplicateId(id.to_owned()).into());
    }
    Ok(href)
}

/// Reject a blank media type before anything is written.
pub(crate) fn check_media_type(href: &str, media_type: &str) -> BookResult<()> {
    if media_type.trim().is_empty() {
        return Err(StateError::IncompleteItem(href.to_owned()).into());
    }
    Ok(())
}

/// List an item whose entry was just written.
pub(crate) fn list_item(manifest: &mut Manifest, item: ManifestItem) -> BookResult<()> {
    let id = item.id().to_owned();
    if manifest.add_item(item) {
        Ok(())
    } else {
        Err(StateError::DuplicateId(id).into())
    }
}

/// Media that gains nothing from deflate.
pub(crate) fn storage_for(media_type: &str) -> Storage {
    const COMPRESSED: &[&str] = &[mime::JPEG, mime::PNG, mime::GIF, mime::WEBP];

    if COMPRESSED.contains(&media_type) || media_type.starts_with("audio/") || media_type.starts_with("video/") {
        Storage::Stored
    } else {
        Storage::Compressed
    }
}

/// Write the leading container entries, once.
pub(crate) fn start_container(container: &mut Container, root: &str) -> BookResult<()> {
    if !container.is_started() {
        let container_xml = write_container(&format!("{root}{}", opf::PACKAGE_FILE))?;
        container.start(&container_xml)?;
    }
    Ok(())
}

/// Borrowed view over the parts of a book that staging an entry touches:
/// the container, the manifest and the source map.
pub(crate) struct Stage<'a> {
    pub(crate) root: &'a str,
    pub(crate) container: &'a mut Container,
    pub(crate) manifest: &'a mut Manifest,
    pub(crate) sources: &'a mut Sources,
}

impl Stage<'_> {
    fn start(&mut self) -> BookResult<()> {
        start_container(self.container, self.root)
    }

    /// Write `data` and list it in the manifest.
    pub(crate) fn add(&mut self, href: &str, id: &str, data: &[u8], media_type: &str, source: &str) -> BookResult<String> {
        let href = check_entry(self.root, self.sources, self.manifest, href, id)?;
        check_media_type(&href, media_type)?;
        let full_path = format!("{}{href}", self.root);

        self.start()?;
        self.container.add(&full_path, data, storage_for(media_type))?;
        self.sources.insert(full_path, source.to_owned());
        list_item(self.manifest, ManifestItem::new(id, &href, media_type))?;

        tracing::debug!(%href, %id, bytes = data.len(), "staged entry");
        Ok(href)
    }

    /// Stream `disk_path` into the container and list it in the manifest.
    pub(crate) fn add_file(&mut self, href: &str, id: &str, disk_path: &Path, media_type: &str) -> BookResult<String> {
        let href = check_entry(self.root, self.sources, self.manifest, href, id)?;
        check_media_type(&href, media_type)?;
        let full_path = format!("{}{href}", self.root);

        self.start()?;
        let bytes = self.container.add_file(disk_path, &full_path, storage_for(media_type))?;
        self.sources.insert(full_path, disk_path.display().to_string());
        list_item(self.manifest, ManifestItem::new(id, &href, media_type))?;

        tracing::debug!(%href, %id, bytes, "streamed entry");
        Ok(href)
    }

    /// Write an unlisted entry below `META-INF/`.
    pub(crate) fn add_meta_inf(&mut self, name: &str, data: &[u8]) -> BookResult<String> {
        let name = path::sanitize_zip_path(name)?;
        let full_path = format!("{}/{name}", ocf::META_INF);
        path::check_reserved(&full_path, self.root, true)?;

        if self.sources.contains_key(&full_path) {
            return Err(StateError::DuplicateHref(full_path).into());
        }
        self.start()?;
        self.container.add(&full_path, data, Storage::Compressed)?;
        self.sources.insert(full_path.clone(), name);
        Ok(full_path)
    }

    /// `id`, or the first of `id_2`, `id_3`, ... not yet in the manifest.
    fn unique_id(&self, id: &str) -> String {
        if self.manifest.by_id(id).is_none() {
            return id.to_owned();
        }
        (2..)
            .map(|n| format!("{id}_{n}"))
            .find(|candidate| self.manifest.by_id(candidate).is_none())
            .unwrap_or_else(|| id.to_owned())
    }
}

impl EmbedTarget for Stage<'_> {
    fn contains(&self, href: &str) -> bool {
        self.sources.contains_key(&format!("{}{href}", self.root))
    }

    fn embed(&mut self, href: &str, id: &str, data: &[u8], media_type: &str) -> BookResult<String> {
        let id = self.unique_id(id);
        self.add(href, &id, data, media_type, href)?;
        Ok(id)
    }

    fn embed_file(&mut self, href: &str, id: &str, source: &Path, media_type: &str) -> BookResult<String> {
        let id = self.unique_id(id);
        self.add_file(href, &id, source, media_type)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{BookError, PathError};
    use chrono::Utc;

    #[test]
    fn test_check_entry() {
        let mut manifest = Manifest::default();
        manifest.add_item(ManifestItem::new("c1", "Text/c1.xhtml", mime::XHTML));
        let sources = Sources::from([("OEBPS/Styles/a.css".to_owned(), "a.css".to_owned())]);

        #[rustfmt::skip]
        let rejected = [
            ("Text/c1.xhtml", "new"),
            ("/Styles/a.css", "new"),
            ("Text/c2.xhtml", "c1"),
            ("../../../etc/passwd", "new"),
            ("book.opf", "new"),
            ("Text/c3.xhtml", " "),
        ];

        for (href, id) in rejected {
            assert!(check_entry("OEBPS/", &sources, &manifest, href, id).is_err(), "{href}");
        }
        assert!(matches!(
            check_entry("OEBPS/", &sources, &manifest, "a/../../b", "x"),
            Err(BookError::Path(PathError::Traversal(_)))
        ));
        assert_eq!(
            "Text/c2.xhtml",
            check_entry("OEBPS/", &sources, &manifest, "./Text/c2.xhtml", "c2").unwrap()
        );
    }

    #[test]
    fn test_embed_uniquifies_ids() {
        let mut container = Container::new(0, Utc::now());
        let mut manifest = Manifest::default();
        let mut sources = Sources::new();
        let mut stage = Stage {
            root: "",
            container: &mut container,
            manifest: &mut manifest,
            sources: &mut sources,
        };

        let first = stage.embed("images/a/x.png", "i_x.png", b"1", mime::PNG).unwrap();
        let second = stage.embed("images/b/x.png", "i_x.png", b"2", mime::PNG).unwrap();

        assert_eq!("i_x.png", first);
        assert_eq!("i_x.png_2", second);
        assert!(stage.contains("images/b/x.png"));
        assert!(matches!(
            stage.add_meta_inf("container.xml", b"x"),
            Err(BookError::Path(PathError::Reserved(_)))
        ));
    }

    #[test]
    fn test_storage_for() {
        assert_eq!(Storage::Stored, storage_for(mime::JPEG));
        assert_eq!(Storage::Stored, storage_for("audio/mpeg"));
        assert_eq!(Storage::Compressed, storage_for(mime::XHTML));
        assert_eq!(Storage::Compressed, storage_for(mime::SVG));
    }
}

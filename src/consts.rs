pub(crate) mod xml {
    pub(crate) const XMLNS: &str = "xmlns";
    pub(crate) const ID: &str = "id";
    pub(crate) const LANG: &str = "xml:lang";
    pub(crate) const DIR: &str = "dir";
}

pub(crate) mod ocf {
    pub(crate) const MIMETYPE: &str = "mimetype";
    pub(crate) const META_INF: &str = "META-INF";
    pub(crate) const CONTAINER_PATH: &str = "META-INF/container.xml";
    pub(crate) const CONTAINER_NS: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
    pub(crate) const CONTAINER: &str = "container";
    pub(crate) const VERSION: &str = "version";
    pub(crate) const CONTAINER_VERSION: &str = "1.0";
    pub(crate) const ROOT_FILES: &str = "rootfiles";
    pub(crate) const ROOT_FILE: &str = "rootfile";
    pub(crate) const FULL_PATH: &str = "full-path";
    pub(crate) const MEDIA_TYPE: &str = "media-type";
}

pub(crate) mod opf {
    pub(crate) const OPF_NS: &str = "http://www.idpf.org/2007/opf";
    pub(crate) const XMLNS_OPF: &str = "xmlns:opf";
    pub(crate) const PACKAGE_FILE: &str = "book.opf";
    pub(crate) const UNIQUE_IDENTIFIER_ID: &str = "BookId";

    // Elements
    pub(crate) const PACKAGE: &str = "package";
    pub(crate) const METADATA: &str = "metadata";
    pub(crate) const META: &str = "meta";
    pub(crate) const MANIFEST: &str = "manifest";
    pub(crate) const ITEM: &str = "item";
    pub(crate) const SPINE: &str = "spine";
    pub(crate) const ITEMREF: &str = "itemref";
    pub(crate) const GUIDE: &str = "guide";
    pub(crate) const REFERENCE: &str = "reference";

    // Package attributes
    pub(crate) const VERSION: &str = "version";
    pub(crate) const UNIQUE_IDENTIFIER: &str = "unique-identifier";
    pub(crate) const PREFIX: &str = "prefix";

    // Metadata attributes
    pub(crate) const PROPERTY: &str = "property";
    pub(crate) const NAME: &str = "name";
    pub(crate) const CONTENT: &str = "content";
    pub(crate) const REFINES: &str = "refines";
    pub(crate) const SCHEME: &str = "scheme";
    pub(crate) const FILE_AS: &str = "file-as";
    pub(crate) const ROLE: &str = "role";
    pub(crate) const EVENT: &str = "event";
    pub(crate) const MARC_RELATORS: &str = "marc:relators";
    pub(crate) const COVER: &str = "cover";
    pub(crate) const GENERATOR: &str = "generator";
    pub(crate) const PUBLICATION: &str = "publication";
    pub(crate) const AUTHOR_ROLE: &str = "aut";

    // Manifest attributes
    pub(crate) const HREF: &str = "href";
    pub(crate) const MEDIA_TYPE: &str = "media-type";
    pub(crate) const PROPERTIES: &str = "properties";
    pub(crate) const MEDIA_OVERLAY: &str = "media-overlay";
    pub(crate) const FALLBACK: &str = "fallback";
    pub(crate) const FALLBACK_STYLE: &str = "fallback-style";
    pub(crate) const REQUIRED_NAMESPACE: &str = "required-namespace";
    pub(crate) const REQUIRED_MODULES: &str = "required-modules";

    // Manifest item properties
    pub(crate) const COVER_IMAGE: &str = "cover-image";
    pub(crate) const NAV_PROPERTY: &str = "nav";

    // Spine attributes
    pub(crate) const TOC: &str = "toc";
    pub(crate) const IDREF: &str = "idref";
    pub(crate) const LINEAR: &str = "linear";
    pub(crate) const NO: &str = "no";
    pub(crate) const PAGE_PROGRESSION_DIRECTION: &str = "page-progression-direction";

    // Guide attributes
    pub(crate) const TYPE: &str = "type";
    pub(crate) const TITLE: &str = "title";
}

pub(crate) mod dc {
    pub(crate) const DUBLIN_CORE_NS: &str = "http://purl.org/dc/elements/1.1/";
    pub(crate) const XMLNS_DC: &str = "xmlns:dc";
    pub(crate) const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
    pub(crate) const XMLNS_DCTERMS: &str = "xmlns:dcterms";
    pub(crate) const PREFIX: &str = "dc:";

    pub(crate) const TITLE: &str = "dc:title";
    pub(crate) const LANGUAGE: &str = "dc:language";
    pub(crate) const IDENTIFIER: &str = "dc:identifier";
    pub(crate) const CREATOR: &str = "dc:creator";
    pub(crate) const CONTRIBUTOR: &str = "dc:contributor";
    pub(crate) const DATE: &str = "dc:date";
    pub(crate) const DESCRIPTION: &str = "dc:description";
    pub(crate) const PUBLISHER: &str = "dc:publisher";
    pub(crate) const RIGHTS: &str = "dc:rights";
    pub(crate) const SUBJECT: &str = "dc:subject";
    pub(crate) const COVERAGE: &str = "dc:coverage";
    pub(crate) const SOURCE: &str = "dc:source";
    pub(crate) const RELATION: &str = "dc:relation";
    pub(crate) const MODIFIED: &str = "dcterms:modified";
    pub(crate) const CONFORMS_TO: &str = "dcterms:conformsTo";
}

pub(crate) mod schema {
    pub(crate) const ACCESSIBILITY_SUMMARY: &str = "schema:accessibilitySummary";
    pub(crate) const ACCESS_MODE: &str = "schema:accessMode";
    pub(crate) const ACCESSIBILITY_FEATURE: &str = "schema:accessibilityFeature";
    pub(crate) const ACCESSIBILITY_HAZARD: &str = "schema:accessibilityHazard";
    pub(crate) const MEDIA_DURATION: &str = "media:duration";
}

pub(crate) mod rendition {
    pub(crate) const PREFIX: &str = "rendition";
    pub(crate) const PREFIX_URI: &str = "http://www.idpf.org/vocab/rendition/#";
    pub(crate) const LAYOUT: &str = "rendition:layout";
    pub(crate) const ORIENTATION: &str = "rendition:orientation";
    pub(crate) const SPREAD: &str = "rendition:spread";
}

pub(crate) mod ncx {
    pub(crate) const NCX_NS: &str = "http://www.daisy.org/z3986/2005/ncx/";
    pub(crate) const NCX_VERSION: &str = "2005-1";
    pub(crate) const NCX_FILE: &str = "book.ncx";
    pub(crate) const NCX_ID: &str = "ncx";

    pub(crate) const NCX: &str = "ncx";
    pub(crate) const VERSION: &str = "version";
    pub(crate) const HEAD: &str = "head";
    pub(crate) const META: &str = "meta";
    pub(crate) const NAME: &str = "name";
    pub(crate) const CONTENT: &str = "content";
    pub(crate) const DOC_TITLE: &str = "docTitle";
    pub(crate) const DOC_AUTHOR: &str = "docAuthor";
    pub(crate) const TEXT: &str = "text";
    pub(crate) const NAV_MAP: &str = "navMap";
    pub(crate) const NAV_POINT: &str = "navPoint";
    pub(crate) const NAV_LABEL: &str = "navLabel";
    pub(crate) const SRC: &str = "src";
    pub(crate) const CLASS: &str = "class";
    pub(crate) const PLAY_ORDER: &str = "playOrder";

    pub(crate) const DTB_UID: &str = "dtb:uid";
    pub(crate) const DTB_DEPTH: &str = "dtb:depth";
    pub(crate) const DTB_TOTAL_PAGE_COUNT: &str = "dtb:totalPageCount";
    pub(crate) const DTB_MAX_PAGE_NUMBER: &str = "dtb:maxPageNumber";
    pub(crate) const DTB_GENERATOR: &str = "dtb:generator";
}

pub(crate) mod xhtml {
    pub(crate) const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
    pub(crate) const XMLNS_EPUB: &str = "xmlns:epub";
    pub(crate) const EPUB_NS: &str = "http://www.idpf.org/2007/ops";
    pub(crate) const SVG_NS: &str = "http://www.w3.org/2000/svg";
    pub(crate) const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";
    pub(crate) const HTML5_DOCTYPE: &str = "html";
    pub(crate) const XHTML11_DOCTYPE: &str =
        r#"html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd""#;

    // Elements
    pub(crate) const HTML: &str = "html";
    pub(crate) const HEAD: &str = "head";
    pub(crate) const BODY: &str = "body";
    pub(crate) const TITLE: &str = "title";
    pub(crate) const META: &str = "meta";
    pub(crate) const LINK: &str = "link";
    pub(crate) const STYLE: &str = "style";
    pub(crate) const IMG: &str = "img";
    pub(crate) const SOURCE: &str = "source";
    pub(crate) const NAV: &str = "nav";
    pub(crate) const SECTION: &str = "section";
    pub(crate) const DIV: &str = "div";
    pub(crate) const SPAN: &str = "span";
    pub(crate) const EM: &str = "em";
    pub(crate) const P: &str = "p";
    pub(crate) const A: &str = "a";
    pub(crate) const H2: &str = "h2";
    pub(crate) const H3: &str = "h3";
    pub(crate) const OL: &str = "ol";
    pub(crate) const LI: &str = "li";

    // Attributes
    pub(crate) const LANG: &str = "lang";
    pub(crate) const HREF: &str = "href";
    pub(crate) const SRC: &str = "src";
    pub(crate) const ALT: &str = "alt";
    pub(crate) const REL: &str = "rel";
    pub(crate) const TYPE: &str = "type";
    pub(crate) const CLASS: &str = "class";
    pub(crate) const HIDDEN: &str = "hidden";
    pub(crate) const CHARSET: &str = "charset";
    pub(crate) const HTTP_EQUIV: &str = "http-equiv";
    pub(crate) const NAME: &str = "name";
    pub(crate) const CONTENT: &str = "content";
    pub(crate) const EPUB_TYPE: &str = "epub:type";
    pub(crate) const STYLESHEET: &str = "stylesheet";
    pub(crate) const CONTENT_TYPE: &str = "Content-Type";
    pub(crate) const CONTENT_TYPE_VALUE: &str = "text/html; charset=utf-8";
    pub(crate) const VIEWPORT: &str = "viewport";
    pub(crate) const UTF_8: &str = "utf-8";

    // `epub:type` values
    pub(crate) const TOC: &str = "toc";
    pub(crate) const LANDMARKS: &str = "landmarks";
    pub(crate) const COVER: &str = "cover";
}

pub(crate) mod smil {
    pub(crate) const SMIL_NS: &str = "http://www.w3.org/ns/SMIL";
    pub(crate) const SMIL_VERSION: &str = "3.0";
    pub(crate) const VERSION: &str = "version";
    pub(crate) const SMIL: &str = "smil";
    pub(crate) const BODY: &str = "body";
    pub(crate) const SEQ: &str = "seq";
    pub(crate) const PAR: &str = "par";
    pub(crate) const TEXT: &str = "text";
    pub(crate) const AUDIO: &str = "audio";
    pub(crate) const SRC: &str = "src";
    pub(crate) const CLIP_BEGIN: &str = "clipBegin";
    pub(crate) const CLIP_END: &str = "clipEnd";
    pub(crate) const EPUB_TEXTREF: &str = "epub:textref";
}

pub(crate) mod mime {
    pub(crate) const EPUB: &str = "application/epub+zip";
    pub(crate) const OEBPS_PACKAGE: &str = "application/oebps-package+xml";
    pub(crate) const XHTML: &str = "application/xhtml+xml";
    pub(crate) const NCX: &str = "application/x-dtbncx+xml";
    pub(crate) const SMIL: &str = "application/smil+xml";
    pub(crate) const CSS: &str = "text/css";
    pub(crate) const TEXT: &str = "text/plain";
    pub(crate) const OCTET_STREAM: &str = "application/octet-stream";
    pub(crate) const JPEG: &str = "image/jpeg";
    pub(crate) const PNG: &str = "image/png";
    pub(crate) const GIF: &str = "image/gif";
    pub(crate) const SVG: &str = "image/svg+xml";
    pub(crate) const WEBP: &str = "image/webp";

    /// Media types by file extension, used when none is declared.
    #[rustfmt::skip]
    const BY_EXTENSION: &[(&str, &str)] = &[
        ("xhtml", XHTML), ("html", XHTML), ("htm", XHTML),
        ("css", CSS), ("txt", TEXT), ("ncx", NCX), ("opf", OEBPS_PACKAGE),
        ("smil", SMIL),
        ("jpg", JPEG), ("jpeg", JPEG), ("png", PNG), ("gif", GIF),
        ("svg", SVG), ("webp", WEBP),
        ("mp3", "audio/mpeg"), ("m4a", "audio/mp4"), ("mp4", "video/mp4"),
        ("ogg", "audio/ogg"), ("webm", "video/webm"),
        ("otf", "font/otf"), ("ttf", "font/ttf"), ("woff", "font/woff"), ("woff2", "font/woff2"),
        ("js", "application/javascript"), ("xml", "application/xml"),
    ];

    pub(crate) fn from_path(path: &str) -> Option<&'static str> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = name.rsplit_once('.')?;

        BY_EXTENSION
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, media_type)| *media_type)
    }

    /// Identify common image formats by their magic bytes.
    pub(crate) fn sniff_image(data: &[u8]) -> Option<&'static str> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";

        if data.starts_with(PNG_MAGIC) {
            Some(PNG)
        } else if data.starts_with(JPEG_MAGIC) {
            Some(JPEG)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(GIF)
        } else if data.len() > 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(WEBP)
        } else {
            let head = String::from_utf8_lossy(&data[..data.len().min(512)]);
            head.contains("<svg").then_some(SVG)
        }
    }

    /// The preferred file extension of an image media type.
    pub(crate) fn image_extension(media_type: &str) -> Option<&'static str> {
        match media_type {
            JPEG => Some("jpg"),
            PNG => Some("png"),
            GIF => Some("gif"),
            SVG => Some("svg"),
            WEBP => Some("webp"),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn test_from_path() {
            #[rustfmt::skip]
            let expected = [
                (Some(super::XHTML), "OEBPS/c1.xhtml"),
                (Some(super::CSS), "Styles/Main.CSS"),
                (Some(super::JPEG), "images/a.b/cover.jpeg"),
                (None, "images/a.b/cover"),
                (None, "README"),
            ];

            for (expect, path) in expected {
                assert_eq!(expect, super::from_path(path));
            }
        }

        #[test]
        fn test_sniff_image() {
            assert_eq!(Some(super::PNG), super::sniff_image(b"\x89PNG\r\n\x1a\n...."));
            assert_eq!(Some(super::JPEG), super::sniff_image(b"\xFF\xD8\xFF\xE0...."));
            assert_eq!(Some(super::GIF), super::sniff_image(b"GIF89a...."));
            assert_eq!(Some(super::SVG), super::sniff_image(b"<?xml?><svg></svg>"));
            assert_eq!(None, super::sniff_image(b"plain text"));
        }
    }
}

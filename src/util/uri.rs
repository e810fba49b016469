use std::borrow::Cow;
use std::path::{Component, PathBuf};

pub(crate) fn parent(href: &str) -> &str {
    href.rfind('/')
        .map_or("", |index| if index == 0 { "/" } else { &href[..index] })
}

pub(crate) fn file_name(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or(href)
}

/// Split a file name into its stem and extension (without the dot).
pub(crate) fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 => (&name[..index], Some(&name[index + 1..])),
        _ => (name, None),
    }
}

pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

pub(crate) fn normalize(href: &str) -> String {
    let mut buf = PathBuf::from(href);
    normalize_href_path(&mut buf);

    // 1: `buf` is UTF-8 as its data derives from `href`.
    // 2: Ensure separators are forward slashes.
    buf.to_string_lossy().replace('\\', "/")
}

/// Express `target` (relative to the container root) as an href
/// relative to the directory `from_dir`.
pub(crate) fn relativize(from_dir: &str, target: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').collect();

    let common = from
        .iter()
        .zip(&to[..to.len().saturating_sub(1)])
        .take_while(|(a, b)| a == b)
        .count();

    let mut href = "../".repeat(from.len() - common);
    href.push_str(&to[common..].join("/"));
    href
}

/// The relative prefix leading from `dir` back to the root,
/// with every directory segment replaced by `../`.
pub(crate) fn back_path(dir: &str) -> String {
    "../".repeat(dir.split('/').filter(|segment| !segment.is_empty()).count())
}

fn normalize_href_path(original: &mut PathBuf) {
    let mut stack = Vec::new();

    for component in original.components() {
        match component {
            Component::ParentDir => {
                if stack
                    .last()
                    // If the component is the root, disallow popping.
                    // No content must come before the root when present.
                    .is_some_and(|component| !matches!(component, Component::RootDir))
                {
                    stack.pop();
                }
            }
            Component::CurDir => {}
            _ => {
                stack.push(component);
            }
        }
    }

    *original = PathBuf::from_iter(stack);
}

/// Whether the reference points to a network location.
pub(crate) fn is_remote(href: &str) -> bool {
    const SCHEMES: &[&str] = &["http://", "https://", "ftp://", "ftps://"];

    SCHEMES.iter().any(|scheme| {
        href.len() >= scheme.len() && href[..scheme.len()].eq_ignore_ascii_case(scheme)
    })
}

/// Whether the reference must never be rewritten (inline data or same-document).
pub(crate) fn is_inline(href: &str) -> bool {
    let href = href.trim();
    href.is_empty()
        || href.starts_with('#')
        || href.len() >= 5 && href[..5].eq_ignore_ascii_case("data:")
}

/// Components of a remote URL: `(scheme, host, path)`.
/// The query and fragment are discarded.
pub(crate) fn split_url(url: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = url.split_once("://")?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (authority, path) = rest
        .find('/')
        .map_or((rest, ""), |index| (&rest[..index], &rest[index..]));
    // Drop credentials and port
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);

    Some((scheme, host, path))
}

/// Remove the query and fragment of an href.
pub(crate) fn strip_query(href: &str) -> &str {
    href.split(['?', '#']).next().unwrap_or(href)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_parent_href() {
        #[rustfmt::skip]
        let expected = [
            ("OPS/content/toc", "OPS/content/toc/toc.xhtml?q=1#start"),
            ("OPS/content", "OPS/content/c1.xhtml"),
            ("", "OPS"),
            ("/", "/OPS"),
            ("", ""),
        ];

        for (expect_href, href) in expected {
            assert_eq!(expect_href, super::parent(href));
        }
    }

    #[test]
    fn test_normalize() {
        #[rustfmt::skip]
        let expected = [
            ("images/a/c.png", "images/a/./b/../c.png"),
            ("images/x.png", "images//x.png"),
            ("a.png", "../a.png"),
            ("/b", "/a/../../b"),
        ];

        for (expected, href) in expected {
            assert_eq!(expected, super::normalize(href));
        }
    }

    #[test]
    fn test_relativize() {
        #[rustfmt::skip]
        let expected = [
            ("c1.xhtml", "", "c1.xhtml"),
            ("../c1.xhtml", "smil", "c1.xhtml"),
            ("../audio/a.mp3", "smil", "audio/a.mp3"),
            ("b/c.xhtml", "a", "a/b/c.xhtml"),
            ("../../x/y.css", "a/b", "x/y.css"),
        ];

        for (expected, from, target) in expected {
            assert_eq!(expected, super::relativize(from, target));
        }
    }

    #[test]
    fn test_back_path() {
        #[rustfmt::skip]
        let expected = [
            ("", ""),
            ("../", "text"),
            ("../../", "text/part1/"),
            ("../../", "/a//b"),
        ];

        for (expected, dir) in expected {
            assert_eq!(expected, super::back_path(dir));
        }
    }

    #[test]
    fn test_split_url() {
        #[rustfmt::skip]
        let expected = [
            (Some(("https", "example.com", "/img/a.png")), "https://example.com/img/a.png?x=1"),
            (Some(("http", "host", "")), "http://user@host:8080"),
            (None, "images/a.png"),
        ];

        for (expected, url) in expected {
            assert_eq!(expected, super::split_url(url));
        }
    }

    #[test]
    fn test_reference_kinds() {
        assert!(super::is_remote("HTTPS://example.com/a.png"));
        assert!(!super::is_remote("images/http.png"));
        assert!(super::is_inline("data:image/png;base64,AAAA"));
        assert!(super::is_inline("#note-1"));
        assert!(!super::is_inline("a.png#x"));
    }
}

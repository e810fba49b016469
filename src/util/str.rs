pub(crate) trait StrExt {
    fn contains_ignore_case(&self, needle: &str) -> bool;
}

impl StrExt for str {
    fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.as_bytes();
        self.as_bytes()
            .windows(needle.len().max(1))
            .any(|window| window.eq_ignore_ascii_case(needle))
    }
}

/// Reduce a file name to characters that are safe inside an archive entry.
///
/// Reserved characters are removed, runs of whitespace and hyphens collapse
/// to a single `-`, and leading/trailing `.`, `-` and `_` are trimmed.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    const FORBIDDEN: &[char] = &[
        '?', '[', ']', '/', '\\', '=', '<', '>', ':', ';', ',', '\'', '"', '&', '$', '#', '*', '(',
        ')', '|', '~', '`', '!', '{', '}', '%', '+',
    ];

    let mut sanitized = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if FORBIDDEN.contains(&c) || c.is_control() {
            continue;
        }
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
            continue;
        }
        if pending_dash && !sanitized.is_empty() {
            sanitized.push('-');
        }
        pending_dash = false;
        sanitized.push(c);
    }

    sanitized.trim_matches(['.', '-', '_']).to_owned()
}

/// Produce a valid XML `NCName` from arbitrary input, usable as an `id`.
pub(crate) fn xml_id(input: &str) -> String {
    let mut id: String = input
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            c if c.is_alphanumeric() => c,
            _ => '_',
        })
        .collect();

    if !id.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignore_case() {
        assert!("<HTML lang='en'>".contains_ignore_case("<html"));
        assert!(!"<ht".contains_ignore_case("<html"));
        assert!("<!DOCTYPE html><Html>".contains_ignore_case("<html"));
        assert!(!"<body><p>x</p></body>".contains_ignore_case("<html"));
    }

    #[test]
    fn test_sanitize_file_name() {
        #[rustfmt::skip]
        let expected = [
            ("cover.jpg", "cover.jpg"),
            ("my-cover-image.png", "my  cover -- image.png"),
            ("photo1.jpg", "photo(1).jpg"),
            ("weird.png", "..weird.png--"),
            ("ab.gif", "a?b.gif"),
        ];

        for (expected, original) in expected {
            assert_eq!(expected, sanitize_file_name(original));
        }
    }

    #[test]
    fn test_xml_id() {
        #[rustfmt::skip]
        let expected = [
            ("chapter1", "chapter1"),
            ("_01_intro", "01_intro"),
            ("i_cover.jpg", "i_cover.jpg"),
            ("a_b_c", "a b/c"),
        ];

        for (expected, original) in expected {
            assert_eq!(expected, xml_id(original));
        }
    }
}

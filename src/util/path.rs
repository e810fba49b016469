use crate::consts::{ncx, ocf, opf};
use crate::errors::PathError;

/// Sanitize a caller-supplied in-package path.
///
/// The returned path is relative, uses `/` separators and contains
/// no empty, `.` or `..` segments.
pub(crate) fn sanitize_zip_path(path: &str) -> Result<String, PathError> {
    let cleaned: String = path
        .chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '\\' { '/' } else { c })
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if has_drive_letter(cleaned) {
        return Err(PathError::DriveLetter(path.to_owned()));
    }

    let mut segments = Vec::new();
    for segment in cleaned.split('/') {
        match segment.trim() {
            "" | "." => {}
            ".." => return Err(PathError::Traversal(path.to_owned())),
            segment => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(segments.join("/"))
}

/// Reject container-managed entries.
///
/// `full_path` is the final archive entry name (book root included).
pub(crate) fn check_reserved(
    full_path: &str,
    book_root: &str,
    allow_meta_inf: bool,
) -> Result<(), PathError> {
    let reserved = full_path.eq_ignore_ascii_case(ocf::MIMETYPE)
        || full_path == ocf::CONTAINER_PATH
        || (!allow_meta_inf && is_meta_inf(full_path))
        || full_path.strip_prefix(book_root).is_some_and(|relative| {
            relative == opf::PACKAGE_FILE || relative == ncx::NCX_FILE
        });

    if reserved {
        Err(PathError::Reserved(full_path.to_owned()))
    } else {
        Ok(())
    }
}

fn is_meta_inf(path: &str) -> bool {
    let head = path.split('/').next().unwrap_or(path);
    head.eq_ignore_ascii_case(ocf::META_INF)
}

fn has_drive_letter(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

/// Normalize a book root: `""` and `"/"` mean no root,
/// otherwise the root always ends with `/`.
pub(crate) fn normalize_root(root: &str) -> Result<String, PathError> {
    let trimmed = root.trim();
    if trimmed.len() <= 1 && (trimmed.is_empty() || trimmed == "/" || trimmed == ".") {
        return Ok(String::new());
    }
    let mut root = sanitize_zip_path(trimmed)?;
    root.push('/');
    Ok(root)
}

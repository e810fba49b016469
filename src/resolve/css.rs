use regex::{Captures, Regex};
use std::sync::LazyLock;

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)url\s*\(['"\s]*(.+?)['"\s]*\)"#).expect("valid `url()` pattern")
});

/// What to do with one `url(...)` occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UrlRewrite {
    Keep,
    Remove,
    Replace(String),
}

/// Rewrite every `url(...)` in `css` according to `rewrite`, which is
/// given the unquoted reference.
pub(crate) fn rewrite_urls(css: &str, mut rewrite: impl FnMut(&str) -> UrlRewrite) -> String {
    CSS_URL
        .replace_all(css, |captures: &Captures<'_>| {
            let original = &captures[0];
            match rewrite(captures[1].trim()) {
                UrlRewrite::Keep => original.to_owned(),
                UrlRewrite::Remove => String::new(),
                UrlRewrite::Replace(href) => format!("url('{href}')"),
            }
        })
        .into_owned()
}

/// Remove CDATA wrappers (and their comment-guarded variants) around style content.
pub(crate) fn strip_cdata(css: &str) -> String {
    const MARKERS: &[&str] = &["/*<![CDATA[*/", "/*]]>*/", "<![CDATA[", "]]>"];

    MARKERS
        .iter()
        .fold(css.to_owned(), |css, marker| css.replace(marker, ""))
}

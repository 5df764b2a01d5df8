//! Pure helpers turning source references into anchor tokens.

use std::sync::LazyLock;

use regex::Regex;

use crate::util::{basename, percent_decode, strip_fragment_and_query};

static DOCUMENT_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.x?html?$").unwrap());

/// Reduce a reference to the decoded basename of the file it points at.
///
/// # Examples
///
/// ```
/// use folio::anchor::normalize_reference;
///
/// assert_eq!(normalize_reference("../text/Chapter%201.xhtml#p3"), "Chapter 1.xhtml");
/// assert_eq!(normalize_reference("ch02.html?v=1"), "ch02.html");
/// assert_eq!(normalize_reference(""), "");
/// ```
pub fn normalize_reference(reference: &str) -> String {
    let path = strip_fragment_and_query(reference);
    if path.is_empty() {
        return String::new();
    }
    basename(&percent_decode(path)).to_string()
}

/// Turn a file name into a token made of `[A-Za-z0-9_-]` only.
///
/// A trailing `.html`, `.htm`, `.xhtml` or `.xhtm` extension is dropped, every
/// run of other characters becomes one `-`, and dashes are trimmed from both
/// ends. An empty result means no anchor can be derived.
///
/// # Examples
///
/// ```
/// use folio::anchor::slugify_anchor;
///
/// assert_eq!(slugify_anchor("Chapter 1.xhtml"), "Chapter-1");
/// assert_eq!(slugify_anchor("part_02.HTML"), "part_02");
/// assert_eq!(slugify_anchor("?!."), "");
/// ```
pub fn slugify_anchor(raw: &str) -> String {
    let stem = DOCUMENT_EXTENSION.replace(raw, "");

    let mut slug = String::with_capacity(stem.len());
    let mut in_gap = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if in_gap && !slug.is_empty() {
                slug.push('-');
            }
            in_gap = false;
            slug.push(c);
        } else {
            in_gap = true;
        }
    }

    slug.trim_matches('-').to_string()
}

//! Tunable heuristics for structure the markup does not state explicitly.
//!
//! Books rarely mark chapter titles as headings or footnotes as notes. These
//! policies recognize the common patterns; both err on the side of leaving
//! markup alone.

use std::sync::LazyLock;

use regex::Regex;

/// Note markers: `[12]` or `12`.
static NOTE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[?\d+\]?$").unwrap());

/// A note body opens with a marker followed by a delimiter.
static NOTE_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[\d{1,3}\]|\d{1,3})(?:[.):]|\s)").unwrap());

/// Elements that can hold a note body.
pub const DEFINITION_TAGS: &[&str] = &["p", "div", "li", "aside"];

const NOTE_TYPES: &[&str] = &["footnote", "endnote", "rearnote", "note"];
const NOTE_ROLES: &[&str] = &["doc-footnote", "doc-endnote"];

/// Footnote recognition.
///
/// A definition candidate is an identified `p`, `div`, `li` or `aside` whose
/// text opens with a note marker. Candidates carrying an explicit marker
/// (`epub:type`, ARIA `role` or a `footnote` class) are always accepted;
/// others only when their text is shorter than `max_length`, which keeps
/// long numbered prose from turning into notes. Numbered paragraphs below the
/// threshold are still misread as notes unless `require_reference` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnotePolicy {
    /// Longest unmarked text accepted as a definition, in characters.
    pub max_length: usize,
    /// Accept a definition only if some footnote reference targets it.
    pub require_reference: bool,
}

impl Default for FootnotePolicy {
    fn default() -> Self {
        Self {
            max_length: 500,
            require_reference: false,
        }
    }
}

impl FootnotePolicy {
    /// Whether visible link text looks like a note marker.
    pub fn is_marker(&self, text: &str) -> bool {
        NOTE_MARKER.is_match(text.trim())
    }

    /// Identifier a link points at when it is a footnote reference.
    ///
    /// The link must carry a note marker as its text and a bare `#id`
    /// fragment. Numbered links into other files are usually tables of
    /// contents and stay links.
    pub fn reference_target<'a>(&self, href: &'a str, text: &str) -> Option<&'a str> {
        if !self.is_marker(text) {
            return None;
        }
        let fragment = href.strip_prefix('#')?;
        (!fragment.is_empty()).then_some(fragment)
    }

    /// Whether text opens like a note body (`[1] ...`, `1. ...`).
    pub fn opens_with_marker(&self, text: &str) -> bool {
        NOTE_BODY.is_match(text.trim_start())
    }

    /// Whether an element's attributes mark it as a note.
    pub fn has_explicit_marker<'a>(
        &self,
        epub_type: Option<&str>,
        role: Option<&str>,
        mut classes: impl Iterator<Item = &'a str>,
    ) -> bool {
        let typed = epub_type.is_some_and(|value| {
            value
                .split_ascii_whitespace()
                .any(|t| NOTE_TYPES.contains(&t))
        });
        let roled = role.is_some_and(|value| {
            value
                .split_ascii_whitespace()
                .any(|r| NOTE_ROLES.contains(&r))
        });
        typed || roled || classes.any(|c| c.eq_ignore_ascii_case("footnote"))
    }

    /// Whether a candidate's text is short enough to be taken as a note
    /// without an explicit marker.
    pub fn is_short(&self, text: &str) -> bool {
        text.chars().count() < self.max_length
    }

    /// Whether an identified element renders as a note body, before
    /// `require_reference` is taken into account.
    pub fn is_definition<'a>(
        &self,
        tag: &str,
        text: &str,
        epub_type: Option<&str>,
        role: Option<&str>,
        classes: impl Iterator<Item = &'a str>,
    ) -> bool {
        DEFINITION_TAGS.contains(&tag)
            && self.opens_with_marker(text)
            && (self.has_explicit_marker(epub_type, role, classes) || self.is_short(text))
    }
}

/// Promotion of title-styled paragraphs to headings.
///
/// Each rule pairs a pattern, matched against every class token of a `p`,
/// with the heading level it produces. Rules are tried in order. Only class
/// names are consulted, so titles styled through other means stay paragraphs.
#[derive(Debug, Clone)]
pub struct TitlePolicy {
    rules: Vec<(Regex, u8)>,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self::empty()
            .with_rule(r"(?i)(^|[-_])(chapter|part|book)[-_]?(title|head|heading)$", 1)
            .with_rule(r"(?i)^(title|chaptitle|chapter)$", 1)
            .with_rule(r"(?i)(^|[-_])subhead(ing)?$", 3)
            .with_rule(r"(?i)(^|[-_])(section|sub)[-_]?(title|head|heading)$", 2)
    }
}

impl TitlePolicy {
    /// A policy that never promotes anything.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule. Invalid patterns are logged and ignored; levels are
    /// clamped to `1..=6`.
    pub fn with_rule(mut self, pattern: &str, level: u8) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => self.rules.push((regex, level.clamp(1, 6))),
            Err(e) => log::warn!("ignoring title pattern '{pattern}': {e}"),
        }
        self
    }

    /// Heading level for a paragraph with these classes, if any.
    pub fn heading_level<'a>(&self, classes: impl Iterator<Item = &'a str>) -> Option<u8> {
        let classes: Vec<&str> = classes.collect();
        self.rules.iter().find_map(|(pattern, level)| {
            classes
                .iter()
                .any(|class| pattern.is_match(class))
                .then_some(*level)
        })
    }
}

//! Footnote references and definitions.

use std::sync::LazyLock;

use regex::Regex;

use crate::anchor::SectionIndex;
use crate::markdown::{NodeRef, Rule, trim_block};
use crate::policy::FootnotePolicy;

/// Marker opening a converted definition: `[1]`, `\[1\]`, `1.`, `1\.`, or a
/// back-link already rewritten to `[^ref]` or a wikilink.
static LEADING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\[\^[^\]\s]+\]|\[\[[^\]]*\]\]|\\?\[\d{1,3}\\?\]|\d{1,3}\\?[.):]?)\s*(?:\\?[.):]\s*)?",
    )
    .unwrap()
});

/// Back-link closing a converted definition, rewritten or not.
static TRAILING_BACKLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*(?:\[\^[^\]\s]+\]|[↩↑⤴]\x{FE0E}?|\[\[[^\]|]*\|\s*(?:[↩↑⤴]\x{FE0E}?|back|return|\d{1,3})\s*\]\]|\[(?:[↩↑⤴]\x{FE0E}?|back|return)\]\([^)]*\))\s*$",
    )
    .unwrap()
});

/// Links to a note in the same document → `[^id]`.
pub struct FootnoteReferenceRule<'a> {
    policy: &'a FootnotePolicy,
}

impl<'a> FootnoteReferenceRule<'a> {
    pub fn new(policy: &'a FootnotePolicy) -> Self {
        Self { policy }
    }

    fn target<'n>(&self, node: NodeRef<'n>) -> Option<&'n str> {
        if !node.is("a") {
            return None;
        }
        let href = node.attr("href")?.trim();
        self.policy.reference_target(href, &node.text())
    }
}

impl Rule for FootnoteReferenceRule<'_> {
    fn name(&self) -> &str {
        "footnote-reference"
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        self.target(node).is_some()
    }

    fn replace(&self, content: &str, node: NodeRef<'_>) -> String {
        match self.target(node) {
            Some(id) => format!("[^{id}]"),
            None => content.to_string(),
        }
    }
}

/// Note bodies → `[^id]: text`.
pub struct FootnoteDefinitionRule<'a> {
    policy: &'a FootnotePolicy,
    index: &'a SectionIndex,
}

impl<'a> FootnoteDefinitionRule<'a> {
    pub fn new(policy: &'a FootnotePolicy, index: &'a SectionIndex) -> Self {
        Self { policy, index }
    }
}

impl Rule for FootnoteDefinitionRule<'_> {
    fn name(&self) -> &str {
        "footnote-definition"
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        let Some(id) = node.id() else {
            return false;
        };
        if self.policy.require_reference && !self.index.is_note_ref(id) {
            return false;
        }
        self.policy.is_definition(
            node.tag(),
            &node.text(),
            node.attr("epub:type"),
            node.attr("role"),
            node.classes(),
        )
    }

    fn replace(&self, content: &str, node: NodeRef<'_>) -> String {
        let Some(id) = node.id() else {
            return content.to_string();
        };
        let body = note_text(content);
        if body.is_empty() {
            format!("\n\n[^{id}]:\n\n")
        } else {
            format!("\n\n[^{id}]: {body}\n\n")
        }
    }
}

/// Converted note content without its marker and back-link, continuation
/// lines indented under the definition.
pub fn note_text(content: &str) -> String {
    let content = trim_block(content);
    let content = LEADING_MARKER.replace(content, "");
    let content = TRAILING_BACKLINK.replace(&content, "");
    let content = trim_block(&content);

    content
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! One stable anchor token per section.

use std::collections::{HashMap, HashSet};

use crate::book::Section;

use super::reference::{normalize_reference, slugify_anchor};

/// Section anchors keyed by normalized file reference and by section id.
///
/// Every assigned token is unique; a slug seen before gets a `-1`, `-2`, ...
/// suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterAnchorMap {
    by_reference: HashMap<String, String>,
    by_section_id: HashMap<String, String>,
}

impl ChapterAnchorMap {
    /// Assign anchors to sections in reading order.
    pub fn build(sections: &[Section]) -> Self {
        let mut map = Self::default();
        let mut assigned: HashSet<String> = HashSet::new();

        for section in sections {
            let reference = normalize_reference(&section.href);
            let mut base = slugify_anchor(&reference);
            if base.is_empty() {
                base = slugify_anchor(&section.id);
            }
            if base.is_empty() {
                log::debug!(
                    "no usable anchor for section '{}' ({})",
                    section.id,
                    section.href
                );
                continue;
            }

            let mut anchor = base.clone();
            let mut counter = 1;
            while assigned.contains(&anchor) {
                anchor = format!("{base}-{counter}");
                counter += 1;
            }
            assigned.insert(anchor.clone());

            if !reference.is_empty() {
                map.by_reference
                    .entry(reference)
                    .or_insert_with(|| anchor.clone());
            }
            if !section.id.is_empty() {
                map.by_section_id
                    .entry(section.id.clone())
                    .or_insert_with(|| anchor.clone());
            }
        }

        map
    }

    /// Anchor of a section.
    pub fn for_section(&self, section: &Section) -> Option<&str> {
        self.by_section_id
            .get(&section.id)
            .or_else(|| self.by_reference.get(&normalize_reference(&section.href)))
            .map(String::as_str)
    }

    /// Anchor of the section a reference points at, if any.
    ///
    /// The reference is normalized first, so `../text/ch1.xhtml#p2` finds the
    /// section registered as `ch1.xhtml`.
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        let normalized = normalize_reference(reference);
        if normalized.is_empty() {
            return None;
        }
        self.by_reference.get(&normalized).map(String::as_str)
    }

    /// Anchor registered under a section id.
    pub fn by_section_id(&self, id: &str) -> Option<&str> {
        self.by_section_id.get(id).map(String::as_str)
    }

    /// Every distinct anchor token.
    pub fn anchors(&self) -> HashSet<&str> {
        self.by_reference
            .values()
            .chain(self.by_section_id.values())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reference.is_empty() && self.by_section_id.is_empty()
    }
}

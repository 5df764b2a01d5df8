//! Pre-pass indexing every identifier the rewrite rules may be asked about.
//!
//! The index is built over the whole book before any section is rendered, so
//! a link in the first chapter can point at a heading in the last one.

use std::collections::{HashMap, HashSet};

use crate::book::Section;
use crate::dom::{ArenaDom, parse_html};
use crate::import::DocumentReader;
use crate::normalize::{headings, identifiers, prepare_section};
use crate::policy::{FootnotePolicy, TitlePolicy};

use super::ChapterAnchorMap;

/// Fragment identifier to plain-text heading label.
///
/// A heading is reachable through its own id and the id of every element
/// nested in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingTextMap {
    labels: HashMap<String, String>,
}

impl HeadingTextMap {
    pub fn get(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.labels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether some identifier resolves to this label.
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.values().any(|l| l == label)
    }

    // First registration wins when books reuse an id across files.
    fn record(&mut self, id: String, label: &str) {
        self.labels.entry(id).or_insert_with(|| label.to_string());
    }
}

/// Heading text as it can appear inside `[[#...]]`.
///
/// Obsidian cannot match `|`, `#`, `^`, `[` or `]` in a heading link; they
/// become spaces and whitespace runs collapse.
pub fn heading_label(text: &str) -> String {
    text.split(['|', '#', '^', '[', ']'])
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything the rewrite rules need to know about identifiers across the
/// book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    /// Heading labels by identifier.
    pub headings: HeadingTextMap,
    /// Identifiers rendered as `^id` block suffixes.
    pub block_ids: HashSet<String>,
    /// Identifiers targeted by footnote references.
    pub note_refs: HashSet<String>,
    /// Identifiers of elements rendered as `[^id]: ...` note bodies.
    pub note_definitions: HashSet<String>,
}

impl SectionIndex {
    /// Index every section of a book in reading order.
    ///
    /// Sections that cannot be loaded are skipped here and reported when
    /// rendering.
    pub fn build<R: DocumentReader + ?Sized>(
        reader: &mut R,
        anchors: &ChapterAnchorMap,
        titles: &TitlePolicy,
        footnotes: &FootnotePolicy,
    ) -> Self {
        let mut index = Self::default();
        let sections: Vec<Section> = reader.sections().to_vec();

        for section in &sections {
            match reader.load_section(section) {
                Ok(markup) => {
                    index.add_section(&markup, anchors.for_section(section), titles, footnotes)
                }
                Err(e) => log::debug!("skipping section '{}' while indexing: {e}", section.href),
            }
        }

        if footnotes.require_reference {
            let refs = &index.note_refs;
            index.note_definitions.retain(|id| refs.contains(id));
        }

        log::debug!(
            "indexed {} heading anchors, {} block ids, {} footnote references",
            index.headings.len(),
            index.block_ids.len(),
            index.note_refs.len()
        );
        index
    }

    /// Index one section's markup.
    pub fn add_section(
        &mut self,
        markup: &str,
        chapter_anchor: Option<&str>,
        titles: &TitlePolicy,
        footnotes: &FootnotePolicy,
    ) {
        if markup.trim().is_empty() {
            return;
        }
        let mut dom = parse_html(markup);
        prepare_section(&mut dom, chapter_anchor, titles);
        self.add_tree(&dom, footnotes);
    }

    fn add_tree(&mut self, dom: &ArenaDom, footnotes: &FootnotePolicy) {
        let body = dom.body();

        for heading in headings(dom, body) {
            let label = heading_label(&dom.plain_text(heading));
            if label.is_empty() {
                continue;
            }
            for id in identifiers(dom, heading) {
                self.headings.record(id, &label);
            }
            for node in dom.descendants(heading) {
                for id in identifiers(dom, node) {
                    self.headings.record(id, &label);
                }
            }
        }

        for node in dom.descendants(body) {
            let Some(tag) = dom.tag(node) else {
                continue;
            };
            if tag == "a" {
                if let Some(href) = dom.get_attr(node, "href")
                    && let Some(target) = footnotes.reference_target(href, &dom.plain_text(node))
                {
                    self.note_refs.insert(target.to_string());
                }
                continue;
            }

            let Some(id) = dom.element_id(node) else {
                continue;
            };
            let is_note = footnotes.is_definition(
                tag,
                &dom.plain_text(node),
                dom.get_attr(node, "epub:type"),
                dom.get_attr(node, "role"),
                dom.classes(node),
            );
            if is_note {
                self.note_definitions.insert(id.to_string());
            }
            if matches!(tag, "p" | "li" | "blockquote") {
                self.block_ids.insert(id.to_string());
            }
        }
    }

    pub fn heading(&self, id: &str) -> Option<&str> {
        self.headings.get(id)
    }

    /// Whether `^id` exists in the output. Note bodies become `[^id]:`
    /// definitions instead.
    pub fn is_block_id(&self, id: &str) -> bool {
        self.block_ids.contains(id) && !self.note_definitions.contains(id)
    }

    pub fn is_note_definition(&self, id: &str) -> bool {
        self.note_definitions.contains(id)
    }

    pub fn is_note_ref(&self, id: &str) -> bool {
        self.note_refs.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::MemoryReader;

    fn index_one(markup: &str, section: Section) -> SectionIndex {
        let mut reader = MemoryReader::default();
        reader.add_section(section, markup);
        let anchors = ChapterAnchorMap::build(reader.sections());
        SectionIndex::build(
            &mut reader,
            &anchors,
            &TitlePolicy::default(),
            &FootnotePolicy::default(),
        )
    }

    #[test]
    fn test_nested_anchor_in_heading_resolves_to_label() {
        let index = index_one(
            r#"
            <div id="_idContainer004">
                <h1 id="_idParaDest-1" class="scribe_chapter-title">
                    <span class="scribe_running-header-text">
                        <a id="_idTextAnchor000"/>Important Notes On This Book (Disclaimer)
                    </span>
                </h1>
                <p>Some content...</p>
            </div>
            "#,
            Section::new("chapter1", "chapter1.html"),
        );

        let label = "Important Notes On This Book (Disclaimer)";
        assert_eq!(index.heading("_idTextAnchor000"), Some(label));
        assert_eq!(index.heading("_idParaDest-1"), Some(label));
        assert_eq!(index.heading("_idContainer004"), Some(label));
        assert_eq!(index.heading("chapter1"), Some(label));
    }

    #[test]
    fn test_complex_nesting_collapses_text() {
        let index = index_one(
            r#"
            <h2>
                <span id="nested-span">
                    <a id="deep-anchor"></a>
                    Chapter <strong>Two</strong>
                </span>
            </h2>
            "#,
            Section::new("c1", "c1.html"),
        );

        assert_eq!(index.heading("nested-span"), Some("Chapter Two"));
        assert_eq!(index.heading("deep-anchor"), Some("Chapter Two"));
    }

    #[test]
    fn test_empty_headings_are_skipped() {
        let index = index_one(
            r#"<h1 id="blank"> <img src="a.png"/> </h1><p id="p1">Text</p>"#,
            Section::new("c1", "c1.html"),
        );
        assert_eq!(index.heading("blank"), None);
        assert!(index.is_block_id("p1"));
        // No heading with text: the chapter anchor lands on a marker paragraph
        assert!(index.is_block_id("c1"));
    }

    #[test]
    fn test_collects_footnote_references() {
        let index = index_one(
            r##"<p>Claim<a href="#fn1">[1]</a> and <a href="#sec">elsewhere</a>.</p>"##,
            Section::new("c1", "c1.html"),
        );
        assert!(index.is_note_ref("fn1"));
        assert!(!index.is_note_ref("sec"));
    }

    #[test]
    fn test_note_bodies_are_not_block_ids() {
        let index = index_one(
            r##"<p id="p1">Claim<a href="#fn1">1</a>.</p><p id="fn1">1. The note body.</p>"##,
            Section::new("c1", "c1.html"),
        );
        assert!(index.is_note_definition("fn1"));
        assert!(!index.is_block_id("fn1"));
        assert!(index.is_block_id("p1"));
    }

    #[test]
    fn test_unreferenced_note_stays_a_block_when_references_are_required() {
        let mut reader = MemoryReader::default();
        reader.add_section(
            Section::new("c1", "c1.html"),
            r##"<p>Claim<a href="#fn1">1</a>.</p><p id="fn1">1. Cited.</p><p id="fn2">2. Orphan.</p>"##,
        );
        let anchors = ChapterAnchorMap::build(reader.sections());
        let footnotes = FootnotePolicy {
            require_reference: true,
            ..Default::default()
        };
        let index = SectionIndex::build(&mut reader, &anchors, &TitlePolicy::default(), &footnotes);

        assert!(!index.is_block_id("fn1"));
        assert!(index.is_block_id("fn2"));
    }

    #[test]
    fn test_heading_labels_drop_link_syntax() {
        assert_eq!(heading_label("Part #1 | The [Start]"), "Part 1 The Start");
        assert_eq!(heading_label("x^2"), "x 2");
        assert_eq!(heading_label("Plain"), "Plain");

        let index = index_one(r#"<h2 id="h">Why | How</h2>"#, Section::new("c1", "c1.html"));
        assert_eq!(index.heading("h"), Some("Why How"));
    }

    #[test]
    fn test_indexing_is_idempotent() {
        let mut reader = MemoryReader::default();
        reader.add_section(
            Section::new("a", "a.xhtml"),
            r#"<a id="x"></a><h3>Alpha</h3><p id="b1">Body</p>"#,
        );
        reader.add_section(
            Section::new("b", "b.xhtml"),
            r##"<p class="chapter-title">Beta</p><p><a href="#n1">1</a></p>"##,
        );
        let anchors = ChapterAnchorMap::build(reader.sections());
        let titles = TitlePolicy::default();
        let footnotes = FootnotePolicy::default();

        let first = SectionIndex::build(&mut reader, &anchors, &titles, &footnotes);
        let second = SectionIndex::build(&mut reader, &anchors, &titles, &footnotes);
        assert_eq!(first, second);
        assert_eq!(first.heading("x"), Some("Alpha"));
        assert_eq!(first.heading("b"), Some("Beta"));
    }

    #[test]
    fn test_unreadable_section_is_skipped() {
        let mut reader = MemoryReader::default();
        reader.add_missing_section(Section::new("gone", "gone.xhtml"));
        reader.add_section(Section::new("ok", "ok.xhtml"), "<h1>Fine</h1>");
        let anchors = ChapterAnchorMap::build(reader.sections());

        let index = SectionIndex::build(
            &mut reader,
            &anchors,
            &TitlePolicy::default(),
            &FootnotePolicy::default(),
        );
        assert_eq!(index.heading("ok"), Some("Fine"));
        assert_eq!(index.heading("gone"), None);
    }
}

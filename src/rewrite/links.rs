//! Links between and inside sections → wikilinks into the same note.

use crate::anchor::{ChapterAnchorMap, SectionIndex, heading_label};
use crate::markdown::{NodeRef, Rule, single_line};
use crate::util::percent_decode;

const EXTERNAL_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Every `a` element not claimed by an earlier rule.
///
/// External links stay Markdown links. Internal ones become `[[#Label|text]]`
/// when they land on a heading and `[[#^id|text]]` when they land on a block.
/// References that resolve to nothing degrade to their text.
pub struct InternalLinkRule<'a> {
    anchors: &'a ChapterAnchorMap,
    index: &'a SectionIndex,
}

impl<'a> InternalLinkRule<'a> {
    pub fn new(anchors: &'a ChapterAnchorMap, index: &'a SectionIndex) -> Self {
        Self { anchors, index }
    }

    /// Link to a whole section, through its first heading when it has one.
    fn section_link(&self, anchor: &str, text: &str) -> String {
        match self.index.heading(anchor) {
            Some(label) => heading_link(label, text),
            None => block_link(anchor, text),
        }
    }

    fn internal(&self, href: &str, text: &str) -> Option<String> {
        let Some((file, fragment)) = href.split_once('#') else {
            return self
                .anchors
                .resolve(href)
                .map(|anchor| self.section_link(anchor, text));
        };

        if fragment.is_empty() {
            if file.is_empty() {
                return None;
            }
            return self
                .anchors
                .resolve(file)
                .map(|anchor| self.section_link(anchor, text));
        }

        if let Some(label) = self.index.heading(fragment) {
            return Some(heading_link(label, text));
        }
        if self.index.is_block_id(fragment) {
            return Some(block_link(fragment, text));
        }
        if file.is_empty() {
            return None;
        }
        self.anchors
            .resolve(file)
            .map(|anchor| self.section_link(anchor, text))
    }
}

fn is_external(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    EXTERNAL_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

/// `[[#Label|text]]`, text defaulting to the label.
fn heading_link(label: &str, text: &str) -> String {
    let label = heading_label(label);
    let text = if text.is_empty() { label.as_str() } else { text };
    format!("[[#{label}|{text}]]")
}

/// `[[#^id|text]]`, text defaulting to the id.
fn block_link(id: &str, text: &str) -> String {
    let text = if text.is_empty() { id } else { text };
    format!("[[#^{id}|{text}]]")
}

impl Rule for InternalLinkRule<'_> {
    fn name(&self) -> &str {
        "internal-link"
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        node.is("a")
    }

    fn replace(&self, content: &str, node: NodeRef<'_>) -> String {
        let Some(raw) = node.attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            return content.to_string();
        };
        let text = single_line(content);

        if is_external(raw) {
            if text.is_empty() {
                return content.to_string();
            }
            return format!("[{text}]({raw})");
        }

        let href = percent_decode(raw);
        match self.internal(&href, &text) {
            Some(link) => link,
            None => {
                log::trace!("unresolved reference '{raw}' left as text");
                content.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Section;
    use crate::dom::parse_html;
    use crate::markdown::{RuleSet, render_markdown};

    fn fixture() -> (ChapterAnchorMap, SectionIndex) {
        let anchors = ChapterAnchorMap::build(&[
            Section::new("c1", "text/chapter1.xhtml"),
            Section::new("c2", "text/chapter%202.xhtml"),
            Section::new("c3", "text/plates.xhtml"),
        ]);
        let mut index = SectionIndex::default();
        index.add_section(
            r#"<h1 id="top">Chapter One</h1><h2 id="sec">A Section</h2><p id="para">Text</p><p id="fn1">1. A note.</p>"#,
            anchors.by_section_id("c1"),
            &Default::default(),
            &Default::default(),
        );
        index.add_section(
            "<h1>Chapter Two</h1>",
            anchors.by_section_id("c2"),
            &Default::default(),
            &Default::default(),
        );
        index.add_section(
            r#"<p>No heading here</p>"#,
            anchors.by_section_id("c3"),
            &Default::default(),
            &Default::default(),
        );
        (anchors, index)
    }

    fn render(html: &str) -> String {
        let (anchors, index) = fixture();
        let dom = parse_html(html);
        let mut rules = RuleSet::new();
        rules.add(InternalLinkRule::new(&anchors, &index));
        render_markdown(&dom, &rules)
    }

    #[test]
    fn test_external_links() {
        assert_eq!(
            render(r#"<p><a href="https://example.com/a%20b">Site</a></p>"#),
            "[Site](https://example.com/a%20b)"
        );
        assert_eq!(
            render(r#"<p><a href="mailto:me@example.com">mail</a></p>"#),
            "[mail](mailto:me@example.com)"
        );
    }

    #[test]
    fn test_fragment_to_heading() {
        assert_eq!(render(r##"<p><a href="#sec">see</a></p>"##), "[[#A Section|see]]");
        assert_eq!(
            render(r##"<p><a href="chapter1.xhtml#sec"></a></p>"##),
            "[[#A Section|A Section]]"
        );
    }

    #[test]
    fn test_fragment_to_block() {
        assert_eq!(render(r##"<p><a href="#para">here</a></p>"##), "[[#^para|here]]");
    }

    #[test]
    fn test_link_to_note_body_is_not_a_block_link() {
        assert_eq!(render(r##"<p><a href="#fn1">see the note</a></p>"##), "see the note");
        assert_eq!(
            render(r##"<p><a href="chapter1.xhtml#fn1">see the note</a></p>"##),
            "[[#Chapter One|see the note]]"
        );
    }

    #[test]
    fn test_heading_label_is_sanitized_when_emitted() {
        assert_eq!(heading_link("Q&A | Part #2", "go"), "[[#Q&A Part 2|go]]");
        assert_eq!(heading_link("[Draft]", ""), "[[#Draft|Draft]]");
    }

    #[test]
    fn test_unknown_fragment_falls_back_to_section() {
        assert_eq!(
            render(r##"<p><a href="chapter1.xhtml#missing">one</a></p>"##),
            "[[#Chapter One|one]]"
        );
    }

    #[test]
    fn test_unresolved_fragment_is_plain_text() {
        assert_eq!(render(r##"<p><a href="#ghost">see</a></p>"##), "see");
        assert_eq!(render(r##"<p><a href="nowhere.xhtml#ghost">see</a></p>"##), "see");
    }

    #[test]
    fn test_chapter_links() {
        assert_eq!(
            render(r#"<p><a href="../text/chapter%202.xhtml">next</a></p>"#),
            "[[#Chapter Two|next]]"
        );
        assert_eq!(
            render(r#"<p><a href="plates.xhtml">plates</a></p>"#),
            "[[#^plates|plates]]"
        );
        assert_eq!(render(r#"<p><a href="missing.xhtml">gone</a></p>"#), "gone");
    }

    #[test]
    fn test_anchor_without_href_keeps_content() {
        assert_eq!(render(r#"<p><a id="x">text</a></p>"#), "text");
        assert_eq!(render(r##"<p><a href="#">top</a></p>"##), "top");
    }
}

//! Identified blocks keep their identifier as an Obsidian block reference.

use crate::markdown::{NodeRef, Rule, block, blockquote, heading, list_item, trim_block};
use crate::normalize::ZERO_WIDTH_MARKER;

const BLOCK_TAGS: &[&str] = &["p", "li", "blockquote"];

/// Identified `p`, `li`, `blockquote` and headings.
///
/// Headings stay ATX headings; links reach them through their label. The
/// other blocks end with ` ^id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockIdRule;

impl Rule for BlockIdRule {
    fn name(&self) -> &str {
        "block-id"
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        node.id().is_some() && (node.heading_level().is_some() || BLOCK_TAGS.contains(&node.tag()))
    }

    fn replace(&self, content: &str, node: NodeRef<'_>) -> String {
        let Some(id) = node.id() else {
            return content.to_string();
        };

        if let Some(level) = node.heading_level() {
            return heading(level, content);
        }

        match node.tag() {
            "li" => {
                let item = list_item(content, node);
                format!("{} ^{id}\n", item.trim_end())
            }
            "blockquote" => blockquote(content, Some(id)),
            _ => {
                let text = trim_block(content);
                let text = if text.is_empty() { ZERO_WIDTH_MARKER } else { text };
                block(&format!("{text} ^{id}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;
    use crate::markdown::{RuleSet, render_markdown};

    fn render(html: &str) -> String {
        let dom = parse_html(html);
        let mut rules = RuleSet::new();
        rules.add(BlockIdRule);
        render_markdown(&dom, &rules)
    }

    #[test]
    fn test_paragraph_block_id() {
        assert_eq!(
            render(r#"<p id="p1">Some <em>text</em>.</p><p>Next</p>"#),
            "Some *text*. ^p1\n\nNext"
        );
    }

    #[test]
    fn test_list_items() {
        assert_eq!(render(r#"<ul><li id="a">One</li><li>Two</li></ul>"#), "- One ^a\n- Two");
        assert_eq!(render(r#"<ol><li>One</li><li id="b">Two</li></ol>"#), "1. One\n2. Two ^b");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render(r#"<blockquote id="q"><p>Quoted</p></blockquote>"#),
            "> Quoted\n\n^q"
        );
        assert_eq!(
            render(r#"<blockquote id="q"><p id="p1">Quoted</p></blockquote>"#),
            "> Quoted ^p1\n\n^q"
        );
    }

    #[test]
    fn test_heading_is_never_degraded() {
        assert_eq!(render(r#"<h2 id="h">Title <a id="x"></a></h2>"#), "## Title");
    }

    #[test]
    fn test_empty_paragraph_gets_marker() {
        assert_eq!(render(r#"<p id="ch1"></p><p>Body</p>"#), "\u{200B} ^ch1\n\nBody");
        assert_eq!(render("<p id=\"ch1\">\u{200B}</p>"), "\u{200B} ^ch1");
    }

    #[test]
    fn test_unidentified_blocks_use_defaults() {
        assert_eq!(render("<h3>Plain</h3><p>Body</p>"), "### Plain\n\nBody");
    }
}

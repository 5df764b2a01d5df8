//! Arena DOM → Markdown conversion.
//!
//! Conversion runs bottom-up: every element first converts its children, then
//! either the first matching [`Rule`](super::Rule) or the default conversion
//! for its [`Role`] turns that content into Markdown. Block output is padded
//! with blank lines and [`join`] collapses adjacent padding to a single blank
//! line, so rules never need to know what surrounds them.

use crate::dom::{ArenaDom, NodeData, NodeId, Role, element_to_role};

use super::escape::{code_fence, escape_markdown, inline_code_delimiter};
use super::rules::{NodeRef, RuleSet};

/// Conversion state for one tree.
pub struct RenderContext<'a, 'r> {
    dom: &'a ArenaDom,
    rules: &'a RuleSet<'r>,
}

impl<'a, 'r> RenderContext<'a, 'r> {
    pub fn new(dom: &'a ArenaDom, rules: &'a RuleSet<'r>) -> Self {
        Self { dom, rules }
    }

    /// Convert the document body.
    pub fn render(&self) -> String {
        let body = self.convert_children(self.dom.body());
        clean_output(&body)
    }

    fn convert_children(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.dom.children(id) {
            let piece = self.convert_node(child);
            join(&mut out, &piece);
        }
        out
    }

    fn convert_node(&self, id: NodeId) -> String {
        let Some(node) = self.dom.get(id) else {
            return String::new();
        };

        match &node.data {
            NodeData::Text(text) => convert_text(text),
            NodeData::Element { .. } => self.convert_element(id),
            NodeData::Document => self.convert_children(id),
            NodeData::Comment(_) | NodeData::Doctype => String::new(),
        }
    }

    fn convert_element(&self, id: NodeId) -> String {
        let node = NodeRef::new(self.dom, id);
        let role = element_to_role(node.tag());
        let rule = self.rules.find(node);

        if let Some(rule) = rule {
            let content = self.convert_children(id);
            log::trace!("rule '{}' converts <{}>", rule.name(), node.tag());
            return rule.replace(&content, node);
        }

        match role {
            Role::Ignored => String::new(),
            Role::CodeBlock => self.code_block(id),
            Role::Table => self.table(id),
            Role::Code => inline_code(&self.dom.raw_text(id)),
            Role::Image => {
                let alt = node.attr("alt").unwrap_or_default();
                match node.attr("src") {
                    Some(src) if !src.is_empty() => format!("![{alt}]({src})"),
                    _ => String::new(),
                }
            }
            _ => {
                let content = self.convert_children(id);
                default_conversion(role, &content, node)
            }
        }
    }

    fn code_block(&self, id: NodeId) -> String {
        let code = self.dom.raw_text(id);
        let code = code.trim_matches('\n');
        let language = self
            .dom
            .children(id)
            .find(|&c| self.dom.is_tag(c, "code"))
            .and_then(|c| {
                self.dom
                    .classes(c)
                    .find_map(|class| class.strip_prefix("language-"))
                    .map(str::to_string)
            })
            .unwrap_or_default();
        let fence = code_fence(code);
        format!("\n\n{fence}{language}\n{code}\n{fence}\n\n")
    }

    /// Pipe table with the first row as header.
    fn table(&self, id: NodeId) -> String {
        let rows: Vec<Vec<String>> = self
            .dom
            .descendants(id)
            .into_iter()
            .filter(|&row| {
                self.dom.is_tag(row, "tr")
                    && self.dom.ancestors(row).find(|&a| self.dom.is_tag(a, "table")) == Some(id)
            })
            .map(|row| {
                self.dom
                    .children(row)
                    .filter(|&cell| self.dom.is_tag(cell, "td") || self.dom.is_tag(cell, "th"))
                    .map(|cell| {
                        let content = self.convert_children(cell);
                        content.split_whitespace().collect::<Vec<_>>().join(" ")
                    })
                    .collect()
            })
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();

        let Some(columns) = rows.iter().map(Vec::len).max() else {
            return String::new();
        };

        let mut out = String::from("\n\n");
        for (i, row) in rows.iter().enumerate() {
            out.push('|');
            for col in 0..columns {
                let cell = row.get(col).map(String::as_str).unwrap_or_default();
                out.push(' ');
                out.push_str(cell);
                out.push_str(" |");
            }
            out.push('\n');
            if i == 0 {
                out.push('|');
                out.push_str(&" --- |".repeat(columns));
                out.push('\n');
            }
        }
        out.push('\n');
        out
    }
}

/// Convert a whole tree with the given rules.
pub fn render_markdown(dom: &ArenaDom, rules: &RuleSet<'_>) -> String {
    RenderContext::new(dom, rules).render()
}

fn default_conversion(role: Role, content: &str, node: NodeRef<'_>) -> String {
    match role {
        Role::Paragraph | Role::Container | Role::TableRow => block(content),
        Role::Heading(level) => heading(level, content),
        Role::Break => "\\\n".to_string(),
        Role::Rule => "\n\n---\n\n".to_string(),
        Role::Emphasis => wrap_inline(content, "*"),
        Role::Strong => wrap_inline(content, "**"),
        Role::Strikethrough => wrap_inline(content, "~~"),
        Role::Highlight => wrap_inline(content, "=="),
        Role::Link => match node.attr("href") {
            Some(href) if !href.is_empty() && !content.trim().is_empty() => {
                format!("[{}]({href})", content.trim())
            }
            _ => content.to_string(),
        },
        Role::UnorderedList | Role::OrderedList | Role::DefinitionList => block(content),
        Role::ListItem => list_item(content, node),
        Role::BlockQuote => blockquote(content, None),
        Role::DefinitionTerm => format!("\n\n**{}**\n", trim_block(content)),
        Role::DefinitionDescription => format!(": {}\n", trim_block(content)),
        Role::Caption => {
            let caption = trim_block(content);
            if caption.is_empty() {
                String::new()
            } else {
                format!("\n\n*{caption}*\n\n")
            }
        }
        Role::TableCell | Role::Inline => content.to_string(),
        Role::Ignored => String::new(),
        // Converted without their content by the context
        Role::Code | Role::CodeBlock | Role::Table | Role::Image => content.to_string(),
    }
}

// ----------------------------------------------------------------------------
// Building blocks, shared with the rewrite rules
// ----------------------------------------------------------------------------

/// Pad content as a block.
pub fn block(content: &str) -> String {
    let content = trim_block(content);
    if content.is_empty() {
        return String::new();
    }
    format!("\n\n{content}\n\n")
}

/// Trim block padding, and a hard break left dangling at the end.
pub fn trim_block(content: &str) -> &str {
    let trimmed = content.trim_matches(|c: char| c == '\n' || c == ' ' || c == '\t');
    trimmed
        .strip_suffix('\\')
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// ATX heading on a single line.
pub fn heading(level: u8, content: &str) -> String {
    let text = single_line(content);
    if text.is_empty() {
        return String::new();
    }
    format!("\n\n{} {text}\n\n", "#".repeat(level.into()))
}

/// Collapse content onto one line.
pub fn single_line(content: &str) -> String {
    content
        .replace("\\\n", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// List item with continuation lines indented under its marker.
pub fn list_item(content: &str, node: NodeRef<'_>) -> String {
    let prefix = list_marker(node);
    let body = indent(trim_block(content), prefix.len());
    format!("{prefix}{body}\n")
}

fn list_marker(node: NodeRef<'_>) -> String {
    let Some(parent) = node.parent().filter(|p| p.is("ol")) else {
        return "- ".to_string();
    };
    let start: usize = parent
        .attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);
    let position = parent
        .children()
        .filter(|c| c.is("li"))
        .position(|c| c.node_id() == node.node_id())
        .unwrap_or(0);
    format!("{}. ", start + position)
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blockquote, optionally followed by a block identifier.
///
/// The identifier goes on its own line after the quote, where Obsidian
/// attaches it to the whole quote rather than its last paragraph.
pub fn blockquote(content: &str, block_id: Option<&str>) -> String {
    let body = trim_block(content);
    if body.is_empty() && block_id.is_none() {
        return String::new();
    }
    let mut quoted = body
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if quoted.is_empty() {
        quoted.push('>');
    }
    if let Some(id) = block_id {
        quoted.push_str("\n\n^");
        quoted.push_str(id);
    }
    format!("\n\n{quoted}\n\n")
}

/// Wrap inline content in a delimiter, keeping edge whitespace outside.
fn wrap_inline(content: &str, delimiter: &str) -> String {
    let inner = content.trim();
    if inner.is_empty() {
        return content.to_string();
    }
    let leading = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trailing = if content.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{leading}{delimiter}{inner}{delimiter}{trailing}")
}

fn inline_code(code: &str) -> String {
    let code = code.split_whitespace().collect::<Vec<_>>().join(" ");
    if code.is_empty() {
        return String::new();
    }
    let ticks = inline_code_delimiter(&code);
    let spacer = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{ticks}{spacer}{code}{spacer}{ticks}")
}

/// Collapse whitespace and escape a text node, keeping one space at each
/// edge that had any.
fn convert_text(text: &str) -> String {
    let text: String = text
        .chars()
        .filter(|&c| c != '\u{00AD}' && c != '\u{FEFF}')
        .collect();
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return if text.is_empty() {
            String::new()
        } else {
            " ".to_string()
        };
    }

    let mut out = String::new();
    if text.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&escape_markdown(&words.join(" ")));
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out
}

fn is_pad(c: char) -> bool {
    c == ' ' || c == '\n'
}

/// Append a converted piece, merging the whitespace where they meet.
///
/// Newlines on either side of the seam win over spaces, and at most one blank
/// line survives.
pub fn join(out: &mut String, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if out.is_empty() {
        out.push_str(piece);
        return;
    }

    let tail_start = out.trim_end_matches(is_pad).len();
    let tail = &out[tail_start..];
    let head_end = piece.len() - piece.trim_start_matches(is_pad).len();
    let head = &piece[..head_end];

    let newlines = tail.matches('\n').count().max(head.matches('\n').count()).min(2);
    let spaces = tail.contains(' ') || head.contains(' ');

    if newlines == 0 && !spaces {
        out.push_str(piece);
        return;
    }

    out.truncate(tail_start);
    if newlines > 0 {
        out.push_str(&"\n".repeat(newlines));
    } else {
        out.push(' ');
    }
    out.push_str(&piece[head_end..]);
}

/// Final cleanup: no trailing spaces, no whitespace-only lines, no blank
/// padding at either end. Fenced code is copied as is.
fn clean_output(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut blank_run = 0;
    let mut fence = None;
    for line in markdown.lines() {
        if let Some(open) = fence {
            if closes_fence(line, open) {
                fence = None;
            }
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let line = line.trim_end_matches([' ', '\t']);
        fence = opening_fence(line);
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim_matches('\n').to_string()
}

/// Length of the backtick run opening a fenced code block.
fn opening_fence(line: &str) -> Option<usize> {
    let line = line.trim_start();
    let run = line.chars().take_while(|&c| c == '`').count();
    (run >= 3 && !line[run..].contains('`')).then_some(run)
}

fn closes_fence(line: &str, open: usize) -> bool {
    let line = line.trim();
    line.len() >= open && line.chars().all(|c| c == '`')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn render(html: &str) -> String {
        let dom = parse_html(html);
        render_markdown(&dom, &RuleSet::new())
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(render("<p>Hello, World!</p>"), "Hello, World!");
    }

    #[test]
    fn test_paragraphs_are_separated_by_one_blank_line() {
        assert_eq!(
            render("<div><p>One</p>\n\n   <p>Two</p></div><p>Three</p>"),
            "One\n\nTwo\n\nThree"
        );
    }

    #[test]
    fn test_heading() {
        assert_eq!(
            render("<h2>Chapter <em>One</em></h2><p>Text</p>"),
            "## Chapter *One*\n\nText"
        );
    }

    #[test]
    fn test_inline_whitespace_is_collapsed() {
        assert_eq!(
            render("<p>  Some   <b>bold</b>\n text <i> spaced </i>end</p>"),
            "Some **bold** text *spaced* end"
        );
    }

    #[test]
    fn test_obsidian_inline_marks() {
        assert_eq!(
            render("<p><del>old</del> and <mark>key</mark></p>"),
            "~~old~~ and ==key=="
        );
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            render("<ul>\n<li>Item one</li>\n<li>Item two</li>\n</ul>"),
            "- Item one\n- Item two"
        );
    }

    #[test]
    fn test_ordered_list_with_start() {
        assert_eq!(
            render(r#"<ol start="3"><li>Three</li><li>Four</li></ol>"#),
            "3. Three\n4. Four"
        );
    }

    #[test]
    fn test_list_item_continuation_is_indented() {
        assert_eq!(
            render("<ol><li><p>First</p><p>More</p></li></ol>"),
            "1. First\n\n   More"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render("<blockquote><p>One</p><p>Two</p></blockquote>"),
            "> One\n>\n> Two"
        );
    }

    #[test]
    fn test_identified_blockquote_keeps_inner_ids() {
        assert_eq!(
            blockquote("Quoted ^p1", Some("q")),
            "\n\n> Quoted ^p1\n\n^q\n\n"
        );
        assert_eq!(blockquote("", Some("q")), "\n\n>\n\n^q\n\n");
    }

    #[test]
    fn test_line_break() {
        assert_eq!(render("<p>Line one<br/>Line two<br/></p>"), "Line one\\\nLine two");
    }

    #[test]
    fn test_code_block_fence_grows() {
        assert_eq!(
            render("<pre><code class=\"language-rust\">let a = \"```\";\n</code></pre>"),
            "````rust\nlet a = \"```\";\n````"
        );
    }

    #[test]
    fn test_code_block_keeps_blank_lines() {
        assert_eq!(
            render("<p>Before</p><pre>first\n\n\n\nlast  \n</pre><p>After</p>"),
            "Before\n\n```\nfirst\n\n\n\nlast  \n```\n\nAfter"
        );
    }

    #[test]
    fn test_fence_detection() {
        assert_eq!(opening_fence("```rust"), Some(3));
        assert_eq!(opening_fence("   ````"), Some(4));
        assert_eq!(opening_fence("``` a``b ```"), None);
        assert_eq!(opening_fence("``x"), None);
        assert!(closes_fence("````", 3));
        assert!(!closes_fence("```", 4));
        assert!(!closes_fence("``` x", 3));
    }

    #[test]
    fn test_inline_code_is_not_escaped() {
        assert_eq!(render("<p>Use <code>a_b*</code> here</p>"), "Use `a_b*` here");
    }

    #[test]
    fn test_markdown_escaping() {
        assert_eq!(render("<p>*bold* and _italic_</p>"), "\\*bold\\* and \\_italic\\_");
    }

    #[test]
    fn test_scripts_and_head_are_dropped() {
        assert_eq!(
            render("<html><head><title>T</title><style>p{}</style></head><body><p>Body</p><script>x()</script></body></html>"),
            "Body"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            render("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>"),
            "| A | B |\n| --- | --- |\n| 1 | 2 |"
        );
    }

    #[test]
    fn test_definition_list() {
        assert_eq!(
            render("<dl><dt>Term</dt><dd>Meaning</dd></dl>"),
            "**Term**\n: Meaning"
        );
    }

    #[test]
    fn test_default_link_and_image() {
        assert_eq!(
            render(r#"<p><a href="https://example.com">site</a> <img src="a.png" alt="A"/></p>"#),
            "[site](https://example.com) ![A](a.png)"
        );
    }

    #[test]
    fn test_join_merges_padding() {
        let mut out = String::from("a\n\n");
        join(&mut out, "\n\n\nb");
        assert_eq!(out, "a\n\nb");

        let mut out = String::from("a ");
        join(&mut out, " b");
        assert_eq!(out, "a b");

        let mut out = String::from("- a\n");
        join(&mut out, " ");
        join(&mut out, "- b\n");
        assert_eq!(out, "- a\n- b\n");
    }
}

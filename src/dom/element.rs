//! Maps HTML elements to the Markdown constructs they render as.

/// What an element turns into in Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Block wrapper with no syntax of its own.
    Container,
    Paragraph,
    Heading(u8),
    Break,
    Rule,
    Emphasis,
    Strong,
    /// `~~text~~`
    Strikethrough,
    /// `==text==`, Obsidian's highlight
    Highlight,
    Code,
    CodeBlock,
    Link,
    Image,
    UnorderedList,
    OrderedList,
    ListItem,
    BlockQuote,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    Table,
    TableRow,
    TableCell,
    Caption,
    /// Inline wrapper with no syntax of its own.
    Inline,
    /// Never rendered.
    Ignored,
}

impl Role {
    /// Whether the role renders as its own block, separated by blank lines.
    pub fn is_block(self) -> bool {
        !matches!(
            self,
            Role::Break
                | Role::Emphasis
                | Role::Strong
                | Role::Strikethrough
                | Role::Highlight
                | Role::Code
                | Role::Link
                | Role::Inline
                | Role::Ignored
                | Role::TableCell
        )
    }
}

/// Map an HTML element name to its role.
pub fn element_to_role(local_name: &str) -> Role {
    if let Some(level) = heading_level(local_name) {
        return Role::Heading(level);
    }
    match local_name {
        "div" | "section" | "article" | "nav" | "header" | "footer" | "main" | "address"
        | "details" | "summary" | "hgroup" | "aside" | "figure" | "body" | "html"
        | "center" | "thead" | "tbody" | "tfoot" | "svg" => Role::Container,

        "br" => Role::Break,
        "hr" => Role::Rule,
        "p" => Role::Paragraph,
        "pre" => Role::CodeBlock,

        "em" | "i" | "cite" | "var" | "dfn" => Role::Emphasis,
        "strong" | "b" => Role::Strong,
        "s" | "strike" | "del" => Role::Strikethrough,
        "mark" => Role::Highlight,
        "code" | "kbd" | "samp" | "tt" => Role::Code,

        "a" => Role::Link,
        "img" | "image" => Role::Image,

        "ul" => Role::UnorderedList,
        "ol" => Role::OrderedList,
        "li" => Role::ListItem,

        "blockquote" => Role::BlockQuote,

        "dl" => Role::DefinitionList,
        "dt" => Role::DefinitionTerm,
        "dd" => Role::DefinitionDescription,

        "table" => Role::Table,
        "tr" => Role::TableRow,
        "td" | "th" => Role::TableCell,
        "figcaption" | "caption" => Role::Caption,

        "head" | "title" | "script" | "style" | "link" | "meta" | "noscript" | "template" => {
            Role::Ignored
        }

        "span" | "sup" | "sub" | "u" | "ins" | "small" | "abbr" | "time" | "q" | "label"
        | "data" | "ruby" | "rt" | "rp" | "bdi" | "bdo" | "wbr" | "font" | "big" => Role::Inline,

        _ => Role::Container,
    }
}

/// Heading level of an `h1`–`h6` tag.
pub fn heading_level(local_name: &str) -> Option<u8> {
    match local_name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

/// Elements that never have content in HTML.
pub fn is_void(local_name: &str) -> bool {
    matches!(
        local_name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

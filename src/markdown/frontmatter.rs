//! Note header: YAML frontmatter, or a plain title heading.

use crate::book::Metadata;

/// Tags every converted book carries.
const TAGS: &str = "[epub, book]";

/// YAML frontmatter block for a book, followed by a blank line.
///
/// Only fields with a value are written. `cover` is the path of the
/// extracted cover image relative to the note, when there is one.
///
/// # Examples
///
/// ```
/// use folio::book::Metadata;
/// use folio::markdown::frontmatter;
///
/// let yaml = frontmatter(&Metadata::new("Tom \"Jr\"").with_author("Ann"), None);
/// assert_eq!(yaml, "---\ntitle: \"Tom \\\"Jr\\\"\"\nauthor: \"Ann\"\ntags: [epub, book]\n---\n\n");
/// ```
pub fn frontmatter(metadata: &Metadata, cover: Option<&str>) -> String {
    let mut yaml = String::from("---\n");
    let creator = metadata.creator();
    let fields = [
        ("title", Some(metadata.title.as_str())),
        ("author", creator.as_deref()),
        ("publisher", metadata.publisher.as_deref()),
        ("language", Some(metadata.language.as_str())),
        ("date", metadata.date.as_deref()),
        ("cover", cover),
    ];

    for (key, value) in fields {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            yaml.push_str(key);
            yaml.push_str(": ");
            yaml.push_str(&quote(value));
            yaml.push('\n');
        }
    }

    yaml.push_str("tags: ");
    yaml.push_str(TAGS);
    yaml.push_str("\n---\n\n");
    yaml
}

/// Header used instead of frontmatter: the title as a level-one heading, or
/// nothing for untitled books.
pub fn title_heading(metadata: &Metadata) -> String {
    let title = metadata.title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        String::new()
    } else {
        format!("# {title}\n\n")
    }
}

/// Double-quoted YAML scalar.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' | '\r' | '\t' => out.push(' '),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

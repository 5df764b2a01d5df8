//! Escaping of book text for Obsidian, and backtick delimiters for code.
//!
//! Text nodes are escaped one at a time, so "line start" means the start of
//! the text node or the character after a newline inside it.

/// Punctuation that is special anywhere in a line.
const INLINE_SPECIAL: &[char] = &['\\', '*', '_', '[', ']', '`', '|', '<', '>', '$'];

/// Escape text so that Obsidian renders it literally.
///
/// Besides CommonMark emphasis, links, code and HTML, this covers the
/// Obsidian extensions that prose can trigger by accident: `==highlight==`,
/// `%%comment%%`, `$math$` and ` ^block` identifiers.
///
/// ```
/// use folio::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("1. Not a list"), "1\\. Not a list");
/// assert_eq!(escape_markdown("a == b"), "a \\== b");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        escape_line(line, &mut out);
    }
    out
}

fn escape_line(line: &str, out: &mut String) {
    let marker_len = block_marker_len(line);
    let chars: Vec<char> = line.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| chars[p]);
        let escape = if i + 1 == marker_len {
            // Last character of a list/heading/rule marker
            true
        } else {
            match c {
                c if INLINE_SPECIAL.contains(&c) => true,
                '!' => next == Some('['),
                '=' => next == Some('=') && prev != Some('='),
                '%' => next == Some('%') && prev != Some('%'),
                '~' => next == Some('~') && prev != Some('~'),
                '^' => prev.is_none_or(char::is_whitespace),
                _ => false,
            }
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Length in chars of a leading construct that would turn the line into a
/// block element, or 0.
///
/// `1. `, `12) `, `# `, `- `, `+ ` and a trailing `12.` all count.
fn block_marker_len(line: &str) -> usize {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let mut rest = line[digits..].chars();
        return match (rest.next(), rest.next()) {
            (Some('.' | ')'), None) => digits + 1,
            (Some('.' | ')'), Some(c)) if c.is_whitespace() => digits + 1,
            _ => 0,
        };
    }

    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some('#'), _) => 1,
        (Some('-' | '+'), None) => 1,
        (Some('-' | '+'), Some(c)) if c.is_whitespace() => 1,
        _ => 0,
    }
}

fn longest_run(content: &str, fence: char) -> usize {
    content
        .split(|c| c != fence)
        .map(|run| run.chars().count())
        .max()
        .unwrap_or(0)
}

/// Backtick fence for a code block: at least three, and longer than any
/// backtick run in `content`.
///
/// ```
/// use folio::markdown::code_fence;
///
/// assert_eq!(code_fence("let x = 1;"), "```");
/// assert_eq!(code_fence("```rust\ncode\n```"), "````");
/// ```
pub fn code_fence(content: &str) -> String {
    "`".repeat(longest_run(content, '`').max(2) + 1)
}

/// Backtick delimiter for inline code, one longer than any run in `content`.
pub fn inline_code_delimiter(content: &str) -> String {
    "`".repeat(longest_run(content, '`') + 1)
}

//! Markdown generation.
//!
//! - [`escape`]: escaping of book text and code delimiters
//! - [`rules`]: the replacement rule registry the compiler consults
//! - [`render`]: bottom-up conversion of an arena DOM to Markdown
//! - [`frontmatter`]: the note header
//!
//! ## Design Notes
//!
//! Conversion follows turndown's model rather than a two-stage IR: each
//! element's children are converted first, then a rule (or the default for
//! the element's role) wraps the result. Block output is padded with blank
//! lines and adjacent padding collapses when pieces are joined, so a rule can
//! emit `\n\n...\n\n` without knowing its neighbours.

mod escape;
mod frontmatter;
mod render;
mod rules;

pub use escape::{code_fence, escape_markdown, inline_code_delimiter};
pub use frontmatter::{frontmatter, title_heading};
pub use render::{
    RenderContext, block, blockquote, heading, join, list_item, render_markdown, single_line,
    trim_block,
};
pub use rules::{NodeRef, Rule, RuleSet};

//! Cross-document anchor resolution.
//!
//! A book arrives as many XHTML files linking into each other; it leaves as
//! one Markdown note. Before anything is rendered, two global maps are built:
//!
//! - [`ChapterAnchorMap`]: one unique token per section, so links to a whole
//!   file still have somewhere to land
//! - [`SectionIndex`]: heading labels reachable from every fragment
//!   identifier, plus the identifiers that will render as block references
//!   or footnotes
//!
//! Both are read-only once built.

mod chapter;
mod index;
mod reference;

pub use chapter::ChapterAnchorMap;
pub use index::{HeadingTextMap, SectionIndex, heading_label};
pub use reference::{normalize_reference, slugify_anchor};

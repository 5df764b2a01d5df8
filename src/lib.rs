//! # folio
//!
//! Convert EPUB books into a single Markdown note whose internal links keep
//! working in Obsidian-style vaults.
//!
//! A book is many XHTML files that link into each other by file name and
//! fragment. Flattened into one note, those targets disappear, so conversion
//! runs in two passes:
//!
//! 1. every section is indexed: each gets a unique chapter anchor, and every
//!    identifier that lands on a heading is mapped to the heading's text
//! 2. every section is rendered with rules that turn links into
//!    `[[#Heading|text]]` or `[[#^block|text]]`, footnotes into `[^id]`, and
//!    images into references to the extracted asset directory
//!
//! ## Features
//!
//! - EPUB 2/3 reading (ZIP container, OPF metadata, manifest and spine)
//! - Cross-section heading, block and footnote links
//! - Image extraction with collision-free file names
//! - YAML frontmatter from the book metadata
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use folio::{Converter, NoProgress};
//!
//! let conversion = Converter::new()
//!     .convert_file(Path::new("book.epub"), Some(Path::new("vault")), &mut NoProgress)
//!     .unwrap();
//! println!("wrote {}", conversion.output.display());
//! ```
//!
//! ## Books Built in Code
//!
//! Anything implementing [`DocumentReader`] can be converted; [`MemoryReader`]
//! assembles a book in memory:
//!
//! ```
//! use folio::{AssetRenames, Converter, MemoryReader, Metadata, NoProgress, Section};
//!
//! let mut book = MemoryReader::new(Metadata::new("My Book"));
//! book.add_section(Section::new("c1", "one.xhtml"), "<h1>One</h1>");
//! book.add_section(
//!     Section::new("c2", "two.xhtml"),
//!     r#"<p>Back to <a href="one.xhtml">the start</a>.</p>"#,
//! );
//!
//! let rendered = Converter::new().render(&mut book, AssetRenames::new(), &mut NoProgress);
//! assert!(rendered.body.contains("[[#One|the start]]"));
//! ```

pub mod anchor;
pub mod book;
pub mod convert;
pub mod dom;
pub mod error;
pub mod import;
pub mod markdown;
pub mod normalize;
pub mod policy;
pub mod rewrite;
pub(crate) mod util;

pub use anchor::{ChapterAnchorMap, HeadingTextMap, SectionIndex, normalize_reference, slugify_anchor};
pub use book::{Asset, Metadata, Section};
pub use convert::{
    AssetRenames, Conversion, ConvertConfig, Converter, Diagnostics, NoProgress, ProgressSink,
    RenderedBook, RewriteContext,
};
pub use error::{Error, Result};
pub use import::{DocumentReader, EpubReader, MemoryReader};
pub use policy::{FootnotePolicy, TitlePolicy};

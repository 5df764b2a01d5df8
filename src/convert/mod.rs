//! The conversion pipeline: book in, one Markdown note and an asset folder
//! out.
//!
//! ```text
//! sections ──► ChapterAnchorMap ──► SectionIndex ──► extract_assets
//!                                                         │
//!        for each section: parse → prepare_section → render with rules
//!                                                         │
//!                        header + section₁ --- section₂ --- … ──► <stem>.md
//! ```
//!
//! Book-wide maps are built completely before the first section is rendered
//! and are shared read-only through a [`RewriteContext`]. Failures of a single
//! section or asset are reported and skipped; only opening the book and
//! writing the note are fatal.

mod assets;
mod progress;

pub use assets::{AssetNamer, AssetRenames, extract_assets};
pub use progress::{NoProgress, ProgressSink};

use std::fs;
use std::path::{Path, PathBuf};

use crate::anchor::{ChapterAnchorMap, SectionIndex};
use crate::book::Section;
use crate::dom::parse_html;
use crate::error::Result;
use crate::import::{DocumentReader, EpubReader};
use crate::markdown::{frontmatter, render_markdown, title_heading};
use crate::normalize::{headings, prepare_section};
use crate::policy::{FootnotePolicy, TitlePolicy};
use crate::rewrite::build_rule_set;
use crate::util::percent_decode;

/// Default name of the asset directory next to the note.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Printed after every converted section.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Conversion options.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Write YAML frontmatter; otherwise the note opens with `# Title`.
    pub frontmatter: bool,
    /// Asset directory, relative to the output directory.
    pub assets_dir: String,
    pub footnotes: FootnotePolicy,
    pub titles: TitlePolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            frontmatter: true,
            assets_dir: DEFAULT_ASSETS_DIR.to_string(),
            footnotes: FootnotePolicy::default(),
            titles: TitlePolicy::default(),
        }
    }
}

impl ConvertConfig {
    pub fn with_frontmatter(mut self, enabled: bool) -> Self {
        self.frontmatter = enabled;
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    pub fn with_footnote_policy(mut self, policy: FootnotePolicy) -> Self {
        self.footnotes = policy;
        self
    }

    pub fn with_title_policy(mut self, policy: TitlePolicy) -> Self {
        self.titles = policy;
        self
    }
}

/// Non-fatal problems met during a run.
///
/// Every warning is logged when recorded and kept for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Book-wide state shared by every rewrite rule.
#[derive(Debug, Clone, Default)]
pub struct RewriteContext {
    pub anchors: ChapterAnchorMap,
    pub index: SectionIndex,
    pub renames: AssetRenames,
    pub config: ConvertConfig,
}

impl RewriteContext {
    /// A context with empty maps.
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Build the anchor map and the heading index of a book.
    pub fn index<R: DocumentReader + ?Sized>(reader: &mut R, config: ConvertConfig) -> Self {
        let anchors = ChapterAnchorMap::build(reader.sections());
        let index = SectionIndex::build(reader, &anchors, &config.titles, &config.footnotes);
        Self {
            anchors,
            index,
            renames: AssetRenames::new(),
            config,
        }
    }

    pub fn with_renames(mut self, renames: AssetRenames) -> Self {
        self.renames = renames;
        self
    }

    /// Markdown for one section, without separator.
    ///
    /// Headings the index never saw are reported: links to them cannot
    /// resolve. This happens when a section fails to load while indexing
    /// but loads for rendering.
    pub fn render_section(
        &self,
        section: &Section,
        markup: &str,
        diagnostics: &mut Diagnostics,
    ) -> String {
        let mut dom = parse_html(markup);
        prepare_section(&mut dom, self.anchors.for_section(section), &self.config.titles);

        for node in headings(&dom, dom.body()) {
            if let Some(id) = dom.element_id(node)
                && self.index.heading(id).is_none()
                && !dom.plain_text(node).is_empty()
            {
                diagnostics.warn(format!(
                    "heading '{id}' in '{}' was not indexed; links to it will not resolve",
                    section.href
                ));
            }
        }

        let rules = build_rule_set(self, section);
        render_markdown(&dom, &rules)
    }
}

/// Rendered note, before it is written anywhere.
#[derive(Debug, Clone, Default)]
pub struct RenderedBook {
    /// Frontmatter or title heading.
    pub header: String,
    /// Every section followed by a separator.
    pub body: String,
    pub sections_converted: usize,
    pub sections_skipped: usize,
    pub diagnostics: Diagnostics,
}

impl RenderedBook {
    pub fn markdown(&self) -> String {
        format!("{}{}", self.header, self.body)
    }
}

/// Outcome of a conversion to disk.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Path of the written note.
    pub output: PathBuf,
    pub sections_converted: usize,
    pub sections_skipped: usize,
    pub assets_extracted: usize,
    pub warnings: Vec<String>,
}

/// EPUB → Markdown converter.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConvertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Convert an EPUB file into `<out_dir>/<stem>.md` and
    /// `<out_dir>/<assets_dir>/`.
    ///
    /// `out_dir` defaults to the directory of the input.
    pub fn convert_file(
        &self,
        input: &Path,
        out_dir: Option<&Path>,
        progress: &mut dyn ProgressSink,
    ) -> Result<Conversion> {
        log::info!("reading {}", input.display());
        let mut reader = EpubReader::open(input)?;
        let out_dir = match out_dir {
            Some(dir) => dir.to_path_buf(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book".to_string());
        self.convert(&mut reader, &out_dir, &stem, progress)
    }

    /// Convert any book into `<out_dir>/<stem>.md`.
    pub fn convert<R: DocumentReader + ?Sized>(
        &self,
        reader: &mut R,
        out_dir: &Path,
        stem: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<Conversion> {
        fs::create_dir_all(out_dir)?;

        let ctx = RewriteContext::index(reader, self.config.clone());

        let mut diagnostics = Diagnostics::default();
        let renames = extract_assets(
            reader,
            &out_dir.join(&self.config.assets_dir),
            &mut diagnostics,
        );
        let assets_extracted = renames.len();
        let ctx = ctx.with_renames(renames);

        let rendered = self.render_with(reader, &ctx, diagnostics, progress);

        let output = out_dir.join(format!("{stem}.md"));
        fs::write(&output, rendered.markdown())?;
        log::info!("saved Markdown to {}", output.display());

        Ok(Conversion {
            output,
            sections_converted: rendered.sections_converted,
            sections_skipped: rendered.sections_skipped,
            assets_extracted,
            warnings: rendered.diagnostics.warnings,
        })
    }

    /// Render a book in memory, with images resolved through `renames`.
    pub fn render<R: DocumentReader + ?Sized>(
        &self,
        reader: &mut R,
        renames: AssetRenames,
        progress: &mut dyn ProgressSink,
    ) -> RenderedBook {
        let ctx = RewriteContext::index(reader, self.config.clone()).with_renames(renames);
        self.render_with(reader, &ctx, Diagnostics::default(), progress)
    }

    fn render_with<R: DocumentReader + ?Sized>(
        &self,
        reader: &mut R,
        ctx: &RewriteContext,
        mut diagnostics: Diagnostics,
        progress: &mut dyn ProgressSink,
    ) -> RenderedBook {
        let header = self.header(reader, &ctx.renames);
        let sections: Vec<Section> = reader.sections().to_vec();

        if sections.is_empty() {
            diagnostics.warn("no sections found in the reading order");
            return RenderedBook {
                header,
                diagnostics,
                ..Default::default()
            };
        }

        let mut body = String::new();
        let mut converted = 0;
        let mut skipped = 0;
        progress.start(sections.len());

        for section in &sections {
            match reader.load_section(section) {
                Ok(markup) if markup.trim().is_empty() => {
                    log::debug!("section '{}' is empty", section.href);
                    skipped += 1;
                }
                Ok(markup) => {
                    body.push_str(&ctx.render_section(section, &markup, &mut diagnostics));
                    body.push_str(SECTION_SEPARATOR);
                    converted += 1;
                }
                Err(e) => {
                    diagnostics.warn(format!("skipping section '{}': {e}", section.href));
                    skipped += 1;
                }
            }
            progress.advance(section);
        }

        progress.finish();
        log::debug!("converted {converted} sections, skipped {skipped}");

        RenderedBook {
            header,
            body,
            sections_converted: converted,
            sections_skipped: skipped,
            diagnostics,
        }
    }

    fn header<R: DocumentReader + ?Sized>(&self, reader: &R, renames: &AssetRenames) -> String {
        let metadata = reader.metadata();
        if !self.config.frontmatter {
            return title_heading(metadata);
        }

        let cover = metadata.cover_image.as_deref().and_then(|href| {
            reader
                .assets()
                .iter()
                .find(|asset| asset.href == href)
                .and_then(|asset| renames.by_path(&percent_decode(&asset.path)))
        });
        let cover = cover.map(|file| {
            if self.config.assets_dir.is_empty() {
                file.to_string()
            } else {
                format!("{}/{file}", self.config.assets_dir)
            }
        });
        frontmatter(metadata, cover.as_deref())
    }
}

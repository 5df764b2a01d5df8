//! Image references pointing into the extracted asset directory.

use crate::book::Section;
use crate::convert::AssetRenames;
use crate::markdown::{NodeRef, Rule};
use crate::util::{basename, percent_decode, resolve_path, strip_fragment_and_query};

/// Attributes an image source is read from, in order of preference.
const SOURCE_ATTRS: &[&str] = &["src", "xlink:href", "href"];

/// `img` and SVG `image` elements → `![alt](assets/file)`.
pub struct ImageRule<'a> {
    renames: &'a AssetRenames,
    assets_dir: &'a str,
    section_path: &'a str,
}

impl<'a> ImageRule<'a> {
    pub fn new(renames: &'a AssetRenames, assets_dir: &'a str, section: &'a Section) -> Self {
        Self {
            renames,
            assets_dir,
            section_path: &section.path,
        }
    }

    /// Output file name for an image source.
    ///
    /// The source is resolved against the section first, so two images that
    /// share a basename still map to their own files. Unknown images keep
    /// their decoded basename.
    pub fn file_name(&self, src: &str) -> String {
        let decoded = percent_decode(strip_fragment_and_query(src.trim()));
        let resolved = resolve_path(&percent_decode(self.section_path), &decoded);
        if let Some(file) = self.renames.by_path(&resolved) {
            return file.to_string();
        }
        let name = basename(&decoded);
        self.renames.by_basename(name).unwrap_or(name).to_string()
    }

    fn target(&self, file: &str) -> String {
        let target = if self.assets_dir.is_empty() {
            file.to_string()
        } else {
            format!("{}/{file}", self.assets_dir)
        };
        if target.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
            format!("<{target}>")
        } else {
            target
        }
    }
}

impl Rule for ImageRule<'_> {
    fn name(&self) -> &str {
        "image"
    }

    fn matches(&self, node: NodeRef<'_>) -> bool {
        node.is("img") || node.is("image")
    }

    fn replace(&self, _content: &str, node: NodeRef<'_>) -> String {
        let Some(src) = SOURCE_ATTRS
            .iter()
            .find_map(|&name| node.attr(name).filter(|v| !v.trim().is_empty()))
        else {
            return String::new();
        };

        let alt = node
            .attr("alt")
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .replace('[', "\\[")
            .replace(']', "\\]");
        let target = self.target(&self.file_name(src));
        format!("\n\n![{alt}]({target})\n\n")
    }
}

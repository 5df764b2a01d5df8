//! Document readers: where sections, metadata and assets come from.
//!
//! The converter only talks to the [`DocumentReader`] trait. Sections and
//! assets are enumerated eagerly when the reader is opened; their contents
//! are fetched lazily, one at a time, so a single broken entry never takes
//! the whole book down.

mod epub;

pub use epub::EpubReader;

use std::collections::HashMap;

use crate::book::{Asset, Metadata, Section};
use crate::error::{Error, Result};

/// Access to an opened book.
pub trait DocumentReader {
    /// Book metadata (title, creators, ...).
    fn metadata(&self) -> &Metadata;

    /// Reading order.
    fn sections(&self) -> &[Section];

    /// Every manifest item, in manifest order.
    fn assets(&self) -> &[Asset];

    /// Fetch and decode the markup of one section.
    fn load_section(&mut self, section: &Section) -> Result<String>;

    /// Fetch the raw bytes of one asset.
    fn load_asset(&mut self, asset: &Asset) -> Result<Vec<u8>>;
}

/// A book assembled in memory.
///
/// Useful for programmatic conversion and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    metadata: Metadata,
    sections: Vec<Section>,
    assets: Vec<Asset>,
    contents: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Append a section to the reading order.
    pub fn add_section(&mut self, section: Section, markup: impl Into<String>) {
        self.contents
            .insert(section.path.clone(), markup.into().into_bytes());
        self.sections.push(section);
    }

    /// Append a section whose content cannot be fetched.
    pub fn add_missing_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Append an asset to the manifest.
    pub fn add_asset(&mut self, asset: Asset, data: Vec<u8>) {
        self.contents.insert(asset.path.clone(), data);
        self.assets.push(asset);
    }

    /// Append an asset whose content cannot be fetched.
    pub fn add_missing_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    fn content(&self, path: &str) -> Result<&[u8]> {
        self.contents
            .get(path)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::EntryNotFound(path.to_string()))
    }
}

impl DocumentReader for MemoryReader {
    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn sections(&self) -> &[Section] {
        &self.sections
    }

    fn assets(&self) -> &[Asset] {
        &self.assets
    }

    fn load_section(&mut self, section: &Section) -> Result<String> {
        self.content(&section.path).map(crate::util::decode_markup)
    }

    fn load_asset(&mut self, asset: &Asset) -> Result<Vec<u8>> {
        self.content(&asset.path).map(<[u8]>::to_vec)
    }
}

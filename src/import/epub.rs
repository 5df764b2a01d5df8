//! EPUB reader: ZIP container, `container.xml` and the OPF package document.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::book::{Asset, Metadata, Section};
use crate::error::{Error, Result};
use crate::import::DocumentReader;
use crate::util::{decode_markup, decode_text, percent_decode, strip_fragment_and_query};

/// EPUB 2/3 reader.
///
/// Parses the package document when opened; section markup and asset bytes
/// are read from the archive on demand.
pub struct EpubReader<R = File> {
    archive: ZipArchive<R>,
    metadata: Metadata,
    sections: Vec<Section>,
    assets: Vec<Asset>,
}

impl EpubReader<File> {
    /// Open an EPUB file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> EpubReader<R> {
    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        // 1. Find the package document
        let container = read_entry(&mut archive, "META-INF/container.xml")?;
        let opf_path = parse_container_xml(&decode_text(&container, None))?;
        let opf_base = match opf_path.rfind('/') {
            Some(pos) => opf_path[..=pos].to_string(),
            None => String::new(),
        };

        // 2. Parse it
        let opf_bytes = read_entry(&mut archive, &opf_path)?;
        let opf = parse_opf(&decode_markup(&opf_bytes))?;

        if opf.manifest.is_empty() {
            log::warn!("package document declares no manifest items");
        }

        let assets: Vec<Asset> = opf
            .manifest
            .iter()
            .map(|item| Asset {
                id: item.id.clone(),
                href: item.href.clone(),
                path: format!("{}{}", opf_base, strip_fragment_and_query(&item.href)),
                media_type: item.media_type.clone(),
            })
            .collect();

        // 3. Resolve the spine against the manifest
        let mut sections = Vec::with_capacity(opf.spine_ids.len());
        for idref in &opf.spine_ids {
            match assets.iter().find(|asset| &asset.id == idref) {
                Some(asset) => sections.push(Section {
                    id: asset.id.clone(),
                    href: asset.href.clone(),
                    path: asset.path.clone(),
                    media_type: asset.media_type.clone(),
                }),
                None => log::warn!("spine item '{idref}' has no manifest entry"),
            }
        }

        // Reported by the converter, which knows whether it matters
        if sections.is_empty() {
            log::debug!("package document has an empty reading order");
        }

        Ok(Self {
            archive,
            metadata: opf.metadata,
            sections,
            assets,
        })
    }

    fn read_path(&mut self, path: &str) -> Result<Vec<u8>> {
        match read_entry(&mut self.archive, path) {
            Err(Error::EntryNotFound(_)) => {
                // Manifest hrefs are URLs; archive names are not.
                let decoded = percent_decode(path);
                read_entry(&mut self.archive, &decoded)
            }
            other => other,
        }
    }
}

impl<R: Read + Seek> DocumentReader for EpubReader<R> {
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
        let bytes = self.read_path(&section.path)?;
        Ok(decode_markup(&bytes))
    }

    fn load_asset(&mut self, asset: &Asset) -> Result<Vec<u8>> {
        self.read_path(&asset.path)
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(Error::EntryNotFound(path.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(data)
}

// ----------------------------------------------------------------------------
// XML Parsing
// ----------------------------------------------------------------------------

fn parse_container_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr_value(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::MissingElement(
        "rootfile in META-INF/container.xml".into(),
    ))
}

/// Manifest item as declared in the package document.
struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
}

struct OpfData {
    metadata: Metadata,
    /// Manifest items in document order.
    manifest: Vec<ManifestItem>,
    spine_ids: Vec<String>,
}

fn parse_opf(content: &str) -> Result<OpfData> {
    // Text is trimmed per element instead: trimming events would eat the
    // spaces around entity references.
    let mut reader = Reader::from_str(content);

    let mut metadata = Metadata::default();
    let mut manifest: Vec<ManifestItem> = Vec::new();
    let mut spine_ids: Vec<String> = Vec::new();
    let mut epub2_cover_id: Option<String> = None;
    let mut saw_package = false;

    let mut in_metadata = false;
    let mut current_element: Option<Vec<u8>> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"package" => saw_package = true,
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" | b"language" | b"identifier" | b"publisher"
                    | b"description" | b"date"
                        if in_metadata =>
                    {
                        current_element = Some(local.to_vec());
                        buf_text.clear();
                    }
                    _ => visit_empty(&e, &mut manifest, &mut spine_ids, &mut epub2_cover_id)?,
                }
            }
            Event::Empty(e) => {
                visit_empty(&e, &mut manifest, &mut spine_ids, &mut epub2_cover_id)?;
            }
            Event::Text(e) => {
                if current_element.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current_element.is_some()
                    && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    buf_text.push_str(&resolved);
                }
            }
            Event::End(e) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"metadata" {
                    in_metadata = false;
                }

                if let Some(elem) = current_element.take() {
                    let text = buf_text.trim().to_string();
                    buf_text.clear();
                    if text.is_empty() {
                        continue;
                    }
                    match elem.as_slice() {
                        b"title" if metadata.title.is_empty() => metadata.title = text,
                        b"creator" => metadata.authors.push(text),
                        b"language" if metadata.language.is_empty() => metadata.language = text,
                        b"identifier" if metadata.identifier.is_empty() => {
                            metadata.identifier = text
                        }
                        b"publisher" => metadata.publisher = Some(text),
                        b"description" => metadata.description = Some(text),
                        b"date" if metadata.date.is_none() => metadata.date = Some(text),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_package {
        return Err(Error::InvalidEpub("package document has no <package> root".into()));
    }

    // Detect cover image: EPUB 3 property first, then the EPUB 2 meta
    let epub3_cover = manifest.iter().find(|item| {
        item.properties
            .as_ref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == "cover-image"))
    });

    if let Some(cover_item) = epub3_cover {
        metadata.cover_image = Some(cover_item.href.clone());
    } else if let Some(cover_id) = epub2_cover_id
        && let Some(item) = manifest.iter().find(|item| item.id == cover_id)
    {
        metadata.cover_image = Some(item.href.clone());
    }

    Ok(OpfData {
        metadata,
        manifest,
        spine_ids,
    })
}

/// Handle the attribute-only elements of the package document.
///
/// `item`, `itemref` and `meta` are usually self-closing but some packagers
/// write them with explicit end tags, so this runs for both event kinds.
fn visit_empty(
    e: &BytesStart<'_>,
    manifest: &mut Vec<ManifestItem>,
    spine_ids: &mut Vec<String>,
    epub2_cover_id: &mut Option<String>,
) -> Result<()> {
    let name = e.name();
    match local_name(name.as_ref()) {
        b"item" => {
            let id = attr_value(e, b"id")?.unwrap_or_default();
            if id.is_empty() {
                return Ok(());
            }
            manifest.push(ManifestItem {
                id,
                href: attr_value(e, b"href")?.unwrap_or_default(),
                media_type: attr_value(e, b"media-type")?.unwrap_or_default(),
                properties: attr_value(e, b"properties")?,
            });
        }
        b"itemref" => {
            let linear = attr_value(e, b"linear")?;
            if let Some(idref) = attr_value(e, b"idref")? {
                if linear.as_deref() == Some("no") {
                    log::debug!("including non-linear spine item '{idref}'");
                }
                spine_ids.push(idref);
            }
        }
        b"meta" => {
            if attr_value(e, b"name")?.as_deref() == Some("cover")
                && let Some(content) = attr_value(e, b"content")?
                && !content.is_empty()
            {
                *epub2_cover_id = Some(content);
            }
        }
        _ => {}
    }
    Ok(())
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let raw = String::from_utf8(attr.value.to_vec())?;
            return Ok(Some(unescape_attr(&raw)));
        }
    }
    Ok(None)
}

fn unescape_attr(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        match tail.find(';').and_then(|end| resolve_entity(&tail[..end]).map(|r| (end, r))) {
            Some((end, resolved)) => {
                out.push_str(&resolved);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse::<u32>().ok()?
    };
    char::from_u32(code).map(|c| c.to_string())
}

//! Small text, path and format helpers shared across the crate.

use std::borrow::Cow;
use std::path::{Component, Path};

use memchr::memmem;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<?xml encoding="..."?>`)
/// 3. Falls back to Windows-1252 (common in old ebooks)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Decode a markup document, using its XML declaration as an encoding hint.
pub fn decode_markup(bytes: &[u8]) -> String {
    decode_text(bytes, extract_xml_encoding(bytes)).into_owned()
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` in the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let prefix = &bytes[..bytes.len().min(100)];

    let xml_start = memmem::find(prefix, b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = memchr::memchr(quote, rest)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Percent-decode a reference, keeping the input when it is not valid UTF-8
/// after decoding.
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    match percent_encoding::percent_decode_str(s).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(s),
    }
}

/// Strip the `#fragment` and `?query` suffixes from a reference.
pub fn strip_fragment_and_query(reference: &str) -> &str {
    let without_fragment = reference.split('#').next().unwrap_or_default();
    without_fragment.split('?').next().unwrap_or_default()
}

/// Last `/`-separated component of a path-like reference.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Resolve a relative path against a base path logically (no filesystem access).
///
/// Canonicalizes references like `../images/photo.jpg` found in
/// `OEBPS/text/ch1.html` into the archive path `OEBPS/images/photo.jpg`.
/// URLs are returned unchanged and rooted paths are taken relative to the
/// archive root.
pub fn resolve_path(base: &str, rel: &str) -> String {
    let rel_path = Path::new(rel);

    if rel_path.has_root() {
        return rel.trim_start_matches('/').to_string();
    }

    if rel.contains("://") || rel.starts_with("data:") {
        return rel.to_string();
    }

    let mut stack: Vec<&str> = Path::new(base)
        .parent()
        .unwrap_or(Path::new(""))
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    for component in rel_path.components() {
        match component {
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(c) => {
                if let Some(s) = c.to_str() {
                    stack.push(s);
                }
            }
            _ => {}
        }
    }

    stack.join("/")
}

// ============================================================================
// Image Format Detection
// ============================================================================

/// Image formats commonly found in ebooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
}

impl ImageFormat {
    /// MIME type string for this format.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Svg => "image/svg+xml",
            ImageFormat::WebP => "image/webp",
        }
    }
}

/// Detect an image format from the file extension.
///
/// Used when a manifest item carries no usable `media-type`.
pub fn detect_image_format(path: &str) -> Option<ImageFormat> {
    let (_, ext) = basename(path).rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "png" => Some(ImageFormat::Png),
        "gif" => Some(ImageFormat::Gif),
        "svg" => Some(ImageFormat::Svg),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Detect an image format from magic bytes.
pub fn sniff_image_format(data: &[u8]) -> Option<ImageFormat> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Some(ImageFormat::Png),
        [b'G', b'I', b'F', ..] => Some(ImageFormat::Gif),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(ImageFormat::WebP),
        _ => None,
    }
}

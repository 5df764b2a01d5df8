//! Image extraction and output file naming.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::book::Asset;
use crate::import::DocumentReader;
use crate::util::{basename, percent_decode, sniff_image_format};

use super::Diagnostics;

/// Collision-free output file names.
///
/// The first asset keeps its name; later ones with the same name get a
/// counter before the extension: `cover.jpg`, `cover_1.jpg`, `cover_2.jpg`.
#[derive(Debug, Clone, Default)]
pub struct AssetNamer {
    used: HashSet<String>,
}

impl AssetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// First free name derived from `original`. Does not reserve it.
    pub fn propose(&self, original: &str) -> String {
        if !self.used.contains(original) {
            return original.to_string();
        }
        let (stem, extension) = split_extension(original);
        (1..)
            .map(|counter| format!("{stem}_{counter}{extension}"))
            .find(|candidate| !self.used.contains(candidate))
            .unwrap_or_else(|| original.to_string())
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Propose and reserve in one step.
    pub fn assign(&mut self, original: &str) -> String {
        let name = self.propose(original);
        self.reserve(&name);
        name
    }
}

/// `name.ext` → (`name`, `.ext`). A leading dot does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Where each extracted asset ended up.
///
/// Entries are keyed both by full archive path and by decoded basename.
/// Basename entries keep the first asset that claimed them, so two images
/// named `cover.jpg` in different folders are told apart only through their
/// paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRenames {
    by_path: HashMap<String, String>,
    by_basename: HashMap<String, String>,
}

impl AssetRenames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the asset at `path` was written as `file`.
    pub fn insert(&mut self, path: &str, file: &str) {
        let original = percent_decode(basename(path)).into_owned();
        self.by_path
            .insert(percent_decode(path).into_owned(), file.to_string());
        self.by_basename
            .entry(original)
            .or_insert_with(|| file.to_string());
    }

    /// Output name of the asset at an archive path.
    pub fn by_path(&self, path: &str) -> Option<&str> {
        self.by_path.get(path).map(String::as_str)
    }

    /// Output name of the first asset with this decoded basename.
    pub fn by_basename(&self, name: &str) -> Option<&str> {
        self.by_basename.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// Whether `name` is a single path component that stays inside its directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Output file name for an asset before collision handling.
///
/// The percent-decoded basename is preferred. When decoding yields a path
/// (`..%2Fx.png`) or a reserved name, the raw basename is used instead, and
/// failing that `image_N` with `N` the asset's position in the manifest.
fn output_name(asset: &Asset, position: usize, diagnostics: &mut Diagnostics) -> String {
    let raw = basename(&asset.path);
    let decoded = percent_decode(raw);
    if is_plain_file_name(&decoded) {
        return decoded.into_owned();
    }
    let fallback = if is_plain_file_name(raw) {
        raw.to_string()
    } else {
        format!("image_{position}")
    };
    diagnostics.warn(format!(
        "image '{}' has an unsafe file name, writing it as {fallback}",
        asset.path
    ));
    fallback
}

/// Whether an asset should be extracted without looking at its bytes.
fn declared_image(asset: &Asset) -> Option<bool> {
    if asset.media_type.trim().is_empty() {
        // Undeclared: decide by extension, or by content later
        asset.is_image().then_some(true)
    } else {
        Some(asset.is_image())
    }
}

/// Write every image of the book into `dir`.
///
/// Assets are processed in manifest order. An asset that cannot be read or
/// written is reported and skipped, and gets no rename entry.
pub fn extract_assets<R: DocumentReader + ?Sized>(
    reader: &mut R,
    dir: &Path,
    diagnostics: &mut Diagnostics,
) -> AssetRenames {
    let mut namer = AssetNamer::new();
    let mut renames = AssetRenames::new();
    let mut dir_ready = false;
    let assets: Vec<Asset> = reader.assets().to_vec();

    for (position, asset) in assets.iter().enumerate() {
        let declared = declared_image(asset);
        if declared == Some(false) {
            continue;
        }

        let data = match reader.load_asset(asset) {
            Ok(data) => data,
            Err(e) => {
                diagnostics.warn(format!("could not extract image '{}': {e}", asset.id));
                continue;
            }
        };

        if declared.is_none() && sniff_image_format(&data).is_none() {
            log::debug!("asset '{}' has no media type and is not an image", asset.href);
            continue;
        }

        if !dir_ready {
            if let Err(e) = fs::create_dir_all(dir) {
                diagnostics.warn(format!(
                    "could not create asset directory {}: {e}",
                    dir.display()
                ));
                return renames;
            }
            dir_ready = true;
        }

        let original = output_name(asset, position, diagnostics);
        let file = namer.propose(&original);
        match fs::write(dir.join(&file), &data) {
            Ok(()) => {
                namer.reserve(&file);
                renames.insert(&asset.path, &file);
                log::debug!("extracted {} as {file}", asset.path);
            }
            Err(e) => diagnostics.warn(format!("could not write image '{}': {e}", asset.id)),
        }
    }

    renames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Metadata;
    use crate::import::MemoryReader;

    #[test]
    fn test_namer_counts_collisions() {
        let mut namer = AssetNamer::new();
        assert_eq!(namer.assign("cover.jpg"), "cover.jpg");
        assert_eq!(namer.assign("cover.jpg"), "cover_1.jpg");
        assert_eq!(namer.assign("cover.jpg"), "cover_2.jpg");
        assert_eq!(namer.assign("cover_1.jpg"), "cover_1_1.jpg");
        assert_eq!(namer.assign("README"), "README");
        assert_eq!(namer.assign("README"), "README_1");
        assert_eq!(namer.assign(".hidden"), ".hidden");
        assert_eq!(namer.assign(".hidden"), ".hidden_1");
    }

    #[test]
    fn test_propose_does_not_reserve() {
        let namer = AssetNamer::new();
        assert_eq!(namer.propose("a.png"), "a.png");
        assert_eq!(namer.propose("a.png"), "a.png");
    }

    #[test]
    fn test_renames_keep_first_basename() {
        let mut renames = AssetRenames::new();
        renames.insert("OEBPS/a/cover.jpg", "cover.jpg");
        renames.insert("OEBPS/b/cover.jpg", "cover_1.jpg");
        renames.insert("OEBPS/my%20pic.png", "my pic.png");

        assert_eq!(renames.by_basename("cover.jpg"), Some("cover.jpg"));
        assert_eq!(renames.by_path("OEBPS/b/cover.jpg"), Some("cover_1.jpg"));
        assert_eq!(renames.by_basename("my pic.png"), Some("my pic.png"));
        assert_eq!(renames.by_path("OEBPS/my pic.png"), Some("my pic.png"));
        assert_eq!(renames.len(), 3);
    }

    #[test]
    fn test_extract_assets() {
        let dir = tempfile::tempdir().unwrap();
        let assets_dir = dir.path().join("assets");

        let mut reader = MemoryReader::new(Metadata::new("Book"));
        reader.add_asset(Asset::new("c1", "images/cover.jpg", "image/jpeg"), vec![1, 2, 3]);
        reader.add_asset(Asset::new("c2", "other/cover.jpg", "image/jpeg"), vec![4, 5]);
        reader.add_asset(Asset::new("css", "style.css", "text/css"), b"p{}".to_vec());
        reader.add_missing_asset(Asset::new("gone", "gone.png", "image/png"));
        reader.add_asset(
            Asset::new("raw", "blob", ""),
            vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
        );

        let mut diagnostics = Diagnostics::default();
        let renames = extract_assets(&mut reader, &assets_dir, &mut diagnostics);

        assert_eq!(renames.by_path("images/cover.jpg"), Some("cover.jpg"));
        assert_eq!(renames.by_path("other/cover.jpg"), Some("cover_1.jpg"));
        assert_eq!(renames.by_path("blob"), Some("blob"));
        assert_eq!(renames.by_path("gone.png"), None);
        assert_eq!(renames.by_path("style.css"), None);
        assert_eq!(diagnostics.warnings().len(), 1);

        assert_eq!(fs::read(assets_dir.join("cover.jpg")).unwrap(), vec![1, 2, 3]);
        assert_eq!(fs::read(assets_dir.join("cover_1.jpg")).unwrap(), vec![4, 5]);
        assert!(!assets_dir.join("style.css").exists());
    }

    #[test]
    fn test_encoded_separators_stay_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let assets_dir = dir.path().join("out").join("assets");

        let mut reader = MemoryReader::default();
        reader.add_asset(
            Asset::new("up", "images/..%2F..%2Fescaped.png", "image/png"),
            vec![1],
        );
        reader.add_asset(Asset::new("back", "images/..%5Cwin.png", "image/png"), vec![2]);
        reader.add_asset(Asset::new("dots", "images/..", "image/png"), vec![3]);

        let mut diagnostics = Diagnostics::default();
        let renames = extract_assets(&mut reader, &assets_dir, &mut diagnostics);

        assert_eq!(
            renames.by_path("images/../../escaped.png"),
            Some("..%2F..%2Fescaped.png")
        );
        assert_eq!(renames.by_path("images/..\\win.png"), Some("..%5Cwin.png"));
        assert_eq!(renames.by_path("images/.."), Some("image_2"));
        assert_eq!(diagnostics.warnings().len(), 3);

        assert!(!dir.path().join("escaped.png").exists());
        assert!(!dir.path().join("out").join("escaped.png").exists());
        assert_eq!(fs::read(assets_dir.join("..%2F..%2Fescaped.png")).unwrap(), vec![1]);
        assert_eq!(fs::read(assets_dir.join("image_2")).unwrap(), vec![3]);
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("cover.jpg"));
        assert!(is_plain_file_name(".hidden"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../x.png"));
        assert!(!is_plain_file_name("a\\b.png"));
    }

    #[test]
    fn test_no_images_creates_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let assets_dir = dir.path().join("assets");
        let mut reader = MemoryReader::default();
        reader.add_asset(Asset::new("css", "style.css", "text/css"), Vec::new());

        let renames = extract_assets(&mut reader, &assets_dir, &mut Diagnostics::default());
        assert!(renames.is_empty());
        assert!(!assets_dir.exists());
    }
}

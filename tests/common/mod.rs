//! EPUB fixtures assembled in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

struct Item {
    id: String,
    href: String,
    media_type: String,
    properties: Option<String>,
    data: Option<Vec<u8>>,
}

/// Minimal EPUB 3 writer for tests. The package document lives in `OEBPS/`.
pub struct EpubBuilder {
    title: String,
    creators: Vec<String>,
    language: String,
    extra_metadata: String,
    items: Vec<Item>,
    spine: Vec<String>,
}

impl EpubBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            creators: Vec::new(),
            language: "en".to_string(),
            extra_metadata: String::new(),
            items: Vec::new(),
            spine: Vec::new(),
        }
    }

    pub fn creator(mut self, name: &str) -> Self {
        self.creators.push(name.to_string());
        self
    }

    /// Raw XML appended inside `<metadata>`.
    pub fn metadata_xml(mut self, xml: &str) -> Self {
        self.extra_metadata.push_str(xml);
        self
    }

    /// Add an XHTML chapter to the manifest and the spine.
    pub fn chapter(mut self, id: &str, href: &str, body: &str) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: "application/xhtml+xml".to_string(),
            properties: None,
            data: Some(xhtml(body).into_bytes()),
        });
        self.spine.push(id.to_string());
        self
    }

    /// Add a spine entry whose manifest item has no file in the archive.
    pub fn missing_chapter(mut self, id: &str, href: &str) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: "application/xhtml+xml".to_string(),
            properties: None,
            data: None,
        });
        self.spine.push(id.to_string());
        self
    }

    /// Add a spine entry without a manifest item.
    pub fn dangling_spine_ref(mut self, idref: &str) -> Self {
        self.spine.push(idref.to_string());
        self
    }

    pub fn image(mut self, id: &str, href: &str, data: &[u8]) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type_for(href).to_string(),
            properties: None,
            data: Some(data.to_vec()),
        });
        self
    }

    pub fn cover(mut self, id: &str, href: &str, data: &[u8]) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            media_type: media_type_for(href).to_string(),
            properties: Some("cover-image".to_string()),
            data: Some(data.to_vec()),
        });
        self
    }

    pub fn opf(&self) -> String {
        let mut opf = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
        );
        opf.push_str(&format!("    <dc:identifier id=\"uid\">urn:test:{}</dc:identifier>\n", self.spine.len()));
        opf.push_str(&format!("    <dc:title>{}</dc:title>\n", escape(&self.title)));
        for creator in &self.creators {
            opf.push_str(&format!("    <dc:creator>{}</dc:creator>\n", escape(creator)));
        }
        opf.push_str(&format!("    <dc:language>{}</dc:language>\n", self.language));
        opf.push_str(&self.extra_metadata);
        opf.push_str("  </metadata>\n  <manifest>\n");
        for item in &self.items {
            let properties = item
                .properties
                .as_ref()
                .map(|p| format!(" properties=\"{p}\""))
                .unwrap_or_default();
            opf.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
                item.id, item.href, item.media_type
            ));
        }
        opf.push_str("  </manifest>\n  <spine>\n");
        for idref in &self.spine {
            opf.push_str(&format!("    <itemref idref=\"{idref}\"/>\n"));
        }
        opf.push_str("  </spine>\n</package>\n");
        opf
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#,
        )
        .unwrap();

        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();

        for item in &self.items {
            if let Some(data) = &item.data {
                zip.start_file(format!("OEBPS/{}", item.href), deflated).unwrap();
                zip.write_all(data).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    /// Write the book as `<dir>/<name>` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

pub fn xhtml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head><title>Chapter</title><link rel="stylesheet" href="style.css"/></head>
<body>
{body}
</body>
</html>"#
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn media_type_for(href: &str) -> &'static str {
    if href.ends_with(".png") {
        "image/png"
    } else if href.ends_with(".gif") {
        "image/gif"
    } else {
        "image/jpeg"
    }
}

pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

//! Format-agnostic description of a book as the converter sees it.

/// Book metadata (Dublin Core subset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: String,
    pub identifier: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    /// Manifest href of the cover image, if the package declares one.
    pub cover_image: Option<String>,
}

/// One entry of the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Section {
    /// Manifest id of the spine item.
    pub id: String,
    /// Reference as written in the manifest, relative to the package document.
    /// May carry a fragment.
    pub href: String,
    /// Full path inside the container (e.g. `OEBPS/text/ch01.xhtml`).
    pub path: String,
    pub media_type: String,
}

/// A manifest item that is not necessarily part of the reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct Asset {
    pub id: String,
    pub href: String,
    pub path: String,
    pub media_type: String,
}

impl Metadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_cover_image(mut self, href: impl Into<String>) -> Self {
        self.cover_image = Some(href.into());
        self
    }

    /// All creators joined for display, or `None` when there are none.
    pub fn creator(&self) -> Option<String> {
        if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        }
    }
}

impl Section {
    /// Create a section whose archive path equals its href.
    pub fn new(id: impl Into<String>, href: impl Into<String>) -> Self {
        let href = href.into();
        Self {
            id: id.into(),
            path: href.clone(),
            href,
            media_type: "application/xhtml+xml".to_string(),
        }
    }
}

impl Asset {
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        let href = href.into();
        Self {
            id: id.into(),
            path: href.clone(),
            href,
            media_type: media_type.into(),
        }
    }

    /// Whether the manifest declares this item as an image.
    ///
    /// Items without a media type are classified by their extension.
    pub fn is_image(&self) -> bool {
        if self.media_type.trim().is_empty() {
            return crate::util::detect_image_format(&self.href).is_some();
        }
        self.media_type.starts_with("image/")
    }
}

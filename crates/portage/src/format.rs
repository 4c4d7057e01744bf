//! Format descriptors: the per-handler view of a file format.

use serde::{Deserialize, Serialize};

use crate::mime::mime_major;

/// Category tags for a format: a single tag or an ordered list whose
/// first entry is the primary tag.
///
/// Tags are open-ended strings; recognized values include `image`,
/// `video`, `audio`, `text`, `document`, `vector`, `data`, `archive`,
/// `spreadsheet`, `presentation`, `database`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    One(String),
    Many(Vec<String>),
}

impl Category {
    pub fn tags(&self) -> &[String] {
        match self {
            Category::One(tag) => std::slice::from_ref(tag),
            Category::Many(tags) => tags,
        }
    }

    pub fn primary(&self) -> Option<&str> {
        self.tags().first().map(String::as_str)
    }
}

/// One file format as declared by one handler.
///
/// Created once when the handler initializes and immutable afterwards.
/// The `mime` field is stored in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Long human-readable description.
    pub name: String,
    /// Short canonical tag, e.g. `png` or `mp3`. Not globally unique.
    pub format: String,
    /// Filename extension without the dot.
    pub extension: String,
    /// Normalized MIME string.
    pub mime: String,
    /// Handler-private discriminator for handlers that expose several
    /// logical formats under one MIME (PNG vs APNG).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    /// Whether the declaring handler accepts this format as input.
    #[serde(default)]
    pub from: bool,
    /// Whether the declaring handler produces this format as output.
    #[serde(default)]
    pub to: bool,
    #[serde(default)]
    pub lossless: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl FormatDescriptor {
    pub fn new(
        name: impl Into<String>,
        format: impl Into<String>,
        extension: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            extension: extension.into(),
            mime: mime.into(),
            internal: None,
            from: false,
            to: false,
            lossless: false,
            category: None,
        }
    }

    /// Mark this format as accepted for input.
    pub fn accepting(mut self) -> Self {
        self.from = true;
        self
    }

    /// Mark this format as producible as output.
    pub fn producing(mut self) -> Self {
        self.to = true;
        self
    }

    pub fn lossless(mut self) -> Self {
        self.lossless = true;
        self
    }

    pub fn internal(mut self, tag: impl Into<String>) -> Self {
        self.internal = Some(tag.into());
        self
    }

    pub fn category(mut self, tag: impl Into<String>) -> Self {
        self.category = Some(Category::One(tag.into()));
        self
    }

    pub fn categories<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category = Some(Category::Many(tags.into_iter().map(Into::into).collect()));
        self
    }

    /// All declared category tags; empty when none were declared.
    pub fn category_tags(&self) -> &[String] {
        self.category.as_ref().map(Category::tags).unwrap_or_default()
    }

    /// The primary category, falling back to the major MIME part when no
    /// category was declared.
    pub fn primary_category(&self) -> &str {
        self.category
            .as_ref()
            .and_then(Category::primary)
            .unwrap_or_else(|| mime_major(&self.mime))
    }
}

/// A named byte buffer flowing through a conversion pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileData {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileData {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let png = FormatDescriptor::new("Portable Network Graphics", "png", "png", "image/png");
        assert!(!png.from);
        assert!(!png.to);
        assert!(!png.lossless);
        assert!(png.category.is_none());
        assert!(png.internal.is_none());
    }

    #[test]
    fn test_primary_category_declared() {
        let gif = FormatDescriptor::new("GIF", "gif", "gif", "image/gif")
            .categories(["image", "video"]);
        assert_eq!(gif.primary_category(), "image");
        assert_eq!(gif.category_tags(), ["image", "video"]);
    }

    #[test]
    fn test_primary_category_falls_back_to_mime_major() {
        let wav = FormatDescriptor::new("Waveform Audio", "wav", "wav", "audio/wav");
        assert_eq!(wav.primary_category(), "audio");
        assert!(wav.category_tags().is_empty());
    }

    #[test]
    fn test_category_serde_shapes() {
        let one: FormatDescriptor = serde_json::from_str(
            r#"{"name":"PNG","format":"png","extension":"png","mime":"image/png","category":"image"}"#,
        )
        .unwrap();
        assert_eq!(one.category, Some(Category::One("image".into())));

        let many: FormatDescriptor = serde_json::from_str(
            r#"{"name":"GIF","format":"gif","extension":"gif","mime":"image/gif","category":["image","video"]}"#,
        )
        .unwrap();
        assert_eq!(many.primary_category(), "image");
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let desc = FormatDescriptor::new("APNG", "apng", "apng", "image/png")
            .accepting()
            .producing()
            .lossless()
            .internal("apng")
            .category("image");
        let json = serde_json::to_string(&desc).unwrap();
        let back: FormatDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, desc);
    }
}

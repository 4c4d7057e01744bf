//! The supported-format cache.
//!
//! Maps handler names to the format lists they declared, in declaration
//! order. External collaborators persist this cache as JSON and hand it
//! back on startup so handlers do not have to re-initialize just to
//! rebuild the graph.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::format::FormatDescriptor;

/// Handler name to declared formats, in declaration order.
///
/// Updates are monotonic: `fill` only populates missing or empty
/// entries, so repeated fills are idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatCache {
    entries: IndexMap<String, Vec<FormatDescriptor>>,
}

/// Accepted on-disk shapes: a bare array of `[name, formats]` pairs, or
/// the same array under a `cache` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheFile {
    Pairs(Vec<(String, Vec<FormatDescriptor>)>),
    Wrapped {
        cache: Vec<(String, Vec<FormatDescriptor>)>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to parse format cache: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `handler` has a non-empty entry.
    pub fn contains(&self, handler: &str) -> bool {
        self.entries.get(handler).is_some_and(|f| !f.is_empty())
    }

    pub fn get(&self, handler: &str) -> Option<&[FormatDescriptor]> {
        self.entries.get(handler).map(Vec::as_slice)
    }

    /// Record `formats` for `handler` unless a non-empty entry already
    /// exists.
    pub fn fill(&mut self, handler: &str, formats: Vec<FormatDescriptor>) {
        if !self.contains(handler) {
            self.entries.insert(handler.to_owned(), formats);
        }
    }

    /// Position of `format` within the handler's declared list.
    pub fn format_position(&self, handler: &str, format: &FormatDescriptor) -> Option<usize> {
        self.entries
            .get(handler)?
            .iter()
            .position(|f| f == format)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FormatDescriptor])> {
        self.entries
            .iter()
            .map(|(name, formats)| (name.as_str(), formats.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as an ordered array of `[name, formats]` pairs.
    pub fn to_json(&self) -> Result<String, CacheError> {
        let pairs: Vec<(&String, &Vec<FormatDescriptor>)> = self.entries.iter().collect();
        Ok(serde_json::to_string(&pairs)?)
    }

    /// Restore from either accepted shape.
    pub fn from_json(data: &str) -> Result<Self, CacheError> {
        let pairs = match serde_json::from_str::<CacheFile>(data)? {
            CacheFile::Pairs(pairs) => pairs,
            CacheFile::Wrapped { cache } => cache,
        };
        Ok(Self {
            entries: pairs.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav() -> FormatDescriptor {
        FormatDescriptor::new("Waveform Audio", "wav", "wav", "audio/wav")
            .accepting()
            .producing()
            .lossless()
            .category("audio")
    }

    fn mp3() -> FormatDescriptor {
        FormatDescriptor::new("MPEG Audio Layer III", "mp3", "mp3", "audio/mpeg")
            .accepting()
            .producing()
            .category("audio")
    }

    #[test]
    fn test_fill_is_monotonic() {
        let mut cache = FormatCache::new();
        cache.fill("ffmpeg", vec![wav(), mp3()]);
        cache.fill("ffmpeg", vec![mp3()]);
        assert_eq!(cache.get("ffmpeg").unwrap().len(), 2);
    }

    #[test]
    fn test_fill_replaces_empty_entry() {
        let mut cache = FormatCache::new();
        cache.fill("ffmpeg", vec![]);
        assert!(!cache.contains("ffmpeg"));
        cache.fill("ffmpeg", vec![wav()]);
        assert!(cache.contains("ffmpeg"));
    }

    #[test]
    fn test_format_position() {
        let mut cache = FormatCache::new();
        cache.fill("ffmpeg", vec![wav(), mp3()]);
        assert_eq!(cache.format_position("ffmpeg", &mp3()), Some(1));
        let missing = FormatDescriptor::new("FLAC", "flac", "flac", "audio/flac");
        assert_eq!(cache.format_position("ffmpeg", &missing), None);
    }

    #[test]
    fn test_json_roundtrip_preserves_order() {
        let mut cache = FormatCache::new();
        cache.fill("ffmpeg", vec![wav(), mp3()]);
        cache.fill("meyda", vec![wav()]);

        let json = cache.to_json().unwrap();
        let restored = FormatCache::from_json(&json).unwrap();
        assert_eq!(restored, cache);

        let names: Vec<&str> = restored.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["ffmpeg", "meyda"]);
    }

    #[test]
    fn test_wrapped_shape_accepted() {
        let mut cache = FormatCache::new();
        cache.fill("ffmpeg", vec![wav()]);
        let wrapped = format!(r#"{{"cache":{}}}"#, cache.to_json().unwrap());
        let restored = FormatCache::from_json(&wrapped).unwrap();
        assert_eq!(restored, cache);
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(FormatCache::from_json("{\"nope\":1}").is_err());
        assert!(FormatCache::from_json("not json").is_err());
    }
}

//! MIME type normalization.
//!
//! Handlers declare the same format under different spellings
//! (`audio/x-wav` vs `audio/wav`). Every MIME string is canonicalized
//! before it enters the graph, so vertex lookup stays a plain string
//! equality test.

/// Synonym table, sorted by raw spelling for binary search.
///
/// Canonical spellings must never appear as keys; that keeps
/// normalization idempotent.
const SYNONYMS: &[(&str, &str)] = &[
    ("application/font-sfnt", "font/sfnt"),
    ("application/font-woff", "font/woff"),
    ("application/font-woff2", "font/woff2"),
    ("application/x-font-otf", "font/otf"),
    ("application/x-font-ttf", "font/ttf"),
    ("application/x-gzip", "application/gzip"),
    ("application/x-rar-compressed", "application/vnd.rar"),
    ("application/x-zip-compressed", "application/zip"),
    ("audio/m4a", "audio/mp4"),
    ("audio/mp3", "audio/mpeg"),
    ("audio/wave", "audio/wav"),
    ("audio/x-aiff", "audio/aiff"),
    ("audio/x-flac", "audio/flac"),
    ("audio/x-m4a", "audio/mp4"),
    ("audio/x-wav", "audio/wav"),
    ("image/jpg", "image/jpeg"),
    ("image/x-icon", "image/vnd.microsoft.icon"),
    ("image/x-ms-bmp", "image/bmp"),
    ("text/xml", "application/xml"),
    ("video/x-m4v", "video/mp4"),
];

/// Canonicalize a MIME string. Unknown inputs are returned unchanged.
pub fn normalize_mime(mime: &str) -> &str {
    match SYNONYMS.binary_search_by_key(&mime, |(raw, _)| raw) {
        Ok(idx) => SYNONYMS[idx].1,
        Err(_) => mime,
    }
}

/// The major part of a MIME string (`audio` for `audio/wav`).
///
/// Used as the category fallback for formats that declare none.
pub fn mime_major(mime: &str) -> &str {
    mime.split('/').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_synonyms() {
        assert_eq!(normalize_mime("audio/x-wav"), "audio/wav");
        assert_eq!(normalize_mime("image/x-icon"), "image/vnd.microsoft.icon");
        assert_eq!(normalize_mime("application/x-gzip"), "application/gzip");
        assert_eq!(normalize_mime("application/font-woff2"), "font/woff2");
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(normalize_mime("image/png"), "image/png");
        assert_eq!(normalize_mime("application/x-unheard-of"), "application/x-unheard-of");
        assert_eq!(normalize_mime(""), "");
    }

    #[test]
    fn test_idempotent() {
        for (raw, _) in SYNONYMS {
            let once = normalize_mime(raw);
            assert_eq!(normalize_mime(once), once, "normalizing {} twice drifted", raw);
        }
    }

    #[test]
    fn test_table_is_sorted() {
        // Binary search depends on this.
        for pair in SYNONYMS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} out of order", pair[1].0);
        }
    }

    #[test]
    fn test_mime_major() {
        assert_eq!(mime_major("audio/wav"), "audio");
        assert_eq!(mime_major("application/vnd.rar"), "application");
        assert_eq!(mime_major("noslash"), "noslash");
    }
}

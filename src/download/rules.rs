//! Classification rules for media URLs found in download API responses.
//!
//! The rule table is plain data: (field name, category, predicate), evaluated
//! in order by the extractor. Predicates are small named functions so each
//! one can be tested on its own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Which result list a URL is collected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Video,
    Audio,
}

/// How a candidate string is tested against a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// File extension at the end of the URL, or a keyword anywhere in it
    ExtensionOrKeyword,
    /// File extension at the end of the URL only
    ExtensionOnly,
}

/// One entry of the ranked rule table.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRule {
    pub field: &'static str,
    pub category: MediaCategory,
    pub predicate: Predicate,
}

impl ExtractionRule {
    const fn keyed(field: &'static str, category: MediaCategory) -> Self {
        Self {
            field,
            category,
            predicate: Predicate::ExtensionOrKeyword,
        }
    }

    /// Applies this rule's predicate to a candidate value.
    pub fn matches(&self, candidate: &str) -> bool {
        category_matches(self.category, self.predicate, candidate)
    }
}

/// Field names download APIs use for video links, in priority order.
pub const VIDEO_FIELDS: &[&str] = &[
    "download_url",
    "url",
    "hd_video",
    "video_url",
    "video_no_watermark",
    "nwm",
    "videoWithWatermark",
    "videoWithoutWatermark",
    "video_hd",
    "video_sd",
    "video",
    "link",
    "downloadUrl",
];

/// Field names download APIs use for audio links, in priority order.
pub const AUDIO_FIELDS: &[&str] = &["audio_url", "audio", "download_url", "url", "link", "downloadUrl"];

/// Fields tried by the single-URL variant. Container fields (`result`,
/// `data`) are followed when they hold a nested document.
pub const DOWNLOAD_FIELDS: &[&str] = &[
    "download_url",
    "downloadUrl",
    "dl_url",
    "url",
    "link",
    "result",
    "data",
];

/// The ranked rule table: every video field, then every audio field.
pub static RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    VIDEO_FIELDS
        .iter()
        .map(|&field| ExtractionRule::keyed(field, MediaCategory::Video))
        .chain(
            AUDIO_FIELDS
                .iter()
                .map(|&field| ExtractionRule::keyed(field, MediaCategory::Audio)),
        )
        .collect()
});

static VIDEO_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|mov|webm)$").expect("video extension regex"));
static VIDEO_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)video|mp4|mov|webm").expect("video keyword regex"));
static AUDIO_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp3|m4a|ogg)$").expect("audio extension regex"));
static AUDIO_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)audio|mp3|m4a|ogg").expect("audio keyword regex"));

pub fn has_video_extension(candidate: &str) -> bool {
    VIDEO_EXTENSION_RE.is_match(candidate)
}

pub fn has_video_keyword(candidate: &str) -> bool {
    VIDEO_KEYWORD_RE.is_match(candidate)
}

pub fn has_audio_extension(candidate: &str) -> bool {
    AUDIO_EXTENSION_RE.is_match(candidate)
}

pub fn has_audio_keyword(candidate: &str) -> bool {
    AUDIO_KEYWORD_RE.is_match(candidate)
}

/// Core classification used by both the rule table and the generic `*url*` pass.
pub fn category_matches(category: MediaCategory, predicate: Predicate, candidate: &str) -> bool {
    let (extension, keyword): (fn(&str) -> bool, fn(&str) -> bool) = match category {
        MediaCategory::Video => (has_video_extension, has_video_keyword),
        MediaCategory::Audio => (has_audio_extension, has_audio_keyword),
    };
    match predicate {
        Predicate::ExtensionOrKeyword => extension(candidate) || keyword(candidate),
        Predicate::ExtensionOnly => extension(candidate),
    }
}

/// Keys whose string values get the strict extension-only check.
pub fn is_generic_url_key(key: &str) -> bool {
    key.to_lowercase().contains("url")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension_is_case_insensitive_and_anchored() {
        assert!(has_video_extension("https://cdn.example/clip.MP4"));
        assert!(has_video_extension("https://cdn.example/clip.webm"));
        assert!(!has_video_extension("https://cdn.example/clip.mp4?sig=1"));
    }

    #[test]
    fn test_video_keyword_matches_anywhere() {
        assert!(has_video_keyword("https://cdn.example/get?type=video&id=1"));
        assert!(has_video_keyword("https://cdn.example/clip.mp4?sig=1"));
        assert!(!has_video_keyword("https://cdn.example/track.mp3"));
    }

    #[test]
    fn test_audio_predicates() {
        assert!(has_audio_extension("https://x/a.M4A"));
        assert!(!has_audio_extension("https://x/a.m4a?x=1"));
        assert!(has_audio_keyword("https://x/stream/audio/123"));
        assert!(!has_audio_keyword("https://x/clip.mp4"));
    }

    #[test]
    fn test_extension_only_rejects_keyword_hits() {
        let url = "https://x/watch?format=video";
        assert!(category_matches(MediaCategory::Video, Predicate::ExtensionOrKeyword, url));
        assert!(!category_matches(MediaCategory::Video, Predicate::ExtensionOnly, url));
    }

    #[test]
    fn test_rule_table_order() {
        assert_eq!(RULES.len(), VIDEO_FIELDS.len() + AUDIO_FIELDS.len());
        assert_eq!(RULES[0].field, "download_url");
        assert_eq!(RULES[0].category, MediaCategory::Video);
        let first_audio = RULES
            .iter()
            .position(|r| r.category == MediaCategory::Audio)
            .unwrap();
        assert_eq!(first_audio, VIDEO_FIELDS.len());
        assert_eq!(RULES[first_audio].field, "audio_url");
    }

    #[test]
    fn test_generic_url_key() {
        assert!(is_generic_url_key("thumbnailURL"));
        assert!(is_generic_url_key("play_url"));
        assert!(!is_generic_url_key("link"));
    }
}

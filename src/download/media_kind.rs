use strum::{Display, EnumString};
use url::Url;

/// How the messaging layer should send a resolved URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Document,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "3gp"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "ogg", "opus", "aac", "wav", "flac"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

impl MediaKind {
    /// Classifies a URL by the file extension of its path. Query strings and
    /// fragments are ignored; unknown or missing extensions are documents.
    pub fn from_url(raw: &str) -> Self {
        let path = match Url::parse(raw) {
            Ok(url) => url.path().to_string(),
            Err(_) => raw.split(['?', '#']).next().unwrap_or(raw).to_string(),
        };
        match extension(&path) {
            Some(ext) => Self::from_extension(&ext),
            None => MediaKind::Document,
        }
    }

    /// Like [`from_url`](Self::from_url), but a URL without a recognizable
    /// extension is sent as `fallback` instead of as a document.
    pub fn from_url_or(raw: &str, fallback: MediaKind) -> Self {
        match Self::from_url(raw) {
            MediaKind::Document => fallback,
            kind => kind,
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaKind::Image
        } else {
            MediaKind::Document
        }
    }

    /// MIME type to announce when sending, if known.
    pub fn default_mime(self) -> Option<&'static str> {
        match self {
            MediaKind::Video => Some("video/mp4"),
            MediaKind::Audio => Some("audio/mpeg"),
            MediaKind::Image => Some("image/jpeg"),
            MediaKind::Document => None,
        }
    }
}

fn extension(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}

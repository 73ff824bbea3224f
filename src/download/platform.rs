use strum::{Display, EnumIter, IntoEnumIterator};
use url::Url;

/// Source platforms the download command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Platform {
    Twitter,
    TikTok,
    Instagram,
    YouTube,
    Facebook,
    Pinterest,
    Spotify,
}

impl Platform {
    /// Host suffixes that identify the platform.
    fn hosts(self) -> &'static [&'static str] {
        match self {
            Platform::Twitter => &["twitter.com", "x.com"],
            Platform::TikTok => &["tiktok.com"],
            Platform::Instagram => &["instagram.com"],
            Platform::YouTube => &["youtube.com", "youtu.be"],
            Platform::Facebook => &["facebook.com", "fb.watch"],
            Platform::Pinterest => &["pinterest.com", "pin.it"],
            Platform::Spotify => &["open.spotify.com"],
        }
    }

    /// Download API endpoint serving this platform.
    pub fn api_endpoint(self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instadl",
            Platform::YouTube => "ytdlv2",
            Platform::Facebook => "facebook",
            Platform::Pinterest => "pinterestdl",
            Platform::Spotify => "spotifydl",
        }
    }

    /// Extra query parameters the endpoint expects.
    pub fn api_params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Platform::TikTok => &[("noWatermark", "true")],
            _ => &[],
        }
    }

    /// Detects the platform of a user-supplied link, `None` when unsupported.
    pub fn detect(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }
        let host = url.host_str()?.to_lowercase();
        Platform::iter().find(|platform| {
            platform
                .hosts()
                .iter()
                .any(|suffix| host == *suffix || host.ends_with(&format!(".{}", suffix)))
        })
    }

    /// Comma-separated platform names for "unsupported platform" replies.
    pub fn supported_list() -> String {
        Platform::iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
    }
}

//! Media extraction from download API responses.

pub mod extractor;
pub mod fetch;
pub mod media_kind;
pub mod platform;
pub mod rules;

pub use extractor::{download_link, extract_download_url, extract_media, ExtractionResult, MediaDocument};
pub use fetch::{build_api_url, platform_api_url, MediaApiClient};
pub use media_kind::MediaKind;
pub use platform::Platform;

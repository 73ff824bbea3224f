//! Media URL extraction from shape-unknown download API responses.
//!
//! Third-party download APIs return arbitrary JSON that differs per provider
//! and even per call, so extraction walks the whole document and classifies
//! string fields with the rules in [`crate::download::rules`]. Recall wins over
//! precision: a false positive only costs a failed send later.
//!
//! Two entry points:
//! - [`extract_media`] collects every plausible video and audio URL
//! - [`extract_download_url`] resolves the single download value of a
//!   pass-through endpoint, see [`download_link`] for its textual form

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::config::extractor::MAX_DEPTH;
use crate::download::rules::{self, MediaCategory, Predicate, DOWNLOAD_FIELDS, RULES};

/// Untyped response document from a download API.
pub type MediaDocument = Value;

/// Video and audio URLs found in a document, in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub videos: Vec<String>,
    pub audios: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty() && self.audios.is_empty()
    }

    fn push(&mut self, category: MediaCategory, url: &str) {
        let list = match category {
            MediaCategory::Video => &mut self.videos,
            MediaCategory::Audio => &mut self.audios,
        };
        if !list.iter().any(|existing| existing == url) {
            list.push(url.to_string());
        }
    }
}

/// Collects every plausible video and audio URL from `document`.
///
/// Never fails: `null`, scalars and empty documents give an empty result.
pub fn extract_media(document: &MediaDocument) -> ExtractionResult {
    let mut result = ExtractionResult::default();
    scan(document, 0, &mut result);
    result
}

fn scan(node: &Value, depth: usize, result: &mut ExtractionResult) {
    if depth > MAX_DEPTH {
        log::debug!("Media document deeper than {} levels, skipping subtree", MAX_DEPTH);
        return;
    }
    match node {
        Value::Object(map) => scan_object(map, depth, result),
        Value::Array(items) => {
            for item in items {
                scan(item, depth + 1, result);
            }
        }
        _ => {}
    }
}

fn scan_object(map: &Map<String, Value>, depth: usize, result: &mut ExtractionResult) {
    for rule in RULES.iter() {
        if let Some(candidate) = map.get(rule.field).and_then(non_empty_str) {
            if rule.matches(candidate) {
                result.push(rule.category, candidate);
            }
        }
    }

    for (key, value) in map {
        match value {
            Value::Object(_) | Value::Array(_) => scan(value, depth + 1, result),
            Value::String(candidate) if rules::is_generic_url_key(key) => {
                if rules::category_matches(MediaCategory::Video, Predicate::ExtensionOnly, candidate) {
                    result.push(MediaCategory::Video, candidate);
                } else if rules::category_matches(MediaCategory::Audio, Predicate::ExtensionOnly, candidate) {
                    result.push(MediaCategory::Audio, candidate);
                }
            }
            _ => {}
        }
    }
}

/// Resolves the download value of a simple pass-through response.
///
/// Tries [`DOWNLOAD_FIELDS`] in order and takes the first non-empty value.
/// A nested document is searched again with the same field list; any other
/// value is returned verbatim. When no field matches, the document itself
/// comes back, so callers can still show what the API answered.
pub fn extract_download_url(document: &MediaDocument) -> MediaDocument {
    resolve_download_value(document, 0).clone()
}

fn resolve_download_value(node: &Value, depth: usize) -> &Value {
    if depth > MAX_DEPTH {
        return node;
    }
    let Value::Object(map) = node else {
        return node;
    };
    match DOWNLOAD_FIELDS.iter().find_map(|field| map.get(*field).filter(|v| !is_empty_value(v))) {
        Some(value @ Value::Object(_)) => resolve_download_value(value, depth + 1),
        Some(value) => value,
        None => node,
    }
}

/// Textual form of a resolved download value, `None` for documents and
/// empty values that cannot be used as a link.
pub fn download_link(value: &MediaDocument) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

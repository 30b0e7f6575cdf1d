//! Share links: a diary snapshot packed into a URL query parameter.
//!
//! ## Wire format
//!
//! ```text
//! v1.<base64url(JSON)>      (no padding)
//!
//! JSON: {"title": "...", "photos": [{"image", "location", "description", "timestamp"}, ...]}
//! ```
//!
//! The `v1.` tag lets the payload grow without breaking old links. Untagged
//! payloads are read as the legacy format: the same JSON in standard base64,
//! as produced by a browser's `btoa`. Query decoding turns a literal `+` into
//! a space, so spaces are mapped back before decoding.
//!
//! Ids and coordinates are never shared.

use crate::types::DiaryEntry;
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const VERSION_TAG: &str = "v1.";

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Invalid payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported share link version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid page URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A diary as carried by a share link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePayload {
    pub title: String,
    pub photos: Vec<DiaryEntry>,
}

pub fn encode(payload: &SharePayload) -> Result<String, ShareError> {
    let json = serde_json::to_vec(payload)?;
    Ok(format!("{VERSION_TAG}{}", BASE64_URL_SAFE_NO_PAD.encode(json)))
}

pub fn decode(text: &str) -> Result<SharePayload, ShareError> {
    let text = text.trim();
    let bytes = match text.split_once('.') {
        Some(("v1", body)) => BASE64_URL_SAFE_NO_PAD.decode(body)?,
        Some((tag, _)) if is_version_tag(tag) => {
            return Err(ShareError::UnsupportedVersion(tag.to_string()));
        }
        _ => decode_legacy(text)?,
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// `v` followed by digits. Base64 never contains `.`, so anything with a dot
/// before the body is a tag.
fn is_version_tag(tag: &str) -> bool {
    tag.strip_prefix('v')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn decode_legacy(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let restored = text.replace(' ', "+");
    BASE64_STANDARD
        .decode(&restored)
        .or_else(|_| BASE64_URL_SAFE_NO_PAD.decode(restored.trim_end_matches('=')))
}

/// The page address with query and fragment replaced by `<param>=<encoded>`.
pub fn share_url(page_url: &str, param: &str, payload: &SharePayload) -> Result<String, ShareError> {
    let mut url = Url::parse(page_url)?;
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut().append_pair(param, &encode(payload)?);
    Ok(url.into())
}

/// The raw share parameter of a page address, if present.
pub fn share_param(page_url: &str, param: &str) -> Result<Option<String>, ShareError> {
    let url = Url::parse(page_url)?;
    Ok(url
        .query_pairs()
        .find(|(k, _)| k == param)
        .map(|(_, v)| v.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::photo_at;

    fn payload() -> SharePayload {
        SharePayload {
            title: "Summer in Europe".into(),
            photos: vec![
                photo_at("a", "Paris", "Nice trip", 0).to_entry(),
                photo_at("b", "", "", 1).to_entry(),
                photo_at("c", "東京", "ラーメン", 2).to_entry(),
            ],
        }
    }

    #[test]
    fn round_trip_keeps_title_and_order() {
        let p = payload();
        let encoded = encode(&p).unwrap();
        assert!(encoded.starts_with("v1."));
        assert_eq!(decode(&encoded).unwrap(), p);
    }

    #[test]
    fn encoded_text_is_url_safe() {
        let encoded = encode(&payload()).unwrap();
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        );
    }

    #[test]
    fn legacy_standard_base64_decodes() {
        let json = serde_json::to_vec(&payload()).unwrap();
        let legacy = BASE64_STANDARD.encode(json);
        assert_eq!(decode(&legacy).unwrap(), payload());
    }

    #[test]
    fn legacy_with_plus_turned_into_space_decodes() {
        let json = serde_json::to_vec(&payload()).unwrap();
        let mangled = BASE64_STANDARD.encode(json).replace('+', " ");
        assert_eq!(decode(&mangled).unwrap(), payload());
    }

    #[test]
    fn malformed_input_is_error() {
        assert!(matches!(decode("v1.!!!"), Err(ShareError::Base64(_))));
        assert!(decode("%%%not-base64%%%").is_err());
        let not_a_diary = BASE64_URL_SAFE_NO_PAD.encode(br#"{"hello":1}"#);
        assert!(matches!(
            decode(&format!("v1.{not_a_diary}")),
            Err(ShareError::Json(_))
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        assert!(matches!(
            decode("v2.e30"),
            Err(ShareError::UnsupportedVersion(v)) if v == "v2"
        ));
    }

    #[test]
    fn share_url_replaces_query_and_fragment() {
        let url = share_url("https://example.com/journal/index.html?x=1#top", "share", &payload())
            .unwrap();
        assert!(url.starts_with("https://example.com/journal/index.html?share=v1."));
        assert!(!url.contains("x=1"));
        assert!(!url.contains('#'));
    }

    #[test]
    fn share_param_round_trips_through_url() {
        let url = share_url("https://example.com/", "share", &payload()).unwrap();
        let param = share_param(&url, "share").unwrap().unwrap();
        assert_eq!(decode(&param).unwrap(), payload());
    }

    #[test]
    fn share_param_absent() {
        assert_eq!(share_param("https://example.com/?a=b", "share").unwrap(), None);
    }
}

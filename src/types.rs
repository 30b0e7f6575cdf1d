//! Shared types used across the journal.
//!
//! [`PhotoRecord`] is the only persisted entity. Its JSON shape is the storage
//! format: an ordered array of records under a single key.
//!
//! ```json
//! {
//!   "id": "1717171717171-k3x9q2",
//!   "image": "data:image/jpeg;base64,...",
//!   "location": "Paris",
//!   "description": "Nice trip",
//!   "timestamp": "2024-05-31T16:08:37.171Z",
//!   "coordinates": [48.8566, 2.3522]
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unique photo identifier: `<unix-millis>-<base36 suffix>`.
///
/// Always written as a string. Older journals stored numeric ids such as
/// `1717171717171.42`; those load as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PhotoId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPhotoId {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for PhotoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPhotoId::deserialize(deserializer)? {
            RawPhotoId::Text(s) => Self(s),
            RawPhotoId::Integer(n) => Self(n.to_string()),
            RawPhotoId::Float(n) => Self(n.to_string()),
        })
    }
}

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A `(latitude, longitude)` pair, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Location label used when a photo is placed before it has a name.
    ///
    /// ```text
    /// (48.85661, 2.35222) → "48.8566, 2.3522"
    /// ```
    pub fn label(&self) -> String {
        format!("{:.4}, {:.4}", self.lat, self.lng)
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

/// One uploaded photo and its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    /// Self-contained `data:` URI.
    pub image: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl PhotoRecord {
    /// A freshly uploaded photo: no annotations, not on the map.
    pub fn new(id: PhotoId, image: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            image,
            location: String::new(),
            description: String::new(),
            timestamp,
            coordinates: None,
        }
    }

    /// Assign coordinates, backfilling an empty location with the coordinate label.
    pub fn place(&mut self, coords: Coordinates) {
        self.coordinates = Some(coords);
        if self.location.is_empty() {
            self.location = coords.label();
        }
    }

    /// Projection used by diaries and share links.
    pub fn to_entry(&self) -> DiaryEntry {
        DiaryEntry {
            image: self.image.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// A photo as it appears in a diary. Carries no id and no coordinates, so
/// diaries loaded from a share link look the same as ones built locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub image: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Calendar date as shown on cards, popups and diary entries: `2024/5/31`.
pub fn display_date(ts: &DateTime<Utc>) -> String {
    ts.format("%Y/%-m/%-d").to_string()
}

/// Clock time as shown on diary entries: `16:08`.
pub fn display_time(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 31, 16, 8, 37).unwrap()
    }

    #[test]
    fn display_date_has_no_padding() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 7, 4, 0).unwrap();
        assert_eq!(display_date(&t), "2024/3/5");
        assert_eq!(display_time(&t), "07:04");
    }

    #[test]
    fn coordinates_label_four_decimals() {
        let c = Coordinates::new(48.856613, 2.352222);
        assert_eq!(c.label(), "48.8566, 2.3522");
    }

    #[test]
    fn coordinates_label_negative() {
        let c = Coordinates::new(-33.8688, 151.2093);
        assert_eq!(c.label(), "-33.8688, 151.2093");
    }

    #[test]
    fn numeric_ids_load_as_text() {
        let ids: Vec<PhotoId> =
            serde_json::from_str(r#"[1717171717171.42, 1717171717171, "abc-1"]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                PhotoId::new("1717171717171.42"),
                PhotoId::new("1717171717171"),
                PhotoId::new("abc-1"),
            ]
        );
        assert_eq!(
            serde_json::to_string(&ids[0]).unwrap(),
            r#""1717171717171.42""#
        );
    }

    #[test]
    fn coordinates_serialize_as_array() {
        let c = Coordinates::new(1.5, -2.25);
        assert_eq!(serde_json::to_string(&c).unwrap(), "[1.5,-2.25]");
        let back: Coordinates = serde_json::from_str("[1.5,-2.25]").unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn place_backfills_empty_location() {
        let mut p = PhotoRecord::new("a".into(), "data:".into(), ts());
        p.place(Coordinates::new(39.9042, 116.4074));
        assert_eq!(p.location, "39.9042, 116.4074");
        assert!(p.coordinates.is_some());
    }

    #[test]
    fn place_keeps_existing_location() {
        let mut p = PhotoRecord::new("a".into(), "data:".into(), ts());
        p.location = "Beijing".into();
        p.place(Coordinates::new(39.9042, 116.4074));
        assert_eq!(p.location, "Beijing");
    }

    #[test]
    fn record_without_coordinates_serializes_null() {
        let p = PhotoRecord::new("a".into(), "data:".into(), ts());
        let json = serde_json::to_value(&p).unwrap();
        assert!(json["coordinates"].is_null());
        assert_eq!(json["id"], "a");
    }

    #[test]
    fn record_accepts_missing_optional_fields() {
        let json = r#"{"id":"x","image":"data:","timestamp":"2024-05-31T16:08:37.000Z"}"#;
        let p: PhotoRecord = serde_json::from_str(json).unwrap();
        assert_eq!(p.location, "");
        assert_eq!(p.coordinates, None);
        assert_eq!(p.timestamp, ts());
    }

    #[test]
    fn entry_drops_id_and_coordinates() {
        let mut p = PhotoRecord::new("a".into(), "data:x".into(), ts());
        p.place(Coordinates::new(1.0, 2.0));
        let json = serde_json::to_value(p.to_entry()).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("coordinates").is_none());
        assert_eq!(json["location"], "1.0000, 2.0000");
    }
}

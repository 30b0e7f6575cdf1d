//! Shared test utilities: record builders and tiny image fixtures.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let p = photo("a", "Paris", "Nice trip");
//! let located = placed("b", "", 48.8566, 2.3522);
//! ```

use crate::storage::{KeyValueStore, MemoryStorage, StorageError};
use crate::types::{Coordinates, PhotoRecord};
use chrono::{DateTime, TimeZone, Utc};

/// A 1×1 transparent PNG.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0x60,
    0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01, 0xE9, 0xFA, 0xDC, 0xD8, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Fixed base time for deterministic timestamps: 2024-05-31 16:08:00 UTC.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 31, 16, 8, 0).unwrap()
}

/// A photo taken `hours` after [`base_time`].
pub fn photo_at(id: &str, location: &str, description: &str, hours: i64) -> PhotoRecord {
    let mut p = PhotoRecord::new(
        id.into(),
        format!("data:image/png;base64,{id}"),
        base_time() + chrono::Duration::hours(hours),
    );
    p.location = location.to_string();
    p.description = description.to_string();
    p
}

pub fn photo(id: &str, location: &str, description: &str) -> PhotoRecord {
    photo_at(id, location, description, 0)
}

/// A photo already on the map.
pub fn placed(id: &str, location: &str, lat: f64, lng: f64) -> PhotoRecord {
    let mut p = photo(id, location, "");
    p.place(Coordinates::new(lat, lng));
    p
}

/// Storage seeded with `photos` under the default key that refuses every write.
pub struct ReadOnlyStorage(MemoryStorage);

impl ReadOnlyStorage {
    pub fn with_photos(photos: &[PhotoRecord]) -> Self {
        let json = serde_json::to_string(photos).unwrap();
        Self(MemoryStorage::with_value("travelPhotos", &json))
    }
}

impl KeyValueStore for ReadOnlyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk full")))
    }
}

//! The photo store: the ordered list of [`PhotoRecord`]s and its persistence.
//!
//! The store exclusively owns the list. Every mutation (add, update, place,
//! remove) serializes the whole list and writes it to the key-value layer
//! before returning. A failed write rolls the mutation back, so the in-memory
//! list always equals the last blob that was written. Last writer wins.
//!
//! Loading never fails. A missing blob starts an empty journal; a blob that is
//! not a JSON array of records is treated the same way, and the reason is
//! returned as a [`LoadOutcome`] for the caller to report.

use crate::storage::{KeyValueStore, StorageError};
use crate::types::{Coordinates, PhotoId, PhotoRecord};
use chrono::Utc;
use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate photo id: {0}")]
    DuplicateId(PhotoId),
}

/// What `load` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing persisted yet.
    Empty,
    Loaded(usize),
    /// The blob existed but did not decode; the store started empty.
    Corrupt(String),
    /// Storage could not be read; the store started empty.
    Unreadable(String),
}

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 6;

pub struct PhotoStore<S> {
    storage: S,
    key: String,
    photos: Vec<PhotoRecord>,
}

impl<S: KeyValueStore> PhotoStore<S> {
    /// Read the persisted list under `key`, falling back to an empty list.
    pub fn load(storage: S, key: &str) -> (Self, LoadOutcome) {
        let (photos, outcome) = match storage.get(key) {
            Ok(None) => (Vec::new(), LoadOutcome::Empty),
            Ok(Some(blob)) => match serde_json::from_str::<Vec<PhotoRecord>>(&blob) {
                Ok(photos) => {
                    let n = photos.len();
                    (photos, LoadOutcome::Loaded(n))
                }
                Err(e) => (Vec::new(), LoadOutcome::Corrupt(e.to_string())),
            },
            Err(e) => (Vec::new(), LoadOutcome::Unreadable(e.to_string())),
        };
        let store = Self {
            storage,
            key: key.to_string(),
            photos,
        };
        (store, outcome)
    }

    /// Serialize the full list and persist it.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.photos)?;
        self.storage.set(&self.key, &json)?;
        Ok(())
    }

    /// Photos in insertion order.
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn find(&self, id: &PhotoId) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.find(id).is_some()
    }

    /// Mint an id not used by any live record.
    ///
    /// Ids are `<unix-millis>-<6 base36 chars>`; the suffix is re-rolled on
    /// collision, which only matters for uploads landing in the same millisecond.
    pub fn next_id(&self) -> PhotoId {
        let mut rng = rand::thread_rng();
        let millis = Utc::now().timestamp_millis();
        loop {
            let suffix: String = (0..ID_SUFFIX_LEN)
                .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
                .collect();
            let id = PhotoId::new(format!("{millis}-{suffix}"));
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Append a record and persist. Nothing is added if the write fails.
    pub fn add(&mut self, record: PhotoRecord) -> Result<(), StoreError> {
        if self.contains(&record.id) {
            return Err(StoreError::DuplicateId(record.id));
        }
        self.photos.push(record);
        if let Err(e) = self.save() {
            self.photos.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Apply `edit` to the record with `id` and persist.
    ///
    /// Returns `Ok(false)` without writing if no such record exists. The
    /// record is restored if the write fails.
    pub fn update<F>(&mut self, id: &PhotoId, edit: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut PhotoRecord),
    {
        let Some(index) = self.photos.iter().position(|p| &p.id == id) else {
            return Ok(false);
        };
        let before = self.photos[index].clone();
        edit(&mut self.photos[index]);
        if let Err(e) = self.save() {
            self.photos[index] = before;
            return Err(e);
        }
        Ok(true)
    }

    /// Put a photo on the map, backfilling an empty location. Persists.
    pub fn place(&mut self, id: &PhotoId, coords: Coordinates) -> Result<bool, StoreError> {
        self.update(id, |p| p.place(coords))
    }

    /// Remove a record and persist. `Ok(None)` if the id is unknown. The
    /// record is put back in place if the write fails.
    pub fn remove(&mut self, id: &PhotoId) -> Result<Option<PhotoRecord>, StoreError> {
        let Some(index) = self.photos.iter().position(|p| &p.id == id) else {
            return Ok(None);
        };
        let removed = self.photos.remove(index);
        if let Err(e) = self.save() {
            self.photos.insert(index, removed);
            return Err(e);
        }
        Ok(Some(removed))
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_helpers::{ReadOnlyStorage, photo, photo_at};

    const KEY: &str = "travelPhotos";

    fn empty_store() -> PhotoStore<MemoryStorage> {
        PhotoStore::load(MemoryStorage::new(), KEY).0
    }

    fn reload(store: PhotoStore<MemoryStorage>) -> PhotoStore<MemoryStorage> {
        let (reloaded, outcome) = PhotoStore::load(store.storage, KEY);
        assert!(matches!(outcome, LoadOutcome::Loaded(_) | LoadOutcome::Empty));
        reloaded
    }

    #[test]
    fn load_absent_is_empty() {
        let (store, outcome) = PhotoStore::load(MemoryStorage::new(), KEY);
        assert!(store.is_empty());
        assert_eq!(outcome, LoadOutcome::Empty);
    }

    #[test]
    fn load_corrupt_falls_back_to_empty() {
        let storage = MemoryStorage::with_value(KEY, "{not json");
        let (store, outcome) = PhotoStore::load(storage, KEY);
        assert!(store.is_empty());
        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn load_accepts_numeric_ids_and_null_coordinates() {
        let blob = r#"[
            {"id":1717171717171.42,"image":"data:image/png;base64,AA","location":"Paris",
             "description":"","timestamp":"2024-05-31T16:08:00.000Z","coordinates":[48.8566,2.3522]},
            {"id":1717171717172,"image":"data:image/png;base64,BB","location":"",
             "description":"","timestamp":"2024-05-31T16:09:00.000Z","coordinates":null}
        ]"#;
        let (mut store, outcome) = PhotoStore::load(MemoryStorage::with_value(KEY, blob), KEY);
        assert_eq!(outcome, LoadOutcome::Loaded(2));
        let paris = store.find(&"1717171717171.42".into()).unwrap();
        assert_eq!(paris.coordinates, Some(Coordinates::new(48.8566, 2.3522)));
        assert_eq!(store.find(&"1717171717172".into()).unwrap().coordinates, None);

        // Saved back with string ids, still editable by id
        assert!(store.update(&"1717171717172".into(), |p| p.location = "Lyon".into()).unwrap());
        let saved = store.storage().get(KEY).unwrap().unwrap();
        assert!(saved.contains(r#""id":"1717171717171.42""#));
    }

    #[test]
    fn load_wrong_shape_falls_back_to_empty() {
        let storage = MemoryStorage::with_value(KEY, r#"{"photos": []}"#);
        let (store, outcome) = PhotoStore::load(storage, KEY);
        assert!(store.is_empty());
        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
    }

    #[test]
    fn add_persists_immediately() {
        let mut store = empty_store();
        store.add(photo("a", "Paris", "Nice trip")).unwrap();
        let blob = store.storage().get(KEY).unwrap().unwrap();
        assert!(blob.contains("\"Paris\""));
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut store = empty_store();
        store.add(photo("a", "", "")).unwrap();
        assert!(matches!(
            store.add(photo("a", "", "")),
            Err(StoreError::DuplicateId(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_unknown_is_noop() {
        let mut store = empty_store();
        store.add(photo("a", "", "")).unwrap();
        assert_eq!(store.remove(&"zzz".into()).unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_unknown_returns_false() {
        let mut store = empty_store();
        assert!(!store.update(&"zzz".into(), |p| p.location.clear()).unwrap());
    }

    #[test]
    fn place_backfills_location() {
        let mut store = empty_store();
        store.add(photo("a", "", "")).unwrap();
        store
            .place(&"a".into(), Coordinates::new(48.856613, 2.352222))
            .unwrap();
        assert_eq!(store.find(&"a".into()).unwrap().location, "48.8566, 2.3522");
    }

    #[test]
    fn add_edit_delete_round_trips_through_storage() {
        let mut store = empty_store();
        store.add(photo_at("a", "Paris", "Nice trip", 1)).unwrap();
        store.add(photo_at("b", "", "", 2)).unwrap();
        store.add(photo_at("c", "Tokyo", "Ramen", 3)).unwrap();
        store
            .update(&"a".into(), |p| p.description = "Louvre".into())
            .unwrap();
        store.place(&"b".into(), Coordinates::new(1.0, 2.0)).unwrap();
        store.remove(&"c".into()).unwrap();

        let before = store.photos().to_vec();
        let reloaded = reload(store);
        assert_eq!(reloaded.photos(), before.as_slice());
        let ids: Vec<&str> = reloaded.photos().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn failed_writes_leave_list_unchanged() {
        let a = photo("a", "", "");
        let (mut store, _) = PhotoStore::load(ReadOnlyStorage::with_photos(&[a.clone()]), KEY);

        assert!(store.add(photo("b", "", "")).is_err());
        assert!(store.place(&"a".into(), Coordinates::new(1.0, 2.0)).is_err());
        assert!(store.update(&"a".into(), |p| p.location = "Rome".into()).is_err());
        assert!(store.remove(&"a".into()).is_err());

        assert_eq!(store.photos(), [a].as_slice());
    }

    #[test]
    fn next_id_is_unique_and_time_based() {
        let mut store = empty_store();
        for _ in 0..50 {
            let id = store.next_id();
            let (millis, suffix) = id.as_str().split_once('-').unwrap();
            assert!(millis.parse::<i64>().is_ok());
            assert_eq!(suffix.len(), ID_SUFFIX_LEN);
            store.add(photo(id.as_str(), "", "")).unwrap();
        }
        assert_eq!(store.len(), 50);
    }
}

//! # Photo Journal
//!
//! A travel photo journal. Upload photos, give each a location, description
//! and time, pin it on a map, browse a filterable gallery, and compose a
//! diary from selected photos that can be exported as a PDF or shared as a
//! self-contained link.
//!
//! # Architecture: One State Struct, Derived Views
//!
//! All state lives in [`journal::Journal`]. Every user action is a method on
//! it; every view is a pure function of it:
//!
//! ```text
//! action ──▶ Journal ──▶ PhotoStore ──▶ KeyValueStore   (persisted JSON blob)
//!               │
//!               ├──▶ MapAdapter ──▶ MapWidget          (one marker per placed photo)
//!               │
//!               └──▶ views: gallery cards, filter options, diary preview, page
//! ```
//!
//! The photo list is the single source of truth. Cards, filter options and
//! markers are recomputed from it after every mutation, so the views can never
//! drift from the data.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `PhotoRecord`, `Coordinates`, `DiaryEntry` and display formats |
//! | [`storage`] | `KeyValueStore` trait with file and in-memory implementations |
//! | [`store`] | Ordered photo list persisted as one JSON blob |
//! | [`map`] | Marker bookkeeping behind the `MapWidget` trait, Leaflet bootstrap |
//! | [`gallery`] | Search and location filtering, card and filter markup |
//! | [`editor`] | Explicit edit session: open, change, save, discard, delete |
//! | [`diary`] | Photo selection and diary preview |
//! | [`share`] | Versioned share-link encoding |
//! | [`pdf`] | Diary layout behind the `PdfRenderer` trait, built-in PDF writer |
//! | [`upload`] | Parallel image decoding into `data:` URIs |
//! | [`journal`] | The application state and event handlers |
//! | [`page`] | The full HTML page, rendered with Maud |
//! | [`config`] | `journal.toml` loading, validation, merging, theme CSS |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Images Stay Inline
//!
//! Photos are stored as `data:` URIs inside the photo list. A journal is then
//! one JSON document: trivially backed up, moved, or inspected. The cost is
//! size, which is acceptable for the tens of photos a trip produces.
//!
//! ## Traits at the Widget Seams
//!
//! The map and the PDF renderer are external widgets. [`map::MapWidget`] and
//! [`pdf::PdfRenderer`] describe only the calls the journal makes, so tests
//! use recording mocks and the production implementations stay small.
//!
//! ## Share Links Are the Data
//!
//! A share link carries the whole diary (title plus entries, images included)
//! in its query string. No server is involved; opening the link on any copy
//! of the page shows the diary.

pub mod config;
pub mod diary;
pub mod editor;
pub mod gallery;
pub mod journal;
pub mod map;
pub mod output;
pub mod page;
pub mod pdf;
pub mod share;
pub mod storage;
pub mod store;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

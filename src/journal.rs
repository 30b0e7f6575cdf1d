//! The application state and its event handlers.
//!
//! [`Journal`] owns everything the page needs: the photo store, the map
//! markers, the edit panel, the diary composer, and the gallery filter. It is
//! built once at startup and every user action is a method on it, so there is
//! no ambient global state.
//!
//! ## Event flow
//!
//! ```text
//! user action ──▶ store mutation (persisted) ──▶ rerender
//!                                                 ├─ map markers rebuilt
//!                                                 └─ filter options refreshed
//! ```
//!
//! Gallery cards and filter options are derived on demand from the store and
//! the current [`GalleryFilter`], so "rerender" only has real work to do for
//! the map and for a location filter whose value has disappeared.
//!
//! ## Diagnostics
//!
//! Noteworthy outcomes (recovered storage, failed share links, exports) are
//! sent as [`JournalEvent`]s on an optional channel. The CLI prints them;
//! tests inspect them. A missing receiver is not an error.

use crate::config::JournalConfig;
use crate::diary::DiaryComposer;
use crate::editor::{EditForm, EditorError, EditorPanel};
use crate::gallery::{self, Card, GalleryFilter};
use crate::map::{MapAdapter, MapWidget, MarkerHandle};
use crate::pdf::{self, PdfError, PdfRenderer};
use crate::share::{self, ShareError};
use crate::storage::KeyValueStore;
use crate::store::{LoadOutcome, PhotoStore, StoreError};
use crate::types::{Coordinates, PhotoId, PhotoRecord};
use crate::upload::{DecodedImage, UploadEvent};
use chrono::{SubsecRound, Utc};
use maud::Markup;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Share(#[from] ShareError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

/// Something worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEvent {
    Loaded { count: usize },
    /// Persisted data could not be used; the journal started empty.
    StorageRecovered { reason: String },
    PhotoAdded { id: PhotoId, source: PathBuf },
    UploadFailed { error: String },
    PhotoSaved { id: PhotoId },
    PhotoDeleted { id: PhotoId },
    PhotoPlaced { id: PhotoId, coords: Coordinates, location: String },
    SharedDiaryOpened { title: String, photos: usize },
    ShareDecodeFailed { error: String },
    DiaryGenerated { title: String, entries: usize },
    PdfExported { path: PathBuf },
}

pub struct Journal<S, M> {
    config: JournalConfig,
    store: PhotoStore<S>,
    map: MapAdapter<M>,
    editor: EditorPanel,
    diary: DiaryComposer,
    filter: GalleryFilter,
    events: Option<Sender<JournalEvent>>,
}

impl<S: KeyValueStore, M: MapWidget> Journal<S, M> {
    /// Load persisted photos and place their markers.
    pub fn open(
        config: JournalConfig,
        storage: S,
        widget: M,
        events: Option<Sender<JournalEvent>>,
    ) -> Self {
        let (store, outcome) = PhotoStore::load(storage, &config.storage_key);
        let mut journal = Self {
            config,
            store,
            map: MapAdapter::new(widget),
            editor: EditorPanel::new(),
            diary: DiaryComposer::new(),
            filter: GalleryFilter::default(),
            events,
        };
        match outcome {
            LoadOutcome::Empty => journal.emit(JournalEvent::Loaded { count: 0 }),
            LoadOutcome::Loaded(count) => journal.emit(JournalEvent::Loaded { count }),
            LoadOutcome::Corrupt(reason) | LoadOutcome::Unreadable(reason) => {
                journal.emit(JournalEvent::StorageRecovered { reason })
            }
        }
        journal.rerender();
        journal
    }

    /// Handle the page address: a `share` parameter opens the shared diary.
    ///
    /// Returns whether a shared diary was opened. A bad link is reported as
    /// [`JournalEvent::ShareDecodeFailed`] and changes nothing.
    pub fn startup(&mut self, page_url: &str) -> bool {
        let decoded = share::share_param(page_url, &self.config.share.param)
            .and_then(|param| param.map(|p| share::decode(&p)).transpose());
        match decoded {
            Ok(Some(payload)) => {
                let title = payload.title.clone();
                let photos = payload.photos.len();
                self.diary.load_shared(payload);
                self.diary.open();
                self.emit(JournalEvent::SharedDiaryOpened { title, photos });
                true
            }
            Ok(None) => false,
            Err(e) => {
                self.emit(JournalEvent::ShareDecodeFailed {
                    error: e.to_string(),
                });
                false
            }
        }
    }

    fn emit(&self, event: JournalEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Rebuild markers and drop a location filter that no longer matches any photo.
    fn rerender(&mut self) {
        self.map.rebuild(self.store.photos());
        if let Some(location) = &self.filter.location
            && !gallery::location_options(self.store.photos()).contains(&location.as_str())
        {
            self.filter.location = None;
        }
    }

    // ------------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------------

    /// Store a decoded upload as a new photo and open it in the editor.
    pub fn add_upload(&mut self, image: DecodedImage) -> Result<PhotoId, JournalError> {
        let id = self.store.next_id();
        let record = PhotoRecord::new(id.clone(), image.data_uri, Utc::now().trunc_subsecs(3));
        self.store.add(record)?;
        self.rerender();
        if let Some(photo) = self.store.find(&id) {
            self.editor.open(photo);
        }
        self.emit(JournalEvent::PhotoAdded {
            id: id.clone(),
            source: image.source,
        });
        Ok(id)
    }

    /// Drain upload results, adding each decoded image as it arrives.
    ///
    /// Every event is handled: a file that failed to decode or a record that
    /// failed to persist is reported as [`JournalEvent::UploadFailed`] and
    /// the rest of the queue is still processed. Returns the ids added.
    pub fn receive_uploads(&mut self, uploads: Receiver<UploadEvent>) -> Vec<PhotoId> {
        let mut added = Vec::new();
        for event in uploads {
            let failure = match event {
                UploadEvent::Decoded(image) => {
                    let source = image.source.clone();
                    match self.add_upload(image) {
                        Ok(id) => {
                            added.push(id);
                            continue;
                        }
                        Err(e) => format!("{}: {}", source.display(), e),
                    }
                }
                UploadEvent::Failed(e) => e.to_string(),
            };
            self.emit(JournalEvent::UploadFailed { error: failure });
        }
        added
    }

    // ------------------------------------------------------------------------
    // Editor
    // ------------------------------------------------------------------------

    /// Open the editor on a photo. `false` if the id is unknown.
    pub fn open_editor(&mut self, id: &PhotoId) -> bool {
        match self.store.find(id) {
            Some(photo) => {
                self.editor.open(photo);
                true
            }
            None => false,
        }
    }

    pub fn card_click(&mut self, id: &PhotoId) -> bool {
        self.open_editor(id)
    }

    pub fn close_editor(&mut self) {
        self.editor.close();
    }

    pub fn editor_form_mut(&mut self) -> Option<&mut EditForm> {
        self.editor.form_mut()
    }

    /// Commit the editor form. No-op without an open session.
    pub fn save_editor(&mut self) -> Result<Option<PhotoId>, JournalError> {
        let saved = self.editor.save(&mut self.store)?;
        if let Some(id) = &saved {
            self.rerender();
            self.emit(JournalEvent::PhotoSaved { id: id.clone() });
        }
        Ok(saved)
    }

    /// Delete the photo being edited. No-op without an open session.
    pub fn delete_editor(&mut self) -> Result<Option<PhotoRecord>, JournalError> {
        let removed = self.editor.delete(&mut self.store)?;
        if let Some(photo) = &removed {
            self.rerender();
            self.emit(JournalEvent::PhotoDeleted {
                id: photo.id.clone(),
            });
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Map
    // ------------------------------------------------------------------------

    /// Place the photo being edited at `coords`. Ignored when the editor is closed.
    pub fn map_click(&mut self, coords: Coordinates) -> Result<bool, JournalError> {
        let Some(id) = self.editor.editing().cloned() else {
            return Ok(false);
        };
        if !self.store.place(&id, coords)? {
            return Ok(false);
        }
        let location = self
            .store
            .find(&id)
            .map(|p| p.location.clone())
            .unwrap_or_default();
        if let Some(form) = self.editor.form_mut()
            && form.location.is_empty()
        {
            form.location = location.clone();
        }
        self.rerender();
        self.emit(JournalEvent::PhotoPlaced {
            id,
            coords,
            location,
        });
        Ok(true)
    }

    /// Open the editor on the photo behind a marker.
    pub fn marker_click(&mut self, handle: MarkerHandle) -> bool {
        match self.map.photo_for_marker(handle).cloned() {
            Some(id) => self.open_editor(&id),
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Gallery
    // ------------------------------------------------------------------------

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
    }

    /// `None` (or an empty string) shows all locations.
    pub fn set_location_filter(&mut self, location: Option<String>) {
        self.filter.location = location.filter(|l| !l.is_empty());
    }

    pub fn cards(&self) -> Vec<Card<'_>> {
        gallery::cards(self.store.photos(), &self.filter, &self.config.labels)
    }

    pub fn location_options(&self) -> Vec<&str> {
        gallery::location_options(self.store.photos())
    }

    // ------------------------------------------------------------------------
    // Diary
    // ------------------------------------------------------------------------

    pub fn open_diary(&mut self) {
        self.diary.open();
    }

    pub fn close_diary(&mut self) {
        self.diary.close();
    }

    pub fn toggle_diary_photo(&mut self, id: &PhotoId) {
        self.diary.toggle(id, self.store.photos());
    }

    pub fn set_diary_checked(&mut self, id: &PhotoId, checked: bool) {
        self.diary.set_checked(id, checked, self.store.photos());
    }

    pub fn set_diary_title(&mut self, title: impl Into<String>) {
        self.diary.set_title(title);
    }

    pub fn diary_title(&self) -> &str {
        self.diary.title(&self.config.labels)
    }

    pub fn diary_preview(&self) -> Markup {
        self.diary.preview(&self.config.labels)
    }

    /// Refresh the preview and report what it contains.
    pub fn generate_diary(&self) -> Markup {
        let preview = self.diary_preview();
        self.emit(JournalEvent::DiaryGenerated {
            title: self.diary_title().to_string(),
            entries: self.diary.selected().len(),
        });
        preview
    }

    pub fn export_pdf<R: PdfRenderer>(&self, renderer: &mut R) -> Result<PathBuf, JournalError> {
        let path = pdf::export_diary(
            renderer,
            self.diary_title(),
            self.diary.selected(),
            &self.config.pdf,
            &self.config.labels,
        )?;
        self.emit(JournalEvent::PdfExported { path: path.clone() });
        Ok(path)
    }

    /// Share link for the current diary, based on the page address.
    pub fn share_url(&self, page_url: &str) -> Result<String, JournalError> {
        let payload = self.diary.payload(&self.config.labels);
        Ok(share::share_url(page_url, &self.config.share.param, &payload)?)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn photos(&self) -> &[PhotoRecord] {
        self.store.photos()
    }

    pub fn find(&self, id: &PhotoId) -> Option<&PhotoRecord> {
        self.store.find(id)
    }

    pub fn store(&self) -> &PhotoStore<S> {
        &self.store
    }

    pub fn map(&self) -> &MapAdapter<M> {
        &self.map
    }

    pub fn editor(&self) -> &EditorPanel {
        &self.editor
    }

    pub fn diary(&self) -> &DiaryComposer {
        &self.diary
    }

    pub fn filter(&self) -> &GalleryFilter {
        &self.filter
    }
}

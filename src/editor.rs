//! The edit panel: one photo at a time, explicit open/commit/discard.
//!
//! The panel is either closed or holds an [`EditSession`]: the id of the photo
//! being edited plus the pending form values. Form edits touch only the
//! session; the store sees them on [`EditorPanel::save`]. Closing the panel
//! discards whatever was typed.
//!
//! Save and delete without a session are silent no-ops.

use crate::storage::KeyValueStore;
use crate::store::{PhotoStore, StoreError};
use crate::types::{PhotoId, PhotoRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// `datetime-local` format: minute precision, no zone.
pub const FORM_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Invalid time {0:?}, expected YYYY-MM-DDTHH:MM")]
    InvalidTime(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pending form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub location: String,
    pub description: String,
    /// `YYYY-MM-DDTHH:MM`
    pub time: String,
}

impl EditForm {
    pub fn from_record(photo: &PhotoRecord) -> Self {
        Self {
            location: photo.location.clone(),
            description: photo.description.clone(),
            time: photo.timestamp.format(FORM_TIME_FORMAT).to_string(),
        }
    }

    /// Parse the form time as UTC.
    pub fn timestamp(&self) -> Result<DateTime<Utc>, EditorError> {
        NaiveDateTime::parse_from_str(self.time.trim(), FORM_TIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|_| EditorError::InvalidTime(self.time.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub photo_id: PhotoId,
    pub form: EditForm,
}

#[derive(Debug, Default)]
pub struct EditorPanel {
    session: Option<EditSession>,
}

impl EditorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing `photo`, replacing any open session.
    pub fn open(&mut self, photo: &PhotoRecord) {
        self.session = Some(EditSession {
            photo_id: photo.id.clone(),
            form: EditForm::from_record(photo),
        });
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn editing(&self) -> Option<&PhotoId> {
        self.session.as_ref().map(|s| &s.photo_id)
    }

    pub fn form_mut(&mut self) -> Option<&mut EditForm> {
        self.session.as_mut().map(|s| &mut s.form)
    }

    /// Discard the session and any pending edits.
    pub fn close(&mut self) {
        self.session = None;
    }

    /// Commit the form into the store and close.
    ///
    /// Returns the saved id, or `None` when no session was open (or its photo
    /// is gone). An unparseable time leaves both the store and the session
    /// untouched.
    pub fn save<S: KeyValueStore>(
        &mut self,
        store: &mut PhotoStore<S>,
    ) -> Result<Option<PhotoId>, EditorError> {
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let timestamp = session.form.timestamp()?;
        let form = session.form.clone();
        let id = session.photo_id.clone();
        let found = store.update(&id, |p| {
            p.location = form.location;
            p.description = form.description;
            p.timestamp = timestamp;
        })?;
        self.close();
        Ok(found.then_some(id))
    }

    /// Delete the photo being edited and close.
    pub fn delete<S: KeyValueStore>(
        &mut self,
        store: &mut PhotoStore<S>,
    ) -> Result<Option<PhotoRecord>, EditorError> {
        let Some(session) = &self.session else {
            return Ok(None);
        };
        let removed = store.remove(&session.photo_id)?;
        self.close();
        Ok(removed)
    }
}

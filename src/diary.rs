//! Diary composer: pick photos, preview them as diary entries, export.
//!
//! The composer reads the photo list only when it is opened or when the
//! selection changes; it does not follow later store mutations.
//!
//! ## Selection
//!
//! Each photo is a selector row with a checkbox. Toggling a row recomputes
//! the selected entries as the store-ordered subset of checked ids, so the
//! diary always follows upload order rather than click order.
//!
//! Opening a closed composer starts with nothing checked; re-opening one that
//! is already open keeps its checks. The selected entries themselves survive
//! until the next toggle, which is what lets a diary loaded from a share link
//! (whose photos are not in the store) show up in the preview.

use crate::config::LabelsConfig;
use crate::share::SharePayload;
use crate::types::{DiaryEntry, PhotoId, PhotoRecord, display_date, display_time};
use maud::{Markup, html};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct DiaryComposer {
    open: bool,
    title: String,
    checked: HashSet<PhotoId>,
    selected: Vec<DiaryEntry>,
}

impl DiaryComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        if !self.open {
            self.checked.clear();
        }
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_checked(&self, id: &PhotoId) -> bool {
        self.checked.contains(id)
    }

    /// Flip a row's checkbox and recompute the selection.
    pub fn toggle(&mut self, id: &PhotoId, photos: &[PhotoRecord]) {
        let checked = !self.is_checked(id);
        self.set_checked(id, checked, photos);
    }

    /// Set a row's checkbox and recompute the selection.
    pub fn set_checked(&mut self, id: &PhotoId, checked: bool, photos: &[PhotoRecord]) {
        if checked {
            self.checked.insert(id.clone());
        } else {
            self.checked.remove(id);
        }
        self.selected = photos
            .iter()
            .filter(|p| self.checked.contains(&p.id))
            .map(PhotoRecord::to_entry)
            .collect();
    }

    pub fn selected(&self) -> &[DiaryEntry] {
        &self.selected
    }

    /// Raw title input; may be empty.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Title input, or the default title when the input is empty.
    pub fn title<'a>(&'a self, labels: &'a LabelsConfig) -> &'a str {
        if self.title.trim().is_empty() {
            labels.default_title.as_str()
        } else {
            self.title.as_str()
        }
    }

    /// Replace title and selection with a shared diary.
    pub fn load_shared(&mut self, payload: SharePayload) {
        self.title = payload.title;
        self.selected = payload.photos;
        self.checked.clear();
    }

    /// Snapshot for a share link.
    pub fn payload(&self, labels: &LabelsConfig) -> SharePayload {
        SharePayload {
            title: self.title(labels).to_string(),
            photos: self.selected.clone(),
        }
    }

    /// The diary preview: title and one entry per selected photo, or a prompt
    /// when nothing is selected.
    pub fn preview(&self, labels: &LabelsConfig) -> Markup {
        html! {
            div.diary-preview #diaryPreview {
                @if self.selected.is_empty() {
                    p.diary-empty { (labels.empty_diary_prompt) }
                } @else {
                    h2 { (self.title(labels)) }
                    @for entry in &self.selected {
                        (render_entry(entry, labels))
                    }
                }
            }
        }
    }

    /// One checkbox row per photo.
    pub fn render_selector(&self, photos: &[PhotoRecord], labels: &LabelsConfig) -> Markup {
        html! {
            div.photo-selector #photoSelector {
                @for photo in photos {
                    @let checked = self.is_checked(&photo.id);
                    label.photo-selector-item.selected[checked] {
                        input type="checkbox" value=(photo.id) checked[checked] disabled;
                        img src=(photo.image) alt="";
                        div {
                            strong {
                                @if photo.location.is_empty() { (labels.no_location) }
                                @else { (photo.location) }
                            }
                            p {
                                @if photo.description.is_empty() { (labels.no_description) }
                                @else { (photo.description) }
                            }
                            small { (display_date(&photo.timestamp)) }
                        }
                    }
                }
            }
        }
    }
}

fn render_entry(entry: &DiaryEntry, labels: &LabelsConfig) -> Markup {
    let location = if entry.location.is_empty() {
        labels.unknown_location.as_str()
    } else {
        entry.location.as_str()
    };
    html! {
        div.diary-entry {
            h3 { "📍 " (location) }
            div.entry-meta {
                "📅 " (display_date(&entry.timestamp)) " " (display_time(&entry.timestamp))
            }
            @if !entry.description.is_empty() {
                p { (entry.description) }
            }
            img src=(entry.image) alt=(entry.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{photo, photo_at};

    fn photos() -> Vec<PhotoRecord> {
        vec![
            photo_at("a", "Paris", "Nice trip", 0),
            photo_at("b", "", "", 1),
            photo_at("c", "Tokyo", "", 2),
        ]
    }

    fn entry_count(html: &str) -> usize {
        html.matches(r#"class="diary-entry""#).count()
    }

    #[test]
    fn empty_selection_shows_prompt() {
        let composer = DiaryComposer::new();
        let labels = LabelsConfig::default();
        let html = composer.preview(&labels).into_string();
        assert!(html.contains("Select photos to include in your diary"));
        assert_eq!(entry_count(&html), 0);
    }

    #[test]
    fn selection_follows_store_order_not_click_order() {
        let photos = photos();
        let mut composer = DiaryComposer::new();
        composer.open();
        composer.toggle(&"c".into(), &photos);
        composer.toggle(&"a".into(), &photos);
        let locations: Vec<&str> = composer.selected().iter().map(|e| e.location.as_str()).collect();
        assert_eq!(locations, ["Paris", "Tokyo"]);
    }

    #[test]
    fn preview_has_one_entry_per_selected_photo() {
        let photos = photos();
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        composer.open();
        for p in &photos {
            composer.toggle(&p.id, &photos);
        }
        let html = composer.preview(&labels).into_string();
        assert_eq!(entry_count(&html), 3);
        assert!(html.contains("<h2>My Travel Diary</h2>"));
        assert!(html.contains("Unknown location"));
        assert!(html.contains("2024/5/31 16:08"));
        let paris = html.find("Paris").unwrap();
        let tokyo = html.find("Tokyo").unwrap();
        assert!(paris < tokyo);
    }

    #[test]
    fn description_only_rendered_when_present() {
        let photos = vec![photo("a", "Paris", "")];
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        composer.toggle(&"a".into(), &photos);
        let html = composer.preview(&labels).into_string();
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn toggle_twice_unselects() {
        let photos = photos();
        let mut composer = DiaryComposer::new();
        composer.toggle(&"a".into(), &photos);
        composer.toggle(&"a".into(), &photos);
        assert!(composer.selected().is_empty());
        assert!(!composer.is_checked(&"a".into()));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let photos = photos();
        let mut composer = DiaryComposer::new();
        composer.set_checked(&"ghost".into(), true, &photos);
        assert!(composer.selected().is_empty());
    }

    #[test]
    fn reopening_from_closed_resets_checks() {
        let photos = photos();
        let mut composer = DiaryComposer::new();
        composer.open();
        composer.toggle(&"a".into(), &photos);
        composer.open();
        assert!(composer.is_checked(&"a".into()));
        composer.close();
        composer.open();
        assert!(!composer.is_checked(&"a".into()));
    }

    #[test]
    fn title_falls_back_to_default() {
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        assert_eq!(composer.title(&labels), "My Travel Diary");
        composer.set_title("  ");
        assert_eq!(composer.title(&labels), "My Travel Diary");
        composer.set_title("Japan 2023");
        assert_eq!(composer.title(&labels), "Japan 2023");
    }

    #[test]
    fn shared_diary_previews_without_store() {
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        composer.load_shared(SharePayload {
            title: "Shared".into(),
            photos: vec![photo("x", "Lisbon", "Tram").to_entry()],
        });
        composer.open();
        let html = composer.preview(&labels).into_string();
        assert!(html.contains("<h2>Shared</h2>"));
        assert_eq!(entry_count(&html), 1);
    }

    #[test]
    fn selector_marks_checked_rows() {
        let photos = photos();
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        composer.toggle(&"b".into(), &photos);
        let html = composer.render_selector(&photos, &labels).into_string();
        assert_eq!(html.matches("photo-selector-item").count(), 3);
        assert!(html.contains(r#"value="b" checked"#));
        assert!(html.contains("No location set"));
    }

    #[test]
    fn payload_uses_effective_title() {
        let photos = photos();
        let labels = LabelsConfig::default();
        let mut composer = DiaryComposer::new();
        composer.toggle(&"a".into(), &photos);
        let payload = composer.payload(&labels);
        assert_eq!(payload.title, "My Travel Diary");
        assert_eq!(payload.photos.len(), 1);
    }
}

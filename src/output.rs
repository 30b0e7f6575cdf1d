//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every photo is shown by what it is (its location, or a placeholder) with a
//! positional index; the id, description, time, and position follow as
//! indented context lines. The id is what the other commands take, so it is
//! always shown.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! 001 Paris
//!     Id: 1717171717000-a1b2c3
//!     Description: Nice trip
//!     Time: 2024/5/31 16:08
//!     Position: 48.8566, 2.3522
//! 002 No location set
//!     Id: 1717171718000-x9y8z7
//!     Time: 2024/5/31 17:08
//!
//! 2 photos
//! ```
//!
//! ## Diary
//!
//! ```text
//! My Travel Diary (1 entry)
//! 001 Paris
//!     2024/5/31 16:08
//!     Nice trip
//! ```
//!
//! ## Events
//!
//! ```text
//! Added 1717171717000-a1b2c3
//!     Source: trip/IMG_0001.jpg
//! Warning: share link could not be read: Invalid base64: ...
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that does the I/O. Warnings go to
//! stderr, everything else to stdout.

use crate::config::LabelsConfig;
use crate::journal::JournalEvent;
use crate::types::{DiaryEntry, PhotoRecord, display_date, display_time};

const DESCRIPTION_MAX: usize = 60;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

fn when(entry_time: &chrono::DateTime<chrono::Utc>) -> String {
    format!("{} {}", display_date(entry_time), display_time(entry_time))
}

// ============================================================================
// Photo list
// ============================================================================

pub fn format_photo_list(photos: &[&PhotoRecord], labels: &LabelsConfig) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, photo) in photos.iter().enumerate() {
        let title = if photo.location.is_empty() {
            &labels.no_location
        } else {
            &photo.location
        };
        lines.push(format!("{} {}", format_index(i + 1), title));
        lines.push(format!("{}Id: {}", indent(1), photo.id));
        if !photo.description.is_empty() {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(&photo.description, DESCRIPTION_MAX)
            ));
        }
        lines.push(format!("{}Time: {}", indent(1), when(&photo.timestamp)));
        if let Some(coords) = photo.coordinates {
            lines.push(format!("{}Position: {}", indent(1), coords.label()));
        }
    }
    if !photos.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(photos.len(), "photo", "photos"));
    lines
}

pub fn print_photo_list(photos: &[&PhotoRecord], labels: &LabelsConfig) {
    for line in format_photo_list(photos, labels) {
        println!("{}", line);
    }
}

// ============================================================================
// Diary
// ============================================================================

pub fn format_diary(title: &str, entries: &[DiaryEntry], labels: &LabelsConfig) -> Vec<String> {
    if entries.is_empty() {
        return vec![labels.empty_diary_prompt.clone()];
    }
    let mut lines = vec![format!(
        "{} ({})",
        title,
        plural(entries.len(), "entry", "entries")
    )];
    for (i, entry) in entries.iter().enumerate() {
        let location = if entry.location.is_empty() {
            &labels.unknown_location
        } else {
            &entry.location
        };
        lines.push(format!("{} {}", format_index(i + 1), location));
        lines.push(format!("{}{}", indent(1), when(&entry.timestamp)));
        if !entry.description.is_empty() {
            lines.push(format!("{}{}", indent(1), entry.description));
        }
    }
    lines
}

pub fn print_diary(title: &str, entries: &[DiaryEntry], labels: &LabelsConfig) {
    for line in format_diary(title, entries, labels) {
        println!("{}", line);
    }
}

// ============================================================================
// Journal events
// ============================================================================

/// Events that indicate something went wrong but the journal carried on.
pub fn is_warning(event: &JournalEvent) -> bool {
    matches!(
        event,
        JournalEvent::StorageRecovered { .. }
            | JournalEvent::UploadFailed { .. }
            | JournalEvent::ShareDecodeFailed { .. }
    )
}

pub fn format_journal_event(event: &JournalEvent) -> Vec<String> {
    match event {
        JournalEvent::Loaded { count } => vec![format!("Loaded {}", plural(*count, "photo", "photos"))],
        JournalEvent::StorageRecovered { reason } => vec![format!(
            "Warning: saved photos could not be read, starting empty: {}",
            reason
        )],
        JournalEvent::PhotoAdded { id, source } => vec![
            format!("Added {}", id),
            format!("{}Source: {}", indent(1), source.display()),
        ],
        JournalEvent::UploadFailed { error } => vec![format!("Warning: skipped upload: {}", error)],
        JournalEvent::PhotoSaved { id } => vec![format!("Saved {}", id)],
        JournalEvent::PhotoDeleted { id } => vec![format!("Deleted {}", id)],
        JournalEvent::PhotoPlaced {
            id,
            coords,
            location,
        } => vec![
            format!("Placed {} at {}", id, coords.label()),
            format!("{}Location: {}", indent(1), location),
        ],
        JournalEvent::SharedDiaryOpened { title, photos } => vec![format!(
            "Opened shared diary {} ({})",
            title,
            plural(*photos, "entry", "entries")
        )],
        JournalEvent::ShareDecodeFailed { error } => {
            vec![format!("Warning: share link could not be read: {}", error)]
        }
        JournalEvent::DiaryGenerated { title, entries } => vec![format!(
            "Generated {} ({})",
            title,
            plural(*entries, "entry", "entries")
        )],
        JournalEvent::PdfExported { path } => {
            vec![format!("PDF \u{2192} {}", path.display())]
        }
    }
}

/// Print an event: warnings to stderr, the rest to stdout.
pub fn print_journal_event(event: &JournalEvent) {
    let warning = is_warning(event);
    for line in format_journal_event(event) {
        if warning {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

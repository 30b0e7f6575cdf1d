//! Gallery cards, search, and location filtering.
//!
//! Filtering happens on the model, not on rendered elements: [`cards`] takes
//! the full photo list plus a [`GalleryFilter`] and returns only the cards
//! that pass. Rendering is a pure function of `(photos, filter)`, so a
//! re-render can never drop an active filter.
//!
//! Both filters compare against what a card *displays*, placeholders
//! included:
//!
//! - **search**: case-insensitive substring of the displayed location or
//!   the displayed description
//! - **location**: exact match on the displayed location; `None` means
//!   "all locations"
//!
//! When both are set a card has to pass both.

use crate::config::LabelsConfig;
use crate::types::{PhotoId, PhotoRecord};
use maud::{Markup, html};

/// Active gallery filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryFilter {
    pub search: String,
    pub location: Option<String>,
}

impl GalleryFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.location.is_some()
    }
}

/// What one gallery card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card<'a> {
    pub id: &'a PhotoId,
    pub image: &'a str,
    /// Location, or the "no location" placeholder.
    pub location: &'a str,
    /// Description, or the "no description" placeholder.
    pub description: &'a str,
    /// Location badge, only when a location is set.
    pub badge: Option<&'a str>,
}

impl<'a> Card<'a> {
    pub fn new(photo: &'a PhotoRecord, labels: &'a LabelsConfig) -> Self {
        let location = non_empty(&photo.location).unwrap_or(&labels.no_location);
        let description = non_empty(&photo.description).unwrap_or(&labels.no_description);
        Self {
            id: &photo.id,
            image: &photo.image,
            location,
            description,
            badge: non_empty(&photo.location),
        }
    }

    fn matches(&self, filter: &GalleryFilter) -> bool {
        if let Some(location) = &filter.location
            && self.location != location.as_str()
        {
            return false;
        }
        if filter.search.is_empty() {
            return true;
        }
        let term = filter.search.to_lowercase();
        self.location.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Cards for every photo passing `filter`, in store order.
pub fn cards<'a>(
    photos: &'a [PhotoRecord],
    filter: &GalleryFilter,
    labels: &'a LabelsConfig,
) -> Vec<Card<'a>> {
    photos
        .iter()
        .map(|p| Card::new(p, labels))
        .filter(|c| c.matches(filter))
        .collect()
}

/// Distinct non-empty locations, in order of first appearance.
pub fn location_options(photos: &[PhotoRecord]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    photos
        .iter()
        .map(|p| p.location.as_str())
        .filter(|l| !l.is_empty() && seen.insert(*l))
        .collect()
}

/// Renders the card grid.
pub fn render_cards(cards: &[Card<'_>]) -> Markup {
    html! {
        div.photos-grid #photosGrid {
            @for card in cards {
                div.photo-item data-photo-id=(card.id) {
                    img src=(card.image) alt=(card.location) loading="lazy";
                    div.photo-info {
                        h4 { (card.location) }
                        p { (card.description) }
                    }
                    @if let Some(badge) = card.badge {
                        div.photo-location { "📍 " (badge) }
                    }
                }
            }
        }
    }
}

/// Renders the search box and location dropdown.
pub fn render_filters(
    filter: &GalleryFilter,
    options: &[&str],
    labels: &LabelsConfig,
) -> Markup {
    html! {
        div.filters {
            input #searchInput type="search" placeholder="Search location or description"
                value=(filter.search) disabled;
            select #locationFilter disabled {
                option value="" selected[filter.location.is_none()] { (labels.all_locations) }
                @for location in options {
                    option value=(location)
                        selected[filter.location.as_deref() == Some(*location)] { (location) }
                }
            }
        }
    }
}

//! Map markers for geolocated photos.
//!
//! The map itself (tiles, panning, popups) belongs to a widget behind the
//! [`MapWidget`] trait. [`MapAdapter`] keeps the one-to-one mapping between
//! photos that have coordinates and the widget's markers.
//!
//! ## Rebuild, don't diff
//!
//! Every store mutation that can touch coordinates or the photo set calls
//! [`MapAdapter::rebuild`], which removes every marker and adds them back from
//! the current list. Journals hold tens of photos, not thousands, so a full
//! rebuild is cheap and can never leave a stale marker behind. Markers are
//! keyed by photo id, so switching to an incremental diff later stays local
//! to `rebuild`.
//!
//! ## Widgets
//!
//! - [`LeafletLayer`]: the production widget. It holds markers in memory and
//!   renders the Leaflet bootstrap script embedded in the journal page.
//! - A recording mock lives in this module's tests.

use crate::config::MapConfig;
use crate::types::{Coordinates, PhotoId, PhotoRecord, display_date};
use maud::{Markup, html};
use std::collections::BTreeMap;

/// Opaque marker handle issued by a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerHandle(pub u64);

/// Marker placement surface of a map widget.
pub trait MapWidget {
    /// Place a marker with popup content. Returns the widget's handle for it.
    fn add_marker(&mut self, coords: Coordinates, popup: Markup) -> MarkerHandle;

    /// Remove a previously added marker.
    fn remove_marker(&mut self, handle: MarkerHandle);
}

/// Keeps exactly one marker per photo with coordinates.
pub struct MapAdapter<M> {
    widget: M,
    markers: BTreeMap<PhotoId, MarkerHandle>,
}

impl<M: MapWidget> MapAdapter<M> {
    pub fn new(widget: M) -> Self {
        Self {
            widget,
            markers: BTreeMap::new(),
        }
    }

    /// Tear down every marker and rebuild from `photos`.
    pub fn rebuild(&mut self, photos: &[PhotoRecord]) {
        for (_, handle) in std::mem::take(&mut self.markers) {
            self.widget.remove_marker(handle);
        }
        for photo in photos {
            if let Some(coords) = photo.coordinates {
                let handle = self.widget.add_marker(coords, popup(photo));
                self.markers.insert(photo.id.clone(), handle);
            }
        }
    }

    pub fn marker_for(&self, id: &PhotoId) -> Option<MarkerHandle> {
        self.markers.get(id).copied()
    }

    /// Resolve a clicked marker back to its photo.
    pub fn photo_for_marker(&self, handle: MarkerHandle) -> Option<&PhotoId> {
        self.markers
            .iter()
            .find(|(_, h)| **h == handle)
            .map(|(id, _)| id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// `(photo id, marker)` pairs in id order.
    pub fn markers(&self) -> impl Iterator<Item = (&PhotoId, MarkerHandle)> {
        self.markers.iter().map(|(id, h)| (id, *h))
    }

    pub fn widget(&self) -> &M {
        &self.widget
    }
}

/// Popup shown when a marker is opened: thumbnail, location, description, date.
pub fn popup(photo: &PhotoRecord) -> Markup {
    html! {
        div.marker-popup {
            img.marker-thumb src=(photo.image) alt=(photo.location);
            h4 { (photo.location) }
            p { (photo.description) }
            small { (display_date(&photo.timestamp)) }
        }
    }
}

// ============================================================================
// Leaflet widget
// ============================================================================

/// A marker as held by [`LeafletLayer`].
#[derive(Debug, Clone)]
pub struct PlacedMarker {
    pub coords: Coordinates,
    pub popup: String,
}

/// In-memory marker layer rendered as a Leaflet script on the journal page.
#[derive(Debug, Default)]
pub struct LeafletLayer {
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, PlacedMarker>,
}

impl LeafletLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&PlacedMarker> {
        self.markers.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl MapWidget for LeafletLayer {
    fn add_marker(&mut self, coords: Coordinates, popup: Markup) -> MarkerHandle {
        self.next_handle += 1;
        let handle = MarkerHandle(self.next_handle);
        self.markers.insert(
            handle,
            PlacedMarker {
                coords,
                popup: popup.into_string(),
            },
        );
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }
}

/// Leaflet bootstrap for the `#map` element.
///
/// Marker clicks scroll to and highlight the gallery card whose
/// `data-photo-id` equals the marker's id. Ids are compared as values, never
/// spliced into a selector.
pub fn leaflet_script(config: &MapConfig, adapter: &MapAdapter<LeafletLayer>) -> String {
    let markers: Vec<serde_json::Value> = adapter
        .markers()
        .filter_map(|(id, handle)| {
            adapter.widget().marker(handle).map(|m| {
                serde_json::json!({
                    "id": id.as_str(),
                    "coords": [m.coords.lat, m.coords.lng],
                    "popup": m.popup,
                })
            })
        })
        .collect();
    let setup = serde_json::json!({
        "center": config.center,
        "zoom": config.zoom,
        "maxZoom": config.max_zoom,
        "tileUrl": config.tile_url,
        "attribution": config.attribution,
        "markers": markers,
    });
    // `</` cannot appear inside the inline script
    let setup = setup.to_string().replace("</", "<\\/");
    format!(
        r#"(function () {{
  var setup = {setup};
  var map = L.map('map').setView(setup.center, setup.zoom);
  L.tileLayer(setup.tileUrl, {{ attribution: setup.attribution, maxZoom: setup.maxZoom }}).addTo(map);
  setup.markers.forEach(function (m) {{
    var marker = L.marker(m.coords).addTo(map);
    marker.bindPopup(m.popup);
    marker.on('click', function () {{
      document.querySelectorAll('.photo-item[data-photo-id]').forEach(function (card) {{
        var match = card.dataset.photoId === m.id;
        card.classList.toggle('highlight', match);
        if (match) {{ card.scrollIntoView({{ block: 'center' }}); }}
      }});
    }});
  }});
}})();"#
    )
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::{photo, placed};

    /// Widget that records every call.
    #[derive(Default)]
    pub struct RecordingMap {
        next: u64,
        pub live: BTreeMap<MarkerHandle, Coordinates>,
        pub operations: Vec<MapOp>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum MapOp {
        Add(MarkerHandle, Coordinates),
        Remove(MarkerHandle),
    }

    impl MapWidget for RecordingMap {
        fn add_marker(&mut self, coords: Coordinates, _popup: Markup) -> MarkerHandle {
            self.next += 1;
            let handle = MarkerHandle(self.next);
            self.live.insert(handle, coords);
            self.operations.push(MapOp::Add(handle, coords));
            handle
        }

        fn remove_marker(&mut self, handle: MarkerHandle) {
            self.live.remove(&handle);
            self.operations.push(MapOp::Remove(handle));
        }
    }

    #[test]
    fn one_marker_per_geolocated_photo() {
        let mut adapter = MapAdapter::new(RecordingMap::default());
        let photos = vec![
            placed("a", "Paris", 48.8566, 2.3522),
            photo("b", "Nowhere", ""),
            placed("c", "", 35.6762, 139.6503),
        ];
        adapter.rebuild(&photos);
        assert_eq!(adapter.marker_count(), 2);
        assert!(adapter.marker_for(&"a".into()).is_some());
        assert!(adapter.marker_for(&"b".into()).is_none());
        assert_eq!(adapter.widget().live.len(), 2);
    }

    #[test]
    fn rebuild_tears_down_everything_first() {
        let mut adapter = MapAdapter::new(RecordingMap::default());
        let photos = vec![placed("a", "", 1.0, 2.0)];
        adapter.rebuild(&photos);
        adapter.rebuild(&photos);
        let ops = &adapter.widget().operations;
        assert_eq!(
            ops,
            &vec![
                MapOp::Add(MarkerHandle(1), Coordinates::new(1.0, 2.0)),
                MapOp::Remove(MarkerHandle(1)),
                MapOp::Add(MarkerHandle(2), Coordinates::new(1.0, 2.0)),
            ]
        );
        assert_eq!(adapter.widget().live.len(), 1);
    }

    #[test]
    fn removed_photo_loses_its_marker() {
        let mut adapter = MapAdapter::new(RecordingMap::default());
        let mut photos = vec![placed("a", "", 1.0, 2.0), placed("b", "", 3.0, 4.0)];
        adapter.rebuild(&photos);
        photos.remove(0);
        adapter.rebuild(&photos);
        assert!(adapter.marker_for(&"a".into()).is_none());
        assert_eq!(adapter.widget().live.len(), 1);
    }

    #[test]
    fn photo_for_marker_resolves_clicks() {
        let mut adapter = MapAdapter::new(RecordingMap::default());
        adapter.rebuild(&[placed("a", "", 1.0, 2.0)]);
        let handle = adapter.marker_for(&"a".into()).unwrap();
        assert_eq!(adapter.photo_for_marker(handle), Some(&"a".into()));
        assert_eq!(adapter.photo_for_marker(MarkerHandle(999)), None);
    }

    #[test]
    fn popup_escapes_text() {
        let mut p = placed("a", "<b>Paris</b>", 1.0, 2.0);
        p.description = "Fish & chips".into();
        let html = popup(&p).into_string();
        assert!(html.contains("&lt;b&gt;Paris&lt;/b&gt;"));
        assert!(html.contains("Fish &amp; chips"));
        assert!(html.contains("2024/5/31"));
    }

    #[test]
    fn leaflet_script_lists_markers() {
        let mut adapter = MapAdapter::new(LeafletLayer::new());
        adapter.rebuild(&[placed("a", "Paris", 48.8566, 2.3522)]);
        let script = leaflet_script(&MapConfig::default(), &adapter);
        assert!(script.contains("\"id\":\"a\""));
        assert!(script.contains("48.8566"));
        assert!(script.contains("tile.openstreetmap.org"));
        assert!(!script.contains("</h4>"));
    }

    #[test]
    fn leaflet_script_matches_cards_by_value() {
        let mut adapter = MapAdapter::new(LeafletLayer::new());
        adapter.rebuild(&[placed(r#"a"] , x[y="#, "", 1.0, 2.0)]);
        let script = leaflet_script(&MapConfig::default(), &adapter);
        assert!(script.contains(r#""id":"a\"] , x[y=""#));
        assert!(script.contains("card.dataset.photoId === m.id"));
        assert!(!script.contains("+ m.id"));
        assert!(!script.contains("map.on('click'"));
    }
}

//! The journal page: one self-contained HTML document built with Maud.
//!
//! ```text
//! header     title and how to add photos
//! #map       Leaflet map with one marker per placed photo
//! .filters   search box and location dropdown
//! #photosGrid  gallery cards
//! #editPanel   the open session's values (hidden when closed)
//! #diaryModal  selector, title input, preview (hidden when closed)
//! ```
//!
//! The page is a read-only snapshot of a [`Journal`]: open panels render with
//! the `open` class, and the filter controls show the current filter. Form
//! controls are disabled and each panel names the `photo-journal` command
//! that performs its actions. The map stays live: it pans, zooms, and
//! highlights a photo's card when its marker is clicked.

use crate::config::generate_theme_css;
use crate::editor::EditSession;
use crate::gallery;
use crate::journal::Journal;
use crate::map::{LeafletLayer, leaflet_script};
use crate::storage::KeyValueStore;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const CSS_STATIC: &str = include_str!("../static/style.css");
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const PAGE_TITLE: &str = "Travel Photo Journal";

/// Render the whole page for the journal's current state.
pub fn render_page<S: KeyValueStore>(journal: &Journal<S, LeafletLayer>) -> Markup {
    let config = journal.config();
    let css = format!("{}\n\n{}", generate_theme_css(&config.theme), CSS_STATIC);
    let cards = journal.cards();
    let options = journal.location_options();

    let content = html! {
        (page_header())
        main.journal {
            div #map {}
            section.gallery {
                (gallery::render_filters(journal.filter(), &options, &config.labels))
                (gallery::render_cards(&cards))
            }
        }
        (edit_panel(journal.editor().session()))
        (diary_modal(journal))
        script src=(LEAFLET_JS) {}
        script { (PreEscaped(leaflet_script(&config.map, journal.map()))) }
    };

    base_document(PAGE_TITLE, &css, content)
}

fn base_document(title: &str, css: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(LEAFLET_CSS);
                style { (PreEscaped(css)) }
            }
            body {
                (content)
            }
        }
    }
}

fn page_header() -> Markup {
    html! {
        header.site-header {
            h1 { (PAGE_TITLE) }
            p.hint { "Add photos with " code { "photo-journal upload <FILES>" } }
        }
    }
}

fn edit_panel(session: Option<&EditSession>) -> Markup {
    let open = session.is_some();
    html! {
        aside.edit-panel.open[open] #editPanel {
            h3 { "Edit photo" }
            @if let Some(session) = session {
                fieldset #editForm data-photo-id=(session.photo_id) disabled {
                    label for="photoLocation" { "Location" }
                    input #photoLocation type="text" value=(session.form.location);
                    label for="photoDescription" { "Description" }
                    textarea #photoDescription rows="4" { (session.form.description) }
                    label for="photoTime" { "Time" }
                    input #photoTime type="datetime-local" value=(session.form.time);
                }
                p.hint {
                    "Change with " code { "photo-journal edit " (session.photo_id) }
                    ", put on the map with "
                    code { "photo-journal place " (session.photo_id) " <LAT> <LNG>" }
                    ", remove with " code { "photo-journal delete " (session.photo_id) }
                }
            }
        }
    }
}

fn diary_modal<S: KeyValueStore>(journal: &Journal<S, LeafletLayer>) -> Markup {
    let labels = &journal.config().labels;
    let diary = journal.diary();
    html! {
        div.modal.open[diary.is_open()] #diaryModal {
            div.modal-content {
                h2 { "Create travel diary" }
                label for="diaryTitle" { "Title" }
                input #diaryTitle type="text" placeholder=(labels.default_title)
                    value=(diary.title(labels)) disabled;
                (diary.render_selector(journal.photos(), labels))
                p.hint {
                    "Compose with " code { "photo-journal diary --select <ID>" }
                    ", then add " code { "--pdf <DIR>" } " or " code { "--share <PAGE_URL>" }
                }
                (journal.diary_preview())
            }
        }
    }
}

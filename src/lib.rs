//! Client-side layer of the RecipeRover bookkeeping dashboard.
//!
//! The server renders every page; this module attaches behavior to the
//! markup once the WASM bundle is instantiated: theme toggling, chart
//! rendering, AJAX form submission, notifications and the journal line
//! editor. Fragments absent from a given page are simply skipped.

mod alerts;
mod api;
mod charts;
mod dom;
mod journal;
mod money;
mod notifications;
mod theme;

use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Node};

const DELETE_PROMPT: &str =
    "Êtes-vous sûr de vouloir supprimer cet élément ? Cette action est irréversible.";

#[wasm_bindgen(start)]
pub fn start() {
    let Some(document) = dom::document() else {
        return;
    };

    init_mobile_menu(&document);
    init_delete_confirmations(&document);

    theme::init(&document);
    notifications::init(&document);
    api::init(&document);
    journal::init(&document);
    charts::init(&document);
}

fn init_mobile_menu(document: &Document) {
    let Some(toggle) = document.query_selector(".mobile-menu-toggle").ok().flatten() else {
        return;
    };
    let Some(sidebar) = document.query_selector(".sidebar").ok().flatten() else {
        return;
    };

    {
        let sidebar = sidebar.clone();
        EventListener::new(&toggle, "click", move |_| {
            let _ = sidebar.class_list().toggle("active");
        })
        .forget();
    }

    EventListener::new(document, "click", move |event| {
        if !sidebar.class_list().contains("active") {
            return;
        }
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
            return;
        };
        if sidebar.contains(Some(&target)) || toggle.contains(Some(&target)) {
            return;
        }
        let _ = sidebar.class_list().remove_1("active");
    })
    .forget();
}

// Plain (non-AJAX) delete controls get a confirmation guard; declining
// cancels the native action.
fn init_delete_confirmations(document: &Document) {
    for button in dom::query_all(document, ".delete-btn") {
        EventListener::new(&button, "click", |event| {
            let confirmed = dom::window()
                .and_then(|window| window.confirm_with_message(DELETE_PROMPT).ok())
                .unwrap_or(false);
            if !confirmed {
                event.prevent_default();
            }
        })
        .forget();
    }
}

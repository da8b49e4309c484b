//! Notification dropdown and read-state bookkeeping.

use gloo_console::error;
use gloo_events::EventListener;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlElement, Node};

use crate::{api, dom};

#[derive(Clone, Debug, Deserialize)]
struct Ack {
    status: String,
}

pub fn init(document: &Document) {
    let Some(toggle) = document.query_selector(".notification-toggle").ok().flatten() else {
        return;
    };
    let Some(dropdown) = document
        .query_selector(".notifications-dropdown")
        .ok()
        .flatten()
    else {
        return;
    };

    {
        let dropdown = dropdown.clone();
        EventListener::new(&toggle, "click", move |event| {
            event.prevent_default();
            event.stop_propagation();
            let _ = dropdown.class_list().toggle("show");
        })
        .forget();
    }

    // Clicking anywhere outside the panel or its toggle closes it.
    {
        let dropdown = dropdown.clone();
        let toggle = toggle.clone();
        EventListener::new(document, "click", move |event| {
            if !dropdown.class_list().contains("show") {
                return;
            }
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Node>().ok()) else {
                return;
            };
            if dropdown.contains(Some(&target)) || toggle.contains(Some(&target)) {
                return;
            }
            let _ = dropdown.class_list().remove_1("show");
        })
        .forget();
    }

    if let Some(mark_all) = document.query_selector(".mark-all-read").ok().flatten() {
        EventListener::new(&mark_all, "click", move |event| {
            event.prevent_default();
            mark_all_read();
        })
        .forget();
    }

    for item in dom::query_all(document, ".notification-item") {
        wire_item(item);
    }
}

fn mark_all_read() {
    spawn_local(async move {
        let ack = match api::post_json("/notifications/mark_all_read").await {
            Ok(response) => response.json::<Ack>().await,
            Err(err) => Err(err),
        };
        match ack {
            Ok(ack) if ack.status == "success" => {
                let Some(document) = dom::document() else {
                    return;
                };
                for item in dom::query_all(&document, ".notification-item.unread") {
                    let _ = item.class_list().remove_1("unread");
                }
                set_badge(&document, 0);
            }
            Ok(_) => {}
            Err(err) => error!("mark all read failed:", err.to_string()),
        }
    });
}

fn wire_item(item: Element) {
    let target = item.clone();
    EventListener::new(&item, "click", move |_| activate(target.clone())).forget();
}

fn activate(item: Element) {
    if item.class_list().contains("unread") {
        if let Some(id) = item.get_attribute("data-id") {
            let item = item.clone();
            spawn_local(async move {
                let url = format!("/notifications/mark_read/{id}");
                let ack = match api::post_json(&url).await {
                    Ok(response) => response.json::<Ack>().await,
                    Err(err) => Err(err),
                };
                match ack {
                    Ok(ack) if ack.status == "success" => {
                        let _ = item.class_list().remove_1("unread");
                        if let Some(document) = dom::document() {
                            let count = badge_count(&document).saturating_sub(1);
                            set_badge(&document, count);
                        }
                    }
                    Ok(_) => {}
                    Err(err) => error!("mark read failed:", err.to_string()),
                }
            });
        }
    }

    if let Some(link) = item.get_attribute("data-link") {
        if let Some(window) = dom::window() {
            let _ = window.location().set_href(&link);
        }
    }
}

fn badge_count(document: &Document) -> u32 {
    document
        .query_selector(".notification-badge .badge")
        .ok()
        .flatten()
        .and_then(|badge| badge.text_content())
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}

fn set_badge(document: &Document, count: u32) {
    let Some(badge) = document
        .query_selector(".notification-badge .badge")
        .ok()
        .flatten()
    else {
        return;
    };
    badge.set_text_content(Some(&count.to_string()));
    if count == 0 {
        if let Some(element) = badge.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property("display", "none");
        }
    }
}

//! Dark/light theme preference, persisted under a single localStorage key.

use gloo_events::EventListener;
use web_sys::Document;

use crate::charts;

const STORAGE_KEY: &str = "theme";
const DARK_CLASS: &str = "dark-mode";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything other than the literal `dark` flag is light, including an
    /// unset key.
    pub fn from_flag(raw: Option<&str>) -> Theme {
        match raw {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

pub fn load() -> Theme {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(raw) = storage.get_item(STORAGE_KEY) {
                return Theme::from_flag(raw.as_deref());
            }
        }
    }
    Theme::Light
}

pub fn save(theme: Theme) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            let _ = storage.set_item(STORAGE_KEY, theme.as_str());
        }
    }
}

/// Applies the persisted theme and wires the toggle control. Toggling
/// persists the new flag and restyles every rendered chart.
pub fn init(document: &Document) {
    apply(document, load());

    let Some(toggle) = document.query_selector(".dark-mode-toggle").ok().flatten() else {
        return;
    };
    let document = document.clone();
    EventListener::new(&toggle, "click", move |_| {
        let next = load().toggled();
        apply(&document, next);
        save(next);
        charts::restyle_all(next);
    })
    .forget();
}

fn apply(document: &Document, theme: Theme) {
    let Some(body) = document.body() else {
        return;
    };
    let classes = body.class_list();
    let _ = match theme {
        Theme::Dark => classes.add_1(DARK_CLASS),
        Theme::Light => classes.remove_1(DARK_CLASS),
    };
}

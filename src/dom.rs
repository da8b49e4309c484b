use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Window};

pub fn window() -> Option<Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// Collects every element matching `selector`. Selector errors and
/// non-element nodes are skipped.
pub fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    let mut found = Vec::new();
    if let Ok(list) = document.query_selector_all(selector) {
        for index in 0..list.length() {
            if let Some(element) = list
                .get(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            {
                found.push(element);
            }
        }
    }
    found
}

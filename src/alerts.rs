use gloo_timers::callback::Timeout;

use crate::dom;

const DISMISS_AFTER_MS: u32 = 5_000;
const FADE_OUT_MS: u32 = 150;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Success,
    Danger,
}

impl Kind {
    fn css(self) -> &'static str {
        match self {
            Kind::Success => "success",
            Kind::Danger => "danger",
        }
    }
}

/// Appends a dismissible alert to `#alerts-container`. Pages without the
/// container get no alert; nothing else depends on it being shown.
pub fn show(kind: Kind, message: &str) {
    let Some(document) = dom::document() else {
        return;
    };
    let Some(container) = document.get_element_by_id("alerts-container") else {
        return;
    };
    let Ok(alert) = document.create_element("div") else {
        return;
    };

    alert.set_class_name(&format!(
        "alert alert-{} alert-dismissible fade show",
        kind.css()
    ));
    let _ = alert.set_attribute("role", "alert");
    alert.set_inner_html(&format!(
        "{message}\
         <button type=\"button\" class=\"close\" data-dismiss=\"alert\" aria-label=\"Close\">\
         <span aria-hidden=\"true\">&times;</span></button>"
    ));

    if container.append_child(&alert).is_err() {
        return;
    }

    let fading = alert.clone();
    Timeout::new(DISMISS_AFTER_MS, move || {
        let _ = fading.class_list().remove_1("show");
        let removed = fading.clone();
        Timeout::new(FADE_OUT_MS, move || removed.remove()).forget();
    })
    .forget();
}

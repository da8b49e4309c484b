//! AJAX form submission bridge.
//!
//! Any form carrying the `ajax-form` class has its native submission
//! intercepted and replayed as a fetch against the form's declared action
//! and method. The server answers with the shared JSON contract decoded
//! into [`FormOutcome`].

use std::collections::HashMap;

use gloo_console::error;
use gloo_events::EventListener;
use gloo_net::http::{Method, Request, RequestBuilder, Response};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, FormData, HtmlButtonElement, HtmlElement, HtmlFormElement};

use crate::{alerts, dom};

pub const GENERIC_SUCCESS: &str = "Opération réussie.";
pub const GENERIC_ERROR: &str = "Une erreur est survenue.";
pub const NETWORK_ERROR: &str = "Une erreur est survenue lors de la requête.";
pub const BUSY_LABEL: &str = "Traitement...";

const CSRF_HEADER: &str = "X-CSRFToken";

/// JSON response shared by every AJAX form endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FormOutcome {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub reload: bool,
    #[serde(default, rename = "clearForm")]
    pub clear_form: bool,
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

/// The UI reconciliation an outcome calls for.
#[derive(Clone, Debug, PartialEq)]
pub enum FormAction {
    Redirect(String),
    Reload,
    Success { message: String, clear_form: bool },
    Failure {
        message: String,
        errors: HashMap<String, String>,
    },
}

impl FormOutcome {
    pub fn into_action(self) -> FormAction {
        if self.status == "success" {
            if let Some(url) = self.redirect {
                return FormAction::Redirect(url);
            }
            if self.reload {
                return FormAction::Reload;
            }
            FormAction::Success {
                message: self.message.unwrap_or_else(|| GENERIC_SUCCESS.to_string()),
                clear_form: self.clear_form,
            }
        } else {
            FormAction::Failure {
                message: self.message.unwrap_or_else(|| GENERIC_ERROR.to_string()),
                errors: self.errors,
            }
        }
    }
}

/// Anti-forgery token from the page's `csrf-token` meta tag.
pub fn csrf_token() -> Option<String> {
    dom::document()?
        .query_selector("meta[name=\"csrf-token\"]")
        .ok()??
        .get_attribute("content")
}

/// POST with a JSON content type, an empty body and the CSRF header.
pub async fn post_json(url: &str) -> Result<Response, gloo_net::Error> {
    let mut builder = Request::post(url).header("Content-Type", "application/json");
    if let Some(token) = csrf_token() {
        builder = builder.header(CSRF_HEADER, &token);
    }
    builder.send().await
}

/// POST a form's field data with the CSRF header.
pub async fn post_form_data(url: &str, payload: FormData) -> Result<Response, gloo_net::Error> {
    let mut builder = Request::post(url);
    if let Some(token) = csrf_token() {
        builder = builder.header(CSRF_HEADER, &token);
    }
    builder.body(payload)?.send().await
}

pub fn init(document: &Document) {
    for element in dom::query_all(document, ".ajax-form") {
        if let Ok(form) = element.dyn_into::<HtmlFormElement>() {
            wire_form(form);
        }
    }
}

fn wire_form(form: HtmlFormElement) {
    let target = form.clone();
    EventListener::new(&form, "submit", move |event| {
        event.prevent_default();
        submit(target.clone());
    })
    .forget();
}

fn submit(form: HtmlFormElement) {
    let action = form.get_attribute("action").unwrap_or_default();
    let method = form.get_attribute("method").unwrap_or_default();
    let Ok(payload) = FormData::new_with_form(&form) else {
        return;
    };

    let submit_button = form
        .query_selector("button[type=\"submit\"]")
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<HtmlButtonElement>().ok());
    let original_label = submit_button.as_ref().and_then(|button| button.text_content());
    if let Some(button) = &submit_button {
        button.set_text_content(Some(BUSY_LABEL));
        button.set_disabled(true);
    }

    spawn_local(async move {
        match send(&action, &method, payload).await {
            Ok(outcome) => apply(&form, outcome.into_action()),
            Err(err) => {
                error!("form submission failed:", err.to_string());
                alerts::show(alerts::Kind::Danger, NETWORK_ERROR);
            }
        }

        // Restored on every outcome, including transport failures.
        if let Some(button) = submit_button {
            button.set_text_content(original_label.as_deref());
            button.set_disabled(false);
        }
    });
}

async fn send(
    action: &str,
    method: &str,
    payload: FormData,
) -> Result<FormOutcome, gloo_net::Error> {
    let mut builder = RequestBuilder::new(action).method(method_for(method));
    if let Some(token) = csrf_token() {
        builder = builder.header(CSRF_HEADER, &token);
    }
    let response = builder.body(payload)?.send().await?;
    response.json::<FormOutcome>().await
}

fn method_for(attribute: &str) -> Method {
    match attribute.to_ascii_uppercase().as_str() {
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "PATCH" => Method::PATCH,
        "DELETE" => Method::DELETE,
        _ => Method::GET,
    }
}

fn apply(form: &HtmlFormElement, action: FormAction) {
    match action {
        FormAction::Redirect(url) => {
            if let Some(window) = dom::window() {
                let _ = window.location().set_href(&url);
            }
        }
        FormAction::Reload => {
            if let Some(window) = dom::window() {
                let _ = window.location().reload();
            }
        }
        FormAction::Success {
            message,
            clear_form,
        } => {
            alerts::show(alerts::Kind::Success, &message);
            if clear_form {
                form.reset();
            }
        }
        FormAction::Failure { message, errors } => {
            alerts::show(alerts::Kind::Danger, &message);
            show_field_errors(&errors);
        }
    }
}

/// Writes per-field error text into `<field>-error` slots. Fields whose
/// slot is not on the page are skipped; fragments are rendered
/// conditionally server-side.
pub fn show_field_errors(errors: &HashMap<String, String>) {
    let Some(document) = dom::document() else {
        return;
    };
    for (field, message) in errors {
        let Some(slot) = document.get_element_by_id(&format!("{field}-error")) else {
            continue;
        };
        slot.set_text_content(Some(message));
        if let Some(element) = slot.dyn_ref::<HtmlElement>() {
            let _ = element.style().set_property("display", "block");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_success() {
        let outcome: FormOutcome = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(outcome.status, "success");
        assert_eq!(outcome.message, None);
        assert!(!outcome.reload);
        assert!(!outcome.clear_form);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn redirect_wins_over_reload() {
        let outcome: FormOutcome = serde_json::from_str(
            r#"{"status":"success","redirect":"/journal/4","reload":true}"#,
        )
        .unwrap();
        assert_eq!(
            outcome.into_action(),
            FormAction::Redirect("/journal/4".to_string())
        );
    }

    #[test]
    fn reload_maps_to_reload() {
        let outcome: FormOutcome =
            serde_json::from_str(r#"{"status":"success","reload":true}"#).unwrap();
        assert_eq!(outcome.into_action(), FormAction::Reload);
    }

    #[test]
    fn plain_success_uses_server_message_and_clear_flag() {
        let outcome: FormOutcome = serde_json::from_str(
            r#"{"status":"success","message":"Écriture enregistrée.","clearForm":true}"#,
        )
        .unwrap();
        assert_eq!(
            outcome.into_action(),
            FormAction::Success {
                message: "Écriture enregistrée.".to_string(),
                clear_form: true,
            }
        );
    }

    #[test]
    fn success_without_message_falls_back() {
        let outcome: FormOutcome = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(
            outcome.into_action(),
            FormAction::Success {
                message: GENERIC_SUCCESS.to_string(),
                clear_form: false,
            }
        );
    }

    #[test]
    fn error_carries_field_errors() {
        let outcome: FormOutcome = serde_json::from_str(
            r#"{"status":"error","message":"Formulaire invalide.","errors":{"debit":"Montant requis"}}"#,
        )
        .unwrap();
        match outcome.into_action() {
            FormAction::Failure { message, errors } => {
                assert_eq!(message, "Formulaire invalide.");
                assert_eq!(errors.get("debit").map(String::as_str), Some("Montant requis"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn error_without_message_falls_back() {
        let outcome: FormOutcome = serde_json::from_str(r#"{"status":"error"}"#).unwrap();
        match outcome.into_action() {
            FormAction::Failure { message, errors } => {
                assert_eq!(message, GENERIC_ERROR);
                assert!(errors.is_empty());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}

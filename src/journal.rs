//! Journal entry line editor.
//!
//! Adding and deleting lines are server round-trips; the table is only
//! ever mutated from the server's canonical answer. Totals are recomputed
//! from the rendered cells after every mutation and once at startup to
//! cover the rows the server rendered.

use std::collections::HashMap;

use gloo_console::error;
use gloo_events::EventListener;
use serde::Deserialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, FormData, HtmlFormElement, HtmlInputElement, HtmlTableRowElement};

use crate::money::{Locale, FR_MA};
use crate::{alerts, api, dom};

/// Monetary tolerance under which an entry counts as balanced.
pub(crate) const BALANCE_EPSILON: f64 = 0.01;

const ADDED_MESSAGE: &str = "Ligne ajoutée avec succès.";
const DELETED_MESSAGE: &str = "Ligne supprimée avec succès.";
const DELETE_PROMPT: &str = "Êtes-vous sûr de vouloir supprimer cette ligne ?";

/// Canonical line as the server returns it; the client never invents ids.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct JournalLine {
    pub id: i64,
    pub account_code: String,
    pub account_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub debit: f64,
    #[serde(default)]
    pub credit: f64,
}

#[derive(Clone, Debug, Deserialize)]
struct LineOutcome {
    status: String,
    #[serde(default)]
    line: Option<JournalLine>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: HashMap<String, String>,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub(crate) struct Totals {
    pub debit: f64,
    pub credit: f64,
}

impl Totals {
    /// Sums rendered debit/credit cell pairs. A cell that does not parse
    /// contributes zero and never interrupts the rest of the scan.
    pub fn accumulate<I>(cells: I, locale: &Locale) -> Totals
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut totals = Totals::default();
        for (debit, credit) in cells {
            totals.debit += locale.parse_amount(&debit).unwrap_or(0.0);
            totals.credit += locale.parse_amount(&credit).unwrap_or(0.0);
        }
        totals
    }

    pub fn difference(&self) -> f64 {
        (self.debit - self.credit).abs()
    }

    pub fn is_balanced(&self) -> bool {
        self.difference() < BALANCE_EPSILON
    }
}

pub fn init(document: &Document) {
    let Some(form) = document
        .get_element_by_id("add-line-form")
        .and_then(|element| element.dyn_into::<HtmlFormElement>().ok())
    else {
        return;
    };

    let target = form.clone();
    EventListener::new(&form, "submit", move |event| {
        event.prevent_default();
        submit_new_line(target.clone());
    })
    .forget();

    for button in dom::query_all(document, ".delete-line") {
        wire_delete(button);
    }

    // Reflect the rows the server rendered before any interaction.
    recompute_totals(document);
}

fn submit_new_line(form: HtmlFormElement) {
    let action = form.get_attribute("action").unwrap_or_default();
    let Ok(payload) = FormData::new_with_form(&form) else {
        return;
    };

    spawn_local(async move {
        let outcome = match api::post_form_data(&action, payload).await {
            Ok(response) => response.json::<LineOutcome>().await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(outcome) if outcome.status == "success" => {
                if let Some(line) = outcome.line {
                    append_line(&line);
                    form.reset();
                    alerts::show(
                        alerts::Kind::Success,
                        outcome.message.as_deref().unwrap_or(ADDED_MESSAGE),
                    );
                    if let Some(document) = dom::document() {
                        recompute_totals(&document);
                    }
                }
            }
            Ok(outcome) => {
                alerts::show(
                    alerts::Kind::Danger,
                    outcome.message.as_deref().unwrap_or(api::GENERIC_ERROR),
                );
                api::show_field_errors(&outcome.errors);
            }
            Err(err) => {
                error!("journal line add failed:", err.to_string());
                alerts::show(alerts::Kind::Danger, api::NETWORK_ERROR);
            }
        }
    });
}

fn append_line(line: &JournalLine) {
    let Some(document) = dom::document() else {
        return;
    };
    let Some(tbody) = document.query_selector("#journal-lines tbody").ok().flatten() else {
        return;
    };
    let Ok(row) = document.create_element("tr") else {
        return;
    };
    let _ = row.set_attribute("data-id", &line.id.to_string());

    append_cell(
        &document,
        &row,
        "",
        &format!("{} - {}", line.account_code, line.account_name),
    );
    append_cell(&document, &row, "", line.description.as_deref().unwrap_or(""));
    append_cell(&document, &row, "text-right", &FR_MA.format_amount(line.debit));
    append_cell(&document, &row, "text-right", &FR_MA.format_amount(line.credit));

    if let Ok(cell) = document.create_element("td") {
        cell.set_class_name("text-center");
        if let Ok(button) = document.create_element("button") {
            button.set_class_name("btn btn-sm btn-danger delete-line");
            let _ = button.set_attribute("type", "button");
            let _ = button.set_attribute("data-id", &line.id.to_string());
            button.set_inner_html("<i class=\"fas fa-trash\"></i>");
            if cell.append_child(&button).is_ok() {
                wire_delete(button);
            }
        }
        let _ = row.append_child(&cell);
    }

    let _ = tbody.append_child(&row);
}

fn append_cell(document: &Document, row: &Element, class: &str, text: &str) {
    if let Ok(cell) = document.create_element("td") {
        if !class.is_empty() {
            cell.set_class_name(class);
        }
        cell.set_text_content(Some(text));
        let _ = row.append_child(&cell);
    }
}

fn wire_delete(button: Element) {
    let target = button.clone();
    EventListener::new(&button, "click", move |_| request_delete(target.clone())).forget();
}

fn request_delete(button: Element) {
    let Some(line_id) = button.get_attribute("data-id") else {
        return;
    };
    let Some(document) = dom::document() else {
        return;
    };
    let Some(entry_id) = document
        .get_element_by_id("entry_id")
        .and_then(|element| element.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
    else {
        return;
    };

    // Cancelling the prompt means no request and no side effect.
    let confirmed = dom::window()
        .and_then(|window| window.confirm_with_message(DELETE_PROMPT).ok())
        .unwrap_or(false);
    if !confirmed {
        return;
    }

    let url = format!("/journal/{entry_id}/delete_line/{line_id}");
    spawn_local(async move {
        let outcome = match api::post_json(&url).await {
            Ok(response) => response.json::<LineOutcome>().await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(outcome) if outcome.status == "success" => {
                if let Some(row) = document
                    .query_selector(&format!("tr[data-id=\"{line_id}\"]"))
                    .ok()
                    .flatten()
                {
                    row.remove();
                }
                recompute_totals(&document);
                alerts::show(
                    alerts::Kind::Success,
                    outcome.message.as_deref().unwrap_or(DELETED_MESSAGE),
                );
            }
            Ok(outcome) => {
                alerts::show(
                    alerts::Kind::Danger,
                    outcome.message.as_deref().unwrap_or(api::GENERIC_ERROR),
                );
            }
            Err(err) => {
                error!("journal line delete failed:", err.to_string());
                alerts::show(alerts::Kind::Danger, api::NETWORK_ERROR);
            }
        }
    });
}

/// Re-sums every rendered row and refreshes the totals and the
/// balanced/unbalanced indicator.
pub(crate) fn recompute_totals(document: &Document) {
    let rows = dom::query_all(document, "#journal-lines tbody tr");
    let totals = Totals::accumulate(rows.iter().filter_map(row_amounts), &FR_MA);
    write_totals(document, totals);
}

fn row_amounts(row: &Element) -> Option<(String, String)> {
    let row = row.dyn_ref::<HtmlTableRowElement>()?;
    let cells = row.cells();
    let debit = cells.item(2)?.text_content().unwrap_or_default();
    let credit = cells.item(3)?.text_content().unwrap_or_default();
    Some((debit, credit))
}

fn write_totals(document: &Document, totals: Totals) {
    if let Some(total_debit) = document.get_element_by_id("total-debit") {
        total_debit.set_text_content(Some(&FR_MA.format_amount(totals.debit)));
    }
    if let Some(total_credit) = document.get_element_by_id("total-credit") {
        total_credit.set_text_content(Some(&FR_MA.format_amount(totals.credit)));
    }

    let Some(balance) = document.get_element_by_id("balance") else {
        return;
    };
    balance.set_text_content(Some(&format!("{:.2}", totals.difference())));

    let balanced = totals.is_balanced();
    if let Some(parent) = balance.parent_element() {
        let classes = parent.class_list();
        if balanced {
            let _ = classes.remove_1("text-danger");
            let _ = classes.add_1("text-success");
        } else {
            let _ = classes.remove_1("text-success");
            let _ = classes.add_1("text-danger");
        }
    }

    if let Some(status) = document.get_element_by_id("balance-status") {
        if balanced {
            status.set_inner_html("<i class=\"fas fa-check-circle\"></i> Écriture équilibrée");
            status.set_class_name("text-success");
        } else {
            status
                .set_inner_html("<i class=\"fas fa-exclamation-circle\"></i> Écriture non équilibrée");
            status.set_class_name("text-danger");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < BALANCE_EPSILON
    }

    fn rows(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(debit, credit)| (debit.to_string(), credit.to_string()))
            .collect()
    }

    #[test]
    fn matched_columns_balance() {
        let totals = Totals::accumulate(rows(&[("100,00", "0,00"), ("0,00", "100,00")]), &FR_MA);
        assert!(close(totals.debit, 100.0));
        assert!(close(totals.credit, 100.0));
        assert!(totals.is_balanced());
    }

    #[test]
    fn added_line_shifts_the_balance() {
        // Two balanced rows plus a debit-only line from the server.
        let totals = Totals::accumulate(
            rows(&[("100,00", "0,00"), ("0,00", "100,00"), ("50,00", "0,00")]),
            &FR_MA,
        );
        assert!(close(totals.debit, 150.0));
        assert!(close(totals.credit, 100.0));
        assert!(!totals.is_balanced());
    }

    #[test]
    fn removing_a_row_subtracts_exactly_its_values() {
        let before = Totals::accumulate(
            rows(&[("100,00", "0,00"), ("0,00", "100,00"), ("50,00", "0,00")]),
            &FR_MA,
        );
        let after = Totals::accumulate(rows(&[("100,00", "0,00"), ("0,00", "100,00")]), &FR_MA);
        assert!(close(before.debit - after.debit, 50.0));
        assert!(close(before.credit - after.credit, 0.0));
    }

    #[test]
    fn unparseable_cells_contribute_zero() {
        let totals = Totals::accumulate(
            rows(&[("oops", "100,00"), ("1\u{202f}234,56", ""), ("100,00", "—")]),
            &FR_MA,
        );
        assert!(close(totals.debit, 1334.56));
        assert!(close(totals.credit, 100.0));
    }

    #[test]
    fn empty_table_is_balanced() {
        let totals = Totals::accumulate(Vec::new(), &FR_MA);
        assert!(totals.is_balanced());
        assert!(close(totals.difference(), 0.0));
    }

    #[test]
    fn epsilon_bounds_the_indicator() {
        let near = Totals {
            debit: 100.0,
            credit: 100.009,
        };
        assert!(near.is_balanced());
        let off = Totals {
            debit: 100.0,
            credit: 100.02,
        };
        assert!(!off.is_balanced());
    }

    #[test]
    fn decodes_the_add_line_response() {
        let outcome: LineOutcome = serde_json::from_str(
            r#"{"status":"success","line":{"id":7,"account_code":"601","account_name":"Achats","debit":50.0,"credit":0}}"#,
        )
        .unwrap();
        assert_eq!(outcome.status, "success");
        let line = outcome.line.unwrap();
        assert_eq!(line.id, 7);
        assert_eq!(line.account_code, "601");
        assert_eq!(line.account_name, "Achats");
        assert_eq!(line.description, None);
        assert!((line.debit - 50.0).abs() < f64::EPSILON);
        assert!(line.credit.abs() < f64::EPSILON);
    }

    #[test]
    fn decodes_a_delete_failure() {
        let outcome: LineOutcome =
            serde_json::from_str(r#"{"status":"error","message":"Ligne introuvable"}"#).unwrap();
        assert_eq!(outcome.status, "error");
        assert_eq!(outcome.message.as_deref(), Some("Ligne introuvable"));
        assert!(outcome.line.is_none());
        assert!(outcome.errors.is_empty());
    }
}

//! Dashboard chart rendering.
//!
//! Chart.js is loaded globally by the page layout; this module owns the
//! declarative configuration, fetches the report data for each chart slot
//! on the page, and keeps an explicit registry of rendered handles so the
//! theme toggle and viewport resizes can reach every instance.

use std::cell::RefCell;

use gloo_console::error;
use gloo_events::EventListener;
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, HtmlCanvasElement};

use crate::money::FR_MA;
use crate::theme::{self, Theme};

#[wasm_bindgen]
extern "C" {
    type Chart;

    #[wasm_bindgen(constructor)]
    fn new(canvas: &HtmlCanvasElement, config: &JsValue) -> Chart;

    #[wasm_bindgen(method)]
    fn update(this: &Chart);

    #[wasm_bindgen(method)]
    fn resize(this: &Chart);

    #[wasm_bindgen(method, setter)]
    fn set_options(this: &Chart, options: &JsValue);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChartKind {
    Bar,
    Pie,
    Doughnut,
}

impl ChartKind {
    pub fn js_name(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Doughnut => "doughnut",
        }
    }

    /// The `type` query parameter of the reporting endpoint.
    pub fn query_param(self) -> &'static str {
        match self {
            ChartKind::Bar => "monthly_revenue_expense",
            ChartKind::Pie => "assets_liabilities",
            ChartKind::Doughnut => "expense_breakdown",
        }
    }
}

/// Canvas ids the dashboard pages may carry; absent slots are skipped.
const SLOTS: [(&str, ChartKind); 3] = [
    ("revenue-expense-chart", ChartKind::Bar),
    ("assets-liabilities-chart", ChartKind::Pie),
    ("expense-breakdown-chart", ChartKind::Doughnut),
];

/// Payload of `/reports/charts/data`. The datasets stay opaque; their
/// shape belongs to the chart library's contract.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<serde_json::Value>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Palette {
    pub text: &'static str,
    pub grid: &'static str,
    pub tooltip_bg: &'static str,
    pub tooltip_fg: &'static str,
    pub tooltip_border: &'static str,
}

const LIGHT: Palette = Palette {
    text: "#333",
    grid: "rgba(0, 0, 0, 0.1)",
    tooltip_bg: "rgba(255, 255, 255, 0.7)",
    tooltip_fg: "#000",
    tooltip_border: "rgba(0, 0, 0, 0.2)",
};

const DARK: Palette = Palette {
    text: "#eee",
    grid: "rgba(255, 255, 255, 0.1)",
    tooltip_bg: "rgba(0, 0, 0, 0.7)",
    tooltip_fg: "#fff",
    tooltip_border: "rgba(255, 255, 255, 0.2)",
};

impl Palette {
    pub fn for_theme(theme: Theme) -> &'static Palette {
        match theme {
            Theme::Light => &LIGHT,
            Theme::Dark => &DARK,
        }
    }
}

struct Rendered {
    kind: ChartKind,
    handle: Chart,
}

thread_local! {
    static REGISTRY: RefCell<Vec<Rendered>> = RefCell::new(Vec::new());
}

/// Renders every chart slot present on the page. The three fetches run
/// concurrently and each falls back to an empty dataset on failure, so
/// one broken report never blocks the others.
pub fn init(document: &Document) {
    for (slot, kind) in SLOTS {
        let Some(canvas) = document
            .get_element_by_id(slot)
            .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
        else {
            continue;
        };
        spawn_local(async move {
            let data = fetch_chart_data(kind).await;
            render(&canvas, kind, data);
        });
    }

    if let Some(window) = web_sys::window() {
        EventListener::new(&window, "resize", |_| resize_all()).forget();
    }
}

pub async fn fetch_chart_data(kind: ChartKind) -> ChartData {
    let url = format!("/reports/charts/data?type={}", kind.query_param());
    match Request::get(&url).send().await {
        Ok(response) => match response.json::<ChartData>().await {
            Ok(data) => data,
            Err(err) => {
                error!("chart payload decode failed:", err.to_string());
                ChartData::default()
            }
        },
        Err(err) => {
            error!("chart fetch failed:", err.to_string());
            ChartData::default()
        }
    }
}

fn render(canvas: &HtmlCanvasElement, kind: ChartKind, data: ChartData) {
    let palette = Palette::for_theme(theme::load());
    let Ok(options) = options_js(kind, palette) else {
        return;
    };
    let Ok(serialized) = serde_json::to_string(&data) else {
        return;
    };
    let Ok(data_js) = js_sys::JSON::parse(&serialized) else {
        return;
    };

    let config = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&config, &"type".into(), &kind.js_name().into());
    let _ = js_sys::Reflect::set(&config, &"data".into(), &data_js);
    let _ = js_sys::Reflect::set(&config, &"options".into(), &options);

    let handle = Chart::new(canvas, &config);
    REGISTRY.with(|charts| charts.borrow_mut().push(Rendered { kind, handle }));
}

/// Re-applies the palette of `theme` to every rendered chart.
pub fn restyle_all(theme: Theme) {
    let palette = Palette::for_theme(theme);
    REGISTRY.with(|charts| {
        for chart in charts.borrow().iter() {
            if let Ok(options) = options_js(chart.kind, palette) {
                chart.handle.set_options(&options);
                chart.handle.update();
            }
        }
    });
}

pub fn resize_all() {
    REGISTRY.with(|charts| {
        for chart in charts.borrow().iter() {
            chart.handle.resize();
        }
    });
}

/// Declarative chart options for one kind under one palette. Kept as
/// plain JSON so the palette wiring stays testable off the browser.
pub(crate) fn chart_options(kind: ChartKind, palette: &Palette) -> serde_json::Value {
    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": false,
        "plugins": {
            "legend": {
                "labels": { "color": palette.text }
            },
            "tooltip": {
                "backgroundColor": palette.tooltip_bg,
                "titleColor": palette.tooltip_fg,
                "bodyColor": palette.tooltip_fg,
                "borderColor": palette.tooltip_border,
                "borderWidth": 1
            }
        }
    });

    match kind {
        ChartKind::Bar => {
            options["scales"] = json!({
                "y": {
                    "beginAtZero": true,
                    "ticks": { "color": palette.text },
                    "grid": { "color": palette.grid }
                },
                "x": {
                    "ticks": { "color": palette.text },
                    "grid": { "color": palette.grid }
                }
            });
        }
        ChartKind::Pie | ChartKind::Doughnut => {
            options["plugins"]["legend"]["position"] = json!("right");
        }
    }

    options
}

/// The JSON options plus the tooltip label callback, which has to be a
/// real JS function and cannot ride along in the serialized config.
fn options_js(kind: ChartKind, palette: &Palette) -> Result<JsValue, JsValue> {
    let options = js_sys::JSON::parse(&chart_options(kind, palette).to_string())?;

    let callbacks = js_sys::Object::new();
    js_sys::Reflect::set(&callbacks, &"label".into(), &tooltip_label_callback(kind))?;
    let plugins = js_sys::Reflect::get(&options, &"plugins".into())?;
    let tooltip = js_sys::Reflect::get(&plugins, &"tooltip".into())?;
    js_sys::Reflect::set(&tooltip, &"callbacks".into(), &callbacks)?;

    Ok(options)
}

fn tooltip_label_callback(kind: ChartKind) -> JsValue {
    let closure = Closure::wrap(Box::new(move |context: JsValue| -> JsValue {
        JsValue::from_str(&tooltip_label(kind, &context))
    }) as Box<dyn Fn(JsValue) -> JsValue>);
    // Lives for the page, like the chart it styles.
    closure.into_js_value()
}

fn tooltip_label(kind: ChartKind, context: &JsValue) -> String {
    let parsed = js_sys::Reflect::get(context, &"parsed".into()).ok();
    match kind {
        ChartKind::Bar => {
            let name = js_sys::Reflect::get(context, &"dataset".into())
                .ok()
                .and_then(|dataset| js_sys::Reflect::get(&dataset, &"label".into()).ok())
                .and_then(|label| label.as_string());
            let value = parsed
                .and_then(|parsed| js_sys::Reflect::get(&parsed, &"y".into()).ok())
                .and_then(|value| value.as_f64());
            compose_tooltip(name, value)
        }
        ChartKind::Pie | ChartKind::Doughnut => {
            let name = js_sys::Reflect::get(context, &"label".into())
                .ok()
                .and_then(|label| label.as_string());
            let value = parsed.and_then(|value| value.as_f64());
            compose_tooltip(name, value)
        }
    }
}

/// `Ventes: 1 234,56 MAD` — name and value are both optional because the
/// chart library omits them for gaps in the data.
pub(crate) fn compose_tooltip(name: Option<String>, value: Option<f64>) -> String {
    let mut label = name.unwrap_or_default();
    if !label.is_empty() {
        label.push_str(": ");
    }
    if let Some(value) = value {
        label.push_str(&FR_MA.format_currency(value));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chart_data_is_empty_but_valid() {
        let data = ChartData::default();
        assert_eq!(
            serde_json::to_string(&data).unwrap(),
            r#"{"labels":[],"datasets":[]}"#
        );
    }

    #[test]
    fn chart_data_tolerates_missing_fields() {
        let data: ChartData = serde_json::from_str("{}").unwrap();
        assert_eq!(data, ChartData::default());
    }

    #[test]
    fn kinds_map_to_report_params() {
        assert_eq!(ChartKind::Bar.query_param(), "monthly_revenue_expense");
        assert_eq!(ChartKind::Pie.query_param(), "assets_liabilities");
        assert_eq!(ChartKind::Doughnut.query_param(), "expense_breakdown");
    }

    #[test]
    fn bar_options_carry_scales() {
        let options = chart_options(ChartKind::Bar, &LIGHT);
        assert_eq!(options["scales"]["y"]["beginAtZero"], json!(true));
        assert_eq!(options["scales"]["x"]["ticks"]["color"], json!(LIGHT.text));
        assert_eq!(options["scales"]["y"]["grid"]["color"], json!(LIGHT.grid));
    }

    #[test]
    fn circular_options_put_the_legend_right() {
        for kind in [ChartKind::Pie, ChartKind::Doughnut] {
            let options = chart_options(kind, &DARK);
            assert_eq!(options["plugins"]["legend"]["position"], json!("right"));
            assert!(options.get("scales").is_none());
        }
    }

    #[test]
    fn palettes_differ_on_every_channel() {
        assert_ne!(LIGHT.text, DARK.text);
        assert_ne!(LIGHT.grid, DARK.grid);
        assert_ne!(LIGHT.tooltip_bg, DARK.tooltip_bg);
        assert_ne!(LIGHT.tooltip_fg, DARK.tooltip_fg);
        assert_ne!(LIGHT.tooltip_border, DARK.tooltip_border);
    }

    #[test]
    fn restyling_is_a_palette_round_trip() {
        let kind = ChartKind::Bar;
        let original = chart_options(kind, Palette::for_theme(Theme::Light));
        let toggled = chart_options(kind, Palette::for_theme(Theme::Light.toggled()));
        let back = chart_options(kind, Palette::for_theme(Theme::Light.toggled().toggled()));
        assert_ne!(original, toggled);
        assert_eq!(original, back);
    }

    #[test]
    fn tooltips_format_currency() {
        assert_eq!(
            compose_tooltip(Some("Ventes".to_string()), Some(1234.56)),
            "Ventes: 1\u{202f}234,56 MAD"
        );
        assert_eq!(compose_tooltip(None, Some(50.0)), "50,00 MAD");
        assert_eq!(compose_tooltip(Some("Ventes".to_string()), None), "Ventes: ");
        assert_eq!(compose_tooltip(None, None), "");
    }
}

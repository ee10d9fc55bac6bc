//! Portfolio Optimizations
//!
//! Best-effort shaping of portfolio data before it is cached: image fields
//! are annotated with modern-format hints, strings are minified, and the
//! result is measured against a size budget.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::cache::calculate_size;

static IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|bmp)(\?.*)?$").expect("static regex is valid")
});

static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("static regex is valid"));

/// Formats offered in place of raster originals, most preferred first.
const PREFERRED_FORMATS: [&str; 2] = ["avif", "webp"];

// == Optimization Report ==
/// What [`optimize`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub original_size: usize,
    pub optimized_size: usize,
    pub images_annotated: usize,
    pub strings_minified: usize,
    /// Optimized size is above the budget
    pub exceeds_budget: bool,
}

// == Optimize ==
/// Shapes `data` and reports the result against `budget_bytes`.
pub fn optimize(mut data: Value, budget_bytes: usize) -> (Value, OptimizationReport) {
    let mut report = OptimizationReport {
        original_size: calculate_size(&data),
        ..OptimizationReport::default()
    };

    shape(&mut data, &mut report);

    report.optimized_size = calculate_size(&data);
    report.exceeds_budget = report.optimized_size > budget_bytes;
    (data, report)
}

fn shape(value: &mut Value, report: &mut OptimizationReport) {
    match value {
        Value::Object(object) => {
            for member in object.values_mut() {
                shape(member, report);
            }
            // After recursing, so annotations are never shaped themselves
            annotate_images(object, report);
        }
        Value::Array(items) => {
            for item in items {
                shape(item, report);
            }
        }
        Value::String(text) => {
            let minified = minify(text);
            if minified != *text {
                *text = minified;
                report.strings_minified += 1;
            }
        }
        _ => {}
    }
}

/// Adds `{field}Optimized` next to every raster image URL member.
fn annotate_images(object: &mut Map<String, Value>, report: &mut OptimizationReport) {
    let annotations: Vec<(String, Value)> = object
        .iter()
        .filter_map(|(field, value)| {
            let src = value.as_str()?;
            let extension = IMAGE_URL.captures(src)?.get(1)?.as_str().to_ascii_lowercase();
            let target = format!("{field}Optimized");
            if object.contains_key(&target) {
                return None;
            }
            Some((
                target,
                json!({
                    "src": src,
                    "formats": PREFERRED_FORMATS,
                    "fallback": extension,
                    "loading": "lazy",
                }),
            ))
        })
        .collect();

    report.images_annotated += annotations.len();
    object.extend(annotations);
}

/// Collapses runs of spaces and tabs and trims each line and the whole text.
pub fn minify(text: &str) -> String {
    text.lines()
        .map(|line| HORIZONTAL_WHITESPACE.replace_all(line.trim(), " "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

//! Ordered request checks for `POST /county_data`.
//!
//! Precedence is the order of [`CHECKS`]: the coffee override beats every
//! field check, and field presence is checked before zip format.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::measures::AllowList;

static ZIP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("zip pattern is valid"));

/// Client input problems, each mapped to a 400 response.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("content-type must be application/json")]
    ContentType,
    #[error("zip and measure_name are required")]
    MissingFields,
    #[error("zip must be 5 digits")]
    ZipFormat,
    #[error("measure_name not allowed")]
    MeasureNotAllowed,
}

/// Result of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Reject(Rejection),
    Teapot,
}

/// Validated lookup parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyQuery {
    /// Five-digit ZIP code.
    pub zip: String,
    /// Allowed measure name.
    pub measure_name: String,
}

/// Final decision for one request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Run the lookup.
    Lookup(CountyQuery),
    /// Answer 400 with the rejection message.
    Reject(Rejection),
    /// Answer 418 with an empty body.
    Teapot,
}

type Check = fn(&Map<String, Value>, &AllowList) -> Step;

/// Body checks in precedence order.
const CHECKS: [Check; 4] = [
    check_teapot,
    check_required,
    check_zip_format,
    check_measure_allowed,
];

/// Evaluate a request from its declared content type and raw body.
pub fn evaluate(content_type: Option<&str>, body: &[u8], allowed: &AllowList) -> Verdict {
    if !is_json_content_type(content_type) {
        return Verdict::Reject(Rejection::ContentType);
    }

    let fields = parse_object(body);

    for check in CHECKS {
        match check(&fields, allowed) {
            Step::Continue => {}
            Step::Reject(rejection) => return Verdict::Reject(rejection),
            Step::Teapot => return Verdict::Teapot,
        }
    }

    match (
        fields.get("zip").map(zip_text),
        fields.get("measure_name").and_then(Value::as_str),
    ) {
        (Some(zip), Some(measure_name)) => Verdict::Lookup(CountyQuery {
            zip,
            measure_name: measure_name.to_string(),
        }),
        _ => Verdict::Reject(Rejection::MissingFields),
    }
}

/// Accepts `application/json` and `application/*+json`, ignoring parameters.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(raw) = content_type else {
        return false;
    };
    let mime = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Parse the body as a JSON object; anything else reads as an empty object.
pub fn parse_object(body: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        _ => Map::new(),
    }
}

fn check_teapot(fields: &Map<String, Value>, _: &AllowList) -> Step {
    match fields.get("coffee") {
        Some(Value::String(coffee)) if coffee == "teapot" => Step::Teapot,
        _ => Step::Continue,
    }
}

fn check_required(fields: &Map<String, Value>, _: &AllowList) -> Step {
    let present = |key: &str| fields.get(key).is_some_and(is_truthy);
    if present("zip") && present("measure_name") {
        Step::Continue
    } else {
        Step::Reject(Rejection::MissingFields)
    }
}

fn check_zip_format(fields: &Map<String, Value>, _: &AllowList) -> Step {
    let zip = fields.get("zip").map(zip_text).unwrap_or_default();
    if ZIP_PATTERN.is_match(&zip) {
        Step::Continue
    } else {
        Step::Reject(Rejection::ZipFormat)
    }
}

fn check_measure_allowed(fields: &Map<String, Value>, allowed: &AllowList) -> Step {
    match fields.get("measure_name").and_then(Value::as_str) {
        Some(name) if allowed.contains(name) => Step::Continue,
        _ => Step::Reject(Rejection::MeasureNotAllowed),
    }
}

/// Null, false, zero, and empty strings/arrays/objects count as missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// String form of the zip field: strings as-is, everything else as JSON text.
fn zip_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

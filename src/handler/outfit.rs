//! Weather-to-outfit recommendation (`GET /api/ai`)
//!
//! Builds a prompt from the query string, relays it upstream and decodes the
//! model's reply as JSON. Every failure becomes a plain-text 500.

use std::collections::HashMap;

use hyper::StatusCode;
use url::form_urlencoded;

use crate::config::AppState;
use crate::error::RelayError;
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::upstream::{ChatMessage, CompletionRequest};

const SYSTEM_PROMPT: &str = "Türkçe kıyafet danışmanısın. Sadece JSON döndür.";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1500;
const FENCE: &str = "```";

/// Weather readings taken from the query string
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub temp: f64,
    pub humidity: f64,
    pub wind: f64,
    pub precipitation: f64,
    pub description: String,
}

impl WeatherQuery {
    /// Missing or blank numbers default to 0, a missing description to "".
    /// A present but unparsable number is an error.
    pub fn from_query(query: Option<&str>) -> Result<Self, RelayError> {
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        Ok(Self {
            temp: number_param(&params, "temp")?,
            humidity: number_param(&params, "humidity")?,
            wind: number_param(&params, "wind")?,
            precipitation: number_param(&params, "precipitation")?,
            description: params.remove("description").unwrap_or_default(),
        })
    }

    pub fn prompt(&self) -> String {
        format!(
            r#"Hava durumu:
- Sıcaklık: {temp}°C
- Nem: {humidity}%
- Rüzgar: {wind} km/h
- Yağış: {precipitation} mm
- Durum: {description}

Sabah, öğlen ve akşam için kıyafet öner. JSON formatında:
{{
  "morning": {{"upper": "...", "lower": "...", "accessories": "...", "note": "..."}},
  "afternoon": {{"upper": "...", "lower": "...", "accessories": "...", "note": "..."}},
  "evening": {{"upper": "...", "lower": "...", "accessories": "...", "note": "..."}}
}}"#,
            temp = format_number(self.temp),
            humidity = format_number(self.humidity),
            wind = format_number(self.wind),
            precipitation = format_number(self.precipitation),
            description = self.description,
        )
    }
}

fn number_param(params: &HashMap<String, String>, key: &str) -> Result<f64, RelayError> {
    let Some(raw) = params.get(key) else {
        return Ok(0.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RelayError::InvalidInput(format!(
            "could not convert {key}={raw:?} to a number"
        ))),
    }
}

/// Render a reading the way the prompt shows it: integral values keep one
/// decimal (`21.0`), others use the shortest exact form (`21.5`). Magnitudes
/// of 1e16 and above or below 1e-4 switch to exponent form (`1e+16`, `1.5e-05`).
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return exponent_form(value);
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `1e16` → `1e+16`, `1.5e-5` → `1.5e-05`
fn exponent_form(value: f64) -> String {
    let rendered = format!("{value:e}");
    let Some((mantissa, exponent)) = rendered.split_once('e') else {
        return rendered;
    };
    let (sign, digits) = exponent
        .strip_prefix('-')
        .map_or(("+", exponent), |rest| ("-", rest));
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Drop fenced-code delimiters from a model reply.
///
/// When the reply contains a fence marker anywhere, every line whose trimmed
/// form starts with the marker is removed, not only the outermost pair.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains(FENCE) {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .filter(|line| !line.trim().starts_with(FENCE))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Relay one recommendation request and decode the reply
pub async fn recommend(
    query: Option<&str>,
    state: &AppState,
) -> Result<serde_json::Value, RelayError> {
    let weather = WeatherQuery::from_query(query)?;
    logger::log_outfit_request(&format_number(weather.temp), &weather.description);

    let request = CompletionRequest {
        model: state.config.upstream.model.clone(),
        messages: vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(weather.prompt()),
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };
    logger::log_debug("[Outfit] Requesting recommendations upstream");

    let reply = state.upstream.complete(&request).await?;
    let cleaned = strip_code_fences(&reply);
    let parsed =
        serde_json::from_str(&cleaned).map_err(|e| RelayError::Decode(e.to_string()))?;

    logger::log_outfit_ready();
    Ok(parsed)
}

pub async fn handle(query: Option<&str>, state: &AppState) -> HttpResponse {
    match recommend(query, state).await {
        Ok(outfits) => http::build_json_response(StatusCode::OK, &outfits),
        Err(err) => {
            logger::log_route_failure("Outfit", &err);
            http::build_text_response(err.status(), err.to_string())
        }
    }
}

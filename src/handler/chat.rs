//! Chat relay (`POST /api/chat`)
//!
//! Wraps the caller's history in a fixed advisor persona and forwards it
//! upstream. Failures come back as `{"error": ...}` with status 500.

use hyper::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{AppState, ChatConfig};
use crate::error::RelayError;
use crate::http::{self, HttpResponse};
use crate::logger;
use crate::upstream::{ChatMessage, CompletionRequest};

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 400;
const PLACEHOLDER: &str = "?";

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub weather: WeatherSnapshot,
}

/// Weather the front end currently shows. Values may be strings or numbers.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub temp: Option<Value>,
    #[serde(default)]
    pub humidity: Option<Value>,
    #[serde(default)]
    pub wind: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
}

fn render(field: Option<&Value>) -> String {
    match field {
        None | Some(Value::Null) => PLACEHOLDER.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

impl WeatherSnapshot {
    pub fn persona(&self) -> String {
        format!(
            "Sen yardımsever bir kıyafet danışmanısın. Türkçe konuşuyorsun.

Mevcut hava durumu:
- Şehir: {location}
- Sıcaklık: {temp}°C
- Nem: {humidity}%
- Rüzgar: {wind} km/h
- Durum: {description}

Görevin: Kullanıcıya kıyafet, moda ve hava durumuna göre pratik öneriler vermek.
Kısa, samimi ve emoji kullanarak yanıt ver.",
            location = render(self.location.as_ref()),
            temp = render(self.temp.as_ref()),
            humidity = render(self.humidity.as_ref()),
            wind = render(self.wind.as_ref()),
            description = render(self.description.as_ref()),
        )
    }
}

impl ChatRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        serde_json::from_slice(body).map_err(|e| RelayError::InvalidInput(e.to_string()))
    }

    /// System persona, then the trailing `history_limit` history entries.
    pub fn messages(&self, config: &ChatConfig) -> Vec<ChatMessage> {
        let skip = self.history.len().saturating_sub(config.history_limit);

        let mut messages = Vec::with_capacity(config.history_limit + 2);
        messages.push(ChatMessage::system(self.weather.persona()));
        messages.extend(self.history.iter().skip(skip).cloned());
        if config.append_user_message && !self.message.is_empty() {
            messages.push(ChatMessage::user(self.message.clone()));
        }
        messages
    }
}

/// Relay one chat turn and return the assistant's reply text
pub async fn reply(body: &[u8], state: &AppState) -> Result<String, RelayError> {
    let chat = ChatRequest::from_body(body)?;
    logger::log_chat_message(&chat.message);

    let request = CompletionRequest {
        model: state.config.upstream.model.clone(),
        messages: chat.messages(&state.config.chat),
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    let text = state.upstream.complete(&request).await?;
    logger::log_chat_reply(&text);
    Ok(text)
}

pub async fn handle(body: &[u8], state: &AppState) -> HttpResponse {
    match reply(body, state).await {
        Ok(text) => http::build_json_response(StatusCode::OK, &json!({ "response": text })),
        Err(err) => {
            logger::log_route_failure("Chat", &err);
            http::build_json_response(err.status(), &json!({ "error": err.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::upstream::testing::{RecordingClient, Reply};
    use crate::upstream::CompletionClient;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    fn state_with(client: &Arc<RecordingClient>, append_user_message: bool) -> AppState {
        let mut cfg = Config::for_tests(".");
        cfg.chat.append_user_message = append_user_message;
        let upstream: Arc<dyn CompletionClient> = client.clone();
        AppState::new(cfg, upstream)
    }

    fn history(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                json!({ "role": role, "content": format!("msg {i}") })
            })
            .collect()
    }

    async fn body_json(resp: HttpResponse) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_absent_weather_renders_placeholders() {
        let persona = WeatherSnapshot::default().persona();
        assert!(persona.contains("- Şehir: ?\n"));
        assert!(persona.contains("- Sıcaklık: ?°C"));
        assert!(persona.contains("- Nem: ?%"));
        assert!(persona.contains("- Rüzgar: ? km/h"));
        assert!(persona.contains("- Durum: ?\n"));
    }

    #[test]
    fn test_weather_values_render_verbatim() {
        let req = ChatRequest::from_body(
            json!({
                "weather": {"location": "İzmir", "temp": 27.5, "humidity": 40, "wind": "12", "description": null}
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();
        let persona = req.weather.persona();
        assert!(persona.contains("- Şehir: İzmir"));
        assert!(persona.contains("- Sıcaklık: 27.5°C"));
        assert!(persona.contains("- Nem: 40%"));
        assert!(persona.contains("- Rüzgar: 12 km/h"));
        assert!(persona.contains("- Durum: ?"));
    }

    #[test]
    fn test_null_and_non_scalar_weather_values() {
        let snapshot: WeatherSnapshot = serde_json::from_value(json!({
            "location": null,
            "temp": true,
            "wind": [3, 4]
        }))
        .unwrap();
        let persona = snapshot.persona();
        assert!(persona.contains("- Şehir: ?\n"));
        assert!(persona.contains("- Sıcaklık: true°C"));
        assert!(persona.contains("- Rüzgar: [3,4] km/h"));
    }

    #[test]
    fn test_history_truncated_to_last_eight() {
        let req = ChatRequest::from_body(
            json!({ "message": "msg 9", "history": history(10) }).to_string().as_bytes(),
        )
        .unwrap();
        let messages = req.messages(&Config::for_tests(".").chat);

        assert_eq!(messages.len(), 9);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "msg 2");
        assert_eq!(messages[8].content, "msg 9");
    }

    #[test]
    fn test_message_not_appended_by_default() {
        let req = ChatRequest::from_body(
            json!({ "message": "Ne giysem?", "history": [] }).to_string().as_bytes(),
        )
        .unwrap();
        let messages = req.messages(&Config::for_tests(".").chat);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_malformed_body_is_invalid_input() {
        assert!(matches!(
            ChatRequest::from_body(b"{not json"),
            Err(RelayError::InvalidInput(_))
        ));
        assert!(ChatRequest::from_body(b"").is_err());
        assert!(ChatRequest::from_body(br#"{"history":[{"role":"user"}]}"#).is_err());
    }

    #[tokio::test]
    async fn test_forwards_truncated_history() {
        let client = Arc::new(RecordingClient::text("Şemsiye al ☂️"));
        let state = state_with(&client, false);
        let body = json!({ "message": "msg 9", "history": history(10), "weather": {} }).to_string();

        let resp = handle(body.as_bytes(), &state).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "response": "Şemsiye al ☂️" }));

        let sent = client.last_request();
        assert!((sent.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(sent.max_tokens, 400);
        assert_eq!(sent.messages.len(), 9);
        let contents: Vec<&str> = sent.messages[1..].iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            contents,
            ["msg 2", "msg 3", "msg 4", "msg 5", "msg 6", "msg 7", "msg 8", "msg 9"]
        );
    }

    #[tokio::test]
    async fn test_append_user_message_when_enabled() {
        let client = Arc::new(RecordingClient::text("ok"));
        let state = state_with(&client, true);
        let body = json!({ "message": "Ceket lazım mı?", "history": history(3) }).to_string();

        handle(body.as_bytes(), &state).await;

        let sent = client.last_request();
        assert_eq!(sent.messages.len(), 5);
        assert_eq!(sent.messages[4], ChatMessage::user("Ceket lazım mı?"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_json_500() {
        let client = Arc::new(RecordingClient::new(Reply::Status(500)));
        let state = state_with(&client, false);

        let resp = handle(br#"{"message":"selam"}"#, &state).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.headers()["content-type"], "application/json");
        let body = body_json(resp).await;
        assert_eq!(body["error"], "upstream API error: status 500");
    }

    #[tokio::test]
    async fn test_bad_body_is_json_500() {
        let client = Arc::new(RecordingClient::new(Reply::Unreachable));
        let state = state_with(&client, false);

        let resp = handle(br#""just text""#, &state).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(resp).await["error"].is_string());
        assert_eq!(client.request_count(), 0);
    }
}

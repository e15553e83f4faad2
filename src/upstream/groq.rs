// reqwest-backed completion client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::types::{CompletionRequest, CompletionResponse};
use super::CompletionClient;
use crate::config::UpstreamConfig;
use crate::error::RelayError;
use crate::logger;

/// Client for an OpenAI-compatible chat-completions endpoint (Groq by default)
#[derive(Debug, Clone)]
pub struct GroqClient {
    url: String,
    api_key: String,
    http: Client,
}

impl GroqClient {
    pub fn new(config: &UpstreamConfig, api_key: String) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            url: config.url.clone(),
            api_key,
            http,
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RelayError> {
        let res = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if status != StatusCode::OK {
            logger::log_warning(&format!("Upstream answered {status} for {}", self.url));
            return Err(RelayError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = res.text().await?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| RelayError::Decode(e.to_string()))?;

        parsed
            .into_first_content()
            .ok_or_else(|| RelayError::Decode("upstream reply has no choices[0].message.content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::ChatMessage;
    use http_body_util::{BodyExt, Full};
    use hyper::body::{Bytes, Incoming};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<(Option<String>, String)>>>;

    /// Serve a canned reply on an ephemeral port, recording auth header and body
    async fn spawn_upstream(status: u16, reply: &'static str) -> (String, Seen) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let seen_server = Arc::clone(&seen);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = Arc::clone(&seen_server);
                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let seen = Arc::clone(&seen);
                        async move {
                            let auth = req
                                .headers()
                                .get("authorization")
                                .and_then(|v| v.to_str().ok())
                                .map(ToString::to_string);
                            let body = req.into_body().collect().await?.to_bytes();
                            seen.lock()
                                .unwrap()
                                .push((auth, String::from_utf8_lossy(&body).into_owned()));
                            Ok::<_, hyper::Error>(
                                Response::builder()
                                    .status(status)
                                    .header("Content-Type", "application/json")
                                    .body(Full::new(Bytes::from_static(reply.as_bytes())))
                                    .unwrap(),
                            )
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        (format!("http://{addr}/openai/v1/chat/completions"), seen)
    }

    fn client_for(url: &str) -> GroqClient {
        let config = UpstreamConfig {
            url: url.to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
            api_key_env: "UNUSED".to_string(),
        };
        GroqClient::new(&config, "secret-key".to_string()).unwrap()
    }

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            model: "test-model".to_string(),
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hava?")],
            temperature: 0.7,
            max_tokens: 1500,
        }
    }

    #[tokio::test]
    async fn test_extracts_first_choice() {
        let (url, seen) = spawn_upstream(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Mont giy"}},{"message":{"content":"ignored"}}]}"#,
        )
        .await;

        let text = client_for(&url).complete(&sample_request()).await.unwrap();
        assert_eq!(text, "Mont giy");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret-key"));

        let sent: serde_json::Value = serde_json::from_str(&seen[0].1).unwrap();
        assert_eq!(sent["model"], "test-model");
        assert_eq!(sent["max_tokens"], 1500);
        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["content"], "hava?");
    }

    #[tokio::test]
    async fn test_non_200_is_upstream_error() {
        let (url, _) = spawn_upstream(500, r#"{"error":"boom"}"#).await;
        let err = client_for(&url).complete(&sample_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Upstream { status: 500 }));
    }

    #[tokio::test]
    async fn test_missing_choices_is_decode_error() {
        let (url, _) = spawn_upstream(200, r#"{"choices":[]}"#).await;
        let err = client_for(&url).complete(&sample_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/v1/chat/completions");
        let err = client_for(&url).complete(&sample_request()).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable(_)));
    }
}

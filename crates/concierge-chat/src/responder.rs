//! Conversational fallback for utterances no rule claims.
//!
//! [`HttpResponder`] talks to a `generateContent` style endpoint;
//! [`OfflineResponder`] stands in when no API key is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use concierge_core::config::ConciergeConfig;
use concierge_core::{ConversationEntry, Role};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ResponderError};

/// Produces a free-form reply from transcript context.
#[async_trait]
pub trait FallbackResponder: Send + Sync {
    async fn respond(
        &self,
        transcript: &[ConversationEntry],
        utterance: &str,
    ) -> Result<String, ResponderError>;
}

// =============================================================================
// Prompt
// =============================================================================

/// Build the prompt sent to the model.
pub fn render_prompt(
    persona: &str,
    assistant_name: &str,
    transcript: &[ConversationEntry],
    utterance: &str,
) -> String {
    let mut prompt = String::new();
    prompt.push_str(persona.trim());
    prompt.push_str("\n\n");
    if !transcript.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for entry in transcript {
            let speaker = match entry.role {
                Role::User => "User",
                Role::Assistant => assistant_name,
                Role::System => "System",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, entry.text));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("User: {}\n{}:", utterance, assistant_name));
    prompt
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

/// Body fragments the API uses to reject a key with a plain 400.
const INVALID_KEY_MARKERS: &[&str] = &["API key not valid", "API_KEY_INVALID"];

/// Map a non-success status, and the error body that came with it, to an
/// error.
pub fn classify_status(status: StatusCode, body: &str) -> Option<ResponderError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            Some(ResponderError::QuotaOrAuth(format!("HTTP {}", status)))
        }
        StatusCode::BAD_REQUEST if INVALID_KEY_MARKERS.iter().any(|m| body.contains(m)) => {
            Some(ResponderError::QuotaOrAuth("API key not valid".to_string()))
        }
        _ => Some(ResponderError::Network(format!("HTTP {}", status))),
    }
}

/// Extract the reply text, or explain why there is none.
pub fn interpret_response(body: GenerateResponse) -> Result<String, ResponderError> {
    if let Some(feedback) = body.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(ResponderError::ContentPolicy(
                feedback.block_reason_message.unwrap_or(reason),
            ));
        }
    }

    let Some(candidate) = body.candidates.into_iter().next() else {
        return Err(ResponderError::Network("response had no candidates".to_string()));
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim();
    if !text.is_empty() {
        return Ok(text.to_string());
    }
    let finish_reason = candidate.finish_reason.unwrap_or_default();
    match finish_reason.as_str() {
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
            Err(ResponderError::ContentPolicy(finish_reason))
        }
        _ => Err(ResponderError::Network("response was empty".to_string())),
    }
}

// =============================================================================
// HttpResponder
// =============================================================================

/// Responder backed by a hosted generative model.
pub struct HttpResponder {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    persona: String,
    assistant_name: String,
}

impl HttpResponder {
    pub fn new(config: &ConciergeConfig, api_key: String) -> Result<Self, ChatError> {
        let responder = &config.responder;
        let raw = format!(
            "{}/{}:generateContent",
            responder.api_url.trim_end_matches('/'),
            responder.model
        );
        let endpoint = Url::parse(&raw).map_err(|e| ChatError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(responder.timeout_seconds.max(1)))
            .build()
            .map_err(|e| ChatError::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
            persona: responder.persona.clone(),
            assistant_name: config.general.assistant_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl FallbackResponder for HttpResponder {
    async fn respond(
        &self,
        transcript: &[ConversationEntry],
        utterance: &str,
    ) -> Result<String, ResponderError> {
        let prompt = render_prompt(&self.persona, &self.assistant_name, transcript, utterance);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        tracing::debug!(prompt_len = prompt.len(), "Sending fallback request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Some(err) = classify_status(status, &body) {
                tracing::warn!(%status, "Fallback request rejected");
                return Err(err);
            }
            // The body was consumed above; decode from the text already read.
            let body = serde_json::from_str::<GenerateResponse>(&body)
                .map_err(|e| ResponderError::Network(e.to_string()))?;
            return interpret_response(body);
        }

        let body = response.json::<GenerateResponse>().await?;
        interpret_response(body)
    }
}

// =============================================================================
// OfflineResponder
// =============================================================================

/// Used when no API key is configured; every call fails with
/// [`ResponderError::QuotaOrAuth`].
pub struct OfflineResponder;

#[async_trait]
impl FallbackResponder for OfflineResponder {
    async fn respond(
        &self,
        _transcript: &[ConversationEntry],
        _utterance: &str,
    ) -> Result<String, ResponderError> {
        Err(ResponderError::QuotaOrAuth("no API key configured".to_string()))
    }
}

/// Pick the responder for `config`: HTTP when an API key resolves, offline
/// otherwise.
pub fn build_responder(config: &ConciergeConfig) -> Result<Arc<dyn FallbackResponder>, ChatError> {
    match config.responder.resolve_api_key() {
        Some(key) => {
            let responder = HttpResponder::new(config, key)?;
            tracing::info!(endpoint = %responder.endpoint(), "Fallback responder ready");
            Ok(Arc::new(responder))
        }
        None => {
            tracing::warn!("No API key configured; conversational replies are disabled");
            Ok(Arc::new(OfflineResponder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(role: Role, text: &str, index: u64) -> ConversationEntry {
        ConversationEntry {
            role,
            text: text.to_string(),
            sequence_index: index,
            in_reply_to: None,
            recorded_at: Local::now(),
        }
    }

    fn parse(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    fn make_config(api_url: &str) -> ConciergeConfig {
        let mut config = ConciergeConfig::default();
        config.responder.api_url = api_url.to_string();
        config.responder.model = "test-model".to_string();
        config.responder.timeout_seconds = 5;
        config
    }

    #[test]
    fn test_render_prompt_labels_roles() {
        let transcript = vec![
            entry(Role::User, "hello", 0),
            entry(Role::Assistant, "Good evening.", 1),
            entry(Role::System, "Timer done.", 2),
        ];
        let prompt = render_prompt("Be brief.", "Jarvis", &transcript, "how are you");
        assert_eq!(
            prompt,
            "Be brief.\n\nConversation so far:\nUser: hello\nJarvis: Good evening.\n\
             System: Timer done.\n\nUser: how are you\nJarvis:"
        );
    }

    #[test]
    fn test_render_prompt_without_transcript() {
        let prompt = render_prompt("Persona", "Jarvis", &[], "hi");
        assert_eq!(prompt, "Persona\n\nUser: hi\nJarvis:");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::OK, ""), None);
        for code in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::TOO_MANY_REQUESTS,
        ] {
            assert!(matches!(classify_status(code, ""), Some(ResponderError::QuotaOrAuth(_))));
        }
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            Some(ResponderError::Network(_))
        ));
    }

    #[test]
    fn test_classify_invalid_key_on_bad_request() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        })
        .to_string();
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, &body),
            Some(ResponderError::QuotaOrAuth("API key not valid".to_string()))
        );
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, r#"{"error":{"message":"bad field"}}"#),
            Some(ResponderError::Network(_))
        ));
    }

    #[test]
    fn test_interpret_text_reply() {
        let body = parse(json!({
            "candidates": [{"content": {"parts": [{"text": "  Certainly, "}, {"text": "sir.  "}]}}]
        }));
        assert_eq!(interpret_response(body).unwrap(), "Certainly, sir.");
    }

    #[test]
    fn test_interpret_blocked_prompt() {
        let body = parse(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        assert_eq!(
            interpret_response(body),
            Err(ResponderError::ContentPolicy("SAFETY".to_string()))
        );

        let body = parse(json!({
            "promptFeedback": {"blockReason": "OTHER", "blockReasonMessage": "Not allowed"}
        }));
        assert_eq!(
            interpret_response(body),
            Err(ResponderError::ContentPolicy("Not allowed".to_string()))
        );
    }

    #[test]
    fn test_interpret_safety_finish_without_text() {
        let body = parse(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        assert!(matches!(interpret_response(body), Err(ResponderError::ContentPolicy(_))));
    }

    #[test]
    fn test_interpret_malformed_is_network() {
        assert!(matches!(
            interpret_response(parse(json!({}))),
            Err(ResponderError::Network(_))
        ));
        let body = parse(json!({"candidates": [{"content": {"parts": []}}]}));
        assert!(matches!(interpret_response(body), Err(ResponderError::Network(_))));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let config = make_config("not a url");
        assert!(matches!(
            HttpResponder::new(&config, "key".to_string()),
            Err(ChatError::InvalidEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn test_offline_responder_fails_with_quota_or_auth() {
        let err = OfflineResponder.respond(&[], "hello").await.unwrap_err();
        assert!(matches!(err, ResponderError::QuotaOrAuth(_)));
    }

    #[tokio::test]
    async fn test_http_responder_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "At your service."}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = make_config(&format!("{}/models", server.uri()));
        let responder = HttpResponder::new(&config, "secret".to_string()).unwrap();
        let reply = responder
            .respond(&[entry(Role::User, "hello", 0)], "hello")
            .await
            .unwrap();
        assert_eq!(reply, "At your service.");
    }

    #[tokio::test]
    async fn test_http_responder_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = make_config(&format!("{}/models", server.uri()));
        let responder = HttpResponder::new(&config, "secret".to_string()).unwrap();
        let err = responder.respond(&[], "hello").await.unwrap_err();
        assert!(matches!(err, ResponderError::QuotaOrAuth(_)));
    }

    #[tokio::test]
    async fn test_http_responder_invalid_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT",
                    "details": [{ "reason": "API_KEY_INVALID" }]
                }
            })))
            .mount(&server)
            .await;

        let config = make_config(&format!("{}/models", server.uri()));
        let responder = HttpResponder::new(&config, "wrong".to_string()).unwrap();
        let err = responder.respond(&[], "hello").await.unwrap_err();
        assert!(matches!(err, ResponderError::QuotaOrAuth(_)));
    }

    #[tokio::test]
    async fn test_http_responder_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = make_config(&format!("{}/models", server.uri()));
        let responder = HttpResponder::new(&config, "secret".to_string()).unwrap();
        let err = responder.respond(&[], "hello").await.unwrap_err();
        assert!(matches!(err, ResponderError::Network(_)));
    }
}

//! Thin client for the Gemini `generateContent` endpoint.
//!
//! A [`Conversation`] is client-side context: every exchange that succeeds is
//! recorded and the whole history is resent with the next message, which is
//! how multi-turn chat works against this stateless endpoint.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::constants;
use crate::error::{AuthError, RemoteError};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Where requests go and which model answers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: constants::GEMINI_API_URL.clone(),
            model: constants::AURA_MODEL.clone(),
        }
    }
}

/// An HTTP client bound to one API key.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    // Keeps the key-bearing default headers out of debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Builds a client for `api_key`. The key is checked locally only; a key
    /// the service does not recognise surfaces later as a [`RemoteError`].
    pub fn new(api_key: &str, config: &GeminiConfig) -> Result<Self, AuthError> {
        if api_key.is_empty() {
            return Err(AuthError::MissingKey);
        }
        if api_key.chars().any(char::is_whitespace) {
            return Err(AuthError::Rejected("API key must not contain whitespace".to_string()));
        }
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| AuthError::Rejected("API key contains characters that are not allowed".to_string()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);
        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AuthError::Rejected(format!("could not build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            http,
            endpoint,
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `text` as the next user turn of `conversation` and returns the
    /// model's reply. The conversation only grows when the call succeeds, and
    /// only after the last await, so a dropped call leaves it unchanged.
    #[instrument(skip_all, fields(model = %self.model, history = conversation.contents.len()))]
    pub async fn send(&self, conversation: &mut Conversation, text: &str) -> Result<String, RemoteError> {
        let mut contents = conversation.contents.clone();
        contents.push(Content::text(Role::User, text));
        let request = GenerateContentRequest { contents };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let message = error_message(&body);
            error!(%status, %message, "Gemini API request failed");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        let reply = extract_text(parsed)?;
        debug!(reply_len = reply.len(), "Received Gemini response");

        conversation.contents.push(Content::text(Role::User, text));
        conversation.contents.push(Content::text(Role::Model, &reply));
        Ok(reply)
    }
}

/// Accumulated multi-turn context. Tagged with the generation of the client
/// that opened it so a session can tell when the pairing has gone stale.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    generation: u64,
    contents: Vec<Content>,
}

impl Conversation {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            contents: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of completed exchanges recorded in the context.
    pub fn exchanges(&self) -> usize {
        self.contents.len() / 2
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: Role,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Role, text: &str) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.to_string() }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

/// Joins the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, RemoteError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(RemoteError::Blocked(reason));
    }
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(RemoteError::EmptyResponse);
    }
    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| {
            let message = w.error.message?;
            Some(match w.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            })
        })
        .unwrap_or_else(|| body.trim().to_string())
}

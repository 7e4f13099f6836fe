#![allow(dead_code)]

use aura::gemini::GeminiConfig;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MODEL: &str = "gemini-2.5-flash";
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

pub fn config_for(server: &MockServer) -> GeminiConfig {
    GeminiConfig {
        base_url: server.uri(),
        model: MODEL.to_string(),
    }
}

pub fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

/// Mounts a mock that answers every generateContent call made with `key`.
pub async fn mount_reply(server: &MockServer, key: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", key))
        .respond_with(reply(text))
        .mount(server)
        .await;
}

/// JSON bodies of every request the mock has seen, oldest first.
pub async fn request_bodies(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("request body is JSON"))
        .collect()
}

/// Texts of the `contents` of one request body.
pub fn content_texts(body: &Value) -> Vec<String> {
    body["contents"]
        .as_array()
        .expect("contents array")
        .iter()
        .map(|c| c["parts"][0]["text"].as_str().unwrap_or_default().to_string())
        .collect()
}

mod common;

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use aura::gemini::GeminiConfig;
use aura::web_server::{router, ServerConfig, MISSING_KEY_NOTICE};
use axum::http::StatusCode;
use axum_test::TestServer;
use common::{config_for, content_texts, mount_reply, request_bodies};
use wiremock::MockServer;

fn server_config(gemini: GeminiConfig, default_api_key: Option<&str>) -> ServerConfig {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        templates_dir: root.join("templates"),
        static_dir: root.join("static"),
        gemini,
        default_api_key: default_api_key.map(str::to_string),
    }
}

fn offline_config(default_api_key: Option<&str>) -> ServerConfig {
    server_config(
        GeminiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gemini-2.5-flash".to_string(),
        },
        default_api_key,
    )
}

fn turn_form<'a>(key: &'a str, message: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("api_key", key),
        ("focus_topic", "Weather & Climate"),
        ("experience_level", "Intermediate"),
        ("mountain_name", "Mount Fuji"),
        ("season", "Rainy season"),
        ("gear", "Tent"),
        ("gear", "Cooking gear"),
        ("response_style", "Detailed & Educational"),
        ("response_language", "English"),
        ("message", message),
    ]
}

#[tokio::test]
async fn test_index_without_key_shows_notice_only() {
    let server = TestServer::new(router(&offline_config(None))).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    let html = response.text();
    assert!(html.contains(MISSING_KEY_NOTICE));
    assert!(!html.contains("Type your message here"));
    assert!(html.contains("Expedition Preferences"));
}

#[tokio::test]
async fn test_index_with_default_key_shows_chat_and_defaults() {
    let server = TestServer::new(router(&offline_config(Some("env-key")))).unwrap();
    let html = server.get("/").await.text();
    assert!(html.contains("Type your message here"));
    assert!(!html.contains(MISSING_KEY_NOTICE));
    assert!(html.contains("<option selected>Dry season</option>"));
    assert!(html.contains(r#"value="Tent" checked"#));
    assert!(!html.contains(r#"value="Sleeping bag" checked"#));
}

#[test_log::test(tokio::test)]
async fn test_chat_turn_renders_transcript_and_keeps_panel() {
    let gemini = MockServer::start().await;
    mount_reply(&gemini, "web-key", "Expect afternoon storms near the summit.").await;

    let server = TestServer::new(router(&server_config(config_for(&gemini), None))).unwrap();
    let response = server
        .post("/chat")
        .form(&turn_form("web-key", "Is the weather stable in July?"))
        .await;
    response.assert_status_ok();

    let html = response.text();
    assert!(html.contains("Is the weather stable in July?"));
    assert!(html.contains("Expect afternoon storms near the summit."));
    assert!(html.contains("<option selected>Rainy season</option>"));
    assert!(html.contains(r#"value="Cooking gear" checked"#));
    assert!(!html.contains(r#"value="Hiking boots" checked"#));
    assert!(html.contains(r#"value="Mount Fuji""#));
}

#[tokio::test]
async fn test_chat_without_key_is_halted() {
    let server = TestServer::new(router(&offline_config(None))).unwrap();
    let html = server.post("/chat").form(&turn_form("", "hello")).await.text();
    assert!(html.contains(MISSING_KEY_NOTICE));
    assert!(!html.contains("hello"));
}

#[tokio::test]
async fn test_chat_with_rejected_key_shows_error() {
    let server = TestServer::new(router(&offline_config(None))).unwrap();
    let html = server.post("/chat").form(&turn_form("not a key", "hello")).await.text();
    assert!(html.contains("Invalid API Key: API key must not contain whitespace"));
}

#[tokio::test]
async fn test_reset_redirects_and_clears_transcript() {
    let gemini = MockServer::start().await;
    mount_reply(&gemini, "web-key", "Layer up.").await;

    let server = TestServer::new(router(&server_config(config_for(&gemini), None))).unwrap();
    let html = server.post("/chat").form(&turn_form("web-key", "Cold at night?")).await.text();
    assert!(html.contains("Layer up."));

    let response = server.post("/reset").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");

    let html = server.get("/").await.text();
    assert!(!html.contains("Layer up."));
    assert!(!html.contains("Cold at night?"));
}

#[tokio::test]
async fn test_missing_template_is_server_error() {
    let empty = tempfile::tempdir().unwrap();
    let mut config = offline_config(Some("k"));
    config.templates_dir = empty.path().to_path_buf();

    let server = TestServer::new(router(&config)).unwrap();
    let response = server.get("/").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().contains("Internal Server Error"));
}

#[tokio::test]
async fn test_static_files() {
    let server = TestServer::new(router(&offline_config(None))).unwrap();
    server.get("/static/style.css").await.assert_status_ok();
    server
        .get("/static/missing.css")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_served_pages_never_contain_key() {
    let gemini = MockServer::start().await;
    mount_reply(&gemini, "AIza-submitted-secret", "Pack a headlamp.").await;

    let server = TestServer::new(router(&server_config(config_for(&gemini), Some("AIza-env-secret")))).unwrap();
    let html = server.get("/").await.text();
    assert!(!html.contains("AIza-env-secret"));
    assert!(html.contains("leave blank to keep using it"));

    let html = server
        .post("/chat")
        .form(&turn_form("AIza-submitted-secret", "Night hike?"))
        .await
        .text();
    assert!(html.contains("Pack a headlamp."));
    assert!(!html.contains("AIza-submitted-secret"));
    assert!(!html.contains("AIza-env-secret"));

    let html = server.get("/").await.text();
    assert!(!html.contains("AIza-submitted-secret"));
}

#[tokio::test]
async fn test_blank_key_field_falls_back_to_saved_key() {
    let gemini = MockServer::start().await;
    mount_reply(&gemini, "env-key", "Start before dawn.").await;

    let server = TestServer::new(router(&server_config(config_for(&gemini), Some("env-key")))).unwrap();
    let html = server.post("/chat").form(&turn_form("", "When to start?")).await.text();
    assert!(!html.contains(MISSING_KEY_NOTICE));
    assert!(html.contains("Start before dawn."));

    // The same conversation continues on the next blank submit.
    server.post("/chat").form(&turn_form("", "And the descent?")).await.assert_status_ok();
    let bodies = request_bodies(&gemini).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(content_texts(&bodies[1]).len(), 3);
}

#[tokio::test]
async fn test_message_is_sent_verbatim() {
    let gemini = MockServer::start().await;
    mount_reply(&gemini, "web-key", "Yes.").await;

    let server = TestServer::new(router(&server_config(config_for(&gemini), None))).unwrap();
    server
        .post("/chat")
        .form(&turn_form("web-key", "  Is it cold?  "))
        .await
        .assert_status_ok();

    let bodies = request_bodies(&gemini).await;
    let texts = content_texts(&bodies[0]);
    assert!(texts[0].ends_with("User message:   Is it cold?  "));
}

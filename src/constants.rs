// Runtime constants, overridable from the environment (or a .env file).

use std::env;

pub const DEFAULT_PORT: u16 = 9900;
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_STATIC_DIR: &str = "static";

lazy_static::lazy_static! {
    /// Base URL of the Generative Language API. Tests point this at a mock server.
    pub static ref GEMINI_API_URL: String = env::var("GEMINI_API_URL")
        .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
    pub static ref AURA_MODEL: String = env::var("AURA_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
}

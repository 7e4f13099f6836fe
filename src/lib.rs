pub mod chat;
pub mod constants;
pub mod error;
pub mod gemini;
pub mod preferences;
pub mod prompt;
pub mod render;
pub mod session;
pub mod web_server;

pub use error::{AuthError, RemoteError};
pub use gemini::{Conversation, GeminiClient, GeminiConfig};
pub use preferences::Preferences;
pub use session::{Message, Phase, Role, Session};

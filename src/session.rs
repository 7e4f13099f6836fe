//! Per-user session: the client bound to the current API key, the
//! conversation opened on that client, and the transcript.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::AuthError;
use crate::gemini::{Conversation, GeminiClient, GeminiConfig};
use crate::preferences::Preferences;
use crate::prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the transcript. Fields are private so a message cannot change
/// once it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Where the session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No key has been accepted yet.
    NoKey,
    /// A client exists but no conversation is open on it.
    ClientReady,
    /// A conversation is open on the current client.
    ConversationReady,
}

struct BoundClient {
    key: String,
    generation: u64,
    client: GeminiClient,
}

pub struct Session {
    config: GeminiConfig,
    client: Option<BoundClient>,
    conversation: Option<Conversation>,
    messages: Vec<Message>,
    generation: u64,
}

impl Session {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: None,
            conversation: None,
            messages: Vec::new(),
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> Phase {
        match (&self.client, &self.conversation) {
            (None, _) => Phase::NoKey,
            (Some(bound), Some(conv)) if conv.generation() == bound.generation => Phase::ConversationReady,
            (Some(_), _) => Phase::ClientReady,
        }
    }

    /// Generation of the current client, bumped every time a new key is accepted.
    pub fn client_generation(&self) -> Option<u64> {
        self.client.as_ref().map(|b| b.generation)
    }

    /// Makes sure a client for `api_key` exists. Accepting a key different from
    /// the current one drops the conversation and transcript with the old
    /// client. On error nothing changes.
    pub fn ensure_client(&mut self, api_key: &str) -> Result<&GeminiClient, AuthError> {
        if api_key.is_empty() {
            return Err(AuthError::MissingKey);
        }
        let same_key = self.client.as_ref().is_some_and(|b| b.key == api_key);
        if !same_key {
            let client = GeminiClient::new(api_key, &self.config)?;
            let replaced = self.client.is_some();
            self.generation += 1;
            self.client = Some(BoundClient {
                key: api_key.to_string(),
                generation: self.generation,
                client,
            });
            self.conversation = None;
            self.messages.clear();
            info!(generation = self.generation, replaced, "Accepted API key, starting a clean session");
        }
        match &self.client {
            Some(bound) => Ok(&bound.client),
            None => Err(AuthError::MissingKey),
        }
    }

    /// Opens a conversation on the current client unless one bound to it is
    /// already open. Does nothing without a client.
    pub fn ensure_conversation(&mut self) -> Option<&mut Conversation> {
        let generation = self.client.as_ref()?.generation;
        if self.conversation.as_ref().map(Conversation::generation) != Some(generation) {
            self.conversation = Some(Conversation::new(generation));
        }
        self.conversation.as_mut()
    }

    /// Forgets the conversation and transcript. The client and its key stay,
    /// so the next turn opens a fresh conversation on them.
    pub fn reset(&mut self) {
        info!(dropped_messages = self.messages.len(), "Resetting conversation");
        self.conversation = None;
        self.messages.clear();
    }

    /// Runs one turn: binds the client, opens the conversation, asks the model
    /// and records the user message together with its reply. A failed remote
    /// call still yields an assistant message carrying the error text.
    ///
    /// Nothing is recorded until the call has finished, so a turn dropped
    /// mid-flight leaves both the transcript and the conversation untouched.
    #[instrument(skip_all, fields(text_len = user_text.len()))]
    pub async fn submit_turn(
        &mut self,
        api_key: &str,
        prefs: &Preferences,
        user_text: &str,
    ) -> Result<Message, AuthError> {
        let client = self.ensure_client(api_key)?.clone();
        let conversation = self.ensure_conversation().ok_or(AuthError::MissingKey)?;

        let instruction = prompt::compose(prefs, user_text);
        let answer = match client.send(conversation, &instruction).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Chat call failed, showing the error in the transcript");
                format!("An error occurred: {e}")
            }
        };

        let reply = Message::assistant(answer);
        self.messages.push(Message::user(user_text));
        self.messages.push(reply.clone());
        Ok(reply)
    }
}

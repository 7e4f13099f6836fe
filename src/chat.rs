// Interactive terminal chat. Reads one line per turn; lines starting with '/'
// are commands, everything else is sent to the model.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::AuthError;
use crate::preferences::Preferences;
use crate::prompt;
use crate::render;
use crate::session::Session;

pub const HELP: &str = "Commands: /reset, /key <KEY>, /history, /prefs, /help, /quit";

fn notice(err: &AuthError) -> String {
    match err {
        AuthError::MissingKey => {
            "Please add your Google AI API key (--api-key, GOOGLE_API_KEY or /key <KEY>) to start chatting."
                .to_string()
        }
        AuthError::Rejected(detail) => format!("Invalid API Key: {detail}"),
    }
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await.context("Failed to write to output")
}

/// Runs the chat loop until `/quit` or end of input.
pub async fn run_chat<R, W>(
    session: &mut Session,
    prefs: &Preferences,
    api_key: Option<String>,
    input: R,
    mut output: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting expedition chat...");
    let mut api_key = api_key.unwrap_or_default();

    say(&mut output, "AURA - Alpine Universal Route Assistant").await?;
    say(&mut output, HELP).await?;
    if let Err(e) = session.ensure_client(&api_key) {
        say(&mut output, &notice(&e)).await?;
    }

    let mut lines = input.lines();
    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;
        let Some(raw) = lines.next_line().await.context("Failed to read chat input")? else {
            break;
        };
        let line = raw.trim();

        match line.split_once(' ').map_or((line, ""), |(cmd, rest)| (cmd, rest.trim())) {
            ("", _) => continue,
            ("/quit" | "/exit", _) => break,
            ("/help", _) => say(&mut output, HELP).await?,
            ("/reset", _) => {
                session.reset();
                say(&mut output, "Conversation reset.").await?;
            }
            ("/key", key) => {
                api_key = key.to_string();
                match session.ensure_client(&api_key) {
                    Ok(_) => say(&mut output, "API key accepted.").await?,
                    Err(e) => say(&mut output, &notice(&e)).await?,
                }
            }
            ("/history", _) => {
                let transcript = render::plain(session.messages());
                if transcript.is_empty() {
                    say(&mut output, "(no messages yet)").await?;
                } else {
                    say(&mut output, &transcript).await?;
                }
            }
            ("/prefs", _) => say(&mut output, &prompt::compose(prefs, "<your message>")).await?,
            _ if line.starts_with('/') => {
                say(&mut output, &format!("Unknown command. {HELP}")).await?;
            }
            _ => {
                debug!("Sending chat turn");
                match session.submit_turn(&api_key, prefs, &raw).await {
                    Ok(reply) => say(&mut output, &render::plain(std::slice::from_ref(&reply))).await?,
                    Err(e) => say(&mut output, &notice(&e)).await?,
                }
            }
        }
    }

    info!(messages = session.messages().len(), "Chat session finished.");
    Ok(())
}

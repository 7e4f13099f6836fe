use anyhow::{Context, Result};
use axum::{
    extract::{Form, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    serve, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde::Serialize;
use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, instrument};

use crate::error::AuthError;
use crate::gemini::GeminiConfig;
use crate::preferences::{PanelView, Preferences};
use crate::render::{self, Block};
use crate::session::Session;

pub const MISSING_KEY_NOTICE: &str = "Please add your Google AI API key in the sidebar to start chatting.";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub gemini: GeminiConfig,
    /// Used when a submitted key field is blank, e.g. from `GOOGLE_API_KEY`.
    /// Never rendered into a page.
    pub default_api_key: Option<String>,
}

/// Everything one browser user edits: the session plus the panel as last
/// submitted, so the page re-renders with the same selections. The key stays
/// server-side and is reused whenever the key field comes back blank.
struct UserState {
    session: Session,
    prefs: Preferences,
    api_key: String,
}

// Shared application state
#[derive(Clone)]
struct AppState {
    templates: Arc<AutoReloader>,
    // One session for the whole server; turns are serialized by the lock.
    user: Arc<Mutex<UserState>>,
    model: Arc<str>,
}

#[derive(Debug, Serialize)]
struct Notice {
    level: &'static str,
    text: String,
}

impl From<&AuthError> for Notice {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::MissingKey => Self {
                level: "info",
                text: MISSING_KEY_NOTICE.to_string(),
            },
            AuthError::Rejected(detail) => Self {
                level: "error",
                text: format!("Invalid API Key: {detail}"),
            },
        }
    }
}

#[derive(Serialize)]
struct PageContext<'a> {
    title: &'static str,
    model: &'a str,
    key_saved: bool,
    panel: PanelView,
    notice: Option<Notice>,
    messages: Vec<Block<'a>>,
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: PathBuf) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

fn render_page(state: &AppState, user: &UserState, notice: Option<Notice>) -> Response {
    // A halted pass shows the notice and the panel, but no transcript.
    let messages = if notice.is_some() {
        Vec::new()
    } else {
        render::blocks(user.session.messages())
    };
    let context = PageContext {
        title: "AURA - Alpine Universal Route Assistant",
        model: &state.model,
        key_saved: !user.api_key.is_empty(),
        panel: user.prefs.panel_view(),
        notice,
        messages,
    };

    let rendered = state.templates.acquire_env().and_then(|env| {
        env.get_template("index.html")
            .and_then(|tmpl| tmpl.render(&context))
    });
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {e}")),
            )
                .into_response()
        }
    }
}

#[instrument(skip_all)]
async fn index_handler(State(state): State<AppState>) -> Response {
    let user = state.user.lock().await;
    let notice = user.api_key.is_empty().then(|| Notice::from(&AuthError::MissingKey));
    render_page(&state, &user, notice)
}

#[instrument(skip_all)]
async fn chat_handler(State(state): State<AppState>, Form(fields): Form<Vec<(String, String)>>) -> Response {
    let mut api_key = String::new();
    let mut message = String::new();
    for (name, value) in &fields {
        match name.as_str() {
            "api_key" => api_key = value.trim().to_string(),
            // Sent verbatim; only tested for blankness.
            "message" => message = value.clone(),
            _ => {}
        }
    }
    let prefs = Preferences::from_form(&fields);

    let mut guard = state.user.lock().await;
    let user = &mut *guard;
    user.prefs = prefs;
    if !api_key.is_empty() {
        user.api_key = api_key;
    }

    let outcome = if message.trim().is_empty() {
        // Settings-only submit: still bind the key so a change resets the session.
        user.session.ensure_client(&user.api_key).map(|_| ())
    } else {
        user.session
            .submit_turn(&user.api_key, &user.prefs, &message)
            .await
            .map(|_| ())
    };
    let notice = outcome.err().map(|e| {
        info!(error = %e, "Turn halted");
        Notice::from(&e)
    });
    render_page(&state, user, notice)
}

#[instrument(skip_all)]
async fn reset_handler(State(state): State<AppState>) -> Redirect {
    state.user.lock().await.session.reset();
    Redirect::to("/")
}

/// Builds the application router. Split from [`start_web_server`] so tests
/// can drive it without binding a socket.
pub fn router(config: &ServerConfig) -> Router {
    let templates = create_minijinja_env(config.templates_dir.clone());
    let state = AppState {
        templates: Arc::new(templates),
        user: Arc::new(Mutex::new(UserState {
            session: Session::new(config.gemini.clone()),
            prefs: Preferences::default(),
            api_key: config.default_api_key.clone().unwrap_or_default(),
        })),
        model: Arc::from(config.gemini.model.as_str()),
    };

    let static_files_service =
        ServeDir::new(&config.static_dir).not_found_service(tower::service_fn(|_req: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }));

    Router::new()
        .route("/", get(index_handler))
        .route("/chat", post(chat_handler))
        .route("/reset", post(reset_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(config: ServerConfig) -> Result<()> {
    let app = router(&config);

    let addr = SocketAddr::from((config.host, config.port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}

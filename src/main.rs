use anyhow::{Context, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

use aura::constants;
use aura::gemini::GeminiConfig;
use aura::preferences::{
    ExperienceLevel, FocusTopic, GearChecklist, GearItem, Preferences, ResponseLanguage, ResponseStyle, Season,
};
use aura::session::Session;
use aura::web_server::{self, ServerConfig};
use aura::{chat, prompt};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Gemini model that answers the chat.
    #[arg(long, global = true, default_value_t = constants::AURA_MODEL.clone())]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the web UI.
    Serve {
        #[arg(long, env = "AURA_PORT", default_value_t = constants::DEFAULT_PORT, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind.")]
        host: IpAddr,
        #[arg(long, default_value = constants::DEFAULT_TEMPLATES_DIR, help = "Directory holding index.html.")]
        templates: PathBuf,
        #[arg(long = "static", default_value = constants::DEFAULT_STATIC_DIR, help = "Directory served under /static.")]
        static_dir: PathBuf,
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, help = "Key used when the API key field is left blank.")]
        api_key: Option<String>,
    },
    /// Chat with the assistant in the terminal.
    Chat {
        #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, help = "Google AI API key.")]
        api_key: Option<String>,
        #[command(flatten)]
        prefs: PreferenceArgs,
    },
    /// Print the instruction that would be sent for MESSAGE, without calling the API.
    Prompt {
        #[command(flatten)]
        prefs: PreferenceArgs,
        message: String,
    },
}

/// The expedition preference panel, as flags.
#[derive(clap::Args, Debug)]
struct PreferenceArgs {
    #[arg(long, value_enum, default_value_t = FocusTopic::default(), help = "Focus area of your question.")]
    focus: FocusTopic,
    #[arg(long, value_enum, default_value_t = ExperienceLevel::default())]
    experience: ExperienceLevel,
    #[arg(long, help = "Target mountain (optional).")]
    mountain: Option<String>,
    #[arg(long, value_enum, default_value_t = Season::default())]
    season: Season,
    #[arg(
        long = "gear",
        value_enum,
        conflicts_with = "no_gear",
        help = "Carried equipment, repeatable [default: tent, hiking-boots, first-aid-kit]"
    )]
    gear: Vec<GearItem>,
    #[arg(long, help = "Carry nothing from the checklist.")]
    no_gear: bool,
    #[arg(long, value_enum, default_value_t = ResponseStyle::default())]
    style: ResponseStyle,
    #[arg(long, value_enum, default_value_t = ResponseLanguage::default())]
    language: ResponseLanguage,
}

impl PreferenceArgs {
    fn into_preferences(self) -> Preferences {
        let gear = if self.no_gear {
            GearChecklist::empty()
        } else if self.gear.is_empty() {
            GearChecklist::with_defaults()
        } else {
            self.gear.into_iter().collect()
        };
        let mut prefs = Preferences {
            focus_topic: self.focus,
            experience_level: self.experience,
            mountain_name: None,
            season: self.season,
            gear,
            response_style: self.style,
            response_language: self.language,
        };
        if let Some(name) = self.mountain {
            prefs.set_mountain_name(&name);
        }
        prefs
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (for GOOGLE_API_KEY and friends)
    dotenvy::dotenv().ok();

    // Reads log level from RUST_LOG (e.g. RUST_LOG=info,aura=debug). Logs go to
    // stderr so `prompt` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let gemini = GeminiConfig {
        model: cli.model,
        ..GeminiConfig::default()
    };

    match cli.command {
        Commands::Serve {
            port,
            host,
            templates,
            static_dir,
            api_key,
        } => {
            info!("Starting AURA web UI on port {}...", port);
            let config = ServerConfig {
                host,
                port,
                templates_dir: templates,
                static_dir,
                gemini,
                default_api_key: api_key,
            };
            let server = web_server::start_web_server(config);
            tokio::select! {
                res = server => res.context("Web server failed")?,
                _ = tokio::signal::ctrl_c() => info!("Ctrl-C received, shutting down."),
            }
        }
        Commands::Chat { api_key, prefs } => {
            let prefs = prefs.into_preferences();
            let mut session = Session::new(gemini);
            chat::run_chat(
                &mut session,
                &prefs,
                api_key,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
            .context("Chat session failed")?;
        }
        Commands::Prompt { prefs, message } => {
            println!("{}", prompt::compose(&prefs.into_preferences(), &message));
        }
    }

    Ok(())
}

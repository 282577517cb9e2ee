//! Kaachan server entry point
//!
//! - `kaachan-server` - Start the HTTP server (default)
//! - `kaachan-server init` - Write a starter kaachan.toml
//! - `kaachan-server config` - Show the effective configuration
//! - `kaachan-server analyze <text>` - Run the text heuristics on one input

use anyhow::Context;
use kaachan::{
    api::routes,
    cli::{
        init::{self, InitConfig, InitResult},
        output::Output,
        Cli, Commands,
    },
    utils::toml_config::{ConfigError, KaachanConfig, LlmConfig, LogFormat, StorageConfig},
    AppState, TextAnalysisEngine,
};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    provider: provider.as_str().to_string(),
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            }
        }
        Some(Commands::Config { validate }) => {
            let config = load_config(&cli.config)?;
            show_config(&config, &cli.config, &output);
            if validate {
                config
                    .validate_secrets()
                    .context("configuration references missing secrets")?;
                output.success("Configuration is valid");
            }
            Ok(())
        }
        Some(Commands::Analyze { text }) => {
            let result = TextAnalysisEngine::new().analyze(&text);
            output.analysis(&result);
            output.newline();
            Ok(())
        }
        None => {
            let config = load_config(&cli.config)?;
            init_tracing(&config, cli.verbose);
            serve(config).await
        }
    }
}

/// Missing file means defaults; a file that fails to parse is an error.
fn load_config(path: &Path) -> anyhow::Result<KaachanConfig> {
    match KaachanConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => Ok(KaachanConfig::default()),
        Err(e) => Err(e).with_context(|| format!("failed to load {}", path.display())),
    }
}

fn init_tracing(config: &KaachanConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "kaachan={level},kaachan_server={level},tower_http={level}",
            level = default_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: KaachanConfig) -> anyhow::Result<()> {
    let addr = config.bind_address();
    tracing::info!(
        provider = config.llm.provider_name(),
        model = config.llm.model(),
        "starting kaachan-server"
    );

    let state = AppState::from_config(config).await?;

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            orchestrator.purge_expired().await;
        }
    });

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}

fn show_config(config: &KaachanConfig, path: &Path, output: &Output) {
    output.banner();
    output.header("Configuration");
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    output.kv("file", &source);

    output.header("Server");
    output.kv("address", &config.bind_address());
    output.kv("log_level", &config.server.log_level);

    output.header("Model");
    output.kv("provider", config.llm.provider_name());
    output.kv("model", config.llm.model());
    match &config.llm {
        LlmConfig::Gemini { api_key_env, .. } => {
            let state = if std::env::var(api_key_env).is_ok() {
                "set"
            } else {
                "missing"
            };
            output.kv("api_key_env", &format!("{} ({})", api_key_env, state));
        }
        LlmConfig::Ollama { base_url, .. } => output.kv("base_url", base_url),
    }

    let conv = &config.conversation;
    output.header("Conversation");
    output.kv("history_window", &conv.history_window.to_string());
    output.kv("max_messages", &conv.max_messages.to_string());
    output.kv("session_ttl_hours", &conv.session_ttl_hours.to_string());
    output.kv("max_message_chars", &conv.max_message_chars.to_string());
    output.kv(
        "generation_timeout_ms",
        &conv.generation_timeout_ms.to_string(),
    );

    output.header("Storage");
    match &config.storage {
        StorageConfig::Memory => output.list_item("in-memory (sessions lost on restart)"),
        StorageConfig::File { path } => output.list_item(&format!("files in {}", path.display())),
    }
    output.newline();
}

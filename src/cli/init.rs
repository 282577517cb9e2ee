//! Init command implementation
//!
//! Writes a starter `kaachan.toml`, `.env.example` and data directory.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    Success,
    /// kaachan.toml exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    pub path: PathBuf,
    pub force: bool,
    /// `gemini` or `ollama`
    pub provider: String,
    pub host: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Kaachan");

    let base = &config.path;
    let config_path = base.join("kaachan.toml");
    if config_path.exists() && !config.force {
        output.warning("kaachan.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let sessions_dir = base.join("data").join("sessions");
    if sessions_dir.exists() {
        output.skipped("data/sessions", "already exists");
    } else if let Err(e) = fs::create_dir_all(&sessions_dir) {
        output.error(&format!("Failed to create data/sessions: {}", e));
        return InitResult::Error(e.to_string());
    } else {
        output.created("directory", "data/sessions");
    }

    let files = [
        ("config", "kaachan.toml", generate_config(&config)),
        ("env", ".env.example", generate_env_example(&config.provider)),
    ];
    for (kind, name, content) in files {
        if let Err(e) = write_file(&base.join(name), &content, config.force) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created(kind, name);
    }

    let gitignore = base.join(".gitignore");
    if !gitignore.exists() {
        match fs::write(&gitignore, "/target\n.env\ndata/\n") {
            Ok(()) => output.created("file", ".gitignore"),
            Err(e) => output.warning(&format!("Failed to create .gitignore: {}", e)),
        }
    }

    output.complete("Kaachan initialized!");
    output.header("Next Steps");
    if config.provider == "ollama" {
        output.info("1. Start Ollama and pull a model:");
        output.command("ollama serve");
        output.command("ollama pull llama3.2");
        output.info("2. Build with Ollama support:");
        output.command("cargo build --features ollama");
    } else {
        output.info("1. Set your Gemini API key:");
        output.command("cp .env.example .env");
        output.command("# Edit .env and set GEMINI_API_KEY");
    }
    output.info("Then start the server:");
    output.command("kaachan-server");
    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_config(config: &InitConfig) -> String {
    let llm = if config.provider == "ollama" {
        r#"[llm]
type = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2"
"#
    } else {
        r#"[llm]
type = "gemini"
api_key_env = "GEMINI_API_KEY"
model = "gemini-1.5-flash"
temperature = 0.7
top_p = 0.8
top_k = 40
max_output_tokens = 1000
"#
    };

    format!(
        r#"# Kaachan configuration

[server]
host = "{host}"
port = {port}
log_level = "info"
# "pretty" or "json"
log_format = "pretty"

{llm}
[conversation]
history_window = 10
max_messages = 100
session_ttl_hours = 24
max_message_chars = 500
generation_timeout_ms = 15000

[storage]
type = "file"
path = "./data/sessions"
"#,
        host = config.host,
        port = config.port,
        llm = llm,
    )
}

fn generate_env_example(provider: &str) -> String {
    let mut env = String::from("# Copy to .env and fill in\nRUST_LOG=info\n");
    if provider != "ollama" {
        env.push_str("GEMINI_API_KEY=\n");
    }
    env
}

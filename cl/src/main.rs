//! Clarifier - Multi-turn Query Clarification
//!
//! CLI entry point for the HTTP server and the interactive console.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use clarifier::cli::{Cli, Command, OutputFormat, generate_after_help};
use clarifier::clarify::{Clarifier, Collaborators, SessionStateMachine, StrategyPlanner};
use clarifier::collaborator::LlmCollaborator;
use clarifier::config::Config;
use clarifier::llm::{LlmClient, create_client};
use clarifier::prompts::PromptLoader;
use clarifier::{console, server};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clarifier")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("clarifier.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up DEEPSEEK_API_KEY and CLARIFIER_* from .env before anything reads them
    let _ = dotenvy::dotenv();

    // Parse CLI arguments with a pre-parse config for the after_help text
    let help_config = Config::default();
    let cmd = Cli::command().after_help(generate_after_help(&help_config));
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "Clarifier loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Serve { bind }) => {
            debug!(?bind, "main: matched Serve command");
            cmd_serve(config, bind).await
        }
        Some(Command::Ask { query, max_rounds }) => {
            debug!(?query, ?max_rounds, "main: matched Ask command");
            cmd_ask(config, query, max_rounds).await
        }
        Some(Command::Config { format }) => {
            debug!(%format, "main: matched Config command");
            cmd_config(&config, format)
        }
        None => {
            debug!("main: no command, starting console");
            cmd_ask(config, None, None).await
        }
    }
}

/// Wire the LLM client, prompts and collaborators into a Clarifier
fn build_clarifier(config: &Config) -> Result<Arc<Clarifier>> {
    debug!("build_clarifier: called");
    let llm: Arc<dyn LlmClient> = create_client(&config.llm).context("Failed to create LLM client")?;

    let prompts = match &config.clarifier.prompts_dir {
        Some(dir) => {
            debug!(?dir, "build_clarifier: using prompt overrides");
            PromptLoader::new(dir)
        }
        None => PromptLoader::embedded_only(),
    };

    let collaborator = Arc::new(LlmCollaborator::new(llm, prompts));
    let planner = StrategyPlanner::new(config.clarifier.context_keywords());
    let machine = SessionStateMachine::new(
        Collaborators::shared(collaborator),
        planner,
        config.clarifier.locale,
    );

    Ok(Arc::new(Clarifier::new(machine, config.clarifier.max_rounds)))
}

async fn cmd_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    debug!(?bind, "cmd_serve: called");
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    config.validate()?;

    let clarifier = build_clarifier(&config)?;
    println!("Clarifier listening on {}", config.server.bind);
    server::serve(clarifier, &config.server).await
}

async fn cmd_ask(mut config: Config, query: Option<String>, max_rounds: Option<u32>) -> Result<()> {
    debug!(?query, ?max_rounds, "cmd_ask: called");
    if let Some(max) = max_rounds {
        config.clarifier.max_rounds = max;
    }
    config.validate()?;

    let clarifier = build_clarifier(&config)?;
    console::run(clarifier, query.filter(|q| !q.trim().is_empty())).await
}

fn cmd_config(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(%format, "cmd_config: called");
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(config).context("Failed to serialize config")?,
        OutputFormat::Json => serde_json::to_string_pretty(config).context("Failed to serialize config")?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

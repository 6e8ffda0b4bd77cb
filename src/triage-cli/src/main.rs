//! Triage bot - tags Slack messages with priority reactions.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use triage_core::{Classifier, Tagger, TriageConfig};
use triage_slack::{BotOptions, SlackConfig, SlackWebClient, TriageHandler, TriageSlackBot};

/// How long to wait for the Socket Mode connection to close on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Slack message triage bot
#[derive(Parser)]
#[command(name = "triage-bot")]
#[command(about = "Tags Slack messages with priority reactions")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    json_logs: bool,
}

fn setup_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Defaults, then the optional file, then environment overrides.
fn load_triage_config(path: Option<&Path>) -> anyhow::Result<TriageConfig> {
    load_triage_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_triage_config`], resolving overrides through `lookup`.
fn load_triage_config_with<F>(path: Option<&Path>, lookup: F) -> anyhow::Result<TriageConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => TriageConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TriageConfig::default(),
    };

    config
        .apply_env_with(lookup)
        .context("Invalid triage settings in environment")?;
    config.validate()?;

    Ok(config)
}

fn load_slack_config() -> anyhow::Result<SlackConfig> {
    let config = SlackConfig::from_env().context("Missing Slack credentials")?;
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // A missing .env is fine
    let dotenv = dotenvy::dotenv();

    setup_logging(&args.log_level, args.json_logs);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let triage = match load_triage_config(args.config.as_deref().map(Path::new)) {
        Ok(c) => c,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let slack = match load_slack_config() {
        Ok(c) => c,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let triggers = triage.trigger_set();
    info!("Loaded priority keywords:");
    for (tier, words) in triggers.iter() {
        info!("  {}: {}", tier.label(), words.join(", "));
    }

    let classifier = match Classifier::new(triggers) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to build classifier: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = BotOptions::default();
    let client = match SlackWebClient::new(slack, options.api_timeout) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create Slack client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tagger = Tagger::new(classifier, Arc::clone(&client), triage.history_window);
    let handler = Arc::new(TriageHandler::new(tagger));
    let bot = Arc::new(TriageSlackBot::new(client, handler, options));

    let mut runner = {
        let bot = Arc::clone(&bot);
        tokio::spawn(async move { bot.start().await })
    };

    info!("Press Ctrl+C to stop");

    tokio::select! {
        result = &mut runner => match result {
            Ok(Ok(())) => {
                info!("Bot stopped");
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!("Bot error: {}", e);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("Bot task failed: {}", e);
                ExitCode::FAILURE
            }
        },
        _ = shutdown_signal() => {
            bot.shutdown();
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut runner).await {
                Ok(_) => info!("Bot stopped"),
                Err(_) => {
                    warn!("Bot did not stop within {:?}, aborting", SHUTDOWN_GRACE);
                    runner.abort();
                }
            }
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use triage_core::Tier;

    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["triage-bot", "--config", "triage.toml", "--json-logs"]);
        assert_eq!(args.config.as_deref(), Some("triage.toml"));
        assert_eq!(args.log_level, "info");
        assert!(args.json_logs);
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_config_file_fails() {
        let err = load_triage_config_with(Some(Path::new("/nonexistent/triage.toml")), no_env)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to load config"));
    }

    #[test]
    fn test_config_file_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_window = 25").unwrap();

        let config = load_triage_config_with(Some(file.path()), no_env).unwrap();
        assert_eq!(config.history_window, 25);
        assert!(!config.trigger_set().get(Tier::Critical).is_empty());
    }

    #[test]
    fn test_env_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "history_window = 25").unwrap();

        let config = load_triage_config_with(Some(file.path()), |key| {
            (key == "TRIAGE_HISTORY_WINDOW").then(|| "5".to_string())
        })
        .unwrap();
        assert_eq!(config.history_window, 5);
    }

    #[test]
    fn test_invalid_env_override_fails() {
        let err = load_triage_config_with(None, |key| {
            (key == "TRIAGE_HISTORY_WINDOW").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(format!("{:#}", err).contains("history_window"));
    }
}

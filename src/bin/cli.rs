//! pdfwatch CLI
//!
//! Local execution entry point: polling loop, one-off extraction and
//! configuration checks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pdfwatch::{
    error::Result,
    models::{Config, HttpConfig},
    pipeline::{Scanner, report_channel, run_round, run_until, spawn_reporter},
    services::{LogNotifier, Notifier, PdfExtractor, TelegramNotifier},
    storage::{self, LocalStorage, ReadOnlyStorage, RegistryStore},
    utils::http,
};

/// pdfwatch - selective process PDF watcher
#[derive(Parser, Debug)]
#[command(
    name = "pdfwatch",
    version,
    about = "Watch announcement pages for new PDFs and notify chats"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll every configured page and notify new PDFs
    Run {
        /// Run a single round and exit
        #[arg(long)]
        once: bool,

        /// Log messages instead of sending them (no secrets needed)
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the PDFs found on a page (URL or local HTML file)
    Extract {
        /// Page URL or path to a saved HTML file
        source: String,
    },

    /// Validate the configuration file and secrets
    Validate,

    /// Show configured targets and their registries
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Load the configuration, fill secrets from the environment and resolve
/// relative paths against the file's directory.
fn load_config(path: &Path) -> Result<Config> {
    let mut config = Config::load(path)?;
    config.apply_env_secrets(|key| std::env::var(key).ok());

    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config.resolve_paths(base_dir);
    config.validate()?;

    log::info!("Loaded configuration from {}", path.display());
    log::debug!("{:#?}", config.redacted());
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        config: config_path,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    match command {
        Command::Run { once, dry_run } => {
            let config = load_config(&config_path)?;
            run(config, once, dry_run).await?;
        }

        Command::Extract { source } => {
            let body = if source.starts_with("http://") || source.starts_with("https://") {
                let client = http::create_async_client(&HttpConfig::default())?;
                http::fetch_body(&client, &source).await?
            } else {
                tokio::fs::read_to_string(&source).await?
            };

            let records = PdfExtractor::new()?.extract(&body);
            log::info!("Found {} PDFs in {}", records.len(), source);
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = match load_config(&config_path) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Config validation failed: {}", e);
                    return Err(e);
                }
            };
            log::info!("✓ Config OK ({} targets)", config.target_count());

            if let Err(e) = config.validate_secrets() {
                log::error!("Secrets validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Secrets OK");

            log::info!("All validations passed!");
        }

        Command::Info => {
            let config = load_config(&config_path)?;
            let local = LocalStorage::new();

            log::info!(
                "Polling every {}s, policy {:?}",
                config.poll_interval_secs,
                config.update_policy
            );
            for target in config.targets() {
                let registry = &target.process.registry_path;
                let status = storage::describe(&local, registry).await;
                log::info!("{}: {}", target.label(), target.process.url);
                log::info!("  Registry {}: {}", registry.display(), status);
            }
        }
    }

    Ok(())
}

async fn run(config: Config, once: bool, dry_run: bool) -> Result<()> {
    let client = http::create_async_client(&config.http)?;
    let (notifier, store): (Arc<dyn Notifier>, Arc<dyn RegistryStore>) = if dry_run {
        log::info!("Dry run: messages are logged, registries are left untouched");
        (
            Arc::new(LogNotifier),
            Arc::new(ReadOnlyStorage::new(LocalStorage::new())),
        )
    } else {
        config.validate_secrets()?;
        (
            Arc::new(TelegramNotifier::new(
                client.clone(),
                &config.telegram,
                &config.bot.token,
            )),
            Arc::new(LocalStorage::new()),
        )
    };
    let scanner = Arc::new(Scanner::new(
        &config,
        client,
        store,
        Arc::clone(&notifier),
    )?);

    let (reports, receiver) = report_channel();
    let reporter = spawn_reporter(receiver, notifier, config.admin.clone());
    let targets = config.targets();

    if once {
        log::info!("Scanning {} targets once", targets.len());
        run_round(scanner, targets, reports).await;
    } else {
        log::info!(
            "Watching {} targets every {}s (Ctrl-C to stop)",
            targets.len(),
            config.poll_interval_secs
        );
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let rounds = run_until(scanner, targets, config.poll_interval(), reports, shutdown).await;
        log::info!("Stopped after {} rounds", rounds);
    }

    match reporter.await {
        Ok(count) if count > 0 => log::warn!("{} problems reported during this run", count),
        Ok(_) => {}
        Err(e) => log::error!("Reporter task failed: {}", e),
    }
    Ok(())
}

use crate::{
    config::Config,
    credential::{KeyFile, KeyView, default_sources},
    error::ExtractError,
    pipeline::Pipeline,
    service::GroqService,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "receipt-extract")]
#[command(about = "Extract VAT and totals from receipt images into JSON files")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Single image to process. If omitted, every image in --dir is processed.
    pub path: Option<PathBuf>,

    /// Directory scanned in batch mode.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// API key; takes priority over the key file and the environment.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Path to config TOML. If omitted, uses ./receipt-extract.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the API key stored in the key file.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Show the current key, masked.
    View,
    /// Store a new key.
    Set { key: String },
    /// Delete the stored key.
    Remove,
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Some(Command::Key { action }) => key(&cfg, action),
        None => extract(&args, &cfg),
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    let default = PathBuf::from("receipt-extract.toml");
    if default.exists() {
        Config::load(&default)
    } else {
        Ok(Config::default())
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        crate::util::ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file || cfg.logging.file_path.is_empty() {
        return None;
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}

fn extract(args: &Args, cfg: &Config) -> Result<()> {
    let sources = default_sources(
        args.api_key.as_deref(),
        Path::new(&cfg.credential.file),
        &cfg.credential.env_var,
    );
    let service = GroqService::new(cfg)?;
    let pipeline = Pipeline::new(cfg, service, sources);

    if let Some(path) = &args.path {
        match pipeline.run_single(path) {
            Ok(done) => println!("Result saved to {}", done.output.display()),
            Err(ExtractError::NotFound(p)) => println!("File not found: {}", p.display()),
            Err(ExtractError::Auth) => print_auth_help(cfg),
            Err(err) => println!("Failed to extract data: {err}"),
        }
        return Ok(());
    }

    match pipeline.run_batch(&args.dir) {
        Ok(report) if report.total() == 0 => {
            println!("No image files found in {}", args.dir.display());
        }
        Ok(report) => {
            info!("batch finished started={} finished={}", report.started, report.finished);
            println!("{}", "=".repeat(50));
            println!("Processing complete: {}", report.summary_line());
        }
        Err(ExtractError::Auth) => print_auth_help(cfg),
        Err(err) => println!("Batch failed: {err}"),
    }
    Ok(())
}

fn print_auth_help(cfg: &Config) {
    let var = &cfg.credential.env_var;
    println!("Please set the {var} API key");
    println!("You can do this by:");
    println!("  - Passing it directly: --api-key <KEY>");
    println!("  - Adding it to {}: {var}=your-api-key-here", cfg.credential.file);
    println!("  - Or setting it in your shell: export {var}='your-api-key-here'");
}

fn key(cfg: &Config, action: &KeyAction) -> Result<()> {
    let store = KeyFile::new(&cfg.credential.file, &cfg.credential.env_var);
    match action {
        KeyAction::View => match store.view() {
            KeyView::File(masked) => {
                println!("Current API key ({}): {masked}", store.path().display())
            }
            KeyView::Env(masked) => println!("Current API key (environment): {masked}"),
            KeyView::Missing => println!("No API key found!"),
        },
        KeyAction::Set { key } => {
            store.set(key)?;
            println!("API key updated in {}", store.path().display());
        }
        KeyAction::Remove => {
            if store.remove()? {
                println!("API key removed from {}", store.path().display());
            } else {
                println!("No API key found in {}", store.path().display());
            }
        }
    }
    Ok(())
}

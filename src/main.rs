//! CLI entry point for the card metadata resolver.
//!
//! Provides commands for resolving a build's card catalog, inspecting the
//! persistent cache and managing configuration.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use cardmeta::catalog::BuildNumber;
use cardmeta::config::CacheBackend;
use cardmeta::io::ExitCode;
use cardmeta::{
    DiagnosticContext, FileCache, MetadataResolver, PersistentCache, Resolution,
    ResolutionSource, ResolverOptions, ResolverTelemetry, Settings,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// JSON status report written to stderr with --status
#[derive(Debug, Serialize)]
struct StatusReport {
    source: Option<ResolutionSource>,
    telemetry: ResolverTelemetry,
    diagnostics: Vec<DiagnosticEntry>,
}

#[derive(Debug, Clone, Serialize)]
struct DiagnosticEntry {
    message: String,
    context: DiagnosticContext,
}

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "cardmeta",
    version = env!("CARGO_PKG_VERSION"),
    about = "Card catalog metadata resolver",
    long_about = "Resolve the card catalog for a game build, using a local cache and falling back to the latest build.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overrides [logging] level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .cardmeta directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .cardmeta/settings.toml")]
    Config,

    /// Resolve a build to its card catalog
    #[command(
        about = "Resolve the card catalog for a build number",
        after_help = "Examples:\n  cardmeta resolve 12345\n  cardmeta resolve 12345 --locale deDE --json\n  cardmeta resolve            # latest\n  cardmeta resolve 0 --status # latest, with telemetry on stderr"
    )]
    Resolve {
        /// Build number; omitted, zero or non-numeric means latest
        build: Option<String>,

        /// Locale code (overrides config)
        #[arg(short, long)]
        locale: Option<String>,

        /// Source URL template with %(build)s and %(locale)s (overrides config)
        #[arg(short, long)]
        source: Option<String>,

        /// Do not read or write the persistent cache
        #[arg(long)]
        no_cache: bool,

        /// Print the full catalog as JSON
        #[arg(long)]
        json: bool,

        /// Print telemetry and diagnostics as JSON on stderr
        #[arg(long)]
        status: bool,
    },

    /// Inspect the persistent cache
    #[command(about = "List, remove or clear cached catalogs")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached builds
    List,
    /// Print the cache directory
    Path,
    /// Remove every cached build
    Clear,
    /// Remove one cached build
    Remove {
        /// Build number to evict
        build: u64,
    },
}

/// Entry point with tokio async runtime.
///
/// Loads configuration, installs logging and dispatches the command.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = if let Some(config_path) = &cli.config {
        Settings::load_from(config_path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {e}",
                config_path.display()
            );
            std::process::exit(ExitCode::ConfigError.into());
        })
    } else {
        Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        })
    };

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };
    cardmeta::logging::init(&level);

    let code = match cli.command {
        Commands::Init { force } => run_init(force),
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            match toml::to_string_pretty(&settings) {
                Ok(toml_str) => println!("{toml_str}"),
                Err(e) => eprintln!("Error displaying config: {e}"),
            }
            ExitCode::Success
        }
        Commands::Resolve {
            build,
            locale,
            source,
            no_cache,
            json,
            status,
        } => {
            if let Some(locale) = locale {
                settings.source.locale = locale;
            }
            if let Some(source) = source {
                settings.source.template = Some(source);
            }
            if no_cache {
                settings.cache.backend = CacheBackend::Disabled;
            }
            run_resolve(&settings, build.as_deref(), json, status).await
        }
        Commands::Cache { action } => match run_cache(&settings, action) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::IoError
            }
        },
    };

    std::process::exit(code.into());
}

fn run_init(force: bool) -> ExitCode {
    let cwd = std::env::current_dir().unwrap_or_default();
    match Settings::init_config_file(&cwd, force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from_error(&e)
        }
    }
}

async fn run_resolve(
    settings: &Settings,
    build: Option<&str>,
    json: bool,
    status: bool,
) -> ExitCode {
    let cancel = CancellationToken::new();
    let mut resolver = match MetadataResolver::from_settings(settings, cancel.clone()) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from_error(&e);
        }
    };

    // Ctrl-C aborts the in-flight request instead of killing the process
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let diagnostics: Arc<Mutex<Vec<DiagnosticEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = diagnostics.clone();

    resolver.setup(ResolverOptions::new().logger(move |message, context| {
        sink.lock().push(DiagnosticEntry {
            message: message.to_string(),
            context: context.clone(),
        });
    }));

    let result = resolver.resolve(build).await;

    if status {
        let report = StatusReport {
            source: result.as_ref().ok().and_then(Resolution::source),
            telemetry: resolver.telemetry(),
            diagnostics: diagnostics.lock().clone(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => eprintln!("Error rendering status: {e}"),
        }
    }

    match result {
        Ok(resolution) => {
            if let Resolution::Delivered { catalog, source } = &resolution {
                if json {
                    match serde_json::to_string(catalog) {
                        Ok(text) => println!("{text}"),
                        Err(e) => {
                            eprintln!("Error rendering catalog: {e}");
                            return ExitCode::GeneralError;
                        }
                    }
                } else {
                    let label = match source {
                        ResolutionSource::Cache => "cache",
                        ResolutionSource::Build => "build-specific source",
                        ResolutionSource::Latest => "latest source",
                    };
                    println!("Resolved {} entries from {label}", catalog.len());
                }
            } else {
                eprintln!("Request cancelled");
            }
            ExitCode::from_resolution(&resolution)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            for suggestion in e.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
            ExitCode::from_error(&e)
        }
    }
}

fn run_cache(settings: &Settings, action: CacheAction) -> Result<ExitCode> {
    let cache = FileCache::new(settings.cache_dir());

    match action {
        CacheAction::Path => {
            println!("{}", cache.dir().display());
        }
        CacheAction::List => {
            let keys = cache.keys().context("Failed to list cache entries")?;
            if keys.is_empty() {
                println!("No cached builds in {}", cache.dir().display());
            }
            for key in keys {
                match BuildNumber::from_cache_key(&key) {
                    Some(build) => println!("{build}\t{key}"),
                    None => println!("-\t{key}"),
                }
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear().context("Failed to clear cache")?;
            println!("Removed {removed} cached build(s)");
        }
        CacheAction::Remove { build } => {
            let Some(build) = BuildNumber::new(build) else {
                eprintln!("Build 0 is never cached");
                return Ok(ExitCode::NotFound);
            };
            let key = build.cache_key();
            if cache.get(&key)?.is_none() {
                eprintln!("Build {build} is not cached");
                return Ok(ExitCode::NotFound);
            }
            cache.remove(&key)?;
            println!("Removed {key}");
        }
    }

    Ok(ExitCode::Success)
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use visionpipe::{exit_code, VisionConfig, VisionError, VisionOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "visionpipe")]
#[command(about = "Multi-camera vision pipeline with remote tuning and MJPEG streaming")]
#[command(version)]
#[command(long_about = "Captures frames from one or more cameras, runs a color threshold \
detector on each, shows the result and its debug channels in local windows and serves the \
active camera as an MJPEG stream. Detection thresholds, the active camera and stream quality \
are tuned at runtime through a shared parameter store.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "visionpipe.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the pipeline")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - open devices and bind the server but don't run the loops
    #[arg(long, help = "Perform dry run - start components but don't run the capture loops")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", help = "Append logs to a file in addition to stderr")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let _log_guard = init_logging(&args)?;

    info!("Starting visionpipe v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match VisionConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) if args.validate_config => {
            error!("Failed to load configuration: {}", e);
            eprintln!("✗ Configuration could not be read: {}", e);
            std::process::exit(VisionError::from(e).exit_code());
        }
        Err(e) => {
            warn!("Failed to load configuration ({}); using defaults", e);
            VisionConfig::default()
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
        }
        std::process::exit(exit_code::UNKNOWN_ERROR);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let mut orchestrator = VisionOrchestrator::new(config);

    if let Err(e) = orchestrator.start().await {
        error!("Failed to start pipeline: {}", e);
        std::process::exit(e.exit_code());
    }

    if args.dry_run {
        info!("Dry run mode - components started but capture loops not run");
        if let Some(address) = orchestrator.stream_address() {
            println!("✓ Dry run completed successfully - stream bound to {}", address);
        } else {
            println!("✓ Dry run completed successfully");
        }
        return Ok(());
    }

    let code = match orchestrator.run().await {
        Ok(code) => code,
        Err(e) => {
            error!("Pipeline error during execution: {}", e);
            e.exit_code()
        }
    };

    info!("visionpipe exited with code: {}", code);
    std::process::exit(code);
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("visionpipe={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Log file path {} has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    let rendered = toml::to_string_pretty(&VisionConfig::default())
        .context("Failed to render default configuration")?;

    println!("# visionpipe configuration file");
    println!("# Every value can be overridden with VISIONPIPE__SECTION__KEY variables");
    println!();
    println!("{}", rendered);
    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use photodb::{PhotoDbApp, PhotoDbConfig, TimestampRange};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "photodb")]
#[command(about = "Capture camera snapshots into a local photo database")]
#[command(version)]
#[command(long_about = "Captures still frames from a camera, stores them with a timestamp and \
description in a local SQLite database, queries them by time range, exports them as JSON with \
inline images, and serves a small web app through an offline-first asset cache.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "photodb.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take one snapshot and store it
    Capture {
        /// Description stored with the photo
        #[arg(long)]
        description: Option<String>,

        /// Write the stored PNG to this file
        #[arg(long, value_name = "PATH")]
        preview: Option<String>,
    },
    /// List photos taken within a time range
    Query {
        /// Inclusive lower bound (RFC 3339)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Inclusive upper bound (RFC 3339)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// Write every photo to photoDB_export.json
    Export {
        /// Directory for the export file
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Show record count and storage usage
    Stats,
    /// Serve the web app through the offline cache
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting photodb v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match PhotoDbConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let Some(command) = args.command else {
        eprintln!("No command given; see --help");
        std::process::exit(2);
    };

    if let Command::Serve = command {
        return serve(config).await;
    }

    if let Command::Capture {
        preview: Some(preview),
        ..
    } = &command
    {
        config.record.preview_path = Some(preview.clone());
    }

    let mut app = PhotoDbApp::open(config).await.map_err(|e| {
        error!("Failed to open photo database: {}", e);
        e
    })?;

    let outcome = run_command(&mut app, command).await;
    app.close().await?;
    outcome
}

async fn run_command(app: &mut PhotoDbApp, command: Command) -> Result<()> {
    match command {
        Command::Capture { description, .. } => {
            let record = app.capture(description.as_deref()).await?;
            println!(
                "Saved photo {} at {} ({} bytes)",
                record.id,
                record.timestamp,
                record.image.len()
            );
        }
        Command::Query { from, to } => {
            let range = match (from, to) {
                (Some(from), Some(to)) => Some(TimestampRange::parse(&from, &to)?),
                _ => None,
            };
            for record in app.query(range).await? {
                println!(
                    "{}\t{}\t{}\t{} bytes",
                    record.id,
                    record.timestamp,
                    record.description,
                    record.image.len()
                );
            }
        }
        Command::Export { output } => {
            let path = app.export(output.as_deref()).await?;
            println!("Exported to {}", path.display());
        }
        Command::Stats => {
            let stats = app.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Serve => anyhow::bail!("serve does not run against the photo database"),
    }

    Ok(())
}

#[cfg(feature = "offline_cache")]
async fn serve(config: PhotoDbConfig) -> Result<()> {
    let shutdown = photodb::app::shutdown_token();
    photodb::app::serve_offline_cache(config.cache, shutdown)
        .await
        .map_err(|e| {
            error!("Offline cache server failed: {}", e);
            e
        })?;
    info!("photodb stopped");
    Ok(())
}

#[cfg(not(feature = "offline_cache"))]
async fn serve(_config: PhotoDbConfig) -> Result<()> {
    anyhow::bail!("photodb was built without the offline_cache feature")
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
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
        .unwrap_or_else(|_| EnvFilter::new(format!("photodb={}", log_level)));

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

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# photodb configuration file");
    println!("# Every option with its default value; PHOTODB_<SECTION>__<KEY> overrides any of them");
    println!();
    println!("{}", PhotoDbConfig::default().to_toml()?);
    Ok(())
}

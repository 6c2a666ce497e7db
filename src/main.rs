use anyhow::Result;
use clap::Parser;
use motioncast::{MotioncastApp, MotioncastConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "motioncast")]
#[command(about = "Real-time motion sensor capture client streaming to a collector")]
#[command(version)]
#[command(long_about = "A real-time client that captures motion/orientation sensor readings \
and streams them to a remote collector over a persistent WebSocket connection, either as a \
continuous broadcast at a fixed cadence or as a countdown-gated gesture recording window.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "motioncast.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit without starting the client")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Disable the terminal keyboard control
    #[arg(long, help = "Disable the terminal keyboard control surface")]
    no_keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        print_default_config();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting Motioncast client v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match MotioncastConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut app = MotioncastApp::new(config);
    app.set_keyboard_enabled(!args.no_keyboard);

    app.run().await.map_err(|e| {
        error!("Client error during execution: {}", e);
        e
    })?;

    info!("Motioncast client exited");
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
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
        .unwrap_or_else(|_| EnvFilter::new(format!("motioncast={}", log_level)));

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
fn print_default_config() {
    println!("# Motioncast Configuration File");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[collector]
# Collector host (host or host:port)
host = "127.0.0.1:8000"
# Use the secure socket scheme (wss)
secure = false
# Well-known WebSocket path on the collector
path = "/ws"
# Delay before the reconnect attempt after an unexpected close (ms)
reconnect_delay_ms = 1000

[cadence]
# Snapshot emission interval in milliseconds (100 ms = 10 Hz)
interval_ms = 100

[countdown]
# Seconds counted down before a gesture recording window opens
duration_seconds = 3
# Loudness handed to the audible cue collaborator (0.0 - 1.0)
cue_volume = 0.6

[sensors]
# Event rate of the simulated sensor source, in Hz
simulated_rate_hz = 60

[system]
# Event bus capacity
event_bus_capacity = 100
"#;

    println!("{}", default_config);
}

//! Homewire CLI
//!
//! Connects to the hub and logs every event of the requested types:
//! - Watch events
//! - Generate a default config file

use clap::{Parser, Subcommand};
use homewire::{generate_default_config, Config, EventListener, LoggingConfig, Session};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "homewire")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watch and react to smart-home hub events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every event of the given types until the connection ends
    Watch {
        /// Event types to subscribe to
        #[arg(short, long = "event-type", default_value = "state_changed")]
        event_types: Vec<String>,
        /// Minimum time between two printed events (e.g. 5s, 1m)
        #[arg(short, long)]
        throttle: Option<String>,
        /// Only print between these times of day (HH:MM-HH:MM)
        #[arg(long)]
        between: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Wrote default config to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
        Commands::Watch {
            event_types,
            throttle,
            between,
        } => {
            init_logging(&config.logging);
            tracing::info!("Homewire v{}", env!("CARGO_PKG_VERSION"));

            let mut stage = EventListener::builder()
                .event_types(event_types)
                .call(|_, _, event| async move {
                    println!("{}", String::from_utf8_lossy(&event.raw_event_json));
                });
            if let Some(throttle) = throttle {
                stage = stage.throttle(throttle);
            }
            if let Some(between) = between {
                let (start, end) = between
                    .split_once('-')
                    .ok_or_else(|| format!("Invalid --between {:?}, expected HH:MM-HH:MM", between))?;
                stage = stage.only_between(start, end);
            }
            let listener = stage.build()?;

            let mut session = Session::connect(&config.hub).await?;
            session.register_event_listener(listener);

            let shutdown = session.shutdown_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutting down...");
                    shutdown.cancel();
                }
            });

            session.run().await?;
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("homewire={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

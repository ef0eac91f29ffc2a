use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use graphd_core::{ServerConfig, ServerMode};
use graphd_server::Server;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "graphd",
    version,
    about = "Random-graph analysis server on a Unix domain socket"
)]
struct Cli {
    #[arg(short, long, env = "GRAPHD_CONFIG", help = "Configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Socket path to listen on")]
    socket: Option<PathBuf>,

    #[arg(short, long, value_enum, help = "Concurrency mode")]
    mode: Option<ServerMode>,

    #[arg(short, long, help = "Leader-follower pool size")]
    workers: Option<usize>,

    #[arg(short, long, help = "Enable verbose logging")]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(socket) = &self.socket {
            config.socket_path = socket.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.verbose {
            config.logging.level = "graphd=debug".to_string();
        }
    }
}

fn subscriber<W>(default_filter: &str, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_writer(writer),
        )
}

fn init_tracing(default_filter: &str) {
    subscriber(default_filter, std::io::stdout).init();
}

fn log_config(config: &ServerConfig) {
    info!(
        "Loaded configuration: socket={:?} mode={} workers={} read_timeout={}s",
        config.socket_path, config.mode, config.workers, config.read_timeout_secs
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    // the subscriber needs the configured level, so nothing before this line is logged
    init_tracing(&config.logging.level);
    log_config(&config);
    config.validate().context("validating configuration")?;

    info!("Starting graphd {}", env!("CARGO_PKG_VERSION"));
    let server = Server::bind(config).context("binding server socket")?;
    server.run().context("running server")
}

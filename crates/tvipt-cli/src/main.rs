//! tvipt entry point.

use std::{
    thread,
    time::{Duration, Instant},
};

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tvipt_cli::{Dispatcher, StdioTerminal, TcpConnector, parse_key, parse_target};
use tvipt_core::DeviceConfig;

/// One cooperative tick; short enough that keystrokes feel immediate.
const TICK_INTERVAL: Duration = Duration::from_millis(5);

/// Encrypted serial-terminal bridge to a remote host
#[derive(Parser, Debug)]
#[command(name = "tvipt")]
#[command(about = "Bridge a terminal to a tvipt server over an encrypted tunnel")]
#[command(version)]
struct Args {
    /// Pre-shared 32-byte key, 64 hex characters
    ///
    /// Provision the identical key on the remote host; there is no
    /// in-protocol key exchange.
    #[arg(long, env = "TVIPT_KEY", hide_env_values = true)]
    key: String,

    /// Auto-connect target at boot, host[:port]
    ///
    /// One bounded attempt; falls back to the prompt on failure.
    #[arg(long)]
    connect: Option<String>,

    /// Bound on the boot auto-connect attempt, in milliseconds
    #[arg(long, default_value_t = 5000)]
    connect_timeout_ms: u64,

    /// Disable session keepalive frames
    #[arg(long)]
    no_keepalive: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so the terminal byte stream stays clean; redirect
    // stderr to a file when tracing a live session.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = DeviceConfig::new(parse_key(&args.key)?);
    config.connect_timeout = Duration::from_millis(args.connect_timeout_ms);
    if args.no_keepalive {
        config.session.keepalive_interval = None;
    }
    if let Some(target) = &args.connect {
        config.auto_connect = Some(parse_target(target)?);
    }

    run(config)
}

fn run(config: DeviceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut term = StdioTerminal::new()?;
    let mut dispatcher = Dispatcher::new(config, TcpConnector::new(), Instant::now());

    dispatcher.boot(&mut term, Instant::now());

    while dispatcher.is_running() {
        dispatcher.tick(Instant::now(), &mut term);
        thread::sleep(TICK_INTERVAL);
    }

    Ok(())
}

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Checks the status (availability, logged-in players) of a Minecraft server.
//!
//! ```text
//! $ mcstatus-query mc.example.org
//! INFO mcstatus_query: querying mc.example.org:25565
//! INFO mcstatus_query: available, 3/5 online: dignity, mf, viking
//! ```

use std::time::Duration;

use argh::FromArgs;
use slping::{Report, ServerAddress, ServerStatus, DEFAULT_PORT};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Checks the status (availability, logged-in players) of a Minecraft server.
#[derive(FromArgs)]
struct Args {
    /// server host name or IP address
    #[argh(positional)]
    host: String,
    /// server port, defaults to 25565
    #[argh(option, default = "DEFAULT_PORT")]
    port: u16,
    /// give up after this many milliseconds, defaults to 5000
    #[argh(option, default = "5000")]
    timeout_ms: u64,
}

fn summary(report: &Report) -> String {
    if !report.available {
        return "unavailable".to_owned();
    }
    let names: Vec<&str> = report
        .player_names_sample
        .iter()
        .map(String::as_str)
        .collect();
    format!(
        "available, {}/{} online: {}",
        report.players_online,
        report.players_max,
        names.join(", ")
    )
}

fn log_filter(directives: Option<&str>) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    let builder = EnvFilter::builder()
        .with_default_directive(concat!(env!("CARGO_CRATE_NAME"), "=info").parse()?);
    let filter = match directives {
        Some(directives) => builder.parse(directives)?,
        None => builder.parse("")?.add_directive("slping=info".parse()?),
    };
    Ok(filter)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = log_filter(std::env::var("LOG").ok().as_deref())?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let args: Args = argh::from_env();
    let address = ServerAddress::new(args.host, args.port);
    info!("querying {address}");

    let mut status = ServerStatus::with_timeout(address, Duration::from_millis(args.timeout_ms));
    info!("{}", summary(status.refresh()));
    Ok(())
}

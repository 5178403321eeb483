use clap::Parser;
use relay_server::{Relay, RelayConfig};
use std::sync::Arc;

/// Front-of-house sync relay: forwards every frame to every other
/// connected terminal.
#[derive(Debug, Parser)]
#[command(name = "relay-server", version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "RELAY_LISTEN", default_value = "0.0.0.0:8081")]
    listen: String,

    /// Fan-out channel capacity
    #[arg(long, env = "RELAY_CAPACITY", default_value_t = 1024)]
    capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("🔌 Sync relay starting...");

    let relay = Arc::new(
        Relay::bind(RelayConfig {
            listen_addr: args.listen,
            channel_capacity: args.capacity,
        })
        .await?,
    );

    let runner = relay.clone();
    let run_handle = tokio::spawn(async move { runner.run().await });

    tokio::signal::ctrl_c().await?;
    relay.shutdown();

    run_handle.await??;
    Ok(())
}

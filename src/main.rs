#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ssh_relay::relay::channel::{TelegramChannel, serve};
use ssh_relay::relay::config::{Config, RuntimeSettings};
use ssh_relay::relay::executor::CommandExecutor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Initialize logging with proper tracing default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    // A missing or unreadable configuration file is fatal; a malformed one
    // has already been degraded to defaults inside Config::load.
    let config_path = Config::default_path()?;
    let config = Config::load(&config_path)?;
    let settings = RuntimeSettings::from_env();

    info!(
        "relaying commands to {}@{}:{}",
        config.ssh.user, config.ssh.host, config.ssh.port
    );

    let executor = CommandExecutor::from_config(&config, &settings);
    let mut channel = TelegramChannel::new(&config.ssh.token, &config.ssh.proxy, settings.poll_timeout)?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    serve(&executor, &mut channel, shutdown).await;

    Ok(())
}

use clap::Parser;
use env_logger::Env;
use log::info;
use pong_server::config::{Args, ServerConfig};
use pong_server::network::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());
    info!(
        "Starting pong server: {} balls, first to {}, {}s limit, {}Hz",
        config.settings.ball_count,
        config.settings.target_score,
        config.settings.time_limit.as_secs(),
        config.tick_rate
    );

    let mut server = Server::bind(&config).await?;
    server.start();

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");
    server.stop().await;

    Ok(())
}

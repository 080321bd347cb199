use clap::Parser;
use env_logger::Env;
use log::info;
use pong_client::input::chase_nearest_ball;
use pong_client::{ClientEvents, GameClient, PaddleSteering};
use pong_shared::{EndMessage, GameSettings, JoinMessage, TICK_RATE};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Move both paddles toward the nearest ball
    #[arg(short = 'a', long)]
    autopilot: bool,
}

struct LogEvents;

impl ClientEvents for LogEvents {
    fn on_join(&self, join: &JoinMessage) {
        info!("Waiting for an opponent as {}", join.player_name);
    }

    fn on_start(&self, settings: &GameSettings) {
        info!(
            "{} balls, first to {} points, {}s limit",
            settings.ball_count,
            settings.target_score,
            settings.time_limit.as_secs()
        );
    }

    fn on_end(&self, end: &EndMessage) {
        match end.winner {
            0 => info!("No winner"),
            winner => info!("Player {} wins", winner),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Connecting to: {}", args.server);

    let mut client = GameClient::connect(&args.server, Arc::new(LogEvents)).await?;
    info!("Connected to {}", client.server_addr());

    let mut frame = interval(Duration::from_secs_f64(1.0 / f64::from(TICK_RATE)));
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut steering: Option<PaddleSteering> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, disconnecting...");
                break;
            }
            _ = frame.tick() => {
                if !client.is_connected() {
                    break;
                }
                if !args.autopilot {
                    continue;
                }

                let state = client.snapshot();
                if !state.started || state.game_over {
                    steering = None;
                    continue;
                }

                if steering.is_none() {
                    steering = PaddleSteering::from_state(&state);
                }
                if let Some(steering) = steering.as_mut() {
                    let (dx, dy) = chase_nearest_ball(&state.balls, steering);
                    steering.steer(dx, dy, &client);
                }
            }
        }
    }

    client.disconnect().await;
    Ok(())
}

//! Command line configuration for the server binary.

use clap::Parser;
use pong_shared::{GameSettings, TICK_RATE};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Simulation ticks per second
    #[arg(short, long, default_value_t = TICK_RATE)]
    pub tick_rate: u32,

    /// Side length of the square field
    #[arg(long, default_value = "600")]
    pub field_size: u32,

    #[arg(long, default_value = "2")]
    pub ball_count: u32,

    /// Points needed to win
    #[arg(long, default_value = "10")]
    pub target_score: u32,

    /// Game length limit in seconds
    #[arg(long, default_value = "300")]
    pub time_limit_secs: u64,

    #[arg(long, default_value = "5.0")]
    pub paddle_speed: f32,

    #[arg(long, default_value = "3.0")]
    pub ball_speed: f32,
}

/// Everything needed to bind and run one server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`. Port 0 picks a free port.
    pub addr: String,
    pub tick_rate: u32,
    pub settings: GameSettings,
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            tick_rate: TICK_RATE,
            settings: GameSettings::default(),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: format!("{}:{}", args.host, args.port),
            tick_rate: args.tick_rate,
            settings: GameSettings {
                field_size: args.field_size,
                ball_count: args.ball_count,
                target_score: args.target_score,
                time_limit: Duration::from_secs(args.time_limit_secs),
                paddle_speed: args.paddle_speed,
                ball_speed: args.ball_speed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_game_settings() {
        let args = Args::try_parse_from(["pong-server"]).unwrap();
        let config = ServerConfig::from(args);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.tick_duration(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::try_parse_from([
            "pong-server",
            "-H",
            "0.0.0.0",
            "--port",
            "9000",
            "--tick-rate",
            "30",
            "--ball-count",
            "4",
            "--target-score",
            "3",
            "--time-limit-secs",
            "60",
        ])
        .unwrap();
        let config = ServerConfig::from(args);

        assert_eq!(config.addr, "0.0.0.0:9000");
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.settings.ball_count, 4);
        assert_eq!(config.settings.target_score, 3);
        assert_eq!(config.settings.time_limit, Duration::from_secs(60));
        assert_eq!(config.settings.field_size, 600);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Args::try_parse_from(["pong-server", "--port", "99999"]).is_err());
    }
}

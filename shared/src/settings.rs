use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters fixed for the lifetime of one game, chosen at session start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Side length of the square field.
    pub field_size: u32,
    pub ball_count: u32,
    /// First player to reach this score wins.
    pub target_score: u32,
    /// Serialized as whole milliseconds.
    #[serde(with = "duration_millis")]
    pub time_limit: Duration,
    pub paddle_speed: f32,
    pub ball_speed: f32,
}

impl GameSettings {
    pub fn field_extent(&self) -> f32 {
        self.field_size as f32
    }

    pub fn center(&self) -> (f32, f32) {
        let half = self.field_extent() / 2.0;
        (half, half)
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            field_size: 600,
            ball_count: 2,
            target_score: 10,
            time_limit: Duration::from_secs(5 * 60),
            paddle_speed: 5.0,
            ball_speed: 3.0,
        }
    }
}

/// Per-player point counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    pub player1: u32,
    pub player2: u32,
}

impl Scores {
    /// Adds a point for `player_id`. Ids other than 1 and 2 are ignored and
    /// reported as `false`.
    pub fn record(&mut self, player_id: u32) -> bool {
        match player_id {
            1 => self.player1 += 1,
            2 => self.player2 += 1,
            _ => return false,
        }
        true
    }

    pub fn get(&self, player_id: u32) -> u32 {
        match player_id {
            1 => self.player1,
            2 => self.player2,
            _ => 0,
        }
    }

    /// Player with the strictly higher score, 0 on a tie.
    pub fn leader(&self) -> u32 {
        use std::cmp::Ordering;
        match self.player1.cmp(&self.player2) {
            Ordering::Greater => 1,
            Ordering::Less => 2,
            Ordering::Equal => 0,
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

use log::debug;
use pong_shared::{
    Ball, EndMessage, GameSettings, JoinMessage, Paddle, PaddleSlot, Scores, StartMessage,
    StateMessage,
};
use std::time::Duration;

/// Read-only copy of the server's world, rebuilt from received messages.
///
/// Nothing here is ever simulated locally: every field is overwritten by the
/// next message from the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirroredState {
    /// Assigned by the `join` message.
    pub player_id: Option<u32>,
    pub player_name: Option<String>,
    /// Settings of the current or last game.
    pub settings: Option<GameSettings>,
    pub balls: Vec<Ball>,
    pub paddles: Vec<Paddle>,
    pub scores: Scores,
    pub game_over: bool,
    pub winner: u32,
    pub game_time: Duration,
    pub remaining: Duration,
    /// True between `start` and `end`.
    pub started: bool,
}

impl MirroredState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the seat the server assigned to this connection.
    pub fn apply_join(&mut self, join: &JoinMessage) {
        self.player_id = Some(join.player_id);
        self.player_name = Some(join.player_name.clone());
    }

    /// Clears the previous game and adopts the new game's settings.
    ///
    /// Balls and paddles stay empty until the first `state` arrives.
    pub fn apply_start(&mut self, start: &StartMessage) {
        self.settings = Some(start.settings);
        self.balls.clear();
        self.paddles.clear();
        self.scores = Scores::default();
        self.game_over = false;
        self.winner = 0;
        self.game_time = Duration::ZERO;
        self.remaining = start.settings.time_limit;
        self.started = true;
    }

    /// Replaces balls, paddles, scores and timing with the server's latest
    /// snapshot.
    pub fn apply_state(&mut self, state: &StateMessage) {
        if !self.started {
            debug!("State received before start");
        }
        self.balls.clone_from(&state.balls);
        self.paddles.clone_from(&state.paddles);
        self.scores = state.scores;
        self.game_over = state.game_over;
        self.winner = state.winner;
        self.game_time = Duration::from_millis(state.game_time);
        self.remaining = Duration::from_millis(state.remaining);
    }

    /// Marks the game finished with the final result. Also used for aborted
    /// games, which report winner 0 and zero scores.
    pub fn apply_end(&mut self, end: &EndMessage) {
        self.game_over = true;
        self.winner = end.winner;
        self.scores = end.final_scores;
        self.game_time = Duration::from_millis(end.game_time);
        self.started = false;
    }

    /// This player's `(vertical, horizontal)` paddles as last reported.
    pub fn own_paddles(&self) -> Option<(Paddle, Paddle)> {
        let (vertical, horizontal) = PaddleSlot::for_player(self.player_id?)?;
        let find = |slot: PaddleSlot| self.paddles.iter().find(|p| p.slot == slot).copied();
        Some((find(vertical)?, find(horizontal)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_message() -> StateMessage {
        let mut rng = StdRng::seed_from_u64(31);
        StateMessage {
            balls: vec![Ball::new(300.0, 300.0, 3.0, &mut rng)],
            paddles: PaddleSlot::ALL
                .iter()
                .map(|slot| Paddle::new(*slot, 600.0, 5.0))
                .collect(),
            scores: Scores {
                player1: 4,
                player2: 2,
            },
            game_over: false,
            winner: 0,
            game_time: 12_500,
            remaining: 287_500,
        }
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = MirroredState::new();
        assert_eq!(state.player_id, None);
        assert!(!state.started);
        assert!(state.balls.is_empty());
        assert!(state.own_paddles().is_none());
    }

    #[test]
    fn test_join_then_start() {
        let mut state = MirroredState::new();
        state.apply_join(&JoinMessage {
            player_id: 2,
            player_name: "Player 2".to_string(),
        });
        state.apply_start(&StartMessage {
            settings: GameSettings::default(),
        });

        assert_eq!(state.player_id, Some(2));
        assert_eq!(state.player_name.as_deref(), Some("Player 2"));
        assert!(state.started);
        assert_eq!(state.remaining, Duration::from_secs(300));
        assert_eq!(state.settings.map(|s| s.field_size), Some(600));
    }

    #[test]
    fn test_apply_state_overwrites_world() {
        let mut state = MirroredState::new();
        state.apply_start(&StartMessage {
            settings: GameSettings::default(),
        });
        state.apply_state(&state_message());

        assert_eq!(state.balls.len(), 1);
        assert_eq!(state.paddles.len(), 4);
        assert_eq!(state.scores.get(1), 4);
        assert_eq!(state.game_time, Duration::from_millis(12_500));
        assert_eq!(state.remaining, Duration::from_millis(287_500));
    }

    #[test]
    fn test_own_paddles() {
        let mut state = MirroredState::new();
        state.apply_state(&state_message());
        assert!(state.own_paddles().is_none());

        state.player_id = Some(1);
        let (vertical, horizontal) = state.own_paddles().unwrap();
        assert_eq!(vertical.slot, PaddleSlot::Left);
        assert_eq!(horizontal.slot, PaddleSlot::Top);

        state.player_id = Some(2);
        let (vertical, horizontal) = state.own_paddles().unwrap();
        assert_eq!(vertical.slot, PaddleSlot::Right);
        assert_eq!(horizontal.slot, PaddleSlot::Bottom);
    }

    #[test]
    fn test_end_freezes_result() {
        let mut state = MirroredState::new();
        state.apply_start(&StartMessage {
            settings: GameSettings::default(),
        });
        state.apply_state(&state_message());
        state.apply_end(&EndMessage {
            winner: 1,
            final_scores: Scores {
                player1: 10,
                player2: 2,
            },
            game_time: 61_000,
        });

        assert!(state.game_over);
        assert!(!state.started);
        assert_eq!(state.winner, 1);
        assert_eq!(state.scores.get(1), 10);
        assert_eq!(state.game_time, Duration::from_secs(61));
    }
}

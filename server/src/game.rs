//! Authoritative world state and its locked handle.
//!
//! `WorldState` is plain data with the rules applied to it; `World` wraps it
//! in a single reader/writer lock and is the only way other tasks touch it.

use log::info;
use pong_shared::{
    Ball, EndMessage, GameSettings, Paddle, PaddleSlot, Scores, StateMessage,
};
use rand::Rng;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, RwLockWriteGuard};

#[derive(Debug, Clone)]
pub struct WorldState {
    pub balls: Vec<Ball>,
    pub paddles: Vec<Paddle>,
    pub scores: Scores,
    pub game_over: bool,
    /// 0 while running or after a tie.
    pub winner: u32,
    pub start_time: Instant,
    /// Set exactly when `game_over` becomes true.
    pub end_time: Option<Instant>,
    pub settings: GameSettings,
}

impl WorldState {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            balls: Vec::new(),
            paddles: Vec::new(),
            scores: Scores::default(),
            game_over: false,
            winner: 0,
            start_time: Instant::now(),
            end_time: None,
            settings,
        }
    }

    /// Resets the world for a new game starting at `now`.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R, now: Instant) {
        let field = self.settings.field_extent();
        let (cx, cy) = self.settings.center();

        self.paddles = PaddleSlot::ALL
            .iter()
            .map(|slot| Paddle::new(*slot, field, self.settings.paddle_speed))
            .collect();

        let ball_speed = self.settings.ball_speed;
        self.balls = (0..self.settings.ball_count)
            .map(|_| Ball::new(cx, cy, ball_speed, rng))
            .collect();

        self.scores = Scores::default();
        self.game_over = false;
        self.winner = 0;
        self.start_time = now;
        self.end_time = None;

        info!(
            "World initialized: {} balls, {} paddles, field {}",
            self.balls.len(),
            self.paddles.len(),
            self.settings.field_size
        );
    }

    /// Overwrites the position of the paddle at `(player_id, slot)`.
    /// Returns false if no such paddle exists.
    pub fn set_paddle_position(&mut self, player_id: u32, slot: PaddleSlot, x: f32, y: f32) -> bool {
        match self
            .paddles
            .iter_mut()
            .find(|paddle| paddle.player_id == player_id && paddle.slot == slot)
        {
            Some(paddle) => {
                paddle.x = x;
                paddle.y = y;
                true
            }
            None => false,
        }
    }

    pub fn record_score(&mut self, player_id: u32) {
        self.scores.record(player_id);
    }

    /// Ends the game if a player reached the target score or the time limit
    /// ran out. Returns true only on the transition into game over.
    pub fn check_termination(&mut self, now: Instant) -> bool {
        if self.game_over {
            return false;
        }

        let target = self.settings.target_score;
        let winner = if self.scores.player1 >= target {
            1
        } else if self.scores.player2 >= target {
            2
        } else if now.saturating_duration_since(self.start_time) >= self.settings.time_limit {
            self.scores.leader()
        } else {
            return false;
        };

        self.game_over = true;
        self.winner = winner;
        self.end_time = Some(now);
        true
    }

    /// Game time so far, frozen at the end time once the game is over.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.end_time
            .unwrap_or(now)
            .saturating_duration_since(self.start_time)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.settings.time_limit.saturating_sub(self.elapsed(now))
    }

    pub fn snapshot(&self, now: Instant) -> GameSnapshot {
        GameSnapshot {
            balls: self.balls.clone(),
            paddles: self.paddles.clone(),
            scores: self.scores,
            game_over: self.game_over,
            winner: self.winner,
            game_time: self.elapsed(now),
            remaining: self.remaining(now),
            settings: self.settings,
        }
    }
}

/// Independent copy of the world taken under the read lock.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub balls: Vec<Ball>,
    pub paddles: Vec<Paddle>,
    pub scores: Scores,
    pub game_over: bool,
    pub winner: u32,
    pub game_time: Duration,
    pub remaining: Duration,
    pub settings: GameSettings,
}

impl GameSnapshot {
    pub fn to_state_message(&self) -> StateMessage {
        StateMessage {
            balls: self.balls.clone(),
            paddles: self.paddles.clone(),
            scores: self.scores,
            game_over: self.game_over,
            winner: self.winner,
            game_time: millis(self.game_time),
            remaining: millis(self.remaining),
        }
    }

    pub fn to_end_message(&self) -> EndMessage {
        EndMessage {
            winner: self.winner,
            final_scores: self.scores,
            game_time: millis(self.game_time),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Shared handle to the world. Reads take a full snapshot under the read
/// lock; every mutation takes the write lock.
#[derive(Debug)]
pub struct World {
    state: RwLock<WorldState>,
}

impl World {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            state: RwLock::new(WorldState::new(settings)),
        }
    }

    /// Resets the world for a new game starting now. The whole reset happens
    /// under one write lock.
    pub async fn initialize<R: Rng + ?Sized>(&self, rng: &mut R) {
        let mut state = self.state.write().await;
        state.initialize(rng, Instant::now());
    }

    /// Takes an independent copy of the whole world under the read lock.
    ///
    /// Balls, paddles, scores and flags all come from the same instant; a
    /// tick or input landing afterwards does not change the copy.
    pub async fn snapshot(&self) -> GameSnapshot {
        let state = self.state.read().await;
        state.snapshot(Instant::now())
    }

    /// Moves both of `player_id`'s paddles from one input message: the
    /// vertical paddle to `paddle1_y`, the horizontal paddle to `paddle2_x`.
    /// Positions are trusted as sent.
    pub async fn apply_input(&self, player_id: u32, paddle1_y: f32, paddle2_x: f32) -> bool {
        let Some((vertical, horizontal)) = PaddleSlot::for_player(player_id) else {
            return false;
        };

        let mut state = self.state.write().await;
        let field = state.settings.field_extent();

        let (x, y) = vertical.origin(field, paddle1_y);
        let moved_vertical = state.set_paddle_position(player_id, vertical, x, y);

        let (x, y) = horizontal.origin(field, paddle2_x);
        let moved_horizontal = state.set_paddle_position(player_id, horizontal, x, y);

        moved_vertical && moved_horizontal
    }

    /// Exclusive access for the simulation step.
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, WorldState> {
        self.state.write().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn initialized_state() -> (WorldState, Instant) {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = WorldState::new(GameSettings::default());
        let now = Instant::now();
        state.initialize(&mut rng, now);
        (state, now)
    }

    #[test]
    fn test_initialize_creates_entities() {
        let (state, now) = initialized_state();

        assert_eq!(state.balls.len(), 2);
        assert_eq!(state.paddles.len(), 4);
        for ball in &state.balls {
            assert_eq!((ball.x, ball.y), (300.0, 300.0));
        }

        let slots: Vec<PaddleSlot> = state.paddles.iter().map(|p| p.slot).collect();
        assert_eq!(slots, PaddleSlot::ALL.to_vec());
        assert_eq!(state.paddles.iter().filter(|p| p.player_id == 1).count(), 2);
        assert_eq!(state.paddles.iter().filter(|p| p.player_id == 2).count(), 2);

        assert_eq!(state.scores, Scores::default());
        assert!(!state.game_over);
        assert_eq!(state.winner, 0);
        assert_eq!(state.start_time, now);
        assert!(state.end_time.is_none());
    }

    #[test]
    fn test_initialize_resets_finished_game() {
        let (mut state, now) = initialized_state();
        state.scores.player1 = 10;
        assert!(state.check_termination(now));

        let mut rng = StdRng::seed_from_u64(12);
        state.initialize(&mut rng, now);
        assert!(!state.game_over);
        assert_eq!(state.winner, 0);
        assert!(state.end_time.is_none());
        assert_eq!(state.scores, Scores::default());
    }

    #[test]
    fn test_set_paddle_position() {
        let (mut state, _) = initialized_state();

        assert!(state.set_paddle_position(2, PaddleSlot::Right, 580.0, 10.0));
        let right = state.paddles.iter().find(|p| p.slot == PaddleSlot::Right).unwrap();
        assert_eq!((right.x, right.y), (580.0, 10.0));

        // Player 1 does not own the right paddle.
        assert!(!state.set_paddle_position(1, PaddleSlot::Right, 0.0, 0.0));
        let right = state.paddles.iter().find(|p| p.slot == PaddleSlot::Right).unwrap();
        assert_eq!((right.x, right.y), (580.0, 10.0));
    }

    #[test]
    fn test_set_paddle_position_before_initialize_is_noop() {
        let mut state = WorldState::new(GameSettings::default());
        assert!(!state.set_paddle_position(1, PaddleSlot::Left, 0.0, 10.0));
    }

    #[test]
    fn test_record_score() {
        let (mut state, _) = initialized_state();
        for _ in 0..3 {
            state.record_score(2);
        }
        assert_eq!(state.scores.player2, 3);
        assert_eq!(state.scores.player1, 0);
    }

    #[test]
    fn test_termination_by_score() {
        let (mut state, now) = initialized_state();
        state.scores.player2 = 9;
        assert!(!state.check_termination(now));
        assert!(state.end_time.is_none());

        state.scores.player2 = 10;
        assert!(state.check_termination(now));
        assert!(state.game_over);
        assert_eq!(state.winner, 2);
        assert_eq!(state.end_time, Some(now));
    }

    #[test]
    fn test_termination_by_time_limit() {
        let (mut state, now) = initialized_state();
        let limit = state.settings.time_limit;

        state.scores.player1 = 4;
        state.scores.player2 = 6;
        assert!(!state.check_termination(now + limit - Duration::from_millis(1)));
        assert!(state.check_termination(now + limit));
        assert_eq!(state.winner, 2);
    }

    #[test]
    fn test_termination_tie() {
        let (mut state, now) = initialized_state();
        state.scores.player1 = 3;
        state.scores.player2 = 3;
        let later = now + state.settings.time_limit + Duration::from_secs(1);
        assert!(state.check_termination(later));
        assert!(state.game_over);
        assert_eq!(state.winner, 0);
        assert_eq!(state.end_time, Some(later));
    }

    #[test]
    fn test_termination_is_idempotent() {
        let (mut state, now) = initialized_state();
        state.scores.player1 = 10;
        assert!(state.check_termination(now));

        state.scores.player2 = 12;
        let later = now + Duration::from_secs(30);
        assert!(!state.check_termination(later));
        assert_eq!(state.winner, 1);
        assert_eq!(state.end_time, Some(now));
    }

    #[test]
    fn test_elapsed_freezes_at_end() {
        let (mut state, now) = initialized_state();
        let end = now + Duration::from_secs(42);
        state.scores.player1 = 10;
        state.check_termination(end);

        let much_later = end + Duration::from_secs(100);
        assert_eq!(state.elapsed(much_later), Duration::from_secs(42));
        assert_eq!(state.remaining(much_later), Duration::from_secs(258));
    }

    #[test]
    fn test_snapshot_messages() {
        let (mut state, now) = initialized_state();
        state.scores.player1 = 5;
        let snapshot = state.snapshot(now + Duration::from_millis(1500));

        let message = snapshot.to_state_message();
        assert_eq!(message.balls.len(), 2);
        assert_eq!(message.paddles.len(), 4);
        assert_eq!(message.scores.player1, 5);
        assert_eq!(message.game_time, 1500);
        assert_eq!(message.remaining, 298_500);

        let end = snapshot.to_end_message();
        assert_eq!(end.final_scores.player1, 5);
        assert_eq!(end.game_time, 1500);
    }

    #[tokio::test]
    async fn test_snapshot_is_independent() {
        let world = World::new(GameSettings::default());
        let mut rng = StdRng::seed_from_u64(13);
        world.initialize(&mut rng).await;

        let mut snapshot = world.snapshot().await;
        snapshot.balls[0].x = -50.0;
        snapshot.paddles.clear();

        let fresh = world.snapshot().await;
        assert_eq!(fresh.balls[0].x, 300.0);
        assert_eq!(fresh.paddles.len(), 4);
    }

    #[tokio::test]
    async fn test_apply_input_moves_only_senders_paddles() {
        let world = World::new(GameSettings::default());
        let mut rng = StdRng::seed_from_u64(14);
        world.initialize(&mut rng).await;

        assert!(world.apply_input(2, 120.0, 40.0).await);

        let snapshot = world.snapshot().await;
        let find = |slot: PaddleSlot| *snapshot.paddles.iter().find(|p| p.slot == slot).unwrap();

        assert_eq!((find(PaddleSlot::Right).x, find(PaddleSlot::Right).y), (580.0, 120.0));
        assert_eq!((find(PaddleSlot::Bottom).x, find(PaddleSlot::Bottom).y), (40.0, 580.0));
        assert_eq!((find(PaddleSlot::Left).x, find(PaddleSlot::Left).y), (0.0, 250.0));
        assert_eq!((find(PaddleSlot::Top).x, find(PaddleSlot::Top).y), (250.0, 0.0));
    }

    #[tokio::test]
    async fn test_apply_input_unknown_player() {
        let world = World::new(GameSettings::default());
        let mut rng = StdRng::seed_from_u64(15);
        world.initialize(&mut rng).await;
        assert!(!world.apply_input(3, 10.0, 10.0).await);
    }

    #[test]
    fn test_world_entry_points_from_sync_code() {
        let world = World::new(GameSettings::default());
        let mut rng = StdRng::seed_from_u64(16);
        tokio_test::block_on(world.initialize(&mut rng));

        tokio_test::block_on(world.write()).record_score(1);
        tokio_test::block_on(world.write()).record_score(1);
        assert!(tokio_test::block_on(world.apply_input(2, 120.0, 240.0)));

        let snapshot = tokio_test::block_on(world.snapshot());
        assert_eq!(snapshot.scores.player1, 2);
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.settings.target_score, 10);
        let right = snapshot.paddles.iter().find(|p| p.slot == PaddleSlot::Right);
        assert_eq!(right.map(|p| p.y), Some(120.0));
    }
}

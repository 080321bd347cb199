//! Fixed-rate simulation controller.

use crate::game::{World, WorldState};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The controller is stopped.
    Idle,
    /// Called before the tick interval elapsed; nothing changed.
    Skipped,
    Advanced,
    /// This tick ended the game. The controller is now stopped.
    Ended,
}

/// Advances the world once per tick interval and stops itself when the game
/// ends. Safe to call from a faster loop: early calls are no-ops.
pub struct Simulation {
    world: Arc<World>,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    running: bool,
    tick: u64,
    rng: StdRng,
}

impl Simulation {
    /// Creates a stopped controller for `world` ticking `tick_rate` times a
    /// second, with an entropy-seeded RNG.
    pub fn new(world: Arc<World>, tick_rate: u32) -> Self {
        Self::with_rng(world, tick_rate, StdRng::from_entropy())
    }

    /// Same as `new` with a caller-supplied RNG. A tick rate of 0 is
    /// treated as 1.
    pub fn with_rng(world: Arc<World>, tick_rate: u32, rng: StdRng) -> Self {
        Self {
            world,
            tick_interval: Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1))),
            last_tick: None,
            running: false,
            tick: 0,
            rng,
        }
    }

    /// Initializes the world and starts ticking. The first tick is due one
    /// interval from now.
    pub async fn start(&mut self) {
        self.world.initialize(&mut self.rng).await;
        self.running = true;
        self.tick = 0;
        self.last_tick = Some(Instant::now());
        info!("Simulation started at {:.0}Hz", 1.0 / self.tick_interval.as_secs_f64());
    }

    /// Stops ticking. The world keeps its last state until the next `start`.
    pub fn stop(&mut self) {
        if self.running {
            info!("Simulation stopped after {} ticks", self.tick);
        }
        self.running = false;
    }

    /// Ticks advanced since the last `start`.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Runs one tick if one is due by the monotonic clock.
    ///
    /// Returns `Idle` when stopped and `Skipped` when called early. On
    /// `Ended` the world holds the final result and the controller has
    /// already stopped itself.
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Runs one tick as of `now`, if one is due.
    pub async fn tick_at(&mut self, now: Instant) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        if let Some(last) = self.last_tick {
            let due = last + self.tick_interval;
            if now < due {
                return TickOutcome::Skipped;
            }
            // Stay on the fixed schedule unless more than a whole tick behind.
            self.last_tick = Some(if now - due < self.tick_interval {
                due
            } else {
                now
            });
        } else {
            self.last_tick = Some(now);
        }

        let mut state = self.world.write().await;
        step(&mut state, &mut self.rng);
        self.tick += 1;

        if state.check_termination(now) {
            self.running = false;
            info!(
                "Game over after {} ticks: winner {} ({} - {})",
                self.tick, state.winner, state.scores.player1, state.scores.player2
            );
            return TickOutcome::Ended;
        }

        TickOutcome::Advanced
    }
}

/// Moves every ball one tick and resolves collisions.
///
/// A ball that hits a wall scores for the wall's opponent, is reset to the
/// center and skips paddle checks this tick. Other balls are tested against
/// the paddles in slot order, stopping at the first hit.
pub fn step<R: Rng + ?Sized>(state: &mut WorldState, rng: &mut R) {
    let field = state.settings.field_extent();
    let mut scorers = Vec::new();

    for ball in state.balls.iter_mut() {
        ball.update();

        if let Some(wall) = ball.check_wall_collision(field) {
            let player = wall.scoring_player();
            debug!("Ball hit {:?} wall, point for player {}", wall, player);
            scorers.push(player);
            ball.reset(field, rng);
            continue;
        }

        for paddle in &state.paddles {
            if ball.check_paddle_collision(paddle, rng) {
                break;
            }
        }
    }

    for player in scorers {
        state.record_score(player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use pong_shared::{Ball, GameSettings, PaddleSlot, BALL_RADIUS};

    fn ball(x: f32, y: f32, dx: f32, dy: f32) -> Ball {
        Ball {
            x,
            y,
            dx,
            dy,
            radius: BALL_RADIUS,
            speed: 3.0,
        }
    }

    async fn started(settings: GameSettings) -> (Arc<World>, Simulation, Instant) {
        let world = Arc::new(World::new(settings));
        let mut simulation = Simulation::with_rng(Arc::clone(&world), 60, StdRng::seed_from_u64(21));
        simulation.start().await;
        let start = simulation.last_tick.unwrap();
        (world, simulation, start)
    }

    /// Instant of the `n`th tick after `start`.
    fn at(start: Instant, n: u32) -> Instant {
        start + Duration::from_secs_f64(f64::from(n) / 60.0) + Duration::from_micros(10)
    }

    #[tokio::test]
    async fn test_tick_requires_start() {
        let world = Arc::new(World::new(GameSettings::default()));
        let mut simulation = Simulation::new(world, 60);
        assert!(!simulation.running);
        assert_eq!(simulation.tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_tick_is_gated_by_interval() {
        let (_world, mut simulation, start) = started(GameSettings::default()).await;

        assert_eq!(simulation.tick_at(start).await, TickOutcome::Skipped);
        assert_eq!(
            simulation.tick_at(start + Duration::from_millis(5)).await,
            TickOutcome::Skipped
        );
        assert_eq!(simulation.tick_at(at(start, 1)).await, TickOutcome::Advanced);
        assert_eq!(simulation.tick_at(at(start, 1)).await, TickOutcome::Skipped);
        assert_eq!(simulation.tick_at(at(start, 2)).await, TickOutcome::Advanced);
        assert_eq!(simulation.tick_count(), 2);
    }

    #[tokio::test]
    async fn test_tick_advances_balls() {
        let (world, mut simulation, start) = started(GameSettings::default()).await;
        {
            let mut state = world.write().await;
            state.balls = vec![ball(300.0, 300.0, 3.0, 0.0)];
        }

        assert_eq!(simulation.tick_at(at(start, 1)).await, TickOutcome::Advanced);
        let snapshot = world.snapshot().await;
        assert_eq!((snapshot.balls[0].x, snapshot.balls[0].y), (303.0, 300.0));
    }

    #[test]
    fn test_step_scores_wall_hits() {
        let mut rng = StdRng::seed_from_u64(22);
        let mut state = WorldState::new(GameSettings::default());
        state.initialize(&mut rng, Instant::now());
        state.balls = vec![
            // Left wall, away from the left paddle.
            ball(10.0, 100.0, -3.0, 0.0),
            // Bottom wall.
            ball(100.0, 590.0, 0.0, 3.0),
            // Right wall.
            ball(590.0, 500.0, 3.0, 0.0),
            // Top wall.
            ball(500.0, 10.0, 0.0, -3.0),
        ];

        step(&mut state, &mut rng);

        assert_eq!(state.scores.player1, 2);
        assert_eq!(state.scores.player2, 2);
        for b in &state.balls {
            assert_eq!((b.x, b.y), (300.0, 300.0));
            assert_approx_eq!(b.velocity_magnitude(), 3.0, 1e-4);
        }
    }

    #[test]
    fn test_step_repeated_wall_hits_credit_one_player() {
        let mut rng = StdRng::seed_from_u64(23);
        let mut state = WorldState::new(GameSettings::default());
        state.initialize(&mut rng, Instant::now());

        for _ in 0..5 {
            state.balls = vec![ball(592.0, 100.0, 3.0, 0.0)];
            step(&mut state, &mut rng);
        }

        assert_eq!(state.scores.player1, 5);
        assert_eq!(state.scores.player2, 0);
    }

    #[test]
    fn test_step_bounces_off_paddle() {
        let mut rng = StdRng::seed_from_u64(24);
        let mut state = WorldState::new(GameSettings::default());
        state.initialize(&mut rng, Instant::now());
        // Heading into the left paddle (x 0..20, y 250..350).
        state.balls = vec![ball(30.0, 290.0, -3.0, 0.0)];

        step(&mut state, &mut rng);

        let b = state.balls[0];
        assert!(b.dx > 0.0);
        assert_approx_eq!(b.velocity_magnitude(), 3.0, 1e-4);
        assert_eq!(state.scores, Default::default());
    }

    #[test]
    fn test_step_skips_paddles_for_reset_ball() {
        let mut rng = StdRng::seed_from_u64(25);
        let mut state = WorldState::new(GameSettings::default());
        state.initialize(&mut rng, Instant::now());
        // Park a paddle over the field center so a freshly reset ball would hit it.
        let (cx, cy) = state.settings.center();
        assert!(state.set_paddle_position(1, PaddleSlot::Left, cx - 10.0, cy - 50.0));
        state.balls = vec![ball(592.0, 100.0, 3.0, 0.0)];

        step(&mut state, &mut rng);
        let b = state.balls[0];
        assert_eq!((b.x, b.y), (cx, cy));
        assert_eq!(state.scores.player1, 1);
    }

    #[tokio::test]
    async fn test_game_ends_on_tick_reaching_target() {
        let (world, mut simulation, start) = started(GameSettings::default()).await;
        {
            let mut state = world.write().await;
            state.scores.player1 = 8;
            state.balls = vec![ball(590.0, 100.0, 3.0, 0.0)];
        }

        assert_eq!(simulation.tick_at(at(start, 1)).await, TickOutcome::Advanced);
        {
            let mut state = world.write().await;
            assert_eq!(state.scores.player1, 9);
            assert!(!state.game_over);
            assert!(state.end_time.is_none());
            state.balls = vec![ball(590.0, 100.0, 3.0, 0.0)];
        }

        assert_eq!(simulation.tick_at(at(start, 2)).await, TickOutcome::Ended);
        assert!(!simulation.running);

        let snapshot = world.snapshot().await;
        assert_eq!(snapshot.scores.player1, 10);
        assert!(snapshot.game_over);
        assert_eq!(snapshot.winner, 1);
        assert!(world.write().await.end_time.is_some());

        // Stopped: further ticks leave the world alone.
        assert_eq!(simulation.tick_at(at(start, 3)).await, TickOutcome::Idle);
        assert_eq!(world.snapshot().await.balls, snapshot.balls);
    }

    #[tokio::test]
    async fn test_game_ends_on_time_limit() {
        let settings = GameSettings {
            time_limit: Duration::from_secs(1),
            ..GameSettings::default()
        };
        let (world, mut simulation, start) = started(settings).await;

        assert_eq!(simulation.tick_at(at(start, 1)).await, TickOutcome::Advanced);
        let outcome = simulation.tick_at(start + Duration::from_secs(2)).await;
        assert_eq!(outcome, TickOutcome::Ended);

        let snapshot = world.snapshot().await;
        assert!(snapshot.game_over);
        assert_eq!(snapshot.winner, snapshot.scores.leader());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (world, mut simulation, _) = started(GameSettings::default()).await;
        world.write().await.record_score(2);
        simulation.stop();
        assert_eq!(simulation.tick().await, TickOutcome::Idle);

        simulation.start().await;
        assert!(simulation.running);
        assert_eq!(world.snapshot().await.scores, Default::default());
    }
}

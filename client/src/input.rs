//! Paddle movement on the client side and the capability used to send it.

use crate::game::MirroredState;
use pong_shared::{Ball, GameSettings, Paddle, PaddleSlot};

/// Accepts absolute paddle positions for the local player.
///
/// `paddle1_y` positions the player's vertical paddle, `paddle2_x` its
/// horizontal paddle. Returns false if the input was dropped.
pub trait InputSink {
    fn submit_input(&self, paddle1_y: f32, paddle2_x: f32) -> bool;
}

/// Accepts and discards every input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInput;

impl InputSink for NoopInput {
    fn submit_input(&self, _paddle1_y: f32, _paddle2_x: f32) -> bool {
        true
    }
}

/// Turns movement deltas into paddle positions for one player.
///
/// Keeps local copies of the player's two paddles so each delta moves only
/// along the paddle's own axis and stays inside the field.
#[derive(Debug, Clone)]
pub struct PaddleSteering {
    vertical: Paddle,
    horizontal: Paddle,
    field_size: f32,
}

impl PaddleSteering {
    /// Paddles for `player_id` at their starting positions.
    pub fn new(player_id: u32, settings: &GameSettings) -> Option<Self> {
        let (vertical, horizontal) = PaddleSlot::for_player(player_id)?;
        let field_size = settings.field_extent();
        Some(Self {
            vertical: Paddle::new(vertical, field_size, settings.paddle_speed),
            horizontal: Paddle::new(horizontal, field_size, settings.paddle_speed),
            field_size,
        })
    }

    /// Picks up the paddles where the server last reported them.
    pub fn from_state(state: &MirroredState) -> Option<Self> {
        let settings = state.settings?;
        let (vertical, horizontal) = state.own_paddles()?;
        Some(Self {
            vertical,
            horizontal,
            field_size: settings.field_extent(),
        })
    }

    /// Applies a movement delta and submits the new positions if either
    /// paddle moved. `dy` drives the vertical paddle, `dx` the horizontal one.
    pub fn steer<S: InputSink + ?Sized>(&mut self, dx: f32, dy: f32, sink: &S) -> bool {
        let before = (self.vertical.along(), self.horizontal.along());

        self.vertical.move_by(dx, dy, self.field_size);
        self.horizontal.move_by(dx, dy, self.field_size);

        if (self.vertical.along(), self.horizontal.along()) == before {
            return false;
        }

        sink.submit_input(self.vertical.y, self.horizontal.x);
        true
    }

    pub fn vertical(&self) -> &Paddle {
        &self.vertical
    }

    pub fn horizontal(&self) -> &Paddle {
        &self.horizontal
    }
}

/// Movement delta that brings each paddle toward the ball nearest to it.
///
/// Returns `(dx, dy)` in units of paddle speed, each within `-1.0..=1.0`.
pub fn chase_nearest_ball(balls: &[Ball], steering: &PaddleSteering) -> (f32, f32) {
    let nearest = |paddle: &Paddle| {
        let (cx, cy) = paddle.center();
        balls
            .iter()
            .min_by(|a, b| a.distance_sq_to(cx, cy).total_cmp(&b.distance_sq_to(cx, cy)))
            .copied()
    };

    let towards = |target: f32, current: f32, speed: f32| {
        if speed <= 0.0 {
            0.0
        } else {
            ((target - current) / speed).clamp(-1.0, 1.0)
        }
    };

    let vertical = steering.vertical();
    let dy = nearest(vertical)
        .map(|ball| towards(ball.y, vertical.center().1, vertical.speed))
        .unwrap_or(0.0);

    let horizontal = steering.horizontal();
    let dx = nearest(horizontal)
        .map(|ball| towards(ball.x, horizontal.center().0, horizontal.speed))
        .unwrap_or(0.0);

    (dx, dy)
}

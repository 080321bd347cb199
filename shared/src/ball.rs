use crate::paddle::Paddle;
use crate::{BALL_RADIUS, PADDLE_DEFLECTION_JITTER};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Field edge a ball was reflected off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    /// Player credited when a ball reaches this wall. Left and top walls
    /// score for player 2, right and bottom walls for player 1.
    pub fn scoring_player(self) -> u32 {
        match self {
            Wall::Left | Wall::Top => 2,
            Wall::Right | Wall::Bottom => 1,
        }
    }
}

/// A ball moving at a fixed scalar speed. Velocity is in units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
    pub speed: f32,
}

impl Ball {
    /// Creates a ball at `(x, y)` heading in a uniformly random direction.
    pub fn new<R: Rng + ?Sized>(x: f32, y: f32, speed: f32, rng: &mut R) -> Self {
        let (dx, dy) = random_velocity(speed, rng);
        Self {
            x,
            y,
            dx,
            dy,
            radius: BALL_RADIUS,
            speed,
        }
    }

    /// Advances the position by one tick of velocity. Bounds are handled by
    /// `check_wall_collision`.
    pub fn update(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
    }

    /// Reflects the ball off the first breached edge, checked in the order
    /// left, right, top, bottom.
    ///
    /// The center is clamped to `radius` away from that edge and the matching
    /// velocity component flips sign. At most one edge is resolved per call.
    pub fn check_wall_collision(&mut self, field_size: f32) -> Option<Wall> {
        if self.x - self.radius <= 0.0 {
            self.x = self.radius;
            self.dx = -self.dx;
            return Some(Wall::Left);
        }

        if self.x + self.radius >= field_size {
            self.x = field_size - self.radius;
            self.dx = -self.dx;
            return Some(Wall::Right);
        }

        if self.y - self.radius <= 0.0 {
            self.y = self.radius;
            self.dy = -self.dy;
            return Some(Wall::Top);
        }

        if self.y + self.radius >= field_size {
            self.y = field_size - self.radius;
            self.dy = -self.dy;
            return Some(Wall::Bottom);
        }

        None
    }

    /// Bounces the ball off `paddle` if their bounding boxes overlap.
    ///
    /// Each velocity component is pointed away from the paddle's midpoint on
    /// that axis, jittered by up to `PADDLE_DEFLECTION_JITTER`, then the
    /// vector is rescaled to `speed`.
    pub fn check_paddle_collision<R: Rng + ?Sized>(&mut self, paddle: &Paddle, rng: &mut R) -> bool {
        let overlaps = self.x + self.radius >= paddle.x
            && self.x - self.radius <= paddle.x + paddle.width
            && self.y + self.radius >= paddle.y
            && self.y - self.radius <= paddle.y + paddle.height;

        if !overlaps {
            return false;
        }

        let (mid_x, mid_y) = paddle.center();
        self.dx = if self.x < mid_x {
            -self.dx.abs()
        } else {
            self.dx.abs()
        };
        self.dy = if self.y < mid_y {
            -self.dy.abs()
        } else {
            self.dy.abs()
        };

        self.dx += rng.gen_range(-PADDLE_DEFLECTION_JITTER..=PADDLE_DEFLECTION_JITTER);
        self.dy += rng.gen_range(-PADDLE_DEFLECTION_JITTER..=PADDLE_DEFLECTION_JITTER);

        let magnitude = self.velocity_magnitude();
        if magnitude > f32::EPSILON {
            self.dx = self.dx / magnitude * self.speed;
            self.dy = self.dy / magnitude * self.speed;
        } else {
            (self.dx, self.dy) = random_velocity(self.speed, rng);
        }

        true
    }

    /// Moves the ball back to the field center with a fresh random heading.
    pub fn reset<R: Rng + ?Sized>(&mut self, field_size: f32, rng: &mut R) {
        self.x = field_size / 2.0;
        self.y = field_size / 2.0;
        (self.dx, self.dy) = random_velocity(self.speed, rng);
    }

    pub fn velocity_magnitude(&self) -> f32 {
        self.dx.hypot(self.dy)
    }

    /// Squared distance from the ball center to `(x, y)`.
    pub fn distance_sq_to(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

fn random_velocity<R: Rng + ?Sized>(speed: f32, rng: &mut R) -> (f32, f32) {
    let angle = rng.gen_range(0.0..TAU);
    (angle.cos() * speed, angle.sin() * speed)
}

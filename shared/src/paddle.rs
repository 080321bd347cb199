use crate::error::InvalidSlot;
use crate::{PADDLE_LENGTH, PADDLE_THICKNESS};
use serde::{Deserialize, Serialize};

/// One of the four fixed mount points on the field perimeter.
///
/// Slots 1 and 3 travel along Y only, slots 2 and 4 along X only. On the
/// wire a slot is its integer id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PaddleSlot {
    Left = 1,
    Top = 2,
    Right = 3,
    Bottom = 4,
}

impl PaddleSlot {
    /// Fixed order used when testing a ball against the paddles.
    pub const ALL: [PaddleSlot; 4] = [
        PaddleSlot::Left,
        PaddleSlot::Top,
        PaddleSlot::Right,
        PaddleSlot::Bottom,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Player that owns the paddle mounted in this slot.
    pub fn owner(self) -> u32 {
        match self {
            PaddleSlot::Left | PaddleSlot::Top => 1,
            PaddleSlot::Right | PaddleSlot::Bottom => 2,
        }
    }

    /// The `(vertical, horizontal)` slot pair owned by `player_id`.
    pub fn for_player(player_id: u32) -> Option<(PaddleSlot, PaddleSlot)> {
        match player_id {
            1 => Some((PaddleSlot::Left, PaddleSlot::Top)),
            2 => Some((PaddleSlot::Right, PaddleSlot::Bottom)),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, PaddleSlot::Left | PaddleSlot::Right)
    }

    /// Width and height of a paddle in this slot.
    pub fn dimensions(self) -> (f32, f32) {
        if self.is_vertical() {
            (PADDLE_THICKNESS, PADDLE_LENGTH)
        } else {
            (PADDLE_LENGTH, PADDLE_THICKNESS)
        }
    }

    /// Top-left corner of a paddle in this slot placed `along` units down
    /// its axis of travel. The other coordinate is pinned to the slot's edge.
    pub fn origin(self, field_size: f32, along: f32) -> (f32, f32) {
        match self {
            PaddleSlot::Left => (0.0, along),
            PaddleSlot::Right => (field_size - PADDLE_THICKNESS, along),
            PaddleSlot::Top => (along, 0.0),
            PaddleSlot::Bottom => (along, field_size - PADDLE_THICKNESS),
        }
    }
}

impl TryFrom<u8> for PaddleSlot {
    type Error = InvalidSlot;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(PaddleSlot::Left),
            2 => Ok(PaddleSlot::Top),
            3 => Ok(PaddleSlot::Right),
            4 => Ok(PaddleSlot::Bottom),
            other => Err(InvalidSlot(other)),
        }
    }
}

impl From<PaddleSlot> for u8 {
    fn from(slot: PaddleSlot) -> Self {
        slot.id()
    }
}

/// A paddle rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paddle {
    pub player_id: u32,
    pub slot: PaddleSlot,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Paddle {
    /// Creates the paddle for `slot`, centred along its edge.
    pub fn new(slot: PaddleSlot, field_size: f32, speed: f32) -> Self {
        let (width, height) = slot.dimensions();
        let (x, y) = slot.origin(field_size, (field_size - PADDLE_LENGTH) / 2.0);

        Self {
            player_id: slot.owner(),
            slot,
            x,
            y,
            width,
            height,
            speed,
        }
    }

    /// Applies a speed-scaled movement delta along the slot's axis only.
    ///
    /// The delta on the other axis is ignored. The result is clamped so the
    /// whole rectangle stays inside the field.
    pub fn move_by(&mut self, dx: f32, dy: f32, field_size: f32) {
        if self.slot.is_vertical() {
            let max_y = (field_size - self.height).max(0.0);
            self.y = (self.y + dy * self.speed).clamp(0.0, max_y);
        } else {
            let max_x = (field_size - self.width).max(0.0);
            self.x = (self.x + dx * self.speed).clamp(0.0, max_x);
        }
    }

    /// Position of the paddle along its axis of travel.
    pub fn along(&self) -> f32 {
        if self.slot.is_vertical() {
            self.y
        } else {
            self.x
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

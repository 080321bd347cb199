//! Newline-delimited JSON wire protocol.
//!
//! Every message is one JSON object on its own line carrying a `type`
//! discriminator. Decoding reads the discriminator first and then decodes
//! the full record for that kind, so an unknown kind can be told apart from
//! a malformed payload of a known kind.

use crate::ball::Ball;
use crate::error::ProtocolError;
use crate::paddle::Paddle;
use crate::settings::{GameSettings, Scores};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Input,
    State,
    Join,
    Start,
    End,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Input => "input",
            MessageKind::State => "state",
            MessageKind::Join => "join",
            MessageKind::Start => "start",
            MessageKind::End => "end",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "input" => Some(MessageKind::Input),
            "state" => Some(MessageKind::State),
            "join" => Some(MessageKind::Join),
            "start" => Some(MessageKind::Start),
            "end" => Some(MessageKind::End),
            _ => None,
        }
    }
}

/// Client → server: absolute positions for the sender's two paddles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMessage {
    pub player_id: u32,
    /// Y of the sender's vertical paddle.
    #[serde(default, rename = "paddle1Y")]
    pub paddle1_y: f32,
    /// X of the sender's horizontal paddle.
    #[serde(default, rename = "paddle2X")]
    pub paddle2_x: f32,
}

/// Server → client: authoritative snapshot sent every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub balls: Vec<Ball>,
    pub paddles: Vec<Paddle>,
    #[serde(default)]
    pub scores: Scores,
    pub game_over: bool,
    pub winner: u32,
    /// Elapsed game time in milliseconds.
    pub game_time: u64,
    /// Milliseconds left before the time limit.
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinMessage {
    pub player_id: u32,
    pub player_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMessage {
    pub settings: GameSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndMessage {
    /// 0 for a tie or an aborted game.
    pub winner: u32,
    pub final_scores: Scores,
    /// Game duration in milliseconds.
    pub game_time: u64,
}

impl EndMessage {
    /// Neutral result sent when a game is aborted by a disconnect.
    pub fn aborted() -> Self {
        Self {
            winner: 0,
            final_scores: Scores::default(),
            game_time: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Input(InputMessage),
    State(StateMessage),
    Join(JoinMessage),
    Start(StartMessage),
    End(EndMessage),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Input(_) => MessageKind::Input,
            Message::State(_) => MessageKind::State,
            Message::Join(_) => MessageKind::Join,
            Message::Start(_) => MessageKind::Start,
            Message::End(_) => MessageKind::End,
        }
    }

    /// Serializes the message as one line, trailing newline included.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut data = serde_json::to_vec(self)?;
        data.push(b'\n');
        Ok(data)
    }

    /// Decodes a single line, with or without its trailing newline.
    pub fn decode(line: &str) -> Result<Message, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        let kind = MessageKind::from_tag(&envelope.kind)
            .ok_or(ProtocolError::UnknownType(envelope.kind))?;

        let message = match kind {
            MessageKind::Input => Message::Input(serde_json::from_str(line)?),
            MessageKind::State => Message::State(serde_json::from_str(line)?),
            MessageKind::Join => Message::Join(serde_json::from_str(line)?),
            MessageKind::Start => Message::Start(serde_json::from_str(line)?),
            MessageKind::End => Message::End(serde_json::from_str(line)?),
        };

        Ok(message)
    }
}

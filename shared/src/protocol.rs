use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Sub-protocol negotiated on the WebSocket handshake.
pub const SUBPROTOCOL: &str = "minisat";

pub const DEFAULT_PORT: u16 = 8000;

/// Where the dashboard connects. Fixed; there is no runtime override.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000";

/// Dashboard -> server. On the wire this is the bare lowercase literal, not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Restart,
    Play,
    Pause,
    Step,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Restart, Command::Play, Command::Pause, Command::Step];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Step => "step",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restart" => Ok(Command::Restart),
            "play" => Ok(Command::Play),
            "pause" => Ok(Command::Pause),
            "step" => Ok(Command::Step),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Server -> dashboard frames:
///   { "action": "restart" }
///   { "action": "play" }
///   { "action": "pause" }
///   { "action": "step", "data": 1234 }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ServerMsg {
    Restart,
    Play,
    Pause,
    Step {
        #[serde(serialize_with = "whole_as_integer")]
        data: f64,
    },
}

/// Whole values go out as JSON integers (`17`, not `17.0`); anything else as a float.
fn whole_as_integer<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        s.serialize_i64(*v as i64)
    } else {
        s.serialize_f64(*v)
    }
}

impl ServerMsg {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A decoded inbound frame. Unrecognised actions are kept as their own variant so the
/// caller can ignore them explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Known(ServerMsg),
    Unknown(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame has no string `action` field")]
    MissingAction,
    #[error("`step` frame has no numeric `data` field")]
    MissingData,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
}

/// Decode one text frame from the server.
///
/// The `action` field is checked before anything else; `data` is only required for `step`
/// and only read there.
pub fn decode_inbound(text: &str) -> Result<Inbound, ProtocolError> {
    let frame: Value = serde_json::from_str(text)?;
    let action = frame
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingAction)?;

    let msg = match action {
        "restart" => ServerMsg::Restart,
        "play" => ServerMsg::Play,
        "pause" => ServerMsg::Pause,
        "step" => {
            let data = frame
                .get("data")
                .and_then(Value::as_f64)
                .ok_or(ProtocolError::MissingData)?;
            ServerMsg::Step { data }
        }
        other => return Ok(Inbound::Unknown(other.to_string())),
    };

    Ok(Inbound::Known(msg))
}

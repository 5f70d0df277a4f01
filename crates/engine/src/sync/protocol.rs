use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::{Agent, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireAgent {
    pub id: i64,
    pub x: f32,
    pub y: f32,
}

impl From<WireAgent> for Agent {
    fn from(wire: WireAgent) -> Self {
        Agent {
            id: wire.id,
            position: Vec2 {
                x: wire.x,
                y: wire.y,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    State { agents: Vec<Agent> },
    Reset { agents: Vec<Agent> },
    Env { url: String },
    Unrecognized { message_type: Option<String> },
    Malformed { message_type: String, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Hello {
        #[serde(rename = "agentCount")]
        agent_count: usize,
    },
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum KnownMessage {
    State { agents: Vec<WireAgent> },
    Reset { agents: Vec<WireAgent> },
    Env { url: String },
}

const KNOWN_TYPES: [&str; 3] = ["state", "reset", "env"];

pub fn parse_server_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(classify(value))
}

fn classify(value: Value) -> ServerMessage {
    let message_type = value
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let is_known = message_type
        .as_deref()
        .is_some_and(|candidate| KNOWN_TYPES.contains(&candidate));
    if !is_known {
        return ServerMessage::Unrecognized { message_type };
    }
    let known_type = message_type.unwrap_or_default();

    match serde_path_to_error::deserialize::<_, KnownMessage>(value) {
        Ok(KnownMessage::State { agents }) => ServerMessage::State {
            agents: agents.into_iter().map(Agent::from).collect(),
        },
        Ok(KnownMessage::Reset { agents }) => ServerMessage::Reset {
            agents: agents.into_iter().map(Agent::from).collect(),
        },
        Ok(KnownMessage::Env { url }) => ServerMessage::Env { url },
        Err(error) => ServerMessage::Malformed {
            message_type: known_type,
            detail: format!("{}: {}", error.path(), error.inner()),
        },
    }
}

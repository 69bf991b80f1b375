use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    commands::{Command, Invocation},
    surface::{ComponentInteraction, Message},
};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("malformed gateway frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("gateway output is closed")]
    Closed,
}

/// One line read from the platform connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Command {
        interaction_id: String,
        invocation: Invocation,
        command: Command,
    },
    Component {
        /// Id of the interaction that opened the session owning the control.
        interaction_id: String,
        interaction: ComponentInteraction,
    },
}

impl InboundFrame {
    pub fn parse(line: &str) -> Result<Self, GatewayError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn interaction_id(&self) -> &str {
        match self {
            Self::Command { interaction_id, .. } | Self::Component { interaction_id, .. } => {
                interaction_id
            }
        }
    }
}

/// One line written back to the connector. Messages replace the target wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Respond {
        interaction_id: String,
        message: Message,
    },
    EditOriginal {
        interaction_id: String,
        message: Message,
    },
    DeleteOriginal {
        interaction_id: String,
    },
    SendChannel {
        interaction_id: String,
        message: Message,
    },
}

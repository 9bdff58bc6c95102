//! Host messaging commands delivered to the homepage by the extension shell.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Command parsed from an incoming `{ "action": ... }` message.
pub enum HostCommand {
    /// Open the settings panel once the homepage has initialized.
    OpenSettings,
    /// Report initialization status.
    GetStatus,
    /// Any other action string.
    Unknown(String),
}

impl HostCommand {
    /// Parses a raw message. Returns `None` when the message carries no string `action`.
    pub fn from_message(message: &Value) -> Option<Self> {
        let action = message.get("action")?.as_str()?;
        Some(match action {
            "openSettings" => Self::OpenSettings,
            "getStatus" => Self::GetStatus,
            other => Self::Unknown(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Reply sent back over the messaging channel.
pub struct HostReply {
    /// Whether the command was handled.
    pub success: bool,
    /// Initialization flag, reported by status queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialized: Option<bool>,
    /// Human-readable status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HostReply {
    /// Successful reply with a message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Failed reply with an error description.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

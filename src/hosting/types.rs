//! Data returned by the game-hosting API.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a hosted server, as the numeric code the API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ServerStatus {
    Offline,
    Online,
    Starting,
    Stopping,
    Restarting,
    Saving,
    Loading,
    Crashed,
    Pending,
    Transferring,
    Preparing,
    Unknown(i64),
}

impl ServerStatus {
    pub fn code(self) -> i64 {
        match self {
            Self::Offline => 0,
            Self::Online => 1,
            Self::Starting => 2,
            Self::Stopping => 3,
            Self::Restarting => 4,
            Self::Saving => 5,
            Self::Loading => 6,
            Self::Crashed => 7,
            Self::Pending => 8,
            Self::Transferring => 9,
            Self::Preparing => 10,
            Self::Unknown(code) => code,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
            Self::Starting => "starting",
            Self::Stopping => "stopping",
            Self::Restarting => "restarting",
            Self::Saving => "saving",
            Self::Loading => "loading",
            Self::Crashed => "crashed",
            Self::Pending => "pending",
            Self::Transferring => "transferring",
            Self::Preparing => "preparing",
            Self::Unknown(_) => "unknown server status",
        }
    }

    /// A start attempt ends in one of these.
    pub fn is_start_terminal(self) -> bool {
        matches!(self, Self::Online | Self::Crashed)
    }
}

impl From<i64> for ServerStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Offline,
            1 => Self::Online,
            2 => Self::Starting,
            3 => Self::Stopping,
            4 => Self::Restarting,
            5 => Self::Saving,
            6 => Self::Loading,
            7 => Self::Crashed,
            8 => Self::Pending,
            9 => Self::Transferring,
            10 => Self::Preparing,
            other => Self::Unknown(other),
        }
    }
}

impl From<ServerStatus> for i64 {
    fn from(status: ServerStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account owning an API key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub credits: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPlayers {
    pub max: u32,
    pub count: u32,
    /// Only reported while the server is online.
    #[serde(default)]
    pub list: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSoftware {
    pub id: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Opaque hosting-side identifier.
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub motd: String,
    pub status: ServerStatus,
    /// Only reported while the server is online.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub players: ServerPlayers,
    #[serde(default)]
    pub software: Option<ServerSoftware>,
    #[serde(default)]
    pub shared: bool,
}

impl ServerInfo {
    /// `(name, version)` of the server software, empty when unknown.
    pub fn software_label(&self) -> (&str, &str) {
        self.software
            .as_ref()
            .map(|s| (s.name.as_str(), s.version.as_str()))
            .unwrap_or(("", ""))
    }
}

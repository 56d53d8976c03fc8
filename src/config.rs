use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_API_BASE: &str = "https://api.openf1.org/v1";

// ---------- Runtime settings ----------

#[derive(Parser, Debug, Clone)]
#[command(name = "timing_tower", about = "Live race timing tower fed by OpenF1")]
pub struct Settings {
    /// Base URL of the OpenF1 REST API
    #[arg(long, env = "OPENF1_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Session to track: a numeric session key or "latest"
    #[arg(long, env = "SESSION_KEY", default_value = "latest")]
    pub session_key: String,

    /// Polling period in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 2000)]
    pub poll_ms: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Static per-session configuration (total laps, flag asset)
    #[arg(long, env = "SESSION_CONFIG", default_value = "session_config.json")]
    pub session_config: PathBuf,

    /// Address for the board HTTP/WebSocket server
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8765")]
    pub bind: SocketAddr,
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(100))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ---------- Static session configuration ----------

/// `{"sessions": {"9472": {"totalLaps": 57, "flag": "flags/bahrain.svg"}}}`
#[derive(Deserialize, Debug, Clone, Default)]
pub struct SessionConfigFile {
    #[serde(default)]
    pub sessions: HashMap<String, SessionEntry>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionEntry {
    pub total_laps: Option<u32>,
    pub flag: Option<String>,
}

impl SessionConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read session config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid session config JSON in {}", path.display()))
    }

    pub fn entry(&self, session_key: u32) -> Option<&SessionEntry> {
        self.sessions.get(&session_key.to_string())
    }
}

/// Find the session config: as given, then under `config/`, then next to the
/// executable. Falls back to the requested path so `load` reports it.
pub fn resolve_config_path(requested: &Path) -> PathBuf {
    let file_name = requested
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("session_config.json"));

    let candidates = [
        requested.to_path_buf(),
        Path::new("config").join(&file_name),
        {
            let mut p = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
            p.pop(); // exe dir
            p.push(&file_name);
            p
        },
    ];

    for c in candidates {
        if c.exists() {
            return c;
        }
    }

    requested.to_path_buf()
}

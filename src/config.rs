//! Client configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Public pastila site used to render locators
pub const DEFAULT_SERVICE_URL: &str = "https://pastila.nl/";

/// ClickHouse endpoint holding the `data` table
pub const DEFAULT_CLICKHOUSE_URL: &str = "https://play.clickhouse.com/?user=paste";

/// Client identifier sent with every request
pub const USER_AGENT: &str = "PastilaCLI/1.0";

pub const DEFAULT_EDITOR: &str = "vi";

pub const SERVICE_URL_ENV: &str = "PASTILA_URL";
pub const CLICKHOUSE_URL_ENV: &str = "PASTILA_CLICKHOUSE_URL";
pub const EDITOR_ENV: &str = "EDITOR";

/// Endpoints used by [`crate::PasteService`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base of the locators this client hands out
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// ClickHouse HTTP interface, may carry its own query (e.g. `?user=paste`)
    #[serde(default = "default_clickhouse_url")]
    pub clickhouse_url: String,

    /// Sent as `User-Agent`
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_service_url() -> String { DEFAULT_SERVICE_URL.to_string() }
fn default_clickhouse_url() -> String { DEFAULT_CLICKHOUSE_URL.to_string() }
fn default_user_agent() -> String { USER_AGENT.to_string() }

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            clickhouse_url: default_clickhouse_url(),
            user_agent: default_user_agent(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `PASTILA_URL` and `PASTILA_CLICKHOUSE_URL`
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            non_empty_env(SERVICE_URL_ENV),
            non_empty_env(CLICKHOUSE_URL_ENV),
        )
    }

    /// Replace endpoints with the non-empty values given
    pub fn with_overrides(mut self, service_url: Option<String>, clickhouse_url: Option<String>) -> Self {
        if let Some(url) = service_url.filter(|u| !u.is_empty()) {
            self.service_url = url;
        }
        if let Some(url) = clickhouse_url.filter(|u| !u.is_empty()) {
            self.clickhouse_url = url;
        }
        self
    }
}

/// How the edit session launches and watches the editor
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Editor executable
    pub program: String,
    /// Extra arguments placed before the file path
    pub args: Vec<String>,
    /// Pause between two looks at the temporary file
    pub poll_interval: Duration,
    /// A successful exit faster than this is treated as a detached editor
    pub quick_exit_threshold: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_EDITOR.to_string(),
            args: Vec::new(),
            poll_interval: Duration::from_millis(25),
            quick_exit_threshold: Duration::from_secs(1),
        }
    }
}

impl EditorConfig {
    /// Defaults with the editor taken from `EDITOR`
    pub fn from_env() -> Self {
        match non_empty_env(EDITOR_ENV) {
            Some(command) => Self::from_command(&command),
            None => Self::default(),
        }
    }

    /// Split a command line like `code -w` into program and arguments
    pub fn from_command(command: &str) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        match parts.next() {
            Some(program) => Self {
                program,
                args: parts.collect(),
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

/// Where a user-supplied key comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Read the key bytes from this file
    File(std::path::PathBuf),
    /// Use the argument's bytes as the key
    Literal(Vec<u8>),
}

impl KeySource {
    /// An existing path is a key file, anything else is the key itself
    pub fn from_arg(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.exists() {
            Self::File(path.to_path_buf())
        } else {
            Self::Literal(arg.as_bytes().to_vec())
        }
    }

    pub fn load(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::File(path) => std::fs::read(path),
            Self::Literal(bytes) => Ok(bytes.clone()),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

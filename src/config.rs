use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::SortKey;

pub const SESSION_TOKEN_ENV: &str = "SHORTLIST_SESSION_TOKEN";
const CONFIG_FILE: &str = "shortlist.toml";

pub const DEFAULT_CONFIG: &str = r#"# shortlist configuration

[api]
# Base URL of the job-search site
base_url = "http://localhost:3000"
# Cookie that carries the signed-in session
session_cookie = "next-auth.session-token"
# Session token copied from the browser; SHORTLIST_SESSION_TOKEN wins when set
session_token = ""
timeout_secs = 30

[ui]
# How long success messages stay on screen
banner_secs = 3
# newest, oldest, title or company
default_sort = "newest"
# HEAD-request company logos and fall back to a glyph when they fail
probe_logos = false
# Show the heuristic match percentage on job cards
show_match_score = true

[logging]
# trace, debug, info, warn or error; RUST_LOG wins when set
level = "info"
json = false
"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    pub session_cookie: String,
    pub session_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            session_cookie: "next-auth.session-token".to_string(),
            session_token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ui {
    pub banner_secs: u64,
    pub default_sort: SortKey,
    pub probe_logos: bool,
    pub show_match_score: bool,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            banner_secs: crate::view::DEFAULT_BANNER_TTL.as_secs(),
            default_sort: SortKey::Newest,
            probe_logos: false,
            show_match_score: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(raw)?;
        Ok(cfg)
    }

    /// Explicit path must exist; the default path falls back to built-in
    /// defaults when nothing has been written yet.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut cfg = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load(&path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env(std::env::var(SESSION_TOKEN_ENV).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, session_token: Option<String>) {
        if let Some(token) = session_token.filter(|t| !t.trim().is_empty()) {
            self.api.session_token = Some(token);
        }
    }

    pub fn default_path() -> PathBuf {
        // Use XDG config directory or fallback
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "shortlist") {
            proj_dirs.config_dir().join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }

    pub fn data_dir() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "shortlist") {
            proj_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    /// Writes the commented default config. Never overwrites an existing file.
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(true)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.api
            .session_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn banner_ttl(&self) -> Duration {
        Duration::from_secs(self.ui.banner_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }
}

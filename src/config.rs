use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::DEFAULT_STORAGE_KEY;
use crate::models::{Id, Role};
use crate::upload::UploadMode;

#[derive(Parser, Debug)]
#[command(name = "safeclass", about = "SafeClass school medical-information client")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. http://localhost:3001/api
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and remember the session on this device
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
    /// Forget the session on this device
    Logout,
    /// Show the signed-in user's profile
    Whoami,
    /// List rooms (classes)
    Rooms,
    /// List students, optionally only one room's or one guardian's
    Students {
        #[arg(long, conflicts_with = "guardian")]
        room: Option<Id>,
        #[arg(long)]
        guardian: Option<Id>,
    },
    /// Show a student's medical conditions and emergency protocols
    Conditions {
        #[arg(long)]
        student: Id,
    },
    /// List medications for every child of a guardian
    Medications {
        #[arg(long)]
        guardian: Id,
    },
    /// List crisis events for every child of a guardian
    Crises {
        #[arg(long)]
        guardian: Id,
    },
    /// Record an emergency for a student's medical condition
    Emergency {
        #[arg(long)]
        student: Id,
        #[arg(long)]
        condition: Id,
    },
    /// Replace the signed-in user's profile picture
    UploadPicture {
        #[arg(long)]
        file: PathBuf,
    },
}

impl Command {
    /// Whether the command talks to the backend as the signed-in user.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Command::Login { .. } | Command::Logout)
    }
}

fn parse_role(value: &str) -> Result<Role, String> {
    match value.to_ascii_lowercase().as_str() {
        "teacher" | "professor" => Ok(Role::Teacher),
        "guardian" | "responsavel" | "parent" => Ok(Role::Guardian),
        "student" | "aluno" => Ok(Role::Student),
        other => Err(format!("unknown role `{}`", other)),
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    #[serde(skip)]
    pub data_dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub headers: BTreeMap<String, String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub storage_key: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct UploadConfig {
    pub mode: UploadMode,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let headers = [
            ("Content-Type", "application/json"),
            ("Accept", "application/json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_ms: 10_000,
            headers,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref base_url) = cli.base_url {
            config.api.base_url = base_url.clone();
        }
        config.data_dir = data_dir;

        reqwest::Url::parse(&config.api.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid base_url `{}`: {}", config.api.base_url, e))?;

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".safeclass"))
                .unwrap_or_else(|| PathBuf::from(".safeclass"))
        })
    }
}

//! Configuration loading
//!
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. `BELTLINE_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/beltline/config.toml` on Linux)
//! 4. Compiled defaults (fallback)

use crate::{Error, Result};
use rand::RngCore;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    /// HS256 signing secret for bearer tokens
    pub token_secret: String,
    /// Token lifetime in seconds
    pub token_ttl_secs: i64,
}

/// On-disk layout of `config.toml`; every field is optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    auth: AuthSection,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSection {
    host: Option<IpAddr>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthSection {
    token_secret: Option<String>,
    token_ttl_secs: Option<i64>,
}

impl Config {
    /// Load configuration, optionally from an explicit file path.
    ///
    /// A missing config file is not an error; defaults apply. A present but
    /// malformed file is an error, so typos do not silently fall back.
    pub fn load(cli_path: Option<&Path>) -> Result<Config> {
        let file = match resolve_config_path(cli_path) {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str::<ConfigFile>(&content)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
            }
            None => ConfigFile::default(),
        };

        let token_secret = match file.auth.token_secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("No token secret configured; using a random per-run secret (tokens will not survive a restart)");
                random_secret()
            }
        };

        Ok(Config {
            host: file
                .server
                .host
                .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: file.server.port.unwrap_or(5680),
            database_path: file
                .database
                .path
                .unwrap_or_else(default_database_path),
            token_secret,
            token_ttl_secs: file.auth.token_ttl_secs.unwrap_or(3600),
        })
    }
}

/// Pick the config file path per the priority order, if any exists
fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("BELTLINE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    let candidate = dirs::config_dir().map(|d| d.join("beltline").join("config.toml"))?;
    candidate.exists().then_some(candidate)
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("beltline"))
        .unwrap_or_else(|| PathBuf::from("./beltline_data"))
        .join("beltline.db")
}

fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

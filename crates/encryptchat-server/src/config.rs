use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use encryptchat_crypto::ShiftKey;
use encryptchat_gateway::ConnectionSettings;
use encryptchat_gateway::connection::HEARTBEAT_INTERVAL;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub key: ShiftKey,
    pub heartbeat_interval: Duration,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// anything unset. Malformed values are errors, not defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("ENCRYPTCHAT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("ENCRYPTCHAT_PORT")
            .unwrap_or_else(|| "3000".into())
            .trim()
            .parse()
            .context("ENCRYPTCHAT_PORT")?;
        let db_path: PathBuf = lookup("ENCRYPTCHAT_DB_PATH")
            .unwrap_or_else(|| "encryptchat.db".into())
            .into();
        let key = match lookup("ENCRYPTCHAT_SHIFT") {
            Some(raw) => raw.parse::<ShiftKey>().context("ENCRYPTCHAT_SHIFT")?,
            None => ShiftKey::default(),
        };
        let heartbeat_interval = match lookup("ENCRYPTCHAT_HEARTBEAT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().context("ENCRYPTCHAT_HEARTBEAT_SECS")?;
                if secs == 0 {
                    anyhow::bail!("ENCRYPTCHAT_HEARTBEAT_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => HEARTBEAT_INTERVAL,
        };

        Ok(Self {
            host,
            port,
            db_path,
            key,
            heartbeat_interval,
        })
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            heartbeat_interval: self.heartbeat_interval,
            ..ConnectionSettings::default()
        }
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port).parse()?;
        Ok(addr)
    }
}

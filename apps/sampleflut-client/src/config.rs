//! Client configuration file.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use sampleflut_core::protocol_constants::{DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT};
use sampleflut_core::ClientConfig;
use serde::Deserialize;

/// Client configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Server hostname or IP address.
    /// Override: `SAMPLEFLUT_HOST`
    pub host: String,

    /// Server port.
    /// Override: `SAMPLEFLUT_PORT`
    pub port: u16,

    /// Start offset into the recording (seconds).
    pub offset_seconds: f64,

    /// Seconds to wait for the handshake response.
    /// Override: `SAMPLEFLUT_HANDSHAKE_TIMEOUT`
    pub handshake_timeout_secs: u64,

    /// Optional bound on each send (seconds). Unset means sends block forever.
    /// Override: `SAMPLEFLUT_SEND_TIMEOUT`
    pub send_timeout_secs: Option<u64>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            offset_seconds: 0.0,
            handshake_timeout_secs: 2,
            send_timeout_secs: None,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SAMPLEFLUT_HANDSHAKE_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.handshake_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("SAMPLEFLUT_SEND_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.send_timeout_secs = Some(secs);
            }
        }

        // Note: SAMPLEFLUT_HOST and SAMPLEFLUT_PORT are handled by clap via
        // #[arg(env = ...)] in main.rs
    }

    /// Converts to sampleflut-core's ClientConfig for the given recording.
    pub fn to_client_config(&self, wav_path: PathBuf) -> ClientConfig {
        ClientConfig {
            wav_path,
            offset_seconds: self.offset_seconds,
            host: self.host.clone(),
            port: self.port,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            send_timeout: self.send_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: FileConfig = serde_yaml::from_str("host: localhost\n").unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.handshake_timeout_secs, 2);
        assert_eq!(config.send_timeout_secs, None);
    }

    #[test]
    fn converts_seconds_to_durations() {
        let config: FileConfig = serde_yaml::from_str(
            "port: 9000\noffset_seconds: 12.5\nhandshake_timeout_secs: 5\nsend_timeout_secs: 30\n",
        )
        .unwrap();
        let client = config.to_client_config(PathBuf::from("track.wav"));

        assert_eq!(client.port, 9000);
        assert_eq!(client.offset_seconds, 12.5);
        assert_eq!(client.handshake_timeout, Duration::from_secs(5));
        assert_eq!(client.send_timeout, Some(Duration::from_secs(30)));
        assert_eq!(client.wav_path, PathBuf::from("track.wav"));
    }

    /// Only test that touches the timeout variables, so it cannot race.
    #[test]
    fn env_overrides_timeouts_and_ignores_bad_values() {
        const HANDSHAKE: &str = "SAMPLEFLUT_HANDSHAKE_TIMEOUT";
        const SEND: &str = "SAMPLEFLUT_SEND_TIMEOUT";
        let saved: Vec<_> = [HANDSHAKE, SEND]
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect();

        std::env::set_var(HANDSHAKE, "7");
        std::env::set_var(SEND, "9");
        let client = FileConfig::load(None)
            .unwrap()
            .to_client_config(PathBuf::from("track.wav"));
        assert_eq!(client.handshake_timeout, Duration::from_secs(7));
        assert_eq!(client.send_timeout, Some(Duration::from_secs(9)));

        std::env::set_var(HANDSHAKE, "soon");
        std::env::set_var(SEND, "-1");
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.handshake_timeout_secs, 2);
        assert_eq!(config.send_timeout_secs, None);

        for (key, value) in saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(FileConfig::load(Some(path.as_path())).is_err());
    }
}

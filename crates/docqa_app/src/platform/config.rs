//! Application configuration.
//!
//! Read from a RON file; every field has a default so a partial file (or no
//! file at all) is fine. `DOCQA_API_URL` overrides the backend address.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use docqa_client::ClientSettings;
use docqa_core::VoiceSettings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "docqa.ron";
pub const API_URL_ENV: &str = "DOCQA_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub voice: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub max_duration_ms: u64,
    pub silence_timeout_ms: u64,
    /// Recognition script to replay instead of live speech input.
    pub script: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            data_dir: PathBuf::from(".docqa"),
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            voice: VoiceConfig::default(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        let defaults = VoiceSettings::default();
        Self {
            max_duration_ms: defaults.max_duration_ms,
            silence_timeout_ms: defaults.silence_timeout_ms,
            script: None,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./docqa.ron` if it exists, or the defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_ron(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Applies environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            max_duration_ms: self.voice.max_duration_ms,
            silence_timeout_ms: self.voice.silence_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = AppConfig::from_ron(
            r#"(api_base_url: "http://rag.internal:9000", voice: (silence_timeout_ms: 1000))"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "http://rag.internal:9000");
        assert_eq!(config.voice.silence_timeout_ms, 1000);
        assert_eq!(config.voice.max_duration_ms, 15_000);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.data_dir, PathBuf::from(".docqa"));
    }

    #[test]
    fn script_path_is_optional() {
        let config = AppConfig::from_ron(r#"(voice: (script: Some("demo/speech.txt")))"#).unwrap();
        assert_eq!(config.voice.script, Some(PathBuf::from("demo/speech.txt")));
    }

    #[test]
    fn env_overrides_base_url() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == API_URL_ENV).then(|| " http://env:1234 ".to_string()));
        assert_eq!(config.api_base_url, "http://env:1234");

        config.apply_env(|_| Some("   ".to_string()));
        assert_eq!(config.api_base_url, "http://env:1234");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("nope.ron");
        assert!(AppConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.ron");
        fs::write(&path, "(api_base_url: 42)").unwrap();
        assert!(AppConfig::load(Some(&path)).is_err());
    }
}

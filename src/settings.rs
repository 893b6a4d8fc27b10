use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LoctreeError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api-dbexplorer-nestjs-production.gigantao.net";
pub const DEFAULT_ROOT: i64 = 101000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Bearer token file; falls back to `<data_dir>/auth_token.txt`.
    #[serde(default)]
    pub token_file: Option<String>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_data_dir() -> String {
    "docs/sqls/estoque-locais".to_string()
}

fn default_max_attempts() -> u32 {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_dir: default_data_dir(),
            token_file: None,
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn token_path(&self) -> PathBuf {
        match &self.token_file {
            Some(path) => PathBuf::from(path),
            None => self.data_dir().join("auth_token.txt"),
        }
    }

    pub fn query_url(&self) -> String {
        format!("{}/inspection/query", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply per-invocation overrides from the command line.
    pub fn with_overrides(
        mut self,
        data_dir: Option<String>,
        token_file: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if token_file.is_some() {
            self.token_file = token_file;
        }
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loctree")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

/// Read the bearer token, trimmed of surrounding whitespace.
pub fn read_token(settings: &Settings) -> Result<String> {
    let path = settings.token_path();
    let raw = std::fs::read_to_string(&path).map_err(|e| {
        LoctreeError::Token(format!("cannot read {}: {e}", path.display()))
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(LoctreeError::Token(format!("{} is empty", path.display())));
    }
    Ok(token.to_string())
}

pub fn ensure_data_dir(settings: &Settings) -> Result<PathBuf> {
    let dir = settings.data_dir();
    std::fs::create_dir_all(&dir)
        .map_err(|e| LoctreeError::Settings(format!("cannot create {}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/locais", "max_attempts": 2}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_dir, "/tmp/locais");
        assert_eq!(s.max_attempts, 2);
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.timeout_secs, 60);
        assert!(s.token_file.is_none());
    }

    #[test]
    fn test_token_path_defaults_to_data_dir() {
        let s = Settings {
            data_dir: "/srv/locais".to_string(),
            ..Settings::default()
        };
        assert_eq!(s.token_path(), PathBuf::from("/srv/locais/auth_token.txt"));
        let s = s.with_overrides(None, Some("/etc/token".to_string()), None);
        assert_eq!(s.token_path(), PathBuf::from("/etc/token"));
    }

    #[test]
    fn test_query_url_strips_trailing_slash() {
        let s = Settings::default().with_overrides(None, None, Some("http://127.0.0.1:9/".to_string()));
        assert_eq!(s.query_url(), "http://127.0.0.1:9/inspection/query");
    }

    #[test]
    fn test_read_token_trims_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auth_token.txt"), "  abc.def.ghi \n").unwrap();
        let s = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        assert_eq!(read_token(&s).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_read_token_rejects_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        assert!(read_token(&s).is_err());
        std::fs::write(dir.path().join("auth_token.txt"), "\n  \n").unwrap();
        let msg = read_token(&s).unwrap_err().to_string();
        assert!(msg.contains("is empty"), "got: {msg}");
    }
}

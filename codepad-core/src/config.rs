//! Configuration management for the Codepad system

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{CodepadError, Result};

/// Default namespace prefix for persisted code entries
pub const DEFAULT_STORAGE_PREFIX: &str = "ps_code_task_";

/// Main system configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CodepadError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CodepadError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the given file if it exists, otherwise from the
    /// default location, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(default_path) if default_path.exists() => {
                tracing::debug!("Loading config from {}", default_path.display());
                Self::from_file(&default_path)
            }
            _ => Ok(Self::new()),
        }
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CodepadError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| CodepadError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        if self.server.port == 0 {
            result.errors.push("server.port: invalid port number 0".to_string());
        }
        if self.server.hostname.trim().is_empty() {
            result.errors.push("server.hostname: must not be empty".to_string());
        }
        if !self.server.data_dir.exists() {
            result.warnings.push(format!(
                "server.data_dir: directory does not exist: {}",
                self.server.data_dir.display()
            ));
        }

        if self.editor.storage_prefix.is_empty() {
            result
                .errors
                .push("editor.storage_prefix: must not be empty".to_string());
        }
        if self.editor.indent_width == 0 || self.editor.indent_width > 16 {
            result.errors.push(format!(
                "editor.indent_width: {} is outside range [1, 16]",
                self.editor.indent_width
            ));
        }
        if self.editor.toast_duration_ms == 0 {
            result
                .errors
                .push("editor.toast_duration_ms: must be greater than zero".to_string());
        }
        match &self.editor.run_endpoint {
            Some(endpoint) if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") => {
                result.errors.push(format!(
                    "editor.run_endpoint: '{}' is not an http(s) URL",
                    endpoint
                ));
            }
            None => result
                .warnings
                .push("editor.run_endpoint: not set, Run actions will fail".to_string()),
            _ => {}
        }

        result.is_valid = result.errors.is_empty();
        if !result.is_valid {
            return Err(CodepadError::Config(format!(
                "Configuration validation failed: {}",
                result.errors.join("; ")
            )));
        }

        Ok(result)
    }

    /// Apply environment variable overrides
    pub fn apply_environment_overrides(
        &mut self,
        env_overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in env_overrides {
            match key.as_str() {
                "CODEPAD_SERVER_HOSTNAME" => self.server.hostname = value.clone(),
                "CODEPAD_SERVER_PORT" => {
                    self.server.port = value.parse().map_err(|_| {
                        CodepadError::Config(format!(
                            "Invalid port in environment variable: {}",
                            value
                        ))
                    })?;
                }
                "CODEPAD_SERVER_CORS_ENABLED" => {
                    self.server.cors_enabled = value.parse().map_err(|_| {
                        CodepadError::Config(format!(
                            "Invalid boolean in environment variable: {}",
                            value
                        ))
                    })?;
                }
                "CODEPAD_DATA_DIR" => self.server.data_dir = PathBuf::from(value),
                "CODEPAD_STORAGE_PREFIX" => self.editor.storage_prefix = value.clone(),
                "CODEPAD_RUN_ENDPOINT" => self.editor.run_endpoint = Some(value.clone()),
                "CODEPAD_STORAGE_PATH" => self.editor.storage_path = Some(PathBuf::from(value)),
                _ => {
                    // Ignore unrelated environment variables
                }
            }
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_process_environment(&mut self) -> Result<()> {
        let overrides: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("CODEPAD_"))
            .collect();
        self.apply_environment_overrides(&overrides)
    }

    /// Apply CLI argument overrides
    pub fn apply_cli_overrides(
        &mut self,
        cli_overrides: &HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        for (key, value) in cli_overrides {
            match (key.as_str(), value) {
                ("server.hostname", serde_json::Value::String(hostname)) => {
                    self.server.hostname = hostname.clone();
                }
                ("server.port", serde_json::Value::Number(port)) => {
                    let port = port
                        .as_u64()
                        .and_then(|p| u16::try_from(p).ok())
                        .ok_or_else(|| CodepadError::config(format!("Invalid port: {}", port)))?;
                    self.server.port = port;
                }
                ("server.data_dir", serde_json::Value::String(dir)) => {
                    self.server.data_dir = PathBuf::from(dir);
                }
                ("editor.run_endpoint", serde_json::Value::String(endpoint)) => {
                    self.editor.run_endpoint = Some(endpoint.clone());
                }
                ("editor.storage_path", serde_json::Value::String(path)) => {
                    self.editor.storage_path = Some(PathBuf::from(path));
                }
                _ => {
                    tracing::debug!("Ignoring unknown CLI override: {}", key);
                }
            }
        }
        Ok(())
    }
}

/// Path of the user-level config file (`<config dir>/codepad/config.json`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codepad").join("config.json"))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub hostname: String,
    pub port: u16,
    /// Directory holding `tasks.json` and `templates.json`
    pub data_dir: PathBuf,
    pub cors_enabled: bool,
    pub site_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: PathBuf::from("static/data"),
            cors_enabled: true,
            site_name: "Codepad".to_string(),
        }
    }
}

/// Editor widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Namespace prefix for persisted code entries
    pub storage_prefix: String,
    /// Spaces inserted by Tab in the fallback editor
    pub indent_width: usize,
    /// How long a toast stays visible
    pub toast_duration_ms: u64,
    /// Language mode of the rich editor
    pub language: String,
    pub line_numbers: bool,
    pub line_wrapping: bool,
    pub highlight_active_line: bool,
    /// Modules the rich editor loads before it can be constructed
    pub rich_modules: Vec<String>,
    /// Remote execution endpoint for Run
    pub run_endpoint: Option<String>,
    /// Request timeout for Run, in seconds
    pub run_timeout_secs: u64,
    /// Backing file for persisted code when not running in a browser
    pub storage_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            indent_width: 4,
            toast_duration_ms: 1400,
            language: "python".to_string(),
            line_numbers: true,
            line_wrapping: true,
            highlight_active_line: true,
            rich_modules: vec![
                "https://esm.sh/@codemirror/view@6.28.2".to_string(),
                "https://esm.sh/@codemirror/state@6.4.1".to_string(),
                "https://esm.sh/@codemirror/commands@6.5.0".to_string(),
                "https://esm.sh/@codemirror/lang-python@6.1.6".to_string(),
                "https://esm.sh/@codemirror/language@6.10.2".to_string(),
            ],
            run_endpoint: None,
            run_timeout_secs: 30,
            storage_path: None,
        }
    }
}

/// Outcome of configuration validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = Config::new();
        assert_eq!(config.server.hostname, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.editor.storage_prefix, "ps_code_task_");
        assert_eq!(config.editor.indent_width, 4);
        assert_eq!(config.editor.toast_duration_ms, 1400);
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::new();
        config.editor.run_endpoint = Some("http://localhost:9000/run".to_string());

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.server.port, config.server.port);
        assert_eq!(loaded.editor.run_endpoint, config.editor.run_endpoint);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{"editor": {"indent_width": 2}}"#).unwrap();

        let loaded = Config::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded.editor.indent_width, 2);
        assert_eq!(loaded.editor.storage_prefix, DEFAULT_STORAGE_PREFIX);
        assert_eq!(loaded.server.port, 3000);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::new();
        config.editor.run_endpoint = Some("http://localhost:9000/run".to_string());
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.editor.run_endpoint = Some("ftp://nowhere".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.editor.indent_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_warns_without_endpoint() {
        let config = Config::new();
        let result = config.validate().unwrap();
        assert!(result.is_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("editor.run_endpoint")));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = Config::new();
        let mut env = HashMap::new();
        env.insert("CODEPAD_SERVER_PORT".to_string(), "8080".to_string());
        env.insert("CODEPAD_STORAGE_PREFIX".to_string(), "custom_".to_string());
        env.insert("CODEPAD_STORAGE_PATH".to_string(), "/var/codepad.json".to_string());
        env.insert("UNRELATED".to_string(), "x".to_string());

        config.apply_environment_overrides(&env).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.editor.storage_prefix, "custom_");
        assert_eq!(config.editor.storage_path, Some(PathBuf::from("/var/codepad.json")));

        env.insert("CODEPAD_SERVER_PORT".to_string(), "not-a-port".to_string());
        assert!(config.apply_environment_overrides(&env).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::new();
        let mut overrides = HashMap::new();
        overrides.insert(
            "server.hostname".to_string(),
            serde_json::Value::String("0.0.0.0".to_string()),
        );
        overrides.insert("server.port".to_string(), serde_json::json!(4000));
        overrides.insert("editor.storage_path".to_string(), serde_json::json!("saved.json"));

        config.apply_cli_overrides(&overrides).unwrap();
        assert_eq!(config.server.hostname, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.editor.storage_path, Some(PathBuf::from("saved.json")));

        overrides.insert("server.port".to_string(), serde_json::json!(70000));
        assert!(config.apply_cli_overrides(&overrides).is_err());
    }
}

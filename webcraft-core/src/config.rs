//! Configuration management for WebCraft

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Result, WebcraftError};

/// Environment variable holding the generation API key
pub const API_KEY_ENV: &str = "WEBCRAFT_GENERATOR_API_KEY";

/// Main system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub generator: GeneratorConfig,
    pub storage: StorageConfig,
    pub export: ExportConfig,
}

/// A marker attribute (name plus expected value) that opts an element into editing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerConfig {
    pub attribute: String,
    pub value: String,
}

impl MarkerConfig {
    pub fn new(attribute: &str, value: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

/// Live editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub text_marker: MarkerConfig,
    pub image_marker: MarkerConfig,
    pub fallback_text_tags: Vec<String>,
    pub container_tags: Vec<String>,
    /// Parents (besides `body`) whose container children get a drag handle
    pub drag_parent_tags: Vec<String>,
    pub sandbox: Vec<String>,
    pub max_upload_bytes: u64,
    pub accepted_mime_prefix: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let words = |list: &str| list.split_whitespace().map(str::to_string).collect();
        Self {
            text_marker: MarkerConfig::new("data-editable", "true"),
            image_marker: MarkerConfig::new("data-editable", "image"),
            fallback_text_tags: words("p h1 h2 h3 h4 h5 h6 span button a li"),
            container_tags: words("div section article header footer nav aside"),
            drag_parent_tags: words("main section"),
            sandbox: words("allow-scripts allow-same-origin allow-forms allow-modals"),
            max_upload_bytes: 5 * 1024 * 1024,
            accepted_mime_prefix: "image/".to_string(),
        }
    }
}

/// Generation client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_output_tokens: 30000,
            temperature: 1.0,
            timeout_secs: 120,
        }
    }
}

impl GeneratorConfig {
    /// The configured key, falling back to the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Handoff and object storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub handoff_path: Option<PathBuf>,
    pub object_root: PathBuf,
    pub public_base_url: String,
    pub upload_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            handoff_path: None,
            object_root: PathBuf::from("uploads"),
            public_base_url: "http://localhost:8000/uploads".to_string(),
            upload_prefix: "website-images".to_string(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
    pub inject_handler_shim: bool,
    pub style_framework_url: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "my-website.html".to_string(),
            inject_handler_shim: true,
            style_framework_url: "https://cdn.tailwindcss.com".to_string(),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WebcraftError::config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| WebcraftError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| WebcraftError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| WebcraftError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let editor = &self.editor;
        for marker in [&editor.text_marker, &editor.image_marker] {
            if marker.attribute.trim().is_empty() {
                return Err(WebcraftError::config("Editor marker attribute cannot be empty"));
            }
        }
        if editor.text_marker == editor.image_marker {
            return Err(WebcraftError::config(
                "Text and image markers must differ",
            ));
        }
        if editor.fallback_text_tags.is_empty() {
            return Err(WebcraftError::config("At least one fallback text tag is required"));
        }
        if editor.max_upload_bytes == 0 {
            return Err(WebcraftError::config("Upload size limit must be positive"));
        }
        if editor.accepted_mime_prefix.is_empty() {
            return Err(WebcraftError::config("Accepted MIME prefix cannot be empty"));
        }

        if !self.generator.endpoint.starts_with("http://")
            && !self.generator.endpoint.starts_with("https://")
        {
            return Err(WebcraftError::config(format!(
                "Generator endpoint must be an http(s) URL: {}",
                self.generator.endpoint
            )));
        }
        if self.generator.model.trim().is_empty() {
            return Err(WebcraftError::config("Generator model cannot be empty"));
        }
        if self.generator.max_output_tokens == 0 {
            return Err(WebcraftError::config("max_output_tokens must be positive"));
        }
        if !(0.0..=2.0).contains(&self.generator.temperature) {
            return Err(WebcraftError::config(format!(
                "Temperature must be between 0 and 2, got {}",
                self.generator.temperature
            )));
        }

        if self.storage.upload_prefix.contains("..") {
            return Err(WebcraftError::config("Upload prefix cannot contain '..'"));
        }

        let file_name = &self.export.file_name;
        if file_name.trim().is_empty() || file_name.contains('/') || file_name.contains('\\') {
            return Err(WebcraftError::config(format!(
                "Export file name must be a plain file name: {:?}",
                file_name
            )));
        }

        Ok(())
    }

    /// Load configuration from a file (when present), environment and validation
    pub fn load_with_context(context: &ConfigLoadContext) -> Result<(Self, ConfigMetadata)> {
        let start_time = SystemTime::now();
        let mut source_files = Vec::new();

        let mut config = match &context.base_path {
            Some(path) if path.exists() => {
                source_files.push(path.clone());
                Self::from_file(path)?
            }
            _ => Self::new(),
        };

        config.apply_environment_overrides(&context.environment_overrides)?;

        let validation_status = if context.validation_enabled {
            match config.validate() {
                Ok(()) => ValidationStatus::Valid,
                Err(e) if context.strict_mode => return Err(e),
                Err(e) => {
                    tracing::warn!("Configuration is invalid: {}", e);
                    ValidationStatus::Invalid
                }
            }
        } else {
            ValidationStatus::NotValidated
        };

        let metadata = ConfigMetadata {
            loaded_at: start_time,
            source_files,
            checksum: config.calculate_checksum()?,
            validation_status,
        };

        Ok((config, metadata))
    }

    /// Apply `WEBCRAFT_*` environment variable overrides
    pub fn apply_environment_overrides(
        &mut self,
        env_overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in env_overrides {
            match key.as_str() {
                "WEBCRAFT_GENERATOR_ENDPOINT" => self.generator.endpoint = value.clone(),
                "WEBCRAFT_GENERATOR_MODEL" => self.generator.model = value.clone(),
                API_KEY_ENV => self.generator.api_key = Some(value.clone()),
                "WEBCRAFT_GENERATOR_MAX_OUTPUT_TOKENS" => {
                    self.generator.max_output_tokens = parse_env(key, value)?;
                }
                "WEBCRAFT_GENERATOR_TEMPERATURE" => {
                    self.generator.temperature = parse_env(key, value)?;
                }
                "WEBCRAFT_GENERATOR_TIMEOUT_SECS" => {
                    self.generator.timeout_secs = parse_env(key, value)?;
                }
                "WEBCRAFT_EDITOR_MAX_UPLOAD_BYTES" => {
                    self.editor.max_upload_bytes = parse_env(key, value)?;
                }
                "WEBCRAFT_EDITOR_SANDBOX" => {
                    self.editor.sandbox = value.split_whitespace().map(str::to_string).collect();
                }
                "WEBCRAFT_STORAGE_HANDOFF_PATH" => {
                    self.storage.handoff_path = Some(PathBuf::from(value));
                }
                "WEBCRAFT_STORAGE_OBJECT_ROOT" => self.storage.object_root = PathBuf::from(value),
                "WEBCRAFT_STORAGE_PUBLIC_BASE_URL" => {
                    self.storage.public_base_url = value.clone();
                }
                "WEBCRAFT_EXPORT_FILE_NAME" => self.export.file_name = value.clone(),
                "WEBCRAFT_EXPORT_INJECT_HANDLER_SHIM" => {
                    self.export.inject_handler_shim = parse_env(key, value)?;
                }
                _ => {
                    // Ignore unknown environment variables
                }
            }
        }
        Ok(())
    }

    /// Collect the `WEBCRAFT_*` variables of the current process
    pub fn environment_overrides_from_process() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("WEBCRAFT_"))
            .collect()
    }

    /// Calculate configuration checksum for change detection
    pub fn calculate_checksum(&self) -> Result<String> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let serialized = serde_json::to_string(self).map_err(|e| {
            WebcraftError::config(format!("Failed to serialize config for checksum: {}", e))
        })?;

        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        Ok(format!("{:x}", hasher.finish()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        WebcraftError::config(format!(
            "Invalid value in environment variable {}: {}",
            key, value
        ))
    })
}

/// Configuration loading context
#[derive(Debug, Clone)]
pub struct ConfigLoadContext {
    pub base_path: Option<PathBuf>,
    pub environment_overrides: HashMap<String, String>,
    pub validation_enabled: bool,
    pub strict_mode: bool,
}

impl Default for ConfigLoadContext {
    fn default() -> Self {
        Self {
            base_path: Some(PathBuf::from("webcraft.json")),
            environment_overrides: HashMap::new(),
            validation_enabled: true,
            strict_mode: false,
        }
    }
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub loaded_at: SystemTime,
    pub source_files: Vec<PathBuf>,
    pub checksum: String,
    pub validation_status: ValidationStatus,
}

/// Configuration validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    NotValidated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.editor.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.export.file_name, "my-website.html");
        assert!(config.editor.sandbox.iter().any(|t| t == "allow-same-origin"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("webcraft.json");
        std::fs::write(&path, r#"{ "export": { "file_name": "site.html" } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.export.file_name, "site.html");
        assert!(config.export.inject_handler_shim);
        assert_eq!(config.generator.max_output_tokens, 30000);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("webcraft.json");
        let mut config = Config::new();
        config.storage.upload_prefix = "uploads".to_string();
        config.save_to_file(&path).unwrap();

        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = Config::new();
        let mut env = HashMap::new();
        env.insert("WEBCRAFT_GENERATOR_TEMPERATURE".to_string(), "0.5".to_string());
        env.insert("WEBCRAFT_EDITOR_SANDBOX".to_string(), "allow-scripts".to_string());
        env.insert("UNRELATED".to_string(), "x".to_string());
        config.apply_environment_overrides(&env).unwrap();

        assert_eq!(config.generator.temperature, 0.5);
        assert_eq!(config.editor.sandbox, vec!["allow-scripts".to_string()]);
    }

    #[test]
    fn test_bad_environment_value_is_config_error() {
        let mut config = Config::new();
        let mut env = HashMap::new();
        env.insert("WEBCRAFT_EDITOR_MAX_UPLOAD_BYTES".to_string(), "lots".to_string());
        let err = config.apply_environment_overrides(&env).unwrap_err();
        assert!(matches!(err, WebcraftError::Config(_)));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::new();
        config.export.file_name = "../escape.html".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.generator.temperature = 3.0;
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.editor.image_marker = config.editor.text_marker.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_with_context_reports_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("webcraft.json");
        Config::new().save_to_file(&path).unwrap();

        let context = ConfigLoadContext {
            base_path: Some(path.clone()),
            ..Default::default()
        };
        let (config, metadata) = Config::load_with_context(&context).unwrap();
        assert_eq!(metadata.source_files, vec![path]);
        assert_eq!(metadata.validation_status, ValidationStatus::Valid);
        assert_eq!(metadata.checksum, config.calculate_checksum().unwrap());
    }

    #[test]
    fn test_strict_mode_fails_on_invalid_config() {
        let mut env = HashMap::new();
        env.insert("WEBCRAFT_GENERATOR_MAX_OUTPUT_TOKENS".to_string(), "0".to_string());
        let context = ConfigLoadContext {
            base_path: None,
            environment_overrides: env,
            validation_enabled: true,
            strict_mode: true,
        };
        assert!(Config::load_with_context(&context).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Language codes following ISO 639-1 with regional variants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lang(pub String);

impl Lang {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable name used in backend prompts.
    pub fn display_name(&self) -> &str {
        match self.as_str() {
            "en" => "English",
            "pt-BR" => "Portuguese (Brazil)",
            "pt" => "Portuguese",
            "es" => "Spanish",
            "fr" => "French",
            "de" => "German",
            "it" => "Italian",
            "zh-CN" => "Simplified Chinese",
            "ja" => "Japanese",
            // The models understand most ISO codes as-is
            other => other,
        }
    }
}

// Serde default functions for common languages
fn default_source_lang() -> Lang {
    Lang::new("en")
}

fn default_target_lang() -> Lang {
    Lang::new("pt-BR")
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Lang {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Translation backend selection.
///
/// Closed set of providers; the matching adapter is built once by
/// [`crate::translator::create_translator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
    #[default]
    DeepSeek,
}

impl Provider {
    /// Stable identifier, used in checkpoint keys and config files.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
        }
    }

    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAi => "gpt-4o-mini",
            Self::DeepSeek => "deepseek-chat",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            "deepseek" => Some(Self::DeepSeek),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
            Self::DeepSeek => "DeepSeek",
        };
        f.write_str(name)
    }
}

/// Translator backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Which backend to use
    #[serde(default)]
    pub provider: Provider,

    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub deepseek_api_key: Option<String>,

    /// Model override (defaults to the provider's model)
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_gemini_api_base")]
    pub gemini_api_base: String,
    #[serde(default = "default_openai_api_base")]
    pub openai_api_base: String,

    /// Relay endpoint the DeepSeek adapter posts to
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    #[serde(default = "default_source_lang")]
    pub source_lang: Lang,
    #[serde(default = "default_target_lang")]
    pub target_lang: Lang,

    /// Retries after the first failed attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay before the first retry; doubles on every further retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pages translated concurrently per committed batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Override for the chunk limit of chunked backends
    #[serde(default)]
    pub chunk_limit: Option<usize>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl TranslatorConfig {
    /// API key configured for the selected provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::DeepSeek => self.deepseek_api_key.as_deref(),
        }
    }

    /// Model for the selected provider.
    pub fn model(&self) -> &str {
        self.model_for(self.provider)
    }

    /// Model override if set, else the provider's default.
    pub fn model_for(&self, provider: Provider) -> &str {
        self.model.as_deref().unwrap_or_else(|| provider.default_model())
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// System prompt sent with every translation request.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a professional translator. Translate the following text from {} to {}. \
             Maintain the original tone and context. Return ONLY the translated text, without explanations.",
            self.source_lang.display_name(),
            self.target_lang.display_name(),
        )
    }
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_relay_url() -> String {
    "http://127.0.0.1:3000/api/deepseek".to_string()
}

const fn default_retry_count() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    2000
}

const fn default_batch_size() -> usize {
    1
}

const fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            gemini_api_key: None,
            openai_api_key: None,
            deepseek_api_key: None,
            model: None,
            gemini_api_base: default_gemini_api_base(),
            openai_api_base: default_openai_api_base(),
            relay_url: default_relay_url(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            batch_size: default_batch_size(),
            chunk_limit: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Checkpoint storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Keep checkpoints in memory
    #[serde(default = "default_true")]
    pub memory_enabled: bool,

    /// Persist checkpoints to disk
    #[serde(default = "default_true")]
    pub disk_enabled: bool,

    /// Checkpoint directory (defaults to ~/.cache/pdf-visual-translator/checkpoints)
    pub disk_path: Option<PathBuf>,

    /// Age after which a checkpoint is discarded
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_ttl_seconds() -> u64 {
    24 * 60 * 60
}

impl CheckpointConfig {
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Memory-only store; nothing survives the process.
    pub fn ephemeral() -> Self {
        Self {
            memory_enabled: true,
            disk_enabled: false,
            ..Default::default()
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            memory_enabled: true,
            disk_enabled: true,
            disk_path: None,
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

/// Page rasterization settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Scale applied to the native page size
    #[serde(default = "default_render_scale")]
    pub scale: f32,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

const fn default_render_scale() -> f32 {
    1.5
}

const fn default_jpeg_quality() -> u8 {
    80
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: default_render_scale(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

/// Overlay layout of reconstructed pages, in millimetres and points
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Inset of the whitewash box from every page edge (mm)
    #[serde(default = "default_margin_mm")]
    pub margin_mm: f32,

    /// Translated text size (pt)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Distance between consecutive baselines (mm)
    #[serde(default = "default_line_pitch_mm")]
    pub line_pitch_mm: f32,

    /// Opacity of the whitewash box
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: f32,
}

const fn default_margin_mm() -> f32 {
    15.0
}

const fn default_font_size() -> f32 {
    11.0
}

const fn default_line_pitch_mm() -> f32 {
    6.0
}

const fn default_overlay_alpha() -> f32 {
    0.95
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin_mm: default_margin_mm(),
            font_size: default_font_size(),
            line_pitch_mm: default_line_pitch_mm(),
            overlay_alpha: default_overlay_alpha(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Translator backend configuration
    #[serde(default)]
    pub translator: TranslatorConfig,

    /// Checkpoint configuration
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-visual-translator/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-visual-translator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, reason: &str| {
            Err(Error::ConfigInvalid {
                field: field.to_string(),
                reason: reason.to_string(),
            })
        };

        if self.translator.batch_size == 0 {
            return invalid("translator.batch_size", "must be at least 1");
        }
        if self.translator.chunk_limit == Some(0) {
            return invalid("translator.chunk_limit", "must be at least 1");
        }
        if self.render.scale.is_nan() || self.render.scale <= 0.0 {
            return invalid("render.scale", "must be positive");
        }
        if !(1..=100).contains(&self.render.jpeg_quality) {
            return invalid("render.jpeg_quality", "must be between 1 and 100");
        }
        if !(0.0..=1.0).contains(&self.layout.overlay_alpha) {
            return invalid("layout.overlay_alpha", "must be between 0 and 1");
        }
        if [self.layout.font_size, self.layout.line_pitch_mm]
            .iter()
            .any(|v| v.is_nan() || *v <= 0.0)
        {
            return invalid("layout", "font size and line pitch must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_layout() {
        let config = AppConfig::default();
        assert_eq!(config.translator.provider, Provider::DeepSeek);
        assert_eq!(config.translator.batch_size, 1);
        assert_eq!(config.translator.retry_count, 3);
        assert_eq!(config.translator.retry_delay_ms, 2000);
        assert_eq!(config.checkpoint.ttl_seconds, 86_400);
        assert!((config.render.scale - 1.5).abs() < f32::EPSILON);
        assert!((config.layout.margin_mm - 15.0).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [translator]
            provider = "openai"
            batch_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.translator.provider, Provider::OpenAi);
        assert_eq!(config.translator.model(), "gpt-4o-mini");
        assert_eq!(config.translator.batch_size, 3);
        assert_eq!(config.translator.target_lang.as_str(), "pt-BR");
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = AppConfig::default();
        config.translator.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::ConfigInvalid { field, .. }) if field == "translator.batch_size"
        ));
    }

    #[test]
    fn test_system_prompt_names_languages() {
        let prompt = TranslatorConfig::default().system_prompt();
        assert!(prompt.contains("from English to Portuguese (Brazil)"));
    }

    #[test]
    fn test_api_key_follows_provider() {
        let config = TranslatorConfig {
            provider: Provider::Gemini,
            gemini_api_key: Some("g".into()),
            deepseek_api_key: Some("d".into()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), Some("g"));
        assert_eq!(Provider::from_id("DeepSeek"), Some(Provider::DeepSeek));
    }
}

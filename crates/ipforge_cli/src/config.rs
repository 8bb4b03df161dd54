//! Optional `ipforge.toml` configuration.
//!
//! Two tables: `[output]` sets the emitted component's VLNV strings, and
//! `[match]` tunes the matcher weights. Command-line flags override file
//! values, which override the built-in defaults.

use ipforge_ipxact::ComponentMeta;
use ipforge_match::MatchConfig;
use serde::Deserialize;
use std::path::Path;

/// Configuration file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// A value is outside its allowed range.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// The parsed `ipforge.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct ToolConfig {
    /// Component identity overrides.
    #[serde(default)]
    pub output: OutputSection,
    /// Matcher weight overrides.
    #[serde(default, rename = "match")]
    pub matching: MatchSection,
}

/// `[output]` table: the emitted component VLNV strings.
#[derive(Debug, Deserialize)]
pub struct OutputSection {
    /// Component vendor (default `user`).
    #[serde(default = "default_vendor")]
    pub vendor: String,
    /// Component library (default `user`).
    #[serde(default = "default_vendor")]
    pub library: String,
    /// Component version (default `1.0`).
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_vendor() -> String {
    "user".into()
}

fn default_version() -> String {
    "1.0".into()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            library: default_vendor(),
            version: default_version(),
        }
    }
}

/// `[match]` table: optional weight overrides.
#[derive(Debug, Default, Deserialize)]
pub struct MatchSection {
    /// Acceptance threshold.
    pub threshold: Option<f64>,
    /// Required-signal weight.
    pub w_required: Option<f64>,
    /// Optional-signal weight.
    pub w_optional: Option<f64>,
    /// Mismatch penalty weight.
    pub w_penalty: Option<f64>,
    /// Ambiguity margin.
    pub ambiguity_margin: Option<f64>,
}

impl ToolConfig {
    /// Loads a config file, or the defaults when `path` does not exist.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses and validates config text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ToolConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.matching.threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::InvalidValue(format!(
                    "match.threshold must be within 0.0..=1.0, got {t}"
                )));
            }
        }
        for (name, value) in [
            ("w_required", self.matching.w_required),
            ("w_optional", self.matching.w_optional),
            ("w_penalty", self.matching.w_penalty),
            ("ambiguity_margin", self.matching.ambiguity_margin),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(ConfigError::InvalidValue(format!(
                        "match.{name} must not be negative, got {v}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Builds the matcher configuration; a CLI threshold wins over the
    /// file value.
    pub fn match_config(&self, cli_threshold: Option<f64>) -> MatchConfig {
        let defaults = MatchConfig::default();
        MatchConfig {
            threshold: cli_threshold
                .or(self.matching.threshold)
                .unwrap_or(defaults.threshold),
            w_required: self.matching.w_required.unwrap_or(defaults.w_required),
            w_optional: self.matching.w_optional.unwrap_or(defaults.w_optional),
            w_penalty: self.matching.w_penalty.unwrap_or(defaults.w_penalty),
            ambiguity_margin: self
                .matching
                .ambiguity_margin
                .unwrap_or(defaults.ambiguity_margin),
        }
    }

    /// Builds the component identity for the serializer.
    pub fn component_meta(&self) -> ComponentMeta {
        ComponentMeta {
            vendor: self.output.vendor.clone(),
            library: self.output.library.clone(),
            version: self.output.version.clone(),
        }
    }
}

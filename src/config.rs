//! Configuration for composition checking
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (composition.toml)
//! - Environment variables (COMPOSITION__*)
//!
//! ## Example config file (composition.toml):
//! ```toml
//! [loader]
//! reference_prefixes = ["#/definitions/", "#/components/schemas/"]
//! skip_prefixes = ["target/", "node_modules/"]
//!
//! [analysis]
//! discriminator_candidates = ["type", "kind"]
//! report_cycles = true
//! fail_on_warnings = false
//!
//! [report]
//! output_format = "text"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Document loading settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// Document loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// `$ref` prefixes that address the definitions table
    #[serde(default = "default_reference_prefixes")]
    pub reference_prefixes: Vec<String>,

    /// Relative path prefixes skipped when scanning a directory
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Property names allowed as discriminators (empty allows any)
    #[serde(default)]
    pub discriminator_candidates: Vec<String>,

    /// Report reference cycles for the whole document
    #[serde(default = "default_true")]
    pub report_cycles: bool,

    /// Treat warnings as failures
    #[serde(default)]
    pub fail_on_warnings: bool,
}

/// Report configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Pretty,
    Compact,
}

// Default value functions
fn default_reference_prefixes() -> Vec<String> {
    vec![
        "#/definitions/".to_string(),
        "#/components/schemas/".to_string(),
    ]
}

fn default_skip_prefixes() -> Vec<String> {
    vec![
        "target/".to_string(),
        ".git/".to_string(),
        "node_modules/".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            reference_prefixes: default_reference_prefixes(),
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            discriminator_candidates: Vec::new(),
            report_cycles: true,
            fail_on_warnings: false,
        }
    }
}

impl AnalysisConfig {
    /// Candidate names as borrowed slices
    pub fn candidates(&self) -> Vec<&str> {
        self.discriminator_candidates.iter().map(String::as_str).collect()
    }
}

impl CompositionConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "composition.toml",
            ".composition.toml",
            "config/composition.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "swagger", "composition") {
            let xdg_config = dirs.config_dir().join("composition.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // COMPOSITION__ANALYSIS__FAIL_ON_WARNINGS=true etc.
        builder = builder.add_source(
            Environment::with_prefix("COMPOSITION")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

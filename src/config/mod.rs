//! Layered settings.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file,
//! `KBM_*` environment variables, then command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::budget::{BudgetConfig, TokenCost};
use crate::ledger::DEFAULT_LEDGER_FILE;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "kb-migrate.toml";

/// Prefix of environment variables, e.g. `KBM_API_TOKEN`.
pub const ENV_PREFIX: &str = "KBM";

pub const DEFAULT_API_URL: &str = "https://app.getoutline.com/api";
pub const DEFAULT_TRANSLATION_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting '{0}' (set it in kb-migrate.toml or as KBM_{upper})", upper = .0.to_uppercase())]
    Missing(&'static str),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Values given on the command line. `None`/`false` leaves lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_collection: Option<String>,
    pub destination_collection: Option<String>,
    pub batch_size: Option<usize>,
    pub max_spending: Option<f64>,
    pub dry_run: bool,
    pub force_translate: bool,
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub source_collection: Option<String>,
    pub destination_collection: Option<String>,
    pub translation_api_url: String,
    pub translation_api_key: Option<String>,
    pub model: String,
    pub target_language: String,
    /// Spending ceiling in USD
    pub max_spending: Option<f64>,
    pub batch_size: Option<usize>,
    pub dry_run: bool,
    pub ledger_path: PathBuf,
    pub request_delay_ms: u64,
    pub input_cost_per_million: Option<f64>,
    pub output_cost_per_million: Option<f64>,
    pub force_translate: bool,
}

impl Settings {
    /// Load settings from `config_path` (must exist) or from
    /// [`DEFAULT_CONFIG_FILE`] in the working directory if present.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> ConfigResult<Self> {
        let (file, required) = match config_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        Self::build(&file, required, None, overrides)
    }

    /// `environment` replaces the process environment when given.
    fn build(
        file: &Path,
        required: bool,
        environment: Option<::config::Map<String, String>>,
        overrides: &Overrides,
    ) -> ConfigResult<Self> {
        let settings = Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("translation_api_url", DEFAULT_TRANSLATION_API_URL)?
            .set_default("model", DEFAULT_MODEL)?
            .set_default("target_language", DEFAULT_TARGET_LANGUAGE)?
            .set_default("dry_run", false)?
            .set_default("force_translate", false)?
            .set_default("ledger_path", DEFAULT_LEDGER_FILE)?
            .set_default("request_delay_ms", DEFAULT_REQUEST_DELAY_MS)?
            .add_source(File::from(file).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(environment),
            )
            .set_override_option("source_collection", overrides.source_collection.clone())?
            .set_override_option(
                "destination_collection",
                overrides.destination_collection.clone(),
            )?
            .set_override_option("batch_size", overrides.batch_size.map(|n| n as u64))?
            .set_override_option("max_spending", overrides.max_spending)?
            .set_override_option("dry_run", overrides.dry_run.then_some(true))?
            .set_override_option("force_translate", overrides.force_translate.then_some(true))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn api_token(&self) -> ConfigResult<&str> {
        required(&self.api_token, "api_token")
    }

    pub fn source_collection(&self) -> ConfigResult<&str> {
        required(&self.source_collection, "source_collection")
    }

    pub fn destination_collection(&self) -> ConfigResult<&str> {
        required(&self.destination_collection, "destination_collection")
    }

    pub fn translation_api_key(&self) -> ConfigResult<&str> {
        required(&self.translation_api_key, "translation_api_key")
    }

    /// Model pricing, with explicit per-million prices taking precedence.
    pub fn pricing(&self) -> TokenCost {
        let mut cost = TokenCost::for_model(&self.model);
        if let Some(input) = self.input_cost_per_million {
            cost.input_cost_per_million = input;
        }
        if let Some(output) = self.output_cost_per_million {
            cost.output_cost_per_million = output;
        }
        cost
    }

    pub fn budget(&self) -> BudgetConfig {
        let budget = BudgetConfig::new(self.pricing());
        match self.max_spending {
            Some(ceiling) => budget.with_max_spending(ceiling),
            None => budget,
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Blank values count as missing.
fn required<'a>(value: &'a Option<String>, key: &'static str) -> ConfigResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Option<::config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn load(file: &Path, environment: &[(&str, &str)], overrides: &Overrides) -> Settings {
        Settings::build(file, false, env(environment), overrides).expect("settings")
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().expect("temp dir");
        let settings = load(&temp_dir.path().join("absent.toml"), &[], &Overrides::default());

        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.target_language, "en");
        assert_eq!(settings.ledger_path, PathBuf::from(DEFAULT_LEDGER_FILE));
        assert_eq!(settings.request_delay(), Duration::from_secs(1));
        assert!(!settings.dry_run);
        assert!(settings.max_spending.is_none());
        assert!(settings.budget().max_spending.is_none());
    }

    #[test]
    fn test_layers_override_in_order() {
        let temp_dir = TempDir::new().expect("temp dir");
        let file = temp_dir.path().join("kb-migrate.toml");
        fs::write(
            &file,
            r#"
source_collection = "from-file"
destination_collection = "dest-file"
model = "gpt-4o"
batch_size = 5
"#,
        )
        .expect("write config");

        let settings = load(
            &file,
            &[("KBM_SOURCE_COLLECTION", "from-env"), ("KBM_MAX_SPENDING", "2.5")],
            &Overrides {
                batch_size: Some(10),
                ..Overrides::default()
            },
        );

        assert_eq!(settings.source_collection().expect("source"), "from-env");
        assert_eq!(settings.destination_collection().expect("dest"), "dest-file");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.batch_size, Some(10));
        assert_eq!(settings.max_spending, Some(2.5));
    }

    #[test]
    fn test_cli_flags_win() {
        let temp_dir = TempDir::new().expect("temp dir");
        let settings = load(
            &temp_dir.path().join("absent.toml"),
            &[("KBM_SOURCE_COLLECTION", "from-env"), ("KBM_DRY_RUN", "false")],
            &Overrides {
                source_collection: Some("from-cli".to_string()),
                max_spending: Some(0.5),
                dry_run: true,
                ..Overrides::default()
            },
        );

        assert_eq!(settings.source_collection().expect("source"), "from-cli");
        assert!(settings.dry_run);
        assert_eq!(settings.budget().max_spending, Some(0.5));
    }

    #[test]
    fn test_missing_and_blank_required_values() {
        let temp_dir = TempDir::new().expect("temp dir");
        let settings = load(
            &temp_dir.path().join("absent.toml"),
            &[("KBM_API_TOKEN", "  ")],
            &Overrides::default(),
        );

        assert!(matches!(settings.api_token(), Err(ConfigError::Missing("api_token"))));
        let err = settings.translation_api_key().unwrap_err();
        assert!(err.to_string().contains("KBM_TRANSLATION_API_KEY"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let temp_dir = TempDir::new().expect("temp dir");
        let result = Settings::load(
            Some(&temp_dir.path().join("missing.toml")),
            &Overrides::default(),
        );
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_pricing_overrides() {
        let temp_dir = TempDir::new().expect("temp dir");
        let settings = load(
            &temp_dir.path().join("absent.toml"),
            &[("KBM_INPUT_COST_PER_MILLION", "1.0")],
            &Overrides::default(),
        );

        let pricing = settings.pricing();
        let preset = TokenCost::for_model(DEFAULT_MODEL);
        assert_eq!(pricing.input_cost_per_million, 1.0);
        assert_eq!(pricing.output_cost_per_million, preset.output_cost_per_million);
    }
}

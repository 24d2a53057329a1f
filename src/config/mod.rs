use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::currency::{CurrencyCode, LocaleConfig};
use crate::errors::LedgerError;
use crate::ledger::IntensityThresholds;
use crate::utils::paths::{app_data_dir, config_file_in, ensure_dir, write_atomic};

/// Keys accepted by [`Config::set`].
pub const CONFIG_KEYS: [&str; 4] = ["locale", "currency", "intensity.medium", "intensity.high"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default)]
    pub intensity: IntensityThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "es-AR".into(),
            currency: "ARS".into(),
            intensity: IntensityThresholds::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), LedgerError> {
        LocaleConfig::from_tag(&self.locale)?;
        let code = self.currency.trim();
        if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(LedgerError::Config(format!(
                "currency `{}` is not a three-letter code",
                self.currency
            )));
        }
        self.intensity
            .validate()
            .map_err(|err| LedgerError::Config(err.to_string()))
    }

    pub fn locale_config(&self) -> LocaleConfig {
        LocaleConfig::from_tag(&self.locale).unwrap_or_default()
    }

    pub fn currency_code(&self) -> CurrencyCode {
        CurrencyCode::new(self.currency.trim())
    }

    /// Updates one setting from its textual form and re-validates.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), LedgerError> {
        let mut updated = self.clone();
        match key {
            "locale" => updated.locale = LocaleConfig::from_tag(value)?.language_tag,
            "currency" => updated.currency = value.trim().to_uppercase(),
            "intensity.medium" => updated.intensity.medium = parse_threshold(key, value)?,
            "intensity.high" => updated.intensity.high = parse_threshold(key, value)?,
            other => {
                return Err(LedgerError::Config(format!(
                    "unknown setting `{}` (expected one of {})",
                    other,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse_threshold(key: &str, value: &str) -> Result<f64, LedgerError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| LedgerError::Config(format!("`{}` is not a number for {}", value, key)))
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Reads the config file, falling back to defaults when absent.
    pub fn load(&self) -> Result<Config, LedgerError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), LedgerError> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

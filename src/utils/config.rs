//! Normalizer configuration
//! Defaults match the reference data layout; every value can be overridden
//! from the environment.

use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::matching::address::{DEFAULT_ADDRESS_THRESHOLD, DEFAULT_PARTIAL_THRESHOLD};
use crate::matching::matcher::{ScorerKind, DEFAULT_MATCH_THRESHOLD};
use crate::validation::phone::DEFAULT_COUNTRY_CODE;

pub const DEFAULT_MASTER_DIR: &str = "Data/training";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    pub master_dir: PathBuf,
    pub match_threshold: f64,
    pub address_threshold: f64,
    pub partial_address_threshold: f64,
    pub phone_country_code: String,
    pub default_country: Option<String>,
    pub default_native_state: Option<String>,
    pub scorer: ScorerKind,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            master_dir: PathBuf::from(DEFAULT_MASTER_DIR),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            address_threshold: DEFAULT_ADDRESS_THRESHOLD,
            partial_address_threshold: DEFAULT_PARTIAL_THRESHOLD,
            phone_country_code: DEFAULT_COUNTRY_CODE.to_string(),
            default_country: None,
            default_native_state: None,
            scorer: ScorerKind::TokenSet,
        }
    }
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}='{}'", name, raw);
            default
        }),
        Err(_) => default,
    }
}

fn threshold_var(name: &str, default: f64) -> f64 {
    let value = parsed_var(name, default);
    if (0.0..=100.0).contains(&value) {
        value
    } else {
        warn!("{}={} is outside 0-100; using {}", name, value, default);
        default
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NormalizerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let phone_country_code = optional_var("PHONE_COUNTRY_CODE")
            .map(|cc| cc.trim_start_matches('+').to_string())
            .filter(|cc| !cc.is_empty() && cc.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(defaults.phone_country_code);

        Self {
            master_dir: optional_var("MASTER_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.master_dir),
            match_threshold: threshold_var("MATCH_THRESHOLD", defaults.match_threshold),
            address_threshold: threshold_var("ADDRESS_MATCH_THRESHOLD", defaults.address_threshold),
            partial_address_threshold: threshold_var(
                "PARTIAL_ADDRESS_THRESHOLD",
                defaults.partial_address_threshold,
            ),
            phone_country_code,
            default_country: optional_var("DEFAULT_COUNTRY"),
            default_native_state: optional_var("DEFAULT_NATIVE_STATE"),
            scorer: parsed_var("MATCH_SCORER", defaults.scorer),
        }
    }

    pub fn with_master_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.master_dir = dir.into();
        self
    }

    pub fn log_config(&self) {
        info!("Normalizer configuration:");
        info!("  Master data directory: {}", self.master_dir.display());
        info!(
            "  Thresholds: match={:.0}, address={:.0}, partial address={:.0}",
            self.match_threshold, self.address_threshold, self.partial_address_threshold
        );
        info!("  Scorer: {}", self.scorer);
        info!("  Phone country code: +{}", self.phone_country_code);
        info!(
            "  Defaults: country={}, native state={}",
            self.default_country.as_deref().unwrap_or("(none)"),
            self.default_native_state.as_deref().unwrap_or("(none)")
        );
    }
}

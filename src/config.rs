//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file with environment variables for
//! secrets: `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`, and the optional
//! `ITAD_API_KEY` (historical-low checks and the ITAD feed are disabled
//! without it).

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapter::outbound::cheapshark::DealFilters;
use crate::adapter::outbound::frankfurter::RateCacheConfig;
use crate::adapter::outbound::itad::ItadFilters;
use crate::adapter::outbound::telegram::TelegramConfig;
use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(default)]
    pub filters: FilterSettings,
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub currency: CurrencySettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Secrets loaded from the environment at runtime (never from the
    /// config file).
    #[serde(skip)]
    pub secrets: Secrets,
}

/// Telegram posting behavior. The token and chat id come from the
/// environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramSettings {
    /// Post deals into per-category threads.
    #[serde(default)]
    pub use_threads: bool,
}

/// Deal filtering thresholds shared by the discount sources.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterSettings {
    #[serde(default = "default_max_price")]
    pub max_price_usd: Decimal,
    /// CheapShark deal-rating floor (0-10 scale); unrated deals pass.
    #[serde(default = "default_min_rating")]
    pub min_deal_rating: f64,
    #[serde(default = "default_min_discount")]
    pub min_discount_percent: u8,
}

fn default_max_price() -> Decimal {
    Decimal::from(20)
}

fn default_min_rating() -> f64 {
    8.0
}

const fn default_min_discount() -> u8 {
    50
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            max_price_usd: default_max_price(),
            min_deal_rating: default_min_rating(),
            min_discount_percent: default_min_discount(),
        }
    }
}

/// Polling cadence and per-source options.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_cheapshark_hours")]
    pub cheapshark_interval_hours: u64,
    #[serde(default = "default_epic_hours")]
    pub epic_interval_hours: u64,
    #[serde(default = "default_itad_hours")]
    pub itad_interval_hours: u64,
    /// ITAD country codes; the first listed wins on cross-region duplicates.
    #[serde(default = "default_countries")]
    pub itad_countries: Vec<String>,
    #[serde(default = "default_itad_limit")]
    pub itad_limit: usize,
    /// Keep ITAD software/course entries instead of dropping them.
    #[serde(default)]
    pub itad_include_non_games: bool,
}

const fn default_cheapshark_hours() -> u64 {
    2
}

const fn default_epic_hours() -> u64 {
    24
}

const fn default_itad_hours() -> u64 {
    2
}

fn default_countries() -> Vec<String> {
    vec!["US".to_string()]
}

const fn default_itad_limit() -> usize {
    100
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            cheapshark_interval_hours: default_cheapshark_hours(),
            epic_interval_hours: default_epic_hours(),
            itad_interval_hours: default_itad_hours(),
            itad_countries: default_countries(),
            itad_limit: default_itad_limit(),
            itad_include_non_games: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_db_path() -> String {
    "deals.db".to_string()
}

const fn default_retention_days() -> i64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            retention_days: default_retention_days(),
        }
    }
}

/// Multi-currency price display.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencySettings {
    #[serde(default = "default_base_currency")]
    pub base: String,
    #[serde(default = "default_target_currencies")]
    pub targets: Vec<String>,
    #[serde(default = "default_rates_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_target_currencies() -> Vec<String> {
    vec!["CAD".to_string(), "EUR".to_string(), "GBP".to_string()]
}

const fn default_rates_ttl_secs() -> u64 {
    3600
}

impl Default for CurrencySettings {
    fn default() -> Self {
        Self {
            base: default_base_currency(),
            targets: default_target_currencies(),
            ttl_secs: default_rates_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Secrets sourced from the environment.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub telegram_bot_token: String,
    pub telegram_chat_id: i64,
    /// Empty when unset; disables the ITAD feed and historical-low checks.
    pub itad_api_key: String,
}

impl Secrets {
    fn from_env() -> Result<Self> {
        let telegram_bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnv {
                var: "TELEGRAM_BOT_TOKEN",
            })?;
        let telegram_chat_id = std::env::var("TELEGRAM_CHAT_ID")
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or(ConfigError::MissingEnv {
                var: "TELEGRAM_CHAT_ID",
            })?;
        let itad_api_key = std::env::var("ITAD_API_KEY").unwrap_or_default();

        Ok(Self {
            telegram_bot_token,
            telegram_chat_id,
            itad_api_key,
        })
    }
}

impl Config {
    /// Load configuration from a TOML file plus environment secrets.
    ///
    /// # Errors
    /// Returns an error when the file is unreadable, fails to parse, fails
    /// validation, or a required environment variable is missing. All of
    /// these are fatal before any scheduling begins.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let secrets = Secrets::from_env()?;
        Self::from_toml(&content, secrets)
    }

    fn from_toml(content: &str, secrets: Secrets) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.secrets = secrets;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.filters.max_price_usd <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "filters.max_price_usd",
                reason: "must be positive".into(),
            }
            .into());
        }
        if self.filters.min_discount_percent > 100 {
            return Err(ConfigError::InvalidValue {
                field: "filters.min_discount_percent",
                reason: "must be 0-100".into(),
            }
            .into());
        }
        if self.sources.itad_countries.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sources.itad_countries",
                reason: "must list at least one country".into(),
            }
            .into());
        }
        if self.database.retention_days <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.retention_days",
                reason: "must be positive".into(),
            }
            .into());
        }
        for field in [
            ("cheapshark_interval_hours", self.sources.cheapshark_interval_hours),
            ("epic_interval_hours", self.sources.epic_interval_hours),
            ("itad_interval_hours", self.sources.itad_interval_hours),
        ] {
            if field.1 == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "sources intervals",
                    reason: format!("{} must be positive", field.0),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }

    /// Telegram transport configuration from the loaded secrets.
    #[must_use]
    pub fn telegram_transport(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.secrets.telegram_bot_token.clone(),
            chat_id: self.secrets.telegram_chat_id,
        }
    }

    /// CheapShark filter set.
    #[must_use]
    pub fn deal_filters(&self) -> DealFilters {
        DealFilters {
            max_price_usd: self.filters.max_price_usd,
            min_deal_rating: self.filters.min_deal_rating,
            min_discount_percent: self.filters.min_discount_percent,
        }
    }

    /// ITAD feed filter set.
    #[must_use]
    pub fn itad_filters(&self) -> ItadFilters {
        ItadFilters {
            countries: self.sources.itad_countries.clone(),
            max_price_usd: self.filters.max_price_usd,
            min_discount_percent: self.filters.min_discount_percent,
            limit: self.sources.itad_limit,
            include_non_games: self.sources.itad_include_non_games,
        }
    }

    /// Rate-cache configuration.
    #[must_use]
    pub fn rate_cache(&self) -> RateCacheConfig {
        RateCacheConfig {
            base: self.currency.base.clone(),
            targets: self.currency.targets.clone(),
            ttl: Duration::from_secs(self.currency.ttl_secs),
        }
    }

    /// Posted-record retention window.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.database.retention_days)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramSettings::default(),
            filters: FilterSettings::default(),
            sources: SourceSettings::default(),
            database: DatabaseSettings::default(),
            currency: CurrencySettings::default(),
            logging: LoggingConfig::default(),
            secrets: Secrets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn secrets() -> Secrets {
        Secrets {
            telegram_bot_token: "token".to_string(),
            telegram_chat_id: 42,
            itad_api_key: String::new(),
        }
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("", secrets()).unwrap();

        assert!(!config.telegram.use_threads);
        assert_eq!(config.filters.max_price_usd, dec!(20));
        assert_eq!(config.filters.min_discount_percent, 50);
        assert_eq!(config.sources.cheapshark_interval_hours, 2);
        assert_eq!(config.sources.epic_interval_hours, 24);
        assert_eq!(config.database.path, "deals.db");
        assert_eq!(config.database.retention_days, 30);
        assert_eq!(config.currency.targets, vec!["CAD", "EUR", "GBP"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let toml = r#"
            [telegram]
            use_threads = true

            [filters]
            max_price_usd = 15.0
            min_discount_percent = 60

            [sources]
            itad_countries = ["DE", "US"]

            [database]
            path = "/var/lib/dealhound/deals.db"
        "#;
        let config = Config::from_toml(toml, secrets()).unwrap();

        assert!(config.telegram.use_threads);
        assert_eq!(config.filters.max_price_usd, dec!(15));
        assert_eq!(config.filters.min_discount_percent, 60);
        assert_eq!(config.sources.itad_countries, vec!["DE", "US"]);
        assert_eq!(config.database.path, "/var/lib/dealhound/deals.db");
        // Untouched sections keep their defaults.
        assert_eq!(config.sources.epic_interval_hours, 24);
    }

    #[test]
    fn rejects_invalid_values() {
        let zero_price = "[filters]\nmax_price_usd = 0.0\n";
        assert!(Config::from_toml(zero_price, secrets()).is_err());

        let silly_discount = "[filters]\nmin_discount_percent = 101\n";
        assert!(Config::from_toml(silly_discount, secrets()).is_err());

        let no_countries = "[sources]\nitad_countries = []\n";
        assert!(Config::from_toml(no_countries, secrets()).is_err());

        let zero_interval = "[sources]\ncheapshark_interval_hours = 0\n";
        assert!(Config::from_toml(zero_interval, secrets()).is_err());

        let zero_retention = "[database]\nretention_days = 0\n";
        assert!(Config::from_toml(zero_retention, secrets()).is_err());
    }

    #[test]
    fn filter_accessors_mirror_settings() {
        let config = Config::from_toml("", secrets()).unwrap();

        let deal_filters = config.deal_filters();
        assert_eq!(deal_filters.max_price_usd, dec!(20));
        assert_eq!(deal_filters.min_discount_percent, 50);

        let itad_filters = config.itad_filters();
        assert_eq!(itad_filters.countries, vec!["US"]);
        assert_eq!(itad_filters.limit, 100);

        assert_eq!(config.retention(), chrono::Duration::days(30));
    }
}

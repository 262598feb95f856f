//! Runtime configuration
//!
//! Loaded once at startup from a TOML file (or taken from `Config::default()`)
//! and handed to each component at construction. Secrets are read from the
//! environment so the file can be committed.

use crate::{
    constants::{
        BINANCE_API_URL, BOT_TOKEN_ENV, CHAT_ID_ENV, COINGECKO_API_URL, DEFAULT_FONT_SIZE,
        DEFAULT_PARSE_MODE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STATE_FILE, DEFAULT_TICK_SECS,
        TELEGRAM_API_URL,
    },
    error::ConfigError,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds to sleep between polls
    pub tick_seconds: u64,
    /// Per-request network timeout
    pub request_timeout_secs: u64,
    /// Where the last posted prices are kept
    pub state_file: PathBuf,
    /// Line appended to every caption (e.g. a channel tag)
    pub footer: Option<String>,
    pub telegram: TelegramConfig,
    pub providers: ProvidersConfig,
    pub image: ImageConfig,
    /// Symbols in the order they are processed each tick
    pub symbols: Vec<SymbolConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_url: String,
    /// Overridden by `TELEGRAM_BOT_TOKEN`
    pub bot_token: Option<String>,
    /// Overridden by `TELEGRAM_CHAT_ID`
    pub chat_id: Option<String>,
    pub parse_mode: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub coingecko_url: String,
    pub binance_url: String,
    /// Skip the Binance fallback entirely
    pub fallback_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// TTF/OTF used to draw prices onto templates
    pub font_path: Option<PathBuf>,
    pub font_size: f64,
    /// RGB text color
    pub color: [u8; 3],
}

/// Schedule and lookup settings for one symbol
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub interval_seconds: u64,
    /// CoinGecko asset ids, first match wins
    #[serde(default)]
    pub coingecko_ids: Vec<String>,
    /// Binance ticker symbols, first match wins
    #[serde(default)]
    pub ticker_symbols: Vec<String>,
    /// Template image; without one the symbol is posted as text
    #[serde(default)]
    pub template: Option<PathBuf>,
    /// Pixel the price text is centered on
    #[serde(default)]
    pub anchor: Option<(i32, i32)>,
}

impl SymbolConfig {
    /// Creates a text-only symbol with one lookup key per provider
    pub fn new(symbol: &str, interval_seconds: u64, coingecko_id: &str, ticker: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            interval_seconds,
            coingecko_ids: vec![coingecko_id.to_string()],
            ticker_symbols: vec![ticker.to_string()],
            template: None,
            anchor: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Config {
    /// Loads and validates a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parses and validates TOML content
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID` on top of the file values
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat_id) = std::env::var(CHAT_ID_ENV) {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// True when any symbol is rendered onto a template
    pub fn uses_images(&self) -> bool {
        self.symbols.iter().any(|s| s.template.is_some())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_seconds == 0 {
            return Err(ConfigError::invalid("tick_seconds", "must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "request_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::MissingField { field: "symbols" });
        }

        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.symbol.trim().is_empty() {
                return Err(ConfigError::invalid("symbol", "cannot be empty"));
            }
            if !seen.insert(symbol.symbol.as_str()) {
                return Err(ConfigError::invalid(
                    "symbol",
                    format!("{} is listed more than once", symbol.symbol),
                ));
            }
            if symbol.interval_seconds == 0 {
                return Err(ConfigError::invalid(
                    "interval_seconds",
                    format!("{} must have an interval greater than 0", symbol.symbol),
                ));
            }
            if symbol.coingecko_ids.is_empty() && symbol.ticker_symbols.is_empty() {
                return Err(ConfigError::invalid(
                    "coingecko_ids",
                    format!("{} has no lookup keys for any provider", symbol.symbol),
                ));
            }
            if symbol.template.is_some() && symbol.anchor.is_none() {
                return Err(ConfigError::invalid(
                    "anchor",
                    format!("{} has a template but no anchor", symbol.symbol),
                ));
            }
        }

        if self.uses_images() {
            if self.image.font_path.is_none() {
                return Err(ConfigError::MissingField {
                    field: "image.font_path",
                });
            }
            if self.image.font_size <= 0.0 {
                return Err(ConfigError::invalid("image.font_size", "must be positive"));
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_seconds: DEFAULT_TICK_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            footer: None,
            telegram: TelegramConfig::default(),
            providers: ProvidersConfig::default(),
            image: ImageConfig::default(),
            symbols: vec![
                SymbolConfig::new("BTC", 120, "bitcoin", "BTCUSDT"),
                SymbolConfig::new("ETH", 300, "ethereum", "ETHUSDT"),
                SymbolConfig {
                    coingecko_ids: vec!["toncoin".into(), "the-open-network".into()],
                    ..SymbolConfig::new("TON", 600, "toncoin", "TONUSDT")
                },
                SymbolConfig::new("LTC", 900, "litecoin", "LTCUSDT"),
            ],
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: TELEGRAM_API_URL.to_string(),
            bot_token: None,
            chat_id: None,
            parse_mode: DEFAULT_PARSE_MODE.to_string(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            coingecko_url: COINGECKO_API_URL.to_string(),
            binance_url: BINANCE_API_URL.to_string(),
            fallback_enabled: true,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: DEFAULT_FONT_SIZE,
            color: [255, 255, 255],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_seconds, 30);

        let intervals: Vec<_> = config
            .symbols
            .iter()
            .map(|s| (s.symbol.as_str(), s.interval_seconds))
            .collect();
        assert_eq!(
            intervals,
            vec![("BTC", 120), ("ETH", 300), ("TON", 600), ("LTC", 900)]
        );
        assert!(!config.uses_images());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
tick_seconds = 10
state_file = "/tmp/prices.json"
footer = "@cryptoprics"

[telegram]
chat_id = "-1001"

[providers]
fallback_enabled = false

[image]
font_path = "fonts/Inter-Bold.ttf"
font_size = 96.0
color = [10, 20, 30]

[[symbols]]
symbol = "BTC"
interval_seconds = 120
coingecko_ids = ["bitcoin"]
template = "templates/btc.png"
anchor = [540, 610]

[[symbols]]
symbol = "TON"
interval_seconds = 600
coingecko_ids = ["toncoin", "the-open-network"]
ticker_symbols = ["TONUSDT"]
"#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.tick_seconds, 10);
        assert_eq!(config.footer.as_deref(), Some("@cryptoprics"));
        assert_eq!(config.telegram.chat_id.as_deref(), Some("-1001"));
        assert_eq!(config.telegram.api_url, TELEGRAM_API_URL);
        assert!(!config.providers.fallback_enabled);
        assert_eq!(config.image.color, [10, 20, 30]);
        assert_eq!(config.symbols.len(), 2);
        assert_eq!(config.symbols[0].anchor, Some((540, 610)));
        assert_eq!(config.symbols[1].coingecko_ids.len(), 2);
        assert!(config.symbols[1].template.is_none());
        assert!(config.uses_images());
        // unspecified fields keep their defaults
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_rejects_duplicate_symbols() {
        let toml = r#"
[[symbols]]
symbol = "BTC"
interval_seconds = 120
coingecko_ids = ["bitcoin"]

[[symbols]]
symbol = "BTC"
interval_seconds = 300
coingecko_ids = ["bitcoin"]
"#;
        match Config::from_toml(toml) {
            Err(ConfigError::InvalidValue { field: "symbol", .. }) => {}
            other => panic!("expected duplicate symbol error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_interval() {
        let toml = r#"
[[symbols]]
symbol = "ETH"
interval_seconds = 0
coingecko_ids = ["ethereum"]
"#;
        match Config::from_toml(toml) {
            Err(ConfigError::InvalidValue {
                field: "interval_seconds",
                ..
            }) => {}
            other => panic!("expected interval error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_symbol_without_keys() {
        let toml = r#"
[[symbols]]
symbol = "ETH"
interval_seconds = 60
"#;
        assert!(matches!(
            Config::from_toml(toml),
            Err(ConfigError::InvalidValue { field: "coingecko_ids", .. })
        ));
    }

    #[test]
    fn test_template_requires_font_and_anchor() {
        let no_anchor = r#"
[image]
font_path = "font.ttf"

[[symbols]]
symbol = "BTC"
interval_seconds = 60
coingecko_ids = ["bitcoin"]
template = "btc.png"
"#;
        assert!(matches!(
            Config::from_toml(no_anchor),
            Err(ConfigError::InvalidValue { field: "anchor", .. })
        ));

        let no_font = r#"
[[symbols]]
symbol = "BTC"
interval_seconds = 60
coingecko_ids = ["bitcoin"]
template = "btc.png"
anchor = [100, 100]
"#;
        assert!(matches!(
            Config::from_toml(no_font),
            Err(ConfigError::MissingField {
                field: "image.font_path"
            })
        ));
    }

    #[test]
    fn test_rejects_empty_symbol_list() {
        assert!(matches!(
            Config::from_toml("symbols = []"),
            Err(ConfigError::MissingField { field: "symbols" })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/definitely/not/here.toml"),
            Err(ConfigError::ReadFile(_))
        ));
    }
}

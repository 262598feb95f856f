//! Default values for the price poster
//!
//! Everything here can be overridden through the TOML configuration; these
//! are only the values `Config::default()` starts from.

/// How often the main loop polls prices (in seconds)
pub const DEFAULT_TICK_SECS: u64 = 30;

/// HTTP request timeout for price fetches and posts (in seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// File holding the last posted price per symbol
pub const DEFAULT_STATE_FILE: &str = "price_history.json";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// Binance API base URL
pub const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

/// Binance endpoint for a single symbol's latest price
pub const BINANCE_TICKER_PRICE_ENDPOINT: &str = "/ticker/price";

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Markup mode for captions
pub const DEFAULT_PARSE_MODE: &str = "HTML";

/// Font size used when drawing prices onto templates (in pixels)
pub const DEFAULT_FONT_SIZE: f64 = 72.0;

/// Font family name the image renderer registers its font under
pub const FONT_FAMILY: &str = "price-poster";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "price-poster/0.1.0";

/// Environment variable holding the Telegram bot token
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the Telegram chat id
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

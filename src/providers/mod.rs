//! Price provider implementations

pub mod binance;
pub mod coingecko;
pub mod failover;

pub use binance::BinanceTickerProvider;
pub use coingecko::CoinGeckoProvider;
pub use failover::FailoverProvider;

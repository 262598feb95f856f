//! # Price Poster
//!
//! Polls cryptocurrency prices on a fixed tick and republishes them to a
//! Telegram channel, either as a formatted text message or as a template
//! image with the price drawn on it.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler (ticks every N seconds)
//!     ↓
//! FailoverProvider (CoinGecko → Binance ticker)
//!     ↓  for each symbol whose interval elapsed
//! Renderer (text or template image)
//!     ↓
//! Publisher (Telegram)
//!     ↓  only on success
//! PriceStore (last posted price, JSON file)
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use price_poster::scheduler::ctrl_c_shutdown;
//! use price_poster::{Config, Scheduler};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load("price-poster.toml")?;
//! config.apply_env();
//!
//! let shutdown = ctrl_c_shutdown().await;
//! let mut scheduler = Scheduler::from_config(&config, false)?;
//! scheduler.run(shutdown).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Nothing that goes wrong inside a tick stops the loop. A failed fetch skips
//! the tick, a failed render skips the symbol, and a failed publish leaves the
//! symbol ready for the next tick. A failed save keeps the in-memory state.
//! Each of these is only logged.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod publisher;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{Config, SymbolConfig};
pub use error::{ConfigError, ProviderError, PublishError, RenderError, StoreError};
pub use provider::{PriceProvider, QuoteMap};
pub use publisher::Publisher;
pub use render::{Artifact, Renderer};
pub use scheduler::{Eligibility, Scheduler, TickReport};
pub use store::{PostState, PriceStore};
pub use types::{Direction, PriceQuote};

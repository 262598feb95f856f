//! Provider abstraction for fetching prices from external APIs

use crate::{config::SymbolConfig, error::ProviderError, types::PriceQuote};
use async_trait::async_trait;
use std::collections::HashMap;

/// Quotes keyed by display symbol
pub type QuoteMap = HashMap<String, PriceQuote>;

/// Trait for price providers
///
/// Implementations normalize their own response shape into [`PriceQuote`]s
/// keyed by the configured display symbol.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetches quotes for every symbol in a single pass
    ///
    /// # Arguments
    /// * `symbols` - The symbols to fetch, with their provider lookup keys
    ///
    /// # Returns
    /// Quotes for the symbols the provider could resolve. Symbols it could
    /// not resolve are simply absent; an error means nothing usable came back.
    async fn fetch_quotes(&self, symbols: &[SymbolConfig]) -> Result<QuoteMap, ProviderError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Names of the requested symbols missing from `quotes`
pub fn missing_symbols(symbols: &[SymbolConfig], quotes: &QuoteMap) -> Vec<String> {
    symbols
        .iter()
        .filter(|s| !quotes.contains_key(&s.symbol))
        .map(|s| s.symbol.clone())
        .collect()
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Mutex};

    /// Mock provider for testing
    #[derive(Clone)]
    pub struct MockProvider {
        name: &'static str,
        quotes: Arc<Mutex<QuoteMap>>,
        failing: Arc<Mutex<bool>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                quotes: Arc::new(Mutex::new(HashMap::new())),
                failing: Arc::new(Mutex::new(false)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_price(&self, symbol: &str, price: Decimal, change_24h: Option<Decimal>) {
            let quote = PriceQuote::with_change(symbol, price, change_24h, self.name);
            self.quotes.lock().unwrap().insert(symbol.to_string(), quote);
        }

        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl PriceProvider for MockProvider {
        async fn fetch_quotes(
            &self,
            symbols: &[SymbolConfig],
        ) -> Result<QuoteMap, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            if *self.failing.lock().unwrap() {
                return Err(ProviderError::ApiError("HTTP 503".to_string()));
            }

            let quotes = self.quotes.lock().unwrap();
            let result: QuoteMap = symbols
                .iter()
                .filter_map(|s| quotes.get(&s.symbol).map(|q| (s.symbol.clone(), q.clone())))
                .collect();

            if result.is_empty() {
                Err(ProviderError::InvalidResponse(
                    "No prices available".to_string(),
                ))
            } else {
                Ok(result)
            }
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}

//! Failover price provider implementation

use crate::{
    config::SymbolConfig,
    error::ProviderError,
    provider::{missing_symbols, PriceProvider, QuoteMap},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Price provider that tries multiple providers in order until every
/// requested symbol has a quote.
///
/// Quotes from earlier providers are kept; later providers are only asked
/// for the symbols still missing. Whatever is still unresolved after the
/// last provider is skipped for this tick.
pub struct FailoverProvider {
    providers: Vec<Arc<dyn PriceProvider>>,
}

impl FailoverProvider {
    /// Creates a new failover provider with a list of providers
    ///
    /// The providers are tried in the order they are provided.
    pub fn new(providers: Vec<Arc<dyn PriceProvider>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl PriceProvider for FailoverProvider {
    async fn fetch_quotes(&self, symbols: &[SymbolConfig]) -> Result<QuoteMap, ProviderError> {
        let mut merged = QuoteMap::new();
        let mut last_error = None;

        for provider in &self.providers {
            let pending: Vec<SymbolConfig> = symbols
                .iter()
                .filter(|s| !merged.contains_key(&s.symbol))
                .cloned()
                .collect();
            if pending.is_empty() {
                break;
            }

            match provider.fetch_quotes(&pending).await {
                Ok(quotes) => {
                    for (symbol, quote) in quotes {
                        merged.entry(symbol).or_insert(quote);
                    }

                    let missing = missing_symbols(&pending, &merged);
                    if !missing.is_empty() {
                        tracing::warn!(
                            provider = provider.provider_name(),
                            missing = %missing.join(","),
                            "Provider response is missing symbols"
                        );
                        last_error = Some(ProviderError::MissingSymbols(missing));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        error = %e,
                        "Provider failed to fetch prices"
                    );
                    last_error = Some(e);
                }
            }
        }

        if !merged.is_empty() || missing_symbols(symbols, &merged).is_empty() {
            return Ok(merged);
        }

        Err(last_error.unwrap_or(ProviderError::NoProviders))
    }

    fn provider_name(&self) -> &'static str {
        "failover"
    }
}

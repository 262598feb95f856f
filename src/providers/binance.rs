//! Binance ticker price provider implementation
//!
//! Used as the fallback source. The ticker endpoint answers one symbol per
//! request with `{"symbol": "...", "price": "<string>"}` and carries no 24h
//! change.

use crate::{
    config::SymbolConfig,
    constants::{BINANCE_TICKER_PRICE_ENDPOINT, USER_AGENT},
    error::ProviderError,
    provider::{PriceProvider, QuoteMap},
    types::{decimal_from_json, PriceQuote},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Binance API response for ticker price queries
#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: serde_json::Value,
}

/// Binance ticker price provider
pub struct BinanceTickerProvider {
    client: Client,
    base_url: String,
}

impl BinanceTickerProvider {
    /// Creates a new Binance provider
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProviderError::NetworkError)?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn build_url(&self, ticker: &str) -> String {
        format!(
            "{}{}?symbol={}",
            self.base_url.trim_end_matches('/'),
            BINANCE_TICKER_PRICE_ENDPOINT,
            ticker
        )
    }

    /// Fetches the price for a single ticker symbol
    async fn fetch_ticker(&self, ticker: &str) -> Result<PriceQuote, ProviderError> {
        let url = self.build_url(ticker);
        tracing::debug!(%url, "Fetching ticker from Binance");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;
        parse_ticker(&response_text, self.provider_name())
    }

    /// Tries each configured ticker in order, first success wins
    async fn fetch_symbol(&self, symbol: &SymbolConfig) -> Result<PriceQuote, ProviderError> {
        let mut last_error = None;

        for ticker in &symbol.ticker_symbols {
            match self.fetch_ticker(ticker).await {
                Ok(mut quote) => {
                    quote.symbol = symbol.symbol.clone();
                    return Ok(quote);
                }
                Err(ProviderError::RateLimitExceeded) => {
                    return Err(ProviderError::RateLimitExceeded);
                }
                Err(e) => {
                    tracing::debug!(
                        symbol = %symbol.symbol,
                        ticker = %ticker,
                        error = %e,
                        "Binance ticker lookup failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::MissingSymbols(vec![symbol.symbol.clone()])))
    }
}

/// Parses a ticker body into a quote; the symbol is filled in by the caller
fn parse_ticker(body: &str, source: &str) -> Result<PriceQuote, ProviderError> {
    let ticker: TickerPriceResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::InvalidResponse(format!(
            "Failed to parse Binance response: {}. Response: {}",
            e, body
        ))
    })?;

    let price = decimal_from_json(&ticker.price).ok_or_else(|| {
        ProviderError::InvalidResponse(format!("Unparseable Binance price: {}", ticker.price))
    })?;

    Ok(PriceQuote::new("", price, source))
}

#[async_trait]
impl PriceProvider for BinanceTickerProvider {
    async fn fetch_quotes(&self, symbols: &[SymbolConfig]) -> Result<QuoteMap, ProviderError> {
        let mut result = HashMap::new();
        let mut last_error = None;

        // One request per symbol, in configuration order
        for symbol in symbols.iter().filter(|s| !s.ticker_symbols.is_empty()) {
            match self.fetch_symbol(symbol).await {
                Ok(quote) => {
                    result.insert(symbol.symbol.clone(), quote);
                }
                Err(ProviderError::RateLimitExceeded) => {
                    tracing::warn!("Binance rate limit hit, stopping ticker lookups");
                    last_error = Some(ProviderError::RateLimitExceeded);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }

        if result.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                ProviderError::InvalidResponse("No prices returned from Binance".to_string())
            }));
        }

        tracing::debug!(count = result.len(), "Fetched prices from Binance");

        Ok(result)
    }

    fn provider_name(&self) -> &'static str {
        "binance"
    }
}

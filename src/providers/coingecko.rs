//! CoinGecko price provider implementation

use crate::{
    config::SymbolConfig,
    constants::{COINGECKO_SIMPLE_PRICE_ENDPOINT, USER_AGENT},
    error::ProviderError,
    provider::{PriceProvider, QuoteMap},
    types::{decimal_from_json, resolve_key, PriceQuote},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API response for simple price queries, keyed by coin id
type CoinGeckoResponse = HashMap<String, CoinGeckoPriceData>;

/// Numbers are kept as raw JSON so they convert to `Decimal` without a
/// detour through `f64` formatting.
#[derive(Debug, Deserialize)]
struct CoinGeckoPriceData {
    usd: Option<serde_json::Value>,
    usd_24h_change: Option<serde_json::Value>,
}

/// CoinGecko price provider
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider
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

    /// Builds the CoinGecko API URL for fetching prices
    ///
    /// Every alternate id is requested so any of them can satisfy the lookup.
    fn build_url(&self, symbols: &[SymbolConfig]) -> String {
        let mut ids: Vec<&str> = Vec::new();
        for id in symbols.iter().flat_map(|s| s.coingecko_ids.iter()) {
            if !ids.contains(&id.as_str()) {
                ids.push(id.as_str());
            }
        }

        format!(
            "{}{}?ids={}&vs_currencies=usd&include_24hr_change=true",
            self.base_url.trim_end_matches('/'),
            COINGECKO_SIMPLE_PRICE_ENDPOINT,
            ids.join(",")
        )
    }

    /// Parses the CoinGecko response into quotes
    fn parse_response(&self, response: CoinGeckoResponse, symbols: &[SymbolConfig]) -> QuoteMap {
        let mut result = HashMap::new();

        for symbol in symbols {
            let Some((id, data)) = resolve_key(&response, &symbol.coingecko_ids) else {
                continue;
            };
            let Some(price) = data.usd.as_ref().and_then(decimal_from_json) else {
                tracing::debug!(symbol = %symbol.symbol, id, "CoinGecko entry has no usd price");
                continue;
            };
            let change = data.usd_24h_change.as_ref().and_then(decimal_from_json);

            result.insert(
                symbol.symbol.clone(),
                PriceQuote::with_change(&symbol.symbol, price, change, self.provider_name()),
            );
        }

        result
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_quotes(&self, symbols: &[SymbolConfig]) -> Result<QuoteMap, ProviderError> {
        let symbols: Vec<SymbolConfig> = symbols
            .iter()
            .filter(|s| !s.coingecko_ids.is_empty())
            .cloned()
            .collect();
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = self.build_url(&symbols);
        tracing::debug!(%url, "Fetching prices from CoinGecko");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::NetworkError)?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(ProviderError::RateLimitExceeded);
        }

        // Check for other errors
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let response_text = response.text().await.map_err(ProviderError::NetworkError)?;

        let coingecko_response: CoinGeckoResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                ProviderError::InvalidResponse(format!(
                    "Failed to parse CoinGecko response: {}. Response: {}",
                    e, response_text
                ))
            })?;

        let quotes = self.parse_response(coingecko_response, &symbols);

        if quotes.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "No prices returned from CoinGecko".to_string(),
            ));
        }

        tracing::debug!(count = quotes.len(), "Fetched prices from CoinGecko");

        Ok(quotes)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}

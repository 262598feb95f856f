//! Types shared across the fetch → render → publish pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// One provider's price reading for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Display symbol (e.g. "BTC")
    pub symbol: String,

    /// Price in USD
    pub price: Decimal,

    /// 24h price change percentage, when the provider reports one
    pub change_24h: Option<Decimal>,

    /// Provider that answered
    pub source: String,

    /// When the quote was fetched
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    /// Create a new quote without change data
    pub fn new(symbol: impl Into<String>, price: Decimal, source: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change_24h: None,
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }

    /// Create a new quote with a 24h change percentage
    pub fn with_change(
        symbol: impl Into<String>,
        price: Decimal,
        change_24h: Option<Decimal>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            change_24h,
            ..Self::new(symbol, price, source)
        }
    }
}

/// Direction of a price relative to the last posted one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Same,
}

impl Direction {
    /// Compares the current price against the previously posted one.
    ///
    /// With nothing posted yet the direction is `Up`.
    pub fn between(current: Decimal, previous: Option<Decimal>) -> Self {
        match previous {
            None => Direction::Up,
            Some(prev) if current > prev => Direction::Up,
            Some(prev) if current < prev => Direction::Down,
            Some(_) => Direction::Same,
        }
    }

    /// Glyph shown in front of the symbol. `Same` is displayed as `Up`.
    pub fn glyph(self) -> &'static str {
        match self {
            Direction::Up | Direction::Same => "📈",
            Direction::Down => "📉",
        }
    }
}

/// Returns the first of `keys` present in `map`, with its value.
///
/// Providers name the same asset differently (e.g. "toncoin" vs
/// "the-open-network"), so each symbol declares an ordered list of
/// acceptable keys and this is the only place they are resolved.
pub fn resolve_key<'a, V>(
    map: &'a HashMap<String, V>,
    keys: &'a [String],
) -> Option<(&'a str, &'a V)> {
    keys.iter()
        .find_map(|key| map.get(key).map(|value| (key.as_str(), value)))
}

/// Parses a decimal from plain or scientific notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
        .map(|d| d.normalize())
}

/// Reads a decimal out of a JSON number or numeric string
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_direction_rules() {
        assert_eq!(Direction::between(dec!(100), None), Direction::Up);
        assert_eq!(Direction::between(dec!(0.5), None), Direction::Up);
        assert_eq!(Direction::between(dec!(100), Some(dec!(90))), Direction::Up);
        assert_eq!(Direction::between(dec!(90), Some(dec!(100))), Direction::Down);
        assert_eq!(Direction::between(dec!(100), Some(dec!(100))), Direction::Same);
    }

    #[test]
    fn test_same_is_displayed_as_up() {
        assert_eq!(Direction::Same.glyph(), Direction::Up.glyph());
        assert_ne!(Direction::Down.glyph(), Direction::Up.glyph());
    }

    #[test]
    fn test_resolve_key_prefers_first_match() {
        let mut map = HashMap::new();
        map.insert("the-open-network".to_string(), 1);
        map.insert("toncoin".to_string(), 2);

        let keys = vec!["toncoin".to_string(), "the-open-network".to_string()];
        assert_eq!(resolve_key(&map, &keys), Some(("toncoin", &2)));

        let keys = vec!["ton".to_string(), "the-open-network".to_string()];
        assert_eq!(resolve_key(&map, &keys), Some(("the-open-network", &1)));

        let keys = vec!["missing".to_string()];
        assert_eq!(resolve_key(&map, &keys), None);
    }

    #[test]
    fn test_decimal_from_json() {
        assert_eq!(decimal_from_json(&json!(50000)), Some(dec!(50000)));
        assert_eq!(decimal_from_json(&json!(68234.5)), Some(dec!(68234.5)));
        assert_eq!(decimal_from_json(&json!(0.01234)), Some(dec!(0.01234)));
        assert_eq!(decimal_from_json(&json!("43250.10000000")), Some(dec!(43250.1)));
        assert_eq!(decimal_from_json(&json!(1e-7)), Some(dec!(0.0000001)));
        assert_eq!(decimal_from_json(&json!("n/a")), None);
        assert_eq!(decimal_from_json(&json!(null)), None);
    }
}

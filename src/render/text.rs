//! Text message rendering

use crate::{
    format::{format_change, format_price},
    types::{Direction, PriceQuote},
};

/// Builds the HTML message for one quote:
///
/// ```text
/// 📈 <b>BTC</b>
/// 💰 $50,000
/// 📊 24h: +2.50%
/// ```
///
/// The 24h line is left out when the provider reported no change.
pub fn price_message(symbol: &str, quote: &PriceQuote, direction: Direction) -> String {
    let mut message = format!(
        "{} <b>{}</b>\n💰 {}",
        direction.glyph(),
        symbol,
        format_price(quote.price)
    );
    if let Some(change) = quote.change_24h {
        message.push_str(&format!("\n📊 24h: {}", format_change(change)));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_message_with_change() {
        let quote = PriceQuote::with_change("BTC", dec!(50000), Some(dec!(2.5)), "coingecko");
        assert_eq!(
            price_message("BTC", &quote, Direction::Up),
            "📈 <b>BTC</b>\n💰 $50,000\n📊 24h: +2.50%"
        );
    }

    #[test]
    fn test_message_down_without_change() {
        let quote = PriceQuote::new("DOGE", dec!(0.01234), "binance");
        assert_eq!(
            price_message("DOGE", &quote, Direction::Down),
            "📉 <b>DOGE</b>\n💰 $0.0123"
        );
    }

    #[test]
    fn test_unchanged_price_shows_up_glyph() {
        let quote = PriceQuote::with_change("ETH", dec!(3000), Some(dec!(0)), "coingecko");
        let message = price_message("ETH", &quote, Direction::Same);
        assert!(message.starts_with("📈"));
        assert!(message.ends_with("24h: 0.00%"));
    }
}

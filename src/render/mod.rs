//! Turns a quote into something the publisher can deliver

pub mod overlay;
pub mod text;

pub use overlay::ImageRenderer;

use crate::{
    config::{ImageConfig, SymbolConfig},
    error::RenderError,
    format::format_price,
    types::{Direction, PriceQuote},
};
use rust_decimal::Decimal;

/// Rendered output, ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Plain message; the text is also the caption
    Text(String),
    /// PNG with a caption
    Image { png: Vec<u8>, caption: String },
}

impl Artifact {
    pub fn caption(&self) -> &str {
        match self {
            Artifact::Text(text) => text,
            Artifact::Image { caption, .. } => caption,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Text(_) => "text",
            Artifact::Image { .. } => "image",
        }
    }
}

/// Chooses text or image output per symbol
pub struct Renderer {
    image: Option<ImageRenderer>,
}

impl Renderer {
    /// Image rendering is available only when a font is configured
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            image: config
                .font_path
                .as_ref()
                .map(|path| ImageRenderer::new(path, config)),
        }
    }

    pub fn text_only() -> Self {
        Self { image: None }
    }

    /// Renders one quote. `previous` only decides the direction glyph.
    pub fn render(
        &self,
        symbol: &SymbolConfig,
        quote: &PriceQuote,
        previous: Option<Decimal>,
    ) -> Result<Artifact, RenderError> {
        let direction = Direction::between(quote.price, previous);
        let caption = text::price_message(&symbol.symbol, quote, direction);

        let (Some(template), Some(anchor)) = (&symbol.template, symbol.anchor) else {
            return Ok(Artifact::Text(caption));
        };

        let renderer = self
            .image
            .as_ref()
            .ok_or_else(|| RenderError::FontUnavailable {
                path: "<unset>".to_string(),
                reason: "image.font_path is not configured".to_string(),
            })?;
        let png = renderer.render(template, anchor, &format_price(quote.price))?;

        Ok(Artifact::Image { png, caption })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_text_artifact_for_symbol_without_template() {
        let symbol = SymbolConfig::new("BTC", 120, "bitcoin", "BTCUSDT");
        let quote = PriceQuote::with_change("BTC", dec!(50000), Some(dec!(2.5)), "coingecko");

        let artifact = Renderer::text_only().render(&symbol, &quote, None).unwrap();
        assert_eq!(artifact.kind(), "text");
        assert!(artifact.caption().starts_with("📈 <b>BTC</b>"));
    }

    #[test]
    fn test_previous_price_drives_glyph() {
        let symbol = SymbolConfig::new("ETH", 300, "ethereum", "ETHUSDT");
        let quote = PriceQuote::new("ETH", dec!(2900), "coingecko");

        let renderer = Renderer::text_only();
        let down = renderer.render(&symbol, &quote, Some(dec!(3000))).unwrap();
        assert!(down.caption().starts_with("📉"));

        let same = renderer.render(&symbol, &quote, Some(dec!(2900))).unwrap();
        assert!(same.caption().starts_with("📈"));
    }

    #[test]
    fn test_template_without_font_fails() {
        let symbol = SymbolConfig {
            template: Some("templates/btc.png".into()),
            anchor: Some((100, 100)),
            ..SymbolConfig::new("BTC", 120, "bitcoin", "BTCUSDT")
        };
        let quote = PriceQuote::new("BTC", dec!(50000), "coingecko");

        assert!(matches!(
            Renderer::text_only().render(&symbol, &quote, None),
            Err(RenderError::FontUnavailable { .. })
        ));
    }

    #[test]
    fn test_missing_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = ImageConfig {
            font_path: Some(dir.path().join("font.ttf")),
            ..ImageConfig::default()
        };
        let symbol = SymbolConfig {
            template: Some(dir.path().join("btc.png")),
            anchor: Some((100, 100)),
            ..SymbolConfig::new("BTC", 120, "bitcoin", "BTCUSDT")
        };
        let quote = PriceQuote::new("BTC", dec!(50000), "coingecko");

        assert!(matches!(
            Renderer::new(&config).render(&symbol, &quote, None),
            Err(RenderError::TemplateNotFound(_))
        ));
    }
}

//! Draws the formatted price onto a per-symbol template image

use crate::{config::ImageConfig, constants::FONT_FAMILY, error::RenderError};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::fmt::Display;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Template renderer backed by a plotters bitmap
pub struct ImageRenderer {
    font_path: PathBuf,
    font_size: f64,
    color: RGBColor,
    /// Set once the font is registered, or once it is known to be invalid
    font: OnceLock<Result<(), String>>,
}

impl ImageRenderer {
    pub fn new(font_path: impl Into<PathBuf>, config: &ImageConfig) -> Self {
        let [r, g, b] = config.color;
        Self {
            font_path: font_path.into(),
            font_size: config.font_size,
            color: RGBColor(r, g, b),
            font: OnceLock::new(),
        }
    }

    /// Loads and registers the font on first use.
    ///
    /// A missing file is retried on the next render; a file that is not a
    /// usable font is remembered so its bytes are only leaked once.
    fn ensure_font(&self) -> Result<(), RenderError> {
        let unavailable = |reason: String| RenderError::FontUnavailable {
            path: self.font_path.display().to_string(),
            reason,
        };

        if let Some(state) = self.font.get() {
            return state.clone().map_err(unavailable);
        }

        let bytes = std::fs::read(&self.font_path).map_err(|e| unavailable(e.to_string()))?;
        // plotters keeps registered fonts for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        let state = register_font(FONT_FAMILY, FontStyle::Normal, bytes)
            .map_err(|_| "not a valid TrueType/OpenType font".to_string());

        let _ = self.font.set(state.clone());
        state.map_err(unavailable)
    }

    /// Renders `text` centered on `anchor` and returns PNG bytes
    pub fn render(
        &self,
        template: &Path,
        anchor: (i32, i32),
        text: &str,
    ) -> Result<Vec<u8>, RenderError> {
        if !template.is_file() {
            return Err(RenderError::TemplateNotFound(
                template.display().to_string(),
            ));
        }
        self.ensure_font()?;

        let base = image::open(template)
            .map_err(|e| RenderError::TemplateDecode {
                path: template.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgb8();
        let (width, height) = base.dimensions();
        let mut buffer = base.into_raw();

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            let style = (FONT_FAMILY, self.font_size).into_font().color(&self.color);

            let text_size = root.estimate_text_size(text, &style).map_err(draw_error)?;
            let origin = centered_origin(anchor, text_size);
            tracing::debug!(
                template = %template.display(),
                text,
                width = text_size.0,
                height = text_size.1,
                x = origin.0,
                y = origin.1,
                "Drawing price onto template"
            );

            root.draw_text(text, &style, origin).map_err(draw_error)?;
            root.present().map_err(draw_error)?;
        }

        let canvas = image::RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Encode("pixel buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        Ok(png)
    }
}

fn draw_error(e: impl Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Top-left corner that centers a box of `size` on `anchor`
pub fn centered_origin(anchor: (i32, i32), size: (u32, u32)) -> (i32, i32) {
    let (w, h) = (size.0 as i32, size.1 as i32);
    (anchor.0 - w / 2, anchor.1 - h / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_template(dir: &Path) -> PathBuf {
        let path = dir.join("btc.png");
        image::RgbImage::from_pixel(64, 32, image::Rgb([0, 0, 0]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_centered_origin_uses_measured_width() {
        assert_eq!(centered_origin((540, 600), (200, 80)), (440, 560));
        // wider text starts further left for the same anchor
        assert_eq!(centered_origin((540, 600), (320, 80)), (380, 560));
        assert_eq!(centered_origin((0, 0), (11, 7)), (-5, -3));
    }

    fn fixture_font() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans-Bold.ttf")
    }

    /// Horizontal and vertical extent of the bright pixels
    fn ink_bounds(png: &[u8]) -> ((u32, u32), (u32, u32)) {
        let decoded = image::load_from_memory(png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (400, 200));

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (u32::MAX, 0, u32::MAX, 0);
        for (x, y, pixel) in decoded.enumerate_pixels() {
            if pixel.0.iter().any(|&c| c > 128) {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        assert!(min_x <= max_x, "nothing was drawn");
        ((min_x, max_x), (min_y, max_y))
    }

    #[test]
    fn test_price_is_drawn_centered_on_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("btc.png");
        image::RgbImage::from_pixel(400, 200, image::Rgb([0, 0, 0]))
            .save(&template)
            .unwrap();
        let config = ImageConfig {
            font_size: 48.0,
            ..ImageConfig::default()
        };
        let renderer = ImageRenderer::new(fixture_font(), &config);

        let png = renderer.render(&template, (200, 100), "$68,234").unwrap();
        let ((left, right), (top, bottom)) = ink_bounds(&png);
        let center = (left + right) / 2;
        assert!((188..=212).contains(&center), "ink centered at x={}", center);
        assert!(top < 100 && bottom > 100, "ink spans y={}..{}", top, bottom);

        let wide = renderer.render(&template, (200, 100), "$1,234,567").unwrap();
        let ((wide_left, wide_right), _) = ink_bounds(&wide);
        assert!(wide_left < left);
        assert!(wide_right > right);
    }

    #[test]
    fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ImageRenderer::new(dir.path().join("font.ttf"), &ImageConfig::default());

        let result = renderer.render(&dir.path().join("missing.png"), (10, 10), "$1.00");
        assert!(matches!(result, Err(RenderError::TemplateNotFound(_))));
    }

    #[test]
    fn test_missing_font_is_reported_and_retried() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        let renderer = ImageRenderer::new(dir.path().join("font.ttf"), &ImageConfig::default());

        for _ in 0..2 {
            let result = renderer.render(&template, (32, 16), "$50,000");
            assert!(matches!(result, Err(RenderError::FontUnavailable { .. })));
        }
        assert!(renderer.font.get().is_none());
    }

    #[test]
    fn test_invalid_font_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        let font = dir.path().join("font.ttf");
        std::fs::write(&font, b"definitely not a font").unwrap();
        let renderer = ImageRenderer::new(&font, &ImageConfig::default());

        let result = renderer.render(&template, (32, 16), "$50,000");
        assert!(matches!(result, Err(RenderError::FontUnavailable { .. })));
        assert!(matches!(renderer.font.get(), Some(Err(_))));
    }
}

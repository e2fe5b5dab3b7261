//! Color-coded text glyphs: VFR probability and cloud-base height.

use super::surface::{DrawingSurface, Rgba, SavedState};
use crate::error::GlyphError;
use crate::scale::{PlotArea, Point};

/// Fractional plot height (from the top) of the probability row.
pub const PROBABILITY_ROW: f64 = 0.65;
/// Fractional plot height (from the top) of the cloud-base row.
pub const CLOUD_BASE_ROW: f64 = 0.88;

const FONT_PX: u32 = 12;

/// Four-bucket ordinal ramp; thresholds are exclusive.
pub fn probability_color(p: f64) -> Rgba {
    if p > 90.0 {
        Rgba::rgb(0x1b, 0x5e, 0x20)
    } else if p > 70.0 {
        Rgba::rgb(0x2e, 0x7d, 0x32)
    } else if p > 50.0 {
        Rgba::rgb(0x66, 0xbb, 0x6a)
    } else {
        Rgba::rgb(0xd3, 0x2f, 0x2f)
    }
}

/// Six-bucket ramp for a cloud base given in tens of feet.
pub fn cloud_base_color(base: f64) -> Rgba {
    if base < 50.0 {
        Rgba::rgb(0xd3, 0x2f, 0x2f)
    } else if base < 100.0 {
        Rgba::rgb(0xf5, 0x7c, 0x00)
    } else if base < 200.0 {
        Rgba::rgb(0xfb, 0xc0, 0x2d)
    } else if base < 300.0 {
        Rgba::rgb(0x9c, 0xcc, 0x65)
    } else if base < 500.0 {
        Rgba::rgb(0x43, 0xa0, 0x47)
    } else {
        Rgba::rgba(0x1b, 0x5e, 0x20, 0.5)
    }
}

fn finite(field: &'static str, value: Option<f64>) -> Result<f64, GlyphError> {
    let v = value.ok_or(GlyphError::MissingField(field))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(GlyphError::InvalidValue { field, value: v })
    }
}

fn draw_row_text<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    text: &str,
    at: Point,
    color: Rgba,
) -> Result<(), GlyphError> {
    let mut s = SavedState::new(surface);
    s.set_fill(color);
    s.fill_text(text, at, FONT_PX)?;
    Ok(())
}

/// Draw a VFR probability as an integer at 65% of the plot height. Returns the text.
pub fn draw_probability_label<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    x: f64,
    area: &PlotArea,
    probability: Option<f64>,
) -> Result<String, GlyphError> {
    // text and color come from the same rounded value
    let p = finite("probability", probability)?.round();
    let text = format!("{}", p as i64);
    let y = area.top + PROBABILITY_ROW * area.height();
    draw_row_text(surface, &text, Point::new(x, y), probability_color(p))?;
    Ok(text)
}

/// Draw a cloud base (tens of feet) as an integer at 88% of the plot height.
pub fn draw_cloud_base_label<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    x: f64,
    area: &PlotArea,
    base: Option<f64>,
) -> Result<String, GlyphError> {
    let b = finite("cloud_base", base)?;
    if b < 0.0 {
        return Err(GlyphError::InvalidValue {
            field: "cloud_base",
            value: b,
        });
    }
    let b = b.round();
    let text = format!("{}", b as i64);
    let y = area.top + CLOUD_BASE_ROW * area.height();
    draw_row_text(surface, &text, Point::new(x, y), cloud_base_color(b))?;
    Ok(text)
}

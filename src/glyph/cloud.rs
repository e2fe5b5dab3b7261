//! Stylized cloud blob whose opacity encodes layer coverage.

use std::f64::consts::TAU;

use super::surface::{DrawingSurface, Rgba, SavedState};
use crate::error::GlyphError;
use crate::scale::Point;

const BASE_RADIUS: f64 = 12.0;
const STRETCH_X: f64 = 1.35;
const STRETCH_Y: f64 = 0.8;
/// Control points sit outside the outline so each segment bulges into a puff.
const PUFF: f64 = 1.45;
const LOBES: usize = 8;

/// Fill alpha for a coverage percentage: 0.1 at 0%, 1.0 at 100%, linear in between.
/// Coverage is clamped to `0..=100`.
pub fn cloud_alpha(coverage: f64) -> f64 {
    0.1 + 0.9 * coverage.clamp(0.0, 100.0) / 100.0
}

fn rim(angle: f64, scale: f64) -> Point {
    Point::new(
        BASE_RADIUS * STRETCH_X * scale * angle.cos(),
        BASE_RADIUS * STRETCH_Y * scale * angle.sin(),
    )
}

/// Draw a cloud blob centred on `at`. Returns the fill alpha used.
pub fn draw_cloud_blob<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    at: Point,
    coverage: Option<f64>,
) -> Result<f64, GlyphError> {
    let coverage = coverage.ok_or(GlyphError::MissingField("coverage"))?;
    if !coverage.is_finite() {
        return Err(GlyphError::InvalidValue {
            field: "coverage",
            value: coverage,
        });
    }
    let alpha = cloud_alpha(coverage);

    let mut s = SavedState::new(surface);
    s.translate(at.x, at.y);
    s.begin_path();
    s.move_to(rim(0.0, 1.0));
    let step = TAU / LOBES as f64;
    for i in 0..LOBES {
        let a0 = i as f64 * step;
        let a1 = a0 + step;
        let c1 = rim(a0 + step / 3.0, PUFF);
        let c2 = rim(a1 - step / 3.0, PUFF);
        s.bezier_to(c1, c2, rim(a1, 1.0));
    }
    s.close_path();

    s.set_fill(Rgba::BLACK.with_alpha(alpha));
    s.fill()?;
    s.set_stroke(Rgba::WHITE.with_alpha(alpha * 0.7), 1.0);
    s.stroke()?;
    Ok(alpha)
}

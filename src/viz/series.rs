//! Native series (lines and bars), drawn through the same surface and mapper
//! the glyph overlays use so both layers agree to the pixel.

use crate::error::SurfaceError;
use crate::glyph::{DrawingSurface, SavedState};
use crate::panel::{Panel, Series, SeriesRole};
use crate::scale::{CoordinateMapper, Point};

const LINE_WIDTH: f64 = 2.0;
const BAR_FILL: f64 = 0.7;
const FALLBACK_BAR_PX: f64 = 6.0;

/// Draw every native series of `panel`, clipped to the plot area.
pub fn draw_native_series<S: DrawingSurface + ?Sized>(
    panel: &Panel,
    mapper: &CoordinateMapper,
    surface: &mut S,
) -> Result<(), SurfaceError> {
    let mut s = SavedState::new(surface);
    s.clip_rect(mapper.area());
    // bars first so lines on a shared panel stay visible
    for series in panel.series.iter().filter(|s| s.role == SeriesRole::Bars) {
        draw_bars(&mut *s, series, mapper)?;
    }
    for series in panel.series.iter().filter(|s| s.role == SeriesRole::Line) {
        draw_line(&mut *s, series, mapper)?;
    }
    Ok(())
}

/// A polyline that lifts the pen over missing values.
fn draw_line<S: DrawingSurface + ?Sized>(
    s: &mut S,
    series: &Series,
    mapper: &CoordinateMapper,
) -> Result<(), SurfaceError> {
    s.set_stroke(series.color, LINE_WIDTH);
    s.begin_path();
    let mut pen_down = false;
    for p in &series.points {
        let projected = p
            .is_renderable()
            .then(|| p.value.and_then(|v| mapper.project(p.time, series.axis, v)))
            .flatten();
        match projected {
            Some(pt) if pen_down => s.line_to(pt),
            Some(pt) => {
                s.move_to(pt);
                pen_down = true;
            }
            None => pen_down = false,
        }
    }
    s.stroke()
}

fn bar_width_px(series: &Series, mapper: &CoordinateMapper) -> f64 {
    let xs: Vec<f64> = series
        .points
        .iter()
        .filter_map(|p| mapper.x_for(p.time))
        .collect();
    xs.windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|d| *d > 0.0)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .map_or(FALLBACK_BAR_PX, |d| (d * BAR_FILL).max(1.0))
}

fn draw_bars<S: DrawingSurface + ?Sized>(
    s: &mut S,
    series: &Series,
    mapper: &CoordinateMapper,
) -> Result<(), SurfaceError> {
    let area = mapper.area();
    let half = bar_width_px(series, mapper) / 2.0;
    let baseline = mapper
        .y_for(series.axis, 0.0)
        .unwrap_or(area.bottom)
        .clamp(area.top, area.bottom);
    s.set_fill(series.color.with_alpha(0.8));
    s.begin_path();
    for p in series.points.iter().filter(|p| p.is_renderable()) {
        let (Some(x), Some(top)) = (
            mapper.x_for(p.time),
            p.value.and_then(|v| mapper.y_for(series.axis, v)),
        ) else {
            continue;
        };
        if (top - baseline).abs() < f64::EPSILON {
            continue;
        }
        s.move_to(Point::new(x - half, baseline));
        s.line_to(Point::new(x - half, top));
        s.line_to(Point::new(x + half, top));
        s.line_to(Point::new(x + half, baseline));
        s.close_path();
    }
    s.fill()
}

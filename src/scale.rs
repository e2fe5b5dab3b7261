//! Coordinate mapping between the shared time domain and a panel's pixel space.
//!
//! Time values are milliseconds since the Unix epoch. Pixel coordinates are
//! device pixels with `y` growing downward.

/// A device-space point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The plotting rectangle of a panel (inside the axes), in device pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// A zero/negative-size or non-finite area cannot host a projection.
    pub fn is_degenerate(&self) -> bool {
        !(self.width().is_finite() && self.height().is_finite())
            || self.width() <= 0.0
            || self.height() <= 0.0
    }

    /// Edges are inclusive; only points strictly outside are rejected.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

/// The visible time interval of a panel. Always finite with `min < max`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeWindow {
    min: f64,
    max: f64,
}

impl TimeWindow {
    /// Returns `None` for non-finite, empty or inverted intervals.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min < max).then_some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }
}

/// Value-axis scale type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScaleKind {
    #[default]
    Linear,
    Logarithmic,
}

/// A value axis with concrete bounds, ready for projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedAxis {
    pub scale: ScaleKind,
    pub min: f64,
    pub max: f64,
}

impl ResolvedAxis {
    pub fn new(scale: ScaleKind, min: f64, max: f64) -> Self {
        Self { scale, min, max }
    }

    /// Resolve an axis whose bounds may be unset, auto-scaling the missing
    /// side(s) from the data extent.
    pub fn resolve(
        scale: ScaleKind,
        min: Option<f64>,
        max: Option<f64>,
        data: impl IntoIterator<Item = f64>,
    ) -> Self {
        let (auto_min, auto_max) = auto_extent(scale, data);
        let mut lo = min.filter(|v| v.is_finite()).unwrap_or(auto_min);
        let mut hi = max.filter(|v| v.is_finite()).unwrap_or(auto_max);
        if scale == ScaleKind::Logarithmic {
            if lo <= 0.0 {
                lo = auto_min;
            }
            if hi <= lo {
                hi = lo * 10.0;
            }
        } else if hi <= lo {
            // Configured side collided with the auto side; widen around the pinned one.
            if min.is_some() {
                hi = lo + 1.0;
            } else {
                lo = hi - 1.0;
            }
        }
        Self::new(scale, lo, hi)
    }

    /// Position of `value` along the axis as a fraction in `[0, 1]` from
    /// `min` to `max`. Logarithmic axes reject values outside the bounds.
    pub fn fraction(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self.scale {
            ScaleKind::Linear => {
                let span = self.max - self.min;
                if !(span.is_finite() && span > 0.0) {
                    return None;
                }
                Some((value - self.min) / span)
            }
            ScaleKind::Logarithmic => {
                if self.min <= 0.0 || value < self.min || value > self.max {
                    return None;
                }
                let span = self.max.ln() - self.min.ln();
                if !(span.is_finite() && span > 0.0) {
                    return None;
                }
                Some((value.ln() - self.min.ln()) / span)
            }
        }
    }
}

/// Auto-scale an extent the way the renderer lays out an axis with no bounds:
/// linear extents get 5% padding, flat extents are widened by ±1, logarithmic
/// extents use positive values only and snap outward to decades.
fn auto_extent(scale: ScaleKind, data: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in data {
        if !v.is_finite() || (scale == ScaleKind::Logarithmic && v <= 0.0) {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    match scale {
        ScaleKind::Linear => {
            if lo > hi {
                return (0.0, 1.0);
            }
            if (hi - lo).abs() < f64::EPSILON {
                return (lo - 1.0, hi + 1.0);
            }
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        ScaleKind::Logarithmic => {
            if lo > hi {
                return (1.0, 10.0);
            }
            let lo = 10f64.powf(lo.log10().floor());
            let mut hi = 10f64.powf(hi.log10().ceil());
            if hi <= lo {
                hi = lo * 10.0;
            }
            (lo, hi)
        }
    }
}

/// Maps `(time, value)` pairs to pixels for one panel and one draw pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateMapper {
    area: PlotArea,
    time: TimeWindow,
    value_axes: Vec<ResolvedAxis>,
}

impl CoordinateMapper {
    pub fn new(area: PlotArea, time: TimeWindow, value_axes: Vec<ResolvedAxis>) -> Self {
        Self {
            area,
            time,
            value_axes,
        }
    }

    pub fn area(&self) -> PlotArea {
        self.area
    }

    pub fn time_window(&self) -> TimeWindow {
        self.time
    }

    pub fn value_axis(&self, idx: usize) -> Option<&ResolvedAxis> {
        self.value_axes.get(idx)
    }

    pub fn x_for(&self, time: f64) -> Option<f64> {
        if self.area.is_degenerate() || !time.is_finite() {
            return None;
        }
        let t = (time - self.time.min()) / self.time.span();
        Some(self.area.left + t * self.area.width())
    }

    pub fn y_for(&self, axis: usize, value: f64) -> Option<f64> {
        if self.area.is_degenerate() {
            return None;
        }
        let f = self.value_axes.get(axis)?.fraction(value)?;
        Some(self.area.top + (1.0 - f) * self.area.height())
    }

    pub fn project(&self, time: f64, axis: usize, value: f64) -> Option<Point> {
        Some(Point::new(self.x_for(time)?, self.y_for(axis, value)?))
    }

    /// Inverse of [`x_for`](Self::x_for). Only the time axis is invertible.
    pub fn time_at(&self, px: f64) -> Option<f64> {
        if self.area.is_degenerate() || !px.is_finite() {
            return None;
        }
        let t = (px - self.area.left) / self.area.width();
        Some(self.time.min() + t * self.time.span())
    }

    /// A fixed fractional height of the plot area (0 = top, 1 = bottom).
    pub fn y_at_fraction(&self, fraction: f64) -> f64 {
        self.area.top + fraction * self.area.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlotArea {
        PlotArea::new(50.0, 10.0, 450.0, 210.0)
    }

    #[test]
    fn time_window_rejects_empty_or_inverted() {
        assert!(TimeWindow::new(1.0, 1.0).is_none());
        assert!(TimeWindow::new(2.0, 1.0).is_none());
        assert!(TimeWindow::new(f64::NAN, 1.0).is_none());
        assert!(TimeWindow::new(0.0, 1.0).is_some());
    }

    #[test]
    fn linear_projection_and_inverse() {
        let m = CoordinateMapper::new(
            area(),
            TimeWindow::new(0.0, 100.0).unwrap(),
            vec![ResolvedAxis::new(ScaleKind::Linear, 0.0, 20.0)],
        );
        let p = m.project(25.0, 0, 5.0).unwrap();
        assert!((p.x - 150.0).abs() < 1e-9);
        assert!((p.y - 160.0).abs() < 1e-9);
        assert!((m.time_at(150.0).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn log_projection_matches_formula_and_rejects_out_of_range() {
        let m = CoordinateMapper::new(
            area(),
            TimeWindow::new(0.0, 1.0).unwrap(),
            vec![ResolvedAxis::new(ScaleKind::Logarithmic, 100.0, 10_000.0)],
        );
        // one decade up from min is halfway up the area
        let y = m.y_for(0, 1000.0).unwrap();
        let expected = 10.0 + 200.0 * (10_000f64.ln() - 1000f64.ln()) / (10_000f64.ln() - 100f64.ln());
        assert!((y - expected).abs() < 1e-9);
        assert!((y - 110.0).abs() < 1e-9);
        assert!(m.y_for(0, 50.0).is_none());
        assert!(m.y_for(0, 20_000.0).is_none());
        assert!(m.y_for(0, -1.0).is_none());
    }

    #[test]
    fn degenerate_area_projects_nothing() {
        let m = CoordinateMapper::new(
            PlotArea::new(10.0, 10.0, 10.0, 50.0),
            TimeWindow::new(0.0, 1.0).unwrap(),
            vec![ResolvedAxis::new(ScaleKind::Linear, 0.0, 1.0)],
        );
        assert!(m.x_for(0.5).is_none());
        assert!(m.time_at(10.0).is_none());
    }

    #[test]
    fn unset_bounds_are_auto_scaled() {
        let axis = ResolvedAxis::resolve(ScaleKind::Linear, None, None, [0.0, 10.0]);
        assert_eq!(axis.min, -0.5);
        assert_eq!(axis.max, 10.5);

        let flat = ResolvedAxis::resolve(ScaleKind::Linear, None, None, [3.0, 3.0]);
        assert_eq!((flat.min, flat.max), (2.0, 4.0));

        let log = ResolvedAxis::resolve(ScaleKind::Logarithmic, None, None, [250.0, 0.0, 4200.0]);
        assert_eq!((log.min, log.max), (100.0, 10_000.0));

        let pinned = ResolvedAxis::resolve(ScaleKind::Linear, Some(0.0), None, [5.0]);
        assert_eq!(pinned.min, 0.0);
        assert_eq!(pinned.max, 6.0);
    }
}

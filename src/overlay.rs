//! Overlay draw pass: custom glyphs on top of a panel's native series, plus
//! the fixed reference guides.
//!
//! Both passes are exposed as [`PanelPlugin`] hooks that the renderer calls
//! once per redraw, after it has drawn the native series.

use crate::error::GlyphError;
use crate::glyph::{
    CLOUD_BASE_ROW, DrawingSurface, PROBABILITY_ROW, Rgba, SavedState, draw_cloud_base_label,
    draw_cloud_blob, draw_probability_label, draw_wind_barb,
};
use crate::panel::{GlyphKind, Panel, PanelKind, SeriesPoint};
use crate::scale::{CoordinateMapper, Point};

const GUIDE_COLOR: Rgba = Rgba::rgba(0x55, 0x55, 0x55, 0.7);
const GUIDE_DASH: f64 = 6.0;
const GUIDE_GAP: f64 = 4.0;

/// Per-pass bookkeeping, mostly for logs and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayStats {
    pub drawn: usize,
    pub skipped_outside: usize,
    pub skipped_invalid: usize,
    pub failed: usize,
}

/// Where a glyph for `point` is anchored, or `None` if it cannot be projected.
fn anchor(glyph: GlyphKind, axis: usize, point: &SeriesPoint, mapper: &CoordinateMapper) -> Option<Point> {
    match glyph {
        GlyphKind::CloudBlob | GlyphKind::WindBarb => mapper.project(point.time, axis, point.value?),
        GlyphKind::ProbabilityLabel => Some(Point::new(
            mapper.x_for(point.time)?,
            mapper.y_at_fraction(PROBABILITY_ROW),
        )),
        GlyphKind::CloudBaseLabel => Some(Point::new(
            mapper.x_for(point.time)?,
            mapper.y_at_fraction(CLOUD_BASE_ROW),
        )),
    }
}

fn draw_glyph<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    glyph: GlyphKind,
    at: Point,
    point: &SeriesPoint,
    mapper: &CoordinateMapper,
) -> Result<(), GlyphError> {
    let aux = &point.aux;
    match glyph {
        GlyphKind::CloudBlob => draw_cloud_blob(surface, at, aux.coverage).map(|_| ()),
        GlyphKind::WindBarb => {
            let speed = aux.speed.ok_or(GlyphError::MissingField("speed"))?;
            let direction = aux.direction.ok_or(GlyphError::MissingField("direction"))?;
            draw_wind_barb(surface, at, speed, direction).map(|_| ())
        }
        GlyphKind::ProbabilityLabel => {
            draw_probability_label(surface, at.x, &mapper.area(), aux.probability).map(|_| ())
        }
        GlyphKind::CloudBaseLabel => {
            draw_cloud_base_label(surface, at.x, &mapper.area(), aux.cloud_base).map(|_| ())
        }
    }
}

/// Draw every overlay-eligible series of `panel`.
///
/// The surface is clipped to the plot area for the duration of the pass and
/// restored afterwards whatever the renderers do. A glyph that fails is
/// counted and logged; the pass carries on with the next point.
pub fn draw_overlays<S: DrawingSurface + ?Sized>(
    panel: &Panel,
    mapper: &CoordinateMapper,
    surface: &mut S,
) -> OverlayStats {
    let mut stats = OverlayStats::default();
    let area = mapper.area();
    if area.is_degenerate() {
        return stats;
    }
    let mut s = SavedState::new(surface);
    s.clip_rect(area);

    for series in &panel.series {
        let Some(glyph) = series.role.glyph() else {
            continue;
        };
        for point in &series.points {
            if !point.is_renderable() {
                stats.skipped_invalid += 1;
                continue;
            }
            let Some(at) = anchor(glyph, series.axis, point, mapper).filter(|p| area.contains(*p)) else {
                stats.skipped_outside += 1;
                continue;
            };
            match draw_glyph(&mut *s, glyph, at, point, mapper) {
                Ok(()) => stats.drawn += 1,
                Err(e) => {
                    log::debug!("{}: {:?} glyph at t={} skipped: {e}", panel.id(), glyph, point.time);
                    stats.failed += 1;
                }
            }
        }
    }
    stats
}

/// Constant-value guides for a panel kind: `(axis, value, dashed)`.
pub fn reference_lines(kind: PanelKind) -> &'static [(usize, f64, bool)] {
    match kind {
        // freezing level
        PanelKind::Temperature => &[(0, 0.0, true)],
        PanelKind::Clouds => &[(0, 1000.0, true), (0, 3000.0, true)],
        PanelKind::SurfaceWind => &[(0, 20.0, true)],
        PanelKind::Precipitation | PanelKind::Winds | PanelKind::Vfr => &[],
    }
}

/// Draw the fixed guides of `kind`. Returns how many were inside the plot area.
pub fn draw_reference_lines<S: DrawingSurface + ?Sized>(
    kind: PanelKind,
    mapper: &CoordinateMapper,
    surface: &mut S,
) -> usize {
    let area = mapper.area();
    if area.is_degenerate() {
        return 0;
    }
    let mut s = SavedState::new(surface);
    s.clip_rect(area);
    s.set_stroke(GUIDE_COLOR, 1.0);

    let mut drawn = 0;
    for &(axis, value, dashed) in reference_lines(kind) {
        let Some(y) = mapper.y_for(axis, value).filter(|y| *y >= area.top && *y <= area.bottom) else {
            continue;
        };
        s.begin_path();
        if dashed {
            let mut x = area.left;
            while x < area.right {
                s.move_to(Point::new(x, y));
                s.line_to(Point::new((x + GUIDE_DASH).min(area.right), y));
                x += GUIDE_DASH + GUIDE_GAP;
            }
        } else {
            s.move_to(Point::new(area.left, y));
            s.line_to(Point::new(area.right, y));
        }
        match s.stroke() {
            Ok(()) => drawn += 1,
            Err(e) => log::debug!("reference line {value} on {kind:?} failed: {e}"),
        }
    }
    drawn
}

/// Hooks a renderer invokes around its own drawing of a panel.
pub trait PanelPlugin {
    fn name(&self) -> &'static str;

    /// Called after the native series are drawn.
    fn after_datasets_draw(&self, _panel: &Panel, _mapper: &CoordinateMapper, _surface: &mut dyn DrawingSurface) {}

    /// Called once everything else for the panel is drawn.
    fn after_draw(&self, _panel: &Panel, _mapper: &CoordinateMapper, _surface: &mut dyn DrawingSurface) {}
}

/// Glyphs for cloud, wind and label series.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlyphOverlay;

impl PanelPlugin for GlyphOverlay {
    fn name(&self) -> &'static str {
        "glyph-overlay"
    }

    fn after_datasets_draw(&self, panel: &Panel, mapper: &CoordinateMapper, surface: &mut dyn DrawingSurface) {
        let stats = draw_overlays(panel, mapper, surface);
        log::trace!("{}: overlay {:?}", panel.id(), stats);
    }
}

/// Dashed horizontal guides keyed on the panel kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceGuides;

impl PanelPlugin for ReferenceGuides {
    fn name(&self) -> &'static str {
        "reference-guides"
    }

    fn after_draw(&self, panel: &Panel, mapper: &CoordinateMapper, surface: &mut dyn DrawingSurface) {
        draw_reference_lines(panel.kind(), mapper, surface);
    }
}

pub fn default_plugins() -> Vec<Box<dyn PanelPlugin>> {
    vec![Box::new(GlyphOverlay), Box::new(ReferenceGuides)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::glyph::{CanvasCore, RecordingSurface, Shape};
    use crate::panel::{PointAux, Series, SeriesRole};
    use crate::scale::{PlotArea, ResolvedAxis, ScaleKind, TimeWindow};

    fn mapper() -> CoordinateMapper {
        // 1 px per time unit, 1 px per value unit, y flipped
        CoordinateMapper::new(
            PlotArea::new(100.0, 100.0, 300.0, 300.0),
            TimeWindow::new(0.0, 200.0).unwrap(),
            vec![ResolvedAxis::new(ScaleKind::Linear, 0.0, 200.0)],
        )
    }

    fn barb(time: f64, value: f64) -> SeriesPoint {
        SeriesPoint::new(time, Some(value)).with_aux(PointAux {
            speed: Some(20.0),
            direction: Some(180.0),
            ..PointAux::default()
        })
    }

    fn wind_panel(points: Vec<SeriesPoint>) -> Panel {
        let mut panel = Panel::new(PanelKind::Winds);
        panel.series = vec![Series::new(SeriesRole::WindLayer, "w", Rgba::BLACK, 0).with_points(points)];
        panel
    }

    #[test]
    fn points_outside_each_edge_produce_no_draw_calls() {
        let m = mapper();
        // (time, value) projecting left of, right of, above and below the area
        for (t, v) in [(-10.0, 100.0), (210.0, 100.0), (100.0, 210.0), (100.0, -10.0)] {
            let panel = wind_panel(vec![barb(t, v)]);
            let mut s = RecordingSurface::new();
            let stats = draw_overlays(&panel, &m, &mut s);
            assert_eq!(stats.skipped_outside, 1, "({t}, {v})");
            assert!(s.shapes().is_empty(), "({t}, {v})");
        }
    }

    #[test]
    fn inside_points_are_clipped_to_the_plot_area() {
        let panel = wind_panel(vec![barb(100.0, 100.0)]);
        let mut s = RecordingSurface::new();
        let stats = draw_overlays(&panel, &mapper(), &mut s);
        assert_eq!(stats.drawn, 1);
        for shape in s.shapes() {
            let clip = match shape {
                Shape::Fill { clip, .. } | Shape::Stroke { clip, .. } | Shape::Text { clip, .. } => *clip,
            };
            assert_eq!(clip, Some(PlotArea::new(100.0, 100.0, 300.0, 300.0)));
        }
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn unrenderable_and_incomplete_points_are_skipped() {
        let mut no_dir = barb(50.0, 50.0);
        no_dir.aux.direction = None;
        let panel = wind_panel(vec![SeriesPoint::new(10.0, None), no_dir, barb(60.0, 60.0)]);
        let mut s = RecordingSurface::new();
        let stats = draw_overlays(&panel, &mapper(), &mut s);
        assert_eq!(
            stats,
            OverlayStats {
                drawn: 1,
                skipped_outside: 0,
                skipped_invalid: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn runaway_wind_speed_fails_only_its_own_glyph() {
        let mut storm = barb(100.0, 100.0);
        storm.aux.speed = Some(1e7);
        let panel = wind_panel(vec![barb(50.0, 50.0), storm, barb(150.0, 150.0)]);
        let mut s = RecordingSurface::new();
        let stats = draw_overlays(&panel, &mapper(), &mut s);
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.failed, 1);
        // shaft + two full barbs for each 20 kt barb
        assert_eq!(s.shapes().len(), 6);
        assert_eq!(s.depth(), 0);
    }

    /// Fails the n-th emitted shape.
    struct FailingSurface {
        inner: RecordingSurface,
        emitted: usize,
        fail_at: usize,
    }

    impl DrawingSurface for FailingSurface {
        fn core(&mut self) -> &mut CanvasCore {
            self.inner.core()
        }

        fn emit(&mut self, shape: Shape) -> Result<(), SurfaceError> {
            self.emitted += 1;
            if self.emitted == self.fail_at {
                return Err(SurfaceError("backend refused".into()));
            }
            self.inner.emit(shape)
        }
    }

    #[test]
    fn failing_glyph_does_not_abort_the_pass_or_leak_state() {
        let panel = wind_panel(vec![barb(50.0, 50.0), barb(100.0, 100.0), barb(150.0, 150.0)]);
        // a 20 kt barb emits shaft + 2 barbs; fail the first barb's second shape
        let mut s = FailingSurface {
            inner: RecordingSurface::new(),
            emitted: 0,
            fail_at: 2,
        };
        let stats = draw_overlays(&panel, &mapper(), &mut s);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.drawn, 2);
        assert_eq!(s.inner.depth(), 0);
        assert_eq!(s.core().clip(), None);
        // later glyphs are drawn in full
        assert_eq!(s.inner.strokes().count(), 1 + 3 + 3);
    }

    #[test]
    fn labels_sit_on_fixed_rows() {
        let mut panel = Panel::new(PanelKind::Vfr);
        panel.series = vec![Series::new(SeriesRole::VfrProbability, "p", Rgba::BLACK, 0).with_points(vec![
            SeriesPoint::new(100.0, Some(95.0)).with_aux(PointAux {
                probability: Some(95.0),
                ..PointAux::default()
            }),
        ])];
        let mut s = RecordingSurface::new();
        draw_overlays(&panel, &mapper(), &mut s);
        let Shape::Text { at, .. } = &s.shapes()[0] else {
            panic!("expected text");
        };
        assert_eq!(*at, Point::new(200.0, 230.0));
    }

    #[test]
    fn guides_depend_only_on_kind() {
        let m = mapper();
        let mut s = RecordingSurface::new();
        assert_eq!(draw_reference_lines(PanelKind::SurfaceWind, &m, &mut s), 1);
        assert_eq!(draw_reference_lines(PanelKind::Winds, &m, &mut s), 0);
        // 0 °C sits exactly on the bottom edge and is still drawn
        assert_eq!(draw_reference_lines(PanelKind::Temperature, &m, &mut s), 1);
        assert_eq!(s.strokes().count(), 2);
        assert_eq!(s.depth(), 0);
    }
}

//! Panel rendering with plotters: stacked **SVG** / **PNG** output and RGB
//! buffers for the desktop viewer.
//!
//! plotters lays out the caption, the time axis (local time) and the value
//! axes. Logarithmic axes are laid out in log10 space so the mesh agrees with
//! [`CoordinateMapper`]. The plot rectangle is then read back from plotters and
//! everything inside it (native series, glyph overlays, reference guides) is
//! drawn through a [`PlottersSurface`].

pub mod series;
pub mod surface;
pub mod text;
pub mod util;

pub use series::draw_native_series;
pub use surface::PlottersSurface;

use std::fmt::Debug;
use std::ops::Range;
use std::path::Path;
use std::sync::Once;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;

use crate::error::{MeteogramError, Result};
use crate::overlay::{PanelPlugin, default_plugins};
use crate::panel::{AxisPosition, Panel, SeriesRole};
use crate::scale::{CoordinateMapper, PlotArea, ResolvedAxis, ScaleKind};
use crate::sync::ChartGroup;

use util::{label_area_px, log_value_label, time_label, to_plotters_color, value_label};

pub const LABEL_FONT_PX: u32 = 12;
const CAPTION_FONT_PX: u32 = 16;
const MARGIN: u32 = 8;
const TIME_LABEL_AREA_PX: u32 = 28;
const X_LABELS: usize = 10;
const Y_LABELS: usize = 6;

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

fn font(px: u32) -> FontDesc<'static> {
    FontDesc::new(FontFamily::SansSerif, f64::from(px), FontStyle::Normal)
}

fn render_err<E: Debug>(e: E) -> MeteogramError {
    MeteogramError::Render(format!("{e:?}"))
}

/// Plotters range for an axis: log axes live in log10 space.
fn layout_range(axis: &ResolvedAxis) -> Range<f64> {
    match axis.scale {
        ScaleKind::Linear => axis.min..axis.max,
        ScaleKind::Logarithmic => axis.min.log10()..axis.max.log10(),
    }
}

fn tick_formatter(scale: ScaleKind) -> fn(&f64) -> String {
    match scale {
        ScaleKind::Linear => |v: &f64| value_label(*v),
        ScaleKind::Logarithmic => |v: &f64| log_value_label(*v),
    }
}

/// Tick labels an axis may show, for sizing its label area.
fn label_samples(axis: &ResolvedAxis) -> Vec<String> {
    let range = layout_range(axis);
    let fmt = tick_formatter(axis.scale);
    (0..=Y_LABELS)
        .map(|i| fmt(&(range.start + (range.end - range.start) * i as f64 / Y_LABELS as f64)))
        .collect()
}

/// Left/right label-area widths shared by every panel of a stack, so their
/// plot areas start and end at the same x.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gutters {
    pub left: u32,
    pub right: u32,
}

impl Gutters {
    pub fn for_panels<'a>(panels: impl IntoIterator<Item = &'a Panel>) -> Self {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for panel in panels {
            for (axis, cfg) in panel.resolved_value_axes().iter().zip(&panel.value_axes) {
                match cfg.position {
                    AxisPosition::Left => left.extend(label_samples(axis)),
                    AxisPosition::Right => right.extend(label_samples(axis)),
                }
            }
        }
        Self {
            left: label_area_px(left, LABEL_FONT_PX),
            right: label_area_px(right, LABEL_FONT_PX),
        }
    }
}

/// Draw `panel` into `area` and run the plugin hooks.
///
/// Returns the mapper used for the pass (its plot area is relative to `area`),
/// or `None` when the panel has no time window yet and only a placeholder was drawn.
pub fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    gutters: Gutters,
    plugins: &[Box<dyn PanelPlugin>],
) -> Result<Option<CoordinateMapper>> {
    ensure_fonts_registered();
    area.fill(&WHITE).map_err(render_err)?;
    let (w, h) = area.dim_in_pixel();
    let caption = text::fit_to_width(&panel.title, CAPTION_FONT_PX, w.saturating_sub(2 * MARGIN));

    let Some(window) = panel.resolved_time_window() else {
        let style = TextStyle::from(font(CAPTION_FONT_PX)).pos(Pos::new(HPos::Center, VPos::Center));
        area.draw(&Text::new(
            format!("{caption}: no data"),
            ((w / 2) as i32, (h / 2) as i32),
            style,
        ))
        .map_err(render_err)?;
        return Ok(None);
    };

    let axes = panel.resolved_value_axes();
    let primary = axes.first().copied();
    let y_range = primary.as_ref().map_or(0.0..1.0, layout_range);
    let primary_fmt = tick_formatter(primary.map_or(ScaleKind::Linear, |a| a.scale));
    let x_fmt = |v: &f64| time_label(*v);

    let mut chart = ChartBuilder::on(area)
        .margin(MARGIN)
        .caption(caption, (FontFamily::SansSerif, CAPTION_FONT_PX))
        .set_label_area_size(LabelAreaPosition::Left, gutters.left)
        .set_label_area_size(LabelAreaPosition::Right, gutters.right)
        .set_label_area_size(LabelAreaPosition::Bottom, TIME_LABEL_AREA_PX)
        .build_cartesian_2d(window.min()..window.max(), y_range)
        .map_err(render_err)?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(X_LABELS)
            .y_labels(Y_LABELS)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&primary_fmt)
            .label_style((FontFamily::SansSerif, LABEL_FONT_PX))
            .axis_desc_style((FontFamily::SansSerif, LABEL_FONT_PX));
        match panel.value_axes.first() {
            Some(cfg) if !cfg.title.is_empty() => {
                mesh.y_desc(cfg.title.as_str());
            }
            Some(_) => {}
            None => {
                mesh.disable_y_mesh().disable_y_axis();
            }
        }
        mesh.draw().map_err(render_err)?;
    }

    let (xr, yr) = chart.plotting_area().get_pixel_range();
    let (bx, by) = area.get_base_pixel();
    let plot = PlotArea::new(
        f64::from(xr.start - bx),
        f64::from(yr.start - by),
        f64::from(xr.end - bx),
        f64::from(yr.end - by),
    );

    if let (Some(secondary), Some(cfg)) = (axes.get(1), panel.value_axes.get(1)) {
        let secondary_fmt = tick_formatter(secondary.scale);
        let mut dual = chart.set_secondary_coord(window.min()..window.max(), layout_range(secondary));
        let mut mesh = dual.configure_secondary_axes();
        mesh.y_labels(Y_LABELS)
            .y_label_formatter(&secondary_fmt)
            .label_style((FontFamily::SansSerif, LABEL_FONT_PX))
            .axis_desc_style((FontFamily::SansSerif, LABEL_FONT_PX));
        if !cfg.title.is_empty() {
            mesh.y_desc(cfg.title.as_str());
        }
        mesh.draw().map_err(render_err)?;
    }

    let mapper = CoordinateMapper::new(plot, window, axes);
    let mut surface = PlottersSurface::new(area);
    draw_native_series(panel, &mapper, &mut surface)?;
    draw_legend(area, panel, &plot)?;
    for plugin in plugins {
        plugin.after_datasets_draw(panel, &mapper, &mut surface);
    }
    for plugin in plugins {
        plugin.after_draw(panel, &mapper, &mut surface);
    }
    log::trace!("{}: {} elements drawn", panel.id(), surface.emitted());
    Ok(Some(mapper))
}

/// Native series labels, top-left inside the plot area.
fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &Panel, plot: &PlotArea) -> Result<()> {
    let native = panel
        .series
        .iter()
        .filter(|s| s.role.is_native() && !s.label.is_empty());
    let x = plot.left as i32 + 8;
    for (i, series) in native.enumerate() {
        let y = plot.top as i32 + 8 + i as i32 * (LABEL_FONT_PX as i32 + 4);
        let color = to_plotters_color(series.color);
        let swatch = if series.role == SeriesRole::Bars {
            color.filled()
        } else {
            color.stroke_width(2)
        };
        area.draw(&PathElement::new(vec![(x, y + 6), (x + 14, y + 6)], swatch))
            .map_err(render_err)?;
        area.draw(&Text::new(
            series.label.clone(),
            (x + 20, y),
            font(LABEL_FONT_PX).color(&BLACK),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

/// Draw every panel of `group` stacked vertically, one equal-height slot each.
pub fn draw_group<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    group: &ChartGroup,
    plugins: &[Box<dyn PanelPlugin>],
) -> Result<Vec<Option<CoordinateMapper>>> {
    let registry = group.registry();
    if registry.is_empty() {
        return Err(MeteogramError::Empty("no panels registered".into()));
    }
    let gutters = Gutters::for_panels(registry.iter());
    let slots = root.split_evenly((registry.len(), 1));
    slots
        .iter()
        .zip(registry.iter())
        .map(|(slot, panel)| draw_panel(slot, panel, gutters, plugins))
        .collect()
}

/// Render all panels to one image: **SVG** when `out_path` ends in `.svg`,
/// otherwise a bitmap whose format follows the extension (PNG recommended).
pub fn render_group_to_file<P: AsRef<Path>>(
    group: &ChartGroup,
    out_path: P,
    width: u32,
    panel_height: u32,
) -> Result<()> {
    if width == 0 || panel_height == 0 {
        return Err(MeteogramError::Empty("zero-sized canvas".into()));
    }
    let n = group.registry().len() as u32;
    if n == 0 {
        return Err(MeteogramError::Empty("no panels registered".into()));
    }
    ensure_fonts_registered();
    let out_path = out_path.as_ref();
    let height = panel_height.saturating_mul(n);
    let plugins = default_plugins();

    if out_path.extension().and_then(|s| s.to_str()) == Some("svg") {
        let root = SVGBackend::new(out_path, (width, height)).into_drawing_area();
        draw_group(&root, group, &plugins)?;
        root.present().map_err(render_err)?;
    } else {
        let root = BitMapBackend::new(out_path, (width, height)).into_drawing_area();
        draw_group(&root, group, &plugins)?;
        root.present().map_err(render_err)?;
    }
    log::info!("wrote {} panels to {}", n, out_path.display());
    Ok(())
}

/// Render one panel into an RGB8 buffer of `width * height * 3` bytes.
pub fn render_panel_rgb(
    panel: &Panel,
    gutters: Gutters,
    plugins: &[Box<dyn PanelPlugin>],
    width: u32,
    height: u32,
) -> Result<(Vec<u8>, Option<CoordinateMapper>)> {
    if width == 0 || height == 0 {
        return Err(MeteogramError::Empty("zero-sized canvas".into()));
    }
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    let mapper = {
        let root = BitMapBackend::with_buffer(&mut buf, (width, height)).into_drawing_area();
        let mapper = draw_panel(&root, panel, gutters, plugins)?;
        root.present().map_err(render_err)?;
        mapper
    };
    Ok((buf, mapper))
}

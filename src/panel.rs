//! Chart panels: time axis, value axes and role-tagged series.
//!
//! A panel is built once per [`PanelKind`]; its series are rebuilt from every
//! fresh [`WeatherPayload`] while its time bounds stay under the control of
//! the pan/zoom controller.

use std::fmt;

use crate::glyph::Rgba;
use crate::models::{WeatherPayload, WindLayer, parse_epoch_ms};
use crate::scale::{ResolvedAxis, ScaleKind, TimeWindow};

/// Half-width used to give a single-sample series a visible window.
const SINGLE_SAMPLE_PAD_MS: f64 = 30.0 * 60.0 * 1000.0;

/// The six panels of a meteogram, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelKind {
    Temperature,
    Precipitation,
    Clouds,
    Winds,
    SurfaceWind,
    Vfr,
}

impl PanelKind {
    pub const ALL: [PanelKind; 6] = [
        PanelKind::Temperature,
        PanelKind::Precipitation,
        PanelKind::Clouds,
        PanelKind::Winds,
        PanelKind::SurfaceWind,
        PanelKind::Vfr,
    ];

    pub fn id(self) -> PanelId {
        PanelId(match self {
            PanelKind::Temperature => "temperature",
            PanelKind::Precipitation => "precipitation",
            PanelKind::Clouds => "clouds",
            PanelKind::Winds => "winds",
            PanelKind::SurfaceWind => "surface-wind",
            PanelKind::Vfr => "vfr",
        })
    }

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Temperature => "Temperature / Dew point",
            PanelKind::Precipitation => "Precipitation",
            PanelKind::Clouds => "Cloud layers",
            PanelKind::Winds => "Winds aloft",
            PanelKind::SurfaceWind => "Surface wind (10 m)",
            PanelKind::Vfr => "VFR probability",
        }
    }

    /// Look a kind up by its id string (`"clouds"`, `"surface-wind"`...).
    pub fn from_id(id: &str) -> Option<PanelKind> {
        PanelKind::ALL.into_iter().find(|k| k.id().as_str() == id)
    }
}

/// Stable identifier of a registered panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(&'static str);

impl PanelId {
    /// Ids normally come from [`PanelKind::id`]; free-form ids never match a registered panel.
    pub const fn new(name: &'static str) -> Self {
        PanelId(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Which custom glyph an overlay-eligible series is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphKind {
    CloudBlob,
    WindBarb,
    ProbabilityLabel,
    CloudBaseLabel,
}

/// What a series is, fixed when the series is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesRole {
    Line,
    Bars,
    CloudLayer,
    CloudBase,
    WindLayer,
    VfrProbability,
}

impl SeriesRole {
    pub fn glyph(self) -> Option<GlyphKind> {
        match self {
            SeriesRole::Line | SeriesRole::Bars => None,
            SeriesRole::CloudLayer => Some(GlyphKind::CloudBlob),
            SeriesRole::CloudBase => Some(GlyphKind::CloudBaseLabel),
            SeriesRole::WindLayer => Some(GlyphKind::WindBarb),
            SeriesRole::VfrProbability => Some(GlyphKind::ProbabilityLabel),
        }
    }

    /// Drawn by the renderer itself rather than by the overlay pass.
    pub fn is_native(self) -> bool {
        self.glyph().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeriesRole::Line => "line",
            SeriesRole::Bars => "bars",
            SeriesRole::CloudLayer => "cloud_layer",
            SeriesRole::CloudBase => "cloud_base",
            SeriesRole::WindLayer => "wind_layer",
            SeriesRole::VfrProbability => "vfr_probability",
        }
    }
}

/// Per-point fields a glyph is derived from.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointAux {
    pub coverage: Option<f64>,
    pub speed: Option<f64>,
    pub direction: Option<f64>,
    pub probability: Option<f64>,
    /// Tens of feet.
    pub cloud_base: Option<f64>,
    /// Layer code reported by the backend (`SCT`, `BKN`, ...); only shown in readouts.
    pub symbol: Option<String>,
    /// Meters.
    pub visibility: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint {
    /// Epoch milliseconds.
    pub time: f64,
    pub value: Option<f64>,
    pub aux: PointAux,
}

impl SeriesPoint {
    pub fn new(time: f64, value: Option<f64>) -> Self {
        Self {
            time,
            value,
            aux: PointAux::default(),
        }
    }

    pub fn with_aux(mut self, aux: PointAux) -> Self {
        self.aux = aux;
        self
    }

    /// A point with no finite value (or time) is skipped by every draw pass.
    pub fn is_renderable(&self) -> bool {
        self.time.is_finite() && self.value.is_some_and(f64::is_finite)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub role: SeriesRole,
    pub label: String,
    pub color: Rgba,
    /// Index into the panel's value axes.
    pub axis: usize,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(role: SeriesRole, label: impl Into<String>, color: Rgba, axis: usize) -> Self {
        Self {
            role,
            label: label.into(),
            color,
            axis,
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<SeriesPoint>) -> Self {
        self.points = points;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisPosition {
    #[default]
    Left,
    Right,
}

/// Value-axis configuration; unset bounds are auto-scaled from the data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueAxis {
    pub scale: ScaleKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub title: String,
    pub position: AxisPosition,
}

impl ValueAxis {
    pub fn linear(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn logarithmic(title: impl Into<String>) -> Self {
        Self {
            scale: ScaleKind::Logarithmic,
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn on_right(mut self) -> Self {
        self.position = AxisPosition::Right;
        self
    }
}

/// The shared time axis. `None` bounds mean auto-scaled from the data extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeAxis {
    bounds: Option<TimeWindow>,
}

impl TimeAxis {
    pub fn bounds(&self) -> Option<TimeWindow> {
        self.bounds
    }

    pub fn set(&mut self, window: TimeWindow) {
        self.bounds = Some(window);
    }

    pub fn clear(&mut self) {
        self.bounds = None;
    }
}

/// How soon a requested redraw should happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawMode {
    /// Next frame, no animation.
    Immediate,
    /// Whenever the host gets to it (data refresh).
    Deferred,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    id: PanelId,
    kind: PanelKind,
    pub title: String,
    pub time_axis: TimeAxis,
    pub value_axes: Vec<ValueAxis>,
    pub series: Vec<Series>,
    pending_redraw: Option<RedrawMode>,
    redraw_requests: u64,
}

impl Panel {
    /// An empty panel with the axis layout of `kind`.
    pub fn new(kind: PanelKind) -> Self {
        Self {
            id: kind.id(),
            kind,
            title: kind.title().to_string(),
            time_axis: TimeAxis::default(),
            value_axes: default_axes(kind),
            series: Vec::new(),
            pending_redraw: None,
            redraw_requests: 0,
        }
    }

    /// A panel with its series built from `payload`.
    pub fn from_payload(kind: PanelKind, payload: &WeatherPayload) -> Self {
        let mut panel = Self::new(kind);
        panel.series = series_for(kind, payload);
        panel
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    /// Swap in freshly built series; axis bounds are left alone.
    pub fn replace_series(&mut self, series: Vec<Series>) {
        self.series = series;
        self.request_redraw(RedrawMode::Deferred);
    }

    pub fn set_time_window(&mut self, window: TimeWindow) {
        self.time_axis.set(window);
    }

    /// Record a redraw request. An immediate request wins over a deferred one.
    pub fn request_redraw(&mut self, mode: RedrawMode) {
        self.redraw_requests += 1;
        self.pending_redraw = match (self.pending_redraw, mode) {
            (Some(RedrawMode::Immediate), _) => Some(RedrawMode::Immediate),
            (_, m) => Some(m),
        };
    }

    pub fn pending_redraw(&self) -> Option<RedrawMode> {
        self.pending_redraw
    }

    /// Hand the pending request to the host and clear it.
    pub fn take_redraw(&mut self) -> Option<RedrawMode> {
        self.pending_redraw.take()
    }

    pub fn redraw_requests(&self) -> u64 {
        self.redraw_requests
    }

    /// Extent of all renderable series times.
    pub fn data_time_extent(&self) -> Option<TimeWindow> {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|p| p.is_renderable())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.time), hi.max(p.time))
            });
        if lo > hi {
            return None;
        }
        TimeWindow::new(lo, hi)
            .or_else(|| TimeWindow::new(lo - SINGLE_SAMPLE_PAD_MS, hi + SINGLE_SAMPLE_PAD_MS))
    }

    /// The visible window: configured bounds, else the data extent.
    pub fn resolved_time_window(&self) -> Option<TimeWindow> {
        self.time_axis.bounds().or_else(|| self.data_time_extent())
    }

    /// Concrete value axes for one draw pass.
    pub fn resolved_value_axes(&self) -> Vec<ResolvedAxis> {
        self.value_axes
            .iter()
            .enumerate()
            .map(|(idx, axis)| {
                let data = self
                    .series
                    .iter()
                    .filter(|s| s.axis == idx && !is_label_row(s.role))
                    .flat_map(|s| s.points.iter().filter_map(|p| p.value));
                ResolvedAxis::resolve(axis.scale, axis.min, axis.max, data)
            })
            .collect()
    }
}

/// Label series are positioned by row, so their values never size an axis.
fn is_label_row(role: SeriesRole) -> bool {
    matches!(role, SeriesRole::CloudBase | SeriesRole::VfrProbability)
}

fn default_axes(kind: PanelKind) -> Vec<ValueAxis> {
    match kind {
        PanelKind::Temperature => vec![ValueAxis::linear("°C")],
        PanelKind::Precipitation => vec![
            ValueAxis::linear("mm").bounds(Some(0.0), None),
            ValueAxis::linear("%").bounds(Some(0.0), Some(100.0)).on_right(),
        ],
        PanelKind::Clouds => {
            vec![ValueAxis::logarithmic("Height (ft)").bounds(Some(100.0), Some(40_000.0))]
        }
        PanelKind::Winds => vec![ValueAxis::linear("Height (ft)").bounds(Some(0.0), None)],
        PanelKind::SurfaceWind => vec![ValueAxis::linear("kt").bounds(Some(0.0), None)],
        // Label rows sit at fixed heights and need no value axis.
        PanelKind::Vfr => Vec::new(),
    }
}

/// Records whose timestamp cannot be parsed are dropped.
fn timed<'a, T>(records: &'a [T], time: impl Fn(&T) -> &str + 'a) -> impl Iterator<Item = (f64, &'a T)> + 'a {
    records.iter().filter_map(move |r| match parse_epoch_ms(time(r)) {
        Some(t) => Some((t, r)),
        None => {
            log::debug!("skipping record with unparseable time {:?}", time(r));
            None
        }
    })
}

fn barb_point(time: f64, layer: &WindLayer) -> SeriesPoint {
    SeriesPoint::new(time, layer.height_feet).with_aux(PointAux {
        speed: layer.speed,
        direction: layer.direction,
        ..PointAux::default()
    })
}

/// Build the series of one panel kind from a payload.
pub fn series_for(kind: PanelKind, payload: &WeatherPayload) -> Vec<Series> {
    match kind {
        PanelKind::Temperature => {
            let rows: Vec<_> = timed(&payload.temperature_data, |r| &r.time).collect();
            vec![
                Series::new(SeriesRole::Line, "Temperature (°C)", Rgba::rgb(0xd3, 0x2f, 0x2f), 0)
                    .with_points(rows.iter().map(|(t, r)| SeriesPoint::new(*t, r.temperature)).collect()),
                Series::new(SeriesRole::Line, "Dew point (°C)", Rgba::rgb(0x19, 0x76, 0xd2), 0)
                    .with_points(rows.iter().map(|(t, r)| SeriesPoint::new(*t, r.dew_point)).collect()),
            ]
        }
        PanelKind::Precipitation => {
            let rows: Vec<_> = timed(&payload.temperature_data, |r| &r.time).collect();
            vec![
                Series::new(SeriesRole::Bars, "Precipitation (mm)", Rgba::rgb(0x42, 0xa5, 0xf5), 0)
                    .with_points(rows.iter().map(|(t, r)| SeriesPoint::new(*t, r.precipitation)).collect()),
                Series::new(SeriesRole::Line, "Probability (%)", Rgba::rgb(0x7e, 0x57, 0xc2), 1).with_points(
                    rows.iter()
                        .map(|(t, r)| SeriesPoint::new(*t, r.precipitation_probability))
                        .collect(),
                ),
            ]
        }
        PanelKind::Clouds => {
            let rows: Vec<_> = timed(&payload.cloud_data, |r| &r.time).collect();
            let layers = rows
                .iter()
                .flat_map(|(t, r)| {
                    r.cloud_layers.iter().map(move |l| {
                        SeriesPoint::new(*t, l.height_feet).with_aux(PointAux {
                            coverage: l.coverage,
                            symbol: l.symbol.clone().filter(|s| !s.trim().is_empty()),
                            ..PointAux::default()
                        })
                    })
                })
                .collect();
            let bases = rows
                .iter()
                .map(|(t, r)| {
                    let tens = r.cloud_base_feet.map(|ft| ft / 10.0);
                    SeriesPoint::new(*t, tens).with_aux(PointAux {
                        cloud_base: tens,
                        visibility: r.visibility,
                        ..PointAux::default()
                    })
                })
                .collect();
            vec![
                Series::new(SeriesRole::CloudLayer, "Cloud layers", Rgba::BLACK, 0).with_points(layers),
                Series::new(SeriesRole::CloudBase, "Cloud base (x10 ft)", Rgba::BLACK, 0).with_points(bases),
            ]
        }
        PanelKind::Winds => {
            let aloft = timed(&payload.wind_data, |r| &r.time)
                .flat_map(|(t, r)| r.wind_layers.iter().map(move |l| barb_point(t, l)));
            let surface = timed(&payload.surface_wind_data, |r| &r.time)
                .flat_map(|(t, r)| r.wind_layers.iter().map(move |l| barb_point(t, l)));
            vec![
                Series::new(SeriesRole::WindLayer, "Wind layers", Rgba::rgb(0x22, 0x22, 0x22), 0)
                    .with_points(surface.chain(aloft).collect()),
            ]
        }
        PanelKind::SurfaceWind => {
            let rows: Vec<_> = timed(&payload.surface_wind_data, |r| &r.time).collect();
            vec![
                Series::new(SeriesRole::Line, "Wind 10 m (kt)", Rgba::rgb(0x45, 0x5a, 0x64), 0)
                    .with_points(rows.iter().map(|(t, r)| SeriesPoint::new(*t, r.wind_speed_10m)).collect()),
                Series::new(SeriesRole::Line, "Gusts 10 m (kt)", Rgba::rgb(0xef, 0x6c, 0x00), 0)
                    .with_points(rows.iter().map(|(t, r)| SeriesPoint::new(*t, r.wind_gusts_10m)).collect()),
            ]
        }
        PanelKind::Vfr => {
            let points = timed(&payload.vfr_data, |r| &r.time)
                .map(|(t, r)| {
                    SeriesPoint::new(t, r.probability).with_aux(PointAux {
                        probability: r.probability,
                        ..PointAux::default()
                    })
                })
                .collect();
            vec![Series::new(SeriesRole::VfrProbability, "VFR probability (%)", Rgba::BLACK, 0).with_points(points)]
        }
    }
}

/// One panel per kind, in display order.
pub fn build_panels(payload: &WeatherPayload) -> Vec<Panel> {
    PanelKind::ALL
        .into_iter()
        .map(|kind| Panel::from_payload(kind, payload))
        .collect()
}

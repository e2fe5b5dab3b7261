//! Hover readout: the samples of one panel closest to a pointer position,
//! formatted as tooltip lines.

use crate::models::to_local;
use crate::panel::{Panel, PointAux, SeriesRole};
use crate::scale::CoordinateMapper;

/// One sample at the readout time.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadoutEntry {
    pub series: String,
    pub role: SeriesRole,
    pub value: Option<f64>,
    pub aux: PointAux,
}

/// Every sample of a panel that shares the time nearest to the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct Readout {
    /// Epoch milliseconds of the samples.
    pub time: f64,
    pub entries: Vec<ReadoutEntry>,
}

impl Readout {
    /// Sample time in the viewer's local zone.
    pub fn title(&self) -> String {
        to_local(self.time)
            .map(|t| t.format("%a %d %b %H:%M").to_string())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(describe).collect()
    }
}

fn opt(v: Option<f64>, unit: &str) -> String {
    match v {
        Some(v) => format!("{}{unit}", v.round()),
        None => "n/a".to_string(),
    }
}

fn describe(e: &ReadoutEntry) -> String {
    match e.role {
        SeriesRole::CloudLayer => {
            let mut s = format!(
                "Cloud layer {}: coverage {}",
                opt(e.value, " ft"),
                opt(e.aux.coverage, "%")
            );
            if let Some(sym) = &e.aux.symbol {
                s.push_str(", ");
                s.push_str(sym);
            }
            s
        }
        SeriesRole::CloudBase => {
            let mut s = format!("Cloud base {}", opt(e.aux.cloud_base.map(|b| b * 10.0), " ft"));
            if let Some(vis) = e.aux.visibility {
                s.push_str(&format!(", visibility {} m", vis.round()));
            }
            s
        }
        SeriesRole::WindLayer => format!(
            "Wind at {}: {} / {}",
            opt(e.value, " ft"),
            opt(e.aux.direction, "°"),
            opt(e.aux.speed, " kt")
        ),
        SeriesRole::VfrProbability => format!("{}: {}", e.series, opt(e.aux.probability, "%")),
        SeriesRole::Line | SeriesRole::Bars => match e.value {
            Some(v) => format!("{}: {v:.1}", e.series),
            None => format!("{}: n/a", e.series),
        },
    }
}

/// Time of the renderable sample closest to `time`, if one lies within `max_distance_ms`.
pub fn nearest_sample_time(panel: &Panel, time: f64, max_distance_ms: f64) -> Option<f64> {
    if !time.is_finite() {
        return None;
    }
    panel
        .series
        .iter()
        .flat_map(|s| s.points.iter())
        .filter(|p| p.is_renderable())
        .map(|p| p.time)
        .filter(|t| (t - time).abs() <= max_distance_ms)
        .min_by(|a, b| (a - time).abs().total_cmp(&(b - time).abs()))
}

/// Readout of the samples nearest to `time`.
pub fn readout_at(panel: &Panel, time: f64, max_distance_ms: f64) -> Option<Readout> {
    let t = nearest_sample_time(panel, time, max_distance_ms)?;
    let entries = panel
        .series
        .iter()
        .flat_map(|s| {
            s.points
                .iter()
                .filter(move |p| p.is_renderable() && p.time == t)
                .map(move |p| ReadoutEntry {
                    series: s.label.clone(),
                    role: s.role,
                    value: p.value,
                    aux: p.aux.clone(),
                })
        })
        .collect();
    Some(Readout { time: t, entries })
}

/// Readout under pixel column `px` of a rendered panel. Samples further than
/// `snap_px` pixels from the pointer are not picked up.
pub fn readout_at_px(panel: &Panel, mapper: &CoordinateMapper, px: f64, snap_px: f64) -> Option<Readout> {
    let time = mapper.time_at(px)?;
    let reach = (mapper.time_at(px + snap_px.abs())? - time).abs();
    readout_at(panel, time, reach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{WeatherPayload, parse_epoch_ms};
    use crate::panel::PanelKind;
    use crate::scale::{PlotArea, TimeWindow};

    const HOUR: f64 = 3_600_000.0;

    fn payload() -> WeatherPayload {
        WeatherPayload::from_json(
            r#"{
                "temperature_data": [
                    {"time": "2024-05-01T12:00", "temperature": 12.5, "dew_point": 7.0},
                    {"time": "2024-05-01T13:00", "temperature": 13.0, "dew_point": null}
                ],
                "cloud_data": [
                    {"time": "2024-05-01T12:00", "cloud_base_feet": 1500, "visibility": 8000,
                     "cloud_layers": [{"height_feet": 2500, "coverage": 60, "symbol": "BKN"},
                                      {"height_feet": 9000, "coverage": 20, "symbol": ""}]},
                    {"time": "2024-05-01T15:00", "cloud_layers": [{"height_feet": 4000, "coverage": 90, "symbol": "OVC"}]}
                ],
                "wind_data": [
                    {"time": "2024-05-01T12:00", "wind_layers": [{"height_feet": 3000, "speed": 25, "direction": 250}]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn noon() -> f64 {
        parse_epoch_ms("2024-05-01T12:00").unwrap()
    }

    #[test]
    fn nearest_time_snaps_within_reach() {
        let panel = Panel::from_payload(PanelKind::Clouds, &payload());
        assert_eq!(nearest_sample_time(&panel, noon() + 0.4 * HOUR, HOUR), Some(noon()));
        assert_eq!(nearest_sample_time(&panel, noon() + 2.6 * HOUR, HOUR), Some(noon() + 3.0 * HOUR));
        assert_eq!(nearest_sample_time(&panel, noon() + 1.5 * HOUR, HOUR), None);
        assert_eq!(nearest_sample_time(&panel, f64::NAN, HOUR), None);
    }

    #[test]
    fn cloud_readout_lists_every_layer_with_its_symbol() {
        let panel = Panel::from_payload(PanelKind::Clouds, &payload());
        let r = readout_at(&panel, noon() + 10_000.0, HOUR).unwrap();
        assert_eq!(r.time, noon());
        assert_eq!(r.entries.len(), 3);
        assert_eq!(r.entries[0].aux.symbol.as_deref(), Some("BKN"));
        // blank codes are dropped when the panel is built
        assert_eq!(r.entries[1].aux.symbol, None);

        let lines = r.lines();
        assert_eq!(lines[0], "Cloud layer 2500 ft: coverage 60%, BKN");
        assert_eq!(lines[1], "Cloud layer 9000 ft: coverage 20%");
        assert_eq!(lines[2], "Cloud base 1500 ft, visibility 8000 m");
        assert!(!r.title().is_empty());
    }

    #[test]
    fn line_readout_skips_gaps() {
        let panel = Panel::from_payload(PanelKind::Temperature, &payload());
        let r = readout_at(&panel, noon() + HOUR, 60_000.0).unwrap();
        // the dew point is missing at 13:00
        assert_eq!(r.lines(), ["Temperature (°C): 13.0"]);
    }

    #[test]
    fn wind_readout_shows_direction_and_speed() {
        let panel = Panel::from_payload(PanelKind::Winds, &payload());
        let r = readout_at(&panel, noon(), 1.0).unwrap();
        assert_eq!(r.lines(), ["Wind at 3000 ft: 250° / 25 kt"]);
    }

    #[test]
    fn pixel_lookup_goes_through_the_inverse_time_mapping() {
        let panel = Panel::from_payload(PanelKind::Clouds, &payload());
        // 100 px per hour from 11:00
        let window = TimeWindow::new(noon() - HOUR, noon() + 9.0 * HOUR).unwrap();
        let mapper = CoordinateMapper::new(
            PlotArea::new(0.0, 0.0, 1000.0, 100.0),
            window,
            panel.resolved_value_axes(),
        );
        let r = readout_at_px(&panel, &mapper, 110.0, 20.0).unwrap();
        assert_eq!(r.time, noon());
        assert_eq!(readout_at_px(&panel, &mapper, 400.0, 20.0).unwrap().time, noon() + 3.0 * HOUR);
        assert!(readout_at_px(&panel, &mapper, 250.0, 20.0).is_none());
    }
}

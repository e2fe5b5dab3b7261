use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use csv::WriterBuilder;

use crate::models::WeatherPayload;
use crate::panel::Panel;

/// Save the weather document as pretty JSON (re-readable with [`load_payload_json`]).
pub fn save_payload_json<P: AsRef<Path>>(payload: &WeatherPayload, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(payload)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

pub fn load_payload_json<P: AsRef<Path>>(path: P) -> Result<WeatherPayload> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    WeatherPayload::from_json(&text).with_context(|| format!("decode {}", path.display()))
}

fn iso_time(ms: f64) -> String {
    chrono::DateTime::from_timestamp_millis(ms.round() as i64)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Export every series point as one CSV row with header. Returns the row count.
pub fn export_csv<'a, P: AsRef<Path>>(
    panels: impl IntoIterator<Item = &'a Panel>,
    path: P,
) -> Result<usize> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    wtr.serialize((
        "panel",
        "series",
        "role",
        "time",
        "value",
        "coverage",
        "speed",
        "direction",
        "probability",
        "cloud_base",
        "symbol",
        "visibility",
    ))?;
    let mut rows = 0;
    for panel in panels {
        for series in &panel.series {
            for p in &series.points {
                wtr.serialize((
                    panel.id().as_str(),
                    &series.label,
                    series.role.as_str(),
                    iso_time(p.time),
                    p.value,
                    p.aux.coverage,
                    p.aux.speed,
                    p.aux.direction,
                    p.aux.probability,
                    p.aux.cloud_base,
                    p.aux.symbol.as_deref(),
                    p.aux.visibility,
                ))?;
                rows += 1;
            }
        }
    }
    wtr.flush()?;
    log::info!("exported {rows} rows to {}", path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TemperatureRecord, VfrRecord};
    use crate::panel::build_panels;
    use tempfile::tempdir;

    fn payload() -> WeatherPayload {
        WeatherPayload {
            temperature_data: vec![TemperatureRecord {
                time: "2024-05-01T12:00".into(),
                temperature: Some(12.5),
                dew_point: Some(7.0),
                precipitation: None,
                precipitation_probability: Some(30.0),
            }],
            vfr_data: vec![VfrRecord {
                time: "2024-05-01T12:00".into(),
                probability: Some(85.0),
            }],
            ..WeatherPayload::default()
        }
    }

    #[test]
    fn json_survives_a_save_and_load() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("wx.json");
        save_payload_json(&payload(), &p).unwrap();
        assert_eq!(load_payload_json(&p).unwrap(), payload());
    }

    #[test]
    fn csv_has_one_row_per_point() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("wx.csv");
        let panels = build_panels(&payload());
        let expected: usize = panels
            .iter()
            .flat_map(|p| &p.series)
            .map(|s| s.points.len())
            .sum();
        let rows = export_csv(&panels, &p).unwrap();
        assert_eq!(rows, expected);

        let text = std::fs::read_to_string(&p).unwrap();
        assert!(text.starts_with("panel,series,role,time,value,"));
        assert!(text.contains("vfr,"));
        assert!(text.contains("2024-05-01T12:00:00Z"));
        assert_eq!(text.lines().count(), rows + 1);
    }
}

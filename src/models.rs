use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Processed weather document served by the backend (`/api/weather`).
///
/// Every array is optional; a backend that does not compute VFR probability
/// simply omits `vfr_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(default)]
    pub temperature_data: Vec<TemperatureRecord>,
    #[serde(default)]
    pub cloud_data: Vec<CloudRecord>,
    #[serde(default)]
    pub wind_data: Vec<WindRecord>,
    #[serde(default)]
    pub surface_wind_data: Vec<SurfaceWindRecord>,
    #[serde(default)]
    pub vfr_data: Vec<VfrRecord>,
}

impl WeatherPayload {
    /// Decode a payload from JSON text.
    pub fn from_json(text: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_empty(&self) -> bool {
        self.temperature_data.is_empty()
            && self.cloud_data.is_empty()
            && self.wind_data.is_empty()
            && self.surface_wind_data.is_empty()
            && self.vfr_data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub time: String,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub dew_point: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub precipitation: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub precipitation_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudRecord {
    pub time: String,
    #[serde(default)]
    pub cloud_layers: Vec<CloudLayer>,
    /// Lowest cloud base in feet, when the backend reports one.
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub cloud_base_feet: Option<f64>,
    /// Horizontal visibility in meters.
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub visibility: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudLayer {
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub height_feet: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub coverage: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    pub time: String,
    #[serde(default)]
    pub wind_layers: Vec<WindLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindLayer {
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub height_feet: Option<f64>,
    /// Knots.
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub speed: Option<f64>,
    /// Degrees, direction the wind blows *from*.
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub direction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceWindRecord {
    pub time: String,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub wind_speed_10m: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub wind_gusts_10m: Option<f64>,
    #[serde(default)]
    pub wind_layers: Vec<WindLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VfrRecord {
    pub time: String,
    #[serde(default, deserialize_with = "de_opt_f64_lenient")]
    pub probability: Option<f64>,
}

/// Serde helper: accept a JSON number, a numeric string, or `null`.
/// Unparseable strings, booleans and non-finite numbers decode to `None`.
fn de_opt_f64_lenient<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct OptF64Visitor;

    impl<'de> Visitor<'de> for OptF64Visitor {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number, a numeric string or null")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(v.is_finite().then_some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, s: &str) -> Result<Self::Value, E> {
            Ok(s.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, d: D2) -> Result<Self::Value, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            d.deserialize_any(OptF64Visitor)
        }
    }

    deserializer.deserialize_option(OptF64Visitor)
}

/// Naive timestamp formats the backend emits (open-meteo style, minute or second precision).
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a record timestamp. Naive timestamps are interpreted as UTC; strings
/// carrying an explicit offset are honored.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Milliseconds since the Unix epoch; the unit of every time axis.
pub fn epoch_ms(dt: DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64
}

/// Parse a record timestamp straight into the time-axis unit.
pub fn parse_epoch_ms(s: &str) -> Option<f64> {
    parse_timestamp(s).map(epoch_ms)
}

/// Convert a time-axis value to the viewer's local time zone for labelling.
pub fn to_local(ms: f64) -> Option<DateTime<Local>> {
    if !ms.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(ms.round() as i64)
        .single()
        .map(|dt| dt.with_timezone(&Local))
}

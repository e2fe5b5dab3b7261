//! Utility functions for panel rendering: colors, tick formatting, axis sizing.

use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use crate::glyph::Rgba;
use crate::models::to_local;

use super::text::estimate_text_width_px;

#[inline]
pub fn to_plotters_color(c: Rgba) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, c.a)
}

/// Time tick label in the viewer's local zone; the date is only shown at midnight.
pub fn time_label(ms: f64) -> String {
    match to_local(ms) {
        Some(t) if t.format("%H:%M").to_string() == "00:00" => t.format("%a %d").to_string(),
        Some(t) => t.format("%H:%M").to_string(),
        None => String::new(),
    }
}

/// Linear value tick: fewer decimals as magnitude grows, thousands separated.
pub fn value_label(v: f64) -> String {
    let a = v.abs();
    if a >= 1000.0 {
        group_thousands(v)
    } else {
        let prec = if a >= 100.0 {
            0
        } else if a >= 10.0 {
            1
        } else {
            2
        };
        let s = format!("{:.*}", prec, v);
        // "-0.00" reads badly next to the zero line
        if s.trim_start_matches('-').trim_end_matches(['0', '.']).is_empty() {
            "0".to_string()
        } else {
            s
        }
    }
}

/// Tick for an axis laid out in log10 space: `v` is the exponent.
pub fn log_value_label(v: f64) -> String {
    group_thousands(10f64.powf(v))
}

fn group_thousands(v: f64) -> String {
    let rounded = v.round() as i64;
    let s = rounded.unsigned_abs().to_formatted_string(&Locale::en);
    if rounded < 0 { format!("-{s}") } else { s }
}

/// Width of a value-axis label area that fits the widest tick label.
/// The same width is used on every panel so the time axes line up.
pub fn label_area_px(samples: impl IntoIterator<Item = String>, font_px: u32) -> u32 {
    let widest = samples
        .into_iter()
        .map(|s| estimate_text_width_px(&s, font_px))
        .max()
        .unwrap_or(0);
    widest.saturating_add(30).clamp(56, 120)
}

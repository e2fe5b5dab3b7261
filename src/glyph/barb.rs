//! Wind barbs: a shaft plus pennants (50 kt), full barbs (10 kt) and a half barb (5 kt).
//!
//! The glyph is built in a local frame where the shaft runs from the station
//! point `(0, 0)` to `(0, -SHAFT_LEN)`, then rotated so the shaft points along
//! `(direction + 180) mod 360` degrees (clockwise from screen-up).

use std::f64::consts::TAU;

use super::surface::{DrawingSurface, Rgba, SavedState};
use crate::error::GlyphError;
use crate::scale::Point;

/// Below this speed (knots) a calm circle is drawn instead of a barb.
pub const CALM_BELOW_KT: f64 = 3.0;
/// Fastest wind drawn as a barb; anything above is rejected as bad data.
pub const MAX_SPEED_KT: f64 = 300.0;

const SHAFT_LEN: f64 = 28.0;
const FLAG_LEN: f64 = 10.0;
/// Distance between consecutive barbs along the shaft.
const FLAG_SPACING: f64 = 5.0;
/// A pennant occupies more shaft than a barb line.
const PENNANT_BASE: f64 = 6.0;
const PENNANT_SPACING: f64 = 7.0;
const CALM_RADIUS: f64 = 4.0;
const LINE_WIDTH: f64 = 1.5;
const BARB_COLOR: Rgba = Rgba::rgb(0x22, 0x22, 0x22);

/// What a wind speed decomposes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarbShape {
    Calm,
    Barb {
        pennants: u32,
        full_barbs: u32,
        half_barb: bool,
    },
}

impl BarbShape {
    /// Decompose a speed in knots. The speed is rounded to whole knots first
    /// and capped at [`MAX_SPEED_KT`].
    pub fn decompose(speed_kt: f64) -> Self {
        if speed_kt < CALM_BELOW_KT {
            return BarbShape::Calm;
        }
        let s = speed_kt.min(MAX_SPEED_KT).round() as u32;
        BarbShape::Barb {
            pennants: s / 50,
            full_barbs: (s % 50) / 10,
            half_barb: s % 10 >= 5,
        }
    }

    /// `(pennants, full_barbs, half_barbs)`; all zero for calm.
    pub fn counts(&self) -> (u32, u32, u32) {
        match *self {
            BarbShape::Calm => (0, 0, 0),
            BarbShape::Barb {
                pennants,
                full_barbs,
                half_barb,
            } => (pennants, full_barbs, u32::from(half_barb)),
        }
    }
}

/// Draw one wind barb with its station point at `at`.
///
/// `speed_kt` must be finite and within `0..=MAX_SPEED_KT`; `direction_deg` is the
/// meteorological "from" direction and must be finite (any value, reduced mod 360).
pub fn draw_wind_barb<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    at: Point,
    speed_kt: f64,
    direction_deg: f64,
) -> Result<BarbShape, GlyphError> {
    if !speed_kt.is_finite() || !(0.0..=MAX_SPEED_KT).contains(&speed_kt) {
        return Err(GlyphError::InvalidValue {
            field: "speed",
            value: speed_kt,
        });
    }
    if !direction_deg.is_finite() {
        return Err(GlyphError::InvalidValue {
            field: "direction",
            value: direction_deg,
        });
    }

    let shape = BarbShape::decompose(speed_kt);
    let mut s = SavedState::new(surface);
    s.translate(at.x, at.y);
    s.set_stroke(BARB_COLOR, LINE_WIDTH);
    s.set_fill(BARB_COLOR);

    let BarbShape::Barb {
        pennants,
        full_barbs,
        half_barb,
    } = shape
    else {
        s.begin_path();
        s.arc(Point::new(0.0, 0.0), CALM_RADIUS, 0.0, TAU);
        s.close_path();
        s.stroke()?;
        return Ok(shape);
    };

    let heading = (direction_deg + 180.0).rem_euclid(360.0);
    s.rotate(heading.to_radians());

    s.begin_path();
    s.move_to(Point::new(0.0, 0.0));
    s.line_to(Point::new(0.0, -SHAFT_LEN));
    s.stroke()?;

    // Offsets run from the outer end of the shaft back toward the station.
    let tip = -SHAFT_LEN;
    let mut offset = 0.0;
    for _ in 0..pennants {
        let y = tip + offset;
        s.begin_path();
        s.move_to(Point::new(0.0, y));
        s.line_to(Point::new(FLAG_LEN, y + PENNANT_BASE / 2.0));
        s.line_to(Point::new(0.0, y + PENNANT_BASE));
        s.close_path();
        s.fill()?;
        offset += PENNANT_SPACING;
    }
    for _ in 0..full_barbs {
        let y = tip + offset;
        s.begin_path();
        s.move_to(Point::new(0.0, y));
        s.line_to(Point::new(FLAG_LEN, y - FLAG_SPACING * 0.8));
        s.stroke()?;
        offset += FLAG_SPACING;
    }
    if half_barb {
        // A lone half barb sits one step in from the tip so it reads as "5", not "10".
        if pennants == 0 && full_barbs == 0 {
            offset += FLAG_SPACING;
        }
        let y = tip + offset;
        s.begin_path();
        s.move_to(Point::new(0.0, y));
        s.line_to(Point::new(FLAG_LEN / 2.0, y - FLAG_SPACING * 0.4));
        s.stroke()?;
    }

    Ok(shape)
}

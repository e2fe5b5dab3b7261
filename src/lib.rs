//! meteogram
//!
//! A time-synchronized meteogram engine: a vertical stack of weather panels
//! (temperature, precipitation, clouds, winds aloft, surface wind, VFR
//! probability) that share one time axis. Dragging or wheel-zooming any panel
//! pans or zooms all of them. Pairs with the `meteogram` CLI and the
//! `meteogram-gui` desktop viewer.
//!
//! ### Features
//! - Decode the backend's weather document (`/api/weather`) into panels
//! - Pan/zoom controller with drag sessions and a configurable zoom modifier
//! - View synchronization across every registered panel, with "reset view"
//! - Custom glyphs drawn over the data: wind barbs, cloud blobs, VFR
//!   probability labels and cloud-base labels
//! - Hover readouts of the samples under the pointer
//! - SVG/PNG rendering of the whole stack, CSV/JSON export
//!
//! ### Example
//! ```no_run
//! use meteogram::{ChartGroup, Modifiers, PanelKind, ZoomGate};
//!
//! let payload = meteogram::storage::load_payload_json("weather.json")?;
//! let mut group = ChartGroup::from_payload(&payload, ZoomGate::Always, Some(24));
//! // zoom out once on the temperature panel; every panel follows
//! group.wheel(PanelKind::Temperature.id(), 120.0, Modifiers::NONE);
//! meteogram::viz::render_group_to_file(&group, "meteogram.svg", 1200, 260)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod glyph;
pub mod models;
pub mod overlay;
pub mod panel;
pub mod readout;
pub mod scale;
pub mod storage;
pub mod sync;
pub mod viz;

pub use api::Client;
pub use config::ViewerConfig;
pub use controller::{Modifiers, PanZoomController, WheelOutcome, ZoomGate};
pub use error::{GlyphError, MeteogramError, SurfaceError};
pub use models::WeatherPayload;
pub use panel::{Panel, PanelId, PanelKind, RedrawMode, Series, SeriesRole};
pub use readout::Readout;
pub use scale::{CoordinateMapper, PlotArea, Point, TimeWindow};
pub use sync::{ChartGroup, PanelRegistry, ViewSynchronizer};

//! Glyph renderers and the drawing surface they paint on.
//!
//! Every renderer is a free function over `&mut impl DrawingSurface`; it reads
//! only its arguments and leaves the surface state as it found it.

pub mod barb;
pub mod cloud;
pub mod label;
pub mod surface;

pub use barb::{BarbShape, draw_wind_barb};
pub use cloud::{cloud_alpha, draw_cloud_blob};
pub use label::{
    CLOUD_BASE_ROW, PROBABILITY_ROW, cloud_base_color, draw_cloud_base_label,
    draw_probability_label, probability_color,
};
pub use surface::{CanvasCore, DrawingSurface, RecordingSurface, Rgba, SavedState, Shape, Subpath};

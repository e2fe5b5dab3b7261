//! Error types for the rendering engine.
//!
//! Glyph and surface errors are absorbed by the overlay pass (an unrenderable
//! glyph degrades to an absent glyph); `MeteogramError` is what the public
//! rendering and decoding entry points return.

/// A drawing backend refused an operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("drawing surface error: {0}")]
pub struct SurfaceError(pub String);

/// Why a single glyph could not be drawn.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GlyphError {
    /// The point lacks the auxiliary field this glyph is derived from.
    #[error("missing auxiliary field `{0}`")]
    MissingField(&'static str),

    /// The field is present but not a usable number (NaN, infinite, negative speed...).
    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// The drawing surface failed while the glyph was being emitted.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Errors surfaced by payload decoding and panel rendering.
#[derive(Debug, thiserror::Error)]
pub enum MeteogramError {
    /// The weather payload could not be decoded.
    #[error("payload decoding error: {0}")]
    Payload(#[from] serde_json::Error),

    /// I/O error while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Plotters (or the surface adapter) failed while laying out a panel.
    #[error("render error: {0}")]
    Render(String),

    /// Nothing to render (no registered panels, zero-sized canvas).
    #[error("nothing to render: {0}")]
    Empty(String),
}

impl From<SurfaceError> for MeteogramError {
    fn from(e: SurfaceError) -> Self {
        MeteogramError::Render(e.0)
    }
}

pub type Result<T, E = MeteogramError> = std::result::Result<T, E>;

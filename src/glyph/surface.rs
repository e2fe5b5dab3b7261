//! A 2D-canvas-like drawing surface.
//!
//! Backends only implement [`DrawingSurface::core`] and [`DrawingSurface::emit`];
//! transform, style, clip and path state live in [`CanvasCore`] so every
//! backend gets identical save/restore semantics. Shapes reach the backend in
//! device space, already flattened to polylines, together with the clip
//! rectangle that was active when they were emitted.

use std::f64::consts::TAU;
use std::ops::{Deref, DerefMut};

use crate::error::SurfaceError;
use crate::scale::{PlotArea, Point};

/// Segments per cubic bezier when flattening.
const BEZIER_STEPS: usize = 12;
/// Segments for a full circle; partial arcs use a proportional share.
const CIRCLE_STEPS: usize = 48;

/// RGBA color; alpha in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// 2x3 affine transform (`x' = a·x + c·y + e`, `y' = b·x + d·y + f`).
#[derive(Clone, Copy, Debug, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, tx: f64, ty: f64) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    fn rotate(&mut self, radians: f64) {
        let (sin, cos) = radians.sin_cos();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct State {
    transform: Affine,
    fill: Rgba,
    stroke: Rgba,
    line_width: f64,
    clip: Option<PlotArea>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            fill: Rgba::BLACK,
            stroke: Rgba::BLACK,
            line_width: 1.0,
            clip: None,
        }
    }
}

/// One flattened subpath in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct Subpath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// A resolved drawing operation, ready for a backend.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Fill {
        subpaths: Vec<Subpath>,
        color: Rgba,
        clip: Option<PlotArea>,
    },
    Stroke {
        subpaths: Vec<Subpath>,
        color: Rgba,
        width: f64,
        clip: Option<PlotArea>,
    },
    Text {
        text: String,
        at: Point,
        color: Rgba,
        font_px: u32,
        clip: Option<PlotArea>,
    },
}

impl Shape {
    /// Every device-space point the shape touches (text contributes its anchor).
    pub fn points(&self) -> Vec<Point> {
        match self {
            Shape::Fill { subpaths, .. } | Shape::Stroke { subpaths, .. } => subpaths
                .iter()
                .flat_map(|s| s.points.iter().copied())
                .collect(),
            Shape::Text { at, .. } => vec![*at],
        }
    }
}

/// Transform/style/clip stack plus the current path.
#[derive(Clone, Debug, Default)]
pub struct CanvasCore {
    state: State,
    stack: Vec<State>,
    subpaths: Vec<Subpath>,
    /// Current point in user space, needed to continue beziers.
    cursor: Option<Point>,
}

impl CanvasCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unmatched `save` calls.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn save(&mut self) {
        self.stack.push(self.state);
    }

    /// Extra restores are ignored, like a canvas context does.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform.translate(dx, dy);
    }

    pub fn rotate(&mut self, radians: f64) {
        self.state.transform.rotate(radians);
    }

    /// Intersect the clip with `rect` (given in user space; rotated rectangles
    /// clip to their device-space bounding box).
    pub fn clip_rect(&mut self, rect: PlotArea) {
        let corners = [
            Point::new(rect.left, rect.top),
            Point::new(rect.right, rect.top),
            Point::new(rect.right, rect.bottom),
            Point::new(rect.left, rect.bottom),
        ]
        .map(|p| self.state.transform.apply(p));
        let mut dev = PlotArea::new(
            corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min),
            corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min),
            corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max),
            corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max),
        );
        if let Some(cur) = self.state.clip {
            dev = PlotArea::new(
                dev.left.max(cur.left),
                dev.top.max(cur.top),
                dev.right.min(cur.right),
                dev.bottom.min(cur.bottom),
            );
        }
        self.state.clip = Some(dev);
    }

    pub fn clip(&self) -> Option<PlotArea> {
        self.state.clip
    }

    pub fn set_fill(&mut self, color: Rgba) {
        self.state.fill = color;
    }

    pub fn set_stroke(&mut self, color: Rgba, width: f64) {
        self.state.stroke = color;
        self.state.line_width = width;
    }

    pub fn begin_path(&mut self) {
        self.subpaths.clear();
        self.cursor = None;
    }

    pub fn move_to(&mut self, p: Point) {
        let dev = self.state.transform.apply(p);
        self.subpaths.push(Subpath {
            points: vec![dev],
            closed: false,
        });
        self.cursor = Some(p);
    }

    pub fn line_to(&mut self, p: Point) {
        if self.cursor.is_none() || self.open_subpath().is_none() {
            self.move_to(p);
            return;
        }
        let dev = self.state.transform.apply(p);
        if let Some(sub) = self.open_subpath() {
            sub.points.push(dev);
        }
        self.cursor = Some(p);
    }

    pub fn bezier_to(&mut self, c1: Point, c2: Point, to: Point) {
        let Some(from) = self.cursor else {
            self.move_to(to);
            return;
        };
        for i in 1..=BEZIER_STEPS {
            let t = i as f64 / BEZIER_STEPS as f64;
            let u = 1.0 - t;
            let x = u * u * u * from.x + 3.0 * u * u * t * c1.x + 3.0 * u * t * t * c2.x + t * t * t * to.x;
            let y = u * u * u * from.y + 3.0 * u * u * t * c1.y + 3.0 * u * t * t * c2.y + t * t * t * to.y;
            self.line_to(Point::new(x, y));
        }
    }

    /// Clockwise (screen space) arc from `start` to `end` radians.
    pub fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        let sweep = (end - start).clamp(-TAU, TAU);
        let steps = ((sweep.abs() / TAU) * CIRCLE_STEPS as f64).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let a = start + sweep * i as f64 / steps as f64;
            // Continues the open subpath, like a canvas arc does.
            self.line_to(Point::new(center.x + radius * a.cos(), center.y + radius * a.sin()));
        }
    }

    /// Segments after a close start a fresh subpath.
    pub fn close_path(&mut self) {
        if let Some(sub) = self.subpaths.last_mut().filter(|s| !s.closed) {
            sub.closed = true;
            self.cursor = None;
        }
    }

    fn open_subpath(&mut self) -> Option<&mut Subpath> {
        self.subpaths.last_mut().filter(|s| !s.closed)
    }

    fn path(&self) -> Vec<Subpath> {
        self.subpaths
            .iter()
            .filter(|s| s.points.len() > 1)
            .cloned()
            .collect()
    }

    /// The current path as a fill, or `None` when there is nothing to paint.
    pub fn fill_shape(&self) -> Option<Shape> {
        let subpaths = self.path();
        (!subpaths.is_empty()).then(|| Shape::Fill {
            subpaths,
            color: self.state.fill,
            clip: self.state.clip,
        })
    }

    pub fn stroke_shape(&self) -> Option<Shape> {
        let subpaths = self.path();
        (!subpaths.is_empty()).then(|| Shape::Stroke {
            subpaths,
            color: self.state.stroke,
            width: self.state.line_width,
            clip: self.state.clip,
        })
    }

    pub fn text_shape(&self, text: &str, at: Point, font_px: u32) -> Shape {
        Shape::Text {
            text: text.to_string(),
            at: self.state.transform.apply(at),
            color: self.state.fill,
            font_px,
            clip: self.state.clip,
        }
    }
}

/// Canvas-style drawing context the glyph renderers paint on.
pub trait DrawingSurface {
    fn core(&mut self) -> &mut CanvasCore;

    /// Paint one resolved shape.
    fn emit(&mut self, shape: Shape) -> Result<(), SurfaceError>;

    fn save(&mut self) {
        self.core().save();
    }

    fn restore(&mut self) {
        self.core().restore();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.core().translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.core().rotate(radians);
    }

    fn clip_rect(&mut self, rect: PlotArea) {
        self.core().clip_rect(rect);
    }

    fn set_fill(&mut self, color: Rgba) {
        self.core().set_fill(color);
    }

    fn set_stroke(&mut self, color: Rgba, width: f64) {
        self.core().set_stroke(color, width);
    }

    fn begin_path(&mut self) {
        self.core().begin_path();
    }

    fn move_to(&mut self, p: Point) {
        self.core().move_to(p);
    }

    fn line_to(&mut self, p: Point) {
        self.core().line_to(p);
    }

    fn bezier_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.core().bezier_to(c1, c2, to);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        self.core().arc(center, radius, start, end);
    }

    fn close_path(&mut self) {
        self.core().close_path();
    }

    fn fill(&mut self) -> Result<(), SurfaceError> {
        match self.core().fill_shape() {
            Some(shape) => self.emit(shape),
            None => Ok(()),
        }
    }

    fn stroke(&mut self) -> Result<(), SurfaceError> {
        match self.core().stroke_shape() {
            Some(shape) => self.emit(shape),
            None => Ok(()),
        }
    }

    /// Centered text at `at` in the current fill color.
    fn fill_text(&mut self, text: &str, at: Point, font_px: u32) -> Result<(), SurfaceError> {
        let shape = self.core().text_shape(text, at, font_px);
        self.emit(shape)
    }
}

/// Saves the surface state on creation and restores it on drop, so the
/// bracket holds on early returns and unwinding alike.
pub struct SavedState<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: DrawingSurface + ?Sized> SavedState<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.save();
        Self { surface }
    }
}

impl<S: DrawingSurface + ?Sized> Deref for SavedState<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for SavedState<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> Drop for SavedState<'_, S> {
    fn drop(&mut self) {
        self.surface.restore();
    }
}

/// Surface that keeps every emitted shape. Used for headless inspection and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    core: CanvasCore,
    shapes: Vec<Shape>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn fills(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| matches!(s, Shape::Fill { .. }))
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes
            .iter()
            .filter(|s| matches!(s, Shape::Stroke { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| matches!(s, Shape::Text { .. }))
    }

    pub fn depth(&self) -> usize {
        self.core.depth()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl DrawingSurface for RecordingSurface {
    fn core(&mut self) -> &mut CanvasCore {
        &mut self.core
    }

    fn emit(&mut self, shape: Shape) -> Result<(), SurfaceError> {
        self.shapes.push(shape);
        Ok(())
    }
}

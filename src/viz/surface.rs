//! [`DrawingSurface`] on top of a plotters drawing area.
//!
//! Shapes arrive flattened and in panel pixel space; this adapter clips them
//! against the active clip rectangle (Sutherland–Hodgman for fills,
//! Liang–Barsky for strokes) and hands the result to plotters elements.

use plotters::coord::Shift;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::error::SurfaceError;
use crate::glyph::{CanvasCore, DrawingSurface, Rgba, Shape, Subpath};
use crate::scale::{PlotArea, Point};

use super::util::to_plotters_color;

pub struct PlottersSurface<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    core: CanvasCore,
    emitted: usize,
}

impl<'a, DB: DrawingBackend> PlottersSurface<'a, DB> {
    pub fn new(area: &'a DrawingArea<DB, Shift>) -> Self {
        Self {
            area,
            core: CanvasCore::new(),
            emitted: 0,
        }
    }

    /// Elements actually handed to plotters (after clipping removed the rest).
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    fn draw<E>(&mut self, element: E) -> Result<(), SurfaceError>
    where
        for<'b> &'b E: PointCollection<'b, (i32, i32)>,
        E: Drawable<DB>,
    {
        self.area
            .draw(&element)
            .map_err(|e| SurfaceError(format!("{e:?}")))?;
        self.emitted += 1;
        Ok(())
    }
}

fn pixel(p: Point) -> (i32, i32) {
    (p.x.round() as i32, p.y.round() as i32)
}

fn pixels(points: &[Point]) -> Vec<(i32, i32)> {
    points.iter().copied().map(pixel).collect()
}

impl<DB: DrawingBackend> DrawingSurface for PlottersSurface<'_, DB> {
    fn core(&mut self) -> &mut CanvasCore {
        &mut self.core
    }

    fn emit(&mut self, shape: Shape) -> Result<(), SurfaceError> {
        match shape {
            Shape::Fill { subpaths, color, clip } => {
                let style = to_plotters_color(color).filled();
                for sub in subpaths {
                    let poly = match clip {
                        Some(rect) => clip_polygon(&sub.points, &rect),
                        None => sub.points,
                    };
                    if poly.len() >= 3 {
                        self.draw(Polygon::new(pixels(&poly), style))?;
                    }
                }
            }
            Shape::Stroke {
                subpaths,
                color,
                width,
                clip,
            } => {
                let style = to_plotters_color(color).stroke_width(width.round().max(1.0) as u32);
                for sub in subpaths {
                    let line = closed_outline(sub);
                    let runs = match clip {
                        Some(rect) => clip_polyline(&line, &rect),
                        None => vec![line],
                    };
                    for run in runs.into_iter().filter(|r| r.len() >= 2) {
                        self.draw(PathElement::new(pixels(&run), style))?;
                    }
                }
            }
            Shape::Text {
                text,
                at,
                color,
                font_px,
                clip,
            } => {
                if clip.is_some_and(|rect| !rect.contains(at)) || text.is_empty() {
                    return Ok(());
                }
                let style = text_style(color, font_px);
                self.draw(Text::new(text, pixel(at), style))?;
            }
        }
        Ok(())
    }
}

fn text_style(color: Rgba, font_px: u32) -> TextStyle<'static> {
    FontDesc::new(FontFamily::SansSerif, font_px as f64, FontStyle::Normal)
        .color(&to_plotters_color(color))
        .pos(Pos::new(HPos::Center, VPos::Center))
}

fn closed_outline(sub: Subpath) -> Vec<Point> {
    let mut points = sub.points;
    if sub.closed && let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn inside(self, p: Point, r: &PlotArea) -> bool {
        match self {
            Edge::Left => p.x >= r.left,
            Edge::Right => p.x <= r.right,
            Edge::Top => p.y >= r.top,
            Edge::Bottom => p.y <= r.bottom,
        }
    }

    fn intersect(self, a: Point, b: Point, r: &PlotArea) -> Point {
        let lerp_x = |y: f64| a.x + (b.x - a.x) * (y - a.y) / (b.y - a.y);
        let lerp_y = |x: f64| a.y + (b.y - a.y) * (x - a.x) / (b.x - a.x);
        match self {
            Edge::Left => Point::new(r.left, lerp_y(r.left)),
            Edge::Right => Point::new(r.right, lerp_y(r.right)),
            Edge::Top => Point::new(lerp_x(r.top), r.top),
            Edge::Bottom => Point::new(lerp_x(r.bottom), r.bottom),
        }
    }
}

/// Sutherland–Hodgman clip of a (implicitly closed) polygon against `rect`.
pub fn clip_polygon(points: &[Point], rect: &PlotArea) -> Vec<Point> {
    let mut out: Vec<Point> = points.to_vec();
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        let input = std::mem::take(&mut out);
        let Some(&last) = input.last() else {
            break;
        };
        let mut prev = last;
        for &cur in &input {
            match (edge.inside(cur, rect), edge.inside(prev, rect)) {
                (true, true) => out.push(cur),
                (true, false) => {
                    out.push(edge.intersect(prev, cur, rect));
                    out.push(cur);
                }
                (false, true) => out.push(edge.intersect(prev, cur, rect)),
                (false, false) => {}
            }
            prev = cur;
        }
    }
    out
}

/// Liang–Barsky clip of one segment; `None` when it lies fully outside.
fn clip_segment(a: Point, b: Point, r: &PlotArea) -> Option<(Point, Point)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for (p, q) in [
        (-dx, a.x - r.left),
        (dx, r.right - a.x),
        (-dy, a.y - r.top),
        (dy, r.bottom - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        Point::new(a.x + t0 * dx, a.y + t0 * dy),
        Point::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

/// Clip a polyline to `rect`, splitting it into the runs that remain visible.
pub fn clip_polyline(points: &[Point], rect: &PlotArea) -> Vec<Vec<Point>> {
    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((a, b)) => {
                if current.last() != Some(&a) {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(a);
                }
                current.push(b);
            }
            None => {
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        runs.push(current);
    }
    runs
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing commands.
//!
//! Graphics nodes describe their shape as a list of [`DrawCommand`]s that
//! backends interpret. Commands are plain data, so the engine can compare
//! them for change detection and compute bounds without calling back into
//! user code.

use alloc::vec::Vec;

use kurbo::{Arc, BezPath, Circle, Point, Rect, Shape, Vec2};

use crate::settings::Color;

/// Tolerance used when flattening arcs into cubic segments.
const ARC_TOLERANCE: f64 = 0.1;

/// A single drawing instruction, in the node's local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    /// Starts a new subpath.
    MoveTo(Point),
    /// Straight line from the current point.
    LineTo(Point),
    /// Quadratic Bézier with one control point.
    QuadTo(Point, Point),
    /// Cubic Bézier with two control points.
    CurveTo(Point, Point, Point),
    /// Elliptical arc around `center`, angles in radians.
    Arc {
        /// Center of the ellipse.
        center: Point,
        /// Horizontal and vertical radii.
        radii: Vec2,
        /// Start angle.
        start_angle: f64,
        /// Sweep angle (negative sweeps counter-clockwise).
        sweep_angle: f64,
    },
    /// Axis-aligned rectangle as its own closed subpath.
    Rect(Rect),
    /// Circle as its own closed subpath.
    Circle(Point, f64),
    /// Closes the current subpath.
    Close,
}

/// An ordered list of drawing commands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Drawing(pub Vec<DrawCommand>);

impl Drawing {
    /// Creates an empty drawing.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a command.
    #[must_use]
    pub fn with(mut self, command: DrawCommand) -> Self {
        self.0.push(command);
        self
    }

    /// Returns the commands.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.0
    }

    /// Builds a rectangle drawing.
    #[must_use]
    pub fn rect(rect: Rect) -> Self {
        Self(alloc::vec![DrawCommand::Rect(rect)])
    }

    /// Converts the commands into a [`BezPath`].
    #[must_use]
    pub fn to_path(&self) -> BezPath {
        to_path(&self.0)
    }

    /// Returns the tight bounding box of the commands, or zero when empty.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        bounds(&self.0)
    }
}

impl From<Vec<DrawCommand>> for Drawing {
    fn from(commands: Vec<DrawCommand>) -> Self {
        Self(commands)
    }
}

/// Converts drawing commands into a [`BezPath`].
#[must_use]
pub fn to_path(commands: &[DrawCommand]) -> BezPath {
    let mut path = BezPath::new();
    for command in commands {
        match *command {
            DrawCommand::MoveTo(p) => path.move_to(p),
            DrawCommand::LineTo(p) => line_or_move(&mut path, p),
            DrawCommand::QuadTo(c, p) => {
                ensure_started(&mut path, c);
                path.quad_to(c, p);
            }
            DrawCommand::CurveTo(c1, c2, p) => {
                ensure_started(&mut path, c1);
                path.curve_to(c1, c2, p);
            }
            DrawCommand::Arc {
                center,
                radii,
                start_angle,
                sweep_angle,
            } => {
                let arc = Arc::new(center, radii, start_angle, sweep_angle, 0.0);
                let start = arc
                    .path_elements(ARC_TOLERANCE)
                    .next()
                    .and_then(|el| el.end_point())
                    .unwrap_or(center);
                line_or_move(&mut path, start);
                arc.to_cubic_beziers(ARC_TOLERANCE, |c1, c2, p| path.curve_to(c1, c2, p));
            }
            DrawCommand::Rect(rect) => path.extend(rect.path_elements(ARC_TOLERANCE)),
            DrawCommand::Circle(center, radius) => {
                path.extend(Circle::new(center, radius).path_elements(ARC_TOLERANCE));
            }
            DrawCommand::Close => path.close_path(),
        }
    }
    path
}

/// Returns the tight bounding box of drawing commands, or zero when empty.
#[must_use]
pub fn bounds(commands: &[DrawCommand]) -> Rect {
    let path = to_path(commands);
    if path.elements().is_empty() {
        return Rect::ZERO;
    }
    path.bounding_box()
}

fn line_or_move(path: &mut BezPath, p: Point) {
    if path.elements().is_empty() {
        path.move_to(p);
    } else {
        path.line_to(p);
    }
}

fn ensure_started(path: &mut BezPath, p: Point) {
    if path.elements().is_empty() {
        path.move_to(p);
    }
}

/// Fill and stroke applied to a node's drawing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Paint {
    /// Fill color, if filled.
    pub fill: Option<Color>,
    /// Stroke color, if stroked.
    pub stroke: Option<Color>,
    /// Stroke width in pixels.
    pub stroke_width: f64,
}

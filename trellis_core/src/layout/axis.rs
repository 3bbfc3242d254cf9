// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-generic access to the per-axis settings and geometry.

use kurbo::{Point, Rect, Size};

use crate::settings::{Key, Length, keys};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl Axis {
    pub(crate) const BOTH: [Self; 2] = [Self::X, Self::Y];

    pub(crate) const fn position_key(self) -> Key<Length> {
        match self {
            Self::X => keys::X,
            Self::Y => keys::Y,
        }
    }

    pub(crate) const fn offset_key(self) -> Key<f64> {
        match self {
            Self::X => keys::DX,
            Self::Y => keys::DY,
        }
    }

    pub(crate) const fn center_key(self) -> Key<Length> {
        match self {
            Self::X => keys::CENTER_X,
            Self::Y => keys::CENTER_Y,
        }
    }

    pub(crate) const fn size_key(self) -> Key<Length> {
        match self {
            Self::X => keys::WIDTH,
            Self::Y => keys::HEIGHT,
        }
    }

    pub(crate) const fn min_key(self) -> Key<f64> {
        match self {
            Self::X => keys::MIN_WIDTH,
            Self::Y => keys::MIN_HEIGHT,
        }
    }

    pub(crate) const fn max_key(self) -> Key<f64> {
        match self {
            Self::X => keys::MAX_WIDTH,
            Self::Y => keys::MAX_HEIGHT,
        }
    }

    pub(crate) const fn padding_keys(self) -> (Key<f64>, Key<f64>) {
        match self {
            Self::X => (keys::PADDING_LEFT, keys::PADDING_RIGHT),
            Self::Y => (keys::PADDING_TOP, keys::PADDING_BOTTOM),
        }
    }

    pub(crate) const fn margin_keys(self) -> (Key<f64>, Key<f64>) {
        match self {
            Self::X => (keys::MARGIN_LEFT, keys::MARGIN_RIGHT),
            Self::Y => (keys::MARGIN_TOP, keys::MARGIN_BOTTOM),
        }
    }

    pub(crate) const fn private_position_key(self) -> Key<f64> {
        match self {
            Self::X => keys::private::X,
            Self::Y => keys::private::Y,
        }
    }

    pub(crate) const fn private_size_key(self) -> Key<f64> {
        match self {
            Self::X => keys::private::WIDTH,
            Self::Y => keys::private::HEIGHT,
        }
    }

    pub(crate) const fn private_max_key(self) -> Key<f64> {
        match self {
            Self::X => keys::private::MAX_WIDTH,
            Self::Y => keys::private::MAX_HEIGHT,
        }
    }

    pub(crate) const fn start(self, r: Rect) -> f64 {
        match self {
            Self::X => r.x0,
            Self::Y => r.y0,
        }
    }

    pub(crate) const fn end(self, r: Rect) -> f64 {
        match self {
            Self::X => r.x1,
            Self::Y => r.y1,
        }
    }

    pub(crate) fn extent(self, r: Rect) -> f64 {
        self.end(r) - self.start(r)
    }

    /// Replaces the span of `r` along this axis.
    pub(crate) fn with_span(self, r: Rect, start: f64, end: f64) -> Rect {
        match self {
            Self::X => Rect::new(start, r.y0, end, r.y1),
            Self::Y => Rect::new(r.x0, start, r.x1, end),
        }
    }

    pub(crate) const fn of_size(self, s: Size) -> f64 {
        match self {
            Self::X => s.width,
            Self::Y => s.height,
        }
    }

    pub(crate) const fn of_point(self, p: Point) -> f64 {
        match self {
            Self::X => p.x,
            Self::Y => p.y,
        }
    }
}

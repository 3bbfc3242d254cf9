// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child arrangement strategies.
//!
//! A container with a [`LAYOUT`](crate::settings::keys::LAYOUT) setting runs
//! its layout during the bounds phase of every flush in which its bounds are
//! dirty. Layouts only see *participating* children (visible and relatively
//! positioned) and write their results as private `x`, `y`, `width` and
//! `height` settings, which take precedence over the children's public ones.
//!
//! - [`Layout::Horizontal`] and [`Layout::Vertical`] stack children along one
//!   axis and share the remaining space among percent-sized children.
//! - [`Layout::Grid`] flows children into as many columns as fit.

mod axis;
mod grid;
mod linear;

use alloc::vec::Vec;

pub(crate) use axis::Axis;
pub use grid::FIT_EPSILON;

use crate::backend::Backend;
use crate::node::Attachment;
use crate::scene::Scene;

/// How a container arranges its children.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Layout {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    Vertical,
    /// Rows of columns.
    Grid(GridLayout),
}

impl Layout {
    /// A grid with default settings.
    #[must_use]
    pub const fn grid() -> Self {
        Self::Grid(GridLayout::new())
    }

    /// Returns the strategy without its parameters.
    #[must_use]
    pub const fn kind(&self) -> LayoutKind {
        match self {
            Self::Horizontal => LayoutKind::Horizontal,
            Self::Vertical => LayoutKind::Vertical,
            Self::Grid(_) => LayoutKind::Grid,
        }
    }

    /// The axis along which margins widen a child's footprint in the
    /// container's bounds, if any.
    pub(crate) const fn axis(&self) -> Option<Axis> {
        match self {
            Self::Horizontal => Some(Axis::X),
            Self::Vertical => Some(Axis::Y),
            Self::Grid(_) => None,
        }
    }

    /// Arranges the participating children of `container` and returns how
    /// many there were.
    pub(crate) fn arrange<B: Backend>(&self, scene: &mut Scene<B>, container: u32) -> u32 {
        let children = participating(scene, container);
        if children.is_empty() {
            return 0;
        }
        match self {
            Self::Horizontal => linear::arrange(scene, container, &children, Axis::X),
            Self::Vertical => linear::arrange(scene, container, &children, Axis::Y),
            Self::Grid(grid) => grid::arrange(scene, container, &children, *grid),
        }
        crate::trace::count(children.len())
    }
}

/// Layout strategy tag, used in trace events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// [`Layout::Horizontal`].
    Horizontal,
    /// [`Layout::Vertical`].
    Vertical,
    /// [`Layout::Grid`].
    Grid,
}

/// Parameters of [`Layout::Grid`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridLayout {
    /// Upper bound on the number of columns.
    pub max_columns: usize,
    /// Makes every column as wide as the widest child.
    pub fixed_width_grid: bool,
}

impl GridLayout {
    /// Unbounded columns sized to their widest cell.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_columns: usize::MAX,
            fixed_width_grid: false,
        }
    }

    /// Limits the number of columns.
    #[must_use]
    pub const fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    /// Sets [`fixed_width_grid`](Self::fixed_width_grid).
    #[must_use]
    pub const fn with_fixed_width(mut self, fixed: bool) -> Self {
        self.fixed_width_grid = fixed;
        self
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Children that take part in layout: attached as children, visible, and
/// not absolutely positioned.
fn participating<B: Backend>(scene: &Scene<B>, container: u32) -> Vec<u32> {
    scene.children[container as usize]
        .iter()
        .copied()
        .filter(|&c| {
            scene.attachment[c as usize] == Attachment::Child
                && scene.visible_idx(c)
                && scene.is_relative(c)
        })
        .collect()
}

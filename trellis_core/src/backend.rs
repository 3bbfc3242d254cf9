// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract.
//!
//! The scene never draws anything itself. Every node owns one *display*
//! created through a [`Backend`], and the scene mirrors its own tree into the
//! backend's display tree:
//!
//! - **Structure**: children are inserted into the parent container's
//!   children group at the same index they have in its children list. A
//!   container's background sits directly in the container's display, below
//!   the children group. Masks are attached with [`Backend::set_mask`].
//!
//! - **Properties**: transforms, alpha, visibility and interactivity are
//!   pushed during [`Scene::flush`](crate::Scene::flush) whenever they change.
//!
//! - **Content**: paths arrive as [`DrawCommand`] lists and labels as text,
//!   with fill and stroke as a separate [`Paint`] so recoloring never
//!   re-uploads geometry.
//!
//! - **Measurement**: the scene asks the backend for the local bounds of a
//!   display's content, then lets it widen them (e.g. for stroke) via
//!   [`Backend::adjust_bounds`].
//!
//! [`HeadlessBackend`](crate::HeadlessBackend) implements the whole contract
//! in memory.

use core::fmt;

use kurbo::{Affine, Point, Rect};

use crate::draw::{DrawCommand, Paint};

/// An opaque handle to a backend display object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayId(pub u32);

impl fmt::Debug for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayId({})", self.0)
    }
}

/// What kind of display object to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayKind {
    /// Holds other displays.
    Group,
    /// Draws a path.
    Path,
    /// Draws text.
    Text,
}

/// Retained display tree implemented by a rendering backend.
pub trait Backend {
    /// Creates a display object.
    fn create(&mut self, kind: DisplayKind) -> DisplayId;

    /// Releases a display object. Called exactly once per display.
    fn dispose(&mut self, display: DisplayId);

    /// Inserts `child` into `parent` at `index` (clamped to the child count).
    fn insert_child(&mut self, parent: DisplayId, child: DisplayId, index: usize);

    /// Removes `child` from `parent`, if present.
    fn remove_child(&mut self, parent: DisplayId, child: DisplayId);

    /// Sets the display's transform relative to its parent display.
    fn set_transform(&mut self, display: DisplayId, transform: Affine);

    /// Sets the display's alpha multiplier.
    fn set_alpha(&mut self, display: DisplayId, alpha: f64);

    /// Shows or hides the display.
    fn set_visible(&mut self, display: DisplayId, visible: bool);

    /// Clips `display` to the shape of `mask`, or removes the clip.
    fn set_mask(&mut self, display: DisplayId, mask: Option<DisplayId>);

    /// Uploads path geometry.
    fn set_path(&mut self, display: DisplayId, commands: &[DrawCommand]);

    /// Uploads label text.
    fn set_text(&mut self, display: DisplayId, text: &str, font_size: f64);

    /// Sets fill and stroke.
    fn set_paint(&mut self, display: DisplayId, paint: &Paint);

    /// Returns the local bounds of the display's own content.
    ///
    /// Groups report zero; the scene computes container bounds itself.
    fn measure(&self, display: DisplayId) -> Rect;

    /// Widens measured bounds for effects the geometry does not include.
    ///
    /// `paint` is the node's current paint, which may not have been uploaded
    /// yet when bounds are computed.
    fn adjust_bounds(&self, display: DisplayId, bounds: Rect, paint: &Paint) -> Rect {
        _ = (display, paint);
        bounds
    }

    /// Marks whether the display can receive pointer input.
    fn set_interactive(&mut self, display: DisplayId, interactive: bool) {
        _ = (display, interactive);
    }

    /// Precise hit test in display-local coordinates.
    ///
    /// `None` means the backend has no opinion and the scene falls back to
    /// the node's bounds.
    fn hit_test(&self, display: DisplayId, point: Point) -> Option<bool> {
        _ = (display, point);
        None
    }
}

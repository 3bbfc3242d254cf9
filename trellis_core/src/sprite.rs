// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node geometry: size resolution, measurement, positioning, and
//! visibility.
//!
//! # Size
//!
//! A node's size along an axis is, in order of precedence:
//!
//! 1. its private size (written by a parent's layout),
//! 2. its public pixel size,
//! 3. its public percent size, of the parent's inner size (the viewport at
//!    the top of a tree),
//! 4. its measured local bounds.
//!
//! The result is clamped to the node's min and max; on conflict the max
//! wins. A private max (set by parents) takes precedence over the public one.
//!
//! # Position
//!
//! A node's private position wins over its public one. Public percent
//! positions resolve against the parent's inner size and are offset by the
//! parent's leading padding; unset positions of relatively positioned
//! children default to that padding. `dx`/`dy` are added last.
//!
//! The local transform applies the node's scale and rotation around its
//! pivot (`center_x`/`center_y`), then translates to its position.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::backend::Backend;
use crate::draw::{Drawing, Paint};
use crate::layout::Axis;
use crate::node::{Attachment, INVALID, NodeId, NodeKind};
use crate::scene::Scene;
use crate::settings::{Color, Key, KeyId, Length, Position, Value, keys};

/// Font size used by labels that do not set one.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Stroke width used when a stroke color is set without a width.
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

impl<B: Backend> Scene<B> {
    // -- Public geometry --

    /// Returns whether a node is shown: `visible` (public and private) and
    /// not `force_hidden`.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.visible_idx(id.idx)
    }

    /// Returns the resolved, clamped width.
    #[must_use]
    pub fn width(&self, id: NodeId) -> f64 {
        self.axis_of(id, Axis::X, Self::size_idx)
    }

    /// Returns the resolved, clamped height.
    #[must_use]
    pub fn height(&self, id: NodeId) -> f64 {
        self.axis_of(id, Axis::Y, Self::size_idx)
    }

    /// Returns the width minus horizontal padding, never negative.
    #[must_use]
    pub fn inner_width(&self, id: NodeId) -> f64 {
        self.axis_of(id, Axis::X, Self::inner_size)
    }

    /// Returns the height minus vertical padding, never negative.
    #[must_use]
    pub fn inner_height(&self, id: NodeId) -> f64 {
        self.axis_of(id, Axis::Y, Self::inner_size)
    }

    /// Returns whether a node receives pointer input.
    ///
    /// A node is interactive when `interactive` or `draggable` is set, when
    /// it has a tooltip, or when it has pointer listeners.
    #[must_use]
    pub fn is_interactive(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.interactive_idx(id.idx)
    }

    /// Returns the fill and stroke the node is drawn with.
    #[must_use]
    pub fn paint(&self, id: NodeId) -> Paint {
        if self.is_alive(id) {
            self.paint_of(id.idx)
        } else {
            Paint::default()
        }
    }

    /// Returns whether the node and every node it is attached to are shown.
    #[must_use]
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let mut i = id.idx;
        while i != INVALID {
            if !self.visible_idx(i) {
                return false;
            }
            i = self.parent[i as usize];
        }
        true
    }

    fn axis_of(&self, id: NodeId, axis: Axis, f: impl Fn(&Self, u32, Axis) -> f64) -> f64 {
        if self.is_alive(id) {
            f(self, id.idx, axis)
        } else {
            0.0
        }
    }

    // -- Flags --

    pub(crate) fn visible_idx(&self, idx: u32) -> bool {
        self.public_or(idx, keys::VISIBLE, true)
            && self.private_of(idx, keys::private::VISIBLE).unwrap_or(true)
            && !self.public_or(idx, keys::FORCE_HIDDEN, false)
    }

    pub(crate) fn is_relative(&self, idx: u32) -> bool {
        self.public_or(idx, keys::POSITION, Position::Relative) == Position::Relative
    }

    pub(crate) fn interactive_idx(&self, idx: u32) -> bool {
        self.public_or(idx, keys::INTERACTIVE, false)
            || self.public_or(idx, keys::DRAGGABLE, false)
            || self.tooltip_of(idx).is_some()
            || self.listeners[idx as usize]
                .iter()
                .any(|l| l.kind.is_pointer())
    }

    pub(crate) fn tooltip_of(&self, idx: u32) -> Option<u32> {
        self.live_idx(self.settings[idx as usize].get(keys::TOOLTIP).copied())
    }

    /// Pushes the effective visibility to the backend if it changed.
    pub(crate) fn sync_visibility(&mut self, idx: u32) {
        let i = idx as usize;
        let visible = self.visible_idx(idx);
        if self.shown[i] != visible {
            self.shown[i] = visible;
            self.backend.set_visible(self.display[i], visible);
            self.pending_visibility.push(idx);
        }
    }

    // -- Size resolution --

    /// Size along `axis` that does not depend on measurement, if any.
    pub(crate) fn definite_size(&self, idx: u32, axis: Axis) -> Option<f64> {
        if let Some(px) = self.private_of(idx, axis.private_size_key()) {
            return Some(px);
        }
        match *self.settings[idx as usize].get(axis.size_key())? {
            Length::Px(px) => Some(px),
            Length::Percent(p) => Some(p.of(self.reference_size(idx, axis))),
        }
    }

    /// What percent sizes and positions of this node resolve against.
    pub(crate) fn reference_size(&self, idx: u32, axis: Axis) -> f64 {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return axis.of_size(self.viewport);
        }
        match self.attachment[idx as usize] {
            Attachment::Child => self.inner_size(p, axis),
            _ => self.size_idx(p, axis),
        }
    }

    pub(crate) fn size_idx(&self, idx: u32, axis: Axis) -> f64 {
        let raw = self
            .definite_size(idx, axis)
            .unwrap_or_else(|| axis.extent(self.local_bounds[idx as usize]));
        self.clamp_size(idx, axis, raw)
    }

    pub(crate) fn inner_size(&self, idx: u32, axis: Axis) -> f64 {
        let (lead, trail) = self.padding(idx, axis);
        (self.size_idx(idx, axis) - lead - trail).max(0.0)
    }

    pub(crate) fn min_size(&self, idx: u32, axis: Axis) -> Option<f64> {
        self.settings[idx as usize].get(axis.min_key()).copied()
    }

    pub(crate) fn max_size(&self, idx: u32, axis: Axis) -> Option<f64> {
        self.private_of(idx, axis.private_max_key())
            .or_else(|| self.settings[idx as usize].get(axis.max_key()).copied())
    }

    /// The width a layout may fill: max size, else definite size, else what
    /// the parent offers.
    pub(crate) fn available_size(&self, idx: u32, axis: Axis) -> f64 {
        self.max_size(idx, axis)
            .or_else(|| self.definite_size(idx, axis))
            .unwrap_or_else(|| self.reference_size(idx, axis))
    }

    pub(crate) fn clamp_size(&self, idx: u32, axis: Axis, size: f64) -> f64 {
        let mut size = size;
        if let Some(min) = self.min_size(idx, axis) {
            size = size.max(min);
        }
        if let Some(max) = self.max_size(idx, axis) {
            size = size.min(max);
        }
        size
    }

    pub(crate) fn clamp_rect(&self, idx: u32, rect: Rect) -> Rect {
        let mut rect = rect;
        for axis in Axis::BOTH {
            let extent = axis.extent(rect);
            let clamped = self.clamp_size(idx, axis, extent);
            if clamped != extent {
                let start = axis.start(rect);
                rect = axis.with_span(rect, start, start + clamped);
            }
        }
        rect
    }

    pub(crate) fn padding(&self, idx: u32, axis: Axis) -> (f64, f64) {
        let (lead, trail) = axis.padding_keys();
        (self.public_or(idx, lead, 0.0), self.public_or(idx, trail, 0.0))
    }

    pub(crate) fn margins(&self, idx: u32, axis: Axis) -> (f64, f64) {
        let (lead, trail) = axis.margin_keys();
        (self.public_or(idx, lead, 0.0), self.public_or(idx, trail, 0.0))
    }

    // -- Measurement --

    /// Measures a non-container node, uploading the rectangle path first for
    /// rectangles.
    pub(crate) fn measure_leaf(&mut self, idx: u32) -> Rect {
        let display = self.display[idx as usize];
        if self.kind[idx as usize] == NodeKind::Rectangle {
            let w = self.definite_size(idx, Axis::X).unwrap_or(0.0);
            let h = self.definite_size(idx, Axis::Y).unwrap_or(0.0);
            let w = self.clamp_size(idx, Axis::X, w).max(0.0);
            let h = self.clamp_size(idx, Axis::Y, h).max(0.0);
            let path = Drawing::rect(Rect::new(0.0, 0.0, w, h));
            self.backend.set_path(display, path.commands());
        }
        let mut bounds = self.backend.measure(display);
        for axis in Axis::BOTH {
            if let Some(size) = self.definite_size(idx, axis) {
                let start = axis.start(bounds);
                bounds = axis.with_span(bounds, start, start + size);
            }
        }
        self.clamp_rect(idx, bounds)
    }

    /// Local bounds widened by the backend and mapped through the node's own
    /// rotation and scale.
    pub(crate) fn adjust(&self, idx: u32, local: Rect) -> Rect {
        let widened =
            self.backend
                .adjust_bounds(self.display[idx as usize], local, &self.paint_of(idx));
        self.own_transform(idx).transform_rect_bbox(widened)
    }

    // -- Content --

    pub(crate) fn paint_of(&self, idx: u32) -> Paint {
        let settings = &self.settings[idx as usize];
        let stroke: Option<Color> = settings.get(keys::STROKE).copied();
        Paint {
            fill: settings.get(keys::FILL).copied(),
            stroke,
            stroke_width: settings.get_or(keys::STROKE_WIDTH, DEFAULT_STROKE_WIDTH),
        }
    }

    /// Uploads a graphics path or label text.
    pub(crate) fn upload_content(&mut self, idx: u32) {
        let i = idx as usize;
        match self.kind[i] {
            NodeKind::Graphics => {
                let commands = self.settings[i]
                    .get(keys::DRAW)
                    .map_or(&[][..], Drawing::commands);
                self.backend.set_path(self.display[i], commands);
            }
            NodeKind::Label => {
                let text = self.settings[i].get(keys::TEXT).map_or("", |t| t.as_str());
                let size = self.settings[i].get_or(keys::FONT_SIZE, DEFAULT_FONT_SIZE);
                self.backend.set_text(self.display[i], text, size);
            }
            NodeKind::Container | NodeKind::Rectangle => {}
        }
    }

    // -- Position --

    pub(crate) fn resolve_position(&self, idx: u32) -> Point {
        Point::new(
            self.resolve_coord(idx, Axis::X),
            self.resolve_coord(idx, Axis::Y),
        )
    }

    fn resolve_coord(&self, idx: u32, axis: Axis) -> f64 {
        let offset = self.public_or(idx, axis.offset_key(), 0.0);
        if let Some(px) = self.private_of(idx, axis.private_position_key()) {
            return px + offset;
        }
        let p = self.parent[idx as usize];
        let child = p != INVALID && self.attachment[idx as usize] == Attachment::Child;
        let lead = if child { self.padding(p, axis).0 } else { 0.0 };
        let base = match self.settings[idx as usize].get(axis.position_key()) {
            Some(Length::Px(px)) => *px,
            Some(Length::Percent(pc)) => lead + pc.of(self.reference_size(idx, axis)),
            None if child && self.is_relative(idx) => lead,
            None => 0.0,
        };
        base + offset
    }

    /// Rotation and scale pivot, in local coordinates.
    pub(crate) fn pivot(&self, idx: u32) -> Vec2 {
        let bounds = self.local_bounds[idx as usize];
        let along = |axis: Axis| match self.settings[idx as usize].get(axis.center_key()) {
            Some(Length::Px(px)) => *px,
            Some(Length::Percent(pc)) => axis.start(bounds) + pc.of(axis.extent(bounds)),
            None => 0.0,
        };
        Vec2::new(along(Axis::X), along(Axis::Y))
    }

    /// Rotation and scale about the pivot, without translation to the
    /// node's position.
    pub(crate) fn own_transform(&self, idx: u32) -> Affine {
        let rotation = self.public_or(idx, keys::ROTATION, 0.0);
        let scale = self.public_or(idx, keys::SCALE, 1.0);
        let pivot = self.pivot(idx);
        Affine::translate(pivot)
            * Affine::rotate(rotation.to_radians())
            * Affine::scale(scale)
            * Affine::translate(-pivot)
    }

    pub(crate) fn set_private_px(&mut self, idx: u32, key: Key<f64>, value: f64) {
        self.write_private(idx, key.id(), Some(Value::Number(value)));
    }

    pub(crate) fn set_private_flag(&mut self, idx: u32, key: KeyId, value: bool) {
        self.write_private(idx, key, Some(Value::Flag(value)));
    }

    /// Drops the pixel values a parent or layout assigned to the node.
    pub(crate) fn release_assigned(&mut self, idx: u32) {
        for key in [
            KeyId::X,
            KeyId::Y,
            KeyId::Width,
            KeyId::Height,
            KeyId::MaxWidth,
            KeyId::MaxHeight,
        ] {
            self.write_private(idx, key, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use crate::draw::{DrawCommand, Drawing};
    use crate::settings::{Color, Length, Position, keys, percent};
    use crate::{HeadlessBackend, NodeKind, Scene};

    fn scene() -> Scene<HeadlessBackend> {
        let mut s = Scene::new(HeadlessBackend::new());
        s.set_viewport(Size::new(400.0, 300.0));
        s
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn rectangle_measures_its_size() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(40.0));
        s.set(r, keys::HEIGHT, Length::Px(20.0));
        s.flush();
        assert_eq!(s.local_bounds(r), kurbo::Rect::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(s.width(r), 40.0);
        let display = s.display(r).expect("live node has a display");
        let uploaded = &s.backend().display(display).expect("display").commands;
        assert!(!uploaded.is_empty());
    }

    #[test]
    fn min_and_max_clamp_measured_size() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(500.0));
        s.set(r, keys::MAX_WIDTH, 120.0);
        s.set(r, keys::HEIGHT, Length::Px(5.0));
        s.set(r, keys::MIN_HEIGHT, 30.0);
        s.flush();
        assert_eq!(s.width(r), 120.0);
        assert_eq!(s.height(r), 30.0);
        assert_eq!(s.local_bounds(r).size(), Size::new(120.0, 30.0));
    }

    #[test]
    fn percent_size_resolves_against_parent_inner_size() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::WIDTH, Length::Px(200.0));
        s.set(c, keys::HEIGHT, Length::Px(100.0));
        s.set(c, keys::PADDING_LEFT, 10.0);
        s.set(c, keys::PADDING_RIGHT, 10.0);
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Percent(percent(50.0)));
        s.set(r, keys::HEIGHT, Length::Px(10.0));
        s.children_mut(c).push(r);
        s.flush();
        assert_eq!(s.inner_width(c), 180.0);
        assert_eq!(s.width(r), 90.0);
    }

    #[test]
    fn detached_percent_uses_viewport() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Percent(percent(25.0)));
        s.flush();
        assert_eq!(s.width(r), 100.0);
    }

    #[test]
    fn stroke_widens_adjusted_bounds() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(10.0));
        s.set(r, keys::HEIGHT, Length::Px(10.0));
        s.set(r, keys::STROKE, Color::BLACK);
        s.set(r, keys::STROKE_WIDTH, 2.0);
        s.flush();
        assert_eq!(s.local_bounds(r), kurbo::Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            s.adjusted_local_bounds(r),
            kurbo::Rect::new(-1.0, -1.0, 11.0, 11.0)
        );
    }

    #[test]
    fn rotation_about_center() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(20.0));
        s.set(r, keys::HEIGHT, Length::Px(10.0));
        s.set(r, keys::CENTER_X, Length::Percent(percent(50.0)));
        s.set(r, keys::CENTER_Y, Length::Percent(percent(50.0)));
        s.set(r, keys::ROTATION, 90.0);
        s.flush();
        let b = s.adjusted_local_bounds(r);
        assert!(close(b.x0, 5.0) && close(b.x1, 15.0), "{b:?}");
        assert!(close(b.y0, -5.0) && close(b.y1, 15.0), "{b:?}");
    }

    #[test]
    fn graphics_bounds_follow_drawing() {
        let mut s = scene();
        let g = s.create(NodeKind::Graphics);
        let drawing = Drawing::new()
            .with(DrawCommand::MoveTo(kurbo::Point::new(5.0, 5.0)))
            .with(DrawCommand::LineTo(kurbo::Point::new(25.0, 45.0)));
        s.set(g, keys::DRAW, drawing);
        s.flush();
        assert_eq!(s.local_bounds(g), kurbo::Rect::new(5.0, 5.0, 25.0, 45.0));
    }

    #[test]
    fn label_measures_text() {
        let mut s = scene();
        let l = s.create(NodeKind::Label);
        s.set(l, keys::TEXT, alloc::string::String::from("Sales"));
        s.set(l, keys::FONT_SIZE, 10.0);
        s.flush();
        assert_eq!(s.local_bounds(l).size(), Size::new(30.0, 12.0));
    }

    #[test]
    fn position_defaults_to_parent_padding() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::PADDING_LEFT, 7.0);
        s.set(c, keys::PADDING_TOP, 3.0);
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::DX, 1.0);
        s.children_mut(c).push(r);
        let abs = s.create(NodeKind::Rectangle);
        s.set(abs, keys::POSITION, Position::Absolute);
        s.children_mut(c).push(abs);
        s.flush();
        assert_eq!(s.position(r), kurbo::Point::new(8.0, 3.0));
        assert_eq!(s.position(abs), kurbo::Point::ZERO);
    }

    #[test]
    fn percent_position_is_offset_by_padding() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::WIDTH, Length::Px(120.0));
        s.set(c, keys::HEIGHT, Length::Px(60.0));
        s.set(c, keys::PADDING_LEFT, 20.0);
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::X, Length::Percent(percent(50.0)));
        s.set(r, keys::Y, Length::Px(4.0));
        s.children_mut(c).push(r);
        s.flush();
        assert_eq!(s.position(r), kurbo::Point::new(70.0, 4.0));
    }

    #[test]
    fn hidden_nodes_have_empty_bounds() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(10.0));
        s.set(r, keys::HEIGHT, Length::Px(10.0));
        s.flush();
        s.set(r, keys::FORCE_HIDDEN, true);
        let changes = s.flush();
        assert!(!s.is_visible(r));
        assert_eq!(s.local_bounds(r), kurbo::Rect::ZERO);
        assert!(changes.hidden.contains(&r.index()));
        let display = s.display(r).expect("display");
        assert!(!s.backend().display(display).expect("display").visible);
    }

    #[test]
    fn interactive_flags() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        assert!(!s.is_interactive(r));
        s.set(r, keys::DRAGGABLE, true);
        assert!(s.is_interactive(r));
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer input: hit testing, hover, click, drag, and tooltips.
//!
//! [`Scene::dispatch_pointer`] turns raw pointer input in scene coordinates
//! into node events. Hit testing walks the tree front to back, skipping
//! invisible subtrees and children outside their container's clip, and picks
//! the topmost interactive node whose bounds (or backend hit test) contain
//! the point.
//!
//! - **Hover**: when the hit node changes, the old one receives
//!   [`PointerOut`](EventKind::PointerOut) and the new one
//!   [`PointerOver`](EventKind::PointerOver). Tooltips follow hover.
//! - **Click**: fires on up when down and up hit the same node and the
//!   pointer stayed within [`CLICK_DRAG_THRESHOLD`] of the down point.
//! - **Drag**: the nearest draggable ancestor-or-self of the down target
//!   starts dragging once the pointer leaves the threshold. Its `x`/`y` are
//!   rewritten in its parent's space on every move.

use kurbo::{Affine, Point, Vec2};

use crate::backend::Backend;
use crate::event::EventKind;
use crate::node::{INVALID, NodeId, NodeKind};
use crate::scene::Scene;
use crate::settings::{KeyId, Length, Value, keys};
use crate::trace::Tracer;

/// How far (in scene pixels) the pointer may travel before a press becomes
/// a drag and no longer counts as a click.
pub const CLICK_DRAG_THRESHOLD: f64 = 5.0;

/// What the pointer did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
}

/// One pointer sample in scene coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    /// What the pointer did.
    pub action: PointerAction,
    /// Where, in scene coordinates.
    pub point: Point,
}

impl PointerInput {
    /// A press at `point`.
    #[must_use]
    pub const fn down(point: Point) -> Self {
        Self {
            action: PointerAction::Down,
            point,
        }
    }

    /// A move to `point`.
    #[must_use]
    pub const fn moved(point: Point) -> Self {
        Self {
            action: PointerAction::Move,
            point,
        }
    }

    /// A release at `point`.
    #[must_use]
    pub const fn up(point: Point) -> Self {
        Self {
            action: PointerAction::Up,
            point,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Press {
    target: u32,
    point: Point,
    moved_out: bool,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
    node: u32,
    /// The node's `x`/`y` (without `dx`/`dy`) when the press started.
    origin: Point,
    active: bool,
}

/// Hover, press and drag state between pointer samples.
#[derive(Clone, Debug)]
pub(crate) struct PointerState {
    hover: u32,
    press: Option<Press>,
    drag: Option<Drag>,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            hover: INVALID,
            press: None,
            drag: None,
        }
    }
}

impl PointerState {
    /// Drops every reference to a disposed node.
    pub(crate) fn forget(&mut self, idx: u32) {
        if self.hover == idx {
            self.hover = INVALID;
        }
        if self.press.is_some_and(|p| p.target == idx) {
            self.press = None;
        }
        if self.drag.is_some_and(|d| d.node == idx) {
            self.drag = None;
        }
    }
}

impl<B: Backend> Scene<B> {
    /// Returns the topmost interactive node under `point` (scene
    /// coordinates), as of the last flush.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<NodeId> {
        self.hit_root(point).map(|idx| self.handle(idx))
    }

    /// Returns the node under the pointer.
    #[must_use]
    pub fn hovered(&self) -> Option<NodeId> {
        self.node_at(self.pointer.hover)
    }

    /// Returns whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.pointer.drag.is_some_and(|d| d.active)
    }

    fn hit_root(&self, point: Point) -> Option<u32> {
        self.live_idx(Some(self.root)).and_then(|root| self.hit(root, point))
    }

    fn hit(&self, idx: u32, point: Point) -> Option<u32> {
        let i = idx as usize;
        if !self.alive[i] || !self.visible_idx(idx) {
            return None;
        }
        if self.kind[i].is_container() && self.inside_clip(idx, point) {
            for &child in self.children[i].iter().rev() {
                if let Some(hit) = self.hit(child, point) {
                    return Some(hit);
                }
            }
        }
        if !self.interactive_idx(idx) {
            return None;
        }
        let local = self.world_transform[i].inverse() * point;
        let inside = self
            .backend
            .hit_test(self.display[i], local)
            .unwrap_or_else(|| self.local_bounds[i].contains(local));
        inside.then_some(idx)
    }

    fn inside_clip(&self, idx: u32, point: Point) -> bool {
        let i = idx as usize;
        let clip = [self.mask[i], self.content_mask[i]]
            .into_iter()
            .find(|&m| m != INVALID);
        let Some(m) = clip else {
            return true;
        };
        let local = self.world_transform[m as usize].inverse() * point;
        self.local_bounds[m as usize].contains(local)
    }

    /// Handles one pointer sample. Returns the node under the pointer.
    ///
    /// Hit testing uses the geometry of the last flush.
    pub fn dispatch_pointer(&mut self, input: PointerInput) -> Option<NodeId> {
        self.dispatch_pointer_with(input, &mut Tracer::none())
    }

    /// Like [`dispatch_pointer`](Self::dispatch_pointer), reporting
    /// deliveries to a [`Tracer`].
    pub fn dispatch_pointer_with(
        &mut self,
        input: PointerInput,
        tracer: &mut Tracer<'_>,
    ) -> Option<NodeId> {
        let point = input.point;
        let target = self.hit_root(point);
        match input.action {
            PointerAction::Down => self.pointer_down(target, point, tracer),
            PointerAction::Move => self.pointer_move(target, point, tracer),
            PointerAction::Up => self.pointer_up(target, point, tracer),
        }
        target.map(|idx| self.handle(idx))
    }

    fn pointer_down(&mut self, target: Option<u32>, point: Point, tracer: &mut Tracer<'_>) {
        self.update_hover(target, point, tracer);
        let Some(t) = target else {
            self.pointer.press = None;
            self.pointer.drag = None;
            return;
        };
        self.pointer.press = Some(Press {
            target: t,
            point,
            moved_out: false,
        });
        self.pointer.drag = self.draggable_ancestor(t).map(|node| Drag {
            node,
            origin: self.position[node as usize] - self.offset_of(node),
            active: false,
        });
        self.deliver(t, EventKind::PointerDown, point, Vec2::ZERO, tracer);
    }

    fn pointer_move(&mut self, target: Option<u32>, point: Point, tracer: &mut Tracer<'_>) {
        self.update_hover(target, point, tracer);
        if let Some(press) = &mut self.pointer.press
            && (point - press.point).hypot2() > CLICK_DRAG_THRESHOLD * CLICK_DRAG_THRESHOLD
        {
            press.moved_out = true;
        }
        if let (Some(press), Some(mut drag)) = (self.pointer.press, self.pointer.drag) {
            let delta = point - press.point;
            if !drag.active && press.moved_out {
                drag.active = true;
                self.pointer.drag = Some(drag);
                self.deliver(drag.node, EventKind::DragStart, point, delta, tracer);
            }
            if drag.active && self.alive[drag.node as usize] {
                self.drag_to(drag, delta);
                self.deliver(drag.node, EventKind::Dragged, point, delta, tracer);
            }
        }
        if let Some(t) = target {
            self.deliver(t, EventKind::PointerMove, point, Vec2::ZERO, tracer);
        }
    }

    fn pointer_up(&mut self, target: Option<u32>, point: Point, tracer: &mut Tracer<'_>) {
        self.update_hover(target, point, tracer);
        let press = self.pointer.press.take();
        let drag = self.pointer.drag.take();
        if let Some(t) = target {
            self.deliver(t, EventKind::PointerUp, point, Vec2::ZERO, tracer);
        }
        if let Some(drag) = drag.filter(|d| d.active && self.alive[d.node as usize]) {
            let delta = press.map_or(Vec2::ZERO, |p| point - p.point);
            self.deliver(drag.node, EventKind::DragStop, point, delta, tracer);
        } else if let (Some(press), Some(t)) = (press, target)
            && press.target == t
            && !press.moved_out
        {
            self.deliver(t, EventKind::Click, point, Vec2::ZERO, tracer);
        }
    }

    fn update_hover(&mut self, target: Option<u32>, point: Point, tracer: &mut Tracer<'_>) {
        let new = target.unwrap_or(INVALID);
        let old = self.pointer.hover;
        if new == old {
            if new != INVALID {
                self.place_tooltip(new, point);
            }
            return;
        }
        self.pointer.hover = new;
        if old != INVALID && self.alive[old as usize] {
            self.hide_tooltip(old);
            self.deliver(old, EventKind::PointerOut, point, Vec2::ZERO, tracer);
        }
        if new != INVALID {
            self.show_tooltip(new, point);
            self.deliver(new, EventKind::PointerOver, point, Vec2::ZERO, tracer);
        }
    }

    // -- Drag --

    fn draggable_ancestor(&self, idx: u32) -> Option<u32> {
        let mut i = idx;
        while i != INVALID {
            if self.public_or(i, keys::DRAGGABLE, false) {
                return Some(i);
            }
            i = self.parent[i as usize];
        }
        None
    }

    fn offset_of(&self, idx: u32) -> Vec2 {
        Vec2::new(
            self.public_or(idx, keys::DX, 0.0),
            self.public_or(idx, keys::DY, 0.0),
        )
    }

    /// Maps a scene-space displacement into the parent space of `idx`.
    fn to_parent_space(&self, idx: u32, delta: Vec2) -> Vec2 {
        let mut rotation = 0.0;
        let mut scale = 1.0;
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            rotation += self.public_or(p, keys::ROTATION, 0.0);
            scale *= self.public_or(p, keys::SCALE, 1.0);
            p = self.parent[p as usize];
        }
        let rotated = Affine::rotate(-rotation.to_radians()) * delta.to_point();
        if scale == 0.0 {
            return Vec2::ZERO;
        }
        rotated.to_vec2() / scale
    }

    fn drag_to(&mut self, drag: Drag, delta: Vec2) {
        let local = self.to_parent_space(drag.node, delta);
        let target = drag.origin + local;
        self.write_public(drag.node, KeyId::X, Some(Value::Length(Length::Px(target.x))));
        self.write_public(drag.node, KeyId::Y, Some(Value::Length(Length::Px(target.y))));
        self.write_private(drag.node, KeyId::X, None);
        self.write_private(drag.node, KeyId::Y, None);
    }

    // -- Tooltips --

    fn tooltip_owner(&self, idx: u32) -> Option<(u32, u32)> {
        let mut i = idx;
        while i != INVALID {
            if let Some(tooltip) = self.tooltip_of(i) {
                return Some((i, tooltip));
            }
            i = self.parent[i as usize];
        }
        None
    }

    fn show_tooltip(&mut self, hovered: u32, point: Point) {
        let Some((owner, tooltip)) = self.tooltip_owner(hovered) else {
            return;
        };
        if self.kind[tooltip as usize] == NodeKind::Label
            && let Some(text) = self.settings[owner as usize].get(keys::TOOLTIP_TEXT).cloned()
        {
            self.write_public(tooltip, KeyId::Text, Some(Value::Text(text)));
        }
        self.set_private_flag(tooltip, KeyId::Visible, true);
        self.place_tooltip(hovered, point);
    }

    fn place_tooltip(&mut self, hovered: u32, point: Point) {
        let Some((_, tooltip)) = self.tooltip_owner(hovered) else {
            return;
        };
        let p = self.parent[tooltip as usize];
        let local = if p == INVALID {
            point
        } else {
            self.world_transform[p as usize].inverse() * point
        };
        self.set_private_px(tooltip, keys::private::X, local.x);
        self.set_private_px(tooltip, keys::private::Y, local.y);
    }

    pub(crate) fn hide_tooltip(&mut self, hovered: u32) {
        if let Some((_, tooltip)) = self.tooltip_owner(hovered) {
            self.set_private_flag(tooltip, KeyId::Visible, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use kurbo::{Point, Size};

    use super::{CLICK_DRAG_THRESHOLD, PointerInput};
    use crate::event::{EventKind, Propagation};
    use crate::settings::{Length, keys};
    use crate::{HeadlessBackend, NodeId, NodeKind, Scene};

    fn scene() -> Scene<HeadlessBackend> {
        let mut s = Scene::new(HeadlessBackend::new());
        s.set_viewport(Size::new(400.0, 400.0));
        s
    }

    fn square(s: &mut Scene<HeadlessBackend>, parent: NodeId, x: f64, y: f64, size: f64) -> NodeId {
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::X, Length::Px(x));
        s.set(r, keys::Y, Length::Px(y));
        s.set(r, keys::WIDTH, Length::Px(size));
        s.set(r, keys::HEIGHT, Length::Px(size));
        s.set(r, keys::INTERACTIVE, true);
        s.children_mut(parent).push(r);
        r
    }

    fn log_kinds(s: &mut Scene<HeadlessBackend>, node: NodeId, kinds: &[EventKind]) -> Rc<RefCell<Vec<EventKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for &kind in kinds {
            let log = Rc::clone(&log);
            s.on(node, kind, move |e| {
                log.borrow_mut().push(e.kind);
                Propagation::Continue
            });
        }
        log
    }

    #[test]
    fn root_survives_dispose_and_still_hits() {
        let mut s = scene();
        let root = s.root();
        let r = square(&mut s, root, 0.0, 0.0, 50.0);
        s.flush();
        assert!(!s.dispose(root));
        let stray = s.create(NodeKind::Rectangle);
        assert_ne!(stray.index(), root.index());
        s.flush();
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(r));
        assert_eq!(s.dispatch_pointer(PointerInput::down(Point::new(10.0, 10.0))), Some(r));
    }

    #[test]
    fn topmost_sibling_wins() {
        let mut s = scene();
        let root = s.root();
        let below = square(&mut s, root, 0.0, 0.0, 50.0);
        let above = square(&mut s, root, 25.0, 25.0, 50.0);
        s.flush();
        assert_eq!(s.hit_test(Point::new(30.0, 30.0)), Some(above));
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(below));
        assert_eq!(s.hit_test(Point::new(200.0, 200.0)), None);
    }

    #[test]
    fn hidden_and_passive_nodes_are_skipped() {
        let mut s = scene();
        let root = s.root();
        let below = square(&mut s, root, 0.0, 0.0, 50.0);
        let above = square(&mut s, root, 0.0, 0.0, 50.0);
        s.set(above, keys::VISIBLE, false);
        s.flush();
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(below));
        s.set(below, keys::INTERACTIVE, false);
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn content_mask_clips_hits() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::WIDTH, Length::Px(20.0));
        s.set(c, keys::HEIGHT, Length::Px(20.0));
        s.set(c, keys::MASK_CONTENT, true);
        s.children_mut(root).push(c);
        let big = square(&mut s, c, 0.0, 0.0, 100.0);
        s.flush();
        s.flush();
        assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(big));
        assert_eq!(s.hit_test(Point::new(60.0, 60.0)), None);
    }

    #[test]
    fn click_requires_same_target_and_small_movement() {
        let mut s = scene();
        let root = s.root();
        let a = square(&mut s, root, 0.0, 0.0, 50.0);
        s.flush();
        let log = log_kinds(&mut s, a, &[EventKind::Click]);

        s.dispatch_pointer(PointerInput::down(Point::new(10.0, 10.0)));
        s.dispatch_pointer(PointerInput::moved(Point::new(12.0, 12.0)));
        s.dispatch_pointer(PointerInput::up(Point::new(12.0, 12.0)));
        assert_eq!(log.borrow().len(), 1);

        let far = 10.0 + CLICK_DRAG_THRESHOLD + 1.0;
        s.dispatch_pointer(PointerInput::down(Point::new(10.0, 10.0)));
        s.dispatch_pointer(PointerInput::moved(Point::new(far, 10.0)));
        s.dispatch_pointer(PointerInput::up(Point::new(10.0, 10.0)));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn hover_emits_over_and_out() {
        let mut s = scene();
        let root = s.root();
        let a = square(&mut s, root, 0.0, 0.0, 50.0);
        s.flush();
        let log = log_kinds(&mut s, a, &[EventKind::PointerOver, EventKind::PointerOut]);
        s.dispatch_pointer(PointerInput::moved(Point::new(10.0, 10.0)));
        s.dispatch_pointer(PointerInput::moved(Point::new(20.0, 10.0)));
        assert_eq!(s.hovered(), Some(a));
        s.dispatch_pointer(PointerInput::moved(Point::new(300.0, 300.0)));
        assert_eq!(*log.borrow(), &[EventKind::PointerOver, EventKind::PointerOut]);
        assert_eq!(s.hovered(), None);
    }

    #[test]
    fn drag_moves_node_in_parent_space() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::SCALE, 2.0);
        s.children_mut(root).push(c);
        let a = square(&mut s, c, 10.0, 10.0, 20.0);
        s.set(a, keys::DRAGGABLE, true);
        s.flush();
        let log = log_kinds(
            &mut s,
            a,
            &[EventKind::DragStart, EventKind::Dragged, EventKind::DragStop, EventKind::Click],
        );

        s.dispatch_pointer(PointerInput::down(Point::new(30.0, 30.0)));
        s.dispatch_pointer(PointerInput::moved(Point::new(50.0, 30.0)));
        assert!(s.is_dragging());
        s.dispatch_pointer(PointerInput::up(Point::new(50.0, 30.0)));
        assert!(!s.is_dragging());

        assert_eq!(s.get(a, keys::X), Some(&Length::Px(20.0)));
        assert_eq!(s.get(a, keys::Y), Some(&Length::Px(10.0)));
        assert_eq!(
            *log.borrow(),
            &[EventKind::DragStart, EventKind::Dragged, EventKind::DragStop]
        );
        s.flush();
        assert_eq!(s.position(a), Point::new(20.0, 10.0));
    }

    #[test]
    fn drag_undoes_ancestor_rotation() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::ROTATION, 90.0);
        s.children_mut(root).push(c);
        let a = s.create(NodeKind::Rectangle);
        s.set(a, keys::DRAGGABLE, true);
        s.children_mut(c).push(a);
        s.flush();
        let local = s.to_parent_space(a.index(), kurbo::Vec2::new(0.0, 10.0));
        assert!((local.x - 10.0).abs() < 1e-9 && local.y.abs() < 1e-9, "{local:?}");
    }

    #[test]
    fn tooltip_follows_hover() {
        let mut s = scene();
        let root = s.root();
        let a = square(&mut s, root, 0.0, 0.0, 50.0);
        let tip = s.create(NodeKind::Label);
        s.children_mut(root).push(tip);
        s.set(a, keys::TOOLTIP, tip);
        s.set(a, keys::TOOLTIP_TEXT, String::from("42 units"));
        s.flush();
        assert!(!s.is_visible(tip));

        s.dispatch_pointer(PointerInput::moved(Point::new(10.0, 12.0)));
        assert!(s.is_visible(tip));
        assert_eq!(s.get(tip, keys::TEXT).map(String::as_str), Some("42 units"));
        s.flush();
        assert_eq!(s.position(tip), Point::new(10.0, 12.0));

        s.dispatch_pointer(PointerInput::moved(Point::new(300.0, 300.0)));
        assert!(!s.is_visible(tip));
    }
}

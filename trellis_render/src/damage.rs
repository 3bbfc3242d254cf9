// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.

use alloc::vec::Vec;

use kurbo::{Rect, Size};
use trellis_core::{Attachment, Backend, FrameChanges, NodeId, NodeKind, Scene};

/// A region of the output that needs re-rendering.
///
/// Renderers can use this to redraw only the areas that changed since the
/// last frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DamageRegion {
    /// The entire output needs redrawing.
    #[default]
    Full,
    /// Scene-space rectangles that need redrawing.
    Rects(Vec<Rect>),
    /// Nothing changed; the previous frame can be reused.
    None,
}

impl DamageRegion {
    /// Returns `true` if no region needs redrawing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }

    /// Returns the union of every damaged rectangle, or `None` for
    /// [`Full`](Self::Full) and [`None`](Self::None).
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Self::Rects(rects) => rects.iter().copied().reduce(|a, b| a.union(b)),
            _ => None,
        }
    }
}

/// Remembers where every drawn node was painted, so the next frame's
/// [`FrameChanges`] can be turned into the area that must be redrawn.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    /// Painted footprint per slot index.
    painted: Vec<Option<Rect>>,
    viewport: Option<Size>,
}

impl DamageTracker {
    /// Creates a tracker that reports full damage on its first update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every footprint; the next update reports full damage.
    pub fn reset(&mut self) {
        self.painted.clear();
        self.viewport = None;
    }

    /// Computes the damage of the flush that produced `changes`.
    ///
    /// The first call, and any call after the viewport changed, records the
    /// whole tree and returns [`DamageRegion::Full`].
    pub fn update<B: Backend>(&mut self, scene: &Scene<B>, changes: &FrameChanges) -> DamageRegion {
        if self.viewport != Some(scene.viewport()) {
            self.viewport = Some(scene.viewport());
            self.painted.clear();
            let mut stack = Vec::from([scene.root()]);
            while let Some(id) = stack.pop() {
                push_owned(scene, id, &mut stack);
                self.record(id.index(), footprint(scene, id.index()));
            }
            return DamageRegion::Full;
        }

        let mut slots: Vec<u32> = [
            &changes.bounds,
            &changes.transforms,
            &changes.painted,
            &changes.hidden,
            &changes.unhidden,
            &changes.added,
            &changes.removed,
        ]
        .into_iter()
        .flatten()
        .copied()
        .collect();
        let mut stack: Vec<NodeId> = slots.iter().filter_map(|&s| scene.node_at(s)).collect();
        while let Some(id) = stack.pop() {
            let start = stack.len();
            push_owned(scene, id, &mut stack);
            slots.extend(stack[start..].iter().map(|c| c.index()));
        }
        slots.sort_unstable();
        slots.dedup();

        let mut rects = Vec::new();
        for slot in slots {
            let old = self.painted.get(slot as usize).copied().flatten();
            let new = footprint(scene, slot);
            if old == new {
                continue;
            }
            rects.extend(old);
            rects.extend(new);
            self.record(slot, new);
        }
        if rects.is_empty() {
            DamageRegion::None
        } else {
            DamageRegion::Rects(rects)
        }
    }

    fn record(&mut self, slot: u32, footprint: Option<Rect>) {
        let slot = slot as usize;
        if slot >= self.painted.len() {
            if footprint.is_none() {
                return;
            }
            self.painted.resize(slot + 1, None);
        }
        self.painted[slot] = footprint;
    }
}

/// Pushes a container's children and background.
fn push_owned<B: Backend>(scene: &Scene<B>, id: NodeId, stack: &mut Vec<NodeId>) {
    if scene.kind(id) != Some(NodeKind::Container) {
        return;
    }
    stack.extend(scene.children(id).iter());
    stack.extend(scene.background(id));
}

/// Where a node is painted in scene space, if it is painted at all.
fn footprint<B: Backend>(scene: &Scene<B>, slot: u32) -> Option<Rect> {
    let id = scene.node_at(slot)?;
    if matches!(scene.kind(id), None | Some(NodeKind::Container)) || !is_drawn(scene, id) {
        return None;
    }
    let bounds = scene.global_bounds(id);
    let paint = scene.paint(id);
    Some(if paint.stroke.is_some() {
        bounds.inflate(paint.stroke_width / 2.0, paint.stroke_width / 2.0)
    } else {
        bounds
    })
}

/// Whether the node is shown in the root tree and not used as a mask.
fn is_drawn<B: Backend>(scene: &Scene<B>, id: NodeId) -> bool {
    if !scene.is_effectively_visible(id) {
        return false;
    }
    let mut node = id;
    while let Some(parent) = scene.parent(node) {
        if matches!(
            scene.attachment(node),
            Attachment::Mask | Attachment::ContentMask
        ) {
            return false;
        }
        node = parent;
    }
    node == scene.root()
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Rect, Size};
    use trellis_core::settings::{Color, Length, keys};
    use trellis_core::{HeadlessBackend, NodeId, NodeKind, Scene};

    use super::{DamageRegion, DamageTracker};

    fn scene() -> Scene<HeadlessBackend> {
        let mut s = Scene::new(HeadlessBackend::new());
        s.set_viewport(Size::new(200.0, 200.0));
        s
    }

    fn square(s: &mut Scene<HeadlessBackend>, parent: NodeId, x: f64) -> NodeId {
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::X, Length::Px(x));
        s.set(r, keys::WIDTH, Length::Px(10.0));
        s.set(r, keys::HEIGHT, Length::Px(10.0));
        s.children_mut(parent).push(r);
        r
    }

    #[test]
    fn merge_full_wins() {
        let mut a = DamageRegion::None;
        a.merge(&DamageRegion::Rects(vec![Rect::new(0.0, 0.0, 1.0, 1.0)]));
        assert_eq!(a.bounding_box(), Some(Rect::new(0.0, 0.0, 1.0, 1.0)));
        a.merge(&DamageRegion::Full);
        assert_eq!(a, DamageRegion::Full);
        a.merge(&DamageRegion::None);
        assert_eq!(a, DamageRegion::Full);
    }

    #[test]
    fn first_frame_is_full_then_quiet() {
        let mut s = scene();
        let root = s.root();
        square(&mut s, root, 0.0);
        let mut tracker = DamageTracker::new();
        let changes = s.flush();
        assert_eq!(tracker.update(&s, &changes), DamageRegion::Full);
        let changes = s.flush();
        assert!(tracker.update(&s, &changes).is_empty());
    }

    #[test]
    fn moving_damages_old_and_new_footprint() {
        let mut s = scene();
        let root = s.root();
        let r = square(&mut s, root, 0.0);
        let mut tracker = DamageTracker::new();
        let changes = s.flush();
        let _ = tracker.update(&s, &changes);

        s.set(r, keys::X, Length::Px(50.0));
        let changes = s.flush();
        assert_eq!(
            tracker.update(&s, &changes),
            DamageRegion::Rects(vec![
                Rect::new(0.0, 0.0, 10.0, 10.0),
                Rect::new(50.0, 0.0, 60.0, 10.0),
            ])
        );
    }

    #[test]
    fn moving_a_container_damages_its_children() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.children_mut(root).push(c);
        square(&mut s, c, 0.0);
        let mut tracker = DamageTracker::new();
        let changes = s.flush();
        let _ = tracker.update(&s, &changes);

        s.set(c, keys::Y, Length::Px(20.0));
        let changes = s.flush();
        let damage = tracker.update(&s, &changes);
        assert_eq!(damage.bounding_box(), Some(Rect::new(0.0, 0.0, 10.0, 30.0)));
    }

    #[test]
    fn hiding_and_stroke() {
        let mut s = scene();
        let root = s.root();
        let r = square(&mut s, root, 0.0);
        s.set(r, keys::STROKE, Color::BLACK);
        s.set(r, keys::STROKE_WIDTH, 2.0);
        let mut tracker = DamageTracker::new();
        let changes = s.flush();
        let _ = tracker.update(&s, &changes);

        s.set(r, keys::VISIBLE, false);
        let changes = s.flush();
        assert_eq!(
            tracker.update(&s, &changes),
            DamageRegion::Rects(vec![Rect::new(-1.0, -1.0, 11.0, 11.0)])
        );
    }

    #[test]
    fn viewport_change_is_full() {
        let mut s = scene();
        let mut tracker = DamageTracker::new();
        let changes = s.flush();
        let _ = tracker.update(&s, &changes);
        s.set_viewport(Size::new(300.0, 300.0));
        let changes = s.flush();
        assert_eq!(tracker.update(&s, &changes), DamageRegion::Full);
    }
}

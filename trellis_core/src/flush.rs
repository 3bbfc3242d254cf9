// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flushing pending changes and change tracking.
//!
//! A flush drains the dirty channels in a fixed order:
//!
//! 1. **Changed**: staged settings are written, then every node with dirty
//!    public settings classifies its dirty keys (marking bounds, position or
//!    paint work) and applies immediate effects: alpha, visibility,
//!    interactivity, content upload, background and mask attachment.
//! 2. **Bounds**: dirty nodes are measured deepest first, so children are
//!    measured before their container runs its layout and unions them. A
//!    layout may invalidate what it arranges; the phase repeats until no
//!    bounds are dirty, at most [`MAX_SETTLE_PASSES`] times. Whatever is
//!    still dirty after that stays scheduled for the next flush.
//! 3. **Position**: positions and transforms are resolved parent before
//!    child, for marked nodes and their subtrees.
//! 4. **Paint**: fill and stroke are uploaded.
//! 5. **Clear**: visibility flips and topology are collected, every dirty
//!    key is cleared, bounds and position events are delivered, and
//!    transitions of animations that finished before the flush resolve.
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than [`NodeId`]
//! handles so that consumers can index straight into per-node state; use
//! [`Scene::node_at`] to get a handle back.
//!
//! [`NodeId`]: crate::NodeId

use alloc::vec::Vec;
use core::cmp::Reverse;

use kurbo::{Affine, Point, Rect, Vec2};

use crate::backend::Backend;
use crate::dirty;
use crate::event::EventKind;
use crate::node::{Attachment, INVALID};
use crate::scene::Scene;
use crate::settings::{KeyId, keys};
#[cfg(feature = "trace-rich")]
use crate::trace::{NodeChange, NodeField};
use crate::trace::{
    FlushBeginEvent, FlushSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    SettleLimitEvent, Tracer, count,
};

/// Upper bound on bounds passes per flush.
pub const MAX_SETTLE_PASSES: u32 = 10;

/// The set of changes produced by a single [`Scene::flush`] call.
///
/// Each list holds the raw slot indices of nodes that changed in that
/// category, in processing order.
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Nodes whose public settings ran the changed phase.
    pub settings: Vec<u32>,
    /// Nodes whose local or adjusted bounds changed.
    pub bounds: Vec<u32>,
    /// Containers that ran their layout (once per pass).
    pub layouts: Vec<u32>,
    /// Nodes whose world transform was recomputed.
    pub transforms: Vec<u32>,
    /// Nodes whose resolved position changed.
    pub positions: Vec<u32>,
    /// Nodes whose paint was uploaded.
    pub painted: Vec<u32>,
    /// Nodes that became hidden.
    pub hidden: Vec<u32>,
    /// Nodes that became visible again.
    pub unhidden: Vec<u32>,
    /// Nodes created since the last flush.
    pub added: Vec<u32>,
    /// Nodes disposed since the last flush.
    pub removed: Vec<u32>,
    /// Whether any children list, attachment, or the node set changed.
    pub topology_changed: bool,
    /// Bounds passes this flush needed.
    pub settle_passes: u32,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.settings.clear();
        self.bounds.clear();
        self.layouts.clear();
        self.transforms.clear();
        self.positions.clear();
        self.painted.clear();
        self.hidden.clear();
        self.unhidden.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
        self.settle_passes = 0;
    }

    /// Returns whether the flush changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
            && self.bounds.is_empty()
            && self.transforms.is_empty()
            && self.painted.is_empty()
            && self.hidden.is_empty()
            && self.unhidden.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl<B: Backend> Scene<B> {
    /// Applies every pending change and returns what changed.
    pub fn flush(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.flush_into_with(&mut changes, &mut Tracer::none());
        changes
    }

    /// Like [`flush`](Self::flush), reporting to a [`Tracer`].
    pub fn flush_with(&mut self, tracer: &mut Tracer<'_>) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.flush_into_with(&mut changes, tracer);
        changes
    }

    /// Like [`flush`](Self::flush), but reuses a caller-provided buffer.
    pub fn flush_into(&mut self, changes: &mut FrameChanges) {
        self.flush_into_with(changes, &mut Tracer::none());
    }

    /// Like [`flush_into`](Self::flush_into), reporting to a [`Tracer`].
    pub fn flush_into_with(&mut self, changes: &mut FrameChanges, tracer: &mut Tracer<'_>) {
        changes.clear();
        let frame_index = self.frame_index;
        let mut summary = FlushSummaryBuilder::new(frame_index);
        tracer.flush_begin(&FlushBeginEvent {
            frame_index,
            nodes: count(self.node_count()),
        });

        // Changed.
        phase_begin(tracer, frame_index, PhaseKind::Changed);
        self.apply_deferred();
        let changed = self.drain_live(dirty::SETTINGS);
        for &idx in &changed {
            self.run_changed(idx);
        }
        changes.settings = changed;
        let n = count(changes.settings.len());
        phase_end(tracer, frame_index, PhaseKind::Changed, n);
        summary.phase_nodes(PhaseKind::Changed, n);

        // Bounds.
        phase_begin(tracer, frame_index, PhaseKind::Bounds);
        let (measured, settled) = self.settle_bounds(changes, tracer);
        phase_end(tracer, frame_index, PhaseKind::Bounds, measured);
        summary.phase_nodes(PhaseKind::Bounds, measured);
        summary.layouts(count(changes.layouts.len()));
        summary.settle(changes.settle_passes, settled);

        // Position.
        phase_begin(tracer, frame_index, PhaseKind::Position);
        self.resolve_positions(changes);
        let n = count(changes.transforms.len());
        phase_end(tracer, frame_index, PhaseKind::Position, n);
        summary.phase_nodes(PhaseKind::Position, n);

        // Paint.
        phase_begin(tracer, frame_index, PhaseKind::Paint);
        let painted = self.drain_live(dirty::PAINT);
        for &idx in &painted {
            if !self.kind[idx as usize].is_container() {
                let paint = self.paint_of(idx);
                self.backend.set_paint(self.display[idx as usize], &paint);
                changes.painted.push(idx);
            }
        }
        let n = count(changes.painted.len());
        phase_end(tracer, frame_index, PhaseKind::Paint, n);
        summary.phase_nodes(PhaseKind::Paint, n);

        // Clear.
        phase_begin(tracer, frame_index, PhaseKind::Clear);
        self.collect_visibility(changes);
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = self.topology_dirty || !topology.is_empty();
        self.topology_dirty = false;
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);

        let touched = core::mem::take(&mut self.touched);
        for &idx in &touched {
            let i = idx as usize;
            self.settings[i].clear_dirty();
            self.private[i].clear_dirty();
        }
        self.scheduled = !settled;
        self.frame_index += 1;

        self.deliver_changes(changes, tracer);
        self.animations.settle();
        let n = count(touched.len());
        phase_end(tracer, frame_index, PhaseKind::Clear, n);
        summary.phase_nodes(PhaseKind::Clear, n);

        #[cfg(feature = "trace-rich")]
        {
            let records = node_changes(changes);
            tracer.node_changes(frame_index, &records);
        }
        tracer.flush_summary(&summary.finish());
    }

    fn drain_live(&mut self, channel: understory_dirty::Channel) -> Vec<u32> {
        let mut nodes: Vec<u32> = self.dirty.drain(channel).deterministic().run().collect();
        nodes.retain(|&idx| self.alive[idx as usize]);
        nodes
    }

    // -- Changed --

    fn apply_deferred(&mut self) {
        for idx in core::mem::take(&mut self.deferred) {
            let i = idx as usize;
            if !self.alive[i] {
                continue;
            }
            let was_touched = self.settings[i].is_touched() || self.private[i].is_touched();
            if !self.settings[i].apply_deferred().is_empty() {
                if !was_touched {
                    self.touched.push(idx);
                }
                self.dirty.mark(idx, dirty::SETTINGS);
            }
        }
    }

    /// Turns one node's dirty keys into scheduled work and immediate effects.
    fn run_changed(&mut self, idx: u32) {
        let i = idx as usize;
        let dirty_keys = self.settings[i].dirty();
        let p = self.parent[i];
        for key in dirty_keys.iter() {
            if key.affects_bounds() {
                self.mark_bounds(idx);
            }
            if key.affects_position()
                || matches!(
                    key,
                    KeyId::Position | KeyId::Rotation | KeyId::Scale | KeyId::CenterX | KeyId::CenterY
                )
            {
                self.mark_position(idx);
            }
            if key.affects_parent() && p != INVALID && self.attachment[i] == Attachment::Child {
                self.mark_bounds(p);
            }
            if key.affects_paint() {
                self.mark_paint(idx);
            }

            match key {
                KeyId::Opacity => {
                    let alpha = self.public_or(idx, keys::OPACITY, 1.0);
                    self.backend.set_alpha(self.display[i], alpha);
                }
                KeyId::Visible | KeyId::ForceHidden => self.sync_visibility(idx),
                KeyId::Interactive | KeyId::Draggable => self.sync_interactive(idx),
                KeyId::Tooltip => self.tooltip_changed(idx),
                KeyId::Draw | KeyId::Text | KeyId::FontSize => self.upload_content(idx),
                KeyId::Layout => {
                    for c in self.children[i].clone() {
                        self.release_assigned(c);
                    }
                }
                // The parent's layout reassigns relative children; absolute
                // ones keep only their own x and y.
                KeyId::Position if self.attachment[i] == Attachment::Child => {
                    self.release_assigned(idx);
                }
                KeyId::Background => self.sync_background(idx),
                KeyId::Mask => self.sync_mask(idx),
                KeyId::MaskContent => self.sync_content_mask(idx),
                _ => {}
            }
        }
    }

    /// Hides a newly assigned tooltip until hover shows it, and hands a
    /// replaced one back to its own visibility.
    fn tooltip_changed(&mut self, idx: u32) {
        if let Some(previous) = self.settings[idx as usize].previous(keys::TOOLTIP).copied()
            && self.is_alive(previous)
        {
            self.write_private(previous.idx, KeyId::Visible, None);
        }
        if let Some(tooltip) = self.tooltip_of(idx) {
            self.set_private_flag(tooltip, KeyId::Visible, false);
        }
        self.sync_interactive(idx);
    }

    // -- Bounds --

    /// Runs bounds passes until nothing is dirty or the pass limit is hit.
    ///
    /// Returns the number of node measurements and whether bounds settled.
    fn settle_bounds(&mut self, changes: &mut FrameChanges, tracer: &mut Tracer<'_>) -> (u32, bool) {
        let mut measured = 0_u32;
        let mut in_pass: Vec<bool> = Vec::new();
        loop {
            let mut pass = self.drain_live(dirty::BOUNDS);
            if pass.is_empty() {
                return (measured, true);
            }
            if changes.settle_passes == MAX_SETTLE_PASSES {
                tracer.settle_limit(&SettleLimitEvent {
                    frame_index: self.frame_index,
                    pending: count(pass.len()),
                });
                for idx in pass {
                    self.dirty.mark(idx, dirty::BOUNDS);
                }
                return (measured, false);
            }
            changes.settle_passes += 1;

            pass.sort_by_key(|&idx| Reverse(self.depth(idx)));
            in_pass.clear();
            in_pass.resize(self.len as usize, false);
            for &idx in &pass {
                in_pass[idx as usize] = true;
            }
            for &idx in &pass {
                in_pass[idx as usize] = false;
                self.update_bounds(idx, &in_pass, changes, tracer);
                measured = measured.saturating_add(1);
            }
        }
    }

    fn update_bounds(
        &mut self,
        idx: u32,
        in_pass: &[bool],
        changes: &mut FrameChanges,
        tracer: &mut Tracer<'_>,
    ) {
        let i = idx as usize;
        let visible = self.visible_idx(idx);
        let local = if !visible {
            Rect::ZERO
        } else if self.kind[i].is_container() {
            self.measure_container(idx, &mut changes.layouts, tracer)
        } else {
            self.measure_leaf(idx)
        };
        let old_local = core::mem::replace(&mut self.local_bounds[i], local);
        let adjusted = if visible { self.adjust(idx, local) } else { Rect::ZERO };
        let old_adjusted = core::mem::replace(&mut self.adjusted_bounds[i], adjusted);
        if local == old_local && adjusted == old_adjusted {
            return;
        }

        if !changes.bounds.contains(&idx) {
            changes.bounds.push(idx);
        }
        self.mark_position(idx);
        if self.kind[i].is_container() {
            for c in self.children[i].clone() {
                if self.depends_on_parent_size(c) {
                    self.dirty.mark(c, dirty::BOUNDS);
                }
            }
            self.sync_owned(idx);
        }

        let p = self.parent[i];
        if p != INVALID
            && self.attachment[i] == Attachment::Child
            && self.is_relative(idx)
            && self.sizes_to_content(p)
            && !in_pass.get(p as usize).copied().unwrap_or(false)
        {
            self.mark_bounds(p);
        }
    }

    // -- Position --

    fn resolve_positions(&mut self, changes: &mut FrameChanges) {
        let mut nodes: Vec<u32> = self
            .dirty
            .drain(dirty::POSITION)
            .affected()
            .deterministic()
            .run()
            .collect();
        nodes.retain(|&idx| self.alive[idx as usize]);
        nodes.sort_by_key(|&idx| self.depth(idx));

        for &idx in &nodes {
            let i = idx as usize;
            let position = self.resolve_position(idx);
            let local = Affine::translate(position.to_vec2()) * self.own_transform(idx);
            let p = self.parent[i];
            let parent_world = if p == INVALID {
                Affine::IDENTITY
            } else {
                self.world_transform[p as usize]
            };
            self.world_transform[i] = parent_world * local;
            if self.local_transform[i] != local {
                self.local_transform[i] = local;
                self.backend.set_transform(self.display[i], local);
            }
            if self.position[i] != position {
                self.position[i] = position;
                changes.positions.push(idx);
            }
        }
        changes.transforms = nodes;
    }

    // -- Clear --

    /// Reports nodes whose effective visibility flipped an odd number of
    /// times since the last flush.
    fn collect_visibility(&mut self, changes: &mut FrameChanges) {
        let mut flipped = core::mem::take(&mut self.pending_visibility);
        flipped.sort_unstable();
        for run in flipped.chunk_by(|a, b| a == b) {
            let idx = run[0];
            if run.len() % 2 == 0 || !self.alive[idx as usize] {
                continue;
            }
            if self.shown[idx as usize] {
                changes.unhidden.push(idx);
            } else {
                changes.hidden.push(idx);
            }
        }
    }

    /// Delivers bounds and position events to nodes that listen for them.
    fn deliver_changes(&mut self, changes: &FrameChanges, tracer: &mut Tracer<'_>) {
        let batches = [
            (EventKind::BoundsChanged, &changes.bounds),
            (EventKind::PositionChanged, &changes.positions),
        ];
        for (kind, nodes) in batches {
            for &idx in nodes {
                let i = idx as usize;
                if !self.alive[i] || !self.listeners[i].iter().any(|l| l.kind == kind) {
                    continue;
                }
                let point = Point::ZERO + self.world_transform[i].translation();
                self.deliver(idx, kind, point, Vec2::ZERO, tracer);
            }
        }
    }
}

fn phase_begin(tracer: &mut Tracer<'_>, frame_index: u64, phase: PhaseKind) {
    tracer.phase_begin(&PhaseBeginEvent { frame_index, phase });
}

fn phase_end(tracer: &mut Tracer<'_>, frame_index: u64, phase: PhaseKind, nodes: u32) {
    tracer.phase_end(&PhaseEndEvent {
        frame_index,
        phase,
        nodes,
    });
}

#[cfg(feature = "trace-rich")]
fn node_changes(changes: &FrameChanges) -> Vec<NodeChange> {
    let fields = [
        (NodeField::Settings, &changes.settings),
        (NodeField::Bounds, &changes.bounds),
        (NodeField::Position, &changes.transforms),
        (NodeField::Paint, &changes.painted),
        (NodeField::Visibility, &changes.hidden),
        (NodeField::Visibility, &changes.unhidden),
        (NodeField::Topology, &changes.added),
        (NodeField::Topology, &changes.removed),
    ];
    let mut records = Vec::new();
    for (field, nodes) in fields {
        records.extend(nodes.iter().map(|&node_index| NodeChange { node_index, field }));
    }
    records
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::Cell;

    use kurbo::{Point, Rect, Size};

    use super::MAX_SETTLE_PASSES;
    use crate::event::{EventKind, Propagation};
    use crate::layout::{GridLayout, Layout};
    use crate::settings::{Length, Position, keys, percent};
    use crate::{HeadlessBackend, NodeId, NodeKind, Scene};

    fn scene() -> Scene<HeadlessBackend> {
        let mut s = Scene::new(HeadlessBackend::new());
        s.set_viewport(Size::new(800.0, 600.0));
        s
    }

    fn rect(s: &mut Scene<HeadlessBackend>, parent: NodeId, w: f64, h: f64) -> NodeId {
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::WIDTH, Length::Px(w));
        s.set(r, keys::HEIGHT, Length::Px(h));
        s.children_mut(parent).push(r);
        r
    }

    fn container(s: &mut Scene<HeadlessBackend>, layout: Option<Layout>) -> NodeId {
        let c = s.create(NodeKind::Container);
        if let Some(layout) = layout {
            s.set(c, keys::LAYOUT, layout);
        }
        let root = s.root();
        s.children_mut(root).push(c);
        c
    }

    /// Every ordering of `0..n`.
    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return alloc::vec![Vec::new()];
        }
        let mut out = Vec::new();
        for rest in permutations(n - 1) {
            for at in 0..=rest.len() {
                let mut p = rest.clone();
                p.insert(at, n - 1);
                out.push(p);
            }
        }
        out
    }

    /// Deterministic xorshift for property tests.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    #[test]
    fn horizontal_stacks_with_margins() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Horizontal));
        let a = rect(&mut s, c, 50.0, 20.0);
        let b = rect(&mut s, c, 80.0, 20.0);
        s.set(b, keys::MARGIN_LEFT, 10.0);
        s.flush();
        assert_eq!(s.width(c), 140.0);
        assert_eq!(s.position(a), Point::new(0.0, 0.0));
        assert_eq!(s.position(b), Point::new(60.0, 0.0));
    }

    #[test]
    fn vertical_stacks_inside_padding() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Vertical));
        s.set(c, keys::PADDING_TOP, 5.0);
        s.set(c, keys::PADDING_BOTTOM, 5.0);
        let a = rect(&mut s, c, 10.0, 20.0);
        let b = rect(&mut s, c, 10.0, 30.0);
        s.set(a, keys::MARGIN_BOTTOM, 4.0);
        let changes = s.flush();
        assert_eq!(s.position(a).y, 5.0);
        assert_eq!(s.position(b).y, 29.0);
        assert_eq!(s.local_bounds(c), Rect::new(0.0, 0.0, 10.0, 64.0));
        assert!(changes.layouts.contains(&c.index()));
    }

    #[test]
    fn percent_children_share_remaining_space() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Horizontal));
        s.set(c, keys::WIDTH, Length::Px(300.0));
        let fixed = rect(&mut s, c, 100.0, 20.0);
        let a = s.create(NodeKind::Rectangle);
        let b = s.create(NodeKind::Rectangle);
        for n in [a, b] {
            s.set(n, keys::WIDTH, Length::Percent(percent(50.0)));
            s.set(n, keys::HEIGHT, Length::Px(20.0));
            s.children_mut(c).push(n);
        }
        let changes = s.flush();
        assert!(changes.settle_passes <= MAX_SETTLE_PASSES);
        assert!(!s.is_scheduled());
        assert_eq!(s.width(a), 100.0);
        assert_eq!(s.width(b), 100.0);
        assert_eq!(s.position(fixed).x, 0.0);
        assert_eq!(s.position(a).x, 100.0);
        assert_eq!(s.position(b).x, 200.0);
        assert_eq!(s.width(c), 300.0);
    }

    #[test]
    fn grid_wraps_into_rows() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Grid(GridLayout::new())));
        s.set(c, keys::WIDTH, Length::Px(150.0));
        let cells: Vec<NodeId> = [40.0, 60.0, 40.0, 60.0]
            .into_iter()
            .map(|w| rect(&mut s, c, w, 10.0))
            .collect();
        s.flush();
        assert_eq!(s.position(cells[0]), Point::new(0.0, 0.0));
        assert_eq!(s.position(cells[1]), Point::new(40.0, 0.0));
        assert_eq!(s.position(cells[2]), Point::new(0.0, 10.0));
        assert_eq!(s.position(cells[3]), Point::new(40.0, 10.0));
        assert_eq!(s.height(c), 20.0);
    }

    #[test]
    fn setting_same_value_is_idempotent() {
        let mut s = scene();
        let root = s.root();
        let r = rect(&mut s, root, 10.0, 10.0);
        s.set(r, keys::X, Length::Px(10.0));
        let first = s.flush();
        assert!(first.positions.contains(&r.index()));

        s.set(r, keys::X, Length::Px(10.0));
        assert!(!s.is_scheduled());
        let second = s.flush();
        assert!(second.is_empty(), "{second:?}");
        assert_eq!(s.position(r), Point::new(10.0, 0.0));
    }

    #[test]
    fn every_key_is_clean_after_flush() {
        let mut s = scene();
        let root = s.root();
        let r = rect(&mut s, root, 10.0, 10.0);
        s.set(r, keys::OPACITY, 0.5);
        s.flush();
        assert!(!s.is_dirty(r, keys::OPACITY));
        assert!(!s.is_dirty(r, keys::WIDTH));
        assert!(!s.is_private_dirty(r, keys::private::X));
        assert_eq!(s.previous(r, keys::OPACITY), Some(&0.5));
        let display = s.display(r).expect("live node");
        assert_eq!(s.backend().display(display).expect("display").alpha, 0.5);
    }

    #[test]
    fn dispose_runs_children_in_reverse() {
        let mut s = scene();
        let c = container(&mut s, None);
        let kids: Vec<NodeId> = (0..3).map(|_| rect(&mut s, c, 1.0, 1.0)).collect();
        let displays: Vec<_> = kids.iter().map(|&k| s.display(k).expect("live")).collect();
        s.flush();
        s.dispose(c);
        assert_eq!(&s.backend().disposed()[..3], &[displays[2], displays[1], displays[0]]);
        let changes = s.flush();
        assert_eq!(changes.removed.len(), 4);
        assert!(changes.topology_changed);
        for k in kids {
            assert!(!s.is_alive(k));
        }
    }

    #[test]
    fn hidden_children_leave_bounds_and_report() {
        let mut s = scene();
        let c = container(&mut s, None);
        rect(&mut s, c, 20.0, 20.0);
        let wide = rect(&mut s, c, 100.0, 10.0);
        s.flush();
        assert_eq!(s.width(c), 100.0);

        s.set(wide, keys::VISIBLE, false);
        let changes = s.flush();
        assert_eq!(s.width(c), 20.0);
        assert_eq!(s.local_bounds(wide), Rect::ZERO);
        assert_eq!(changes.hidden, &[wide.index()]);

        s.set(wide, keys::VISIBLE, true);
        let changes = s.flush();
        assert_eq!(s.width(c), 100.0);
        assert_eq!(changes.unhidden, &[wide.index()]);
    }

    #[test]
    fn visibility_round_trip_reports_nothing() {
        let mut s = scene();
        let root = s.root();
        let r = rect(&mut s, root, 5.0, 5.0);
        s.flush();
        s.set(r, keys::FORCE_HIDDEN, true);
        s.set(r, keys::FORCE_HIDDEN, false);
        let changes = s.flush();
        assert!(changes.hidden.is_empty() && changes.unhidden.is_empty());
    }

    #[test]
    fn runaway_layout_stops_at_pass_limit() {
        let mut s = scene();
        let c = container(&mut s, None);
        rect(&mut s, c, 10.0, 10.0);
        let grows = s.create(NodeKind::Rectangle);
        s.set(grows, keys::WIDTH, Length::Percent(percent(200.0)));
        s.set(grows, keys::HEIGHT, Length::Px(10.0));
        s.children_mut(c).push(grows);

        let changes = s.flush();
        assert_eq!(changes.settle_passes, MAX_SETTLE_PASSES);
        assert!(s.is_scheduled());
        let changes = s.flush();
        assert!(changes.settle_passes >= 1);
    }

    #[test]
    fn bounds_events_follow_flush() {
        let mut s = scene();
        let root = s.root();
        let r = rect(&mut s, root, 10.0, 10.0);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        s.on(r, EventKind::BoundsChanged, move |_| {
            counter.set(counter.get() + 1);
            Propagation::Continue
        });
        s.flush();
        assert_eq!(hits.get(), 1);
        s.flush();
        assert_eq!(hits.get(), 1);
        s.set(r, keys::WIDTH, Length::Px(12.0));
        s.flush();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn layout_removal_releases_children() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Horizontal));
        rect(&mut s, c, 30.0, 10.0);
        let b = rect(&mut s, c, 30.0, 10.0);
        s.flush();
        assert_eq!(s.position(b).x, 30.0);
        s.remove(c, keys::LAYOUT);
        s.flush();
        assert_eq!(s.position(b).x, 0.0);
        assert_eq!(s.width(c), 30.0);
    }

    #[test]
    fn percent_shares_fill_the_container() {
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        for _ in 0..20 {
            let mut s = scene();
            let c = container(&mut s, Some(Layout::Horizontal));
            let width = 100.0 + rng.below(400) as f64;
            s.set(c, keys::WIDTH, Length::Px(width));
            let n = 1 + rng.below(5);
            let kids: Vec<NodeId> = (0..n)
                .map(|_| {
                    let k = s.create(NodeKind::Rectangle);
                    let pc = 1.0 + rng.below(99) as f64;
                    s.set(k, keys::WIDTH, Length::Percent(percent(pc)));
                    s.set(k, keys::HEIGHT, Length::Px(5.0));
                    s.children_mut(c).push(k);
                    k
                })
                .collect();
            s.flush();
            let total: f64 = kids.iter().map(|&k| s.width(k)).sum();
            assert!((total - width).abs() < 1e-6, "{total} != {width}");
        }
    }

    #[test]
    fn mixed_clamped_children_stay_inside_the_container() {
        let mut rng = Rng(0x2545_f491_4f6c_dd1d);
        for _ in 0..40 {
            let mut s = scene();
            let c = container(&mut s, Some(Layout::Horizontal));
            let width = 200.0 + rng.below(400) as f64;
            let pad = rng.below(10) as f64;
            s.set(c, keys::WIDTH, Length::Px(width));
            s.set(c, keys::PADDING_LEFT, pad);
            s.set(c, keys::PADDING_RIGHT, pad);
            let inner = width - 2.0 * pad;

            let mut kids = Vec::new();
            let mut floor = 0.0;
            let mut left = 100;
            for _ in 0..2 + rng.below(5) {
                if rng.below(3) == 0 {
                    let w = 1.0 + rng.below(40) as f64;
                    floor += w;
                    kids.push(rect(&mut s, c, w, 5.0));
                    continue;
                }
                if left == 0 {
                    continue;
                }
                let pc = 1 + rng.below(left);
                left -= pc;
                let k = s.create(NodeKind::Rectangle);
                s.set(k, keys::WIDTH, Length::Percent(percent(pc as f64)));
                s.set(k, keys::HEIGHT, Length::Px(5.0));
                let min = rng.below(60) as f64;
                if rng.below(2) == 0 {
                    s.set(k, keys::MIN_WIDTH, min);
                    floor += min;
                }
                if rng.below(2) == 0 {
                    s.set(k, keys::MAX_WIDTH, min + rng.below(150) as f64);
                }
                s.children_mut(c).push(k);
                kids.push(k);
            }
            s.flush();

            let total: f64 = kids.iter().map(|&k| s.width(k)).sum();
            if floor < inner {
                assert!(total <= inner + 1e-6, "{total} overflows {inner}");
                if let Some(&last) = kids.last() {
                    let end = s.position(last).x + s.width(last);
                    assert!(end <= width - pad + 1e-6, "{end} past {width} - {pad}");
                }
            }
        }
    }

    #[test]
    fn explicit_width_replaces_percent_share() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Horizontal));
        s.set(c, keys::WIDTH, Length::Px(300.0));
        let a = s.create(NodeKind::Rectangle);
        s.set(a, keys::WIDTH, Length::Percent(percent(50.0)));
        s.set(a, keys::HEIGHT, Length::Px(10.0));
        s.children_mut(c).push(a);
        let b = rect(&mut s, c, 20.0, 10.0);
        s.flush();
        assert_eq!(s.width(a), 280.0);

        s.set(a, keys::WIDTH, Length::Px(30.0));
        s.flush();
        assert_eq!(s.width(a), 30.0);
        assert_eq!(s.local_bounds(a).width(), 30.0);
        assert_eq!(s.position(b).x, 30.0);
    }

    #[test]
    fn absolute_child_leaves_its_layout_slot() {
        let mut s = scene();
        let c = container(&mut s, Some(Layout::Horizontal));
        let a = rect(&mut s, c, 50.0, 10.0);
        let b = rect(&mut s, c, 50.0, 10.0);
        s.flush();
        assert_eq!(s.position(b).x, 50.0);

        s.set(b, keys::POSITION, Position::Absolute);
        s.set(b, keys::X, Length::Px(5.0));
        s.flush();
        assert_eq!(s.position(b).x, 5.0);
        assert_eq!(s.position(a).x, 0.0);

        s.set(b, keys::POSITION, Position::Relative);
        s.flush();
        assert_eq!(s.position(b).x, 50.0);
    }

    #[test]
    fn container_bounds_ignore_insertion_order() {
        let spots = [(0.0, 0.0, 10.0), (40.0, 5.0, 20.0), (-5.0, 30.0, 15.0)];
        let mut expected = None;
        for order in permutations(spots.len()) {
            let mut s = scene();
            let c = container(&mut s, None);
            for &i in &order {
                let (x, y, size) = spots[i];
                let r = rect(&mut s, c, size, size);
                s.set(r, keys::X, Length::Px(x));
                s.set(r, keys::Y, Length::Px(y));
            }
            s.flush();
            let bounds = s.local_bounds(c);
            assert_eq!(*expected.get_or_insert(bounds), bounds, "order {order:?}");
        }
        assert_eq!(expected, Some(Rect::new(-5.0, 0.0, 60.0, 45.0)));
    }

    #[test]
    fn random_reparenting_keeps_single_ownership() {
        let mut rng = Rng(0xdead_beef_cafe_f00d);
        let mut s = scene();
        let root = s.root();
        let parents: Vec<NodeId> = (0..4).map(|_| container(&mut s, None)).collect();
        let leaves: Vec<NodeId> = (0..8).map(|_| rect(&mut s, root, 5.0, 5.0)).collect();
        for _ in 0..200 {
            let leaf = leaves[rng.below(leaves.len() as u64) as usize];
            let parent = parents[rng.below(parents.len() as u64) as usize];
            match rng.below(3) {
                0 => s.children_mut(parent).push(leaf),
                1 => s.children_mut(parent).insert(0, leaf),
                _ => {
                    s.children_mut(parent).remove(leaf);
                }
            }
        }
        s.flush();
        for &leaf in &leaves {
            let owners = parents
                .iter()
                .chain([&root])
                .filter(|&&p| s.children(p).contains(leaf))
                .count();
            assert!(owners <= 1, "leaf owned {owners} times");
            assert_eq!(owners == 1, s.parent(leaf).is_some());
        }
    }
}

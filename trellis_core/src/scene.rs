// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, settings access, and
//! disposal.

use alloc::vec::Vec;

use kurbo::{Affine, Point, Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::animation::Animations;
use crate::backend::{Backend, DisplayId, DisplayKind};
use crate::dirty;
use crate::event::Listener;
use crate::interaction::PointerState;
use crate::node::{Attachment, INVALID, NodeId, NodeKind};
use crate::settings::{Key, KeyId, Length, Settings, SettingValue, Value, keys, percent};
use crate::trace::{DisposeEvent, Tracer};

/// The scene graph.
///
/// Owns every node, the backend that mirrors them, and the dirty state that
/// drives [`flush`](Self::flush). Nodes are addressed by [`NodeId`] handles;
/// internally each node occupies a slot in parallel arrays. Disposed slots
/// are recycled, and generation counters make old handles inert: every
/// operation on a disposed node is a no-op and every getter returns its
/// fallback.
///
/// A root container sized to 100% of the [viewport](Self::set_viewport) is
/// created with the scene.
pub struct Scene<B: Backend> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) attachment: Vec<Attachment>,
    pub(crate) children: Vec<Vec<u32>>,
    pub(crate) background: Vec<u32>,
    pub(crate) mask: Vec<u32>,
    pub(crate) content_mask: Vec<u32>,

    // -- Identity --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) display: Vec<DisplayId>,
    pub(crate) group: Vec<Option<DisplayId>>,

    // -- Settings --
    pub(crate) settings: Vec<Settings>,
    pub(crate) private: Vec<Settings>,

    // -- Computed geometry (written by flush) --
    pub(crate) local_bounds: Vec<Rect>,
    pub(crate) adjusted_bounds: Vec<Rect>,
    pub(crate) content_size: Vec<Size>,
    pub(crate) position: Vec<Point>,
    pub(crate) local_transform: Vec<Affine>,
    pub(crate) world_transform: Vec<Affine>,
    pub(crate) shown: Vec<bool>,

    // -- Events --
    pub(crate) listeners: Vec<Vec<Listener>>,
    pub(crate) next_listener: u64,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) touched: Vec<u32>,
    pub(crate) deferred: Vec<u32>,
    pub(crate) scheduled: bool,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
    pub(crate) pending_visibility: Vec<u32>,
    pub(crate) topology_dirty: bool,

    pub(crate) root: NodeId,
    pub(crate) viewport: Size,
    pub(crate) frame_index: u64,
    pub(crate) pointer: PointerState,
    pub(crate) animations: Animations,
    pub(crate) backend: B,
}

impl<B: Backend> core::fmt::Debug for Scene<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("root", &self.root)
            .field("viewport", &self.viewport)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Scene<B> {
    /// Creates a scene with an empty root container.
    pub fn new(backend: B) -> Self {
        let mut scene = Self {
            parent: Vec::new(),
            attachment: Vec::new(),
            children: Vec::new(),
            background: Vec::new(),
            mask: Vec::new(),
            content_mask: Vec::new(),
            kind: Vec::new(),
            display: Vec::new(),
            group: Vec::new(),
            settings: Vec::new(),
            private: Vec::new(),
            local_bounds: Vec::new(),
            adjusted_bounds: Vec::new(),
            content_size: Vec::new(),
            position: Vec::new(),
            local_transform: Vec::new(),
            world_transform: Vec::new(),
            shown: Vec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            touched: Vec::new(),
            deferred: Vec::new(),
            scheduled: false,
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_visibility: Vec::new(),
            topology_dirty: true,
            root: NodeId {
                idx: INVALID,
                generation: 0,
            },
            viewport: Size::ZERO,
            frame_index: 0,
            pointer: PointerState::default(),
            animations: Animations::default(),
            backend,
        };
        let root = scene.create(NodeKind::Container);
        scene.set(root, keys::WIDTH, Length::Percent(percent(100.0)));
        scene.set(root, keys::HEIGHT, Length::Percent(percent(100.0)));
        scene.root = root;
        scene
    }

    /// Returns the root container.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the size root-level percent values resolve against.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Sets the size root-level percent values resolve against.
    pub fn set_viewport(&mut self, size: Size) {
        if self.viewport == size {
            return;
        }
        self.viewport = size;
        for idx in 0..self.len {
            if self.alive[idx as usize] && self.parent[idx as usize] == INVALID {
                self.mark_bounds(idx);
            }
        }
    }

    /// Returns the backend.
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the backend mutably.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Returns whether any node needs a [`flush`](Self::flush).
    #[inline]
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Returns the number of completed flushes.
    #[inline]
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // -- Allocation API --

    /// Creates a detached node and returns its handle.
    ///
    /// The node is measured and positioned by the next flush. Containers get
    /// a children group inside their display.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let display = self.backend.create(kind.display_kind());
        let group = if kind.is_container() {
            let group = self.backend.create(DisplayKind::Group);
            self.backend.insert_child(display, group, 0);
            Some(group)
        } else {
            None
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.attachment[i] = Attachment::Detached;
            self.children[i].clear();
            self.background[i] = INVALID;
            self.mask[i] = INVALID;
            self.content_mask[i] = INVALID;
            self.kind[i] = kind;
            self.display[i] = display;
            self.group[i] = group;
            self.settings[i] = Settings::new();
            self.private[i] = Settings::new();
            self.local_bounds[i] = Rect::ZERO;
            self.adjusted_bounds[i] = Rect::ZERO;
            self.content_size[i] = Size::ZERO;
            self.position[i] = Point::ZERO;
            self.local_transform[i] = Affine::IDENTITY;
            self.world_transform[i] = Affine::IDENTITY;
            self.shown[i] = true;
            self.listeners[i].clear();
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.attachment.push(Attachment::Detached);
            self.children.push(Vec::new());
            self.background.push(INVALID);
            self.mask.push(INVALID);
            self.content_mask.push(INVALID);
            self.kind.push(kind);
            self.display.push(display);
            self.group.push(group);
            self.settings.push(Settings::new());
            self.private.push(Settings::new());
            self.local_bounds.push(Rect::ZERO);
            self.adjusted_bounds.push(Rect::ZERO);
            self.content_size.push(Size::ZERO);
            self.position.push(Point::ZERO);
            self.local_transform.push(Affine::IDENTITY);
            self.world_transform.push(Affine::IDENTITY);
            self.shown.push(true);
            self.listeners.push(Vec::new());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.pending_added.push(idx);
        self.topology_dirty = true;
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.dirty.mark(idx, dirty::BOUNDS);
        self.dirty.mark(idx, dirty::PAINT);
        self.mark_position(idx);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Disposes a node and everything it owns.
    ///
    /// Detaches the node from its parent, disposes its children in reverse
    /// insertion order, then its background, mask and content mask. Running
    /// animations are cancelled, listeners dropped, and backend displays
    /// released. Disposing a stale handle or the root is a no-op.
    ///
    /// Returns whether anything was disposed.
    pub fn dispose(&mut self, id: NodeId) -> bool {
        self.dispose_with(id, &mut Tracer::none())
    }

    /// Like [`dispose`](Self::dispose), reporting to a [`Tracer`].
    pub fn dispose_with(&mut self, id: NodeId, tracer: &mut Tracer<'_>) -> bool {
        if !self.is_alive(id) || id == self.root {
            return false;
        }
        let count = self.dispose_idx(id.idx);
        tracer.dispose(&DisposeEvent {
            node_index: id.idx,
            disposed: count,
        });
        true
    }

    fn dispose_idx(&mut self, idx: u32) -> u32 {
        let i = idx as usize;
        // Mark first so re-entrant paths (a child detaching) see a dead parent.
        self.alive[i] = false;
        self.detach_from_parent(idx);

        let mut count = 1;
        let children = core::mem::take(&mut self.children[i]);
        for &child in children.iter().rev() {
            self.parent[child as usize] = INVALID;
            self.attachment[child as usize] = Attachment::Detached;
            count += self.dispose_idx(child);
        }
        for owned in [self.background[i], self.mask[i], self.content_mask[i]] {
            if owned != INVALID && self.alive[owned as usize] {
                self.parent[owned as usize] = INVALID;
                self.attachment[owned as usize] = Attachment::Detached;
                count += self.dispose_idx(owned);
            }
        }
        self.background[i] = INVALID;
        self.mask[i] = INVALID;
        self.content_mask[i] = INVALID;

        let id = NodeId {
            idx,
            generation: self.generation[i],
        };
        self.animations.cancel_node(id);
        self.pointer.forget(idx);
        self.listeners[i].clear();

        if let Some(group) = self.group[i].take() {
            self.backend.dispose(group);
        }
        self.backend.dispose(self.display[i]);

        self.dirty.remove_key(idx);
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.topology_dirty = true;
        self.scheduled = true;
        count
    }

    /// Returns whether the handle refers to a live node.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the handle of the live node in slot `idx`.
    #[must_use]
    pub fn node_at(&self, idx: u32) -> Option<NodeId> {
        (idx < self.len && self.alive[idx as usize]).then(|| NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count()
    }

    // -- Settings API --

    /// Sets a public setting.
    ///
    /// If `value` differs from the current value, the key becomes dirty and
    /// the node is scheduled for the next flush. Writing the current value is
    /// a no-op.
    pub fn set<T: SettingValue>(&mut self, id: NodeId, key: Key<T>, value: T) {
        if self.is_alive(id) {
            self.write_public(id.idx, key.id(), Some(value.into_value()));
        }
    }

    /// Unsets a public setting.
    pub fn remove<T>(&mut self, id: NodeId, key: Key<T>) {
        if self.is_alive(id) {
            self.write_public(id.idx, key.id(), None);
        }
    }

    /// Stages a public setting to be written at the start of the next flush.
    ///
    /// Several staged writes to the same key coalesce; only the last one is
    /// compared against the current value.
    pub fn set_deferred<T: SettingValue>(&mut self, id: NodeId, key: Key<T>, value: T) {
        if !self.is_alive(id) {
            return;
        }
        let i = id.idx as usize;
        if !self.settings[i].has_deferred() {
            self.deferred.push(id.idx);
        }
        self.settings[i].defer(key.id(), Some(value.into_value()));
        self.scheduled = true;
    }

    /// Returns a public setting.
    #[must_use]
    pub fn get<T: SettingValue>(&self, id: NodeId, key: Key<T>) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        self.settings[id.idx as usize].get(key)
    }

    /// Returns a public setting, or `fallback` when unset or disposed.
    #[must_use]
    pub fn get_or<T: SettingValue + Copy>(&self, id: NodeId, key: Key<T>, fallback: T) -> T {
        self.get(id, key).copied().unwrap_or(fallback)
    }

    /// Returns whether a public setting changed since the last flush.
    #[must_use]
    pub fn is_dirty<T>(&self, id: NodeId, key: Key<T>) -> bool {
        self.is_alive(id) && self.settings[id.idx as usize].is_dirty(key)
    }

    /// Returns the value a public setting had at the last flush.
    #[must_use]
    pub fn previous<T: SettingValue>(&self, id: NodeId, key: Key<T>) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        self.settings[id.idx as usize].previous(key)
    }

    /// Sets a private setting.
    ///
    /// Private values are engine-owned overrides (layout results, tooltip
    /// visibility) and take effect without running the changed phase.
    pub fn set_private<T: SettingValue>(&mut self, id: NodeId, key: Key<T>, value: T) {
        if self.is_alive(id) {
            self.write_private(id.idx, key.id(), Some(value.into_value()));
        }
    }

    /// Unsets a private setting.
    pub fn remove_private<T>(&mut self, id: NodeId, key: Key<T>) {
        if self.is_alive(id) {
            self.write_private(id.idx, key.id(), None);
        }
    }

    /// Returns a private setting.
    #[must_use]
    pub fn get_private<T: SettingValue>(&self, id: NodeId, key: Key<T>) -> Option<&T> {
        if !self.is_alive(id) {
            return None;
        }
        self.private[id.idx as usize].get(key)
    }

    /// Returns whether a private setting changed since the last flush.
    #[must_use]
    pub fn is_private_dirty<T>(&self, id: NodeId, key: Key<T>) -> bool {
        self.is_alive(id) && self.private[id.idx as usize].is_dirty(key)
    }

    pub(crate) fn write_public(&mut self, idx: u32, key: KeyId, value: Option<Value>) {
        let i = idx as usize;
        let was_touched = self.is_touched(idx);
        if !self.settings[i].write(key, value).is_changed() {
            return;
        }
        if !was_touched {
            self.touched.push(idx);
        }
        self.dirty.mark(idx, dirty::SETTINGS);
        self.scheduled = true;
    }

    pub(crate) fn write_private(&mut self, idx: u32, key: KeyId, value: Option<Value>) {
        let i = idx as usize;
        let was_touched = self.is_touched(idx);
        if !self.private[i].write(key, value).is_changed() {
            return;
        }
        if !was_touched {
            self.touched.push(idx);
        }
        match key {
            KeyId::X | KeyId::Y => self.mark_position(idx),
            KeyId::Visible => {
                self.sync_visibility(idx);
                self.mark_bounds(idx);
            }
            _ => self.mark_bounds(idx),
        }
    }

    fn is_touched(&self, idx: u32) -> bool {
        let i = idx as usize;
        self.settings[i].is_touched() || self.private[i].is_touched()
    }

    // -- Dirty marking --

    /// Marks a node's bounds dirty, walking up through parents whose size
    /// depends on their children.
    pub(crate) fn mark_bounds(&mut self, idx: u32) {
        let mut i = idx;
        loop {
            self.dirty.mark(i, dirty::BOUNDS);
            let p = self.parent[i as usize];
            if p == INVALID
                || self.attachment[i as usize] != Attachment::Child
                || !self.is_relative(i)
                || !self.sizes_to_content(p)
            {
                break;
            }
            i = p;
        }
        self.scheduled = true;
    }

    /// Marks a node and its subtree for position and transform resolution.
    pub(crate) fn mark_position(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::POSITION, &EagerPolicy);
        self.scheduled = true;
    }

    pub(crate) fn mark_paint(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::PAINT);
        self.scheduled = true;
    }

    // -- Typed lookups used across the engine --

    #[inline]
    pub(crate) fn public_or<T: SettingValue + Copy>(&self, idx: u32, key: Key<T>, fallback: T) -> T {
        self.settings[idx as usize].get_or(key, fallback)
    }

    #[inline]
    pub(crate) fn private_of<T: SettingValue + Copy>(&self, idx: u32, key: Key<T>) -> Option<T> {
        self.private[idx as usize].get(key).copied()
    }

    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn live_idx(&self, id: Option<NodeId>) -> Option<u32> {
        id.filter(|&id| self.is_alive(id)).map(|id| id.idx)
    }

    /// Returns the depth of a node below its topmost ancestor.
    pub(crate) fn depth(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut p = self.parent[idx as usize];
        while p != INVALID {
            depth += 1;
            p = self.parent[p as usize];
        }
        depth
    }

    // -- Topology getters --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.is_alive(id).then(|| self.kind[id.idx as usize])
    }

    /// Returns the node this one is attached to, whether as a child, a
    /// background, or a mask.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns how a node is attached to its parent.
    #[must_use]
    pub fn attachment(&self, id: NodeId) -> Attachment {
        if self.is_alive(id) {
            self.attachment[id.idx as usize]
        } else {
            Attachment::Detached
        }
    }

    /// Returns a container's background node.
    #[must_use]
    pub fn background(&self, id: NodeId) -> Option<NodeId> {
        self.owned(id, |s| &s.background)
    }

    /// Returns the node clipping a container's children, if any.
    ///
    /// This is the user mask when set, else the content mask when
    /// `mask_content` is on.
    #[must_use]
    pub fn clip_mask(&self, id: NodeId) -> Option<NodeId> {
        self.owned(id, |s| &s.mask)
            .or_else(|| self.owned(id, |s| &s.content_mask))
    }

    fn owned(&self, id: NodeId, field: impl Fn(&Self) -> &Vec<u32>) -> Option<NodeId> {
        if !self.is_alive(id) {
            return None;
        }
        let idx = field(self)[id.idx as usize];
        (idx != INVALID).then(|| self.handle(idx))
    }

    /// Returns whether `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) || !self.is_alive(node) {
            return false;
        }
        let mut i = node.idx;
        loop {
            if i == ancestor.idx {
                return true;
            }
            i = self.parent[i as usize];
            if i == INVALID {
                return false;
            }
        }
    }

    /// Returns the backend display of a node.
    #[must_use]
    pub fn display(&self, id: NodeId) -> Option<DisplayId> {
        self.is_alive(id).then(|| self.display[id.idx as usize])
    }

    /// Returns the backend display holding a container's children.
    #[must_use]
    pub fn children_display(&self, id: NodeId) -> Option<DisplayId> {
        if !self.is_alive(id) {
            return None;
        }
        self.group[id.idx as usize]
    }

    // -- Computed geometry getters --

    /// Returns the measured, clamped local bounds (before the node's own
    /// rotation and scale).
    #[must_use]
    pub fn local_bounds(&self, id: NodeId) -> Rect {
        self.computed(id, |s, i| s.local_bounds[i], Rect::ZERO)
    }

    /// Returns the local bounds adjusted by the backend and transformed by
    /// the node's own rotation, scale and pivot.
    #[must_use]
    pub fn adjusted_local_bounds(&self, id: NodeId) -> Rect {
        self.computed(id, |s, i| s.adjusted_bounds[i], Rect::ZERO)
    }

    /// Returns the bounds in scene coordinates.
    #[must_use]
    pub fn global_bounds(&self, id: NodeId) -> Rect {
        self.computed(
            id,
            |s, i| s.world_transform[i].transform_rect_bbox(s.local_bounds[i]),
            Rect::ZERO,
        )
    }

    /// Returns the resolved position in the parent's coordinate space.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Point {
        self.computed(id, |s, i| s.position[i], Point::ZERO)
    }

    /// Returns the transform from local to parent coordinates.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> Affine {
        self.computed(id, |s, i| s.local_transform[i], Affine::IDENTITY)
    }

    /// Returns the transform from local to scene coordinates.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.computed(id, |s, i| s.world_transform[i], Affine::IDENTITY)
    }

    /// Returns the width of the children's union, before padding.
    #[must_use]
    pub fn content_width(&self, id: NodeId) -> f64 {
        self.computed(id, |s, i| s.content_size[i].width, 0.0)
    }

    /// Returns the height of the children's union, before padding.
    #[must_use]
    pub fn content_height(&self, id: NodeId) -> f64 {
        self.computed(id, |s, i| s.content_size[i].height, 0.0)
    }

    /// Converts a point from node-local to scene coordinates.
    #[must_use]
    pub fn to_global(&self, id: NodeId, point: Point) -> Point {
        self.world_transform(id) * point
    }

    /// Converts a point from scene to node-local coordinates.
    #[must_use]
    pub fn to_local(&self, id: NodeId, point: Point) -> Point {
        self.world_transform(id).inverse() * point
    }

    fn computed<T>(&self, id: NodeId, f: impl Fn(&Self, usize) -> T, fallback: T) -> T {
        if self.is_alive(id) {
            f(self, id.idx as usize)
        } else {
            fallback
        }
    }
}

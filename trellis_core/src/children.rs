// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered children of a container.
//!
//! [`Children`] is a read-only view and [`ChildrenMut`] the mutable one.
//! Every mutation keeps the scene and the backend in step:
//!
//! - **Insert**: the child is first detached from wherever it was attached
//!   (another container, or a background or mask slot), so a node has at
//!   most one parent. Its display is inserted into the container's children
//!   group at the same index.
//! - **Remove**: the child's display leaves the group. The node stays alive.
//! - **Move**: reorders the list and the group.
//!
//! Each mutation marks the container's bounds dirty and the child's position
//! dirty, so the next flush re-lays them out.

use core::fmt;

use crate::backend::Backend;
use crate::dirty;
use crate::node::{Attachment, INVALID, NodeId};
use crate::scene::Scene;
use crate::settings::{KeyId, keys};

/// Read-only view of a container's children.
pub struct Children<'a, B: Backend> {
    scene: &'a Scene<B>,
    container: NodeId,
}

impl<B: Backend> fmt::Debug for Children<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, B: Backend> Children<'a, B> {
    fn slots(&self) -> &'a [u32] {
        if self.scene.is_alive(self.container) {
            &self.scene.children[self.container.idx as usize]
        } else {
            &[]
        }
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    /// Whether there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Child at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.slots().get(index).map(|&c| self.scene.handle(c))
    }

    /// Position of `child` in the list.
    #[must_use]
    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        if !self.scene.is_alive(child) {
            return None;
        }
        self.slots().iter().position(|&c| c == child.idx)
    }

    /// Whether `child` is in the list.
    #[must_use]
    pub fn contains(&self, child: NodeId) -> bool {
        self.index_of(child).is_some()
    }

    /// Children in paint order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + use<'a, B> {
        let scene = self.scene;
        self.slots().iter().map(move |&c| scene.handle(c))
    }
}

/// Mutable view of a container's children.
///
/// Operations on a disposed container, or with a disposed child, do nothing.
pub struct ChildrenMut<'a, B: Backend> {
    scene: &'a mut Scene<B>,
    container: NodeId,
}

impl<B: Backend> fmt::Debug for ChildrenMut<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildrenMut")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl<B: Backend> ChildrenMut<'_, B> {
    fn live(&self, child: NodeId) -> bool {
        self.scene.is_alive(self.container) && self.scene.is_alive(child)
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scene.children(self.container).len()
    }

    /// Whether there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `child`, detaching it from its previous parent.
    ///
    /// # Panics
    ///
    /// Panics if the container is not a [`Container`](crate::NodeKind::Container)
    /// or if `child` is the container or one of its ancestors.
    pub fn push(&mut self, child: NodeId) {
        let end = self.len();
        self.insert(end, child);
    }

    /// Inserts `child` at `index` (clamped to the length), detaching it from
    /// its previous parent. Inserting a current child moves it instead.
    ///
    /// # Panics
    ///
    /// Panics if the container is not a [`Container`](crate::NodeKind::Container)
    /// or if `child` is the container or one of its ancestors.
    pub fn insert(&mut self, index: usize, child: NodeId) {
        if !self.live(child) {
            return;
        }
        let s = &mut *self.scene;
        let (p, c) = (self.container.idx, child.idx);
        assert!(
            s.kind[p as usize].is_container(),
            "only containers have children"
        );
        assert!(
            !s.is_ancestor_or_self(child, self.container),
            "cannot add a node to its own descendant"
        );
        if s.parent[c as usize] == p && s.attachment[c as usize] == Attachment::Child {
            self.move_to(child, index);
            return;
        }

        s.detach_from_parent(c);
        assert_eq!(
            s.parent[c as usize], INVALID,
            "a node must be detached before it is inserted"
        );

        let list = &mut s.children[p as usize];
        let index = index.min(list.len());
        list.insert(index, c);
        s.parent[c as usize] = p;
        s.attachment[c as usize] = Attachment::Child;
        if let Some(group) = s.group[p as usize] {
            s.backend.insert_child(group, s.display[c as usize], index);
        }
        let _ = s.dirty.add_dependency(c, p, dirty::POSITION);
        s.children_changed(p, c);
    }

    /// Removes `child` from the list. Returns whether it was a child.
    ///
    /// The child is detached, not disposed.
    pub fn remove(&mut self, child: NodeId) -> bool {
        if !self.live(child) {
            return false;
        }
        let s = &mut *self.scene;
        if s.parent[child.idx as usize] != self.container.idx
            || s.attachment[child.idx as usize] != Attachment::Child
        {
            return false;
        }
        s.detach_from_parent(child.idx);
        true
    }

    /// Moves an existing child to `index` (clamped), or inserts it if it is
    /// not a child yet.
    pub fn move_to(&mut self, child: NodeId, index: usize) {
        if !self.live(child) {
            return;
        }
        let s = &mut *self.scene;
        let (p, c) = (self.container.idx, child.idx);
        let list = &mut s.children[p as usize];
        let Some(from) = list.iter().position(|&x| x == c) else {
            self.insert(index, child);
            return;
        };
        list.remove(from);
        let index = index.min(list.len());
        list.insert(index, c);
        if from == index {
            return;
        }
        if let Some(group) = s.group[p as usize] {
            let display = s.display[c as usize];
            s.backend.remove_child(group, display);
            s.backend.insert_child(group, display, index);
        }
        s.children_changed(p, c);
    }

    /// Detaches every child, last first.
    pub fn clear(&mut self) {
        if !self.scene.is_alive(self.container) {
            return;
        }
        let p = self.container.idx as usize;
        while let Some(&c) = self.scene.children[p].last() {
            self.scene.detach_from_parent(c);
        }
    }

    /// Disposes every child, last first.
    pub fn dispose_all(&mut self) {
        if !self.scene.is_alive(self.container) {
            return;
        }
        let p = self.container.idx as usize;
        while let Some(&c) = self.scene.children[p].last() {
            let child = self.scene.handle(c);
            self.scene.dispose(child);
        }
    }
}

impl<B: Backend> Scene<B> {
    /// Returns the children of a container (empty for other kinds).
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_, B> {
        Children {
            scene: self,
            container: id,
        }
    }

    /// Returns the mutable children of a container.
    pub fn children_mut(&mut self, id: NodeId) -> ChildrenMut<'_, B> {
        ChildrenMut {
            scene: self,
            container: id,
        }
    }

    fn children_changed(&mut self, container: u32, child: u32) {
        self.mark_position(child);
        if self.depends_on_parent_size(child) {
            self.mark_bounds(child);
        }
        self.mark_bounds(container);
        self.dirty.mark(container, dirty::TOPOLOGY);
        self.topology_dirty = true;
    }

    /// Detaches a node from whatever it is attached to.
    ///
    /// Clears the owning slot (children list, background, mask or content
    /// mask), removes the display from the backend parent, and drops the
    /// position dependency. A background or mask detached this way also
    /// clears the setting that named it, so the parent does not reattach it.
    pub(crate) fn detach_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i];
        if p == INVALID {
            return;
        }
        let pi = p as usize;
        let display = self.display[i];
        match self.attachment[i] {
            Attachment::Child => {
                self.children[pi].retain(|&c| c != idx);
                if let Some(group) = self.group[pi] {
                    self.backend.remove_child(group, display);
                }
                if self.alive[pi] {
                    self.mark_bounds(p);
                }
            }
            Attachment::Background => {
                self.background[pi] = INVALID;
                self.backend.remove_child(self.display[pi], display);
                self.forget_if_named(p, KeyId::Background, idx);
            }
            Attachment::Mask => {
                self.mask[pi] = INVALID;
                self.backend.remove_child(self.display[pi], display);
                self.forget_if_named(p, KeyId::Mask, idx);
                self.apply_clip(p);
            }
            Attachment::ContentMask => {
                self.content_mask[pi] = INVALID;
                self.backend.remove_child(self.display[pi], display);
                self.apply_clip(p);
            }
            Attachment::Detached => {}
        }
        self.dirty.remove_dependency(idx, p, dirty::POSITION);
        self.parent[i] = INVALID;
        self.attachment[i] = Attachment::Detached;
        self.dirty.mark(p, dirty::TOPOLOGY);
        self.topology_dirty = true;
        self.mark_position(idx);
        if self.depends_on_parent_size(idx) {
            self.dirty.mark(idx, dirty::BOUNDS);
        }
        self.release_assigned(idx);
    }

    fn forget_if_named(&mut self, owner: u32, key: KeyId, idx: u32) {
        let named = match key {
            KeyId::Background => self.settings[owner as usize].get(keys::BACKGROUND),
            _ => self.settings[owner as usize].get(keys::MASK),
        };
        if named.is_some_and(|n| n.idx == idx) {
            self.forget_owned_setting(owner, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Attachment;
    use crate::settings::{Length, keys};
    use crate::{HeadlessBackend, NodeId, NodeKind, Scene};

    fn scene() -> Scene<HeadlessBackend> {
        Scene::new(HeadlessBackend::new())
    }

    fn ids(s: &Scene<HeadlessBackend>, c: NodeId) -> alloc::vec::Vec<NodeId> {
        s.children(c).iter().collect()
    }

    #[test]
    fn push_and_insert_order() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        let b = s.create(NodeKind::Rectangle);
        let d = s.create(NodeKind::Rectangle);
        s.children_mut(c).push(a);
        s.children_mut(c).push(b);
        s.children_mut(c).insert(1, d);
        assert_eq!(ids(&s, c), &[a, d, b]);
        assert_eq!(s.parent(d), Some(c));

        let group = s.children_display(c).expect("group");
        let displays: alloc::vec::Vec<_> =
            [a, d, b].iter().filter_map(|&n| s.display(n)).collect();
        assert_eq!(s.backend().children(group), displays.as_slice());
    }

    #[test]
    fn single_ownership() {
        let mut s = scene();
        let c1 = s.create(NodeKind::Container);
        let c2 = s.create(NodeKind::Container);
        let n = s.create(NodeKind::Rectangle);
        s.children_mut(c1).push(n);
        s.children_mut(c2).push(n);
        assert!(s.children(c1).is_empty());
        assert_eq!(ids(&s, c2), &[n]);
        assert_eq!(s.parent(n), Some(c2));

        let g1 = s.children_display(c1).expect("group");
        assert!(s.backend().children(g1).is_empty());
    }

    #[test]
    fn reinserting_moves() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        let b = s.create(NodeKind::Rectangle);
        s.children_mut(c).push(a);
        s.children_mut(c).push(b);
        s.children_mut(c).insert(0, b);
        assert_eq!(ids(&s, c), &[b, a]);
        s.children_mut(c).move_to(b, 10);
        assert_eq!(ids(&s, c), &[a, b]);
    }

    #[test]
    fn remove_detaches_without_disposing() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        s.children_mut(c).push(a);
        assert!(s.children_mut(c).remove(a));
        assert!(!s.children_mut(c).remove(a));
        assert!(s.is_alive(a));
        assert_eq!(s.parent(a), None);
        assert_eq!(s.attachment(a), Attachment::Detached);
    }

    #[test]
    fn clear_and_dispose_all() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        let b = s.create(NodeKind::Rectangle);
        s.children_mut(c).push(a);
        s.children_mut(c).push(b);
        s.children_mut(c).clear();
        assert!(s.children(c).is_empty());
        assert!(s.is_alive(a) && s.is_alive(b));

        s.children_mut(c).push(a);
        s.children_mut(c).push(b);
        s.children_mut(c).dispose_all();
        assert!(!s.is_alive(a) && !s.is_alive(b));
    }

    #[test]
    fn removal_shrinks_parent() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        s.set(a, keys::WIDTH, Length::Px(10.0));
        s.set(a, keys::HEIGHT, Length::Px(10.0));
        let b = s.create(NodeKind::Rectangle);
        s.set(b, keys::WIDTH, Length::Px(50.0));
        s.set(b, keys::HEIGHT, Length::Px(10.0));
        s.children_mut(c).push(a);
        s.children_mut(c).push(b);
        s.flush();
        assert_eq!(s.local_bounds(c).width(), 50.0);
        s.children_mut(c).remove(b);
        s.flush();
        assert_eq!(s.local_bounds(c).width(), 10.0);
    }

    #[test]
    fn adding_a_background_as_child_clears_the_slot() {
        let mut s = scene();
        let c1 = s.create(NodeKind::Container);
        let c2 = s.create(NodeKind::Container);
        let bg = s.create(NodeKind::Rectangle);
        s.set(c1, keys::BACKGROUND, bg);
        s.flush();
        s.children_mut(c2).push(bg);
        assert_eq!(s.background(c1), None);
        assert_eq!(s.get(c1, keys::BACKGROUND), None);
        assert_eq!(s.attachment(bg), Attachment::Child);
        s.flush();
        assert_eq!(s.background(c1), None);
    }

    #[test]
    fn stale_children_ops_are_ignored() {
        let mut s = scene();
        let c = s.create(NodeKind::Container);
        let a = s.create(NodeKind::Rectangle);
        s.dispose(a);
        s.children_mut(c).push(a);
        assert!(s.children(c).is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot add a node to its own descendant")]
    fn cycle_is_rejected() {
        let mut s = scene();
        let outer = s.create(NodeKind::Container);
        let inner = s.create(NodeKind::Container);
        s.children_mut(outer).push(inner);
        s.children_mut(inner).push(outer);
    }

    #[test]
    #[should_panic(expected = "only containers have children")]
    fn leaves_have_no_children() {
        let mut s = scene();
        let r = s.create(NodeKind::Rectangle);
        let other = s.create(NodeKind::Rectangle);
        s.children_mut(r).push(other);
    }
}

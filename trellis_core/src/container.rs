// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container bounds and owned nodes (background, mask, content mask).
//!
//! A container's bounds are the union of its visible, relatively positioned
//! children (each translated to its resolved position, and widened by its
//! margins along the layout axis), expanded by padding. Definite axes
//! replace the measured span with `[0, size]`.
//!
//! The background is stretched to the container's local bounds and drawn
//! below the children. A mask clips the children group; `mask_content`
//! creates an internal rectangle mask that tracks the bounds, used only when
//! no explicit mask is set.

use alloc::vec::Vec;

use kurbo::Rect;

use crate::backend::Backend;
use crate::dirty;
use crate::layout::Axis;
use crate::node::{Attachment, INVALID, NodeKind};
use crate::scene::Scene;
use crate::settings::{KeyId, Length, keys};
use crate::trace::{LayoutEvent, Tracer};

impl<B: Backend> Scene<B> {
    /// Whether the container's size depends on its children.
    pub(crate) fn sizes_to_content(&self, idx: u32) -> bool {
        self.kind[idx as usize].is_container()
            && (self.settings[idx as usize].get(keys::LAYOUT).is_some()
                || self.definite_size(idx, Axis::X).is_none()
                || self.definite_size(idx, Axis::Y).is_none())
    }

    /// Runs the layout (if any) and computes the container's local bounds.
    pub(crate) fn measure_container(
        &mut self,
        idx: u32,
        layouts: &mut Vec<u32>,
        tracer: &mut Tracer<'_>,
    ) -> Rect {
        let i = idx as usize;
        let layout = self.settings[i].get(keys::LAYOUT).copied();
        if let Some(layout) = layout {
            let arranged = layout.arrange(self, idx);
            layouts.push(idx);
            tracer.layout(&LayoutEvent {
                frame_index: self.frame_index,
                container: idx,
                strategy: layout.kind(),
                children: arranged,
            });
        }
        let margin_axis = layout.and_then(|l| l.axis());

        let mut union: Option<Rect> = None;
        for &c in &self.children[i] {
            if !self.visible_idx(c) || !self.is_relative(c) {
                continue;
            }
            let mut r = self.adjusted_bounds[c as usize] + self.resolve_position(c).to_vec2();
            if let Some(axis) = margin_axis {
                let (lead, trail) = self.margins(c, axis);
                r = axis.with_span(r, axis.start(r) - lead, axis.end(r) + trail);
            }
            union = Some(union.map_or(r, |u| u.union(r)));
        }

        let (pl, pr) = self.padding(idx, Axis::X);
        let (pt, pb) = self.padding(idx, Axis::Y);
        let content = union.unwrap_or(Rect::new(pl, pt, pl, pt));
        self.content_size[i] = content.size();

        let mut bounds = Rect::new(
            content.x0 - pl,
            content.y0 - pt,
            content.x1 + pr,
            content.y1 + pb,
        );
        for axis in Axis::BOTH {
            if let Some(size) = self.definite_size(idx, axis) {
                bounds = axis.with_span(bounds, 0.0, size);
            }
        }
        self.clamp_rect(idx, bounds)
    }

    /// Stretches the background and content mask over the local bounds.
    pub(crate) fn sync_owned(&mut self, idx: u32) {
        let i = idx as usize;
        let bounds = self.local_bounds[i];
        for owned in [self.background[i], self.content_mask[i]] {
            if owned != INVALID {
                self.cover(owned, bounds);
            }
        }
    }

    fn cover(&mut self, owned: u32, bounds: Rect) {
        self.set_private_px(owned, keys::private::X, bounds.x0);
        self.set_private_px(owned, keys::private::Y, bounds.y0);
        self.set_private_px(owned, keys::private::WIDTH, bounds.width());
        self.set_private_px(owned, keys::private::HEIGHT, bounds.height());
    }

    /// Attaches `owned` to `idx` outside the children list.
    fn attach_owned(&mut self, idx: u32, owned: u32, attachment: Attachment) {
        self.detach_from_parent(owned);
        let (i, o) = (idx as usize, owned as usize);
        self.parent[o] = idx;
        self.attachment[o] = attachment;
        // Masks come first, then the background, then the children group.
        let index = match attachment {
            Attachment::Mask | Attachment::ContentMask => 0,
            Attachment::Background => {
                usize::from(self.mask[i] != INVALID) + usize::from(self.content_mask[i] != INVALID)
            }
            _ => usize::MAX,
        };
        self.backend.insert_child(self.display[i], self.display[o], index);
        let _ = self.dirty.add_dependency(owned, idx, dirty::POSITION);
        self.mark_position(owned);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.topology_dirty = true;
    }

    /// Reconciles the `background` setting with the attached background.
    pub(crate) fn sync_background(&mut self, idx: u32) {
        let i = idx as usize;
        let wanted = self
            .live_idx(self.settings[i].get(keys::BACKGROUND).copied())
            .unwrap_or(INVALID);
        let current = self.background[i];
        if wanted == current {
            return;
        }
        if current != INVALID {
            self.detach_from_parent(current);
        }
        if wanted != INVALID {
            assert!(
                !self.is_ancestor_or_self(self.handle(wanted), self.handle(idx)),
                "a container cannot use its own ancestor as background"
            );
            self.attach_owned(idx, wanted, Attachment::Background);
            self.background[i] = wanted;
            self.cover(wanted, self.local_bounds[i]);
        }
    }

    /// Reconciles the `mask` setting with the attached mask.
    pub(crate) fn sync_mask(&mut self, idx: u32) {
        let i = idx as usize;
        let wanted = self
            .live_idx(self.settings[i].get(keys::MASK).copied())
            .unwrap_or(INVALID);
        let current = self.mask[i];
        if wanted == current {
            return;
        }
        if current != INVALID {
            self.detach_from_parent(current);
        }
        if wanted != INVALID {
            assert!(
                !self.is_ancestor_or_self(self.handle(wanted), self.handle(idx)),
                "a container cannot be masked by its own ancestor"
            );
            self.attach_owned(idx, wanted, Attachment::Mask);
            self.mask[i] = wanted;
        }
        self.apply_clip(idx);
    }

    /// Creates or disposes the internal content mask.
    pub(crate) fn sync_content_mask(&mut self, idx: u32) {
        let i = idx as usize;
        let wanted = self.public_or(idx, keys::MASK_CONTENT, false);
        let current = self.content_mask[i];
        if wanted && current == INVALID {
            let mask = self.create(NodeKind::Rectangle).idx;
            self.attach_owned(idx, mask, Attachment::ContentMask);
            self.content_mask[i] = mask;
            self.cover(mask, self.local_bounds[i]);
        } else if !wanted && current != INVALID {
            self.content_mask[i] = INVALID;
            self.parent[current as usize] = INVALID;
            self.attachment[current as usize] = Attachment::Detached;
            self.dispose(self.handle(current));
        }
        self.apply_clip(idx);
    }

    /// Points the children group's clip at the user mask, else the content
    /// mask, else nothing.
    pub(crate) fn apply_clip(&mut self, idx: u32) {
        let i = idx as usize;
        let Some(group) = self.group[i] else {
            return;
        };
        let clip = [self.mask[i], self.content_mask[i]]
            .into_iter()
            .find(|&m| m != INVALID)
            .map(|m| self.display[m as usize]);
        self.backend.set_mask(group, clip);
    }

    /// Drops a setting that names an owned node without scheduling work.
    pub(crate) fn forget_owned_setting(&mut self, idx: u32, key: KeyId) {
        if self.settings[idx as usize].raw(key).is_some() {
            let was_touched = self.settings[idx as usize].is_touched()
                || self.private[idx as usize].is_touched();
            let _ = self.settings[idx as usize].write(key, None);
            if !was_touched {
                self.touched.push(idx);
            }
        }
    }

    /// Whether a child's size is expressed relative to its parent.
    pub(crate) fn depends_on_parent_size(&self, idx: u32) -> bool {
        Axis::BOTH.into_iter().any(|axis| {
            matches!(
                self.settings[idx as usize].get(axis.size_key()),
                Some(Length::Percent(_))
            )
        })
    }
}

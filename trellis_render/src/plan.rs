// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};
use trellis_core::settings::keys;
use trellis_core::sprite::DEFAULT_FONT_SIZE;
use trellis_core::{Backend, Drawing, NodeId, NodeKind, Paint, Scene};

/// What a render item draws.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderContent {
    /// A path, in the node's local coordinates.
    Path(Drawing),
    /// A run of text at the node's origin.
    Text {
        /// The text.
        text: String,
        /// Font size in pixels.
        font_size: f64,
    },
}

/// A single draw command in the render plan.
///
/// Items are produced back to front: a container's background, then its
/// children in list order.
#[derive(Clone, Debug)]
pub struct RenderItem {
    /// The node this item originates from.
    pub node: NodeId,
    /// Local-to-scene transform.
    pub world_transform: Affine,
    /// Opacity multiplied down from every ancestor.
    pub opacity: f64,
    /// What to draw.
    pub content: RenderContent,
    /// Fill and stroke.
    pub paint: Paint,
    /// Scene-space clip from enclosing masks (their bounding boxes,
    /// intersected), if any.
    pub clip: Option<Rect>,
}

/// An ordered list of draw items for a single frame.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan for the scene's root tree as of its last flush.
    #[must_use]
    pub fn build<B: Backend>(scene: &Scene<B>) -> Self {
        let mut plan = Self::new();
        plan.rebuild(scene);
        plan
    }

    /// Like [`build`](Self::build), reusing this plan's buffer.
    pub fn rebuild<B: Backend>(&mut self, scene: &Scene<B>) {
        self.clear();
        visit(scene, scene.root(), 1.0, None, &mut self.items);
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether the plan draws nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn visit<B: Backend>(
    scene: &Scene<B>,
    id: NodeId,
    opacity: f64,
    clip: Option<Rect>,
    items: &mut Vec<RenderItem>,
) {
    if !scene.is_visible(id) {
        return;
    }
    let opacity = opacity * scene.get_or(id, keys::OPACITY, 1.0);
    let Some(kind) = scene.kind(id) else {
        return;
    };
    let content = match kind {
        NodeKind::Container => {
            if let Some(background) = scene.background(id) {
                visit(scene, background, opacity, clip, items);
            }
            let clip = match (clip, container_clip(scene, id)) {
                (Some(outer), Some(inner)) => Some(outer.intersect(inner)),
                (outer, inner) => inner.or(outer),
            };
            for child in scene.children(id).iter() {
                visit(scene, child, opacity, clip, items);
            }
            return;
        }
        NodeKind::Rectangle => RenderContent::Path(Drawing::rect(scene.local_bounds(id))),
        NodeKind::Graphics => {
            RenderContent::Path(scene.get(id, keys::DRAW).cloned().unwrap_or_default())
        }
        NodeKind::Label => RenderContent::Text {
            text: scene.get(id, keys::TEXT).cloned().unwrap_or_default(),
            font_size: scene.get_or(id, keys::FONT_SIZE, DEFAULT_FONT_SIZE),
        },
    };
    items.push(RenderItem {
        node: id,
        world_transform: scene.world_transform(id),
        opacity,
        content,
        paint: scene.paint(id),
        clip,
    });
}

/// The scene-space box a container clips its children to: its mask's
/// bounds, else its own bounds when `mask_content` is set.
fn container_clip<B: Backend>(scene: &Scene<B>, id: NodeId) -> Option<Rect> {
    if let Some(mask) = scene.clip_mask(id) {
        return Some(scene.global_bounds(mask));
    }
    scene
        .get_or(id, keys::MASK_CONTENT, false)
        .then(|| scene.global_bounds(id))
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use kurbo::{Point, Rect, Size};
    use trellis_core::settings::{Color, Length, keys};
    use trellis_core::{HeadlessBackend, NodeId, NodeKind, Scene};

    use super::{RenderContent, RenderPlan};

    fn scene() -> Scene<HeadlessBackend> {
        let mut s = Scene::new(HeadlessBackend::new());
        s.set_viewport(Size::new(200.0, 200.0));
        s
    }

    fn rect(s: &mut Scene<HeadlessBackend>, parent: NodeId, x: f64, size: f64) -> NodeId {
        let r = s.create(NodeKind::Rectangle);
        s.set(r, keys::X, Length::Px(x));
        s.set(r, keys::WIDTH, Length::Px(size));
        s.set(r, keys::HEIGHT, Length::Px(size));
        s.children_mut(parent).push(r);
        r
    }

    #[test]
    fn items_are_back_to_front() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.children_mut(root).push(c);
        let bg = s.create(NodeKind::Rectangle);
        s.set(c, keys::BACKGROUND, bg);
        let a = rect(&mut s, c, 0.0, 10.0);
        let b = rect(&mut s, c, 20.0, 10.0);
        s.flush();

        let plan = RenderPlan::build(&s);
        let order: alloc::vec::Vec<NodeId> = plan.items.iter().map(|i| i.node).collect();
        assert_eq!(order, &[bg, a, b]);
        let item = &plan.items[2];
        assert_eq!(item.world_transform * Point::ZERO, Point::new(20.0, 0.0));
        assert_eq!(
            item.content,
            RenderContent::Path(trellis_core::Drawing::rect(Rect::new(0.0, 0.0, 10.0, 10.0)))
        );
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.children_mut(root).push(c);
        rect(&mut s, c, 0.0, 10.0);
        let other = rect(&mut s, root, 0.0, 10.0);
        s.set(c, keys::VISIBLE, false);
        s.flush();
        let plan = RenderPlan::build(&s);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.items[0].node, other);
    }

    #[test]
    fn opacity_multiplies_down() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::OPACITY, 0.5);
        s.children_mut(root).push(c);
        let r = rect(&mut s, c, 0.0, 10.0);
        s.set(r, keys::OPACITY, 0.5);
        s.set(r, keys::FILL, Color::rgb(255, 0, 0));
        s.flush();
        let plan = RenderPlan::build(&s);
        assert_eq!(plan.items[0].opacity, 0.25);
        assert!(plan.items[0].paint.fill.is_some());
    }

    #[test]
    fn content_mask_clips_children() {
        let mut s = scene();
        let root = s.root();
        let c = s.create(NodeKind::Container);
        s.set(c, keys::X, Length::Px(5.0));
        s.set(c, keys::WIDTH, Length::Px(20.0));
        s.set(c, keys::HEIGHT, Length::Px(20.0));
        s.set(c, keys::MASK_CONTENT, true);
        s.children_mut(root).push(c);
        rect(&mut s, c, 0.0, 50.0);
        s.flush();
        let plan = RenderPlan::build(&s);
        assert_eq!(plan.len(), 1, "the internal mask is not drawn");
        assert_eq!(plan.items[0].clip, Some(Rect::new(5.0, 0.0, 25.0, 20.0)));
    }

    #[test]
    fn labels_carry_text() {
        let mut s = scene();
        let root = s.root();
        let l = s.create(NodeKind::Label);
        s.set(l, keys::TEXT, String::from("Revenue"));
        s.set(l, keys::FONT_SIZE, 14.0);
        s.children_mut(root).push(l);
        s.flush();
        let plan = RenderPlan::build(&s);
        assert_eq!(
            plan.items[0].content,
            RenderContent::Text {
                text: String::from("Revenue"),
                font_size: 14.0,
            }
        );
    }
}

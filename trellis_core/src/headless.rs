// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory backend.
//!
//! [`HeadlessBackend`] keeps a plain display tree with every property the
//! scene pushes. It measures paths with `kurbo` and text with a fixed advance
//! ratio, which is enough to run layout on a server or in tests.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Affine, Rect};

use crate::backend::{Backend, DisplayId, DisplayKind};
use crate::draw::{self, DrawCommand, Paint};

/// Advance of one character, as a fraction of the font size.
pub const TEXT_ADVANCE: f64 = 0.6;

/// Line height, as a fraction of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// State of one display object.
#[derive(Clone, Debug)]
pub struct HeadlessDisplay {
    /// What was requested at creation.
    pub kind: DisplayKind,
    /// Parent display, if inserted.
    pub parent: Option<DisplayId>,
    /// Child displays in paint order.
    pub children: Vec<DisplayId>,
    /// Transform relative to the parent display.
    pub transform: Affine,
    /// Alpha multiplier.
    pub alpha: f64,
    /// Visibility flag.
    pub visible: bool,
    /// Clip display.
    pub mask: Option<DisplayId>,
    /// Last uploaded path.
    pub commands: Vec<DrawCommand>,
    /// Last uploaded text.
    pub text: String,
    /// Font size of [`text`](Self::text).
    pub font_size: f64,
    /// Last uploaded paint.
    pub paint: Paint,
    /// Whether pointer input is enabled.
    pub interactive: bool,
    content_bounds: Rect,
}

impl HeadlessDisplay {
    fn new(kind: DisplayKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            transform: Affine::IDENTITY,
            alpha: 1.0,
            visible: true,
            mask: None,
            commands: Vec::new(),
            text: String::new(),
            font_size: 0.0,
            paint: Paint::default(),
            interactive: false,
            content_bounds: Rect::ZERO,
        }
    }
}

/// A [`Backend`] that records a display tree in memory.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    displays: Vec<Option<HeadlessDisplay>>,
    disposed: Vec<DisplayId>,
}

impl HeadlessBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live display.
    #[must_use]
    pub fn display(&self, id: DisplayId) -> Option<&HeadlessDisplay> {
        self.displays.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Returns the children of a live display, or an empty slice.
    #[must_use]
    pub fn children(&self, id: DisplayId) -> &[DisplayId] {
        self.display(id).map_or(&[], |d| &d.children)
    }

    /// Returns disposed displays in disposal order.
    #[must_use]
    pub fn disposed(&self) -> &[DisplayId] {
        &self.disposed
    }

    /// Returns the number of live displays.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.displays.iter().filter(|d| d.is_some()).count()
    }

    fn get_mut(&mut self, id: DisplayId) -> Option<&mut HeadlessDisplay> {
        self.displays.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn detach(&mut self, child: DisplayId) {
        let Some(parent) = self.display(child).and_then(|d| d.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }
}

impl Backend for HeadlessBackend {
    fn create(&mut self, kind: DisplayKind) -> DisplayId {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "display ids are never reused; u32::MAX displays is out of reach"
        )]
        let id = DisplayId(self.displays.len() as u32);
        self.displays.push(Some(HeadlessDisplay::new(kind)));
        id
    }

    fn dispose(&mut self, display: DisplayId) {
        assert!(
            self.display(display).is_some(),
            "display disposed twice: {display:?}"
        );
        self.detach(display);
        let children = self.children(display).to_vec();
        for child in children {
            if let Some(c) = self.get_mut(child) {
                c.parent = None;
            }
        }
        self.displays[display.0 as usize] = None;
        self.disposed.push(display);
    }

    fn insert_child(&mut self, parent: DisplayId, child: DisplayId, index: usize) {
        self.detach(child);
        let Some(p) = self.get_mut(parent) else {
            return;
        };
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn remove_child(&mut self, parent: DisplayId, child: DisplayId) {
        if self.display(child).and_then(|d| d.parent) == Some(parent) {
            self.detach(child);
        }
    }

    fn set_transform(&mut self, display: DisplayId, transform: Affine) {
        if let Some(d) = self.get_mut(display) {
            d.transform = transform;
        }
    }

    fn set_alpha(&mut self, display: DisplayId, alpha: f64) {
        if let Some(d) = self.get_mut(display) {
            d.alpha = alpha;
        }
    }

    fn set_visible(&mut self, display: DisplayId, visible: bool) {
        if let Some(d) = self.get_mut(display) {
            d.visible = visible;
        }
    }

    fn set_mask(&mut self, display: DisplayId, mask: Option<DisplayId>) {
        if let Some(d) = self.get_mut(display) {
            d.mask = mask;
        }
    }

    fn set_path(&mut self, display: DisplayId, commands: &[DrawCommand]) {
        if let Some(d) = self.get_mut(display) {
            d.commands.clear();
            d.commands.extend_from_slice(commands);
            d.content_bounds = draw::bounds(commands);
        }
    }

    fn set_text(&mut self, display: DisplayId, text: &str, font_size: f64) {
        if let Some(d) = self.get_mut(display) {
            d.text.clear();
            d.text.push_str(text);
            d.font_size = font_size;
            d.content_bounds = if text.is_empty() {
                Rect::ZERO
            } else {
                let advance = text.chars().count() as f64 * font_size * TEXT_ADVANCE;
                Rect::new(0.0, 0.0, advance, font_size * LINE_HEIGHT)
            };
        }
    }

    fn set_paint(&mut self, display: DisplayId, paint: &Paint) {
        if let Some(d) = self.get_mut(display) {
            d.paint = *paint;
        }
    }

    fn measure(&self, display: DisplayId) -> Rect {
        self.display(display).map_or(Rect::ZERO, |d| d.content_bounds)
    }

    fn adjust_bounds(&self, display: DisplayId, bounds: Rect, paint: &Paint) -> Rect {
        _ = display;
        if paint.stroke.is_some() && paint.stroke_width > 0.0 {
            let half = paint.stroke_width / 2.0;
            bounds.inflate(half, half)
        } else {
            bounds
        }
    }

    fn set_interactive(&mut self, display: DisplayId, interactive: bool) {
        if let Some(d) = self.get_mut(display) {
            d.interactive = interactive;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Color;

    #[test]
    fn insert_reparents() {
        let mut b = HeadlessBackend::new();
        let g1 = b.create(DisplayKind::Group);
        let g2 = b.create(DisplayKind::Group);
        let p = b.create(DisplayKind::Path);
        b.insert_child(g1, p, 0);
        b.insert_child(g2, p, 5);
        assert!(b.children(g1).is_empty());
        assert_eq!(b.children(g2), &[p]);
        assert_eq!(b.display(p).and_then(|d| d.parent), Some(g2));
    }

    #[test]
    fn text_metrics() {
        let mut b = HeadlessBackend::new();
        let t = b.create(DisplayKind::Text);
        b.set_text(t, "abcd", 10.0);
        assert_eq!(b.measure(t), Rect::new(0.0, 0.0, 24.0, 12.0));
    }

    #[test]
    fn stroke_widens_bounds() {
        let mut b = HeadlessBackend::new();
        let p = b.create(DisplayKind::Path);
        let paint = Paint {
            fill: None,
            stroke: Some(Color::BLACK),
            stroke_width: 4.0,
        };
        let r = b.adjust_bounds(p, Rect::new(0.0, 0.0, 10.0, 10.0), &paint);
        assert_eq!(r, Rect::new(-2.0, -2.0, 12.0, 12.0));
        let fill_only = Paint {
            stroke: None,
            ..paint
        };
        let r = b.adjust_bounds(p, Rect::new(0.0, 0.0, 10.0, 10.0), &fill_only);
        assert_eq!(r, Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    #[should_panic(expected = "display disposed twice")]
    fn double_dispose_panics() {
        let mut b = HeadlessBackend::new();
        let g = b.create(DisplayKind::Group);
        b.dispose(g);
        b.dispose(g);
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed setting keys.
//!
//! Every setting a node understands is a variant of the closed [`KeyId`]
//! enum. Callers use the typed [`Key`] constants in this module, so a value
//! of the wrong type for a key is rejected at compile time:
//!
//! ```
//! use trellis_core::settings::{Length, keys};
//! use trellis_core::{HeadlessBackend, NodeKind, Scene};
//!
//! let mut scene = Scene::new(HeadlessBackend::new());
//! let rect = scene.create(NodeKind::Rectangle);
//! scene.set(rect, keys::WIDTH, Length::Px(40.0));
//! scene.set(rect, keys::OPACITY, 0.5);
//! // scene.set(rect, keys::OPACITY, Length::Px(1.0)); // does not compile
//! ```
//!
//! Private settings (written by parents and layouts, never by applications)
//! live in [`private`] and are always plain pixels or flags.

use core::fmt;
use core::marker::PhantomData;

use alloc::string::String;

use super::value::{Color, Length, Position, SettingValue};
use crate::draw::Drawing;
use crate::layout::Layout;
use crate::node::NodeId;

/// Identifies a setting slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs, reason = "each variant mirrors the documented key constant")]
pub enum KeyId {
    X,
    Y,
    Dx,
    Dy,
    CenterX,
    CenterY,
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    PaddingLeft,
    PaddingRight,
    PaddingTop,
    PaddingBottom,
    MarginLeft,
    MarginRight,
    MarginTop,
    MarginBottom,
    Position,
    Visible,
    ForceHidden,
    Opacity,
    Rotation,
    Scale,
    Interactive,
    Draggable,
    Tooltip,
    TooltipText,
    Fill,
    Stroke,
    StrokeWidth,
    Draw,
    Text,
    FontSize,
    Layout,
    Background,
    Mask,
    MaskContent,
}

impl KeyId {
    /// Number of key slots.
    pub const COUNT: usize = Self::MaskContent as usize + 1;

    /// Slot index of this key.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value an unset numeric key animates from.
    pub(crate) const fn numeric_default(self) -> f64 {
        match self {
            Self::Opacity | Self::Scale => 1.0,
            _ => 0.0,
        }
    }

    /// Keys whose change can alter the node's own size.
    pub(crate) const fn affects_bounds(self) -> bool {
        matches!(
            self,
            Self::Width
                | Self::Height
                | Self::MinWidth
                | Self::MaxWidth
                | Self::MinHeight
                | Self::MaxHeight
                | Self::PaddingLeft
                | Self::PaddingRight
                | Self::PaddingTop
                | Self::PaddingBottom
                | Self::Visible
                | Self::ForceHidden
                | Self::Rotation
                | Self::Scale
                | Self::CenterX
                | Self::CenterY
                | Self::StrokeWidth
                | Self::Draw
                | Self::Text
                | Self::FontSize
                | Self::Layout
        )
    }

    /// Keys that only move the node or change how its parent arranges it.
    pub(crate) const fn affects_position(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Dx | Self::Dy)
    }

    /// Keys that change how the parent lays this node out.
    pub(crate) const fn affects_parent(self) -> bool {
        matches!(
            self,
            Self::X
                | Self::Y
                | Self::MarginLeft
                | Self::MarginRight
                | Self::MarginTop
                | Self::MarginBottom
                | Self::Position
        )
    }

    /// Keys that only need a repaint.
    pub(crate) const fn affects_paint(self) -> bool {
        matches!(self, Self::Fill | Self::Stroke | Self::StrokeWidth)
    }
}

/// A typed handle to a setting slot.
///
/// `T` is the value type the slot holds in the store the key is used with.
pub struct Key<T> {
    id: KeyId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Creates a typed key for a slot.
    #[inline]
    #[must_use]
    pub const fn new(id: KeyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped slot identifier.
    #[inline]
    #[must_use]
    pub const fn id(self) -> KeyId {
        self.id
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.id)
    }
}

const fn key<T: SettingValue>(id: KeyId) -> Key<T> {
    Key::new(id)
}

/// Horizontal position in the parent's coordinate space.
pub const X: Key<Length> = key(KeyId::X);
/// Vertical position in the parent's coordinate space.
pub const Y: Key<Length> = key(KeyId::Y);
/// Horizontal pixel offset added after position resolution.
pub const DX: Key<f64> = key(KeyId::Dx);
/// Vertical pixel offset added after position resolution.
pub const DY: Key<f64> = key(KeyId::Dy);
/// Horizontal pivot: pixels, or a percent of the node's own width.
pub const CENTER_X: Key<Length> = key(KeyId::CenterX);
/// Vertical pivot: pixels, or a percent of the node's own height.
pub const CENTER_Y: Key<Length> = key(KeyId::CenterY);
/// Declared width.
pub const WIDTH: Key<Length> = key(KeyId::Width);
/// Declared height.
pub const HEIGHT: Key<Length> = key(KeyId::Height);
/// Lower clamp for the measured width.
pub const MIN_WIDTH: Key<f64> = key(KeyId::MinWidth);
/// Upper clamp for the measured width.
pub const MAX_WIDTH: Key<f64> = key(KeyId::MaxWidth);
/// Lower clamp for the measured height.
pub const MIN_HEIGHT: Key<f64> = key(KeyId::MinHeight);
/// Upper clamp for the measured height.
pub const MAX_HEIGHT: Key<f64> = key(KeyId::MaxHeight);
/// Inner spacing on the left edge of a container.
pub const PADDING_LEFT: Key<f64> = key(KeyId::PaddingLeft);
/// Inner spacing on the right edge of a container.
pub const PADDING_RIGHT: Key<f64> = key(KeyId::PaddingRight);
/// Inner spacing on the top edge of a container.
pub const PADDING_TOP: Key<f64> = key(KeyId::PaddingTop);
/// Inner spacing on the bottom edge of a container.
pub const PADDING_BOTTOM: Key<f64> = key(KeyId::PaddingBottom);
/// Outer spacing on the left, honored by layouts.
pub const MARGIN_LEFT: Key<f64> = key(KeyId::MarginLeft);
/// Outer spacing on the right, honored by layouts.
pub const MARGIN_RIGHT: Key<f64> = key(KeyId::MarginRight);
/// Outer spacing on the top, honored by layouts.
pub const MARGIN_TOP: Key<f64> = key(KeyId::MarginTop);
/// Outer spacing on the bottom, honored by layouts.
pub const MARGIN_BOTTOM: Key<f64> = key(KeyId::MarginBottom);
/// Relative or absolute positioning.
pub const POSITION: Key<Position> = key(KeyId::Position);
/// Whether the node is shown. Defaults to `true`.
pub const VISIBLE: Key<bool> = key(KeyId::Visible);
/// Hides the node regardless of `visible`.
pub const FORCE_HIDDEN: Key<bool> = key(KeyId::ForceHidden);
/// Alpha multiplier. Defaults to `1.0`.
pub const OPACITY: Key<f64> = key(KeyId::Opacity);
/// Rotation in degrees around the pivot.
pub const ROTATION: Key<f64> = key(KeyId::Rotation);
/// Uniform scale around the pivot. Defaults to `1.0`.
pub const SCALE: Key<f64> = key(KeyId::Scale);
/// Makes the node a pointer target even without listeners.
pub const INTERACTIVE: Key<bool> = key(KeyId::Interactive);
/// Lets the pointer drag the node.
pub const DRAGGABLE: Key<bool> = key(KeyId::Draggable);
/// Node shown while the pointer hovers this one.
pub const TOOLTIP: Key<NodeId> = key(KeyId::Tooltip);
/// Text copied into a label tooltip when it is shown.
pub const TOOLTIP_TEXT: Key<String> = key(KeyId::TooltipText);
/// Fill color.
pub const FILL: Key<Color> = key(KeyId::Fill);
/// Stroke color.
pub const STROKE: Key<Color> = key(KeyId::Stroke);
/// Stroke width in pixels.
pub const STROKE_WIDTH: Key<f64> = key(KeyId::StrokeWidth);
/// Drawing commands of a graphics node.
pub const DRAW: Key<Drawing> = key(KeyId::Draw);
/// Text of a label.
pub const TEXT: Key<String> = key(KeyId::Text);
/// Font size of a label in pixels.
pub const FONT_SIZE: Key<f64> = key(KeyId::FontSize);
/// Layout strategy of a container.
pub const LAYOUT: Key<Layout> = key(KeyId::Layout);
/// Node drawn behind a container's children and sized to its bounds.
pub const BACKGROUND: Key<NodeId> = key(KeyId::Background);
/// Node whose shape clips a container's children.
pub const MASK: Key<NodeId> = key(KeyId::Mask);
/// Clips a container's children to its content box.
pub const MASK_CONTENT: Key<bool> = key(KeyId::MaskContent);

/// Keys of the private store.
///
/// Private values are always resolved pixels. They take precedence over the
/// public settings with the same slot.
pub mod private {
    use super::{Key, KeyId, key};

    /// Pixel x assigned by a layout.
    pub const X: Key<f64> = key(KeyId::X);
    /// Pixel y assigned by a layout.
    pub const Y: Key<f64> = key(KeyId::Y);
    /// Pixel width assigned by a layout or a parent.
    pub const WIDTH: Key<f64> = key(KeyId::Width);
    /// Pixel height assigned by a layout or a parent.
    pub const HEIGHT: Key<f64> = key(KeyId::Height);
    /// Upper width clamp assigned by a parent.
    pub const MAX_WIDTH: Key<f64> = key(KeyId::MaxWidth);
    /// Upper height clamp assigned by a parent.
    pub const MAX_HEIGHT: Key<f64> = key(KeyId::MaxHeight);
    /// Engine-controlled visibility (tooltips, internal masks).
    pub const VISIBLE: Key<bool> = key(KeyId::Visible);
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and kinds.
//!
//! Every visual element is a node. All nodes share sprite behavior (settings,
//! bounds, position, visibility, events); [`NodeKind::Container`] nodes can
//! additionally hold children, a background, and a mask. Kinds are a closed
//! set, so the engine matches on them instead of dispatching through a class
//! hierarchy.

mod id;

pub use id::{INVALID, NodeId};

use crate::backend::DisplayKind;

/// What a node draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Groups children; sizes to them unless given an explicit size.
    Container,
    /// A filled/stroked box sized by its width and height.
    Rectangle,
    /// Arbitrary drawing commands from the `draw` setting.
    Graphics,
    /// A single run of text.
    Label,
}

impl NodeKind {
    /// Returns whether this kind can hold children.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container)
    }

    pub(crate) const fn display_kind(self) -> DisplayKind {
        match self {
            Self::Container => DisplayKind::Group,
            Self::Rectangle | Self::Graphics => DisplayKind::Path,
            Self::Label => DisplayKind::Text,
        }
    }
}

/// How a node is attached to its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// Not attached.
    #[default]
    Detached,
    /// An entry of the parent's children list.
    Child,
    /// The parent's background.
    Background,
    /// The parent's user mask.
    Mask,
    /// The parent's internal content-box mask.
    ContentMask,
}

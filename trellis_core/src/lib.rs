// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode scene graph for charts.
//!
//! `trellis_core` keeps a tree of visual nodes (containers, rectangles,
//! graphics and labels), resolves their sizes, layouts and transforms
//! incrementally, and mirrors the result into a backend display tree. It is
//! `no_std` compatible (with `alloc`) and stores nodes in struct-of-arrays
//! form behind generational [`NodeId`] handles.
//!
//! # Architecture
//!
//! Applications write settings; the scene records what became dirty; a
//! flush turns dirty state into geometry and backend calls:
//!
//! ```text
//!   Scene::set / children_mut / animate
//!       │
//!       ▼
//!   Settings (per-key dirty) ──► dirty channels
//!                                    │
//!                 ┌──────────────────┘
//!                 ▼
//!   Scene::flush() ──► Backend calls ──► FrameChanges
//!                                            │
//!                 ┌──────────────────────────┘
//!                 ▼
//!   BoundsChanged / PositionChanged events
//! ```
//!
//! **[`settings`]**: Typed keys, values and the per-node store with
//! change detection. Public settings belong to the application; private
//! settings carry engine-assigned overrides such as layout results.
//!
//! **[`scene`]**: The [`Scene`]: node allocation, disposal, settings
//! access, and computed geometry getters.
//!
//! **[`children`]**: The observable children list of a container.
//!
//! **[`layout`]**: Horizontal, vertical and grid arrangement.
//!
//! **[`flush`]**: The phased flush and its [`FrameChanges`].
//!
//! **[`event`]** / **[`interaction`]**: Listeners with bubbling, and
//! pointer input turned into hover, click, drag and tooltip behavior.
//!
//! **[`animation`]**: Setting animations driven by [`Scene::advance`],
//! and show/hide [`Transition`]s.
//!
//! **[`backend`]**: The [`Backend`] contract, with [`HeadlessBackend`] as an
//! in-memory implementation.
//!
//! **[`dirty`]**: Dirty-tracking channels via `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! flush and dispatch instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use kurbo::Size;
//! use trellis_core::layout::Layout;
//! use trellis_core::settings::{Length, keys};
//! use trellis_core::{HeadlessBackend, NodeKind, Scene};
//!
//! let mut scene = Scene::new(HeadlessBackend::new());
//! scene.set_viewport(Size::new(640.0, 480.0));
//!
//! let legend = scene.create(NodeKind::Container);
//! scene.set(legend, keys::LAYOUT, Layout::Horizontal);
//! let root = scene.root();
//! scene.children_mut(root).push(legend);
//!
//! for width in [40.0, 60.0] {
//!     let swatch = scene.create(NodeKind::Rectangle);
//!     scene.set(swatch, keys::WIDTH, Length::Px(width));
//!     scene.set(swatch, keys::HEIGHT, Length::Px(10.0));
//!     scene.children_mut(legend).push(swatch);
//! }
//!
//! scene.flush();
//! assert_eq!(scene.width(legend), 100.0);
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   change records.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod animation;
pub mod backend;
pub mod children;
mod container;
pub mod dirty;
pub mod draw;
pub mod event;
pub mod flush;
pub mod headless;
pub mod interaction;
pub mod layout;
pub mod node;
pub mod scene;
pub mod settings;
pub mod sprite;
pub mod trace;

pub use animation::{AnimationId, Easing, Transition, TransitionOutcome};
pub use backend::{Backend, DisplayId, DisplayKind};
pub use children::{Children, ChildrenMut};
pub use draw::{DrawCommand, Drawing, Paint};
pub use event::{Event, EventKind, ListenerId, Propagation};
pub use flush::{FrameChanges, MAX_SETTLE_PASSES};
pub use headless::HeadlessBackend;
pub use interaction::{CLICK_DRAG_THRESHOLD, PointerAction, PointerInput};
pub use layout::{GridLayout, Layout, LayoutKind};
pub use node::{Attachment, NodeId, NodeKind};
pub use scene::Scene;

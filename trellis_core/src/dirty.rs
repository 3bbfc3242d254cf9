// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Individual setting keys are tracked per node by the
//! [settings store](crate::settings). These channels track which *nodes* need
//! work in the next [`Scene::flush`](crate::Scene::flush), using
//! [`understory_dirty`].
//!
//! # Propagation semantics
//!
//! - **Local**: [`SETTINGS`], [`BOUNDS`] and [`PAINT`] only report the node
//!   that was marked. Bounds invalidation still travels *upward* to parents
//!   that size to their content, but the scene walks that chain itself
//!   because whether a parent cares depends on its current settings.
//!
//! - **Propagating**: [`POSITION`] is marked with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and every attached node
//!   depends on its parent, so moving a node re-resolves the world transform
//!   of its whole subtree.
//!
//! - **Structural**: [`TOPOLOGY`] is marked when children lists change or
//!   nodes are created or disposed.

use understory_dirty::Channel;

/// Public settings changed; the node runs the changed phase.
pub const SETTINGS: Channel = Channel::new(0);

/// Measured size may have changed; the node re-measures (and re-lays out).
pub const BOUNDS: Channel = Channel::new(1);

/// Position or ancestry changed; world transforms are recomputed for the
/// node and its descendants.
pub const POSITION: Channel = Channel::new(2);

/// Fill or stroke changed; paint is re-uploaded to the backend.
pub const PAINT: Channel = Channel::new(3);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(4);

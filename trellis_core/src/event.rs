// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node events and listener dispatch.
//!
//! Listeners are registered per node and per [`EventKind`]. Pointer events
//! are delivered to their target first, then bubble up the parent chain
//! (children, backgrounds and masks alike) until a listener returns
//! [`Propagation::Stop`]. Stopping lets the remaining listeners on the
//! current node run, and skips every ancestor.
//!
//! Hover, bounds and position events are delivered to their node only.
//!
//! Handlers do not get access to the scene. Share state with them through
//! `Rc<RefCell<_>>` (or a queue drained after dispatch) when a handler needs
//! to change settings.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Vec2};

use crate::backend::Backend;
use crate::node::{INVALID, NodeId};
use crate::scene::Scene;
use crate::trace::{DispatchEvent, Tracer};

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pointer button went down over the node.
    PointerDown,
    /// A pointer button went up over the node.
    PointerUp,
    /// The pointer moved over the node.
    PointerMove,
    /// The pointer entered the node.
    PointerOver,
    /// The pointer left the node.
    PointerOut,
    /// Down and up on the same node without moving past the drag threshold.
    Click,
    /// A drag started on the node.
    DragStart,
    /// The node was dragged.
    Dragged,
    /// A drag ended.
    DragStop,
    /// The node's bounds changed during a flush.
    BoundsChanged,
    /// The node's position changed during a flush.
    PositionChanged,
}

impl EventKind {
    /// Whether the event continues to the target's ancestors.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerUp
                | Self::PointerMove
                | Self::Click
                | Self::DragStart
                | Self::Dragged
                | Self::DragStop
        )
    }

    /// Whether listening for this kind makes a node interactive.
    #[must_use]
    pub const fn is_pointer(self) -> bool {
        !matches!(self, Self::BoundsChanged | Self::PositionChanged)
    }
}

/// An event as seen by one listener.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// The node the event was dispatched to.
    pub target: NodeId,
    /// The node whose listener is running (the target or an ancestor).
    pub current_target: NodeId,
    /// Pointer position in scene coordinates (zero for non-pointer events).
    pub point: Point,
    /// Total pointer displacement since the drag started, in scene
    /// coordinates (zero outside drags).
    pub delta: Vec2,
}

/// Whether an event continues to bubble after a listener ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// Keep going.
    Continue,
    /// Do not deliver to ancestors.
    Stop,
}

/// Identifies a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&Event) -> Propagation>;

pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) kind: EventKind,
    handler: Handler,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Result of delivering one event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Delivery {
    pub(crate) delivered: u32,
    pub(crate) stopped: bool,
}

impl<B: Backend> Scene<B> {
    /// Registers a listener. Returns `None` for a disposed node.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: EventKind,
        handler: impl FnMut(&Event) -> Propagation + 'static,
    ) -> Option<ListenerId> {
        if !self.is_alive(id) {
            return None;
        }
        let listener = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners[id.idx as usize].push(Listener {
            id: listener,
            kind,
            handler: Box::new(handler),
        });
        self.sync_interactive(id.idx);
        Some(listener)
    }

    /// Removes a listener. Returns whether it was registered on the node.
    pub fn off(&mut self, id: NodeId, listener: ListenerId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let list = &mut self.listeners[id.idx as usize];
        let before = list.len();
        list.retain(|l| l.id != listener);
        let removed = list.len() != before;
        if removed {
            self.sync_interactive(id.idx);
        }
        removed
    }

    /// Returns whether the node has a listener for `kind`.
    #[must_use]
    pub fn has_listener(&self, id: NodeId, kind: EventKind) -> bool {
        self.is_alive(id) && self.listeners[id.idx as usize].iter().any(|l| l.kind == kind)
    }

    /// Delivers an event to `target` (and its ancestors, for bubbling kinds).
    ///
    /// Returns whether a listener stopped propagation.
    pub fn emit(&mut self, target: NodeId, kind: EventKind, point: Point) -> bool {
        if !self.is_alive(target) {
            return false;
        }
        self.deliver(target.idx, kind, point, Vec2::ZERO, &mut Tracer::none())
            .stopped
    }

    pub(crate) fn sync_interactive(&mut self, idx: u32) {
        let interactive = self.interactive_idx(idx);
        self.backend
            .set_interactive(self.display[idx as usize], interactive);
    }

    pub(crate) fn deliver(
        &mut self,
        target: u32,
        kind: EventKind,
        point: Point,
        delta: Vec2,
        tracer: &mut Tracer<'_>,
    ) -> Delivery {
        let mut path = Vec::new();
        let mut node = target;
        while node != INVALID {
            path.push(node);
            if !kind.bubbles() {
                break;
            }
            node = self.parent[node as usize];
        }

        let target_id = self.handle(target);
        let mut delivery = Delivery::default();
        for node in path {
            if !self.alive[node as usize] {
                continue;
            }
            let event = Event {
                kind,
                target: target_id,
                current_target: self.handle(node),
                point,
                delta,
            };
            let mut stop = false;
            for listener in &mut self.listeners[node as usize] {
                if listener.kind != kind {
                    continue;
                }
                delivery.delivered += 1;
                if (listener.handler)(&event) == Propagation::Stop {
                    stop = true;
                }
            }
            if stop {
                delivery.stopped = true;
                break;
            }
        }

        tracer.dispatch(&DispatchEvent {
            kind,
            target,
            delivered: delivery.delivered,
            stopped: delivery.stopped,
        });
        delivery
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for flushes and input dispatch.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! engine reports. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`FlushSummaryBuilder`] collects per-phase node counts during a flush and
//! produces a [`FlushSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`NodeChange`] events and the
//!   corresponding `TraceSink` method.

use crate::event::EventKind;
use crate::layout::LayoutKind;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a flush is being reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Deferred settings applied and dirty keys classified.
    Changed,
    /// Measurement, container bounds and layouts (may settle over passes).
    Bounds,
    /// Position resolution and world transforms.
    Position,
    /// Fill and stroke upload.
    Paint,
    /// Dirty keys cleared and events delivered.
    Clear,
}

impl PhaseKind {
    /// All phases in flush order.
    pub const ALL: [Self; 5] = [
        Self::Changed,
        Self::Bounds,
        Self::Position,
        Self::Paint,
        Self::Clear,
    ];

    /// Stable index of this phase, in flush order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Changed => 0,
            Self::Bounds => 1,
            Self::Position => 2,
            Self::Paint => 3,
            Self::Clear => 4,
        }
    }
}

/// Which aspect of a node changed.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeField {
    /// Public settings ran the changed phase.
    Settings,
    /// Local bounds changed.
    Bounds,
    /// World transform was recomputed.
    Position,
    /// Paint was uploaded.
    Paint,
    /// Visibility flipped.
    Visibility,
    /// Added or removed.
    Topology,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a flush starts.
#[derive(Clone, Copy, Debug)]
pub struct FlushBeginEvent {
    /// Flush counter.
    pub frame_index: u64,
    /// Live nodes in the scene.
    pub nodes: u32,
}

/// Marks the beginning of a flush phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Flush counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a flush phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Flush counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Nodes the phase processed.
    pub nodes: u32,
}

/// Emitted when a container runs its layout.
#[derive(Clone, Copy, Debug)]
pub struct LayoutEvent {
    /// Flush counter.
    pub frame_index: u64,
    /// Slot index of the container.
    pub container: u32,
    /// Layout strategy.
    pub strategy: LayoutKind,
    /// Children the layout arranged.
    pub children: u32,
}

/// Emitted when bounds did not settle within the pass limit.
///
/// The remaining nodes stay dirty and are processed by the next flush.
#[derive(Clone, Copy, Debug)]
pub struct SettleLimitEvent {
    /// Flush counter.
    pub frame_index: u64,
    /// Nodes still dirty.
    pub pending: u32,
}

/// Emitted after an event has been delivered.
#[derive(Clone, Copy, Debug)]
pub struct DispatchEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Slot index of the target node.
    pub target: u32,
    /// Listeners invoked.
    pub delivered: u32,
    /// Whether a listener stopped propagation.
    pub stopped: bool,
}

/// Emitted when a node is disposed.
#[derive(Clone, Copy, Debug)]
pub struct DisposeEvent {
    /// Slot index of the node (now free).
    pub node_index: u32,
    /// Nodes disposed, including the node itself.
    pub disposed: u32,
}

/// Per-flush summary produced by [`FlushSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushSummary {
    /// Flush counter.
    pub frame_index: u64,
    /// Nodes per phase, indexed by [`PhaseKind::index`].
    pub phase_nodes: [u32; 5],
    /// Containers that ran a layout.
    pub layouts: u32,
    /// Bounds passes needed to settle.
    pub settle_passes: u32,
    /// Whether bounds settled within the pass limit.
    pub settled: bool,
}

impl FlushSummary {
    /// Returns the node count for a phase.
    #[must_use]
    pub const fn nodes(&self, phase: PhaseKind) -> u32 {
        self.phase_nodes[phase.index()]
    }
}

/// A per-flush node change record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NodeChange {
    /// Slot index of the node that changed.
    pub node_index: u32,
    /// What changed.
    pub field: NodeField,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scene.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a flush starts.
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a flush phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a flush phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a container runs its layout.
    fn on_layout(&mut self, e: &LayoutEvent) {
        _ = e;
    }

    /// Called when bounds fail to settle.
    fn on_settle_limit(&mut self, e: &SettleLimitEvent) {
        _ = e;
    }

    /// Called after an event is delivered.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called when a node is disposed.
    fn on_dispose(&mut self, e: &DisposeEvent) {
        _ = e;
    }

    /// Called with a per-flush summary.
    fn on_flush_summary(&mut self, s: &FlushSummary) {
        _ = s;
    }

    /// Called with per-flush node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        _ = (frame_index, changes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

macro_rules! emit {
    ($self:ident, $method:ident, $e:expr) => {{
        #[cfg(feature = "trace")]
        if let Some(s) = &mut $self.sink {
            s.$method($e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = $e;
        }
    }};
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FlushBeginEvent`].
    #[inline]
    pub fn flush_begin(&mut self, e: &FlushBeginEvent) {
        emit!(self, on_flush_begin, e);
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        emit!(self, on_phase_begin, e);
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        emit!(self, on_phase_end, e);
    }

    /// Emits a [`LayoutEvent`].
    #[inline]
    pub fn layout(&mut self, e: &LayoutEvent) {
        emit!(self, on_layout, e);
    }

    /// Emits a [`SettleLimitEvent`].
    #[inline]
    pub fn settle_limit(&mut self, e: &SettleLimitEvent) {
        emit!(self, on_settle_limit, e);
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        emit!(self, on_dispatch, e);
    }

    /// Emits a [`DisposeEvent`].
    #[inline]
    pub fn dispose(&mut self, e: &DisposeEvent) {
        emit!(self, on_dispose, e);
    }

    /// Emits a [`FlushSummary`].
    #[inline]
    pub fn flush_summary(&mut self, s: &FlushSummary) {
        emit!(self, on_flush_summary, s);
    }

    /// Emits node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        if let Some(s) = &mut self.sink {
            s.on_node_changes(frame_index, changes);
        }
    }
}

// ---------------------------------------------------------------------------
// FlushSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase counts during a flush and produces a [`FlushSummary`].
#[derive(Debug)]
pub struct FlushSummaryBuilder {
    summary: FlushSummary,
}

impl FlushSummaryBuilder {
    /// Starts a summary for the given flush.
    #[must_use]
    pub fn new(frame_index: u64) -> Self {
        Self {
            summary: FlushSummary {
                frame_index,
                settled: true,
                ..FlushSummary::default()
            },
        }
    }

    /// Records how many nodes a phase processed.
    pub fn phase_nodes(&mut self, phase: PhaseKind, nodes: u32) {
        self.summary.phase_nodes[phase.index()] = nodes;
    }

    /// Records the number of layouts run.
    pub fn layouts(&mut self, layouts: u32) {
        self.summary.layouts = layouts;
    }

    /// Records the settle loop outcome.
    pub fn settle(&mut self, passes: u32, settled: bool) {
        self.summary.settle_passes = passes;
        self.summary.settled = settled;
    }

    /// Consumes the builder and produces the final [`FlushSummary`].
    #[must_use]
    pub fn finish(self) -> FlushSummary {
        self.summary
    }
}

/// Saturating conversion for counts reported in events.
#[inline]
pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_flush_begin(&FlushBeginEvent {
            frame_index: 1,
            nodes: 3,
        });
        sink.on_flush_summary(&FlushSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Bounds,
        });
        tracer.dispose(&DisposeEvent {
            node_index: 0,
            disposed: 1,
        });
    }

    #[test]
    fn summary_builder_records_counts() {
        let mut builder = FlushSummaryBuilder::new(9);
        builder.phase_nodes(PhaseKind::Changed, 4);
        builder.phase_nodes(PhaseKind::Bounds, 7);
        builder.layouts(2);
        builder.settle(3, true);
        let s = builder.finish();
        assert_eq!(s.frame_index, 9);
        assert_eq!(s.nodes(PhaseKind::Changed), 4);
        assert_eq!(s.nodes(PhaseKind::Bounds), 7);
        assert_eq!(s.nodes(PhaseKind::Paint), 0);
        assert_eq!(s.layouts, 2);
        assert!(s.settled);
    }

    #[test]
    fn phase_indices_follow_flush_order() {
        for (i, phase) in PhaseKind::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            layouts: Vec<u32>,
        }
        impl TraceSink for RecordingSink {
            fn on_layout(&mut self, e: &LayoutEvent) {
                self.layouts.push(e.container);
            }
        }

        let mut sink = RecordingSink {
            layouts: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.layout(&LayoutEvent {
            frame_index: 1,
            container: 5,
            strategy: LayoutKind::Grid,
            children: 3,
        });
        drop(tracer);
        assert_eq!(sink.layouts, &[5]);
    }
}

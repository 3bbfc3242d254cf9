// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use trellis_core::trace::{
    DispatchEvent, DisposeEvent, FlushBeginEvent, FlushSummary, LayoutEvent, NodeChange,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, SettleLimitEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub(crate) fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Changed => "changed",
        PhaseKind::Bounds => "bounds",
        PhaseKind::Position => "position",
        PhaseKind::Paint => "paint",
        PhaseKind::Clear => "clear",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] frame={} nodes={}",
            e.frame_index, e.nodes,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} nodes={}",
            e.frame_index,
            phase_name(e.phase),
            e.nodes,
        );
    }

    fn on_layout(&mut self, e: &LayoutEvent) {
        let _ = writeln!(
            self.writer,
            "[layout] frame={} container={} {:?} children={}",
            e.frame_index, e.container, e.strategy, e.children,
        );
    }

    fn on_settle_limit(&mut self, e: &SettleLimitEvent) {
        let _ = writeln!(
            self.writer,
            "[settle] frame={} UNSETTLED pending={}",
            e.frame_index, e.pending,
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let stopped = if e.stopped { " stopped" } else { "" };
        let _ = writeln!(
            self.writer,
            "[dispatch] {:?} target={} delivered={}{stopped}",
            e.kind, e.target, e.delivered,
        );
    }

    fn on_dispose(&mut self, e: &DisposeEvent) {
        let _ = writeln!(
            self.writer,
            "[dispose] node={} disposed={}",
            e.node_index, e.disposed,
        );
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        let settled = if s.settled { "ok" } else { "UNSETTLED" };
        let _ = writeln!(
            self.writer,
            "[summary] frame={} changed={} bounds={} position={} paint={} clear={} \
             layouts={} passes={} settle={settled}",
            s.frame_index,
            s.nodes(PhaseKind::Changed),
            s.nodes(PhaseKind::Bounds),
            s.nodes(PhaseKind::Position),
            s.nodes(PhaseKind::Paint),
            s.nodes(PhaseKind::Clear),
            s.layouts,
            s.settle_passes,
        );
    }

    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        let _ = writeln!(
            self.writer,
            "[nodes] frame={frame_index} changes={}",
            changes.len(),
        );
    }
}

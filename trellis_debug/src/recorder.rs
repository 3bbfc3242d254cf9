// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! [`on_node_changes`](TraceSink::on_node_changes) stores only the count.

use trellis_core::event::EventKind;
use trellis_core::layout::LayoutKind;
use trellis_core::trace::{
    DispatchEvent, DisposeEvent, FlushBeginEvent, FlushSummary, LayoutEvent, NodeChange,
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, SettleLimitEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FLUSH_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_LAYOUT: u8 = 4;
const TAG_SETTLE_LIMIT: u8 = 5;
const TAG_DISPATCH: u8 = 6;
const TAG_DISPOSE: u8 = 7;
const TAG_FLUSH_SUMMARY: u8 = 8;
const TAG_NODE_CHANGES_COUNT: u8 = 9;

const EVENT_KINDS: [EventKind; 11] = [
    EventKind::PointerDown,
    EventKind::PointerUp,
    EventKind::PointerMove,
    EventKind::PointerOver,
    EventKind::PointerOut,
    EventKind::Click,
    EventKind::DragStart,
    EventKind::Dragged,
    EventKind::DragStop,
    EventKind::BoundsChanged,
    EventKind::PositionChanged,
];

const LAYOUT_KINDS: [LayoutKind; 3] = [
    LayoutKind::Horizontal,
    LayoutKind::Vertical,
    LayoutKind::Grid,
];

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "five phases fit in a byte"
        )]
        self.write_u8(p.index() as u8);
    }

    fn write_tag_of<T: PartialEq>(&mut self, table: &[T], value: &T) {
        let index = table.iter().position(|t| t == value).unwrap_or(u8::MAX.into());
        self.write_u8(u8::try_from(index).unwrap_or(u8::MAX));
    }
}

impl TraceSink for RecorderSink {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        self.write_u8(TAG_FLUSH_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.nodes);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_phase(e.phase);
        self.write_u32(e.nodes);
    }

    fn on_layout(&mut self, e: &LayoutEvent) {
        self.write_u8(TAG_LAYOUT);
        self.write_u64(e.frame_index);
        self.write_u32(e.container);
        self.write_tag_of(&LAYOUT_KINDS, &e.strategy);
        self.write_u32(e.children);
    }

    fn on_settle_limit(&mut self, e: &SettleLimitEvent) {
        self.write_u8(TAG_SETTLE_LIMIT);
        self.write_u64(e.frame_index);
        self.write_u32(e.pending);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.write_u8(TAG_DISPATCH);
        self.write_tag_of(&EVENT_KINDS, &e.kind);
        self.write_u32(e.target);
        self.write_u32(e.delivered);
        self.write_bool(e.stopped);
    }

    fn on_dispose(&mut self, e: &DisposeEvent) {
        self.write_u8(TAG_DISPOSE);
        self.write_u32(e.node_index);
        self.write_u32(e.disposed);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.write_u8(TAG_FLUSH_SUMMARY);
        self.write_u64(s.frame_index);
        for nodes in s.phase_nodes {
            self.write_u32(nodes);
        }
        self.write_u32(s.layouts);
        self.write_u32(s.settle_passes);
        self.write_bool(s.settled);
    }

    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        self.write_u8(TAG_NODE_CHANGES_COUNT);
        self.write_u64(frame_index);
        self.write_u32(u32::try_from(changes.len()).unwrap_or(u32::MAX));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`FlushBeginEvent`].
    FlushBegin(FlushBeginEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`LayoutEvent`].
    Layout(LayoutEvent),
    /// A [`SettleLimitEvent`].
    SettleLimit(SettleLimitEvent),
    /// A [`DispatchEvent`].
    Dispatch(DispatchEvent),
    /// A [`DisposeEvent`].
    Dispose(DisposeEvent),
    /// A [`FlushSummary`].
    FlushSummary(FlushSummary),
    /// Node-change count for a flush.
    NodeChangesCount {
        /// Flush counter.
        frame_index: u64,
        /// Number of node changes.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first truncated record or unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?;
        self.pos += N;
        bytes.try_into().ok()
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn read_from<T: Copy>(&mut self, table: &[T]) -> Option<T> {
        table.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_flush_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let mut phase_nodes = [0; 5];
        for nodes in &mut phase_nodes {
            *nodes = self.read_u32()?;
        }
        Some(RecordedEvent::FlushSummary(FlushSummary {
            frame_index,
            phase_nodes,
            layouts: self.read_u32()?,
            settle_passes: self.read_u32()?,
            settled: self.read_bool()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let event = match tag {
            TAG_FLUSH_BEGIN => RecordedEvent::FlushBegin(FlushBeginEvent {
                frame_index: self.read_u64()?,
                nodes: self.read_u32()?,
            }),
            TAG_PHASE_BEGIN => RecordedEvent::PhaseBegin(PhaseBeginEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
            }),
            TAG_PHASE_END => RecordedEvent::PhaseEnd(PhaseEndEvent {
                frame_index: self.read_u64()?,
                phase: self.read_phase()?,
                nodes: self.read_u32()?,
            }),
            TAG_LAYOUT => RecordedEvent::Layout(LayoutEvent {
                frame_index: self.read_u64()?,
                container: self.read_u32()?,
                strategy: self.read_from(&LAYOUT_KINDS)?,
                children: self.read_u32()?,
            }),
            TAG_SETTLE_LIMIT => RecordedEvent::SettleLimit(SettleLimitEvent {
                frame_index: self.read_u64()?,
                pending: self.read_u32()?,
            }),
            TAG_DISPATCH => RecordedEvent::Dispatch(DispatchEvent {
                kind: self.read_from(&EVENT_KINDS)?,
                target: self.read_u32()?,
                delivered: self.read_u32()?,
                stopped: self.read_bool()?,
            }),
            TAG_DISPOSE => RecordedEvent::Dispose(DisposeEvent {
                node_index: self.read_u32()?,
                disposed: self.read_u32()?,
            }),
            TAG_FLUSH_SUMMARY => self.decode_flush_summary()?,
            TAG_NODE_CHANGES_COUNT => RecordedEvent::NodeChangesCount {
                frame_index: self.read_u64()?,
                count: self.read_u32()?,
            },
            _ => return None, // unknown tag → stop iteration
        };
        Some(event)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use trellis_core::settings::{Length, keys};
    use trellis_core::trace::Tracer;
    use trellis_core::{HeadlessBackend, Layout, NodeKind, Scene};

    #[test]
    fn round_trip_dispatch() {
        let mut rec = RecorderSink::new();
        rec.on_dispatch(&DispatchEvent {
            kind: EventKind::DragStop,
            target: 12,
            delivered: 3,
            stopped: true,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Dispatch(e) => {
                assert_eq!(e.kind, EventKind::DragStop);
                assert_eq!(e.target, 12);
                assert_eq!(e.delivered, 3);
                assert!(e.stopped, "stop flag lost");
            }
            other => panic!("expected Dispatch, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_summary() {
        let mut rec = RecorderSink::new();
        let orig = FlushSummary {
            frame_index: 4,
            phase_nodes: [1, 2, 3, 4, 5],
            layouts: 2,
            settle_passes: 10,
            settled: false,
        };
        rec.on_flush_summary(&orig);
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::FlushSummary(s)) => assert_eq!(s, orig),
            other => panic!("expected FlushSummary, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_dispose(&DisposeEvent {
            node_index: 1,
            disposed: 1,
        });
        rec.on_settle_limit(&SettleLimitEvent {
            frame_index: 2,
            pending: 7,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 2]).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RecordedEvent::Dispose(_)), "got {events:?}");
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let events: Vec<_> = decode(&[0xEE, 1, 2, 3]).collect();
        assert!(events.is_empty(), "got {events:?}");
    }

    #[test]
    fn records_a_whole_flush() {
        let mut scene = Scene::new(HeadlessBackend::new());
        scene.set_viewport(Size::new(100.0, 100.0));
        let column = scene.create(NodeKind::Container);
        scene.set(column, keys::LAYOUT, Layout::Vertical);
        let root = scene.root();
        scene.children_mut(root).push(column);
        for _ in 0..2 {
            let cell = scene.create(NodeKind::Rectangle);
            scene.set(cell, keys::HEIGHT, Length::Px(10.0));
            scene.children_mut(column).push(cell);
        }

        let mut rec = RecorderSink::new();
        let _ = scene.flush_with(&mut Tracer::new(&mut rec));
        let events: Vec<_> = decode(rec.as_bytes()).collect();

        assert!(
            matches!(events.first(), Some(RecordedEvent::FlushBegin(_))),
            "got {events:?}"
        );
        let layout = events.iter().find_map(|e| match e {
            RecordedEvent::Layout(l) => Some(*l),
            _ => None,
        });
        let layout = layout.expect("layout event recorded");
        assert_eq!(layout.strategy, LayoutKind::Vertical);
        assert_eq!(layout.children, 2);
        assert!(
            matches!(events.last(), Some(RecordedEvent::FlushSummary(s)) if s.settled),
            "got {events:?}"
        );
    }
}

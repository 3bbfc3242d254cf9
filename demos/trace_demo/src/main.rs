// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chart legend driven through a short frame loop.
//!
//! Builds a wrapping legend, clicks an item to fade it out and back in, and
//! flushes once per simulated frame. Every flush is traced to both a
//! [`PrettyPrintSink`] on stdout and a [`RecorderSink`]; damage and render
//! plan sizes are printed per frame, and the final tree is written as JSON.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use kurbo::{Point, Size};
use trellis_core::settings::{Color, Length, keys};
use trellis_core::trace::{
    DispatchEvent, DisposeEvent, FlushBeginEvent, FlushSummary, LayoutEvent, NodeChange,
    PhaseBeginEvent, PhaseEndEvent, SettleLimitEvent, TraceSink, Tracer,
};
use trellis_core::{
    EventKind, FrameChanges, GridLayout, HeadlessBackend, Layout, NodeId, NodeKind, PointerInput,
    Propagation, Scene,
};
use trellis_debug::pretty::PrettyPrintSink;
use trellis_debug::recorder::{RecordedEvent, RecorderSink, decode};
use trellis_debug::snapshot;
use trellis_render::{DamageTracker, RenderPlan};

const FRAME: Duration = Duration::from_millis(16);
const FADE: Duration = Duration::from_millis(64);
const SERIES: [(&str, u32); 5] = [
    ("Revenue", 0x4e79a7),
    ("Costs", 0xf28e2b),
    ("Margin", 0xe15759),
    ("Headcount", 0x76b7b2),
    ("Churn", 0x59a14f),
];

/// Forwards every event to two sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_flush_begin(&mut self, e: &FlushBeginEvent) {
        self.pretty.on_flush_begin(e);
        self.recorder.on_flush_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.pretty.on_phase_begin(e);
        self.recorder.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.pretty.on_phase_end(e);
        self.recorder.on_phase_end(e);
    }

    fn on_layout(&mut self, e: &LayoutEvent) {
        self.pretty.on_layout(e);
        self.recorder.on_layout(e);
    }

    fn on_settle_limit(&mut self, e: &SettleLimitEvent) {
        self.pretty.on_settle_limit(e);
        self.recorder.on_settle_limit(e);
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.pretty.on_dispatch(e);
        self.recorder.on_dispatch(e);
    }

    fn on_dispose(&mut self, e: &DisposeEvent) {
        self.pretty.on_dispose(e);
        self.recorder.on_dispose(e);
    }

    fn on_flush_summary(&mut self, s: &FlushSummary) {
        self.pretty.on_flush_summary(s);
        self.recorder.on_flush_summary(s);
    }

    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        self.pretty.on_node_changes(frame_index, changes);
        self.recorder.on_node_changes(frame_index, changes);
    }
}

fn legend(scene: &mut Scene<HeadlessBackend>) -> Vec<NodeId> {
    let legend = scene.create(NodeKind::Container);
    scene.set(legend, keys::WIDTH, Length::Px(240.0));
    scene.set(
        legend,
        keys::LAYOUT,
        Layout::Grid(GridLayout {
            max_columns: 3,
            fixed_width_grid: true,
        }),
    );
    scene.set(legend, keys::PADDING_LEFT, 8.0);
    scene.set(legend, keys::PADDING_TOP, 8.0);
    let background = scene.create(NodeKind::Rectangle);
    scene.set(background, keys::FILL, Color::from_hex(0xf5f5f5));
    scene.set(legend, keys::BACKGROUND, background);
    let root = scene.root();
    scene.children_mut(root).push(legend);

    let mut items = Vec::new();
    for (name, color) in SERIES {
        let item = scene.create(NodeKind::Container);
        scene.set(item, keys::LAYOUT, Layout::Horizontal);
        scene.set(item, keys::MARGIN_RIGHT, 10.0);
        scene.set(item, keys::INTERACTIVE, true);

        let swatch = scene.create(NodeKind::Rectangle);
        scene.set(swatch, keys::WIDTH, Length::Px(12.0));
        scene.set(swatch, keys::HEIGHT, Length::Px(12.0));
        scene.set(swatch, keys::MARGIN_RIGHT, 4.0);
        scene.set(swatch, keys::FILL, Color::from_hex(color));

        let label = scene.create(NodeKind::Label);
        scene.set(label, keys::TEXT, name.to_owned());

        scene.children_mut(item).push(swatch);
        scene.children_mut(item).push(label);
        scene.children_mut(legend).push(item);
        items.push(item);
    }
    items
}

fn flush(
    scene: &mut Scene<HeadlessBackend>,
    changes: &mut FrameChanges,
    pretty: &mut PrettyPrintSink,
    recorder: &mut RecorderSink,
) {
    let mut tee = Tee { pretty, recorder };
    scene.flush_into_with(changes, &mut Tracer::new(&mut tee));
}

fn main() {
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    let mut scene = Scene::new(HeadlessBackend::new());
    scene.set_viewport(Size::new(320.0, 200.0));
    let items = legend(&mut scene);
    for &item in &items {
        let _ = scene.on(item, EventKind::Click, |e| {
            println!("clicked {:?}", e.target);
            Propagation::Stop
        });
    }

    let mut changes = FrameChanges::default();
    let mut damage = DamageTracker::new();
    let mut plan = RenderPlan::new();
    flush(&mut scene, &mut changes, &mut pretty, &mut recorder);
    println!("frame 0: {:?}", damage.update(&scene, &changes));

    // Click the second item, then fade it out and back in.
    let target = scene.global_bounds(items[1]).center();
    let _ = scene.dispatch_pointer(PointerInput::down(target));
    let _ = scene.dispatch_pointer(PointerInput::up(Point::new(target.x + 1.0, target.y)));
    let hide = scene.hide(items[1], FADE);

    let mut frame = 1;
    let mut show = None;
    // The hide resolves in the flush that applies it, so keep going until
    // the show has been started as well.
    while (scene.has_animations() || scene.is_scheduled() || show.is_none()) && frame < 120 {
        let _ = scene.advance(FRAME);
        if hide.is_done() && show.is_none() {
            show = Some(scene.show(items[1], FADE));
        }
        flush(&mut scene, &mut changes, &mut pretty, &mut recorder);
        plan.rebuild(&scene);
        println!(
            "frame {frame}: {} items, damage {:?}",
            plan.len(),
            damage.update(&scene, &changes)
        );
        frame += 1;
    }

    let settled = decode(recorder.as_bytes())
        .filter(|e| matches!(e, RecordedEvent::FlushSummary(s) if s.settled))
        .count();
    println!(
        "recorded {} bytes, {settled} settled flushes",
        recorder.as_bytes().len()
    );

    let path = "scene.json";
    let mut file = File::create(path).expect("failed to create scene.json");
    file.write_all(snapshot::to_pretty_string(&scene).as_bytes())
        .expect("failed to write scene snapshot");
    println!("Wrote {path}");
}

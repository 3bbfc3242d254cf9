// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON dumps of a scene tree.
//!
//! [`snapshot`] walks a node and its descendants and returns a
//! [`serde_json::Value`] with each node's kind, attachment, visibility and
//! computed geometry. Backgrounds and masks are nested under the container
//! that owns them, children in list order.

use kurbo::Rect;
use serde_json::{Map, Value, json};
use trellis_core::{Backend, NodeId, NodeKind, Scene};

/// Returns the subtree rooted at `id` as JSON, or `Value::Null` if `id` is
/// not alive.
#[must_use]
pub fn snapshot<B: Backend>(scene: &Scene<B>, id: NodeId) -> Value {
    let Some(kind) = scene.kind(id) else {
        return Value::Null;
    };
    let mut node = Map::new();
    node.insert("index".into(), json!(id.index()));
    node.insert("kind".into(), json!(format!("{kind:?}")));
    node.insert(
        "attachment".into(),
        json!(format!("{:?}", scene.attachment(id))),
    );
    node.insert("visible".into(), json!(scene.is_visible(id)));
    let position = scene.position(id);
    node.insert("position".into(), json!([position.x, position.y]));
    node.insert("bounds".into(), rect(scene.local_bounds(id)));
    node.insert("global_bounds".into(), rect(scene.global_bounds(id)));

    if kind == NodeKind::Container {
        if let Some(background) = scene.background(id) {
            node.insert("background".into(), snapshot(scene, background));
        }
        if let Some(mask) = scene.clip_mask(id) {
            node.insert("mask".into(), snapshot(scene, mask));
        }
        let children: Vec<Value> = scene
            .children(id)
            .iter()
            .map(|child| snapshot(scene, child))
            .collect();
        node.insert("children".into(), Value::Array(children));
    }
    Value::Object(node)
}

/// Returns the whole root tree as indented JSON text.
#[must_use]
pub fn to_pretty_string<B: Backend>(scene: &Scene<B>) -> String {
    serde_json::to_string_pretty(&snapshot(scene, scene.root())).unwrap_or_default()
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plans and damage tracking for trellis scenes.
//!
//! This crate sits between a flushed [`trellis_core::Scene`] and a renderer
//! that draws immediate-mode. It defines:
//!
//! - [`RenderItem`]: one drawable node with everything needed to draw it
//! - [`RenderPlan`]: the ordered items of one frame
//! - [`DamageTracker`] / [`DamageRegion`]: spatial damage for partial
//!   re-rendering

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;

pub use damage::{DamageRegion, DamageTracker};
pub use plan::{RenderContent, RenderItem, RenderPlan};

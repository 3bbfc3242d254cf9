// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid flow.
//!
//! Children fill rows left to right. The column count starts at how many of
//! the narrowest cells (or the widest, for a fixed-width grid) fit the
//! container's available width, capped by `max_columns` and the number of
//! children, and drops by one until the columns fit. With a single column
//! left the grid collapses to one column spanning the available width.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use super::{Axis, GridLayout};
use crate::backend::Backend;
use crate::scene::Scene;

/// Slack allowed when comparing the column total with the available width.
pub const FIT_EPSILON: f64 = 1e-6;

/// Computes column widths for cells of the given widths (margins included).
///
/// Always terminates: the candidate column count strictly decreases and a
/// single column is accepted unconditionally.
pub(crate) fn column_widths(cells: &[f64], grid: GridLayout, available: f64) -> Vec<f64> {
    if cells.is_empty() {
        return Vec::new();
    }
    let widest = cells.iter().copied().fold(0.0_f64, f64::max);
    let narrowest = cells.iter().copied().fold(f64::INFINITY, f64::min);
    let cell = if grid.fixed_width_grid { widest } else { narrowest }.max(1.0);

    let fitting = if available.is_finite() {
        cells_that_fit(available, cell)
    } else {
        cells.len()
    };
    let mut columns = fitting.min(grid.max_columns).min(cells.len()).max(1);

    loop {
        if columns <= 1 {
            let width = if available.is_finite() { available } else { widest };
            return vec![width];
        }
        let widths = if grid.fixed_width_grid {
            vec![widest; columns]
        } else {
            let mut widths = vec![0.0_f64; columns];
            for (i, &w) in cells.iter().enumerate() {
                let col = i % columns;
                widths[col] = widths[col].max(w);
            }
            widths
        };
        if widths.iter().sum::<f64>() <= available + FIT_EPSILON {
            return widths;
        }
        columns -= 1;
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "a non-negative column count, saturating on overflow"
)]
fn cells_that_fit(available: f64, cell: f64) -> usize {
    (available.max(0.0) / cell).floor() as usize
}

pub(super) fn arrange<B: Backend>(
    scene: &mut Scene<B>,
    container: u32,
    children: &[u32],
    grid: GridLayout,
) {
    let (pad_left, pad_right) = scene.padding(container, Axis::X);
    let pad_top = scene.padding(container, Axis::Y).0;
    let available = scene.available_size(container, Axis::X) - pad_left - pad_right;

    let cells: Vec<f64> = children
        .iter()
        .map(|&c| {
            let (l, r) = scene.margins(c, Axis::X);
            scene.adjusted_bounds[c as usize].width() + l + r
        })
        .collect();
    let columns = column_widths(&cells, grid, available);

    let mut x = pad_left;
    let mut row_top = pad_top;
    let mut row_height = 0.0_f64;
    for (i, &child) in children.iter().enumerate() {
        let col = i % columns.len();
        if col == 0 && i > 0 {
            row_top += row_height;
            row_height = 0.0;
            x = pad_left;
        }
        let bounds = scene.adjusted_bounds[child as usize];
        let (ml, _) = scene.margins(child, Axis::X);
        let (mt, mb) = scene.margins(child, Axis::Y);
        scene.set_private_px(child, Axis::X.private_position_key(), x + ml - bounds.x0);
        scene.set_private_px(child, Axis::Y.private_position_key(), row_top + mt - bounds.y0);
        x += columns[col];
        row_height = row_height.max(bounds.height() + mt + mb);
    }
}

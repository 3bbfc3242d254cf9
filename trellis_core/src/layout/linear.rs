// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Horizontal and vertical stacking.
//!
//! Both layouts run the same two passes along their main axis:
//!
//! 1. **Sizing**: fixed children (and their margins) are subtracted from the
//!    container's inner size; what is left is shared among percent-sized
//!    children in proportion to their percentages, honouring their min and
//!    max sizes. Results are written as the children's private size.
//! 2. **Placement**: children are placed one after another starting at the
//!    container's leading padding, each offset by its leading margin and by
//!    its own bounds origin.
//!
//! The cross axis is left to the child's own position, which defaults to
//! the container's leading padding.

use alloc::vec::Vec;

use super::Axis;
use crate::backend::Backend;
use crate::scene::Scene;
use crate::settings::Length;

/// Space used when nothing (or an unbounded amount) is left to share.
const DEGENERATE_SPACE: f64 = 0.1;

/// One percent-sized child's claim on the shared space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Share {
    /// Percentage as a fraction.
    pub(crate) fraction: f64,
    /// Sum of both margins along the axis.
    pub(crate) margin: f64,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
}

/// Splits `available` among `shares`.
///
/// Each share gets `available * fraction / total_fraction - margin`. When
/// the clamped sizes overshoot that, every share held up by its min is
/// pinned there; when they undershoot, every share held down by its max is.
/// Pinned shares leave the pool and the rest is split again until no bound
/// binds, so the shares fill `available` whenever their bounds allow it.
pub(crate) fn distribute(available: f64, shares: &[Share]) -> Vec<f64> {
    let available = if available <= 0.0 || !available.is_finite() {
        DEGENERATE_SPACE
    } else {
        available
    };
    let mut sizes: Vec<Option<f64>> = alloc::vec![None; shares.len()];

    loop {
        let mut free = available;
        let mut total = 0.0;
        for (share, size) in shares.iter().zip(&sizes) {
            match size {
                Some(size) => free -= size + share.margin,
                None => total += share.fraction,
            }
        }

        let mut violation = 0.0;
        let mut wanted = Vec::with_capacity(shares.len());
        for (share, size) in shares.iter().zip(&sizes) {
            if size.is_some() {
                wanted.push(None);
                continue;
            }
            let raw = proportional(free, share, total);
            let clamped = clamp(share, raw);
            violation += clamped - raw;
            wanted.push(Some((raw, clamped)));
        }

        if violation == 0.0 {
            return sizes
                .into_iter()
                .zip(wanted)
                .map(|(size, want)| size.or(want.map(|(_, c)| c)).unwrap_or(0.0))
                .collect();
        }
        for (size, want) in sizes.iter_mut().zip(wanted) {
            if let Some((raw, clamped)) = want
                && ((violation > 0.0 && clamped > raw) || (violation < 0.0 && clamped < raw))
            {
                *size = Some(clamped);
            }
        }
    }
}

/// Same order as a node's own size clamp: a max below the min wins.
fn clamp(share: &Share, size: f64) -> f64 {
    let mut size = size;
    if let Some(min) = share.min {
        size = size.max(min);
    }
    if let Some(max) = share.max {
        size = size.min(max);
    }
    size
}

fn proportional(available: f64, share: &Share, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (available * share.fraction / total - share.margin).max(0.0)
}

pub(super) fn arrange<B: Backend>(
    scene: &mut Scene<B>,
    container: u32,
    children: &[u32],
    axis: Axis,
) {
    let mut available = scene.inner_size(container, axis);
    let mut shares = Vec::new();
    let mut shared = Vec::new();
    for &child in children {
        let (lead, trail) = scene.margins(child, axis);
        match scene.settings[child as usize].get(axis.size_key()) {
            Some(Length::Percent(p)) => {
                shares.push(Share {
                    fraction: p.value(),
                    margin: lead + trail,
                    min: scene.min_size(child, axis),
                    max: scene.max_size(child, axis),
                });
                shared.push(child);
            }
            _ => {
                // A size this layout assigned while the child was percent
                // sized must not outlive the percent.
                scene.write_private(child, axis.private_size_key().id(), None);
                available -= scene.size_idx(child, axis) + lead + trail;
            }
        }
    }
    if !shared.is_empty() {
        let sizes = distribute(available, &shares);
        for (&child, size) in shared.iter().zip(sizes) {
            scene.set_private_px(child, axis.private_size_key(), size);
        }
    }

    let mut cursor = scene.padding(container, axis).0;
    for &child in children {
        let bounds = scene.adjusted_bounds[child as usize];
        let (lead, trail) = scene.margins(child, axis);
        let start = axis.start(bounds);
        let mut end = axis.end(bounds);
        if let Some(max) = scene.max_size(child, axis) {
            end = end.min(start + max);
        }
        let offset = cursor + lead - start;
        scene.set_private_px(child, axis.private_position_key(), offset);
        cursor = offset + end + trail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(percent: f64) -> Share {
        Share {
            fraction: percent / 100.0,
            margin: 0.0,
            min: None,
            max: None,
        }
    }

    #[test]
    fn equal_shares() {
        let sizes = distribute(200.0, &[share(50.0), share(50.0)]);
        assert_eq!(sizes, &[100.0, 100.0]);
    }

    #[test]
    fn shares_are_relative_to_total() {
        let sizes = distribute(300.0, &[share(50.0), share(25.0)]);
        assert_eq!(sizes, &[200.0, 100.0]);
    }

    #[test]
    fn margins_come_out_of_each_share() {
        let with_margin = Share {
            margin: 10.0,
            ..share(50.0)
        };
        let sizes = distribute(200.0, &[with_margin, share(50.0)]);
        assert_eq!(sizes, &[90.0, 100.0]);
    }

    #[test]
    fn max_pins_and_redistributes() {
        let capped = Share {
            max: Some(40.0),
            ..share(50.0)
        };
        let sizes = distribute(200.0, &[capped, share(50.0)]);
        assert_eq!(sizes, &[40.0, 160.0]);
    }

    #[test]
    fn min_pins_and_redistributes() {
        let floored = Share {
            min: Some(150.0),
            ..share(25.0)
        };
        let sizes = distribute(200.0, &[floored, share(75.0)]);
        assert_eq!(sizes, &[150.0, 50.0]);
    }

    #[test]
    fn min_outranks_a_max_that_binds_first() {
        let capped = Share {
            max: Some(80.0),
            ..share(90.0)
        };
        let floored = Share {
            min: Some(50.0),
            ..share(10.0)
        };
        let sizes = distribute(100.0, &[capped, floored]);
        assert_eq!(sizes, &[50.0, 50.0]);
    }

    #[test]
    fn degenerate_space() {
        let sizes = distribute(-20.0, &[share(100.0)]);
        assert_eq!(sizes, &[DEGENERATE_SPACE]);
        let sizes = distribute(f64::INFINITY, &[share(100.0)]);
        assert_eq!(sizes, &[DEGENERATE_SPACE]);
    }

    #[test]
    fn zero_percent_gets_nothing() {
        let sizes = distribute(100.0, &[share(0.0)]);
        assert_eq!(sizes, &[0.0]);
    }

    #[test]
    fn unbounded_shares_conserve_space() {
        let mut state = 0x9e37_79b9_7f4a_7c15_u64;
        let mut next = move |n: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % n
        };
        for _ in 0..200 {
            let available = 1.0 + next(1000) as f64;
            let shares: Vec<Share> = (0..1 + next(6))
                .map(|_| share(1.0 + next(100) as f64))
                .collect();
            let total: f64 = distribute(available, &shares).iter().sum();
            assert!((total - available).abs() < 1e-6, "{total} != {available}");
        }
    }

    #[test]
    fn clamped_shares_fit_when_bounds_allow() {
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let mut next = move |n: u64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state % n
        };
        for _ in 0..500 {
            let available = 50.0 + next(500) as f64;
            let shares: Vec<Share> = (0..1 + next(5))
                .map(|_| {
                    let min = (next(3) == 0).then(|| next(80) as f64);
                    let max = (next(3) == 0).then(|| min.unwrap_or(0.0) + next(200) as f64);
                    Share {
                        min,
                        max,
                        ..share(1.0 + next(100) as f64)
                    }
                })
                .collect();
            let floor: f64 = shares.iter().filter_map(|s| s.min).sum();
            let ceiling: Option<f64> = shares.iter().map(|s| s.max).sum();
            let sizes = distribute(available, &shares);
            let total: f64 = sizes.iter().sum();
            for (size, s) in sizes.iter().zip(&shares) {
                assert!(s.min.is_none_or(|min| *size >= min - 1e-9), "{size} below {s:?}");
                assert!(s.max.is_none_or(|max| *size <= max + 1e-9), "{size} above {s:?}");
            }
            if floor <= available {
                assert!(total <= available + 1e-6, "{total} overflows {available}");
            }
            if floor <= available && ceiling.is_none_or(|c| c >= available) {
                assert!((total - available).abs() < 1e-6, "{total} != {available}");
            }
        }
    }
}

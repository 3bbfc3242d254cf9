// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setting animations and show/hide transitions.
//!
//! An animation interpolates one public setting of one node from its current
//! value to a target over a duration. Time is driven by the host through
//! [`Scene::advance`]; nothing here reads a clock. Each step writes through
//! the ordinary settings path, so animated values are flushed like any other
//! change.
//!
//! Every animation hands back a [`Transition`], a future that resolves with
//! a [`TransitionOutcome`] once the animation finishes, is replaced by a
//! newer animation of the same key, or its node is disposed. A finished
//! animation resolves at the end of the next flush, once its final values
//! have reached the backend. Hosts without an executor can poll
//! [`Transition::outcome`] instead.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use core::time::Duration;

use crate::backend::Backend;
use crate::node::NodeId;
use crate::scene::Scene;
use crate::settings::{Animatable, Key, KeyId, Length, Value, keys, percent};

/// Maps linear progress to eased progress. Both run from 0 to 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Easing {
    /// Constant speed.
    #[default]
    Linear,
    /// Starts slow.
    CubicIn,
    /// Ends slow.
    CubicOut,
    /// Starts and ends slow.
    CubicInOut,
}

impl Easing {
    /// Applies the curve to `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicIn => t * t * t,
            Self::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 - 2.0 * t;
                    1.0 - u * u * u / 2.0
                }
            }
        }
    }
}

/// Identifies a running animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

/// How a [`Transition`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionOutcome {
    /// The animation reached its target and a flush applied it.
    Finished,
    /// A newer animation of the same setting replaced it, or it was stopped.
    Interrupted,
    /// The node was disposed.
    Cancelled,
}

#[derive(Debug, Default)]
struct TransitionState {
    outcome: Option<TransitionOutcome>,
    waker: Option<Waker>,
}

/// Completion handle of an animation.
///
/// Resolves once. Clones observe the same animation.
#[derive(Clone, Debug)]
#[must_use = "a transition does nothing unless the scene is advanced; drop it to ignore completion"]
pub struct Transition {
    id: AnimationId,
    state: Rc<RefCell<TransitionState>>,
}

impl Transition {
    fn pending(id: AnimationId) -> Self {
        Self {
            id,
            state: Rc::default(),
        }
    }

    fn resolved(id: AnimationId, outcome: TransitionOutcome) -> Self {
        let transition = Self::pending(id);
        transition.resolve(outcome);
        transition
    }

    fn resolve(&self, outcome: TransitionOutcome) {
        let waker = {
            let mut state = self.state.borrow_mut();
            if state.outcome.is_some() {
                return;
            }
            state.outcome = Some(outcome);
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Returns the animation this transition tracks.
    #[inline]
    #[must_use]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    /// Returns how the animation ended, or `None` while it runs.
    #[must_use]
    pub fn outcome(&self) -> Option<TransitionOutcome> {
        self.state.borrow().outcome
    }

    /// Returns whether the animation has ended.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.outcome().is_some()
    }
}

impl Future for Transition {
    type Output = TransitionOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.state.borrow_mut();
        if let Some(outcome) = state.outcome {
            return Poll::Ready(outcome);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

/// What happens to the node when an animation reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OnFinish {
    Nothing,
    Hide,
}

#[derive(Debug)]
struct Animation {
    node: NodeId,
    key: KeyId,
    from: Value,
    to: Value,
    duration: Duration,
    elapsed: Duration,
    easing: Easing,
    on_finish: OnFinish,
    transition: Transition,
}

impl Animation {
    fn progress(&self) -> f64 {
        if self.elapsed >= self.duration {
            1.0
        } else {
            self.elapsed.as_secs_f64() / self.duration.as_secs_f64()
        }
    }
}

/// Running animations, in start order.
#[derive(Debug, Default)]
pub(crate) struct Animations {
    entries: Vec<Animation>,
    /// Finished animations waiting for the flush that carries their values.
    settling: Vec<(NodeId, Transition)>,
    next_id: u64,
}

impl Animations {
    fn next_id(&mut self) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds an animation, interrupting any running one on the same node and key.
    fn insert(&mut self, animation: Animation) {
        self.entries.retain(|a| {
            let replaced = a.node == animation.node && a.key == animation.key;
            if replaced {
                a.transition.resolve(TransitionOutcome::Interrupted);
            }
            !replaced
        });
        self.entries.push(animation);
    }

    fn stop_node(&mut self, node: NodeId, outcome: TransitionOutcome) -> usize {
        let before = self.entries.len();
        self.entries.retain(|a| {
            let hit = a.node == node;
            if hit {
                a.transition.resolve(outcome);
            }
            !hit
        });
        before - self.entries.len()
    }

    /// Resolves every animation of a disposed node as cancelled.
    pub(crate) fn cancel_node(&mut self, node: NodeId) {
        self.stop_node(node, TransitionOutcome::Cancelled);
        self.settling.retain(|(n, transition)| {
            if *n == node {
                transition.resolve(TransitionOutcome::Cancelled);
            }
            *n != node
        });
    }

    /// Resolves the animations finished before this flush.
    pub(crate) fn settle(&mut self) {
        for (_, transition) in self.settling.drain(..) {
            transition.resolve(TransitionOutcome::Finished);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_animating(&self, node: NodeId) -> bool {
        self.entries.iter().any(|a| a.node == node)
    }
}

/// Value an unset key starts animating from, shaped like the target.
fn start_value(key: KeyId, to: &Value) -> Value {
    match to {
        Value::Length(Length::Percent(_)) => Value::Length(Length::Percent(percent(0.0))),
        Value::Length(_) => Value::Length(Length::Px(0.0)),
        _ => Value::Number(key.numeric_default()),
    }
}

impl<B: Backend> Scene<B> {
    /// Animates a public setting from its current value to `to`.
    ///
    /// A zero duration writes `to` immediately. Starting an animation of a
    /// key that is already animating interrupts the older one. The returned
    /// transition is cancelled right away for a disposed node.
    pub fn animate<T: Animatable>(
        &mut self,
        id: NodeId,
        key: Key<T>,
        to: T,
        duration: Duration,
        easing: Easing,
    ) -> Transition {
        self.start_animation(id, key.id(), to.into_value(), duration, easing, OnFinish::Nothing)
    }

    fn start_animation(
        &mut self,
        id: NodeId,
        key: KeyId,
        to: Value,
        duration: Duration,
        easing: Easing,
        on_finish: OnFinish,
    ) -> Transition {
        let anim_id = self.animations.next_id();
        if !self.is_alive(id) {
            return Transition::resolved(anim_id, TransitionOutcome::Cancelled);
        }
        let from = self.settings[id.idx as usize]
            .raw(key)
            .cloned()
            .unwrap_or_else(|| start_value(key, &to));
        let transition = Transition::pending(anim_id);
        self.animations.insert(Animation {
            node: id,
            key,
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
            easing,
            on_finish,
            transition: transition.clone(),
        });
        if duration.is_zero() {
            self.advance(Duration::ZERO);
        }
        transition
    }

    /// Moves every running animation forward by `dt`.
    ///
    /// Writes the interpolated values, then finishes animations that reached
    /// their target. Their transitions resolve at the end of the next flush.
    /// Returns the number still running.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let mut writes = Vec::new();
        let mut finished = Vec::new();
        let mut i = 0;
        while i < self.animations.entries.len() {
            let anim = &mut self.animations.entries[i];
            anim.elapsed = anim.elapsed.saturating_add(dt);
            let t = anim.progress();
            writes.push((
                anim.node,
                anim.key,
                Value::lerp(&anim.from, &anim.to, anim.easing.apply(t)),
            ));
            if t >= 1.0 {
                finished.push(self.animations.entries.remove(i));
            } else {
                i += 1;
            }
        }

        for (node, key, value) in writes {
            if self.is_alive(node) {
                self.write_public(node.idx, key, Some(value));
            }
        }
        for anim in finished {
            if anim.on_finish == OnFinish::Hide && self.is_alive(anim.node) {
                self.write_public(anim.node.idx, KeyId::Visible, Some(Value::Flag(false)));
            }
            self.animations.settling.push((anim.node, anim.transition));
        }
        self.animations.entries.len()
    }

    /// Makes a node visible and fades its opacity in to 1.
    ///
    /// A hidden node starts from opacity 0; a visible one fades from where it
    /// is. Interrupts a running [`hide`](Self::hide).
    pub fn show(&mut self, id: NodeId, duration: Duration) -> Transition {
        if self.is_alive(id) && !self.public_or(id.idx, keys::VISIBLE, true) {
            if !duration.is_zero() {
                self.set(id, keys::OPACITY, 0.0);
            }
            self.set(id, keys::VISIBLE, true);
        }
        self.animate(id, keys::OPACITY, 1.0, duration, Easing::Linear)
    }

    /// Fades a node's opacity out to 0, then sets `visible` to false.
    pub fn hide(&mut self, id: NodeId, duration: Duration) -> Transition {
        self.start_animation(
            id,
            KeyId::Opacity,
            Value::Number(0.0),
            duration,
            Easing::Linear,
            OnFinish::Hide,
        )
    }

    /// Stops every animation of a node where it is. Returns how many stopped.
    pub fn stop_animations(&mut self, id: NodeId) -> usize {
        self.animations.stop_node(id, TransitionOutcome::Interrupted)
    }

    /// Returns whether any animation of the node is running.
    #[must_use]
    pub fn is_animating(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.animations.is_animating(id)
    }

    /// Returns whether any animation is running.
    #[must_use]
    pub fn has_animations(&self) -> bool {
        !self.animations.is_empty()
    }
}

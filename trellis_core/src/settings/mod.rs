// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node settings with change detection.
//!
//! A [`Settings`] store holds one optional [`Value`] per [`KeyId`]. Each node
//! owns two stores: public settings (written by applications) and private
//! settings (written by the engine, e.g. layout results).
//!
//! # Dirty keys
//!
//! The first time a key changes within a flush pass, its old value is kept in
//! a sparse snapshot. A key is dirty exactly when its current value differs
//! from that snapshot, so:
//!
//! - writing the current value again is a no-op;
//! - writing a key back to its snapshot value makes it clean again;
//! - [`clear_dirty`](Settings::clear_dirty) (once per flush) forgets the
//!   snapshot, making previous == current for every key.
//!
//! Dirty membership is a [`KeySet`] bitset, so checks are O(1).

pub mod keys;
mod value;

use alloc::vec::Vec;

pub use keys::{Key, KeyId};
pub use value::{Animatable, Color, Length, Percent, Position, SettingValue, Value, percent};

/// A set of [`KeyId`]s stored as a bitset.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeySet(u64);

impl KeySet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Returns whether `key` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, key: KeyId) -> bool {
        self.0 & (1 << key.index()) != 0
    }

    /// Adds `key` to the set.
    #[inline]
    pub fn insert(&mut self, key: KeyId) {
        self.0 |= 1 << key.index();
    }

    /// Removes `key` from the set.
    #[inline]
    pub fn remove(&mut self, key: KeyId) {
        self.0 &= !(1 << key.index());
    }

    /// Returns whether the set is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of keys in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates the keys in slot order.
    pub fn iter(self) -> impl Iterator<Item = KeyId> {
        ALL_KEYS.iter().copied().filter(move |&k| self.contains(k))
    }
}

impl core::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

const ALL_KEYS: [KeyId; KeyId::COUNT] = [
    KeyId::X,
    KeyId::Y,
    KeyId::Dx,
    KeyId::Dy,
    KeyId::CenterX,
    KeyId::CenterY,
    KeyId::Width,
    KeyId::Height,
    KeyId::MinWidth,
    KeyId::MaxWidth,
    KeyId::MinHeight,
    KeyId::MaxHeight,
    KeyId::PaddingLeft,
    KeyId::PaddingRight,
    KeyId::PaddingTop,
    KeyId::PaddingBottom,
    KeyId::MarginLeft,
    KeyId::MarginRight,
    KeyId::MarginTop,
    KeyId::MarginBottom,
    KeyId::Position,
    KeyId::Visible,
    KeyId::ForceHidden,
    KeyId::Opacity,
    KeyId::Rotation,
    KeyId::Scale,
    KeyId::Interactive,
    KeyId::Draggable,
    KeyId::Tooltip,
    KeyId::TooltipText,
    KeyId::Fill,
    KeyId::Stroke,
    KeyId::StrokeWidth,
    KeyId::Draw,
    KeyId::Text,
    KeyId::FontSize,
    KeyId::Layout,
    KeyId::Background,
    KeyId::Mask,
    KeyId::MaskContent,
];

/// What a write did to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// The new value equals the current one; nothing happened.
    Unchanged,
    /// The value changed and the key is now dirty.
    Dirty,
    /// The value changed back to its snapshot; the key is clean again.
    Restored,
}

impl Change {
    /// Returns whether the stored value changed.
    #[inline]
    #[must_use]
    pub const fn is_changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// One node's settings of one kind (public or private).
#[derive(Clone, Debug)]
pub struct Settings {
    values: [Option<Value>; KeyId::COUNT],
    snapshot: Vec<(KeyId, Option<Value>)>,
    dirty: KeySet,
    deferred: Vec<(KeyId, Option<Value>)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: [const { None }; KeyId::COUNT],
            snapshot: Vec::new(),
            dirty: KeySet::EMPTY,
            deferred: Vec::new(),
        }
    }

    /// Returns the typed value of `key`, if set.
    #[inline]
    #[must_use]
    pub fn get<T: SettingValue>(&self, key: Key<T>) -> Option<&T> {
        self.values[key.id().index()]
            .as_ref()
            .and_then(T::from_value)
    }

    /// Returns the value of `key`, or `fallback` when unset.
    #[inline]
    #[must_use]
    pub fn get_or<T: SettingValue + Copy>(&self, key: Key<T>, fallback: T) -> T {
        self.get(key).copied().unwrap_or(fallback)
    }

    /// Returns the raw stored value of a slot.
    #[inline]
    #[must_use]
    pub fn raw(&self, id: KeyId) -> Option<&Value> {
        self.values[id.index()].as_ref()
    }

    /// Sets `key` to `value`.
    pub fn set<T: SettingValue>(&mut self, key: Key<T>, value: T) -> Change {
        self.write(key.id(), Some(value.into_value()))
    }

    /// Unsets `key`.
    pub fn remove<T>(&mut self, key: Key<T>) -> Change {
        self.write(key.id(), None)
    }

    /// Writes a raw value into a slot, tracking dirtiness.
    pub fn write(&mut self, id: KeyId, value: Option<Value>) -> Change {
        let slot = &mut self.values[id.index()];
        if *slot == value {
            return Change::Unchanged;
        }
        let old = core::mem::replace(slot, value);
        let at = match self.snapshot.iter().position(|(k, _)| *k == id) {
            Some(at) => at,
            None => {
                self.snapshot.push((id, old));
                self.snapshot.len() - 1
            }
        };
        if self.snapshot[at].1 == self.values[id.index()] {
            self.dirty.remove(id);
            Change::Restored
        } else {
            self.dirty.insert(id);
            Change::Dirty
        }
    }

    /// Stages a value to be written by the next [`apply_deferred`](Self::apply_deferred).
    ///
    /// Later stages for the same key replace earlier ones.
    pub fn defer(&mut self, id: KeyId, value: Option<Value>) {
        if let Some(entry) = self.deferred.iter_mut().find(|(k, _)| *k == id) {
            entry.1 = value;
        } else {
            self.deferred.push((id, value));
        }
    }

    /// Returns whether writes are staged.
    #[inline]
    #[must_use]
    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Writes every staged value and returns the keys that changed.
    pub fn apply_deferred(&mut self) -> KeySet {
        let mut changed = KeySet::EMPTY;
        for (id, value) in core::mem::take(&mut self.deferred) {
            if self.write(id, value).is_changed() {
                changed.insert(id);
            }
        }
        changed
    }

    /// Returns whether `key` differs from its value at the last clear.
    #[inline]
    #[must_use]
    pub fn is_dirty<T>(&self, key: Key<T>) -> bool {
        self.dirty.contains(key.id())
    }

    /// Returns the dirty keys.
    #[inline]
    #[must_use]
    pub fn dirty(&self) -> KeySet {
        self.dirty
    }

    /// Returns the value `key` had at the last clear.
    #[must_use]
    pub fn previous<T: SettingValue>(&self, key: Key<T>) -> Option<&T> {
        match self.snapshot.iter().find(|(k, _)| *k == key.id()) {
            Some((_, prev)) => prev.as_ref().and_then(T::from_value),
            None => self.get(key),
        }
    }

    /// Forgets the snapshot so every key is clean.
    pub fn clear_dirty(&mut self) {
        self.snapshot.clear();
        self.dirty = KeySet::EMPTY;
    }

    /// Returns whether any change has happened since the last clear.
    #[inline]
    #[must_use]
    pub fn is_touched(&self) -> bool {
        !self.snapshot.is_empty()
    }
}

// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Setting value types.

use alloc::string::String;

use crate::draw::Drawing;
use crate::layout::Layout;
use crate::node::NodeId;

/// A relative value expressed as a fraction of some reference length.
///
/// Constructed from a percentage (`Percent::new(50.0)`) and stored as the
/// fraction (`0.5`), which is what every resolver multiplies by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Percent(f64);

impl Percent {
    /// Creates a percent value from a percentage in the `0..=100` range.
    ///
    /// Values outside the range are kept; a 150% child is legal.
    #[inline]
    #[must_use]
    pub const fn new(percent: f64) -> Self {
        Self(percent / 100.0)
    }

    /// Returns the fraction (`percent / 100`).
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the original percentage.
    #[inline]
    #[must_use]
    pub const fn percent(self) -> f64 {
        self.0 * 100.0
    }

    /// Resolves this percent against a reference length.
    #[inline]
    #[must_use]
    pub fn of(self, reference: f64) -> f64 {
        reference * self.0
    }
}

/// Shorthand for [`Percent::new`].
#[inline]
#[must_use]
pub const fn percent(value: f64) -> Percent {
    Percent::new(value)
}

/// A declared length: absolute pixels or a percent of the parent's inner box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    /// Absolute pixels.
    Px(f64),
    /// Fraction of the reference length (usually the parent's inner size).
    Percent(Percent),
}

impl Length {
    /// Resolves the length against a reference size.
    #[inline]
    #[must_use]
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(p) => p.of(reference),
        }
    }

    /// Returns the pixel value if this is an absolute length.
    #[inline]
    #[must_use]
    pub const fn px(self) -> Option<f64> {
        match self {
            Self::Px(px) => Some(px),
            Self::Percent(_) => None,
        }
    }

    /// Returns the percent if this is a relative length.
    #[inline]
    #[must_use]
    pub const fn as_percent(self) -> Option<Percent> {
        match self {
            Self::Px(_) => None,
            Self::Percent(p) => Some(p),
        }
    }
}

impl From<f64> for Length {
    fn from(px: f64) -> Self {
        Self::Px(px)
    }
}

impl From<Percent> for Length {
    fn from(p: Percent) -> Self {
        Self::Percent(p)
    }
}

/// How a node participates in its parent's sizing and layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    /// Laid out by the parent and included in its content bounds.
    #[default]
    Relative,
    /// Positioned only by its own `x`/`y`; ignored by layouts and auto-sizing.
    Absolute,
}

/// A straight-alpha RGBA color with 8-bit channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color from a `0xRRGGBB` literal.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each channel is masked to its low byte"
    )]
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

/// Dynamically typed storage for a single setting.
///
/// Callers never see this directly; typed access goes through
/// [`Key`](super::Key) and [`SettingValue`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A plain number.
    Number(f64),
    /// A boolean flag.
    Flag(bool),
    /// A pixel or percent length.
    Length(Length),
    /// A positioning mode.
    Position(Position),
    /// A color.
    Color(Color),
    /// A layout strategy.
    Layout(Layout),
    /// A reference to another node.
    Node(NodeId),
    /// A string.
    Text(String),
    /// Drawing commands.
    Drawing(Drawing),
}

impl Value {
    /// Interpolates between two values of the same variant.
    ///
    /// Numbers interpolate linearly, as do lengths of matching units. Anything
    /// else steps to `to` once `t` reaches 1.
    #[must_use]
    pub fn lerp(from: &Self, to: &Self, t: f64) -> Self {
        match (from, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(a + (b - a) * t),
            (Self::Length(Length::Px(a)), Self::Length(Length::Px(b))) => {
                Self::Length(Length::Px(a + (b - a) * t))
            }
            (Self::Length(Length::Percent(a)), Self::Length(Length::Percent(b))) => {
                let v = a.value() + (b.value() - a.value()) * t;
                Self::Length(Length::Percent(Percent(v)))
            }
            _ if t >= 1.0 => to.clone(),
            _ => from.clone(),
        }
    }
}

/// A Rust type that can be stored in the settings store.
///
/// Implemented for every type with a [`Value`] variant.
pub trait SettingValue: Clone + PartialEq + Sized {
    /// Wraps the value for storage.
    fn into_value(self) -> Value;

    /// Borrows the typed value out of storage, if the variant matches.
    fn from_value(value: &Value) -> Option<&Self>;
}

macro_rules! setting_value {
    ($ty:ty, $variant:ident) => {
        impl SettingValue for $ty {
            #[inline]
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            #[inline]
            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

setting_value!(f64, Number);
setting_value!(bool, Flag);
setting_value!(Length, Length);
setting_value!(Position, Position);
setting_value!(Color, Color);
setting_value!(Layout, Layout);
setting_value!(NodeId, Node);
setting_value!(String, Text);
setting_value!(Drawing, Drawing);

/// A setting type that can be animated.
pub trait Animatable: SettingValue {}

impl Animatable for f64 {}
impl Animatable for Length {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_stores_fraction() {
        let p = percent(50.0);
        assert_eq!(p.value(), 0.5);
        assert_eq!(p.percent(), 50.0);
        assert_eq!(p.of(300.0), 150.0);
    }

    #[test]
    fn length_resolve() {
        assert_eq!(Length::Px(12.0).resolve(1000.0), 12.0);
        assert_eq!(Length::from(percent(25.0)).resolve(200.0), 50.0);
        assert_eq!(Length::Px(3.0).px(), Some(3.0));
        assert!(Length::Px(3.0).as_percent().is_none());
    }

    #[test]
    fn lerp_numbers_and_lengths() {
        assert_eq!(
            Value::lerp(&Value::Number(0.0), &Value::Number(10.0), 0.25),
            Value::Number(2.5)
        );
        assert_eq!(
            Value::lerp(
                &Value::Length(Length::Px(10.0)),
                &Value::Length(Length::Px(20.0)),
                0.5
            ),
            Value::Length(Length::Px(15.0))
        );
    }

    #[test]
    fn lerp_mixed_units_steps_at_end() {
        let from = Value::Length(Length::Px(10.0));
        let to = Value::Length(Length::Percent(percent(50.0)));
        assert_eq!(Value::lerp(&from, &to, 0.9), from);
        assert_eq!(Value::lerp(&from, &to, 1.0), to);
    }

    #[test]
    fn color_from_hex() {
        assert_eq!(Color::from_hex(0x10_20_30), Color::rgb(0x10, 0x20, 0x30));
    }
}

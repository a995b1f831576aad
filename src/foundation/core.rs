use std::ops::{Add, Mul};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Interpolation contract for values that blend between two keyframes.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` in `[0, 1]`.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        (*a as f64 + ((*b as f64 - *a as f64) * t)) as f32
    }
}

/// Component-wise blend of the 2x2 linear part and the translation.
impl Lerp for Affine {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let ca = a.as_coeffs();
        let cb = b.as_coeffs();
        let mut out = [0.0; 6];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = ca[i] + (cb[i] - ca[i]) * t;
        }
        Affine::new(out)
    }
}

/// Straight (non-premultiplied) RGBA color with floating-point channels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Rgba {
    /// All channels at `1.0`.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// All channels at `0.0`.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Build a color from its four channels.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` (alpha = 1). Returns `None` on malformed input.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| -> Option<f32> {
            u8::from_str_radix(hex.get(i..i + 2)?, 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 1.0))
    }

    /// Channels as an array in `r, g, b, a` order.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Apply `f` to every channel.
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b), f(self.a))
    }
}

impl Mul for Rgba {
    type Output = Rgba;

    fn mul(self, rhs: Rgba) -> Rgba {
        Rgba::new(
            self.r * rhs.r,
            self.g * rhs.g,
            self.b * rhs.b,
            self.a * rhs.a,
        )
    }
}

impl Add for Rgba {
    type Output = Rgba;

    fn add(self, rhs: Rgba) -> Rgba {
        Rgba::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}

impl Lerp for Rgba {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self::new(
            f32::lerp(&a.r, &b.r, t),
            f32::lerp(&a.g, &b.g, t),
            f32::lerp(&a.b, &b.b, t),
            f32::lerp(&a.a, &b.a, t),
        )
    }
}

/// Multiplicative + additive color transform: `out = base * mult + add`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorEffect {
    /// Per-channel multiplier.
    pub mult: Rgba,
    /// Per-channel offset, in `[0, 1]` channel units (may be negative).
    pub add: Rgba,
}

impl ColorEffect {
    /// The effect that leaves every color unchanged.
    pub const IDENTITY: Self = Self {
        mult: Rgba::ONE,
        add: Rgba::ZERO,
    };

    /// Apply this effect to a base color.
    pub fn apply(self, base: Rgba) -> Rgba {
        base * self.mult + self.add
    }

    /// Return `true` when the effect is exactly the identity.
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

impl Default for ColorEffect {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Fold a child effect into its parent (`parent * child`).
///
/// `(parent * child).apply(x) == child.apply(parent.apply(x))`, which makes the operator
/// associative.
impl Mul for ColorEffect {
    type Output = ColorEffect;

    fn mul(self, child: ColorEffect) -> ColorEffect {
        ColorEffect {
            mult: self.mult * child.mult,
            add: self.add * child.mult + child.add,
        }
    }
}

impl Lerp for ColorEffect {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            mult: Rgba::lerp(&a.mult, &b.mult, t),
            add: Rgba::lerp(&a.add, &b.add, t),
        }
    }
}

/// Half-open frame span `[start, end)` in timeline space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpan {
    /// Inclusive start frame.
    pub start: u32,
    /// Exclusive end frame.
    pub end: u32,
}

impl FrameSpan {
    /// Build a span, swapping bounds if given in reverse.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Number of frames covered.
    pub fn len_frames(self) -> u32 {
        self.end - self.start
    }

    /// Return `true` when the span has no frames.
    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Return `true` when `frame` lies in `[start, end)`.
    pub fn contains(self, frame: u32) -> bool {
        self.start <= frame && frame < self.end
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

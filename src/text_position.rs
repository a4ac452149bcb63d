//! The text-position ordering comparator (§4.6): a pure ordering function over
//! rotated glyph coordinates. No glyph layout or text extraction lives here —
//! this is only the comparator a text-extraction collaborator would call.

use std::cmp::Ordering;

/// Page rotation, in the four values PDF's `/Rotate` entry is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Zero,
    Ninety,
    OneEighty,
    TwoSeventy,
}

impl Rotation {
    /// Normalize a raw `/Rotate` value (any multiple of 90, including negative
    /// or out-of-range ones) to one of the four canonical rotations.
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Ninety,
            180 => Rotation::OneEighty,
            270 => Rotation::TwoSeventy,
            _ => Rotation::Zero,
        }
    }
}

/// A glyph position in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPosition {
    pub x: f64,
    pub y: f64,
}

impl TextPosition {
    pub fn new(x: f64, y: f64) -> Self {
        TextPosition { x, y }
    }
}

/// Order two positions the way text extraction expects to walk a page: by
/// rotated `y'` ascending, then rotated `x'` ascending.
///
/// The 90° branch intentionally reads `b.x` for both operands' second
/// coordinate rather than `b.y` — this mirrors a known quirk in the ordering
/// table this comparator is specified against (§9 Open Questions) and is kept
/// verbatim rather than "fixed", since the contract here is the table, not
/// the presumed intent behind it.
pub fn compare(rotation: Rotation, a: TextPosition, b: TextPosition) -> Ordering {
    let (a_y, a_x, b_y, b_x) = match rotation {
        Rotation::Zero => (a.y, a.x, b.y, b.x),
        Rotation::Ninety => (a.x, a.y, b.x, b.x),
        Rotation::OneEighty => (-a.y, -a.x, -b.y, -b.x),
        Rotation::TwoSeventy => (-a.y, -a.x, -b.y, -b.x),
    };
    a_y.partial_cmp(&b_y)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_x.partial_cmp(&b_x).unwrap_or(Ordering::Equal))
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB colors as the rendering engine sees them (0.0 - 1.0 per channel).

use serde::{Deserialize, Serialize};

/// Linear RGB color, components in `0.0..=1.0`.
///
/// Engines hand colors back as `Float32Array`s, so comparisons go through
/// [`Color::approx_eq`] rather than `==`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Default selection highlight (amber)
    pub const HIGHLIGHT: Color = Color::new(1.0, 0.85, 0.0);
    /// Default tint for non-selected objects in wireframe mode
    pub const NEUTRAL: Color = Color::new(0.6, 0.6, 0.6);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a slice of at least three components.
    /// Returns `None` for short slices or non-finite values.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [r, g, b, ..] if r.is_finite() && g.is_finite() && b.is_finite() => {
                Some(Self::new(*r, *g, *b))
            }
            _ => None,
        }
    }

    /// Component-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Color, tolerance: f32) -> bool {
        (self.r - other.r).abs() <= tolerance
            && (self.g - other.g).abs() <= tolerance
            && (self.b - other.b).abs() <= tolerance
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Color> for [f32; 3] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color node.

use crate::error::Result;
use crate::graph::Lookup;
use crate::node::NodeTag;
use serde::Deserialize;

/// Packs four value nodes into an ARGB color.
///
/// `r`, `g` and `b` are read in `0..=255`, `a` in `0..=1`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorNode {
    /// Red channel node
    pub r: NodeTag,
    /// Green channel node
    pub g: NodeTag,
    /// Blue channel node
    pub b: NodeTag,
    /// Alpha channel node
    pub a: NodeTag,
}

/// Round a channel to a byte
fn channel(value: f64) -> u32 {
    value.round().clamp(0.0, 255.0) as u32
}

/// Pack channels into ARGB
pub(crate) fn pack_argb(a: f64, r: f64, g: f64, b: f64) -> u32 {
    (channel(a) << 24) | (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

/// Split ARGB into channels
pub(crate) fn unpack_argb(color: u32) -> [f64; 4] {
    [24, 16, 8, 0].map(|shift| f64::from((color >> shift) & 0xff))
}

impl ColorNode {
    /// Current packed color
    pub(crate) fn argb(&self, tag: NodeTag, lookup: &Lookup<'_>) -> Result<u32> {
        let r = lookup.value(tag, self.r)?;
        let g = lookup.value(tag, self.g)?;
        let b = lookup.value(tag, self.b)?;
        let a = lookup.value(tag, self.a)?;
        Ok(pack_argb(a * 255.0, r, g, b))
    }
}

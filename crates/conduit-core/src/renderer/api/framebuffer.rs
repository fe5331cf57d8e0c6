// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Render targets, viewports and clear requests.

use crate::renderer::api::TextureId;
use std::borrow::Cow;

/// An opaque handle to a device-side custom render target.
///
/// The default (swap-chain) target has no id; it is addressed as `None`
/// wherever an `Option<FrameBufferId>` is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameBufferId(pub usize);

/// A descriptor used to create a [`FrameBufferId`].
#[derive(Debug, Clone)]
pub struct FrameBufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The color attachment, if any.
    pub color: Option<TextureId>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// If `true`, a depth attachment is created alongside.
    pub depth: bool,
    /// If `true`, the depth attachment carries a stencil component.
    pub stencil: bool,
}

/// Width and height of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A rectangle in framebuffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// The rectangle covering a whole target.
    pub fn covering(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
        }
    }

    /// Scales a rectangle given in normalized `[0, 1]` coordinates to `extent`.
    pub fn from_normalized(x: f32, y: f32, width: f32, height: f32, extent: Extent2D) -> Self {
        let w = extent.width as f32;
        let h = extent.height as f32;
        Self {
            x: x * w,
            y: y * h,
            width: width * w,
            height: height * h,
        }
    }
}

/// Which attachments a clear affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    /// Nothing is cleared.
    pub const NONE: Self = Self { bits: 0 };
    /// Clear the color attachment.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// Clear the depth attachment.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// Clear the stencil attachment.
    pub const STENCIL: Self = Self { bits: 1 << 2 };

    /// Creates flags from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self { bits: bits & 0b111 }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Checks whether all of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no attachment is selected.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

/// A request to clear the attachments of the bound target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearRequest {
    /// The attachments to clear.
    pub flags: ClearFlags,
    /// RGBA clear color.
    pub color: [f32; 4],
    /// Depth clear value.
    pub depth: f32,
    /// Stencil clear value.
    pub stencil: u8,
}

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

//! Retained binding and raster state of the engine.

use conduit_core::renderer::{
    BlendMode, CompareFunction, CullMode, Extent2D, FrontFace, Rect, RenderError, RenderState,
    StencilOperation, StencilState,
};
use conduit_core::Handle;

/// A rectangle in normalized `[0, 1]` target coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn to_pixels(self, extent: Extent2D) -> Rect {
        Rect::from_normalized(self.x, self.y, self.width, self.height, extent)
    }
}

/// What the next draw will use.
///
/// Bindings persist across frames until changed or deleted.
#[derive(Debug)]
pub(crate) struct BoundState {
    pub program: Option<Handle>,
    pub vertex_array: Option<Handle>,
    pub frame_buffer: Handle,
    pub render_state: RenderState,
    pub viewport: Option<NormalizedRect>,
    pub scissor: Option<NormalizedRect>,
    /// Viewport or scissor changed since they were last applied.
    pub view_dirty: bool,
}

impl BoundState {
    pub fn new(default_frame_buffer: Handle) -> Self {
        Self {
            program: None,
            vertex_array: None,
            frame_buffer: default_frame_buffer,
            render_state: RenderState::default(),
            viewport: None,
            scissor: None,
            view_dirty: true,
        }
    }

    /// The viewport in pixels of a target of size `extent`.
    pub fn viewport_rect(&self, extent: Extent2D) -> Rect {
        self.viewport
            .map_or_else(|| Rect::covering(extent), |viewport| viewport.to_pixels(extent))
    }

    /// The scissor in pixels of a target of size `extent`, if enabled.
    pub fn scissor_rect(&self, extent: Extent2D) -> Option<Rect> {
        self.scissor.map(|scissor| scissor.to_pixels(extent))
    }
}

/// Applies the combined culling, depth bias and winding command.
pub(crate) fn apply_cull_state(
    state: &mut RenderState,
    culling: bool,
    cull_back_faces: bool,
    z_offset: f32,
    z_offset_units: f32,
    reverse_side: bool,
) {
    state.cull_mode = match (culling, cull_back_faces) {
        (false, _) => CullMode::None,
        (true, true) => CullMode::Back,
        (true, false) => CullMode::Front,
    };
    state.front_face = if reverse_side {
        FrontFace::Cw
    } else {
        FrontFace::Ccw
    };
    state.depth_bias.factor = z_offset;
    state.depth_bias.units = z_offset_units;
}

/// Converts a depth function code; `0` disables the depth test.
pub(crate) fn depth_test_from_code(code: u32) -> Result<Option<CompareFunction>, RenderError> {
    if code == 0 {
        return Ok(None);
    }
    CompareFunction::from_code(code)
        .map(Some)
        .ok_or_else(|| RenderError::InvalidOperation(format!("unknown depth function {code:#x}")))
}

pub(crate) fn blend_mode_from_code(code: u32) -> Result<BlendMode, RenderError> {
    BlendMode::from_code(code)
        .ok_or_else(|| RenderError::InvalidOperation(format!("unknown alpha mode {code}")))
}

fn stencil_op(code: u32) -> Result<StencilOperation, RenderError> {
    StencilOperation::from_code(code)
        .ok_or_else(|| RenderError::InvalidOperation(format!("unknown stencil operation {code:#x}")))
}

/// The raw stencil command arguments, in wire order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StencilArgs {
    pub write_mask: u32,
    pub fail_op: u32,
    pub depth_fail_op: u32,
    pub pass_op: u32,
    pub function: u32,
    pub reference: u32,
    pub read_mask: u32,
    pub enabled: bool,
}

impl StencilArgs {
    /// Validates every code before anything is applied.
    pub fn to_state(self) -> Result<StencilState, RenderError> {
        let compare = CompareFunction::from_code(self.function).ok_or_else(|| {
            RenderError::InvalidOperation(format!("unknown stencil function {:#x}", self.function))
        })?;
        Ok(StencilState {
            enabled: self.enabled,
            compare,
            reference: (self.reference & 0xFF) as u8,
            read_mask: (self.read_mask & 0xFF) as u8,
            write_mask: (self.write_mask & 0xFF) as u8,
            fail_op: stencil_op(self.fail_op)?,
            depth_fail_op: stencil_op(self.depth_fail_op)?,
            pass_op: stencil_op(self.pass_op)?,
        })
    }
}

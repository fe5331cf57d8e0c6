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

//! Draw calls and primitive assembly.

/// Defines how vertices are connected to form a geometric primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Isolated points.
    PointList,
    /// Isolated lines (every two vertices form a line).
    LineList,
    /// A connected line strip.
    LineStrip,
    /// Isolated triangles.
    TriangleList,
    /// A connected triangle strip.
    TriangleStrip,
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Polygons are filled.
    Fill,
    /// Polygons are rendered as outlines (wireframe).
    Line,
    /// Polygon vertices are rendered as points.
    Point,
}

/// Topology and rasterization resulting from a scripting-side fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FillMode {
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
    /// Rasterization.
    pub polygon_mode: PolygonMode,
}

impl FillMode {
    /// Converts the scripting-side fill mode code.
    ///
    /// Returns `Err` with the name of the mode for codes that the device
    /// abstraction cannot express (line loops and triangle fans).
    pub fn from_code(code: u32) -> Result<Option<Self>, &'static str> {
        let (topology, polygon_mode) = match code {
            0 => (PrimitiveTopology::TriangleList, PolygonMode::Fill),
            1 => (PrimitiveTopology::TriangleList, PolygonMode::Line),
            2 => (PrimitiveTopology::TriangleList, PolygonMode::Point),
            3 => (PrimitiveTopology::PointList, PolygonMode::Fill),
            4 => (PrimitiveTopology::LineList, PolygonMode::Fill),
            5 => return Err("line loop draw mode"),
            6 => (PrimitiveTopology::LineStrip, PolygonMode::Fill),
            7 => (PrimitiveTopology::TriangleStrip, PolygonMode::Fill),
            8 => return Err("triangle fan draw mode"),
            _ => return Ok(None),
        };
        Ok(Some(Self {
            topology,
            polygon_mode,
        }))
    }
}

/// The range of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRange {
    /// Non-indexed: consecutive vertices.
    Vertices {
        /// First vertex.
        first: u32,
        /// Vertex count.
        count: u32,
    },
    /// Indexed: consecutive indices of the bound index buffer.
    Indices {
        /// First index.
        first: u32,
        /// Index count.
        count: u32,
    },
}

/// A single draw submitted to an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawCall {
    /// Primitive assembly and rasterization.
    pub fill: FillMode,
    /// What to draw.
    pub range: DrawRange,
    /// Number of instances (`1` for non-instanced draws).
    pub instance_count: u32,
}

impl DrawCall {
    /// Returns `true` if the call reads the bound index buffer.
    pub fn is_indexed(&self) -> bool {
        matches!(self.range, DrawRange::Indices { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_fill_mode_keeps_triangle_topology() {
        let fill = FillMode::from_code(1)
            .expect("supported")
            .expect("known code");
        assert_eq!(fill.topology, PrimitiveTopology::TriangleList);
        assert_eq!(fill.polygon_mode, PolygonMode::Line);
    }

    #[test]
    fn fans_and_loops_are_unsupported() {
        assert!(FillMode::from_code(5).is_err());
        assert!(FillMode::from_code(8).is_err());
        assert_eq!(FillMode::from_code(99), Ok(None));
    }
}

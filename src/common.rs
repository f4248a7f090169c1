//common.rs

use bytemuck::{Pod, Zeroable};

// --- CONSTANTS ---
pub const DEFAULT_TERRAIN_SIZE: i32 = 40;
pub const MAX_TERRAIN_SIZE: i32 = 1024;

pub const LAND_COLOR: [f32; 3] = [0.0, 0.8, 0.0];
pub const WATER_COLOR: [f32; 3] = [0.0, 0.0, 0.8];
pub const OUTLINE_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

// --- DATA TYPES ---

// position only, this is what the mesh builder emits
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { pos: [x, y, z] }
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.pos[1]
    }
}

// what actually goes to the gpu
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadedVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl ShadedVertex {
    pub fn new(v: Vertex, color: [f32; 3]) -> Self {
        Self { pos: v.pos, color }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleShade {
    Land,
    Water,
}

impl TriangleShade {
    // non-negative average counts as land, zero included
    pub fn from_average(avg_height: f32) -> Self {
        if avg_height >= 0.0 { TriangleShade::Land } else { TriangleShade::Water }
    }

    pub fn color(self) -> [f32; 3] {
        match self {
            TriangleShade::Land => LAND_COLOR,
            TriangleShade::Water => WATER_COLOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_average_is_land() {
        assert_eq!(TriangleShade::from_average(0.0), TriangleShade::Land);
        assert_eq!(TriangleShade::from_average(-0.0), TriangleShade::Land);
    }

    #[test]
    fn negative_average_is_water() {
        assert_eq!(TriangleShade::from_average(-0.001), TriangleShade::Water);
        assert_eq!(TriangleShade::Water.color(), WATER_COLOR);
        assert_eq!(TriangleShade::from_average(3.2).color(), LAND_COLOR);
    }

    #[test]
    fn gpu_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 12);
        assert_eq!(std::mem::size_of::<ShadedVertex>(), 24);
    }
}

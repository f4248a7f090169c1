//gen.rs

use crate::common::*;
use crate::error::{Result, TerrainError};
use crate::noise::{validate_size, HeightGrid};

// corner walk over one cell; the third corner is emitted twice so the run of
// six vertices splits into two triangles without an index list
const VERTEX_ROTATIONS: [(usize, usize); 5] = [(0, 0), (0, 1), (1, 1), (0, 0), (1, 0)];
const SHARED_CORNER_STEP: usize = 2;

pub const VERTS_PER_CELL: usize = 6;

/// Flat, non-indexed triangle list. Every 3 vertices form a triangle and
/// every 6 vertices cover one grid cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
}

impl VertexBuffer {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex]> + '_ {
        self.vertices.chunks_exact(3)
    }

    pub fn cells(&self) -> impl Iterator<Item = &[Vertex]> + '_ {
        self.vertices.chunks_exact(VERTS_PER_CELL)
    }
}

/// Shared-vertex variant of the same mesh: one vertex per grid sample and an
/// index list with the same winding as [`VertexBuffer`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexedMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl IndexedMesh {
    pub fn expand(&self) -> VertexBuffer {
        VertexBuffer {
            vertices: self.indices.iter().map(|&i| self.vertices[i as usize]).collect(),
        }
    }

    // per triangle (a, b, c) the outline draws a-b and b-c
    pub fn outline_indices(&self) -> Vec<u32> {
        let mut lines = Vec::with_capacity(self.indices.len() / 3 * 4);
        for tri in self.indices.chunks_exact(3) {
            lines.push(tri[0]); lines.push(tri[1]);
            lines.push(tri[1]); lines.push(tri[2]);
        }
        lines
    }
}

pub struct MeshGen;

impl MeshGen {

    fn check_shape(grid: &HeightGrid, size: i32) -> Result<usize> {
        let size = validate_size(size)?;
        if grid.size() != size {
            return Err(TerrainError::InvalidArgument(format!(
                "grid has {} cells per side but mesh size {} was requested", grid.size(), size
            )));
        }
        Ok(size)
    }

    #[inline]
    fn centred(coord: usize, size: usize) -> f32 {
        coord as f32 - size as f32 / 2.0
    }

    fn grid_vertex(grid: &HeightGrid, x: usize, z: usize, size: usize) -> Result<Vertex> {
        let h = grid.get(x, z)?;
        Ok(Vertex::new(Self::centred(x, size), h, Self::centred(z, size)))
    }

    /// Builds the flat vertex list, `size * size * 6` vertices, cells in
    /// z-major then x order.
    pub fn build(grid: &HeightGrid, size: i32) -> Result<VertexBuffer> {
        let size = Self::check_shape(grid, size)?;
        let mut vertices = Vec::with_capacity(size * size * VERTS_PER_CELL);

        for z in 0..size {
            for x in 0..size {
                for (step, &(dx, dz)) in VERTEX_ROTATIONS.iter().enumerate() {
                    let v = Self::grid_vertex(grid, x + dx, z + dz, size)?;
                    vertices.push(v);
                    if step == SHARED_CORNER_STEP {
                        vertices.push(v);
                    }
                }
            }
        }

        debug_assert_eq!(vertices.len(), size * size * VERTS_PER_CELL);
        Ok(VertexBuffer { vertices })
    }

    pub fn build_indexed(grid: &HeightGrid, size: i32) -> Result<IndexedMesh> {
        let size = Self::check_shape(grid, size)?;
        let row_len = size + 1;

        let mut vertices = Vec::with_capacity(row_len * row_len);
        for z in 0..row_len {
            for x in 0..row_len {
                vertices.push(Self::grid_vertex(grid, x, z, size)?);
            }
        }

        let idx = |x: usize, z: usize| (z * row_len + x) as u32;
        let mut indices = Vec::with_capacity(size * size * VERTS_PER_CELL);
        for z in 0..size {
            for x in 0..size {
                for (step, &(dx, dz)) in VERTEX_ROTATIONS.iter().enumerate() {
                    let i = idx(x + dx, z + dz);
                    indices.push(i);
                    if step == SHARED_CORNER_STEP {
                        indices.push(i);
                    }
                }
            }
        }

        Ok(IndexedMesh { vertices, indices })
    }

    /// One shade per triangle from the mean height of its corners.
    pub fn triangle_shades(buffer: &VertexBuffer) -> Vec<TriangleShade> {
        buffer.triangles()
            .map(|tri| {
                let avg = (tri[0].height() + tri[1].height() + tri[2].height()) / 3.0;
                TriangleShade::from_average(avg)
            })
            .collect()
    }

    pub fn shade(buffer: &VertexBuffer, shades: &[TriangleShade]) -> Vec<ShadedVertex> {
        let mut out = Vec::with_capacity(buffer.len());
        for (tri, shade) in buffer.triangles().zip(shades) {
            let color = shade.color();
            for &v in tri {
                out.push(ShadedVertex::new(v, color));
            }
        }
        out
    }

    pub fn outline_vertices(mesh: &IndexedMesh) -> Vec<ShadedVertex> {
        mesh.vertices.iter().map(|&v| ShadedVertex::new(v, OUTLINE_COLOR)).collect()
    }
}

use std::time::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use crate::common::{ShadedVertex, TriangleShade};
use crate::error::Result;
use crate::gen::{IndexedMesh, MeshGen, VertexBuffer};
use crate::noise::{HeightFieldGenerator, HeightGrid, PerturbationSource};

/// Everything rebuilt together on a regenerate. Swapped in whole, never patched.
pub struct TerrainMesh {
    pub grid: HeightGrid,
    pub vertices: VertexBuffer,
    pub indexed: IndexedMesh,
    pub shades: Vec<TriangleShade>,
}

impl TerrainMesh {
    pub fn build<S: PerturbationSource + ?Sized>(size: i32, source: &mut S) -> Result<Self> {
        let grid = HeightFieldGenerator::generate(size, source)?;
        let vertices = MeshGen::build(&grid, size)?;
        let indexed = MeshGen::build_indexed(&grid, size)?;
        let shades = MeshGen::triangle_shades(&vertices);
        Ok(Self { grid, vertices, indexed, shades })
    }

    pub fn shaded_vertices(&self) -> Vec<ShadedVertex> {
        MeshGen::shade(&self.vertices, &self.shades)
    }

    pub fn outline_vertices(&self) -> Vec<ShadedVertex> {
        MeshGen::outline_vertices(&self.indexed)
    }

    pub fn outline_indices(&self) -> Vec<u32> {
        self.indexed.outline_indices()
    }

    pub fn land_count(&self) -> usize {
        self.shades.iter().filter(|s| **s == TriangleShade::Land).count()
    }
}

pub struct TerrainState {
    size: i32,
    seed: u64,
    rng: StdRng,
    mesh: Option<TerrainMesh>,
    show_lines: bool,
    generation: u64,
}

impl TerrainState {
    pub fn new(size: i32, seed: u64, show_lines: bool) -> Self {
        Self {
            size,
            seed,
            rng: StdRng::seed_from_u64(seed),
            mesh: None,
            show_lines,
            generation: 0,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn show_lines(&self) -> bool {
        self.show_lines
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.mesh.as_ref()
    }

    pub fn vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.mesh.as_ref().map(|m| &m.vertices)
    }

    /// Builds a new grid and mesh for `size` and swaps them in.
    ///
    /// On failure the previous terrain is left untouched.
    pub fn regenerate(&mut self, size: i32) -> Result<&VertexBuffer> {
        let started = Instant::now();
        let mesh = match TerrainMesh::build(size, &mut self.rng) {
            Ok(m) => m,
            Err(e) => {
                warn!("regenerate(size={}) rejected: {}; keeping previous terrain", size, e);
                return Err(e);
            }
        };

        let stats = mesh.grid.stats();
        let triangles = mesh.shades.len();
        let land = mesh.land_count();
        self.generation += 1;
        info!(
            "terrain #{} size={} vertices={} triangles={} land={} water={} in {:.2?}",
            self.generation, size, mesh.vertices.len(), triangles, land, triangles - land, started.elapsed()
        );
        debug!("height min={:.3} max={:.3} mean={:.3}", stats.min, stats.max, stats.mean);

        self.size = size;
        let mesh = self.mesh.insert(mesh);
        Ok(&mesh.vertices)
    }

    pub fn regenerate_current(&mut self) -> Result<&VertexBuffer> {
        self.regenerate(self.size)
    }

    pub fn toggle_wireframe(&mut self) -> bool {
        self.show_lines = !self.show_lines;
        info!("outlines {}", if self.show_lines { "on" } else { "off" });
        self.show_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerrainError;

    #[test]
    fn regenerate_builds_expected_buffer() {
        let mut state = TerrainState::new(2, 42, true);
        assert!(state.vertex_buffer().is_none());
        let len = state.regenerate_current().unwrap().len();
        assert_eq!(len, 24);
        assert_eq!(state.mesh().unwrap().grid.dim(), 3);
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn failed_regenerate_keeps_previous_terrain() {
        let mut state = TerrainState::new(4, 1, true);
        let before = state.regenerate_current().unwrap().clone();
        let err = state.regenerate(-3).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidArgument(_)));
        assert_eq!(state.vertex_buffer(), Some(&before));
        assert_eq!(state.size(), 4);
        assert_eq!(state.generation(), 1);
    }

    #[test]
    fn successive_regenerates_differ_in_content_not_shape() {
        let mut state = TerrainState::new(10, 77, true);
        let a = state.regenerate_current().unwrap().clone();
        let b = state.regenerate_current().unwrap().clone();
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_replays_sequence() {
        let mut s1 = TerrainState::new(6, 9, true);
        let mut s2 = TerrainState::new(6, 9, true);
        for _ in 0..3 {
            let a = s1.regenerate_current().unwrap().clone();
            let b = s2.regenerate_current().unwrap().clone();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn regenerate_can_change_size() {
        let mut state = TerrainState::new(2, 5, true);
        state.regenerate_current().unwrap();
        assert_eq!(state.regenerate(3).unwrap().len(), 54);
        assert_eq!(state.size(), 3);
    }

    #[test]
    fn toggle_wireframe_flips_without_touching_mesh() {
        let mut state = TerrainState::new(3, 5, true);
        let before = state.regenerate_current().unwrap().clone();
        assert!(!state.toggle_wireframe());
        assert!(state.toggle_wireframe());
        assert_eq!(state.vertex_buffer(), Some(&before));
    }

    #[test]
    fn cached_shading_matches_buffer() {
        let mut state = TerrainState::new(5, 3, false);
        state.regenerate_current().unwrap();
        let mesh = state.mesh().unwrap();
        assert_eq!(mesh.shaded_vertices().len(), mesh.vertices.len());
        assert_eq!(mesh.shades.len() * 3, mesh.vertices.len());
        assert_eq!(mesh.outline_indices().len(), mesh.shades.len() * 4);
        assert!(mesh.land_count() <= mesh.shades.len());
    }
}

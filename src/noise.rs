use rand::Rng;
use crate::common::MAX_TERRAIN_SIZE;
use crate::error::{Result, TerrainError};

// --- PERTURBATION ---

// raw draws are integers in [0, DRAW_RANGE), recentred and scaled to [-0.5, 0.49]
pub const DRAW_RANGE: u32 = 100;
const DRAW_OFFSET: i32 = 50;
const DRAW_SCALE: f32 = 100.0;

pub trait PerturbationSource {
    /// Uniform integer in `[0, DRAW_RANGE)`.
    fn draw(&mut self) -> u32;

    fn perturbation(&mut self) -> f32 {
        let raw = (self.draw() % DRAW_RANGE) as i32;
        (raw - DRAW_OFFSET) as f32 / DRAW_SCALE
    }
}

impl<R: Rng> PerturbationSource for R {
    fn draw(&mut self) -> u32 {
        self.random_range(0..DRAW_RANGE)
    }
}

/// Checks a requested terrain size and converts it to a cell count.
pub fn validate_size(size: i32) -> Result<usize> {
    if size < 0 {
        return Err(TerrainError::InvalidArgument(format!("terrain size must not be negative, got {}", size)));
    }
    if size > MAX_TERRAIN_SIZE {
        return Err(TerrainError::InvalidArgument(format!(
            "terrain size {} exceeds the maximum of {}", size, MAX_TERRAIN_SIZE
        )));
    }
    Ok(size as usize)
}

// --- HEIGHT GRID ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// Square `(size + 1) x (size + 1)` field of height samples, indexed `[x][z]`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    // flattened, x major
    heights: Vec<f32>,
    dim: usize,
}

impl HeightGrid {
    fn zeroed(dim: usize) -> Self {
        Self { heights: vec![0.0; dim * dim], dim }
    }

    #[inline(always)]
    fn get_index(&self, x: usize, z: usize) -> usize {
        x * self.dim + z
    }

    /// Number of samples along one side (`size + 1`).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of cells along one side.
    pub fn size(&self) -> usize {
        self.dim - 1
    }

    pub fn get(&self, x: usize, z: usize) -> Result<f32> {
        if x >= self.dim || z >= self.dim {
            return Err(TerrainError::OutOfRange { x, z, dim: self.dim });
        }
        Ok(self.heights[self.get_index(x, z)])
    }

    pub fn values(&self) -> &[f32] {
        &self.heights
    }

    pub fn stats(&self) -> HeightStats {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        for &h in &self.heights {
            min = min.min(h);
            max = max.max(h);
            sum += h as f64;
        }
        HeightStats { min, max, mean: (sum / self.heights.len() as f64) as f32 }
    }
}

// --- GENERATOR ---

pub struct HeightFieldGenerator;

impl HeightFieldGenerator {
    /// Fills a fresh grid with the corner-propagated smoothing recurrence.
    ///
    /// Each sample is its already-visited neighbours' value (previous sample on
    /// the first row/column, mean of the three lower neighbours elsewhere) plus
    /// one independent perturbation. One sweep over increasing `x`, then `z`,
    /// visits every dependency before it is needed.
    pub fn generate<S: PerturbationSource + ?Sized>(size: i32, source: &mut S) -> Result<HeightGrid> {
        let size = validate_size(size)?;
        let mut grid = HeightGrid::zeroed(size + 1);
        let dim = grid.dim;

        for x in 0..dim {
            for z in 0..dim {
                let base = match (x, z) {
                    (0, 0) => 0.0,
                    (0, _) => grid.heights[grid.get_index(0, z - 1)],
                    (_, 0) => grid.heights[grid.get_index(x - 1, 0)],
                    _ => {
                        let left = grid.heights[grid.get_index(x, z - 1)];
                        let diag = grid.heights[grid.get_index(x - 1, z - 1)];
                        let up = grid.heights[grid.get_index(x - 1, z)];
                        (left + diag + up) / 3.0
                    }
                };
                let idx = grid.get_index(x, z);
                grid.heights[idx] = base + source.perturbation();
            }
        }

        Ok(grid)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Replays a fixed list of draws, cycling when it runs out.
    pub(crate) struct ScriptedDraws {
        draws: Vec<u32>,
        next: usize,
    }

    impl ScriptedDraws {
        pub(crate) fn new(draws: Vec<u32>) -> Self {
            Self { draws, next: 0 }
        }

        pub(crate) fn constant(draw: u32) -> Self {
            Self::new(vec![draw])
        }
    }

    impl PerturbationSource for ScriptedDraws {
        fn draw(&mut self) -> u32 {
            let d = self.draws[self.next % self.draws.len()];
            self.next += 1;
            d
        }
    }

    #[test]
    fn grid_has_size_plus_one_samples_per_side() {
        let mut rng = StdRng::seed_from_u64(7);
        for size in [0, 1, 2, 5, 40] {
            let grid = HeightFieldGenerator::generate(size, &mut rng).unwrap();
            assert_eq!(grid.dim(), size as usize + 1);
            assert_eq!(grid.size(), size as usize);
            assert_eq!(grid.values().len(), (size as usize + 1).pow(2));
            assert!(grid.values().iter().all(|h| h.is_finite()));
        }
    }

    #[test]
    fn size_zero_is_a_single_corner_sample() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = HeightFieldGenerator::generate(0, &mut rng).unwrap();
        assert_eq!(grid.dim(), 1);
        let h = grid.get(0, 0).unwrap();
        assert!((-0.5..=0.5).contains(&h), "corner sample {} outside [-0.5, 0.5]", h);
    }

    #[test]
    fn negative_size_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = HeightFieldGenerator::generate(-1, &mut rng).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidArgument(_)));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = HeightFieldGenerator::generate(MAX_TERRAIN_SIZE + 1, &mut rng).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidArgument(_)));
    }

    #[test]
    fn draw_maps_to_centred_perturbation() {
        assert_abs_diff_eq!(ScriptedDraws::constant(0).perturbation(), -0.5);
        assert_abs_diff_eq!(ScriptedDraws::constant(50).perturbation(), 0.0);
        assert_abs_diff_eq!(ScriptedDraws::constant(99).perturbation(), 0.49);
        // out of range draws wrap like a modulo of the raw value
        assert_abs_diff_eq!(ScriptedDraws::constant(150).perturbation(), 0.0);
    }

    #[test]
    fn rng_draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..10_000 {
            assert!(rng.draw() < DRAW_RANGE);
        }
    }

    #[test]
    fn recurrence_follows_edges_and_interior_rules() {
        // draws in sweep order for a 3x3 grid: x=0 row first, then x=1, x=2
        let draws = vec![60, 70, 40, 30, 50, 80, 55, 45, 65];
        let mut src = ScriptedDraws::new(draws);
        let grid = HeightFieldGenerator::generate(2, &mut src).unwrap();
        let p = |d: u32| (d as f32 - 50.0) / 100.0;

        let h00 = p(60);
        let h01 = h00 + p(70);
        let h02 = h01 + p(40);
        let h10 = h00 + p(30);
        let h11 = (h10 + h00 + h01) / 3.0 + p(50);
        let h12 = (h11 + h01 + h02) / 3.0 + p(80);
        let h20 = h10 + p(55);
        let h21 = (h20 + h10 + h11) / 3.0 + p(45);
        let h22 = (h21 + h11 + h12) / 3.0 + p(65);

        let expected = [[h00, h01, h02], [h10, h11, h12], [h20, h21, h22]];
        for x in 0..3 {
            for z in 0..3 {
                assert_abs_diff_eq!(grid.get(x, z).unwrap(), expected[x][z], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn zero_perturbation_gives_flat_grid() {
        let mut src = ScriptedDraws::constant(50);
        let grid = HeightFieldGenerator::generate(6, &mut src).unwrap();
        assert!(grid.values().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn samples_respect_neighbour_chain_bound() {
        let mut rng = StdRng::seed_from_u64(2024);
        let size = 30;
        let grid = HeightFieldGenerator::generate(size, &mut rng).unwrap();
        let dim = grid.dim();

        // same recurrence on absolute values with the worst-case perturbation
        let mut bound = vec![vec![0.0f32; dim]; dim];
        for x in 0..dim {
            for z in 0..dim {
                let base = match (x, z) {
                    (0, 0) => 0.0,
                    (0, _) => bound[0][z - 1],
                    (_, 0) => bound[x - 1][0],
                    _ => (bound[x][z - 1] + bound[x - 1][z - 1] + bound[x - 1][z]) / 3.0,
                };
                bound[x][z] = base + 0.5;
                let h = grid.get(x, z).unwrap();
                assert!(h.abs() <= bound[x][z] + 1e-4, "|h({},{})| = {} > {}", x, z, h.abs(), bound[x][z]);
            }
        }
    }

    #[test]
    fn regenerating_keeps_shape_but_changes_content() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = HeightFieldGenerator::generate(12, &mut rng).unwrap();
        let b = HeightFieldGenerator::generate(12, &mut rng).unwrap();
        assert_eq!(a.dim(), b.dim());
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_replays_same_grid() {
        let a = HeightFieldGenerator::generate(10, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = HeightFieldGenerator::generate(10, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn out_of_range_lookup_is_an_error() {
        let grid = HeightFieldGenerator::generate(2, &mut ScriptedDraws::constant(50)).unwrap();
        assert_eq!(grid.get(3, 0), Err(TerrainError::OutOfRange { x: 3, z: 0, dim: 3 }));
        assert!(grid.get(2, 2).is_ok());
    }

    #[test]
    fn stats_cover_all_samples() {
        let grid = HeightFieldGenerator::generate(1, &mut ScriptedDraws::new(vec![0, 99, 50, 50])).unwrap();
        let stats = grid.stats();
        assert_abs_diff_eq!(stats.min, grid.values().iter().cloned().fold(f32::MAX, f32::min));
        assert_abs_diff_eq!(stats.max, grid.values().iter().cloned().fold(f32::MIN, f32::max));
        let mean: f32 = grid.values().iter().sum::<f32>() / 4.0;
        assert_abs_diff_eq!(stats.mean, mean, epsilon = 1e-6);
    }
}

//! Simulator state, configuration and the per-epoch step driver.
//!
//! A [`DuneSimulation`] owns four scalar layers over a shared toroidal
//! domain (bedrock, sediment, vegetation, bedrock weakness) and advances
//! them one *epoch* at a time: `nx * ny` stochastic saltation events,
//! dispatched data-parallel on a fixed worker pool, followed by periodic
//! bedrock stabilization when abrasion is enabled.

use crate::error::SimError;
use crate::field::{Box2, ScalarField2D};
use glam::Vec2;
use noise::Perlin;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Fixed seed for the sediment initialization stream. Runs are reproducible
/// up to thread nondeterminism in the event loop.
const INIT_SEED: u64 = 0;

/// Tunable simulation parameters.
///
/// These are compile-time constants in the reference literature; they live
/// on the instance here so they can be calibrated per run.
#[derive(Clone, Debug)]
pub struct SimParams {
    /// Sand column transferred per lift or deposit event (m).
    pub matter_to_move: f32,
    /// Repose tangent of loose sand (~33 degrees).
    pub tan_repose_sediment: f32,
    /// Repose tangent of abraded bedrock (~68 degrees).
    pub tan_repose_bedrock: f32,
    /// Lower edge of the wind-shadow occlusion smoothstep (~10 degrees).
    pub tan_shadow_min: f32,
    /// Upper edge of the wind-shadow occlusion smoothstep (~15 degrees).
    pub tan_shadow_max: f32,
    /// How far upwind the shadow march probes (m).
    pub shadow_radius: f32,
    /// Maximum world-space distance reptation creep may travel (m).
    pub reptation_radius: f32,
    /// Saltation hops before a grain is considered lost.
    pub max_bounce: u32,
    /// Abrasion strength scale.
    pub abrasion_epsilon: f32,
    /// Worker threads in the event pool.
    pub workers: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            matter_to_move: 0.1,
            tan_repose_sediment: 33.0_f32.to_radians().tan(),
            tan_repose_bedrock: 68.0_f32.to_radians().tan(),
            tan_shadow_min: 10.0_f32.to_radians().tan(),
            tan_shadow_max: 15.0_f32.to_radians().tan(),
            shadow_radius: 10.0,
            reptation_radius: 2.0,
            max_bounce: 3,
            abrasion_epsilon: 0.5,
            workers: 8,
        }
    }
}

/// Desertscape simulator: a two-layer heightfield (bedrock + sediment)
/// evolving under a prevailing wind.
#[derive(Debug)]
pub struct DuneSimulation {
    pub(crate) nx: usize,
    pub(crate) ny: usize,
    pub(crate) cell_size: f32,
    pub(crate) wind: Vec2,
    pub(crate) params: SimParams,

    pub(crate) bedrock: ScalarField2D,
    pub(crate) sediments: ScalarField2D,
    pub(crate) vegetation: ScalarField2D,
    pub(crate) bedrock_weakness: ScalarField2D,
    /// True once `set_hardness` has supplied a weakness map; until then
    /// abrasion derives hardness from coherent noise.
    pub(crate) hardness_supplied: bool,

    pub(crate) abrasion_on: bool,
    pub(crate) vegetation_on: bool,
    pub(crate) hardness_noise: Perlin,

    pool: rayon::ThreadPool,
    seed: u64,
    step_count: u64,
}

impl DuneSimulation {
    /// Create a simulator over `bounds` with a square `resolution`,
    /// sediment initialized uniformly in `[r_min, r_max]` per cell, under
    /// the base wind `wind` (direction and magnitude in m per step).
    pub fn new(
        bounds: Box2,
        resolution: (usize, usize),
        r_min: f32,
        r_max: f32,
        wind: Vec2,
    ) -> Result<Self, SimError> {
        Self::with_params(bounds, resolution, r_min, r_max, wind, SimParams::default())
    }

    /// As [`DuneSimulation::new`] with explicit parameters.
    pub fn with_params(
        bounds: Box2,
        resolution: (usize, usize),
        r_min: f32,
        r_max: f32,
        wind: Vec2,
        params: SimParams,
    ) -> Result<Self, SimError> {
        let (nx, ny) = resolution;
        if nx != ny || nx < 2 {
            return Err(SimError::InvalidGeometry { nx, ny });
        }
        let diagonal = bounds.size() / Vec2::new((nx - 1) as f32, (ny - 1) as f32);
        if (diagonal.x - diagonal.y).abs() > diagonal.x.abs() * 1e-4 {
            return Err(SimError::InvalidGeometry { nx, ny });
        }
        assert!(r_min <= r_max, "sand range is inverted");

        let bedrock = ScalarField2D::new(nx, ny, bounds, 0.0);
        let sediments = ScalarField2D::new(nx, ny, bounds, 0.0);
        let vegetation = ScalarField2D::new(nx, ny, bounds, 0.0);
        let bedrock_weakness = ScalarField2D::new(nx, ny, bounds, 0.0);

        let mut rng = ChaCha8Rng::seed_from_u64(INIT_SEED);
        for j in 0..ny {
            for i in 0..nx {
                sediments.set(i, j, rng.gen_range(r_min..=r_max));
            }
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.workers)
            .build()
            .expect("event worker pool");

        Ok(Self {
            nx,
            ny,
            cell_size: diagonal.x,
            wind,
            params,
            bedrock,
            sediments,
            vegetation,
            bedrock_weakness,
            hardness_supplied: false,
            abrasion_on: false,
            vegetation_on: false,
            hardness_noise: Perlin::new(INIT_SEED as u32),
            pool,
            seed: INIT_SEED,
            step_count: 0,
        })
    }

    // ===== Step driver =====

    /// Advance the simulation by one epoch: `nx * ny` saltation events at
    /// uniformly random cells, dispatched in parallel, followed by the
    /// end-of-step bookkeeping.
    pub fn step(&mut self) {
        let events = self.nx * self.ny;
        let started = Instant::now();
        let salt = self.step_count.wrapping_mul(0x517C_C1B7_2722_0A95);
        let base = self.seed ^ salt;
        let stream = AtomicU64::new(0);

        let this: &DuneSimulation = self;
        this.pool.install(|| {
            (0..events).into_par_iter().for_each_init(
                || ChaCha8Rng::seed_from_u64(mix64(base ^ stream.fetch_add(1, Ordering::Relaxed))),
                |rng, _| this.saltation_event(rng),
            );
        });
        log::debug!(
            "step {}: {} events in {:.1?}",
            self.step_count,
            events,
            started.elapsed()
        );

        self.end_step();
    }

    /// Per-step bookkeeping. Bedrock stabilization only runs every fifth
    /// step: abrasion accretes sub-cell cliffs slowly enough that relaxing
    /// them each epoch would be wasted work.
    fn end_step(&mut self) {
        self.step_count += 1;
        if self.step_count % 5 == 0 && self.abrasion_on {
            let sweeps = self.stabilize_bedrock_all();
            log::debug!(
                "bedrock stabilization after step {}: {} sweeps",
                self.step_count,
                sweeps
            );
        }
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.step_count
    }

    // ===== Queries =====

    /// Total height at vertex `(i, j)`: bedrock plus sediment.
    pub fn height(&self, i: usize, j: usize) -> f32 {
        self.bedrock.get(i, j) + self.sediments.get(i, j)
    }

    /// Bilinear total height at world point `p`.
    pub fn height_at(&self, p: Vec2) -> f32 {
        self.bedrock.sample_bilinear(p) + self.sediments.sample_bilinear(p)
    }

    pub fn bedrock(&self, i: usize, j: usize) -> f32 {
        self.bedrock.get(i, j)
    }

    pub fn sediment(&self, i: usize, j: usize) -> f32 {
        self.sediments.get(i, j)
    }

    pub fn vegetation(&self, i: usize, j: usize) -> f32 {
        self.vegetation.get(i, j)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// World-space edge length of a cell (m).
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bounds(&self) -> Box2 {
        self.bedrock.bounds()
    }

    pub fn wind(&self) -> Vec2 {
        self.wind
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    // ===== Configuration =====

    /// Enable or disable bedrock abrasion during saltation hops.
    pub fn set_abrasion(&mut self, on: bool) {
        self.abrasion_on = on;
    }

    /// Enable or disable vegetation retention in lift, deposition and
    /// reptation.
    pub fn set_vegetation_mode(&mut self, on: bool) {
        self.vegetation_on = on;
    }

    /// Replace the bedrock layer.
    pub fn set_bedrock(&mut self, field: ScalarField2D) -> Result<(), SimError> {
        self.check_resolution(&field)?;
        self.bedrock = field;
        Ok(())
    }

    /// Replace the sediment layer.
    pub fn set_sediment(&mut self, field: ScalarField2D) -> Result<(), SimError> {
        self.check_resolution(&field)?;
        self.sediments = field;
        Ok(())
    }

    /// Supply a vegetation cover map. Values are clamped to `[0, 1]`.
    pub fn set_vegetation(&mut self, field: ScalarField2D) -> Result<(), SimError> {
        self.check_resolution(&field)?;
        clamp_unit(&field);
        self.vegetation = field;
        Ok(())
    }

    /// Supply a bedrock weakness map (1 = soft). Values are clamped to
    /// `[0, 1]`; overrides the procedural noise hardness.
    pub fn set_hardness(&mut self, field: ScalarField2D) -> Result<(), SimError> {
        self.check_resolution(&field)?;
        clamp_unit(&field);
        self.bedrock_weakness = field;
        self.hardness_supplied = true;
        Ok(())
    }

    fn check_resolution(&self, field: &ScalarField2D) -> Result<(), SimError> {
        if field.nx() != self.nx || field.ny() != self.ny {
            return Err(SimError::DimensionMismatch {
                expected: (self.nx, self.ny),
                got: (field.nx(), field.ny()),
            });
        }
        Ok(())
    }
}

fn clamp_unit(field: &ScalarField2D) {
    for j in 0..field.ny() {
        for i in 0..field.nx() {
            field.set(i, j, field.get(i, j).clamp(0.0, 1.0));
        }
    }
}

/// SplitMix64 finalizer, used to decorrelate per-worker RNG streams.
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

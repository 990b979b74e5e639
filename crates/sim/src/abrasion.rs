//! Bedrock abrasion, the operator behind yardang formation.
//!
//! Wind-borne sand sandblasts exposed bedrock where the sand supply is
//! low. The eroded volume depends on vegetation cover, bedrock hardness
//! and wind strength; the removed material is transformed to dust and
//! discarded rather than conserved into the sand layer.

use crate::simulation::DuneSimulation;
use glam::Vec2;
use noise::NoiseFn;

/// Spatial frequency of the procedural hardness banding.
const HARDNESS_FREQ: f32 = 0.08;
/// Domain-warp strength applied to the banding via coherent noise.
const HARDNESS_WARP: f32 = 15.36;

impl DuneSimulation {
    /// Abrade the bedrock at `(i, j)` under the local `wind`.
    pub(crate) fn abrade(&self, i: usize, j: usize, wind: Vec2) {
        // Vegetation protects from abrasion
        let cover = if self.vegetation_on {
            self.vegetation.get(i, j)
        } else {
            0.0
        };

        let weakness = if self.hardness_supplied {
            self.bedrock_weakness.get(i, j)
        } else {
            self.procedural_weakness(i, j)
        };

        let strength = wind.length().clamp(0.0, 2.0);
        let eroded = self.params.abrasion_epsilon * (1.0 - cover) * (1.0 - weakness) * strength;
        if eroded > 0.0 {
            self.bedrock.add(i, j, -eroded);
        }
    }

    /// Noise-warped banding in `[0, 1]` standing in for a geological
    /// hardness map when none was supplied. Any C1-continuous coherent
    /// noise works here; banding across y gives abrasion a grain to carve
    /// streaks along.
    fn procedural_weakness(&self, i: usize, j: usize) -> f32 {
        let p = self.bedrock.vertex_of(i, j);
        let warp = self
            .hardness_noise
            .get([0.05 * p.x as f64, 0.05 * p.y as f64]) as f32;
        ((p.y * HARDNESS_FREQ + HARDNESS_WARP * warp).sin() + 1.0) / 2.0
    }
}

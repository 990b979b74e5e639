//! Local wind model and the wind-shadow occlusion test.
//!
//! The wind a grain experiences is the global wind, slightly amplified by
//! the local sand column, and deflected toward the crest-parallel direction
//! on steep sediment slopes. Cells downwind of an obstruction sit in its
//! wind shadow: deposition is enhanced and lift is suppressed there.

use crate::simulation::DuneSimulation;
use glam::Vec2;

/// Wind components below this magnitude count as still air.
pub(crate) const DEAD_AIR: f32 = 1e-3;

pub(crate) fn is_dead_air(w: Vec2) -> bool {
    w.x.abs() < DEAD_AIR && w.y.abs() < DEAD_AIR
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl DuneSimulation {
    /// Local wind vector at cell `(i, j)`.
    ///
    /// Taller sand columns see slightly stronger wind. On a steep sediment
    /// slope the wind blends toward five times the crest-parallel
    /// direction, approximating flow deflection over a dune; the
    /// crest-parallel vector is flipped when it points against the wind so
    /// the deflection never reverses transport.
    pub fn wind_at(&self, i: usize, j: usize) -> Vec2 {
        let sand = self.sediments.get(i, j);
        let w = (1.0 + 0.005 * sand) * self.wind;
        if is_dead_air(w) {
            return w;
        }

        let g = self.sediments.gradient(i, j);
        if g == Vec2::ZERO || w == Vec2::ZERO {
            return w;
        }

        let slope = g.length().clamp(0.0, 1.0);
        let mut crest_parallel = Vec2::new(-g.y, g.x);
        if w.dot(crest_parallel) < 0.0 {
            crest_parallel = -crest_parallel;
        }
        w.lerp(5.0 * crest_parallel, slope)
    }

    /// Wind-shadow occlusion factor in `[0, 1]` for cell `(i, j)`.
    ///
    /// Marches upwind in half-wind-unit steps out to the shadow radius and
    /// keeps the maximum obstruction tangent, mapped through a smoothstep
    /// between the two threshold angles. The result is used downstream as
    /// the probability that the cell is shadowed.
    pub fn shadow(&self, i: usize, j: usize, wind: Vec2) -> f32 {
        if wind.length() < DEAD_AIR {
            return 0.0;
        }

        let step = 0.5 * wind.normalize();
        let p = self.bedrock.vertex_of(i, j);
        let hp = self.height_at(p);

        let mut probe = p;
        let mut occlusion = 0.0f32;
        loop {
            probe -= step;
            let d = p.distance(probe);
            if d > self.params.shadow_radius {
                break;
            }
            let snapped = self.bedrock.snap_world(probe);
            if snapped == p {
                break;
            }
            let t = (self.height_at(snapped) - hp) / d;
            let s = smoothstep(self.params.tan_shadow_min, self.params.tan_shadow_max, t);
            occlusion = occlusion.max(s);
        }
        occlusion
    }
}

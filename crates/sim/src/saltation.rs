//! The stochastic lift-hop-deposit loop, one grain packet per event.
//!
//! An event lifts `matter_to_move` of sand from a random cell, carries it
//! downwind in up to `max_bounce` saltation hops, and deposits it where a
//! shadow, sandy or bare-ground probability test succeeds. Deposition is
//! likelier on existing sand, which is the positive feedback that makes
//! dunes emerge; vegetation makes sand stick around plants. A grain that
//! exhausts its bounces without depositing is lost.
//!
//! All field writes are atomic adds; reads may observe mid-event values,
//! which the stochastic model tolerates.

use crate::simulation::DuneSimulation;
use crate::wind::is_dead_air;
use glam::IVec2;
use rand::Rng;

impl DuneSimulation {
    /// One saltation event at a uniformly random cell.
    pub(crate) fn saltation_event(&self, rng: &mut impl Rng) {
        let start_i = rng.gen_range(0..self.nx);
        let start_j = rng.gen_range(0..self.ny);

        // No sediment to move
        if self.sediments.get(start_i, start_j) <= 0.0 {
            return;
        }

        let wind0 = self.wind_at(start_i, start_j);
        // Still air lifts nothing; the cell settles in place
        if is_dead_air(wind0) {
            self.stabilize_sediment(start_i, start_j);
            return;
        }
        // Wind shadowing retains the grain with the occlusion probability
        if rng.gen::<f32>() < self.shadow(start_i, start_j, wind0) {
            self.stabilize_sediment(start_i, start_j);
            return;
        }
        // Vegetation can retain sediment in the lifting process
        if self.vegetation_on && rng.gen::<f32>() < self.vegetation.get(start_i, start_j) {
            self.stabilize_sediment(start_i, start_j);
            return;
        }

        let matter = self.params.matter_to_move;
        self.sediments.add(start_i, start_j, -matter);

        // Retention draws below use the source cell's cover even after the
        // grain has moved on
        let source_vegetation = self.vegetation.get(start_i, start_j);

        let mut dest_i = start_i;
        let mut dest_j = start_j;
        let mut pos = self.bedrock.vertex_of(dest_i, dest_j);
        let mut bounce = 0;
        while bounce < self.params.max_bounce {
            let wind = self.wind_at(dest_i, dest_j);

            // One hop downwind, wrapped onto the torus
            pos = self.bedrock.snap_world(pos + wind);
            let cell = self.bedrock.cell_of(pos);
            dest_i = cell.x as usize;
            dest_j = cell.y as usize;

            // Abrasion needs low sand supply and fires with low probability
            if self.abrasion_on
                && rng.gen::<f32>() < 0.2
                && self.sediments.get(dest_i, dest_j) < 0.5
            {
                self.abrade(dest_i, dest_j, wind);
            }

            let p = rng.gen::<f32>();
            let cover = if self.vegetation_on {
                self.vegetation.get(dest_i, dest_j)
            } else {
                0.0
            };
            let sand = self.sediments.get(dest_i, dest_j);

            let deposits = if p < self.shadow(dest_i, dest_j, wind) {
                true // fell into a shadow zone
            } else if sand > 0.0 {
                p < 0.6 + 0.4 * cover // sandy cell
            } else {
                p < 0.4 + 0.6 * cover // bare cell
            };
            if deposits {
                self.sediments.add(dest_i, dest_j, matter);
                break;
            }

            bounce += 1;
            if rng.gen::<f32>() < 1.0 - source_vegetation {
                self.reptate(dest_i, dest_j, bounce);
            }
        }

        // Impact creep at the final position as well
        if rng.gen::<f32>() < 1.0 - source_vegetation {
            self.reptate(dest_i, dest_j, bounce);
        }

        self.stabilize_sediment(start_i, start_j);
        if (dest_i, dest_j) != (start_i, start_j) {
            self.stabilize_sediment(dest_i, dest_j);
        }
    }

    /// Short-range creep caused by grain impacts: distribute sand to the
    /// up-to-2 steepest downhill neighbors, scaled by the bounce count.
    ///
    /// A neighbor farther than the reptation radius receives nothing; the
    /// source still sheds the full amount when at least one neighbor was
    /// reachable. On coarse grids creep degrades rather than teleports.
    pub(crate) fn reptate(&self, i: usize, j: usize, bounce: u32) {
        let matter = self.params.matter_to_move;
        let t = bounce.min(3) as f32 / 3.0;
        let creep = matter * 0.5 + (matter - matter * 0.5) * t;
        let radius_sq = self.params.reptation_radius * self.params.reptation_radius;

        let p = self.bedrock.vertex_of(i, j);
        let flow = self.check_sediment_flow(
            IVec2::new(i as i32, j as i32),
            self.params.tan_repose_sediment,
        );
        let n = flow.count.min(2);
        if n == 0 {
            return;
        }

        let mut effective = 0;
        for k in 0..n {
            let next = flow.cells[k];
            let pk = self.bedrock.vertex_of(next.x as usize, next.y as usize);
            // Wrapped neighbors on the far side of the seam fail this test
            if p.distance_squared(pk) > radius_sq {
                continue;
            }
            self.sediments
                .add(next.x as usize, next.y as usize, creep / n as f32);
            effective += 1;
        }

        if effective > 0 {
            self.sediments.add(i, j, -creep);
        }
    }
}

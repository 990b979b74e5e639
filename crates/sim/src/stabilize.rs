//! Relative-slope stabilization: the angle-of-repose talus model.
//!
//! Whenever a cell's surface slope toward a neighbor exceeds the repose
//! tangent of its material, half the excess column flows downhill and the
//! check continues from the receiving cell. Sediment relaxes against the
//! combined surface (sand rests on bedrock); bedrock relaxes against its
//! own elevation with a much steeper threshold.

use crate::simulation::DuneSimulation;
use glam::IVec2;
use std::f32::consts::SQRT_2;

/// 8-connected neighborhood in fixed grid order.
pub(crate) const NEXT8: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(1, 1),
    IVec2::new(0, 1),
    IVec2::new(-1, 1),
    IVec2::new(-1, 0),
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
];

/// Downhill neighbors steeper than a repose tangent, steepest first.
pub(crate) struct FlowCandidates {
    pub count: usize,
    pub cells: [IVec2; 8],
    pub slopes: [f32; 8],
    pub dists: [f32; 8],
}

impl FlowCandidates {
    fn empty() -> Self {
        Self {
            count: 0,
            cells: [IVec2::ZERO; 8],
            slopes: [0.0; 8],
            dists: [0.0; 8],
        }
    }

    /// Insert keeping descending slope order (stable for ties).
    fn insert(&mut self, cell: IVec2, slope: f32, dist: f32) {
        let mut at = self.count;
        while at > 0 && self.slopes[at - 1] < slope {
            at -= 1;
        }
        let mut k = self.count;
        while k > at {
            self.cells[k] = self.cells[k - 1];
            self.slopes[k] = self.slopes[k - 1];
            self.dists[k] = self.dists[k - 1];
            k -= 1;
        }
        self.cells[at] = cell;
        self.slopes[at] = slope;
        self.dists[at] = dist;
        self.count += 1;
    }
}

impl DuneSimulation {
    /// Neighbors of `cell` whose total-surface slope exceeds `tau`,
    /// sorted steepest first. Used by sediment stabilization and
    /// reptation.
    pub(crate) fn check_sediment_flow(&self, cell: IVec2, tau: f32) -> FlowCandidates {
        self.check_flow(cell, tau, |i, j| self.height(i, j))
    }

    /// As [`Self::check_sediment_flow`] against bedrock elevation alone.
    pub(crate) fn check_bedrock_flow(&self, cell: IVec2, tau: f32) -> FlowCandidates {
        self.check_flow(cell, tau, |i, j| self.bedrock.get(i, j))
    }

    fn check_flow<F>(&self, cell: IVec2, tau: f32, height: F) -> FlowCandidates
    where
        F: Fn(usize, usize) -> f32,
    {
        let here = height(cell.x as usize, cell.y as usize);
        let mut flow = FlowCandidates::empty();
        for offset in NEXT8 {
            let neighbor = self.bedrock.wrap_cell(cell + offset);
            let dist = if offset.x != 0 && offset.y != 0 {
                SQRT_2 * self.cell_size
            } else {
                self.cell_size
            };
            let tangent = (here - height(neighbor.x as usize, neighbor.y as usize)) / dist;
            if tangent > tau {
                flow.insert(neighbor, tangent, dist);
            }
        }
        flow
    }

    /// Relax the sediment column at `(i, j)` down to the repose angle,
    /// following the flow from cell to cell until the slope is stable.
    ///
    /// Each transfer moves half the excess column toward the steepest
    /// neighbor, so the surface potential strictly decreases and the walk
    /// terminates.
    pub fn stabilize_sediment(&self, i: usize, j: usize) {
        let tau = self.params.tan_repose_sediment;
        let mut cell = IVec2::new(i as i32, j as i32);
        loop {
            let (ci, cj) = (cell.x as usize, cell.y as usize);
            let available = self.sediments.get(ci, cj);
            if available <= 0.0 {
                return;
            }
            let flow = self.check_sediment_flow(cell, tau);
            if flow.count == 0 {
                return;
            }

            let delta = (flow.dists[0] * (flow.slopes[0] - tau) * 0.5).min(available);
            if delta <= 0.0 {
                return;
            }
            let next = flow.cells[0];
            self.sediments.add(ci, cj, -delta);
            self.sediments.add(next.x as usize, next.y as usize, delta);
            cell = next;
        }
    }

    /// Bedrock counterpart of [`Self::stabilize_sediment`], using the
    /// bedrock repose tangent. Returns whether anything moved.
    pub fn stabilize_bedrock(&self, i: usize, j: usize) -> bool {
        let tau = self.params.tan_repose_bedrock;
        let mut cell = IVec2::new(i as i32, j as i32);
        let mut moved = false;
        loop {
            let flow = self.check_bedrock_flow(cell, tau);
            if flow.count == 0 {
                return moved;
            }
            let delta = flow.dists[0] * (flow.slopes[0] - tau) * 0.5;
            if delta <= 0.0 {
                return moved;
            }
            let next = flow.cells[0];
            self.bedrock.add(cell.x as usize, cell.y as usize, -delta);
            self.bedrock.add(next.x as usize, next.y as usize, delta);
            moved = true;
            cell = next;
        }
    }

    /// Sweep the whole grid until a full pass moves no bedrock. Returns
    /// the number of sweeps taken to reach the fixed point.
    pub fn stabilize_bedrock_all(&self) -> usize {
        let mut sweeps = 0;
        loop {
            sweeps += 1;
            let mut moved = false;
            for j in 0..self.ny {
                for i in 0..self.nx {
                    moved |= self.stabilize_bedrock(i, j);
                }
            }
            if !moved {
                return sweeps;
            }
        }
    }
}

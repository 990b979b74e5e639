//! Scalar fields over a world-space box.
//!
//! A [`ScalarField2D`] is a flat grid of `f32` values spanning an
//! axis-aligned box, with bilinear sampling, discrete gradients and
//! world/grid coordinate mapping. Cells are backed by [`AtomicF32`] so that
//! the parallel saltation loop can update them lock-free; plain reads are
//! relaxed loads and may observe values mid-update, which the stochastic
//! model tolerates.
//!
//! The world is a flat torus: [`ScalarField2D::snap_world`] wraps any point
//! back into the box, and [`ScalarField2D::wrap_cell`] does the same for
//! integer cell coordinates.

use glam::{IVec2, Vec2};
use std::sync::atomic::{AtomicU32, Ordering};

/// Axis-aligned world-space bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Box2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Edge lengths of the box.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// An `f32` with lock-free atomic addition, stored as bits in an `AtomicU32`.
///
/// All orderings are relaxed: field updates need no cross-cell
/// synchronization, only that concurrent adds to the same cell never lose
/// a contribution.
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, v: f32) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }

    /// Atomically add `delta` via a compare-exchange loop.
    pub fn fetch_add(&self, delta: f32) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f32::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clone for AtomicF32 {
    fn clone(&self) -> Self {
        Self::new(self.load())
    }
}

impl std::fmt::Debug for AtomicF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.load().fmt(f)
    }
}

/// Regular 2D grid of `f32` over a world-space box.
///
/// Values live on grid vertices: an `nx * ny` grid spans the box with a
/// vertex spacing of `size / (n - 1)` per axis. Storage is row-major,
/// `index = j * nx + i`.
#[derive(Clone, Debug)]
pub struct ScalarField2D {
    nx: usize,
    ny: usize,
    bounds: Box2,
    cell_diagonal: Vec2,
    data: Vec<AtomicF32>,
}

impl ScalarField2D {
    /// Create a field filled with `value`. Requires at least a 2x2 grid.
    pub fn new(nx: usize, ny: usize, bounds: Box2, value: f32) -> Self {
        assert!(nx >= 2 && ny >= 2, "field needs at least 2x2 vertices");
        let cell_diagonal = bounds.size() / Vec2::new((nx - 1) as f32, (ny - 1) as f32);
        let data = (0..nx * ny).map(|_| AtomicF32::new(value)).collect();
        Self {
            nx,
            ny,
            bounds,
            cell_diagonal,
            data,
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn bounds(&self) -> Box2 {
        self.bounds
    }

    /// World-space spacing between adjacent vertices, per axis.
    pub fn cell_diagonal(&self) -> Vec2 {
        self.cell_diagonal
    }

    /// Row-major 1D index of vertex `(i, j)`.
    pub fn to_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        j * self.nx + i
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[self.to_index(i, j)].load()
    }

    pub fn set(&self, i: usize, j: usize, v: f32) {
        self.data[self.to_index(i, j)].store(v);
    }

    /// Atomic add, safe under concurrent mutation from the event loop.
    pub fn add(&self, i: usize, j: usize, delta: f32) {
        self.data[self.to_index(i, j)].fetch_add(delta);
    }

    /// World position of grid vertex `(i, j)`.
    pub fn vertex_of(&self, i: usize, j: usize) -> Vec2 {
        self.bounds.min + self.cell_diagonal * Vec2::new(i as f32, j as f32)
    }

    /// Integer cell containing the world point `p`. The caller is expected
    /// to have snapped `p` into the box first.
    pub fn cell_of(&self, p: Vec2) -> IVec2 {
        let local = (p - self.bounds.min) / self.cell_diagonal;
        IVec2::new(
            (local.x.floor() as i32).clamp(0, self.nx as i32 - 1),
            (local.y.floor() as i32).clamp(0, self.ny as i32 - 1),
        )
    }

    /// Wrap integer cell coordinates onto the torus.
    pub fn wrap_cell(&self, c: IVec2) -> IVec2 {
        IVec2::new(
            c.x.rem_euclid(self.nx as i32),
            c.y.rem_euclid(self.ny as i32),
        )
    }

    /// Wrap any world point into `[min, max)` on each axis (flat torus).
    /// Idempotent: snapping a snapped point changes nothing.
    pub fn snap_world(&self, p: Vec2) -> Vec2 {
        let size = self.bounds.size();
        let mut s = self.bounds.min
            + Vec2::new(
                wrap(p.x - self.bounds.min.x, size.x),
                wrap(p.y - self.bounds.min.y, size.y),
            );
        // Adding `min` back can round up onto the open boundary
        if s.x >= self.bounds.max.x {
            s.x = self.bounds.min.x;
        }
        if s.y >= self.bounds.max.y {
            s.y = self.bounds.min.y;
        }
        s
    }

    /// Standard 4-tap bilinear sample at world point `p`.
    pub fn sample_bilinear(&self, p: Vec2) -> f32 {
        let local = (p - self.bounds.min) / self.cell_diagonal;
        let i = (local.x.floor() as i32).clamp(0, self.nx as i32 - 2) as usize;
        let j = (local.y.floor() as i32).clamp(0, self.ny as i32 - 2) as usize;
        let tx = (local.x - i as f32).clamp(0.0, 1.0);
        let ty = (local.y - j as f32).clamp(0.0, 1.0);

        let v00 = self.get(i, j);
        let v10 = self.get(i + 1, j);
        let v01 = self.get(i, j + 1);
        let v11 = self.get(i + 1, j + 1);

        let bottom = v00 + (v10 - v00) * tx;
        let top = v01 + (v11 - v01) * tx;
        bottom + (top - bottom) * ty
    }

    /// Discrete gradient at vertex `(i, j)`, central differences with
    /// one-sided stencils at the grid edges, in per-cell units. Flat
    /// neighborhoods yield the zero vector.
    pub fn gradient(&self, i: usize, j: usize) -> Vec2 {
        let gx = if i == 0 {
            self.get(1, j) - self.get(0, j)
        } else if i == self.nx - 1 {
            self.get(i, j) - self.get(i - 1, j)
        } else {
            (self.get(i + 1, j) - self.get(i - 1, j)) * 0.5
        };
        let gy = if j == 0 {
            self.get(i, 1) - self.get(i, 0)
        } else if j == self.ny - 1 {
            self.get(i, j) - self.get(i, j - 1)
        } else {
            (self.get(i, j + 1) - self.get(i, j - 1)) * 0.5
        };
        Vec2::new(gx, gy)
    }
}

fn wrap(v: f32, len: f32) -> f32 {
    let r = v.rem_euclid(len);
    // rem_euclid can round up to `len` for tiny negative inputs
    if r >= len {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_field(n: usize) -> ScalarField2D {
        ScalarField2D::new(n, n, Box2::new(Vec2::ZERO, Vec2::splat(10.0)), 0.0)
    }

    #[test]
    fn index_is_row_major() {
        let f = unit_field(4);
        assert_eq!(f.to_index(0, 0), 0);
        assert_eq!(f.to_index(3, 0), 3);
        assert_eq!(f.to_index(0, 1), 4);
        assert_eq!(f.to_index(2, 3), 14);
    }

    #[test]
    fn vertex_cell_roundtrip() {
        let f = unit_field(11); // vertex spacing 1.0
        for j in 0..10 {
            for i in 0..10 {
                let p = f.vertex_of(i, j);
                let c = f.cell_of(p);
                assert_eq!(c, IVec2::new(i as i32, j as i32));
            }
        }
    }

    #[test]
    fn bilinear_matches_vertices_and_midpoints() {
        let f = unit_field(11);
        f.set(2, 3, 4.0);

        let p = f.vertex_of(2, 3);
        assert!((f.sample_bilinear(p) - 4.0).abs() < 1e-5);

        // Midpoint between (2,3) and (3,3) sees half the spike
        let mid = p + Vec2::new(0.5, 0.0);
        assert!((f.sample_bilinear(mid) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn gradient_of_flat_field_is_zero() {
        let f = unit_field(8);
        for j in 0..8 {
            for i in 0..8 {
                assert_eq!(f.gradient(i, j), Vec2::ZERO);
            }
        }
    }

    #[test]
    fn gradient_of_ramp() {
        let f = unit_field(8);
        for j in 0..8 {
            for i in 0..8 {
                f.set(i, j, i as f32 * 2.0);
            }
        }
        // Interior: central difference of a linear ramp
        assert!((f.gradient(3, 3).x - 2.0).abs() < 1e-5);
        assert!((f.gradient(3, 3).y - 0.0).abs() < 1e-5);
        // Edges: one-sided
        assert!((f.gradient(0, 3).x - 2.0).abs() < 1e-5);
        assert!((f.gradient(7, 3).x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn snap_world_wraps_and_is_idempotent() {
        let f = unit_field(11);
        let cases = [
            Vec2::new(-0.5, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(25.0, -33.0),
            Vec2::new(3.0, 4.0),
        ];
        for p in cases {
            let s = f.snap_world(p);
            assert!(s.x >= 0.0 && s.x < 10.0, "x out of range: {s:?}");
            assert!(s.y >= 0.0 && s.y < 10.0, "y out of range: {s:?}");
            let s2 = f.snap_world(s);
            assert_eq!(s, s2, "snap not idempotent for {p:?}");
        }
    }

    #[test]
    fn wrap_cell_handles_negative_offsets() {
        let f = unit_field(8);
        assert_eq!(f.wrap_cell(IVec2::new(-1, 0)), IVec2::new(7, 0));
        assert_eq!(f.wrap_cell(IVec2::new(8, -1)), IVec2::new(0, 7));
        assert_eq!(f.wrap_cell(IVec2::new(3, 4)), IVec2::new(3, 4));
    }

    #[test]
    fn atomic_adds_do_not_lose_updates() {
        let f = unit_field(4);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        f.add(1, 1, 0.5);
                    }
                });
            }
        });
        // 4000 adds of 0.5 are exact in f32
        assert_eq!(f.get(1, 1), 2000.0);
    }
}

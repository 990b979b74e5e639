//! Wavefront OBJ export of the dune surface.
//!
//! Emits one vertex per grid node at `(world_x, height, world_y)`,
//! per-vertex normals from central height differences, and two triangles
//! per grid quad.

use glam::{Vec2, Vec3};
use sim::DuneSimulation;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write the surface mesh to `path`.
pub fn export_obj(sim: &DuneSimulation, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write_obj(sim, &mut out)
}

/// Write the surface mesh to any sink.
pub fn write_obj<W: Write>(sim: &DuneSimulation, out: &mut W) -> io::Result<()> {
    let (nx, ny) = (sim.nx(), sim.ny());
    let bounds = sim.bounds();
    let size = bounds.size();

    writeln!(out, "g dunes")?;

    // Vertices, Y-up: the simulation plane maps to X/Z
    for j in 0..ny {
        for i in 0..nx {
            let x = bounds.min.x + size.x * i as f32 / (nx - 1) as f32;
            let z = bounds.min.y + size.y * j as f32 / (ny - 1) as f32;
            writeln!(out, "v {} {} {}", x, sim.height(i, j), z)?;
        }
    }

    for j in 0..ny {
        for i in 0..nx {
            let g = surface_gradient(sim, i, j);
            let n = Vec3::new(-g.x, 2.0, -g.y).normalize();
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }

    // Two triangles per quad, indices 1-based
    for j in 0..ny - 1 {
        for i in 0..nx - 1 {
            let a = j * nx + i + 1;
            let b = a + 1;
            let c = a + nx;
            let d = c + 1;
            writeln!(out, "f {a}//{a} {b}//{b} {d}//{d}")?;
            writeln!(out, "f {a}//{a} {d}//{d} {c}//{c}")?;
        }
    }

    Ok(())
}

/// World-space surface slope from the public height query, one-sided at
/// the grid edges.
fn surface_gradient(sim: &DuneSimulation, i: usize, j: usize) -> Vec2 {
    let (nx, ny) = (sim.nx(), sim.ny());
    let cell = sim.cell_size();
    let gx = if i == 0 {
        sim.height(1, j) - sim.height(0, j)
    } else if i == nx - 1 {
        sim.height(i, j) - sim.height(i - 1, j)
    } else {
        (sim.height(i + 1, j) - sim.height(i - 1, j)) * 0.5
    };
    let gy = if j == 0 {
        sim.height(i, 1) - sim.height(i, 0)
    } else if j == ny - 1 {
        sim.height(i, j) - sim.height(i, j - 1)
    } else {
        (sim.height(i, j + 1) - sim.height(i, j - 1)) * 0.5
    };
    Vec2::new(gx / cell, gy / cell)
}

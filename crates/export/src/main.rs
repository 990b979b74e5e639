//! Headless scenario driver.
//!
//! Reproduces the four canonical desert landforms and writes grayscale
//! snapshots plus a final mesh for each. No real-time visualization; the
//! output is meant for offline inspection.
//!
//! Usage: `scenarios [resolution] [steps]` (defaults: 256, 300).

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim::{Box2, DuneSimulation, ScalarField2D, Vec2};
use std::path::PathBuf;

fn scenario_bounds() -> Box2 {
    Box2::new(Vec2::ZERO, Vec2::splat(1024.0))
}

/// Transverse dunes: unimodal wind, medium-to-high sand supply. The
/// default dune type of any basic run.
fn transverse(n: usize) -> DuneSimulation {
    DuneSimulation::new(scenario_bounds(), (n, n), 3.0, 5.0, Vec2::new(0.0, 3.0))
        .expect("square scenario grid")
}

/// Barchans: similar wind, low sand supply.
fn barchan(n: usize) -> DuneSimulation {
    DuneSimulation::new(scenario_bounds(), (n, n), 0.5, 2.0, Vec2::new(0.0, 5.0))
        .expect("square scenario grid")
}

/// Yardangs: thin sand sheet, strong wind, abrasion enabled.
fn yardang(n: usize) -> DuneSimulation {
    let mut sim = DuneSimulation::new(scenario_bounds(), (n, n), 0.5, 0.5, Vec2::new(6.0, 0.0))
        .expect("square scenario grid");
    sim.set_abrasion(true);
    sim
}

/// Nabkha: dense vegetation scattered over ~5% of the cells anchors the
/// sand into mounds.
fn nabkha(n: usize) -> DuneSimulation {
    let mut sim = DuneSimulation::new(scenario_bounds(), (n, n), 2.0, 5.0, Vec2::new(3.0, 0.0))
        .expect("square scenario grid");

    let cover = ScalarField2D::new(n, n, scenario_bounds(), 0.0);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for j in 0..n {
        for i in 0..n {
            if rng.gen::<f32>() < 0.05 {
                cover.set(i, j, 0.85);
            }
        }
    }
    sim.set_vegetation(cover).expect("matching vegetation grid");
    sim.set_vegetation_mode(true);
    sim
}

fn run(name: &str, mut sim: DuneSimulation, steps: usize) {
    info!(
        "{name}: {}x{} grid, {} m cells, {steps} steps",
        sim.nx(),
        sim.ny(),
        sim.cell_size()
    );
    export::write_png(&sim, &snapshot_path(name, 0)).expect("write initial snapshot");

    for s in 1..=steps {
        sim.step();
        if s % 100 == 0 {
            export::write_png(&sim, &snapshot_path(name, s)).expect("write snapshot");
            info!("{name}: {s}/{steps} steps");
        }
    }

    let mesh = PathBuf::from(format!("{name}.obj"));
    export::export_obj(&sim, &mesh).expect("write mesh");
    info!("{name}: wrote {}", mesh.display());
}

fn snapshot_path(name: &str, step: usize) -> PathBuf {
    PathBuf::from(format!("{name}_{step:04}.png"))
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let resolution: usize = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(256);
    let steps: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(300);

    run("transverse", transverse(resolution), steps);
    run("barchan", barchan(resolution), steps);
    run("yardang", yardang(resolution), steps * 2);
    run("nabkha", nabkha(resolution), steps);
}

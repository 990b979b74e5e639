//! Procedural desertscape simulation.
//!
//! A physically inspired cellular model that evolves a two-layer
//! heightfield (bedrock + sediment) under a prevailing wind to reproduce
//! aeolian landforms: transverse dunes, barchans, yardangs (via abrasion)
//! and nabkha (via vegetation retention).
//!
//! The engine redistributes sand through stochastic saltation events:
//! lift at a random cell, a few wind-driven hops across a toroidal
//! domain, probabilistic deposition biased toward shadowed, sandy and
//! vegetated ground, short-range reptation creep, and angle-of-repose
//! stabilization of both layers. Events run data-parallel with lock-free
//! atomic field updates; landforms are statistical equilibria insensitive
//! to event ordering.
//!
//! This crate is rendering-agnostic - it handles simulation only. Use the
//! `export` crate for mesh and raster output.
//!
//! # Example
//!
//! ```
//! use sim::{Box2, DuneSimulation, Vec2};
//!
//! let bounds = Box2::new(Vec2::ZERO, Vec2::splat(256.0));
//! let mut dunes =
//!     DuneSimulation::new(bounds, (64, 64), 1.0, 3.0, Vec2::new(0.0, 3.0)).unwrap();
//!
//! // One epoch = nx * ny saltation events
//! for _ in 0..5 {
//!     dunes.step();
//! }
//!
//! assert!(dunes.height(10, 10).is_finite());
//! ```

pub mod error;
pub mod field;
pub mod simulation;

mod abrasion;
mod saltation;
mod stabilize;
mod wind;

pub use error::SimError;
pub use field::{AtomicF32, Box2, ScalarField2D};
pub use glam::{IVec2, Vec2};
pub use simulation::{DuneSimulation, SimParams};

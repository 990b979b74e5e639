//! Mesh and raster exporters for the desertscape simulator.
//!
//! Both writers read only the simulator's public height accessors, so they
//! stay decoupled from the simulation internals and can run between any
//! two steps.

pub mod obj;
pub mod raster;

pub use obj::{export_obj, write_obj};
pub use raster::{height_image, write_png};

//! Scene description for a path-traced triangle-mesh renderer: geometry,
//! acceleration structures, materials, lights and scene aggregation.
//! Execution lives in the `pathtracer-cpu` backend crate.

pub mod accel;
pub mod geometry;
pub mod lights;
pub mod materials;
pub mod scene;

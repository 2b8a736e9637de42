use crate::geometry::GeometryStore;
use crate::lights::Light;

use super::{Camera, Skybox};

/// Everything a render needs, assembled once before rendering starts and
/// shared read-only by every worker for the lifetime of the process.
#[derive(Debug)]
pub struct Scene {
    pub camera: Camera,
    pub geometry: GeometryStore,
    pub lights: Vec<Light>,
    pub skybox: Skybox,

    /// Triangles whose material emits, found once by scanning the geometry.
    /// Next-event estimation samples this list uniformly.
    pub emissive_triangles: Vec<u32>,
}

impl Scene {
    pub fn new(
        camera: Camera,
        geometry: GeometryStore,
        lights: Vec<Light>,
        skybox: Skybox,
    ) -> Scene {
        let emissive_triangles = (0..geometry.triangle_count() as u32)
            .filter(|&tri| geometry.material_of(tri).is_emissive())
            .collect();

        Scene {
            camera,
            geometry,
            lights,
            skybox,
            emissive_triangles,
        }
    }
}

use crate::geometry::Vec3;

/// Explicit light sources. Only the data lives here; sampling needs shadow
/// queries against the acceleration structure and is done by the backend.
#[derive(Debug, Clone)]
pub enum Light {
    /// Directional light at infinity. `direction` points toward the light.
    Sun {
        direction: Vec3,
        color: Vec3,
        intensity: f32,
    },
    Point {
        position: Vec3,
        color: Vec3,
        intensity: f32,
    },
}

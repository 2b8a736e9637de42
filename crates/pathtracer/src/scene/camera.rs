use crate::geometry::Vec3;

/// Pinhole camera over a view frustum. The basis vectors are expected to be
/// unit length and mutually orthogonal; building them (rotation helpers,
/// interactive controls) is the caller's business.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub frustum_distance: f32,
}

impl Camera {
    /// Maps normalized device coordinates in [-1, 1] to a primary ray,
    /// returned as (origin, direction).
    pub fn primary_ray(&self, px: f32, py: f32) -> (Vec3, Vec3) {
        let target = self.position
            + self.forward * self.frustum_distance
            + self.up * py
            + self.right * px;
        (self.position, Vec3::normalized(target - self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_camera() -> Camera {
        Camera {
            position: Vec3::zero(),
            forward: Vec3(0.0, 0.0, -1.0),
            right: Vec3(1.0, 0.0, 0.0),
            up: Vec3(0.0, 1.0, 0.0),
            frustum_distance: 2.0,
        }
    }

    #[test]
    fn center_ray_is_forward() {
        let camera = axis_camera();
        let (origin, direction) = camera.primary_ray(0.0, 0.0);
        assert_eq!(origin, Vec3::zero());
        assert_eq!(direction, Vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn corner_rays_are_unit_length() {
        let camera = axis_camera();
        for (px, py) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            let (_, direction) = camera.primary_ray(px, py);
            assert!((direction.length() - 1.0).abs() < 1e-6);
        }
    }
}

use std::f32;

use image::RgbaImage;

use crate::geometry::Vec3;
use crate::materials::sample_nearest;

/// Environment a ray falls through to when it leaves the scene without
/// hitting anything.
#[derive(Debug)]
pub enum Skybox {
    SolidColor {
        color: Vec3,
    },
    /// Hemisphere blend on the world up axis; below the horizon it is a
    /// constant ground color.
    Gradient {
        ground: Vec3,
        horizon: Vec3,
        zenith: Vec3,
        intensity: f32,
    },
    /// Equirectangular environment image.
    Image {
        image: RgbaImage,
        intensity: f32,
    },
}

impl Skybox {
    pub fn sample(&self, direction: Vec3) -> Vec3 {
        match self {
            Skybox::SolidColor { color } => *color,
            Skybox::Gradient {
                ground,
                horizon,
                zenith,
                intensity,
            } => {
                let angle = Vec3::dot(direction, Vec3(0.0, 1.0, 0.0));
                if angle < 0.0 {
                    return *ground;
                }
                (*horizon * (1.0 - angle) + *zenith * angle) * *intensity
            }
            Skybox::Image { image, intensity } => {
                let dir = Vec3::normalized(direction);
                let phi = f32::atan2(dir.z(), dir.x());
                let theta = dir.y().clamp(-1.0, 1.0).acos();

                let u = (phi + f32::consts::PI) / (2.0 * f32::consts::PI);
                let v = theta / f32::consts::PI;

                let sample = sample_nearest(image, u, v);
                Vec3(sample.r(), sample.g(), sample.b()) * *intensity
            }
        }
    }
}

use image::RgbaImage;

use crate::geometry::Vec3;

mod texture;

pub use texture::sample_nearest;
pub use texture::srgb_to_linear;
pub use texture::Rgba;

/// Surface description as supplied by the loader. Everything the estimator
/// reads is here; the maps are decoded up front so rendering never touches
/// the filesystem.
#[derive(Debug)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub emissive: Vec3,

    /// Specular exponent, >= 0.
    pub shininess: f32,
    /// Index of refraction, >= 1.
    pub refraction_index: f32,
    /// Illumination-model tag, MTL conventions.
    pub illum: u32,

    pub diffuse_map: Option<RgbaImage>,
    pub bump_map: Option<RgbaImage>,
}

/// The closed set of scattering behaviors the estimator dispatches over.
/// Hybrids (a rough dielectric that also scatters diffusely or mirror-like)
/// are handled inside the dielectric branch via `reflectivity`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    Diffuse,
    Glossy,
    Dielectric,
}

impl Default for Material {
    fn default() -> Self {
        Material {
            diffuse: Vec3::zero(),
            specular: Vec3::zero(),
            emissive: Vec3::zero(),
            shininess: 0.0,
            refraction_index: 1.0,
            illum: 2,
            diffuse_map: None,
            bump_map: None,
        }
    }
}

impl Material {
    pub fn diffuse(color: Vec3) -> Material {
        Material {
            diffuse: color,
            ..Material::default()
        }
    }

    pub fn emissive(color: Vec3) -> Material {
        Material {
            emissive: color,
            ..Material::default()
        }
    }

    pub fn is_emissive(&self) -> bool {
        self.emissive != Vec3::zero()
    }

    pub fn has_texture(&self) -> bool {
        self.diffuse_map.is_some()
    }

    /// Mean specular reflectance, the weight of the stochastic mirror bounce
    /// in hybrid materials.
    pub fn reflectivity(&self) -> f32 {
        (self.specular.0 + self.specular.1 + self.specular.2) / 3.0
    }

    pub fn surface_kind(&self) -> SurfaceKind {
        match self.illum {
            // transmissive illumination models
            4 | 6 | 7 | 9 if self.refraction_index > 1.0 => SurfaceKind::Dielectric,
            // reflection-only models
            3 | 5 | 8 => SurfaceKind::Glossy,
            _ if self.shininess > 0.0
                && self.specular.max_component() > 0.0
                && self.diffuse.max_component() == 0.0 =>
            {
                SurfaceKind::Glossy
            }
            _ => SurfaceKind::Diffuse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_material_is_diffuse() {
        let material = Material::diffuse(Vec3(0.8, 0.8, 0.8));
        assert_eq!(material.surface_kind(), SurfaceKind::Diffuse);
        assert!(!material.is_emissive());
    }

    #[test]
    fn transmissive_illum_with_ior_is_dielectric() {
        let material = Material {
            refraction_index: 1.5,
            illum: 7,
            ..Material::default()
        };
        assert_eq!(material.surface_kind(), SurfaceKind::Dielectric);
    }

    #[test]
    fn transmissive_illum_without_ior_falls_back_to_diffuse() {
        let material = Material {
            refraction_index: 1.0,
            illum: 7,
            diffuse: Vec3(0.5, 0.5, 0.5),
            ..Material::default()
        };
        assert_eq!(material.surface_kind(), SurfaceKind::Diffuse);
    }

    #[test]
    fn shiny_specular_only_material_is_glossy() {
        let material = Material {
            specular: Vec3(0.9, 0.9, 0.9),
            shininess: 96.0,
            refraction_index: 1.0,
            illum: 2,
            ..Material::default()
        };
        assert_eq!(material.surface_kind(), SurfaceKind::Glossy);
    }
}

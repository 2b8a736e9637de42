use std::f32;

use pathtracer::accel::LinearBvh;
use pathtracer::geometry::Vec3;
use pathtracer::lights::Light;
use pathtracer::scene::Scene;

use crate::geometry::{barycentric_weights, interpolate_normal, EPSILON};
use crate::ray::Ray;
use crate::sample;
use crate::accel::traverse_bvh;

/// Offset applied to shadow-ray origins and segment ends so a surface never
/// occludes itself.
pub(crate) const SHADOW_BIAS: f32 = 1e-3;

pub(crate) fn occluded(bvh: &LinearBvh, ray: Ray, distance: f32) -> bool {
    traverse_bvh(bvh, ray, distance, true).is_some()
}

/// Incident radiance from one explicit light, already weighted by the
/// surface cosine; zero when the light is behind the surface or occluded.
/// Each light issues its own any-hit shadow query.
pub(crate) fn sample_light(
    light: &Light,
    bvh: &LinearBvh,
    point: Vec3,
    normal: Vec3,
    max_distance: f32,
) -> Vec3 {
    match light {
        Light::Sun {
            direction,
            color,
            intensity,
        } => {
            let cos_surface = Vec3::dot(normal, *direction);
            if cos_surface <= 0.0 {
                return Vec3::zero();
            }
            let shadow_ray = Ray::new(point + normal * SHADOW_BIAS, *direction);
            if occluded(bvh, shadow_ray, max_distance) {
                return Vec3::zero();
            }
            *color * (*intensity * cos_surface)
        }
        Light::Point {
            position,
            color,
            intensity,
        } => {
            let to_light = *position - point;
            let distance = to_light.length();
            if distance <= SHADOW_BIAS {
                return Vec3::zero();
            }
            let direction = to_light / distance;
            let cos_surface = Vec3::dot(normal, direction);
            if cos_surface <= 0.0 {
                return Vec3::zero();
            }
            let shadow_ray = Ray::new(point + normal * SHADOW_BIAS, direction);
            if occluded(bvh, shadow_ray, distance - SHADOW_BIAS) {
                return Vec3::zero();
            }
            *color * (*intensity * cos_surface / (distance * distance))
        }
    }
}

/// One next-event-estimation sample: a uniform point on a uniformly chosen
/// emissive triangle, shadow-tested, weighted by the geometry term and the
/// balance heuristic against the cosine-sampled indirect path. The returned
/// value is everything but the BRDF factor, which the caller applies.
///
/// Lights emit from their outward-facing side only; a sample seen from the
/// back contributes nothing.
pub(crate) fn sample_emissive(scene: &Scene, bvh: &LinearBvh, point: Vec3, normal: Vec3) -> Vec3 {
    let emitter_count = scene.emissive_triangles.len();
    if emitter_count == 0 {
        return Vec3::zero();
    }

    let tri = scene.emissive_triangles[sample::sample_index(emitter_count)];
    let (a, b, c) = scene.geometry.triangle_vertices(tri);
    let light_point = sample::sample_triangle(a, b, c);

    let to_light = light_point - point;
    let distance_squared = to_light.square_magnitude();
    if distance_squared <= EPSILON {
        return Vec3::zero();
    }
    let distance = distance_squared.sqrt();
    let direction = to_light / distance;

    let cos_surface = Vec3::dot(normal, direction);
    if cos_surface <= 0.0 {
        return Vec3::zero();
    }

    let (na, nb, nc) = scene.geometry.triangle_normals(tri);
    let light_normal = interpolate_normal(barycentric_weights(light_point, a, b, c), na, nb, nc);
    let cos_light = Vec3::dot(light_normal, -direction);
    if cos_light <= 0.0 {
        return Vec3::zero();
    }

    let area = scene.geometry.triangle_area(tri);
    if area <= EPSILON {
        return Vec3::zero();
    }

    let shadow_ray = Ray::new(point + normal * SHADOW_BIAS, direction);
    if occluded(bvh, shadow_ray, distance - 2.0 * SHADOW_BIAS) {
        return Vec3::zero();
    }

    let emitted = scene.geometry.material_of(tri).emissive;

    // solid-angle densities of this strategy and of the competing
    // cosine-weighted indirect path
    let pdf_nee = distance_squared / (emitter_count as f32 * area * cos_light);
    let pdf_indirect = cos_surface * f32::consts::FRAC_1_PI;
    let weight = sample::power_heuristic(pdf_nee, pdf_indirect);

    emitted
        * (weight * cos_surface * cos_light * emitter_count as f32 * area / distance_squared)
}

/// Solid-angle density with which next-event estimation would have produced
/// a point on `tri` seen along `direction` at `distance`; the competing pdf
/// in the weight applied when an indirect ray lands on an emitter. Zero when
/// the emitter is seen from behind or cannot be sampled at all.
pub(crate) fn emissive_solid_angle_pdf(
    scene: &Scene,
    tri: u32,
    direction: Vec3,
    distance: f32,
    light_normal: Vec3,
) -> f32 {
    let emitter_count = scene.emissive_triangles.len();
    if emitter_count == 0 {
        return 0.0;
    }
    let area = scene.geometry.triangle_area(tri);
    let cos_light = Vec3::dot(light_normal, -direction);
    if area <= EPSILON || cos_light <= EPSILON {
        return 0.0;
    }
    (distance * distance) / (emitter_count as f32 * area * cos_light)
}

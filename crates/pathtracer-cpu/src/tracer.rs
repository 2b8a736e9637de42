//! The recursive light-transport estimator. One invocation estimates the
//! radiance arriving along a ray; it recurses through the traversal engine
//! for every sampled direction and terminates at the sky, the bounce budget,
//! or an exhausted path throughput.

use std::f32;

use pathtracer::accel::{BvhTriangle, LinearBvh};
use pathtracer::geometry::Vec3;
use pathtracer::materials::{Material, SurfaceKind};
use pathtracer::scene::Scene;

use crate::accel::traverse_bvh;
use crate::geometry::{barycentric_weights, interpolate_normal};
use crate::lights::{self, SHADOW_BIAS};
use crate::materials::evaluate_diffuse_surface;
use crate::media::RefractiveIndexTracker;
use crate::ray::Ray;
use crate::sample;
use crate::{RaytracerSettings, RenderStats};

/// Paths whose accumulated throughput drops below this contribute nothing
/// visible; recursion stops regardless of the remaining bounce budget.
const MIN_ENERGY: f32 = 1e-3;

/// Throughput retained per total-internal-reflection bounce, so a ray
/// rattling around inside a solid terminates.
const TIR_LOSS: f32 = 0.9;

const SURFACE_BIAS: f32 = 1e-3;

/// Read-only state shared by every estimator invocation of a render.
#[derive(Clone, Copy)]
pub(crate) struct TraceContext<'scene> {
    pub(crate) scene: &'scene Scene,
    pub(crate) bvh: &'scene LinearBvh,
    pub(crate) settings: &'scene RaytracerSettings,
    pub(crate) stats: &'scene RenderStats,
}

/// Estimates incoming radiance along `ray`.
///
/// `last_normal` is the shading normal at the previous bounce (unused when
/// `specular_bounce` is set, which covers primary rays too); it feeds the
/// weight that keeps direct light from being counted both here and by the
/// previous bounce's next-event estimation. `energy` is the path throughput
/// accumulated so far and `media` tracks the refractive indices the ray is
/// currently inside of; a medium crossing hands the recursion its own copy,
/// so sibling samples always see the state the ray arrived with.
pub(crate) fn radiance(
    ctx: &TraceContext<'_>,
    ray: Ray,
    bounces: i32,
    last_normal: Vec3,
    specular_bounce: bool,
    media: &RefractiveIndexTracker,
    energy: f32,
) -> Vec3 {
    if bounces < 0 || energy < MIN_ENERGY {
        return Vec3::zero();
    }

    let Some(hit) = traverse_bvh(ctx.bvh, ray, ctx.settings.max_trace_distance, false) else {
        return ctx.scene.skybox.sample(ray.direction);
    };

    let tri = &ctx.bvh.triangles[hit.tri as usize];
    let point = ray.at(hit.t);

    // the traversal only reports a distance; re-derive the barycentric
    // weights from the hit point for normal and UV interpolation
    let weights = barycentric_weights(point, tri.a, tri.b, tri.c);
    let (na, nb, nc) = ctx.scene.geometry.triangle_normals(tri.index);
    let mut normal = interpolate_normal(weights, na, nb, nc);
    if normal == Vec3::zero() {
        normal = Vec3::normalized(Vec3::cross(tri.b - tri.a, tri.c - tri.a));
    }

    let material = ctx.scene.geometry.material_of(tri.index);

    if material.is_emissive() {
        return emitted_radiance(ctx, ray, hit.t, tri, normal, last_normal, specular_bounce);
    }

    match material.surface_kind() {
        SurfaceKind::Diffuse => {
            diffuse_radiance(ctx, point, normal, tri, material, weights, bounces, media, energy)
        }
        SurfaceKind::Glossy => {
            glossy_radiance(ctx, ray, point, normal, material, bounces, media, energy)
        }
        SurfaceKind::Dielectric => {
            dielectric_radiance(ctx, ray, point, normal, material, bounces, media, energy)
        }
    }
}

/// Radiance returned when the ray lands on an emitter. Specular chains (and
/// primary rays) see the full emission; a diffuse indirect ray instead gets
/// the balance-heuristic weight against the next-event-estimation sample the
/// previous bounce already took, so direct light is not counted twice.
/// Emission leaves the outward-facing side only.
fn emitted_radiance(
    ctx: &TraceContext<'_>,
    ray: Ray,
    distance: f32,
    tri: &BvhTriangle,
    light_normal: Vec3,
    last_normal: Vec3,
    specular_bounce: bool,
) -> Vec3 {
    let material = ctx.scene.geometry.material_of(tri.index);

    let cos_light = Vec3::dot(light_normal, -ray.direction);
    if cos_light <= 0.0 {
        return Vec3::zero();
    }

    if specular_bounce {
        return material.emissive;
    }

    let pdf_indirect =
        f32::max(0.0, Vec3::dot(last_normal, ray.direction)) * f32::consts::FRAC_1_PI;
    let pdf_nee = lights::emissive_solid_angle_pdf(
        ctx.scene,
        tri.index,
        ray.direction,
        distance,
        light_normal,
    );
    material.emissive * sample::power_heuristic(pdf_indirect, pdf_nee)
}

/// The Lambertian path. Cosine-weighted sampling already matches the BRDF's
/// density, so sky and indirect terms carry the plain albedo; the explicit
/// light and next-event terms carry albedo/pi against radiance that still
/// includes the surface cosine.
#[allow(clippy::too_many_arguments)]
fn diffuse_radiance(
    ctx: &TraceContext<'_>,
    point: Vec3,
    normal: Vec3,
    tri: &BvhTriangle,
    material: &Material,
    weights: (f32, f32, f32),
    bounces: i32,
    media: &RefractiveIndexTracker,
    energy: f32,
) -> Vec3 {
    let surface =
        evaluate_diffuse_surface(material, &ctx.scene.geometry, tri.index, weights, normal);
    let albedo = surface.albedo;
    let normal = surface.normal;

    ctx.stats.count_ray();

    let mut color = Vec3::zero();

    // sky, one cosine-weighted occlusion-tested sample
    let sky_direction = sample::sample_cosine_hemisphere(normal);
    let sky_ray = Ray::new(point + normal * SHADOW_BIAS, sky_direction);
    if !lights::occluded(ctx.bvh, sky_ray, ctx.settings.max_trace_distance) {
        color += albedo * ctx.scene.skybox.sample(sky_direction);
    }

    // explicit lights, one sample each; the light does its own shadow test
    for light in &ctx.scene.lights {
        let contribution = lights::sample_light(
            light,
            ctx.bvh,
            point,
            normal,
            ctx.settings.max_trace_distance,
        );
        color += albedo * f32::consts::FRAC_1_PI * contribution;
    }

    // next-event estimation on the emissive triangles
    let nee = lights::sample_emissive(ctx.scene, ctx.bvh, point, normal);
    color += albedo * f32::consts::FRAC_1_PI * nee;

    // indirect bounce(s)
    let scatter_rays = ctx.settings.scatter_rays.max(1);
    let next_energy = energy * albedo.max_component().clamp(0.0, 1.0);
    let mut indirect = Vec3::zero();
    for _ in 0..scatter_rays {
        let direction = sample::sample_cosine_hemisphere(normal);
        let bounce_ray = Ray::new(point + normal * SURFACE_BIAS, direction);
        indirect += albedo
            * radiance(ctx, bounce_ray, bounces - 1, normal, false, media, next_energy);
    }

    color + indirect / scatter_rays as f32
}

/// Mirror-like surface with a lobe widened by low shininess: directions are
/// sampled inside a cone around the reflection, averaged, and tinted by the
/// specular color.
#[allow(clippy::too_many_arguments)]
fn glossy_radiance(
    ctx: &TraceContext<'_>,
    ray: Ray,
    point: Vec3,
    normal: Vec3,
    material: &Material,
    bounces: i32,
    media: &RefractiveIndexTracker,
    energy: f32,
) -> Vec3 {
    if material.specular == Vec3::zero() {
        return Vec3::zero();
    }

    // shade the side the ray actually arrived on
    let normal = if Vec3::dot(ray.direction, normal) > 0.0 {
        -normal
    } else {
        normal
    };
    let reflection = Vec3::reflect(ray.direction, normal);
    let exponent = material.shininess.max(1.0);

    let scatter_rays = ctx.settings.scatter_rays.max(1);
    let next_energy = energy * material.reflectivity().clamp(0.0, 1.0);
    let mut gathered = Vec3::zero();
    for _ in 0..scatter_rays {
        let direction = sample::sample_power_lobe(reflection, exponent);
        // lobe samples dipping under the surface are discarded
        if Vec3::dot(direction, normal) <= 0.0 {
            continue;
        }
        let bounce_ray = Ray::new(point + normal * SURFACE_BIAS, direction);
        gathered += radiance(ctx, bounce_ray, bounces - 1, normal, true, media, next_energy);
    }

    material.specular * gathered / scatter_rays as f32
}

/// Refraction through a transparent medium. The index ratio comes from the
/// tracker: the current entry against the material's index when entering,
/// against the enclosing medium's index when leaving. Total internal
/// reflection mirrors instead, does not touch the tracker, and bleeds energy
/// so closed shells terminate. A non-zero mean specular reflectance makes
/// the surface a hybrid: it additionally takes a single stochastic bounce,
/// mirror with probability equal to that reflectance, diffuse otherwise.
#[allow(clippy::too_many_arguments)]
fn dielectric_radiance(
    ctx: &TraceContext<'_>,
    ray: Ray,
    point: Vec3,
    normal: Vec3,
    material: &Material,
    bounces: i32,
    media: &RefractiveIndexTracker,
    energy: f32,
) -> Vec3 {
    let entering = Vec3::dot(ray.direction, normal) < 0.0;
    let surface_normal = if entering { normal } else { -normal };

    let current = media.current_index();
    let next = if entering {
        material.refraction_index
    } else {
        media.previous_index()
    };
    let eta = current / next;

    let cos_incident = -Vec3::dot(ray.direction, surface_normal);
    let discriminant = 1.0 - eta * eta * (1.0 - cos_incident * cos_incident);

    let transmitted = if discriminant < 0.0 {
        // total internal reflection; the medium stack is left as-is
        let direction = Vec3::reflect(ray.direction, surface_normal);
        let bounce_ray = Ray::new(point + surface_normal * SURFACE_BIAS, direction);
        radiance(ctx, bounce_ray, bounces - 1, normal, true, media, energy * TIR_LOSS) * TIR_LOSS
    } else {
        let direction = Vec3::normalized(
            ray.direction * eta + surface_normal * (eta * cos_incident - discriminant.sqrt()),
        );
        let mut inside = media.clone();
        if entering {
            inside.push(next);
        } else {
            inside.pop();
        }
        let bounce_ray = Ray::new(point - surface_normal * SURFACE_BIAS, direction);
        radiance(ctx, bounce_ray, bounces - 1, normal, true, &inside, energy)
    };

    let reflectivity = material.reflectivity().clamp(0.0, 1.0);
    if reflectivity <= 0.0 {
        return transmitted;
    }

    let extra = if sample::sample_uniform() < reflectivity {
        let direction = Vec3::reflect(ray.direction, surface_normal);
        let bounce_ray = Ray::new(point + surface_normal * SURFACE_BIAS, direction);
        material.specular
            * radiance(ctx, bounce_ray, bounces - 1, normal, true, media, energy * reflectivity)
    } else {
        let direction = sample::sample_cosine_hemisphere(surface_normal);
        let bounce_ray = Ray::new(point + surface_normal * SURFACE_BIAS, direction);
        let next_energy = energy * material.diffuse.max_component().clamp(0.0, 1.0);
        material.diffuse
            * radiance(ctx, bounce_ray, bounces - 1, normal, false, media, next_energy)
    };

    transmitted + extra
}

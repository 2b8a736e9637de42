//! Per-hit surface evaluation for the diffuse path: textured albedo and
//! bump-perturbed shading normal.

use pathtracer::geometry::{GeometryStore, Vec2, Vec3};
use pathtracer::materials::{sample_nearest, srgb_to_linear, Material};
use tracing::warn;

use crate::geometry::{make_orthonormal_basis, EPSILON};

pub(crate) struct SurfacePoint {
    pub(crate) albedo: Vec3,
    pub(crate) normal: Vec3,
}

/// Albedo and shading normal at a point on a triangle, given the barycentric
/// weights of the hit. Color maps are decoded sRGB and converted to linear;
/// bump maps are treated as linear tangent-space vectors.
pub(crate) fn evaluate_diffuse_surface(
    material: &Material,
    store: &GeometryStore,
    tri: u32,
    weights: (f32, f32, f32),
    shading_normal: Vec3,
) -> SurfacePoint {
    let (uv0, uv1, uv2) = store.triangle_uvs(tri);
    let (u, v, w) = weights;
    let uv = uv0 * u + uv1 * v + uv2 * w;

    let mut albedo = material.diffuse;
    if let Some(map) = &material.diffuse_map {
        let texel = sample_nearest(map, uv.x(), uv.y());
        albedo = albedo
            * Vec3(
                srgb_to_linear(texel.r()),
                srgb_to_linear(texel.g()),
                srgb_to_linear(texel.b()),
            );
    }

    let mut normal = shading_normal;
    if let Some(map) = &material.bump_map {
        let texel = sample_nearest(map, uv.x(), uv.y());
        let perturbation = Vec3(
            texel.r() * 2.0 - 1.0,
            texel.g() * 2.0 - 1.0,
            texel.b() * 2.0 - 1.0,
        );

        let (tangent, bitangent) = tangent_basis(store, tri, shading_normal);
        let perturbed = Vec3::normalized(
            tangent * perturbation.x()
                + bitangent * perturbation.y()
                + shading_normal * perturbation.z().max(0.0),
        );
        if perturbed == Vec3::zero() {
            warn!("bump map produced a zero normal, keeping the geometric one");
        } else {
            normal = perturbed;
        }
    }

    SurfacePoint { albedo, normal }
}

/// Tangent frame aligned with the surface's UV parameterization, derived
/// from the positional and UV edge deltas. Degenerate texture coordinates
/// (near-zero determinant) fall back to an arbitrary orthonormal basis.
fn tangent_basis(store: &GeometryStore, tri: u32, normal: Vec3) -> (Vec3, Vec3) {
    let (a, b, c) = store.triangle_vertices(tri);
    let (uv0, uv1, uv2) = store.triangle_uvs(tri);

    let edge1 = b - a;
    let edge2 = c - a;
    let duv1 = uv1 - uv0;
    let duv2 = uv2 - uv0;

    let determinant = duv1.x() * duv2.y() - duv2.x() * duv1.y();
    if determinant.abs() < EPSILON {
        return make_orthonormal_basis(normal);
    }

    let inv = 1.0 / determinant;
    let tangent = (edge1 * duv2.y() - edge2 * duv1.y()) * inv;
    // re-orthogonalize against the shading normal
    let tangent = Vec3::normalized(tangent - normal * Vec3::dot(normal, tangent));
    if tangent == Vec3::zero() {
        return make_orthonormal_basis(normal);
    }
    let bitangent = Vec3::cross(normal, tangent);
    (tangent, bitangent)
}

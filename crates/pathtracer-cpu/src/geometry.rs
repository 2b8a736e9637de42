//! Pure intersection and basis primitives, called in the innermost loops.
//! Nothing here allocates; degenerate inputs degrade to "no intersection" or
//! a fallback basis rather than faulting.

use pathtracer::geometry::Vec3;

use crate::ray::Ray;

pub(crate) const EPSILON: f32 = 1e-6;

/// Möller-Trumbore test of a ray segment against a triangle. Returns the hit
/// distance for a forward intersection within `segment`, with epsilon
/// tolerance on the barycentric bounds for numerical robustness. Directions
/// are assumed unit length.
pub(crate) fn intersect_segment_triangle(
    origin: Vec3,
    direction: Vec3,
    segment: f32,
    a: Vec3,
    b: Vec3,
    c: Vec3,
) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;

    // near-zero determinant: parallel ray or degenerate triangle
    let pvec = Vec3::cross(direction, edge2);
    let determinant = Vec3::dot(edge1, pvec);
    if determinant.abs() < EPSILON {
        return None;
    }
    let inv_determinant = 1.0 / determinant;

    let tvec = origin - a;
    let u = Vec3::dot(tvec, pvec) * inv_determinant;
    if u < -EPSILON || u > 1.0 + EPSILON {
        return None;
    }

    let qvec = Vec3::cross(tvec, edge1);
    let v = Vec3::dot(direction, qvec) * inv_determinant;
    if v < -EPSILON || u + v > 1.0 + EPSILON {
        return None;
    }

    let t = Vec3::dot(edge2, qvec) * inv_determinant;
    if t > EPSILON && t <= segment {
        Some(t)
    } else {
        None
    }
}

/// Barycentric weights of `p` with respect to the triangle, clamped and
/// renormalized so they always sum to one. A degenerate triangle weights
/// everything onto the first vertex.
pub(crate) fn barycentric_weights(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> (f32, f32, f32) {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;

    let d00 = Vec3::dot(v0, v0);
    let d01 = Vec3::dot(v0, v1);
    let d11 = Vec3::dot(v1, v1);
    let d20 = Vec3::dot(v2, v0);
    let d21 = Vec3::dot(v2, v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < EPSILON {
        return (1.0, 0.0, 0.0);
    }

    let v = ((d11 * d20 - d01 * d21) / denom).clamp(0.0, 1.0);
    let w = ((d00 * d21 - d01 * d20) / denom).clamp(0.0, 1.0);
    let u = (1.0 - v - w).clamp(0.0, 1.0);

    let sum = u + v + w;
    if sum > EPSILON {
        (u / sum, v / sum, w / sum)
    } else {
        (1.0, 0.0, 0.0)
    }
}

/// Smooth normal at a point on the triangle, interpolated from the vertex
/// normals by the same barycentric weights the intersection used.
pub(crate) fn interpolate_normal(
    weights: (f32, f32, f32),
    na: Vec3,
    nb: Vec3,
    nc: Vec3,
) -> Vec3 {
    let (u, v, w) = weights;
    Vec3::normalized(
        Vec3::normalized(na) * u + Vec3::normalized(nb) * v + Vec3::normalized(nc) * w,
    )
}

/// Two unit tangents completing `normal` to an orthonormal frame. The helper
/// up-axis switches when the normal is itself mostly vertical.
pub(crate) fn make_orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let up = if normal.y().abs() < 0.9 {
        Vec3(0.0, 1.0, 0.0)
    } else {
        Vec3(1.0, 0.0, 0.0)
    };
    let tangent = Vec3::normalized(Vec3::cross(normal, up));
    let bitangent = Vec3::normalized(Vec3::cross(normal, tangent));
    (tangent, bitangent)
}

/// Slab-method entry distance of a ray against a box, or infinity when the
/// slabs do not overlap, the overlap is behind the ray, or the entry lies
/// beyond `limit`. A zero direction component yields an infinite inverse,
/// which IEEE min/max comparisons handle without special cases. An origin
/// inside the box clamps to an entry distance of zero.
pub(crate) fn intersect_aabb(minimum: Vec3, maximum: Vec3, ray: Ray, limit: f32) -> f32 {
    let inv_x = 1.0 / ray.direction.0;
    let t1 = (minimum.0 - ray.origin.0) * inv_x;
    let t2 = (maximum.0 - ray.origin.0) * inv_x;
    let mut t_min = f32::min(t1, t2);
    let mut t_max = f32::max(t1, t2);

    let inv_y = 1.0 / ray.direction.1;
    let t1 = (minimum.1 - ray.origin.1) * inv_y;
    let t2 = (maximum.1 - ray.origin.1) * inv_y;
    t_min = f32::max(t_min, f32::min(t1, t2));
    t_max = f32::min(t_max, f32::max(t1, t2));

    let inv_z = 1.0 / ray.direction.2;
    let t1 = (minimum.2 - ray.origin.2) * inv_z;
    let t2 = (maximum.2 - ray.origin.2) * inv_z;
    t_min = f32::max(t_min, f32::min(t1, t2));
    t_max = f32::min(t_max, f32::max(t1, t2));

    if t_min > f32::min(t_max, limit) || t_max < 0.0 {
        return f32::INFINITY;
    }

    f32::max(0.0, t_min)
}

use std::cell::RefCell;
use std::f32;

use pathtracer::geometry::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geometry::make_orthonormal_basis;

// Per-thread generator so worker threads never contend and renders are
// reproducible once each worker is seeded.
thread_local! {
    static RNG: RefCell<ChaCha8Rng> = RefCell::new(ChaCha8Rng::seed_from_u64(0));
}

pub fn set_seed(seed: u64) {
    RNG.with_borrow_mut(|rng| {
        *rng = ChaCha8Rng::seed_from_u64(seed);
    })
}

pub(crate) fn sample_uniform() -> f32 {
    RNG.with_borrow_mut(|rng| rng.random_range(0.0..1.0))
}

pub(crate) fn sample_uniform2() -> Vec2 {
    Vec2(sample_uniform(), sample_uniform())
}

pub(crate) fn sample_index(n: usize) -> usize {
    RNG.with_borrow_mut(|rng| rng.random_range(0..n))
}

pub(crate) fn sample_unit_disk() -> Vec2 {
    let u = sample_uniform2();
    let r = u.0.sqrt();
    let theta = 2.0 * f32::consts::PI * u.1;
    Vec2(r * theta.cos(), r * theta.sin())
}

/// World-space direction distributed proportionally to cos(angle to
/// `normal`); the density matching a Lambertian lobe, so the cosine never
/// appears explicitly in the estimator.
pub(crate) fn sample_cosine_hemisphere(normal: Vec3) -> Vec3 {
    let d = sample_unit_disk();
    let z = f32::sqrt(f32::max(0.0, 1.0 - d.square_magnitude()));
    let (tangent, bitangent) = make_orthonormal_basis(normal);
    tangent * d.0 + bitangent * d.1 + normal * z
}

/// Direction inside a cone around `axis`, polar angle importance-sampled
/// with density proportional to cos^exponent. Large exponents concentrate
/// the lobe toward the axis; may return directions below a surface whose
/// normal differs from the axis, which callers discard.
pub(crate) fn sample_power_lobe(axis: Vec3, exponent: f32) -> Vec3 {
    let u = sample_uniform2();
    let cos_theta = u.0.powf(1.0 / (exponent + 1.0));
    let sin_theta = f32::sqrt(f32::max(0.0, 1.0 - cos_theta * cos_theta));
    let phi = 2.0 * f32::consts::PI * u.1;

    let (tangent, bitangent) = make_orthonormal_basis(axis);
    tangent * (phi.cos() * sin_theta) + bitangent * (phi.sin() * sin_theta) + axis * cos_theta
}

/// Uniform point on a triangle. The folded-square mapping keeps both halves
/// of the unit square inside the barycentric simplex.
pub(crate) fn sample_triangle(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let u = sample_uniform2();
    let (b0, b1) = if u.0 < u.1 {
        (u.0 / 2.0, u.1 - u.0 / 2.0)
    } else {
        (u.0 - u.1 / 2.0, u.1 / 2.0)
    };
    let b2 = 1.0 - b0 - b1;
    a * b0 + b * b1 + c * b2
}

/// Power-2 balance heuristic combining two sampling strategies. The weight
/// is 1 when the competing strategy cannot generate the sample at all.
pub(crate) fn power_heuristic(pdf_a: f32, pdf_b: f32) -> f32 {
    if !(pdf_b > 0.0) || !pdf_b.is_finite() {
        return 1.0;
    }
    let a2 = pdf_a * pdf_a;
    let b2 = pdf_b * pdf_b;
    if a2 + b2 <= 0.0 {
        return 0.0;
    }
    a2 / (a2 + b2)
}

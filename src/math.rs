use glam::{Mat3, Quat, Vec3};
use rand::Rng;

pub const EPSILON: f32 = 1.0e-6;

/// Unit vector along `v`, or zero when `v` has no usable length.
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON * EPSILON || !len_sq.is_finite() {
        return Vec3::ZERO;
    }
    v / len_sq.sqrt()
}

pub fn normalize_or_default(v: Vec3, default: Vec3) -> Vec3 {
    let n = normalize_or_zero(v);
    if n == Vec3::ZERO {
        default
    } else {
        n
    }
}

/// Rescale `v` to exactly `magnitude`, keeping its direction.
pub fn normalize_to_magnitude(v: Vec3, magnitude: f32) -> Vec3 {
    normalize_or_zero(v) * magnitude
}

pub fn limit_magnitude(v: Vec3, max_magnitude: f32) -> Vec3 {
    if max_magnitude <= 0.0 {
        return Vec3::ZERO;
    }

    let mag_sq = v.length_squared();
    if mag_sq <= max_magnitude * max_magnitude {
        return v;
    }
    normalize_to_magnitude(v, max_magnitude)
}

/// Uniform sample in `[min, max)`. A collapsed range returns `min`.
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.gen::<f32>() * (max - min)
}

pub fn rand_in_box<R: Rng + ?Sized>(rng: &mut R, min: Vec3, max: Vec3) -> Vec3 {
    Vec3::new(
        rand_range(rng, min.x, max.x),
        rand_range(rng, min.y, max.y),
        rand_range(rng, min.z, max.z),
    )
}

/// Look-at rotation whose local -Z axis points along `heading`, with +Y
/// kept as close to world up as the heading allows.
pub fn heading_orientation(heading: Vec3) -> Quat {
    let forward = normalize_or_default(heading, Vec3::X);
    let back = -forward;

    let mut up_ref = Vec3::Y;
    if forward.dot(up_ref).abs() > 0.97 {
        up_ref = Vec3::Z;
    }

    let right = normalize_or_default(up_ref.cross(back), Vec3::X);
    let up = normalize_or_default(back.cross(right), Vec3::Y);

    Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
}

pub fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

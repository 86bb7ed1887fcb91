pub mod engine;
pub mod index;
mod matching;

use serde::{Deserialize, Serialize};

/// Multiplier applied to the half-averages before clamping. Chosen so that
/// typical unit-normalized embeddings spread across the display range.
pub const PROJECTION_GAIN: f32 = 2500.0;

/// Half-width of the display range on both axes.
pub const PLANE_BOUND: f32 = 100.0;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

// accumulate in f64 so large components don't overflow to inf
fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

fn magnitude(a: &[f32]) -> f64 {
    a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt()
}

/// Reject vectors carrying NaN or infinite components.
pub fn ensure_finite(v: &[f32]) -> anyhow::Result<()> {
    match v.iter().position(|x| !x.is_finite()) {
        Some(i) => anyhow::bail!("embedding component {} is not finite: {}", i, v[i]),
        None => Ok(()),
    }
}

/// Cosine of the angle between `a` and `b`.
///
/// Both vectors must have the same length. A zero-magnitude vector has a
/// similarity of 0 to everything, itself included.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine_similarity on mismatched dims");
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot_product(a, b) / (mag_a * mag_b)) as f32
}

/// Scale `v` to unit length in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let mag = magnitude(v);
    if mag > 0.0 {
        v.iter_mut().for_each(|x| *x = (f64::from(*x) / mag) as f32);
    }
}

/// Coarse 2-D placement: mean of the first half on x, mean of the second
/// half on y, scaled by [`PROJECTION_GAIN`] and clamped to the display range.
pub fn project_to_plane(v: &[f32]) -> Point2D {
    let (left, right) = v.split_at(v.len() / 2);
    Point2D {
        x: axis(left),
        y: axis(right),
    }
}

fn axis(half: &[f32]) -> f32 {
    if half.is_empty() {
        return 0.0;
    }
    let mean = half.iter().map(|x| f64::from(*x)).sum::<f64>() / half.len() as f64;
    let scaled = (mean * f64::from(PROJECTION_GAIN)) as f32;
    if scaled.is_nan() {
        return 0.0;
    }
    scaled.clamp(-PLANE_BOUND, PLANE_BOUND)
}

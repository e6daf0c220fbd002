//! Vector helpers shared by the index, ranking, and consolidation.

/// Cosine similarity between two vectors.
/// Returns 0.0 for mismatched, empty, or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Map a cosine similarity from [-1, 1] onto [0, 1].
pub fn rescale_unit(similarity: f64) -> f64 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// L2-normalize in place. Zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Weighted average of two equally sized vectors.
///
/// Falls back to the plain mean when both weights are zero.
pub fn weighted_average(a: &[f32], wa: f64, b: &[f32], wb: f64) -> Vec<f32> {
    let (wa, wb) = if wa + wb <= f64::EPSILON {
        (0.5, 0.5)
    } else {
        (wa / (wa + wb), wb / (wa + wb))
    };
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64 * wa + *y as f64 * wb) as f32)
        .collect()
}

/// Whether every component is finite.
pub fn is_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

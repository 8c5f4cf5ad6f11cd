//! Madsen-Browning variant weights.
//!
//! For a subset with `n` non-missing individuals carrying `m` copies of the
//! minor allele the weight is `(2n + 2) / sqrt(n (m + 1) (2n - m + 1))`,
//! the inverse of the estimated standard deviation of the allele count.
use biobin_core::WeightModel;

/// Madsen-Browning weight of a subset. Evaluated in `f64`; `m` is at most `2n`.
pub fn madsen_browning(n: u32, m: u32) -> f64 {
    let n = n as f64;
    let m = m as f64;
    (2.0 * n + 2.0) / (n * (m + 1.0) * (2.0 * n - m + 1.0)).sqrt()
}

/// Larger of two weights, where a NaN operand never wins.
pub fn nan_safe_max(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (_, true) => a,
        _ => a.max(b),
    }
}

/// Smaller of two weights, where a NaN operand never wins.
pub fn nan_safe_min(a: f64, b: f64) -> f64 {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => b,
        (_, true) => a,
        _ => a.min(b),
    }
}

/// Non-missing individuals and minor allele copies observed in one subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlleleCounts {
    pub n: u32,
    pub m: u32,
}

impl AlleleCounts {
    /// Weight of this subset, or NaN when it has no observations.
    fn weight(&self) -> f64 {
        if self.n == 0 {
            f64::NAN
        } else {
            madsen_browning(self.n, self.m)
        }
    }
}

///
/// Combine control and case counts into one weight according to `model`.
///
/// A subset without observations contributes no weight; when no weight is
/// available at all the result is 1.
///
pub fn select_weight(model: WeightModel, controls: AlleleCounts, cases: AlleleCounts) -> f64 {
    let weight = match model {
        WeightModel::Max => nan_safe_max(controls.weight(), cases.weight()),
        WeightModel::Min => nan_safe_min(controls.weight(), cases.weight()),
        WeightModel::Control => controls.weight(),
        WeightModel::Overall => AlleleCounts {
            n: controls.n + cases.n,
            m: controls.m + cases.m,
        }
        .weight(),
    };

    if weight.is_finite() { weight } else { 1.0 }
}

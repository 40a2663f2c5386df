//! Shared Window Statistics
//!
//! ## Overview
//!
//! Small numeric helpers used by every channel and by the precision layer.
//! They all operate on borrowed slices of `f32`, never panic on empty input,
//! and use `libm` so the crate keeps building without `std`.
//!
//! ## Conventions
//!
//! - Empty input yields `0.0` (or `None` where an absent result matters)
//! - Variance is the population variance (divide by `n`)
//! - Sorting uses `f32::total_cmp`; callers are expected to feed finite data

use alloc::vec::Vec;
use libm::{fabsf, sqrtf};

/// Arithmetic mean, `0.0` for empty input
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population variance
pub fn variance(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

/// Population standard deviation
pub fn std_dev(values: &[f32]) -> f32 {
    sqrtf(variance(values))
}

/// Coefficient of variation (std / |mean|), `0.0` when the mean is ~0
pub fn coefficient_of_variation(values: &[f32]) -> f32 {
    let m = mean(values);
    if fabsf(m) < f32::EPSILON {
        return 0.0;
    }
    std_dev(values) / fabsf(m)
}

/// Returns a sorted copy of `values`
pub fn sorted(values: &[f32]) -> Vec<f32> {
    let mut out: Vec<f32> = values.to_vec();
    out.sort_unstable_by(f32::total_cmp);
    out
}

/// Median, `None` for empty input
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    let mid = s.len() / 2;
    if s.len() % 2 == 0 {
        Some((s[mid - 1] + s[mid]) / 2.0)
    } else {
        Some(s[mid])
    }
}

/// Linear-interpolated quantile of an already sorted slice
fn quantile_sorted(sorted: &[f32], q: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
    let lo = pos as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = pos - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// First and third quartiles
pub fn quartiles(values: &[f32]) -> Option<(f32, f32)> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    Some((quantile_sorted(&s, 0.25), quantile_sorted(&s, 0.75)))
}

/// Keeps values inside `[Q1 - k*IQR, Q3 + k*IQR]`
///
/// With fewer than four values there is no meaningful spread and the input
/// is returned unchanged.
pub fn iqr_filter(values: &[f32], k: f32) -> Vec<f32> {
    if values.len() < 4 {
        return values.to_vec();
    }
    let Some((q1, q3)) = quartiles(values) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let lo = q1 - k * iqr;
    let hi = q3 + k * iqr;
    values.iter().copied().filter(|v| *v >= lo && *v <= hi).collect()
}

/// Minimum and maximum, `None` for empty input
pub fn min_max(values: &[f32]) -> Option<(f32, f32)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Peak-to-peak span, `0.0` for empty input
pub fn span(values: &[f32]) -> f32 {
    min_max(values).map(|(lo, hi)| hi - lo).unwrap_or(0.0)
}

/// Counts sign changes of `values - reference`
pub fn zero_crossings(values: &[f32], reference: f32) -> usize {
    values
        .windows(2)
        .filter(|w| {
            let a = w[0] - reference;
            let b = w[1] - reference;
            (a < 0.0 && b >= 0.0) || (a >= 0.0 && b < 0.0)
        })
        .count()
}

/// Centered moving average with window `2*half + 1`, shrinking at the edges
pub fn moving_average(values: &[f32], half: usize) -> Vec<f32> {
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            mean(&values[lo..hi])
        })
        .collect()
}

/// `values` minus their centered moving average
///
/// Removes the slow level so spans measure the pulsatile part only. A
/// window no longer than `2*half + 1` just loses its mean.
pub fn detrend(values: &[f32], half: usize) -> Vec<f32> {
    values
        .iter()
        .zip(moving_average(values, half))
        .map(|(v, m)| v - m)
        .collect()
}

/// Mean absolute second difference, a cheap high-frequency noise estimate
pub fn mean_abs_second_difference(values: &[f32]) -> f32 {
    if values.len() < 3 {
        return 0.0;
    }
    let total: f32 = values
        .windows(3)
        .map(|w| fabsf(w[2] - 2.0 * w[1] + w[0]))
        .sum();
    total / (values.len() - 2) as f32
}

/// `true` if every value is finite
pub fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

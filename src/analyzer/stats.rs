//! Small numeric reductions shared by the projections.

/// Arithmetic mean. Returns None if the slice is empty, so that "no rows"
/// can never be mistaken for a real zero.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Plain sum. 0.0 for an empty slice.
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Running total: element `i` is the sum of `values[..=i]`.
pub fn running_total(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

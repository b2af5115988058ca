//! Window primitives shared by every indicator.
//!
//! All functions keep the input length and index. A window produces a value
//! only when every element in it is defined.

use super::Series;
use statrs::statistics::{Data, Distribution};

/// Non-finite results (x/0, inf - inf) become undefined
pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() { Some(value) } else { None }
}

/// Lift a dense slice into a series
pub fn defined(values: &[f64]) -> Series {
    values.iter().map(|v| finite(*v)).collect()
}

/// Collect the window ending at `end` if it is full and fully defined
fn window(values: &[Option<f64>], end: usize, size: usize) -> Option<Vec<f64>> {
    if size == 0 || end + 1 < size {
        return None;
    }
    values[end + 1 - size..=end].iter().copied().collect()
}

fn rolling_apply<F>(values: &[Option<f64>], size: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    (0..values.len())
        .map(|i| window(values, i, size).and_then(|w| f(&w)))
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], size: usize) -> Series {
    rolling_apply(values, size, |w| finite(w.iter().sum::<f64>() / w.len() as f64))
}

pub fn rolling_sum(values: &[Option<f64>], size: usize) -> Series {
    rolling_apply(values, size, |w| finite(w.iter().sum::<f64>()))
}

/// Sample standard deviation (n - 1 denominator)
pub fn rolling_std(values: &[Option<f64>], size: usize) -> Series {
    rolling_apply(values, size, |w| {
        if w.len() < 2 {
            return None;
        }
        Data::new(w.to_vec()).std_dev().and_then(finite)
    })
}

pub fn rolling_min(values: &[Option<f64>], size: usize) -> Series {
    rolling_apply(values, size, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_max(values: &[Option<f64>], size: usize) -> Series {
    rolling_apply(values, size, |w| w.iter().copied().reduce(f64::max))
}

/// Value `n` bars earlier; the first `n` entries are undefined
pub fn shift_forward(values: &[Option<f64>], n: usize) -> Series {
    (0..values.len())
        .map(|i| if i >= n { values[i - n] } else { None })
        .collect()
}

/// Change versus the previous bar
pub fn diff(values: &[Option<f64>]) -> Series {
    (0..values.len())
        .map(|i| {
            if i == 0 {
                return None;
            }
            match (values[i], values[i - 1]) {
                (Some(cur), Some(prev)) => finite(cur - prev),
                _ => None,
            }
        })
        .collect()
}

/// Fractional change versus `periods` bars earlier
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Series {
    (0..values.len())
        .map(|i| {
            if periods == 0 || i < periods {
                return None;
            }
            match (values[i], values[i - periods]) {
                (Some(cur), Some(prev)) => finite(cur / prev - 1.0),
                _ => None,
            }
        })
        .collect()
}

/// Element-wise combination; undefined on either side propagates
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Series
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => finite(f(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Quantile with linear interpolation between closest ranks
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Last defined value of a series
pub fn last_defined(values: &[Option<f64>]) -> Option<f64> {
    values.last().copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_mean_requires_full_window() {
        let values = defined(&[1.0, 2.0, 3.0, 4.0]);
        let mean = rolling_mean(&values, 3);
        assert_eq!(mean, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_rolling_mean_skips_windows_with_gaps() {
        let values = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let mean = rolling_mean(&values, 2);
        assert_eq!(mean, vec![None, None, None, Some(3.5), Some(4.5)]);
    }

    #[test]
    fn test_rolling_std_is_sample_deviation() {
        let values = defined(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let std = rolling_std(&values, 8);
        // Sample variance = 32 / 7
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((std[7].unwrap() - expected).abs() < 1e-12);
        assert!(std[6].is_none());
    }

    #[test]
    fn test_min_max_and_shift() {
        let values = defined(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(rolling_min(&values, 3)[4], Some(1.0));
        assert_eq!(rolling_max(&values, 3)[4], Some(5.0));
        assert_eq!(
            shift_forward(&values, 2),
            vec![None, None, Some(3.0), Some(1.0), Some(4.0)]
        );
    }

    #[test]
    fn test_pct_change_division_by_zero_is_undefined() {
        let values = defined(&[0.0, 10.0, 12.0]);
        let change = pct_change(&values, 1);
        assert_eq!(change[0], None);
        assert_eq!(change[1], None);
        assert!((change[2].unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((quantile(&values, 0.2).unwrap() - 1.8).abs() < 1e-12);
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }
}

// Trailing moving averages over numeric series

/// Trailing moving average with a left-clamped window: at index `i` the mean
/// of `values[i + 1 - window ..= i]`, shrinking near the start. A window of
/// 0 or 1 returns the input unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Gap-aware variant: a gap stays a gap, and a present value averages only
/// the present values inside its trailing window.
pub fn moving_average_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return values.to_vec();
    }

    (0..values.len())
        .map(|i| {
            values[i]?;
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            Some(sum / count as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_for_small_windows() {
        let xs = vec![1.0, 5.0, -2.0];
        assert_eq!(moving_average(&xs, 0), xs);
        assert_eq!(moving_average(&xs, 1), xs);
    }

    #[test]
    fn test_three_point_window() {
        assert_eq!(
            moving_average(&[20.0, 22.0, 24.0], 3),
            vec![20.0, 21.0, 22.0]
        );
    }

    #[test]
    fn test_window_slides() {
        assert_eq!(
            moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 2),
            vec![1.0, 1.5, 2.5, 3.5, 4.5]
        );
    }

    #[test]
    fn test_window_larger_than_input() {
        assert_eq!(moving_average(&[2.0, 4.0], 10), vec![2.0, 3.0]);
        assert!(moving_average(&[], 5).is_empty());
    }

    #[test]
    fn test_sparse_keeps_gaps() {
        let xs = [Some(10.0), None, Some(14.0), Some(16.0)];
        assert_eq!(
            moving_average_sparse(&xs, 3),
            vec![Some(10.0), None, Some(12.0), Some(15.0)]
        );
    }
}

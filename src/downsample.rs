//! Deterministic stride downsampling for chart rendering.
//!
//! Keeps every `ceil(len / target)`-th point starting at index 0 and always
//! keeps the final point, so a rendered line reaches the end of the workout.
//! Output depends only on `(len, target)`.

/// Default number of points in a rendered graph.
pub const DEFAULT_TARGET_POINTS: usize = 120;

/// Indices kept when reducing a series of `len` points to at most `target`.
///
/// `None` disables reduction. A target below 2 is treated as 2 so that both
/// endpoints survive.
pub fn reduce_indices(len: usize, target: Option<usize>) -> Vec<usize> {
    let target = match target {
        Some(t) if len > t => t.max(2),
        _ => return (0..len).collect(),
    };
    if len <= target {
        return (0..len).collect();
    }

    let stride = len.div_ceil(target);
    let mut indices: Vec<usize> = (0..len).step_by(stride).collect();

    let last = len - 1;
    if indices.last() != Some(&last) {
        // Swap the final stride point for the last point rather than overflow the target
        if indices.len() >= target {
            indices.pop();
        }
        indices.push(last);
    }
    indices
}

/// Reduce a series to at most `target` points.
///
/// # Example
/// ```
/// use workout_metrics::reduce;
///
/// let series: Vec<u32> = (0..10).collect();
/// assert_eq!(reduce(&series, Some(4)), vec![0, 3, 6, 9]);
/// assert_eq!(reduce(&series, None).len(), 10);
/// ```
pub fn reduce<T: Clone>(points: &[T], target: Option<usize>) -> Vec<T> {
    reduce_indices(points.len(), target)
        .into_iter()
        .map(|i| points[i].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_small_or_disabled() {
        let series: Vec<u32> = (0..50).collect();
        assert_eq!(reduce(&series, Some(120)), series);
        assert_eq!(reduce(&series, Some(50)), series);
        assert_eq!(reduce(&series, None), series);

        let empty: Vec<u32> = vec![];
        assert!(reduce(&empty, Some(10)).is_empty());
    }

    #[test]
    fn test_stride_includes_last_point() {
        let series: Vec<u32> = (0..11).collect();
        // stride ceil(11/4) = 3 -> 0, 3, 6, 9 then last (10) replaces 9
        let reduced = reduce(&series, Some(4));
        assert_eq!(reduced, vec![0, 3, 6, 10]);
    }

    #[test]
    fn test_forced_last_point_appended_when_room() {
        let series: Vec<u32> = (0..10).collect();
        // stride ceil(10/3) = 4 -> 0, 4, 8 plus last 9 would be 4 points, so 8 is swapped
        assert_eq!(reduce(&series, Some(3)), vec![0, 4, 9]);

        let series: Vec<u32> = (0..9).collect();
        // stride ceil(9/4) = 3 -> 0, 3, 6 plus last 8
        assert_eq!(reduce(&series, Some(4)), vec![0, 3, 6, 8]);
    }

    #[test]
    fn test_bound_and_endpoints() {
        for len in 2..400usize {
            let series: Vec<usize> = (0..len).collect();
            for target in 2..40usize {
                let reduced = reduce(&series, Some(target));
                assert!(reduced.len() <= target);
                assert!(reduced.len() >= 2.min(len));
                assert_eq!(reduced[0], 0);
                assert_eq!(*reduced.last().unwrap(), len - 1);
                assert!(reduced.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn test_tiny_targets_keep_endpoints() {
        let series: Vec<u32> = (0..100).collect();
        assert_eq!(reduce(&series, Some(0)), vec![0, 99]);
        assert_eq!(reduce(&series, Some(1)), vec![0, 99]);

        let pair = vec![1u32, 2];
        assert_eq!(reduce(&pair, Some(1)), pair);
    }

    #[test]
    fn test_deterministic() {
        let series: Vec<u32> = (0..5000).collect();
        assert_eq!(reduce_indices(series.len(), Some(120)), reduce_indices(5000, Some(120)));
        assert!(reduce(&series, Some(120)).len() <= 120);
    }
}

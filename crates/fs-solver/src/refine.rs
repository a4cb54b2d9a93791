//! Adaptive grid refinement for 1-D profiles.

/// Refinement tolerances.
///
/// - `ratio`: maximum size ratio of adjacent intervals
/// - `slope`: maximum change of the profile across one interval, relative to
///   its range
/// - `curve`: maximum change of the slope between adjacent intervals,
///   relative to the range of slopes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineCriteria {
    pub ratio: f64,
    pub slope: f64,
    pub curve: f64,
    /// Intervals narrower than this are never split [m].
    pub min_spacing: f64,
}

impl RefineCriteria {
    pub fn new(ratio: f64, slope: f64, curve: f64) -> Self {
        Self {
            ratio,
            slope,
            curve,
            min_spacing: 1e-8,
        }
    }
}

impl Default for RefineCriteria {
    fn default() -> Self {
        Self::new(10.0, 0.8, 0.8)
    }
}

/// Intervals `[z_j, z_{j+1}]` that violate a criterion.
pub fn intervals_to_split(z: &[f64], values: &[f64], criteria: &RefineCriteria) -> Vec<usize> {
    let n = z.len();
    if n < 2 {
        return Vec::new();
    }
    let mut split = vec![false; n - 1];

    let (vmin, vmax) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let range = vmax - vmin;
    for j in 0..n - 1 {
        if (values[j + 1] - values[j]).abs() > criteria.slope * range {
            split[j] = true;
        }
    }

    let slopes: Vec<f64> = (0..n - 1)
        .map(|j| (values[j + 1] - values[j]) / (z[j + 1] - z[j]))
        .collect();
    let (smin, smax) = slopes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(*s), hi.max(*s))
        });
    let slope_range = smax - smin;
    // round-off between equal slopes is not curvature
    if slope_range > 1e-9 * smax.abs().max(smin.abs()) {
        for j in 0..slopes.len() - 1 {
            if (slopes[j + 1] - slopes[j]).abs() > criteria.curve * slope_range {
                split[j] = true;
                split[j + 1] = true;
            }
        }
    }

    for j in 1..n - 1 {
        let dz_left = z[j] - z[j - 1];
        let dz_right = z[j + 1] - z[j];
        if dz_right > criteria.ratio * dz_left {
            split[j] = true;
        }
        if dz_left > criteria.ratio * dz_right {
            split[j - 1] = true;
        }
    }

    split
        .iter()
        .enumerate()
        .filter(|&(j, s)| *s && z[j + 1] - z[j] > criteria.min_spacing)
        .map(|(j, _)| j)
        .collect()
}

/// Insert midpoints into flagged intervals, interpolating the profile
/// linearly. Returns `None` when the grid already satisfies the criteria.
pub fn refine(
    z: &[f64],
    values: &[f64],
    criteria: &RefineCriteria,
) -> Option<(Vec<f64>, Vec<f64>)> {
    let split = intervals_to_split(z, values, criteria);
    if split.is_empty() {
        return None;
    }

    let mut new_z = Vec::with_capacity(z.len() + split.len());
    let mut new_values = Vec::with_capacity(z.len() + split.len());
    let mut next = split.iter().peekable();
    for j in 0..z.len() {
        new_z.push(z[j]);
        new_values.push(values[j]);
        if next.peek() == Some(&&j) {
            next.next();
            new_z.push(0.5 * (z[j] + z[j + 1]));
            new_values.push(0.5 * (values[j] + values[j + 1]));
        }
    }
    Some((new_z, new_values))
}

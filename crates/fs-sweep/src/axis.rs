//! Sweep axes.
//!
//! Fixed axes (`Linear`, `List`) know all of their values up front. A
//! `Geometric` axis is dynamic: it keeps multiplying by `ratio` until the
//! driver's stop predicate fires, the next value drops below `min_value`,
//! or `max_points` values have been produced.

use std::fmt;

use fs_core::round_to;
use serde::{Deserialize, Serialize};

use crate::{SweepError, SweepResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepAxis {
    /// `count` evenly spaced values from `min` to `max` inclusive.
    Linear {
        min: f64,
        max: f64,
        count: usize,
        /// Round every value to this many decimals.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round_decimals: Option<u32>,
    },
    List {
        values: Vec<f64>,
    },
    /// `start, start*ratio, start*ratio^2, ...` with `0 < ratio < 1`.
    Geometric {
        start: f64,
        ratio: f64,
        min_value: f64,
        max_points: usize,
    },
}

impl SweepAxis {
    pub fn linear(min: f64, max: f64, count: usize) -> Self {
        SweepAxis::Linear {
            min,
            max,
            count,
            round_decimals: None,
        }
    }

    pub fn list(values: Vec<f64>) -> Self {
        SweepAxis::List { values }
    }

    pub fn geometric(start: f64, ratio: f64, min_value: f64, max_points: usize) -> Self {
        SweepAxis::Geometric {
            start,
            ratio,
            min_value,
            max_points,
        }
    }

    /// Whether the driver may stop early on a predicate or a failed point.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, SweepAxis::Geometric { .. })
    }

    pub fn validate(&self) -> SweepResult<()> {
        match self {
            SweepAxis::Linear {
                min, max, count, ..
            } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(SweepError::axis("linear bounds must be finite"));
                }
                if *count == 0 {
                    return Err(SweepError::axis("linear axis needs at least one point"));
                }
                if max < min {
                    return Err(SweepError::axis(format!(
                        "linear axis max {max} is below min {min}"
                    )));
                }
                if *count > 1 && max == min {
                    return Err(SweepError::axis(
                        "linear axis with several points needs distinct bounds",
                    ));
                }
            }
            SweepAxis::List { values } => {
                if values.is_empty() {
                    return Err(SweepError::axis("value list is empty"));
                }
                if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                    return Err(SweepError::axis(format!("value {v} is not finite")));
                }
            }
            SweepAxis::Geometric {
                start,
                ratio,
                min_value,
                max_points,
            } => {
                if !(start.is_finite() && *start > 0.0) {
                    return Err(SweepError::axis("geometric start must be positive"));
                }
                if !(*ratio > 0.0 && *ratio < 1.0) {
                    return Err(SweepError::axis(format!(
                        "geometric ratio {ratio} must lie in (0, 1)"
                    )));
                }
                if !(min_value.is_finite() && *min_value > 0.0) {
                    return Err(SweepError::axis("geometric min_value must be positive"));
                }
                if *max_points == 0 {
                    return Err(SweepError::axis("geometric axis needs at least one point"));
                }
            }
        }
        Ok(())
    }

    /// All values the axis can produce, in traversal order.
    ///
    /// For a geometric axis this is the longest possible run; the driver
    /// may stop before reaching its end.
    pub fn values(&self) -> SweepResult<Vec<f64>> {
        self.validate()?;
        let values = match self {
            SweepAxis::Linear {
                min,
                max,
                count,
                round_decimals,
            } => {
                let mut out: Vec<f64> = if *count == 1 {
                    vec![*min]
                } else {
                    let delta = (max - min) / (*count - 1) as f64;
                    let mut v: Vec<f64> = (0..*count).map(|i| min + i as f64 * delta).collect();
                    v[*count - 1] = *max;
                    v
                };
                if let Some(decimals) = round_decimals {
                    out.iter_mut().for_each(|v| *v = round_to(*v, *decimals));
                }
                out
            }
            SweepAxis::List { values } => values.clone(),
            SweepAxis::Geometric {
                start,
                ratio,
                min_value,
                max_points,
            } => {
                let mut out = Vec::new();
                let mut v = *start;
                while out.len() < *max_points && v >= *min_value {
                    out.push(v);
                    v *= ratio;
                }
                out
            }
        };
        Ok(values)
    }
}

impl fmt::Display for SweepAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepAxis::Linear {
                min, max, count, ..
            } => write!(f, "linear {min} to {max} ({count} points)"),
            SweepAxis::List { values } => write!(f, "list of {} values", values.len()),
            SweepAxis::Geometric {
                start,
                ratio,
                min_value,
                max_points,
            } => write!(
                f,
                "geometric from {start} x{ratio} down to {min_value} (at most {max_points} points)"
            ),
        }
    }
}

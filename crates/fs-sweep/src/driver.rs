//! Sequential sweep execution.
//!
//! Each axis value is solved to completion before the next one starts;
//! rows land in the table in traversal order.

use fs_results::{Record, ResultTable};
use fs_solver::{SolveResult, SolverResult};
use tracing::{info, warn};

use crate::{SweepAxis, SweepError, SweepResult};

/// Column layout of the table a sweep produces: the axis column followed by
/// the solver's output fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepLayout {
    pub axis_name: String,
    pub fields: Vec<String>,
}

impl SweepLayout {
    pub fn new(axis_name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            axis_name: axis_name.into(),
            fields,
        }
    }

    pub fn columns(&self) -> Vec<String> {
        std::iter::once(self.axis_name.clone())
            .chain(self.fields.iter().cloned())
            .collect()
    }
}

/// Progress notifications emitted by [`run_sweep`].
#[derive(Debug, Clone, PartialEq)]
pub enum SweepEvent {
    PointStarted {
        index: usize,
        value: f64,
        /// Known for fixed axes; an upper bound for dynamic ones.
        total: usize,
    },
    PointFinished {
        index: usize,
        value: f64,
        converged: bool,
    },
    Finished {
        points: usize,
        failed: usize,
    },
}

/// Run `solve_point` for every value of `axis`.
///
/// Point-local solver failures become NaN rows flagged as not converged.
/// On a fixed axis the sweep then continues; on a dynamic axis it stops.
/// A dynamic axis also stops after any point for which `stop` holds. Other
/// errors abort the sweep and are returned.
pub fn run_sweep<S, O>(
    axis: &SweepAxis,
    layout: &SweepLayout,
    mut solve_point: S,
    mut stop: Option<&mut dyn FnMut(&SolveResult) -> bool>,
    mut observer: O,
) -> SweepResult<ResultTable>
where
    S: FnMut(f64) -> SolverResult<SolveResult>,
    O: FnMut(SweepEvent),
{
    let values = axis.values()?;
    let dynamic = axis.is_dynamic();
    let columns = layout.columns();
    let mut table = ResultTable::with_columns(columns.clone());
    let mut failed = 0;

    for (index, &value) in values.iter().enumerate() {
        observer(SweepEvent::PointStarted {
            index,
            value,
            total: values.len(),
        });

        let outcome = match solve_point(value) {
            Ok(result) => Ok(result),
            Err(err) if err.is_point_local() => Err(err),
            Err(err) => return Err(SweepError::Solver(err)),
        };

        match outcome {
            Ok(result) => {
                let mut fields = vec![(layout.axis_name.clone(), value)];
                fields.extend(result.fields());
                info!(
                    axis = %layout.axis_name,
                    value,
                    outputs = %summarize(&result),
                    "sweep point solved"
                );
                table.append(Record {
                    label: None,
                    fields,
                    converged: result.converged,
                })?;
                observer(SweepEvent::PointFinished {
                    index,
                    value,
                    converged: result.converged,
                });
                if dynamic && stop.as_mut().is_some_and(|predicate| predicate(&result)) {
                    info!(axis = %layout.axis_name, value, "stop condition reached");
                    break;
                }
            }
            Err(err) => {
                failed += 1;
                warn!(axis = %layout.axis_name, value, error = %err, "sweep point failed");
                table.append(Record::failed(
                    &columns,
                    &[(layout.axis_name.clone(), value)],
                ))?;
                observer(SweepEvent::PointFinished {
                    index,
                    value,
                    converged: false,
                });
                if dynamic {
                    break;
                }
            }
        }
    }

    observer(SweepEvent::Finished {
        points: table.len(),
        failed,
    });
    Ok(table)
}

fn summarize(result: &SolveResult) -> String {
    result
        .scalars
        .iter()
        .map(|(name, v)| format!("{name}={v:.6e}"))
        .collect::<Vec<_>>()
        .join(" ")
}

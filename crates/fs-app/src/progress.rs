//! Progress events streamed to frontends while a study runs.

use std::time::Instant;

use fs_sweep::SweepEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingStudy,
    LoadingMechanism,
    Solving,
    WritingResults,
    Plotting,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadingStudy => "Loading study",
            Self::LoadingMechanism => "Loading mechanism",
            Self::Solving => "Solving",
            Self::WritingResults => "Writing results",
            Self::Plotting => "Plotting",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointProgress {
    /// Zero-based index of the point.
    pub index: usize,
    /// Points on the axis (an upper bound for dynamic axes).
    pub total: usize,
    pub value: f64,
    /// `None` while the point is being solved.
    pub converged: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProgressEvent {
    pub study_kind: &'static str,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub point: Option<PointProgress>,
}

impl RunProgressEvent {
    pub fn stage(
        study_kind: &'static str,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            study_kind,
            stage,
            elapsed_wall_s,
            message,
            point: None,
        }
    }

    /// Map a sweep driver event onto a `Solving` progress event.
    pub fn from_sweep(
        study_kind: &'static str,
        elapsed_wall_s: f64,
        event: &SweepEvent,
        total_hint: &mut usize,
    ) -> Self {
        let (point, message) = match *event {
            SweepEvent::PointStarted {
                index,
                value,
                total,
            } => {
                *total_hint = total;
                (
                    Some(PointProgress {
                        index,
                        total,
                        value,
                        converged: None,
                    }),
                    None,
                )
            }
            SweepEvent::PointFinished {
                index,
                value,
                converged,
            } => (
                Some(PointProgress {
                    index,
                    total: *total_hint,
                    value,
                    converged: Some(converged),
                }),
                None,
            ),
            SweepEvent::Finished { points, failed } => (
                None,
                Some(format!("{points} points, {failed} failed")),
            ),
        };
        Self {
            study_kind,
            stage: RunStage::Solving,
            elapsed_wall_s,
            message,
            point,
        }
    }
}

/// Forwards progress to an optional frontend callback.
pub(crate) struct Reporter<'a> {
    callback: Option<&'a mut dyn FnMut(RunProgressEvent)>,
    started: Instant,
    kind: &'static str,
    total_hint: usize,
}

impl<'a> Reporter<'a> {
    pub fn new(callback: Option<&'a mut dyn FnMut(RunProgressEvent)>) -> Self {
        Self {
            callback,
            started: Instant::now(),
            kind: "study",
            total_hint: 0,
        }
    }

    pub fn set_kind(&mut self, kind: &'static str) {
        self.kind = kind;
    }

    pub fn elapsed_s(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn stage(&mut self, stage: RunStage, message: impl Into<String>) {
        let elapsed = self.elapsed_s();
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(RunProgressEvent::stage(
                self.kind,
                stage,
                elapsed,
                Some(message.into()),
            ));
        }
    }

    pub fn sweep(&mut self, event: &SweepEvent) {
        let elapsed = self.elapsed_s();
        let event = RunProgressEvent::from_sweep(self.kind, elapsed, event, &mut self.total_hint);
        if let Some(cb) = self.callback.as_deref_mut() {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_events_carry_the_axis_total() {
        let mut total = 0;
        let started = RunProgressEvent::from_sweep(
            "adiabatic_flame_temperature",
            0.1,
            &SweepEvent::PointStarted {
                index: 0,
                value: 0.5,
                total: 3,
            },
            &mut total,
        );
        assert_eq!(started.point.map(|p| p.converged), Some(None));

        let finished = RunProgressEvent::from_sweep(
            "adiabatic_flame_temperature",
            0.2,
            &SweepEvent::PointFinished {
                index: 0,
                value: 0.5,
                converged: false,
            },
            &mut total,
        );
        let point = finished.point.unwrap();
        assert_eq!(point.total, 3);
        assert_eq!(point.converged, Some(false));
    }
}

//! Study execution: load, solve, write tables, render figures.

use std::path::{Path, PathBuf};

use fs_project::{ImageFormat, PlotDef, StudyDef, StudyFile};
use fs_results::{PlotOptions, ResultsError, plot_barh, plot_xy, write_csv};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{Reporter, RunProgressEvent, RunStage};
use crate::runners::{
    self, Figure, RunnerOutput, flame_speed::FlameSpeedStudy, free_flame::FreeFlameStudy,
    stirred_reactor::ReactorStudy,
};
use crate::study_service;

/// Request to execute a study.
#[derive(Debug, Clone)]
pub struct RunRequest<'a> {
    pub study_path: &'a Path,
    /// Replaces `output.directory` from the study file.
    pub output_dir: Option<&'a Path>,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub study_name: String,
    pub kind: &'static str,
    pub output_dir: PathBuf,
    pub csv_path: PathBuf,
    /// Every file written, tables first.
    pub files: Vec<PathBuf>,
    pub rows: usize,
    pub failed_points: usize,
    pub summary: Vec<(String, f64)>,
    pub elapsed_s: f64,
}

/// Execute a study without progress reporting.
pub fn run_study(request: &RunRequest<'_>) -> AppResult<RunResponse> {
    run_study_with_progress(request, None)
}

/// Execute a study and stream progress events.
pub fn run_study_with_progress(
    request: &RunRequest<'_>,
    progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let mut reporter = Reporter::new(progress_cb);
    reporter.stage(
        RunStage::LoadingStudy,
        format!("loading {}", request.study_path.display()),
    );
    let study = study_service::load_study(request.study_path)?;
    reporter.set_kind(study.study.kind());

    let base_dir = study_service::study_dir(request.study_path);
    reporter.stage(RunStage::LoadingMechanism, format!("mechanism {}", study.mechanism));
    let mechanism = study_service::load_mechanism(&study, &base_dir)?;
    fs_project::validate_species(&study, &mechanism)?;

    let output_dir = resolve_output_dir(&study, &base_dir, request.output_dir);
    std::fs::create_dir_all(&output_dir).map_err(|source| AppError::OutputDir {
        path: output_dir.clone(),
        source,
    })?;

    info!(study = %study.name, kind = study.study.kind(), "running study");
    reporter.stage(RunStage::Solving, format!("solving {}", study.study.kind()));
    let output = solve(&study, &mechanism, &mut reporter)?;

    reporter.stage(RunStage::WritingResults, "writing tables");
    let csv_name = study
        .output
        .csv
        .clone()
        .unwrap_or_else(|| study.study.default_csv().to_string());
    let csv_path = output_dir.join(csv_name);
    write_csv(&output.table, &csv_path)?;
    let mut files = vec![csv_path.clone()];
    for (name, table) in &output.extra_tables {
        let path = output_dir.join(name);
        write_csv(table, &path)?;
        files.push(path);
    }

    reporter.stage(RunStage::Plotting, "rendering figures");
    let format = study.output.image_format;
    if study.output.figures {
        for figure in &output.figures {
            if let Some(path) = render_figure(figure, &output_dir, format)? {
                files.push(path);
            }
        }
    }
    for plot in &study.output.plots {
        if let Some(path) = render_requested(plot, &output, &output_dir)? {
            files.push(path);
        }
    }

    let failed_points = output
        .table
        .converged_flags()
        .iter()
        .filter(|c| !**c)
        .count();
    let elapsed_s = reporter.elapsed_s();
    reporter.stage(
        RunStage::Completed,
        format!("{} rows, {failed_points} failed", output.table.len()),
    );
    info!(
        rows = output.table.len(),
        failed_points,
        files = files.len(),
        elapsed_s,
        "study finished"
    );

    Ok(RunResponse {
        study_name: study.name.clone(),
        kind: study.study.kind(),
        output_dir,
        csv_path,
        files,
        rows: output.table.len(),
        failed_points,
        summary: output.summary,
        elapsed_s,
    })
}

fn resolve_output_dir(study: &StudyFile, base_dir: &Path, overridden: Option<&Path>) -> PathBuf {
    match overridden {
        Some(dir) => dir.to_path_buf(),
        None if study.output.directory.is_absolute() => study.output.directory.clone(),
        None => base_dir.join(&study.output.directory),
    }
}

fn solve(
    study: &StudyFile,
    mechanism: &fs_chem::Mechanism,
    reporter: &mut Reporter<'_>,
) -> AppResult<RunnerOutput> {
    match &study.study {
        StudyDef::AdiabaticFlameTemperature { phi, max_steps } => {
            runners::adiabatic::run(study, mechanism, phi, *max_steps, reporter)
        }
        StudyDef::FreeFlame {
            phi,
            width_m,
            refine,
            transport,
            max_grid_points,
            max_refine_passes,
            plot_species,
        } => runners::free_flame::run(
            study,
            mechanism,
            &FreeFlameStudy {
                phi: *phi,
                width_m: *width_m,
                refine,
                transport,
                max_grid_points: *max_grid_points,
                max_refine_passes: *max_refine_passes,
                plot_species,
            },
            reporter,
        ),
        StudyDef::StirredReactor {
            phi,
            volume_m3,
            residence_time,
            extinction_margin_k,
            plot_species,
            t_window,
        } => runners::stirred_reactor::run(
            study,
            mechanism,
            &ReactorStudy {
                phi: *phi,
                volume_m3: *volume_m3,
                residence_time,
                extinction_margin_k: *extinction_margin_k,
                plot_species,
                t_window: *t_window,
            },
            reporter,
        ),
        StudyDef::FlameSpeedSweep {
            phi,
            width_m,
            refine,
            transport,
            max_grid_points,
            max_refine_passes,
            sensitivity,
        } => runners::flame_speed::run(
            study,
            mechanism,
            &FlameSpeedStudy {
                phi,
                width_m: *width_m,
                refine,
                transport,
                max_grid_points: *max_grid_points,
                max_refine_passes: *max_refine_passes,
                sensitivity,
            },
            reporter,
        ),
    }
}

/// Render one figure. A figure with nothing finite to draw is skipped with
/// a warning so that failed sweeps still leave their tables behind.
fn render_figure(figure: &Figure, dir: &Path, format: ImageFormat) -> AppResult<Option<PathBuf>> {
    let (stem, outcome) = match figure {
        Figure::Lines {
            table,
            x,
            ys,
            stem,
            options,
        } => {
            let path = dir.join(format!("{stem}.{}", format.extension()));
            let ys: Vec<&str> = ys.iter().map(String::as_str).collect();
            (path.clone(), plot_xy(table, x, &ys, &path, options).map(|()| path))
        }
        Figure::Bars {
            table,
            label_column,
            value_columns,
            top_k,
            stem,
            options,
        } => {
            let path = dir.join(format!("{stem}.{}", format.extension()));
            let columns: Vec<&str> = value_columns.iter().map(String::as_str).collect();
            (
                path.clone(),
                plot_barh(table, label_column, &columns, *top_k, &path, options).map(|()| path),
            )
        }
    };
    skip_empty(&stem, outcome)
}

fn render_requested(
    plot: &PlotDef,
    output: &RunnerOutput,
    dir: &Path,
) -> AppResult<Option<PathBuf>> {
    let table = &output.table;
    let x = match &plot.x {
        Some(x) => x.clone(),
        None => table
            .columns()
            .first()
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("result table has no columns".to_string()))?,
    };
    let mut options = PlotOptions::titled(plot.title.clone().unwrap_or_default())
        .with_axes(x.clone(), plot.y.join(", "))
        .with_x_range(plot.x_range);
    if let Some((width, height)) = plot.size {
        options = options.with_size(width, height);
    }
    let path = dir.join(&plot.file);
    let ys: Vec<&str> = plot.y.iter().map(String::as_str).collect();
    let outcome = plot_xy(table, &x, &ys, &path, &options).map(|()| path.clone());
    skip_empty(&path, outcome)
}

fn skip_empty(
    path: &Path,
    outcome: Result<PathBuf, ResultsError>,
) -> AppResult<Option<PathBuf>> {
    match outcome {
        Ok(path) => Ok(Some(path)),
        Err(ResultsError::EmptyTable { what }) => {
            warn!(path = %path.display(), reason = %what, "figure skipped");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

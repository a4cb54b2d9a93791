use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use fs_app::{AppResult, RunProgressEvent, RunRequest, RunStage, run_service, study_service};
use tracing::error;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "fs-cli")]
#[command(about = "flamesweep - steady combustion parameter sweeps", long_about = None)]
struct Cli {
    /// Overrides the study's loglevel (0 = warnings, 1 = info, 2+ = debug)
    #[arg(long, global = true)]
    loglevel: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a study and write its tables and figures
    Run {
        /// Path to the study file (YAML or JSON)
        study_path: PathBuf,
        /// Write outputs here instead of the study's output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Check a study file, its mechanism and its inlet mixture
    Validate {
        /// Path to the study file (YAML or JSON)
        study_path: PathBuf,
    },
    /// List the species and reactions of a study's mechanism
    Species {
        /// Path to the study file (YAML or JSON)
        study_path: PathBuf,
    },
}

impl Commands {
    fn study_path(&self) -> &Path {
        match self {
            Commands::Run { study_path, .. }
            | Commands::Validate { study_path }
            | Commands::Species { study_path } => study_path,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A study that fails to load still needs a subscriber to report through.
    let loglevel = cli.loglevel.unwrap_or_else(|| {
        study_service::load_study(cli.command.study_path())
            .map(|study| study.loglevel)
            .unwrap_or(1)
    });
    tracing_subscriber::fmt()
        .with_max_level(level_filter(loglevel))
        .with_writer(io::stderr)
        .init();

    let outcome = match &cli.command {
        Commands::Run {
            study_path,
            output_dir,
        } => cmd_run(study_path, output_dir.as_deref(), loglevel),
        Commands::Validate { study_path } => cmd_validate(study_path),
        Commands::Species { study_path } => cmd_species(study_path),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

fn level_filter(loglevel: u8) -> LevelFilter {
    match loglevel {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

fn cmd_run(study_path: &Path, output_dir: Option<&Path>, loglevel: u8) -> AppResult<()> {
    let request = RunRequest {
        study_path,
        output_dir,
    };

    let response = if loglevel >= 1 {
        let mut last_emit = Instant::now();
        let mut last_stage = None;
        let response = run_service::run_study_with_progress(
            &request,
            Some(&mut |event| {
                let emit_now = last_stage != Some(event.stage)
                    || event.point.is_some_and(|p| p.converged.is_some())
                    || last_emit.elapsed().as_millis() >= 100;
                if emit_now {
                    render_cli_progress(&event);
                    last_stage = Some(event.stage);
                    last_emit = Instant::now();
                }
            }),
        );
        clear_progress_line();
        response?
    } else {
        run_service::run_study(&request)?
    };

    println!(
        "✓ {} ({}) finished in {:.2}s",
        response.study_name, response.kind, response.elapsed_s
    );
    println!(
        "  Points: {} ({} failed)",
        response.rows, response.failed_points
    );
    for (name, value) in &response.summary {
        println!("  {name}: {value:.6}");
    }
    println!("  Output: {}", response.output_dir.display());
    for file in &response.files {
        println!("    {}", file.display());
    }
    Ok(())
}

fn cmd_validate(study_path: &Path) -> AppResult<()> {
    println!("Validating study: {}", study_path.display());
    let summary = study_service::validate_study_file(study_path)?;
    println!("✓ Study is valid");
    println!("  Name: {}", summary.name);
    println!("  Kind: {}", summary.kind);
    println!(
        "  Mechanism: {} ({} species, {} reactions)",
        summary.mechanism, summary.n_species, summary.n_reactions
    );
    println!("  Points: {}", summary.points);
    Ok(())
}

fn cmd_species(study_path: &Path) -> AppResult<()> {
    let study = study_service::load_study(study_path)?;
    let mechanism = study_service::load_mechanism(&study, &study_service::study_dir(study_path))?;
    let summary = study_service::describe_mechanism(&mechanism);

    println!("Mechanism: {}", summary.name);
    println!("Species ({}):", summary.species.len());
    for species in &summary.species {
        println!("  {:<8} {:>9.4} g/mol", species.name, species.molar_mass);
    }
    println!("Reactions ({}):", summary.reactions.len());
    for (i, equation) in summary.reactions.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, equation);
    }
    Ok(())
}

fn clear_progress_line() {
    eprint!("\r{}\r", " ".repeat(120));
    let _ = io::stderr().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    let mut line = match (event.stage, &event.point) {
        (RunStage::Solving, Some(point)) => {
            let width = 28usize;
            let done = point.index + usize::from(point.converged.is_some());
            let filled = if point.total == 0 {
                0
            } else {
                (done * width / point.total).min(width)
            };
            format!(
                "\r[{}{}] {}/{}  value={:.4}  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width - filled),
                done,
                point.total,
                point.value,
                event.elapsed_wall_s
            )
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            )
        }
    };
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {msg}"));
    }
    eprint!("{line}");
    let _ = io::stderr().flush();
}

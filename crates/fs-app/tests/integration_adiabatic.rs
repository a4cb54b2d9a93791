//! End-to-end adiabatic flame temperature study.

use std::fs;
use std::path::{Path, PathBuf};

use fs_app::{RunProgressEvent, RunRequest, RunStage, run_study_with_progress};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fs_app_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_study(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("study.yaml");
    fs::write(&path, text).unwrap();
    path
}

const ADIABATIC: &str = r#"
version: 1
name: methane adiabatic
inlet: { temperature_k: 300.0, pressure_pa: 1013250.0 }
mixture: { fuel: "CH4", oxidizer: "O2:1.0, N2:3.76" }
output:
  directory: out
  image_format: svg
  plots:
    - file: co2.svg
      y: [X_CO2, X_CO]
      title: Products
study:
  kind: adiabatic_flame_temperature
  phi: { kind: list, values: [0.5, 1.0, 1.5] }
"#;

#[test]
fn three_point_sweep_writes_table_and_figures() {
    let dir = scratch_dir("adiabatic");
    let study_path = write_study(&dir, ADIABATIC);

    let mut events: Vec<RunProgressEvent> = Vec::new();
    let response = run_study_with_progress(
        &RunRequest {
            study_path: &study_path,
            output_dir: None,
        },
        Some(&mut |event| events.push(event)),
    )
    .expect("adiabatic study should run");

    assert_eq!(response.kind, "adiabatic_flame_temperature");
    assert_eq!(response.rows, 3);
    assert_eq!(response.failed_points, 0);
    assert_eq!(response.csv_path, dir.join("out").join("adiabatic.csv"));

    let text = fs::read_to_string(&response.csv_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("phi,T,"), "{}", lines[0]);
    assert!(lines[0].ends_with(",converged"));
    assert_eq!(lines.len(), 4);

    let table = fs_results::read_csv(&response.csv_path).unwrap();
    let t = table.column("T").unwrap();
    assert!(t[1] > t[0] && t[1] > t[2], "{t:?}");
    let peak = response
        .summary
        .iter()
        .find(|(name, _)| name == "T_max")
        .map(|(_, v)| *v)
        .unwrap();
    assert_eq!(peak, t[1]);

    assert!(dir.join("out").join("adiabatic_temp.svg").exists());
    assert!(dir.join("out").join("co2.svg").exists());
    assert_eq!(response.files.len(), 3);

    let stages: Vec<RunStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(stages.first(), Some(&RunStage::LoadingStudy));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    let finished: Vec<_> = events
        .iter()
        .filter_map(|e| e.point)
        .filter(|p| p.converged.is_some())
        .collect();
    assert_eq!(finished.len(), 3);
    assert!(finished.iter().all(|p| p.total == 3));
}

#[test]
fn default_png_figures_are_rendered() {
    let dir = scratch_dir("adiabatic_png");
    let text = ADIABATIC
        .replace("  image_format: svg\n", "")
        .replace("file: co2.svg", "file: co2.png");
    let study_path = write_study(&dir, &text);

    let response = fs_app::run_study(&RunRequest {
        study_path: &study_path,
        output_dir: None,
    })
    .expect("png figures should render");

    for name in ["adiabatic_temp.png", "co2.png"] {
        let bytes = fs::read(dir.join("out").join(name)).unwrap();
        assert_eq!(&bytes[1..4], b"PNG", "{name}");
    }
    assert_eq!(response.files.len(), 3);
}

#[test]
fn output_dir_override_and_custom_csv_name() {
    let dir = scratch_dir("adiabatic_override");
    let text = ADIABATIC.replace("directory: out", "directory: out\n  csv: afT.csv\n  figures: false");
    let study_path = write_study(&dir, &text);
    let target = dir.join("elsewhere");

    let response = fs_app::run_study(&RunRequest {
        study_path: &study_path,
        output_dir: Some(&target),
    })
    .unwrap();

    assert_eq!(response.csv_path, target.join("afT.csv"));
    assert!(!target.join("adiabatic_temp.svg").exists());
    assert!(!dir.join("out").exists());
}

#[test]
fn unknown_species_is_rejected_before_solving() {
    let dir = scratch_dir("adiabatic_species");
    let text = ADIABATIC.replace("fuel: \"CH4\"", "fuel: \"C8H18\"");
    let study_path = write_study(&dir, &text);

    let mut stages = Vec::new();
    let err = run_study_with_progress(
        &RunRequest {
            study_path: &study_path,
            output_dir: None,
        },
        Some(&mut |event: RunProgressEvent| stages.push(event.stage)),
    )
    .unwrap_err();

    assert!(matches!(err, fs_app::AppError::Validation(_)), "{err}");
    assert!(!stages.contains(&RunStage::Solving));
}

#[test]
fn validate_reports_mechanism_and_point_count() {
    let dir = scratch_dir("adiabatic_validate");
    let study_path = write_study(&dir, ADIABATIC);
    let summary = fs_app::validate_study_file(&study_path).unwrap();
    assert_eq!(summary.name, "methane adiabatic");
    assert_eq!(summary.points, 3);
    assert_eq!(summary.n_species, 9);
    assert_eq!(summary.n_reactions, 4);
}

//! Stirred reactor study run until blow-out.

use std::fs;

use fs_app::{RunRequest, run_study};

#[test]
fn residence_time_sweep_stops_at_extinction() {
    let dir = std::env::temp_dir().join(format!("fs_app_reactor_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    let study_path = dir.join("reactor.yaml");
    fs::write(
        &study_path,
        r#"
version: 1
name: lean wsr
inlet: { temperature_k: 300.0, pressure_pa: 101325.0 }
mixture: { fuel: "CH4", oxidizer: "O2:1.0, N2:3.76" }
output: { directory: ".", figures: false }
study:
  kind: stirred_reactor
  phi: 0.5
  residence_time: { start: 0.1, decay: 0.1, min_value: 1.0e-7, max_points: 10 }
"#,
    )
    .unwrap();

    let response = run_study(&RunRequest {
        study_path: &study_path,
        output_dir: None,
    })
    .unwrap();

    let table = fs_results::read_csv(&response.csv_path).unwrap();
    assert_eq!(table.columns()[0], "tres");
    let t = table.column("T").unwrap();
    assert!(t[0] > 1000.0, "T = {}", t[0]);
    let last = t[t.len() - 1];
    assert!(last <= 301.0, "last T = {last}");
    assert!(t.len() < 10, "sweep should stop once the flame blows out");
    let tres = table.column("tres").unwrap();
    assert!(tres.windows(2).all(|w| w[1] < w[0]));
}

use fs_chem::TransportModel;
use fs_project::*;
use fs_sweep::SweepAxis;

fn flame_speed_study() -> StudyFile {
    StudyFile {
        version: STUDY_VERSION,
        name: "flame-speed-10atm".to_string(),
        mechanism: "builtin".to_string(),
        loglevel: 1,
        inlet: InletDef {
            temperature_k: 300.0,
            pressure_pa: 1_013_250.0,
        },
        mixture: MixtureDef::FuelOxidizer {
            fuel: "CH4".to_string(),
            oxidizer: "O2:1.0, N2:3.76".to_string(),
        },
        output: OutputDef {
            plots: vec![PlotDef {
                file: "tmax.png".to_string(),
                x: None,
                y: vec!["T_max".to_string()],
                title: Some("Peak temperature".to_string()),
                x_range: Some((0.5, 1.5)),
                size: Some((800, 600)),
            }],
            ..OutputDef::default()
        },
        study: StudyDef::FlameSpeedSweep {
            phi: SweepAxis::Linear {
                min: 0.5,
                max: 1.5,
                count: 20,
                round_decimals: Some(2),
            },
            width_m: 0.014,
            refine: RefineDef::default(),
            transport: vec![TransportModel::MixtureAveraged],
            max_grid_points: 1000,
            max_refine_passes: 40,
            sensitivity: SensitivityDef {
                enabled: true,
                ..SensitivityDef::default()
            },
        },
    }
}

#[test]
fn roundtrip_yaml() {
    let study = flame_speed_study();
    let path = std::env::temp_dir().join("fs_project_roundtrip.yaml");
    save_study(&path, &study).unwrap();
    let loaded = load_study(&path).unwrap();
    assert_eq!(study, loaded);
}

#[test]
fn roundtrip_json() {
    let study = flame_speed_study();
    let path = std::env::temp_dir().join("fs_project_roundtrip.json");
    save_study(&path, &study).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.trim_start().starts_with('{'));
    let loaded = load_study(&path).unwrap();
    assert_eq!(study, loaded);
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
version: 1
name: adiabatic-flame-temperature
inlet: { temperature_k: 300.0, pressure_pa: 1013250.0 }
mixture:
  fuel: "CH4"
  oxidizer: "O2:1.0, N2:3.76"
study:
  kind: adiabatic_flame_temperature
  phi: { kind: linear, min: 0.3, max: 3.5, count: 500 }
"#;
    let study: StudyFile = serde_yaml::from_str(yaml).unwrap();
    validate_study(&study).unwrap();
    assert_eq!(study.mechanism, "builtin");
    assert_eq!(study.loglevel, 1);
    assert_eq!(study.output.directory, std::path::PathBuf::from("out"));
    assert!(study.output.figures);
    assert_eq!(study.output.image_format, ImageFormat::Png);
    assert_eq!(study.study.default_csv(), "adiabatic.csv");
    match study.study {
        StudyDef::AdiabaticFlameTemperature { max_steps, .. } => assert_eq!(max_steps, 1000),
        other => panic!("unexpected study {other:?}"),
    }
}

#[test]
fn reactants_mixture_and_transport_aliases() {
    let yaml = r#"
version: 1
name: free-flame
inlet: { temperature_k: 300.0, pressure_pa: 1013250.0 }
mixture:
  reactants: "CH4:1, O2:2, N2:7.52"
study:
  kind: free_flame
  width_m: 0.03
  refine: { ratio: 3, slope: 0.06, curve: 0.12 }
  transport: [Mix, Multi]
  plot_species: [CH4, CO, CO2, H2O, O2]
"#;
    let study: StudyFile = serde_yaml::from_str(yaml).unwrap();
    validate_study(&study).unwrap();
    assert!(matches!(study.mixture, MixtureDef::Reactants { .. }));
    match &study.study {
        StudyDef::FreeFlame { transport, .. } => assert_eq!(
            transport,
            &vec![TransportModel::MixtureAveraged, TransportModel::Multicomponent]
        ),
        other => panic!("unexpected study {other:?}"),
    }
}

#[test]
fn load_rejects_invalid_study() {
    let yaml = r#"
version: 1
name: reactor
inlet: { temperature_k: 300.0, pressure_pa: 101325.0 }
mixture: { fuel: "CH4:1.0", oxidizer: "O2:1.0, N2:3.76" }
study:
  kind: stirred_reactor
  phi: 0.5
  residence_time: { start: 0.1, decay: 0.0, min_value: 1.0e-6, max_points: 200 }
"#;
    let path = std::env::temp_dir().join("fs_project_invalid_reactor.yaml");
    std::fs::write(&path, yaml).unwrap();
    assert!(matches!(
        load_study(&path),
        Err(ProjectError::Validation(_))
    ));
}

#[test]
fn malformed_yaml_is_a_yaml_error() {
    let path = std::env::temp_dir().join("fs_project_malformed.yaml");
    std::fs::write(&path, "version: [").unwrap();
    assert!(matches!(load_study(&path), Err(ProjectError::Yaml(_))));
}

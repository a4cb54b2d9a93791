//! The bundled demo studies must stay loadable.

use std::path::Path;

#[test]
fn demo_studies_validate() {
    let demos = [
        ("../../demos/adiabatic_methane.yaml", 500),
        ("../../demos/free_flame_10atm.yaml", 1),
        ("../../demos/free_flame_quick.yaml", 1),
        ("../../demos/stirred_reactor_lean.yaml", 132),
        ("../../demos/flame_speed_10atm.yaml", 20),
    ];

    for (path, points) in demos {
        let summary = fs_app::validate_study_file(Path::new(path))
            .unwrap_or_else(|e| panic!("{path} should validate: {e}"));
        assert_eq!(summary.points, points, "{path}");
    }
}

#[test]
fn species_listing_names_every_reaction() {
    let study = fs_app::load_study(Path::new("../../demos/free_flame_10atm.yaml")).unwrap();
    let mechanism = fs_app::load_mechanism(&study, Path::new("../../demos")).unwrap();
    let summary = fs_app::describe_mechanism(&mechanism);
    assert_eq!(summary.species.len(), mechanism.n_species());
    assert_eq!(summary.reactions.len(), 4);
    assert!(summary.species.iter().any(|s| s.name == "CH4"));
}

//! Coarse free-flame solves. Full-resolution sweeps live in fs-app and are ignored.

use fs_chem::{Composition, Mechanism, ThermoState, TransportModel, build_state};
use fs_core::units::{k, pa};
use fs_solver::{FlameConfig, FreeFlame, RefineCriteria, SteadySolver};

fn methane_air(mech: &Mechanism, phi: f64) -> ThermoState {
    let fuel = Composition::parse("CH4").unwrap();
    let air = Composition::parse("O2:1.0, N2:3.76").unwrap();
    build_state(mech, &fuel, &air, phi, k(300.0), pa(1_013_250.0)).unwrap()
}

fn coarse_config() -> FlameConfig {
    FlameConfig {
        width: 0.014,
        refine: RefineCriteria::new(3.0, 0.1, 0.1),
        ..FlameConfig::default()
    }
}

#[test]
fn stoichiometric_flame_speed_and_profile() {
    let mech = Mechanism::builtin().unwrap();
    let mut flame = FreeFlame::new(&mech, coarse_config()).unwrap();
    let result = flame.solve_point(&methane_air(&mech, 1.0)).unwrap();

    let speed = result.scalar("flame_speed").unwrap();
    assert!((0.15..0.25).contains(&speed), "S_u = {speed}");
    let t_max = result.scalar("T_max").unwrap();
    assert!((2200.0..2400.0).contains(&t_max), "T_max = {t_max}");

    let profile = result.profile.as_ref().unwrap();
    let z = profile.column("z").unwrap();
    let t = profile.column("T").unwrap();
    let u = profile.column("u").unwrap();
    assert!(profile.len() > 6);
    assert!(z.windows(2).all(|w| w[1] > w[0]));
    assert!((t[0] - 300.0).abs() < 1e-6);
    assert!((u[0] - speed).abs() < 1e-9 * speed.max(1.0));
    assert!(u[u.len() - 1] > 5.0 * u[0]);
    assert!(profile.column("X_CH4").is_some());

    let solution = flame.last_solution().unwrap();
    assert_eq!(solution.grid.len(), profile.len());
}

#[test]
fn lean_flame_is_slower() {
    let mech = Mechanism::builtin().unwrap();
    let mut flame = FreeFlame::new(&mech, coarse_config()).unwrap();
    let stoich = flame
        .solve_point(&methane_air(&mech, 1.0))
        .unwrap()
        .scalar("flame_speed")
        .unwrap();
    let lean = flame
        .solve_point(&methane_air(&mech, 0.6))
        .unwrap()
        .scalar("flame_speed")
        .unwrap();
    assert!(lean < stoich, "lean {lean} vs stoichiometric {stoich}");
}

#[test]
fn multicomponent_continuation_changes_speed_slightly() {
    let mech = Mechanism::builtin().unwrap();
    let mut mix = FreeFlame::new(&mech, coarse_config()).unwrap();
    let base = mix
        .solve_point(&methane_air(&mech, 1.0))
        .unwrap()
        .scalar("flame_speed")
        .unwrap();

    let config = FlameConfig {
        transport: vec![TransportModel::MixtureAveraged, TransportModel::Multicomponent],
        ..coarse_config()
    };
    let mut multi = FreeFlame::new(&mech, config).unwrap();
    let continued = multi
        .solve_point(&methane_air(&mech, 1.0))
        .unwrap()
        .scalar("flame_speed")
        .unwrap();
    assert!((continued / base - 1.0).abs() < 0.1, "{base} vs {continued}");
}

#[test]
fn methane_oxidation_dominates_sensitivity() {
    let mech = Mechanism::builtin().unwrap();
    let mut flame = FreeFlame::new(&mech, coarse_config()).unwrap();
    flame.solve_point(&methane_air(&mech, 1.0)).unwrap();

    let sens = flame.reaction_sensitivities(0.05).unwrap();
    assert_eq!(sens.len(), mech.n_reactions());
    assert_eq!(sens[0].0, "CH4 + 2 O2 => CO2 + 2 H2O");
    assert!((0.4..0.6).contains(&sens[0].1), "s = {}", sens[0].1);
    // propane, hydrogen and CO oxidation cannot start in methane/air
    for (equation, s) in &sens[1..] {
        assert_eq!(*s, 0.0, "{equation}");
    }
}

#[test]
fn grid_limit_fails_the_point() {
    let mech = Mechanism::builtin().unwrap();
    let config = FlameConfig {
        max_grid_points: 8,
        ..coarse_config()
    };
    let mut flame = FreeFlame::new(&mech, config).unwrap();
    let err = flame.solve_point(&methane_air(&mech, 1.0)).unwrap_err();
    assert!(err.is_point_local(), "{err}");
}

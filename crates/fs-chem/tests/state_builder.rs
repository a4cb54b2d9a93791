use fs_chem::{
    Composition, Mechanism, TransportModel, build_state, stoichiometric_oxidizer_ratio,
};
use fs_core::units::{k, pa};
use proptest::prelude::*;

fn methane_air() -> (Mechanism, Composition, Composition) {
    (
        Mechanism::builtin().unwrap(),
        Composition::parse("CH4").unwrap(),
        Composition::parse("O2:1.0, N2:3.76").unwrap(),
    )
}

proptest! {
    #[test]
    fn fuel_to_oxidizer_ratio_scales_with_phi(phi in 0.05_f64..5.0) {
        let (mech, fuel, ox) = methane_air();
        let state = build_state(&mech, &fuel, &ox, phi, k(300.0), pa(1_013_250.0)).unwrap();
        let x_fuel = state.mole_fraction(&mech, "CH4").unwrap();
        let x_o2 = state.mole_fraction(&mech, "O2").unwrap();
        let x_n2 = state.mole_fraction(&mech, "N2").unwrap();
        // oxidizer moles = O2 + N2
        let fuel_per_ox = x_fuel / (x_o2 + x_n2);
        let stoich = 1.0 / stoichiometric_oxidizer_ratio(&mech, &fuel, &ox).unwrap();
        prop_assert!((fuel_per_ox / (phi * stoich) - 1.0).abs() < 1e-10);

        let sum: f64 = state.mole_fractions().iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mixture_conductivity_is_bounded_by_pure_values(
        t in 300.0_f64..2500.0,
        a in 0.01_f64..1.0,
        b in 0.01_f64..1.0,
        c in 0.0_f64..1.0,
    ) {
        let mech = Mechanism::builtin().unwrap();
        let mut x = vec![0.0; mech.n_species()];
        x[mech.species_index("CH4").unwrap()] = a;
        x[mech.species_index("O2").unwrap()] = b;
        x[mech.species_index("H2O").unwrap()] = c;
        let total: f64 = x.iter().sum();
        x.iter_mut().for_each(|v| *v /= total);

        let pure: Vec<f64> = mech
            .species()
            .iter()
            .zip(&x)
            .filter(|(_, xi)| **xi > 0.0)
            .map(|(s, _)| s.transport.conductivity.eval(t))
            .collect();
        let lo = pure.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = pure.iter().cloned().fold(0.0, f64::max);

        for model in [TransportModel::MixtureAveraged, TransportModel::Multicomponent] {
            let lambda = mech.thermal_conductivity(model, t, &x);
            prop_assert!(lambda >= lo * (1.0 - 1e-9), "{model}: {lambda} < {lo}");
            prop_assert!(lambda <= hi * (1.0 + 1e-9), "{model}: {lambda} > {hi}");
        }
    }
}

#[test]
fn unknown_species_is_invalid_composition() {
    let (mech, _, ox) = methane_air();
    let fuel = Composition::parse("C7H16").unwrap();
    let err = build_state(&mech, &fuel, &ox, 1.0, k(300.0), pa(101_325.0)).unwrap_err();
    assert!(err.is_invalid_composition());
    assert!(err.to_string().contains("C7H16"));
}

#[test]
fn non_positive_conditions_are_rejected() {
    let (mech, fuel, ox) = methane_air();
    assert!(build_state(&mech, &fuel, &ox, 1.0, k(-5.0), pa(101_325.0)).is_err());
    assert!(build_state(&mech, &fuel, &ox, 1.0, k(300.0), pa(0.0)).is_err());
    assert!(build_state(&mech, &fuel, &ox, 0.0, k(300.0), pa(101_325.0)).is_err());
}

#[test]
fn propane_air_stoichiometry() {
    let mech = Mechanism::builtin().unwrap();
    let fuel = Composition::parse("C3H8").unwrap();
    let air = Composition::parse("O2:0.21, N2:0.79").unwrap();
    let ratio = stoichiometric_oxidizer_ratio(&mech, &fuel, &air).unwrap();
    assert!((ratio - 5.0 / 0.21).abs() < 1e-9);
}

use fs_solver::{SolveResult, SolverError};
use fs_sweep::{SweepAxis, SweepEvent, SweepLayout, run_sweep};
use proptest::prelude::*;

fn layout() -> SweepLayout {
    SweepLayout::new("phi", vec!["T".into(), "X_CO2".into()])
}

proptest! {
    #[test]
    fn fixed_sweep_keeps_every_point_in_order(
        values in prop::collection::vec(0.05f64..5.0, 1..30),
        fail_mask in prop::collection::vec(any::<bool>(), 30),
    ) {
        let axis = SweepAxis::list(values.clone());
        let mut calls = 0usize;
        let table = run_sweep(
            &axis,
            &layout(),
            |phi| {
                let fail = fail_mask[calls];
                calls += 1;
                if fail {
                    Err(SolverError::ConvergenceFailed { what: "synthetic".into() })
                } else {
                    Ok(SolveResult::converged()
                        .with_scalar("T", 300.0 + 1000.0 * phi)
                        .with_scalar("X_CO2", 0.1))
                }
            },
            None,
            |_| {},
        )
        .unwrap();

        prop_assert_eq!(table.len(), values.len());
        prop_assert_eq!(table.column("phi").unwrap(), values.clone());
        let flags = table.converged_flags();
        for (i, t) in table.column("T").unwrap().iter().enumerate() {
            prop_assert_eq!(flags[i], !fail_mask[i]);
            prop_assert_eq!(t.is_nan(), fail_mask[i]);
        }
    }

    #[test]
    fn geometric_axis_is_strictly_decreasing_and_finite(
        start in 1e-6f64..1e3,
        ratio in 0.01f64..0.99,
        min_fraction in 1e-9f64..1.0,
        max_points in 1usize..500,
    ) {
        let axis = SweepAxis::geometric(start, ratio, start * min_fraction, max_points);
        let values = axis.values().unwrap();
        prop_assert!(!values.is_empty());
        prop_assert!(values.len() <= max_points);
        prop_assert_eq!(values[0], start);
        for pair in values.windows(2) {
            prop_assert!(pair[1] < pair[0]);
        }
        prop_assert!(values.iter().all(|v| *v >= start * min_fraction));
    }

    #[test]
    fn linear_axis_is_monotone(min in -10.0f64..10.0, span in 0.01f64..10.0, count in 2usize..60) {
        let values = SweepAxis::linear(min, min + span, count).values().unwrap();
        prop_assert_eq!(values.len(), count);
        prop_assert_eq!(values[0], min);
        prop_assert_eq!(values[count - 1], min + span);
        for pair in values.windows(2) {
            prop_assert!(pair[1] > pair[0]);
        }
    }
}

#[test]
fn observer_sees_every_point() {
    let axis = SweepAxis::linear(0.5, 1.5, 3);
    let mut events = Vec::new();
    run_sweep(
        &axis,
        &layout(),
        |phi| {
            Ok(SolveResult::converged()
                .with_scalar("T", phi)
                .with_scalar("X_CO2", 0.0))
        },
        None,
        |e| events.push(e),
    )
    .unwrap();

    let started = events
        .iter()
        .filter(|e| matches!(e, SweepEvent::PointStarted { total: 3, .. }))
        .count();
    assert_eq!(started, 3);
    assert_eq!(
        events.last(),
        Some(&SweepEvent::Finished {
            points: 3,
            failed: 0
        })
    );
}

#[test]
fn axis_reads_from_yaml() {
    let axis: SweepAxis =
        serde_yaml::from_str("kind: linear\nmin: 0.6\nmax: 1.4\ncount: 9\nround_decimals: 2\n")
            .unwrap();
    assert_eq!(axis.values().unwrap().len(), 9);

    let axis: SweepAxis = serde_yaml::from_str(
        "kind: geometric\nstart: 0.1\nratio: 0.5\nmin_value: 1.0e-6\nmax_points: 40\n",
    )
    .unwrap();
    assert!(axis.is_dynamic());

    let axis: SweepAxis = serde_yaml::from_str("kind: list\nvalues: [0.5, 1.0, 1.5]\n").unwrap();
    assert_eq!(axis, SweepAxis::list(vec![0.5, 1.0, 1.5]));
}

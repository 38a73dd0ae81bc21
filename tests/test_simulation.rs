use russell_lab::approx_eq;
use std::path::Path;
use trapsim::base::{Coefficient, Control, ExtrinsicKinetics, Material, ModelInput, ParamDirichlet, ParamExports};
use trapsim::base::{ParamMesh, ParamQuantity, ParamStepsize, ParamTemperature, ParamTrap, QuantityKind};
use trapsim::base::{ParamInitial, DEFAULT_TEST_DIR};
use trapsim::fem::Simulation;
use trapsim::StrError;

fn quantity(kind: QuantityKind, field: &str, region: usize) -> ParamQuantity {
    ParamQuantity {
        kind,
        field: field.to_string(),
        region,
        soret: false,
    }
}

fn slab(d_0: f64) -> ModelInput {
    let mut mesh = ParamMesh::uniform(8, 1.0);
    mesh.surface(1, 0.0).surface(2, 1.0);
    let mut control = Control::new();
    control.transient = false;
    control.tol_abs_residual = 1e-12;
    control.tol_rel_residual = 1e-14;
    ModelInput {
        mesh,
        materials: vec![Material::new(1, "tungsten", d_0, 0.0)],
        traps: Vec::new(),
        temperature: ParamTemperature::Constant(500.0),
        sources: Vec::new(),
        boundary_conditions: vec![
            ParamDirichlet {
                surface: 1,
                value: Coefficient::Constant(1.0),
            },
            ParamDirichlet {
                surface: 2,
                value: Coefficient::Constant(0.0),
            },
        ],
        initial_conditions: Vec::new(),
        exports: ParamExports {
            filename: None,
            quantities: vec![
                quantity(QuantityKind::SurfaceFlux, "solute", 1),
                quantity(QuantityKind::SurfaceFlux, "0", 2),
            ],
            nb_iterations_between_compute: 1,
            nb_iterations_between_exports: None,
        },
        control,
    }
}

#[test]
fn test_steady_permeation_from_json() -> Result<(), StrError> {
    let mut input = ModelInput::read_json("data/models/permeation_steady.json")?;
    input.exports.filename = Some(format!("{}/permeation_steady.csv", DEFAULT_TEST_DIR));
    let mut sim = Simulation::new(&input)?;
    sim.run()?;

    // linear profile c = 1 − x and fluxes ∓D
    let solute = sim.get_field("solute")?;
    for p in 0..5 {
        approx_eq(solute.borrow().values[p], 1.0 - 0.25 * (p as f64), 1e-12);
    }
    approx_eq(sim.exports.get("solute", Some(1), None)?, -2.0, 1e-10);
    approx_eq(sim.exports.get("solute", Some(2), None)?, 2.0, 1e-10);
    approx_eq(sim.exports.get("solute", None, Some(1))?, 0.5, 1e-12);
    assert!(Path::new(&format!("{}/permeation_steady.csv", DEFAULT_TEST_DIR)).exists());
    Ok(())
}

#[test]
fn test_steady_trapping_equilibrium() -> Result<(), StrError> {
    // k = 2, p = 0.5, n = 3 → c_t = k c_m n / (k c_m + p)
    let mut input = slab(1.0);
    input.traps.push(ParamTrap::new(2.0, 0.0, 0.5, 0.0, &["tungsten"], 3.0));
    input.exports.quantities.push(quantity(QuantityKind::MaximumVolume, "1", 1));
    let mut sim = Simulation::new(&input)?;
    assert_eq!(sim.ncomp, 2);
    sim.run()?;
    let mobile = sim.get_field("solute")?;
    let trapped = sim.get_field("1")?;
    for p in 0..9 {
        let cm = mobile.borrow().values[p];
        approx_eq(cm, 1.0 - 0.125 * (p as f64), 1e-10);
        approx_eq(trapped.borrow().values[p], 2.0 * cm * 3.0 / (2.0 * cm + 0.5), 1e-10);
    }
    // the steady flux does not depend on trapping
    approx_eq(sim.exports.get("0", Some(2), None)?, 1.0, 1e-10);
    approx_eq(sim.exports.get("1", None, Some(1))?, 6.0 / 2.5, 1e-10);
    Ok(())
}

#[test]
fn test_transient_approaches_steady_state() -> Result<(), StrError> {
    let mut input = slab(1.0);
    input.control.transient = true;
    input.control.t_fin = 5.0;
    input.control.stepsize = ParamStepsize::new_adaptive(0.01, 1.2, 1e-8);
    input.control.stepsize.max_stepsize = Some(0.5);
    input.control.stepsize.milestones = vec![1.0, 2.5];
    input.exports.nb_iterations_between_exports = Some(10);
    input.exports.filename = Some(format!("{}/transient_permeation.csv", DEFAULT_TEST_DIR));
    let mut sim = Simulation::new(&input)?;
    sim.run()?;
    approx_eq(sim.t, 5.0, 1e-12);
    let times: Vec<_> = sim.exports.data.iter().map(|row| row[0]).collect();
    assert!(times.iter().any(|t| f64::abs(t - 1.0) < 1e-12));
    assert!(times.iter().any(|t| f64::abs(t - 2.5) < 1e-12));
    for i in 1..times.len() {
        assert!(times[i] > times[i - 1]);
    }
    // outgoing flux at x = 1 approaches D
    approx_eq(sim.exports.get("solute", Some(2), None)?, 1.0, 1e-4);
    Ok(())
}

#[test]
fn test_transient_trapping_conserves_mass() -> Result<(), StrError> {
    let mut input = slab(1.0);
    input.boundary_conditions.clear();
    input.traps.push(ParamTrap::new(1.0, 0.0, 0.1, 0.0, &["tungsten"], 2.0));
    input.traps.push(ParamTrap::new(0.5, 0.0, 0.2, 0.0, &["tungsten"], 1.0).with_id(5));
    input.initial_conditions = vec![
        ParamInitial {
            field: "solute".to_string(),
            value: 2.0,
        },
        ParamInitial {
            field: "5".to_string(),
            value: 0.5,
        },
    ];
    input.exports.quantities = vec![
        quantity(QuantityKind::TotalVolume, "retention", 1),
        quantity(QuantityKind::AverageVolume, "1", 1),
        quantity(QuantityKind::MinimumVolume, "5", 1),
    ];
    input.control.transient = true;
    input.control.t_fin = 2.0;
    input.control.stepsize = ParamStepsize::new(0.1);
    let mut sim = Simulation::new(&input)?;
    assert_eq!(sim.traps.ids(), &[1, 5]);
    sim.run()?;
    assert_eq!(sim.nb_iterations, 20);
    for row in &sim.exports.data {
        approx_eq(row[1], 2.5, 1e-10);
    }
    let last = &sim.exports.data[19];
    assert!(last[2] > 0.0);
    assert!(last[3] > 0.0);
    Ok(())
}

#[test]
fn test_simulation_failures() -> Result<(), StrError> {
    // a single Newton update solves the linear problem
    let mut input = slab(1.0);
    input.control.n_max_iterations = 1;
    let mut sim = Simulation::new(&input)?;
    sim.run()?;
    approx_eq(sim.exports.get("solute", Some(1), None)?, -1.0, 1e-10);

    // constant stepsize: the failure of the nonlinear trapping problem is reported at once
    input.control.transient = true;
    input.traps.push(ParamTrap::new(1.0, 0.0, 1.0, 0.0, &["tungsten"], 1.0));
    let mut sim = Simulation::new(&input)?;
    assert_eq!(sim.run().err(), Some("Newton solver did not converge"));
    assert_eq!(sim.nb_iterations, 0);

    // adaptive stepsize: Δt is reduced until dt_min
    input.control.stepsize = ParamStepsize::new_adaptive(0.1, 2.0, 1e-3);
    let filename = format!("{}/simulation_failures.csv", DEFAULT_TEST_DIR);
    input.exports.filename = Some(filename.clone());
    let mut sim = Simulation::new(&input)?;
    assert_eq!(sim.run().err(), Some("stepsize reached minimal value"));
    let dt = sim.stepsize.as_ref().unwrap().get();
    assert!(dt < 2e-3 && dt >= 1e-3);
    assert!(Path::new(&filename).exists());

    // steady-state with extrinsic traps
    let mut input = slab(1.0);
    input.traps.push(ParamTrap::new_extrinsic(
        1.0,
        0.0,
        1.0,
        0.0,
        &["tungsten"],
        ExtrinsicKinetics::NeutronInduced {
            phi: Coefficient::Constant(1.0),
            k: 1.0,
            n_max: 1.0,
            a_0: 0.0,
            e_a: 0.0,
        },
    ));
    assert_eq!(
        Simulation::new(&input).err(),
        Some("extrinsic traps require a transient simulation")
    );

    // trap citing an unknown material
    let mut input = slab(1.0);
    input.traps.push(ParamTrap::new(1.0, 0.0, 1.0, 0.0, &["copper"], 1.0));
    assert_eq!(Simulation::new(&input).err(), Some("cannot find material cited by trap"));
    Ok(())
}

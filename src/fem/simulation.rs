use super::{shared, DerivedQuantityCollection, Form, Function, FunctionSpace, MaterialProperties, Mobile};
use super::{NonlinearSolver, Shared, SolverParams, Stepsize, SurfaceMeasure, Temperature, Trap, TrapCollection};
use super::VolumeMeasure;
use crate::base::{Control, Materials, ModelInput, ParamInitial};
use crate::StrError;
use russell_lab::{vec_copy, Vector};
use std::collections::HashMap;
use std::rc::Rc;

/// Label of the mobile concentration field
pub const LABEL_SOLUTE: &str = "solute";

/// Alternative label of the mobile concentration field
pub const LABEL_SOLUTE_ALT: &str = "0";

/// Label of the total (mobile + trapped) concentration field
pub const LABEL_RETENTION: &str = "retention";

/// Label of the temperature field
pub const LABEL_TEMPERATURE: &str = "T";

/// Implements the hydrogen transport simulation (mobile concentration coupled with trapped concentrations)
///
/// The unknowns are arranged point by point: `U[p · ncomp + c]`, where c = 0 is the mobile
/// concentration and c = 1, 2, ... are the trapped concentrations in the order of the traps.
pub struct Simulation {
    /// Holds the time-loop and solver options
    pub control: Control,

    /// Holds the function space
    pub space: Rc<FunctionSpace>,

    /// Holds the volume measure
    pub dx: VolumeMeasure,

    /// Holds the surface measure
    pub ds: SurfaceMeasure,

    /// Holds the materials
    pub materials: Materials,

    /// Holds the cell-wise material properties
    pub props: MaterialProperties,

    /// Holds the temperature
    pub temperature: Temperature,

    /// Holds the traps
    pub traps: TrapCollection,

    /// Holds the mobile concentration equation and its boundary conditions
    pub mobile: Mobile,

    /// Holds the derived quantities
    pub exports: DerivedQuantityCollection,

    /// Holds the time increment (None for steady-state simulations)
    pub stepsize: Option<Stepsize>,

    /// Number of components per point (1 + number of traps)
    pub ncomp: usize,

    /// Holds the unknowns at the current time
    pub uu: Vector,

    /// Holds the unknowns at the previous (accepted) time
    pub uu_prev: Vector,

    /// Holds the fields by label: "solute", "0", trap ids, "retention", and "T"
    pub fields: HashMap<String, Shared<Function>>,

    /// Current time
    pub t: f64,

    /// Number of accepted time steps
    pub nb_iterations: usize,

    /// Holds the residual form of the coupled problem
    form: Form,

    /// Holds the flags of the prescribed equations
    prescribed: Vec<bool>,
}

impl Simulation {
    /// Allocates a new instance
    pub fn new(input: &ModelInput) -> Result<Self, StrError> {
        let control = input.control.clone();
        if let Some(msg) = control.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate simulation because control.validate() failed");
        }

        // mesh and measures
        let space = Rc::new(FunctionSpace::new(input.mesh.generate()?)?);
        let dx = VolumeMeasure::new(&space);
        let ds = SurfaceMeasure::new(&space);

        // materials and temperature
        let materials = Materials::new(input.materials.clone())?;
        let temperature = Temperature::new(input.temperature, &space, control.t_ini)?;
        let props = MaterialProperties::new(&materials, &space)?;
        props.update(&temperature.field.borrow(), &space);

        // traps
        let mut all = Vec::with_capacity(input.traps.len());
        for param in &input.traps {
            all.push(Trap::new(param.clone())?);
        }
        let mut traps = TrapCollection::new(all);
        if !control.transient && traps.iter().any(|t| t.is_extrinsic()) {
            return Err("extrinsic traps require a transient simulation");
        }
        let stepsize = if control.transient {
            Some(Stepsize::new(control.stepsize.clone()))
        } else {
            None
        };
        traps.initialize_extrinsic_state(&space);
        traps.build_forms(Mobile::COMPONENT, &materials, &temperature.field, &dx, stepsize.as_ref())?;
        if let Some(dt) = &stepsize {
            traps.build_extrinsic_forms(&dx, dt, &temperature.field)?;
        }

        // mobile concentration
        let mut mobile = Mobile::new(input.sources.clone(), input.boundary_conditions.clone());
        mobile.create_form(&props, &traps, &dx, stepsize.as_ref())?;
        mobile.create_dirichlet(&space)?;

        // coupled form
        let mut form = Form::new();
        if let Some(f) = mobile.form.take() {
            form += f;
        }
        if let Some(f) = traps.form.take() {
            form += f;
        }

        // unknowns
        let npoint = space.npoint();
        let ncomp = 1 + traps.len();
        let prescribed = mobile.prescribed_equations(npoint, ncomp);
        let mut uu = Vector::new(npoint * ncomp);
        set_initial_conditions(&input.initial_conditions, &traps, npoint, ncomp, &mut uu)?;
        let uu_prev = uu.clone();

        // fields
        let mut fields = HashMap::new();
        let solute = shared(Function::new(LABEL_SOLUTE, npoint));
        fields.insert(LABEL_SOLUTE.to_string(), solute.clone());
        fields.insert(LABEL_SOLUTE_ALT.to_string(), solute);
        for trap in &traps {
            fields.insert(trap.label(), shared(Function::new(&trap.label(), npoint)));
        }
        fields.insert(LABEL_RETENTION.to_string(), shared(Function::new(LABEL_RETENTION, npoint)));
        fields.insert(LABEL_TEMPERATURE.to_string(), temperature.field.clone());

        // derived quantities
        let mut exports = DerivedQuantityCollection::from_param(&input.exports)?;
        exports.bind_measures(&dx, &ds)?;
        exports.bind_material_properties(&props);
        exports.bind_functions(&fields)?;
        exports.bind_temperature(&temperature.field);

        let mut sim = Simulation {
            t: control.t_ini,
            control,
            space,
            dx,
            ds,
            materials,
            props,
            temperature,
            traps,
            mobile,
            exports,
            stepsize,
            ncomp,
            uu,
            uu_prev,
            fields,
            nb_iterations: 0,
            form,
            prescribed,
        };
        sim.update_fields();
        Ok(sim)
    }

    /// Returns a field by label
    pub fn get_field(&self, label: &str) -> Result<Shared<Function>, StrError> {
        self.fields.get(label).cloned().ok_or("cannot find field with the given label")
    }

    /// Runs the simulation
    ///
    /// The derived quantities table is written before returning an error.
    pub fn run(&mut self) -> Result<(), StrError> {
        self.control.print_header();
        let res = if self.control.transient {
            self.run_transient()
        } else {
            self.run_steady()
        };
        if res.is_err() {
            if let Err(e) = self.exports.write() {
                println!("ERROR-ON-ERROR: cannot write derived quantities due to: {}", e);
            }
        }
        res
    }

    /// Solves the steady-state problem at the final time
    fn run_steady(&mut self) -> Result<(), StrError> {
        let t = self.control.t_fin;
        self.update_time(t)?;
        let solver = NonlinearSolver::new(SolverParams::from_control(&self.control));
        let uu_prev = self.uu.clone();
        solver.solve(&self.form, &self.dx, self.ncomp, &mut self.uu, &uu_prev, &self.prescribed)?;
        vec_copy(&mut self.uu_prev, &self.uu)?;
        self.t = t;
        self.update_fields();
        self.exports.compute(t)?;
        self.exports.write()
    }

    /// Runs the time loop
    fn run_transient(&mut self) -> Result<(), StrError> {
        let t_fin = self.control.t_fin;
        for timestep in 0..self.control.n_max_time_steps {
            if self.t >= t_fin || is_close(self.t, t_fin) {
                return Ok(());
            }
            let stepsize = self.stepsize.as_ref().ok_or("the stepsize of a transient simulation is missing")?;

            // time increment hitting the next milestone
            let mut dt = stepsize.get();
            if let Some(milestone) = stepsize.next_milestone(self.t, t_fin) {
                if self.t + dt > milestone {
                    dt = milestone - self.t;
                    stepsize.value.set(dt);
                }
            }
            let t_new = self.t + dt;
            self.control.print_timestep(timestep, t_new, dt);

            // solve extrinsic densities and the coupled problem
            self.update_time(t_new)?;
            let solver = NonlinearSolver::new(SolverParams::from_control(&self.control));
            let result = self.traps.solve_extrinsic_step().and_then(|_| {
                solver.solve(
                    &self.form,
                    &self.dx,
                    self.ncomp,
                    &mut self.uu,
                    &self.uu_prev,
                    &self.prescribed,
                )
            });

            // reject or accept the step
            let n_iterations = match result {
                Ok(n) => n,
                Err(err) => {
                    vec_copy(&mut self.uu, &self.uu_prev)?;
                    self.traps.restore_extrinsic_step();
                    match &self.stepsize {
                        Some(stepsize) if stepsize.is_adaptive() => {
                            let dt_new = stepsize.reduce()?;
                            self.control.print_rejected(err, dt_new);
                            continue;
                        }
                        _ => return Err(err),
                    }
                }
            };
            vec_copy(&mut self.uu_prev, &self.uu)?;
            self.traps.commit_extrinsic_step();
            self.t = t_new;
            self.nb_iterations += 1;
            self.update_fields();

            // derived quantities
            if self.exports.is_compute(self.nb_iterations) {
                self.exports.compute(self.t)?;
            }
            if self.exports.is_export(self.t, Some(t_fin), self.nb_iterations) {
                self.exports.write()?;
            }

            if let Some(stepsize) = &self.stepsize {
                stepsize.adapt(self.t, t_fin, n_iterations);
            }
        }
        if self.t >= t_fin || is_close(self.t, t_fin) {
            return Ok(());
        }
        Err("the final time has not been reached within n_max_time_steps")
    }

    /// Updates the time-dependent data and the prescribed values at time t
    fn update_time(&mut self, t: f64) -> Result<(), StrError> {
        for expr in &self.mobile.sub_expressions {
            expr.update(t);
        }
        self.traps.update_sub_expressions(t);
        self.temperature.update(t)?;
        self.props.update(&self.temperature.field.borrow(), &self.space);
        self.mobile.apply_dirichlet(&self.space, self.ncomp, &mut self.uu);
        Ok(())
    }

    /// Copies the unknowns into the fields
    fn update_fields(&mut self) {
        let npoint = self.space.npoint();
        let ncomp = self.ncomp;
        let mut retention = vec![0.0; npoint];
        for p in 0..npoint {
            for c in 0..ncomp {
                retention[p] += self.uu[p * ncomp + c];
            }
        }
        let mut labels = vec![(LABEL_SOLUTE.to_string(), Mobile::COMPONENT)];
        labels.extend(self.traps.iter().map(|t| (t.label(), t.component)));
        for (label, c) in labels {
            if let Some(field) = self.fields.get(&label) {
                let mut f = field.borrow_mut();
                for p in 0..npoint {
                    f.values[p] = self.uu[p * ncomp + c];
                }
            }
        }
        if let Some(field) = self.fields.get(LABEL_RETENTION) {
            field.borrow_mut().values = Vector::from(&retention);
        }
    }
}

/// Sets uniform initial values
fn set_initial_conditions(
    initial_conditions: &[ParamInitial],
    traps: &TrapCollection,
    npoint: usize,
    ncomp: usize,
    uu: &mut Vector,
) -> Result<(), StrError> {
    for ic in initial_conditions {
        let c = if ic.field == LABEL_SOLUTE || ic.field == LABEL_SOLUTE_ALT {
            Mobile::COMPONENT
        } else {
            traps
                .iter()
                .find(|t| t.label() == ic.field)
                .map(|t| t.component)
                .ok_or("cannot find the field of an initial condition")?
        };
        for p in 0..npoint {
            uu[p * ncomp + c] = ic.value;
        }
    }
    Ok(())
}

/// Returns true if the times are equal within a relative tolerance
fn is_close(a: f64, b: f64) -> bool {
    f64::abs(a - b) <= 1e-12 * f64::max(1.0, f64::abs(b))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

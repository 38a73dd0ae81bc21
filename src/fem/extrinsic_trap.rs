use super::{shared, Form, Function, FunctionSpace, NonlinearSolver, Shared, SolverParams, Stepsize, VolumeMeasure};
use crate::base::{Expression, ExtrinsicKinetics, ParamExtrinsic, TimeExpression, K_B};
use crate::StrError;
use russell_lab::Vector;
use std::rc::Rc;

/// Holds the state of a trap whose density n evolves according to its own equation
///
/// The density equation is solved at each time step before the coupled problem;
/// thus, the trapping terms use the density at the new time.
pub struct ExtrinsicTrap {
    /// Holds the parameters
    pub param: ParamExtrinsic,

    /// Holds the density field (allocated by `initialize`)
    pub density: Option<Shared<Function>>,

    /// Holds the density at the previous time (allocated by `initialize`)
    pub density_prev: Option<Vector>,

    /// Holds the residual form of the density equation (allocated by `create_form_density`)
    pub form: Option<Form>,

    /// Holds the volume measure used by the density equation
    dx: Option<VolumeMeasure>,
}

impl ExtrinsicTrap {
    /// Allocates a new instance
    pub fn new(param: ParamExtrinsic) -> Result<Self, StrError> {
        if let Some(msg) = param.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate extrinsic trap because param.validate() failed");
        }
        Ok(ExtrinsicTrap {
            param,
            density: None,
            density_prev: None,
            form: None,
            dx: None,
        })
    }

    /// Allocates the density field and sets the previous density to zero
    pub fn initialize(&mut self, space: &FunctionSpace, name: &str) {
        self.density = Some(shared(Function::new(name, space.npoint())));
        self.density_prev = Some(Vector::new(space.npoint()));
    }

    /// Creates the residual form of the density equation
    ///
    /// Plasma-induced sites:
    ///
    /// ```text
    /// (n − nₙ)/Δt − φ₀ [(1 − n/n_amax) η_a f_a + (1 − n/n_bmax) η_b f_b]
    /// ```
    ///
    /// Neutron-induced sites:
    ///
    /// ```text
    /// (n − nₙ)/Δt − φ K (1 − n/n_max) + A₀ exp(−E_A / k_B T) n
    /// ```
    pub fn create_form_density(
        &mut self,
        dx: &VolumeMeasure,
        dt: &Stepsize,
        temperature: &Shared<Function>,
        sub_expressions: &mut Vec<Rc<TimeExpression>>,
    ) -> Result<(), StrError> {
        if self.density.is_none() {
            return Err("the extrinsic trap must be initialized first");
        }
        let (dtv, dtv_d) = (dt.value.clone(), dt.value.clone());
        let time_derivative = Form::nodal(
            0,
            None,
            vec![0],
            move |a| (a.u[0] - a.u_prev[0]) / dtv.get(),
            move |_, _| 1.0 / dtv_d.get(),
        );
        let kinetics = match &self.param.kinetics {
            ExtrinsicKinetics::Plasma {
                phi_0,
                n_amax,
                n_bmax,
                eta_a,
                eta_b,
                f_a,
                f_b,
            } => {
                let phi_0 = Rc::new(Expression::new(phi_0, sub_expressions));
                let (na, nb) = (*n_amax, *n_bmax);
                let (ga, gb) = (eta_a * f_a, eta_b * f_b);
                let phi = phi_0.clone();
                Form::nodal(
                    0,
                    None,
                    vec![0],
                    move |a| -phi.eval(a.x) * ((1.0 - a.u[0] / na) * ga + (1.0 - a.u[0] / nb) * gb),
                    move |a, _| phi_0.eval(a.x) * (ga / na + gb / nb),
                )
            }
            ExtrinsicKinetics::NeutronInduced { phi, k, n_max, a_0, e_a } => {
                let phi = Rc::new(Expression::new(phi, sub_expressions));
                let (k, n_max, a_0, e_a) = (*k, *n_max, *a_0, *e_a);
                let (phi_d, temp, temp_d) = (phi.clone(), temperature.clone(), temperature.clone());
                Form::nodal(
                    0,
                    None,
                    vec![0],
                    move |a| {
                        let annealing = a_0 * f64::exp(-e_a / (K_B * temp.borrow().values[a.point]));
                        -phi.eval(a.x) * k * (1.0 - a.u[0] / n_max) + annealing * a.u[0]
                    },
                    move |a, _| {
                        let annealing = a_0 * f64::exp(-e_a / (K_B * temp_d.borrow().values[a.point]));
                        phi_d.eval(a.x) * k / n_max + annealing
                    },
                )
            }
        };
        self.form = Some(time_derivative + kinetics);
        self.dx = Some(dx.clone());
        Ok(())
    }

    /// Solves the density equation for the current time step
    ///
    /// Returns the number of Newton iterations. Non-convergence is an error.
    pub fn solve(&mut self) -> Result<usize, StrError> {
        let (form, dx) = match (&self.form, &self.dx) {
            (Some(form), Some(dx)) => (form, dx),
            _ => return Err("the density form of the extrinsic trap must be created first"),
        };
        let (density, density_prev) = match (&self.density, &self.density_prev) {
            (Some(d), Some(p)) => (d, p),
            _ => return Err("the extrinsic trap must be initialized first"),
        };
        let mut uu = density.borrow().values.clone();
        let prescribed = vec![false; uu.dim()];
        let solver = NonlinearSolver::new(SolverParams::from_extrinsic(&self.param));
        let n_iterations = solver.solve(form, dx, 1, &mut uu, density_prev, &prescribed)?;
        density.borrow_mut().values = uu;
        Ok(n_iterations)
    }

    /// Copies the density into the previous density
    pub fn commit(&mut self) {
        if let (Some(density), Some(prev)) = (&self.density, &mut self.density_prev) {
            let d = density.borrow();
            for p in 0..prev.dim() {
                prev[p] = d.values[p];
            }
        }
    }

    /// Restores the density from the previous density (after a rejected step)
    pub fn restore(&mut self) {
        if let (Some(density), Some(prev)) = (&self.density, &self.density_prev) {
            let mut d = density.borrow_mut();
            for p in 0..prev.dim() {
                d.values[p] = prev[p];
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

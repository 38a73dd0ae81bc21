use super::LinearSolver;
use serde::{Deserialize, Serialize};

/// Defines the smallest allowed dt_min (Control)
pub const CONTROL_MIN_DT_MIN: f64 = 1e-15;

/// Defines the smallest allowed tolerance (Control)
pub const CONTROL_MIN_TOL: f64 = 1e-15;

/// Holds the (time-loop) options to control the simulation
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Control {
    /// Transient simulation; otherwise steady-state
    pub transient: bool,

    /// Initial time
    pub t_ini: f64,

    /// Final time
    pub t_fin: f64,

    /// Time increments (possibly adaptive)
    pub stepsize: ParamStepsize,

    /// Maximum number of time steps
    pub n_max_time_steps: usize,

    /// Maximum number of Newton iterations
    pub n_max_iterations: usize,

    /// Absolute tolerance for the residual vector
    pub tol_abs_residual: f64,

    /// Relative tolerance for the residual vector
    pub tol_rel_residual: f64,

    /// Linear solver used within the Newton iterations
    pub linear_solver: LinearSolver,

    /// Verbose mode during timesteps
    pub verbose_timesteps: bool,

    /// Verbose mode during iterations
    pub verbose_iterations: bool,
}

/// Holds the parameters of the (adaptive) stepsize
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamStepsize {
    /// Initial time increment
    pub initial_value: f64,

    /// Ratio used to increase or decrease Δt; None means constant Δt
    #[serde(default)]
    pub stepsize_change_ratio: Option<f64>,

    /// Minimum allowed time increment min(Δt)
    #[serde(default = "default_dt_min")]
    pub dt_min: f64,

    /// Maximum allowed time increment
    #[serde(default)]
    pub max_stepsize: Option<f64>,

    /// Time after which Δt is capped by `stepsize_stop_max`
    #[serde(default)]
    pub t_stop: Option<f64>,

    /// Maximum Δt after `t_stop`
    #[serde(default)]
    pub stepsize_stop_max: Option<f64>,

    /// Times that must be hit exactly by the time loop
    #[serde(default)]
    pub milestones: Vec<f64>,
}

fn default_dt_min() -> f64 {
    1e-10
}

impl ParamStepsize {
    /// Allocates a new constant stepsize
    pub fn new(initial_value: f64) -> Self {
        ParamStepsize {
            initial_value,
            stepsize_change_ratio: None,
            dt_min: default_dt_min(),
            max_stepsize: None,
            t_stop: None,
            stepsize_stop_max: None,
            milestones: Vec::new(),
        }
    }

    /// Allocates a new adaptive stepsize
    pub fn new_adaptive(initial_value: f64, stepsize_change_ratio: f64, dt_min: f64) -> Self {
        ParamStepsize {
            initial_value,
            stepsize_change_ratio: Some(stepsize_change_ratio),
            dt_min,
            max_stepsize: None,
            t_stop: None,
            stepsize_stop_max: None,
            milestones: Vec::new(),
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.initial_value <= 0.0 {
            return Some(format!(
                "initial_value = {:?} is incorrect; it must be > 0.0",
                self.initial_value
            ));
        }
        if self.dt_min < CONTROL_MIN_DT_MIN {
            return Some(format!(
                "dt_min = {:?} is incorrect; it must be ≥ {:e}",
                self.dt_min, CONTROL_MIN_DT_MIN
            ));
        }
        if let Some(ratio) = self.stepsize_change_ratio {
            if ratio <= 1.0 {
                return Some(format!(
                    "stepsize_change_ratio = {:?} is incorrect; it must be > 1.0",
                    ratio
                ));
            }
        }
        if let Some(max) = self.max_stepsize {
            if max < self.initial_value {
                return Some(format!(
                    "max_stepsize = {:?} is incorrect; it must be ≥ initial_value = {:?}",
                    max, self.initial_value
                ));
            }
        }
        if self.t_stop.is_some() && self.stepsize_stop_max.is_none() {
            return Some("stepsize_stop_max is required when t_stop is given".to_string());
        }
        None // all good
    }
}

impl Control {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Control {
            transient: true,
            t_ini: 0.0,
            t_fin: 1.0,
            stepsize: ParamStepsize::new(0.1),
            n_max_time_steps: 100_000,
            n_max_iterations: 30,
            tol_abs_residual: 1e-10,
            tol_rel_residual: 1e-10,
            linear_solver: LinearSolver::Umfpack,
            verbose_timesteps: false,
            verbose_iterations: false,
        }
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.t_ini < 0.0 {
            return Some(format!("t_ini = {:?} is incorrect; it must be ≥ 0.0", self.t_ini));
        }
        if self.t_fin < self.t_ini {
            return Some(format!(
                "t_fin = {:?} is incorrect; it must be ≥ t_ini = {:?}",
                self.t_fin, self.t_ini
            ));
        }
        if self.n_max_iterations < 1 {
            return Some(format!(
                "n_max_iterations = {} is incorrect; it must be ≥ 1",
                self.n_max_iterations
            ));
        }
        if self.tol_abs_residual < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_abs_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_abs_residual, CONTROL_MIN_TOL
            ));
        }
        if self.tol_rel_residual < CONTROL_MIN_TOL {
            return Some(format!(
                "tol_rel_residual = {:?} is incorrect; it must be ≥ {:e}",
                self.tol_rel_residual, CONTROL_MIN_TOL
            ));
        }
        if self.transient {
            return self.stepsize.validate();
        }
        None // all good
    }

    /// Prints the header of the table with timestep and iteration data
    #[inline]
    pub fn print_header(&self) {
        if self.verbose_timesteps || self.verbose_iterations {
            println!("Legend:");
            println!("✅ : converged");
            println!("👍 : converging");
            println!("🥵 : diverging");
            println!("😱 : found NaN or Inf\n");
            println!(
                "{:>8} {:>13} {:>13} {:>5} {:>8}   {:>8}  ",
                "timestep", "t", "Δt", "iter", "|R|", "tol·|R₀|"
            );
        }
    }

    /// Prints timestep data
    #[inline]
    #[rustfmt::skip]
    pub fn print_timestep(&self, timestep: usize, t: f64, dt: f64) {
        if !self.verbose_timesteps {
            return ;
        }
        println!(
            "{:>8} {:>13.6e} {:>13.6e} {:>5} {:>8}   {:>8}  ",
            timestep+1, t, dt, ".", ".", "."
        );
    }

    /// Prints a message when the timestep is rejected
    #[inline]
    pub fn print_rejected(&self, reason: &str, dt_new: f64) {
        if self.verbose_timesteps {
            println!("{:>8} rejected: {}; new Δt = {:.6e}", ".", reason, dt_new);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

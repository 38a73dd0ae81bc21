use super::{Coefficient, LinearSolver};
use serde::{Deserialize, Serialize};

/// Holds the parameters of a trap
///
/// The trapping rate is `k = k₀ exp(−E_k / k_B T)` and the detrapping rate is
/// `p = p₀ exp(−E_p / k_B T)`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamTrap {
    /// Identifier; None means that it will be assigned by the trap collection
    #[serde(default)]
    pub id: Option<usize>,

    /// Trapping rate pre-factor (m³/s)
    pub k_0: f64,

    /// Trapping activation energy (eV)
    pub e_k: f64,

    /// Detrapping rate pre-factor (1/s)
    pub p_0: f64,

    /// Detrapping activation energy (eV)
    pub e_p: f64,

    /// Names of the materials where the trap exists
    pub materials: Vec<String>,

    /// Density of trapping sites
    pub density: TrapDensity,
}

/// Defines the density of trapping sites
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum TrapDensity {
    /// Fixed density, possibly depending on (x, t)
    Intrinsic(Coefficient),

    /// Density governed by its own evolution equation (extrinsic trap)
    Extrinsic(ParamExtrinsic),
}

/// Holds the parameters of an extrinsic trap
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamExtrinsic {
    /// Creation and annihilation kinetics of the trapping sites
    pub kinetics: ExtrinsicKinetics,

    /// Absolute tolerance of the Newton iterations for the density equation
    #[serde(default = "default_absolute_tolerance")]
    pub absolute_tolerance: f64,

    /// Relative tolerance of the Newton iterations for the density equation
    #[serde(default = "default_relative_tolerance")]
    pub relative_tolerance: f64,

    /// Maximum number of Newton iterations for the density equation
    #[serde(default = "default_maximum_iterations")]
    pub maximum_iterations: usize,

    /// Linear solver used within the Newton iterations
    #[serde(default = "default_linear_solver")]
    pub linear_solver: LinearSolver,
}

/// Defines the kinetics of extrinsic trapping sites
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum ExtrinsicKinetics {
    /// Sites created by plasma exposure
    ///
    /// `dn/dt = φ₀ [(1 − n/n_amax) η_a f_a + (1 − n/n_bmax) η_b f_b]`
    Plasma {
        phi_0: Coefficient,
        n_amax: f64,
        n_bmax: f64,
        eta_a: f64,
        eta_b: f64,
        f_a: f64,
        f_b: f64,
    },

    /// Sites created by neutron irradiation and annihilated by annealing
    ///
    /// `dn/dt = φ K (1 − n/n_max) − A₀ exp(−E_A / k_B T) n`
    NeutronInduced {
        phi: Coefficient,
        k: f64,
        n_max: f64,
        a_0: f64,
        e_a: f64,
    },
}

fn default_absolute_tolerance() -> f64 {
    1.0
}

fn default_relative_tolerance() -> f64 {
    1e-10
}

fn default_maximum_iterations() -> usize {
    30
}

fn default_linear_solver() -> LinearSolver {
    LinearSolver::Umfpack
}

impl ParamTrap {
    /// Allocates a new instance of an intrinsic trap with uniform density
    pub fn new(k_0: f64, e_k: f64, p_0: f64, e_p: f64, materials: &[&str], density: f64) -> Self {
        ParamTrap {
            id: None,
            k_0,
            e_k,
            p_0,
            e_p,
            materials: materials.iter().map(|m| m.to_string()).collect(),
            density: TrapDensity::Intrinsic(Coefficient::Constant(density)),
        }
    }

    /// Allocates a new instance of an extrinsic trap
    pub fn new_extrinsic(
        k_0: f64,
        e_k: f64,
        p_0: f64,
        e_p: f64,
        materials: &[&str],
        kinetics: ExtrinsicKinetics,
    ) -> Self {
        ParamTrap {
            id: None,
            k_0,
            e_k,
            p_0,
            e_p,
            materials: materials.iter().map(|m| m.to_string()).collect(),
            density: TrapDensity::Extrinsic(ParamExtrinsic::new(kinetics)),
        }
    }

    /// Sets the identifier
    pub fn with_id(mut self, id: usize) -> Self {
        self.id = Some(id);
        self
    }
}

impl ParamExtrinsic {
    /// Allocates a new instance with default solver settings
    pub fn new(kinetics: ExtrinsicKinetics) -> Self {
        ParamExtrinsic {
            kinetics,
            absolute_tolerance: default_absolute_tolerance(),
            relative_tolerance: default_relative_tolerance(),
            maximum_iterations: default_maximum_iterations(),
            linear_solver: default_linear_solver(),
        }
    }

    /// Validates the parameters
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    pub fn validate(&self) -> Option<String> {
        if self.absolute_tolerance <= 0.0 {
            return Some(format!(
                "absolute_tolerance = {:?} is incorrect; it must be > 0.0",
                self.absolute_tolerance
            ));
        }
        if self.relative_tolerance <= 0.0 {
            return Some(format!(
                "relative_tolerance = {:?} is incorrect; it must be > 0.0",
                self.relative_tolerance
            ));
        }
        if self.maximum_iterations < 1 {
            return Some(format!(
                "maximum_iterations = {} is incorrect; it must be ≥ 1",
                self.maximum_iterations
            ));
        }
        match self.kinetics {
            ExtrinsicKinetics::Plasma { n_amax, n_bmax, .. } => {
                if n_amax <= 0.0 || n_bmax <= 0.0 {
                    return Some("n_amax and n_bmax must be > 0.0".to_string());
                }
            }
            ExtrinsicKinetics::NeutronInduced { n_max, .. } => {
                if n_max <= 0.0 {
                    return Some(format!("n_max = {:?} is incorrect; it must be > 0.0", n_max));
                }
            }
        }
        None // all good
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

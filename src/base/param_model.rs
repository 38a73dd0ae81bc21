use super::{Coefficient, QuantityKind};
use crate::FnSpaceTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines the temperature field
#[derive(Clone, Copy, Deserialize, Serialize)]
pub enum ParamTemperature {
    /// Uniform and constant temperature
    Constant(f64),

    /// Uniform temperature increasing linearly in time: T = t_0 + rate · t
    Ramp { t_0: f64, rate: f64 },

    /// Function of (x, t)
    #[serde(skip)]
    Function(FnSpaceTime),
}

impl ParamTemperature {
    /// Evaluates the temperature
    pub fn value(&self, x: &[f64], t: f64) -> f64 {
        match self {
            ParamTemperature::Constant(v) => *v,
            ParamTemperature::Ramp { t_0, rate } => t_0 + rate * t,
            ParamTemperature::Function(f) => (f)(x, t),
        }
    }
}

impl fmt::Debug for ParamTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamTemperature::Constant(v) => write!(f, "Constant({:?})", v),
            ParamTemperature::Ramp { t_0, rate } => write!(f, "Ramp {{ t_0: {:?}, rate: {:?} }}", t_0, rate),
            ParamTemperature::Function(..) => write!(f, "Function(..)"),
        }
    }
}

/// Holds a volumetric source of mobile particles
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamSource {
    /// Volume id (cell attribute)
    pub volume: usize,

    /// Source value (particles/m³/s)
    pub value: Coefficient,
}

/// Holds a prescribed concentration of mobile particles on a surface
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamDirichlet {
    /// Surface id (facet marker)
    pub surface: usize,

    /// Prescribed value
    pub value: Coefficient,
}

/// Holds a uniform initial value of a field
///
/// The field is "solute" (or "0") for mobile particles, or the id of a trap (e.g., "1").
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamInitial {
    pub field: String,
    pub value: f64,
}

/// Holds the definition of a derived quantity
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamQuantity {
    pub kind: QuantityKind,

    /// Field name: "solute", "retention", "T", or a trap id
    pub field: String,

    /// Surface id or volume id, depending on the kind
    pub region: usize,

    /// Includes the Soret contribution (surface flux of solute only)
    #[serde(default)]
    pub soret: bool,
}

/// Holds the definition of the derived quantities output
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamExports {
    /// CSV file receiving the derived quantities table
    #[serde(default)]
    pub filename: Option<String>,

    /// Quantities (columns of the table)
    pub quantities: Vec<ParamQuantity>,

    /// Number of time steps between two computations
    #[serde(default = "default_nb_iterations_between_compute")]
    pub nb_iterations_between_compute: usize,

    /// Number of time steps between two writings; None means writing at the final time only
    #[serde(default)]
    pub nb_iterations_between_exports: Option<usize>,
}

fn default_nb_iterations_between_compute() -> usize {
    1
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

//! Makes available common structures needed to run a simulation
//!
//! You may write `use trapsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Coefficient, Control, ExtrinsicKinetics, LinearSolver, Material, Materials, ModelInput};
pub use crate::base::{ParamDirichlet, ParamExports, ParamInitial, ParamMesh, ParamQuantity, ParamSource};
pub use crate::base::{ParamStepsize, ParamTemperature, ParamTrap, QuantityKind, Region};
pub use crate::base::{DEFAULT_OUT_DIR, DEFAULT_TEST_DIR, K_B};
pub use crate::fem::{DerivedQuantity, DerivedQuantityCollection, Filtered, Simulation, Trap, TrapCollection};
pub use crate::StrError;

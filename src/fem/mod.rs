//! Implements the finite element engine and the hydrogen transport simulation

mod derived_quantities;
mod derived_quantity;
mod extrinsic_trap;
mod form;
mod function;
mod function_space;
mod material_properties;
mod measure;
mod mobile;
mod nonlinear_solver;
mod simulation;
mod stepsize;
mod temperature;
mod trap;
mod trap_collection;
pub use crate::fem::derived_quantities::*;
pub use crate::fem::derived_quantity::*;
pub use crate::fem::extrinsic_trap::*;
pub use crate::fem::form::*;
pub use crate::fem::function::*;
pub use crate::fem::function_space::*;
pub use crate::fem::material_properties::*;
pub use crate::fem::measure::*;
pub use crate::fem::mobile::*;
pub use crate::fem::nonlinear_solver::*;
pub use crate::fem::simulation::*;
pub use crate::fem::stepsize::*;
pub use crate::fem::temperature::*;
pub use crate::fem::trap::*;
pub use crate::fem::trap_collection::*;

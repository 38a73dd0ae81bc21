//! Implements the base structures for a hydrogen transport simulation

mod coefficient;
mod constants;
mod control;
mod enums;
mod interval_mesh;
mod material;
mod model_input;
mod param_model;
mod param_trap;
pub use crate::base::coefficient::*;
pub use crate::base::constants::*;
pub use crate::base::control::*;
pub use crate::base::enums::*;
pub use crate::base::interval_mesh::*;
pub use crate::base::material::*;
pub use crate::base::model_input::*;
pub use crate::base::param_model::*;
pub use crate::base::param_trap::*;

//! Trapsim -- Hydrogen transport simulator
//!
//! Solves the diffusion of mobile hydrogen coupled with trapping and detrapping
//! (McNabb-Foster) over one-dimensional meshes, and post-processes the results
//! with derived quantities (surface fluxes, totals, averages, extrema) written as CSV tables.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

/// Defines a function of (x,t) where x is space and t is time
pub type FnSpaceTime = fn(&[f64], f64) -> f64;

pub mod base;
pub mod fem;
pub mod prelude;

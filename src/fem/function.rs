use super::FunctionSpace;
use crate::StrError;
use russell_lab::Vector;
use std::cell::RefCell;
use std::rc::Rc;

/// Defines a handle to data shared by forms, traps, and derived quantities
pub type Shared<T> = Rc<RefCell<T>>;

/// Allocates a new shared handle
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Holds the nodal values of a linear (P1) scalar field
#[derive(Clone, Debug)]
pub struct Function {
    /// Name (label) of the field
    pub name: String,

    /// Values at the points of the mesh
    ///
    /// (npoint)
    pub values: Vector,
}

impl Function {
    /// Allocates a new field with zero values
    pub fn new(name: &str, npoint: usize) -> Self {
        Function {
            name: name.to_string(),
            values: Vector::new(npoint),
        }
    }

    /// Allocates a new field with a uniform value
    pub fn constant(name: &str, npoint: usize, value: f64) -> Self {
        Function {
            name: name.to_string(),
            values: Vector::filled(npoint, value),
        }
    }

    /// Returns the number of values
    #[inline]
    pub fn dim(&self) -> usize {
        self.values.dim()
    }

    /// Sets the values by evaluating a function of the coordinates at each point
    pub fn interpolate<F>(&mut self, space: &FunctionSpace, f: F) -> Result<(), StrError>
    where
        F: Fn(&[f64]) -> f64,
    {
        if self.values.dim() != space.npoint() {
            return Err("the function and the function space have incompatible dimensions");
        }
        for p in 0..space.npoint() {
            self.values[p] = f(space.coords(p));
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

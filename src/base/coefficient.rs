use crate::FnSpaceTime;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Defines a scalar coefficient of a model (e.g., a trap density or a particle flux)
///
/// Functions of space and time cannot be written to (or read from) JSON files;
/// thus, only the constant variant is available in model files.
#[derive(Clone, Copy, Deserialize, Serialize)]
pub enum Coefficient {
    /// Uniform and constant value
    Constant(f64),

    /// Function of (x, t)
    #[serde(skip)]
    Function(FnSpaceTime),
}

impl Coefficient {
    /// Evaluates the coefficient
    pub fn value(&self, x: &[f64], t: f64) -> f64 {
        match self {
            Coefficient::Constant(v) => *v,
            Coefficient::Function(f) => (f)(x, t),
        }
    }
}

impl fmt::Debug for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coefficient::Constant(v) => write!(f, "Constant({:?})", v),
            Coefficient::Function(..) => write!(f, "Function(..)"),
        }
    }
}

/// Holds a function of (x, t) whose time is updated explicitly by the time loop
///
/// The forms hold shared references to these expressions; hence, updating the
/// time of an expression updates all forms using it.
pub struct TimeExpression {
    func: FnSpaceTime,
    t: Cell<f64>,
}

impl TimeExpression {
    /// Allocates a new instance at time t
    pub fn new(func: FnSpaceTime, t: f64) -> Self {
        TimeExpression { func, t: Cell::new(t) }
    }

    /// Sets the current time
    pub fn update(&self, t: f64) {
        self.t.set(t);
    }

    /// Evaluates the expression at x and the current time
    pub fn eval(&self, x: &[f64]) -> f64 {
        (self.func)(x, self.t.get())
    }
}

/// Holds a coefficient ready to be evaluated within a form
#[derive(Clone)]
pub enum Expression {
    Constant(f64),
    Timed(Rc<TimeExpression>),
}

impl Expression {
    /// Converts a coefficient into an expression
    ///
    /// Time-dependent coefficients generate a new [TimeExpression] which is
    /// pushed into `sub_expressions` so the time loop can update it.
    pub fn new(coefficient: &Coefficient, sub_expressions: &mut Vec<Rc<TimeExpression>>) -> Self {
        match coefficient {
            Coefficient::Constant(v) => Expression::Constant(*v),
            Coefficient::Function(f) => {
                let expr = Rc::new(TimeExpression::new(*f, 0.0));
                sub_expressions.push(expr.clone());
                Expression::Timed(expr)
            }
        }
    }

    /// Evaluates the expression at x
    #[inline]
    pub fn eval(&self, x: &[f64]) -> f64 {
        match self {
            Expression::Constant(v) => *v,
            Expression::Timed(e) => e.eval(x),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

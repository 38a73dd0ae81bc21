use crate::base::ParamStepsize;
use crate::StrError;
use std::cell::Cell;
use std::rc::Rc;

/// Holds the (possibly adaptive) time increment Δt
///
/// The value is shared with the forms; thus, changing it changes the time-discretization
/// terms without rebuilding the forms.
pub struct Stepsize {
    /// Holds the parameters
    pub param: ParamStepsize,

    /// Holds the current Δt
    pub value: Rc<Cell<f64>>,
}

impl Stepsize {
    /// Allocates a new instance
    pub fn new(param: ParamStepsize) -> Self {
        let value = Rc::new(Cell::new(param.initial_value));
        Stepsize { param, value }
    }

    /// Returns the current Δt
    #[inline]
    pub fn get(&self) -> f64 {
        self.value.get()
    }

    /// Returns true if Δt changes during the simulation
    pub fn is_adaptive(&self) -> bool {
        self.param.stepsize_change_ratio.is_some()
    }

    /// Reduces Δt after a failed step
    ///
    /// Returns an error if the new Δt is smaller than dt_min or if the stepsize is not adaptive.
    pub fn reduce(&self) -> Result<f64, StrError> {
        let ratio = self
            .param
            .stepsize_change_ratio
            .ok_or("cannot reduce a constant stepsize")?;
        let dt = self.value.get() / ratio;
        if dt < self.param.dt_min {
            return Err("stepsize reached minimal value");
        }
        self.value.set(dt);
        Ok(dt)
    }

    /// Adapts Δt after an accepted step ending at time t
    ///
    /// An adaptive Δt grows if the Newton solver took fewer than five iterations and shrinks otherwise;
    /// a constant Δt is reset to its initial value.
    /// Then Δt is limited by `max_stepsize`, by `stepsize_stop_max` after `t_stop`, and it is
    /// shortened to hit the next milestone (the final time is always a milestone).
    pub fn adapt(&self, t: f64, t_fin: f64, nb_iterations: usize) {
        let mut dt = match self.param.stepsize_change_ratio {
            Some(..) => self.value.get(),
            None => self.param.initial_value,
        };
        if let Some(ratio) = self.param.stepsize_change_ratio {
            if nb_iterations < 5 {
                dt *= ratio;
            } else {
                dt /= ratio;
            }
            if let Some(t_stop) = self.param.t_stop {
                if let Some(max) = self.param.stepsize_stop_max {
                    if t >= t_stop && dt > max {
                        dt = max;
                    }
                }
            }
            if let Some(max) = self.param.max_stepsize {
                if dt > max {
                    dt = max;
                }
            }
        }
        if let Some(milestone) = self.next_milestone(t, t_fin) {
            if t + dt > milestone {
                dt = milestone - t;
            }
        }
        self.value.set(dt);
    }

    /// Returns the first milestone after t
    pub fn next_milestone(&self, t: f64, t_fin: f64) -> Option<f64> {
        self.param
            .milestones
            .iter()
            .copied()
            .chain(std::iter::once(t_fin))
            .filter(|m| *m > t && !is_close(*m, t))
            .fold(None, |acc: Option<f64>, m| match acc {
                Some(a) if a <= m => Some(a),
                _ => Some(m),
            })
    }
}

/// Returns true if the times are equal within a relative tolerance
fn is_close(a: f64, b: f64) -> bool {
    f64::abs(a - b) <= 1e-12 * f64::max(1.0, f64::abs(b))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

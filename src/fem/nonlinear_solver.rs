use super::{Form, VolumeMeasure};
use crate::base::{Control, LinearSolver, ParamExtrinsic};
use crate::StrError;
use russell_lab::{vec_norm, Norm, Vector};
use russell_sparse::{LinSolver, SparseMatrix, Sym};

/// Holds the parameters of the Newton solver
#[derive(Clone, Copy, Debug)]
pub struct SolverParams {
    /// Absolute tolerance on the norm of the residual vector
    pub absolute_tolerance: f64,

    /// Relative tolerance on the norm of the residual vector (with respect to the first norm)
    pub relative_tolerance: f64,

    /// Maximum number of iterations
    pub maximum_iterations: usize,

    /// Linear solver
    pub linear_solver: LinearSolver,

    /// Prints the iterations
    pub verbose: bool,
}

impl SolverParams {
    /// Returns the parameters of the coupled (mobile and traps) problem
    pub fn from_control(control: &Control) -> Self {
        SolverParams {
            absolute_tolerance: control.tol_abs_residual,
            relative_tolerance: control.tol_rel_residual,
            maximum_iterations: control.n_max_iterations,
            linear_solver: control.linear_solver,
            verbose: control.verbose_iterations,
        }
    }

    /// Returns the parameters of the density problem of an extrinsic trap
    pub fn from_extrinsic(param: &ParamExtrinsic) -> Self {
        SolverParams {
            absolute_tolerance: param.absolute_tolerance,
            relative_tolerance: param.relative_tolerance,
            maximum_iterations: param.maximum_iterations,
            linear_solver: param.linear_solver,
            verbose: false,
        }
    }
}

/// Implements the Newton method to find the zero of a residual form
pub struct NonlinearSolver {
    pub params: SolverParams,
}

impl NonlinearSolver {
    /// Allocates a new instance
    pub fn new(params: SolverParams) -> Self {
        NonlinearSolver { params }
    }

    /// Solves R(U) = 0
    ///
    /// The equations not touched by any term of the form are kept fixed (as the prescribed ones),
    /// thus `uu` must hold the prescribed values on input.
    ///
    /// Returns the number of updates performed. Convergence happens when
    /// `‖R‖ < atol` or `‖R‖ < rtol · ‖R₀‖`. The residual is checked after every
    /// update, thus the solver fails only after `maximum_iterations` unsuccessful updates.
    pub fn solve(
        &self,
        form: &Form,
        dx: &VolumeMeasure,
        ncomp: usize,
        uu: &mut Vector,
        uu_prev: &Vector,
        prescribed: &[bool],
    ) -> Result<usize, StrError> {
        let neq = uu.dim();
        if uu_prev.dim() != neq || prescribed.len() != neq || neq != dx.space.npoint() * ncomp {
            return Err("the dimensions of the unknowns are inconsistent with the function space");
        }
        let active = form.active_equations(dx, ncomp);
        let fixed: Vec<_> = (0..neq).map(|i| prescribed[i] || !active[i]).collect();

        // linear system
        let nnz_sup = form.nnz_sup(dx) + neq;
        let mut rr = Vector::new(neq);
        let mut mdu = Vector::new(neq);
        let genie = self.params.linear_solver.genie();

        // iterations
        let mut norm_rr0 = 0.0;
        for iteration in 0..=self.params.maximum_iterations {
            // residual
            form.assemble_residual(dx, ncomp, uu, uu_prev, &mut rr, &fixed);
            let norm_rr = vec_norm(&rr, Norm::Euc);
            if iteration == 0 {
                norm_rr0 = norm_rr;
            }
            self.print_iteration(iteration, norm_rr, norm_rr0);

            // check convergence
            if !norm_rr.is_finite() {
                return Err("found NaN or Inf in the residual vector");
            }
            if norm_rr < self.params.absolute_tolerance {
                return Ok(iteration);
            }
            if iteration > 0 && norm_rr < self.params.relative_tolerance * norm_rr0 {
                return Ok(iteration);
            }
            if iteration == self.params.maximum_iterations {
                break;
            }

            // Jacobian matrix
            let mut kk = SparseMatrix::new_coo(neq, neq, nnz_sup, Sym::No)?;
            let coo = kk.get_coo_mut()?;
            form.assemble_jacobian(dx, ncomp, uu, uu_prev, coo, &fixed)?;
            for eq in 0..neq {
                if fixed[eq] {
                    coo.put(eq, eq, 1.0)?;
                }
            }

            // solve linear system and update U
            LinSolver::compute(genie, &mut mdu, &mut kk, &rr, None)?;
            for i in 0..neq {
                uu[i] -= mdu[i];
            }
        }
        Err("Newton solver did not converge")
    }

    /// Prints iteration data
    fn print_iteration(&self, it: usize, norm_rr: f64, norm_rr0: f64) {
        if !self.params.verbose {
            return;
        }
        let (l, r) = if !norm_rr.is_finite() {
            ("😱", "  ") // found NaN or Inf
        } else if norm_rr < self.params.absolute_tolerance {
            ("✅", "  ") // converged on absolute residual
        } else if it == 0 {
            ("  ", "? ") // first iteration
        } else if norm_rr < self.params.relative_tolerance * norm_rr0 {
            ("  ", "✅") // converged on relative residual
        } else if norm_rr > norm_rr0 {
            ("🥵", "  ") // diverging
        } else {
            ("👍", "  ") // converging
        };
        let v = self.params.relative_tolerance * norm_rr0;
        println!(
            "{:>8} {:>13} {:>13} {:>5} {:>8.2e}{} {:>8.2e}{}",
            ".",
            ".",
            ".",
            it + 1,
            norm_rr,
            l,
            v,
            r,
        );
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

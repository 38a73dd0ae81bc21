use super::VolumeMeasure;
use crate::StrError;
use gemlab::mesh::{CellId, PointId};
use russell_lab::Vector;
use russell_sparse::CooMatrix;
use std::ops::{Add, AddAssign};

/// Holds the arguments of a nodal term evaluated at one point of the mesh
pub struct NodeArgs<'a> {
    /// Point (node) id
    pub point: PointId,

    /// Coordinates of the point
    pub x: &'a [f64],

    /// Current values of all components at the point
    ///
    /// (ncomp)
    pub u: &'a [f64],

    /// Values of all components at the point at the previous time
    ///
    /// (ncomp)
    pub u_prev: &'a [f64],
}

/// Defines the integrand of a nodal term
pub type FnNodal = Box<dyn Fn(&NodeArgs) -> f64>;

/// Defines the derivative of the integrand of a nodal term with respect to a component
pub type FnNodalDeriv = Box<dyn Fn(&NodeArgs, usize) -> f64>;

/// Defines a coefficient given per cell
pub type FnCell = Box<dyn Fn(CellId) -> f64>;

/// Defines the terms of a residual form
pub enum Term {
    /// Integrand evaluated at the points with the nodal (lumped) quadrature
    ///
    /// Contributes `w_p f(u_p)` to the equation of the `test` component at point p.
    Nodal {
        /// Component of the test function
        test: usize,

        /// Volume id restricting the integration (None means the whole domain)
        volume: Option<usize>,

        /// Components the integrand depends on
        deps: Vec<usize>,

        /// Integrand
        value: FnNodal,

        /// Derivative of the integrand
        deriv: FnNodalDeriv,
    },

    /// Diffusion term `k ∇u·∇v` integrated exactly over each cell
    Diffusion {
        /// Component of the test function
        test: usize,

        /// Component of the diffusing field
        trial: usize,

        /// Volume id restricting the integration (None means the whole domain)
        volume: Option<usize>,

        /// Coefficient of each cell
        coefficient: FnCell,
    },
}

/// Holds a residual form made of a sum of terms
///
/// The unknowns of a problem with `ncomp` components are numbered as `eq = p · ncomp + comp`.
pub struct Form {
    pub terms: Vec<Term>,
}

impl Form {
    /// Allocates an empty form (zero residual)
    pub fn new() -> Self {
        Form { terms: Vec::new() }
    }

    /// Allocates a form with a single nodal term
    pub fn nodal<F, G>(test: usize, volume: Option<usize>, deps: Vec<usize>, value: F, deriv: G) -> Self
    where
        F: Fn(&NodeArgs) -> f64 + 'static,
        G: Fn(&NodeArgs, usize) -> f64 + 'static,
    {
        Form {
            terms: vec![Term::Nodal {
                test,
                volume,
                deps,
                value: Box::new(value),
                deriv: Box::new(deriv),
            }],
        }
    }

    /// Allocates a form with a single diffusion term
    pub fn diffusion<F>(test: usize, trial: usize, volume: Option<usize>, coefficient: F) -> Self
    where
        F: Fn(CellId) -> f64 + 'static,
    {
        Form {
            terms: vec![Term::Diffusion {
                test,
                trial,
                volume,
                coefficient: Box::new(coefficient),
            }],
        }
    }

    /// Returns true if the form has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the flags indicating the equations touched by at least one term
    ///
    /// (neq = npoint · ncomp)
    pub fn active_equations(&self, dx: &VolumeMeasure, ncomp: usize) -> Vec<bool> {
        let mut active = vec![false; dx.space.npoint() * ncomp];
        for term in &self.terms {
            let (test, volume) = match term {
                Term::Nodal { test, volume, .. } => (*test, *volume),
                Term::Diffusion { test, volume, .. } => (*test, *volume),
            };
            for cell in &dx.space.mesh.cells {
                if dx.contains(cell.id, volume) {
                    active[cell.points[0] * ncomp + test] = true;
                    active[cell.points[1] * ncomp + test] = true;
                }
            }
        }
        active
    }

    /// Returns the supremum of the number of non-zero values added to the Jacobian matrix
    pub fn nnz_sup(&self, dx: &VolumeMeasure) -> usize {
        self.terms.iter().fold(0, |acc, term| match term {
            Term::Nodal { volume, deps, .. } => {
                let n = dx.lumped_weights(*volume).iter().filter(|w| **w > 0.0).count();
                acc + n * deps.len()
            }
            Term::Diffusion { volume, .. } => {
                let n = dx.space.mesh.cells.iter().filter(|c| dx.contains(c.id, *volume)).count();
                acc + 4 * n
            }
        })
    }

    /// Assembles the residual vector
    ///
    /// The entries corresponding to the `fixed` equations are set to zero.
    pub fn assemble_residual(
        &self,
        dx: &VolumeMeasure,
        ncomp: usize,
        uu: &Vector,
        uu_prev: &Vector,
        rr: &mut Vector,
        fixed: &[bool],
    ) {
        rr.fill(0.0);
        let (u, u_prev) = (uu.as_data(), uu_prev.as_data());
        for term in &self.terms {
            match term {
                Term::Nodal {
                    test, volume, value, ..
                } => {
                    let weights = dx.lumped_weights(*volume);
                    for (p, w) in weights.iter().enumerate() {
                        if *w <= 0.0 {
                            continue;
                        }
                        let eq = p * ncomp + test;
                        if fixed[eq] {
                            continue;
                        }
                        let args = node_args(dx, ncomp, p, u, u_prev);
                        rr[eq] += w * value(&args);
                    }
                }
                Term::Diffusion {
                    test,
                    trial,
                    volume,
                    coefficient,
                } => {
                    for cell in &dx.space.mesh.cells {
                        if !dx.contains(cell.id, *volume) {
                            continue;
                        }
                        let (a, b) = (cell.points[0], cell.points[1]);
                        let c = coefficient(cell.id) / dx.space.cell_lengths[cell.id];
                        let flow = c * (u[a * ncomp + trial] - u[b * ncomp + trial]);
                        let (ea, eb) = (a * ncomp + test, b * ncomp + test);
                        if !fixed[ea] {
                            rr[ea] += flow;
                        }
                        if !fixed[eb] {
                            rr[eb] -= flow;
                        }
                    }
                }
            }
        }
    }

    /// Assembles the Jacobian matrix (derivative of the residual with respect to the unknowns)
    ///
    /// The rows and columns corresponding to the `fixed` equations are skipped.
    /// The COO matrix must be reset before calling this function.
    pub fn assemble_jacobian(
        &self,
        dx: &VolumeMeasure,
        ncomp: usize,
        uu: &Vector,
        uu_prev: &Vector,
        kk: &mut CooMatrix,
        fixed: &[bool],
    ) -> Result<(), StrError> {
        let (u, u_prev) = (uu.as_data(), uu_prev.as_data());
        for term in &self.terms {
            match term {
                Term::Nodal {
                    test,
                    volume,
                    deps,
                    deriv,
                    ..
                } => {
                    let weights = dx.lumped_weights(*volume);
                    for (p, w) in weights.iter().enumerate() {
                        if *w <= 0.0 {
                            continue;
                        }
                        let eq = p * ncomp + test;
                        if fixed[eq] {
                            continue;
                        }
                        let args = node_args(dx, ncomp, p, u, u_prev);
                        for comp in deps {
                            let col = p * ncomp + comp;
                            if !fixed[col] {
                                kk.put(eq, col, w * deriv(&args, *comp))?;
                            }
                        }
                    }
                }
                Term::Diffusion {
                    test,
                    trial,
                    volume,
                    coefficient,
                } => {
                    for cell in &dx.space.mesh.cells {
                        if !dx.contains(cell.id, *volume) {
                            continue;
                        }
                        let (a, b) = (cell.points[0], cell.points[1]);
                        let c = coefficient(cell.id) / dx.space.cell_lengths[cell.id];
                        let rows = [a * ncomp + test, b * ncomp + test];
                        let cols = [a * ncomp + trial, b * ncomp + trial];
                        #[rustfmt::skip]
                        let kk_local = [
                            [ c, -c],
                            [-c,  c],
                        ];
                        for l in 0..2 {
                            if fixed[rows[l]] {
                                continue;
                            }
                            for ll in 0..2 {
                                if !fixed[cols[ll]] {
                                    kk.put(rows[l], cols[ll], kk_local[l][ll])?;
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Add for Form {
    type Output = Form;
    fn add(mut self, other: Form) -> Form {
        self.terms.extend(other.terms);
        self
    }
}

impl AddAssign for Form {
    fn add_assign(&mut self, other: Form) {
        self.terms.extend(other.terms);
    }
}

/// Returns the arguments of a nodal term at point p
#[inline]
fn node_args<'a>(dx: &'a VolumeMeasure, ncomp: usize, p: PointId, u: &'a [f64], u_prev: &'a [f64]) -> NodeArgs<'a> {
    let range = (p * ncomp)..((p + 1) * ncomp);
    NodeArgs {
        point: p,
        x: dx.space.coords(p),
        u: &u[range.clone()],
        u_prev: &u_prev[range],
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Form;
    use crate::base::ParamMesh;
    use crate::fem::{FunctionSpace, VolumeMeasure};
    use russell_lab::{approx_eq, Vector};
    use russell_sparse::{CooMatrix, Sym};
    use std::rc::Rc;

    fn measure() -> VolumeMeasure {
        //   0-----1-----2    L = 0.5 each
        //     (1)   (2)
        let mut p = ParamMesh::uniform(2, 1.0);
        p.volume(1, 0.0, 0.5).volume(2, 0.5, 1.0);
        VolumeMeasure::new(&Rc::new(FunctionSpace::new(p.generate().unwrap()).unwrap()))
    }

    #[test]
    fn add_and_active_equations_work() {
        let dx = measure();
        let mut form = Form::new();
        assert!(form.is_empty());
        form += Form::nodal(1, Some(2), vec![0, 1], |a| a.u[1], |_, _| 1.0);
        let form = form + Form::diffusion(0, 0, Some(1), |_| 1.0);
        assert_eq!(form.terms.len(), 2);
        // ncomp = 2 → eq = 2 p + comp
        let active = form.active_equations(&dx, 2);
        assert_eq!(active, &[true, false, true, true, false, true]);
        assert_eq!(form.nnz_sup(&dx), 2 * 2 + 4);
    }

    #[test]
    fn assemble_residual_works() {
        let dx = measure();
        // R = ∫ (u − 1) v dx + ∫ 2 ∇u·∇v dx
        let form = Form::nodal(0, None, vec![0], |a| a.u[0] - 1.0, |_, _| 1.0) + Form::diffusion(0, 0, None, |_| 2.0);
        let uu = Vector::from(&[1.0, 2.0, 4.0]);
        let uu_prev = Vector::new(3);
        let mut rr = Vector::new(3);
        let fixed = vec![false; 3];
        form.assemble_residual(&dx, 1, &uu, &uu_prev, &mut rr, &fixed);
        // nodal: w = [0.25, 0.5, 0.25] → [0.0, 0.5, 0.75]
        // diffusion: k/L = 4 → cell 0: 4·(1−2) = −4 → [−4, 4, 0]; cell 1: 4·(2−4) = −8 → [0, −8, 8]
        approx_eq(rr[0], -4.0, 1e-15);
        approx_eq(rr[1], 0.5 + 4.0 - 8.0, 1e-15);
        approx_eq(rr[2], 0.75 + 8.0, 1e-15);

        let fixed = vec![true, false, false];
        form.assemble_residual(&dx, 1, &uu, &uu_prev, &mut rr, &fixed);
        assert_eq!(rr[0], 0.0);
    }

    #[test]
    fn assemble_jacobian_works() {
        let dx = measure();
        let form = Form::nodal(0, None, vec![0], |a| a.u[0] * a.u[0], |a, _| 2.0 * a.u[0])
            + Form::diffusion(0, 0, None, |_| 2.0);
        let uu = Vector::from(&[1.0, 2.0, 3.0]);
        let uu_prev = Vector::new(3);
        let fixed = vec![false, false, true];
        let mut kk = CooMatrix::new(3, 3, form.nnz_sup(&dx), Sym::No).unwrap();
        form.assemble_jacobian(&dx, 1, &uu, &uu_prev, &mut kk, &fixed).unwrap();
        let mat = kk.as_dense();
        // nodal: diag = w · 2u = [0.5, 2.0, ·]; diffusion: k/L = 4
        approx_eq(mat.get(0, 0), 0.5 + 4.0, 1e-15);
        approx_eq(mat.get(0, 1), -4.0, 1e-15);
        approx_eq(mat.get(1, 0), -4.0, 1e-15);
        approx_eq(mat.get(1, 1), 2.0 + 8.0, 1e-15);
        assert_eq!(mat.get(1, 2), 0.0);
        assert_eq!(mat.get(2, 1), 0.0);
        assert_eq!(mat.get(2, 2), 0.0);
    }
}

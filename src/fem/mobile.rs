use super::{Form, FunctionSpace, MaterialProperties, Stepsize, TrapCollection, VolumeMeasure};
use crate::base::{Expression, ParamDirichlet, ParamSource, TimeExpression};
use crate::StrError;
use gemlab::mesh::PointId;
use russell_lab::Vector;
use std::rc::Rc;

/// Holds the mobile concentration equation (component 0 of the mixed solution)
///
/// ```text
/// ∫ (c_m − c_m,n)/Δt v dx + ∫ D ∇c_m·∇v dx + Σ_traps ∫ (c_t − c_t,n)/Δt v dx − Σ_src ∫ f v dx(src)
/// ```
pub struct Mobile {
    /// Volumetric sources
    pub sources: Vec<ParamSource>,

    /// Prescribed concentrations on surfaces
    pub boundary_conditions: Vec<ParamDirichlet>,

    /// Holds the residual form (set by `create_form`)
    pub form: Option<Form>,

    /// Holds the time-dependent expressions of the sources and boundary conditions
    pub sub_expressions: Vec<Rc<TimeExpression>>,

    /// Holds the points and the values of the boundary conditions (set by `create_dirichlet`)
    dirichlet: Vec<(Vec<PointId>, Expression)>,
}

impl Mobile {
    /// Component of the mobile concentration in the mixed solution
    pub const COMPONENT: usize = 0;

    /// Allocates a new instance
    pub fn new(sources: Vec<ParamSource>, boundary_conditions: Vec<ParamDirichlet>) -> Self {
        Mobile {
            sources,
            boundary_conditions,
            form: None,
            sub_expressions: Vec::new(),
            dirichlet: Vec::new(),
        }
    }

    /// Creates the residual form
    ///
    /// `dt` is None for steady-state problems.
    pub fn create_form(
        &mut self,
        props: &MaterialProperties,
        traps: &TrapCollection,
        dx: &VolumeMeasure,
        dt: Option<&Stepsize>,
    ) -> Result<(), StrError> {
        let cm = Mobile::COMPONENT;
        let mut form = Form::new();
        if let Some(dt) = dt {
            let (dtv, dtv_d) = (dt.value.clone(), dt.value.clone());
            form += Form::nodal(
                cm,
                None,
                vec![cm],
                move |a| (a.u[cm] - a.u_prev[cm]) / dtv.get(),
                move |_, _| 1.0 / dtv_d.get(),
            );
        }

        let d = props.d.clone();
        form += Form::diffusion(cm, cm, None, move |c| d.borrow()[c]);

        if let Some(dt) = dt {
            for trap in traps {
                let ct = trap.component;
                let (dtv, dtv_d) = (dt.value.clone(), dt.value.clone());
                form += Form::nodal(
                    cm,
                    None,
                    vec![ct],
                    move |a| (a.u[ct] - a.u_prev[ct]) / dtv.get(),
                    move |_, _| 1.0 / dtv_d.get(),
                );
            }
        }

        for source in &self.sources {
            if !dx.has_subdomain(source.volume) {
                return Err("cannot find the volume of a source");
            }
            let value = Expression::new(&source.value, &mut self.sub_expressions);
            form += Form::nodal(cm, Some(source.volume), Vec::new(), move |a| -value.eval(a.x), |_, _| 0.0);
        }
        self.form = Some(form);
        Ok(())
    }

    /// Finds the points of the surfaces with prescribed concentrations
    pub fn create_dirichlet(&mut self, space: &FunctionSpace) -> Result<(), StrError> {
        self.dirichlet.clear();
        for bc in &self.boundary_conditions {
            if !space.has_surface(bc.surface) {
                return Err("cannot find the surface of a boundary condition");
            }
            let value = Expression::new(&bc.value, &mut self.sub_expressions);
            self.dirichlet.push((space.surface_points(bc.surface), value));
        }
        Ok(())
    }

    /// Returns the flags indicating the prescribed equations
    pub fn prescribed_equations(&self, npoint: usize, ncomp: usize) -> Vec<bool> {
        let mut prescribed = vec![false; npoint * ncomp];
        for (points, _) in &self.dirichlet {
            for p in points {
                prescribed[p * ncomp + Mobile::COMPONENT] = true;
            }
        }
        prescribed
    }

    /// Sets the prescribed values into the mixed solution
    pub fn apply_dirichlet(&self, space: &FunctionSpace, ncomp: usize, uu: &mut Vector) {
        for (points, value) in &self.dirichlet {
            for p in points {
                uu[p * ncomp + Mobile::COMPONENT] = value.eval(space.coords(*p));
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

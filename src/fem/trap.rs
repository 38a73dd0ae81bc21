use super::{ExtrinsicTrap, Form, Function, Shared, Stepsize, VolumeMeasure};
use crate::base::{Expression, Materials, ParamTrap, TimeExpression, TrapDensity, K_B};
use crate::StrError;
use gemlab::mesh::PointId;
use std::rc::Rc;

/// Holds a trap (chemical trapping site) of the hydrogen transport model
///
/// The trapped concentration c_t evolves as
///
/// ```text
/// ∂c_t/∂t = k₀ exp(−E_k / k_B T) c_m (n − c_t) − p₀ exp(−E_p / k_B T) c_t
/// ```
///
/// where c_m is the mobile concentration and n the density of trapping sites.
pub struct Trap {
    /// Identifier; assigned by the trap collection if None
    pub id: Option<usize>,

    /// Holds the parameters
    pub param: ParamTrap,

    /// Index of the trapped concentration in the mixed solution (the mobile concentration is 0)
    pub component: usize,

    /// Volume ids of the materials where the trap exists (set by `make_materials`)
    pub volumes: Vec<usize>,

    /// Holds the state of the density equation, if the trap is extrinsic
    pub extrinsic: Option<ExtrinsicTrap>,

    /// Holds the residual form of the trap (set by `create_form`)
    pub form: Option<Form>,

    /// Holds the time-dependent expressions used by the form
    pub sub_expressions: Vec<Rc<TimeExpression>>,
}

/// Evaluates the density of trapping sites
#[derive(Clone)]
enum Density {
    Expression(Rc<Expression>),
    Field(Shared<Function>),
}

impl Density {
    fn eval(&self, point: PointId, x: &[f64]) -> f64 {
        match self {
            Density::Expression(e) => e.eval(x),
            Density::Field(f) => f.borrow().values[point],
        }
    }
}

impl Trap {
    /// Allocates a new instance
    pub fn new(param: ParamTrap) -> Result<Self, StrError> {
        if param.materials.is_empty() {
            return Err("a trap must cite at least one material");
        }
        let extrinsic = match &param.density {
            TrapDensity::Intrinsic(..) => None,
            TrapDensity::Extrinsic(p) => Some(ExtrinsicTrap::new(p.clone())?),
        };
        Ok(Trap {
            id: param.id,
            param,
            component: 0,
            volumes: Vec::new(),
            extrinsic,
            form: None,
            sub_expressions: Vec::new(),
        })
    }

    /// Returns the label of the trapped concentration (the id as a string)
    pub fn label(&self) -> String {
        match self.id {
            Some(id) => format!("{}", id),
            None => String::new(),
        }
    }

    /// Returns true if the density of trapping sites has its own evolution equation
    pub fn is_extrinsic(&self) -> bool {
        self.extrinsic.is_some()
    }

    /// Finds the volume ids of the materials cited by the trap
    pub fn make_materials(&mut self, materials: &Materials) -> Result<(), StrError> {
        let mut volumes = Vec::with_capacity(self.param.materials.len());
        for name in &self.param.materials {
            let material = materials
                .find_by_name(name)
                .ok_or("cannot find material cited by trap")?;
            volumes.push(material.id);
        }
        self.volumes = volumes;
        Ok(())
    }

    /// Creates the residual form of the trap
    ///
    /// ```text
    /// ∫ (c_t − c_t,n)/Δt v dx + Σ_mat ∫ [−k c_m (n − c_t) + p c_t] v dx(mat)
    /// ```
    ///
    /// The time-derivative term is absent if `dt` is None (steady state).
    pub fn create_form(
        &mut self,
        mobile: usize,
        temperature: &Shared<Function>,
        dx: &VolumeMeasure,
        dt: Option<&Stepsize>,
    ) -> Result<(), StrError> {
        if self.component == 0 || self.component == mobile {
            return Err("the component of the trap must be set by the trap collection");
        }
        if self.volumes.is_empty() {
            return Err("the materials of the trap must be bound first");
        }
        for id in &self.volumes {
            if !dx.has_subdomain(*id) {
                return Err("cannot find the volume of a material cited by trap");
            }
        }
        self.sub_expressions.clear();
        let density = match (&self.param.density, &self.extrinsic) {
            (TrapDensity::Intrinsic(c), _) => {
                Density::Expression(Rc::new(Expression::new(c, &mut self.sub_expressions)))
            }
            (TrapDensity::Extrinsic(..), Some(ext)) => match &ext.density {
                Some(field) => Density::Field(field.clone()),
                None => return Err("the density of the extrinsic trap must be initialized first"),
            },
            (TrapDensity::Extrinsic(..), None) => return Err("the extrinsic state of the trap is missing"),
        };

        let ct = self.component;
        let mut form = Form::new();
        if let Some(dt) = dt {
            let (dtv, dtv_d) = (dt.value.clone(), dt.value.clone());
            form += Form::nodal(
                ct,
                None,
                vec![ct],
                move |a| (a.u[ct] - a.u_prev[ct]) / dtv.get(),
                move |_, _| 1.0 / dtv_d.get(),
            );
        }

        let (k_0, e_k, p_0, e_p) = (self.param.k_0, self.param.e_k, self.param.p_0, self.param.e_p);
        let rates = move |temp: f64| {
            let k = k_0 * f64::exp(-e_k / (K_B * temp));
            let p = p_0 * f64::exp(-e_p / (K_B * temp));
            (k, p)
        };
        for volume in &self.volumes {
            let (temp, temp_d) = (temperature.clone(), temperature.clone());
            let (n, n_d) = (density.clone(), density.clone());
            form += Form::nodal(
                ct,
                Some(*volume),
                vec![mobile, ct],
                move |a| {
                    let (k, p) = rates(temp.borrow().values[a.point]);
                    -k * a.u[mobile] * (n.eval(a.point, a.x) - a.u[ct]) + p * a.u[ct]
                },
                move |a, comp| {
                    let (k, p) = rates(temp_d.borrow().values[a.point]);
                    if comp == mobile {
                        -k * (n_d.eval(a.point, a.x) - a.u[ct])
                    } else if comp == ct {
                        k * a.u[mobile] + p
                    } else {
                        0.0
                    }
                },
            );
        }
        self.form = Some(form);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

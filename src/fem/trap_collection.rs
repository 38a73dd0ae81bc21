use super::{Form, Function, FunctionSpace, Shared, Stepsize, Trap, VolumeMeasure};
use crate::base::{Materials, TimeExpression};
use crate::StrError;
use std::ops::Index;
use std::rc::Rc;

/// Holds an ordered collection of traps
///
/// The collection aggregates the residual forms of the traps and drives the
/// solution of the density equations of the extrinsic traps.
pub struct TrapCollection {
    /// Holds the traps in insertion order
    traps: Vec<Trap>,

    /// Holds the sum of the residual forms of all traps (available after `build_forms`)
    pub form: Option<Form>,

    /// Holds the number of extrinsic density forms (set by `build_extrinsic_forms`)
    pub n_extrinsic_forms: usize,

    /// Holds the time-dependent expressions of the trap forms (set by `build_forms`)
    pub sub_expressions: Vec<Rc<TimeExpression>>,

    /// Holds the time-dependent expressions of the density forms (set by `build_extrinsic_forms`)
    extrinsic_sub_expressions: Vec<Rc<TimeExpression>>,
}

impl TrapCollection {
    /// Allocates a new instance
    ///
    /// The traps without id receive 1, 2, 3, ... in insertion order; the other ids are kept.
    /// The component of each trap in the mixed solution is its position plus one.
    pub fn new(traps: Vec<Trap>) -> Self {
        let mut traps = traps;
        let mut next_id = 1;
        for (i, trap) in traps.iter_mut().enumerate() {
            if trap.id.is_none() {
                trap.id = Some(next_id);
                next_id += 1;
            }
            trap.component = i + 1;
        }
        TrapCollection {
            traps,
            form: None,
            n_extrinsic_forms: 0,
            sub_expressions: Vec::new(),
            extrinsic_sub_expressions: Vec::new(),
        }
    }

    /// Returns the number of traps
    pub fn len(&self) -> usize {
        self.traps.len()
    }

    /// Returns true if there are no traps
    pub fn is_empty(&self) -> bool {
        self.traps.is_empty()
    }

    /// Returns an iterator over the traps
    pub fn iter(&self) -> std::slice::Iter<'_, Trap> {
        self.traps.iter()
    }

    /// Returns the ids of the traps
    pub fn ids(&self) -> Vec<usize> {
        self.traps.iter().map(|t| t.id.unwrap_or(0)).collect()
    }

    /// Finds a trap by id
    pub fn get_trap(&self, id: usize) -> Result<&Trap, StrError> {
        self.traps
            .iter()
            .find(|t| t.id == Some(id))
            .ok_or("cannot find trap with the given id")
    }

    /// Finds the volume ids of the materials cited by each trap
    pub fn bind_materials(&mut self, materials: &Materials) -> Result<(), StrError> {
        for trap in &mut self.traps {
            trap.make_materials(materials)?;
        }
        Ok(())
    }

    /// Builds the residual forms of all traps and their sum
    ///
    /// `dt` is None for steady-state problems.
    pub fn build_forms(
        &mut self,
        mobile: usize,
        materials: &Materials,
        temperature: &Shared<Function>,
        dx: &VolumeMeasure,
        dt: Option<&Stepsize>,
    ) -> Result<(), StrError> {
        self.bind_materials(materials)?;
        self.form = None;
        self.sub_expressions.clear();
        let mut total = Form::new();
        for trap in &mut self.traps {
            trap.create_form(mobile, temperature, dx, dt)?;
            if let Some(form) = trap.form.take() {
                total += form;
            }
            self.sub_expressions.extend(trap.sub_expressions.iter().cloned());
        }
        self.form = Some(total);
        Ok(())
    }

    /// Allocates the density fields of the extrinsic traps (with zero previous values)
    pub fn initialize_extrinsic_state(&mut self, space: &FunctionSpace) {
        for trap in &mut self.traps {
            let name = format!("n{}", trap.label());
            if let Some(ext) = trap.extrinsic.as_mut() {
                ext.initialize(space, &name);
            }
        }
    }

    /// Builds the residual forms of the density equations of the extrinsic traps
    pub fn build_extrinsic_forms(
        &mut self,
        dx: &VolumeMeasure,
        dt: &Stepsize,
        temperature: &Shared<Function>,
    ) -> Result<(), StrError> {
        self.n_extrinsic_forms = 0;
        self.extrinsic_sub_expressions.clear();
        for trap in &mut self.traps {
            if let Some(ext) = trap.extrinsic.as_mut() {
                ext.create_form_density(dx, dt, temperature, &mut self.extrinsic_sub_expressions)?;
                self.n_extrinsic_forms += 1;
            }
        }
        Ok(())
    }

    /// Solves the density equations of the extrinsic traps for the current time step
    ///
    /// Non-convergence of any density equation is an error.
    pub fn solve_extrinsic_step(&mut self) -> Result<(), StrError> {
        for trap in &mut self.traps {
            if let Some(ext) = trap.extrinsic.as_mut() {
                ext.solve()?;
            }
        }
        Ok(())
    }

    /// Copies the solved densities into the previous densities
    pub fn commit_extrinsic_step(&mut self) {
        for trap in &mut self.traps {
            if let Some(ext) = trap.extrinsic.as_mut() {
                ext.commit();
            }
        }
    }

    /// Restores the densities from the previous densities
    pub fn restore_extrinsic_step(&mut self) {
        for trap in &mut self.traps {
            if let Some(ext) = trap.extrinsic.as_mut() {
                ext.restore();
            }
        }
    }

    /// Sets the time of all time-dependent expressions
    pub fn update_sub_expressions(&self, t: f64) {
        for expr in self.sub_expressions.iter().chain(&self.extrinsic_sub_expressions) {
            expr.update(t);
        }
    }
}

impl Index<usize> for TrapCollection {
    type Output = Trap;
    fn index(&self, index: usize) -> &Self::Output {
        &self.traps[index]
    }
}

impl<'a> IntoIterator for &'a TrapCollection {
    type Item = &'a Trap;
    type IntoIter = std::slice::Iter<'a, Trap>;
    fn into_iter(self) -> Self::IntoIter {
        self.traps.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::TrapCollection;
    use crate::base::{Coefficient, ExtrinsicKinetics, Material, Materials, ParamMesh, ParamStepsize, ParamTrap, TrapDensity};
    use crate::fem::{shared, Function, FunctionSpace, Stepsize, Trap, VolumeMeasure};
    use russell_lab::approx_eq;
    use std::rc::Rc;

    fn trap(materials: &[&str]) -> Trap {
        Trap::new(ParamTrap::new(1.0, 0.0, 1.0, 0.0, materials, 1.0)).unwrap()
    }

    fn extrinsic_trap() -> Trap {
        let kinetics = ExtrinsicKinetics::NeutronInduced {
            phi: Coefficient::Function(|_, t| if t <= 1.0 { 1.0 } else { 0.0 }),
            k: 2.0,
            n_max: 10.0,
            a_0: 0.0,
            e_a: 0.0,
        };
        let mut param = ParamTrap::new_extrinsic(1.0, 0.0, 1.0, 0.0, &["w"], kinetics);
        if let TrapDensity::Extrinsic(p) = &mut param.density {
            p.absolute_tolerance = 1e-12;
        }
        Trap::new(param).unwrap()
    }

    #[test]
    fn new_assigns_ids_and_components() {
        let with_id = Trap::new(ParamTrap::new(1.0, 0.0, 1.0, 0.0, &["w"], 1.0).with_id(5)).unwrap();
        let traps = TrapCollection::new(vec![trap(&["w"]), with_id, trap(&["w"])]);
        assert_eq!(traps.ids(), &[1, 5, 2]);
        assert_eq!(traps.len(), 3);
        assert!(!traps.is_empty());
        let components: Vec<_> = traps.iter().map(|t| t.component).collect();
        assert_eq!(components, &[1, 2, 3]);
        assert_eq!(traps[1].id, Some(5));
        assert_eq!(traps.get_trap(5).unwrap().component, 2);
        assert_eq!(traps.get_trap(3).err(), Some("cannot find trap with the given id"));
        assert!(TrapCollection::new(Vec::new()).is_empty());
    }

    #[test]
    fn bind_materials_works() {
        let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0)]).unwrap();
        let mut traps = TrapCollection::new(vec![trap(&["w"])]);
        traps.bind_materials(&materials).unwrap();
        assert_eq!(traps[0].volumes, &[1]);
        let mut traps = TrapCollection::new(vec![trap(&["w"]), trap(&["cu"])]);
        assert_eq!(
            traps.bind_materials(&materials).err(),
            Some("cannot find material cited by trap")
        );
    }

    #[test]
    fn build_forms_and_extrinsic_step_work() {
        let mesh = ParamMesh::uniform(2, 1.0).generate().unwrap();
        let space = Rc::new(FunctionSpace::new(mesh).unwrap());
        let dx = VolumeMeasure::new(&space);
        let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0)]).unwrap();
        let temperature = shared(Function::constant("T", 3, 300.0));
        let dt = Stepsize::new(ParamStepsize::new(0.5));

        let mut traps = TrapCollection::new(vec![trap(&["w"]), extrinsic_trap()]);
        assert!(traps.form.is_none());
        assert_eq!(
            traps.build_forms(0, &materials, &temperature, &dx, Some(&dt)).err(),
            Some("the density of the extrinsic trap must be initialized first")
        );

        traps.initialize_extrinsic_state(&space);
        traps.build_forms(0, &materials, &temperature, &dx, Some(&dt)).unwrap();
        // two traps with (time derivative + trapping) terms each
        assert_eq!(traps.form.as_ref().unwrap().terms.len(), 4);
        assert_eq!(traps.sub_expressions.len(), 0);

        traps.build_extrinsic_forms(&dx, &dt, &temperature).unwrap();
        assert_eq!(traps.n_extrinsic_forms, 1);
        assert_eq!(traps.extrinsic_sub_expressions.len(), 1);

        // rebuilding replaces the previous expressions
        traps.build_extrinsic_forms(&dx, &dt, &temperature).unwrap();
        assert_eq!(traps.extrinsic_sub_expressions.len(), 1);

        // n₁ = (n₀ + Δt φK) / (1 + Δt φK / n_max)
        traps.update_sub_expressions(0.5);
        traps.solve_extrinsic_step().unwrap();
        traps.commit_extrinsic_step();
        let n1 = (0.0 + 0.5 * 2.0) / (1.0 + 0.5 * 2.0 / 10.0);
        let density = traps[1].extrinsic.as_ref().unwrap().density.as_ref().unwrap().clone();
        approx_eq(density.borrow().values[1], n1, 1e-12);

        traps.update_sub_expressions(1.0);
        traps.solve_extrinsic_step().unwrap();
        let n2 = (n1 + 0.5 * 2.0) / (1.0 + 0.5 * 2.0 / 10.0);
        approx_eq(density.borrow().values[1], n2, 1e-12);
        traps.restore_extrinsic_step();
        approx_eq(density.borrow().values[1], n1, 1e-12);

        // no more irradiation
        traps.update_sub_expressions(1.5);
        traps.solve_extrinsic_step().unwrap();
        approx_eq(density.borrow().values[1], n1, 1e-12);
    }

    #[test]
    fn build_forms_replaces_the_expressions() {
        let mesh = ParamMesh::uniform(2, 1.0).generate().unwrap();
        let space = Rc::new(FunctionSpace::new(mesh).unwrap());
        let dx = VolumeMeasure::new(&space);
        let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0)]).unwrap();
        let temperature = shared(Function::constant("T", 3, 300.0));
        let mut param = ParamTrap::new(1.0, 0.0, 1.0, 0.0, &["w"], 1.0);
        param.density = TrapDensity::Intrinsic(Coefficient::Function(|_, t| 1.0 + t));
        let mut traps = TrapCollection::new(vec![Trap::new(param).unwrap(), trap(&["w"])]);
        traps.build_forms(0, &materials, &temperature, &dx, None).unwrap();
        assert_eq!(traps.sub_expressions.len(), 1);
        traps.build_forms(0, &materials, &temperature, &dx, None).unwrap();
        assert_eq!(traps.sub_expressions.len(), 1);
        assert!(Rc::ptr_eq(&traps.sub_expressions[0], &traps[0].sub_expressions[0]));
    }

    #[test]
    fn solve_extrinsic_step_honours_the_iteration_cap() {
        let mesh = ParamMesh::uniform(2, 1.0).generate().unwrap();
        let space = Rc::new(FunctionSpace::new(mesh).unwrap());
        let dx = VolumeMeasure::new(&space);
        let temperature = shared(Function::constant("T", 3, 300.0));
        let dt = Stepsize::new(ParamStepsize::new(0.5));

        // the density equation is linear: one update suffices
        let mut trap = extrinsic_trap();
        if let Some(ext) = trap.extrinsic.as_mut() {
            ext.param.maximum_iterations = 1;
        }
        let mut traps = TrapCollection::new(vec![trap]);
        traps.initialize_extrinsic_state(&space);
        traps.build_extrinsic_forms(&dx, &dt, &temperature).unwrap();
        traps.update_sub_expressions(0.5);
        traps.solve_extrinsic_step().unwrap();
        let density = traps[0].extrinsic.as_ref().unwrap().density.as_ref().unwrap().clone();
        approx_eq(density.borrow().values[0], 1.0 / 1.1, 1e-12);

        // invalid flux
        let kinetics = ExtrinsicKinetics::NeutronInduced {
            phi: Coefficient::Function(|_, _| f64::NAN),
            k: 2.0,
            n_max: 10.0,
            a_0: 0.0,
            e_a: 0.0,
        };
        let param = ParamTrap::new_extrinsic(1.0, 0.0, 1.0, 0.0, &["w"], kinetics);
        let mut traps = TrapCollection::new(vec![Trap::new(param).unwrap()]);
        traps.initialize_extrinsic_state(&space);
        traps.build_extrinsic_forms(&dx, &dt, &temperature).unwrap();
        traps.update_sub_expressions(0.5);
        assert_eq!(
            traps.solve_extrinsic_step().err(),
            Some("found NaN or Inf in the residual vector")
        );
    }
}

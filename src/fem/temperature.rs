use super::{shared, Function, FunctionSpace, Shared};
use crate::base::ParamTemperature;
use crate::StrError;
use std::rc::Rc;

/// Holds the temperature field
///
/// The field is prescribed (not solved for) and updated at the beginning of each time step.
pub struct Temperature {
    /// Holds the definition of the temperature
    pub param: ParamTemperature,

    /// Holds the nodal values shared with the forms and the derived quantities
    pub field: Shared<Function>,

    /// Holds the function space
    space: Rc<FunctionSpace>,
}

impl Temperature {
    /// Allocates a new instance with the temperature at time t
    pub fn new(param: ParamTemperature, space: &Rc<FunctionSpace>, t: f64) -> Result<Self, StrError> {
        let temperature = Temperature {
            param,
            field: shared(Function::new("T", space.npoint())),
            space: space.clone(),
        };
        temperature.update(t)?;
        Ok(temperature)
    }

    /// Updates the nodal values at time t
    pub fn update(&self, t: f64) -> Result<(), StrError> {
        let param = self.param;
        let mut field = self.field.borrow_mut();
        field.interpolate(&self.space, |x| param.value(x, t))?;
        if field.values.as_data().iter().any(|v| *v <= 0.0) {
            return Err("temperature must be > 0.0");
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Temperature;
    use crate::base::{ParamMesh, ParamTemperature};
    use crate::fem::FunctionSpace;
    use std::rc::Rc;

    #[test]
    fn new_and_update_work() {
        let mesh = ParamMesh::uniform(2, 1.0).generate().unwrap();
        let space = Rc::new(FunctionSpace::new(mesh).unwrap());
        let temp = Temperature::new(ParamTemperature::Ramp { t_0: 300.0, rate: 10.0 }, &space, 1.0).unwrap();
        assert_eq!(temp.field.borrow().values.as_data(), &[310.0, 310.0, 310.0]);
        temp.update(2.0).unwrap();
        assert_eq!(temp.field.borrow().values.as_data(), &[320.0, 320.0, 320.0]);

        let temp = Temperature::new(ParamTemperature::Function(|x, _| 300.0 + 100.0 * x[0]), &space, 0.0).unwrap();
        assert_eq!(temp.field.borrow().values.as_data(), &[300.0, 350.0, 400.0]);
        assert_eq!(temp.field.borrow().name, "T");

        assert_eq!(
            Temperature::new(ParamTemperature::Constant(0.0), &space, 0.0).err(),
            Some("temperature must be > 0.0")
        );
    }
}

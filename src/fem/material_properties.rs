use super::{shared, Function, FunctionSpace, Shared};
use crate::base::{Material, Materials};
use crate::StrError;
use russell_lab::Vector;

/// Holds the cell-wise properties of the materials
///
/// The properties are evaluated with the mean temperature of each cell and shared with
/// the forms and the derived quantities. Missing thermal data are taken as zero.
pub struct MaterialProperties {
    /// Holds the materials
    pub materials: Materials,

    /// Holds the material of each cell
    ///
    /// (ncell)
    pub cell_materials: Vec<Material>,

    /// Diffusion coefficient D (ncell)
    pub d: Shared<Vector>,

    /// Solubility S (ncell)
    pub s: Shared<Vector>,

    /// Heat of transport Q (ncell)
    pub q: Shared<Vector>,

    /// Thermal conductivity λ (ncell)
    pub thermal_cond: Shared<Vector>,
}

impl MaterialProperties {
    /// Allocates a new instance
    ///
    /// Each cell attribute must match the id of a material.
    pub fn new(materials: &Materials, space: &FunctionSpace) -> Result<Self, StrError> {
        let mut cell_materials = Vec::with_capacity(space.ncell());
        for cell in &space.mesh.cells {
            let material = materials
                .find_by_id(cell.attribute)
                .ok_or("cannot find material for cell attribute")?;
            cell_materials.push(material.clone());
        }
        let ncell = space.ncell();
        let q: Vec<_> = cell_materials.iter().map(|m| m.heat_of_transport.unwrap_or(0.0)).collect();
        let thermal_cond: Vec<_> = cell_materials.iter().map(|m| m.thermal_cond.unwrap_or(0.0)).collect();
        Ok(MaterialProperties {
            materials: materials.clone(),
            cell_materials,
            d: shared(Vector::new(ncell)),
            s: shared(Vector::new(ncell)),
            q: shared(Vector::from(&q)),
            thermal_cond: shared(Vector::from(&thermal_cond)),
        })
    }

    /// Updates the temperature-dependent properties
    pub fn update(&self, temperature: &Function, space: &FunctionSpace) {
        let mut d = self.d.borrow_mut();
        let mut s = self.s.borrow_mut();
        for cell in &space.mesh.cells {
            let t_mean = (temperature.values[cell.points[0]] + temperature.values[cell.points[1]]) / 2.0;
            let material = &self.cell_materials[cell.id];
            d[cell.id] = material.diffusion_coefficient(t_mean);
            s[cell.id] = material.solubility(t_mean);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::MaterialProperties;
    use crate::base::{Material, Materials, ParamMesh, K_B};
    use crate::fem::{Function, FunctionSpace};
    use russell_lab::approx_eq;

    fn space() -> FunctionSpace {
        let mut p = ParamMesh::uniform(2, 2.0);
        p.volume(1, 0.0, 1.0).volume(2, 1.0, 2.0);
        FunctionSpace::new(p.generate().unwrap()).unwrap()
    }

    #[test]
    fn new_captures_errors() {
        let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0)]).unwrap();
        assert_eq!(
            MaterialProperties::new(&materials, &space()).err(),
            Some("cannot find material for cell attribute")
        );
    }

    #[test]
    fn update_works() {
        let space = space();
        let mut cu = Material::new(2, "cu", 2.0, 0.5);
        cu.thermal_cond = Some(350.0);
        cu.heat_of_transport = Some(-0.1);
        let materials = Materials::new(vec![Material::new(1, "w", 1.0, 0.0), cu]).unwrap();
        let props = MaterialProperties::new(&materials, &space).unwrap();
        assert_eq!(props.q.borrow().as_data(), &[0.0, -0.1]);
        assert_eq!(props.thermal_cond.borrow().as_data(), &[0.0, 350.0]);

        // temperature: 300, 400, 600 → cell means 350 and 500
        let mut temperature = Function::new("T", 3);
        temperature.values[0] = 300.0;
        temperature.values[1] = 400.0;
        temperature.values[2] = 600.0;
        props.update(&temperature, &space);
        approx_eq(props.d.borrow()[0], 1.0, 1e-15);
        approx_eq(props.d.borrow()[1], 2.0 * f64::exp(-0.5 / (K_B * 500.0)), 1e-15);
        approx_eq(props.s.borrow()[1], 1.0, 1e-15);
    }
}

use super::K_B;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Holds the parameters of a material
///
/// The material occupies all cells whose attribute equals `id`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Material {
    /// Volume id (cell attribute) occupied by the material
    pub id: usize,

    /// Name used by traps to cite the material
    pub name: String,

    /// Pre-exponential factor of the diffusion coefficient (m²/s)
    pub d_0: f64,

    /// Activation energy of the diffusion coefficient (eV)
    pub e_d: f64,

    /// Pre-exponential factor of the solubility
    #[serde(default = "default_s_0")]
    pub s_0: f64,

    /// Activation energy of the solubility (eV)
    #[serde(default)]
    pub e_s: f64,

    /// Thermal conductivity (W/m/K)
    #[serde(default)]
    pub thermal_cond: Option<f64>,

    /// Heat of transport (eV) used by the Soret effect
    #[serde(default)]
    pub heat_of_transport: Option<f64>,
}

fn default_s_0() -> f64 {
    1.0
}

impl Material {
    /// Allocates a new instance with unit solubility and no thermal data
    pub fn new(id: usize, name: &str, d_0: f64, e_d: f64) -> Self {
        Material {
            id,
            name: name.to_string(),
            d_0,
            e_d,
            s_0: 1.0,
            e_s: 0.0,
            thermal_cond: None,
            heat_of_transport: None,
        }
    }

    /// Returns the diffusion coefficient D = D₀ exp(−E_D / k_B T)
    pub fn diffusion_coefficient(&self, temperature: f64) -> f64 {
        self.d_0 * f64::exp(-self.e_d / (K_B * temperature))
    }

    /// Returns the solubility S = S₀ exp(−E_S / k_B T)
    pub fn solubility(&self, temperature: f64) -> f64 {
        self.s_0 * f64::exp(-self.e_s / (K_B * temperature))
    }
}

/// Holds a collection of materials with unique ids and names
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Materials {
    all: Vec<Material>,
}

impl Materials {
    /// Allocates a new instance
    pub fn new(all: Vec<Material>) -> Result<Self, StrError> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for material in &all {
            if !ids.insert(material.id) {
                return Err("material ids must be unique");
            }
            if !names.insert(material.name.as_str()) {
                return Err("material names must be unique");
            }
            if material.d_0 < 0.0 {
                return Err("the diffusion coefficient pre-factor must be ≥ 0.0");
            }
        }
        Ok(Materials { all })
    }

    /// Returns the number of materials
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Returns true if there are no materials
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Returns an iterator over the materials
    pub fn iter(&self) -> std::slice::Iter<'_, Material> {
        self.all.iter()
    }

    /// Finds a material by its volume id
    pub fn find_by_id(&self, id: usize) -> Option<&Material> {
        self.all.iter().find(|m| m.id == id)
    }

    /// Finds a material by its name
    pub fn find_by_name(&self, name: &str) -> Option<&Material> {
        self.all.iter().find(|m| m.name == name)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

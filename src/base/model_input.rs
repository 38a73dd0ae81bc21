use super::{Control, Material, ParamDirichlet, ParamExports, ParamInitial, ParamMesh};
use super::{ParamSource, ParamTemperature, ParamTrap};
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds all data defining a hydrogen transport model
///
/// This structure is the contents of the JSON model files.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ModelInput {
    /// Interval mesh with volume and surface subdomains
    pub mesh: ParamMesh,

    /// Materials (one per volume)
    pub materials: Vec<Material>,

    /// Traps (in the order of the trap collection)
    #[serde(default)]
    pub traps: Vec<ParamTrap>,

    /// Temperature field
    pub temperature: ParamTemperature,

    /// Volumetric sources of mobile particles
    #[serde(default)]
    pub sources: Vec<ParamSource>,

    /// Prescribed mobile concentrations
    #[serde(default)]
    pub boundary_conditions: Vec<ParamDirichlet>,

    /// Uniform initial values
    #[serde(default)]
    pub initial_conditions: Vec<ParamInitial>,

    /// Derived quantities
    pub exports: ParamExports,

    /// Time-loop and solver options
    pub control: Control,
}

impl ModelInput {
    /// Reads a JSON file containing this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let file = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(file);
        let input = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(input)
    }

    /// Writes a JSON file with this struct
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use super::{
    ComputeContext, DerivedQuantity, FacetNormal, Function, MaterialProperties, Shared, SurfaceMeasure, VolumeMeasure,
};
use crate::base::{ParamExports, QuantityKind, Region, TIME_COLUMN_TITLE};
use crate::StrError;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Index;
use std::path::Path;

/// Holds the result of [DerivedQuantityCollection::filter]
pub enum Filtered<'a> {
    /// Exactly one quantity matches
    One(&'a DerivedQuantity),

    /// Zero or many quantities match
    Many(Vec<&'a DerivedQuantity>),
}

impl<'a> Filtered<'a> {
    /// Returns the number of matching quantities
    pub fn len(&self) -> usize {
        match self {
            Filtered::One(..) => 1,
            Filtered::Many(all) => all.len(),
        }
    }

    /// Returns true if no quantity matches
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the titles of the matching quantities
    pub fn titles(&self) -> Vec<&'a str> {
        match self {
            Filtered::One(q) => vec![q.title.as_str()],
            Filtered::Many(all) => all.iter().map(|q| q.title.as_str()).collect(),
        }
    }
}

/// Holds an ordered collection of derived quantities and the table of computed values
///
/// The insertion order defines the column order of the table.
pub struct DerivedQuantityCollection {
    /// Holds the quantities
    quantities: Vec<DerivedQuantity>,

    /// Holds the CSV file receiving the table
    pub filename: Option<String>,

    /// Holds the computed rows: [t, value₀, value₁, ...]
    pub data: Vec<Vec<f64>>,

    /// Number of time steps between two computations (≥ 1)
    nb_iterations_between_compute: usize,

    /// Number of time steps between two writings (None means the final time only)
    nb_iterations_between_exports: Option<usize>,

    /// Holds the volume id of each cell (set by `bind_measures`)
    volume_markers: Option<Vec<usize>>,
}

impl DerivedQuantityCollection {
    /// Allocates a new instance
    pub fn new(quantities: Vec<DerivedQuantity>) -> Self {
        DerivedQuantityCollection {
            quantities,
            filename: None,
            data: Vec::new(),
            nb_iterations_between_compute: 1,
            nb_iterations_between_exports: None,
            volume_markers: None,
        }
    }

    /// Allocates a new instance with the CSV filename
    pub fn with_filename(quantities: Vec<DerivedQuantity>, filename: &str) -> Result<Self, StrError> {
        let mut collection = DerivedQuantityCollection::new(quantities);
        collection.set_filename(filename)?;
        Ok(collection)
    }

    /// Allocates a new instance from the exports parameters
    pub fn from_param(param: &ParamExports) -> Result<Self, StrError> {
        let quantities = param
            .quantities
            .iter()
            .map(|p| {
                let q = DerivedQuantity::new(p.kind, &p.field, p.region);
                if p.soret {
                    q.with_soret()
                } else {
                    q
                }
            })
            .collect();
        let mut collection = DerivedQuantityCollection::new(quantities);
        collection.set_frequencies(param.nb_iterations_between_compute, param.nb_iterations_between_exports)?;
        if let Some(filename) = &param.filename {
            collection.set_filename(filename)?;
        }
        Ok(collection)
    }

    /// Sets the number of time steps between two computations and between two writings
    pub fn set_frequencies(&mut self, compute: usize, exports: Option<usize>) -> Result<(), StrError> {
        if compute == 0 {
            return Err("nb_iterations_between_compute must be ≥ 1");
        }
        if exports == Some(0) {
            return Err("nb_iterations_between_exports must be ≥ 1");
        }
        self.nb_iterations_between_compute = compute;
        self.nb_iterations_between_exports = exports;
        Ok(())
    }

    /// Returns the number of time steps between two computations
    pub fn nb_iterations_between_compute(&self) -> usize {
        self.nb_iterations_between_compute
    }

    /// Returns the number of time steps between two writings
    pub fn nb_iterations_between_exports(&self) -> Option<usize> {
        self.nb_iterations_between_exports
    }

    /// Sets the CSV filename
    pub fn set_filename(&mut self, filename: &str) -> Result<(), StrError> {
        if filename.is_empty() {
            return Err("filename must be a non-empty string");
        }
        if !filename.ends_with(".csv") {
            return Err("filename must end with .csv");
        }
        self.filename = Some(filename.to_string());
        Ok(())
    }

    /// Returns the number of quantities
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// Returns true if there are no quantities
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Returns an iterator over the quantities
    pub fn iter(&self) -> std::slice::Iter<'_, DerivedQuantity> {
        self.quantities.iter()
    }

    /// Appends a quantity (new column)
    pub fn push(&mut self, quantity: DerivedQuantity) {
        self.quantities.push(quantity);
    }

    /// Returns the header of the table
    pub fn make_header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(1 + self.quantities.len());
        header.push(TIME_COLUMN_TITLE.to_string());
        header.extend(self.quantities.iter().map(|q| q.title.clone()));
        header
    }

    /// Assigns the measures and the facet normal to all quantities
    ///
    /// The region of each quantity must exist in the mesh.
    pub fn bind_measures(&mut self, dx: &VolumeMeasure, ds: &SurfaceMeasure) -> Result<(), StrError> {
        for q in &self.quantities {
            match q.region {
                Region::Surface(id) => {
                    if !ds.has_subdomain(id) {
                        return Err("cannot find the surface of a derived quantity");
                    }
                }
                Region::Volume(id) => {
                    if !dx.has_subdomain(id) {
                        return Err("cannot find the volume of a derived quantity");
                    }
                }
            }
        }
        let n = FacetNormal::new(&ds.space);
        for q in &mut self.quantities {
            q.dx = Some(dx.clone());
            q.ds = Some(ds.clone());
            q.n = Some(n.clone());
        }
        self.volume_markers = Some(dx.markers.clone());
        Ok(())
    }

    /// Shares the material properties with all quantities
    pub fn bind_material_properties(&mut self, props: &MaterialProperties) {
        for q in &mut self.quantities {
            q.d = Some(props.d.clone());
            q.s = Some(props.s.clone());
            q.q = Some(props.q.clone());
            q.thermal_cond = Some(props.thermal_cond.clone());
        }
    }

    /// Shares the fields with the quantities according to their field names
    pub fn bind_functions(&mut self, functions: &HashMap<String, Shared<Function>>) -> Result<(), StrError> {
        for q in &mut self.quantities {
            let function = functions
                .get(&q.field)
                .ok_or("cannot find the field of a derived quantity")?;
            q.function = Some(function.clone());
        }
        Ok(())
    }

    /// Shares the temperature with all quantities
    pub fn bind_temperature(&mut self, temperature: &Shared<Function>) {
        for q in &mut self.quantities {
            q.temperature = Some(temperature.clone());
        }
    }

    /// Computes all quantities and appends the row [t, values...] to the table
    pub fn compute(&mut self, t: f64) -> Result<(), StrError> {
        let markers = self
            .volume_markers
            .as_ref()
            .ok_or("the measures must be bound before computing the derived quantities")?;
        let ctx = ComputeContext {
            volume_markers: markers,
        };
        let mut row = Vec::with_capacity(1 + self.quantities.len());
        row.push(t);
        for q in &mut self.quantities {
            let value = q.compute(&ctx)?;
            q.t.push(t);
            q.data.push(value);
            row.push(value);
        }
        self.data.push(row);
        Ok(())
    }

    /// Selects the quantities matching all given criteria
    ///
    /// A None criterion matches everything. With no criteria at all, the whole collection is returned.
    pub fn filter(
        &self,
        fields: Option<&[&str]>,
        surfaces: Option<&[usize]>,
        volumes: Option<&[usize]>,
        kinds: Option<&[QuantityKind]>,
    ) -> Filtered<'_> {
        if fields.is_none() && surfaces.is_none() && volumes.is_none() && kinds.is_none() {
            return Filtered::Many(self.quantities.iter().collect());
        }
        let mut selected: Vec<&DerivedQuantity> = self
            .quantities
            .iter()
            .filter(|q| match fields {
                Some(fields) => fields.contains(&q.field.as_str()),
                None => true,
            })
            .filter(|q| match surfaces {
                Some(surfaces) => q.surface().map_or(false, |s| surfaces.contains(&s)),
                None => true,
            })
            .filter(|q| match volumes {
                Some(volumes) => q.volume().map_or(false, |v| volumes.contains(&v)),
                None => true,
            })
            .filter(|q| match kinds {
                Some(kinds) => kinds.contains(&q.kind),
                None => true,
            })
            .collect();
        if selected.len() == 1 {
            Filtered::One(selected.remove(0))
        } else {
            Filtered::Many(selected)
        }
    }

    /// Returns the latest value of the unique quantity with the given field and region
    pub fn get(&self, field: &str, surface: Option<usize>, volume: Option<usize>) -> Result<f64, StrError> {
        let fields = [field];
        let surfaces = surface.map(|s| vec![s]);
        let volumes = volume.map(|v| vec![v]);
        match self.filter(Some(&fields), surfaces.as_deref(), volumes.as_deref(), None) {
            Filtered::One(q) => q.value.ok_or("the derived quantity has not been computed yet"),
            Filtered::Many(..) => Err("cannot find a unique derived quantity"),
        }
    }

    /// Returns true if the quantities must be computed at this time step
    pub fn is_compute(&self, nb_iterations: usize) -> bool {
        nb_iterations % self.nb_iterations_between_compute == 0
    }

    /// Returns true if the table must be written at this time step
    ///
    /// `final_time` is None for steady-state problems (always true).
    pub fn is_export(&self, t: f64, final_time: Option<f64>, nb_iterations: usize) -> bool {
        let final_time = match final_time {
            Some(tf) => tf,
            None => return true,
        };
        if f64::abs(t - final_time) <= 1e-10 * f64::max(1.0, f64::abs(final_time)) {
            return true;
        }
        match self.nb_iterations_between_exports {
            Some(n) => nb_iterations % n == 0,
            None => false,
        }
    }

    /// Writes the header and the rows to the CSV file
    ///
    /// Does nothing if the filename is not set. Creates the parent directories if needed.
    pub fn write(&self) -> Result<(), StrError> {
        let filename = match &self.filename {
            Some(f) => f,
            None => return Ok(()),
        };
        let path = Path::new(filename);
        if let Some(p) = path.parent() {
            if !p.as_os_str().is_empty() {
                fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
            }
        }
        let mut buffer = String::new();
        buffer.push_str(&self.make_header().join(","));
        buffer.push('\n');
        for row in &self.data {
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    buffer.push(',');
                }
                write!(&mut buffer, "{:?}", value).map_err(|_| "cannot format the derived quantities")?;
            }
            buffer.push('\n');
        }
        let file = File::create(path).map_err(|_| "cannot create file")?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(buffer.as_bytes())
            .map_err(|_| "cannot write file")?;
        writer.flush().map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl Index<usize> for DerivedQuantityCollection {
    type Output = DerivedQuantity;
    fn index(&self, index: usize) -> &Self::Output {
        &self.quantities[index]
    }
}

impl<'a> IntoIterator for &'a DerivedQuantityCollection {
    type Item = &'a DerivedQuantity;
    type IntoIter = std::slice::Iter<'a, DerivedQuantity>;
    fn into_iter(self) -> Self::IntoIter {
        self.quantities.iter()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

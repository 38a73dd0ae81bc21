use super::{FacetNormal, Function, Shared, SurfaceMeasure, VolumeMeasure};
use crate::base::{QuantityKind, Region, K_B};
use crate::StrError;
use russell_lab::Vector;

/// Holds the data required by [DerivedQuantity::compute]
pub struct ComputeContext<'a> {
    /// Volume id of each cell
    ///
    /// (ncell)
    pub volume_markers: &'a [usize],
}

/// Holds a scalar computed from a field over a surface or a volume
pub struct DerivedQuantity {
    /// Kind of quantity
    pub kind: QuantityKind,

    /// Name of the field: "solute" (or "0"), "retention", "T", or the id of a trap
    pub field: String,

    /// Surface or volume of the computation
    pub region: Region,

    /// Column title
    pub title: String,

    /// Includes the Soret contribution in the flux of solute
    pub soret: bool,

    /// Field (bound by the collection)
    pub function: Option<Shared<Function>>,

    /// Diffusion coefficient of each cell (bound by the collection)
    pub d: Option<Shared<Vector>>,

    /// Solubility of each cell (bound by the collection)
    pub s: Option<Shared<Vector>>,

    /// Heat of transport of each cell (bound by the collection)
    pub q: Option<Shared<Vector>>,

    /// Thermal conductivity of each cell (bound by the collection)
    pub thermal_cond: Option<Shared<Vector>>,

    /// Temperature (bound by the collection)
    pub temperature: Option<Shared<Function>>,

    /// Volume measure (bound by the collection)
    pub dx: Option<VolumeMeasure>,

    /// Surface measure (bound by the collection)
    pub ds: Option<SurfaceMeasure>,

    /// Facet normal (bound by the collection)
    pub n: Option<FacetNormal>,

    /// Latest computed value
    pub value: Option<f64>,

    /// Times of the computed values
    pub t: Vec<f64>,

    /// Computed values
    pub data: Vec<f64>,
}

impl DerivedQuantity {
    /// Allocates a new instance
    ///
    /// `region_id` is a surface id for surface kinds and a volume id otherwise.
    pub fn new(kind: QuantityKind, field: &str, region_id: usize) -> Self {
        let region = if kind.on_surface() {
            Region::Surface(region_id)
        } else {
            Region::Volume(region_id)
        };
        DerivedQuantity {
            kind,
            field: field.to_string(),
            region,
            title: kind.title(field, region_id),
            soret: false,
            function: None,
            d: None,
            s: None,
            q: None,
            thermal_cond: None,
            temperature: None,
            dx: None,
            ds: None,
            n: None,
            value: None,
            t: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Allocates a flux through a surface (outward positive)
    pub fn surface_flux(field: &str, surface: usize) -> Self {
        DerivedQuantity::new(QuantityKind::SurfaceFlux, field, surface)
    }

    /// Allocates the integral of a field over a surface
    pub fn total_surface(field: &str, surface: usize) -> Self {
        DerivedQuantity::new(QuantityKind::TotalSurface, field, surface)
    }

    /// Allocates the average of a field over a surface
    pub fn average_surface(field: &str, surface: usize) -> Self {
        DerivedQuantity::new(QuantityKind::AverageSurface, field, surface)
    }

    /// Allocates the integral of a field over a volume
    pub fn total_volume(field: &str, volume: usize) -> Self {
        DerivedQuantity::new(QuantityKind::TotalVolume, field, volume)
    }

    /// Allocates the average of a field over a volume
    pub fn average_volume(field: &str, volume: usize) -> Self {
        DerivedQuantity::new(QuantityKind::AverageVolume, field, volume)
    }

    /// Allocates the maximum of a field over a volume
    pub fn maximum_volume(field: &str, volume: usize) -> Self {
        DerivedQuantity::new(QuantityKind::MaximumVolume, field, volume)
    }

    /// Allocates the minimum of a field over a volume
    pub fn minimum_volume(field: &str, volume: usize) -> Self {
        DerivedQuantity::new(QuantityKind::MinimumVolume, field, volume)
    }

    /// Enables the Soret contribution to the flux
    pub fn with_soret(mut self) -> Self {
        self.soret = true;
        self
    }

    /// Returns the surface id, if any
    pub fn surface(&self) -> Option<usize> {
        self.region.surface()
    }

    /// Returns the volume id, if any
    pub fn volume(&self) -> Option<usize> {
        self.region.volume()
    }

    /// Computes the quantity, stores it as the latest value, and returns it
    pub fn compute(&mut self, ctx: &ComputeContext) -> Result<f64, StrError> {
        let function = self
            .function
            .clone()
            .ok_or("the function of the derived quantity is not bound")?;
        let field = function.borrow();
        let u = &field.values;
        let value = match self.region {
            Region::Surface(surface) => {
                let ds = self.ds.as_ref().ok_or("the measures of the derived quantity are not bound")?;
                match self.kind {
                    QuantityKind::SurfaceFlux => self.flux(u, surface)?,
                    QuantityKind::AverageSurface => {
                        let measure = ds.measure(surface);
                        if measure <= 0.0 {
                            return Err("the measure of the surface is zero");
                        }
                        ds.integrate(u, surface) / measure
                    }
                    _ => ds.integrate(u, surface),
                }
            }
            Region::Volume(volume) => {
                let dx = self.dx.as_ref().ok_or("the measures of the derived quantity are not bound")?;
                match self.kind {
                    QuantityKind::TotalVolume => dx.integrate(u, Some(volume)),
                    QuantityKind::AverageVolume => {
                        let measure = dx.measure(Some(volume));
                        if measure <= 0.0 {
                            return Err("the measure of the volume is zero");
                        }
                        dx.integrate(u, Some(volume)) / measure
                    }
                    QuantityKind::MaximumVolume => extremum(dx, ctx, u, volume, f64::max)?,
                    _ => extremum(dx, ctx, u, volume, f64::min)?,
                }
            }
        };
        self.value = Some(value);
        Ok(value)
    }

    /// Computes Σ −prop ∇u·n over the facets of the surface (plus the Soret term if enabled)
    fn flux(&self, u: &Vector, surface: usize) -> Result<f64, StrError> {
        let ds = self.ds.as_ref().ok_or("the measures of the derived quantity are not bound")?;
        let n = self.n.as_ref().ok_or("the measures of the derived quantity are not bound")?;
        let prop = match self.field.as_str() {
            "solute" | "0" => self.d.as_ref().ok_or("the diffusion coefficient is not bound")?,
            "T" => self
                .thermal_cond
                .as_ref()
                .ok_or("the thermal conductivity is not bound")?,
            _ => return Err("the surface flux is available for the solute and T fields only"),
        };
        let prop = prop.borrow();
        let mut flux = 0.0;
        for p in ds.facets(surface) {
            let (dudn, cell) = n.normal_derivative(u, p)?;
            flux += -prop[cell] * dudn;
        }
        if self.soret && self.field != "T" {
            let q = self.q.as_ref().ok_or("the heat of transport is not bound")?.borrow();
            let temperature = self.temperature.as_ref().ok_or("the temperature is not bound")?.borrow();
            for p in ds.facets(surface) {
                let (dtdn, cell) = n.normal_derivative(&temperature.values, p)?;
                let tp = temperature.values[p];
                flux += -prop[cell] * u[p] * q[cell] / (K_B * tp * tp) * dtdn;
            }
        }
        Ok(flux)
    }
}

/// Returns the extremum of the nodal values of the cells tagged with the volume id
fn extremum(
    dx: &VolumeMeasure,
    ctx: &ComputeContext,
    u: &Vector,
    volume: usize,
    pick: fn(f64, f64) -> f64,
) -> Result<f64, StrError> {
    let mut res: Option<f64> = None;
    for cell in &dx.space.mesh.cells {
        if ctx.volume_markers[cell.id] != volume {
            continue;
        }
        for p in &cell.points {
            res = Some(match res {
                Some(r) => pick(r, u[*p]),
                None => u[*p],
            });
        }
    }
    res.ok_or("there are no cells in the volume")
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

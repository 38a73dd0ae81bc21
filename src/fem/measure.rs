use super::FunctionSpace;
use crate::StrError;
use gemlab::mesh::{CellId, PointId};
use russell_lab::Vector;
use std::rc::Rc;

/// Holds the volume integration measure (dx) with the volume markers of the cells
///
/// The integrals of linear fields are exact (trapezoidal rule over each cell).
/// The forms use the nodal (lumped) quadrature given by [VolumeMeasure::lumped_weights].
#[derive(Clone)]
pub struct VolumeMeasure {
    /// Holds the function space
    pub space: Rc<FunctionSpace>,

    /// Holds the volume id of each cell
    ///
    /// (ncell)
    pub markers: Vec<usize>,
}

/// Holds the surface integration measure (ds)
///
/// The facets of Lin2 cells are points; thus, the measure of each facet is one.
#[derive(Clone)]
pub struct SurfaceMeasure {
    /// Holds the function space
    pub space: Rc<FunctionSpace>,
}

/// Computes normal derivatives at the exterior facets (n)
#[derive(Clone)]
pub struct FacetNormal {
    /// Holds the function space
    pub space: Rc<FunctionSpace>,
}

impl VolumeMeasure {
    /// Allocates a new instance
    pub fn new(space: &Rc<FunctionSpace>) -> Self {
        VolumeMeasure {
            space: space.clone(),
            markers: space.volume_markers(),
        }
    }

    /// Returns true if the cell belongs to the volume (None means all volumes)
    #[inline]
    pub fn contains(&self, cell_id: CellId, volume: Option<usize>) -> bool {
        match volume {
            Some(id) => self.markers[cell_id] == id,
            None => true,
        }
    }

    /// Returns true if there is a volume with this id
    pub fn has_subdomain(&self, id: usize) -> bool {
        self.markers.iter().any(|m| *m == id)
    }

    /// Returns the nodal quadrature weights: w_p = Σ L/2 over the cells (of the volume) sharing p
    ///
    /// Returns a vector with npoint entries; points outside the volume have zero weight.
    pub fn lumped_weights(&self, volume: Option<usize>) -> Vec<f64> {
        let mut weights = vec![0.0; self.space.npoint()];
        for cell in &self.space.mesh.cells {
            if !self.contains(cell.id, volume) {
                continue;
            }
            let half = self.space.cell_lengths[cell.id] / 2.0;
            weights[cell.points[0]] += half;
            weights[cell.points[1]] += half;
        }
        weights
    }

    /// Integrates a linear field over the volume (None means the whole domain)
    pub fn integrate(&self, values: &Vector, volume: Option<usize>) -> f64 {
        let mut res = 0.0;
        for cell in &self.space.mesh.cells {
            if self.contains(cell.id, volume) {
                let (a, b) = (cell.points[0], cell.points[1]);
                res += self.space.cell_lengths[cell.id] * (values[a] + values[b]) / 2.0;
            }
        }
        res
    }

    /// Returns the measure (length) of the volume (None means the whole domain)
    pub fn measure(&self, volume: Option<usize>) -> f64 {
        self.space
            .mesh
            .cells
            .iter()
            .filter(|c| self.contains(c.id, volume))
            .map(|c| self.space.cell_lengths[c.id])
            .sum()
    }
}

impl SurfaceMeasure {
    /// Allocates a new instance
    pub fn new(space: &Rc<FunctionSpace>) -> Self {
        SurfaceMeasure { space: space.clone() }
    }

    /// Returns true if there is a surface with this id
    pub fn has_subdomain(&self, id: usize) -> bool {
        self.space.has_surface(id)
    }

    /// Returns the facets (points) of a surface
    pub fn facets(&self, surface: usize) -> Vec<PointId> {
        self.space.surface_points(surface)
    }

    /// Integrates a field over the surface
    pub fn integrate(&self, values: &Vector, surface: usize) -> f64 {
        self.facets(surface).iter().map(|p| values[*p]).sum()
    }

    /// Returns the measure of the surface (number of facets)
    pub fn measure(&self, surface: usize) -> f64 {
        self.facets(surface).len() as f64
    }
}

impl FacetNormal {
    /// Allocates a new instance
    pub fn new(space: &Rc<FunctionSpace>) -> Self {
        FacetNormal { space: space.clone() }
    }

    /// Returns the outward normal derivative ∇u·n at an exterior facet and the id of the adjacent cell
    ///
    /// The gradient is constant over the (linear) cell adjacent to the facet.
    pub fn normal_derivative(&self, values: &Vector, point_id: PointId) -> Result<(f64, CellId), StrError> {
        if !self.space.is_boundary_point(point_id) {
            return Err("normal derivatives are available at exterior facets only");
        }
        let cell_id = self.space.point_cells[point_id][0];
        let cell = &self.space.mesh.cells[cell_id];
        let other = if cell.points[0] == point_id {
            cell.points[1]
        } else {
            cell.points[0]
        };
        let length = self.space.cell_lengths[cell_id];
        Ok(((values[point_id] - values[other]) / length, cell_id))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

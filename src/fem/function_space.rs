use crate::StrError;
use gemlab::mesh::{CellId, Mesh, PointId};
use gemlab::shapes::GeoKind;
use std::collections::HashMap;

/// Holds the mesh and the geometric data of the linear (P1) scalar function space
///
/// The degrees of freedom are the mesh points. The facets of the Lin2 cells are points;
/// thus, surfaces are sets of points identified by their (positive) point markers.
pub struct FunctionSpace {
    /// Holds the mesh
    pub mesh: Mesh,

    /// Holds the length of each cell
    ///
    /// (ncell)
    pub cell_lengths: Vec<f64>,

    /// Holds the cells sharing each point
    ///
    /// (npoint)
    pub point_cells: Vec<Vec<CellId>>,

    /// Maps facets (points) to surface ids
    pub surface_markers: HashMap<PointId, usize>,
}

impl FunctionSpace {
    /// Allocates a new instance
    ///
    /// Points with a positive marker become facets of the surface with the same id.
    pub fn new(mesh: Mesh) -> Result<Self, StrError> {
        if mesh.cells.is_empty() {
            return Err("there are no cells in the mesh");
        }
        let npoint = mesh.points.len();
        let mut cell_lengths = Vec::with_capacity(mesh.cells.len());
        let mut point_cells = vec![Vec::new(); npoint];
        for cell in &mesh.cells {
            if cell.kind != GeoKind::Lin2 {
                return Err("only Lin2 cells are supported");
            }
            let (a, b) = (cell.points[0], cell.points[1]);
            if a >= npoint || b >= npoint {
                return Err("cell point id is out-of-bounds");
            }
            let length = distance(&mesh.points[a].coords, &mesh.points[b].coords);
            if length <= 0.0 {
                return Err("cell length must be > 0.0");
            }
            cell_lengths.push(length);
            point_cells[a].push(cell.id);
            point_cells[b].push(cell.id);
        }
        let surface_markers = mesh
            .points
            .iter()
            .filter(|p| p.marker > 0)
            .map(|p| (p.id, p.marker as usize))
            .collect();
        Ok(FunctionSpace {
            mesh,
            cell_lengths,
            point_cells,
            surface_markers,
        })
    }

    /// Returns the number of points (degrees of freedom)
    #[inline]
    pub fn npoint(&self) -> usize {
        self.mesh.points.len()
    }

    /// Returns the number of cells
    #[inline]
    pub fn ncell(&self) -> usize {
        self.mesh.cells.len()
    }

    /// Returns the coordinates of a point
    #[inline]
    pub fn coords(&self, point_id: PointId) -> &[f64] {
        &self.mesh.points[point_id].coords
    }

    /// Returns the volume id (attribute) of each cell
    pub fn volume_markers(&self) -> Vec<usize> {
        self.mesh.cells.iter().map(|c| c.attribute).collect()
    }

    /// Returns true if a surface with this id exists
    pub fn has_surface(&self, id: usize) -> bool {
        self.surface_markers.values().any(|s| *s == id)
    }

    /// Returns the sorted points (facets) of a surface
    pub fn surface_points(&self, id: usize) -> Vec<PointId> {
        let mut points: Vec<_> = self
            .surface_markers
            .iter()
            .filter(|(_, s)| **s == id)
            .map(|(p, _)| *p)
            .collect();
        points.sort();
        points
    }

    /// Returns true if the point belongs to a single cell (exterior facet)
    pub fn is_boundary_point(&self, point_id: PointId) -> bool {
        self.point_cells[point_id].len() == 1
    }

}

/// Returns the Euclidean distance between two points
pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(xa, xb)| (xb - xa) * (xb - xa)).sum::<f64>().sqrt()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

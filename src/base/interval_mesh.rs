use super::POINT_LOCATION_TOL;
use crate::StrError;
use gemlab::mesh::{Cell, Mesh, Point};
use gemlab::shapes::GeoKind;
use serde::{Deserialize, Serialize};

/// Holds a volume subdomain of an interval mesh
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamVolume {
    /// Volume id (becomes the attribute of the cells)
    pub id: usize,

    /// Left border
    pub x_min: f64,

    /// Right border
    pub x_max: f64,
}

/// Holds a surface subdomain of an interval mesh
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamSurface {
    /// Surface id (becomes the marker of the point)
    pub id: usize,

    /// Coordinate of the surface
    pub x: f64,
}

/// Holds the definition of a 1D mesh made of Lin2 cells
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamMesh {
    /// Coordinates of the vertices, in ascending order
    pub vertices: Vec<f64>,

    /// Volume subdomains; an empty list assigns the volume id 1 to all cells
    #[serde(default)]
    pub volumes: Vec<ParamVolume>,

    /// Surface subdomains
    #[serde(default)]
    pub surfaces: Vec<ParamSurface>,
}

impl ParamMesh {
    /// Allocates a new instance with uniformly spaced vertices in [0, length]
    pub fn uniform(ncell: usize, length: f64) -> Self {
        let h = length / (ncell as f64);
        ParamMesh {
            vertices: (0..(ncell + 1)).map(|i| (i as f64) * h).collect(),
            volumes: Vec::new(),
            surfaces: Vec::new(),
        }
    }

    /// Adds a volume subdomain
    pub fn volume(&mut self, id: usize, x_min: f64, x_max: f64) -> &mut Self {
        self.volumes.push(ParamVolume { id, x_min, x_max });
        self
    }

    /// Adds a surface subdomain
    pub fn surface(&mut self, id: usize, x: f64) -> &mut Self {
        self.surfaces.push(ParamSurface { id, x });
        self
    }

    /// Generates the mesh
    ///
    /// The cells get the id of the volume containing their midpoint as attribute.
    /// The points located at a surface get the surface id as marker.
    pub fn generate(&self) -> Result<Mesh, StrError> {
        let npoint = self.vertices.len();
        if npoint < 2 {
            return Err("at least two vertices are required");
        }
        for i in 1..npoint {
            if self.vertices[i] <= self.vertices[i - 1] {
                return Err("vertices must be sorted in strictly ascending order");
            }
        }
        for volume in &self.volumes {
            if volume.id == 0 {
                return Err("volume ids must be ≥ 1");
            }
        }

        // points
        let mut points: Vec<Point> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(id, x)| Point {
                id,
                marker: 0,
                coords: vec![*x],
            })
            .collect();
        for surface in &self.surfaces {
            if surface.id == 0 {
                return Err("surface ids must be ≥ 1");
            }
            let point = points
                .iter_mut()
                .find(|p| f64::abs(p.coords[0] - surface.x) < POINT_LOCATION_TOL)
                .ok_or("cannot find a vertex at the surface coordinate")?;
            point.marker = surface.id as i32;
        }

        // cells
        let mut cells = Vec::with_capacity(npoint - 1);
        for id in 0..(npoint - 1) {
            let xc = (self.vertices[id] + self.vertices[id + 1]) / 2.0;
            let attribute = if self.volumes.is_empty() {
                1
            } else {
                self.volumes
                    .iter()
                    .find(|v| xc >= v.x_min && xc <= v.x_max)
                    .map(|v| v.id)
                    .ok_or("a cell is not covered by any volume subdomain")?
            };
            cells.push(Cell {
                id,
                attribute,
                kind: GeoKind::Lin2,
                points: vec![id, id + 1],
            });
        }
        Ok(Mesh { ndim: 1, points, cells })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

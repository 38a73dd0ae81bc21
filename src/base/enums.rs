use russell_sparse::Genie;
use serde::{Deserialize, Serialize};

/// Defines the kinds of derived quantities
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum QuantityKind {
    /// Flux of the field through a surface (−prop ∇u·n)
    SurfaceFlux,

    /// Integral of the field over a surface
    TotalSurface,

    /// Integral of the field over a surface divided by the surface measure
    AverageSurface,

    /// Integral of the field over a volume
    TotalVolume,

    /// Integral of the field over a volume divided by the volume measure
    AverageVolume,

    /// Maximum nodal value of the field over the cells of a volume
    MaximumVolume,

    /// Minimum nodal value of the field over the cells of a volume
    MinimumVolume,
}

impl QuantityKind {
    /// Returns true if the quantity is computed over a surface
    pub fn on_surface(&self) -> bool {
        match self {
            QuantityKind::SurfaceFlux => true,
            QuantityKind::TotalSurface => true,
            QuantityKind::AverageSurface => true,
            QuantityKind::TotalVolume => false,
            QuantityKind::AverageVolume => false,
            QuantityKind::MaximumVolume => false,
            QuantityKind::MinimumVolume => false,
        }
    }

    /// Returns the title of a quantity of this kind
    pub fn title(&self, field: &str, region_id: usize) -> String {
        match self {
            QuantityKind::SurfaceFlux => format!("Flux surface {}: {}", region_id, field),
            QuantityKind::TotalSurface => format!("Total {} surface {}", field, region_id),
            QuantityKind::AverageSurface => format!("Average {} surface {}", field, region_id),
            QuantityKind::TotalVolume => format!("Total {} volume {}", field, region_id),
            QuantityKind::AverageVolume => format!("Average {} volume {}", field, region_id),
            QuantityKind::MaximumVolume => format!("Maximum {} volume {}", field, region_id),
            QuantityKind::MinimumVolume => format!("Minimum {} volume {}", field, region_id),
        }
    }
}

/// Defines the geometric region of a derived quantity
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Region {
    /// Surface identified by the facet marker
    Surface(usize),

    /// Volume identified by the cell attribute
    Volume(usize),
}

impl Region {
    /// Returns the surface id, if any
    pub fn surface(&self) -> Option<usize> {
        match self {
            Region::Surface(id) => Some(*id),
            Region::Volume(..) => None,
        }
    }

    /// Returns the volume id, if any
    pub fn volume(&self) -> Option<usize> {
        match self {
            Region::Surface(..) => None,
            Region::Volume(id) => Some(*id),
        }
    }
}

/// Defines the sparse linear solvers available to the Newton iterations
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum LinearSolver {
    Klu,
    Mumps,
    Umfpack,
}

impl LinearSolver {
    /// Returns the solver identifier used by russell_sparse
    pub fn genie(&self) -> Genie {
        match self {
            LinearSolver::Klu => Genie::Klu,
            LinearSolver::Mumps => Genie::Mumps,
            LinearSolver::Umfpack => Genie::Umfpack,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

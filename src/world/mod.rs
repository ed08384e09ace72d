pub mod cell;
pub mod dual_graph;
pub mod generation;
pub mod rivers;
pub mod terrain;
pub mod topology;
pub mod water;

use serde::{Deserialize, Serialize};

use crate::config::generation::GenerationParams;
pub use cell::{Cell, CellId, Point};
pub use rivers::River;
pub use terrain::ElevationThresholds;
pub use water::{WaterBody, WaterBodyKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Parameters with the resolved seed.
    pub generation_params: GenerationParams,
    pub width: u32,
    pub height: u32,
    /// Arena of cells, indexed by `CellId`.
    pub cells: Vec<Cell>,
    pub land_cells: Vec<CellId>,
    pub water_bodies: Vec<WaterBody>,
    pub rivers: Vec<River>,
    pub thresholds: ElevationThresholds,
}

impl World {
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id as usize]
    }

    pub fn seed(&self) -> u64 {
        self.generation_params.seed
    }
}

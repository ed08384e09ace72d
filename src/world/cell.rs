use serde::{Deserialize, Serialize};

pub type CellId = u32;
pub type WaterBodyId = u32;
pub type RiverId = u32;

// === Geometry ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Bearing towards `other` in degrees, straight from `atan2`.
    /// The result lies in (-180, 180] and is not normalized to [0, 360).
    pub fn bearing_to(&self, other: &Point) -> f64 {
        (other.y - self.y).atan2(other.x - self.x).to_degrees()
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

// === Flags and connections ===

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderFlags {
    pub north: bool,
    pub east: bool,
    pub south: bool,
    pub west: bool,
}

impl BorderFlags {
    pub fn is_border(&self) -> bool {
        self.north || self.east || self.south || self.west
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverConnection {
    pub river: RiverId,
    pub neighbor: CellId,
    pub direction: FlowDirection,
}

/// Per-point samples produced by the noise stage, all in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSamples {
    pub elevation: f32,
    pub moisture: f32,
    pub forest: f32,
    pub fertility: f32,
    pub ore_density: f32,
}

// === Cell ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    /// Index of the triangulation input point this cell was built around.
    pub point_index: usize,
    pub position: Point,

    pub elevation: f32,
    pub elevation_category: u8,
    pub moisture: f32,
    pub forest: f32,
    pub fertility: f32,
    pub ore_density: f32,
    pub is_water: bool,

    /// Boundary ring, one vertex per surrounding triangle.
    pub vertices: Vec<Point>,
    /// Triangle ids of the boundary ring, same order as `vertices`.
    pub corners: Vec<usize>,

    pub neighbors: Vec<CellId>,
    /// Bearing to each neighbor, same order as `neighbors`.
    pub neighbor_bearings: Vec<f64>,

    pub border: BorderFlags,
    pub is_deep_water: bool,
    pub is_coastal: bool,
    pub water_body: Option<WaterBodyId>,
    pub river_connections: Vec<RiverConnection>,
}

impl Cell {
    /// Create a cell with neutral classification state.
    /// Classification passes overwrite everything except geometry and samples.
    pub fn new(id: CellId, point_index: usize, position: Point, samples: CellSamples) -> Self {
        Self {
            id,
            point_index,
            position,
            elevation: samples.elevation,
            elevation_category: 0,
            moisture: samples.moisture,
            forest: samples.forest,
            fertility: samples.fertility,
            ore_density: samples.ore_density,
            is_water: false,
            vertices: Vec::new(),
            corners: Vec::new(),
            neighbors: Vec::new(),
            neighbor_bearings: Vec::new(),
            border: BorderFlags::default(),
            is_deep_water: false,
            is_coastal: false,
            water_body: None,
            river_connections: Vec::new(),
        }
    }

    pub fn has_river(&self) -> bool {
        !self.river_connections.is_empty()
    }

    /// Cached bearing towards `neighbor`, if it is one.
    pub fn bearing_to_neighbor(&self, neighbor: CellId) -> Option<f64> {
        self.neighbors
            .iter()
            .position(|&n| n == neighbor)
            .map(|i| self.neighbor_bearings[i])
    }

    /// True if a river leaves this cell towards `neighbor`.
    pub fn flows_into(&self, neighbor: CellId) -> bool {
        self.river_connections
            .iter()
            .any(|c| c.neighbor == neighbor && c.direction == FlowDirection::Out)
    }

    /// Recompute `neighbor_bearings` from positions.
    pub(crate) fn cache_bearings(&mut self, cells_positions: &[Point]) {
        self.neighbor_bearings = self
            .neighbors
            .iter()
            .map(|&n| self.position.bearing_to(&cells_positions[n as usize]))
            .collect();
    }
}

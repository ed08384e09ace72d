pub mod bucket_queue;
pub mod costs;
pub mod search;
pub mod terrain;

pub use costs::trade_route_cost;
pub use search::{Path, PathFinder, SearchGraph};
pub use terrain::{CellPath, TerrainGraph, TraversalFilter, cell_to_cell_path};

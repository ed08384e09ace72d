pub mod config;
pub mod error;
pub mod routing;
pub mod settlements;
pub mod world;

pub use error::GenerationError;
pub use world::World;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted `heuristic_scale`. Search priorities grow with it.
pub const MAX_HEURISTIC_SCALE: f64 = 1000.0;

/// Settlement placement and network parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementParams {
    /// Share of each border side sampled as proto trade route endpoints.
    #[serde(default = "default_proto_route_share")]
    pub proto_route_share: f32,
    /// Invalid connections tolerated before a city stops scanning for neighbors.
    #[serde(default = "default_connection_tolerance")]
    pub connection_tolerance: u32,
    /// Multiplier applied to straight-line distance for the search heuristic.
    #[serde(default = "default_heuristic_scale")]
    pub heuristic_scale: f64,
}

fn default_proto_route_share() -> f32 {
    0.1
}

fn default_connection_tolerance() -> u32 {
    4
}

fn default_heuristic_scale() -> f64 {
    10.0
}

impl Default for SettlementParams {
    fn default() -> Self {
        SettlementParams {
            proto_route_share: 0.1,
            connection_tolerance: 4,
            heuristic_scale: 10.0,
        }
    }
}

/// Parameters used to procedurally generate a world.
/// Stored with the world for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Maximum offset of a grid point from its lattice position.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_wavelength")]
    pub wavelength: f64,
    #[serde(default = "default_wavelength")]
    pub wavelength_moisture: f64,
    /// Total river length allowance as a share of the land cell count.
    #[serde(default = "default_river_ratio")]
    pub river_ratio: f32,
    #[serde(default)]
    pub settlements: SettlementParams,
}

fn default_width() -> u32 {
    120
}

fn default_height() -> u32 {
    80
}

fn default_jitter() -> f64 {
    0.5
}

fn default_wavelength() -> f64 {
    1.0
}

fn default_river_ratio() -> f32 {
    0.2
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            seed: 0,
            width: 120,
            height: 80,
            jitter: 0.5,
            wavelength: 1.0,
            wavelength_moisture: 1.0,
            river_ratio: 0.2,
            settlements: SettlementParams::default(),
        }
    }
}

impl GenerationParams {
    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.width < 3 {
            return Err(format!("width must be >= 3, got {}", self.width));
        }
        if self.height < 3 {
            return Err(format!("height must be >= 3, got {}", self.height));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("jitter must be 0.0-1.0, got {}", self.jitter));
        }
        if self.wavelength <= 0.0 {
            return Err(format!("wavelength must be > 0, got {}", self.wavelength));
        }
        if self.wavelength_moisture <= 0.0 {
            return Err(format!(
                "wavelength_moisture must be > 0, got {}",
                self.wavelength_moisture
            ));
        }
        if !(0.0..=1.0).contains(&self.river_ratio) {
            return Err(format!(
                "river_ratio must be 0.0-1.0, got {}",
                self.river_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.settlements.proto_route_share) {
            return Err(format!(
                "settlements.proto_route_share must be 0.0-1.0, got {}",
                self.settlements.proto_route_share
            ));
        }
        if !(0.0..=MAX_HEURISTIC_SCALE).contains(&self.settlements.heuristic_scale) {
            return Err(format!(
                "settlements.heuristic_scale must be 0-{}, got {}",
                MAX_HEURISTIC_SCALE, self.settlements.heuristic_scale
            ));
        }
        Ok(())
    }
}

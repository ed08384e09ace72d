use serde::{Deserialize, Serialize};

use crate::world::cell::Cell;

/// Elevation percentiles that separate the five elevation categories.
/// Category 0 (at or below the first cut) is water.
pub const ELEVATION_CUT_POINTS: [f64; 5] = [0.3, 0.5, 0.8, 0.95, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationThresholds(pub [f32; 5]);

impl ElevationThresholds {
    /// Take the elevation at each cut point of the sorted distribution.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_elevations(elevations: &[f32]) -> Option<Self> {
        if elevations.is_empty() {
            return None;
        }
        let mut sorted = elevations.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mut thresholds = [0.0; 5];
        for (slot, &cut) in thresholds.iter_mut().zip(ELEVATION_CUT_POINTS.iter()) {
            let rank = ((n as f64 * cut) as usize).saturating_sub(1).min(n - 1);
            *slot = sorted[rank];
        }
        Some(Self(thresholds))
    }

    pub fn water_level(&self) -> f32 {
        self.0[0]
    }

    /// Index of the first threshold at or above `elevation`, 4 if none.
    pub fn category(&self, elevation: f32) -> u8 {
        self.0
            .iter()
            .position(|&t| elevation <= t)
            .unwrap_or(self.0.len() - 1) as u8
    }
}

/// Assign elevation categories, water flags and border flags.
///
/// Border cells are found by rank, not geometry: the `height` cells with the
/// smallest x are west and the `height` with the largest x are east, the
/// `width` cells with the smallest y are north and the `width` with the
/// largest y are south. On the jittered generation grid this picks the outer
/// ring; on other layouts it is an approximation.
///
/// Resets every flag it owns, so running it twice gives the same result.
pub fn classify_terrain(cells: &mut [Cell], width: u32, height: u32) -> Option<ElevationThresholds> {
    let elevations: Vec<f32> = cells.iter().map(|c| c.elevation).collect();
    let thresholds = ElevationThresholds::from_elevations(&elevations)?;

    for cell in cells.iter_mut() {
        cell.elevation_category = thresholds.category(cell.elevation);
        cell.is_water = cell.elevation <= thresholds.water_level();
        cell.border = Default::default();
    }

    assign_border_flags(cells, width as usize, height as usize);

    Some(thresholds)
}

fn assign_border_flags(cells: &mut [Cell], width: usize, height: usize) {
    let n = cells.len();

    let mut by_x: Vec<usize> = (0..n).collect();
    by_x.sort_by(|&a, &b| {
        cells[a]
            .position
            .x
            .total_cmp(&cells[b].position.x)
            .then(a.cmp(&b))
    });
    let column = height.min(n);
    for &idx in &by_x[..column] {
        cells[idx].border.west = true;
    }
    for &idx in &by_x[n - column..] {
        cells[idx].border.east = true;
    }

    let mut by_y: Vec<usize> = (0..n).collect();
    by_y.sort_by(|&a, &b| {
        cells[a]
            .position
            .y
            .total_cmp(&cells[b].position.y)
            .then(a.cmp(&b))
    });
    let row = width.min(n);
    for &idx in &by_y[..row] {
        cells[idx].border.north = true;
    }
    for &idx in &by_y[n - row..] {
        cells[idx].border.south = true;
    }
}

use std::collections::BTreeMap;

use noise::{NoiseFn, OpenSimplex};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::generation::GenerationParams;
use crate::error::GenerationError;
use crate::world::World;
use crate::world::cell::{CellId, CellSamples, Point};
use crate::world::dual_graph::build_cells;
use crate::world::rivers::generate_rivers;
use crate::world::terrain::classify_terrain;
use crate::world::topology::{Triangulation, jittered_grid};
use crate::world::water::{WaterBodyKind, label_water_bodies};

/// Octave frequencies and amplitudes of the elevation noise.
const ELEVATION_OCTAVES: [(f64, f64); 3] = [(6.0, 1.0), (24.0, 0.5), (96.0, 0.25)];
const ELEVATION_AMPLITUDE_SUM: f64 = 1.75;
const VALLEY_SCALE: f64 = 1.6;
const VALLEY_EXPONENT: f64 = 2.5;
/// Lower bound on the normalized coordinates used for landmass shaping.
const SHAPING_FLOOR: f64 = 0.3;

const FOREST_FREQUENCY: f64 = 4.0;
const FERTILITY_FREQUENCY: f64 = 3.0;
const ORE_FREQUENCY: f64 = 8.0;

/// Generate a new world from the given parameters.
///
/// If `params.seed` is 0, a random seed is chosen. The actual seed used
/// is stored in the returned World's `generation_params` for reproducibility.
pub fn generate_world(params: &GenerationParams) -> Result<World, GenerationError> {
    params.validate()?;

    let seed = if params.seed == 0 {
        rand::thread_rng().r#gen()
    } else {
        params.seed
    };
    let resolved_params = GenerationParams {
        seed,
        ..params.clone()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    info!(seed, width = params.width, height = params.height, "Generating world");

    let points = jittered_grid(params.width, params.height, params.jitter, &mut rng);
    let samples = sample_terrain(&points, params, &mut rng);

    let triangulation = Triangulation::new(&points)?;
    let (mut cells, _) = build_cells(&points, &triangulation, &samples);
    let thresholds = classify_terrain(&mut cells, params.width, params.height)
        .ok_or(GenerationError::EmptyGraph)?;
    let water_bodies = label_water_bodies(&mut cells);

    let land_cells: Vec<CellId> = cells.iter().filter(|c| !c.is_water).map(|c| c.id).collect();
    if land_cells.is_empty() {
        warn!(cells = cells.len(), "World has no land cells");
    }

    let rivers = generate_rivers(&mut cells, land_cells.len(), params.river_ratio, &mut rng);

    info!(
        cells = cells.len(),
        land = land_cells.len(),
        water_bodies = water_bodies.len(),
        rivers = rivers.len(),
        "World generated"
    );

    Ok(World {
        generation_params: resolved_params,
        width: params.width,
        height: params.height,
        cells,
        land_cells,
        water_bodies,
        rivers,
        thresholds,
    })
}

/// Print a summary of the generated world.
pub fn print_world_summary(world: &World) {
    println!("=== World Summary ===");
    println!("Size: {}x{}", world.width, world.height);
    println!("Cells: {}", world.cells.len());
    println!("Seed: {}", world.generation_params.seed);

    let total = world.cells.len().max(1) as f32;
    let mut category_counts: BTreeMap<u8, u32> = BTreeMap::new();
    for cell in &world.cells {
        *category_counts.entry(cell.elevation_category).or_insert(0) += 1;
    }
    println!("\nElevation categories:");
    for (category, count) in &category_counts {
        let pct = *count as f32 / total * 100.0;
        let label = if *category == 0 { " (water)" } else { "" };
        println!("  {}{:<8} {:>5} ({:.1}%)", category, label, count, pct);
    }
    println!(
        "  water level {:.3}, thresholds {:?}",
        world.thresholds.water_level(),
        world.thresholds.0
    );

    let oceans: Vec<_> = world
        .water_bodies
        .iter()
        .filter(|b| b.kind == WaterBodyKind::Ocean)
        .collect();
    let lakes = world.water_bodies.len() - oceans.len();
    let coastal = world.cells.iter().filter(|c| c.is_coastal).count();
    println!("\nWater:");
    println!(
        "  {:<12} {:>5} ({} cells)",
        "Oceans",
        oceans.len(),
        oceans.iter().map(|b| b.cells.len()).sum::<usize>()
    );
    println!("  {:<12} {:>5}", "Lakes", lakes);
    println!("  {:<12} {:>5}", "Coastal land", coastal);

    if !world.rivers.is_empty() {
        let lengths: Vec<usize> = world.rivers.iter().map(|r| r.len()).collect();
        let total_length: usize = lengths.iter().sum();
        println!("\nRivers:");
        println!("  {:<12} {:>5}", "Count", lengths.len());
        println!("  {:<12} {:>5}", "Total length", total_length);
        println!(
            "  {:<12} {:>5}",
            "Longest",
            lengths.iter().max().copied().unwrap_or(0)
        );
    }
}

// --- Internal generation functions ---

fn sample_terrain(points: &[Point], params: &GenerationParams, rng: &mut impl Rng) -> Vec<CellSamples> {
    let octaves: Vec<OpenSimplex> = ELEVATION_OCTAVES
        .iter()
        .map(|_| OpenSimplex::new(rng.r#gen()))
        .collect();
    let moisture = OpenSimplex::new(rng.r#gen());
    let forest = OpenSimplex::new(rng.r#gen());
    let fertility = OpenSimplex::new(rng.r#gen());
    let ore = OpenSimplex::new(rng.r#gen());

    let width = params.width as f64;
    let height = params.height as f64;
    points
        .iter()
        .map(|p| {
            let nx = p.x / width - 0.5;
            let ny = p.y / height - 0.5;
            let m = params.wavelength_moisture;
            CellSamples {
                elevation: elevation_at(&octaves, p, width, height, params.wavelength),
                moisture: unit(&moisture, nx / m, ny / m),
                forest: unit(&forest, FOREST_FREQUENCY * nx, FOREST_FREQUENCY * ny),
                fertility: unit(&fertility, FERTILITY_FREQUENCY * nx, FERTILITY_FREQUENCY * ny),
                ore_density: unit(&ore, ORE_FREQUENCY * nx, ORE_FREQUENCY * ny),
            }
        })
        .collect()
}

/// Layered noise pushed towards a landmass in the low-x, low-y corner.
fn elevation_at(octaves: &[OpenSimplex], p: &Point, width: f64, height: f64, wavelength: f64) -> f32 {
    let nx = p.x / width - 0.5;
    let ny = p.y / height - 0.5;
    let mut sample = octaves
        .iter()
        .zip(ELEVATION_OCTAVES.iter())
        .map(|(noise, &(freq, amplitude))| {
            amplitude * noise.get([freq * nx / wavelength, freq * ny / wavelength])
        })
        .sum::<f64>()
        / ELEVATION_AMPLITUDE_SUM;

    let d = corner_distance(p, width, height);
    sample = (1.0 + sample - d) / 2.0;
    sample = if sample > 0.0 {
        (sample * VALLEY_SCALE).powf(VALLEY_EXPONENT)
    } else {
        0.0
    };
    sample = (0.5 + sample - d * 0.5) / 2.0;

    sample.clamp(0.0, 1.0) as f32
}

fn corner_distance(p: &Point, width: f64, height: f64) -> f64 {
    let tx = (p.x / width).max(SHAPING_FLOOR);
    let ty = (p.y / height).max(SHAPING_FLOOR);
    ((tx * tx + ty * ty) / std::f64::consts::SQRT_2).min(1.0)
}

/// Map raw noise in [-1, 1] to [0, 1].
fn unit(noise: &OpenSimplex, x: f64, y: f64) -> f32 {
    ((1.0 + noise.get([x, y])) / 2.0).clamp(0.0, 1.0) as f32
}

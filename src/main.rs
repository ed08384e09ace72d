use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use realmgraph::config::generation::GenerationParams;
use realmgraph::routing::PathFinder;
use realmgraph::settlements::{SettlementNetwork, build_settlements, discover_routes};
use realmgraph::world::World;
use realmgraph::world::generation::{generate_world, print_world_summary};

#[derive(Parser)]
#[command(name = "realmgraph")]
#[command(about = "Procedural terrain graph, rivers and settlement network generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and its settlement network and print a summary
    Generate {
        /// Path to world generation config file
        #[arg(short, long, default_value = "worldgen.toml")]
        worldgen: String,
    },

    /// Enumerate candidate trade routes starting at one city
    Routes {
        /// Path to world generation config file
        #[arg(short, long, default_value = "worldgen.toml")]
        worldgen: String,

        /// Node id of the starting city
        #[arg(short, long, default_value_t = 0)]
        city: usize,

        /// Maximum summed edge cost of a route
        #[arg(short, long, default_value_t = 300)]
        budget: u32,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { worldgen } => {
            let (world, network) = build(&worldgen);
            print_world_summary(&world);
            print_network_summary(&network);
        }

        Commands::Routes {
            worldgen,
            city,
            budget,
        } => {
            let (_, network) = build(&worldgen);
            if !network.nodes.get(city).is_some_and(|n| n.is_city()) {
                eprintln!("Node {} is not a city ({} nodes)", city, network.nodes.len());
                std::process::exit(1);
            }
            let mut routes = discover_routes(&network, city, budget);
            routes.sort_by(|a, b| b.cities.len().cmp(&a.cities.len()).then(a.cost.cmp(&b.cost)));
            println!("{} candidate route(s) from city {} within {}", routes.len(), city, budget);
            for route in routes.iter().take(20) {
                println!("  cost {:>6}  cities {:?}", route.cost, route.cities);
            }
        }
    }
}

fn build(worldgen: &str) -> (World, SettlementNetwork) {
    let params = match GenerationParams::from_file(Path::new(worldgen)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading generation config: {}", e);
            std::process::exit(1);
        }
    };
    println!("Generating world from {}...", worldgen);
    let world = match generate_world(&params) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("World generation failed: {}", e);
            std::process::exit(1);
        }
    };
    let network = build_settlements(&world);
    (world, network)
}

fn print_network_summary(network: &SettlementNetwork) {
    let cities: Vec<usize> = network.cities().map(|c| c.id).collect();
    println!("\nSettlements:");
    println!("  {:<12} {:>5}", "Cities", cities.len());
    println!("  {:<12} {:>5}", "Ports", network.ports().count());
    println!("  {:<12} {:>5}", "Roads", network.roads.len());
    println!("  {:<12} {:>5}", "Sea lanes", network.sea_lanes.len());

    if let (Some(&first), Some(&last)) = (cities.first(), cities.last()) {
        let mut finder = PathFinder::new();
        match network.city_to_city_path(&mut finder, first, last) {
            Some(path) => println!(
                "  City {} to city {}: cost {} over {} nodes",
                first,
                last,
                path.cost,
                path.nodes.len()
            ),
            None => println!("  City {} to city {}: unreachable", first, last),
        }
    }
}

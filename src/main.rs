use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use hexhold::cli::commands;
use hexhold::config::generation::GenerationParams;
use hexhold::config::simulation::SimulationConfig;
use hexhold::world::cell::Coord;

#[derive(Parser)]
#[command(name = "hexhold")]
#[command(about = "Deterministic hex world generation, pathfinding and a material-gated construction economy")]
#[command(version)]
struct Cli {
    /// Path to the simulation config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to a world generation config file; overrides --size and --seed
    #[arg(short, long, global = true)]
    worldgen: Option<String>,

    /// World side length in cells
    #[arg(long, global = true, default_value_t = 48)]
    size: u32,

    /// World seed
    #[arg(long, global = true, default_value_t = 12345)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and print its summary
    Generate {
        /// Also print the ASCII map
        #[arg(long)]
        map: bool,
    },

    /// Inspect a single cell
    Inspect {
        #[arg(short, long)]
        x: i32,

        #[arg(short, long)]
        y: i32,

        /// Print the cell as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find a path between two cells
    Path {
        #[arg(long, num_args = 2, value_names = ["X", "Y"], required = true, allow_negative_numbers = true)]
        from: Vec<i32>,

        #[arg(long, num_args = 2, value_names = ["X", "Y"], required = true, allow_negative_numbers = true)]
        to: Vec<i32>,
    },

    /// Build a structure next to the village
    Build {
        /// Structure type, e.g. campfire, house, farm
        #[arg(short, long)]
        kind: String,

        /// Labor applied per construction step
        #[arg(long, default_value_t = 5.0)]
        labor: f64,
    },

    /// Run the tick driver and print statistics
    Simulate {
        #[arg(short, long, default_value_t = 100)]
        ticks: u32,

        /// Print a statistics row every N ticks
        #[arg(long, default_value_t = 10)]
        report_every: u32,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn coord_arg(values: &[i32]) -> Coord {
    match values {
        [x, y] => Coord::new(*x, *y),
        _ => Coord::new(0, 0),
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match SimulationConfig::from_file(Path::new(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    init_tracing(&config.log_level);

    let params = match cli.worldgen.as_deref() {
        Some(path) => match GenerationParams::from_file(Path::new(path)) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error loading generation config: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let params = GenerationParams::new(cli.size, cli.seed);
            if let Err(e) = params.validate() {
                eprintln!("Invalid world parameters: {}", e);
                std::process::exit(1);
            }
            params
        }
    };

    let result = match cli.command {
        Commands::Generate { map } => commands::generate(&params, &config, map),
        Commands::Inspect { x, y, json } => commands::inspect(&params, &config, Coord::new(x, y), json),
        Commands::Path { from, to } => commands::path(&params, &config, coord_arg(&from), coord_arg(&to)),
        Commands::Build { kind, labor } => commands::build(&params, &config, &kind, labor),
        Commands::Simulate { ticks, report_every } => commands::simulate(&params, &config, ticks, report_every),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

use std::time::Instant;

use clap::Parser;
use itertools::Itertools;
use junction_sim::{Direction, RoadLayout, SimConfig, Simulation};

#[derive(Parser)]
#[command(name = "junction-sim")]
#[command(about = "Headless signalised junction traffic simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Wall-clock time per tick in seconds
    #[arg(long, default_value = "0.016666666666666666")]
    dt: f64,

    /// Traffic density level, 1 to 10
    #[arg(long)]
    density: Option<usize>,

    /// Seed for reproducible traffic
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation speed multiplier
    #[arg(long)]
    speed: Option<f64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    };

    let sim = match cli.seed {
        Some(seed) => Simulation::with_seed(&config, seed),
        None => Simulation::new(&config),
    };
    let mut sim = match sim {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Error: invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    if let Some(level) = cli.density {
        sim.set_density(level);
    }
    if let Some(speed) = cli.speed {
        sim.set_speed(speed);
    }

    print_layout(&config.layout);
    run_headless(&mut sim, cli.ticks, cli.dt);
}

/// Prints the length of every lane's route through the junction.
fn print_layout(layout: &RoadLayout) {
    for direction in Direction::ALL {
        let lengths = (0..layout.lanes.get(direction).len())
            .map(|lane| format!("{:.0}px", layout.path_length(direction, lane)))
            .join(", ");
        println!("{:>5} lanes: {}", direction, lengths);
    }
}

#[cfg(feature = "serde")]
fn load_config(path: Option<&std::path::Path>) -> Result<SimConfig, String> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
            SimConfig::from_json(&json).map_err(|err| err.to_string())
        }
        None => Ok(SimConfig::default()),
    }
}

#[cfg(not(feature = "serde"))]
fn load_config(path: Option<&std::path::Path>) -> Result<SimConfig, String> {
    match path {
        Some(_) => Err("loading a configuration requires the `serde` feature".to_string()),
        None => Ok(SimConfig::default()),
    }
}

/// Runs the simulation, printing a summary once per simulated second.
fn run_headless(sim: &mut Simulation, ticks: u32, dt: f64) {
    println!("Running junction simulation: {} ticks of {:.4}s", ticks, dt);
    let start = Instant::now();
    let mut next_report = 1.0;

    for _ in 0..ticks {
        sim.step(dt);
        if sim.elapsed() >= next_report {
            next_report += 1.0;
            print_summary(sim);
        }
    }

    println!("=== Final State ===");
    print_summary(sim);
    let wall = start.elapsed();
    println!(
        "Simulated {:.1}s in {:?} ({:.0}x real time)",
        sim.elapsed(),
        wall,
        sim.elapsed() / wall.as_secs_f64().max(f64::EPSILON)
    );
}

fn print_summary(sim: &Simulation) {
    let stats = sim.stats();
    let light = sim.light().status();
    let stopped = sim.iter_vehicles().filter(|veh| veh.speed() == 0.0).count();
    println!(
        "t={:>7.2}s  light {} {:?} ({:.1}s left)  vehicles {:>3} ({} stopped)  spawned {}  despawned {}  peak {}",
        sim.elapsed(),
        light.axis,
        light.state,
        light.remaining,
        stats.current,
        stopped,
        stats.total_spawned,
        stats.total_despawned,
        stats.max_concurrent,
    );
}

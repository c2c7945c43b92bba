mod scenario;
mod tui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sim::Simulation;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::scenario::Scenario;
use crate::tui::DashboardOptions;

#[derive(Debug, Parser)]
#[command(author, version, about = "Predator-prey island simulation")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/rossumoya.yaml")]
    scenario: PathBuf,

    /// Number of years to simulate (uses scenario value when omitted)
    #[arg(long)]
    years: Option<u32>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write yearly population totals to this CSV file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Save a checkpoint here when the run is over
    #[arg(long)]
    save: Option<PathBuf>,

    /// Continue from a checkpoint instead of building the scenario
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Show the live terminal dashboard
    #[arg(long)]
    dashboard: bool,

    /// Years between dashboard updates
    #[arg(long, default_value_t = 1)]
    vis_years: u32,

    /// Herbivores per cell at full heatmap intensity
    #[arg(long, default_value_t = 140)]
    cmax_herbivore: usize,

    /// Carnivores per cell at full heatmap intensity
    #[arg(long, default_value_t = 100)]
    cmax_carnivore: usize,
}

/// Years run when resuming without `--years`
const DEFAULT_RESUME_YEARS: u32 = 10;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biosim=info,sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let (mut simulation, years, scenario_log) = match &cli.resume {
        Some(path) => {
            tracing::info!("Resuming from {}", path.display());
            let simulation = Simulation::load(path)
                .with_context(|| format!("Failed to load checkpoint {}", path.display()))?;
            let years = cli.years.unwrap_or(DEFAULT_RESUME_YEARS);
            (simulation, years, None)
        }
        None => {
            let scenario = Scenario::load(&cli.scenario)?;
            tracing::info!(
                "Loaded scenario {}",
                scenario.name.as_deref().unwrap_or("(unnamed)")
            );
            let simulation = scenario.build(cli.seed)?;
            (simulation, scenario.years(cli.years), scenario.log_file)
        }
    };

    if let Some(path) = cli.log_file.or(scenario_log) {
        simulation
            .attach_log(&path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
    }

    let completed = if cli.dashboard {
        let options = DashboardOptions {
            vis_years: cli.vis_years,
            cmax_herbivore: cli.cmax_herbivore,
            cmax_carnivore: cli.cmax_carnivore,
            ..DashboardOptions::default()
        };
        tui::run(&mut simulation, years, &options)?
    } else {
        simulation.simulate_with(years, |_| std::ops::ControlFlow::Continue(()))?
    };

    if let Some(path) = &cli.save {
        simulation
            .save(path)
            .with_context(|| format!("Failed to save checkpoint {}", path.display()))?;
        tracing::info!("Checkpoint written to {}", path.display());
    }

    let count = simulation.num_animals_per_species();
    println!(
        "Simulated {} years (now year {}). Herbivores: {}, Carnivores: {}",
        completed,
        simulation.year(),
        count.herbivores,
        count.carnivores
    );
    Ok(())
}

//! CLI utility for running A* queries against navigation graphs

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec2;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nav_common::parse_vec2;
use nav_search::{NavGraph, PathTask};

/// A CLI utility for searching precomputed navigation graphs
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find a path between two points on a navigation graph
    FindPath {
        /// Input navigation graph file (JSON)
        #[clap(long, value_parser)]
        graph: PathBuf,

        /// Start position (x,y)
        #[clap(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        start: Vec2,

        /// Goal position (x,y)
        #[clap(long, value_parser = parse_vec2, allow_hyphen_values = true)]
        goal: Vec2,

        /// Output path file
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a navigation graph
    Info {
        /// Input navigation graph file (JSON)
        #[clap(long, value_parser)]
        graph: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match args.command {
        Commands::FindPath {
            graph,
            start,
            goal,
            output,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(find_path(&graph, start, goal, output.as_deref()))
        }
        Commands::Info { graph } => graph_info(&graph),
    }
}

fn load_graph(graph_path: &Path) -> Result<NavGraph> {
    log::info!("Loading navigation graph from {}...", graph_path.display());

    let graph = NavGraph::load_from_json(graph_path)
        .map_err(|e| anyhow!("Failed to load navigation graph: {}", e))?;

    log::info!(
        "Graph loaded: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(graph)
}

/// Find a path on a navigation graph
async fn find_path(
    graph_path: &Path,
    start: Vec2,
    goal: Vec2,
    output: Option<&Path>,
) -> Result<()> {
    let graph = Arc::new(load_graph(graph_path)?);

    log::info!("Finding path from {:?} to {:?}...", start, goal);

    let task = PathTask::spawn(graph, start, goal)
        .map_err(|e| anyhow!("Failed to start search: {}", e))?;
    task.wait_until_done()
        .await
        .map_err(|e| anyhow!("Search did not complete: {}", e))?;

    let outcome = task
        .outcome()
        .map_err(|e| anyhow!("Failed to find path: {}", e))?;

    match (outcome.start, outcome.goal, outcome.goal_cost) {
        (Some(start_ref), Some(goal_ref), Some(cost)) => log::info!(
            "Found path {} -> {} with cost {} ({} nodes expanded)",
            start_ref,
            goal_ref,
            cost,
            outcome.expanded
        ),
        (Some(start_ref), Some(goal_ref), None) => log::warn!(
            "Goal {} is unreachable from {} ({} nodes expanded)",
            goal_ref,
            start_ref,
            outcome.expanded
        ),
        _ => log::warn!("Navigation graph is empty"),
    }

    if let Some(output_path) = output {
        log::info!("Saving path to {}...", output_path.display());

        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;
        write_path(&mut file, start, goal, &outcome.path)?;
    } else {
        let stdout = std::io::stdout();
        write_path(&mut stdout.lock(), start, goal, &outcome.path)?;
    }

    Ok(())
}

/// Writes one `x,y` waypoint per line after a short header
fn write_path<W: Write>(out: &mut W, start: Vec2, goal: Vec2, path: &[Vec2]) -> Result<()> {
    writeln!(out, "# Path from {},{} to {},{}", start.x, start.y, goal.x, goal.y)?;
    writeln!(out, "# {} waypoints", path.len())?;

    for waypoint in path {
        writeln!(out, "{},{}", waypoint.x, waypoint.y)?;
    }

    Ok(())
}

/// Print a summary of a navigation graph
fn graph_info(graph_path: &Path) -> Result<()> {
    let graph = load_graph(graph_path)?;

    let levels: std::collections::BTreeSet<i32> = graph.nodes().iter().map(|n| n.level).collect();
    let isolated = graph
        .iter()
        .filter(|(node_ref, _)| graph.neighbors(*node_ref).is_empty())
        .count();

    println!("Nodes: {}", graph.node_count());
    println!("Edges: {}", graph.edge_count());
    println!("Levels: {:?}", levels);
    println!("Nodes without neighbors: {}", isolated);

    Ok(())
}

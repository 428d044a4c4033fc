use std::path::PathBuf;

use clap::Parser;
use sweepwise_core::{CellCount, Coord, Coord2, GridView, SolveEvent, SolveStatus, Solver};
use web_time::Instant;

use config::{Order, Preset, RenderMode, RunConfig};

mod config;

#[derive(Parser, Debug)]
#[command(version, about = "Plays minesweeper by deduction, guessing only when stuck", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Board size and mine count to start from
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// Board width, overrides the preset
    #[arg(long)]
    width: Option<Coord>,

    /// Board height, overrides the preset
    #[arg(long)]
    height: Option<Coord>,

    /// Number of mines, overrides the preset
    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Order in which dirty cells are re-checked
    #[arg(long, value_enum)]
    order: Option<Order>,

    /// When to print the board
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// JSON file with run settings, flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

/// Whether `event` gets a board printed under `mode`. A guess frame already shows the board a
/// finished game ends on, so `Guesses` skips the final event.
fn renders(mode: RenderMode, event: SolveEvent) -> bool {
    match (mode, event) {
        (RenderMode::Guesses, SolveEvent::Guess(_)) => true,
        (RenderMode::End, SolveEvent::Finished(_)) => true,
        _ => false,
    }
}

fn highlight(event: SolveEvent) -> Option<Coord2> {
    match event {
        SolveEvent::Guess(coords) => Some(coords),
        SolveEvent::Finished(SolveStatus::Lost { mine }) => Some(mine),
        SolveEvent::Finished(_) => None,
    }
}

impl Args {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            preset: self.preset,
            width: self.width,
            height: self.height,
            mines: self.mines,
            seed: self.seed,
            order: self.order.map(Into::into),
            render: self.render,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let file_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let settings = file_config.merge(args.overrides()).resolve()?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    let (width, height) = settings.game.size;
    log::info!(
        "{width}x{height} board with {} mines, seed {seed}, {:?} order",
        settings.game.mines,
        settings.order
    );

    let mut solver = Solver::seeded(settings.game, seed, settings.order);

    let start = Instant::now();
    let status = solver.solve_with(|engine, event| {
        if renders(settings.render, event) {
            print!("{}", GridView::new(engine.grid()).with_highlight(highlight(event)));
        }
    });
    let elapsed = start.elapsed();

    println!("{status} after {} guesses (seed {seed})", solver.guesses());
    println!("time elapsed during solve: {:.3} s", elapsed.as_secs_f64());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&solver.report())?);
    }

    Ok(())
}

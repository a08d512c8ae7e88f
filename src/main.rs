use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cctt_solver::diagnostics::EprintDiagnostics;
use cctt_solver::evaluator::Evaluator;
use cctt_solver::faculty::Faculty;
use cctt_solver::funnel::{run_funnel, FunnelConfig};
use cctt_solver::mutation::MutationConfig;
use cctt_solver::solver::{Score, ShotConfig};
use cctt_solver::timetable::Timetable;
use cctt_solver::utils::{indent_lines, parse_bool_input};

/// Solves an ITC-2007 Track 3 (curriculum-based course timetabling)
/// instance via a parallel multi-shot stochastic local search.
#[derive(Debug, Parser)]
struct Args {
    /// Path to the faculty (problem instance) file.
    faculty_path: PathBuf,
    /// Path the best solution found is written to.
    output_path: PathBuf,

    /// Resume the search from an existing solution file instead of a
    /// random initial placement.
    #[arg(long)]
    from_solution: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Hard-violation weight in the ranking function. Defaults to
    /// `100 * sum(required lectures)` when omitted, per §4.4.4.
    #[arg(long)]
    violation_cost: Option<u64>,

    #[arg(long, default_value_t = 16)]
    shots: usize,
    #[arg(long, default_value_t = 200)]
    iterations: u64,
    #[arg(long, default_value_t = 2)]
    slices: usize,
    #[arg(long, default_value_t = 0.5)]
    slice_ratio: f64,
    #[arg(long, default_value_t = 20)]
    max_consecutive_rejects: u64,

    #[arg(long, default_value = "true", value_parser = parse_bool_arg)]
    sort_courses: bool,
    #[arg(long, default_value = "true", value_parser = parse_bool_arg)]
    repeat_sliced_results: bool,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// Worker pool size; defaults to the number of logical CPUs.
    #[arg(long)]
    workers: Option<usize>,
}

fn parse_bool_arg(value: &str) -> Result<bool, String> {
    parse_bool_input(value).map_err(|err| err.to_string())
}

fn main_impl() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .init();

    let faculty_text = fs::read_to_string(&args.faculty_path)
        .with_context(|| format!("reading faculty file {}", args.faculty_path.display()))?;
    let faculty = Faculty::from_str(&faculty_text)
        .with_context(|| format!("parsing faculty file {}", args.faculty_path.display()))?;

    log::info!(
        "Loaded faculty {:?}: {} courses, {} rooms, {} curricula, {} periods",
        faculty.name,
        faculty.num_courses(),
        faculty.num_rooms(),
        faculty.num_curricula(),
        faculty.total_periods(),
    );

    let violation_cost = args
        .violation_cost
        .unwrap_or_else(|| 100 * faculty.total_required_lectures());

    let initial = match &args.from_solution {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading solution file {}", path.display()))?;
            let diagnostics = EprintDiagnostics;
            Some(Timetable::from_stream(&faculty, text.as_bytes(), &diagnostics)?)
        }
        None => None,
    };

    let funnel_config = FunnelConfig {
        shots: args.shots,
        slices: args.slices,
        slice_ratio: args.slice_ratio,
        repeat_sliced_results: args.repeat_sliced_results,
        workers: args.workers.unwrap_or_else(num_cpus::get),
        shot: ShotConfig {
            iterations: args.iterations,
            max_consecutive_rejects: args.max_consecutive_rejects,
            violation_cost,
            sort_courses: args.sort_courses,
        },
        mutation: MutationConfig::default(),
    };

    log::info!(
        "Starting solve: seed={}, shots={}, iterations={}, slices={}, slice_ratio={}, violation_cost={violation_cost}",
        args.seed,
        funnel_config.shots,
        funnel_config.shot.iterations,
        funnel_config.slices,
        funnel_config.slice_ratio,
    );

    let (Score(cost), best) = run_funnel(&faculty, args.seed, initial, &funnel_config);
    log::info!("Best cost found: {cost}");

    let mut report = Vec::new();
    Evaluator::new(&faculty, &best).report(&mut report)?;
    log::debug!(
        "Breakdown of best solution:\n{}",
        indent_lines(&String::from_utf8_lossy(&report), 4)
    );

    let mut output_file = fs::File::create(&args.output_path)
        .with_context(|| format!("creating output file {}", args.output_path.display()))?;
    best.to_stream(&mut output_file)
        .with_context(|| format!("writing solution to {}", args.output_path.display()))?;

    Ok(())
}

fn main() {
    if let Err(err) = main_impl() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cctt_solver::diagnostics::EprintDiagnostics;
use cctt_solver::evaluator::Evaluator;
use cctt_solver::faculty::Faculty;
use cctt_solver::timetable::Timetable;

/// Validates a solution against a faculty instance, printing the §6.4
/// fixed-format diagnostic report (per-category violation lines, eight
/// summary lines, and a final `Summary:` line).
#[derive(Debug, Parser)]
struct Args {
    faculty_path: PathBuf,
    solution_path: PathBuf,
}

fn main_impl() -> Result<()> {
    let args = Args::parse();

    let faculty_text = fs::read_to_string(&args.faculty_path)
        .with_context(|| format!("reading faculty file {}", args.faculty_path.display()))?;
    let faculty = Faculty::from_str(&faculty_text)
        .with_context(|| format!("parsing faculty file {}", args.faculty_path.display()))?;

    let solution_text = fs::read_to_string(&args.solution_path)
        .with_context(|| format!("reading solution file {}", args.solution_path.display()))?;

    let diagnostics = EprintDiagnostics;
    let timetable = Timetable::from_stream(&faculty, solution_text.as_bytes(), &diagnostics)?;

    let evaluator = Evaluator::new(&faculty, &timetable);
    let stdout = std::io::stdout();
    evaluator.report(stdout.lock())?;

    Ok(())
}

fn main() {
    if let Err(err) = main_impl() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

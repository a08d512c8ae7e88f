//! The multi-shot funnel (§4.5): dispatches `shots` parallel local-search
//! shots across a worker pool, repeatedly keeps the best fraction and
//! re-runs them, and returns the global minimum seen across every round.
//!
//! Determinism (§5): the master RNG draws every per-shot seed, in slot
//! order, before any shot in that round is dispatched. Workers never touch
//! the master RNG or each other's local RNG. Result *slot order* is
//! preserved by writing each shot's output into a pre-sized `Vec` through
//! a `&mut` the worker closure owns exclusively, independent of which
//! worker happens to finish first.

use scoped_threadpool::Pool;

use crate::evaluator::Evaluator;
use crate::faculty::Faculty;
use crate::mutation::MutationConfig;
use crate::solver::{run_shot, Score, ShotConfig};
use crate::timetable::Timetable;

#[derive(Debug, Clone)]
pub struct FunnelConfig {
    pub shots: usize,
    pub slices: usize,
    pub slice_ratio: f64,
    pub repeat_sliced_results: bool,
    pub workers: usize,
    pub shot: ShotConfig,
    pub mutation: MutationConfig,
}

type ShotResult<'f> = (Score, Timetable<'f>);

fn refreshed_clone<'f>(tt: &Timetable<'f>) -> Timetable<'f> {
    let mut clone = tt.clone_unrefreshed();
    clone.refresh();
    clone
}

/// Runs one round: dispatches `tasks.len()` shots, each pre-seeded with
/// the matching entry of `tasks` and `inner_seeds` (same slot index),
/// across `config.workers` worker threads.
fn dispatch<'f>(
    faculty: &'f Faculty,
    tasks: Vec<Option<ShotResult<'f>>>,
    inner_seeds: &[u64],
    config: &FunnelConfig,
) -> Vec<ShotResult<'f>> {
    let mut pool = Pool::new(config.workers.max(1) as u32);
    let mut results: Vec<Option<ShotResult<'f>>> = (0..tasks.len()).map(|_| None).collect();

    pool.scoped(|scope| {
        for ((task, &inner_seed), out_slot) in tasks
            .into_iter()
            .zip(inner_seeds.iter())
            .zip(results.iter_mut())
        {
            let mutation_config = &config.mutation;
            let shot_config = config.shot;
            scope.execute(move || {
                *out_slot = Some(run_shot(faculty, task, inner_seed, shot_config, mutation_config));
            });
        }
    });

    results
        .into_iter()
        .map(|slot| slot.expect("every dispatched slot is filled before join returns"))
        .collect()
}

/// Draws `n` fresh per-shot seeds from the master RNG, in slot order, so
/// the sequence is a deterministic function of the master seed and the
/// number of prior draws.
fn draw_inner_seeds(master_rng: &mut fastrand::Rng, n: usize) -> Vec<u64> {
    (0..n).map(|_| master_rng.u64(1..=u64::MAX)).collect()
}

/// Retains the `top` lowest-cost results, ties broken by earliest slot
/// index (the sort key pairs score with original index, so equal scores
/// keep their original relative order).
fn retain_best(results: Vec<ShotResult<'_>>, top: usize) -> Vec<ShotResult<'_>> {
    let mut indexed: Vec<(usize, ShotResult)> = results.into_iter().enumerate().collect();
    indexed.sort_by_key(|(idx, (score, _))| (*score, *idx));
    indexed.truncate(top);
    indexed.into_iter().map(|(_, result)| result).collect()
}

/// Runs the full multi-shot funnel (§4.5). If `initial` is supplied, every
/// shot in round zero resumes from a copy of it (under its own seed)
/// rather than building a fresh random placement — the spec's invariant
/// that `--from-solution` never raises the cost above the loaded
/// solution's own evaluation reads most naturally as a property of the
/// whole run, not of one arbitrarily chosen slot.
pub fn run_funnel<'f>(
    faculty: &'f Faculty,
    seed: u64,
    initial: Option<Timetable<'f>>,
    config: &FunnelConfig,
) -> (Score, Timetable<'f>) {
    assert!(config.shots > 0, "funnel requires at least one shot");
    let mut master_rng = fastrand::Rng::with_seed(seed);

    let initial_task: Option<(Score, Timetable<'f>)> = initial.map(|tt| {
        let score = Score::from_evaluator(&Evaluator::new(faculty, &tt), config.shot.violation_cost);
        (score, tt)
    });

    let tasks: Vec<Option<ShotResult<'f>>> = (0..config.shots)
        .map(|_| initial_task.as_ref().map(|(score, tt)| (*score, refreshed_clone(tt))))
        .collect();

    let inner_seeds = draw_inner_seeds(&mut master_rng, config.shots);
    let mut results = dispatch(faculty, tasks, &inner_seeds, config);

    let mut global_best: ShotResult<'f> = results
        .iter()
        .min_by_key(|(score, _)| *score)
        .map(|(score, tt)| (*score, refreshed_clone(tt)))
        .expect("at least one shot ran");

    for _ in 0..config.slices {
        let top = (results.len() as f64 * config.slice_ratio).floor() as usize;
        if top == 0 {
            break;
        }

        let retained = retain_best(results, top);

        let slot_count = if config.repeat_sliced_results {
            config.shots
        } else {
            retained.len()
        };
        let inner_seeds = draw_inner_seeds(&mut master_rng, slot_count);

        let next_tasks: Vec<Option<ShotResult<'f>>> = (0..slot_count)
            .map(|i| {
                let (score, tt) = &retained[i % retained.len()];
                Some((*score, refreshed_clone(tt)))
            })
            .collect();

        results = dispatch(faculty, next_tasks, &inner_seeds, config);

        if let Some((score, tt)) = results.iter().min_by_key(|(score, _)| *score) {
            if *score < global_best.0 {
                global_best = (*score, refreshed_clone(tt));
            }
        }
    }

    global_best
}

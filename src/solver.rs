//! Single-shot solver: initial placement followed by a metropolis-style
//! neighbourhood walk, accepting improving moves and occasionally
//! accepting a worsening move through a fixed warm-restart noise floor.

use crate::evaluator::Evaluator;
use crate::faculty::Faculty;
use crate::mutation::{self, MutationConfig};
use crate::timetable::Timetable;

/// Fixed probability of accepting a worsening move (§4.4.3).
pub const ACCEPTANCE_NOISE_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct ShotConfig {
    pub iterations: u64,
    pub max_consecutive_rejects: u64,
    pub violation_cost: u64,
    pub sort_courses: bool,
}

/// `cost = hard_count * violation_cost + soft_count`, the ranking function
/// used to compare timetables across the whole funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub u64);

impl Score {
    pub fn from_evaluator(eval: &Evaluator, violation_cost: u64) -> Self {
        Score(eval.total_violation_cost() * violation_cost + eval.total_soft_cost())
    }
}

fn score_of(faculty: &Faculty, tt: &Timetable, violation_cost: u64) -> Score {
    Score::from_evaluator(&Evaluator::new(faculty, tt), violation_cost)
}

fn should_accept(old: Score, new: Score, rng: &mut fastrand::Rng) -> bool {
    new < old || rng.f64() < ACCEPTANCE_NOISE_FLOOR
}

/// Runs one complete local-search shot.
///
/// `prev` carries an optional `(cost, timetable)` the caller already
/// evaluated (e.g. re-entering from a funnel slice, or `--from-solution`);
/// when absent the shot builds its own initial placement and evaluates it.
/// The local RNG is seeded once, here, from `inner_seed`, and used for
/// every draw inside the shot (mutation sampling, occupancy picks, the
/// acceptance noise draw) in that fixed order.
pub fn run_shot<'f>(
    faculty: &'f Faculty,
    prev: Option<(Score, Timetable<'f>)>,
    inner_seed: u64,
    config: ShotConfig,
    mutation_config: &MutationConfig,
) -> (Score, Timetable<'f>) {
    let mut rng = fastrand::Rng::with_seed(inner_seed);

    let (mut cost, mut current) = match prev {
        Some((cost, tt)) => (cost, tt),
        None => {
            let tt = mutation::init(faculty, config.sort_courses, &mut rng);
            let cost = score_of(faculty, &tt, config.violation_cost);
            (cost, tt)
        }
    };

    let mut rejects = 0u64;

    for _ in 0..config.iterations {
        if rejects > config.max_consecutive_rejects {
            break;
        }

        let candidate = mutation::iterate(faculty, &current, &mut rng, mutation_config);
        let candidate_cost = if candidate == current {
            cost
        } else {
            score_of(faculty, &candidate, config.violation_cost)
        };

        if should_accept(cost, candidate_cost, &mut rng) {
            current = candidate;
            cost = candidate_cost;
            rejects = 0;
        } else {
            rejects += 1;
        }
    }

    (cost, current)
}

use anyhow::{bail, Result};

/// Draw one item from a weighted categorical distribution.
///
/// Weights are relative, not required to sum to anything in particular.
/// Panics if `items` is empty or every weight is zero, since that means
/// the caller built a malformed distribution.
pub fn weighted_choice<T: Copy>(rng: &mut fastrand::Rng, items: &[(T, u32)]) -> T {
    let total: u32 = items.iter().map(|(_, weight)| *weight).sum();
    assert!(total > 0, "weighted_choice: no weight to draw from");

    let mut draw = rng.u32(0..total);
    for (item, weight) in items {
        if draw < *weight {
            return *item;
        }
        draw -= weight;
    }
    unreachable!("weighted_choice: draw exceeded cumulative weight")
}

/// Pick a uniformly random index from `0..n`, excluding `exclude` if given.
///
/// Excludes by compacting the range rather than by rejection sampling, so
/// it terminates in one draw regardless of how small `n` is.
pub fn uniform_excluding(rng: &mut fastrand::Rng, n: usize, exclude: Option<usize>) -> Option<usize> {
    match exclude {
        None => (n > 0).then(|| rng.usize(0..n)),
        Some(excluded) if n > 1 => {
            let draw = rng.usize(0..n - 1);
            Some(if draw >= excluded { draw + 1 } else { draw })
        }
        Some(_) => None,
    }
}

pub fn parse_bool_input(value: &str) -> Result<bool> {
    let matches_any_ignore_ascii_case = |possibilities: &[&str]| {
        possibilities
            .iter()
            .any(|expected| value.eq_ignore_ascii_case(expected))
    };

    if matches_any_ignore_ascii_case(&["y", "yes", "true", "1"]) {
        return Ok(true);
    }

    if matches_any_ignore_ascii_case(&["n", "no", "false", "0"]) {
        return Ok(false);
    }

    bail!("could not parse {value:?} as a boolean")
}

#[allow(clippy::format_collect)]
pub fn indent_lines(msg: &str, indentation: usize) -> String {
    msg.lines()
        .map(|line| format!("{}{line}\n", " ".repeat(indentation)))
        .collect::<String>()
}

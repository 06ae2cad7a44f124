//! Per-run source visiting order.
//!
//! The order is a left rotation of the configured source list. After a
//! successful attempt the next run starts one past that source; after a
//! failed or interrupted attempt it starts on the same source again.

use crate::scheduler::state::RunOutcome;

/// Index the next run starts from.
#[must_use]
pub fn pivot_index<S: AsRef<str>>(
    sources: &[S],
    last_source: Option<&str>,
    last_state: Option<RunOutcome>,
) -> usize {
    if sources.is_empty() {
        return 0;
    }
    let Some(index) =
        last_source.and_then(|last| sources.iter().position(|s| s.as_ref() == last))
    else {
        return 0;
    };

    match last_state {
        Some(RunOutcome::Success) => (index + 1) % sources.len(),
        // A missing outcome next to a known source means the outcome write never landed.
        Some(RunOutcome::Incomplete | RunOutcome::Failed) | None => index,
    }
}

/// Visiting order for the current run.
#[must_use]
pub fn rotate<S: AsRef<str> + Clone>(
    sources: &[S],
    last_source: Option<&str>,
    last_state: Option<RunOutcome>,
) -> Vec<S> {
    let mut order = sources.to_vec();
    let pivot = pivot_index(sources, last_source, last_state);
    order.rotate_left(pivot);
    order
}

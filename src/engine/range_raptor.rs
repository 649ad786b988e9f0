use crate::engine::calculator::TimeCalculator;
use crate::engine::heuristics::StopHeuristics;
use crate::engine::standard::StandardWorker;
use crate::fallback::FallbackPath;
use crate::request::SearchParams;
use crate::response::Journey;
use crate::schedule::{Schedule, SlackProvider};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};
use std::time::Instant;
use tracing::debug;

/// The result of a range search with one of the standard profiles.
#[derive(Debug)]
pub(crate) struct RangeOutcome {
    pub journey: Option<Journey>,
    pub stopped_at_deadline: bool,
}

/// The anchors of the successive iterations, ordered so that every
/// iteration relaxes the previous one : per-stop best times then carry
/// over, and an iteration only explores what it improves.
///
/// `base` is the requested anchor (earliest departure forward, latest
/// arrival backward); the first iteration starts a full `window` away
/// from it and the following ones come back toward it one `step` at a
/// time, `base` itself always included.
pub(crate) fn iteration_anchors<C: TimeCalculator>(
    base: &SecondsSinceScheduleStart,
    window: &PositiveDuration,
    step: &PositiveDuration,
) -> Vec<SecondsSinceScheduleStart> {
    debug_assert!(step.total_seconds() > 0);
    let far_edge = match C::shift(base, window) {
        Some(time) => time,
        None => *base,
    };
    let nb_of_steps = (window.total_seconds() / step.total_seconds()) as u32;
    let mut anchors = Vec::with_capacity(nb_of_steps as usize + 1);
    for k in 0..=nb_of_steps {
        match C::unshift(&far_edge, &(*step * k)) {
            Some(anchor) => anchors.push(anchor),
            None => break,
        }
    }
    if anchors.last() != Some(base) {
        anchors.push(*base);
    }
    anchors
}

/// Run a full range search with one of the standard profiles : one
/// propagation per anchor, best times and best solution carried across
/// iterations.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_range<C: TimeCalculator>(
    schedule: &Schedule,
    params: &SearchParams,
    slacks: &dyn SlackProvider,
    seeds: &[FallbackPath],
    targets: Vec<FallbackPath>,
    heuristics: Option<&StopHeuristics>,
    base_anchor: &SecondsSinceScheduleStart,
    window: &PositiveDuration,
    deadline: Option<Instant>,
) -> RangeOutcome {
    let anchors = iteration_anchors::<C>(base_anchor, window, &params.iteration_step);
    let mut worker = StandardWorker::<C>::new(schedule, params, slacks, targets, heuristics);
    let mut stopped_at_deadline = false;
    for (iteration, anchor) in anchors.iter().enumerate() {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                debug!(
                    "range search stopped at its deadline after {} of {} iterations",
                    iteration,
                    anchors.len()
                );
                stopped_at_deadline = true;
                break;
            }
        }
        worker.solve_iteration(seeds, anchor);
    }
    RangeOutcome {
        journey: worker
            .into_best_solution()
            .map(|solution| solution.journey),
        stopped_at_deadline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::{BackwardCalculator, ForwardCalculator};

    #[test]
    fn forward_anchors_walk_back_to_the_base() {
        let base = SecondsSinceScheduleStart::from_seconds(1000);
        let anchors = iteration_anchors::<ForwardCalculator>(
            &base,
            &PositiveDuration::from_seconds(150),
            &PositiveDuration::from_seconds(60),
        );
        let seconds: Vec<u32> = anchors.iter().map(|a| a.total_seconds()).collect();
        assert_eq!(seconds, vec![1150, 1090, 1030, 1000]);
    }

    #[test]
    fn backward_anchors_walk_up_to_the_base() {
        let base = SecondsSinceScheduleStart::from_seconds(1000);
        let anchors = iteration_anchors::<BackwardCalculator>(
            &base,
            &PositiveDuration::from_seconds(120),
            &PositiveDuration::from_seconds(60),
        );
        let seconds: Vec<u32> = anchors.iter().map(|a| a.total_seconds()).collect();
        assert_eq!(seconds, vec![880, 940, 1000]);
    }
}

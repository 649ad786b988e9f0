use crate::engine::calculator::TimeCalculator;
use crate::engine::standard::StandardWorker;
use crate::fallback::FallbackPath;
use crate::request::{Profile, SearchParams};
use crate::schedule::{Schedule, StandardSlack, Stop};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};

/// Per-stop lower bounds toward the destination, computed with one
/// propagation pass in the opposite direction of the main search.
///
/// The pass runs in the no-wait domain, so `best_duration` is a bound on
/// traveling time that holds whatever the departure minute : the main
/// search may use it to discard labels that cannot beat the best known
/// journey, and stops the pass never reached cannot reach the
/// destination at all.
#[derive(Debug)]
pub struct StopHeuristics {
    durations: Vec<Option<PositiveDuration>>,
    rides: Vec<Option<u8>>,
}

impl StopHeuristics {
    /// The least traveling time from `stop` to any destination fallback,
    /// the fallback itself included. `None` when the destination cannot
    /// be reached from `stop`.
    pub fn best_duration(&self, stop: &Stop) -> Option<PositiveDuration> {
        self.durations[stop.idx]
    }

    /// The least number of vehicle legs needed from `stop` to any
    /// destination fallback, flex rides included.
    pub fn best_rides(&self, stop: &Stop) -> Option<u8> {
        self.rides[stop.idx]
    }

    /// A bound on the full journey duration : the best over `fallbacks`
    /// of the fallback walk plus the bound at its stop. Used to size the
    /// search window when the caller leaves it unset.
    pub fn estimated_duration(&self, fallbacks: &[FallbackPath]) -> Option<PositiveDuration> {
        fallbacks
            .iter()
            .filter_map(|fallback| {
                self.best_duration(&fallback.stop)
                    .map(|duration| duration + fallback.duration)
            })
            .min()
    }
}

/// Run the heuristic pass. `C` is the direction of the PASS itself, the
/// opposite of the main search : its seeds are the main search targets,
/// and `anchor` must sit on the far side of the window so that every
/// journey of the main search fits between a label and the anchor.
pub(crate) fn compute_heuristics<C: TimeCalculator>(
    schedule: &Schedule,
    params: &SearchParams,
    sources: &[FallbackPath],
    anchor: &SecondsSinceScheduleStart,
) -> StopHeuristics {
    let pass_params = SearchParams {
        profile: Profile::NoWaitStandard,
        ..params.clone()
    };
    let slacks = StandardSlack {
        board: params.board_slack,
        alight: params.alight_slack,
        transfer: params.transfer_slack,
    };
    let mut worker =
        StandardWorker::<C>::new(schedule, &pass_params, &slacks, Vec::new(), None);
    worker.solve_iteration(sources, anchor);

    let nb_of_stops = schedule.nb_of_stops();
    let mut durations = Vec::with_capacity(nb_of_stops);
    let mut rides = Vec::with_capacity(nb_of_stops);
    for idx in 0..nb_of_stops {
        let stop = Stop { idx };
        durations.push(
            worker
                .best_time_at(&stop)
                .and_then(|time| C::elapsed(anchor, time)),
        );
        rides.push(worker.first_round_at(&stop));
    }
    StopHeuristics { durations, rides }
}

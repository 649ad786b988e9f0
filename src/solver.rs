// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia

use std::time::Instant;

use tracing::{debug, trace};

use crate::engine::calculator::{BackwardCalculator, ForwardCalculator};
use crate::engine::heuristics::{compute_heuristics, StopHeuristics};
use crate::engine::multicriteria::solve_multicriteria;
use crate::engine::range_raptor::solve_range;
use crate::fallback::FallbackPath;
use crate::request::{BadRequest, Profile, RequestInput, SearchDirection};
use crate::response::{Journey, Response};
use crate::schedule::{Schedule, StandardSlack};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};

/// Base of the computed search window, added to the estimated journey
/// duration when the caller does not provide a window.
const DYNAMIC_WINDOW_BASE: PositiveDuration = PositiveDuration::from_seconds(30 * 60);

/// Solve `request` on `schedule`.
///
/// Synchronously rejects malformed requests with a [`BadRequest`]; an
/// empty journey set is not an error. When `deadline` is given, the
/// search stops between two range iterations once it has passed, and
/// returns the journeys found so far.
pub fn solve(
    schedule: &Schedule,
    request: &RequestInput,
    deadline: Option<Instant>,
) -> Result<Response, BadRequest> {
    let params = &request.params;

    if params.iteration_step == PositiveDuration::zero() {
        return Err(BadRequest::IterationStepIsZero);
    }
    if let Some(window) = &params.search_window {
        if *window > params.max_search_window {
            return Err(BadRequest::SearchWindowTooLarge);
        }
    }

    let calendar = schedule.calendar();
    let departure_time = calendar
        .from_naive_datetime(&request.departure_datetime)
        .ok_or(BadRequest::DepartureDatetime)?;
    let arrival_time = match &request.arrival_datetime {
        Some(datetime) => {
            let arrival_time = calendar
                .from_naive_datetime(datetime)
                .ok_or(BadRequest::ArrivalDatetime)?;
            if arrival_time < departure_time {
                return Err(BadRequest::ArrivalBeforeDeparture);
            }
            Some(arrival_time)
        }
        None => None,
    };

    if !request
        .accesses
        .iter()
        .any(|access| !schedule.is_banned(&access.stop))
    {
        return Err(BadRequest::NoValidAccess);
    }
    if !request
        .egresses
        .iter()
        .any(|egress| !schedule.is_banned(&egress.stop))
    {
        return Err(BadRequest::NoValidEgress);
    }

    if params.profile == Profile::MultiCriteria && params.direction == SearchDirection::Reverse {
        return Err(BadRequest::UnsupportedCombination(
            "a multicriteria search cannot run in reverse",
        ));
    }
    if params.direction == SearchDirection::Reverse
        && params.use_guaranteed_transfers
        && request.accesses.iter().any(FallbackPath::is_flex)
    {
        return Err(BadRequest::UnsupportedCombination(
            "a reverse search with guaranteed transfers cannot use flex accesses",
        ));
    }

    let slacks = StandardSlack {
        board: params.board_slack,
        alight: params.alight_slack,
        transfer: params.transfer_slack,
    };

    // the seeds of the main search are where it starts from ; for a
    // reverse search that is the egress side
    let (seeds, targets) = match params.direction {
        SearchDirection::Forward => (&request.accesses, &request.egresses),
        SearchDirection::Reverse => (&request.egresses, &request.accesses),
    };

    // the heuristic pass runs in the opposite direction, seeded from the
    // targets of the main search, with an anchor on the far side of the
    // schedule so that every candidate journey fits before it
    let heuristics = match params.direction {
        SearchDirection::Forward => compute_heuristics::<BackwardCalculator>(
            schedule,
            params,
            targets,
            &schedule_end(schedule),
        ),
        SearchDirection::Reverse => compute_heuristics::<ForwardCalculator>(
            schedule,
            params,
            targets,
            &SecondsSinceScheduleStart::zero(),
        ),
    };

    let search_window_used = match &params.search_window {
        Some(window) => *window,
        None => dynamic_search_window(schedule, params, seeds, &heuristics),
    };

    let base_anchor = match params.direction {
        SearchDirection::Forward => departure_time,
        SearchDirection::Reverse => match arrival_time {
            Some(arrival_time) => arrival_time,
            None => return Err(BadRequest::MissingArrivalDatetime),
        },
    };

    let (mut journeys, stopped_at_deadline) = match (params.profile, params.direction) {
        (Profile::MultiCriteria, _) => {
            let outcome = solve_multicriteria(
                schedule,
                params,
                &slacks,
                &request.accesses,
                &request.egresses,
                Some(&heuristics),
                &base_anchor,
                &search_window_used,
                deadline,
            );
            (outcome.journeys, outcome.stopped_at_deadline)
        }
        (_, SearchDirection::Forward) => {
            let outcome = solve_range::<ForwardCalculator>(
                schedule,
                params,
                &slacks,
                seeds,
                targets.clone(),
                Some(&heuristics),
                &base_anchor,
                &search_window_used,
                deadline,
            );
            (outcome.journey.into_iter().collect(), outcome.stopped_at_deadline)
        }
        (_, SearchDirection::Reverse) => {
            let outcome = solve_range::<BackwardCalculator>(
                schedule,
                params,
                &slacks,
                seeds,
                targets.clone(),
                Some(&heuristics),
                &base_anchor,
                &search_window_used,
                deadline,
            );
            (outcome.journey.into_iter().collect(), outcome.stopped_at_deadline)
        }
    };

    keep_valid_journeys(schedule, &mut journeys);
    // in a forward search the requested arrival datetime is an upper
    // bound on the journeys, not an anchor
    if params.direction == SearchDirection::Forward {
        if let Some(latest_arrival) = &arrival_time {
            journeys.retain(|journey| {
                let keep = journey.arrival_time <= *latest_arrival;
                if !keep {
                    trace!("discarding a journey arriving after the requested arrival datetime");
                }
                keep
            });
        }
    }
    journeys.sort_by_key(|journey| journey.departure_time);

    debug!(
        "solved with {} journeys over a window of {}",
        journeys.len(),
        search_window_used
    );

    Ok(Response {
        journeys,
        search_window_used,
        stopped_at_deadline,
        heuristics,
    })
}

/// An upper bound on every instant of the schedule : one day past the
/// last calendar date, plus the largest allowed time in a day.
fn schedule_end(schedule: &Schedule) -> SecondsSinceScheduleStart {
    let calendar = schedule.calendar();
    let nb_of_days = (*calendar.last_date() - *calendar.first_date()).num_days() as u32 + 1;
    SecondsSinceScheduleStart::from_seconds(nb_of_days * 86_400 + 48 * 3_600)
}

/// Size the search window when the caller leaves it unset : a base
/// window plus half the estimated journey duration, rounded up to the
/// iteration step, clamped to the configured maximum.
fn dynamic_search_window(
    schedule: &Schedule,
    params: &crate::request::SearchParams,
    seeds: &[FallbackPath],
    heuristics: &StopHeuristics,
) -> PositiveDuration {
    let statistics = schedule.departure_statistics();
    if statistics.nb_of_departures == 0 {
        return params.iteration_step;
    }
    let estimated = heuristics
        .estimated_duration(seeds)
        .unwrap_or_else(PositiveDuration::zero);
    let raw_seconds = DYNAMIC_WINDOW_BASE.total_seconds() + estimated.total_seconds() / 2;
    let step_seconds = params.iteration_step.total_seconds();
    // round up to a whole number of iteration steps
    let rounded_seconds = raw_seconds.div_ceil(step_seconds) * step_seconds;
    let window = PositiveDuration::from_seconds(rounded_seconds.min(u64::from(u32::MAX)) as u32);
    window.min(params.max_search_window).max(params.iteration_step)
}

/// Discard journeys that fail the validity chain, with a trace of what
/// was wrong. A malformed journey is a lost result, not a failed
/// request.
fn keep_valid_journeys(schedule: &Schedule, journeys: &mut Vec<Journey>) {
    journeys.retain(|journey| match journey.is_valid(schedule) {
        Ok(()) => true,
        Err(bad_journey) => {
            trace!("discarding an invalid journey : {}", bad_journey);
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::SearchParams;
    use crate::schedule::FlowDirection;
    use crate::time::Calendar;
    use chrono::NaiveDate;

    fn t(seconds: u32) -> SecondsSinceScheduleStart {
        SecondsSinceScheduleStart::from_seconds(seconds)
    }

    fn small_schedule() -> Schedule {
        let first = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let calendar = Calendar::new(first, first);
        let mut schedule = Schedule::new(calendar);
        let a = schedule.add_stop("A");
        let b = schedule.add_stop("B");
        let mission = schedule.add_mission(
            "1",
            vec![a, b],
            vec![FlowDirection::BoardOnly, FlowDirection::DebarkOnly],
            vec![true, true],
            0,
            0,
            0,
        );
        schedule
            .add_trip(&mission, vec![t(36_000), t(36_600)], vec![t(36_000), t(36_600)], false)
            .unwrap();
        schedule
    }

    fn base_request(schedule: &Schedule) -> RequestInput {
        let a = schedule.stop_by_name("A").unwrap();
        let b = schedule.stop_by_name("B").unwrap();
        RequestInput {
            departure_datetime: NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            arrival_datetime: None,
            accesses: vec![FallbackPath::new(a, PositiveDuration::zero())],
            egresses: vec![FallbackPath::new(b, PositiveDuration::zero())],
            params: serde_json::from_str::<SearchParams>("{}").unwrap(),
        }
    }

    #[test]
    fn departure_outside_calendar_is_rejected() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        request.departure_datetime = NaiveDate::from_ymd_opt(2022, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            solve(&schedule, &request, None).unwrap_err(),
            BadRequest::DepartureDatetime
        );
    }

    #[test]
    fn arrival_before_departure_is_rejected() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        request.arrival_datetime = Some(
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        );
        assert_eq!(
            solve(&schedule, &request, None).unwrap_err(),
            BadRequest::ArrivalBeforeDeparture
        );
    }

    #[test]
    fn forward_arrival_datetime_bounds_the_journeys() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        request.params.search_window = Some(PositiveDuration::from_seconds(2 * 3_600));
        // the only trip arrives at 10:10:00
        request.arrival_datetime = Some(
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(10, 5, 0)
                .unwrap(),
        );
        let response = solve(&schedule, &request, None).unwrap();
        assert!(response.journeys.is_empty());

        request.arrival_datetime = Some(
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(11, 0, 0)
                .unwrap(),
        );
        let response = solve(&schedule, &request, None).unwrap();
        assert_eq!(response.journeys.len(), 1);
    }

    #[test]
    fn reverse_without_arrival_datetime_is_rejected() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        request.params.direction = SearchDirection::Reverse;
        assert_eq!(
            solve(&schedule, &request, None).unwrap_err(),
            BadRequest::MissingArrivalDatetime
        );
    }

    #[test]
    fn multicriteria_reverse_is_unsupported() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        request.params.profile = Profile::MultiCriteria;
        request.params.direction = SearchDirection::Reverse;
        request.arrival_datetime = Some(
            NaiveDate::from_ymd_opt(2021, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        assert!(matches!(
            solve(&schedule, &request, None).unwrap_err(),
            BadRequest::UnsupportedCombination(_)
        ));
    }

    #[test]
    fn explicit_window_is_echoed_back() {
        let schedule = small_schedule();
        let mut request = base_request(&schedule);
        let window = PositiveDuration::from_seconds(3_600);
        request.params.search_window = Some(window);
        let response = solve(&schedule, &request, None).unwrap();
        assert_eq!(response.search_window_used, window);
        assert_eq!(response.journeys.len(), 1);
    }

    #[test]
    fn dynamic_window_is_clamped_and_step_aligned() {
        let schedule = small_schedule();
        let request = base_request(&schedule);
        let response = solve(&schedule, &request, None).unwrap();
        let step = request.params.iteration_step.total_seconds();
        let window = response.search_window_used;
        assert!(window <= request.params.max_search_window);
        assert!(window >= request.params.iteration_step);
        assert_eq!(window.total_seconds() % step, 0);
    }
}

use crate::engine::best_times::{BestTimes, GuaranteedBoarding, Link, RoundsState, StopLabel};
use crate::engine::calculator::{
    can_disembark, can_embark, disembark_time, embarkable_trip, guaranteed_arrival_stop,
    guaranteed_arrival_trip, guaranteed_connections, is_scanned_before, next_scan_position,
    onboard_time, transfer_arrival_stop, transfer_departure_stop, transfers_departing,
    TimeCalculator,
};
use crate::engine::heuristics::StopHeuristics;
use crate::fallback::FallbackPath;
use crate::request::{Profile, SearchParams};
use crate::response::{Connection, Journey, VehicleLeg};
use crate::schedule::{Mission, Position, Schedule, SlackProvider, Stop, Trip};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::trace;

/// The best journey found so far, along with the keys it is compared on.
#[derive(Debug)]
pub(crate) struct Solution {
    /// time at which the journey completes, in the comparison domain of
    /// the profile (waits deducted for the no-wait profile)
    pub target_time: SecondsSinceScheduleStart,
    /// total number of vehicle legs, flex fallback rides included
    pub nb_of_legs: u8,
    pub journey: Journey,
}

/// A vehicle the scan of a mission is currently onboard of.
#[derive(Debug, Clone, Copy)]
struct Onboard {
    trip: Trip,
    embark_position: Position,
    via_guaranteed: Option<Stop>,
    /// waiting accumulated along the journey once onboard
    wait_offset: PositiveDuration,
}

enum ChainItem {
    Leg(VehicleLeg),
    Conn(Connection),
}

/// Round-based propagation for the single criterion profiles.
///
/// One worker runs all the iterations of a range search : the per-stop
/// best times and the best solution are kept across iterations, so that
/// later iterations only explore what they improve.
pub(crate) struct StandardWorker<'data, C: TimeCalculator> {
    schedule: &'data Schedule,
    params: &'data SearchParams,
    slacks: &'data dyn SlackProvider,
    heuristics: Option<&'data StopHeuristics>,
    /// fallback paths completing the journey : egresses when searching
    /// forward, accesses when searching backward
    targets: Vec<FallbackPath>,
    no_wait: bool,

    rounds: RoundsState,
    best_times: BestTimes,
    best_solution: Option<Solution>,
    /// fallback paths starting the journey in the current iteration
    seeds: Vec<FallbackPath>,
    anchor: SecondsSinceScheduleStart,

    _direction: PhantomData<C>,
}

impl<'data, C: TimeCalculator> StandardWorker<'data, C> {
    pub fn new(
        schedule: &'data Schedule,
        params: &'data SearchParams,
        slacks: &'data dyn SlackProvider,
        targets: Vec<FallbackPath>,
        heuristics: Option<&'data StopHeuristics>,
    ) -> Self {
        Self {
            schedule,
            params,
            slacks,
            heuristics,
            targets,
            no_wait: params.profile == Profile::NoWaitStandard,
            rounds: RoundsState::new(schedule.nb_of_stops()),
            best_times: BestTimes::new(schedule.nb_of_stops()),
            best_solution: None,
            seeds: Vec::new(),
            anchor: SecondsSinceScheduleStart::zero(),
            _direction: PhantomData,
        }
    }

    pub fn best_solution(&self) -> Option<&Solution> {
        self.best_solution.as_ref()
    }

    pub fn into_best_solution(self) -> Option<Solution> {
        self.best_solution
    }

    /// Run one iteration of the range search, anchored at `anchor` :
    /// the earliest allowed departure when searching forward, the latest
    /// allowed arrival when searching backward.
    ///
    /// Returns `true` when the best solution improved.
    pub fn solve_iteration(
        &mut self,
        seeds: &[FallbackPath],
        anchor: &SecondsSinceScheduleStart,
    ) -> bool {
        self.rounds.clear();
        self.seeds = seeds.to_vec();
        self.anchor = *anchor;

        let max_round = self.params.max_nb_of_legs;
        let max_seed_round = self.inject_seeds(max_round);

        let mut improved = false;
        let mut first_reach: Option<u8> = None;
        for round in 1..=max_round {
            if let Some(reach) = first_reach {
                if round > reach.saturating_add(self.params.nb_of_additional_legs) {
                    break;
                }
            }
            let marked = self.rounds.take_marked(round - 1);
            let guaranteed = self.rounds.take_guaranteed(round - 1);
            if marked.is_empty() && guaranteed.is_empty() {
                if round > max_seed_round {
                    break;
                }
                continue;
            }

            let mut improved_stops = Vec::new();
            let missions = self.missions_to_scan(&marked);
            for (mission, start_position) in missions {
                self.scan_mission(round, &mission, start_position, &mut improved_stops);
            }
            for boarding in &guaranteed {
                self.ride_guaranteed(round, boarding, &mut improved_stops);
            }
            self.relax_footpaths(round, &improved_stops);

            let (reached, better) = self.check_targets(round);
            if reached && first_reach.is_none() {
                first_reach = Some(round);
            }
            improved |= better;
        }
        improved
    }

    /// Inject the seed fallback paths of the current iteration. A flex
    /// path carrying `n` rides is injected at round `n`, so that its legs
    /// are counted against the leg budget. Returns the largest round that
    /// received a seed.
    fn inject_seeds(&mut self, max_round: u8) -> u8 {
        let mut max_seed_round = 0;
        for (idx, seed) in self.seeds.clone().iter().enumerate() {
            let round = seed.nb_of_rides;
            if round > max_round {
                continue;
            }
            if self.schedule.is_banned(&seed.stop) {
                trace!("skipping a fallback path to a banned stop");
                continue;
            }
            let times = if C::IS_FORWARD {
                seed.forward_times(self.anchor)
            } else {
                seed.backward_times(self.anchor)
            };
            let time_at_stop = match times {
                Some((departure, arrival)) => {
                    if C::IS_FORWARD {
                        arrival
                    } else {
                        departure
                    }
                }
                None => continue,
            };
            if !self.accept_time(&seed.stop, &time_at_stop, round) {
                continue;
            }
            let label = StopLabel {
                time: time_at_stop,
                wait_offset: PositiveDuration::zero(),
                link: Link::Fallback { idx },
            };
            self.best_times.improve::<C>(&seed.stop, &time_at_stop);
            self.rounds.improve_overall::<C>(round, &seed.stop, label);
            max_seed_round = max_seed_round.max(round);
        }
        max_seed_round
    }

    /// The missions serving the marked stops, each with the first position
    /// the scan must start from.
    fn missions_to_scan(&self, marked: &[Stop]) -> HashMap<Mission, Position> {
        let mut missions: HashMap<Mission, Position> = HashMap::new();
        for stop in marked {
            for (mission, position) in self.schedule.missions_at(stop) {
                missions
                    .entry(mission)
                    .and_modify(|current| {
                        if is_scanned_before::<C>(self.schedule, &position, current, &mission) {
                            *current = position;
                        }
                    })
                    .or_insert(position);
            }
        }
        missions
    }

    fn scan_mission(
        &mut self,
        round: u8,
        mission: &Mission,
        start_position: Position,
        improved_stops: &mut Vec<Stop>,
    ) {
        let schedule = self.schedule;
        let slack_index = schedule.slack_index(mission);
        let mut onboard: Option<Onboard> = None;
        let mut position = start_position;
        loop {
            let stop = schedule.stop_of(&position, mission);

            if let Some(current) = &onboard {
                if current.embark_position != position {
                    self.try_disembark(round, mission, &position, &stop, current, improved_stops);
                }
            }

            // embark (or re-embark an earlier vehicle) from the labels of
            // the previous round
            if can_embark::<C>(schedule, mission, &position) && self.wheelchair_ok(mission, &position)
            {
                if let Some(label) = self.rounds.overall_label(round - 1, &stop).copied() {
                    if let Some(candidate) =
                        self.embark_candidate(mission, &position, slack_index, &label)
                    {
                        onboard = Some(match onboard {
                            None => candidate,
                            Some(current) if Self::is_better_vehicle(&candidate, &current) => {
                                candidate
                            }
                            Some(current) => current,
                        });
                    }
                }
            }

            match next_scan_position::<C>(schedule, mission, &position) {
                Some(next) => position = next,
                None => break,
            }
        }
    }

    fn embark_candidate(
        &self,
        mission: &Mission,
        position: &Position,
        slack_index: usize,
        label: &StopLabel,
    ) -> Option<Onboard> {
        let actual = label.actual_time::<C>()?;
        let slack = if C::IS_FORWARD {
            self.slacks.board_slack(slack_index)
        } else {
            self.slacks.alight_slack(slack_index)
        };
        let ready = C::shift(&actual, &slack)?;
        let (trip, vehicle_time) = embarkable_trip::<C>(self.schedule, mission, position, &ready)?;
        let wait = if self.no_wait {
            // the slack is a forced buffer, only the extra wait is removable
            C::elapsed(&ready, &vehicle_time).unwrap_or_else(PositiveDuration::zero)
        } else {
            PositiveDuration::zero()
        };
        Some(Onboard {
            trip,
            embark_position: *position,
            via_guaranteed: None,
            wait_offset: label.wait_offset + wait,
        })
    }

    /// `lhs` is a strictly better vehicle to stay onboard of than `rhs` :
    /// an earlier one forward, a later one backward, or the same one
    /// reached with less accumulated waiting.
    fn is_better_vehicle(lhs: &Onboard, rhs: &Onboard) -> bool {
        if lhs.trip.idx != rhs.trip.idx {
            if C::IS_FORWARD {
                lhs.trip.idx < rhs.trip.idx
            } else {
                lhs.trip.idx > rhs.trip.idx
            }
        } else {
            lhs.wait_offset < rhs.wait_offset
        }
    }

    fn try_disembark(
        &mut self,
        round: u8,
        mission: &Mission,
        position: &Position,
        stop: &Stop,
        onboard: &Onboard,
        improved_stops: &mut Vec<Stop>,
    ) {
        // a guaranteed connection bypasses restrictions on the embark
        // side only ; disembarking obeys the flows of the position
        if !can_disembark::<C>(self.schedule, mission, position)
            || !self.wheelchair_ok(mission, position)
        {
            return;
        }
        let vehicle_time = match disembark_time::<C>(self.schedule, &onboard.trip, position) {
            Some(time) => time,
            None => return,
        };
        let slack_index = self.schedule.slack_index(mission);
        let slack = if C::IS_FORWARD {
            self.slacks.alight_slack(slack_index)
        } else {
            self.slacks.board_slack(slack_index)
        };
        let actual = match C::shift(&vehicle_time, &slack) {
            Some(time) => time,
            None => return,
        };
        let time = match C::unshift(&actual, &onboard.wait_offset) {
            Some(time) => time,
            None => return,
        };
        if !self.accept_time(stop, &time, round) {
            return;
        }
        if !self.best_times.improve::<C>(stop, &time) {
            return;
        }
        let label = StopLabel {
            time,
            wait_offset: onboard.wait_offset,
            link: Link::Transit {
                trip: onboard.trip,
                embark_position: onboard.embark_position,
                disembark_position: *position,
                embark_round: round - 1,
                via_guaranteed: onboard.via_guaranteed,
            },
        };
        if self.rounds.improve_transit::<C>(round, stop, label) {
            improved_stops.push(*stop);
        }
    }

    /// Ride a trip reached through a guaranteed connection : the embark
    /// bypasses slacks and flow restrictions.
    fn ride_guaranteed(
        &mut self,
        round: u8,
        boarding: &GuaranteedBoarding,
        improved_stops: &mut Vec<Stop>,
    ) {
        let schedule = self.schedule;
        let mission = boarding.trip.mission;
        let positions: Vec<Position> = schedule
            .missions_at(&boarding.stop)
            .filter(|(m, _)| *m == mission)
            .map(|(_, position)| position)
            .collect();
        for embark_position in positions {
            let vehicle_time = onboard_time::<C>(schedule, &boarding.trip, &embark_position);
            // when the connection is held, the vehicle waits for the
            // traveler and no extra wait accumulates
            let wait = if self.no_wait {
                C::shift(&boarding.time, &boarding.wait_offset)
                    .and_then(|actual| C::elapsed(&actual, &vehicle_time))
                    .unwrap_or_else(PositiveDuration::zero)
            } else {
                PositiveDuration::zero()
            };
            let onboard = Onboard {
                trip: boarding.trip,
                embark_position,
                via_guaranteed: Some(boarding.source_stop),
                wait_offset: boarding.wait_offset + wait,
            };
            let mut position = embark_position;
            while let Some(next) = next_scan_position::<C>(schedule, &mission, &position) {
                position = next;
                let stop = schedule.stop_of(&position, &mission);
                self.try_disembark(round, &mission, &position, &stop, &onboard, improved_stops);
            }
        }
    }

    /// Merge the new transit labels into the overall labels of the round,
    /// relax foot transfers from them, and collect the guaranteed
    /// connections they open.
    fn relax_footpaths(&mut self, round: u8, improved_stops: &[Stop]) {
        let schedule = self.schedule;
        for stop in improved_stops {
            let label = match self.rounds.transit_label(round, stop).copied() {
                Some(label) => label,
                None => continue,
            };
            self.rounds.improve_overall::<C>(round, stop, label);

            if self.params.use_guaranteed_transfers {
                if let Link::Transit { trip, .. } = label.link {
                    for guaranteed in guaranteed_connections::<C>(schedule, &trip, stop) {
                        self.rounds.push_guaranteed(
                            round,
                            GuaranteedBoarding {
                                stop: guaranteed_arrival_stop::<C>(guaranteed),
                                trip: guaranteed_arrival_trip::<C>(guaranteed),
                                source_stop: *stop,
                                time: label.time,
                                wait_offset: label.wait_offset,
                            },
                        );
                    }
                }
            }

            let transfers: Vec<_> = transfers_departing::<C>(schedule, stop).collect();
            for transfer in transfers {
                let arrival_stop = transfer_arrival_stop::<C>(schedule, &transfer);
                if schedule.is_banned(&arrival_stop) {
                    continue;
                }
                if self.params.use_forbidden_transfers {
                    let (from, to) = if C::IS_FORWARD {
                        (*stop, arrival_stop)
                    } else {
                        (arrival_stop, *stop)
                    };
                    if schedule.is_forbidden_transfer(&from, &to) {
                        continue;
                    }
                }
                let duration =
                    self.slacks.transfer_slack() + schedule.transfer_duration(&transfer);
                let time = match C::shift(&label.time, &duration) {
                    Some(time) => time,
                    None => continue,
                };
                if !self.accept_time(&arrival_stop, &time, round) {
                    continue;
                }
                if !self.best_times.improve::<C>(&arrival_stop, &time) {
                    continue;
                }
                self.rounds.improve_overall::<C>(
                    round,
                    &arrival_stop,
                    StopLabel {
                        time,
                        wait_offset: label.wait_offset,
                        link: Link::Footpath { transfer },
                    },
                );
            }
        }
    }

    /// Destination pruning : a label that cannot beat the best known
    /// solution, even with the lower bounds of the heuristic pass, is
    /// dropped immediately.
    fn accept_time(&self, stop: &Stop, time: &SecondsSinceScheduleStart, round: u8) -> bool {
        let best = match &self.best_solution {
            Some(solution) => solution.target_time,
            None => return self.reachable(stop, round),
        };
        let projected = match self.heuristics.and_then(|h| h.best_duration(stop)) {
            Some(duration) => match C::shift(time, &duration) {
                Some(projected) => projected,
                None => return false,
            },
            None => {
                if self.heuristics.is_some() {
                    // the heuristic pass never reached this stop, no
                    // journey through it can reach a target
                    return false;
                }
                *time
            }
        };
        // a tie is kept : an equal-time arrival with fewer legs is still
        // an improvement, arbitrated in check_targets
        C::is_better_or_equal(&projected, &best) && self.reachable(stop, round)
    }

    fn reachable(&self, stop: &Stop, round: u8) -> bool {
        match self.heuristics {
            None => true,
            Some(heuristics) => match heuristics.best_rides(stop) {
                None => false,
                Some(rides) => round.saturating_add(rides) <= self.params.max_nb_of_legs,
            },
        }
    }

    fn wheelchair_ok(&self, mission: &Mission, position: &Position) -> bool {
        !self.params.wheelchair_accessible
            || self.schedule.is_wheelchair_usable(position, mission)
    }

    /// Try to complete journeys at every target with the overall labels
    /// of `round`. Returns `(a target was reached, the best solution improved)`.
    fn check_targets(&mut self, round: u8) -> (bool, bool) {
        let mut reached = false;
        let mut best_candidate: Option<Solution> = None;
        for target_idx in 0..self.targets.len() {
            let target = &self.targets[target_idx];
            let label = match self.rounds.overall_label(round, &target.stop) {
                Some(label) => *label,
                None => continue,
            };
            // a journey needs at least one vehicle leg : a bare fallback
            // label is the seed itself
            if matches!(label.link, Link::Fallback { .. }) {
                continue;
            }
            let nb_of_legs = match round.checked_add(target.nb_of_rides) {
                Some(total) if total <= self.params.max_nb_of_legs => total,
                _ => continue,
            };
            let actual = match label.actual_time::<C>() {
                Some(actual) => actual,
                None => continue,
            };
            let (completion_actual, target_wait) = if C::IS_FORWARD {
                match target.forward_times(actual) {
                    Some((departure, arrival)) => (
                        arrival,
                        departure
                            .duration_since(&actual)
                            .unwrap_or_else(PositiveDuration::zero),
                    ),
                    None => continue,
                }
            } else {
                match target.backward_times(actual) {
                    Some((departure, arrival)) => (
                        departure,
                        actual
                            .duration_since(&arrival)
                            .unwrap_or_else(PositiveDuration::zero),
                    ),
                    None => continue,
                }
            };
            reached = true;
            let wait_offset = if self.no_wait {
                label.wait_offset + target_wait
            } else {
                label.wait_offset
            };
            let target_time = match C::unshift(&completion_actual, &wait_offset) {
                Some(time) => time,
                None => continue,
            };
            let current_best = best_candidate
                .as_ref()
                .map(|solution| (solution.target_time, solution.nb_of_legs))
                .or_else(|| {
                    self.best_solution
                        .as_ref()
                        .map(|solution| (solution.target_time, solution.nb_of_legs))
                });
            let improves = match current_best {
                None => true,
                Some((best_time, best_legs)) => {
                    C::is_better(&target_time, &best_time)
                        || (target_time == best_time && nb_of_legs < best_legs)
                }
            };
            if !improves {
                continue;
            }
            if let Some(journey) =
                self.extract_journey(round, &target.stop, target_idx, &completion_actual)
            {
                best_candidate = Some(Solution {
                    target_time,
                    nb_of_legs,
                    journey,
                });
            }
        }
        let improved = best_candidate.is_some();
        if let Some(candidate) = best_candidate {
            self.best_solution = Some(candidate);
        }
        (reached, improved)
    }

    /// Walk the backpointers from `(round, stop)` down to a seed and
    /// assemble the journey in travel order.
    fn extract_journey(
        &self,
        round: u8,
        stop: &Stop,
        target_idx: usize,
        completion_actual: &SecondsSinceScheduleStart,
    ) -> Option<Journey> {
        let schedule = self.schedule;
        let mut items: Vec<ChainItem> = Vec::new();
        let mut current_round = round;
        let mut current_stop = *stop;
        let mut label = *self.rounds.overall_label(current_round, &current_stop)?;
        let seed_idx = loop {
            match label.link {
                Link::Fallback { idx } => break idx,
                Link::Footpath { transfer } => {
                    items.push(ChainItem::Conn(Connection::Footpath(transfer)));
                    current_stop = transfer_departure_stop::<C>(schedule, &transfer);
                    label = *self.rounds.transit_label(current_round, &current_stop)?;
                }
                Link::Transit {
                    trip,
                    embark_position,
                    disembark_position,
                    embark_round,
                    via_guaranteed,
                } => {
                    let mission = schedule.mission_of(&trip);
                    let (board_position, debark_position) = if C::IS_FORWARD {
                        (embark_position, disembark_position)
                    } else {
                        (disembark_position, embark_position)
                    };
                    items.push(ChainItem::Leg(VehicleLeg {
                        trip,
                        board_position,
                        debark_position,
                    }));
                    current_round = embark_round;
                    match via_guaranteed {
                        Some(source_stop) => {
                            items.push(ChainItem::Conn(Connection::Guaranteed));
                            current_stop = source_stop;
                            label = *self.rounds.transit_label(current_round, &current_stop)?;
                        }
                        None => {
                            current_stop = schedule.stop_of(&embark_position, &mission);
                            label = *self.rounds.overall_label(current_round, &current_stop)?;
                            if matches!(label.link, Link::Transit { .. }) {
                                items.push(ChainItem::Conn(Connection::SameStop));
                            }
                        }
                    }
                }
            }
        };

        if C::IS_FORWARD {
            items.reverse();
        }
        let mut iter = items.into_iter();
        let first_vehicle = match iter.next()? {
            ChainItem::Leg(leg) => leg,
            ChainItem::Conn(_) => {
                debug_assert!(false, "a journey chain must start with a vehicle leg");
                return None;
            }
        };
        let mut connections = Vec::new();
        while let Some(item) = iter.next() {
            match (item, iter.next()) {
                (ChainItem::Conn(connection), Some(ChainItem::Leg(leg))) => {
                    connections.push((connection, leg));
                }
                _ => {
                    debug_assert!(false, "a journey chain must alternate connections and legs");
                    return None;
                }
            }
        }

        let seed = self.seeds.get(seed_idx)?.clone();
        let target = self.targets.get(target_idx)?.clone();
        let last_vehicle = connections
            .last()
            .map_or(first_vehicle, |(_, leg)| *leg);
        // the engine anchors the seed fallback, but the reported journey
        // uses the tightest feasible fallback times : start the access as
        // late as the first boarding allows, complete the egress as early
        // as the last debark allows
        let (access, egress, departure_time, arrival_time) = if C::IS_FORWARD {
            let (anchor_departure, _) = seed.forward_times(self.anchor)?;
            let departure = self
                .latest_access_departure(&seed, &first_vehicle)
                .map_or(anchor_departure, |departure| departure.max(anchor_departure));
            (seed, target, departure, *completion_actual)
        } else {
            let (_, anchor_arrival) = seed.backward_times(self.anchor)?;
            let arrival = self
                .earliest_egress_arrival(&seed, &last_vehicle)
                .map_or(anchor_arrival, |arrival| arrival.min(anchor_arrival));
            (target, seed, *completion_actual, arrival)
        };

        let mut journey = Journey {
            access,
            departure_time,
            first_vehicle,
            connections,
            egress,
            arrival_time,
            cost: crate::cost::Cost::zero(),
        };
        journey.cost = journey.compute_cost(schedule, self.params);
        Some(journey)
    }

    /// The latest time the access path can be started while still
    /// catching the first boarding.
    fn latest_access_departure(
        &self,
        access: &FallbackPath,
        first_vehicle: &VehicleLeg,
    ) -> Option<SecondsSinceScheduleStart> {
        let mission = self.schedule.mission_of(&first_vehicle.trip);
        let board = self
            .schedule
            .departure_time_of(&first_vehicle.trip, &first_vehicle.board_position);
        let slack = self.slacks.board_slack(self.schedule.slack_index(&mission));
        let ready = board.checked_sub(slack)?;
        access.backward_times(ready).map(|(departure, _)| departure)
    }

    /// The earliest time the egress path can be completed after the last
    /// debark.
    fn earliest_egress_arrival(
        &self,
        egress: &FallbackPath,
        last_vehicle: &VehicleLeg,
    ) -> Option<SecondsSinceScheduleStart> {
        let mission = self.schedule.mission_of(&last_vehicle.trip);
        let debark = self
            .schedule
            .arrival_time_of(&last_vehicle.trip, &last_vehicle.debark_position);
        let slack = self.slacks.alight_slack(self.schedule.slack_index(&mission));
        egress
            .forward_times(debark + slack)
            .map(|(_, arrival)| arrival)
    }
}

/// Read accessors used to turn a completed pass into per-stop lower
/// bounds, see [`crate::engine::heuristics`].
impl<'data, C: TimeCalculator> StandardWorker<'data, C> {
    pub fn best_time_at(&self, stop: &Stop) -> Option<&SecondsSinceScheduleStart> {
        self.best_times.get(stop)
    }

    pub fn first_round_at(&self, stop: &Stop) -> Option<u8> {
        let nb_of_rounds = self.rounds.nb_of_rounds();
        (0..nb_of_rounds).find_map(|round| {
            let round = round as u8;
            self.rounds.overall_label(round, stop).map(|_| round)
        })
    }
}

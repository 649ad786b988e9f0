use std::collections::HashMap;
use std::time::Instant;

use tracing::debug;

use crate::cost::Cost;
use crate::engine::calculator::ForwardCalculator;
use crate::engine::heuristics::StopHeuristics;
use crate::engine::journeys_tree::{Arrive, Board, Debark, JourneysTree, Wait};
use crate::engine::pareto_front::{DominanceContext, ParetoFront};
use crate::engine::range_raptor::iteration_anchors;
use crate::fallback::{AccessPath, EgressPath};
use crate::request::SearchParams;
use crate::response::Journey;
use crate::schedule::{Mission, Position, Schedule, SlackProvider, Stop, Trip};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};

/// The criteria compared by the multicriteria engine. A journey is kept
/// as long as no other journey is at least as good on every criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Criteria {
    pub arrival_time: SecondsSinceScheduleStart,
    pub cost: Cost,
    pub nb_of_legs: u8,
    /// `Some` only in timetable mode, where a later departure is a
    /// quality of its own
    pub departure_time: Option<SecondsSinceScheduleStart>,
    /// bitmask of the priority groups of the missions ridden so far
    pub priority_groups: u8,
    /// when `Some`, this path holds a guaranteed connection toward this
    /// trip, and nothing but a path holding the same connection may
    /// dominate it
    pub guaranteed_trip: Option<Trip>,
    pub has_boarded: bool,
}

/// One multicriteria computation : the schedule and parameters, the
/// fallback paths, and the anchor of the current range iteration.
///
/// Implements both the dominance order between [`Criteria`] and the
/// elementary moves of the search (depart, board, ride, debark,
/// transfer, arrive), each producing the criteria of the extended path.
pub(crate) struct McRequest<'a> {
    schedule: &'a Schedule,
    params: &'a SearchParams,
    slacks: &'a dyn SlackProvider,
    accesses: &'a [AccessPath],
    egresses: &'a [EgressPath],
    /// indices into `egresses`, grouped by arrival stop
    egresses_at: Vec<Vec<usize>>,
    heuristics: Option<&'a StopHeuristics>,
    anchor: SecondsSinceScheduleStart,
    /// first boarding must depart strictly before this time, so that the
    /// iterations of a range search partition the window between them
    first_board_deadline: Option<SecondsSinceScheduleStart>,
}

impl<'a> McRequest<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schedule: &'a Schedule,
        params: &'a SearchParams,
        slacks: &'a dyn SlackProvider,
        accesses: &'a [AccessPath],
        egresses: &'a [EgressPath],
        heuristics: Option<&'a StopHeuristics>,
        anchor: SecondsSinceScheduleStart,
        first_board_deadline: Option<SecondsSinceScheduleStart>,
    ) -> Self {
        let mut egresses_at = vec![Vec::new(); schedule.nb_of_stops()];
        for (idx, egress) in egresses.iter().enumerate() {
            egresses_at[egress.stop.idx].push(idx);
        }
        Self {
            schedule,
            params,
            slacks,
            accesses,
            egresses,
            egresses_at,
            heuristics,
            anchor,
            first_board_deadline,
        }
    }

    pub fn schedule(&self) -> &'a Schedule {
        self.schedule
    }

    pub fn accesses(&self) -> &'a [AccessPath] {
        self.accesses
    }

    pub fn egresses(&self) -> &'a [EgressPath] {
        self.egresses
    }

    pub fn anchor(&self) -> &SecondsSinceScheduleStart {
        &self.anchor
    }

    pub fn nb_of_stops(&self) -> usize {
        self.schedule.nb_of_stops()
    }

    /// `false` when, according to the heuristic pass, no journey through
    /// `stop` can reach the destination within the legs budget.
    fn reachable(&self, stop: &Stop, nb_of_legs: u8) -> bool {
        let heuristics = match self.heuristics {
            Some(heuristics) => heuristics,
            None => return true,
        };
        match heuristics.best_rides(stop) {
            Some(rides) => nb_of_legs.saturating_add(rides) <= self.params.max_nb_of_legs,
            None => false,
        }
    }

    /// Start a path with the access path of index `access_idx` : the
    /// traveler stands at its stop, ready to wait for a vehicle.
    pub fn depart(&self, access_idx: usize) -> Option<(Stop, Criteria)> {
        let access = &self.accesses[access_idx];
        if self.schedule.is_banned(&access.stop) {
            return None;
        }
        let (departure, at_stop) = access.forward_times(self.anchor)?;
        if !self.reachable(&access.stop, access.nb_of_rides) {
            return None;
        }
        let criteria = Criteria {
            arrival_time: at_stop,
            cost: access.cost,
            nb_of_legs: access.nb_of_rides,
            departure_time: self.params.timetable_enabled.then_some(departure),
            priority_groups: 0,
            guaranteed_trip: None,
            has_boarded: false,
        };
        Some((access.stop, criteria))
    }

    /// The best trip of `mission` to board at `position` when waiting
    /// with `criteria`, along with the criteria once onboard.
    pub fn best_trip_to_board(
        &self,
        position: &Position,
        mission: &Mission,
        criteria: &Criteria,
    ) -> Option<(Trip, Criteria)> {
        if self.params.wheelchair_accessible
            && !self.schedule.is_wheelchair_usable(position, mission)
        {
            return None;
        }
        let (trip, departure) = match criteria.guaranteed_trip {
            // a guaranteed connection holds its trip : no slack, no flow
            // restriction, and the vehicle waits if needed
            Some(guaranteed) => {
                if guaranteed.mission != *mission {
                    return None;
                }
                let departure = self.schedule.departure_time_of(&guaranteed, position);
                (guaranteed, departure)
            }
            None => {
                let slack_index = self.schedule.slack_index(mission);
                let ready = criteria.arrival_time + self.slacks.board_slack(slack_index);
                let (trip, departure) =
                    self.schedule.earliest_trip_to_board(&ready, mission, position)?;
                if !criteria.has_boarded {
                    if let Some(deadline) = self.first_board_deadline {
                        if departure >= deadline {
                            return None;
                        }
                    }
                }
                (trip, departure)
            }
        };
        let nb_of_legs = criteria.nb_of_legs.checked_add(1)?;
        if nb_of_legs > self.params.max_nb_of_legs {
            return None;
        }
        let wait = departure
            .duration_since(&criteria.arrival_time)
            .unwrap_or_else(PositiveDuration::zero);
        let mut cost = criteria.cost
            + self.params.wait_reluctance.cost_of(&wait)
            + Cost::from_seconds(self.params.board_penalty.total_seconds());
        if criteria.has_boarded {
            cost = cost + Cost::from_seconds(self.params.transfer_penalty.total_seconds());
        }
        let group = self.schedule.priority_group(mission);
        let onboard = Criteria {
            arrival_time: departure,
            cost,
            nb_of_legs,
            departure_time: criteria.departure_time,
            priority_groups: criteria.priority_groups | (1u8 << (group & 7)),
            guaranteed_trip: None,
            has_boarded: true,
        };
        Some((trip, onboard))
    }

    /// Ride `trip` from `position` to `next_position`.
    pub fn ride(
        &self,
        trip: &Trip,
        position: &Position,
        next_position: &Position,
        criteria: &Criteria,
    ) -> Criteria {
        let departure = self.schedule.departure_time_of(trip, position);
        let arrival = self.schedule.arrival_time_of(trip, next_position);
        let in_vehicle = arrival
            .duration_since(&departure)
            .unwrap_or_else(PositiveDuration::zero);
        let reluctance_index = self.schedule.reluctance_index(&trip.mission);
        let reluctance = self.params.transit_reluctance(reluctance_index);
        Criteria {
            arrival_time: arrival,
            cost: criteria.cost + reluctance.cost_of(&in_vehicle),
            ..criteria.clone()
        }
    }

    /// Leave the vehicle at `position`. `None` when debarking is not
    /// allowed there.
    pub fn debark(
        &self,
        trip: &Trip,
        position: &Position,
        onboard_criteria: &Criteria,
    ) -> Option<Criteria> {
        if self.params.wheelchair_accessible
            && !self.schedule.is_wheelchair_usable(position, &trip.mission)
        {
            return None;
        }
        let debark_time = self.schedule.debark_time_of(trip, position)?;
        let slack_index = self.schedule.slack_index(&trip.mission);
        let alight_slack = self.slacks.alight_slack(slack_index);
        Some(Criteria {
            arrival_time: debark_time + alight_slack,
            cost: onboard_criteria.cost + self.params.wait_reluctance.cost_of(&alight_slack),
            ..onboard_criteria.clone()
        })
    }

    /// Walk `transfer` from `stop`. `None` when the transfer cannot be
    /// used.
    pub fn transfer(
        &self,
        stop: &Stop,
        transfer: &crate::schedule::Transfer,
        criteria: &Criteria,
    ) -> Option<(Stop, Criteria)> {
        let arrival_stop = self.schedule.transfer_to_stop(transfer);
        if self.schedule.is_banned(&arrival_stop) {
            return None;
        }
        if self.params.use_forbidden_transfers
            && self.schedule.is_forbidden_transfer(stop, &arrival_stop)
        {
            return None;
        }
        if !self.reachable(&arrival_stop, criteria.nb_of_legs) {
            return None;
        }
        let walk = self.schedule.transfer_duration(transfer);
        let slack = self.slacks.transfer_slack();
        let criteria = Criteria {
            arrival_time: criteria.arrival_time + walk + slack,
            cost: criteria.cost
                + self.params.walk_reluctance.cost_of(&walk)
                + self.params.wait_reluctance.cost_of(&slack),
            guaranteed_trip: None,
            ..criteria.clone()
        };
        Some((arrival_stop, criteria))
    }

    /// Wait again at the very stop where the vehicle was left. No slack
    /// applies : boarding another vehicle at the same stop is always
    /// allowed.
    pub fn stay(&self, criteria: &Criteria) -> Criteria {
        Criteria {
            guaranteed_trip: None,
            ..criteria.clone()
        }
    }

    /// Hold the guaranteed connections of the trip debarked at `stop` :
    /// one waiting per connection, each carrying the trip it secures.
    pub fn guaranteed_connections(
        &self,
        trip: &Trip,
        stop: &Stop,
        criteria: &Criteria,
    ) -> Vec<(Stop, Criteria)> {
        if !self.params.use_guaranteed_transfers {
            return Vec::new();
        }
        self.schedule
            .guaranteed_transfers_from(trip, stop)
            .iter()
            .map(|guaranteed| {
                let criteria = Criteria {
                    guaranteed_trip: Some(guaranteed.to_trip),
                    ..criteria.clone()
                };
                (guaranteed.to_stop, criteria)
            })
            .collect()
    }

    /// Complete the path debarked at `stop` with every egress path
    /// starting there.
    pub fn journey_arrivals(&self, stop: &Stop, criteria: &Criteria) -> Vec<(usize, Criteria)> {
        let mut arrivals = Vec::new();
        for &egress_idx in &self.egresses_at[stop.idx] {
            let egress = &self.egresses[egress_idx];
            let nb_of_legs = match criteria.nb_of_legs.checked_add(egress.nb_of_rides) {
                Some(nb_of_legs) if nb_of_legs <= self.params.max_nb_of_legs => nb_of_legs,
                _ => continue,
            };
            let (egress_start, arrival_time) = match egress.forward_times(criteria.arrival_time) {
                Some(times) => times,
                None => continue,
            };
            let wait = egress_start
                .duration_since(&criteria.arrival_time)
                .unwrap_or_else(PositiveDuration::zero);
            let arrived = Criteria {
                arrival_time,
                cost: criteria.cost + self.params.wait_reluctance.cost_of(&wait) + egress.cost,
                nb_of_legs,
                guaranteed_trip: None,
                ..criteria.clone()
            };
            arrivals.push((egress_idx, arrived));
        }
        arrivals
    }
}

impl DominanceContext for McRequest<'_> {
    type Criteria = Criteria;

    fn is_lower(&self, lower: &Criteria, upper: &Criteria) -> bool {
        // a held guaranteed connection may only be dominated by a path
        // holding the same connection
        if upper.guaranteed_trip.is_some() && lower.guaranteed_trip != upper.guaranteed_trip {
            return false;
        }
        if upper.arrival_time < lower.arrival_time || upper.nb_of_legs < lower.nb_of_legs {
            return false;
        }
        if let (Some(lower_departure), Some(upper_departure)) =
            (lower.departure_time, upper.departure_time)
        {
            // timetable mode : departing later is a quality
            if lower_departure < upper_departure {
                return false;
            }
        }
        let lower_cost = match &self.params.relax_transit_group_priority {
            Some(relax) if lower.priority_groups != upper.priority_groups => relax.eval(&lower.cost),
            _ => lower.cost,
        };
        lower_cost <= upper.cost
    }
}

type WaitingFront<'a> = ParetoFront<Wait, McRequest<'a>>;
type DebarkedFront<'a> = ParetoFront<Debark, McRequest<'a>>;
type OnboardFront<'a> = ParetoFront<(Board, Trip), McRequest<'a>>;
type ArrivedFront<'a> = ParetoFront<Arrive, McRequest<'a>>;

/// One full multicriteria propagation, producing the pareto front of
/// journeys of one range iteration.
pub(crate) struct MultiCriteriaRaptor<'a> {
    request: &'a McRequest<'a>,
    journeys_tree: JourneysTree,

    waiting_fronts: Vec<WaitingFront<'a>>,
    new_waiting_fronts: Vec<WaitingFront<'a>>,
    stops_with_new_waiting: Vec<Stop>,

    missions_with_new_waiting: HashMap<Mission, Position>,

    debarked_fronts: Vec<DebarkedFront<'a>>,
    new_debarked_fronts: Vec<DebarkedFront<'a>>,
    stops_with_new_debarked: Vec<Stop>,

    onboard_front: OnboardFront<'a>,
    new_onboard_front: OnboardFront<'a>,

    arrived_front: ArrivedFront<'a>,
    best_arrived_cost: Option<Cost>,
}

impl<'a> MultiCriteriaRaptor<'a> {
    pub fn new(request: &'a McRequest<'a>) -> Self {
        let nb_of_stops = request.nb_of_stops();
        Self {
            request,
            journeys_tree: JourneysTree::new(),

            waiting_fronts: vec![WaitingFront::new(); nb_of_stops],
            new_waiting_fronts: vec![WaitingFront::new(); nb_of_stops],
            stops_with_new_waiting: Vec::new(),

            missions_with_new_waiting: HashMap::new(),

            debarked_fronts: vec![DebarkedFront::new(); nb_of_stops],
            new_debarked_fronts: vec![DebarkedFront::new(); nb_of_stops],
            stops_with_new_debarked: Vec::new(),

            onboard_front: OnboardFront::new(),
            new_onboard_front: OnboardFront::new(),

            arrived_front: ArrivedFront::new(),
            best_arrived_cost: None,
        }
    }

    pub fn compute(&mut self) {
        self.clear();

        self.init_with_departures();
        if self.stops_with_new_waiting.is_empty() {
            return;
        }

        self.identify_missions_with_new_waitings();

        while !self.missions_with_new_waiting.is_empty() {
            self.ride();

            self.save_and_clear_new_waitings();

            self.perform_transfers_and_arrivals();

            self.save_and_clear_new_debarked();

            self.identify_missions_with_new_waitings();
        }
    }

    /// The journeys of the arrived pareto front.
    pub fn journeys(&self) -> Vec<(Journey, Criteria)> {
        self.arrived_front
            .iter()
            .filter_map(|(arrive, criteria)| {
                self.journeys_tree
                    .create_journey(
                        arrive,
                        self.request.accesses(),
                        self.request.egresses(),
                        self.request.anchor(),
                        criteria.arrival_time,
                        criteria.cost,
                    )
                    .map(|journey| (journey, criteria.clone()))
            })
            .collect()
    }

    fn clear(&mut self) {
        self.journeys_tree.clear();
        for front in &mut self.waiting_fronts {
            front.clear();
        }
        for front in &mut self.new_waiting_fronts {
            front.clear();
        }
        self.stops_with_new_waiting.clear();

        self.missions_with_new_waiting.clear();

        for front in &mut self.debarked_fronts {
            front.clear();
        }
        for front in &mut self.new_debarked_fronts {
            front.clear();
        }
        self.stops_with_new_debarked.clear();

        self.onboard_front.clear();
        self.new_onboard_front.clear();

        self.arrived_front.clear();
        self.best_arrived_cost = None;
    }

    /// The current generalized cost limit, when a limit function is set
    /// and a journey has already arrived.
    fn cost_limit(&self) -> Option<Cost> {
        let limit = self.request.params.generalized_cost_limit.as_ref()?;
        let best = self.best_arrived_cost.as_ref()?;
        Some(limit.eval(best))
    }

    fn exceeds_cost_limit(&self, cost: &Cost) -> bool {
        self.cost_limit().map_or(false, |limit| *cost > limit)
    }

    // fill `new_waiting_fronts` with the journey departures
    fn init_with_departures(&mut self) {
        debug_assert!(self.journeys_tree.is_empty());
        debug_assert!(self.new_waiting_fronts.iter().all(|front| front.is_empty()));
        debug_assert!(self.stops_with_new_waiting.is_empty());

        for access_idx in 0..self.request.accesses().len() {
            let (stop, criteria) = match self.request.depart(access_idx) {
                Some(departure) => departure,
                None => continue,
            };
            let waiting = self.journeys_tree.depart(access_idx);

            let new_waiting_front = &mut self.new_waiting_fronts[stop.idx];
            if new_waiting_front.is_empty() {
                self.stops_with_new_waiting.push(stop);
            }
            new_waiting_front.add(waiting, criteria, self.request);
        }
    }

    // identify the missions boardable from the new waiting paths, with
    // the most upstream position a new waiting appears at
    fn identify_missions_with_new_waitings(&mut self) {
        debug_assert!(self.missions_with_new_waiting.is_empty());

        for stop in self.stops_with_new_waiting.iter() {
            for (mission, position) in self.request.schedule().missions_at(stop) {
                use std::collections::hash_map::Entry;
                match self.missions_with_new_waiting.entry(mission) {
                    Entry::Vacant(entry) => {
                        entry.insert(position);
                    }
                    Entry::Occupied(mut entry) => {
                        let saved_position = entry.get_mut();
                        if self
                            .request
                            .schedule()
                            .is_upstream(&position, saved_position, &mission)
                        {
                            *saved_position = position;
                        }
                    }
                }
            }
        }
    }

    // ride all missions with a new waiting : board the new waiting paths,
    // propagate the onboard front along the mission, and debark along the
    // way into `new_debarked_fronts`
    fn ride(&mut self) {
        debug_assert!(!self.missions_with_new_waiting.is_empty());
        debug_assert!(self.stops_with_new_debarked.is_empty());
        debug_assert!(self.new_debarked_fronts.iter().all(|front| front.is_empty()));

        // stable during the whole ride : arrivals only happen later, in
        // perform_transfers_and_arrivals
        let cost_limit = self.cost_limit();

        for (mission, first_position) in self.missions_with_new_waiting.iter() {
            let mut has_position = Some(*first_position);

            self.onboard_front.clear();

            while let Some(position) = has_position {
                let stop = self.request.schedule().stop_of(&position, mission);

                // debark the onboard front at this stop
                {
                    let debarked_front = &mut self.debarked_fronts[stop.idx];
                    let new_debarked_front = &mut self.new_debarked_fronts[stop.idx];

                    for ((board, trip), onboard_criteria) in self.onboard_front.iter() {
                        let debarked_criteria =
                            match self.request.debark(trip, &position, onboard_criteria) {
                                Some(criteria) => criteria,
                                None => continue,
                            };
                        if cost_limit.map_or(false, |limit| debarked_criteria.cost > limit) {
                            continue;
                        }
                        if debarked_front.dominates(&debarked_criteria, self.request) {
                            continue;
                        }
                        if new_debarked_front.dominates(&debarked_criteria, self.request) {
                            continue;
                        }
                        if new_debarked_front.is_empty() {
                            self.stops_with_new_debarked.push(stop);
                        }
                        let debarked = self.journeys_tree.debark(board, &position);
                        debarked_front.remove_elements_dominated_by(&debarked_criteria, self.request);
                        new_debarked_front.add_and_remove_elements_dominated(
                            debarked,
                            debarked_criteria,
                            self.request,
                        );
                    }
                }

                has_position = self.request.schedule().next_on_mission(&position, mission);

                // no next stop : nothing left to board or ride
                let next_position = match has_position {
                    Some(next_position) => next_position,
                    None => continue,
                };

                // board the new waiting paths of this stop, so that they
                // get ridden to the next stop along with the paths already
                // onboard
                {
                    let new_waiting_front = &self.new_waiting_fronts[stop.idx];
                    for (waiting, waiting_criteria) in new_waiting_front.iter() {
                        if let Some((trip, onboard_criteria)) =
                            self.request
                                .best_trip_to_board(&position, mission, waiting_criteria)
                        {
                            if self.onboard_front.dominates(&onboard_criteria, self.request) {
                                continue;
                            }
                            let board = self.journeys_tree.board(waiting, &trip, &position);
                            self.onboard_front.add_and_remove_elements_dominated(
                                (board, trip),
                                onboard_criteria,
                                self.request,
                            );
                        }
                    }
                }

                // ride the onboard front to the next stop
                {
                    self.new_onboard_front.clear();
                    for ((board, trip), criteria) in self.onboard_front.iter() {
                        let ridden_criteria =
                            self.request.ride(trip, &position, &next_position, criteria);
                        if self.new_onboard_front.dominates(&ridden_criteria, self.request) {
                            continue;
                        }
                        self.new_onboard_front
                            .add((*board, *trip), ridden_criteria, self.request);
                    }
                }
                self.onboard_front.replace_with(&mut self.new_onboard_front);
            }
        }

        self.missions_with_new_waiting.clear();
    }

    // merge `new_waiting_fronts` into `waiting_fronts` and clear them
    fn save_and_clear_new_waitings(&mut self) {
        for stop in self.stops_with_new_waiting.iter() {
            let waiting_front = &mut self.waiting_fronts[stop.idx];
            let new_waiting_front = &mut self.new_waiting_fronts[stop.idx];
            debug_assert!(!new_waiting_front.is_empty());
            for (waiting, criteria) in new_waiting_front.iter() {
                // no dominance check needed : an element enters
                // `new_waiting_front` only when not dominated by
                // `waiting_front`, and dominated elements of
                // `waiting_front` are removed at the same moment
                waiting_front.add_unchecked(*waiting, criteria.clone());
            }
            new_waiting_front.clear();
        }
        self.stops_with_new_waiting.clear();
    }

    // from every newly debarked path : complete journeys with the egress
    // paths, wait again at the same stop, walk the outgoing transfers,
    // and hold the guaranteed connections of the debarked trip
    fn perform_transfers_and_arrivals(&mut self) {
        debug_assert!(self.new_waiting_fronts.iter().all(|front| front.is_empty()));
        debug_assert!(self.stops_with_new_waiting.is_empty());

        for stop in self.stops_with_new_debarked.iter() {
            let new_debarked_front = &self.new_debarked_fronts[stop.idx];
            debug_assert!(!new_debarked_front.is_empty());
            for (debarked, criteria) in new_debarked_front.iter() {
                for (egress_idx, arrived_criteria) in
                    self.request.journey_arrivals(stop, criteria)
                {
                    if self.arrived_front.dominates(&arrived_criteria, self.request) {
                        continue;
                    }
                    let arrived_cost = arrived_criteria.cost;
                    let arrived = self.journeys_tree.arrive(debarked, egress_idx);
                    self.arrived_front.add_and_remove_elements_dominated(
                        arrived,
                        arrived_criteria,
                        self.request,
                    );
                    let improves = self
                        .best_arrived_cost
                        .map_or(true, |best| arrived_cost < best);
                    if improves {
                        self.best_arrived_cost = Some(arrived_cost);
                    }
                }

                let mut new_waitings: Vec<(Stop, Wait, Criteria)> = Vec::new();

                let stay_criteria = self.request.stay(criteria);
                let stay_waiting = self.journeys_tree.stay(debarked);
                new_waitings.push((*stop, stay_waiting, stay_criteria));

                for transfer in self.request.schedule().transfers_from(stop) {
                    if let Some((arrival_stop, transfer_criteria)) =
                        self.request.transfer(stop, &transfer, criteria)
                    {
                        let waiting = self.journeys_tree.transfer(debarked, &transfer);
                        new_waitings.push((arrival_stop, waiting, transfer_criteria));
                    }
                }

                let debarked_trip = self.journeys_tree.debarked_trip(debarked);
                for (arrival_stop, guaranteed_criteria) in
                    self.request
                        .guaranteed_connections(&debarked_trip, stop, criteria)
                {
                    let waiting = self.journeys_tree.guaranteed(debarked);
                    new_waitings.push((arrival_stop, waiting, guaranteed_criteria));
                }

                for (arrival_stop, waiting, waiting_criteria) in new_waitings {
                    if self.exceeds_cost_limit(&waiting_criteria.cost) {
                        continue;
                    }
                    let waiting_front = &mut self.waiting_fronts[arrival_stop.idx];
                    let new_waiting_front = &mut self.new_waiting_fronts[arrival_stop.idx];
                    if waiting_front.dominates(&waiting_criteria, self.request) {
                        continue;
                    }
                    if new_waiting_front.dominates(&waiting_criteria, self.request) {
                        continue;
                    }
                    if new_waiting_front.is_empty() {
                        self.stops_with_new_waiting.push(arrival_stop);
                    }
                    waiting_front.remove_elements_dominated_by(&waiting_criteria, self.request);
                    new_waiting_front.add_and_remove_elements_dominated(
                        waiting,
                        waiting_criteria,
                        self.request,
                    );
                }
            }
        }
    }

    // merge `new_debarked_fronts` into `debarked_fronts` and clear them
    fn save_and_clear_new_debarked(&mut self) {
        for stop in &self.stops_with_new_debarked {
            let debarked_front = &mut self.debarked_fronts[stop.idx];
            let new_debarked_front = &mut self.new_debarked_fronts[stop.idx];
            debug_assert!(!new_debarked_front.is_empty());
            for (debarked, criteria) in new_debarked_front.iter() {
                debarked_front.add_unchecked(*debarked, criteria.clone());
            }
            new_debarked_front.clear();
        }
        self.stops_with_new_debarked.clear();
    }
}

pub(crate) struct McOutcome {
    pub journeys: Vec<Journey>,
    pub stopped_at_deadline: bool,
}

fn same_itinerary(lhs: &Journey, rhs: &Journey) -> bool {
    lhs.first_vehicle == rhs.first_vehicle && lhs.connections == rhs.connections
}

fn merge_journey(
    merged: &mut Vec<(Journey, Criteria)>,
    request: &McRequest<'_>,
    journey: Journey,
    criteria: Criteria,
) {
    let useless = merged.iter().any(|(kept_journey, kept_criteria)| {
        request.is_lower(kept_criteria, &criteria) || same_itinerary(kept_journey, &journey)
    });
    if useless {
        return;
    }
    merged.retain(|(_, kept_criteria)| !request.is_lower(&criteria, kept_criteria));
    merged.push((journey, criteria));
}

/// Run a full multicriteria range search : one fresh propagation per
/// departure anchor, each restricted to first boardings departing within
/// its slice of the window, and all arrived fronts merged into one
/// pareto set of journeys.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_multicriteria(
    schedule: &Schedule,
    params: &SearchParams,
    slacks: &dyn SlackProvider,
    accesses: &[AccessPath],
    egresses: &[EgressPath],
    heuristics: Option<&StopHeuristics>,
    base_anchor: &SecondsSinceScheduleStart,
    window: &PositiveDuration,
    deadline: Option<Instant>,
) -> McOutcome {
    let anchors =
        iteration_anchors::<ForwardCalculator>(base_anchor, window, &params.iteration_step);
    // a time-dependent access may shift its actual start across anchor
    // slices, so the first-boarding partition cannot be applied
    let partition_first_boardings = !accesses.iter().any(AccessPath::is_time_dependent);
    let mut merged: Vec<(Journey, Criteria)> = Vec::new();
    let mut stopped_at_deadline = false;

    for (iteration, anchor) in anchors.iter().enumerate() {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                debug!(
                    "multicriteria search stopped at its deadline after {} of {} iterations",
                    iteration,
                    anchors.len()
                );
                stopped_at_deadline = true;
                break;
            }
        }
        let first_board_deadline =
            partition_first_boardings.then(|| *anchor + params.iteration_step);
        let request = McRequest::new(
            schedule,
            params,
            slacks,
            accesses,
            egresses,
            heuristics,
            *anchor,
            first_board_deadline,
        );
        let mut raptor = MultiCriteriaRaptor::new(&request);
        raptor.compute();
        for (journey, criteria) in raptor.journeys() {
            merge_journey(&mut merged, &request, journey, criteria);
        }
    }

    McOutcome {
        journeys: merged.into_iter().map(|(journey, _)| journey).collect(),
        stopped_at_deadline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Profile;
    use crate::schedule::{FlowDirection, StandardSlack};
    use crate::time::Calendar;
    use chrono::NaiveDate;

    fn t(seconds: u32) -> SecondsSinceScheduleStart {
        SecondsSinceScheduleStart::from_seconds(seconds)
    }

    fn test_calendar() -> Calendar {
        let first = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2021, 1, 2).unwrap();
        Calendar::new(first, last)
    }

    fn two_lines_schedule() -> Schedule {
        // two missions from A to C : a fast one and a slow cheap-group
        // one, so that the pareto front can hold both
        let mut schedule = Schedule::new(test_calendar());
        let a = schedule.add_stop("A");
        let b = schedule.add_stop("B");
        let c = schedule.add_stop("C");

        let fast = schedule.add_mission(
            "fast",
            vec![a, c],
            vec![FlowDirection::BoardOnly, FlowDirection::DebarkOnly],
            vec![true, true],
            0,
            0,
            0,
        );
        schedule
            .add_trip(&fast, vec![t(1000), t(1300)], vec![t(1000), t(1300)], false)
            .unwrap();

        let slow = schedule.add_mission(
            "slow",
            vec![a, b, c],
            vec![
                FlowDirection::BoardOnly,
                FlowDirection::BoardAndDebark,
                FlowDirection::DebarkOnly,
            ],
            vec![true, true, true],
            0,
            1,
            1,
        );
        schedule
            .add_trip(
                &slow,
                vec![t(950), t(1200), t(1500)],
                vec![t(950), t(1200), t(1500)],
                false,
            )
            .unwrap();

        schedule
    }

    fn test_params() -> SearchParams {
        let mut params: SearchParams = serde_json::from_str("{}").unwrap();
        params.profile = Profile::MultiCriteria;
        params
    }

    #[test]
    fn dominance_is_partial_on_arrival_and_cost() {
        let schedule = two_lines_schedule();
        let params = test_params();
        let slacks = StandardSlack::default();
        let accesses = [];
        let egresses = [];
        let request = McRequest::new(
            &schedule, &params, &slacks, &accesses, &egresses, None, t(0), None,
        );
        let base = Criteria {
            arrival_time: t(1000),
            cost: Cost::from_seconds(100),
            nb_of_legs: 1,
            departure_time: None,
            priority_groups: 1,
            guaranteed_trip: None,
            has_boarded: true,
        };
        let later_but_cheaper = Criteria {
            arrival_time: t(1100),
            cost: Cost::from_seconds(50),
            ..base.clone()
        };
        assert!(!request.is_lower(&base, &later_but_cheaper));
        assert!(!request.is_lower(&later_but_cheaper, &base));

        let worse_everywhere = Criteria {
            arrival_time: t(1200),
            cost: Cost::from_seconds(200),
            ..base.clone()
        };
        assert!(request.is_lower(&base, &worse_everywhere));
    }

    #[test]
    fn guaranteed_connection_is_protected_from_dominance() {
        let schedule = two_lines_schedule();
        let params = test_params();
        let slacks = StandardSlack::default();
        let accesses = [];
        let egresses = [];
        let request = McRequest::new(
            &schedule, &params, &slacks, &accesses, &egresses, None, t(0), None,
        );
        let trip = Trip {
            mission: Mission { idx: 0 },
            idx: 0,
        };
        let held = Criteria {
            arrival_time: t(1200),
            cost: Cost::from_seconds(500),
            nb_of_legs: 1,
            departure_time: None,
            priority_groups: 1,
            guaranteed_trip: Some(trip),
            has_boarded: true,
        };
        let better_but_unprotected = Criteria {
            arrival_time: t(1000),
            cost: Cost::zero(),
            guaranteed_trip: None,
            ..held.clone()
        };
        assert!(!request.is_lower(&better_but_unprotected, &held));
        // the same held connection may still dominate
        let same_connection_better = Criteria {
            cost: Cost::from_seconds(100),
            ..held.clone()
        };
        assert!(request.is_lower(&same_connection_better, &held));
    }

    #[test]
    fn finds_pareto_front_of_two_journeys() {
        let schedule = two_lines_schedule();
        let mut params = test_params();
        // make the slow line cheap enough to be worth its later arrival
        params.transit_reluctances = vec![crate::cost::Ratio::one(), crate::cost::Ratio::from_hundredths(10)];
        let slacks = StandardSlack::default();
        let a = schedule.stop_by_name("A").unwrap();
        let c = schedule.stop_by_name("C").unwrap();
        let accesses = [AccessPath::new(a, PositiveDuration::zero())];
        let egresses = [EgressPath::new(c, PositiveDuration::zero())];
        let request = McRequest::new(
            &schedule, &params, &slacks, &accesses, &egresses, None, t(900), None,
        );
        let mut raptor = MultiCriteriaRaptor::new(&request);
        raptor.compute();
        let journeys = raptor.journeys();
        assert_eq!(journeys.len(), 2);
        let mut arrivals: Vec<u32> = journeys
            .iter()
            .map(|(journey, _)| journey.arrival_time.total_seconds())
            .collect();
        arrivals.sort_unstable();
        assert_eq!(arrivals, vec![1300, 1500]);
    }

    #[test]
    fn range_search_partitions_first_boardings() {
        let schedule = two_lines_schedule();
        let mut params = test_params();
        params.iteration_step = PositiveDuration::from_seconds(60);
        params.transit_reluctances = vec![
            crate::cost::Ratio::one(),
            crate::cost::Ratio::from_hundredths(10),
        ];
        let slacks = StandardSlack::default();
        let a = schedule.stop_by_name("A").unwrap();
        let c = schedule.stop_by_name("C").unwrap();
        let accesses = [AccessPath::new(a, PositiveDuration::zero())];
        let egresses = [EgressPath::new(c, PositiveDuration::zero())];
        let outcome = solve_multicriteria(
            &schedule,
            &params,
            &slacks,
            &accesses,
            &egresses,
            None,
            &t(900),
            &PositiveDuration::from_seconds(300),
            None,
        );
        assert!(!outcome.stopped_at_deadline);
        // the fast line at 1000 and the slow line at 950, each found once
        assert_eq!(outcome.journeys.len(), 2);
    }
}

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
// www.navitia.io

pub mod timetable;
pub mod transfers;

use crate::time::{Calendar, PositiveDuration, SecondsSinceScheduleStart};

pub use timetable::{FlowDirection, Timetable, VehicleData, VehicleTimesError};
pub use transfers::{GuaranteedTransfer, SlackProvider, StandardSlack, Transfer};

/// A location where a vehicle can be boarded into or debarked from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stop {
    pub(crate) idx: usize,
}

/// A `Mission` is an ordered sequence of `Stop`s, together with the
/// timetable of all trips serving this exact sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mission {
    pub(crate) idx: usize,
}

/// Identify a step along a `Mission`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) idx: usize,
}

/// A trip of a vehicle along a `Mission`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trip {
    pub(crate) mission: Mission,
    pub(crate) idx: usize,
}

#[derive(Debug)]
pub(crate) struct StopData {
    pub(crate) name: String,
    pub(crate) is_banned: bool,
}

#[derive(Debug)]
pub(crate) struct MissionData {
    pub(crate) timetable: Timetable,
    // index into the SlackProvider, one per physical mode
    pub(crate) slack_index: usize,
    // index into SearchParams.transit_reluctances, one per physical mode
    pub(crate) reluctance_index: usize,
    pub(crate) priority_group: u8,
    pub(crate) name: String,
}

/// The immutable transit data consumed by the engine.
///
/// Built once per dataset, then shared read-only between all concurrent
/// search requests.
#[derive(Debug)]
pub struct Schedule {
    calendar: Calendar,
    stops: Vec<StopData>,
    missions: Vec<MissionData>,
    // missions serving each stop, with the position of the stop on the mission
    missions_at_stop: Vec<Vec<(Mission, Position)>>,
    transfers: transfers::TransferTables,
}

impl Schedule {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            stops: Vec::new(),
            missions: Vec::new(),
            missions_at_stop: Vec::new(),
            transfers: transfers::TransferTables::new(),
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn nb_of_stops(&self) -> usize {
        self.stops.len()
    }

    pub fn nb_of_missions(&self) -> usize {
        self.missions.len()
    }

    pub fn nb_of_trips(&self) -> usize {
        self.missions
            .iter()
            .map(|mission| mission.timetable.nb_of_vehicles())
            .sum()
    }

    pub fn stop_name(&self, stop: &Stop) -> &str {
        &self.stops[stop.idx].name
    }

    pub fn mission_name(&self, mission: &Mission) -> &str {
        &self.missions[mission.idx].name
    }

    pub fn is_banned(&self, stop: &Stop) -> bool {
        self.stops[stop.idx].is_banned
    }

    pub(crate) fn mission_data(&self, mission: &Mission) -> &MissionData {
        &self.missions[mission.idx]
    }

    pub fn nb_of_positions(&self, mission: &Mission) -> usize {
        self.mission_data(mission).timetable.nb_of_positions()
    }

    pub fn stop_of(&self, position: &Position, mission: &Mission) -> Stop {
        *self.mission_data(mission).timetable.stop_at(position.idx)
    }

    pub fn is_upstream(
        &self,
        upstream: &Position,
        downstream: &Position,
        _mission: &Mission,
    ) -> bool {
        upstream.idx < downstream.idx
    }

    pub fn next_on_mission(&self, position: &Position, mission: &Mission) -> Option<Position> {
        if position.idx + 1 < self.nb_of_positions(mission) {
            Some(Position {
                idx: position.idx + 1,
            })
        } else {
            None
        }
    }

    pub fn previous_on_mission(&self, position: &Position, _mission: &Mission) -> Option<Position> {
        position.idx.checked_sub(1).map(|idx| Position { idx })
    }

    pub fn mission_of(&self, trip: &Trip) -> Mission {
        trip.mission
    }

    /// `true` if a traveler may board at `position`, taking the global
    /// banned stop set into account. Banned stops may still be ridden through.
    pub fn can_board(&self, position: &Position, mission: &Mission) -> bool {
        let timetable = &self.mission_data(mission).timetable;
        timetable.can_board(position.idx) && !self.is_banned(timetable.stop_at(position.idx))
    }

    pub fn can_debark(&self, position: &Position, mission: &Mission) -> bool {
        let timetable = &self.mission_data(mission).timetable;
        timetable.can_debark(position.idx) && !self.is_banned(timetable.stop_at(position.idx))
    }

    pub fn is_wheelchair_usable(&self, position: &Position, mission: &Mission) -> bool {
        self.mission_data(mission)
            .timetable
            .is_wheelchair_usable(position.idx)
    }

    pub fn board_time_of(
        &self,
        trip: &Trip,
        position: &Position,
    ) -> Option<SecondsSinceScheduleStart> {
        if !self.can_board(position, &trip.mission) {
            return None;
        }
        Some(
            self.mission_data(&trip.mission)
                .timetable
                .departure_time(trip.idx, position.idx),
        )
    }

    pub fn debark_time_of(
        &self,
        trip: &Trip,
        position: &Position,
    ) -> Option<SecondsSinceScheduleStart> {
        if !self.can_debark(position, &trip.mission) {
            return None;
        }
        Some(
            self.mission_data(&trip.mission)
                .timetable
                .arrival_time(trip.idx, position.idx),
        )
    }

    pub fn arrival_time_of(&self, trip: &Trip, position: &Position) -> SecondsSinceScheduleStart {
        self.mission_data(&trip.mission)
            .timetable
            .arrival_time(trip.idx, position.idx)
    }

    pub fn departure_time_of(&self, trip: &Trip, position: &Position) -> SecondsSinceScheduleStart {
        self.mission_data(&trip.mission)
            .timetable
            .departure_time(trip.idx, position.idx)
    }

    pub fn is_realtime(&self, trip: &Trip) -> bool {
        self.mission_data(&trip.mission)
            .timetable
            .vehicle_data(trip.idx)
            .is_realtime
    }

    pub fn slack_index(&self, mission: &Mission) -> usize {
        self.mission_data(mission).slack_index
    }

    pub fn reluctance_index(&self, mission: &Mission) -> usize {
        self.mission_data(mission).reluctance_index
    }

    pub fn priority_group(&self, mission: &Mission) -> u8 {
        self.mission_data(mission).priority_group
    }

    /// The earliest trip of `mission` that can be boarded at `position`
    /// when ready to depart at `waiting_time`, along with its departure time.
    pub fn earliest_trip_to_board(
        &self,
        waiting_time: &SecondsSinceScheduleStart,
        mission: &Mission,
        position: &Position,
    ) -> Option<(Trip, SecondsSinceScheduleStart)> {
        if !self.can_board(position, mission) {
            return None;
        }
        self.mission_data(mission)
            .timetable
            .earliest_vehicle_to_board(waiting_time, position.idx)
            .map(|(idx, time)| (Trip { mission: *mission, idx }, time))
    }

    /// The latest trip of `mission` that debarks at `position` no later than
    /// `time`, along with its arrival time. Mirror of
    /// [`Self::earliest_trip_to_board`] for the reverse search.
    pub fn latest_trip_to_debark(
        &self,
        time: &SecondsSinceScheduleStart,
        mission: &Mission,
        position: &Position,
    ) -> Option<(Trip, SecondsSinceScheduleStart)> {
        if !self.can_debark(position, mission) {
            return None;
        }
        self.mission_data(mission)
            .timetable
            .latest_vehicle_to_debark(time, position.idx)
            .map(|(idx, time)| (Trip { mission: *mission, idx }, time))
    }

    pub fn missions_at(&self, stop: &Stop) -> impl Iterator<Item = (Mission, Position)> + '_ {
        self.missions_at_stop[stop.idx].iter().copied()
    }

    pub fn transfers_from(&self, from_stop: &Stop) -> impl Iterator<Item = Transfer> + '_ {
        self.transfers.outgoing(from_stop)
    }

    pub fn transfers_to(&self, to_stop: &Stop) -> impl Iterator<Item = Transfer> + '_ {
        self.transfers.incoming(to_stop)
    }

    pub fn transfer_from_stop(&self, transfer: &Transfer) -> Stop {
        self.transfers.from_stop(transfer)
    }

    pub fn transfer_to_stop(&self, transfer: &Transfer) -> Stop {
        self.transfers.to_stop(transfer)
    }

    pub fn transfer_duration(&self, transfer: &Transfer) -> PositiveDuration {
        self.transfers.duration(transfer)
    }

    pub fn is_forbidden_transfer(&self, from_stop: &Stop, to_stop: &Stop) -> bool {
        self.transfers.is_forbidden(from_stop, to_stop)
    }

    pub fn guaranteed_transfers_from(
        &self,
        from_trip: &Trip,
        from_stop: &Stop,
    ) -> &[GuaranteedTransfer] {
        self.transfers.guaranteed_from(from_trip, from_stop)
    }

    pub fn guaranteed_transfers_to(
        &self,
        to_trip: &Trip,
        to_stop: &Stop,
    ) -> &[GuaranteedTransfer] {
        self.transfers.guaranteed_to(to_trip, to_stop)
    }
}

/// Construction interface, used by dataset importers and by
/// [`crate::modelbuilder::ModelBuilder`].
impl Schedule {
    pub fn add_stop(&mut self, name: &str) -> Stop {
        let idx = self.stops.len();
        self.stops.push(StopData {
            name: name.to_string(),
            is_banned: false,
        });
        self.missions_at_stop.push(Vec::new());
        self.transfers.add_stop();
        Stop { idx }
    }

    pub fn ban_stop(&mut self, stop: &Stop) {
        self.stops[stop.idx].is_banned = true;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_mission(
        &mut self,
        name: &str,
        stops: Vec<Stop>,
        flows: Vec<FlowDirection>,
        wheelchair_usable: Vec<bool>,
        slack_index: usize,
        reluctance_index: usize,
        priority_group: u8,
    ) -> Mission {
        assert!(stops.len() >= 2);
        assert!(stops.len() == flows.len());
        assert!(stops.len() == wheelchair_usable.len());
        let mission = Mission {
            idx: self.missions.len(),
        };
        for (position_idx, stop) in stops.iter().enumerate() {
            self.missions_at_stop[stop.idx].push((mission, Position { idx: position_idx }));
        }
        let timetable = Timetable::new(stops, flows, wheelchair_usable);
        self.missions.push(MissionData {
            timetable,
            slack_index,
            reluctance_index,
            priority_group,
            name: name.to_string(),
        });
        mission
    }

    /// Insert a trip in the timetable of `mission`.
    ///
    /// Trips must be inserted in increasing time order : the returned `Trip`
    /// identifies the vehicle by its rank in the timetable.
    pub fn add_trip(
        &mut self,
        mission: &Mission,
        board_times: Vec<SecondsSinceScheduleStart>,
        debark_times: Vec<SecondsSinceScheduleStart>,
        is_realtime: bool,
    ) -> Result<Trip, VehicleTimesError> {
        let timetable = &mut self.missions[mission.idx].timetable;
        let idx = timetable.insert(board_times, debark_times, VehicleData { is_realtime })?;
        Ok(Trip {
            mission: *mission,
            idx,
        })
    }

    pub fn add_transfer(
        &mut self,
        from_stop: Stop,
        to_stop: Stop,
        min_duration: PositiveDuration,
    ) -> Transfer {
        self.transfers.add(from_stop, to_stop, min_duration)
    }

    pub fn add_guaranteed_transfer(
        &mut self,
        from_trip: Trip,
        from_stop: Stop,
        to_trip: Trip,
        to_stop: Stop,
    ) {
        self.transfers
            .add_guaranteed(from_trip, from_stop, to_trip, to_stop);
    }

    pub fn forbid_transfer(&mut self, from_stop: Stop, to_stop: Stop) {
        self.transfers.forbid(from_stop, to_stop);
    }

    /// Find a stop by its debug name. Mostly useful in tests.
    pub fn stop_by_name(&self, name: &str) -> Option<Stop> {
        self.stops
            .iter()
            .position(|stop_data| stop_data.name == name)
            .map(|idx| Stop { idx })
    }
}

/// Per-stop statistics on departure frequency, used to size the
/// search window when the caller leaves it unset.
#[derive(Debug)]
pub struct DepartureStatistics {
    pub nb_of_departures: usize,
    pub nb_of_boardable_positions: usize,
}

impl Schedule {
    pub fn departure_statistics(&self) -> DepartureStatistics {
        let mut nb_of_departures = 0;
        let mut nb_of_boardable_positions = 0;
        for mission_data in &self.missions {
            let timetable = &mission_data.timetable;
            for position_idx in 0..timetable.nb_of_positions() {
                if timetable.can_board(position_idx) {
                    nb_of_boardable_positions += 1;
                    nb_of_departures += timetable.nb_of_vehicles();
                }
            }
        }
        DepartureStatistics {
            nb_of_departures,
            nb_of_boardable_positions,
        }
    }
}

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

use crate::cost::Cost;
use crate::engine::heuristics::StopHeuristics;
use crate::fallback::{AccessPath, EgressPath};
use crate::request::SearchParams;
use crate::schedule::{Position, Schedule, Transfer, Trip};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};
use chrono::NaiveDateTime;
use std::fmt::Write;

/// One ride in a vehicle, from boarding to debarking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleLeg {
    pub trip: Trip,
    pub board_position: Position,
    pub debark_position: Position,
}

/// How two consecutive vehicle legs are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// walk a foot transfer between two stops
    Footpath(Transfer),
    /// a guaranteed connection between the two trips
    Guaranteed,
    /// board again at the very stop where the previous vehicle was left
    SameStop,
}

/// A complete journey : an access fallback, at least one vehicle leg,
/// then an egress fallback.
#[derive(Debug, Clone)]
pub struct Journey {
    pub access: AccessPath,
    /// time at which the access path is started
    pub departure_time: SecondsSinceScheduleStart,
    pub first_vehicle: VehicleLeg,
    pub connections: Vec<(Connection, VehicleLeg)>,
    pub egress: EgressPath,
    /// time at which the egress path is completed
    pub arrival_time: SecondsSinceScheduleStart,
    /// generalized cost, see [`Journey::compute_cost`]
    pub cost: Cost,
}

/// Reasons for which a journey assembled by the engine is rejected
/// before being handed to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum BadJourney {
    NoBoardableFirstVehicle,
    DebarkNotAfterBoard(VehicleLeg),
    ConnectionGoesBackwards(VehicleLeg, VehicleLeg),
    ForbiddenConnection(VehicleLeg, VehicleLeg),
    EgressBeforeLastDebark,
}

impl std::fmt::Display for BadJourney {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BadJourney::NoBoardableFirstVehicle => {
                write!(f, "The first vehicle of the journey cannot be boarded.")
            }
            BadJourney::DebarkNotAfterBoard(_) => write!(
                f,
                "A vehicle leg of the journey debarks at or before its boarding."
            ),
            BadJourney::ConnectionGoesBackwards(_, _) => write!(
                f,
                "A connection of the journey boards a vehicle before the previous one debarks."
            ),
            BadJourney::ForbiddenConnection(_, _) => {
                write!(f, "A connection of the journey uses a forbidden stop pair.")
            }
            BadJourney::EgressBeforeLastDebark => {
                write!(f, "The egress of the journey starts before the last debark.")
            }
        }
    }
}

impl std::error::Error for BadJourney {}

impl Journey {
    pub fn vehicle_legs(&self) -> impl Iterator<Item = &VehicleLeg> {
        std::iter::once(&self.first_vehicle).chain(self.connections.iter().map(|(_, leg)| leg))
    }

    pub fn last_vehicle(&self) -> &VehicleLeg {
        self.connections
            .last()
            .map_or(&self.first_vehicle, |(_, leg)| leg)
    }

    pub fn nb_of_vehicle_legs(&self) -> usize {
        1 + self.connections.len()
    }

    /// All vehicle legs of the journey, the rides of the flex fallbacks
    /// included.
    pub fn nb_of_legs(&self) -> usize {
        self.nb_of_vehicle_legs()
            + usize::from(self.access.nb_of_rides)
            + usize::from(self.egress.nb_of_rides)
    }

    pub fn nb_of_transfers(&self) -> usize {
        self.nb_of_legs() - 1
    }

    pub fn total_duration(&self) -> PositiveDuration {
        // unwrap is safe because a journey always arrives after it departed
        self.arrival_time
            .duration_since(&self.departure_time)
            .unwrap()
    }

    pub fn departure_datetime(&self, schedule: &Schedule) -> NaiveDateTime {
        schedule.calendar().to_naive_datetime(&self.departure_time)
    }

    pub fn arrival_datetime(&self, schedule: &Schedule) -> NaiveDateTime {
        schedule.calendar().to_naive_datetime(&self.arrival_time)
    }

    /// Check that the journey can actually be ridden on `schedule` :
    /// boardings allowed, chronological order respected, no forbidden
    /// stop pair used by a connection.
    pub fn is_valid(&self, schedule: &Schedule) -> Result<(), BadJourney> {
        let first = &self.first_vehicle;
        if schedule
            .board_time_of(&first.trip, &first.board_position)
            .is_none()
        {
            return Err(BadJourney::NoBoardableFirstVehicle);
        }

        for leg in self.vehicle_legs() {
            let mission = schedule.mission_of(&leg.trip);
            if !schedule.is_upstream(&leg.board_position, &leg.debark_position, &mission) {
                return Err(BadJourney::DebarkNotAfterBoard(*leg));
            }
        }

        let mut previous_leg = *first;
        for (connection, leg) in &self.connections {
            let debark_time =
                schedule.arrival_time_of(&previous_leg.trip, &previous_leg.debark_position);
            let board_time = schedule.departure_time_of(&leg.trip, &leg.board_position);
            match connection {
                Connection::Guaranteed => {
                    // the connection is held, times need not be checked
                }
                Connection::SameStop | Connection::Footpath(_) => {
                    if board_time < debark_time {
                        return Err(BadJourney::ConnectionGoesBackwards(previous_leg, *leg));
                    }
                    let from_mission = schedule.mission_of(&previous_leg.trip);
                    let to_mission = schedule.mission_of(&leg.trip);
                    let from_stop = schedule.stop_of(&previous_leg.debark_position, &from_mission);
                    let to_stop = schedule.stop_of(&leg.board_position, &to_mission);
                    if schedule.is_forbidden_transfer(&from_stop, &to_stop) {
                        return Err(BadJourney::ForbiddenConnection(previous_leg, *leg));
                    }
                }
            }
            previous_leg = *leg;
        }

        let last_debark =
            schedule.arrival_time_of(&previous_leg.trip, &previous_leg.debark_position);
        match self.arrival_time.checked_sub(self.egress.duration) {
            Some(egress_start) if egress_start >= last_debark => Ok(()),
            _ => Err(BadJourney::EgressBeforeLastDebark),
        }
    }

    /// The generalized cost of the journey under `params` :
    /// fallback costs, in-vehicle time weighted by the reluctance of each
    /// boarded mission, waits weighted by the wait reluctance, footpaths
    /// weighted by the walk reluctance, plus the per-boarding penalties.
    pub fn compute_cost(&self, schedule: &Schedule, params: &SearchParams) -> Cost {
        let mut cost = self.access.cost + self.egress.cost;

        for leg in self.vehicle_legs() {
            let mission = schedule.mission_of(&leg.trip);
            let reluctance = params.transit_reluctance(schedule.reluctance_index(&mission));
            let board = schedule.departure_time_of(&leg.trip, &leg.board_position);
            let debark = schedule.arrival_time_of(&leg.trip, &leg.debark_position);
            if let Some(in_vehicle) = debark.duration_since(&board) {
                cost = cost + reluctance.cost_of(&in_vehicle);
            }
        }

        let nb_of_boardings = self.nb_of_vehicle_legs() as u64;
        cost = cost
            + Cost::from_seconds(nb_of_boardings * params.board_penalty.total_seconds())
            + Cost::from_seconds((nb_of_boardings - 1) * params.transfer_penalty.total_seconds());

        // wait between the access arrival and the first boarding
        let access_arrival = self.departure_time + self.access.duration;
        let first_board = schedule
            .departure_time_of(&self.first_vehicle.trip, &self.first_vehicle.board_position);
        if let Some(wait) = first_board.duration_since(&access_arrival) {
            cost = cost + params.wait_reluctance.cost_of(&wait);
        }

        // walks and waits between consecutive legs
        let mut previous_debark = schedule
            .arrival_time_of(&self.first_vehicle.trip, &self.first_vehicle.debark_position);
        for (connection, leg) in &self.connections {
            let board = schedule.departure_time_of(&leg.trip, &leg.board_position);
            let walk = match connection {
                Connection::Footpath(transfer) => schedule.transfer_duration(transfer),
                Connection::Guaranteed | Connection::SameStop => PositiveDuration::zero(),
            };
            cost = cost + params.walk_reluctance.cost_of(&walk);
            if let Some(wait) = board.duration_since(&(previous_debark + walk)) {
                cost = cost + params.wait_reluctance.cost_of(&wait);
            }
            previous_debark = schedule.arrival_time_of(&leg.trip, &leg.debark_position);
        }

        cost
    }

    /// A human readable, multi line description of the journey.
    pub fn print(&self, schedule: &Schedule) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        writeln!(
            result,
            "*** Journey departing {} arriving {}, cost {} ***",
            self.departure_datetime(schedule),
            self.arrival_datetime(schedule),
            self.cost,
        )?;
        writeln!(
            result,
            "  access {} to {}",
            self.access.duration,
            schedule.stop_name(&self.access.stop),
        )?;
        for leg in self.vehicle_legs() {
            let mission = schedule.mission_of(&leg.trip);
            let board_stop = schedule.stop_of(&leg.board_position, &mission);
            let debark_stop = schedule.stop_of(&leg.debark_position, &mission);
            writeln!(
                result,
                "  ride {} from {} at {} to {} at {}",
                schedule.mission_name(&mission),
                schedule.stop_name(&board_stop),
                schedule.departure_time_of(&leg.trip, &leg.board_position),
                schedule.stop_name(&debark_stop),
                schedule.arrival_time_of(&leg.trip, &leg.debark_position),
            )?;
        }
        writeln!(
            result,
            "  egress {} from {}",
            self.egress.duration,
            schedule.stop_name(&self.egress.stop),
        )?;
        Ok(result)
    }
}

/// What the solver hands back to the caller.
#[derive(Debug)]
pub struct Response {
    /// valid journeys, in departure time order
    pub journeys: Vec<Journey>,
    /// the search window that was actually explored, whether requested
    /// explicitly or computed from the schedule
    pub search_window_used: PositiveDuration,
    /// `true` when the search hit its deadline before the whole window
    /// was explored
    pub stopped_at_deadline: bool,
    /// the per-stop bounds toward the destination computed for this
    /// request, reusable by the caller to page through further windows
    pub heuristics: StopHeuristics,
}

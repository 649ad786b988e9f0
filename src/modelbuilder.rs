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

//! Provides an easy way to create a [`crate::schedule::Schedule`]
//!
//! ```
//! # use sleipnir::modelbuilder::ModelBuilder;
//!
//! # fn main() {
//!  let schedule = ModelBuilder::default()
//!      .vj("toto", |vj| {
//!          vj.st("A", "10:00:00").st("B", "11:00:00")
//!      })
//!      .vj("tata", |vj| {
//!          vj.st("A", "10:00:00").st("D", "11:00:00")
//!      })
//!      .build();
//! # }
//! ```

use std::str::FromStr;

use chrono::NaiveDate;

use crate::schedule::{FlowDirection, Mission, Schedule, Stop, Trip};
use crate::time::{Calendar, PositiveDuration, SecondsSinceScheduleStart};

const DEFAULT_ROUTE_NAME: &str = "default_route";

/// Builder used to easily create a `Schedule`.
/// Note: if not explicitly set, the validity period starts 2020-01-01.
pub struct ModelBuilder {
    schedule: Schedule,
    /// one entry per created mission, with the signature its vehicle
    /// journeys must share
    missions: Vec<(MissionSignature, Mission)>,
    trips_by_name: Vec<(String, Trip)>,
}

#[derive(PartialEq)]
struct MissionSignature {
    route_name: String,
    stops: Vec<Stop>,
    flows: Vec<FlowDirection>,
    wheelchair_usable: Vec<bool>,
    slack_index: usize,
    reluctance_index: usize,
    priority_group: u8,
}

/// Builder used to create one vehicle journey : its stop times and the
/// properties of the route it runs on.
pub struct VehicleJourneyBuilder {
    name: String,
    route_name: String,
    stop_times: Vec<StopTime>,
    slack_index: usize,
    reluctance_index: usize,
    priority_group: u8,
    is_realtime: bool,
}

pub struct StopTime {
    pub stop_name: String,
    pub arrival: SecondsSinceScheduleStart,
    pub departure: SecondsSinceScheduleStart,
    pub flow: FlowDirection,
    pub wheelchair_usable: bool,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        let date = "2020-01-01";
        Self::new(date, date)
    }
}

impl ModelBuilder {
    pub fn new(start_validity_period: &str, end_validity_period: &str) -> Self {
        let start_date = as_date(start_validity_period);
        let end_date = as_date(end_validity_period);
        Self {
            schedule: Schedule::new(Calendar::new(start_date, end_date)),
            missions: Vec::new(),
            trips_by_name: Vec::new(),
        }
    }

    /// Add a new vehicle journey to the schedule
    ///
    /// ```
    /// # use sleipnir::modelbuilder::ModelBuilder;
    ///
    /// # fn main() {
    /// let schedule = ModelBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00")
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn vj<F>(mut self, name: &str, vj_initer: F) -> Self
    where
        F: FnOnce(VehicleJourneyBuilder) -> VehicleJourneyBuilder,
    {
        assert!(
            !self.trips_by_name.iter().any(|(known, _)| known == name),
            "vj {} already exists",
            name
        );
        let vj_builder = VehicleJourneyBuilder {
            name: name.to_string(),
            route_name: DEFAULT_ROUTE_NAME.to_string(),
            stop_times: Vec::new(),
            slack_index: 0,
            reluctance_index: 0,
            priority_group: 0,
            is_realtime: false,
        };
        let vj = vj_initer(vj_builder);
        self.insert_vj(vj);
        self
    }

    /// Add a walk transfer between two stops
    pub fn transfer(mut self, from: &str, to: &str, duration: &str) -> Self {
        let from_stop = self.find_or_create_stop(from);
        let to_stop = self.find_or_create_stop(to);
        let duration = PositiveDuration::from_str(duration)
            .unwrap_or_else(|err| panic!("bad transfer duration : {}", err));
        self.schedule.add_transfer(from_stop, to_stop, duration);
        self
    }

    /// Add a guaranteed (stay-seated) connection between two vehicle
    /// journeys, identified by their names
    pub fn guaranteed_transfer(
        mut self,
        from_vj: &str,
        from_stop: &str,
        to_vj: &str,
        to_stop: &str,
    ) -> Self {
        let from_trip = self.trip_by_name(from_vj);
        let to_trip = self.trip_by_name(to_vj);
        let from_stop = self.find_or_create_stop(from_stop);
        let to_stop = self.find_or_create_stop(to_stop);
        self.schedule
            .add_guaranteed_transfer(from_trip, from_stop, to_trip, to_stop);
        self
    }

    /// Forbid moving between two stops when changing vehicles
    pub fn forbidden_transfer(mut self, from: &str, to: &str) -> Self {
        let from_stop = self.find_or_create_stop(from);
        let to_stop = self.find_or_create_stop(to);
        self.schedule.forbid_transfer(from_stop, to_stop);
        self
    }

    /// Exclude a stop from boarding, debarking and transfers. Vehicles
    /// still ride through it.
    pub fn ban_stop(mut self, name: &str) -> Self {
        let stop = self.find_or_create_stop(name);
        self.schedule.ban_stop(&stop);
        self
    }

    pub fn build(self) -> Schedule {
        self.schedule
    }

    fn find_or_create_stop(&mut self, name: &str) -> Stop {
        match self.schedule.stop_by_name(name) {
            Some(stop) => stop,
            None => self.schedule.add_stop(name),
        }
    }

    fn trip_by_name(&self, name: &str) -> Trip {
        self.trips_by_name
            .iter()
            .find(|(known, _)| known == name)
            .map(|(_, trip)| *trip)
            .unwrap_or_else(|| panic!("vj {} does not exist", name))
    }

    fn insert_vj(&mut self, vj: VehicleJourneyBuilder) {
        assert!(
            vj.stop_times.len() >= 2,
            "vj {} needs at least two stop times",
            vj.name
        );
        let mut stops = Vec::with_capacity(vj.stop_times.len());
        for stop_time in &vj.stop_times {
            stops.push(self.find_or_create_stop(&stop_time.stop_name));
        }
        let signature = MissionSignature {
            route_name: vj.route_name.clone(),
            stops: stops.clone(),
            flows: vj.stop_times.iter().map(|st| st.flow).collect(),
            wheelchair_usable: vj.stop_times.iter().map(|st| st.wheelchair_usable).collect(),
            slack_index: vj.slack_index,
            reluctance_index: vj.reluctance_index,
            priority_group: vj.priority_group,
        };
        let mission = match self
            .missions
            .iter()
            .find(|(known, _)| *known == signature)
        {
            Some((_, mission)) => *mission,
            None => {
                let mission = self.schedule.add_mission(
                    &signature.route_name,
                    signature.stops.clone(),
                    signature.flows.clone(),
                    signature.wheelchair_usable.clone(),
                    signature.slack_index,
                    signature.reluctance_index,
                    signature.priority_group,
                );
                self.missions.push((signature, mission));
                mission
            }
        };
        let board_times = vj.stop_times.iter().map(|st| st.departure).collect();
        let debark_times = vj.stop_times.iter().map(|st| st.arrival).collect();
        let trip = self
            .schedule
            .add_trip(&mission, board_times, debark_times, vj.is_realtime)
            .unwrap_or_else(|err| panic!("bad stop times for vj {} : {:?}", vj.name, err));
        self.trips_by_name.push((vj.name, trip));
    }
}

impl VehicleJourneyBuilder {
    /// add a stop time to the vehicle journey
    ///
    /// ```
    /// # use sleipnir::modelbuilder::ModelBuilder;
    ///
    /// # fn main() {
    /// let schedule = ModelBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00")
    ///        })
    ///        .build();
    /// # }
    /// ```
    pub fn st(self, name: &str, arrival: impl IntoTime) -> Self {
        let time = arrival.into_time();
        self.st_mut(name, time, time, |_st| {})
    }

    pub fn st_arr_dep(self, name: &str, arrival: impl IntoTime, departure: impl IntoTime) -> Self {
        self.st_mut(name, arrival, departure, |_st| {})
    }

    pub fn st_mut<F>(
        mut self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        st_muter: F,
    ) -> Self
    where
        F: FnOnce(&mut StopTime),
    {
        let mut stop_time = StopTime {
            stop_name: name.to_string(),
            arrival: arrival.into_time(),
            departure: departure.into_time(),
            flow: FlowDirection::BoardAndDebark,
            wheelchair_usable: true,
        };
        st_muter(&mut stop_time);
        self.stop_times.push(stop_time);
        self
    }

    /// Set the route of the vj. Vehicle journeys with the same route and
    /// the same stop sequence share a mission.
    pub fn route(mut self, name: &str) -> Self {
        self.route_name = name.to_string();
        self
    }

    pub fn slack_index(mut self, slack_index: usize) -> Self {
        self.slack_index = slack_index;
        self
    }

    pub fn reluctance_index(mut self, reluctance_index: usize) -> Self {
        self.reluctance_index = reluctance_index;
        self
    }

    pub fn priority_group(mut self, priority_group: u8) -> Self {
        self.priority_group = priority_group;
        self
    }

    pub fn realtime(mut self) -> Self {
        self.is_realtime = true;
        self
    }
}

pub trait IntoTime: Copy {
    fn into_time(self) -> SecondsSinceScheduleStart;
}

impl IntoTime for SecondsSinceScheduleStart {
    fn into_time(self) -> SecondsSinceScheduleStart {
        self
    }
}

/// "hh:mm:ss", hours above 24 allowed (second day of service)
impl IntoTime for &str {
    fn into_time(self) -> SecondsSinceScheduleStart {
        let duration = PositiveDuration::from_str(self)
            .unwrap_or_else(|err| panic!("invalid time : {}", err));
        SecondsSinceScheduleStart::from_seconds(duration.total_seconds() as u32)
    }
}

fn as_date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .unwrap_or_else(|err| panic!("invalid date {} : {}", text, err))
}

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

use crate::cost::{CostLinearFunction, Ratio};
use crate::fallback::{AccessPath, EgressPath};
use crate::time::PositiveDuration;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which optimization the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// earliest arrival (or latest departure in reverse)
    Standard,
    /// minimal travel time, not counting the wait before the first boarding
    /// nor between vehicles
    NoWaitStandard,
    /// full pareto search over {time, cost, rides, (departure time)}
    MultiCriteria,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Standard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    Forward,
    Reverse,
}

impl Default for SearchDirection {
    fn default() -> Self {
        SearchDirection::Forward
    }
}

/// Tuning parameters of a search, with sensible defaults for all fields.
///
/// These are the parameters a host system would read from its
/// configuration ; the per-request data (datetimes, fallbacks) is in
/// [`RequestInput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    #[serde(default)]
    pub profile: Profile,

    #[serde(default)]
    pub direction: SearchDirection,

    /// length of the departure time window to explore ; when `None` the
    /// window is computed from the schedule and reported in the response
    #[serde(default)]
    pub search_window: Option<PositiveDuration>,

    /// upper bound on `search_window`, whether explicit or computed
    #[serde(default = "default_max_search_window")]
    pub max_search_window: PositiveDuration,

    /// departure time step between two range-raptor iterations
    #[serde(default = "default_iteration_step")]
    pub iteration_step: PositiveDuration,

    /// when `true`, the departure time is a pareto criterion of its own
    /// (timetable view : journeys departing later are kept even when an
    /// earlier journey dominates them otherwise)
    #[serde(default)]
    pub timetable_enabled: bool,

    /// maximum number of vehicle legs in a journey, flex fallback rides included
    #[serde(default = "default_max_nb_of_legs")]
    pub max_nb_of_legs: u8,

    /// extra rounds explored after the first round that reaches the destination
    #[serde(default = "default_nb_of_additional_legs")]
    pub nb_of_additional_legs: u8,

    /// minimum buffer before boarding a vehicle
    #[serde(default = "default_zero_duration")]
    pub board_slack: PositiveDuration,

    /// minimum buffer after debarking a vehicle
    #[serde(default = "default_zero_duration")]
    pub alight_slack: PositiveDuration,

    /// minimum buffer added to every foot transfer
    #[serde(default = "default_zero_duration")]
    pub transfer_slack: PositiveDuration,

    /// cost of every boarding
    #[serde(default = "default_board_penalty")]
    pub board_penalty: PositiveDuration,

    /// additional cost of every boarding after the first one
    #[serde(default = "default_transfer_penalty")]
    pub transfer_penalty: PositiveDuration,

    /// cost of one second spent waiting
    #[serde(default = "default_wait_reluctance")]
    pub wait_reluctance: Ratio,

    /// cost of one second spent walking
    #[serde(default = "default_walk_reluctance")]
    pub walk_reluctance: Ratio,

    /// cost of one second spent in a vehicle, indexed by the
    /// `reluctance_index` of the boarded mission
    #[serde(default = "default_transit_reluctances")]
    pub transit_reluctances: Vec<Ratio>,

    #[serde(default = "default_true")]
    pub use_guaranteed_transfers: bool,

    #[serde(default = "default_true")]
    pub use_forbidden_transfers: bool,

    /// restrict boarding and debarking to wheelchair-usable positions
    #[serde(default)]
    pub wheelchair_accessible: bool,

    /// widen the cost comparison between journeys riding missions of
    /// different priority groups
    #[serde(default)]
    pub relax_transit_group_priority: Option<CostLinearFunction>,

    /// discard any journey whose cost exceeds this function of the best
    /// known cost to the destination
    #[serde(default)]
    pub generalized_cost_limit: Option<CostLinearFunction>,
}

pub const DEFAULT_MAX_SEARCH_WINDOW: &str = "24:00:00";
pub const DEFAULT_ITERATION_STEP: &str = "00:01:00";
pub const DEFAULT_MAX_NB_OF_LEGS: &str = "10";
pub const DEFAULT_NB_OF_ADDITIONAL_LEGS: &str = "5";
pub const DEFAULT_BOARD_PENALTY: &str = "00:01:00";
pub const DEFAULT_TRANSFER_PENALTY: &str = "00:02:00";
pub const DEFAULT_WAIT_RELUCTANCE: &str = "0.8";
pub const DEFAULT_WALK_RELUCTANCE: &str = "2.0";

pub fn default_max_search_window() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_MAX_SEARCH_WINDOW).unwrap()
}

pub fn default_iteration_step() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_ITERATION_STEP).unwrap()
}

pub fn default_max_nb_of_legs() -> u8 {
    u8::from_str(DEFAULT_MAX_NB_OF_LEGS).unwrap()
}

pub fn default_nb_of_additional_legs() -> u8 {
    u8::from_str(DEFAULT_NB_OF_ADDITIONAL_LEGS).unwrap()
}

pub fn default_zero_duration() -> PositiveDuration {
    PositiveDuration::zero()
}

pub fn default_board_penalty() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_BOARD_PENALTY).unwrap()
}

pub fn default_transfer_penalty() -> PositiveDuration {
    PositiveDuration::from_str(DEFAULT_TRANSFER_PENALTY).unwrap()
}

pub fn default_wait_reluctance() -> Ratio {
    Ratio::from_str(DEFAULT_WAIT_RELUCTANCE).unwrap()
}

pub fn default_walk_reluctance() -> Ratio {
    Ratio::from_str(DEFAULT_WALK_RELUCTANCE).unwrap()
}

pub fn default_transit_reluctances() -> Vec<Ratio> {
    vec![Ratio::one()]
}

fn default_true() -> bool {
    true
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            direction: SearchDirection::default(),
            search_window: None,
            max_search_window: default_max_search_window(),
            iteration_step: default_iteration_step(),
            timetable_enabled: false,
            max_nb_of_legs: default_max_nb_of_legs(),
            nb_of_additional_legs: default_nb_of_additional_legs(),
            board_slack: default_zero_duration(),
            alight_slack: default_zero_duration(),
            transfer_slack: default_zero_duration(),
            board_penalty: default_board_penalty(),
            transfer_penalty: default_transfer_penalty(),
            wait_reluctance: default_wait_reluctance(),
            walk_reluctance: default_walk_reluctance(),
            transit_reluctances: default_transit_reluctances(),
            use_guaranteed_transfers: true,
            use_forbidden_transfers: true,
            wheelchair_accessible: false,
            relax_transit_group_priority: None,
            generalized_cost_limit: None,
        }
    }
}

impl SearchParams {
    pub fn transit_reluctance(&self, reluctance_index: usize) -> Ratio {
        self.transit_reluctances
            .get(reluctance_index)
            .copied()
            .unwrap_or_else(Ratio::one)
    }
}

/// The data of one request : time window anchors and fallback paths.
pub struct RequestInput {
    /// earliest allowed departure
    pub departure_datetime: NaiveDateTime,
    /// latest allowed arrival ; when `None`, departure + max_search_window
    pub arrival_datetime: Option<NaiveDateTime>,
    pub accesses: Vec<AccessPath>,
    pub egresses: Vec<EgressPath>,
    pub params: SearchParams,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BadRequest {
    DepartureDatetime,
    ArrivalDatetime,
    MissingArrivalDatetime,
    ArrivalBeforeDeparture,
    SearchWindowTooLarge,
    IterationStepIsZero,
    NoValidAccess,
    NoValidEgress,
    UnsupportedCombination(&'static str),
}

impl std::error::Error for BadRequest {}

impl fmt::Display for BadRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BadRequest::DepartureDatetime => write!(
                f,
                "The requested departure datetime is out of the validity period of the schedule."
            ),
            BadRequest::ArrivalDatetime => write!(
                f,
                "The requested arrival datetime is out of the validity period of the schedule."
            ),
            BadRequest::MissingArrivalDatetime => write!(
                f,
                "A reverse search requires an arrival datetime."
            ),
            BadRequest::ArrivalBeforeDeparture => write!(
                f,
                "The requested arrival datetime is before the departure datetime."
            ),
            BadRequest::SearchWindowTooLarge => {
                write!(f, "The requested search window exceeds the configured maximum.")
            }
            BadRequest::IterationStepIsZero => {
                write!(f, "The iteration step must not be zero.")
            }
            BadRequest::NoValidAccess => {
                write!(f, "No valid access path among the provided ones.")
            }
            BadRequest::NoValidEgress => {
                write!(f, "No valid egress path among the provided ones.")
            }
            BadRequest::UnsupportedCombination(text) => {
                write!(f, "Unsupported combination of parameters : {}.", text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_deserialize_with_defaults() {
        let params: SearchParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.profile, Profile::Standard);
        assert_eq!(params.max_search_window, PositiveDuration::from_hms(24, 0, 0));
        assert_eq!(params.wait_reluctance, Ratio::from_hundredths(80));
        assert!(params.use_guaranteed_transfers);
    }

    #[test]
    fn params_reject_unknown_fields() {
        let result: Result<SearchParams, _> = serde_json::from_str(r#"{"no_such_field": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn transit_reluctance_falls_back_to_one() {
        let params = SearchParams::default();
        assert_eq!(params.transit_reluctance(0), Ratio::one());
        assert_eq!(params.transit_reluctance(7), Ratio::one());
    }
}

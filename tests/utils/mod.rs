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
#![allow(dead_code)]

use anyhow::{anyhow, Error};
use sleipnir::fallback::{AccessPath, EgressPath, FallbackPath};
use sleipnir::request::{RequestInput, SearchParams};
use sleipnir::response::Response;
use sleipnir::schedule::Schedule;
use sleipnir::{NaiveDateTime, PositiveDuration};

/// The inputs of one test request : where, when, how.
pub struct Config {
    pub params: SearchParams,

    pub departure_datetime: NaiveDateTime,

    pub arrival_datetime: Option<NaiveDateTime>,

    /// name of the start stop
    pub start: String,

    /// name of the end stop
    pub end: String,

    pub access_duration: PositiveDuration,

    pub egress_duration: PositiveDuration,
}

impl Config {
    pub fn new(datetime: impl AsDateTime, start: &str, end: &str) -> Self {
        Config {
            params: default_params(),
            departure_datetime: datetime.as_datetime(),
            arrival_datetime: None,
            start: start.into(),
            end: end.into(),
            access_duration: PositiveDuration::zero(),
            egress_duration: PositiveDuration::zero(),
        }
    }
}

/// All parameters at their documented defaults.
pub fn default_params() -> SearchParams {
    // unwrap is safe because every field of SearchParams has a default
    serde_json::from_str("{}").unwrap()
}

pub fn solve_config(schedule: &Schedule, config: &Config) -> Result<Response, Error> {
    let start = schedule
        .stop_by_name(&config.start)
        .ok_or_else(|| anyhow!("unknown stop {}", config.start))?;
    let end = schedule
        .stop_by_name(&config.end)
        .ok_or_else(|| anyhow!("unknown stop {}", config.end))?;
    let request = RequestInput {
        departure_datetime: config.departure_datetime,
        arrival_datetime: config.arrival_datetime,
        accesses: vec![AccessPath::new(start, config.access_duration)],
        egresses: vec![EgressPath::new(end, config.egress_duration)],
        params: config.params.clone(),
    };
    solve_request(schedule, &request)
}

pub fn solve_request(schedule: &Schedule, request: &RequestInput) -> Result<Response, Error> {
    sleipnir::solve(schedule, request, None).map_err(Error::from)
}

/// Build a request with explicit fallback paths on both sides.
pub fn request_with_fallbacks(
    datetime: impl AsDateTime,
    accesses: Vec<FallbackPath>,
    egresses: Vec<FallbackPath>,
) -> RequestInput {
    RequestInput {
        departure_datetime: datetime.as_datetime(),
        arrival_datetime: None,
        accesses,
        egresses,
        params: default_params(),
    }
}

pub trait AsDateTime {
    fn as_datetime(&self) -> NaiveDateTime;
}

impl AsDateTime for &str {
    fn as_datetime(&self) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(self, "%Y%m%dT%H%M%S")
            .unwrap_or_else(|err| panic!("invalid datetime {} : {}", self, err))
    }
}

impl AsDateTime for NaiveDateTime {
    fn as_datetime(&self) -> NaiveDateTime {
        *self
    }
}

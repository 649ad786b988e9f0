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

mod utils;

use anyhow::Error;
use sleipnir::modelbuilder::ModelBuilder;
use sleipnir::response::Connection;
use sleipnir::schedule::FlowDirection;
use sleipnir::PositiveDuration;
use utils::{solve_config, AsDateTime, Config};

/// Two vehicles connecting at B with zero available time once the board
/// slack is accounted for.
fn tight_connection_builder() -> ModelBuilder {
    ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("B", "10:30:00").st("C", "11:00:00")
        })
}

fn tight_connection_config() -> Config {
    let mut config = Config::new("20200101T095900", "A", "C");
    config.params.board_slack = PositiveDuration::from_seconds(60);
    config
}

#[test]
fn zero_time_connection_fails_without_guarantee() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = tight_connection_builder().build();
    let response = solve_config(&schedule, &tight_connection_config())?;
    assert!(response.journeys.is_empty());
    Ok(())
}

#[test]
fn guaranteed_connection_overrides_slack() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = tight_connection_builder()
        .guaranteed_transfer("first", "B", "second", "B")
        .build();
    let response = solve_config(&schedule, &tight_connection_config())?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(journey.nb_of_vehicle_legs(), 2);
    assert!(matches!(journey.connections[0].0, Connection::Guaranteed));
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T110000".as_datetime()
    );
    Ok(())
}

#[test]
fn guaranteed_connections_can_be_disabled() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = tight_connection_builder()
        .guaranteed_transfer("first", "B", "second", "B")
        .build();
    let mut config = tight_connection_config();
    config.params.use_guaranteed_transfers = false;
    let response = solve_config(&schedule, &config)?;
    assert!(response.journeys.is_empty());
    Ok(())
}

#[test]
fn guaranteed_connection_respects_flows_on_alight() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    // the connection is held at B, but C stays board-only : the journey
    // cannot end there, only one stop further
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2")
                .st("B", "10:30:00")
                .st_mut("C", "11:00:00", "11:00:00", |st| {
                    st.flow = FlowDirection::BoardOnly
                })
                .st("D", "11:30:00")
        })
        .guaranteed_transfer("first", "B", "second", "B")
        .build();
    let mut config = Config::new("20200101T095900", "A", "C");
    config.params.board_slack = PositiveDuration::from_seconds(60);
    let response = solve_config(&schedule, &config)?;
    assert!(response.journeys.is_empty());

    let mut config = Config::new("20200101T095900", "A", "D");
    config.params.board_slack = PositiveDuration::from_seconds(60);
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert!(matches!(journey.connections[0].0, Connection::Guaranteed));
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T113000".as_datetime()
    );
    Ok(())
}

#[test]
fn forbidden_transfer_blocks_the_only_connection() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("C", "10:40:00").st("D", "11:00:00")
        })
        .transfer("B", "C", "00:05:00")
        .forbidden_transfer("B", "C")
        .build();

    let config = Config::new("20200101T100000", "A", "D");
    // zero journeys is a valid result, not an error
    let response = solve_config(&schedule, &config)?;
    assert!(response.journeys.is_empty());
    Ok(())
}

#[test]
fn forbidden_transfer_leaves_other_connections_usable() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    // two ways to reach the second vehicle, only one of them forbidden
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1")
                .st("A", "10:00:00")
                .st("B", "10:20:00")
                .st("E", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("C", "10:45:00").st("D", "11:00:00")
        })
        .transfer("B", "C", "00:05:00")
        .transfer("E", "C", "00:05:00")
        .forbidden_transfer("B", "C")
        .build();

    let config = Config::new("20200101T100000", "A", "D");
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    match &journey.connections[0].0 {
        Connection::Footpath(transfer) => {
            let from = schedule.transfer_from_stop(transfer);
            assert_eq!(schedule.stop_name(&from), "E");
        }
        other => panic!("expected a footpath connection, got {:?}", other),
    }
    Ok(())
}

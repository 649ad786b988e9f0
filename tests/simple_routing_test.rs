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
use sleipnir::PositiveDuration;
use utils::{solve_config, AsDateTime, Config};

#[test]
fn simple_routing() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("R1", |vj| {
            vj.st("B", "00:01:00")
                .st("C", "00:03:00")
                .st("D", "00:05:00")
        })
        .build();

    let mut config = Config::new("20200101T000000", "B", "D");
    config.access_duration = PositiveDuration::from_seconds(30);
    config.egress_duration = PositiveDuration::from_seconds(20);

    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    // the access is started as late as the 00:01:00 boarding allows
    assert_eq!(
        journey.departure_datetime(&schedule),
        "20200101T000030".as_datetime()
    );
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T000520".as_datetime()
    );
    assert_eq!(journey.total_duration(), PositiveDuration::from_hms(0, 4, 50));
    assert_eq!(journey.nb_of_transfers(), 0);
    assert_eq!(journey.nb_of_vehicle_legs(), 1);
    Ok(())
}

#[test]
fn takes_the_vehicle_with_the_best_arrival() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    // the vehicle departing later arrives earlier
    let schedule = ModelBuilder::default()
        .vj("slow", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "11:00:00")
        })
        .vj("fast", |vj| {
            vj.route("2").st("A", "10:05:00").st("B", "10:30:00")
        })
        .build();

    let config = Config::new("20200101T095900", "A", "B");
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(
        journey.departure_datetime(&schedule),
        "20200101T100500".as_datetime()
    );
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T103000".as_datetime()
    );
    Ok(())
}

#[test]
fn routing_with_a_footpath_transfer() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("C", "10:40:00").st("D", "11:00:00")
        })
        .transfer("B", "C", "00:05:00")
        .build();

    let config = Config::new("20200101T100000", "A", "D");
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(journey.nb_of_transfers(), 1);
    assert!(matches!(
        journey.connections[0].0,
        Connection::Footpath(_)
    ));
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T110000".as_datetime()
    );
    Ok(())
}

#[test]
fn transfer_slack_makes_the_connection_miss() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "10:30:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("C", "10:40:00").st("D", "11:00:00")
        })
        .transfer("B", "C", "00:05:00")
        .build();

    let mut config = Config::new("20200101T100000", "A", "D");
    // 10:30 + 10 minutes of slack + 5 minutes of walk > 10:40
    config.params.transfer_slack = PositiveDuration::from_hms(0, 10, 0);
    let response = solve_config(&schedule, &config)?;
    assert!(response.journeys.is_empty());
    Ok(())
}

#[test]
fn window_extending_past_the_last_departure() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    // the iterations anchored after 10:00 have nothing to board and must
    // come back empty-handed
    let schedule = ModelBuilder::default()
        .vj("lone", |vj| vj.st("A", "10:00:00").st("B", "12:00:00"))
        .build();

    let mut config = Config::new("20200101T090000", "A", "B");
    config.params.search_window = Some(PositiveDuration::from_hms(4, 0, 0));
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(
        journey.departure_datetime(&schedule),
        "20200101T100000".as_datetime()
    );
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T120000".as_datetime()
    );
    Ok(())
}

#[test]
fn no_journey_between_unconnected_stops() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("first", |vj| {
            vj.route("1").st("A", "10:00:00").st("B", "11:00:00")
        })
        .vj("second", |vj| {
            vj.route("2").st("C", "10:00:00").st("D", "11:00:00")
        })
        .build();

    let config = Config::new("20200101T090000", "A", "D");
    let response = solve_config(&schedule, &config)?;
    assert!(response.journeys.is_empty());
    Ok(())
}

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
use rstest::rstest;
use sleipnir::modelbuilder::ModelBuilder;
use sleipnir::request::BadRequest;
use sleipnir::schedule::FlowDirection;
use sleipnir::PositiveDuration;
use utils::{request_with_fallbacks, solve_config, solve_request, AsDateTime, Config};

/// One vehicle A -> B -> C where B only allows the given flow.
fn schedule_with_flow_at_b(flow: FlowDirection) -> sleipnir::schedule::Schedule {
    ModelBuilder::default()
        .vj("toto", |vj| {
            vj.st("A", "10:00:00")
                .st_mut("B", "10:30:00", "10:30:00", |st| st.flow = flow)
                .st("C", "11:00:00")
        })
        .build()
}

#[rstest]
#[case("B", "C", FlowDirection::DebarkOnly, 0)] // cannot board at B
#[case("A", "B", FlowDirection::BoardOnly, 0)] // cannot debark at B
#[case("A", "B", FlowDirection::DebarkOnly, 1)]
#[case("B", "C", FlowDirection::BoardOnly, 1)]
fn flow_restrictions_are_honored(
    #[case] start: &str,
    #[case] end: &str,
    #[case] flow: FlowDirection,
    #[case] expected_journeys: usize,
) -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = schedule_with_flow_at_b(flow);
    let config = Config::new("20200101T095000", start, end);
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), expected_journeys);
    Ok(())
}

#[test]
fn banned_stop_can_be_ridden_through() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("toto", |vj| {
            vj.st("A", "10:00:00")
                .st("X", "10:15:00")
                .st("B", "10:30:00")
        })
        .ban_stop("X")
        .build();

    let config = Config::new("20200101T095000", "A", "B");
    let response = solve_config(&schedule, &config)?;
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(
        response.journeys[0].arrival_datetime(&schedule),
        "20200101T103000".as_datetime()
    );
    Ok(())
}

#[test]
fn banned_stop_rejects_all_fallbacks() {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("toto", |vj| {
            vj.st("A", "10:00:00")
                .st("X", "10:15:00")
                .st("B", "10:30:00")
        })
        .ban_stop("X")
        .build();

    let config = Config::new("20200101T095000", "A", "X");
    let result = solve_config(&schedule, &config);
    let error = result.unwrap_err();
    assert_eq!(
        error.downcast_ref::<BadRequest>(),
        Some(&BadRequest::NoValidEgress)
    );
}

#[test]
fn boards_the_same_vehicle_at_a_later_stop() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    // the access to the banned stop is skipped, the one to B is used
    let schedule = ModelBuilder::default()
        .vj("toto", |vj| {
            vj.st("X", "10:00:00")
                .st("B", "10:30:00")
                .st("C", "11:00:00")
        })
        .ban_stop("X")
        .build();

    let x = schedule.stop_by_name("X").unwrap();
    let b = schedule.stop_by_name("B").unwrap();
    let c = schedule.stop_by_name("C").unwrap();
    let request = request_with_fallbacks(
        "20200101T095000",
        vec![
            sleipnir::fallback::FallbackPath::new(x, PositiveDuration::zero()),
            sleipnir::fallback::FallbackPath::new(b, PositiveDuration::zero()),
        ],
        vec![sleipnir::fallback::FallbackPath::new(
            c,
            PositiveDuration::zero(),
        )],
    );
    let response = solve_request(&schedule, &request)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    let mission = schedule.mission_of(&journey.first_vehicle.trip);
    let board_stop = schedule.stop_of(&journey.first_vehicle.board_position, &mission);
    assert_eq!(schedule.stop_name(&board_stop), "B");
    Ok(())
}

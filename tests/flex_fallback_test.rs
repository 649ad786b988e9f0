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
use sleipnir::fallback::{DailyWindow, FallbackPath};
use sleipnir::modelbuilder::ModelBuilder;
use sleipnir::time::SecondsSinceDayStart;
use sleipnir::PositiveDuration;
use utils::{request_with_fallbacks, solve_request, AsDateTime};

fn day_time(hours: u32, minutes: u32) -> SecondsSinceDayStart {
    SecondsSinceDayStart::from_seconds(hours * 3600 + minutes * 60).unwrap()
}

#[test]
fn flex_access_rides_count_as_transfers() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("toto", |vj| vj.st("A", "10:00:00").st("B", "10:30:00"))
        .build();

    let a = schedule.stop_by_name("A").unwrap();
    let b = schedule.stop_by_name("B").unwrap();
    // a demand-responsive feeder with two vehicle legs of its own
    let access = FallbackPath::new(a, PositiveDuration::from_hms(0, 10, 0)).with_rides(2);
    let egress = FallbackPath::new(b, PositiveDuration::zero());
    let request = request_with_fallbacks("20200101T090000", vec![access], vec![egress]);

    let response = solve_request(&schedule, &request)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(journey.nb_of_vehicle_legs(), 1);
    assert_eq!(journey.nb_of_legs(), 3);
    assert_eq!(journey.nb_of_transfers(), 2);
    Ok(())
}

#[test]
fn access_opening_hours_delay_the_departure() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("early", |vj| vj.st("A", "08:00:00").st("B", "08:30:00"))
        .vj("late", |vj| vj.st("A", "09:30:00").st("B", "10:00:00"))
        .build();

    let a = schedule.stop_by_name("A").unwrap();
    let b = schedule.stop_by_name("B").unwrap();
    // a rental scheme opening at 09:00 : the 08:00 vehicle is out of reach
    let access = FallbackPath::new(a, PositiveDuration::from_hms(0, 10, 0))
        .with_opening_hours(DailyWindow::new(day_time(9, 0), day_time(18, 0)));
    let egress = FallbackPath::new(b, PositiveDuration::zero());
    let request = request_with_fallbacks("20200101T080000", vec![access], vec![egress]);

    let response = solve_request(&schedule, &request)?;
    assert_eq!(response.journeys.len(), 1);
    let journey = &response.journeys[0];
    assert_eq!(
        journey.departure_datetime(&schedule),
        "20200101T092000".as_datetime()
    );
    assert_eq!(
        journey.arrival_datetime(&schedule),
        "20200101T100000".as_datetime()
    );
    Ok(())
}

#[test]
fn egress_opening_hours_delay_the_arrival() -> Result<(), Error> {
    let _guard = sleipnir::logger::init_test_logger();
    let schedule = ModelBuilder::default()
        .vj("toto", |vj| vj.st("A", "09:30:00").st("B", "10:00:00"))
        .build();

    let a = schedule.stop_by_name("A").unwrap();
    let b = schedule.stop_by_name("B").unwrap();
    let access = FallbackPath::new(a, PositiveDuration::zero());
    let egress = FallbackPath::new(b, PositiveDuration::from_hms(0, 10, 0))
        .with_opening_hours(DailyWindow::new(day_time(10, 30), day_time(18, 0)));
    let request = request_with_fallbacks("20200101T090000", vec![access], vec![egress]);

    let response = solve_request(&schedule, &request)?;
    assert_eq!(response.journeys.len(), 1);
    // debark at 10:00, wait for the 10:30 opening, then 10 minutes of egress
    assert_eq!(
        response.journeys[0].arrival_datetime(&schedule),
        "20200101T104000".as_datetime()
    );
    Ok(())
}

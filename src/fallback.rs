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

use crate::cost::Cost;
use crate::schedule::Stop;
use crate::time::{PositiveDuration, SecondsSinceDayStart, SecondsSinceScheduleStart};
use std::fmt::Debug;
use std::sync::Arc;

const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Time-dependent availability of a fallback path.
///
/// The two functions must be pure and total. Returning `None` means the
/// path cannot be used at (or around) the requested time; the search then
/// skips the path instead of failing the whole request.
pub trait OpeningHours: Debug {
    /// The earliest time, no earlier than `requested`, at which the path
    /// can be started.
    fn earliest_departure_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart>;

    /// The latest time, no later than `requested`, at which the path
    /// can be completed.
    fn latest_arrival_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart>;
}

/// The default availability : the path can always be used as requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOpen;

impl OpeningHours for AlwaysOpen {
    fn earliest_departure_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart> {
        Some(requested)
    }

    fn latest_arrival_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart> {
        Some(requested)
    }
}

/// Available every day between `open` and `close`, e.g. the service hours
/// of a vehicle rental scheme.
#[derive(Debug, Clone, Copy)]
pub struct DailyWindow {
    pub open: SecondsSinceDayStart,
    pub close: SecondsSinceDayStart,
}

impl DailyWindow {
    pub fn new(open: SecondsSinceDayStart, close: SecondsSinceDayStart) -> Self {
        assert!(open <= close);
        Self { open, close }
    }
}

impl OpeningHours for DailyWindow {
    fn earliest_departure_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart> {
        let day = requested.total_seconds() / SECONDS_PER_DAY;
        let in_day = requested.total_seconds() % SECONDS_PER_DAY;
        if in_day < self.open.total_seconds() {
            Some(SecondsSinceScheduleStart::from_seconds(
                day * SECONDS_PER_DAY + self.open.total_seconds(),
            ))
        } else if in_day <= self.close.total_seconds() {
            Some(requested)
        } else {
            // wait for the next day opening
            Some(SecondsSinceScheduleStart::from_seconds(
                (day + 1) * SECONDS_PER_DAY + self.open.total_seconds(),
            ))
        }
    }

    fn latest_arrival_time(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<SecondsSinceScheduleStart> {
        let day = requested.total_seconds() / SECONDS_PER_DAY;
        let in_day = requested.total_seconds() % SECONDS_PER_DAY;
        if in_day > self.close.total_seconds() {
            Some(SecondsSinceScheduleStart::from_seconds(
                day * SECONDS_PER_DAY + self.close.total_seconds(),
            ))
        } else if in_day >= self.open.total_seconds() {
            Some(requested)
        } else if day > 0 {
            Some(SecondsSinceScheduleStart::from_seconds(
                (day - 1) * SECONDS_PER_DAY + self.close.total_seconds(),
            ))
        } else {
            None
        }
    }
}

/// A path between the requested place and a stop of the transit network,
/// used as access (before the first vehicle) or egress (after the last one).
///
/// A path with `nb_of_rides > 0` is a "flex" path : it contains that many
/// vehicle legs of its own (e.g. demand-responsive transport) and consumes
/// the same amount of transfer budget as that many boardings.
#[derive(Debug, Clone)]
pub struct FallbackPath {
    pub stop: Stop,
    pub duration: PositiveDuration,
    pub nb_of_rides: u8,
    pub cost: Cost,
    opening_hours: Arc<dyn OpeningHours>,
}

pub type AccessPath = FallbackPath;
pub type EgressPath = FallbackPath;

impl FallbackPath {
    pub fn new(stop: Stop, duration: PositiveDuration) -> Self {
        Self {
            stop,
            duration,
            nb_of_rides: 0,
            cost: Cost::zero(),
            opening_hours: Arc::new(AlwaysOpen),
        }
    }

    pub fn with_rides(mut self, nb_of_rides: u8) -> Self {
        self.nb_of_rides = nb_of_rides;
        self
    }

    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_opening_hours(mut self, opening_hours: impl OpeningHours + 'static) -> Self {
        self.opening_hours = Arc::new(opening_hours);
        self
    }

    pub fn is_flex(&self) -> bool {
        self.nb_of_rides > 0
    }

    pub fn is_time_dependent(&self) -> bool {
        self.opening_hours
            .earliest_departure_time(SecondsSinceScheduleStart::zero())
            != Some(SecondsSinceScheduleStart::zero())
            || self
                .opening_hours
                .latest_arrival_time(SecondsSinceScheduleStart::zero())
                != Some(SecondsSinceScheduleStart::zero())
    }

    /// When starting the path at `requested` (or later if the path is not
    /// open yet), returns `(actual_departure, arrival_at_other_end)`.
    ///
    /// Returns `None` when the path cannot be used around `requested`.
    pub fn forward_times(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<(SecondsSinceScheduleStart, SecondsSinceScheduleStart)> {
        let departure = self.opening_hours.earliest_departure_time(requested)?;
        debug_assert!(requested <= departure);
        Some((departure, departure + self.duration))
    }

    /// Mirror of [`Self::forward_times`] : when the path must be completed
    /// no later than `requested`, returns `(departure_from_other_end, actual_arrival)`.
    pub fn backward_times(
        &self,
        requested: SecondsSinceScheduleStart,
    ) -> Option<(SecondsSinceScheduleStart, SecondsSinceScheduleStart)> {
        let arrival = self.opening_hours.latest_arrival_time(requested)?;
        debug_assert!(arrival <= requested);
        let departure = arrival.checked_sub(self.duration)?;
        Some((departure, arrival))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_seconds(hours: u32, minutes: u32) -> SecondsSinceDayStart {
        SecondsSinceDayStart::from_seconds(hours * 3600 + minutes * 60).unwrap()
    }

    #[test]
    fn always_open_is_identity() {
        let requested = SecondsSinceScheduleStart::from_seconds(1234);
        assert_eq!(AlwaysOpen.earliest_departure_time(requested), Some(requested));
        assert_eq!(AlwaysOpen.latest_arrival_time(requested), Some(requested));
    }

    #[test]
    fn daily_window_delays_departure_to_opening() {
        let window = DailyWindow::new(day_seconds(9, 0), day_seconds(18, 0));

        let before_opening = SecondsSinceScheduleStart::from_seconds(8 * 3600);
        assert_eq!(
            window.earliest_departure_time(before_opening),
            Some(SecondsSinceScheduleStart::from_seconds(9 * 3600))
        );

        let within = SecondsSinceScheduleStart::from_seconds(10 * 3600);
        assert_eq!(window.earliest_departure_time(within), Some(within));

        let after_closing = SecondsSinceScheduleStart::from_seconds(19 * 3600);
        assert_eq!(
            window.earliest_departure_time(after_closing),
            Some(SecondsSinceScheduleStart::from_seconds((24 + 9) * 3600))
        );
    }

    #[test]
    fn daily_window_advances_arrival_to_closing() {
        let window = DailyWindow::new(day_seconds(9, 0), day_seconds(18, 0));

        let after_closing = SecondsSinceScheduleStart::from_seconds(19 * 3600);
        assert_eq!(
            window.latest_arrival_time(after_closing),
            Some(SecondsSinceScheduleStart::from_seconds(18 * 3600))
        );

        // before the first opening of the schedule, the path is unusable
        let before_first_opening = SecondsSinceScheduleStart::from_seconds(8 * 3600);
        assert_eq!(window.latest_arrival_time(before_first_opening), None);
    }

    #[test]
    fn flex_path_keeps_its_ride_count() {
        let path = FallbackPath::new(Stop { idx: 0 }, PositiveDuration::from_seconds(600))
            .with_rides(2)
            .with_cost(Cost::from_seconds(1200));
        assert!(path.is_flex());
        assert_eq!(path.nb_of_rides, 2);
    }
}

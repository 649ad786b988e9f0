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

use std::cmp::Ordering;

use crate::schedule::Stop;
use crate::time::SecondsSinceScheduleStart;

use FlowDirection::{BoardAndDebark, BoardOnly, DebarkOnly, NoBoardDebark};

/// What a traveler may do at a position of a mission.
///
/// `NoBoardDebark` positions are ridden through without stopping the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowDirection {
    BoardOnly,
    DebarkOnly,
    BoardAndDebark,
    NoBoardDebark,
}

#[derive(Debug, Clone)]
pub struct VehicleData {
    pub is_realtime: bool,
}

/// The timetable of all trips of one mission.
#[derive(Debug)]
pub struct Timetable {
    stop_flows: Vec<(Stop, FlowDirection)>,
    wheelchair_by_position: Vec<bool>,

    /// vehicle data, ordered by increasing times
    /// meaning that if vehicle_1 is before vehicle_2 in this vector,
    /// then for all `position` we have
    ///    debark_times_by_position[position][vehicle_1] <= debark_times_by_position[position][vehicle_2]
    vehicle_datas: Vec<VehicleData>,

    /// `board_times_by_position[position][vehicle]`
    ///   is the time at which a traveler waiting
    ///   at `position` can board `vehicle`
    /// Vehicles are ordered by increasing time
    ///  so for each `position` the vector
    ///  board_times_by_position[position] is sorted by increasing times
    board_times_by_position: Vec<Vec<SecondsSinceScheduleStart>>,

    /// `debark_times_by_position[position][vehicle]`
    ///   is the time at which a traveler being inside `vehicle`
    ///   will debark at `position`
    /// Vehicles are ordered by increasing time
    ///  so for each `position` the vector
    ///  debark_times_by_position[position] is sorted by increasing times
    debark_times_by_position: Vec<Vec<SecondsSinceScheduleStart>>,
}

impl Timetable {
    pub(crate) fn new(
        stops: Vec<Stop>,
        flows: Vec<FlowDirection>,
        wheelchair_usable: Vec<bool>,
    ) -> Self {
        let nb_of_positions = stops.len();
        assert!(nb_of_positions >= 2);
        assert!(nb_of_positions == flows.len());
        assert!(nb_of_positions == wheelchair_usable.len());

        // a traveler cannot debark at the first position, nor board at the last
        let corrected_flows = flows.iter().enumerate().map(|(position_idx, flow)| {
            if position_idx == 0 {
                match flow {
                    BoardAndDebark => BoardOnly,
                    DebarkOnly => NoBoardDebark,
                    _ => *flow,
                }
            } else if position_idx == nb_of_positions - 1 {
                match flow {
                    BoardAndDebark => DebarkOnly,
                    BoardOnly => NoBoardDebark,
                    _ => *flow,
                }
            } else {
                *flow
            }
        });

        let stop_flows = stops.into_iter().zip(corrected_flows).collect();

        Self {
            stop_flows,
            wheelchair_by_position: wheelchair_usable,
            vehicle_datas: Vec::new(),
            board_times_by_position: vec![Vec::new(); nb_of_positions],
            debark_times_by_position: vec![Vec::new(); nb_of_positions],
        }
    }

    pub fn nb_of_positions(&self) -> usize {
        self.stop_flows.len()
    }

    pub fn nb_of_vehicles(&self) -> usize {
        self.vehicle_datas.len()
    }

    pub(crate) fn stop_at(&self, position_idx: usize) -> &Stop {
        &self.stop_flows[position_idx].0
    }

    pub(crate) fn can_board(&self, position_idx: usize) -> bool {
        match self.stop_flows[position_idx].1 {
            BoardAndDebark | BoardOnly => true,
            NoBoardDebark | DebarkOnly => false,
        }
    }

    pub(crate) fn can_debark(&self, position_idx: usize) -> bool {
        match self.stop_flows[position_idx].1 {
            BoardAndDebark | DebarkOnly => true,
            NoBoardDebark | BoardOnly => false,
        }
    }

    pub(crate) fn is_wheelchair_usable(&self, position_idx: usize) -> bool {
        self.wheelchair_by_position[position_idx]
    }

    pub(crate) fn vehicle_data(&self, vehicle_idx: usize) -> &VehicleData {
        &self.vehicle_datas[vehicle_idx]
    }

    pub(crate) fn arrival_time(
        &self,
        vehicle_idx: usize,
        position_idx: usize,
    ) -> SecondsSinceScheduleStart {
        self.debark_times_by_position[position_idx][vehicle_idx]
    }

    pub(crate) fn departure_time(
        &self,
        vehicle_idx: usize,
        position_idx: usize,
    ) -> SecondsSinceScheduleStart {
        self.board_times_by_position[position_idx][vehicle_idx]
    }

    // If we are waiting to board at `position_idx` at time `waiting_time`,
    // return `Some((vehicle_idx, board_time))` for the first vehicle that can
    // be boarded. Since vehicles of a timetable never overtake each other,
    // this vehicle also debarks first at every subsequent position.
    pub(crate) fn earliest_vehicle_to_board(
        &self,
        waiting_time: &SecondsSinceScheduleStart,
        position_idx: usize,
    ) -> Option<(usize, SecondsSinceScheduleStart)> {
        if !self.can_board(position_idx) {
            return None;
        }
        // we should not be able to board at the last position
        debug_assert!(position_idx + 1 < self.nb_of_positions());

        let board_times = &self.board_times_by_position[position_idx];
        let search_result = board_times.binary_search(waiting_time);
        let first_boardable_vehicle = match search_result {
            // here it means that
            //    waiting_time < board_time(idx)    if idx < len
            //    waiting_time > board_time(idx -1) if idx > 0
            // so idx is indeed the first vehicle that can be boarded
            Err(idx) => idx,
            // here it means that
            //    waiting_time == board_time(idx)
            // but maybe idx is not the smallest idx such that waiting_time == board_time(idx)
            Ok(idx) => {
                let mut first_idx = idx;
                while first_idx > 0 && board_times[first_idx - 1] == *waiting_time {
                    first_idx -= 1;
                }
                first_idx
            }
        };

        if first_boardable_vehicle < self.nb_of_vehicles() {
            let board_time = board_times[first_boardable_vehicle];
            debug_assert!(*waiting_time <= board_time);
            Some((first_boardable_vehicle, board_time))
        } else {
            None
        }
    }

    // Mirror of `earliest_vehicle_to_board` : the last vehicle whose debark
    // time at `position_idx` is not later than `time`.
    pub(crate) fn latest_vehicle_to_debark(
        &self,
        time: &SecondsSinceScheduleStart,
        position_idx: usize,
    ) -> Option<(usize, SecondsSinceScheduleStart)> {
        if !self.can_debark(position_idx) {
            return None;
        }
        // we should not be able to debark at the first position
        debug_assert!(position_idx > 0);

        let debark_times = &self.debark_times_by_position[position_idx];
        let search_result = debark_times.binary_search(time);
        let last_debarkable_vehicle = match search_result {
            Err(0) => return None,
            // here it means that
            //    time < debark_time(idx)    if idx < len
            //    time > debark_time(idx -1) if idx > 0
            // so idx - 1 is indeed the last vehicle that debarks before `time`
            Err(idx) => idx - 1,
            // here it means that
            //    time == debark_time(idx)
            // but maybe idx is not the greatest idx such that time == debark_time(idx)
            Ok(idx) => {
                let mut last_idx = idx;
                while last_idx + 1 < debark_times.len() && debark_times[last_idx + 1] == *time {
                    last_idx += 1;
                }
                last_idx
            }
        };

        let debark_time = debark_times[last_debarkable_vehicle];
        debug_assert!(debark_time <= *time);
        Some((last_debarkable_vehicle, debark_time))
    }

    // Insert the vehicle in this timetable if
    // the given board_times and debark_times are coherent.
    // Returns a VehicleTimesError otherwise.
    pub(crate) fn insert(
        &mut self,
        board_times: Vec<SecondsSinceScheduleStart>,
        debark_times: Vec<SecondsSinceScheduleStart>,
        vehicle_data: VehicleData,
    ) -> Result<usize, VehicleTimesError> {
        assert!(board_times.len() == self.nb_of_positions());
        assert!(debark_times.len() == self.nb_of_positions());

        inspect(
            self.stop_flows.iter().map(|(_, flow)| *flow),
            board_times.iter().copied(),
            debark_times.iter().copied(),
        )?;

        let insert_idx = self
            .find_insert_idx(&board_times, &debark_times)
            .ok_or(VehicleTimesError::VehicleOvertake)?;

        for position_idx in 0..self.nb_of_positions() {
            self.board_times_by_position[position_idx]
                .insert(insert_idx, board_times[position_idx]);
            self.debark_times_by_position[position_idx]
                .insert(insert_idx, debark_times[position_idx]);
        }
        self.vehicle_datas.insert(insert_idx, vehicle_data);
        Ok(insert_idx)
    }

    // Find the rank at which the candidate vehicle can be inserted while
    // keeping every per-position time vector sorted. Returns None when the
    // candidate would overtake (or be overtaken by) an existing vehicle at
    // some position but not at all of them.
    fn find_insert_idx(
        &self,
        board_times: &[SecondsSinceScheduleStart],
        debark_times: &[SecondsSinceScheduleStart],
    ) -> Option<usize> {
        let nb_of_vehicles = self.nb_of_vehicles();
        if nb_of_vehicles == 0 {
            return Some(0);
        }

        for candidate_idx in 0..=nb_of_vehicles {
            let ok_before = candidate_idx == 0
                || self
                    .compare_with_vehicle(board_times, debark_times, candidate_idx - 1)
                    .map_or(false, |ord| ord != Ordering::Less);
            let ok_after = candidate_idx == nb_of_vehicles
                || self
                    .compare_with_vehicle(board_times, debark_times, candidate_idx)
                    .map_or(false, |ord| ord != Ordering::Greater);
            if ok_before && ok_after {
                return Some(candidate_idx);
            }
        }
        None
    }

    // Returns
    //    - Some(Equal)   if candidate[pos] == vehicle[pos] for all positions
    //    - Some(Less)    if candidate[pos] <= vehicle[pos] for all positions
    //    - Some(Greater) if candidate[pos] >= vehicle[pos] for all positions
    //    - None otherwise (the two vehicles cross each other)
    fn compare_with_vehicle(
        &self,
        board_times: &[SecondsSinceScheduleStart],
        debark_times: &[SecondsSinceScheduleStart],
        vehicle_idx: usize,
    ) -> Option<Ordering> {
        let mut result = Ordering::Equal;
        for position_idx in 0..self.nb_of_positions() {
            let board_cmp =
                board_times[position_idx].cmp(&self.board_times_by_position[position_idx][vehicle_idx]);
            let debark_cmp = debark_times[position_idx]
                .cmp(&self.debark_times_by_position[position_idx][vehicle_idx]);
            for cmp in [board_cmp, debark_cmp] {
                if cmp == Ordering::Equal {
                    continue;
                }
                if result == Ordering::Equal {
                    result = cmp;
                } else if result != cmp {
                    return None;
                }
            }
        }
        Some(result)
    }
}

fn is_increasing<EnumeratedValues>(
    mut enumerated_values: EnumeratedValues,
) -> Result<(), (usize, usize)>
where
    EnumeratedValues: Iterator<Item = (usize, SecondsSinceScheduleStart)>,
{
    let (mut prev_position, mut prev_value) = match enumerated_values.next() {
        Some(first) => first,
        None => return Ok(()),
    };
    for (position, value) in enumerated_values {
        if value < prev_value {
            return Err((prev_position, position));
        }
        prev_position = position;
        prev_value = value;
    }
    Ok(())
}

fn inspect<BoardTimes, DebarkTimes, Flows>(
    flows: Flows,
    board_times: BoardTimes,
    debark_times: DebarkTimes,
) -> Result<(), VehicleTimesError>
where
    BoardTimes: Iterator<Item = SecondsSinceScheduleStart> + Clone,
    DebarkTimes: Iterator<Item = SecondsSinceScheduleStart> + Clone,
    Flows: Iterator<Item = FlowDirection> + Clone,
{
    let valid_enumerated_board_times = board_times
        .clone()
        .zip(flows.clone())
        .enumerate()
        .filter_map(|(position, (board_time, flow))| match flow {
            BoardOnly | BoardAndDebark => Some((position, board_time)),
            NoBoardDebark | DebarkOnly => None,
        });

    if let Err((upstream, downstream)) = is_increasing(valid_enumerated_board_times) {
        return Err(VehicleTimesError::DecreasingBoardTime(PositionPair {
            upstream,
            downstream,
        }));
    }

    let valid_enumerated_debark_times = debark_times
        .clone()
        .zip(flows.clone())
        .enumerate()
        .filter_map(|(position, (debark_time, flow))| match flow {
            DebarkOnly | BoardAndDebark => Some((position, debark_time)),
            NoBoardDebark | BoardOnly => None,
        });

    if let Err((upstream, downstream)) = is_increasing(valid_enumerated_debark_times) {
        return Err(VehicleTimesError::DecreasingDebarkTime(PositionPair {
            upstream,
            downstream,
        }));
    }

    let pair_iter = board_times
        .zip(flows.clone())
        .zip(debark_times.zip(flows).skip(1))
        .enumerate();
    for (board_idx, ((board_time, board_flow), (debark_time, debark_flow))) in pair_iter {
        let can_board = matches!(board_flow, BoardAndDebark | BoardOnly);
        let can_debark = matches!(debark_flow, BoardAndDebark | DebarkOnly);
        if can_board && can_debark && board_time > debark_time {
            return Err(VehicleTimesError::DebarkBeforeUpstreamBoard(PositionPair {
                upstream: board_idx,
                downstream: board_idx + 1,
            }));
        }
    }

    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub struct PositionPair {
    pub upstream: usize,
    pub downstream: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum VehicleTimesError {
    DebarkBeforeUpstreamBoard(PositionPair), // board_time[upstream] > debark_time[downstream]
    DecreasingBoardTime(PositionPair),       // board_time[upstream] > board_time[downstream]
    DecreasingDebarkTime(PositionPair),      // debark_time[upstream] > debark_time[downstream]
    VehicleOvertake, // the candidate crosses an already inserted vehicle
}

impl std::fmt::Display for VehicleTimesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VehicleTimesError::DebarkBeforeUpstreamBoard(pair) => write!(
                f,
                "board time at position {} is after debark time at position {}",
                pair.upstream, pair.downstream
            ),
            VehicleTimesError::DecreasingBoardTime(pair) => write!(
                f,
                "board time at position {} is after board time at position {}",
                pair.upstream, pair.downstream
            ),
            VehicleTimesError::DecreasingDebarkTime(pair) => write!(
                f,
                "debark time at position {} is after debark time at position {}",
                pair.upstream, pair.downstream
            ),
            VehicleTimesError::VehicleOvertake => {
                write!(f, "the vehicle overtakes another vehicle of its timetable")
            }
        }
    }
}

impl std::error::Error for VehicleTimesError {}

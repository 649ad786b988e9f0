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

use crate::schedule::{Stop, Trip};
use crate::time::PositiveDuration;
use std::collections::{HashMap, HashSet};

/// Identify a foot transfer between two `Stop`s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub(crate) idx: usize,
}

#[derive(Debug)]
struct TransferData {
    from_stop: Stop,
    to_stop: Stop,
    min_duration: PositiveDuration,
}

/// A transfer between two specific trips that is always permitted,
/// regardless of slack : stay-seated and interlined connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuaranteedTransfer {
    pub from_trip: Trip,
    pub from_stop: Stop,
    pub to_trip: Trip,
    pub to_stop: Stop,
}

#[derive(Debug)]
pub(crate) struct TransferTables {
    datas: Vec<TransferData>,
    // per stop, indices into `datas`
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,

    guaranteed_by_from: HashMap<(Trip, Stop), Vec<GuaranteedTransfer>>,
    guaranteed_by_to: HashMap<(Trip, Stop), Vec<GuaranteedTransfer>>,

    forbidden: HashSet<(usize, usize)>,
}

impl TransferTables {
    pub(crate) fn new() -> Self {
        Self {
            datas: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            guaranteed_by_from: HashMap::new(),
            guaranteed_by_to: HashMap::new(),
            forbidden: HashSet::new(),
        }
    }

    pub(crate) fn add_stop(&mut self) {
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
    }

    pub(crate) fn add(
        &mut self,
        from_stop: Stop,
        to_stop: Stop,
        min_duration: PositiveDuration,
    ) -> Transfer {
        let idx = self.datas.len();
        self.outgoing[from_stop.idx].push(idx);
        self.incoming[to_stop.idx].push(idx);
        self.datas.push(TransferData {
            from_stop,
            to_stop,
            min_duration,
        });
        Transfer { idx }
    }

    pub(crate) fn add_guaranteed(
        &mut self,
        from_trip: Trip,
        from_stop: Stop,
        to_trip: Trip,
        to_stop: Stop,
    ) {
        let guaranteed = GuaranteedTransfer {
            from_trip,
            from_stop,
            to_trip,
            to_stop,
        };
        self.guaranteed_by_from
            .entry((from_trip, from_stop))
            .or_default()
            .push(guaranteed);
        self.guaranteed_by_to
            .entry((to_trip, to_stop))
            .or_default()
            .push(guaranteed);
    }

    pub(crate) fn forbid(&mut self, from_stop: Stop, to_stop: Stop) {
        self.forbidden.insert((from_stop.idx, to_stop.idx));
    }

    pub(crate) fn outgoing(&self, from_stop: &Stop) -> impl Iterator<Item = Transfer> + '_ {
        self.outgoing[from_stop.idx]
            .iter()
            .map(|idx| Transfer { idx: *idx })
    }

    pub(crate) fn incoming(&self, to_stop: &Stop) -> impl Iterator<Item = Transfer> + '_ {
        self.incoming[to_stop.idx]
            .iter()
            .map(|idx| Transfer { idx: *idx })
    }

    pub(crate) fn from_stop(&self, transfer: &Transfer) -> Stop {
        self.datas[transfer.idx].from_stop
    }

    pub(crate) fn to_stop(&self, transfer: &Transfer) -> Stop {
        self.datas[transfer.idx].to_stop
    }

    pub(crate) fn duration(&self, transfer: &Transfer) -> PositiveDuration {
        self.datas[transfer.idx].min_duration
    }

    pub(crate) fn is_forbidden(&self, from_stop: &Stop, to_stop: &Stop) -> bool {
        self.forbidden.contains(&(from_stop.idx, to_stop.idx))
    }

    pub(crate) fn guaranteed_from(
        &self,
        from_trip: &Trip,
        from_stop: &Stop,
    ) -> &[GuaranteedTransfer] {
        self.guaranteed_by_from
            .get(&(*from_trip, *from_stop))
            .map_or(&[][..], |transfers| transfers.as_slice())
    }

    pub(crate) fn guaranteed_to(&self, to_trip: &Trip, to_stop: &Stop) -> &[GuaranteedTransfer] {
        self.guaranteed_by_to
            .get(&(*to_trip, *to_stop))
            .map_or(&[][..], |transfers| transfers.as_slice())
    }
}

/// Minimum buffer times around boarding, debarking and transfering,
/// per physical mode of the boarded mission.
pub trait SlackProvider {
    fn board_slack(&self, slack_index: usize) -> PositiveDuration;
    fn alight_slack(&self, slack_index: usize) -> PositiveDuration;
    fn transfer_slack(&self) -> PositiveDuration;
}

/// Uniform slacks, identical for every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardSlack {
    pub board: PositiveDuration,
    pub alight: PositiveDuration,
    pub transfer: PositiveDuration,
}

impl Default for StandardSlack {
    fn default() -> Self {
        Self {
            board: PositiveDuration::zero(),
            alight: PositiveDuration::zero(),
            transfer: PositiveDuration::zero(),
        }
    }
}

impl SlackProvider for StandardSlack {
    fn board_slack(&self, _slack_index: usize) -> PositiveDuration {
        self.board
    }

    fn alight_slack(&self, _slack_index: usize) -> PositiveDuration {
        self.alight
    }

    fn transfer_slack(&self) -> PositiveDuration {
        self.transfer
    }
}

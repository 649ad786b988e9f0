use crate::cost::Cost;
use crate::fallback::{AccessPath, EgressPath};
use crate::response::{Connection, Journey, VehicleLeg};
use crate::schedule::{Position, Transfer, Trip};
use crate::time::SecondsSinceScheduleStart;

type Id = usize;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Board {
    id: Id,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Debark {
    id: Id,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Wait {
    id: Id,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Arrive {
    id: Id,
}

/// A complete journey is a sequence of moments of the form
///  Wait, Board, Debark, (Wait, Board, Debark)*, Arrive
///
/// We associate the minimum amount of data to each moment so as to be
/// able to reconstruct the whole journey :
///  - Board  -> a Trip and the Position it is boarded at
///  - Debark -> the Position where we alight; the alighted Trip is given
///      by the Board that comes before this Debark
///  - Wait   -> how the wait began : the start of the journey (with the
///      index of the access path used), a foot transfer, a guaranteed
///      connection, or staying at the stop where the previous vehicle
///      was left
///  - Arrive -> the index of the egress path used
enum WaitData {
    Departure(usize),
    Transfer(Transfer, Debark),
    Guaranteed(Debark),
    SameStop(Debark),
}

/// Stores all the partial journeys explored by the multicriteria engine,
/// as a tree of moments : each moment points to the one it extends, and
/// pareto front elements only carry the (cheap to clone) id of their
/// last moment.
pub(crate) struct JourneysTree {
    boards: Vec<(Trip, Position, Wait)>,
    debarks: Vec<(Position, Board)>,
    waits: Vec<WaitData>,
    arrives: Vec<(usize, Debark)>,
}

impl JourneysTree {
    pub fn new() -> Self {
        Self {
            boards: Vec::new(),
            debarks: Vec::new(),
            waits: Vec::new(),
            arrives: Vec::new(),
        }
    }

    pub fn depart(&mut self, access_idx: usize) -> Wait {
        let id = self.waits.len();
        self.waits.push(WaitData::Departure(access_idx));
        Wait { id }
    }

    pub fn board(&mut self, wait: &Wait, trip: &Trip, position: &Position) -> Board {
        let id = self.boards.len();
        self.boards.push((*trip, *position, *wait));
        Board { id }
    }

    pub fn debark(&mut self, board: &Board, position: &Position) -> Debark {
        let id = self.debarks.len();
        self.debarks.push((*position, *board));
        Debark { id }
    }

    pub fn transfer(&mut self, debark: &Debark, transfer: &Transfer) -> Wait {
        let id = self.waits.len();
        self.waits.push(WaitData::Transfer(*transfer, *debark));
        Wait { id }
    }

    pub fn guaranteed(&mut self, debark: &Debark) -> Wait {
        let id = self.waits.len();
        self.waits.push(WaitData::Guaranteed(*debark));
        Wait { id }
    }

    pub fn stay(&mut self, debark: &Debark) -> Wait {
        let id = self.waits.len();
        self.waits.push(WaitData::SameStop(*debark));
        Wait { id }
    }

    pub fn arrive(&mut self, debark: &Debark, egress_idx: usize) -> Arrive {
        let id = self.arrives.len();
        self.arrives.push((egress_idx, *debark));
        Arrive { id }
    }

    /// The trip alighted at `debark`.
    pub fn debarked_trip(&self, debark: &Debark) -> Trip {
        let (_, board) = self.debarks[debark.id];
        self.boards[board.id].0
    }

    /// Reassemble the full journey ending at `arrive`.
    pub fn create_journey(
        &self,
        arrive: &Arrive,
        accesses: &[AccessPath],
        egresses: &[EgressPath],
        anchor: &SecondsSinceScheduleStart,
        arrival_time: SecondsSinceScheduleStart,
        cost: Cost,
    ) -> Option<Journey> {
        let (egress_idx, last_debark) = self.arrives[arrive.id];
        let mut connections_reversed: Vec<(Connection, VehicleLeg)> = Vec::new();
        let mut debark = last_debark;
        loop {
            let (debark_position, board) = self.debarks[debark.id];
            let (trip, board_position, wait) = self.boards[board.id];
            let leg = VehicleLeg {
                trip,
                board_position,
                debark_position,
            };
            let (connection, previous_debark) = match &self.waits[wait.id] {
                WaitData::Departure(access_idx) => {
                    let access = accesses.get(*access_idx)?.clone();
                    let egress = egresses.get(egress_idx)?.clone();
                    let (departure_time, _) = access.forward_times(*anchor)?;
                    connections_reversed.reverse();
                    return Some(Journey {
                        access,
                        departure_time,
                        first_vehicle: leg,
                        connections: connections_reversed,
                        egress,
                        arrival_time,
                        cost,
                    });
                }
                WaitData::Transfer(transfer, previous) => {
                    (Connection::Footpath(*transfer), previous)
                }
                WaitData::Guaranteed(previous) => (Connection::Guaranteed, previous),
                WaitData::SameStop(previous) => (Connection::SameStop, previous),
            };
            connections_reversed.push((connection, leg));
            debark = *previous_debark;
        }
    }

    pub fn clear(&mut self) {
        self.boards.clear();
        self.debarks.clear();
        self.waits.clear();
        self.arrives.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
            && self.debarks.is_empty()
            && self.waits.is_empty()
            && self.arrives.is_empty()
    }
}

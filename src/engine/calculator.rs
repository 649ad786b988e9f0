use crate::schedule::{GuaranteedTransfer, Mission, Position, Schedule, Stop, Transfer, Trip};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};

/// Abstracts the direction of the search.
///
/// The round-based engine is written once in "embark at a stop, ride a
/// vehicle carried downstream, disembark later on the mission" terms.
/// Searching forward (earliest arrival), embarking is boarding and time
/// flows as in the schedule. Searching backward (latest departure),
/// embarking is physically debarking, missions are scanned from their
/// last position to their first, and a "better" time is a later one.
pub(crate) trait TimeCalculator: Copy + Default + std::fmt::Debug {
    const IS_FORWARD: bool;

    /// `true` when `lhs` is strictly better than `rhs` :
    /// earlier forward, later backward.
    fn is_better(lhs: &SecondsSinceScheduleStart, rhs: &SecondsSinceScheduleStart) -> bool;

    fn is_better_or_equal(
        lhs: &SecondsSinceScheduleStart,
        rhs: &SecondsSinceScheduleStart,
    ) -> bool {
        !Self::is_better(rhs, lhs)
    }

    /// Move `time` away from the journey origin by `duration`.
    /// `None` when this would underflow the schedule start.
    fn shift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart>;

    /// Move `time` toward the journey origin by `duration` ; inverse of
    /// [`Self::shift`].
    fn unshift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart>;

    /// The duration elapsed between `from` (closer to the journey origin)
    /// and `to`. `None` when `to` is on the wrong side of `from`.
    fn elapsed(
        from: &SecondsSinceScheduleStart,
        to: &SecondsSinceScheduleStart,
    ) -> Option<PositiveDuration>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ForwardCalculator;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BackwardCalculator;

impl TimeCalculator for ForwardCalculator {
    const IS_FORWARD: bool = true;

    fn is_better(lhs: &SecondsSinceScheduleStart, rhs: &SecondsSinceScheduleStart) -> bool {
        lhs < rhs
    }

    fn shift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart> {
        Some(*time + *duration)
    }

    fn unshift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart> {
        time.checked_sub(*duration)
    }

    fn elapsed(
        from: &SecondsSinceScheduleStart,
        to: &SecondsSinceScheduleStart,
    ) -> Option<PositiveDuration> {
        to.duration_since(from)
    }
}

impl TimeCalculator for BackwardCalculator {
    const IS_FORWARD: bool = false;

    fn is_better(lhs: &SecondsSinceScheduleStart, rhs: &SecondsSinceScheduleStart) -> bool {
        lhs > rhs
    }

    fn shift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart> {
        time.checked_sub(*duration)
    }

    fn unshift(
        time: &SecondsSinceScheduleStart,
        duration: &PositiveDuration,
    ) -> Option<SecondsSinceScheduleStart> {
        Some(*time + *duration)
    }

    fn elapsed(
        from: &SecondsSinceScheduleStart,
        to: &SecondsSinceScheduleStart,
    ) -> Option<PositiveDuration> {
        from.duration_since(to)
    }
}

pub(crate) fn next_scan_position<C: TimeCalculator>(
    schedule: &Schedule,
    mission: &Mission,
    position: &Position,
) -> Option<Position> {
    if C::IS_FORWARD {
        schedule.next_on_mission(position, mission)
    } else {
        schedule.previous_on_mission(position, mission)
    }
}

/// `true` when the scan reaches `before` no later than `after`.
pub(crate) fn is_scanned_before<C: TimeCalculator>(
    schedule: &Schedule,
    before: &Position,
    after: &Position,
    mission: &Mission,
) -> bool {
    if before.idx == after.idx {
        return true;
    }
    if C::IS_FORWARD {
        schedule.is_upstream(before, after, mission)
    } else {
        schedule.is_upstream(after, before, mission)
    }
}

/// Can a journey get onto a vehicle at `position` ?
/// Boarding forward, debarking backward.
pub(crate) fn can_embark<C: TimeCalculator>(
    schedule: &Schedule,
    mission: &Mission,
    position: &Position,
) -> bool {
    if C::IS_FORWARD {
        schedule.can_board(position, mission)
    } else {
        schedule.can_debark(position, mission)
    }
}

pub(crate) fn can_disembark<C: TimeCalculator>(
    schedule: &Schedule,
    mission: &Mission,
    position: &Position,
) -> bool {
    if C::IS_FORWARD {
        schedule.can_debark(position, mission)
    } else {
        schedule.can_board(position, mission)
    }
}

/// The trip of `mission` to get onto when ready at `time` at `position`,
/// along with the time at which the vehicle serves `position`.
/// Slacks must already be applied to `time` by the caller.
pub(crate) fn embarkable_trip<C: TimeCalculator>(
    schedule: &Schedule,
    mission: &Mission,
    position: &Position,
    time: &SecondsSinceScheduleStart,
) -> Option<(Trip, SecondsSinceScheduleStart)> {
    if C::IS_FORWARD {
        schedule.earliest_trip_to_board(time, mission, position)
    } else {
        schedule.latest_trip_to_debark(time, mission, position)
    }
}

/// The time at which a traveler onboard `trip` passes `position` :
/// the arrival time forward, the departure time backward.
pub(crate) fn onboard_time<C: TimeCalculator>(
    schedule: &Schedule,
    trip: &Trip,
    position: &Position,
) -> SecondsSinceScheduleStart {
    if C::IS_FORWARD {
        schedule.arrival_time_of(trip, position)
    } else {
        schedule.departure_time_of(trip, position)
    }
}

/// The time at which a traveler can get off `trip` at `position`,
/// `None` when getting off is not allowed there.
pub(crate) fn disembark_time<C: TimeCalculator>(
    schedule: &Schedule,
    trip: &Trip,
    position: &Position,
) -> Option<SecondsSinceScheduleStart> {
    if C::IS_FORWARD {
        schedule.debark_time_of(trip, position)
    } else {
        schedule.board_time_of(trip, position)
    }
}

/// The foot transfers usable from `stop` in scan order :
/// outgoing forward, incoming backward.
pub(crate) fn transfers_departing<'a, C: TimeCalculator>(
    schedule: &'a Schedule,
    stop: &Stop,
) -> Box<dyn Iterator<Item = Transfer> + 'a> {
    if C::IS_FORWARD {
        Box::new(schedule.transfers_from(stop))
    } else {
        Box::new(schedule.transfers_to(stop))
    }
}

/// The stop reached by following `transfer` in scan order.
pub(crate) fn transfer_arrival_stop<C: TimeCalculator>(
    schedule: &Schedule,
    transfer: &Transfer,
) -> Stop {
    if C::IS_FORWARD {
        schedule.transfer_to_stop(transfer)
    } else {
        schedule.transfer_from_stop(transfer)
    }
}

pub(crate) fn transfer_departure_stop<C: TimeCalculator>(
    schedule: &Schedule,
    transfer: &Transfer,
) -> Stop {
    if C::IS_FORWARD {
        schedule.transfer_from_stop(transfer)
    } else {
        schedule.transfer_to_stop(transfer)
    }
}

/// Guaranteed connections usable after getting off `trip` at `stop`
/// in scan order.
pub(crate) fn guaranteed_connections<'a, C: TimeCalculator>(
    schedule: &'a Schedule,
    trip: &Trip,
    stop: &Stop,
) -> &'a [GuaranteedTransfer] {
    if C::IS_FORWARD {
        schedule.guaranteed_transfers_from(trip, stop)
    } else {
        schedule.guaranteed_transfers_to(trip, stop)
    }
}

/// The stop where a guaranteed connection continues, in scan order.
pub(crate) fn guaranteed_arrival_stop<C: TimeCalculator>(
    guaranteed: &GuaranteedTransfer,
) -> Stop {
    if C::IS_FORWARD {
        guaranteed.to_stop
    } else {
        guaranteed.from_stop
    }
}

/// The trip a guaranteed connection allows to get onto, in scan order.
pub(crate) fn guaranteed_arrival_trip<C: TimeCalculator>(
    guaranteed: &GuaranteedTransfer,
) -> Trip {
    if C::IS_FORWARD {
        guaranteed.to_trip
    } else {
        guaranteed.from_trip
    }
}

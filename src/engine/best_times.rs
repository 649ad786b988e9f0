use crate::engine::calculator::TimeCalculator;
use crate::schedule::{Position, Stop, Transfer, Trip};
use crate::time::{PositiveDuration, SecondsSinceScheduleStart};

/// Backpointer of a [`StopLabel`], used to reassemble the journey once
/// the propagation is over.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Link {
    /// The journey starts here, with the fallback path at this index.
    Fallback { idx: usize },
    /// Got off `trip`, embarked at `embark_position` from the state of
    /// round `embark_round`. When `via_guaranteed` is set, the embark was
    /// a guaranteed connection and the previous label is the transit label
    /// of round `embark_round` at that stop.
    Transit {
        trip: Trip,
        embark_position: Position,
        disembark_position: Position,
        embark_round: u8,
        via_guaranteed: Option<Stop>,
    },
    /// Walked `transfer`; the previous label is the transit label of the
    /// same round at the other end of the transfer.
    Footpath { transfer: Transfer },
}

/// The best way known to be at a stop.
///
/// `time` is the comparison time of the label. In the standard profile it
/// is the actual time at the stop; in the no-wait profile the waiting
/// accumulated along the journey is deducted from it and kept in
/// `wait_offset`, so that labels compare by traveling time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StopLabel {
    pub time: SecondsSinceScheduleStart,
    pub wait_offset: PositiveDuration,
    pub link: Link,
}

impl StopLabel {
    /// The actual (wall clock) time at the stop.
    pub fn actual_time<C: TimeCalculator>(&self) -> Option<SecondsSinceScheduleStart> {
        C::shift(&self.time, &self.wait_offset)
    }
}

/// A guaranteed connection reached during a round : `trip` may be
/// embarked at `stop` in the next round regardless of available slack.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GuaranteedBoarding {
    pub stop: Stop,
    pub trip: Trip,
    /// stop where the previous vehicle was left; the previous label is
    /// the transit label of the same round there
    pub source_stop: Stop,
    pub time: SecondsSinceScheduleStart,
    pub wait_offset: PositiveDuration,
}

/// Labels of one propagation round.
#[derive(Debug)]
pub(crate) struct RoundLabels {
    /// labels set by riding a vehicle during this round
    pub transit: Vec<Option<StopLabel>>,
    /// best of `transit`, footpath relaxation and fallback injection ;
    /// the next round embarks from these
    pub overall: Vec<Option<StopLabel>>,
    /// guaranteed connections reached during this round
    pub guaranteed: Vec<GuaranteedBoarding>,
    /// stops whose `overall` label was improved this round ;
    /// may contain duplicates
    pub marked: Vec<Stop>,
}

impl RoundLabels {
    fn new(nb_of_stops: usize) -> Self {
        Self {
            transit: vec![None; nb_of_stops],
            overall: vec![None; nb_of_stops],
            guaranteed: Vec::new(),
            marked: Vec::new(),
        }
    }
}

/// All labels of one range-raptor iteration, indexed by round then stop.
#[derive(Debug)]
pub(crate) struct RoundsState {
    rounds: Vec<RoundLabels>,
    nb_of_stops: usize,
}

impl RoundsState {
    pub fn new(nb_of_stops: usize) -> Self {
        Self {
            rounds: Vec::new(),
            nb_of_stops,
        }
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }

    pub fn nb_of_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn ensure_round(&mut self, round: u8) {
        while self.rounds.len() <= usize::from(round) {
            self.rounds.push(RoundLabels::new(self.nb_of_stops));
        }
    }

    /// Rounds are allocated lazily by the `improve_*` methods : a round
    /// in which nothing improved has no storage, and reads as unlabelled.
    pub fn transit_label(&self, round: u8, stop: &Stop) -> Option<&StopLabel> {
        self.rounds.get(usize::from(round))?.transit[stop.idx].as_ref()
    }

    pub fn overall_label(&self, round: u8, stop: &Stop) -> Option<&StopLabel> {
        self.rounds.get(usize::from(round))?.overall[stop.idx].as_ref()
    }

    /// Replace the transit label of `(round, stop)` when `label` is better.
    /// Returns `true` when the label was stored.
    pub fn improve_transit<C: TimeCalculator>(
        &mut self,
        round: u8,
        stop: &Stop,
        label: StopLabel,
    ) -> bool {
        self.ensure_round(round);
        let slot = &mut self.rounds[usize::from(round)].transit[stop.idx];
        improve::<C>(slot, label)
    }

    pub fn improve_overall<C: TimeCalculator>(
        &mut self,
        round: u8,
        stop: &Stop,
        label: StopLabel,
    ) -> bool {
        self.ensure_round(round);
        let round_labels = &mut self.rounds[usize::from(round)];
        let improved = improve::<C>(&mut round_labels.overall[stop.idx], label);
        if improved {
            round_labels.marked.push(*stop);
        }
        improved
    }

    pub fn push_guaranteed(&mut self, round: u8, boarding: GuaranteedBoarding) {
        self.ensure_round(round);
        self.rounds[usize::from(round)].guaranteed.push(boarding);
    }

    pub fn take_guaranteed(&mut self, round: u8) -> Vec<GuaranteedBoarding> {
        self.ensure_round(round);
        std::mem::take(&mut self.rounds[usize::from(round)].guaranteed)
    }

    pub fn take_marked(&mut self, round: u8) -> Vec<Stop> {
        self.ensure_round(round);
        std::mem::take(&mut self.rounds[usize::from(round)].marked)
    }
}

fn improve<C: TimeCalculator>(slot: &mut Option<StopLabel>, label: StopLabel) -> bool {
    match slot {
        Some(current) if C::is_better_or_equal(&current.time, &label.time) => false,
        _ => {
            *slot = Some(label);
            true
        }
    }
}

/// Best time per stop over all rounds, kept across the iterations of a
/// range-raptor search : an iteration starting closer to the window
/// anchor can only improve on the previous ones, so any label not better
/// than these can be discarded immediately.
#[derive(Debug)]
pub(crate) struct BestTimes {
    best: Vec<Option<SecondsSinceScheduleStart>>,
}

impl BestTimes {
    pub fn new(nb_of_stops: usize) -> Self {
        Self {
            best: vec![None; nb_of_stops],
        }
    }

    pub fn get(&self, stop: &Stop) -> Option<&SecondsSinceScheduleStart> {
        self.best[stop.idx].as_ref()
    }

    /// Record `time` at `stop`; returns `false` when the recorded best is
    /// already at least as good.
    pub fn improve<C: TimeCalculator>(
        &mut self,
        stop: &Stop,
        time: &SecondsSinceScheduleStart,
    ) -> bool {
        match &self.best[stop.idx] {
            Some(best) if C::is_better_or_equal(best, time) => false,
            _ => {
                self.best[stop.idx] = Some(*time);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::{BackwardCalculator, ForwardCalculator};

    fn label(seconds: u32) -> StopLabel {
        StopLabel {
            time: SecondsSinceScheduleStart::from_seconds(seconds),
            wait_offset: PositiveDuration::zero(),
            link: Link::Fallback { idx: 0 },
        }
    }

    #[test]
    fn improve_keeps_the_best_label_per_direction() {
        let stop = Stop { idx: 0 };
        let mut rounds = RoundsState::new(1);
        assert!(rounds.improve_transit::<ForwardCalculator>(0, &stop, label(100)));
        assert!(!rounds.improve_transit::<ForwardCalculator>(0, &stop, label(100)));
        assert!(!rounds.improve_transit::<ForwardCalculator>(0, &stop, label(150)));
        assert!(rounds.improve_transit::<ForwardCalculator>(0, &stop, label(50)));

        let mut rounds = RoundsState::new(1);
        assert!(rounds.improve_transit::<BackwardCalculator>(0, &stop, label(100)));
        assert!(!rounds.improve_transit::<BackwardCalculator>(0, &stop, label(50)));
        assert!(rounds.improve_transit::<BackwardCalculator>(0, &stop, label(150)));
    }

    #[test]
    fn an_unallocated_round_reads_as_unlabelled() {
        let stop = Stop { idx: 0 };
        let mut rounds = RoundsState::new(1);
        assert!(rounds.transit_label(0, &stop).is_none());
        assert!(rounds.overall_label(3, &stop).is_none());
        rounds.improve_transit::<ForwardCalculator>(1, &stop, label(100));
        assert!(rounds.transit_label(1, &stop).is_some());
        assert!(rounds.transit_label(2, &stop).is_none());
    }

    #[test]
    fn best_times_are_monotone() {
        let stop = Stop { idx: 0 };
        let mut best = BestTimes::new(1);
        let t100 = SecondsSinceScheduleStart::from_seconds(100);
        let t50 = SecondsSinceScheduleStart::from_seconds(50);
        assert!(best.improve::<ForwardCalculator>(&stop, &t100));
        assert!(!best.improve::<ForwardCalculator>(&stop, &t100));
        assert!(best.improve::<ForwardCalculator>(&stop, &t50));
        assert_eq!(best.get(&stop), Some(&t50));
    }
}

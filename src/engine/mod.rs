pub(crate) mod best_times;
pub(crate) mod calculator;
pub(crate) mod heuristics;
pub(crate) mod journeys_tree;
pub(crate) mod multicriteria;
pub(crate) mod pareto_front;
pub(crate) mod range_raptor;
pub(crate) mod standard;

pub mod catalog;
pub mod heuristic;
pub mod milp;
pub mod output;

// Domain layer - Samples, predictions, cycle outcomes and counters
pub mod outcome;
pub mod prediction;
pub mod sample;
pub mod statistics;

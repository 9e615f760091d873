pub mod fixtures;
pub mod schedule;

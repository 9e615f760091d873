//! Error types for scenario construction and trace loading.

use thiserror::Error;

use crate::agents::AgentId;

/// Errors raised while loading inputs or building a simulation.
///
/// The event loop itself never fails: once a scenario is built every action
/// only touches data validated during setup.
#[derive(Error, Debug)]
pub enum SimError {
    /// Reading an input file or writing an output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader could not be opened or produced an unrecoverable error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Result serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Trace or mobility data references an agent that is not in the social graph.
    #[error("agent {0} is referenced by trace data but missing from the social graph")]
    UnknownAgent(AgentId),

    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Setup finished with nobody left to simulate.
    #[error("population is empty after scenario setup")]
    EmptyPopulation,
}

pub type SimResult<T> = Result<T, SimError>;

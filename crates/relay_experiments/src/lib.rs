//! Parallel experimentation framework for relay simulation parameter sweeps.
//!
//! Runs many independent simulations with varying population, adversary,
//! jamming and encounter parameters, extracts propagation metrics from each
//! and exports them for analysis.
//!
//! # Quick Start
//!
//! ```no_run
//! use relay_experiments::{export_to_csv, run_parallel_experiments, ParameterSpace};
//! use relay_core::measurer::AuthorPolicy;
//!
//! let space = ParameterSpace::grid()
//!     .num_people(vec![100, 200])
//!     .num_adversaries(vec![0, 10])
//!     .authors(vec![AuthorPolicy::Random, AuthorPolicy::Unpopular])
//!     .seeds(vec![1, 2, 3]);
//!
//! let results = run_parallel_experiments(space.generate(), None).unwrap();
//! export_to_csv(&results, "relay_results.csv").unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: parameter variation (grid search, random sampling)
//! - [`runner`]: parallel simulation execution using rayon
//! - [`metrics`]: metrics extraction from finished runs
//! - [`export`]: result export to JSON, CSV and Parquet

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use export::{export_to_csv, export_to_json, export_to_parquet, write_json};
pub use metrics::{extract_metrics, ExperimentResult};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_parallel_experiments_with_progress};

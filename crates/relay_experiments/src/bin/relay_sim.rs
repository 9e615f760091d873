//! Command-line front end for single relay simulations and parameter sweeps.
//!
//! Logs go to stderr so stdout carries only the JSON result.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use relay_core::encounter::EncounterModelKind;
use relay_core::measurer::{AuthorPolicy, TimeUnit};
use relay_core::runner::run_simulation_with_world;
use relay_core::scenario::{GraphSource, RandomWalkConfig, ScenarioInputs, SimulationConfig};
use relay_core::telemetry::SimSnapshots;
use relay_core::telemetry_export::{
    write_agent_snapshots_parquet, write_propagation_parquet, write_snapshot_counts_parquet,
};
use relay_core::traces;
use relay_core::trust::TrustPolicy;
use relay_experiments::{
    export_to_csv, export_to_json, export_to_parquet, run_parallel_experiments_with_progress,
    write_json, ParameterSpace,
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "relay_sim",
    about = "Trust-weighted store-and-forward message relay simulator"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its propagation result as JSON
    Run(RunArgs),
    /// Run a grid of simulations in parallel and export the metrics
    Sweep(SweepArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Proximity,
    Trace,
    Naive,
}

impl From<ModelArg> for EncounterModelKind {
    fn from(model: ModelArg) -> Self {
        match model {
            ModelArg::Proximity => EncounterModelKind::ProximityGrid,
            ModelArg::Trace => EncounterModelKind::TraceReplay,
            ModelArg::Naive => EncounterModelKind::NaivePairwise,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TrustArg {
    MaxFriends,
    FractionOfFriends,
    Sigmoid,
}

impl From<TrustArg> for TrustPolicy {
    fn from(policy: TrustArg) -> Self {
        match policy {
            TrustArg::MaxFriends => TrustPolicy::MaxFriends,
            TrustArg::FractionOfFriends => TrustPolicy::FractionOfFriends,
            TrustArg::Sigmoid => TrustPolicy::SigmoidFractionOfFriends,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TimeUnitArg {
    Ms,
    S,
}

impl From<TimeUnitArg> for TimeUnit {
    fn from(unit: TimeUnitArg) -> Self {
        match unit {
            TimeUnitArg::Ms => TimeUnit::Milliseconds,
            TimeUnitArg::S => TimeUnit::Seconds,
        }
    }
}

/// Input data files. Every file is optional.
#[derive(Args)]
struct DataArgs {
    /// Social graph edge list (`first, second[, weight]`); implies a loaded graph
    #[arg(long)]
    social_edges: Option<PathBuf>,
    /// Field delimiter of the edge list and mobility files
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Header rows to skip in the edge list and mobility files
    #[arg(long, default_value_t = 0)]
    skip_rows: usize,
    /// Pairwise contact trace (St Andrews layout)
    #[arg(long)]
    encounters: Option<PathBuf>,
    /// Mobility trace (`agent, timestamp, latitude, longitude`)
    #[arg(long)]
    mobility: Option<PathBuf>,
    /// Index of per-cab trace files; line `i` becomes agent `i`
    #[arg(long, conflicts_with = "mobility")]
    cabspotting_index: Option<PathBuf>,
    /// Jammer coordinates (`x, y`) used with --optimal-jammers
    #[arg(long)]
    jammer_locations: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
    /// JSON config file; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    model: Option<ModelArg>,
    #[arg(long)]
    people: Option<usize>,
    #[arg(long)]
    adversaries: Option<usize>,
    /// random, popular, unpopular or adversarial
    #[arg(long)]
    author: Option<AuthorPolicy>,
    #[arg(long, value_enum)]
    trust: Option<TrustArg>,
    #[arg(long)]
    seed: Option<u64>,
    /// Proximity neighborhood radius
    #[arg(long)]
    radius: Option<f64>,
    /// Encounter probability of the selected model
    #[arg(long)]
    chance: Option<f64>,
    #[arg(long)]
    jamming_radius: Option<f64>,
    #[arg(long)]
    static_jammers: Option<usize>,
    #[arg(long)]
    mobile_jammers: Option<usize>,
    /// Place static jammers at --jammer-locations
    #[arg(long)]
    optimal_jammers: bool,
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// Start with empty queues
    #[arg(long)]
    no_prefill: bool,
    /// Naive model tick count
    #[arg(long)]
    ticks: Option<usize>,
    #[arg(long)]
    tick_interval: Option<f64>,
    /// Runtime cap in hours of trace time; 0 disables it
    #[arg(long)]
    max_hours: Option<f64>,
    #[arg(long, value_enum)]
    time_unit: Option<TimeUnitArg>,
    /// Random-walk steps for proximity runs without mobility data
    #[arg(long)]
    walk_steps: Option<usize>,
    #[arg(long)]
    snapshot_interval: Option<f64>,
    #[command(flatten)]
    data: DataArgs,
    /// Write the JSON result here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Write propagation and snapshot parquet files into this directory
    #[arg(long)]
    parquet_dir: Option<PathBuf>,
}

#[derive(Args)]
struct SweepArgs {
    /// JSON base config file
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    model: Option<ModelArg>,
    #[arg(long, value_delimiter = ',')]
    people: Vec<usize>,
    #[arg(long, value_delimiter = ',')]
    adversaries: Vec<usize>,
    #[arg(long, value_delimiter = ',')]
    authors: Vec<AuthorPolicy>,
    #[arg(long, value_delimiter = ',')]
    static_jammers: Vec<usize>,
    #[arg(long, value_delimiter = ',')]
    mobile_jammers: Vec<usize>,
    #[arg(long, value_delimiter = ',')]
    radius: Vec<f64>,
    #[arg(long, value_delimiter = ',')]
    jamming_radius: Vec<f64>,
    #[arg(long, value_delimiter = ',')]
    chance: Vec<f64>,
    #[arg(long, value_delimiter = ',')]
    seeds: Vec<u64>,
    /// Draw this many random combinations instead of the full grid
    #[arg(long)]
    sample: Option<usize>,
    #[arg(long, default_value_t = 0)]
    sample_seed: u64,
    /// Worker threads; defaults to one per core
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    no_progress: bool,
    #[arg(long, value_enum)]
    time_unit: Option<TimeUnitArg>,
    #[command(flatten)]
    data: DataArgs,
    /// JSON results file; stdout when no output is given
    #[arg(long)]
    json: Option<PathBuf>,
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long)]
    parquet: Option<PathBuf>,
}

fn delimiter_byte(delimiter: char) -> Result<u8, Box<dyn Error>> {
    u8::try_from(delimiter).map_err(|_| format!("delimiter '{delimiter}' is not ASCII").into())
}

/// A config plus whether its time unit was chosen by the user.
struct BaseConfig {
    config: SimulationConfig,
    time_unit_given: bool,
}

fn base_config(
    path: Option<&Path>,
    time_unit: Option<TimeUnitArg>,
) -> Result<BaseConfig, Box<dyn Error>> {
    let (mut config, mut time_unit_given) = match path {
        Some(path) => {
            let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            let given = raw.get("time_unit").is_some();
            (serde_json::from_value(raw)?, given)
        }
        None => (SimulationConfig::default(), false),
    };
    if let Some(unit) = time_unit {
        config.time_unit = unit.into();
        time_unit_given = true;
    }
    Ok(BaseConfig {
        config,
        time_unit_given,
    })
}

fn load_inputs(data: &DataArgs, config: &SimulationConfig) -> Result<ScenarioInputs, Box<dyn Error>> {
    let delimiter = delimiter_byte(data.delimiter)?;
    let mut inputs = ScenarioInputs::default();

    if let Some(path) = &data.social_edges {
        inputs.social_edges = traces::load_social_edges(path, delimiter, data.skip_rows)?;
        info!(edges = inputs.social_edges.len(), path = %path.display(), "loaded social graph");
    }
    if let Some(path) = &data.encounters {
        inputs.encounters = traces::load_encounter_records(path)?;
        info!(records = inputs.encounters.len(), path = %path.display(), "loaded contact trace");
    }
    if let Some(path) = &data.mobility {
        inputs.mobility = traces::load_mobility_points(path, delimiter, data.skip_rows)?;
        info!(points = inputs.mobility.len(), path = %path.display(), "loaded mobility trace");
    }
    if let Some(path) = &data.cabspotting_index {
        inputs.mobility = traces::load_cabspotting_index(path, config.num_people)?;
        info!(points = inputs.mobility.len(), path = %path.display(), "loaded cab traces");
    }
    if config.jamming.optimal_placement {
        match &data.jammer_locations {
            Some(path) => match traces::load_jammer_locations(path, config.jamming.static_jammers) {
                Ok(points) => inputs.jammer_locations = Some(points),
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "jammer locations unavailable")
                }
            },
            None => warn!("optimal jammer placement requested without --jammer-locations"),
        }
    }
    Ok(inputs)
}

/// Settings that depend on which inputs were given rather than on flags.
/// Contact traces are timestamped in seconds, so they switch the unit
/// unless one was chosen explicitly.
fn adapt_to_inputs(
    config: &mut SimulationConfig,
    inputs: &ScenarioInputs,
    time_unit_given: bool,
) {
    if !inputs.social_edges.is_empty() {
        config.graph_source = GraphSource::Loaded;
    }
    if !inputs.encounters.is_empty() && !time_unit_given {
        info!("contact trace loaded, measuring time in seconds");
        config.time_unit = TimeUnit::Seconds;
    }
    let proximity = config.encounter_model == EncounterModelKind::ProximityGrid;
    if proximity && inputs.mobility.is_empty() && config.random_walk.is_none() {
        info!("no mobility data, using a synthetic random walk");
        config.random_walk = Some(RandomWalkConfig::default());
    }
}

fn run_config(args: &RunArgs) -> Result<BaseConfig, Box<dyn Error>> {
    let mut base = base_config(args.config.as_deref(), args.time_unit)?;
    let config = &mut base.config;
    if let Some(model) = args.model {
        config.encounter_model = model.into();
    }
    if let Some(people) = args.people {
        config.num_people = people;
    }
    if let Some(adversaries) = args.adversaries {
        config.num_adversaries = adversaries;
    }
    if let Some(author) = args.author {
        config.author = author;
    }
    if let Some(trust) = args.trust {
        config.default_trust_policy = trust.into();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(radius) = args.radius {
        config.neighborhood_radius = radius;
    }
    if let Some(chance) = args.chance {
        match config.encounter_model {
            EncounterModelKind::ProximityGrid => config.encounter_chance = chance,
            EncounterModelKind::TraceReplay => config.trace_encounter_chance = chance,
            EncounterModelKind::NaivePairwise => config.naive_encounter_chance = chance,
        }
    }
    if let Some(radius) = args.jamming_radius {
        config.jamming.radius = radius;
    }
    if let Some(count) = args.static_jammers {
        config.jamming.static_jammers = count;
    }
    if let Some(count) = args.mobile_jammers {
        config.jamming.mobile_jammers = count;
    }
    if args.optimal_jammers {
        config.jamming.optimal_placement = true;
    }
    if let Some(capacity) = args.queue_capacity {
        config.queue_capacity = capacity;
    }
    if args.no_prefill {
        config.prefill_queues = false;
    }
    if let Some(ticks) = args.ticks {
        config.tick_count = ticks;
    }
    if let Some(interval) = args.tick_interval {
        config.tick_interval = interval;
    }
    if let Some(hours) = args.max_hours {
        config.max_runtime_hours = hours;
    }
    if let Some(steps) = args.walk_steps {
        let walk = config.random_walk.get_or_insert_with(RandomWalkConfig::default);
        walk.steps = steps;
    }
    if args.snapshot_interval.is_some() {
        config.snapshot_interval = args.snapshot_interval;
    }
    Ok(base)
}

fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let BaseConfig {
        mut config,
        time_unit_given,
    } = run_config(&args)?;
    let inputs = load_inputs(&args.data, &config)?;
    adapt_to_inputs(&mut config, &inputs, time_unit_given);

    let (world, output) = run_simulation_with_world(&config, inputs)?;
    info!(
        seed = output.seed,
        reach = output.final_reach(),
        population = output.number_of_people,
        "simulation finished"
    );

    if let Some(dir) = &args.parquet_dir {
        std::fs::create_dir_all(dir)?;
        write_propagation_parquet(dir.join("propagation.parquet"), &output.propagation_data)?;
        if let Some(snapshots) = world.get_resource::<SimSnapshots>() {
            write_snapshot_counts_parquet(dir.join("snapshot_counts.parquet"), snapshots)?;
            write_agent_snapshots_parquet(dir.join("agent_snapshots.parquet"), snapshots)?;
        }
        info!(dir = %dir.display(), "wrote parquet telemetry");
    }

    let json = output.to_json()?;
    match &args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn sweep(args: SweepArgs) -> Result<(), Box<dyn Error>> {
    let BaseConfig {
        config: mut base,
        time_unit_given,
    } = base_config(args.config.as_deref(), args.time_unit)?;
    if let Some(model) = args.model {
        base.encounter_model = model.into();
    }
    let inputs = load_inputs(&args.data, &base)?;
    adapt_to_inputs(&mut base, &inputs, time_unit_given);

    let space = ParameterSpace::grid()
        .with_base(base)
        .num_people(args.people)
        .num_adversaries(args.adversaries)
        .authors(args.authors)
        .static_jammers(args.static_jammers)
        .mobile_jammers(args.mobile_jammers)
        .neighborhood_radius(args.radius)
        .jamming_radius(args.jamming_radius)
        .encounter_chance(args.chance)
        .seeds(args.seeds);
    let parameter_sets = match args.sample {
        Some(count) => space.sample_random(count, args.sample_seed),
        None => space.generate(),
    };
    info!(runs = parameter_sets.len(), "starting sweep");

    let results = run_parallel_experiments_with_progress(
        parameter_sets,
        &inputs,
        args.threads,
        !args.no_progress,
    )?;
    info!(completed = results.len(), "sweep finished");

    if let Some(path) = &args.csv {
        export_to_csv(&results, path)?;
    }
    if let Some(path) = &args.parquet {
        export_to_parquet(&results, path)?;
    }
    match &args.json {
        Some(path) => export_to_json(&results, path)?,
        None if args.csv.is_none() && args.parquet.is_none() => {
            write_json(&results, std::io::stdout().lock())?;
            println!();
        }
        None => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Sweep(args) => sweep(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::traces::EncounterRecord;

    fn trace_inputs() -> ScenarioInputs {
        ScenarioInputs::default().with_encounters(vec![EncounterRecord {
            first: 0,
            second: 1,
            start_time: 10.0,
            end_time: 20.0,
            signal_strength: -60.0,
        }])
    }

    #[test]
    fn contact_traces_default_to_seconds() {
        let mut config = SimulationConfig::default();
        assert_eq!(config.time_unit, TimeUnit::Milliseconds);
        adapt_to_inputs(&mut config, &trace_inputs(), false);
        assert_eq!(config.time_unit, TimeUnit::Seconds);
    }

    #[test]
    fn explicit_time_unit_survives_contact_traces() {
        let mut config = SimulationConfig::default();
        adapt_to_inputs(&mut config, &trace_inputs(), true);
        assert_eq!(config.time_unit, TimeUnit::Milliseconds);
    }

    #[test]
    fn time_unit_flag_counts_as_explicit() {
        let base = base_config(None, Some(TimeUnitArg::Ms)).expect("config");
        assert!(base.time_unit_given);
        assert!(!base_config(None, None).expect("config").time_unit_given);
    }

    #[test]
    fn time_unit_in_config_file_counts_as_explicit() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.json");
        let mut raw = serde_json::to_value(SimulationConfig::default()).expect("serialize");
        std::fs::write(&path, raw.to_string()).expect("write");
        assert!(base_config(Some(&path), None).expect("config").time_unit_given);

        raw.as_object_mut().expect("object").remove("time_unit");
        std::fs::write(&path, raw.to_string()).expect("write");
        assert!(!base_config(Some(&path), None).expect("config").time_unit_given);
    }
}

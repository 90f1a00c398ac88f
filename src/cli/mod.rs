//! Channel capacity CLI
//!
//! Estimate mutual information, weighted mutual information and channel
//! capacity from sample files, or generate samples from a noisy channel.

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::estimator::{
    EstimatorConfig, LeafSize, NeighborCount, Observation, WeightedKraskovEstimator,
};
use crate::optimizer::AdamConfig;
use crate::preprocessing::{PreprocessingConfig, Preprocessor};
use crate::synthetic::NoisyChannel;
use crate::utils::data_loader::{load_samples, save_csv, save_json, SampleFormat};

// ─── Styling ───────────────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}

fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}

fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}

fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(48)));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn row(key: &str, val: impl std::fmt::Display) {
    println!("  {:<14} {}", muted(key), val);
}

fn print_weights(weights: &HashMap<String, f64>) {
    let mut sorted: Vec<_> = weights.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    println!();
    println!("  {:<20} {:>10}", muted("Label"), muted("Weight"));
    println!("  {}", dim(&"─".repeat(31)));
    for (label, w) in sorted {
        println!("  {:<20} {:>10.4}", label, w);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cce")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Channel capacity estimation with the weighted Kraskov estimator")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by the estimating commands
#[derive(Args, Debug, Clone)]
pub struct EstimateArgs {
    /// Sample file (CSV: label then coordinates; JSON: [{label, value}])
    #[arg(short, long)]
    pub data: PathBuf,

    /// Number of nearest neighbors
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Estimator configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// k-d tree bucket size
    #[arg(long)]
    pub leaf_size: Option<usize>,

    /// Use the sample as is: no normalization, no duplicate jitter
    #[arg(long)]
    pub raw: bool,

    /// Seed for the duplicate jitter
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the mutual information between label and value
    Mi {
        #[command(flatten)]
        args: EstimateArgs,
    },

    /// Estimate the mutual information under a re-weighted label distribution
    Weighted {
        #[command(flatten)]
        args: EstimateArgs,

        /// Label weights as label=weight, one per label, summing to 1
        #[arg(short, long = "weight", value_parser = parse_weight, required = true)]
        weights: Vec<(String, f64)>,
    },

    /// Estimate the channel capacity and the input distribution reaching it
    Capacity {
        #[command(flatten)]
        args: EstimateArgs,

        /// Optimizer steps
        #[arg(long)]
        iterations: Option<usize>,

        /// Optimizer learning rate
        #[arg(long)]
        learning_rate: Option<f64>,
    },

    /// Generate samples from a Gaussian noisy channel
    Simulate {
        /// Output file (.csv or .json)
        #[arg(short, long)]
        output: PathBuf,

        /// Channel input as label:count:target, target coordinates comma separated
        #[arg(short, long = "input", value_parser = parse_input, required = true)]
        inputs: Vec<(String, usize, Vec<f64>)>,

        /// Noise standard deviation
        #[arg(long, default_value = "0.0001")]
        sigma: f64,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Parse `label=weight`
pub fn parse_weight(s: &str) -> Result<(String, f64), String> {
    let (label, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected label=weight, got '{}'", s))?;
    let weight = weight
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid weight in '{}': {}", s, e))?;
    Ok((label.trim().to_string(), weight))
}

/// Parse `label:count:x0,x1,...`
pub fn parse_input(s: &str) -> Result<(String, usize, Vec<f64>), String> {
    let mut parts = s.rsplitn(3, ':');
    let (target, count, label) = match (parts.next(), parts.next(), parts.next()) {
        (Some(t), Some(c), Some(l)) => (t, c, l),
        _ => return Err(format!("expected label:count:target, got '{}'", s)),
    };
    let count = count
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid count in '{}': {}", s, e))?;
    let target = target
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid target in '{}': {}", s, e))?;
    Ok((label.to_string(), count, target))
}

// ─── Shared steps ──────────────────────────────────────────────────────────────

fn build_config(args: &EstimateArgs) -> anyhow::Result<EstimatorConfig> {
    let mut config = match &args.config {
        Some(path) => EstimatorConfig::from_json_file(path)?,
        None => EstimatorConfig::default(),
    };
    if let Some(k) = args.k {
        config = config.with_k(NeighborCount::new(k)?);
    }
    if let Some(leaf_size) = args.leaf_size {
        config = config.with_leaf_size(LeafSize::new(leaf_size)?);
    }
    Ok(config)
}

fn prepare_samples(args: &EstimateArgs) -> anyhow::Result<Vec<Observation<String>>> {
    step_run(&format!("Loading {}", args.data.display()));
    let start = Instant::now();
    let samples = load_samples(&args.data)?;
    step_done(&format!("{} samples in {:.2?}", samples.len(), start.elapsed()));

    if args.raw {
        return Ok(samples);
    }

    let mut config = PreprocessingConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    step_run("Preprocessing");
    let start = Instant::now();
    let mut preprocessor = Preprocessor::with_config(config);
    let samples = preprocessor.run(&samples)?;
    match preprocessor.last_eps() {
        Some(eps) => step_done(&format!("jittered duplicates with eps {:.3e}", eps)),
        None => step_done(&format!("{:.2?}", start.elapsed())),
    }
    Ok(samples)
}

fn load_estimator(
    args: &EstimateArgs,
    config: EstimatorConfig,
) -> anyhow::Result<WeightedKraskovEstimator<String>> {
    let samples = prepare_samples(args)?;
    let mut estimator = WeightedKraskovEstimator::with_config(config)?;

    step_run("Building indexes");
    let start = Instant::now();
    estimator.load(&samples)?;
    let labels = estimator.dataset().map_or(0, |d| d.n_labels());
    step_done(&format!("{} labels in {:.2?}", labels, start.elapsed()));
    Ok(estimator)
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_mi(args: &EstimateArgs) -> anyhow::Result<()> {
    section("Mutual information");
    let config = build_config(args)?;
    let k = config.neighbors.get();
    let mut estimator = load_estimator(args, config)?;

    step_run(&format!("Estimating with k = {}", k));
    let start = Instant::now();
    let bits = estimator.calculate_mi(k)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    println!();
    row("MI", format!("{:.4} bits", bits).white().bold());
    println!();
    Ok(())
}

pub fn cmd_weighted(args: &EstimateArgs, weights: &[(String, f64)]) -> anyhow::Result<()> {
    section("Weighted mutual information");
    let config = build_config(args)?;
    let k = config.neighbors.get();
    let mut estimator = load_estimator(args, config)?;
    let weights: HashMap<String, f64> = weights.iter().cloned().collect();

    step_run(&format!("Estimating with k = {}", k));
    let start = Instant::now();
    let bits = estimator.calculate_weighted_mi(&weights, k)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_weights(&weights);
    println!();
    row("Weighted MI", format!("{:.4} bits", bits).white().bold());
    println!();
    Ok(())
}

pub fn cmd_capacity(
    args: &EstimateArgs,
    iterations: Option<usize>,
    learning_rate: Option<f64>,
) -> anyhow::Result<()> {
    section("Channel capacity");
    let mut config = build_config(args)?;
    let mut optimizer: AdamConfig = config.optimizer.clone();
    if let Some(n) = iterations {
        optimizer = optimizer.with_max_iter(n);
    }
    if let Some(lr) = learning_rate {
        optimizer = optimizer.with_learning_rate(lr);
    }
    config = config.with_optimizer(optimizer);
    let k = config.neighbors.get();
    let iterations = config.optimizer.max_iter;
    let mut estimator = load_estimator(args, config)?;

    step_run(&format!("Optimizing weights ({} steps, k = {})", iterations, k));
    let start = Instant::now();
    let capacity = estimator.calculate_capacity(k)?;
    step_done(&format!("{:.2?}", start.elapsed()));

    print_weights(&capacity.weights);
    println!();
    row("Capacity", format!("{:.4} bits", capacity.bits).white().bold());
    row("Loss", format!("{:.6}", capacity.loss));
    println!();
    Ok(())
}

pub fn cmd_simulate(
    output: &Path,
    inputs: &[(String, usize, Vec<f64>)],
    sigma: f64,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    section("Simulate");
    let format = SampleFormat::from_path(output)?;

    let mut channel = NoisyChannel::new(sigma);
    for (label, count, target) in inputs {
        channel = channel.with_input(label.clone(), *count, target.clone());
    }
    if let Some(seed) = seed {
        channel = channel.with_seed(seed);
    }

    step_run(&format!("Transmitting {} symbols", channel.len()));
    let samples = channel.transmit()?;
    step_done(&format!("sigma {}", sigma));

    step_run(&format!("Saving → {}", output.display()));
    match format {
        SampleFormat::Csv => save_csv(output, &samples)?,
        SampleFormat::Json => save_json(output, &samples)?,
    }
    step_done(&format!("{} samples", samples.len()));
    println!();
    Ok(())
}

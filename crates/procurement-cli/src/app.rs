//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "procurement")]
#[command(
    author,
    version,
    about = "Supplier discovery and quote benchmarking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, env = "PROCUREMENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find, enrich and score suppliers
    Analyze(AnalyzeArgs),

    /// Benchmark a supplier quote against the market
    Benchmark(BenchmarkArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// What to source, e.g. "industrial steel suppliers"
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Preferred supplier location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Product category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Delivery timeline
    #[arg(long)]
    pub timeline: Option<String>,

    /// Requirement (repeatable)
    #[arg(short, long = "requirement")]
    pub requirements: Vec<String>,
}

#[derive(Args)]
pub struct BenchmarkArgs {
    /// Product to benchmark, e.g. "steel pipes"
    #[arg(required = true, num_args = 1..)]
    pub product: Vec<String>,

    /// Supplier quote (unit price)
    #[arg(short, long, allow_negative_numbers = true)]
    pub quote: Option<f64>,

    /// Order quantity
    #[arg(short = 'n', long)]
    pub quantity: Option<u32>,

    /// Market location
    #[arg(short, long)]
    pub location: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
    Md,
}

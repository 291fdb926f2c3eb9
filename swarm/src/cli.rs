use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

const DURATION_HINT: &str = "expected e.g. 250ms, 10s, 1m or plain seconds";

/// Plain integers are seconds; anything else goes through humantime (`250ms`, `1m 30s`).
pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err(format!("duration cannot be empty ({DURATION_HINT})"));
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("duration '{s}' is too large"));
    }

    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}': {err} ({DURATION_HINT})"))
}

fn parse_coverage(input: &str) -> Result<f64, String> {
    let v: f64 = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid coverage '{input}' (expected a fraction such as 0.9)"))?;
    if !(v > 0.0 && v <= 1.0) {
        return Err(format!("coverage must be in (0, 1] (got {v})"));
    }
    Ok(v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Progress bars and a readable summary.
    HumanReadable,
    /// Emit JSON progress lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "swarm",
    author,
    version,
    about = "Synthetic user-population load and robustness testing",
    long_about = "swarm simulates cohorts of virtual users walking a content/lesson web application.\n\nEach user visits the landing and login routes, fetches the catalog, opens a sampled subset of items with their sub-resources, browses the secondary routes and sweeps the auxiliary endpoints. Cohorts run one after another in bounded-concurrency batches.\n\nThe run ends with a JSON report: per-endpoint latency percentiles, bottlenecks and a launch-readiness verdict.",
    after_help = "Examples:\n  swarm check --base-url http://localhost:3000\n  swarm run --base-url http://localhost:3000 --users 50 --concurrency 10\n  swarm run --config swarm.yaml --report out/report.json --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every cohort against the target and write the report.
    Run(RunArgs),
    /// Only check that the target's landing route answers.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// YAML config file (camelCase keys). Flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the target application.
    #[arg(long, env = "SWARM_BASE_URL")]
    pub base_url: Option<String>,

    /// Users per cohort, applied to every cohort.
    #[arg(long)]
    pub users: Option<u64>,

    /// Maximum number of users in flight within a cohort.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Fraction of the catalog each user visits, in (0, 1].
    #[arg(long, value_parser = parse_coverage)]
    pub coverage: Option<f64>,

    /// Per-request timeout (e.g. 30s).
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Total tries per request, including the first.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Delay between retry attempts.
    #[arg(long, value_parser = parse_duration)]
    pub retry_delay: Option<Duration>,

    /// Delay before every request of a user except the first.
    #[arg(long, value_parser = parse_duration)]
    pub action_delay: Option<Duration>,

    /// Pause between batches of a cohort.
    #[arg(long, value_parser = parse_duration)]
    pub batch_delay: Option<Duration>,

    /// Seed for reproducible item sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write the JSON report.
    #[arg(long, default_value = "swarm-report.json")]
    pub report: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Debug-level logging (RUST_LOG takes precedence).
    #[arg(long, short)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// YAML config file; only `baseUrl`, `requestTimeout` and the landing route are used.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the target application.
    #[arg(long, env = "SWARM_BASE_URL")]
    pub base_url: Option<String>,

    /// Timeout of the single pre-flight request.
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[arg(long, short)]
    pub verbose: bool,
}

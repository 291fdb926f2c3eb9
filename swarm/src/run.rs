use std::path::Path;
use std::sync::Arc;

use indicatif::MultiProgress;
use swarm_core::{HttpClient, RunConfig};

use crate::cli::{CheckArgs, RunArgs};
use crate::config_file::ConfigFile;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs, bars: MultiProgress) -> Result<ExitCode, RunError> {
    let file = load_config_file(args.config.as_deref()).await?;
    let cfg = run_config(&args, file);
    cfg.validate()?;

    let out = output::formatter(args.output, bars);
    out.print_header(&cfg);

    let client = Arc::new(HttpClient::default());
    let report = swarm_core::runner::run_population(cfg, client, out.progress()).await?;

    swarm_core::write_report(&args.report, &report).map_err(|err| {
        RunError::RuntimeError(
            anyhow::Error::new(err)
                .context(format!("failed to write report: {}", args.report.display())),
        )
    })?;
    tracing::info!(path = %args.report.display(), "report written");

    out.print_summary(&report, &args.report)
        .map_err(RunError::RuntimeError)?;

    // The verdict lives in the report; a NOT READY run still exits 0.
    Ok(ExitCode::Success)
}

pub async fn check(args: CheckArgs) -> Result<ExitCode, RunError> {
    let file = load_config_file(args.config.as_deref()).await?;
    let cfg = check_config(&args, file);
    cfg.validate()?;

    let client = HttpClient::default();
    let status = swarm_core::preflight(&client, &cfg).await?;
    println!(
        "{} reachable (status {status})",
        cfg.url(&cfg.surface.landing_route)
    );
    Ok(ExitCode::Success)
}

async fn load_config_file(path: Option<&Path>) -> Result<Option<ConfigFile>, RunError> {
    match path {
        Some(path) => ConfigFile::load(path)
            .await
            .map(Some)
            .map_err(RunError::InvalidInput),
        None => Ok(None),
    }
}

/// Defaults, then the config file, then flags.
fn run_config(args: &RunArgs, file: Option<ConfigFile>) -> RunConfig {
    let mut cfg = RunConfig::default();
    if let Some(file) = file {
        file.apply(&mut cfg);
    }

    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(users) = args.users {
        for n in cfg.population.values_mut() {
            *n = users;
        }
    }
    if let Some(v) = args.concurrency {
        cfg.concurrency_limit = v;
    }
    if let Some(v) = args.coverage {
        cfg.coverage_fraction = v;
    }
    if let Some(v) = args.timeout {
        cfg.request_timeout = v;
    }
    if let Some(v) = args.retries {
        cfg.retry_attempts = v;
    }
    if let Some(v) = args.retry_delay {
        cfg.retry_delay = v;
    }
    if let Some(v) = args.action_delay {
        cfg.inter_action_delay = v;
    }
    if let Some(v) = args.batch_delay {
        cfg.inter_batch_delay = v;
    }
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }

    cfg
}

fn check_config(args: &CheckArgs, file: Option<ConfigFile>) -> RunConfig {
    let mut cfg = RunConfig::default();
    if let Some(file) = file {
        file.apply(&mut cfg);
    }
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(v) = args.timeout {
        cfg.request_timeout = v;
    }
    cfg
}

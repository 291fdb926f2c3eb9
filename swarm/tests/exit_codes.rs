use std::process::{Command, Output};

use anyhow::Context as _;
use swarm_testserver::{SubResource, TestServer, TestServerConfig};

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn ensure_code(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

fn unused_port_url() -> anyhow::Result<String> {
    let port = std::net::TcpListener::bind("127.0.0.1:0")?
        .local_addr()?
        .port();
    Ok(format!("http://127.0.0.1:{port}"))
}

async fn swarm(args: Vec<String>) -> anyhow::Result<Output> {
    let exe = env!("CARGO_BIN_EXE_swarm");
    tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .args(&args)
            .env_remove("SWARM_BASE_URL")
            .env_remove("RUST_LOG")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run swarm binary")
}

fn fast_run_args(base_url: &str, report: &std::path::Path) -> Vec<String> {
    [
        "run",
        "--base-url",
        base_url,
        "--users",
        "3",
        "--concurrency",
        "3",
        "--retry-delay",
        "0ms",
        "--action-delay",
        "0ms",
        "--batch-delay",
        "0ms",
        "--seed",
        "1",
        "--output",
        "json",
        "--report",
    ]
    .into_iter()
    .map(str::to_string)
    .chain(std::iter::once(report.display().to_string()))
    .collect()
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_swarm");

    let out = Command::new(exe)
        .arg("run")
        .arg("--timeout")
        .arg("10x")
        .output()
        .context("run swarm binary")?;

    ensure_code(&out, 30)
}

#[test]
fn out_of_range_values_exit_30() -> anyhow::Result<()> {
    let exe = env!("CARGO_BIN_EXE_swarm");

    let out = Command::new(exe)
        .args(["run", "--concurrency", "0", "--base-url", "http://127.0.0.1:1"])
        .output()
        .context("run swarm binary")?;

    ensure_code(&out, 30)
}

#[test]
fn bad_config_file_exit_30() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("swarm.yaml");
    std::fs::write(&path, "concurency: 3\n")?;

    let exe = env!("CARGO_BIN_EXE_swarm");
    let out = Command::new(exe)
        .arg("run")
        .arg("--config")
        .arg(&path)
        .output()
        .context("run swarm binary")?;

    ensure_code(&out, 30)
}

#[tokio::test]
async fn unreachable_target_exit_20() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let report = dir.path().join("report.json");
    let base_url = unused_port_url()?;

    let out = swarm(fast_run_args(&base_url, &report)).await?;
    ensure_code(&out, 20)?;
    anyhow::ensure!(!report.exists(), "no report is written for an unreachable target");

    let out = swarm(vec!["check".to_string(), "--base-url".to_string(), base_url]).await?;
    ensure_code(&out, 20)
}

#[tokio::test]
async fn check_reachable_target_exit_0() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let out = swarm(vec![
        "check".to_string(),
        "--base-url".to_string(),
        server.base_url().to_string(),
    ])
    .await?;

    server.shutdown().await;
    ensure_code(&out, 0)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stdout).contains("status 200"));
    Ok(())
}

#[tokio::test]
async fn not_ready_verdict_still_exits_0_and_writes_the_report() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerConfig {
        failing_sub_resource: Some(SubResource::Quiz),
        ..TestServerConfig::default()
    })
    .await
    .context("start test server")?;

    let dir = tempfile::tempdir()?;
    let report = dir.path().join("out/report.json");

    let out = swarm(fast_run_args(server.base_url(), &report)).await?;
    server.shutdown().await;
    ensure_code(&out, 0)?;

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(&report).context("read report")?,
    )?;
    anyhow::ensure!(json["users"]["total"] == 9, "report: {json}");
    anyhow::ensure!(json["readiness"]["ready"] == false);

    // NDJSON on stdout: cohort progress, then one summary line.
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines = stdout
        .lines()
        .map(serde_json::from_str::<serde_json::Value>)
        .collect::<Result<Vec<_>, _>>()
        .context("stdout is not NDJSON")?;
    let kinds: Vec<&str> = lines.iter().filter_map(|l| l["kind"].as_str()).collect();
    anyhow::ensure!(kinds.iter().filter(|k| **k == "cohort").count() == 3);
    anyhow::ensure!(kinds.last() == Some(&"summary"), "kinds: {kinds:?}");

    Ok(())
}

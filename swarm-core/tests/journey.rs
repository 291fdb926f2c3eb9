use std::sync::Arc;
use std::time::Duration;

use swarm_core::{
    Collector, HttpClient, JourneyContext, JourneyResult, RunConfig, SkillLevel, run_journey,
};
use swarm_testserver::{CatalogBody, SubResource, TestServer, TestServerConfig};

fn fast_config(base_url: &str) -> RunConfig {
    RunConfig {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        retry_delay: Duration::ZERO,
        inter_action_delay: Duration::ZERO,
        inter_batch_delay: Duration::ZERO,
        seed: Some(7),
        ..RunConfig::default()
    }
}

fn context(cfg: RunConfig) -> (Arc<JourneyContext>, Arc<Collector>) {
    let collector = Arc::new(Collector::new());
    let ctx = JourneyContext::new(
        Arc::new(cfg),
        Arc::new(HttpClient::default()),
        collector.clone(),
    );
    (Arc::new(ctx), collector)
}

async fn one_user(
    server_cfg: TestServerConfig,
) -> anyhow::Result<(JourneyResult, Arc<Collector>, TestServer)> {
    let server = TestServer::start_with(server_cfg).await?;
    let (ctx, collector) = context(fast_config(server.base_url()));
    let result = run_journey(ctx, SkillLevel::Beginner, 0).await;
    Ok((result, collector, server))
}

#[tokio::test]
async fn healthy_target_completes_the_whole_journey() -> anyhow::Result<()> {
    let (result, collector, server) = one_user(TestServerConfig::default()).await?;

    anyhow::ensure!(result.succeeded(), "user failed: {:?}", result.user.failure);
    anyhow::ensure!(result.user.failed_actions == 0);
    // ceil(10 × 0.9)
    anyhow::ensure!(result.user.resources_visited == 9);
    // landing, login and the six secondary routes
    anyhow::ensure!(result.user.routes_visited == 8);

    let detail = collector
        .endpoint_snapshot("/api/lessons/:id")
        .ok_or_else(|| anyhow::anyhow!("missing detail endpoint"))?;
    anyhow::ensure!(detail.total_calls == 9 && detail.fail_count == 0);

    let visits: u64 = collector.resource_snapshots().iter().map(|r| r.visits).sum();
    anyhow::ensure!(visits == 9);
    anyhow::ensure!(server.stats().hits("/api/achievements") == 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn catalog_500_fails_the_user() -> anyhow::Result<()> {
    let (result, collector, server) = one_user(TestServerConfig {
        catalog_status: 500,
        ..TestServerConfig::default()
    })
    .await?;

    anyhow::ensure!(!result.user.succeeded);
    anyhow::ensure!(!result.succeeded());
    let failure = result.user.failure.clone().unwrap_or_default();
    anyhow::ensure!(failure.contains("500"), "unexpected failure: {failure}");

    let catalog = collector
        .endpoint_snapshot("/api/lessons")
        .ok_or_else(|| anyhow::anyhow!("missing catalog endpoint"))?;
    anyhow::ensure!(catalog.fail_count == 1);

    // The journey stops at the catalog.
    anyhow::ensure!(server.stats().hits_with_prefix("/api/lessons/") == 0);
    anyhow::ensure!(server.stats().hits("/dashboard") == 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unusable_catalog_bodies_are_fatal() -> anyhow::Result<()> {
    for body in [CatalogBody::Empty, CatalogBody::NotArray] {
        let (result, _, server) = one_user(TestServerConfig {
            catalog_body: body,
            ..TestServerConfig::default()
        })
        .await?;
        anyhow::ensure!(!result.user.succeeded, "{body:?} should be fatal");
        server.shutdown().await;
    }
    Ok(())
}

#[tokio::test]
async fn failing_quiz_is_a_soft_failure() -> anyhow::Result<()> {
    let (result, collector, server) = one_user(TestServerConfig {
        failing_sub_resource: Some(SubResource::Quiz),
        ..TestServerConfig::default()
    })
    .await?;

    anyhow::ensure!(result.user.succeeded, "quiz failures must not fail the user");
    anyhow::ensure!(result.user.failed_actions >= 9);
    anyhow::ensure!(result.user.resources_visited == 9);

    let quiz = collector
        .endpoint_snapshot("/api/lessons/:id/quiz")
        .ok_or_else(|| anyhow::anyhow!("missing quiz endpoint"))?;
    anyhow::ensure!(quiz.fail_count >= 9 && quiz.success_count == 0);

    // The journey keeps going after the failures.
    anyhow::ensure!(server.stats().hits("/profile") == 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn failing_detail_only_affects_that_item() -> anyhow::Result<()> {
    let (result, collector, server) = one_user(TestServerConfig {
        catalog_size: 5,
        failing_items: vec![3],
        ..TestServerConfig::default()
    })
    .await?;

    // ceil(5 × 0.9) = 5, so every item is sampled.
    anyhow::ensure!(result.user.succeeded);
    anyhow::ensure!(result.user.resources_visited == 4);
    anyhow::ensure!(server.stats().hits("/api/lessons/3/quiz") == 0);

    let item = collector
        .resource_snapshots()
        .into_iter()
        .find(|r| r.id == 3)
        .ok_or_else(|| anyhow::anyhow!("missing item 3"))?;
    anyhow::ensure!(item.visits == 1 && item.failures == 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn coverage_visits_exact_number_of_distinct_items() -> anyhow::Result<()> {
    let (result, collector, server) = one_user(TestServerConfig {
        catalog_size: 40,
        ..TestServerConfig::default()
    })
    .await?;

    anyhow::ensure!(result.user.resources_visited == 36);
    let items = collector.resource_snapshots();
    anyhow::ensure!(items.len() == 36);
    anyhow::ensure!(items.iter().all(|r| r.visits == 1));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unreachable_landing_is_fatal() -> anyhow::Result<()> {
    let port = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?.port();
    let (ctx, collector) = context(RunConfig {
        retry_attempts: 1,
        ..fast_config(&format!("http://127.0.0.1:{port}"))
    });

    let result = run_journey(ctx, SkillLevel::Advanced, 4).await;
    anyhow::ensure!(!result.user.succeeded);
    anyhow::ensure!(result.user.id == "advanced-4");
    anyhow::ensure!(result.user.actions == 1);

    let (total, _, failed) = collector.totals();
    anyhow::ensure!(total == 1 && failed == 1);
    Ok(())
}

//! The scripted virtual-user journey.
//!
//! Steps run strictly in order: landing, auth surface, catalog, coverage sampling, item details
//! (with their sub-resources), route sweep, endpoint sweep. Only the landing (transport failure)
//! and the catalog (non-2xx, or no usable item ids) are fatal; every other failure is recorded and
//! the journey moves on.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use swarm_http::HttpClient;
use swarm_metrics::Collector;

use crate::config::{RunConfig, SkillLevel, item_path};
use crate::executor::{RequestOutcome, TimedExecutor};
use crate::retry::RetryPolicy;
use crate::sampling::{sample_coverage, user_rng};
use crate::user::{Action, ActionKind, JourneyResult, VirtualUser};

/// Everything a journey needs, shared by all users of a run.
#[derive(Debug)]
pub struct JourneyContext {
    pub config: Arc<RunConfig>,
    pub executor: TimedExecutor,
    pub collector: Arc<Collector>,
}

impl JourneyContext {
    pub fn new(config: Arc<RunConfig>, client: Arc<HttpClient>, collector: Arc<Collector>) -> Self {
        let executor = TimedExecutor::new(
            client,
            config.request_timeout,
            RetryPolicy::new(config.retry_attempts, config.retry_delay),
        );
        Self {
            config,
            executor,
            collector,
        }
    }
}

/// Drives one user's journey to completion. Never fails; a fatal step ends the journey early
/// and leaves the user marked failed.
pub async fn run_journey(
    ctx: Arc<JourneyContext>,
    skill_level: SkillLevel,
    index: u64,
) -> JourneyResult {
    let mut rng = user_rng(ctx.config.seed, skill_level, index);
    let mut journey = Journey {
        ctx: &ctx,
        user: VirtualUser::new(skill_level, index),
        requests: 0,
    };

    if let Err(reason) = journey.run(&mut rng).await {
        journey.user.set_failure(reason);
    }
    journey.user.finish();

    JourneyResult::completed(&journey.user)
}

/// Extracts item ids from a catalog body: a non-empty JSON array of objects with an integer `id`.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<u64>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|err| format!("catalog is not valid JSON: {err}"))?;
    let Some(items) = value.as_array() else {
        return Err("catalog is not a JSON array".to_string());
    };
    if items.is_empty() {
        return Err("catalog is empty".to_string());
    }

    let mut seen = HashSet::new();
    let ids: Vec<u64> = items
        .iter()
        .filter_map(|item| item.get("id")?.as_u64())
        .filter(|id| seen.insert(*id))
        .collect();
    if ids.is_empty() {
        return Err("catalog items carry no integer ids".to_string());
    }
    Ok(ids)
}

struct Journey<'a> {
    ctx: &'a JourneyContext,
    user: VirtualUser,
    requests: u64,
}

impl Journey<'_> {
    /// `Err` carries the reason of the fatal failure that stopped the journey.
    async fn run(&mut self, rng: &mut StdRng) -> Result<(), String> {
        let ctx = self.ctx;
        let surface = &ctx.config.surface;

        // Landing: fatal only when the target cannot be reached at all.
        let landing = self.fetch(&surface.landing_route).await;
        if !landing.reached() {
            let reason = format!(
                "landing unreachable: {}",
                landing.error.as_deref().unwrap_or("no response")
            );
            self.note(ActionKind::Route, &surface.landing_route, &landing, false, true);
            return Err(reason);
        }
        self.note(
            ActionKind::Route,
            &surface.landing_route,
            &landing,
            landing.succeeded,
            false,
        );
        if landing.succeeded {
            self.user.visited_routes.insert(surface.landing_route.clone());
        }

        self.visit_route(&surface.auth_route).await;

        let catalog = self.fetch(&surface.catalog_endpoint).await;
        let ids = if catalog.is_2xx() {
            parse_catalog(&catalog.body)
        } else {
            Err(match (catalog.status, catalog.error.as_deref()) {
                (Some(status), _) => format!("catalog returned status {status}"),
                (None, Some(err)) => format!("catalog request failed: {err}"),
                (None, None) => "catalog request failed".to_string(),
            })
        };
        let ids = match ids {
            Ok(ids) => {
                self.note(ActionKind::Catalog, &surface.catalog_endpoint, &catalog, true, false);
                ids
            }
            Err(reason) => {
                self.note(ActionKind::Catalog, &surface.catalog_endpoint, &catalog, false, true);
                return Err(reason);
            }
        };

        let sampled = sample_coverage(&ids, ctx.config.coverage_fraction, rng);
        for id in &sampled {
            self.visit_item(*id).await;
        }

        for route in &surface.secondary_routes {
            self.visit_route(route).await;
        }

        for endpoint in &surface.auxiliary_endpoints {
            self.visit_soft(ActionKind::Endpoint, endpoint).await;
        }

        let pool: Vec<u64> = if self.user.visited_resource_ids.is_empty() {
            sampled
        } else {
            self.user.visited_resource_ids.iter().copied().collect()
        };
        let picks: Vec<u64> = pool
            .choose_multiple(rng, surface.resample_size)
            .copied()
            .collect();
        for id in picks {
            if let Some(template) = surface.sub_resources.choose(rng) {
                self.visit_soft(ActionKind::SubResource, &item_path(template, id))
                    .await;
            }
        }

        Ok(())
    }

    /// Detail visit plus, on 2xx, the item's sub-resources. Failures stay local to the item.
    async fn visit_item(&mut self, id: u64) {
        let ctx = self.ctx;
        let path = item_path(&ctx.config.surface.detail_endpoint, id);

        let detail = self.fetch(&path).await;
        let ok = detail.is_2xx();
        ctx.collector.record_resource_visit(id, ok);
        self.note(ActionKind::Detail, &path, &detail, ok, false);
        if !ok {
            return;
        }

        self.user.visited_resource_ids.insert(id);
        for template in &ctx.config.surface.sub_resources {
            self.visit_soft(ActionKind::SubResource, &item_path(template, id))
                .await;
        }
    }

    async fn visit_route(&mut self, route: &str) {
        if self.visit_soft(ActionKind::Route, route).await {
            self.user.visited_routes.insert(route.to_string());
        }
    }

    async fn visit_soft(&mut self, kind: ActionKind, path: &str) -> bool {
        let outcome = self.fetch(path).await;
        self.note(kind, path, &outcome, outcome.succeeded, false);
        outcome.succeeded
    }

    /// Issues one request, pausing first unless it is the user's first.
    async fn fetch(&mut self, path: &str) -> RequestOutcome {
        let delay = self.ctx.config.inter_action_delay;
        if self.requests > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.requests += 1;

        let outcome = self.ctx.executor.get(&self.ctx.config.url(path)).await;
        tracing::debug!(
            user = %self.user.id,
            path,
            status = ?outcome.status,
            duration_ms = outcome.duration_ms,
            attempts = outcome.attempts,
            "request"
        );
        outcome
    }

    fn note(
        &mut self,
        kind: ActionKind,
        path: &str,
        outcome: &RequestOutcome,
        succeeded: bool,
        fatal: bool,
    ) {
        self.ctx
            .collector
            .record_target(path, outcome.duration_ms, succeeded);
        self.user.record(Action {
            kind,
            target: path.to_string(),
            succeeded,
            fatal,
            status: outcome.status,
            duration_ms: outcome.duration_ms,
        });
    }
}

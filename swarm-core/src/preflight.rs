use swarm_http::{HttpClient, HttpRequest};

use crate::config::RunConfig;
use crate::error::{Error, Result};

/// One GET to the landing route, no retries. Any HTTP status means the target is reachable.
pub async fn preflight(client: &HttpClient, config: &RunConfig) -> Result<u16> {
    let url = config.url(&config.surface.landing_route);
    let req = HttpRequest::get(url.clone()).with_timeout(config.request_timeout);

    match client.request(req).await {
        Ok(res) => {
            tracing::info!(%url, status = res.status, "target reachable");
            Ok(res.status)
        }
        Err(err) => Err(Error::TargetUnreachable {
            url,
            reason: err.to_string(),
        }),
    }
}

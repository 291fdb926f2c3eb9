use std::net::SocketAddr;

use swarm_testserver::{SubResource, TestServerConfig};
use tokio::net::TcpListener;

const USAGE: &str = "swarm-testserver\n\nUSAGE:\n  swarm-testserver [--bind 127.0.0.1:0] [--catalog-size N] [--catalog-status CODE] [--fail-quiz] [--fail-vocabulary] [--latency-ms N]\n\nOUTPUT:\n  Prints HTTP_URL=<url> to stdout once ready.";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let mut bind_addr: SocketAddr = "127.0.0.1:0".parse()?;
    let mut config = TestServerConfig::default();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| anyhow::anyhow!("{name} requires a value"))
        };
        match arg.as_str() {
            "--bind" => bind_addr = value("--bind")?.parse()?,
            "--catalog-size" => config.catalog_size = value("--catalog-size")?.parse()?,
            "--catalog-status" => config.catalog_status = value("--catalog-status")?.parse()?,
            "--latency-ms" => {
                config.latency =
                    std::time::Duration::from_millis(value("--latency-ms")?.parse()?);
            }
            "--fail-quiz" => config.failing_sub_resource = Some(SubResource::Quiz),
            "--fail-vocabulary" => config.failing_sub_resource = Some(SubResource::Vocabulary),
            "-h" | "--help" => {
                eprintln!("{USAGE}");
                return Ok(());
            }
            other => {
                return Err(anyhow::anyhow!("unknown argument: {other}"));
            }
        }
    }

    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let stats = swarm_testserver::TestServerStats::default();
    let app = swarm_testserver::router(config, stats);

    println!("HTTP_URL=http://{addr}");

    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
    });

    serve.await?;
    Ok(())
}

use std::sync::atomic::{AtomicU32, Ordering};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::Redis;
use tokio::sync::OnceCell;

static NEXT_ID: AtomicU32 = AtomicU32::new(0);

/// Id unique within the test process and across concurrent test processes
/// sharing one Redis container.
pub fn unique_id(prefix: &str) -> String {
    let n = NEXT_ID.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, std::process::id(), n)
}

pub fn unique_session_id() -> String {
    unique_id("session")
}

pub struct RedisFixture {
    _container: ContainerAsync<Redis>,
    url: String
}

impl RedisFixture {
    pub fn url(&self) -> &str {
        &self.url
    }
}

static REDIS: OnceCell<Option<RedisFixture>> = OnceCell::const_new();

/// Shared Redis container for the test binary, or `None` when Docker is not
/// available. Started on first use.
pub async fn redis() -> Option<&'static RedisFixture> {
    REDIS
        .get_or_init(|| async {
            match start_redis().await {
                Ok(fixture) => {
                    tracing::info!(url = %fixture.url, "Redis fixture started");
                    Some(fixture)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis fixture unavailable");
                    None
                }
            }
        })
        .await
        .as_ref()
}

async fn start_redis() -> Result<RedisFixture, Box<dyn std::error::Error>> {
    let container = Redis::default().start().await?;
    let port = container.get_host_port_ipv4(6379).await?;
    let url = format!("redis://127.0.0.1:{}", port);

    ping(&url).await?;
    Ok(RedisFixture {
        _container: container,
        url
    })
}

async fn ping(url: &str) -> Result<(), redis::RedisError> {
    let client = redis::Client::open(url)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;
    Ok(())
}

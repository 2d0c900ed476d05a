//! Order worker demo.
//!
//! Publishes a handful of orders, then consumes them as one member of the
//! `orders-group` consumer group. Every few seconds it also takes over one
//! order left unacknowledged by a worker that died.
//!
//! # Usage
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7
//! REDIS_URL=redis://127.0.0.1:6379 WORKER_NAME=worker-1 \
//!   cargo run --bin order-worker
//! ```
//!
//! Start a second worker with a different `WORKER_NAME`, kill one of them
//! mid-run with `Ctrl-C` before it acknowledges, and watch the other one
//! reclaim its order. Gateway settings come from `STREAMGATE_*` variables.

use anyhow::Context;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use streamgate_core::{Gateway, GatewayConfig, Message, StartId};
use streamgate_redis::RedisLogStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STREAM: &str = "orders";
const ORDERS: usize = 5;
const RECLAIM_EVERY: Duration = Duration::from_secs(5);
const STALE_AFTER: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let worker = std::env::var("WORKER_NAME").unwrap_or_else(|_| "worker-1".to_string());
    let config = GatewayConfig::from_env().context("invalid STREAMGATE_* settings")?;

    let store = RedisLogStore::new(&url)
        .await
        .with_context(|| format!("cannot connect to {url}"))?;
    let gateway = Arc::new(Gateway::new(store, config)?);

    gateway.ensure_group(STREAM, StartId::Beginning, false).await?;
    publish_orders(&gateway).await?;

    let reclaimer = tokio::spawn(reclaim_loop(Arc::clone(&gateway), worker.clone()));

    {
        let mut messages = gateway.messages(STREAM, &worker);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                next = messages.next() => {
                    let Some(message) = next else { break };
                    let message = message?;
                    process(&worker, &message);
                    gateway.ack(STREAM, &[message.id]).await?;
                },
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break;
                },
            }
        }
    }

    reclaimer.abort();
    let status = gateway.status(STREAM).await?;
    info!(
        length = status.info.length,
        consumers = status.consumers.len(),
        pending = status.groups.iter().map(|group| group.pending).sum::<u64>(),
        "Final queue status"
    );

    gateway.close().await;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_worker=info,streamgate_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

async fn publish_orders(gateway: &Gateway<RedisLogStore>) -> anyhow::Result<()> {
    for n in 1..=ORDERS {
        let id = gateway
            .produce(STREAM, format!("order-{n}").as_bytes(), Some(10_000), true)
            .await?;
        info!(%id, "Order published");
    }
    Ok(())
}

fn process(worker: &str, message: &Message) {
    let order = message
        .payload()
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    info!(worker, id = %message.id, %order, "Order processed");
}

async fn reclaim_loop(gateway: Arc<Gateway<RedisLogStore>>, worker: String) {
    let mut tick = tokio::time::interval(RECLAIM_EVERY);
    loop {
        tick.tick().await;
        match gateway.reclaim_one(STREAM, &worker, STALE_AFTER).await {
            Ok(true) => info!(worker, "Took over a stale order"),
            Ok(false) => {},
            Err(e) if e.is_closed() => break,
            Err(e) => warn!(error = %e, "Reclaim failed"),
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use docket_db::DbPool;
use docket_notifications::{
    outbox, DispatchStore, Inbox, NotificationConfig, NotificationEvent, NotificationQueue,
    NotificationService, NotificationTask, NotificationWorker, OutboxRelay, PgDispatchStore,
    PgTargetStore, ResendService, TargetCleanup, TriggerInstance,
};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docket_worker=info,docket_notifications=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = NotificationConfig::from_env().context("Invalid notification configuration")?;

    let pool = docket_db::create_pool(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    docket_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database connection pool created");

    if cli.migrate {
        docket_db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    let service = Arc::new(NotificationService::from_pool(pool.clone(), &config));

    match cli.command {
        Commands::Run {
            poll_interval_ms,
            poll_batch,
            retry_interval_secs,
            retry_batch,
        } => {
            let relay = OutboxRelay::new(pool.clone(), service.clone())
                .with_poll_interval(Duration::from_millis(poll_interval_ms.max(1)))
                .with_batch_size(poll_batch);
            run(pool, service, relay, retry_interval_secs, retry_batch).await
        }
        Commands::Send {
            tag,
            kind,
            id,
            data,
            context,
            defer,
        } => {
            let event = build_event(&tag, &kind, &id, &data, &context)?;
            if defer {
                let mut conn = pool.acquire().await?;
                let outbox_id = outbox::stage(&mut *conn, &NotificationTask::Send(event)).await?;
                println!("{outbox_id}");
                return Ok(());
            }
            let summary = service.send_notifications(&event).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Resend {
            ids,
            all_prepared,
            limit,
        } => {
            let ids = if all_prepared {
                service.dispatcher().store().list_prepared(limit).await?
            } else {
                ids
            };
            if ids.is_empty() {
                bail!("No dispatch ids given");
            }
            let summary = service.resend_notifications(&ids).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Cleanup { kind, id } => {
            let cleanup = TargetCleanup::new(
                Arc::new(PgDispatchStore::new(pool.clone())),
                Arc::new(PgTargetStore::new(pool)),
            );
            let deleted = cleanup.forget_target(&kind, &id).await?;
            println!("{deleted}");
            Ok(())
        }
        Commands::Inbox { user_id, limit } => {
            let inbox = Inbox::new(Arc::new(PgDispatchStore::new(pool)));
            let unread = inbox.unread_count(user_id).await?;
            let entries = service.inbox_feed(user_id, Some(limit), None).await?;
            let listing = serde_json::json!({ "unread": unread, "notifications": entries });
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }
    }
}

/// Run the outbox relay, the queue worker fed by the retry sweep, and the
/// sweep itself until a shutdown signal arrives.
async fn run(
    pool: DbPool,
    service: Arc<NotificationService>,
    relay: OutboxRelay,
    retry_interval_secs: u64,
    retry_batch: i64,
) -> anyhow::Result<()> {
    let (queue, receiver) = NotificationQueue::channel();
    let cancel = CancellationToken::new();

    let relay_cancel = cancel.clone();
    let relay_handle = tokio::spawn(async move {
        relay.run(relay_cancel).await;
    });

    let worker = NotificationWorker::new(service);
    let worker_cancel = cancel.clone();
    let worker_handle = tokio::spawn(async move {
        worker.run(receiver, worker_cancel).await;
    });

    let sweep_handle = (retry_interval_secs > 0).then(|| {
        let resend = ResendService::new(Arc::new(PgDispatchStore::new(pool)), queue.clone());
        let sweep_cancel = cancel.clone();
        tokio::spawn(async move {
            sweep_prepared(
                resend,
                Duration::from_secs(retry_interval_secs),
                retry_batch,
                sweep_cancel,
            )
            .await;
        })
    });

    tracing::info!(retry_interval_secs, "Notification worker started");

    shutdown_signal().await;

    cancel.cancel();
    drop(queue);
    relay_handle.await.context("Outbox relay panicked")?;
    worker_handle.await.context("Notification worker panicked")?;
    if let Some(handle) = sweep_handle {
        handle.await.context("Retry sweep panicked")?;
    }
    tracing::info!("Notification worker stopped");
    Ok(())
}

async fn sweep_prepared(
    resend: ResendService,
    interval: Duration,
    batch: i64,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Retry sweep cancelled");
                break;
            }
            _ = ticker.tick() => {
                match resend.resend_all_prepared(batch).await {
                    Ok(0) => {}
                    Ok(queued) => tracing::info!(queued, "Re-queued prepared dispatches"),
                    Err(e) => tracing::error!(error = %e, "Failed to re-queue prepared dispatches"),
                }
            }
        }
    }
}

fn build_event(
    tag: &str,
    kind: &str,
    id: &str,
    data: &str,
    context: &str,
) -> anyhow::Result<NotificationEvent> {
    let data: Value = serde_json::from_str(data).context("--data must be valid JSON")?;
    let context: Map<String, Value> =
        serde_json::from_str(context).context("--context must be a JSON object")?;

    let mut event = NotificationEvent::new(tag, TriggerInstance::new(kind, id, data));
    event.context = context;
    Ok(event)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

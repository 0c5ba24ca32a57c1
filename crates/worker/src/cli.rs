use clap::{Parser, Subcommand};
use docket_core::types::DbId;

/// Docket notification worker.
#[derive(Parser)]
#[command(name = "docket-worker", version, about)]
pub struct Cli {
    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Apply pending migrations before running the command.
    #[arg(long)]
    pub migrate: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Relay outbox tasks and retry prepared dispatches until interrupted
    Run {
        /// Poll the outbox every N milliseconds
        #[arg(long, env = "NOTIFY_POLL_INTERVAL_MS", default_value = "1000")]
        poll_interval_ms: u64,
        /// Maximum outbox tasks claimed per poll
        #[arg(long, default_value = "50")]
        poll_batch: i64,
        /// Re-queue prepared dispatches every N seconds (0 disables)
        #[arg(long, env = "NOTIFY_RETRY_INTERVAL_SECS", default_value = "300")]
        retry_interval_secs: u64,
        /// Maximum dispatches re-queued per sweep
        #[arg(long, default_value = "500")]
        retry_batch: i64,
    },
    /// Raise a notification event and dispatch it
    Send {
        /// Runtime tag, e.g. `new_matter`
        #[arg(long)]
        tag: String,
        /// Instance kind, e.g. `matter`
        #[arg(long)]
        kind: String,
        /// Instance id
        #[arg(long)]
        id: String,
        /// Instance snapshot as a JSON object
        #[arg(long, default_value = "{}")]
        data: String,
        /// Event context as a JSON object
        #[arg(long, default_value = "{}")]
        context: String,
        /// Stage the event in the outbox for `run` instead of dispatching now
        #[arg(long)]
        defer: bool,
    },
    /// Deliver prepared dispatches again
    Resend {
        /// Dispatch ids
        #[arg(value_delimiter = ',')]
        ids: Vec<DbId>,
        /// Resend every prepared dispatch instead of the listed ids
        #[arg(long, conflicts_with = "ids")]
        all_prepared: bool,
        /// Maximum dispatches picked up with `--all-prepared`
        #[arg(long, default_value = "500")]
        limit: i64,
    },
    /// Delete the notifications of a removed target
    Cleanup {
        #[arg(long)]
        kind: String,
        #[arg(long)]
        id: String,
    },
    /// Print a user's unread count and latest notifications
    Inbox {
        #[arg(long)]
        user_id: DbId,
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

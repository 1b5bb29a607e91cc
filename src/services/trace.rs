//! Request trace recorder
//!
//! Fire-and-forget request logging. Records go through a bounded queue to a
//! background writer; a full or closed queue drops the record. Nothing here
//! ever reports an error to the request that produced the trace.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{DbPool, TraceRepository};
use crate::models::TraceRecord;

#[derive(Clone, Debug)]
pub struct TraceRecorder {
    sender: Option<mpsc::Sender<TraceRecord>>,
}

impl TraceRecorder {
    /// Start the background writer and return a handle for producers
    pub fn start(pool: DbPool, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_writer(pool, receiver));
        (
            Self {
                sender: Some(sender),
            },
            handle,
        )
    }

    /// A recorder that discards everything
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn trace(
        &self,
        method: &str,
        route: &str,
        actor_id: Option<Uuid>,
        origin: Option<String>,
    ) {
        let Some(ref sender) = self.sender else {
            return;
        };

        let record = TraceRecord::new(method, route, actor_id, origin);
        match sender.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!(
                    method = %record.method,
                    route = %record.route,
                    "Request trace queue full, dropping trace"
                );
            }
            Err(TrySendError::Closed(record)) => {
                warn!(
                    method = %record.method,
                    route = %record.route,
                    "Request trace writer stopped, dropping trace"
                );
            }
        }
    }
}

async fn run_writer(pool: DbPool, mut receiver: mpsc::Receiver<TraceRecord>) {
    info!("Request trace writer started");
    while let Some(record) = receiver.recv().await {
        if let Err(e) = TraceRepository::new(&pool).insert(&record).await {
            warn!(error = %e, route = %record.route, "Failed to persist request trace");
        } else {
            debug!(route = %record.route, "Request trace persisted");
        }
    }
    info!("Request trace writer stopped");
}

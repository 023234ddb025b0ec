use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::StoreInner;
use crate::utils::sleep_until_deadline;

pub(crate) enum WriteRequest {
    /// (Re)arm the single pending write
    Schedule(Duration),
    /// Write now if anything is pending, then acknowledge
    Flush(oneshot::Sender<()>),
}

/// Background writer owning the one pending-write slot of a store.
///
/// Each `Schedule` replaces the previous deadline, so a burst of saves
/// results in a single write once the burst settles.
pub(crate) async fn run(inner: Arc<StoreInner>, mut rx: mpsc::UnboundedReceiver<WriteRequest>) {
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            request = rx.recv() => match request {
                Some(WriteRequest::Schedule(delay)) => {
                    deadline = Some(Instant::now() + delay);
                }
                Some(WriteRequest::Flush(ack)) => {
                    deadline = None;
                    write(&inner).await;
                    let _ = ack.send(());
                }
                None => {
                    if deadline.take().is_some() {
                        write(&inner).await;
                    }
                    break;
                }
            },

            _ = sleep_until_deadline(deadline) => {
                deadline = None;
                write(&inner).await;
            }
        }
    }

    debug!("Writer for {:?} stopped", inner.path);
}

async fn write(inner: &Arc<StoreInner>) {
    let task_inner = inner.clone();
    match tokio::task::spawn_blocking(move || task_inner.write_pending()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to save {:?}: {}", inner.path, e),
        Err(e) => error!("Save task for {:?} failed: {}", inner.path, e),
    }
}

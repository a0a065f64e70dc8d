use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::{
    Mutex,
    mpsc::{self, Permit, error::TrySendError},
};
use tokio_util::sync::CancellationToken;

use crate::worker::{error::QueueError, types::AnalysisTask};

/// Sending half of the bounded task queue.
///
/// Every producer (socket ingress, HTTP handler) holds a clone. Once the gate is
/// closed no clone can enqueue again; tasks already queued stay for the consumer.
/// Capacity is reserved before the send lock is taken, so a producer waiting for
/// space never blocks `try_enqueue` or `close_gate`.
#[derive(Clone)]
pub struct TaskQueue {
    gate_open: Arc<AtomicBool>,
    gate_closed: CancellationToken,
    send_lock: Arc<Mutex<()>>,
    tx: mpsc::Sender<AnalysisTask>,
}

impl TaskQueue {
    pub fn new(tx: mpsc::Sender<AnalysisTask>) -> Self {
        Self {
            gate_open: Arc::new(AtomicBool::new(true)),
            gate_closed: CancellationToken::new(),
            send_lock: Arc::new(Mutex::new(())),
            tx,
        }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AnalysisTask>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    pub fn is_open(&self) -> bool {
        self.gate_open.load(Ordering::Acquire)
    }

    /// Waits for queue capacity. Closing the gate wakes a waiting producer with `Closed`.
    pub async fn enqueue(&self, task: AnalysisTask) -> Result<(), QueueError> {
        if !self.is_open() {
            return Err(QueueError::closed());
        }
        let permit = tokio::select! {
            biased;
            _ = self.gate_closed.cancelled() => return Err(QueueError::closed()),
            permit = self.tx.reserve() => {
                permit.map_err(|_| QueueError::receiver_dropped())?
            }
        };
        self.send_reserved(permit, task).await
    }

    /// Fails with `Full` instead of waiting for capacity.
    pub async fn try_enqueue(&self, task: AnalysisTask) -> Result<(), QueueError> {
        if !self.is_open() {
            return Err(QueueError::closed());
        }
        let permit = self.tx.try_reserve().map_err(|err| match err {
            TrySendError::Full(_) => QueueError::full(),
            TrySendError::Closed(_) => QueueError::receiver_dropped(),
        })?;
        self.send_reserved(permit, task).await
    }

    /// The gate is re-checked under the lock so nothing lands after `close_gate` returns.
    async fn send_reserved(
        &self,
        permit: Permit<'_, AnalysisTask>,
        task: AnalysisTask,
    ) -> Result<(), QueueError> {
        let _guard = self.send_lock.lock().await;
        if !self.is_open() {
            return Err(QueueError::closed());
        }
        permit.send(task);
        Ok(())
    }

    pub async fn close_gate(&self) {
        let _guard = self.send_lock.lock().await;
        self.gate_open.store(false, Ordering::Release);
        self.gate_closed.cancel();
    }
}

use std::sync::Arc;
use std::time::Duration;

use salon_backend::BoxFuture;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use super::failure::PollFailure;

/// What happened to one poll request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Applied(T),
    /// A newer request was issued meanwhile; the response was discarded.
    Stale,
    Failed(PollFailure),
    /// The engine no longer applies responses.
    Closed,
}

impl<T> PollOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Stale | Self::Failed(_) | Self::Closed => None,
        }
    }
}

/// One fixed-interval poll loop body.
pub trait PollTask: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// A closed task ends its loop at the next tick.
    fn is_closed(&self) -> bool;

    /// Issues one request and applies its response. Ticks may overlap.
    fn tick(&self) -> BoxFuture<'_, ()>;

    /// Invalidates every in-flight request of the task.
    fn retire(&self);
}

/// Running poll loop with explicit stop. Dropping the handle stops the loop as well.
pub struct PollHandle {
    name: &'static str,
    task: Arc<dyn PollTask>,
    cancel_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Spawns the loop; the first tick fires immediately.
    pub fn start<T>(task: Arc<T>, period: Duration) -> Self
    where
        T: PollTask,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let name = task.name();
        let worker = tokio::spawn(run_poll_loop(Arc::clone(&task), period, cancel_rx));

        Self {
            name,
            task,
            cancel_tx: Some(cancel_tx),
            worker: Some(worker),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stops ticking and discards every response still in flight.
    pub fn stop(&mut self) {
        if let Some(cancel_tx) = self.cancel_tx.take() {
            let _ = cancel_tx.send(());
            self.task.retire();
        }
    }

    /// Stops the loop and waits until its worker has exited.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(worker) = self.worker.take()
            && let Err(error) = worker.await
            && error.is_panic()
        {
            tracing::error!(poll = self.name, error = %error, "poll loop panicked");
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poll_loop<T>(task: Arc<T>, period: Duration, mut cancel_rx: oneshot::Receiver<()>)
where
    T: PollTask,
{
    let name = task.name();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // Requests of this loop still waiting for a response; dropped (aborted) on exit.
    let mut in_flight = JoinSet::new();

    tracing::info!(poll = name, period_ms = period.as_millis() as u64, "poll loop started");

    loop {
        tokio::select! {
            _ = &mut cancel_rx => break,
            _ = ticker.tick() => {
                if task.is_closed() {
                    tracing::info!(poll = name, "poll task closed");
                    break;
                }
                let task = Arc::clone(&task);
                in_flight.spawn(async move { task.tick().await });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(error) = joined
                    && error.is_panic()
                {
                    tracing::error!(poll = name, error = %error, "poll request panicked");
                }
            }
        }
    }

    in_flight.abort_all();
    tracing::info!(poll = name, "poll loop stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingTask {
        ticks: AtomicUsize,
        retired: AtomicUsize,
        closed: AtomicBool,
    }

    impl PollTask for CountingTask {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        fn tick(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move {
                self.ticks.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn retire(&self) {
            self.retired.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_fixed_interval_until_stopped() {
        let task = Arc::new(CountingTask::default());
        let handle = PollHandle::start(Arc::clone(&task), Duration::from_millis(1_000));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(task.ticks.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(task.ticks.load(Ordering::SeqCst), 3);
        assert_eq!(task.retired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_task_ends_its_loop() {
        let task = Arc::new(CountingTask::default());
        let handle = PollHandle::start(Arc::clone(&task), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(50)).await;
        task.closed.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(task.ticks.load(Ordering::SeqCst), 1);
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_loop() {
        let task = Arc::new(CountingTask::default());
        let handle = PollHandle::start(Arc::clone(&task), Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(handle);

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(task.ticks.load(Ordering::SeqCst), 1);
        assert_eq!(task.retired.load(Ordering::SeqCst), 1);
    }
}

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use praja_events::Subscription;
use praja_stock::Notification;

use crate::sink::NotificationSink;

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Forwards the ledger's notification feed to a sink, off the ledger's lock.
///
/// - Delivers in publication order
/// - A failing sink is logged and skipped; the ledger's own log is unaffected
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    /// Spawn a worker thread draining `subscription` into `sink`.
    ///
    /// `tick` bounds how long shutdown can take to be noticed.
    pub fn spawn<K>(
        name: &'static str,
        subscription: Subscription<Notification>,
        sink: K,
        tick: Duration,
    ) -> io::Result<WorkerHandle>
    where
        K: NotificationSink + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, subscription, shutdown_rx, &sink, tick))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<K>(
    name: &'static str,
    sub: Subscription<Notification>,
    shutdown_rx: mpsc::Receiver<()>,
    sink: &K,
    tick: Duration,
) where
    K: NotificationSink,
{
    debug!(worker = name, "notification worker started");

    loop {
        // Shutdown check (non-blocking)
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(notification) => {
                if let Err(err) = sink.deliver(&notification) {
                    warn!(
                        worker = name,
                        sequence = notification.sequence,
                        error = %err,
                        "notification sink delivery failed"
                    );
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(worker = name, "notification worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use praja_stock::StockLedger;

    use crate::sink::{MemorySink, SinkError};

    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done() {
            assert!(Instant::now() < deadline, "worker did not catch up within timeout");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn forwards_ledger_notifications_in_order() {
        let ledger = StockLedger::new();
        let sink = Arc::new(MemorySink::new());
        let handle = NotificationWorker::spawn(
            "test-notifications",
            ledger.subscribe(),
            Arc::clone(&sink),
            Duration::from_millis(10),
        )
        .unwrap();

        ledger.add_stock("Bolo", 2).unwrap();
        ledger.place_order("Bolo", 2);

        wait_for(|| sink.len() == 3);
        handle.shutdown();

        let delivered: Vec<_> = sink.delivered().into_iter().map(|n| n.event_type).collect();
        assert_eq!(
            delivered,
            vec![
                "stock.product.created",
                "stock.order.processed",
                "stock.product.auto_paused"
            ]
        );
        assert_eq!(sink.delivered(), ledger.notifications());
    }

    struct FlakySink {
        inner: MemorySink,
    }

    impl NotificationSink for FlakySink {
        fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
            if notification.sequence % 2 == 0 {
                return Err(SinkError::Unavailable("dashboard offline".to_string()));
            }
            self.inner.deliver(notification)
        }
    }

    #[test]
    fn failing_deliveries_do_not_stop_the_worker() {
        let ledger = StockLedger::new();
        let sink = Arc::new(FlakySink {
            inner: MemorySink::new(),
        });
        let handle = NotificationWorker::spawn(
            "flaky-notifications",
            ledger.subscribe(),
            Arc::clone(&sink),
            Duration::from_millis(10),
        )
        .unwrap();

        for _ in 0..4 {
            ledger.add_stock("Bolo", 1).unwrap();
        }

        wait_for(|| sink.inner.len() == 2);
        handle.shutdown();

        assert_eq!(ledger.notifications().len(), 4);
        let sequences: Vec<_> = sink.inner.delivered().iter().map(|n| n.sequence).collect();
        assert_eq!(sequences, vec![1, 3]);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::pipeline::{CycleReport, Watcher};

/// Events emitted after each cycle
#[derive(Debug, Clone)]
pub enum WatchEvent {
    CycleCompleted { new_papers: u32, failed: u32 },
    Error { message: String },
}

/// Cloneable handle used to request cycles and read the last result
#[derive(Clone)]
pub struct WatchHandle {
    trigger_tx: mpsc::Sender<()>,
    last_report: Arc<RwLock<Option<CycleReport>>>,
}

impl WatchHandle {
    /// Ask the service to run a cycle as soon as possible.
    /// Requests made while one is already queued are merged.
    pub fn trigger(&self) -> bool {
        match self.trigger_tx.try_send(()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("Cycle already queued");
                true
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("Watch service is not running");
                false
            }
        }
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }
}

/// Background service running the watcher on a schedule
pub struct WatchService {
    watcher: Arc<Watcher>,
    schedule: Option<Duration>,
    trigger_rx: mpsc::Receiver<()>,
    last_report: Arc<RwLock<Option<CycleReport>>>,
    event_tx: Option<mpsc::UnboundedSender<WatchEvent>>,
}

impl WatchService {
    /// Create the service and its handle. `schedule_minutes == 0` disables
    /// periodic cycles; the startup cycle and manual triggers still run.
    pub fn new(watcher: Arc<Watcher>, schedule_minutes: u64) -> (Self, WatchHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        let last_report = Arc::new(RwLock::new(None));

        let schedule =
            (schedule_minutes > 0).then(|| Duration::from_secs(schedule_minutes.saturating_mul(60)));

        let service = Self {
            watcher,
            schedule,
            trigger_rx,
            last_report: last_report.clone(),
            event_tx: None,
        };
        let handle = WatchHandle {
            trigger_tx,
            last_report,
        };

        (service, handle)
    }

    #[cfg(test)]
    fn with_period(mut self, period: Option<Duration>) -> Self {
        self.schedule = period;
        self
    }

    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<WatchEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: WatchEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send watch event: receiver dropped");
            }
        }
    }

    async fn run_once(&self, reason: &str) {
        debug!("Running {} cycle", reason);
        match self.watcher.run_cycle().await {
            Ok(report) => {
                info!("Cycle ({}): {}", reason, report.summary());
                let event = WatchEvent::CycleCompleted {
                    new_papers: report.new_papers,
                    failed: report.failures.len() as u32,
                };
                *self.last_report.write().await = Some(report);
                self.send_event(event);
            }
            Err(e) => {
                error!("Cycle ({}) failed: {}", reason, e);
                self.send_event(WatchEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    /// Run one cycle now, then keep running on schedule and on demand until
    /// shutdown is signalled. Cycles never overlap.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        match self.schedule {
            Some(period) => info!(
                "Watcher started: source={}, every {}s",
                self.watcher.source_name(),
                period.as_secs()
            ),
            None => info!(
                "Watcher started: source={}, periodic cycles disabled",
                self.watcher.source_name()
            ),
        }

        self.run_once("startup").await;

        // A period too far out to schedule behaves like no schedule
        let mut interval = self.schedule.and_then(|period| {
            let start = tokio::time::Instant::now().checked_add(period)?;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        });

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Watcher received shutdown signal");
                        break;
                    }
                }

                _ = next_tick(&mut interval) => {
                    self.run_once("scheduled").await;
                }

                Some(()) = self.trigger_rx.recv() => {
                    self.run_once("manual").await;
                }
            }
        }

        info!("Watcher stopped");
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::{Database, KeywordRepository};
    use crate::watcher::pipeline::testing::{paper, StaticSource};
    use tokio::time::timeout;

    async fn setup() -> (Arc<Watcher>, Arc<StaticSource>) {
        let db = Database::new_in_memory().await.unwrap();
        KeywordRepository::new(&db).add("ml").await.unwrap();

        let source = Arc::new(StaticSource::default().with("ml", vec![paper("alpha")]));
        let mut config = AppConfig::default();
        config.watch.keyword_pause_ms = 0;

        let watcher = Arc::new(Watcher::new(db, &config, source.clone(), None));
        (watcher, source)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<WatchEvent>) -> WatchEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_startup_and_manual_cycles() {
        let (watcher, source) = setup().await;
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (service, handle) = WatchService::new(watcher, 0);
        let task = tokio::spawn(service.with_event_sender(event_tx).run(shutdown_rx));

        match next_event(&mut event_rx).await {
            WatchEvent::CycleCompleted { new_papers, failed } => {
                assert_eq!(new_papers, 1);
                assert_eq!(failed, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(handle.last_report().await.unwrap().new_papers, 1);

        source
            .results
            .lock()
            .unwrap()
            .insert("ml".into(), vec![paper("alpha"), paper("beta")]);
        assert!(handle.trigger());

        match next_event(&mut event_rx).await {
            WatchEvent::CycleCompleted { new_papers, .. } => assert_eq!(new_papers, 1),
            other => panic!("unexpected event: {:?}", other),
        }

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(!handle.trigger());
    }

    #[tokio::test]
    async fn test_scheduled_cycles() {
        let (watcher, _source) = setup().await;
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (service, _handle) = WatchService::new(watcher, 15);
        let service = service
            .with_period(Some(Duration::from_millis(50)))
            .with_event_sender(event_tx);
        let task = tokio::spawn(service.run(shutdown_rx));

        // Startup cycle, then two scheduled ones
        for _ in 0..3 {
            assert!(matches!(
                next_event(&mut event_rx).await,
                WatchEvent::CycleCompleted { .. }
            ));
        }

        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_huge_schedule_saturates() {
        let (watcher, _source) = setup().await;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (service, _handle) = WatchService::new(watcher, u64::MAX);
        assert_eq!(service.schedule, Some(Duration::from_secs(u64::MAX)));

        let task = tokio::spawn(service.with_event_sender(event_tx).run(shutdown_rx));
        assert!(matches!(
            next_event(&mut event_rx).await,
            WatchEvent::CycleCompleted { .. }
        ));

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_stops_service() {
        let (watcher, _source) = setup().await;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (service, _handle) = WatchService::new(watcher, 0);
        let task = tokio::spawn(service.run(shutdown_rx));
        drop(shutdown_tx);

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
}

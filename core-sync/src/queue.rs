//! # Push Queue
//!
//! Runs pushes on one background task with a pending slot of depth one.
//!
//! Every [`schedule`](PushQueue::schedule) call gets a new generation
//! number. A snapshot still waiting when a newer one arrives is replaced, and
//! its ticket is satisfied by the push of the newer snapshot.
//!
//! Dropping the queue lets a push already in flight run to completion; a
//! snapshot that has not started yet is discarded and its ticket resolves to
//! [`SyncError::QueueClosed`].

use core_library::AlbumRecord;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, instrument};

use crate::adapter::{PushOutcome, SnapshotSink};
use crate::error::SyncError;

/// Last finished push.
#[derive(Debug, Clone)]
struct Completion {
    generation: u64,
    outcome: PushOutcome,
}

struct Shared {
    pending: Mutex<Option<(u64, Vec<AlbumRecord>)>>,
    generation: AtomicU64,
    wake: Notify,
    closed: AtomicBool,
    completed: watch::Sender<Completion>,
}

/// Handle to await the push covering a scheduled snapshot.
#[derive(Debug)]
pub struct PushTicket {
    generation: u64,
    completed: watch::Receiver<Completion>,
}

impl PushTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for a push whose generation is at least this ticket's.
    pub async fn wait(mut self) -> PushOutcome {
        let generation = self.generation;
        match self
            .completed
            .wait_for(|completion| completion.generation >= generation)
            .await
        {
            Ok(completion) => completion.outcome.clone(),
            Err(_) => PushOutcome::Failed(SyncError::QueueClosed),
        }
    }
}

pub struct PushQueue {
    shared: Arc<Shared>,
}

impl PushQueue {
    /// Start the worker task. Must be called within a Tokio runtime.
    pub fn new(sink: Arc<dyn SnapshotSink>, event_bus: EventBus) -> Self {
        let (completed, _) = watch::channel(Completion {
            generation: 0,
            outcome: PushOutcome::Skipped,
        });

        let shared = Arc::new(Shared {
            pending: Mutex::new(None),
            generation: AtomicU64::new(0),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
            completed,
        });

        tokio::spawn(run_worker(shared.clone(), sink, event_bus));
        Self { shared }
    }

    /// Queue a snapshot, replacing any snapshot not yet started.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn schedule(&self, records: Vec<AlbumRecord>) -> PushTicket {
        let generation = {
            let mut pending = self.shared.pending.lock().await;
            let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((superseded, _)) = pending.replace((generation, records)) {
                debug!(superseded, generation, "Coalesced pending snapshot");
            }
            generation
        };

        self.shared.wake.notify_one();
        PushTicket {
            generation,
            completed: self.shared.completed.subscribe(),
        }
    }

    /// Generation of the most recently scheduled snapshot.
    pub fn latest_generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Whether every scheduled snapshot has been pushed.
    pub fn is_idle(&self) -> bool {
        self.shared.completed.borrow().generation >= self.latest_generation()
    }

    /// Wait until every snapshot scheduled so far has been pushed, returning
    /// the last outcome, or `None` if nothing was ever scheduled.
    pub async fn wait_idle(&self) -> Option<PushOutcome> {
        let target = self.latest_generation();
        if target == 0 {
            return None;
        }

        let ticket = PushTicket {
            generation: target,
            completed: self.shared.completed.subscribe(),
        };
        Some(ticket.wait().await)
    }
}

impl Drop for PushQueue {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }
}

async fn run_worker(shared: Arc<Shared>, sink: Arc<dyn SnapshotSink>, event_bus: EventBus) {
    loop {
        if shared.closed.load(Ordering::SeqCst) {
            if let Some((generation, _)) = shared.pending.lock().await.take() {
                debug!(generation, "Queue closed, discarding unstarted snapshot");
            }
            return;
        }

        let next = shared.pending.lock().await.take();
        let Some((generation, records)) = next else {
            shared.wake.notified().await;
            continue;
        };

        let _ = event_bus.emit(CoreEvent::Sync(SyncEvent::PushStarted {
            generation,
            album_count: records.len(),
        }));

        let outcome = sink.push(&records).await;

        let event = match &outcome {
            PushOutcome::Published { version } => SyncEvent::PushSucceeded {
                generation,
                version: version.clone(),
            },
            PushOutcome::Skipped => SyncEvent::PushSkipped { generation },
            PushOutcome::Failed(e) => SyncEvent::PushFailed {
                generation,
                message: e.to_string(),
                kind: e.kind().to_string(),
            },
        };
        let _ = event_bus.emit(CoreEvent::Sync(event));

        debug!(generation, published = outcome.is_published(), "Push finished");
        shared.completed.send_replace(Completion {
            generation,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Sink that blocks each push until released.
    struct GatedSink {
        started: Notify,
        release: Semaphore,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        pushed: Mutex<Vec<usize>>,
    }

    impl GatedSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Notify::new(),
                release: Semaphore::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                pushed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SnapshotSink for GatedSink {
        async fn push(&self, records: &[AlbumRecord]) -> PushOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.started.notify_one();

            if let Ok(permit) = self.release.acquire().await {
                permit.forget();
            }

            self.pushed.lock().await.push(records.len());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            PushOutcome::Published {
                version: format!("v{}", records.len()),
            }
        }
    }

    fn snapshot(len: usize) -> Vec<AlbumRecord> {
        use chrono::{NaiveDate, TimeZone, Utc};
        use core_library::{AlbumDraft, AlbumId};

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let draft = AlbumDraft::new(
                    format!("Album {}", i),
                    "Artist",
                    "Rock",
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    5,
                );
                AlbumRecord::from_draft(AlbumId::new(), draft, t0)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_push_resolves_ticket() {
        let sink = GatedSink::new();
        sink.release.add_permits(1);
        let queue = PushQueue::new(sink.clone(), EventBus::new(16));

        let ticket = queue.schedule(snapshot(2)).await;
        assert_eq!(ticket.generation(), 1);
        assert_eq!(
            ticket.wait().await,
            PushOutcome::Published {
                version: "v2".to_string()
            }
        );
        assert!(queue.is_idle());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_burst_coalesces_and_never_overlaps() {
        let sink = GatedSink::new();
        let bus = EventBus::new(64);
        let queue = PushQueue::new(sink.clone(), bus.clone());

        let first = queue.schedule(snapshot(1)).await;
        sink.started.notified().await;

        let second = queue.schedule(snapshot(2)).await;
        let third = queue.schedule(snapshot(3)).await;
        let fourth = queue.schedule(snapshot(4)).await;
        assert!(!queue.is_idle());

        sink.release.add_permits(10);

        assert!(first.wait().await.is_published());
        assert_eq!(
            second.wait().await,
            PushOutcome::Published {
                version: "v4".to_string()
            }
        );
        assert!(third.wait().await.is_published());
        assert!(fourth.wait().await.is_published());

        assert_eq!(*sink.pushed.lock().await, vec![1, 4]);
        assert_eq!(sink.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_wait_idle() {
        let sink = GatedSink::new();
        sink.release.add_permits(5);
        let queue = PushQueue::new(sink.clone(), EventBus::new(16));

        assert!(queue.wait_idle().await.is_none());

        queue.schedule(snapshot(1)).await;
        queue.schedule(snapshot(2)).await;
        assert!(queue.wait_idle().await.unwrap().is_published());
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_events_emitted() {
        let sink = GatedSink::new();
        sink.release.add_permits(1);
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let queue = PushQueue::new(sink, bus);

        queue.schedule(snapshot(3)).await.wait().await;

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Sync(SyncEvent::PushStarted {
                generation: 1,
                album_count: 3
            })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Sync(SyncEvent::PushSucceeded {
                generation: 1,
                version: "v3".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_dropped_queue_finishes_current_push() {
        let sink = GatedSink::new();
        let queue = PushQueue::new(sink.clone(), EventBus::new(16));

        let running = queue.schedule(snapshot(1)).await;
        sink.started.notified().await;
        let waiting = queue.schedule(snapshot(2)).await;
        drop(queue);

        sink.release.add_permits(1);
        assert_eq!(
            running.wait().await,
            PushOutcome::Published {
                version: "v1".to_string()
            }
        );
        assert_eq!(waiting.wait().await, PushOutcome::Failed(SyncError::QueueClosed));
        assert_eq!(*sink.pushed.lock().await, vec![1]);
    }

    #[tokio::test]
    async fn test_dropped_idle_queue_stops_worker() {
        let sink = GatedSink::new();
        let queue = PushQueue::new(sink.clone(), EventBus::new(16));
        let mut completed = queue.shared.completed.subscribe();
        drop(queue);

        // The worker holds the only sender once the queue is gone.
        assert!(completed.changed().await.is_err());
        assert!(sink.pushed.lock().await.is_empty());
    }
}

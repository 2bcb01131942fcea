use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use buildpanel_core::{CommandUpdateEvent, EventSink};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type Handler = Arc<dyn Fn(&CommandUpdateEvent) + Send + Sync>;

/// Returned by [`UpdateBroadcaster::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    handler: Handler,
}

struct Inner {
    queue_tx: mpsc::UnboundedSender<CommandUpdateEvent>,
    queue_rx: Mutex<mpsc::UnboundedReceiver<CommandUpdateEvent>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    published: Notify,
}

/// Fan-out from any number of running commands to any number of observers.
///
/// Producers only enqueue, so publishing never blocks and never drops. Queued
/// events reach subscribers in arrival order when [`drain`](Self::drain) runs,
/// either from a UI tick or from [`spawn_dispatcher`](Self::spawn_dispatcher).
#[derive(Clone)]
pub struct UpdateBroadcaster {
    inner: Arc<Inner>,
}

impl Default for UpdateBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateBroadcaster {
    pub fn new() -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                queue_tx,
                queue_rx: Mutex::new(queue_rx),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                published: Notify::new(),
            }),
        }
    }

    pub fn publish(&self, ev: CommandUpdateEvent) {
        // The receiver lives as long as `inner`, so this cannot fail.
        let _ = self.inner.queue_tx.send(ev);
        self.inner.published.notify_one();
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&CommandUpdateEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers().push(Subscriber {
            id,
            active: Arc::new(AtomicBool::new(true)),
            handler: Arc::new(handler),
        });
        id
    }

    /// Idempotent. Safe to call from inside a handler: the handler sees no
    /// further events, including the rest of the batch being drained.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers();
        match subs.iter().position(|s| s.id == id) {
            Some(ix) => {
                let sub = subs.remove(ix);
                sub.active.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Deliver everything queued so far. Returns the number of events delivered.
    ///
    /// A drain already in progress (including one further up the stack, when a
    /// handler calls this) keeps delivering, so a nested call returns 0.
    pub fn drain(&self) -> usize {
        let mut rx = match self.inner.queue_rx.try_lock() {
            Ok(rx) => rx,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => return 0,
        };

        let mut delivered = 0;
        while let Ok(ev) = rx.try_recv() {
            self.deliver(&ev);
            delivered += 1;
        }
        delivered
    }

    /// Push delivery without a UI tick: drains on every publish until `cancel`
    /// fires, then drains once more.
    pub fn spawn_dispatcher(&self, handle: &Handle, cancel: CancellationToken) -> JoinHandle<()> {
        let bus = self.clone();
        handle.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = bus.inner.published.notified() => {
                        bus.drain();
                    }
                }
            }
            bus.drain();
        })
    }

    fn deliver(&self, ev: &CommandUpdateEvent) {
        // Snapshot so handlers can (un)subscribe without deadlocking.
        let snapshot = self.subscribers().clone();
        for sub in snapshot {
            if sub.active.load(Ordering::Acquire) {
                (sub.handler)(ev);
            }
        }
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for UpdateBroadcaster {
    fn publish(&self, event: CommandUpdateEvent) {
        UpdateBroadcaster::publish(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildpanel_core::{AppId, CommandId, CommandStatus};
    use std::sync::OnceLock;

    fn ev(n: usize) -> CommandUpdateEvent {
        CommandUpdateEvent::new(
            AppId::from("a"),
            CommandId::from("c"),
            CommandStatus::Running,
            n.to_string(),
        )
    }

    fn recorder(bus: &UpdateBroadcaster) -> (SubscriptionId, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = bus.subscribe(move |e| sink.lock().unwrap().push(e.output.clone()));
        (id, seen)
    }

    #[test]
    fn every_subscriber_sees_events_in_publish_order() {
        let bus = UpdateBroadcaster::new();
        let (_a, seen_a) = recorder(&bus);
        let (_b, seen_b) = recorder(&bus);

        for n in 0..5 {
            bus.publish(ev(n));
        }
        assert_eq!(bus.drain(), 5);

        let expected: Vec<String> = (0..5).map(|n| n.to_string()).collect();
        assert_eq!(*seen_a.lock().unwrap(), expected);
        assert_eq!(*seen_b.lock().unwrap(), expected);
    }

    #[test]
    fn nothing_is_delivered_before_drain() {
        let bus = UpdateBroadcaster::new();
        let (_id, seen) = recorder(&bus);
        bus.publish(ev(1));
        assert!(seen.lock().unwrap().is_empty());
        bus.drain();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let bus = UpdateBroadcaster::new();
        let (id, seen) = recorder(&bus);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(ev(1));
        bus.drain();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribing_inside_a_handler_stops_the_rest_of_the_batch() {
        let bus = UpdateBroadcaster::new();
        let own_id: Arc<OnceLock<SubscriptionId>> = Arc::new(OnceLock::new());
        let calls = Arc::new(Mutex::new(0usize));

        let id = {
            let bus_in = bus.clone();
            let own_id = own_id.clone();
            let calls = calls.clone();
            bus.subscribe(move |_| {
                *calls.lock().unwrap() += 1;
                if let Some(id) = own_id.get() {
                    bus_in.unsubscribe(*id);
                }
            })
        };
        own_id.set(id).unwrap();

        for n in 0..3 {
            bus.publish(ev(n));
        }
        bus.drain();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn later_subscriber_in_same_batch_still_receives_when_earlier_one_leaves() {
        let bus = UpdateBroadcaster::new();
        let first_id: Arc<OnceLock<SubscriptionId>> = Arc::new(OnceLock::new());
        let id = {
            let bus_in = bus.clone();
            let first_id = first_id.clone();
            bus.subscribe(move |_| {
                if let Some(id) = first_id.get() {
                    bus_in.unsubscribe(*id);
                }
            })
        };
        first_id.set(id).unwrap();
        let (_b, seen) = recorder(&bus);

        bus.publish(ev(1));
        bus.publish(ev(2));
        bus.drain();
        assert_eq!(*seen.lock().unwrap(), vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn nested_drain_is_a_no_op_and_republished_events_are_delivered() {
        let bus = UpdateBroadcaster::new();
        let nested = Arc::new(Mutex::new(Vec::new()));
        {
            let bus_in = bus.clone();
            let nested = nested.clone();
            bus.subscribe(move |e| {
                nested.lock().unwrap().push(bus_in.drain());
                if e.output == "0" {
                    bus_in.publish(ev(99));
                }
            });
        }
        let (_id, seen) = recorder(&bus);

        bus.publish(ev(0));
        assert_eq!(bus.drain(), 2);
        assert_eq!(*nested.lock().unwrap(), vec![0, 0]);
        assert_eq!(*seen.lock().unwrap(), vec!["0".to_string(), "99".to_string()]);
    }

    #[tokio::test]
    async fn dispatcher_delivers_without_explicit_drain() {
        let bus = UpdateBroadcaster::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.subscribe(move |e| {
            let _ = tx.send(e.output.clone());
        });

        let cancel = CancellationToken::new();
        let task = bus.spawn_dispatcher(&Handle::current(), cancel.clone());

        bus.publish(ev(7));
        let got = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some("7"));

        cancel.cancel();
        task.await.unwrap();
    }
}

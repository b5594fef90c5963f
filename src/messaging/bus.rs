// Event bus - typed publish/subscribe hub
// Every subscriber owns its own channel and drains it on its own thread

use crate::messaging::notification::{Notification, NotificationKind};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type SubscriberList = Mutex<Vec<Subscriber>>;

struct Subscriber {
    id: u64,
    kinds: Option<Vec<NotificationKind>>,
    tx: Sender<Notification>,
}

impl Subscriber {
    fn wants(&self, kind: NotificationKind) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&kind),
            None => true,
        }
    }
}

#[derive(Default)]
struct BusInner {
    subscribers: SubscriberList,
    next_id: AtomicU64,
}

/// Process-wide notification hub, cheap to clone
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every notification
    pub fn subscribe_all(&self) -> Subscription {
        self.register(None)
    }

    /// Subscribe to the given notification kinds only
    pub fn subscribe(&self, kinds: &[NotificationKind]) -> Subscription {
        self.register(Some(kinds.to_vec()))
    }

    fn register(&self, kinds: Option<Vec<NotificationKind>>) -> Subscription {
        let (tx, rx) = unbounded();

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.push(Subscriber { id, kinds, tx });
        }

        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a notification to every interested subscriber
    ///
    /// Never blocks: each subscriber channel is unbounded. Subscribers whose
    /// receiving end is gone are dropped from the list.
    pub fn publish(&self, notification: Notification) {
        let kind = notification.kind();

        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.retain(|subscriber| {
                if !subscriber.wants(kind) {
                    return true;
                }
                subscriber.tx.send(notification.clone()).is_ok()
            });
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

/// Receiving end of a bus subscription
///
/// Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    rx: Receiver<Notification>,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Receiver to use in `select!` or blocking loops
    pub fn receiver(&self) -> &Receiver<Notification> {
        &self.rx
    }

    /// Next pending notification, if any
    pub fn try_recv(&self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// All notifications pending right now
    pub fn drain(&self) -> Vec<Notification> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade()
            && let Ok(mut subscribers) = bus.subscribers.lock()
        {
            subscribers.retain(|subscriber| subscriber.id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let a = bus.subscribe_all();
        let b = bus.subscribe_all();

        bus.publish(Notification::PositionChanged(1));

        assert_eq!(a.drain(), vec![Notification::PositionChanged(1)]);
        assert_eq!(b.drain(), vec![Notification::PositionChanged(1)]);
    }

    #[test]
    fn test_filtered_subscription() {
        let bus = EventBus::new();
        let positions = bus.subscribe(&[NotificationKind::PositionChanged]);

        bus.publish(Notification::PlayStateChanged(true));
        bus.publish(Notification::PositionChanged(0));

        assert_eq!(positions.drain(), vec![Notification::PositionChanged(0)]);
    }

    #[test]
    fn test_order_is_preserved() {
        let bus = EventBus::new();
        let sub = bus.subscribe_all();

        for step in 0..8 {
            bus.publish(Notification::PositionChanged(step));
        }

        let received: Vec<_> = sub.drain();
        let expected: Vec<_> = (0..8).map(Notification::PositionChanged).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe_all();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);

        // Publishing with no subscribers is fine
        bus.publish(Notification::PlayStateChanged(false));
    }

    #[test]
    fn test_delivery_on_subscriber_thread() {
        let bus = EventBus::new();
        let sub = bus.subscribe(&[NotificationKind::PositionChanged]);

        let consumer = thread::spawn(move || {
            let mut seen = Vec::new();
            while let Ok(Notification::PositionChanged(step)) = sub.receiver().recv() {
                seen.push(step);
                if seen.len() == 3 {
                    break;
                }
            }
            seen
        });

        for step in 1..=3 {
            bus.publish(Notification::PositionChanged(step));
        }

        assert_eq!(consumer.join().unwrap(), vec![1, 2, 3]);
    }
}

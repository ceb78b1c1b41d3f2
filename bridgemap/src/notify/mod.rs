//! Viewport change notification.
//!
//! The map front end owns the actual event source (pan/zoom settling); this
//! module provides the explicit subscribe/unsubscribe seam between it and
//! the coordinator. [`ViewportNotifier`] fans settled-viewport events out to
//! subscribers over unbounded channels; [`ViewportDriver`] registers exactly
//! one subscription, forwards events into a [`FetchCoordinator`], and
//! deregisters it on teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coordinator::FetchCoordinator;
use crate::viewport::ViewportEvent;

/// Handle identifying one subscription on a [`ViewportNotifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out registry for settled-viewport events.
///
/// Thread-safe; the producing side calls [`notify`](Self::notify) from
/// whatever context observes map movement.
#[derive(Debug, Default)]
pub struct ViewportNotifier {
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<ViewportEvent>>>,
    next_id: AtomicU64,
}

impl ViewportNotifier {
    /// Create a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; returns its id and the receiving end.
    pub fn subscribe(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<ViewportEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().insert(id, tx);
        (SubscriptionId(id), rx)
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.lock().remove(&id.0).is_some()
    }

    /// Deliver an event to every live subscriber, pruning closed ones.
    pub fn notify(&self, event: ViewportEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|id, tx| {
            if tx.send(event).is_err() {
                debug!(subscription = id, "pruning closed viewport subscriber");
                false
            } else {
                true
            }
        });
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Drives a coordinator from viewport events until shut down.
///
/// Holds the single subscription the coordinator consumes; dropping events
/// into the notifier after [`shutdown`](Self::shutdown) no longer reaches
/// the coordinator, and the subscription is removed from the registry.
pub struct ViewportDriver {
    notifier: Arc<ViewportNotifier>,
    subscription: SubscriptionId,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl ViewportDriver {
    /// Subscribe to the notifier and spawn the forwarding task.
    pub fn spawn(notifier: Arc<ViewportNotifier>, coordinator: Arc<FetchCoordinator>) -> Self {
        let (subscription, mut rx) = notifier.subscribe();
        let shutdown = CancellationToken::new();

        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = rx.recv() => {
                        let Some(ViewportEvent { bounds, zoom }) = event else {
                            break;
                        };
                        if let Err(e) = coordinator.on_viewport_settled(&bounds, zoom).await {
                            warn!(zoom, error = %e, "viewport event rejected");
                        }
                    }
                }
            }
        });

        Self {
            notifier,
            subscription,
            shutdown,
            handle,
        }
    }

    /// Stop forwarding, deregister the subscription, and join the task.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.notifier.unsubscribe(self.subscription);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "viewport driver task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::MockTileFetcher;
    use crate::viewport::{GeoPoint, ViewportBounds};
    use std::time::Duration;

    fn sample_event() -> ViewportEvent {
        ViewportEvent {
            bounds: ViewportBounds::new(
                GeoPoint::new(84.62, -172.9),
                GeoPoint::new(84.70, -171.0),
            ),
            zoom: 9,
        }
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let notifier = ViewportNotifier::new();

        let (id, _rx) = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id), "double unsubscribe is false");
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_notify_fans_out_to_all_subscribers() {
        let notifier = ViewportNotifier::new();
        let (_id_a, mut rx_a) = notifier.subscribe();
        let (_id_b, mut rx_b) = notifier.subscribe();

        notifier.notify(sample_event());

        assert_eq!(rx_a.try_recv().unwrap(), sample_event());
        assert_eq!(rx_b.try_recv().unwrap(), sample_event());
    }

    #[test]
    fn test_notify_prunes_dropped_receivers() {
        let notifier = ViewportNotifier::new();
        let (_id, rx) = notifier.subscribe();
        drop(rx);

        notifier.notify(sample_event());

        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_driver_forwards_events_to_coordinator() {
        let notifier = Arc::new(ViewportNotifier::new());
        let fetcher = Arc::new(MockTileFetcher::empty());
        let coordinator = Arc::new(FetchCoordinator::new(fetcher.clone()));

        let driver = ViewportDriver::spawn(notifier.clone(), coordinator.clone());
        assert_eq!(notifier.subscriber_count(), 1);

        notifier.notify(sample_event());

        // Wait for the forwarding task to process the event
        for _ in 0..100 {
            if fetcher.call_count() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(coordinator.filters(), crate::filter::FilterSettings::default());

        driver.shutdown().await;
        assert_eq!(notifier.subscriber_count(), 0, "driver deregisters");
    }

    #[tokio::test]
    async fn test_events_after_shutdown_are_not_forwarded() {
        let notifier = Arc::new(ViewportNotifier::new());
        let fetcher = Arc::new(MockTileFetcher::empty());
        let coordinator = Arc::new(FetchCoordinator::new(fetcher.clone()));

        let driver = ViewportDriver::spawn(notifier.clone(), coordinator);
        driver.shutdown().await;

        notifier.notify(sample_event());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(fetcher.call_count(), 0);
    }
}

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{EventName, EventRef, HandlerRef, Result, bus::EventBus};

/// Decorator that serializes every bus operation behind a single lock.
///
/// At most one of `subscribe`, `unsubscribe` and `publish` runs on the
/// wrapped bus at a time, and a publish holds the lock for its entire
/// duration, handler execution included. A publish therefore observes a
/// subscription snapshot that cannot change mid-call.
///
/// The trade-off is full serialization: one slow handler blocks every
/// other operation on the bus. Use [`ConcurrentBus`] when publishes must
/// proceed in parallel.
///
/// [`ConcurrentBus`]: crate::ConcurrentBus
pub struct LockedBus<B> {
    inner: B,
    lock: Mutex<()>,
}

impl<B: EventBus> LockedBus<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }
}

impl<B: EventBus + Default> Default for LockedBus<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

#[async_trait]
impl<B: EventBus> EventBus for LockedBus<B> {
    async fn subscribe(&self, handler: HandlerRef, events: &[EventName]) {
        let _guard = self.lock.lock().await;
        self.inner.subscribe(handler, events).await;
    }

    async fn unsubscribe(&self, handler: &HandlerRef, events: &[EventName]) {
        let _guard = self.lock.lock().await;
        self.inner.unsubscribe(handler, events).await;
    }

    async fn publish(&self, event: EventRef) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.inner.publish(event).await
    }
}

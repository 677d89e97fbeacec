use std::sync::Arc;

use async_trait::async_trait;
use tokio::{
    select,
    sync::mpsc::{Receiver, Sender, channel},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{EventName, EventRef, HandlerRef, Result, bus::EventBus};

/// Buffer capacity used by [`QueuedBus::new`].
pub const DEFAULT_QUEUE_CAPACITY: usize = 50;

/// Decorator that buffers events and delivers them in the background.
///
/// `publish` enqueues the event and returns `Ok(())` without waiting for
/// delivery; it blocks only when the bounded buffer is full
/// (backpressure). A single drain task forwards buffered events FIFO to
/// the wrapped bus, so submission and delivery outcome are decoupled: a
/// delivery failure is logged and never reaches the original publisher.
///
/// Construction spawns the drain task, so it must happen inside a Tokio
/// runtime. After [`DrainHandle::cancel`] the buffer refuses new events;
/// `publish` then returns [`Error::Closed`].
///
/// [`Error::Closed`]: crate::Error::Closed
pub struct QueuedBus<B> {
    inner: Arc<B>,
    sender: Sender<EventRef>,
}

/// Control handle for a [`QueuedBus`] drain task.
pub struct DrainHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl DrainHandle {
    /// Signals the drain task to stop.
    ///
    /// Idempotent: callable any number of times from any call site; only
    /// the first call has an effect. The drain task finishes delivering
    /// every event that was already buffered before it exits.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancels the drain task and waits for it to flush and exit.
    pub async fn shutdown(self) -> Result<()> {
        self.token.cancel();
        self.task.await?;
        Ok(())
    }
}

impl<B: EventBus + 'static> QueuedBus<B> {
    /// Wraps `inner` with a buffer of [`DEFAULT_QUEUE_CAPACITY`] events.
    pub fn new(inner: B) -> (Self, DrainHandle) {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    /// Wraps `inner` with the given buffer capacity (clamped to 1).
    pub fn with_capacity(inner: B, capacity: usize) -> (Self, DrainHandle) {
        let capacity = capacity.max(1);
        let (sender, receiver) = channel::<EventRef>(capacity);
        let inner = Arc::new(inner);
        let token = CancellationToken::new();

        let task = tokio::spawn(drain(inner.clone(), receiver, token.clone()));

        (Self { inner, sender }, DrainHandle { token, task })
    }
}

async fn drain<B: EventBus>(bus: Arc<B>, mut receiver: Receiver<EventRef>, token: CancellationToken) {
    loop {
        select! {
            _ = token.cancelled() => break,
            next = receiver.recv() => match next {
                Some(event) => deliver(bus.as_ref(), event).await,
                // Bus handle dropped and the buffer is empty.
                None => return,
            },
        }
    }

    // Cancelled: refuse further enqueues, then flush what is buffered.
    receiver.close();
    while let Some(event) = receiver.recv().await {
        deliver(bus.as_ref(), event).await;
    }
}

async fn deliver<B: EventBus>(bus: &B, event: EventRef) {
    if let Err(err) = bus.publish(event).await {
        tracing::warn!(error = %err, "queued delivery failed");
    }
}

#[async_trait]
impl<B: EventBus> EventBus for QueuedBus<B> {
    async fn subscribe(&self, handler: HandlerRef, events: &[EventName]) {
        self.inner.subscribe(handler, events).await;
    }

    async fn unsubscribe(&self, handler: &HandlerRef, events: &[EventName]) {
        self.inner.unsubscribe(handler, events).await;
    }

    /// Enqueues the event for background delivery.
    ///
    /// Blocks only while the buffer is full. Errors from the wrapped
    /// bus's delivery are not observable here; the only error this method
    /// returns is [`Error::Closed`] after cancellation.
    ///
    /// [`Error::Closed`]: crate::Error::Closed
    async fn publish(&self, event: EventRef) -> Result<()> {
        self.sender.send(event).await?;
        Ok(())
    }
}

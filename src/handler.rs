use std::{future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{EventRef, Result};

/// Shared handle to a subscribed handler.
///
/// Handler identity is the `Arc` allocation: `unsubscribe` matches by
/// pointer, so keep the handle you subscribed with if you intend to remove
/// it later. Two independently constructed handlers are always distinct,
/// even when functionally identical.
pub type HandlerRef = Arc<dyn Handler>;

/// Something invocable with one event that optionally reports a failure.
///
/// Handlers must be `Send + Sync` because the concurrent and queued
/// strategies invoke them from spawned tasks. Return `Ok(())` on success
/// or an error to be routed through the bus's error hook.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: EventRef) -> Result<()>;
}

/// Function-backed handler.
///
/// Wraps a closure that creates a fresh future per event, so no shared
/// mutable state is required. Shared state, when needed, goes through an
/// explicit `Arc` inside the closure.
///
/// # Example
/// ```rust
/// use eventbus::{Event, EventRef, HandlerFn, HandlerRef};
///
/// let handler: HandlerRef = HandlerFn::arc(|event: EventRef| async move {
///     println!("got {}", event.event_name());
///     Ok(())
/// });
/// ```
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(EventRef) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn handle(&self, event: EventRef) -> Result<()> {
        (self.f)(event).await
    }
}

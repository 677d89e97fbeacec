use async_trait::async_trait;
use tokio::{sync::RwLock, task::JoinSet};

use crate::{
    Error, Event, EventName, EventRef, HandlerRef, Result,
    bus::{EventBus, EventNameResolver, PublishErrorHook, default_name_resolver, propagate_error},
    internal::Registry,
};

/// Fan-out dispatch strategy.
///
/// `publish` spawns every matched handler (named bucket and wildcard
/// bucket) as its own task and waits for all of them to finish before
/// returning. No ordering exists among the handlers of one publish; each
/// subscription occurrence still sees the event exactly once.
///
/// Subscription state lives behind a reader/writer lock. The read lock
/// covers only the bucket lookup, never the handler join, so concurrent
/// publishes do not serialize behind each other's handlers.
///
/// Error policy: every handler runs to completion, then the first error
/// observed while joining is routed through the error hook. Which error
/// is "first" among concurrently failing handlers is a race and is
/// deliberately left nondeterministic. A handler task that panics joins
/// as [`Error::Join`].
pub struct ConcurrentBus {
    registry: RwLock<Registry>,
    name_resolver: EventNameResolver,
    error_hook: Option<PublishErrorHook>,
}

impl ConcurrentBus {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            name_resolver: default_name_resolver,
            error_hook: None,
        }
    }

    /// Installs the hook consulted when a joined handler failed.
    pub fn with_error_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(Error, &dyn Event) -> Option<Error> + Send + Sync + 'static,
    {
        self.error_hook = Some(std::sync::Arc::new(hook));
        self
    }

    /// Replaces the default [`Event::event_name`] routing derivation.
    pub fn with_name_resolver(mut self, resolver: EventNameResolver) -> Self {
        self.name_resolver = resolver;
        self
    }
}

impl Default for ConcurrentBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for ConcurrentBus {
    async fn subscribe(&self, handler: HandlerRef, events: &[EventName]) {
        self.registry.write().await.subscribe(handler, events);
    }

    async fn unsubscribe(&self, handler: &HandlerRef, events: &[EventName]) {
        self.registry.write().await.unsubscribe(handler, events);
    }

    async fn publish(&self, event: EventRef) -> Result<()> {
        let name = (self.name_resolver)(event.as_ref());
        let handlers = self.registry.read().await.matching(&name);
        if handlers.is_empty() {
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        for handler in handlers {
            let event = event.clone();
            tasks.spawn(async move { handler.handle(event).await });
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.unwrap_or_else(|e| Err(Error::from(e)));
            if let Err(err) = result {
                let _ = first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => {
                match propagate_error(self.error_hook.as_ref(), err, event.as_ref()) {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
            None => Ok(()),
        }
    }
}

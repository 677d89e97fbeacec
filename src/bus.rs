use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Event, EventName, EventRef, HandlerRef, Result};

/// Hook consulted when a handler fails during publish.
///
/// Invoked with the failing error and the event being dispatched.
/// Returning `None` suppresses the failure and lets dispatch continue;
/// returning `Some(err)` escalates it (possibly rewritten) to the
/// publisher, short-circuiting the remaining handlers.
pub type PublishErrorHook = Arc<dyn Fn(Error, &dyn Event) -> Option<Error> + Send + Sync>;

/// Injectable derivation of an event's routing name.
///
/// The default asks the event itself via [`Event::event_name`]. Supplying
/// a custom resolver lets tests and embedders rename categories without
/// touching the event types.
pub type EventNameResolver = fn(&dyn Event) -> EventName;

pub(crate) fn default_name_resolver(event: &dyn Event) -> EventName {
    event.event_name()
}

/// Shared contract of every dispatch strategy.
///
/// `publish` resolves the event's name, invokes every handler subscribed
/// under that name and then every wildcard handler, and routes handler
/// failures through the optional [`PublishErrorHook`]. How (and in what
/// order) the handlers run is the strategy's choice; see the individual
/// bus types.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Subscribes a handler under each of the given event names.
    ///
    /// With an empty `events` slice the handler lands in the wildcard
    /// bucket and receives every published event. Subscribing the same
    /// handle twice under the same name yields two invocations per
    /// publish; no de-duplication is performed.
    async fn subscribe(&self, handler: HandlerRef, events: &[EventName]);

    /// Removes every occurrence of the handler from the given buckets.
    ///
    /// With an empty `events` slice the handler is removed from every
    /// bucket, the wildcard one included. Matching is by pointer identity
    /// of the `Arc`, not by value.
    async fn unsubscribe(&self, handler: &HandlerRef, events: &[EventName]);

    /// Dispatches one event to its matching handlers.
    ///
    /// Returns `Ok(())` on full success or full suppression, and the first
    /// unrecovered handler error otherwise. Handlers that already ran are
    /// not rolled back.
    async fn publish(&self, event: EventRef) -> Result<()>;
}

/// Routes a handler failure through the optional hook.
///
/// Without a hook the error propagates unchanged. `None` from the hook
/// means "suppressed"; `Some` is the (possibly different) error the
/// publisher should see.
pub(crate) fn propagate_error(
    hook: Option<&PublishErrorHook>,
    err: Error,
    event: &dyn Event,
) -> Option<Error> {
    match hook {
        Some(hook) => hook(err, event),
        None => Some(err),
    }
}

use std::{borrow::Cow, collections::HashMap, future::Future, sync::Arc};

use crate::{
    Event, EventName, EventRef, HandlerFn, HandlerRef, Result, WILDCARD, bus::EventBus,
    event::downcast_arc,
};

/// Mapping from event name to the adapters generated for it, suitable for
/// bulk subscription into any bus.
pub type MappedHandlers = HashMap<EventName, Vec<HandlerRef>>;

/// Derives a handler mapping from typed handler functions.
///
/// Dispatch engines only deal in dynamically-typed events, but most
/// handlers care about one concrete event type. The resolver accepts
/// typed functions and wraps each in an adapter of the uniform
/// `(EventRef) -> Result` shape, keyed by the event name the function's
/// parameter type reports:
///
/// - [`on`](Self::on) takes a function of a concrete event type `T`; the
///   zero value of `T` is asked for its name, and the adapter registers
///   under it.
/// - [`on_any`](Self::on_any) takes a function of the dynamic event type;
///   since no concrete interest can be inferred, it registers under the
///   wildcard and receives everything.
///
/// An object with several handler methods resolves by listing each one:
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use eventbus::{DirectBus, EventRef, HandlerResolver};
/// # use eventbus::{Event, EventName};
/// # #[derive(Default)]
/// # struct OrderPlaced;
/// # impl Event for OrderPlaced {
/// #     fn event_name(&self) -> EventName { "order:placed".into() }
/// # }
/// # #[derive(Default)]
/// # struct OrderShipped;
/// # impl Event for OrderShipped {
/// #     fn event_name(&self) -> EventName { "order:shipped".into() }
/// # }
/// # struct Audit;
/// # impl Audit {
/// #     async fn on_placed(&self, _e: Arc<OrderPlaced>) -> eventbus::Result<()> { Ok(()) }
/// #     async fn on_shipped(&self, _e: Arc<OrderShipped>) -> eventbus::Result<()> { Ok(()) }
/// #     async fn on_everything(&self, _e: EventRef) -> eventbus::Result<()> { Ok(()) }
/// # }
/// # async fn demo(bus: DirectBus) {
/// let audit = Arc::new(Audit);
///
/// let a = audit.clone();
/// let b = audit.clone();
/// let c = audit.clone();
/// HandlerResolver::new()
///     .on(move |e: Arc<OrderPlaced>| { let a = a.clone(); async move { a.on_placed(e).await } })
///     .on(move |e: Arc<OrderShipped>| { let b = b.clone(); async move { b.on_shipped(e).await } })
///     .on_any(move |e: EventRef| { let c = c.clone(); async move { c.on_everything(e).await } })
///     .subscribe_into(&bus)
///     .await;
/// # }
/// ```
#[derive(Default)]
pub struct HandlerResolver {
    handlers: MappedHandlers,
}

impl HandlerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a handler for the concrete event type `T`, registered under
    /// the name a zero value of `T` reports.
    ///
    /// The generated adapter narrows the dynamically-typed event back to
    /// `T` at call time. A bus only ever invokes an adapter with an event
    /// matching the name it registered under, so narrowing must succeed;
    /// a mismatch means the adapter was routed a foreign event and the
    /// adapter panics rather than returning an error.
    pub fn on<T, F, Fut>(mut self, handler: F) -> Self
    where
        T: Event + Default,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = T::default().event_name();
        let adapter: HandlerRef =
            HandlerFn::arc(move |event: EventRef| handler(narrow::<T>(event)));
        self.handlers.entry(name).or_default().push(adapter);
        self
    }

    /// Accepts a handler interested in every event, registered under the
    /// wildcard. The event is forwarded unchanged.
    pub fn on_any<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(EventRef) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers
            .entry(Cow::Borrowed(WILDCARD))
            .or_default()
            .push(HandlerFn::arc(handler));
        self
    }

    /// Returns the derived mapping.
    pub fn resolve(self) -> MappedHandlers {
        self.handlers
    }

    /// Subscribes every generated adapter into the given bus; wildcard
    /// entries subscribe with zero names, named entries under their name.
    pub async fn subscribe_into<B: EventBus + ?Sized>(self, bus: &B) {
        for (name, adapters) in self.handlers {
            let events: &[EventName] = if name == WILDCARD {
                &[]
            } else {
                std::slice::from_ref(&name)
            };
            for adapter in adapters {
                bus.subscribe(adapter, events).await;
            }
        }
    }
}

fn narrow<T: Event>(event: EventRef) -> Arc<T> {
    let name = event.event_name();
    downcast_arc::<T>(event).unwrap_or_else(|| {
        panic!(
            "event '{name}' routed to an adapter expecting {}",
            std::any::type_name::<T>()
        )
    })
}

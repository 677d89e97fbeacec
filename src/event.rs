use std::{any::Any, borrow::Cow, sync::Arc};

/// String token naming an event category for routing purposes.
pub type EventName = Cow<'static, str>;

/// Reserved identifier whose bucket is matched against every published
/// event, regardless of its own name.
pub const WILDCARD: &str = "*";

/// Shared handle to a published event, as handlers receive it.
///
/// Events are shared rather than cloned because a single publish may hand
/// the same value to many handlers, possibly on different tasks.
pub type EventRef = Arc<dyn Event>;

/// Trait for values published on a bus.
///
/// Implement this for your event type (often a struct per event category).
/// Events must be `Send + Sync + 'static` because they cross task
/// boundaries during fan-out and queued delivery; the `Any` supertrait
/// lets typed handlers produced by [`HandlerResolver`] narrow an event
/// back to its concrete type.
///
/// # Event names
///
/// `event_name()` returns the identifier used for routing. Two events with
/// the same name belong to the same category no matter their payload. The
/// default implementation derives a deterministic, unique-per-type name
/// from the type path via `std::any::type_name`; override it when you want
/// a stable, human-chosen identifier:
///
/// ```rust
/// use eventbus::{Event, EventName};
///
/// #[derive(Default)]
/// struct OrderPlaced { order_id: u64 }
///
/// impl Event for OrderPlaced {
///     fn event_name(&self) -> EventName {
///         "order:placed".into()
///     }
/// }
/// ```
///
/// The bus never retains an event past the `publish` call that carried it.
///
/// [`HandlerResolver`]: crate::HandlerResolver
pub trait Event: Any + Send + Sync {
    /// Returns the identifier this event is routed under.
    fn event_name(&self) -> EventName {
        Cow::Borrowed(std::any::type_name::<Self>())
    }
}

impl dyn Event {
    /// Attempts to narrow a borrowed event to a concrete event type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

/// Narrows a shared event to a concrete type, keeping shared ownership.
pub(crate) fn downcast_arc<T: Event>(event: EventRef) -> Option<Arc<T>> {
    let any: Arc<dyn Any + Send + Sync> = event;
    any.downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainEvent;

    impl Event for PlainEvent {}

    struct NamedEvent;

    impl Event for NamedEvent {
        fn event_name(&self) -> EventName {
            "event:named".into()
        }
    }

    #[test]
    fn test_default_name_derives_from_type_path() {
        // The derived name includes the module path, so it is unique
        // per distinct type and stable across calls.
        assert!(PlainEvent.event_name().ends_with("PlainEvent"));
        assert_eq!(PlainEvent.event_name(), PlainEvent.event_name());
    }

    #[test]
    fn test_explicit_name_overrides_default() {
        assert_eq!(NamedEvent.event_name(), "event:named");
    }

    #[test]
    fn test_downcast_ref() {
        let event: EventRef = Arc::new(NamedEvent);
        assert!(event.downcast_ref::<NamedEvent>().is_some());
        assert!(event.downcast_ref::<PlainEvent>().is_none());
    }

    #[test]
    fn test_downcast_arc() {
        let event: EventRef = Arc::new(NamedEvent);
        assert!(downcast_arc::<NamedEvent>(event.clone()).is_some());
        assert!(downcast_arc::<PlainEvent>(event).is_none());
    }
}

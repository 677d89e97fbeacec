use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Error, Event, EventName, EventRef, HandlerRef, Result,
    bus::{EventBus, EventNameResolver, PublishErrorHook, default_name_resolver, propagate_error},
    internal::Registry,
};

/// Baseline sequential dispatch strategy.
///
/// `publish` snapshots the matching handlers (named bucket first, wildcard
/// after) and invokes them one by one in subscription order, stopping at
/// the first error the error hook does not suppress.
///
/// The registry lock here provides interior mutability only; it is never
/// held while handlers run, and nothing serializes a publish against a
/// concurrent subscribe or unsubscribe. A publish racing a mutation sees
/// either the old or the new handler set, with no further guarantee. Wrap
/// the bus in [`LockedBus`] when subscriptions change while publishing.
///
/// [`LockedBus`]: crate::LockedBus
pub struct DirectBus {
    registry: RwLock<Registry>,
    name_resolver: EventNameResolver,
    error_hook: Option<PublishErrorHook>,
}

impl DirectBus {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            name_resolver: default_name_resolver,
            error_hook: None,
        }
    }

    /// Installs the hook consulted when a handler fails.
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

impl Default for DirectBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for DirectBus {
    async fn subscribe(&self, handler: HandlerRef, events: &[EventName]) {
        self.registry.write().await.subscribe(handler, events);
    }

    async fn unsubscribe(&self, handler: &HandlerRef, events: &[EventName]) {
        self.registry.write().await.unsubscribe(handler, events);
    }

    async fn publish(&self, event: EventRef) -> Result<()> {
        let name = (self.name_resolver)(event.as_ref());
        let handlers = self.registry.read().await.matching(&name);

        for handler in handlers {
            if let Err(err) = handler.handle(event.clone()).await {
                if let Some(err) = propagate_error(self.error_hook.as_ref(), err, event.as_ref()) {
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::HandlerFn;

    #[derive(Default)]
    struct TestEventA;

    impl Event for TestEventA {
        fn event_name(&self) -> EventName {
            "event:test1".into()
        }
    }

    #[derive(Default)]
    struct TestEventB;

    impl Event for TestEventB {
        fn event_name(&self) -> EventName {
            "event:test2".into()
        }
    }

    fn counting_handler() -> (HandlerRef, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let handler: HandlerRef = HandlerFn::arc(move |_event: EventRef| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        (handler, count)
    }

    #[tokio::test]
    async fn test_publish_invokes_subscribed_handler_once() {
        let bus = DirectBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler, &["event:test1".into()]).await;

        bus.publish(Arc::new(TestEventA)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.publish(Arc::new(TestEventB)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_double_subscription_invokes_twice() {
        let bus = DirectBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler.clone(), &["event:test1".into()]).await;
        bus.subscribe(handler, &["event:test1".into()]).await;

        bus.publish(Arc::new(TestEventA)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resubscribe_and_partial_unsubscribe() {
        let bus = DirectBus::new();
        let (handler, count) = counting_handler();

        bus.subscribe(handler.clone(), &["event:test1".into()]).await;
        bus.publish(Arc::new(TestEventA)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.subscribe(handler.clone(), &["event:test2".into()]).await;
        bus.unsubscribe(&handler, &["event:test1".into()]).await;

        bus.publish(Arc::new(TestEventA)).await.unwrap();
        bus.publish(Arc::new(TestEventB)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_all_removes_wildcard_too() {
        let bus = DirectBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler.clone(), &["event:test1".into()]).await;
        bus.subscribe(handler.clone(), &[]).await;

        bus.unsubscribe(&handler, &[]).await;

        bus.publish(Arc::new(TestEventA)).await.unwrap();
        bus.publish(Arc::new(TestEventB)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_named_handlers_run_before_wildcard() {
        let bus = DirectBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let seen = order.clone();
        let wildcard: HandlerRef = HandlerFn::arc(move |_event: EventRef| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push("wildcard");
                Ok(())
            }
        });
        let seen = order.clone();
        let named: HandlerRef = HandlerFn::arc(move |_event: EventRef| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push("named");
                Ok(())
            }
        });

        // Wildcard subscribed first, but named buckets still go first.
        bus.subscribe(wildcard, &[]).await;
        bus.subscribe(named, &["event:test1".into()]).await;

        bus.publish(Arc::new(TestEventA)).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["named", "wildcard"]);
    }

    #[tokio::test]
    async fn test_error_stops_remaining_handlers() {
        let bus = DirectBus::new();
        let failing: HandlerRef =
            HandlerFn::arc(|_event: EventRef| async { Err(Error::handler("boom")) });
        let (rest, count) = counting_handler();
        bus.subscribe(failing, &["event:test1".into()]).await;
        bus.subscribe(rest, &["event:test1".into()]).await;

        let result = bus.publish(Arc::new(TestEventA)).await;
        assert_eq!(result, Err(Error::handler("boom")));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hook_suppression_continues_dispatch() {
        let bus = DirectBus::new().with_error_hook(|err, _event| match err {
            Error::Handler(msg) if msg.as_ref() == "boom" => None,
            other => Some(other),
        });
        let failing: HandlerRef =
            HandlerFn::arc(|_event: EventRef| async { Err(Error::handler("boom")) });
        let (rest, count) = counting_handler();
        bus.subscribe(failing, &["event:test1".into()]).await;
        bus.subscribe(rest, &["event:test1".into()]).await;

        let result = bus.publish(Arc::new(TestEventA)).await;
        assert_eq!(result, Ok(()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hook_escalation_rewrites_error() {
        let ran = Arc::new(AtomicUsize::new(0));
        let seen = ran.clone();
        let bus =
            DirectBus::new().with_error_hook(|_err, _event| Some(Error::handler("escalated")));
        let failing: HandlerRef = HandlerFn::arc(move |_event: EventRef| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err(Error::handler("boom"))
            }
        });
        bus.subscribe(failing, &["event:test1".into()]).await;

        let result = bus.publish(Arc::new(TestEventA)).await;
        assert_eq!(result, Err(Error::handler("escalated")));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_name_resolver() {
        fn fixed(_event: &dyn Event) -> EventName {
            "event:test2".into()
        }

        let bus = DirectBus::new().with_name_resolver(fixed);
        let (handler, count) = counting_handler();
        bus.subscribe(handler, &["event:test2".into()]).await;

        // Resolver overrides what the event reports about itself.
        bus.publish(Arc::new(TestEventA)).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

use std::{collections::HashMap, sync::Arc};

use crate::{EventName, HandlerRef, WILDCARD};

/// Mapping from event name to the ordered handlers subscribed under it,
/// with a dedicated wildcard bucket under [`WILDCARD`].
///
/// A name key exists only while its bucket is non-empty; removal deletes
/// buckets the moment they drain. Insertion order is preserved, which the
/// sequential strategies rely on for deterministic delivery.
#[derive(Default)]
pub(crate) struct Registry {
    buckets: HashMap<EventName, Vec<HandlerRef>>,
}

// Handler identity is the Arc allocation; the vtable half of the fat
// pointer is ignored on purpose (it is not guaranteed unique per impl).
fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl Registry {
    /// Appends the handler to each named bucket, or to the wildcard
    /// bucket when `events` is empty. Duplicate subscriptions stack.
    pub fn subscribe(&mut self, handler: HandlerRef, events: &[EventName]) {
        if events.is_empty() {
            self.buckets
                .entry(EventName::Borrowed(WILDCARD))
                .or_default()
                .push(handler);
            return;
        }
        for name in events {
            self.buckets
                .entry(name.clone())
                .or_default()
                .push(handler.clone());
        }
    }

    /// Removes all occurrences of the handler from the named buckets, or
    /// from every bucket when `events` is empty. Remaining handlers keep
    /// their relative order; emptied buckets are dropped.
    pub fn unsubscribe(&mut self, handler: &HandlerRef, events: &[EventName]) {
        if events.is_empty() {
            self.buckets.retain(|_, bucket| {
                bucket.retain(|h| !same_handler(h, handler));
                !bucket.is_empty()
            });
            return;
        }
        for name in events {
            if let Some(bucket) = self.buckets.get_mut(name) {
                bucket.retain(|h| !same_handler(h, handler));
                if bucket.is_empty() {
                    self.buckets.remove(name);
                }
            }
        }
    }

    /// Handlers in scope for one publish: the named bucket first, the
    /// wildcard bucket after. Cloned out so callers never hold a registry
    /// lock while handlers run.
    pub fn matching(&self, name: &str) -> Vec<HandlerRef> {
        let mut handlers = Vec::new();
        if let Some(bucket) = self.buckets.get(name) {
            handlers.extend(bucket.iter().cloned());
        }
        if name != WILDCARD {
            if let Some(bucket) = self.buckets.get(WILDCARD) {
                handlers.extend(bucket.iter().cloned());
            }
        }
        handlers
    }

    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

//! Eventbus - in-process publish/subscribe dispatcher
//!
//! Producers publish values implementing [`Event`]; handlers subscribe by
//! event name (or to every event via the [`WILDCARD`]) and are invoked
//! according to the dispatch strategy of the chosen bus:
//!
//! - [`DirectBus`] - sequential delivery in subscription order.
//! - [`LockedBus`] - serializes subscribe/unsubscribe/publish behind one lock.
//! - [`ConcurrentBus`] - fans every matched handler out as its own task,
//!   then joins before returning.
//! - [`QueuedBus`] - buffers events and delivers them from a background
//!   drain task, decoupling submission from delivery.
//!
//! Handlers can be registered directly, or derived from typed functions
//! with [`HandlerResolver`] and bulk-subscribed.

mod bus;
mod concurrent;
mod direct;
mod error;
mod event;
mod handler;
mod locked;
mod queued;
mod resolver;

mod internal;

pub use bus::{EventBus, EventNameResolver, PublishErrorHook};
pub use concurrent::ConcurrentBus;
pub use direct::DirectBus;
pub use error::Error;
pub use event::{Event, EventName, EventRef, WILDCARD};
pub use handler::{Handler, HandlerFn, HandlerRef};
pub use locked::LockedBus;
pub use queued::{DEFAULT_QUEUE_CAPACITY, DrainHandle, QueuedBus};
pub use resolver::{HandlerResolver, MappedHandlers};

pub type Result<T = ()> = std::result::Result<T, Error>;

//! Objects, properties and the pool that maps them onto topics.
//!
//! # Overview
//!
//! A firmware declares its objects in a static table. Each object owns a set
//! of named properties, and each property is reachable on the topic
//! `object/property`:
//!
//! - Writes delivered on a subscribable property's topic are routed to its
//!   setter, or to the object's fallback setter.
//! - Publishable properties are announced on connect and whenever the
//!   firmware calls [`PropertyHandle::notify`].
//! - Objects may run a periodic daemon, whose period they pick in `init`.
//!
//! # Handlers
//!
//! Handlers are trait objects referenced from the declaration table, so a
//! missing handler is simply `Access::None` or a default trait method and
//! never an error. Handlers receive a [`PropertyHandle`] or an
//! [`ObjectInstance`] and reach per-object state through
//! [`ObjectInstance::user_data`].
//!
//! # Threading
//!
//! The pool is not `Sync`. All calls into it (transport events, daemon ticks,
//! notifications) are expected to come from one task; [`ObjectRuntime`] is
//! that task.

pub(crate) mod declaration;
pub(crate) mod dispatch;
pub(crate) mod event_loop;
pub(crate) mod instance;
pub(crate) mod pool;
pub(crate) mod registry;
pub(crate) mod scheduler;

#[cfg(test)]
mod test_support;

pub use declaration::{
    Access, Daemon, GetFn, Gettable, NoHooks, ObjectDeclaration, ObjectHooks, PropertyDeclaration,
    PropertyFlags, SetFn, Settable,
};
pub use dispatch::{Dispatched, NotifyOutcome};
pub use event_loop::{LinkEvent, LinkEventChannel, LinkEventReceiver, ObjectRuntime};
pub use instance::{MAX_OBJECT_IDS, ObjectId, ObjectInstance, PropertyHandle};
pub use pool::Pool;
pub use scheduler::{DaemonSchedule, Scheduler, TaskHandle};

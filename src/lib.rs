//! # MQTT Object/Property Bus for Embedded Systems
//!
//! `myrtio-objects` exposes the state of a device as named *objects* owning
//! named *properties*, and maps every property onto the MQTT topic
//! `object/property`. Inbound writes become typed setter calls, property
//! changes become publications.
//!
//! ## Core Features
//!
//! - **`no_std` & `no_alloc`:** Declarations live in `static` tables, buffers
//!   are `heapless` containers with fixed capacities.
//! - **Transport agnostic:** The pool talks to a fire-and-forget [`Link`].
//!   [`ChannelLink`] queues requests for the task that owns the MQTT client.
//! - **Embassy runtime:** [`ObjectRuntime`](object::ObjectRuntime) serialises
//!   transport events and periodic daemons on a single task.
//!
//! ## Example
//!
//! ```ignore
//! use myrtio_objects::object::*;
//!
//! fn state_len(_: PropertyHandle<'_>) -> usize { 2 }
//! fn read_state(_: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
//!     buf.copy_from_slice(b"ON");
//!     2
//! }
//! fn write_state(_: PropertyHandle<'_>, value: &[u8]) { /* drive the relay */ }
//!
//! static LIGHT: [PropertyDeclaration; 1] = [PropertyDeclaration::new("state", PropertyFlags::ALL)
//!     .with_access(Access::GetSet(&GetFn(state_len, read_state), &SetFn(write_state)))];
//!
//! static OBJECTS: [ObjectDeclaration; 2] = [
//!     ObjectDeclaration::new("light", &LIGHT),
//!     ObjectDeclaration::SENTINEL,
//! ];
//!
//! let mut runtime = ObjectRuntime::<_, 4, 4, 8>::new(&OBJECTS, EVENTS.receiver())?;
//! runtime.run().await;
//! ```
//!
//! The MQTT client task forwards `LinkEvent::Connected`, `LinkEvent::Disconnected`
//! and every delivered message into `EVENTS`, and drains the [`ChannelLink`]
//! queue into real SUBSCRIBE and PUBLISH packets.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod error;
pub mod object;
pub mod packet;
pub mod topic;
pub mod transport;

// Re-export key types for easier access at the crate root.
pub use error::{ObjectError, Result};
pub use object::{ObjectDeclaration, ObjectRuntime, Pool, PropertyDeclaration, PropertyHandle};
pub use packet::{Publish, QoS};
pub use transport::{ChannelLink, Link};

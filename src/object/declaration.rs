//! Static object and property declarations.
//!
//! Declarations are the schema of a device: which objects exist, which
//! properties they own, and which handlers read and write them. They are
//! built with `const fn` constructors so a whole table fits in a `static`.
//!
//! ```ignore
//! static LIGHT_PROPERTIES: [PropertyDeclaration; 2] = [
//!     PropertyDeclaration::new("state", PropertyFlags::ALL)
//!         .with_access(Access::GetSet(&GetFn(state_len, read_state), &SetFn(write_state))),
//!     PropertyDeclaration::new("model", PropertyFlags::PUBLISH),
//! ];
//!
//! static OBJECTS: [ObjectDeclaration; 2] = [
//!     ObjectDeclaration::new("light", &LIGHT_PROPERTIES).with_hooks(&LightHooks),
//!     ObjectDeclaration::SENTINEL,
//! ];
//! ```

use embassy_time::Duration;

use super::instance::{ObjectInstance, PropertyHandle};
use crate::packet::QoS;

/// Publish/subscribe capabilities of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PropertyFlags(u8);

impl PropertyFlags {
    pub const NONE: Self = Self(0);
    /// Announce the value on connect and on every notify.
    pub const PUBLISH: Self = Self(1);
    /// Subscribe to the property topic and accept writes.
    pub const SUBSCRIBE: Self = Self(2);
    pub const ALL: Self = Self(Self::PUBLISH.0 | Self::SUBSCRIBE.0);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Reads a property value with the two-phase length-then-fill protocol.
///
/// `value_len` is called first; when it returns zero nothing is published.
/// Otherwise a buffer of exactly that many bytes is handed to `read_value`.
/// Both calls must observe the same value: the pool does not guard against
/// the value changing between them.
pub trait Gettable: Sync {
    /// Number of bytes the current value occupies.
    fn value_len(&self, property: PropertyHandle<'_>) -> usize;

    /// Write the current value into `buf`, returning the number of bytes
    /// written.
    fn read_value(&self, property: PropertyHandle<'_>, buf: &mut [u8]) -> usize;
}

/// Accepts a value written to a property.
pub trait Settable: Sync {
    fn set(&self, property: PropertyHandle<'_>, value: &[u8]);
}

/// A [`Gettable`] made of two plain functions.
pub struct GetFn(
    pub fn(PropertyHandle<'_>) -> usize,
    pub fn(PropertyHandle<'_>, &mut [u8]) -> usize,
);

impl Gettable for GetFn {
    fn value_len(&self, property: PropertyHandle<'_>) -> usize {
        (self.0)(property)
    }

    fn read_value(&self, property: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
        (self.1)(property, buf)
    }
}

/// A [`Settable`] made of a plain function.
pub struct SetFn(pub fn(PropertyHandle<'_>, &[u8]));

impl Settable for SetFn {
    fn set(&self, property: PropertyHandle<'_>, value: &[u8]) {
        (self.0)(property, value)
    }
}

/// The read/write capabilities attached to a property or, as a fallback,
/// to an object.
#[derive(Clone, Copy, Default)]
pub enum Access {
    #[default]
    None,
    Get(&'static dyn Gettable),
    Set(&'static dyn Settable),
    GetSet(&'static dyn Gettable, &'static dyn Settable),
}

impl Access {
    pub fn getter(&self) -> Option<&'static dyn Gettable> {
        match *self {
            Access::Get(getter) | Access::GetSet(getter, _) => Some(getter),
            Access::None | Access::Set(_) => None,
        }
    }

    pub fn setter(&self) -> Option<&'static dyn Settable> {
        match *self {
            Access::Set(setter) | Access::GetSet(_, setter) => Some(setter),
            Access::None | Access::Get(_) => None,
        }
    }
}

/// Lifecycle callbacks of an object. Every method defaults to a no-op.
pub trait ObjectHooks: Sync {
    /// Called once while the pool is built, in declaration order.
    ///
    /// Returns the period at which the object's [`Daemon`] should run; zero
    /// means no periodic task.
    fn init(&self, _object: &ObjectInstance) -> Duration {
        Duration::from_ticks(0)
    }

    /// Called after the object's subscriptions and announcements on connect.
    fn on_connect(&self, _object: &ObjectInstance) {}

    /// Called when the transport connection is lost.
    fn on_disconnect(&self, _object: &ObjectInstance) {}
}

/// An object without lifecycle callbacks.
pub struct NoHooks;

impl ObjectHooks for NoHooks {}

/// Periodic background work of an object.
///
/// Must not block: it runs on the same task that dispatches messages.
pub trait Daemon: Sync {
    fn run(&self, object: &ObjectInstance);
}

/// Declaration of a single property.
pub struct PropertyDeclaration {
    pub name: &'static str,
    pub flags: PropertyFlags,
    pub access: Access,
    pub qos: QoS,
    pub retain: bool,
}

impl PropertyDeclaration {
    /// An empty name marks the end of a property table.
    pub const SENTINEL: Self = Self::new("", PropertyFlags::NONE);

    pub const fn new(name: &'static str, flags: PropertyFlags) -> Self {
        Self {
            name,
            flags,
            access: Access::None,
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }

    pub const fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub const fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub const fn retained(mut self) -> Self {
        self.retain = true;
        self
    }

    pub fn is_publishable(&self) -> bool {
        self.flags.contains(PropertyFlags::PUBLISH)
    }

    pub fn is_subscribable(&self) -> bool {
        self.flags.contains(PropertyFlags::SUBSCRIBE)
    }
}

/// Declaration of an object and the properties it owns.
pub struct ObjectDeclaration {
    pub name: &'static str,
    pub properties: &'static [PropertyDeclaration],
    pub hooks: &'static dyn ObjectHooks,
    pub daemon: Option<&'static dyn Daemon>,
    /// Used for properties that declare no access of their own.
    pub fallback: Access,
}

impl ObjectDeclaration {
    /// An empty name marks the end of an object table.
    pub const SENTINEL: Self = Self::new("", &[]);

    pub const fn new(name: &'static str, properties: &'static [PropertyDeclaration]) -> Self {
        Self {
            name,
            properties,
            hooks: &NoHooks,
            daemon: None,
            fallback: Access::None,
        }
    }

    pub const fn with_hooks(mut self, hooks: &'static dyn ObjectHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub const fn with_daemon(mut self, daemon: &'static dyn Daemon) -> Self {
        self.daemon = Some(daemon);
        self
    }

    pub const fn with_fallback(mut self, fallback: Access) -> Self {
        self.fallback = fallback;
        self
    }

    /// Declared properties up to the sentinel (or the end of the table).
    pub fn properties(&self) -> impl Iterator<Item = &'static PropertyDeclaration> + use<> {
        until_sentinel(self.properties, |p| p.name)
    }
}

/// Iterates `table` up to the first entry with an empty name.
pub(crate) fn until_sentinel<T>(
    table: &'static [T],
    name: fn(&T) -> &str,
) -> impl Iterator<Item = &'static T> {
    table.iter().take_while(move |entry| !name(entry).is_empty())
}

//! Routing between topics and property handlers.
//!
//! Inbound, a delivered `(topic, payload)` is decoded, resolved to a
//! property and handed to exactly one setter: the property's own, or the
//! object's fallback when the property has none.
//!
//! Outbound, [`PropertyHandle::notify`] reads the current value through the
//! same property-then-object resolution and publishes it on the property
//! topic.

use super::declaration::{Gettable, Settable};
use super::instance::PropertyHandle;
use super::pool::Pool;
use crate::error::{ObjectError, Result};
use crate::packet::{MAX_PAYLOAD_LEN, Payload, Publish, copy_payload};
use crate::topic;

/// Which handler received an inbound write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatched {
    /// The property's own setter.
    Property,
    /// The object's fallback setter.
    Object,
    /// Neither declares a setter; the write was dropped.
    Dropped,
}

/// What a notification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyOutcome {
    Published,
    /// The object has no active connection. No getter was called.
    NotConnected,
    /// Neither the property nor the object declares a getter.
    NoGetter,
    /// The getter reported an empty value.
    Empty,
}

impl<const MAX_OBJECTS: usize> Pool<MAX_OBJECTS> {
    /// Deliver a write from the transport.
    ///
    /// Failures are logged and returned; they never affect the pool.
    pub fn handle_incoming(&self, topic: &str, payload: &[u8]) -> Result<Dispatched> {
        let segments = topic::decode(topic);
        let Some(object) = segments.object.and_then(|name| self.find_object(name)) else {
            info!("object '{}' not found", segments.object.unwrap_or(""));
            return Err(ObjectError::ObjectNotFound);
        };
        let Some(property) = segments.property.and_then(|name| object.find_property(name)) else {
            info!(
                "property '{}' not found on '{}'",
                segments.property.unwrap_or(""),
                object.name()
            );
            return Err(ObjectError::PropertyNotFound);
        };

        let value = copy_payload(payload).inspect_err(|_| {
            warn!(
                "payload of {} bytes for {}/{} dropped",
                payload.len(),
                object.name(),
                property.name()
            );
        })?;
        Ok(property.write(&value))
    }

    /// [`Self::handle_incoming`] for a delivered message.
    pub fn handle_message(&self, msg: &Publish<'_>) -> Result<Dispatched> {
        self.handle_incoming(msg.topic, msg.payload)
    }

    /// Notify property `property` of object `object`.
    pub fn notify(&self, object: &str, property: &str) -> Result<NotifyOutcome> {
        let handle = self
            .find_object(object)
            .ok_or(ObjectError::ObjectNotFound)?
            .find_property(property)
            .ok_or(ObjectError::PropertyNotFound)?;
        handle.notify()
    }
}

impl<'a> PropertyHandle<'a> {
    /// The setter used for writes: the property's own, else the object's.
    pub fn setter(&self) -> Option<(&'static dyn Settable, Dispatched)> {
        if let Some(setter) = self.declaration().access.setter() {
            return Some((setter, Dispatched::Property));
        }
        self.object()
            .declaration()
            .fallback
            .setter()
            .map(|setter| (setter, Dispatched::Object))
    }

    /// The getter used for reads: the property's own, else the object's.
    pub fn getter(&self) -> Option<&'static dyn Gettable> {
        self.declaration()
            .access
            .getter()
            .or_else(|| self.object().declaration().fallback.getter())
    }

    /// Hand `value` to exactly one setter.
    pub fn write(&self, value: &[u8]) -> Dispatched {
        match self.setter() {
            Some((setter, dispatched)) => {
                setter.set(*self, value);
                dispatched
            }
            None => {
                trace!("no setter for {}/{}", self.object().name(), self.name());
                Dispatched::Dropped
            }
        }
    }

    /// Read the current value. `None` when there is no getter or the value
    /// is empty.
    pub fn read(&self) -> Result<Option<Payload>> {
        let Some(getter) = self.getter() else {
            return Ok(None);
        };

        let len = getter.value_len(*self);
        if len == 0 {
            return Ok(None);
        }

        let mut buf = Payload::new();
        buf.resize(len, 0).map_err(|_| ObjectError::PayloadTooLarge {
            len,
            max: MAX_PAYLOAD_LEN,
        })?;
        let written = getter.read_value(*self, &mut buf);
        buf.truncate(written);
        Ok(Some(buf))
    }

    /// Publish the current value on this property's topic.
    ///
    /// Does nothing while the object is disconnected. The getter is called
    /// twice, for the length and then for the bytes, and both calls are
    /// expected to see the same value.
    pub fn notify(&self) -> Result<NotifyOutcome> {
        let Some(link) = self.object().link() else {
            return Ok(NotifyOutcome::NotConnected);
        };
        if self.getter().is_none() {
            return Ok(NotifyOutcome::NoGetter);
        }

        let value = match self.read() {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(NotifyOutcome::Empty),
            Err(err) => {
                warn!("cannot read {}/{}: {}", self.object().name(), self.name(), err);
                return Err(err);
            }
        };

        let topic = self.topic()?;
        let declaration = self.declaration();
        link.publish(&topic, &value, declaration.qos, declaration.retain);
        Ok(NotifyOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::super::declaration::{
        Access, GetFn, ObjectDeclaration, PropertyDeclaration, PropertyFlags,
    };
    use super::super::test_support::*;
    use super::*;

    static LIGHT: [PropertyDeclaration; 4] = [
        // Own setter and getter, object fallbacks also present.
        PropertyDeclaration::new("state", PropertyFlags::ALL)
            .with_access(Access::GetSet(&ValueGetter, &PropertySetter)),
        // Falls back to the object handlers.
        PropertyDeclaration::new("brightness", PropertyFlags::ALL),
        // Own getter only: writes still fall back to the object setter.
        PropertyDeclaration::new("color", PropertyFlags::ALL).with_access(Access::Get(&ValueGetter)),
        // A setter that ignores its input still suppresses the fallback.
        PropertyDeclaration::new("ignored", PropertyFlags::SUBSCRIBE)
            .with_access(Access::Set(&IgnoringSetter)),
    ];

    static BARE: [PropertyDeclaration; 1] = [PropertyDeclaration::new("value", PropertyFlags::ALL)];

    static EMPTY_GETTER: GetFn = GetFn(|_| 0, |_, _| 0);
    static HUGE_GETTER: GetFn = GetFn(|_| MAX_PAYLOAD_LEN + 1, |_, _| 0);
    // Reports four bytes, then only fills two.
    static SHRINKING_GETTER: GetFn = GetFn(
        |_| 4,
        |_, buf| {
            buf[..2].copy_from_slice(b"ab");
            2
        },
    );

    static ODD: [PropertyDeclaration; 3] = [
        PropertyDeclaration::new("empty", PropertyFlags::PUBLISH)
            .with_access(Access::Get(&EMPTY_GETTER)),
        PropertyDeclaration::new("huge", PropertyFlags::PUBLISH)
            .with_access(Access::Get(&HUGE_GETTER)),
        PropertyDeclaration::new("shrinking", PropertyFlags::PUBLISH)
            .with_access(Access::Get(&SHRINKING_GETTER)),
    ];

    static OBJECTS: [ObjectDeclaration; 4] = [
        ObjectDeclaration::new("light", &LIGHT)
            .with_fallback(Access::GetSet(&NameGetter, &ObjectSetter)),
        ObjectDeclaration::new("bare", &BARE),
        ObjectDeclaration::new("odd", &ODD),
        ObjectDeclaration::SENTINEL,
    ];

    fn pool() -> (Pool<4>, &'static Recorder) {
        let pool = Pool::new(&OBJECTS, &mut RecordingScheduler::default()).unwrap();
        let recorder = attach_recorder(&pool);
        (pool, recorder)
    }

    #[test]
    fn test_property_setter_wins_over_fallback() {
        let (pool, recorder) = pool();
        let dispatched = pool.handle_incoming("light/state", b"ON").unwrap();
        assert_eq!(dispatched, Dispatched::Property);
        assert_eq!(
            recorder.calls(),
            [Call::set("property-set", "light", "state", b"ON")]
        );
    }

    #[test]
    fn test_fallback_setter_receives_matching_handle() {
        let (pool, recorder) = pool();
        assert_eq!(
            pool.handle_incoming("light//brightness/", b"42").unwrap(),
            Dispatched::Object
        );
        assert_eq!(
            pool.handle_incoming("light/color", b"red").unwrap(),
            Dispatched::Object
        );
        assert_eq!(
            recorder.calls(),
            [
                Call::set("object-set", "light", "brightness", b"42"),
                Call::set("object-set", "light", "color", b"red"),
            ]
        );
    }

    #[test]
    fn test_inert_property_setter_suppresses_fallback() {
        let (pool, recorder) = pool();
        assert_eq!(
            pool.handle_incoming("light/ignored", b"x").unwrap(),
            Dispatched::Property
        );
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_write_without_any_setter_is_dropped() {
        let (pool, recorder) = pool();
        assert_eq!(
            pool.handle_incoming("bare/value", b"1").unwrap(),
            Dispatched::Dropped
        );
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_lookup_failures_invoke_nothing() {
        let (pool, recorder) = pool();
        assert_eq!(
            pool.handle_incoming("ghost/state", b"ON"),
            Err(ObjectError::ObjectNotFound)
        );
        assert_eq!(pool.handle_incoming("", b"ON"), Err(ObjectError::ObjectNotFound));
        assert_eq!(pool.handle_incoming("///", b"ON"), Err(ObjectError::ObjectNotFound));
        assert_eq!(
            pool.handle_incoming("light", b"ON"),
            Err(ObjectError::PropertyNotFound)
        );
        assert_eq!(
            pool.handle_incoming("light/ghost", b"ON"),
            Err(ObjectError::PropertyNotFound)
        );
        assert!(recorder.calls().is_empty());

        // The pool still works afterwards.
        assert_eq!(
            pool.handle_incoming("light/state", b"OFF").unwrap(),
            Dispatched::Property
        );
    }

    #[test]
    fn test_oversized_payload_aborts_dispatch() {
        let (pool, recorder) = pool();
        let payload = [b'x'; MAX_PAYLOAD_LEN + 1];
        assert_eq!(
            pool.handle_incoming("light/state", &payload),
            Err(ObjectError::PayloadTooLarge {
                len: MAX_PAYLOAD_LEN + 1,
                max: MAX_PAYLOAD_LEN
            })
        );
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_handle_message_uses_topic_and_payload() {
        let (pool, recorder) = pool();
        let msg = Publish::new("light/state", b"OFF");
        assert_eq!(pool.handle_message(&msg).unwrap(), Dispatched::Property);
        assert_eq!(
            recorder.calls(),
            [Call::set("property-set", "light", "state", b"OFF")]
        );
    }

    #[test]
    fn test_notify_without_connection_skips_getter() {
        let (pool, recorder) = pool();
        recorder.set_value(b"ON");
        assert_eq!(
            pool.notify("light", "state").unwrap(),
            NotifyOutcome::NotConnected
        );
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_notify_runs_two_phases_against_one_getter() {
        let (pool, recorder) = pool();
        let link = leak_link();
        pool.connect(link);
        link.take();
        recorder.clear();

        recorder.set_value(b"ON");
        assert_eq!(pool.notify("light", "state").unwrap(), NotifyOutcome::Published);
        assert_eq!(
            recorder.calls(),
            [
                Call::get("value-len", "light", "state"),
                Call::get("value-read", "light", "state"),
            ]
        );
        assert_eq!(link.take(), [Request::publish("light/state", b"ON", false)]);
    }

    #[test]
    fn test_notify_uses_object_getter_as_fallback() {
        let (pool, _recorder) = pool();
        let link = leak_link();
        pool.connect(link);
        link.take();

        assert_eq!(
            pool.notify("light", "brightness").unwrap(),
            NotifyOutcome::Published
        );
        assert_eq!(
            link.take(),
            [Request::publish("light/brightness", b"brightness", false)]
        );
    }

    #[test]
    fn test_notify_edge_cases() {
        let (pool, _recorder) = pool();
        let link = leak_link();
        pool.connect(link);
        link.take();

        assert_eq!(pool.notify("bare", "value").unwrap(), NotifyOutcome::NoGetter);
        assert_eq!(pool.notify("odd", "empty").unwrap(), NotifyOutcome::Empty);
        assert_eq!(
            pool.notify("odd", "huge"),
            Err(ObjectError::PayloadTooLarge {
                len: MAX_PAYLOAD_LEN + 1,
                max: MAX_PAYLOAD_LEN
            })
        );
        assert!(link.take().is_empty());

        assert_eq!(
            pool.notify("odd", "shrinking").unwrap(),
            NotifyOutcome::Published
        );
        assert_eq!(link.take(), [Request::publish("odd/shrinking", b"ab", false)]);

        assert_eq!(pool.notify("odd", "ghost"), Err(ObjectError::PropertyNotFound));
        assert_eq!(pool.notify("ghost", "x"), Err(ObjectError::ObjectNotFound));
    }

    #[test]
    fn test_empty_value_publishes_nothing_on_connect() {
        let (pool, recorder) = pool();
        recorder.set_value(b"");
        let link = leak_link();
        pool.connect(link);

        let published: std::vec::Vec<Request> = link
            .take()
            .into_iter()
            .filter(|r| matches!(r, Request::Publish { .. }))
            .collect();
        // "light/state" and "light/color" read the empty recorder value.
        assert_eq!(
            published,
            [
                Request::publish("light/brightness", b"brightness", false),
                Request::publish("odd/shrinking", b"ab", false),
            ]
        );
    }
}

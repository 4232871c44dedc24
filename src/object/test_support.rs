//! Recording handlers, link and scheduler shared by the unit tests.

use core::cell::RefCell;
use std::boxed::Box;
use std::string::{String, ToString};
use std::sync::Mutex;
use std::vec::Vec;

use embassy_time::Duration;

use super::declaration::{Gettable, ObjectHooks, Settable};
use super::instance::{ObjectId, ObjectInstance, PropertyHandle};
use super::pool::Pool;
use super::scheduler::{Scheduler, TaskHandle};
use crate::packet::QoS;
use crate::transport::Link;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub kind: &'static str,
    pub object: &'static str,
    pub property: Option<&'static str>,
    pub value: Vec<u8>,
}

impl Call {
    pub fn set(kind: &'static str, object: &'static str, property: &'static str, value: &[u8]) -> Self {
        Self {
            kind,
            object,
            property: Some(property),
            value: value.to_vec(),
        }
    }

    pub fn get(kind: &'static str, object: &'static str, property: &'static str) -> Self {
        Self::set(kind, object, property, b"")
    }

    fn hook(kind: &'static str, object: &'static str) -> Self {
        Self {
            kind,
            object,
            property: None,
            value: Vec::new(),
        }
    }
}

/// Per-pool call log, attached to objects as user data.
#[derive(Default)]
pub struct Recorder {
    calls: RefCell<Vec<Call>>,
    value: RefCell<Vec<u8>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Object names recorded for `kind`.
    pub fn calls_of(&self, kind: &str) -> Vec<&'static str> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.object)
            .collect()
    }

    /// The value served by [`ValueGetter`].
    pub fn set_value(&self, value: &[u8]) {
        *self.value.borrow_mut() = value.to_vec();
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

/// Attach one fresh recorder to every object of `pool`.
pub fn attach_recorder<const N: usize>(pool: &Pool<N>) -> &'static Recorder {
    let recorder: &'static Recorder = Box::leak(Box::default());
    for object in pool.iter() {
        object.set_user_data(recorder);
    }
    recorder
}

fn with_recorder(object: &ObjectInstance, f: impl FnOnce(&Recorder)) {
    if let Some(recorder) = object.user_data::<Recorder>() {
        f(recorder);
    }
}

pub struct PropertySetter;

impl Settable for PropertySetter {
    fn set(&self, property: PropertyHandle<'_>, value: &[u8]) {
        with_recorder(property.object(), |r| {
            r.record(Call::set("property-set", property.object().name(), property.name(), value))
        });
    }
}

pub struct ObjectSetter;

impl Settable for ObjectSetter {
    fn set(&self, property: PropertyHandle<'_>, value: &[u8]) {
        with_recorder(property.object(), |r| {
            r.record(Call::set("object-set", property.object().name(), property.name(), value))
        });
    }
}

pub struct IgnoringSetter;

impl Settable for IgnoringSetter {
    fn set(&self, _property: PropertyHandle<'_>, _value: &[u8]) {}
}

/// Serves the recorder's value and logs both phases.
pub struct ValueGetter;

impl Gettable for ValueGetter {
    fn value_len(&self, property: PropertyHandle<'_>) -> usize {
        let mut len = 0;
        with_recorder(property.object(), |r| {
            r.record(Call::get("value-len", property.object().name(), property.name()));
            len = r.value.borrow().len();
        });
        len
    }

    fn read_value(&self, property: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
        let mut written = 0;
        with_recorder(property.object(), |r| {
            r.record(Call::get("value-read", property.object().name(), property.name()));
            let value = r.value.borrow();
            buf[..value.len()].copy_from_slice(&value);
            written = value.len();
        });
        written
    }
}

/// Serves the property name as its value.
pub struct NameGetter;

impl Gettable for NameGetter {
    fn value_len(&self, property: PropertyHandle<'_>) -> usize {
        property.name().len()
    }

    fn read_value(&self, property: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
        buf.copy_from_slice(property.name().as_bytes());
        buf.len()
    }
}

pub struct RecordingHooks;

impl ObjectHooks for RecordingHooks {
    fn on_connect(&self, object: &ObjectInstance) {
        with_recorder(object, |r| r.record(Call::hook("connect", object.name())));
    }

    fn on_disconnect(&self, object: &ObjectInstance) {
        with_recorder(object, |r| r.record(Call::hook("disconnect", object.name())));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Subscribe {
        topic: String,
        qos: QoS,
    },
    Publish {
        topic: String,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    },
}

impl Request {
    pub fn subscribe(topic: &str, qos: QoS) -> Self {
        Request::Subscribe {
            topic: topic.to_string(),
            qos,
        }
    }

    pub fn publish(topic: &str, payload: &[u8], retain: bool) -> Self {
        Request::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos: QoS::AtMostOnce,
            retain,
        }
    }
}

#[derive(Default)]
pub struct RecordingLink {
    requests: Mutex<Vec<Request>>,
}

impl RecordingLink {
    pub fn take(&self) -> Vec<Request> {
        core::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Request>> {
        self.requests.lock().unwrap()
    }
}

impl Link for RecordingLink {
    fn subscribe(&self, topic: &str, qos: QoS) {
        self.lock().push(Request::subscribe(topic, qos));
    }

    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) {
        self.lock().push(Request::Publish {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
    }
}

pub fn leak_link() -> &'static RecordingLink {
    Box::leak(Box::default())
}

#[derive(Default)]
pub struct RecordingScheduler {
    pub registered: Vec<(ObjectId, Duration)>,
    pub cancelled: Vec<TaskHandle>,
}

impl Scheduler for RecordingScheduler {
    fn register_periodic(&mut self, object: ObjectId, period: Duration) -> Option<TaskHandle> {
        self.registered.push((object, period));
        Some(TaskHandle::new(self.registered.len() as u16 - 1))
    }

    fn cancel(&mut self, task: TaskHandle) {
        self.cancelled.push(task);
    }
}

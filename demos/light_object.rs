//! Example: a light exposed as an MQTT object
//!
//! Declares a `light` object with three properties and an `uptime` object
//! with a periodic daemon, then drives them through a connect, a couple of
//! writes and a disconnect. Requests that would go to the broker are printed
//! instead.
//!
//! ```text
//! light/state       ON | OFF       publish + subscribe
//! light/brightness  0..=255        publish + subscribe
//! light/model       static string  publish, retained
//! uptime/ticks      counter        publish
//! ```

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::fmt::Write as _;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Duration;
use myrtio_objects::object::{
    Access, Daemon, GetFn, LinkEvent, LinkEventChannel, ObjectDeclaration, ObjectHooks,
    ObjectInstance, ObjectRuntime, PropertyDeclaration, PropertyFlags, PropertyHandle, SetFn,
};
use myrtio_objects::packet::InboundMessage;
use myrtio_objects::{Link, Publish, QoS};

static LIGHT_ON: AtomicBool = AtomicBool::new(false);
static BRIGHTNESS: AtomicU8 = AtomicU8::new(255);
static TICKS: AtomicU32 = AtomicU32::new(0);

const MODEL: &str = "myrtio-light-v1";

fn state_len(_: PropertyHandle<'_>) -> usize {
    if LIGHT_ON.load(Ordering::Relaxed) { 2 } else { 3 }
}

fn read_state(_: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
    let value: &[u8] = if LIGHT_ON.load(Ordering::Relaxed) { b"ON" } else { b"OFF" };
    fill(buf, value)
}

/// Copies as much of `value` as fits, in case it changed between the phases.
fn fill(buf: &mut [u8], value: &[u8]) -> usize {
    let len = buf.len().min(value.len());
    buf[..len].copy_from_slice(&value[..len]);
    len
}

fn write_state(property: PropertyHandle<'_>, value: &[u8]) {
    match value {
        b"ON" => LIGHT_ON.store(true, Ordering::Relaxed),
        b"OFF" => LIGHT_ON.store(false, Ordering::Relaxed),
        _ => return,
    }
    // Echo the accepted state back.
    let _ = property.notify();
}

/// Decimal text, shared by the numeric properties.
fn decimal(value: u32) -> String {
    let mut text = String::new();
    let _ = write!(text, "{}", value);
    text
}

/// Object-level getter for the numeric properties of `light` and `uptime`.
fn number_len(property: PropertyHandle<'_>) -> usize {
    number_of(property).map_or(0, |n| decimal(n).len())
}

fn read_number(property: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
    let Some(n) = number_of(property) else {
        return 0;
    };
    fill(buf, decimal(n).as_bytes())
}

fn number_of(property: PropertyHandle<'_>) -> Option<u32> {
    if property.is("brightness") {
        Some(BRIGHTNESS.load(Ordering::Relaxed) as u32)
    } else if property.is("ticks") {
        Some(TICKS.load(Ordering::Relaxed))
    } else {
        None
    }
}

fn write_number(property: PropertyHandle<'_>, value: &[u8]) {
    let parsed = core::str::from_utf8(value).ok().and_then(|s| s.trim().parse::<u8>().ok());
    if let (true, Some(brightness)) = (property.is("brightness"), parsed) {
        BRIGHTNESS.store(brightness, Ordering::Relaxed);
        let _ = property.notify();
    }
}

fn model_len(_: PropertyHandle<'_>) -> usize {
    MODEL.len()
}

fn read_model(_: PropertyHandle<'_>, buf: &mut [u8]) -> usize {
    fill(buf, MODEL.as_bytes())
}

static LIGHT_PROPERTIES: [PropertyDeclaration; 4] = [
    PropertyDeclaration::new("state", PropertyFlags::ALL)
        .with_access(Access::GetSet(&GetFn(state_len, read_state), &SetFn(write_state))),
    PropertyDeclaration::new("brightness", PropertyFlags::ALL),
    PropertyDeclaration::new("model", PropertyFlags::PUBLISH)
        .with_access(Access::Get(&GetFn(model_len, read_model)))
        .retained(),
    PropertyDeclaration::SENTINEL,
];

static UPTIME_PROPERTIES: [PropertyDeclaration; 1] =
    [PropertyDeclaration::new("ticks", PropertyFlags::PUBLISH)];

struct Uptime;

impl ObjectHooks for Uptime {
    fn init(&self, _object: &ObjectInstance) -> Duration {
        Duration::from_millis(10)
    }

    fn on_connect(&self, object: &ObjectInstance) {
        println!("'{}' online", object.name());
    }
}

impl Daemon for Uptime {
    fn run(&self, object: &ObjectInstance) {
        let ticks = TICKS.fetch_add(1, Ordering::Relaxed) + 1;
        println!("'{}' tick {}", object.name(), ticks);
        if let Some(property) = object.find_property("ticks") {
            let _ = property.notify();
        }
    }
}

static OBJECTS: [ObjectDeclaration; 3] = [
    ObjectDeclaration::new("light", &LIGHT_PROPERTIES)
        .with_fallback(Access::GetSet(&GetFn(number_len, read_number), &SetFn(write_number))),
    ObjectDeclaration::new("uptime", &UPTIME_PROPERTIES)
        .with_hooks(&Uptime)
        .with_daemon(&Uptime)
        .with_fallback(Access::Get(&GetFn(number_len, read_number))),
    ObjectDeclaration::SENTINEL,
];

/// Prints what would be sent to the broker.
struct PrintLink;

impl Link for PrintLink {
    fn subscribe(&self, topic: &str, qos: QoS) {
        println!("SUBSCRIBE {} ({:?})", topic, qos);
    }

    fn publish(&self, topic: &str, payload: &[u8], _qos: QoS, retain: bool) {
        let retained = if retain { " [retained]" } else { "" };
        println!("PUBLISH   {} = {}{}", topic, String::from_utf8_lossy(payload), retained);
    }
}

static LINK: PrintLink = PrintLink;

fn deliver(topic: &str, payload: &[u8]) -> LinkEvent {
    match InboundMessage::try_from(&Publish::new(topic, payload)) {
        Ok(msg) => LinkEvent::Message(msg),
        Err(err) => panic!("cannot queue {}: {}", topic, err),
    }
}

fn main() {
    let events = LinkEventChannel::<NoopRawMutex, 8>::new();
    let mut runtime = match ObjectRuntime::<_, 4, 4, 8>::new(&OBJECTS, events.receiver()) {
        Ok(runtime) => runtime,
        Err(err) => panic!("invalid object table: {}", err),
    };

    let script = [
        LinkEvent::Connected(&LINK),
        deliver("light/state", b"ON"),
        deliver("light//brightness", b"128"),
        deliver("light/missing", b"1"),
        LinkEvent::Disconnected,
    ];
    for event in script {
        if events.try_send(event).is_err() {
            panic!("event queue full");
        }
    }

    // Five events plus a few daemon ticks.
    for _ in 0..8 {
        block_on(runtime.step());
    }

    runtime.shutdown();
}

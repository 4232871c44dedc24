//! # Transport Abstraction
//!
//! The pool never talks to the network itself. It hands subscribe and publish
//! requests to a [`Link`], which is fire-and-forget: there is no
//! acknowledgement and no error channel back into the pool.
//!
//! [`ChannelLink`] is the usual implementation. It queues owned requests into
//! an `embassy-sync` channel, and the task that owns the MQTT client drains
//! the other end and performs the actual async I/O.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::packet::{Payload, QoS, copy_payload};
use crate::topic::{MAX_TOPIC_LEN, Topic};

/// The active transport connection as seen by the pool.
///
/// Methods take `&self` and return immediately; implementations needing
/// mutation use interior mutability such as a channel or a blocking mutex.
/// Links are shared through `static` event channels, so they must be `Sync`.
pub trait Link: Sync {
    /// Request a subscription to `topic`.
    fn subscribe(&self, topic: &str, qos: QoS);

    /// Request publication of `payload` on `topic`.
    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool);
}

/// A request queued by [`ChannelLink`], with inline storage for topic and
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRequest {
    Subscribe {
        topic: Topic,
        qos: QoS,
    },
    Publish {
        topic: Topic,
        payload: Payload,
        qos: QoS,
        retain: bool,
    },
}

impl LinkRequest {
    /// The topic this request targets.
    pub fn topic(&self) -> &str {
        match self {
            LinkRequest::Subscribe { topic, .. } => topic.as_str(),
            LinkRequest::Publish { topic, .. } => topic.as_str(),
        }
    }
}

pub type LinkRequestChannel<M, const DEPTH: usize> = Channel<M, LinkRequest, DEPTH>;

pub type LinkRequestReceiver<'a, M, const DEPTH: usize> = Receiver<'a, M, LinkRequest, DEPTH>;

/// A [`Link`] backed by an `embassy-sync` channel.
///
/// Requests that do not fit (queue full, topic or payload too long) are
/// dropped with a warning, matching the best-effort contract of [`Link`].
#[derive(Clone, Copy)]
pub struct ChannelLink<'a, M: RawMutex, const DEPTH: usize> {
    tx: Sender<'a, M, LinkRequest, DEPTH>,
}

impl<'a, M: RawMutex, const DEPTH: usize> ChannelLink<'a, M, DEPTH> {
    /// Create a new `ChannelLink` from a channel sender.
    pub fn new(tx: Sender<'a, M, LinkRequest, DEPTH>) -> Self {
        Self { tx }
    }

    fn enqueue(&self, req: LinkRequest) {
        if self.tx.try_send(req).is_err() {
            warn!("link queue full, request dropped");
        }
    }
}

fn owned_topic(topic: &str) -> Option<Topic> {
    let mut owned = Topic::new();
    if owned.push_str(topic).is_err() {
        warn!(
            "topic of {} bytes exceeds {} bytes, request dropped",
            topic.len(),
            MAX_TOPIC_LEN
        );
        return None;
    }
    Some(owned)
}

impl<M: RawMutex + Sync, const DEPTH: usize> Link for ChannelLink<'_, M, DEPTH> {
    fn subscribe(&self, topic: &str, qos: QoS) {
        let Some(topic) = owned_topic(topic) else {
            return;
        };
        self.enqueue(LinkRequest::Subscribe { topic, qos });
    }

    fn publish(&self, topic: &str, payload: &[u8], qos: QoS, retain: bool) {
        let Some(topic) = owned_topic(topic) else {
            return;
        };
        let payload = match copy_payload(payload) {
            Ok(payload) => payload,
            Err(_) => {
                warn!("payload of {} bytes dropped for {}", payload.len(), topic.as_str());
                return;
            }
        };
        self.enqueue(LinkRequest::Publish {
            topic,
            payload,
            qos,
            retain,
        });
    }
}

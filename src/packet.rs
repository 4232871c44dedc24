//! # Message Types
//!
//! The units exchanged with the MQTT transport: QoS levels, the borrowed
//! view of a delivered PUBLISH and its owned copy for queueing across tasks.

use heapless::Vec;

use crate::error::{ObjectError, Result};
use crate::topic::{MAX_TOPIC_LEN, Topic};

/// Maximum size of a property value, inbound or outbound.
pub const MAX_PAYLOAD_LEN: usize = 256;

/// Owned payload storage.
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Represents the Quality of Service (QoS) levels for MQTT messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

/// A message as delivered by the transport.
///
/// Borrows from the transport's receive buffer, so it must be handled (or
/// copied into an [`InboundMessage`]) before the next receive.
#[derive(Debug, Clone, Copy)]
pub struct Publish<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: QoS,
    pub retain: bool,
}

impl<'a> Publish<'a> {
    pub fn new(topic: &'a str, payload: &'a [u8]) -> Self {
        Self {
            topic,
            payload,
            qos: QoS::AtMostOnce,
            retain: false,
        }
    }
}

/// An owned copy of a delivered message, with inline storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: Topic,
    pub payload: Payload,
}

impl InboundMessage {
    pub fn as_publish(&self) -> Publish<'_> {
        Publish::new(&self.topic, &self.payload)
    }
}

impl TryFrom<&Publish<'_>> for InboundMessage {
    type Error = ObjectError;

    fn try_from(msg: &Publish<'_>) -> Result<Self> {
        let mut topic = Topic::new();
        topic.push_str(msg.topic).map_err(|_| ObjectError::TopicTooLong {
            len: msg.topic.len(),
            max: MAX_TOPIC_LEN,
        })?;

        let payload = copy_payload(msg.payload)?;
        Ok(Self { topic, payload })
    }
}

/// Copies `data` into owned payload storage.
pub(crate) fn copy_payload(data: &[u8]) -> Result<Payload> {
    Vec::from_slice(data).map_err(|_| ObjectError::PayloadTooLarge {
        len: data.len(),
        max: MAX_PAYLOAD_LEN,
    })
}

//! # Topic Codec
//!
//! Maps an `(object, property)` pair to the topic `object/property` and back.
//!
//! Decoding is deliberately lax: runs of separators collapse, leading and
//! trailing separators vanish, and anything after the second non-empty
//! segment is ignored. `a/b`, `a//b`, `/a/b` and `a/b/c` all address
//! property `b` of object `a`.

use heapless::String;

use crate::error::{ObjectError, Result};

/// The topic level separator.
pub const SEPARATOR: char = '/';

/// Maximum length for an encoded topic string.
pub const MAX_TOPIC_LEN: usize = 128;

/// An encoded `object/property` topic.
pub type Topic = String<MAX_TOPIC_LEN>;

/// The two significant segments of a decoded topic.
///
/// A segment that is not present in the topic is `None`, never an empty
/// string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicSegments<'a> {
    pub object: Option<&'a str>,
    pub property: Option<&'a str>,
}

/// Builds the topic for `property` of `object`.
///
/// No escaping is performed, so neither name may contain [`SEPARATOR`].
/// Declarations are checked for this when a pool is built.
pub fn encode(object: &str, property: &str) -> Result<Topic> {
    let len = object.len() + 1 + property.len();
    if len > MAX_TOPIC_LEN {
        return Err(ObjectError::TopicTooLong {
            len,
            max: MAX_TOPIC_LEN,
        });
    }

    let mut topic = Topic::new();
    // Length was checked above, none of these can overflow.
    let _ = topic.push_str(object);
    let _ = topic.push(SEPARATOR);
    let _ = topic.push_str(property);
    Ok(topic)
}

/// Splits `topic` into its object and property segments.
pub fn decode(topic: &str) -> TopicSegments<'_> {
    let mut segments = topic.split(SEPARATOR).filter(|s| !s.is_empty());
    let object = segments.next();
    let property = segments.next();
    TopicSegments { object, property }
}

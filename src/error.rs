//! # Error Types
//!
//! Every failure in this crate is local to the operation that produced it:
//! a failed dispatch is logged and dropped, and the pool stays serviceable.
//! The `Result`s returned here exist so callers (and tests) can see why a
//! write or a notification went nowhere.

use core::fmt;

/// The primary error enum for the object pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ObjectError {
    /// The topic did not name an object, or no object has that name.
    ObjectNotFound,
    /// The topic did not name a property, or the object has no such property.
    PropertyNotFound,
    /// An encoded topic would not fit in `MAX_TOPIC_LEN` bytes.
    TopicTooLong { len: usize, max: usize },
    /// A payload would not fit in `MAX_PAYLOAD_LEN` bytes.
    PayloadTooLarge { len: usize, max: usize },
    /// The declaration table holds more objects than the pool can store.
    PoolFull { max: usize },
    /// The declaration table is malformed.
    InvalidDeclaration(InvalidDeclaration),
}

/// Describes what is wrong with a declaration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidDeclaration {
    /// An object or property name contains the topic separator.
    SeparatorInName,
    /// Two objects share a name.
    DuplicateObject,
    /// Two properties of the same object share a name.
    DuplicateProperty,
}

impl From<InvalidDeclaration> for ObjectError {
    fn from(err: InvalidDeclaration) -> Self {
        ObjectError::InvalidDeclaration(err)
    }
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectError::ObjectNotFound => write!(f, "object not found"),
            ObjectError::PropertyNotFound => write!(f, "property not found"),
            ObjectError::TopicTooLong { len, max } => {
                write!(f, "topic of {} bytes exceeds {} bytes", len, max)
            }
            ObjectError::PayloadTooLarge { len, max } => {
                write!(f, "payload of {} bytes exceeds {} bytes", len, max)
            }
            ObjectError::PoolFull { max } => write!(f, "pool holds at most {} objects", max),
            ObjectError::InvalidDeclaration(err) => write!(f, "invalid declaration: {}", err),
        }
    }
}

impl fmt::Display for InvalidDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidDeclaration::SeparatorInName => write!(f, "name contains '/'"),
            InvalidDeclaration::DuplicateObject => write!(f, "duplicate object name"),
            InvalidDeclaration::DuplicateProperty => write!(f, "duplicate property name"),
        }
    }
}

impl core::error::Error for ObjectError {}

pub type Result<T> = core::result::Result<T, ObjectError>;

//! Name lookups over the pool.
//!
//! Both lookups are linear scans with exact, case-sensitive comparison. The
//! tables are small and fixed when the firmware is built.

use super::instance::{ObjectInstance, PropertyHandle};
use super::pool::Pool;
use crate::error::{ObjectError, Result};
use crate::topic;

impl<const MAX_OBJECTS: usize> Pool<MAX_OBJECTS> {
    /// The first object called `name`.
    pub fn find_object(&self, name: &str) -> Option<&ObjectInstance> {
        self.iter().find(|object| object.name() == name)
    }

    /// Property `property` of object `object`.
    pub fn find_property(&self, object: &str, property: &str) -> Option<PropertyHandle<'_>> {
        self.find_object(object)?.find_property(property)
    }

    /// Decode `topic` and look up the property it addresses.
    pub fn resolve(&self, topic: &str) -> Result<PropertyHandle<'_>> {
        let segments = topic::decode(topic);
        let object = segments
            .object
            .and_then(|name| self.find_object(name))
            .ok_or(ObjectError::ObjectNotFound)?;
        segments
            .property
            .and_then(|name| object.find_property(name))
            .ok_or(ObjectError::PropertyNotFound)
    }
}

impl ObjectInstance {
    /// The first declared property called `name`.
    pub fn find_property(&self, name: &str) -> Option<PropertyHandle<'_>> {
        self.declaration()
            .properties()
            .find(|property| property.name == name)
            .map(|property| self.handle(property))
    }
}

//! Live objects and the property handles pointing into them.

use core::any::Any;
use core::cell::Cell;

use super::declaration::{ObjectDeclaration, PropertyDeclaration};
use super::scheduler::TaskHandle;
use crate::error::{ObjectError, Result};
use crate::topic::{self, Topic};
use crate::transport::Link;

/// Position of an object in its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObjectId(pub(crate) u16);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Number of distinct [`ObjectId`]s, and so the largest usable pool.
pub const MAX_OBJECT_IDS: usize = u16::MAX as usize + 1;

impl TryFrom<usize> for ObjectId {
    type Error = ObjectError;

    fn try_from(index: usize) -> Result<Self> {
        u16::try_from(index)
            .map(ObjectId)
            .map_err(|_| ObjectError::PoolFull {
                max: MAX_OBJECT_IDS,
            })
    }
}

/// The runtime counterpart of an [`ObjectDeclaration`].
///
/// Created once when the pool is built and kept until the pool is destroyed.
pub struct ObjectInstance {
    id: ObjectId,
    declaration: &'static ObjectDeclaration,
    user_data: Cell<Option<&'static dyn Any>>,
    link: Cell<Option<&'static dyn Link>>,
    daemon_task: Cell<Option<TaskHandle>>,
}

impl ObjectInstance {
    pub(crate) fn new(id: ObjectId, declaration: &'static ObjectDeclaration) -> Self {
        Self {
            id,
            declaration,
            user_data: Cell::new(None),
            link: Cell::new(None),
            daemon_task: Cell::new(None),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.declaration.name
    }

    pub fn declaration(&self) -> &'static ObjectDeclaration {
        self.declaration
    }

    /// Attach application state to this object.
    ///
    /// The pool never reads it; it is only handed back by [`Self::user_data`].
    /// Mutable state should sit behind a `Cell`, an atomic or a blocking mutex.
    pub fn set_user_data(&self, data: &'static dyn Any) {
        self.user_data.set(Some(data));
    }

    /// The attached application state, if any was set and it is a `T`.
    pub fn user_data<T: Any>(&self) -> Option<&'static T> {
        self.user_data.get()?.downcast_ref::<T>()
    }

    /// The active transport connection, `None` while disconnected.
    pub fn link(&self) -> Option<&'static dyn Link> {
        self.link.get()
    }

    pub fn is_connected(&self) -> bool {
        self.link.get().is_some()
    }

    /// Handle of the periodic daemon task, if one was registered.
    pub fn daemon_task(&self) -> Option<TaskHandle> {
        self.daemon_task.get()
    }

    pub(crate) fn bind_link(&self, link: Option<&'static dyn Link>) {
        self.link.set(link);
    }

    pub(crate) fn set_daemon_task(&self, task: Option<TaskHandle>) {
        self.daemon_task.set(task);
    }

    /// Build a handle for `declaration`, which must belong to this object.
    pub(crate) fn handle(&self, declaration: &'static PropertyDeclaration) -> PropertyHandle<'_> {
        PropertyHandle {
            object: self,
            declaration,
        }
    }
}

impl core::fmt::Debug for ObjectInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ObjectInstance")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("connected", &self.is_connected())
            .field("daemon_task", &self.daemon_task.get())
            .finish()
    }
}

/// Identifies one property of one live object for the duration of a call.
///
/// Handles are only produced by lookups on the pool, so the declaration
/// always belongs to the object.
#[derive(Clone, Copy)]
pub struct PropertyHandle<'a> {
    object: &'a ObjectInstance,
    declaration: &'static PropertyDeclaration,
}

impl<'a> PropertyHandle<'a> {
    pub fn object(&self) -> &'a ObjectInstance {
        self.object
    }

    pub fn declaration(&self) -> &'static PropertyDeclaration {
        self.declaration
    }

    pub fn name(&self) -> &'static str {
        self.declaration.name
    }

    /// Whether this handle targets the property called `name`.
    pub fn is(&self, name: &str) -> bool {
        self.declaration.name == name
    }

    /// The `object/property` topic of this property.
    pub fn topic(&self) -> Result<Topic> {
        topic::encode(self.object.name(), self.declaration.name)
    }
}

impl PartialEq for PropertyHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.object, other.object)
            && core::ptr::eq(self.declaration, other.declaration)
    }
}

impl Eq for PropertyHandle<'_> {}

impl core::fmt::Debug for PropertyHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("object", &self.object.name())
            .field("property", &self.declaration.name)
            .finish()
    }
}

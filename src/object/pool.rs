//! The object pool and its lifecycle.
//!
//! ```text
//!   Pool::new ──► Ready ──connect──► Connected
//!                   ▲                    │
//!                   └────disconnect──────┘
//!   Pool::destroy from either state cancels daemons and drops the pool.
//! ```
//!
//! Every transition is a single pass over the objects in declaration order.

use core::cell::Cell;

use embassy_time::Duration;
use heapless::Vec;

use super::declaration::{ObjectDeclaration, until_sentinel};
use super::instance::{ObjectId, ObjectInstance};
use super::scheduler::Scheduler;
use crate::error::{InvalidDeclaration, ObjectError, Result};
use crate::topic::{self, SEPARATOR};
use crate::transport::Link;

/// The live objects built from a declaration table.
///
/// The set of objects is fixed once the pool is built. Only the connection
/// binding, the daemon task handles and user data change afterwards.
pub struct Pool<const MAX_OBJECTS: usize> {
    objects: Vec<ObjectInstance, MAX_OBJECTS>,
    connected: Cell<bool>,
}

impl<const MAX_OBJECTS: usize> Pool<MAX_OBJECTS> {
    /// Build the pool from `declarations`, which may end with
    /// [`ObjectDeclaration::SENTINEL`].
    ///
    /// For each object in order: run its `init` hook, and if that requested a
    /// non-zero period and the object has a daemon, register the daemon with
    /// `scheduler` and run it once right away.
    ///
    /// The table is validated before any hook runs.
    pub fn new(
        declarations: &'static [ObjectDeclaration],
        scheduler: &mut dyn Scheduler,
    ) -> Result<Self> {
        validate(declarations, MAX_OBJECTS)?;

        let mut objects = Vec::new();
        for (index, declaration) in objects_of(declarations).enumerate() {
            let id = ObjectId::try_from(index)?;
            objects
                .push(ObjectInstance::new(id, declaration))
                .map_err(|_| ObjectError::PoolFull { max: MAX_OBJECTS })?;
            let object = &objects[index];

            let period = declaration.hooks.init(object);
            if let Some(daemon) = declaration.daemon
                && period > Duration::from_ticks(0)
            {
                match scheduler.register_periodic(id, period) {
                    Some(task) => object.set_daemon_task(Some(task)),
                    None => warn!("no daemon slot left for '{}'", declaration.name),
                }
                daemon.run(object);
            }
        }

        debug!("object pool ready with {} objects", objects.len());
        Ok(Self {
            objects,
            connected: Cell::new(false),
        })
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectInstance> {
        self.objects.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectInstance> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Ready → Connected.
    ///
    /// Binds `link` to every object, subscribes to every subscribable
    /// property, announces every publishable property and finally runs the
    /// object's `on_connect` hook.
    pub fn connect(&self, link: &'static dyn Link) {
        debug!("object pool connected");
        self.connected.set(true);

        for object in self.iter() {
            object.bind_link(Some(link));
            let declaration = object.declaration();

            for property in declaration.properties().filter(|p| p.is_subscribable()) {
                match topic::encode(object.name(), property.name) {
                    Ok(topic) => link.subscribe(&topic, property.qos),
                    Err(err) => warn!("cannot subscribe {}/{}: {}", object.name(), property.name, err),
                }
            }

            for property in declaration.properties().filter(|p| p.is_publishable()) {
                if let Err(err) = object.handle(property).notify() {
                    warn!("cannot announce {}/{}: {}", object.name(), property.name, err);
                }
            }

            declaration.hooks.on_connect(object);
        }
    }

    /// Connected → Ready.
    ///
    /// Unbinds the link so notifications become no-ops, then runs every
    /// `on_disconnect` hook. Daemons keep running.
    pub fn disconnect(&self) {
        debug!("object pool disconnected");
        self.connected.set(false);

        for object in self.iter() {
            object.bind_link(None);
            object.declaration().hooks.on_disconnect(object);
        }
    }

    /// Run the daemon of object `id`. This is the periodic task body.
    pub fn run_daemon(&self, id: ObjectId) {
        let Some(object) = self.get(id) else {
            warn!("daemon tick for unknown object {}", id.index());
            return;
        };
        if let Some(daemon) = object.declaration().daemon {
            trace!("daemon tick for '{}'", object.name());
            daemon.run(object);
        }
    }

    /// Cancel every daemon task and drop the pool.
    pub fn destroy(self, scheduler: &mut dyn Scheduler) {
        for object in self.iter() {
            if let Some(task) = object.daemon_task() {
                scheduler.cancel(task);
                object.set_daemon_task(None);
            }
            object.bind_link(None);
        }
        debug!("object pool destroyed");
    }
}

impl<const MAX_OBJECTS: usize> core::fmt::Debug for Pool<MAX_OBJECTS> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool")
            .field("objects", &self.objects.as_slice())
            .field("connected", &self.connected.get())
            .finish()
    }
}

fn objects_of(
    declarations: &'static [ObjectDeclaration],
) -> impl Iterator<Item = &'static ObjectDeclaration> {
    until_sentinel(declarations, |o| o.name)
}

fn validate(declarations: &'static [ObjectDeclaration], max: usize) -> Result<()> {
    let mut count = 0;
    for (index, object) in objects_of(declarations).enumerate() {
        count += 1;
        if object.name.contains(SEPARATOR) {
            return Err(InvalidDeclaration::SeparatorInName.into());
        }
        if objects_of(declarations)
            .take(index)
            .any(|other| other.name == object.name)
        {
            return Err(InvalidDeclaration::DuplicateObject.into());
        }

        for (index, property) in object.properties().enumerate() {
            if property.name.contains(SEPARATOR) {
                return Err(InvalidDeclaration::SeparatorInName.into());
            }
            if object
                .properties()
                .take(index)
                .any(|other| other.name == property.name)
            {
                return Err(InvalidDeclaration::DuplicateProperty.into());
            }
        }
    }

    if count > max {
        return Err(ObjectError::PoolFull { max });
    }
    Ok(())
}

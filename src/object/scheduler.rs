//! Periodic daemon scheduling.
//!
//! The pool only needs two things from a scheduler: register a periodic task
//! for an object and cancel it again. [`DaemonSchedule`] is the embassy-time
//! implementation driven by [`ObjectRuntime`](super::ObjectRuntime); firmware
//! with its own timer facility can implement [`Scheduler`] directly and call
//! [`Pool::run_daemon`](super::Pool::run_daemon) on every tick.

use embassy_time::{Duration, Instant, Timer};

use super::instance::ObjectId;

/// Identifies a registered periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle(u16);

impl TaskHandle {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u16 {
        self.0
    }
}

/// A facility running one periodic task per object.
pub trait Scheduler {
    /// Start calling the daemon of `object` every `period`.
    ///
    /// Returns `None` when the task could not be registered.
    fn register_periodic(&mut self, object: ObjectId, period: Duration) -> Option<TaskHandle>;

    /// Stop a task registered earlier.
    fn cancel(&mut self, task: TaskHandle);
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    object: ObjectId,
    period: Duration,
    deadline: Instant,
}

/// Fixed-capacity daemon schedule based on `embassy-time`.
pub struct DaemonSchedule<const MAX_TASKS: usize> {
    slots: [Option<Entry>; MAX_TASKS],
}

impl<const MAX_TASKS: usize> DaemonSchedule<MAX_TASKS> {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; MAX_TASKS],
        }
    }

    /// Register a task whose first tick is one `period` after `now`.
    pub fn register_at(
        &mut self,
        object: ObjectId,
        period: Duration,
        now: Instant,
    ) -> Option<TaskHandle> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        let handle = TaskHandle(u16::try_from(index).ok()?);
        *slot = Some(Entry {
            object,
            period,
            deadline: now + period,
        });
        Some(handle)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|e| e.deadline).min()
    }

    /// Pop the most overdue task at `now` and move its deadline forward.
    ///
    /// A task that fell more than a period behind is rescheduled relative to
    /// `now` instead of firing repeatedly to catch up.
    pub fn take_due(&mut self, now: Instant) -> Option<ObjectId> {
        let entry = self
            .slots
            .iter_mut()
            .flatten()
            .filter(|e| e.deadline <= now)
            .min_by_key(|e| e.deadline)?;

        entry.deadline += entry.period;
        if entry.deadline <= now {
            entry.deadline = now + entry.period;
        }
        Some(entry.object)
    }

    /// Wait for the next due task. Pends forever while nothing is registered.
    pub async fn next_tick(&mut self) -> ObjectId {
        loop {
            let Some(deadline) = self.next_deadline() else {
                return core::future::pending().await;
            };
            Timer::at(deadline).await;
            if let Some(object) = self.take_due(Instant::now()) {
                return object;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const MAX_TASKS: usize> Default for DaemonSchedule<MAX_TASKS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX_TASKS: usize> Scheduler for DaemonSchedule<MAX_TASKS> {
    fn register_periodic(&mut self, object: ObjectId, period: Duration) -> Option<TaskHandle> {
        self.register_at(object, period, Instant::now())
    }

    fn cancel(&mut self, task: TaskHandle) {
        if let Some(slot) = self.slots.get_mut(task.0 as usize) {
            *slot = None;
        }
    }
}

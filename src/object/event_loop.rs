//! The task that serialises everything touching the pool.
//!
//! Transport events (connect, disconnect, delivered messages) arrive over an
//! `embassy-sync` channel, daemon ticks come from a [`DaemonSchedule`]. The
//! runtime waits on both and handles one at a time, so handlers never run
//! concurrently with each other.

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver};

use super::declaration::ObjectDeclaration;
use super::pool::Pool;
use super::scheduler::DaemonSchedule;
use crate::error::Result;
use crate::packet::InboundMessage;
use crate::transport::Link;

/// A notification from the transport side.
pub enum LinkEvent {
    /// The client connected to the broker; requests go to this link.
    Connected(&'static dyn Link),
    Disconnected,
    Message(InboundMessage),
}

pub type LinkEventChannel<M, const DEPTH: usize> = Channel<M, LinkEvent, DEPTH>;

pub type LinkEventReceiver<'a, M, const DEPTH: usize> = Receiver<'a, M, LinkEvent, DEPTH>;

/// Drives a [`Pool`] from transport events and daemon ticks.
///
/// # Type Parameters
///
/// - `MAX_OBJECTS`: Pool capacity
/// - `MAX_TASKS`: Maximum number of objects with a running daemon
/// - `DEPTH`: Depth of the event channel
pub struct ObjectRuntime<
    'a,
    M: RawMutex,
    const MAX_OBJECTS: usize,
    const MAX_TASKS: usize,
    const DEPTH: usize,
> {
    pool: Pool<MAX_OBJECTS>,
    schedule: DaemonSchedule<MAX_TASKS>,
    events: LinkEventReceiver<'a, M, DEPTH>,
}

impl<'a, M: RawMutex, const MAX_OBJECTS: usize, const MAX_TASKS: usize, const DEPTH: usize>
    ObjectRuntime<'a, M, MAX_OBJECTS, MAX_TASKS, DEPTH>
{
    /// Build the pool from `declarations` and start its daemons.
    pub fn new(
        declarations: &'static [ObjectDeclaration],
        events: LinkEventReceiver<'a, M, DEPTH>,
    ) -> Result<Self> {
        let mut schedule = DaemonSchedule::new();
        let pool = Pool::new(declarations, &mut schedule)?;
        Ok(Self {
            pool,
            schedule,
            events,
        })
    }

    pub fn pool(&self) -> &Pool<MAX_OBJECTS> {
        &self.pool
    }

    pub fn schedule(&self) -> &DaemonSchedule<MAX_TASKS> {
        &self.schedule
    }

    /// Apply a single transport event to the pool.
    pub fn handle_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::Connected(link) => self.pool.connect(link),
            LinkEvent::Disconnected => self.pool.disconnect(),
            LinkEvent::Message(msg) => {
                // Failures are already logged by the dispatcher.
                let _ = self.pool.handle_message(&msg.as_publish());
            }
        }
    }

    /// Wait for the next event or daemon tick and handle it.
    pub async fn step(&mut self) {
        match select(self.events.receive(), self.schedule.next_tick()).await {
            Either::First(event) => self.handle_event(event),
            Either::Second(object) => self.pool.run_daemon(object),
        }
    }

    /// Handle events and daemon ticks forever.
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    /// Cancel all daemons and drop the pool.
    pub fn shutdown(self) {
        let Self {
            pool, mut schedule, ..
        } = self;
        pool.destroy(&mut schedule);
    }
}

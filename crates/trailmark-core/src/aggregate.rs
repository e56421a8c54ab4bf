//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// An exclusively-owned piece of run state that records what happened to it
/// as a buffer of uncommitted domain events.
///
/// The owner drains the buffer after each operation; draining commits the
/// events and advances [`AggregateRoot::version`].
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces.
    type Event: DomainEvent;

    /// Returns the aggregate identifier (the run id).
    fn aggregate_id(&self) -> Uuid;

    /// Returns the number of events committed so far.
    fn version(&self) -> i64;

    /// Returns events produced since the last drain.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Removes and returns the uncommitted events, committing them.
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event>;
}

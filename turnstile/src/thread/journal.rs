//! # Service Journal
//!
//! Optional record of everything that happened during a run: joins, acquires,
//! releases and actor exits. Actors send [`ServiceEvent`]s over an unbounded
//! channel; the station drains it once every actor has been joined.
//!
//! ## Ordering
//! Sends are serialized by the channel. An actor sends `Released` before it
//! returns a handle to the pool and `Acquired` after it takes one out, so the
//! journal order for any single resource follows the handle's real hand-offs.
//! `Joined` events carry the admission ticket, which orders joins exactly.

use flume::{Receiver, Sender};
use turnstile_api::event::ServiceEvent;

/// Sink for service events, or a no-op when journaling is disabled.
#[derive(Debug)]
pub struct Journal {
    channel: Option<(Sender<ServiceEvent>, Receiver<ServiceEvent>)>,
}

impl Journal {
    /// A journal that records every event.
    pub fn recording() -> Self {
        Self {
            channel: Some(flume::unbounded()),
        }
    }

    /// A journal that drops every event.
    pub fn disabled() -> Self {
        Self { channel: None }
    }

    pub fn is_recording(&self) -> bool {
        self.channel.is_some()
    }

    /// Records an event. The event is only built when the journal is recording.
    pub fn record<F>(&self, event: F)
    where
        F: FnOnce() -> ServiceEvent,
    {
        if let Some((tx, _)) = &self.channel {
            // The receiver lives as long as the journal, so the send cannot fail.
            let _ = tx.send(event());
        }
    }

    /// Takes every event recorded so far, in send order.
    pub fn drain(&self) -> Vec<ServiceEvent> {
        match &self.channel {
            Some((_, rx)) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use turnstile_api::types::{ActorId, ResourceId};

    fn acquired(actor: u32) -> ServiceEvent {
        ServiceEvent::Acquired {
            actor: ActorId::new(actor),
            resource: ResourceId::new(1),
            at: Duration::ZERO,
        }
    }

    #[test]
    fn test_recording_journal_keeps_order() {
        let journal = Journal::recording();
        journal.record(|| acquired(1));
        journal.record(|| acquired(2));

        let events = journal.drain();
        assert_eq!(events, vec![acquired(1), acquired(2)]);
        assert!(journal.drain().is_empty());
    }

    #[test]
    fn test_disabled_journal_skips_event_construction() {
        let journal = Journal::disabled();
        let mut built = false;
        journal.record(|| {
            built = true;
            acquired(1)
        });

        assert!(!built);
        assert!(!journal.is_recording());
        assert!(journal.drain().is_empty());
    }
}

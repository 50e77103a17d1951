//! Event channel implementation using crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sends events from the engine to whoever is listening.
///
/// Cheap to clone and shareable across rayon workers. A sender made by
/// [`null_sender`] has no channel behind it and drops every event.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Send an event; discarded when nobody listens.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }

    /// Whether a channel sits behind this sender.
    ///
    /// Callers building costly events (paths, messages) check this first.
    pub fn is_listening(&self) -> bool {
        self.inner.is_some()
    }
}

/// Receives events emitted by the engine.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Iterate over received events; ends once every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    ///
    /// Unbounded so a slow progress display never stalls pair scoring.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender {
                inner: Some(sender),
            },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender with no receiver, for runs without a UI.
pub fn null_sender() -> EventSender {
    EventSender::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LoadEvent, PipelineEvent};
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Load(LoadEvent::Completed { total_images: 12 }));
        });

        handle.join().unwrap();

        match receiver.iter().next() {
            Some(Event::Load(LoadEvent::Completed { total_images })) => {
                assert_eq!(total_images, 12);
            }
            _ => panic!("Wrong event type"),
        };
    }

    #[test]
    fn null_sender_discards_events() {
        let sender = null_sender();
        assert!(!sender.is_listening());
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn sending_after_receiver_drops_is_silent() {
        let (sender, receiver) = EventChannel::new();
        assert!(sender.is_listening());

        drop(receiver);

        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn receiver_iteration_ends_when_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        let clone = sender.clone();
        sender.send(Event::Pipeline(PipelineEvent::Started));
        clone.send(Event::Pipeline(PipelineEvent::Started));
        drop(sender);
        drop(clone);

        assert_eq!(receiver.iter().count(), 2);
    }
}

//! Hands events from producers to the writer thread
//!
//! With a positive capacity the queue is a bounded buffer and producers only
//! block while it is full. With capacity 0 it is a rendezvous channel and
//! every producer waits until the writer has synced its entry to disk.

use crate::event::{LogEvent, Message};
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;

/// Outcome of handing an event to the writer
#[derive(Debug)]
pub(crate) enum Delivery {
    /// Buffered; the writer will get to it
    Queued,
    /// Written and synced
    Durable,
    /// Accepted, but the writer exited before acknowledging it
    Lost,
    /// The queue is closed; the event comes back to the caller
    Rejected(LogEvent),
}

pub(crate) struct Dispatcher {
    /// `None` once the pipeline is stopping
    sender: RwLock<Option<Sender<Message>>>,
    synchronous: bool,
}

impl Dispatcher {
    /// Create the producer side and the writer's receiver
    pub(crate) fn new(capacity: usize) -> (Self, Receiver<Message>) {
        let (sender, receiver) = channel::bounded(capacity);
        let dispatcher = Self {
            sender: RwLock::new(Some(sender)),
            synchronous: capacity == 0,
        };
        (dispatcher, receiver)
    }

    pub(crate) const fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Send `event` to the writer.
    ///
    /// Waits for durability in synchronous mode or when `wait` is set.
    pub(crate) fn dispatch(&self, event: LogEvent, wait: bool) -> Delivery {
        let (ack, done) = if wait || self.synchronous {
            let (ack, done) = channel::bounded(1);
            (Some(ack), Some(done))
        } else {
            (None, None)
        };

        if let Err(message) = self.send(Message::Event { event, ack }) {
            return match message {
                Message::Event { event, .. } => Delivery::Rejected(event),
                Message::Flush(_) => Delivery::Lost,
            };
        }

        match done {
            Some(done) => match done.recv() {
                Ok(()) => Delivery::Durable,
                Err(_) => Delivery::Lost,
            },
            None => Delivery::Queued,
        }
    }

    /// Ask the writer to sync everything received so far; returns once it
    /// has, or immediately if the queue is closed
    pub(crate) fn flush(&self) -> bool {
        let (ack, done) = channel::bounded(1);
        if self.send(Message::Flush(ack)).is_err() {
            return false;
        }
        done.recv().is_ok()
    }

    /// Close the queue. Sends already in progress complete first; later
    /// sends are rejected. The writer drains what is buffered and exits.
    pub(crate) fn close(&self) {
        self.sender.write().take();
    }

    fn send(&self, message: Message) -> Result<(), Message> {
        let guard = self.sender.read();
        match guard.as_ref() {
            Some(sender) => sender.send(message).map_err(|e| e.into_inner()),
            None => Err(message),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("open", &self.sender.read().is_some())
            .field("synchronous", &self.synchronous)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn event(message: &str) -> LogEvent {
        LogEvent {
            message: message.to_string(),
            ..LogEvent::default()
        }
    }

    #[test]
    fn async_mode_queues_without_waiting() {
        let (dispatcher, receiver) = Dispatcher::new(4);
        assert!(!dispatcher.is_synchronous());

        assert!(matches!(dispatcher.dispatch(event("a"), false), Delivery::Queued));
        assert!(matches!(dispatcher.dispatch(event("b"), false), Delivery::Queued));

        let received: Vec<_> = receiver
            .try_iter()
            .map(|message| match message {
                Message::Event { event, ack } => {
                    assert!(ack.is_none());
                    event.message
                }
                Message::Flush(_) => panic!("unexpected flush"),
            })
            .collect();
        assert_eq!(received, ["a", "b"]);
    }

    #[test]
    fn sync_mode_waits_for_acknowledgement() {
        let (dispatcher, receiver) = Dispatcher::new(0);
        assert!(dispatcher.is_synchronous());

        let writer = thread::spawn(move || {
            let Ok(Message::Event { event, ack }) = receiver.recv() else {
                panic!("expected an event");
            };
            thread::sleep(Duration::from_millis(20));
            ack.expect("sync sends carry an ack").send(()).unwrap();
            event.message
        });

        assert!(matches!(dispatcher.dispatch(event("now"), false), Delivery::Durable));
        assert_eq!(writer.join().unwrap(), "now");
    }

    #[test]
    fn closed_queue_returns_the_event() {
        let (dispatcher, _receiver) = Dispatcher::new(4);
        dispatcher.close();

        match dispatcher.dispatch(event("late"), false) {
            Delivery::Rejected(event) => assert_eq!(event.message, "late"),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(!dispatcher.flush());
    }

    #[test]
    fn writer_exit_before_ack_is_lost() {
        let (dispatcher, receiver) = Dispatcher::new(4);

        let writer = thread::spawn(move || {
            // take the message and exit without acknowledging
            let _ = receiver.recv();
        });

        assert!(matches!(dispatcher.dispatch(event("x"), true), Delivery::Lost));
        writer.join().unwrap();
    }

    #[test]
    fn dropped_receiver_rejects() {
        let (dispatcher, receiver) = Dispatcher::new(4);
        drop(receiver);

        assert!(matches!(
            dispatcher.dispatch(event("x"), false),
            Delivery::Rejected(_)
        ));
    }
}

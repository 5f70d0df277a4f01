use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::environment::LoadOutcome;
use crate::sync::{ConnectionId, TransportEvent};

#[derive(Debug)]
pub enum SessionEvent {
    Transport {
        connection: ConnectionId,
        event: TransportEvent,
    },
    EnvironmentLoaded(LoadOutcome),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<SessionEvent>,
}

impl EventSender {
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    pub fn drain_into(&self, out: &mut Vec<SessionEvent>) -> usize {
        let mut drained = 0usize;
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    out.push(event);
                    drained += 1;
                }
                // The queue holds its own sender, so disconnection cannot happen here.
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }
}

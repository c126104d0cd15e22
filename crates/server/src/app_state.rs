use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::bridge::{ConnectionId, InboundEvent};

pub(crate) struct AppState {
    pub(crate) events: mpsc::Sender<InboundEvent>,
    next_connection: AtomicU64,
}

impl AppState {
    pub(crate) fn new(events: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            events,
            next_connection: AtomicU64::new(1),
        }
    }

    pub(crate) fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }
}

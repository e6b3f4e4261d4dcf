use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::session::{GimbalLink, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    PowerOn,
    Sent(String),
    Close,
}

/// In-memory link recording every call with the (possibly paused) tokio clock.
#[derive(Clone, Default)]
pub struct RecordingLink {
    events: Arc<Mutex<Vec<(Instant, LinkEvent)>>>,
    fail_on_send: Option<usize>,
    sends: usize,
    closed: bool,
    pending_response: Arc<Mutex<String>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The n-th send (0-based) fails like a reset connection.
    pub fn failing_on_send(n: usize) -> Self {
        Self {
            fail_on_send: Some(n),
            ..Self::default()
        }
    }

    pub fn push_response(&self, response: &str) {
        self.pending_response.lock().unwrap().push_str(response);
    }

    pub fn events(&self) -> Vec<LinkEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn send_times(&self) -> Vec<Instant> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, event)| matches!(event, LinkEvent::Sent(_)))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                LinkEvent::Sent(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == LinkEvent::Close)
            .count()
    }

    fn record(&self, event: LinkEvent) {
        self.events.lock().unwrap().push((Instant::now(), event));
    }
}

#[async_trait]
impl GimbalLink for RecordingLink {
    async fn power_on(&mut self) -> Result<(), SessionError> {
        self.record(LinkEvent::PowerOn);
        Ok(())
    }

    async fn send(&mut self, command: &str) -> Result<(), SessionError> {
        let index = self.sends;
        self.sends += 1;

        if self.closed || self.fail_on_send == Some(index) {
            return Err(SessionError::Transport {
                addr: "recording".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"),
            });
        }

        self.record(LinkEvent::Sent(command.to_string()));
        Ok(())
    }

    fn receive(&mut self) -> String {
        std::mem::take(&mut *self.pending_response.lock().unwrap())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.record(LinkEvent::Close);
        Ok(())
    }
}

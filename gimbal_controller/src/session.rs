use std::{io, time::Duration};

use async_trait::async_trait;
use ptu::encode_home;
use tracing::{debug, info, trace, warn};
use utilities::tcp_link::TcpLink;

use crate::config::GimbalConfig;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to connect to gimbal at {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to send to gimbal at {addr}: {source}")]
    Transport {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// Write side of a gimbal connection as seen by the sequencer and run controller.
#[async_trait]
pub trait GimbalLink: Send {
    /// Connects, homes and waits for the gimbal to settle.
    async fn power_on(&mut self) -> Result<(), SessionError>;

    async fn send(&mut self, command: &str) -> Result<(), SessionError>;

    async fn home(&mut self) -> Result<(), SessionError> {
        self.send(encode_home()).await
    }

    /// Returns and clears whatever the gimbal has sent so far.
    fn receive(&mut self) -> String;

    /// Homes, settles and releases the connection. Acts at most once.
    async fn close(&mut self) -> Result<(), SessionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Connected,
    Closed,
}

pub struct Session {
    link: TcpLink,
    response: Vec<u8>,
    settle_delay: Duration,
    state: SessionState,
}

impl Session {
    pub fn new(link: TcpLink, settle_delay: Duration) -> Self {
        Self {
            link,
            response: Vec::new(),
            settle_delay,
            state: SessionState::Idle,
        }
    }

    pub fn from_config(config: &GimbalConfig) -> Self {
        let link = TcpLink::new(
            config.connection.host.clone(),
            config.connection.port,
            config.connection.connect_timeout(),
            config.connection.write_timeout(),
        );

        Self::new(link, config.motion.settle_delay())
    }

    pub fn addr(&self) -> String {
        self.link.addr()
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::Connection {
                addr: self.addr(),
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "Session was already connected once",
                ),
            });
        }

        self.link
            .connect()
            .await
            .map_err(|source| SessionError::Connection {
                addr: self.link.addr(),
                source,
            })?;

        self.state = SessionState::Connected;
        info!(addr = %self.addr(), "connected to gimbal");

        Ok(())
    }

    pub fn get_response(&mut self) -> String {
        if let Err(e) = self.link.drain(&mut self.response) {
            debug!(error = %e, "failed to read gimbal response");
        }

        let output = String::from_utf8_lossy(&self.response).into_owned();
        self.response.clear();
        output
    }

    fn not_open(&self, reason: &str) -> SessionError {
        SessionError::Transport {
            addr: self.addr(),
            source: io::Error::new(io::ErrorKind::NotConnected, reason.to_string()),
        }
    }
}

#[async_trait]
impl GimbalLink for Session {
    async fn power_on(&mut self) -> Result<(), SessionError> {
        self.connect().await?;
        self.home().await?;
        tokio::time::sleep(self.settle_delay).await;

        Ok(())
    }

    async fn send(&mut self, command: &str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Connected => {}
            SessionState::Idle => return Err(self.not_open("Session is not connected")),
            SessionState::Closed => return Err(self.not_open("Session is closed")),
        }

        trace!(command = %command.escape_debug(), "sending");

        self.link
            .write_all(command.as_bytes())
            .await
            .map_err(|source| SessionError::Transport {
                addr: self.link.addr(),
                source,
            })
    }

    fn receive(&mut self) -> String {
        self.get_response()
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Closed => {
                debug!("session already closed");
                return Ok(());
            }
            SessionState::Idle => {
                self.state = SessionState::Closed;
                return Ok(());
            }
            SessionState::Connected => {}
        }

        info!(addr = %self.addr(), "homing gimbal before disconnect");

        let homed = self.home().await;
        if homed.is_ok() {
            tokio::time::sleep(self.settle_delay).await;
        }

        self.state = SessionState::Closed;
        let released = self.link.shutdown().await;

        homed?;
        released.map_err(|source| SessionError::Transport {
            addr: self.link.addr(),
            source,
        })?;

        info!(addr = %self.addr(), "gimbal connection closed");

        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state == SessionState::Connected && self.link.is_connected() {
            warn!(addr = %self.addr(), "releasing gimbal connection without homing");
        }
    }
}

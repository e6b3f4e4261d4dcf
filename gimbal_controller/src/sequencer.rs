use std::time::Duration;

use ptu::SweepPattern;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::MotionConfig,
    session::{GimbalLink, SessionError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    /// Shutdown was requested; the rest of the sweep was abandoned.
    Interrupted,
}

pub struct RotationSequencer {
    pattern: SweepPattern,
    abs_max: i32,
    delay: Duration,
}

impl RotationSequencer {
    pub fn new(pattern: SweepPattern, abs_max: i32, delay: Duration) -> Self {
        Self {
            pattern,
            abs_max,
            delay,
        }
    }

    pub fn from_config(config: &MotionConfig) -> Self {
        Self::new(config.pattern, config.abs_max, config.delay())
    }

    pub fn full_rotation_sequence(&self) -> Vec<String> {
        self.pattern.commands(self.abs_max)
    }

    /// One sweep followed by a dwell at the last position, so consecutive
    /// sweeps stay a full delay apart.
    pub async fn full_rotation<L: GimbalLink>(
        &self,
        link: &mut L,
        shutdown: &CancellationToken,
    ) -> Result<SweepOutcome, SessionError> {
        info!(pattern = %self.pattern, "starting sweep");

        let sequence = self.full_rotation_sequence();
        if self.send_sequence(link, &sequence, shutdown).await? == SweepOutcome::Interrupted {
            return Ok(SweepOutcome::Interrupted);
        }

        if !self.pause(shutdown).await {
            return Ok(SweepOutcome::Interrupted);
        }

        Ok(SweepOutcome::Completed)
    }

    /// Sends every command in order with the delay between consecutive sends.
    pub async fn send_sequence<L: GimbalLink>(
        &self,
        link: &mut L,
        sequence: &[String],
        shutdown: &CancellationToken,
    ) -> Result<SweepOutcome, SessionError> {
        for (index, command) in sequence.iter().enumerate() {
            if index > 0 && !self.pause(shutdown).await {
                debug!(sent = index, total = sequence.len(), "sweep interrupted");
                return Ok(SweepOutcome::Interrupted);
            }

            if shutdown.is_cancelled() {
                return Ok(SweepOutcome::Interrupted);
            }

            link.send(command).await?;
        }

        Ok(SweepOutcome::Completed)
    }

    /// Waits one delay. Returns `false` if shutdown was requested meanwhile.
    async fn pause(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.delay) => true,
        }
    }
}

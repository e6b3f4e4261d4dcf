use std::{fmt, time::Duration};

use anyhow::{Context as _, bail};
use ptu::Movement;
use tokio::{sync::mpsc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    sequencer::{RotationSequencer, SweepOutcome},
    session::{GimbalLink, SessionError},
};

/// Mode flags as requested by the operator; several may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSelection {
    pub manual: bool,
    pub continuous: bool,
    /// Seconds; zero disables.
    pub timespan: u64,
    /// Zero disables.
    pub repetitions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Manual,
    Continuous,
    Timespan(Duration),
    Repetitions(u32),
}

impl RunMode {
    /// Manual wins over continuous, continuous over timespan, timespan over
    /// repetitions.
    pub fn select(selection: &RunSelection) -> Option<RunMode> {
        if selection.manual {
            Some(RunMode::Manual)
        } else if selection.continuous {
            Some(RunMode::Continuous)
        } else if selection.timespan > 0 {
            Some(RunMode::Timespan(Duration::from_secs(selection.timespan)))
        } else if selection.repetitions > 0 {
            Some(RunMode::Repetitions(selection.repetitions))
        } else {
            None
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Manual => write!(f, "manual"),
            RunMode::Continuous => write!(f, "continuous"),
            RunMode::Timespan(span) => write!(f, "timespan ({}s)", span.as_secs()),
            RunMode::Repetitions(n) => write!(f, "repetitions ({})", n),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// `None` when no mode was selected and nothing was done.
    pub mode: Option<RunMode>,
    pub sweeps: u32,
    pub moves: u32,
    pub interrupted: bool,
    /// Whether the session was homed and released.
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Finished,
    Interrupted,
    SourceClosed,
}

/// Owns the gimbal link for the whole run and guarantees the closing
/// transition on every exit path except a completed repetitions run.
pub struct RunController<L: GimbalLink> {
    link: L,
    sequencer: RotationSequencer,
    shutdown: CancellationToken,
    movements: Option<mpsc::Receiver<Movement>>,
}

impl<L: GimbalLink> RunController<L> {
    pub fn new(link: L, sequencer: RotationSequencer, shutdown: CancellationToken) -> Self {
        Self {
            link,
            sequencer,
            shutdown,
            movements: None,
        }
    }

    /// Queue drained by manual mode. Its single consumer serializes sends.
    pub fn with_movements(mut self, movements: mpsc::Receiver<Movement>) -> Self {
        self.movements = Some(movements);
        self
    }

    pub async fn run(mut self, mode: Option<RunMode>) -> anyhow::Result<RunReport> {
        let Some(mode) = mode else {
            warn!("no run mode selected, gimbal left untouched");
            return Ok(RunReport::default());
        };

        if mode == RunMode::Manual && self.movements.is_none() {
            bail!("manual mode needs a movement source");
        }

        info!(%mode, "powering on gimbal");

        if let Err(e) = self.link.power_on().await {
            if !matches!(e, SessionError::Connection { .. }) {
                self.close_after_failure().await;
            }
            return Err(e).context("Failed to power on gimbal");
        }

        let mut report = RunReport {
            mode: Some(mode),
            ..RunReport::default()
        };

        match self.drive(mode, &mut report).await {
            Ok(Stop::Finished) if matches!(mode, RunMode::Repetitions(_)) => {
                info!(sweeps = report.sweeps, "repetitions complete");
                Ok(report)
            }
            Ok(stop) => {
                report.interrupted = stop == Stop::Interrupted;
                info!(%mode, ?stop, "run stopped");

                self.link
                    .close()
                    .await
                    .context("Failed to close gimbal session")?;
                report.closed = true;

                Ok(report)
            }
            Err(e) => {
                error!(%mode, error = %e, "run failed, homing gimbal before exit");
                self.close_after_failure().await;

                Err(e).with_context(|| format!("{} run failed", mode))
            }
        }
    }

    async fn drive(&mut self, mode: RunMode, report: &mut RunReport) -> anyhow::Result<Stop> {
        match mode {
            RunMode::Manual => self.drive_manual(report).await,
            RunMode::Continuous => loop {
                if self.sweep(report).await? == SweepOutcome::Interrupted {
                    return Ok(Stop::Interrupted);
                }
            },
            RunMode::Timespan(span) => {
                // A span past the clock's range never ends on its own.
                let deadline = Instant::now().checked_add(span);
                if deadline.is_none() {
                    warn!(%mode, "timespan exceeds the clock range, sweeping until interrupted");
                }

                while deadline.is_none_or(|deadline| Instant::now() < deadline) {
                    if self.sweep(report).await? == SweepOutcome::Interrupted {
                        return Ok(Stop::Interrupted);
                    }
                }
                Ok(Stop::Finished)
            }
            RunMode::Repetitions(n) => {
                for _ in 0..n {
                    if self.sweep(report).await? == SweepOutcome::Interrupted {
                        return Ok(Stop::Interrupted);
                    }
                }
                Ok(Stop::Finished)
            }
        }
    }

    async fn sweep(&mut self, report: &mut RunReport) -> Result<SweepOutcome, SessionError> {
        let outcome = self
            .sequencer
            .full_rotation(&mut self.link, &self.shutdown)
            .await?;

        if outcome == SweepOutcome::Completed {
            report.sweeps += 1;
        }

        Ok(outcome)
    }

    async fn drive_manual(&mut self, report: &mut RunReport) -> anyhow::Result<Stop> {
        let movements = self
            .movements
            .as_mut()
            .context("manual mode needs a movement source")?;

        loop {
            let movement = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return Ok(Stop::Interrupted),
                movement = movements.recv() => movement,
            };

            let Some(movement) = movement else {
                info!("movement source closed");
                return Ok(Stop::SourceClosed);
            };

            self.link.send(movement.command()).await?;
            report.moves += 1;

            let response = self.link.receive();
            if !response.is_empty() {
                info!(%movement, response = %response.trim_end(), "gimbal replied");
            }
        }
    }

    async fn close_after_failure(&mut self) {
        if let Err(e) = self.link.close().await {
            error!(error = %e, "failed to home gimbal during cleanup");
        }
    }
}

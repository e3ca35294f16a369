//! Dispense sequencing state machine.
//!
//! Turns a selected shade into the rig command stream and tracks
//! progress from the inbound status events:
//! `Idle -> Dispensing(position) -> Complete`, with transitions to
//! `Error` on channel failure or a rig-reported error. A terminal
//! `sequence_complete` is held for a settle delay so physical motion
//! finishes before the caller is unblocked. `Home` is independent of
//! the dispensing state and may be issued at any time.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::channel::{ChannelError, CommandChannel};
use super::messages::{RigCommand, RigStatus};
use crate::catalog::{CatalogError, Season, ShadeCatalog};

/// Pause after a terminal status before the sequence is considered
/// complete, so the rig's physical motion can finish.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);

/// Errors from the dispensing flow.
#[derive(Debug, Error)]
pub enum DispenseError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A dispensing sequence is already in flight. The source leaves
    /// concurrent triggers undefined; this implementation rejects them.
    #[error("a dispensing sequence is already in flight")]
    Busy,

    #[error("rig reported an error: {0}")]
    RigReported(String),
}

/// Sequencer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispenseState {
    Idle,
    Dispensing { position: usize },
    Complete,
    Error,
}

/// Session status surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Moving,
    SequenceComplete,
    Error,
}

/// Caller-facing snapshot of the dispensing session.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispenseSession {
    pub status: SessionStatus,
    pub current_position: usize,
}

/// Drives one dispensing session at a time over the rig channel.
pub struct DispenseSequencer {
    catalog: Arc<dyn ShadeCatalog>,
    commands: mpsc::Sender<RigCommand>,
    statuses: mpsc::Receiver<RigStatus>,
    settle_delay: Duration,
    state: DispenseState,
    last_error: Option<String>,
}

impl DispenseSequencer {
    /// Attach a sequencer to a connected channel.
    pub async fn attach(catalog: Arc<dyn ShadeCatalog>, channel: &CommandChannel) -> Self {
        let statuses = channel.subscribe().await;
        Self::from_parts(catalog, channel.command_sender(), statuses)
    }

    /// Build a sequencer from the raw channel halves.
    pub fn from_parts(
        catalog: Arc<dyn ShadeCatalog>,
        commands: mpsc::Sender<RigCommand>,
        statuses: mpsc::Receiver<RigStatus>,
    ) -> Self {
        Self {
            catalog,
            commands,
            statuses,
            settle_delay: DEFAULT_SETTLE_DELAY,
            state: DispenseState::Idle,
            last_error: None,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn state(&self) -> &DispenseState {
        &self.state
    }

    /// Snapshot for status feedback to the caller.
    pub fn session(&self) -> DispenseSession {
        let (status, current_position) = match &self.state {
            DispenseState::Idle => (SessionStatus::Idle, 0),
            DispenseState::Dispensing { position } => (SessionStatus::Moving, *position),
            DispenseState::Complete => (SessionStatus::SequenceComplete, 0),
            DispenseState::Error => (SessionStatus::Error, 0),
        };
        DispenseSession {
            status,
            current_position,
        }
    }

    /// Resolve a shade and start its blend sequence.
    ///
    /// Rejects with [`DispenseError::Busy`] while a sequence is in
    /// flight. On channel failure the state machine moves to `Error`;
    /// recovery requires [`reset`](Self::reset) and a fresh trigger.
    pub async fn select_shade(
        &mut self,
        season: Season,
        shade_name: &str,
    ) -> Result<(), DispenseError> {
        if matches!(self.state, DispenseState::Dispensing { .. }) {
            return Err(DispenseError::Busy);
        }

        let shade = self.catalog.lookup(season, shade_name).await?;
        let command = RigCommand::move_for(shade.name.clone(), &shade.ingredients);
        info!(shade = %shade.name, pumps = shade.ingredients.total_pumps(), "starting dispense sequence");

        if let Err(e) = self.commands.send(command).await {
            warn!(error = %e, "rig command send failed");
            self.state = DispenseState::Error;
            return Err(ChannelError::Closed.into());
        }
        self.state = DispenseState::Dispensing { position: 0 };
        Ok(())
    }

    /// Apply one inbound status event.
    ///
    /// `moving_<n>` events only reflect progress (position is 0-indexed,
    /// the wire is 1-based); they never change the state. A terminal
    /// `sequence_complete` moves to `Complete` after the settle delay.
    pub async fn apply_status(&mut self, status: RigStatus) {
        match status {
            RigStatus::Moving(step) => {
                if let DispenseState::Dispensing { position } = &mut self.state {
                    *position = step.saturating_sub(1) as usize;
                    debug!(position = *position, "dispense progress");
                }
            }
            RigStatus::SequenceComplete => {
                if matches!(self.state, DispenseState::Dispensing { .. }) {
                    tokio::time::sleep(self.settle_delay).await;
                    self.state = DispenseState::Complete;
                    info!("dispense sequence complete");
                }
            }
            RigStatus::Error(message) => {
                warn!(error = %message, "rig reported an error");
                self.last_error = Some(message);
                self.state = DispenseState::Error;
            }
            RigStatus::HomeReached | RigStatus::AlreadyHome => {
                debug!(?status, "rig home status");
            }
            RigStatus::Other(status) => {
                debug!(%status, "unhandled rig status");
            }
        }
    }

    /// Drain status events until the in-flight sequence terminates.
    ///
    /// Returns the final session snapshot, or the rig/channel error that
    /// ended the sequence.
    pub async fn run_to_completion(&mut self) -> Result<DispenseSession, DispenseError> {
        while matches!(self.state, DispenseState::Dispensing { .. }) {
            match self.statuses.recv().await {
                Some(status) => self.apply_status(status).await,
                None => {
                    warn!("status stream ended while dispensing");
                    self.state = DispenseState::Error;
                    return Err(ChannelError::Closed.into());
                }
            }
        }
        match &self.state {
            DispenseState::Error => Err(DispenseError::RigReported(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "rig channel failed".to_string()),
            )),
            _ => Ok(self.session()),
        }
    }

    /// Send the rig to its home position. Independent of the dispensing
    /// state; does not touch the state machine.
    pub async fn return_home(&mut self) -> Result<(), DispenseError> {
        self.commands
            .send(RigCommand::Home)
            .await
            .map_err(|_| ChannelError::Closed)?;
        Ok(())
    }

    /// Best-effort home used when navigating away: failures are logged
    /// and swallowed so navigation never blocks on the rig.
    pub async fn home_best_effort(&mut self) {
        if let Err(e) = self.return_home().await {
            warn!(error = %e, "best-effort home failed");
        }
    }

    /// Reset the session back to `Idle` (navigation away, explicit
    /// reset, or manual retry after `Error`).
    pub fn reset(&mut self) {
        self.state = DispenseState::Idle;
        self.last_error = None;
    }
}

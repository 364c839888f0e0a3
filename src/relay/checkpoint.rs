//! Checkpoint inclusion polling and exit proof construction.
//!
//! A child-chain transaction can only be proven to the root chain once the
//! bridge has included it in a checkpoint. [`CheckpointProofService`] polls
//! for that on a [`PollSchedule`], can be cancelled through a
//! [`CancelToken`], and gives up with `NotCheckpointed` after the
//! configured timeout.

use super::traits::BridgeClient;
use crate::config::BridgeConfig;
use crate::error::{ZdaoError, ZdaoResult};
use crate::types::{RelayProof, TxHash};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Signature of the message-sent event the child tunnel emits.
pub const MESSAGE_SENT_EVENT_SIG: &str =
    "0x8c5261668696ce22758910d05bab8f186d6eb247ceac2af2e82c7dc17669b036";

/// Shortest delay between two polls.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Create a connected cancel handle and token.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Owner side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of a cancellation signal. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. Pends forever if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Delay between checkpoint polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// Cap for exponential growth.
    pub max_interval: Duration,
    pub exponential: bool,
    /// Give up after this long; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl PollSchedule {
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn fixed(interval: Duration) -> Self {
        let interval = interval.max(MIN_POLL_INTERVAL);
        Self {
            interval,
            max_interval: interval,
            exponential: false,
            timeout: None,
        }
    }

    pub fn exponential(interval: Duration, max_interval: Duration) -> Self {
        let interval = interval.max(MIN_POLL_INTERVAL);
        Self {
            interval,
            max_interval,
            exponential: true,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_config(config: &BridgeConfig) -> ZdaoResult<Self> {
        Ok(Self {
            interval: config.poll_interval()?,
            max_interval: config.max_poll_interval()?,
            exponential: config.exponential_backoff,
            timeout: config.timeout()?,
        })
    }

    /// Delay after poll number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let interval = self.interval.max(MIN_POLL_INTERVAL);
        if !self.exponential {
            return interval;
        }
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        interval
            .saturating_mul(factor)
            .min(self.max_interval.max(interval))
    }
}

/// Polls the bridge and builds exit proofs.
#[derive(Clone)]
pub struct CheckpointProofService {
    bridge: Arc<dyn BridgeClient>,
}

impl CheckpointProofService {
    pub fn new(bridge: Arc<dyn BridgeClient>) -> Self {
        Self { bridge }
    }

    pub async fn is_checkpointed(&self, tx_hash: &TxHash) -> ZdaoResult<bool> {
        Ok(self.bridge.is_checkpointed(tx_hash).await?)
    }

    /// Wait until `tx_hash` is checkpointed, then build its exit proof.
    ///
    /// Transient bridge errors count as "not yet" and are retried at the
    /// next tick. Cancellation is observed while polling, while sleeping
    /// and while the proof is built.
    #[instrument(skip(self, tx_hash, schedule, cancel), fields(tx = %tx_hash))]
    pub async fn wait_for_checkpoint(
        &self,
        tx_hash: &TxHash,
        schedule: &PollSchedule,
        cancel: &CancelToken,
    ) -> ZdaoResult<RelayProof> {
        let started = Instant::now();
        let deadline = schedule.timeout.map(|t| started + t);
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(canceled(tx_hash));
            }

            let polled = tokio::select! {
                _ = cancel.cancelled() => return Err(canceled(tx_hash)),
                polled = self.bridge.is_checkpointed(tx_hash) => polled,
            };

            match polled {
                Ok(true) => break,
                Ok(false) => debug!(attempt, "not checkpointed yet"),
                Err(e) if e.is_transient() => {
                    warn!(attempt, error = %e, "checkpoint poll failed, retrying next tick")
                }
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            let mut wake = now + schedule.delay(attempt);
            if let Some(deadline) = deadline {
                if now >= deadline {
                    return Err(ZdaoError::NotCheckpointed {
                        tx_hash: tx_hash.to_string(),
                        waited: elapsed_ms(started),
                    });
                }
                wake = wake.min(deadline);
            }
            attempt = attempt.saturating_add(1);

            tokio::select! {
                _ = cancel.cancelled() => return Err(canceled(tx_hash)),
                _ = tokio::time::sleep_until(wake) => {}
            }
        }

        info!(
            polls = attempt + 1,
            waited_ms = started.elapsed().as_millis() as u64,
            "transaction checkpointed"
        );
        tokio::select! {
            _ = cancel.cancelled() => Err(canceled(tx_hash)),
            proof = self.build_proof(tx_hash) => proof,
        }
    }

    /// Build the exit proof for an already checkpointed transaction.
    ///
    /// Bridge errors are returned as `FailedTx` on the first failure.
    pub async fn build_proof(&self, tx_hash: &TxHash) -> ZdaoResult<RelayProof> {
        let payload = self
            .bridge
            .build_exit_proof(tx_hash, MESSAGE_SENT_EVENT_SIG)
            .await?;

        debug!(tx = %tx_hash, bytes = payload.len(), "built exit proof");
        Ok(RelayProof {
            tx_hash: *tx_hash,
            payload,
        })
    }
}

fn elapsed_ms(started: Instant) -> Duration {
    Duration::from_millis(started.elapsed().as_millis() as u64)
}

fn canceled(tx_hash: &TxHash) -> ZdaoError {
    ZdaoError::Canceled(format!("checkpoint wait for {}", tx_hash))
}

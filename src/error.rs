//! Error taxonomy for the synchronization engine.
//!
//! Every failure surfaced to a caller is a [`ZdaoError`] carrying a stable
//! machine-readable [`ErrorKind`] plus a human message. Collaborator
//! boundaries (chain RPC, bridge, metadata store, treasury) have their own
//! error enums which convert into [`ZdaoError::FailedTx`] with the original
//! text preserved.

use std::fmt;
use std::time::Duration;

/// Result type for engine operations.
pub type ZdaoResult<T> = Result<T, ZdaoError>;

/// Stable, machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    AlreadyExist,
    AlreadyDestroyed,
    NotSyncState,
    NotCheckpointed,
    FailedTx,
    Canceled,
}

impl ErrorKind {
    /// Code used in logs and host-application error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Invalid => "INVALID",
            ErrorKind::AlreadyExist => "ALREADY_EXIST",
            ErrorKind::AlreadyDestroyed => "ALREADY_DESTROYED",
            ErrorKind::NotSyncState => "NOT_SYNC_STATE",
            ErrorKind::NotCheckpointed => "NOT_CHECKPOINTED",
            ErrorKind::FailedTx => "FAILED_TX",
            ErrorKind::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZdaoError {
    /// Proposal or DAO id mismatch after fetch, or unknown id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller-supplied parameter fails a precondition.
    #[error("Invalid parameter: {0}")]
    Invalid(String),

    /// Duplicate creation attempt.
    #[error("Already exists: {0}")]
    AlreadyExist(String),

    /// Operation attempted on a destroyed DAO.
    #[error("zDAO already destroyed: {0}")]
    AlreadyDestroyed(String),

    /// Operation requires the proposal to be mirrored on the child chain.
    #[error("Not synchronized to child chain: {0}")]
    NotSyncState(String),

    /// Timed out waiting for bridge checkpoint inclusion.
    #[error(
        "Transaction {tx_hash} not checkpointed after {}",
        format_waited(.waited)
    )]
    NotCheckpointed { tx_hash: String, waited: Duration },

    /// Underlying chain/provider failure, message kept verbatim.
    #[error("{0}")]
    FailedTx(String),

    /// Caller cancelled a long-running wait.
    #[error("Operation canceled: {0}")]
    Canceled(String),
}

fn format_waited(waited: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*waited)
}

impl ZdaoError {
    /// Machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZdaoError::NotFound(_) => ErrorKind::NotFound,
            ZdaoError::Invalid(_) => ErrorKind::Invalid,
            ZdaoError::AlreadyExist(_) => ErrorKind::AlreadyExist,
            ZdaoError::AlreadyDestroyed(_) => ErrorKind::AlreadyDestroyed,
            ZdaoError::NotSyncState(_) => ErrorKind::NotSyncState,
            ZdaoError::NotCheckpointed { .. } => ErrorKind::NotCheckpointed,
            ZdaoError::FailedTx(_) => ErrorKind::FailedTx,
            ZdaoError::Canceled(_) => ErrorKind::Canceled,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ZdaoError::Invalid(msg.into())
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        ZdaoError::NotFound(msg.into())
    }
}

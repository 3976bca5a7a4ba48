use thiserror::Error;

use crate::resource_id::ResourceIdError;
use crate::transport::TransportError;
use crate::validate::ValidationError;

/// Failure of one reconciliation call.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The proposed spec breaks a rule; nothing was sent.
    #[error("invalid scheduler job {name:?}: {source}")]
    Validation {
        /// Job name.
        name: String,
        /// Every violated rule.
        #[source]
        source: ValidationError,
    },
    /// The service call failed with something other than "not found".
    #[error("error {op} Scheduler Job {name:?} (Resource Group {resource_group:?}): {source}")]
    Transport {
        /// What was attempted, e.g. `"creating/updating"`.
        op: &'static str,
        /// Job name.
        name: String,
        /// Resource group name.
        resource_group: String,
        /// Underlying failure.
        #[source]
        source: TransportError,
    },
    /// A stored or returned id could not be parsed.
    #[error(transparent)]
    ResourceId(#[from] ResourceIdError),
}

impl SyncError {
    /// The validation failure, if that is what this is.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            SyncError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

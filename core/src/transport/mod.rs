//! Calls against the scheduler service.
//!
//! One blocking round trip per call; retries and cancellation belong to the
//! implementation, not to the reconciler.

/// Azure Resource Manager over HTTPS.
#[cfg(feature = "arm-http")]
pub mod http;
/// KV-backed emulator.
pub mod local;

use thiserror::Error;

use crate::remote::JobDefinition;
use crate::resource_id::JobId;

#[cfg(feature = "arm-http")]
pub use http::HttpTransport;
pub use local::LocalTransport;

/// Failure of a single service call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The job does not exist.
    #[error("job not found")]
    NotFound,
    /// The service answered with a non-success status.
    #[error("service returned status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, as returned.
        message: String,
    },
    /// The request never got an answer.
    #[error("request failed: {0}")]
    Request(String),
    /// The answer could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
    /// No way to authenticate against the service.
    #[error("missing credentials: {0}")]
    Credentials(String),
    /// The local emulator could not read or write its store.
    #[error("local backend: {0}")]
    Backend(String),
}

/// The scheduler jobs API.
pub trait Transport {
    /// Create the job or replace it; returns what the service stored.
    fn create_or_update(&self, id: &JobId, job: &JobDefinition) -> Result<JobDefinition, TransportError>;
    /// Fetch the job.
    fn get(&self, id: &JobId) -> Result<JobDefinition, TransportError>;
    /// Delete the job.
    fn delete(&self, id: &JobId) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn create_or_update(&self, id: &JobId, job: &JobDefinition) -> Result<JobDefinition, TransportError> {
        (**self).create_or_update(id, job)
    }
    fn get(&self, id: &JobId) -> Result<JobDefinition, TransportError> {
        (**self).get(id)
    }
    fn delete(&self, id: &JobId) -> Result<(), TransportError> {
        (**self).delete(id)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn create_or_update(&self, id: &JobId, job: &JobDefinition) -> Result<JobDefinition, TransportError> {
        (**self).create_or_update(id, job)
    }
    fn get(&self, id: &JobId) -> Result<JobDefinition, TransportError> {
        (**self).get(id)
    }
    fn delete(&self, id: &JobId) -> Result<(), TransportError> {
        (**self).delete(id)
    }
}

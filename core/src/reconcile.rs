//! Create/update, read and delete of one scheduler job.
//!
//! Each call is a single pass: validate, map, one service round trip, map
//! back. Nothing is retried here and nothing is sent for an invalid spec.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cfg::Environment;
use crate::error::SyncError;
use crate::job::JobSpec;
use crate::map;
use crate::resource_id::JobId;
use crate::transport::{Transport, TransportError};
use crate::validate;

/// What the service holds for a job, in configuration shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    /// Remote id.
    pub id: String,
    /// Configuration rebuilt from the response; secrets are `""`.
    pub spec: JobSpec,
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The job exists.
    Found(Observed),
    /// The job is gone; callers should drop their record of it.
    Gone,
}

/// Drives a [`Transport`] for job specs.
pub struct Reconciler<T: Transport> {
    transport: T,
    env: Environment,
    subscription_id: String,
    now: fn() -> DateTime<Utc>,
}

impl<T: Transport> Reconciler<T> {
    /// New jobs are addressed under `subscription_id`.
    pub fn new(transport: T, env: Environment, subscription_id: impl Into<String>) -> Self {
        Self { transport, env, subscription_id: subscription_id.into(), now: Utc::now }
    }

    /// Replace the clock used for a missing start time.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Address `spec` would get.
    pub fn job_id(&self, spec: &JobSpec) -> JobId {
        JobId::new(&self.subscription_id, &spec.resource_group_name, &spec.job_collection_name, &spec.name)
    }

    /// Create or update the job, adopt the returned id and read it back.
    pub fn apply(&self, spec: &JobSpec) -> Result<Observed, SyncError> {
        validate::check(spec).map_err(|source| SyncError::Validation {
            name: spec.name.clone(),
            source,
        })?;

        let id = self.job_id(spec);
        info!(name = %spec.name, resource_group = %spec.resource_group_name, "creating/updating scheduler job");
        let payload = map::expand(spec, &self.env, (self.now)());
        let stored = self
            .transport
            .create_or_update(&id, &payload)
            .map_err(|source| transport_err("creating/updating", &id, source))?;

        let adopted = stored.id.unwrap_or_else(|| id.to_string());
        debug!(id = %adopted, "adopted remote id");
        match self.read(&adopted)? {
            ReadOutcome::Found(observed) => Ok(observed),
            ReadOutcome::Gone => Err(transport_err("reading back", &id, TransportError::NotFound)),
        }
    }

    /// Fetch the job by remote id. "Not found" is [`ReadOutcome::Gone`], not an error.
    pub fn read(&self, id: &str) -> Result<ReadOutcome, SyncError> {
        let job_id: JobId = id.parse()?;
        info!(name = %job_id.name, resource_group = %job_id.resource_group, "reading scheduler job");
        match self.transport.get(&job_id) {
            Ok(def) => Ok(ReadOutcome::Found(Observed {
                id: id.to_string(),
                spec: map::flatten(&def, &job_id),
            })),
            Err(TransportError::NotFound) => {
                info!(name = %job_id.name, "scheduler job no longer exists");
                Ok(ReadOutcome::Gone)
            }
            Err(source) => Err(transport_err("reading", &job_id, source)),
        }
    }

    /// Delete the job. Deleting a job that is already gone succeeds.
    pub fn delete(&self, id: &str) -> Result<(), SyncError> {
        let job_id: JobId = id.parse()?;
        info!(name = %job_id.name, resource_group = %job_id.resource_group, "deleting scheduler job");
        match self.transport.delete(&job_id) {
            Ok(()) => Ok(()),
            Err(TransportError::NotFound) => {
                debug!(name = %job_id.name, "already deleted");
                Ok(())
            }
            Err(source) => Err(transport_err("deleting", &job_id, source)),
        }
    }
}

fn transport_err(op: &'static str, id: &JobId, source: TransportError) -> SyncError {
    SyncError::Transport {
        op,
        name: id.name.clone(),
        resource_group: id.resource_group.clone(),
        source,
    }
}

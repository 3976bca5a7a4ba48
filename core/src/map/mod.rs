//! Two-way mapping between [`JobSpec`] and the remote [`JobDefinition`].
//!
//! `expand` goes config -> wire, `flatten` goes wire -> config. Both are
//! pure; the environment and the clock are passed in.

pub mod action;
pub mod auth;
pub mod recurrence;
pub mod retry;

use chrono::{DateTime, Utc};

use crate::cfg::Environment;
use crate::job::{JobSpec, RetrySpec};
use crate::remote::{JobAction, JobDefinition, JobErrorAction, JobProperties};
use crate::resource_id::JobId;

/// Build the payload for a create/update call. `now` is used as start time
/// when `spec.start_time` is unset.
pub fn expand(spec: &JobSpec, env: &Environment, now: DateTime<Utc>) -> JobDefinition {
    let mut job_action = JobAction {
        retry_policy: Some(retry::encode(&spec.retry)),
        ..JobAction::default()
    };

    if let Some(web) = &spec.action_web {
        let (request, kind) = action::encode(web, env);
        job_action.request = Some(request);
        job_action.action_type = Some(kind);
    }

    if let Some(web) = &spec.error_action_web {
        let (request, kind) = action::encode(web, env);
        job_action.error_action = Some(JobErrorAction {
            action_type: Some(kind),
            request: Some(request),
        });
    }

    JobDefinition {
        properties: Some(JobProperties {
            start_time: Some(spec.start_time.unwrap_or(now)),
            action: Some(job_action),
            recurrence: spec.recurrence.as_ref().map(recurrence::encode),
            state: spec.state.clone(),
        }),
        ..JobDefinition::default()
    }
}

/// Rebuild the observed configuration from a read. Identity fields come from
/// `id`. Action blocks are only filled under a web main action, the retry
/// block only for a `Fixed` policy.
pub fn flatten(job: &JobDefinition, id: &JobId) -> JobSpec {
    let mut spec = JobSpec {
        name: id.name.clone(),
        resource_group_name: id.resource_group.clone(),
        job_collection_name: id.job_collection.clone(),
        action_web: None,
        error_action_web: None,
        retry: RetrySpec::None,
        recurrence: None,
        start_time: None,
        state: None,
    };

    let Some(props) = &job.properties else {
        return spec;
    };

    if let Some(a) = &props.action {
        // the error action is only read back under a web main action
        if a.action_type.as_ref().is_some_and(|t| t.is_web()) {
            spec.action_web = a.request.as_ref().map(action::decode);
            spec.error_action_web = a
                .error_action
                .as_ref()
                .and_then(|e| e.request.as_ref())
                .map(action::decode);
        }
        if let Some(policy) = &a.retry_policy {
            spec.retry = retry::decode(policy);
        }
    }

    spec.recurrence = props.recurrence.as_ref().map(recurrence::decode);
    spec.start_time = props.start_time;
    spec.state = props.state.clone();
    spec
}

use std::cell::Cell;

use chrono::{DateTime, TimeZone, Utc};
use sched_core::cfg::Environment;
use sched_core::job::{AuthenticationVariant, JobSpec, RetrySpec};
use sched_core::remote::JobDefinition;
use sched_core::resource_id::JobId;
use sched_core::store::{open_default, FsKv};
use sched_core::transport::{LocalTransport, Transport, TransportError};
use sched_core::validate::Violation;
use sched_core::{ReadOutcome, Reconciler, SyncError};

const JOB: &str = r#"
name = "nightly-report"
resource_group_name = "ops"
job_collection_name = "reports"

[action_web]
url = "HTTPS://example.com/run"
method = "Post"
body = "{}"
headers = { "Content-Type" = "application/json" }

[action_web.authentication_active_directory]
tenant_id = "tenant"
client_id = "client"
secret = "s3cr3t"

[error_action_web]
url = "http://example.com/failed"
method = "Get"

[retry]
interval = "00:01:00"
count = 5

[recurrence]
frequency = "Week"
count = 10
week_days = ["Monday", "Friday"]
hours = [6]
minutes = [0, 30]
"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
}

fn local() -> (tempfile::TempDir, Reconciler<LocalTransport<FsKv>>) {
    let dir = tempfile::tempdir().unwrap();
    let kv = open_default(dir.path()).unwrap();
    let r = Reconciler::new(LocalTransport::new(kv), Environment::default(), "sub-1").with_clock(now);
    (dir, r)
}

#[test]
fn apply_adopts_id_and_reads_back() {
    let (_dir, r) = local();
    let spec = JobSpec::from_toml_str(JOB).unwrap();
    let observed = r.apply(&spec).unwrap();

    assert_eq!(
        observed.id,
        "/subscriptions/sub-1/resourceGroups/ops/providers/Microsoft.Scheduler/jobCollections/reports/jobs/nightly-report"
    );
    let got = &observed.spec;
    assert_eq!(got.address(), spec.address());
    assert_eq!(got.start_time, Some(now()));
    assert_eq!(got.state.as_deref(), Some("Enabled"));
    assert_eq!(got.retry, spec.retry);
    // the service lowercases day names; set identity ignores that
    assert_eq!(got.recurrence, spec.recurrence);

    let action = got.action_web.as_ref().unwrap();
    assert_eq!(action.url, "HTTPS://example.com/run");
    let Some(AuthenticationVariant::Directory(d)) = &action.authentication else {
        panic!("authentication lost");
    };
    assert_eq!(d.secret, "");
    assert_eq!(d.audience.as_deref(), Some("https://management.core.windows.net/"));
    assert_eq!(got.error_action_web.as_ref().map(|a| a.url.as_str()), Some("http://example.com/failed"));
}

#[test]
fn reapplying_is_stable() {
    let (_dir, r) = local();
    let spec = JobSpec::from_toml_str(JOB).unwrap();
    let first = r.apply(&spec).unwrap();
    let second = r.apply(&spec).unwrap();
    assert_eq!(first, second);
}

#[test]
fn read_of_missing_job_is_gone() {
    let (_dir, r) = local();
    let id = JobId::new("sub-1", "ops", "reports", "ghost").to_string();
    assert_eq!(r.read(&id).unwrap(), ReadOutcome::Gone);
}

#[test]
fn delete_is_idempotent() {
    let (_dir, r) = local();
    let spec = JobSpec::from_toml_str(JOB).unwrap();
    let observed = r.apply(&spec).unwrap();
    r.delete(&observed.id).unwrap();
    assert_eq!(r.read(&observed.id).unwrap(), ReadOutcome::Gone);
    r.delete(&observed.id).unwrap();
}

#[test]
fn retry_absent_round_trips_as_absent() {
    let (_dir, r) = local();
    let mut spec = JobSpec::from_toml_str(JOB).unwrap();
    spec.retry = RetrySpec::None;
    assert_eq!(r.apply(&spec).unwrap().spec.retry, RetrySpec::None);
}

/// Counts calls and fails every one of them with `err`.
struct Failing {
    calls: Cell<u32>,
    err: fn() -> TransportError,
}

impl Failing {
    fn new(err: fn() -> TransportError) -> Self {
        Self { calls: Cell::new(0), err }
    }
}

impl Transport for Failing {
    fn create_or_update(&self, _: &JobId, _: &JobDefinition) -> Result<JobDefinition, TransportError> {
        self.calls.set(self.calls.get() + 1);
        Err((self.err)())
    }
    fn get(&self, _: &JobId) -> Result<JobDefinition, TransportError> {
        self.calls.set(self.calls.get() + 1);
        Err((self.err)())
    }
    fn delete(&self, _: &JobId) -> Result<(), TransportError> {
        self.calls.set(self.calls.get() + 1);
        Err((self.err)())
    }
}

fn server_error() -> TransportError {
    TransportError::Status { code: 500, message: "internal".into() }
}

#[test]
fn invalid_spec_never_reaches_the_service() {
    let t = Failing::new(server_error);
    let r = Reconciler::new(&t, Environment::default(), "sub-1");
    let spec = JobSpec::from_toml_str(
        "name = \"j1\"\nresource_group_name = \"rg\"\njob_collection_name = \"jc\"\n\
         [recurrence]\nfrequency = \"Day\"\n",
    )
    .unwrap();

    let err = r.apply(&spec).unwrap_err();
    let violations = &err.validation().unwrap().violations;
    assert!(violations.contains(&Violation::MissingAction));
    assert!(violations.contains(&Violation::MissingEndCondition));
    assert_eq!(t.calls.get(), 0);
}

#[test]
fn transport_failures_carry_identity() {
    let t = Failing::new(server_error);
    let r = Reconciler::new(&t, Environment::default(), "sub-1");
    let spec = JobSpec::from_toml_str(JOB).unwrap();

    let err = r.apply(&spec).unwrap_err();
    assert!(matches!(err, SyncError::Transport { op: "creating/updating", .. }));
    let msg = err.to_string();
    assert!(msg.contains("nightly-report") && msg.contains("ops"), "{msg}");

    let id = r.job_id(&spec).to_string();
    assert!(matches!(r.read(&id), Err(SyncError::Transport { op: "reading", .. })));
    assert!(matches!(r.delete(&id), Err(SyncError::Transport { op: "deleting", .. })));
}

#[test]
fn not_found_on_delete_is_success() {
    let t = Failing::new(|| TransportError::NotFound);
    let r = Reconciler::new(&t, Environment::default(), "sub-1");
    let id = JobId::new("sub-1", "rg", "jc", "j1").to_string();
    r.delete(&id).unwrap();
    assert_eq!(r.read(&id).unwrap(), ReadOutcome::Gone);
}

#[test]
fn malformed_ids_are_rejected_before_any_call() {
    let t = Failing::new(server_error);
    let r = Reconciler::new(&t, Environment::default(), "sub-1");
    assert!(matches!(r.read("not-an-id"), Err(SyncError::ResourceId(_))));
    assert_eq!(t.calls.get(), 0);
}

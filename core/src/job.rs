use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::presence::Presence;
use crate::set::IdSet;

/// Declarative description of one scheduler job, as written in a job file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct JobSpec {
    /// Job name, unique within its collection.
    pub name: String,
    /// Resource group that owns the job collection.
    pub resource_group_name: String,
    /// Job collection the job lives in.
    pub job_collection_name: String,
    /// HTTP/HTTPS action run when the job triggers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_web: Option<ActionSpec>,
    /// HTTP/HTTPS action run when the main action fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_action_web: Option<ActionSpec>,
    /// Retry policy; a missing `[retry]` table means no retries.
    #[serde(default, skip_serializing_if = "RetrySpec::is_none")]
    pub retry: RetrySpec,
    /// When and how often the job runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceSpec>,
    /// First run; the service is told "now" when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// `enabled` or `disabled`, any case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl JobSpec {
    /// Parse a job file body.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let spec: JobSpec = toml::from_str(src).context("parse job file")?;
        Ok(spec)
    }

    /// Read and parse the job file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&txt).with_context(|| format!("parse {}", path.display()))
    }

    /// Store key for the job: `"{resource group}/{collection}/{name}"`.
    pub fn address(&self) -> String {
        format!("{}/{}/{}", self.resource_group_name, self.job_collection_name, self.name)
    }
}

/// HTTP request performed by an action.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "WebActionBlock", into = "WebActionBlock")]
pub struct ActionSpec {
    /// Target URL; the scheme decides between HTTP and HTTPS.
    pub url: String,
    /// `Get`, `Put`, `Post` or `Delete`, any case.
    pub method: String,
    /// Request body, only meaningful for PUT and POST.
    pub body: Option<String>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// At most one way of authenticating the request.
    pub authentication: Option<AuthenticationVariant>,
}

/// Job-file shape of an action: one optional table per authentication kind.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WebActionBlock {
    /// See [`ActionSpec::url`].
    pub url: String,
    /// See [`ActionSpec::method`].
    pub method: String,
    /// See [`ActionSpec::body`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// See [`ActionSpec::headers`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Basic credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_basic: Option<BasicAuth>,
    /// Client certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_certificate: Option<CertificateAuth>,
    /// Active Directory OAuth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_active_directory: Option<DirectoryAuth>,
}

/// More than one authentication table was given for the same action.
#[derive(Debug, thiserror::Error)]
#[error("only one of `authentication_basic`, `authentication_certificate` or `authentication_active_directory` may be set, got {0:?}")]
pub struct AuthConflict(pub Vec<&'static str>);

impl TryFrom<WebActionBlock> for ActionSpec {
    type Error = AuthConflict;

    fn try_from(b: WebActionBlock) -> Result<Self, Self::Error> {
        let mut given = Vec::new();
        let mut authentication = None;
        if let Some(a) = b.authentication_basic {
            given.push("authentication_basic");
            authentication = Some(AuthenticationVariant::Basic(a));
        }
        if let Some(a) = b.authentication_certificate {
            given.push("authentication_certificate");
            authentication = Some(AuthenticationVariant::Certificate(a));
        }
        if let Some(a) = b.authentication_active_directory {
            given.push("authentication_active_directory");
            authentication = Some(AuthenticationVariant::Directory(a));
        }
        if given.len() > 1 {
            return Err(AuthConflict(given));
        }
        Ok(ActionSpec {
            url: b.url,
            method: b.method,
            // an empty body is the same as no body
            body: b.body.filter(|s| !s.is_empty()),
            headers: b.headers,
            authentication,
        })
    }
}

impl From<ActionSpec> for WebActionBlock {
    fn from(a: ActionSpec) -> Self {
        let mut block = WebActionBlock {
            url: a.url,
            method: a.method,
            body: a.body,
            headers: a.headers,
            ..WebActionBlock::default()
        };
        match a.authentication {
            Some(AuthenticationVariant::Basic(v)) => block.authentication_basic = Some(v),
            Some(AuthenticationVariant::Certificate(v)) => block.authentication_certificate = Some(v),
            Some(AuthenticationVariant::Directory(v)) => block.authentication_active_directory = Some(v),
            None => {}
        }
        block
    }
}

/// The three mutually exclusive ways an action can authenticate.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthenticationVariant {
    /// HTTP basic authentication.
    Basic(BasicAuth),
    /// TLS client certificate.
    Certificate(CertificateAuth),
    /// Azure Active Directory OAuth client credentials.
    Directory(DirectoryAuth),
}

/// Basic credentials. `password` is write-only on the service side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BasicAuth {
    /// User name.
    pub username: String,
    /// Password (secret).
    pub password: String,
}

/// Client certificate. The last three fields are filled in by the service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CertificateAuth {
    /// Base64 PFX blob (secret).
    pub pfx: String,
    /// PFX password (secret).
    pub password: String,
    /// Certificate thumbprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    /// Certificate expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    /// Certificate subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
}

/// Active Directory OAuth credentials.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DirectoryAuth {
    /// Directory (tenant) id.
    pub tenant_id: String,
    /// Application (client) id.
    pub client_id: String,
    /// Client secret (secret).
    pub secret: String,
    /// Token audience; defaults to the environment's service management endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

/// Retry policy for a failed action.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(from = "Option<FixedRetry>", into = "Option<FixedRetry>")]
pub enum RetrySpec {
    /// No retries.
    #[default]
    None,
    /// Retry a fixed number of times at a fixed interval.
    Fixed(FixedRetry),
}

impl RetrySpec {
    /// `true` for [`RetrySpec::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, RetrySpec::None)
    }
}

impl From<Option<FixedRetry>> for RetrySpec {
    fn from(v: Option<FixedRetry>) -> Self {
        v.map_or(RetrySpec::None, RetrySpec::Fixed)
    }
}

impl From<RetrySpec> for Option<FixedRetry> {
    fn from(v: RetrySpec) -> Self {
        match v {
            RetrySpec::None => None,
            RetrySpec::Fixed(f) => Some(f),
        }
    }
}

/// Parameters of a fixed retry policy.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FixedRetry {
    /// `hh:mm:ss` duration between attempts; passed through unchecked.
    #[serde(default = "default_retry_interval")]
    pub interval: String,
    /// Number of attempts, 1..=20.
    #[serde(default = "default_retry_count")]
    pub count: i32,
}

fn default_retry_interval() -> String { "00:00:30".to_string() }
fn default_retry_count() -> i32 { 4 }

/// When and how often a job runs.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RecurrenceSpec {
    /// `Minute`, `Hour`, `Day`, `Week` or `Month`, any case (kept as written).
    pub frequency: String,
    /// Units of `frequency` between runs.
    #[serde(default = "default_interval")]
    pub interval: i32,
    /// Stop after this many runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    /// Stop at this instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Specific minutes/hours/days to run on.
    #[serde(flatten)]
    pub schedule: ScheduleSpec,
}

fn default_interval() -> i32 { 1 }

/// Schedule fields of a recurrence; written inline in the `[recurrence]` table.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ScheduleSpec {
    /// Minutes of the hour, 0..=59.
    #[serde(default, skip_serializing_if = "Presence::is_unset")]
    pub minutes: Presence<IdSet<i32>>,
    /// Hours of the day, 0..=23.
    #[serde(default, skip_serializing_if = "Presence::is_unset")]
    pub hours: Presence<IdSet<i32>>,
    /// Days of the week.
    #[serde(default, skip_serializing_if = "Presence::is_unset")]
    pub week_days: Presence<IdSet<DayName>>,
    /// Days of the month, -31..=31 without 0; negatives count from the end.
    #[serde(default, skip_serializing_if = "Presence::is_unset")]
    pub month_days: Presence<IdSet<i32>>,
    /// Nth weekday of the month.
    #[serde(default, skip_serializing_if = "Presence::is_unset")]
    pub monthly_occurrences: Presence<IdSet<MonthlyOccurrence>>,
}

impl ScheduleSpec {
    /// `true` when no collection has members, i.e. nothing worth sending.
    pub fn is_empty(&self) -> bool {
        self.minutes.members().is_none()
            && self.hours.members().is_none()
            && self.week_days.members().is_none()
            && self.month_days.members().is_none()
            && self.monthly_occurrences.members().is_none()
    }
}

/// A weekday name as given, e.g. `"Monday"` or `"monday"`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct DayName(String);

impl DayName {
    /// The name as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DayName {
    fn from(s: &str) -> Self {
        DayName(s.to_string())
    }
}

impl From<String> for DayName {
    fn from(s: String) -> Self {
        DayName(s)
    }
}

/// "The `occurrence`th `day` of the month"; negative counts from the end.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MonthlyOccurrence {
    /// Weekday name.
    pub day: DayName,
    /// -5..=5 without 0.
    pub occurrence: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "nightly-report"
resource_group_name = "ops"
job_collection_name = "reports"
start_time = "2026-11-01T02:00:00+02:00"
state = "enabled"

[action_web]
url = "https://example.com/run"
method = "post"
body = "{}"
headers = { "Content-Type" = "application/json" }

[action_web.authentication_basic]
username = "svc"
password = "hunter2"

[retry]
count = 5

[recurrence]
frequency = "week"
count = 10
week_days = ["Monday", "friday"]
minutes = [0, 30]
hours = []
"#;

    #[test]
    fn parses_full_job_file() {
        let spec = JobSpec::from_toml_str(FULL).unwrap();
        assert_eq!(spec.address(), "ops/reports/nightly-report");
        let action = spec.action_web.as_ref().unwrap();
        assert_eq!(action.headers.get("Content-Type").map(String::as_str), Some("application/json"));
        assert!(matches!(action.authentication, Some(AuthenticationVariant::Basic(ref b)) if b.username == "svc"));
        assert_eq!(
            spec.retry,
            RetrySpec::Fixed(FixedRetry { interval: "00:00:30".into(), count: 5 })
        );
        let rec = spec.recurrence.as_ref().unwrap();
        assert_eq!(rec.interval, 1);
        assert_eq!(rec.schedule.hours, Presence::Empty);
        assert!(rec.schedule.month_days.is_unset());
        assert_eq!(rec.schedule.week_days.members().map(|s| s.len()), Some(2));
        assert_eq!(spec.start_time.unwrap().to_rfc3339(), "2026-11-01T00:00:00+00:00");
    }

    #[test]
    fn missing_retry_table_is_none() {
        let spec = JobSpec::from_toml_str(
            "name = \"a1\"\nresource_group_name = \"rg\"\njob_collection_name = \"jc\"\n",
        )
        .unwrap();
        assert!(spec.retry.is_none());
        assert!(spec.action_web.is_none());
    }

    #[test]
    fn two_authentication_tables_conflict() {
        let src = r#"
name = "a1"
resource_group_name = "rg"
job_collection_name = "jc"
[action_web]
url = "https://example.com"
method = "get"
[action_web.authentication_basic]
username = "u"
password = "p"
[action_web.authentication_active_directory]
tenant_id = "t"
client_id = "c"
secret = "s"
"#;
        let err = JobSpec::from_toml_str(src).unwrap_err();
        assert!(format!("{err:#}").contains("only one of"));
    }

    #[test]
    fn empty_body_is_dropped() {
        let src = r#"
name = "a1"
resource_group_name = "rg"
job_collection_name = "jc"
[action_web]
url = "http://example.com"
method = "put"
body = ""
"#;
        let spec = JobSpec::from_toml_str(src).unwrap();
        assert_eq!(spec.action_web.unwrap().body, None);
    }

    #[test]
    fn json_cycle_keeps_shape() {
        let spec = JobSpec::from_toml_str(FULL).unwrap();
        let back: JobSpec = serde_json::from_str(&serde_json::to_string(&spec).unwrap()).unwrap();
        assert_eq!(spec, back);
    }
}

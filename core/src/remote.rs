//! Wire model of the Scheduler REST API (`2016-03-01`), job resources only.
//!
//! Everything is optional because the service omits what it does not know or
//! will not return (secrets are never echoed back).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A job resource as sent to and returned by the service.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDefinition {
    /// Fully qualified resource id, assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Job name, assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Resource type, assigned by the service.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Job properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<JobProperties>,
}

/// Properties of a job.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobProperties {
    /// First run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// What the job does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<JobAction>,
    /// When the job runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<JobRecurrence>,
    /// `Enabled`, `Disabled`, `Faulted` or `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Main action of a job.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobAction {
    /// Which kind of action this is.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<JobActionType>,
    /// Request for `Http`/`Https` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<HttpRequest>,
    /// Retry behaviour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    /// Action run when this one fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_action: Option<JobErrorAction>,
}

/// Error action of a job.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobErrorAction {
    /// Which kind of action this is.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<JobActionType>,
    /// Request for `Http`/`Https` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<HttpRequest>,
}

/// Action discriminant. Matched case-insensitively on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobActionType {
    /// Plain HTTP request.
    Http,
    /// HTTP request over TLS.
    Https,
    /// Azure storage queue message.
    StorageQueue,
    /// Service bus queue message.
    ServiceBusQueue,
    /// Service bus topic message.
    ServiceBusTopic,
    /// Anything this client does not know, kept verbatim.
    Other(String),
}

impl JobActionType {
    /// Wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            JobActionType::Http => "Http",
            JobActionType::Https => "Https",
            JobActionType::StorageQueue => "StorageQueue",
            JobActionType::ServiceBusQueue => "ServiceBusQueue",
            JobActionType::ServiceBusTopic => "ServiceBusTopic",
            JobActionType::Other(s) => s,
        }
    }

    /// `true` for the HTTP and HTTPS variants.
    pub fn is_web(&self) -> bool {
        matches!(self, JobActionType::Http | JobActionType::Https)
    }
}

impl From<&str> for JobActionType {
    fn from(s: &str) -> Self {
        [
            JobActionType::Http,
            JobActionType::Https,
            JobActionType::StorageQueue,
            JobActionType::ServiceBusQueue,
            JobActionType::ServiceBusTopic,
        ]
        .into_iter()
        .find(|t| t.as_str().eq_ignore_ascii_case(s))
        .unwrap_or_else(|| JobActionType::Other(s.to_string()))
    }
}

impl Serialize for JobActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(JobActionType::from(s.as_str()))
    }
}

/// HTTP request of a web action.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    /// How to authenticate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    /// Target URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// HTTP method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Polymorphic authentication payload, discriminated by `type`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum Authentication {
    /// `Basic`.
    Basic(BasicAuthentication),
    /// `ClientCertificate`.
    ClientCertificate(ClientCertAuthentication),
    /// `ActiveDirectoryOAuth`.
    ActiveDirectoryOAuth(OAuthAuthentication),
    /// A discriminant this client does not know.
    #[serde(other)]
    Unknown,
}

impl Authentication {
    /// Copy with every write-only field removed, as the service returns it.
    pub fn without_secrets(&self) -> Authentication {
        match self {
            Authentication::Basic(b) => Authentication::Basic(BasicAuthentication {
                password: None,
                ..b.clone()
            }),
            Authentication::ClientCertificate(c) => {
                Authentication::ClientCertificate(ClientCertAuthentication {
                    pfx: None,
                    password: None,
                    ..c.clone()
                })
            }
            Authentication::ActiveDirectoryOAuth(o) => {
                Authentication::ActiveDirectoryOAuth(OAuthAuthentication {
                    secret: None,
                    ..o.clone()
                })
            }
            Authentication::Unknown => Authentication::Unknown,
        }
    }
}

/// Basic credentials.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthentication {
    /// User name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password; never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Client certificate.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientCertAuthentication {
    /// Base64 PFX; never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfx: Option<String>,
    /// PFX password; never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Computed by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_thumbprint: Option<String>,
    /// Computed by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_expiration_date: Option<DateTime<Utc>>,
    /// Computed by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_subject_name: Option<String>,
}

/// Active Directory OAuth credentials.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAuthentication {
    /// Client secret; never returned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Tenant id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Token audience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    /// Client id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Retry policy of an action.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// `None` or `Fixed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_type: Option<RetryType>,
    /// `hh:mm:ss` between attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<String>,
    /// Attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i32>,
}

/// Retry discriminant. Matched case-insensitively on read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryType {
    /// No retries.
    None,
    /// Fixed interval and count.
    Fixed,
    /// Anything else the service may report.
    Other(String),
}

impl RetryType {
    /// Wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            RetryType::None => "None",
            RetryType::Fixed => "Fixed",
            RetryType::Other(s) => s,
        }
    }
}

impl From<&str> for RetryType {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("fixed") {
            RetryType::Fixed
        } else if s.eq_ignore_ascii_case("none") {
            RetryType::None
        } else {
            RetryType::Other(s.to_string())
        }
    }
}

impl Serialize for RetryType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RetryType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RetryType::from(s.as_str()))
    }
}

/// Recurrence of a job.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecurrence {
    /// `Minute`, `Hour`, `Day`, `Week` or `Month`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    /// Units of `frequency` between runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<i32>,
    /// Maximum number of runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i32>,
    /// Last possible run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Specific run slots. The service rejects an empty object here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<RecurrenceSchedule>,
}

/// Specific minutes/hours/days of a recurrence.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceSchedule {
    /// Day names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_days: Option<Vec<String>>,
    /// Hours of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Vec<i32>>,
    /// Minutes of the hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<Vec<i32>>,
    /// Days of the month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_days: Option<Vec<i32>>,
    /// Nth weekday of the month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_occurrences: Option<Vec<ScheduleMonthlyOccurrence>>,
}

/// Wire form of a monthly occurrence.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleMonthlyOccurrence {
    /// Day name.
    pub day: String,
    /// Which occurrence of `day`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authentication_is_tagged_by_type() {
        let a = Authentication::Basic(BasicAuthentication {
            username: Some("u".into()),
            password: Some("p".into()),
        });
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            json!({"type": "Basic", "username": "u", "password": "p"})
        );
        let back: Authentication = serde_json::from_value(json!({
            "type": "ActiveDirectoryOAuth", "tenant": "t", "clientId": "c", "audience": "a"
        }))
        .unwrap();
        assert!(matches!(back, Authentication::ActiveDirectoryOAuth(ref o) if o.client_id.as_deref() == Some("c")));
    }

    #[test]
    fn unknown_authentication_type_is_kept_as_unknown() {
        let back: Authentication =
            serde_json::from_value(json!({"type": "Kerberos", "realm": "x"})).unwrap();
        assert_eq!(back, Authentication::Unknown);
    }

    #[test]
    fn action_and_retry_types_ignore_case() {
        let a: JobAction = serde_json::from_value(json!({
            "type": "https",
            "retryPolicy": {"retryType": "fixed", "retryCount": 2}
        }))
        .unwrap();
        assert_eq!(a.action_type, Some(JobActionType::Https));
        assert_eq!(a.retry_policy.unwrap().retry_type, Some(RetryType::Fixed));
        assert_eq!(JobActionType::from("ServiceBusTopic"), JobActionType::ServiceBusTopic);
        assert_eq!(
            JobActionType::from("carrierPigeon"),
            JobActionType::Other("carrierPigeon".into())
        );
    }

    #[test]
    fn without_secrets_keeps_public_fields() {
        let c = Authentication::ClientCertificate(ClientCertAuthentication {
            pfx: Some("blob".into()),
            password: Some("pw".into()),
            certificate_thumbprint: Some("AB12".into()),
            ..Default::default()
        });
        let Authentication::ClientCertificate(stripped) = c.without_secrets() else {
            panic!("variant changed");
        };
        assert_eq!(stripped.pfx, None);
        assert_eq!(stripped.password, None);
        assert_eq!(stripped.certificate_thumbprint.as_deref(), Some("AB12"));
    }
}

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Why a resource id string could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceIdError {
    /// The id does not start with `/` or has an odd number of segments.
    #[error("resource id {0:?} is not a sequence of key/value path segments")]
    Malformed(String),
    /// A required segment is absent.
    #[error("resource id {id:?} is missing the {segment:?} segment")]
    Missing {
        /// The offending id.
        id: String,
        /// Segment key that was expected.
        segment: &'static str,
    },
}

/// Address of a scheduler job:
/// `/subscriptions/{s}/resourceGroups/{rg}/providers/Microsoft.Scheduler/jobCollections/{c}/jobs/{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobId {
    /// Subscription id.
    pub subscription_id: String,
    /// Resource group name.
    pub resource_group: String,
    /// Job collection name.
    pub job_collection: String,
    /// Job name.
    pub name: String,
}

impl JobId {
    /// Address a job from its parts.
    pub fn new(subscription_id: &str, resource_group: &str, job_collection: &str, name: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            job_collection: job_collection.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Scheduler/jobCollections/{}/jobs/{}",
            self.subscription_id, self.resource_group, self.job_collection, self.name
        )
    }
}

impl FromStr for JobId {
    type Err = ResourceIdError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let malformed = || ResourceIdError::Malformed(id.to_string());
        let path = id.strip_prefix('/').ok_or_else(malformed)?;
        let parts: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        if parts.len() % 2 != 0 || parts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }

        // keys are matched ignoring case, ARM is not consistent about it
        let lookup = |segment: &'static str| {
            parts
                .chunks(2)
                .find(|kv| kv[0].eq_ignore_ascii_case(segment))
                .map(|kv| kv[1].to_string())
                .ok_or(ResourceIdError::Missing { id: id.to_string(), segment })
        };

        Ok(JobId {
            subscription_id: lookup("subscriptions")?,
            resource_group: lookup("resourceGroups")?,
            job_collection: lookup("jobCollections")?,
            name: lookup("jobs")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "/subscriptions/0000/resourceGroups/ops/providers/Microsoft.Scheduler/jobCollections/reports/jobs/nightly";

    #[test]
    fn parses_and_formats() {
        let id: JobId = ID.parse().unwrap();
        assert_eq!(id, JobId::new("0000", "ops", "reports", "nightly"));
        assert_eq!(id.to_string(), ID);
    }

    #[test]
    fn segment_keys_ignore_case() {
        let id: JobId = ID.replace("resourceGroups", "resourcegroups").parse().unwrap();
        assert_eq!(id.resource_group, "ops");
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!("subscriptions/x".parse::<JobId>(), Err(ResourceIdError::Malformed(_))));
        assert!(matches!("/subscriptions/x/resourceGroups".parse::<JobId>(), Err(ResourceIdError::Malformed(_))));
        assert!(matches!(
            "/subscriptions/x/resourceGroups/rg".parse::<JobId>(),
            Err(ResourceIdError::Missing { segment: "jobCollections", .. })
        ));
    }
}

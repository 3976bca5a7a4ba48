use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::{Transport, TransportError};
use crate::remote::{Authentication, HttpRequest, JobDefinition, JobRecurrence};
use crate::resource_id::JobId;
use crate::set::fnv1a;
use crate::store::{ns, Kv, KvSerde};

const RESOURCE_TYPE: &str = "Microsoft.Scheduler/jobCollections/jobs";

/// KV-backed stand-in for the scheduler service.
///
/// Stores what it is sent and answers reads the way the real service does:
/// secrets are dropped, certificate details are filled in, schedule day
/// names come back lowercase and `state` defaults to `Enabled`.
#[derive(Clone)]
pub struct LocalTransport<K: Kv> {
    kv: K,
    now: fn() -> DateTime<Utc>,
}

impl<K: Kv> LocalTransport<K> {
    /// Emulator persisting into `kv`.
    pub fn new(kv: K) -> Self {
        Self { kv, now: Utc::now }
    }

    /// Same, with a fixed clock for certificate expiry.
    pub fn with_clock(kv: K, now: fn() -> DateTime<Utc>) -> Self {
        Self { kv, now }
    }

    fn key(id: &JobId) -> Vec<u8> {
        ns("remote", &id.to_string())
    }

    fn load(&self, id: &JobId) -> Result<Option<JobDefinition>, TransportError> {
        self.kv
            .get_t(&Self::key(id))
            .map_err(|e| TransportError::Backend(format!("{e:#}")))
    }

    fn normalize(&self, id: &JobId, job: &JobDefinition) -> JobDefinition {
        let mut stored = job.clone();
        stored.id = Some(id.to_string());
        stored.name = Some(id.name.clone());
        stored.kind = Some(RESOURCE_TYPE.to_string());

        let props = stored.properties.get_or_insert_with(Default::default);
        props.state.get_or_insert_with(|| "Enabled".to_string());
        if let Some(action) = props.action.as_mut() {
            if let Some(req) = action.request.as_mut() {
                self.seal_request(id, req);
            }
            if let Some(req) = action.error_action.as_mut().and_then(|e| e.request.as_mut()) {
                self.seal_request(id, req);
            }
        }
        if let Some(rec) = props.recurrence.as_mut() {
            lowercase_days(rec);
        }
        stored
    }

    fn seal_request(&self, id: &JobId, req: &mut HttpRequest) {
        let Some(auth) = req.authentication.as_mut() else { return };
        if let Authentication::ClientCertificate(cert) = &mut *auth {
            if let Some(pfx) = cert.pfx.as_deref() {
                cert.certificate_thumbprint = Some(format!("{:016X}", fnv1a(pfx.as_bytes())));
                cert.certificate_subject_name = Some(format!("CN={}", id.name));
                cert.certificate_expiration_date = Some((self.now)() + Duration::days(365));
            }
        }
        *auth = auth.without_secrets();
    }
}

fn lowercase_days(rec: &mut JobRecurrence) {
    let Some(schedule) = rec.schedule.as_mut() else { return };
    for day in schedule.week_days.iter_mut().flatten() {
        *day = day.to_lowercase();
    }
    for occ in schedule.monthly_occurrences.iter_mut().flatten() {
        occ.day = occ.day.to_lowercase();
    }
}

impl<K: Kv> Transport for LocalTransport<K> {
    fn create_or_update(&self, id: &JobId, job: &JobDefinition) -> Result<JobDefinition, TransportError> {
        let stored = self.normalize(id, job);
        self.kv
            .put_t(&Self::key(id), &stored)
            .map_err(|e| TransportError::Backend(format!("{e:#}")))?;
        debug!(id = %id, "local job stored");
        Ok(stored)
    }

    fn get(&self, id: &JobId) -> Result<JobDefinition, TransportError> {
        self.load(id)?.ok_or(TransportError::NotFound)
    }

    fn delete(&self, id: &JobId) -> Result<(), TransportError> {
        if self.kv.delete(&Self::key(id)) {
            debug!(id = %id, "local job deleted");
            Ok(())
        } else {
            Err(TransportError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{
        BasicAuthentication, ClientCertAuthentication, JobAction, JobProperties, RecurrenceSchedule,
    };
    use crate::store::open_default;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn job(auth: Authentication) -> JobDefinition {
        JobDefinition {
            properties: Some(JobProperties {
                action: Some(JobAction {
                    request: Some(HttpRequest {
                        authentication: Some(auth),
                        uri: Some("https://example.com".into()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                recurrence: Some(JobRecurrence {
                    frequency: Some("Week".into()),
                    schedule: Some(RecurrenceSchedule {
                        week_days: Some(vec!["Monday".into()]),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn stores_like_the_service() {
        let dir = tempfile::tempdir().unwrap();
        let t = LocalTransport::with_clock(open_default(dir.path()).unwrap(), fixed_now);
        let id = JobId::new("s", "rg", "jc", "j1");
        let auth = Authentication::Basic(BasicAuthentication {
            username: Some("u".into()),
            password: Some("p".into()),
        });
        let stored = t.create_or_update(&id, &job(auth)).unwrap();
        assert_eq!(stored.id, Some(id.to_string()));
        assert_eq!(t.get(&id).unwrap(), stored);

        let props = stored.properties.unwrap();
        assert_eq!(props.state.as_deref(), Some("Enabled"));
        let req = props.action.unwrap().request.unwrap();
        assert_eq!(
            req.authentication,
            Some(Authentication::Basic(BasicAuthentication { username: Some("u".into()), password: None }))
        );
        let days = props.recurrence.unwrap().schedule.unwrap().week_days;
        assert_eq!(days, Some(vec!["monday".to_string()]));
    }

    #[test]
    fn fills_certificate_details() {
        let dir = tempfile::tempdir().unwrap();
        let t = LocalTransport::with_clock(open_default(dir.path()).unwrap(), fixed_now);
        let id = JobId::new("s", "rg", "jc", "cert-job");
        let auth = Authentication::ClientCertificate(ClientCertAuthentication {
            pfx: Some("MIIblob".into()),
            password: Some("pw".into()),
            ..Default::default()
        });
        let stored = t.create_or_update(&id, &job(auth)).unwrap();
        let req = stored.properties.unwrap().action.unwrap().request.unwrap();
        let Some(Authentication::ClientCertificate(c)) = req.authentication else {
            panic!("wrong variant");
        };
        assert_eq!(c.pfx, None);
        assert_eq!(c.password, None);
        assert_eq!(c.certificate_subject_name.as_deref(), Some("CN=cert-job"));
        assert_eq!(c.certificate_thumbprint.map(|t| t.len()), Some(16));
        assert_eq!(c.certificate_expiration_date, Some(fixed_now() + Duration::days(365)));
    }

    #[test]
    fn unknown_jobs_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let t = LocalTransport::new(open_default(dir.path()).unwrap());
        let id = JobId::new("s", "rg", "jc", "ghost");
        assert!(matches!(t.get(&id), Err(TransportError::NotFound)));
        assert!(matches!(t.delete(&id), Err(TransportError::NotFound)));
    }
}

//! Authentication variants <-> polymorphic `authentication` payload.

use crate::cfg::Environment;
use crate::job::{AuthenticationVariant, BasicAuth, CertificateAuth, DirectoryAuth};
use crate::remote::{
    Authentication, BasicAuthentication, ClientCertAuthentication, OAuthAuthentication,
};

/// Build the wire payload. Computed certificate fields are never sent.
pub fn encode(auth: &AuthenticationVariant, env: &Environment) -> Authentication {
    match auth {
        AuthenticationVariant::Basic(b) => Authentication::Basic(BasicAuthentication {
            username: Some(b.username.clone()),
            password: Some(b.password.clone()),
        }),
        AuthenticationVariant::Certificate(c) => {
            Authentication::ClientCertificate(ClientCertAuthentication {
                pfx: Some(c.pfx.clone()),
                password: Some(c.password.clone()),
                ..ClientCertAuthentication::default()
            })
        }
        AuthenticationVariant::Directory(d) => {
            let audience = d
                .audience
                .clone()
                .unwrap_or_else(|| env.service_management_endpoint.clone());
            Authentication::ActiveDirectoryOAuth(OAuthAuthentication {
                secret: Some(d.secret.clone()),
                tenant: Some(d.tenant_id.clone()),
                audience: Some(audience),
                client_id: Some(d.client_id.clone()),
            })
        }
    }
}

/// Rebuild the variant from a response.
///
/// Secrets are set to `""` whatever the response holds. An unknown
/// discriminant yields `None`.
pub fn decode(auth: &Authentication) -> Option<AuthenticationVariant> {
    let variant = match auth {
        Authentication::Basic(b) => AuthenticationVariant::Basic(BasicAuth {
            username: b.username.clone().unwrap_or_default(),
            password: String::new(),
        }),
        Authentication::ClientCertificate(c) => AuthenticationVariant::Certificate(CertificateAuth {
            pfx: String::new(),
            password: String::new(),
            thumbprint: c.certificate_thumbprint.clone(),
            expiration: c.certificate_expiration_date,
            subject_name: c.certificate_subject_name.clone(),
        }),
        Authentication::ActiveDirectoryOAuth(o) => AuthenticationVariant::Directory(DirectoryAuth {
            tenant_id: o.tenant.clone().unwrap_or_default(),
            client_id: o.client_id.clone().unwrap_or_default(),
            secret: String::new(),
            audience: o.audience.clone(),
        }),
        Authentication::Unknown => {
            tracing::debug!("ignoring authentication with unknown type");
            return None;
        }
    };
    Some(variant)
}

//! Web action block <-> HTTP request payload.

use super::auth;
use crate::cfg::Environment;
use crate::job::ActionSpec;
use crate::remote::{HttpRequest, JobActionType};

/// Action type implied by the URL: `Https` for an `https://` prefix in any
/// case, `Http` otherwise.
pub fn protocol_for(url: &str) -> JobActionType {
    let secure = url
        .get(..8)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https://"));
    if secure {
        JobActionType::Https
    } else {
        JobActionType::Http
    }
}

/// Build the request payload and the action type to send with it.
pub fn encode(action: &ActionSpec, env: &Environment) -> (HttpRequest, JobActionType) {
    let request = HttpRequest {
        authentication: action.authentication.as_ref().map(|a| auth::encode(a, env)),
        uri: Some(action.url.clone()),
        method: Some(action.method.clone()),
        body: action.body.clone().filter(|b| !b.is_empty()),
        headers: Some(action.headers.clone()),
    };
    (request, protocol_for(&action.url))
}

/// Rebuild the action from a response; secrets come back as `""`.
pub fn decode(request: &HttpRequest) -> ActionSpec {
    ActionSpec {
        url: request.uri.clone().unwrap_or_default(),
        method: request.method.clone().unwrap_or_default(),
        body: request.body.clone(),
        headers: request.headers.clone().unwrap_or_default(),
        authentication: request.authentication.as_ref().and_then(auth::decode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{AuthenticationVariant, BasicAuth, DirectoryAuth};
    use std::collections::BTreeMap;

    fn action(url: &str) -> ActionSpec {
        ActionSpec {
            url: url.to_string(),
            method: "Post".into(),
            body: Some("{\"run\":true}".into()),
            headers: BTreeMap::from([("X-Trace".to_string(), "1".to_string())]),
            authentication: None,
        }
    }

    #[test]
    fn scheme_picks_protocol_in_any_case() {
        let env = Environment::default();
        assert_eq!(encode(&action("HTTPS://example/x"), &env).1, JobActionType::Https);
        assert_eq!(encode(&action("https://example/x"), &env).1, JobActionType::Https);
        assert_eq!(encode(&action("http://example/x"), &env).1, JobActionType::Http);
        assert_eq!(encode(&action("HtTp://example/x"), &env).1, JobActionType::Http);
        assert_eq!(protocol_for("http"), JobActionType::Http);
    }

    #[test]
    fn round_trips_without_authentication() {
        let a = action("https://example/x");
        let (req, _) = encode(&a, &Environment::default());
        assert_eq!(decode(&req), a);
    }

    #[test]
    fn round_trips_directory_auth_apart_from_secret() {
        let mut a = action("https://example/x");
        a.authentication = Some(AuthenticationVariant::Directory(DirectoryAuth {
            tenant_id: "t".into(),
            client_id: "c".into(),
            secret: "s".into(),
            audience: Some("api://aud".into()),
        }));
        let (req, _) = encode(&a, &Environment::default());
        let back = decode(&req);
        let Some(AuthenticationVariant::Directory(d)) = &back.authentication else {
            panic!("authentication lost");
        };
        assert_eq!(d.secret, "");
        let mut expected = a.clone();
        expected.authentication = Some(AuthenticationVariant::Directory(DirectoryAuth {
            secret: String::new(),
            ..d.clone()
        }));
        assert_eq!(back, expected);
    }

    #[test]
    fn empty_body_is_not_sent() {
        let mut a = action("http://example/x");
        a.body = Some(String::new());
        let (req, _) = encode(&a, &Environment::default());
        assert_eq!(req.body, None);
    }

    #[test]
    fn missing_authentication_decodes_to_none() {
        let mut a = action("https://example/x");
        a.authentication = Some(AuthenticationVariant::Basic(BasicAuth {
            username: "u".into(),
            password: "p".into(),
        }));
        let (mut req, _) = encode(&a, &Environment::default());
        req.authentication = None;
        assert_eq!(decode(&req).authentication, None);
    }
}

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use tracing::debug;

use super::{Transport, TransportError};
use crate::cfg::Environment;
use crate::remote::JobDefinition;
use crate::resource_id::JobId;

/// Azure Resource Manager client for scheduler jobs.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_version: String,
    token: String,
}

impl HttpTransport {
    /// Client for `env`, taking the bearer token from the env var it names.
    pub fn from_env(env: &Environment) -> Result<Self, TransportError> {
        let token = std::env::var(&env.token_env).map_err(|_| {
            TransportError::Credentials(format!("set {} to an ARM access token", env.token_env))
        })?;
        Self::new(env, token)
    }

    /// Client for `env` with an explicit bearer token.
    pub fn new(env: &Environment, token: String) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("jobsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: env.resource_manager_endpoint.trim_end_matches('/').to_string(),
            api_version: env.api_version.clone(),
            token,
        })
    }

    fn url(&self, id: &JobId) -> String {
        format!("{}{}?api-version={}", self.endpoint, id, self.api_version)
    }
}

fn send(req: reqwest::blocking::RequestBuilder) -> Result<Response, TransportError> {
    let resp = req.send().map_err(|e| TransportError::Request(e.to_string()))?;
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(TransportError::NotFound);
    }
    if !status.is_success() {
        let message = resp.text().unwrap_or_default();
        return Err(TransportError::Status { code: status.as_u16(), message });
    }
    Ok(resp)
}

fn decode(resp: Response) -> Result<JobDefinition, TransportError> {
    resp.json::<JobDefinition>()
        .map_err(|e| TransportError::Decode(e.to_string()))
}

impl Transport for HttpTransport {
    fn create_or_update(&self, id: &JobId, job: &JobDefinition) -> Result<JobDefinition, TransportError> {
        debug!(url = %self.url(id), "PUT scheduler job");
        let req = self.client.put(self.url(id)).bearer_auth(&self.token).json(job);
        decode(send(req)?)
    }

    fn get(&self, id: &JobId) -> Result<JobDefinition, TransportError> {
        debug!(url = %self.url(id), "GET scheduler job");
        decode(send(self.client.get(self.url(id)).bearer_auth(&self.token))?)
    }

    fn delete(&self, id: &JobId) -> Result<(), TransportError> {
        debug!(url = %self.url(id), "DELETE scheduler job");
        send(self.client.delete(self.url(id)).bearer_auth(&self.token))?;
        Ok(())
    }
}

//! HTTP client for the Jobgrid API.
//!
//! Maps transport and HTTP failures onto [`ServiceError`] so callers can
//! tell a name conflict or a missing job apart from infrastructure
//! problems. Error bodies are expected to be JSON objects carrying an
//! `error` (or `message`) string and an optional `data` context object,
//! but plain-text bodies are tolerated.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use jobgrid_core::{
    DesiredJobSpec, JobKind, JobService, LiveJobRecord, ServiceError, ServiceResult,
};

use crate::config::Session;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// One entry from the image catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub shortname: String,
    pub image: String,
}

impl ApiClient {
    /// Plain client without a TLS identity, for tests and local setups.
    pub fn new(base_url: &str) -> Self {
        Self::with_http(base_url, reqwest::Client::new())
    }

    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Builds a client presenting the session's kubeconfig TLS identity.
    ///
    /// Server-side TLS is not verified; the platform fronts the API with
    /// an internal certificate authority.
    pub fn from_session(session: &Session) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        for (name, value) in &session.custom_headers {
            headers.insert(
                reqwest::header::HeaderName::from_bytes(name.as_bytes())
                    .with_context(|| format!("invalid custom header name '{name}'"))?,
                reqwest::header::HeaderValue::from_str(value)
                    .with_context(|| format!("invalid custom header value for '{name}'"))?,
            );
        }

        let identity = reqwest::Identity::from_pem(&session.identity_pem()?)
            .context("couldn't build TLS identity from kubeconfig cert/key")?;

        let http = reqwest::Client::builder()
            .user_agent(session.user_agent())
            .default_headers(headers)
            .identity(identity)
            .danger_accept_invalid_certs(true)
            .build()
            .context("couldn't build HTTP client")?;

        Ok(Self::with_http(&session.api_url, http))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list(&self) -> ServiceResult<Vec<LiveJobRecord>> {
        let resp = self.get(&self.url("/list/")).await?;
        decode(check(resp).await?).await
    }

    pub async fn show(&self, name: &str) -> ServiceResult<LiveJobRecord> {
        let resp = self.get(&self.url(&format!("/show/{name}"))).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::not_found(name));
        }
        decode(check(resp).await?).await
    }

    pub async fn run(&self, spec: &DesiredJobSpec) -> ServiceResult<()> {
        let resp = self
            .http
            .post(self.url("/run/"))
            .json(&run_payload(spec))
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == reqwest::StatusCode::CONFLICT {
            return Err(ServiceError::already_exists(&spec.name));
        }
        check(resp).await?;
        Ok(())
    }

    /// Deletes one job. The API does not distinguish "deleted" from "was
    /// never there", and neither do we.
    pub async fn delete(&self, name: &str) -> ServiceResult<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/delete/{name}")))
            .send()
            .await
            .map_err(transport)?;
        tracing::debug!(job = %name, status = %resp.status(), "job deletion requested");
        Ok(())
    }

    /// Deletes all jobs.
    pub async fn flush(&self) -> ServiceResult<()> {
        let resp = self
            .http
            .delete(self.url("/flush/"))
            .send()
            .await
            .map_err(transport)?;
        tracing::debug!(status = %resp.status(), "flush requested");
        Ok(())
    }

    pub async fn restart(&self, name: &str) -> ServiceResult<()> {
        let resp = self
            .http
            .post(self.url(&format!("/restart/{name}")))
            .send()
            .await
            .map_err(transport)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ServiceError::not_found(name));
        }
        check(resp).await?;
        Ok(())
    }

    pub async fn images(&self) -> ServiceResult<Vec<ImageInfo>> {
        let resp = self.get(&self.url("/images/")).await?;
        decode(check(resp).await?).await
    }

    async fn get(&self, url: &str) -> ServiceResult<reqwest::Response> {
        self.http.get(url).send().await.map_err(transport)
    }
}

#[async_trait]
impl JobService for ApiClient {
    async fn create_job(&self, spec: &DesiredJobSpec) -> ServiceResult<()> {
        self.run(spec).await
    }

    async fn delete_job(&self, name: &str) -> ServiceResult<()> {
        self.delete(name).await
    }

    async fn list_live_names(&self) -> ServiceResult<std::collections::BTreeSet<String>> {
        Ok(self.list().await?.into_iter().map(|job| job.name).collect())
    }
}

/// The creation payload the API expects. The wire vocabulary differs from
/// both the jobs file and the listing: the image goes as `imagename`, the
/// command as `cmd`, and `filelog`/`continuous` travel as the strings the
/// Python-era server understands.
fn run_payload(spec: &DesiredJobSpec) -> Value {
    let mut payload = Map::new();
    payload.insert("name".into(), spec.name.clone().into());
    payload.insert("imagename".into(), spec.image.clone().into());
    payload.insert("cmd".into(), spec.command.clone().into());
    payload.insert("emails".into(), spec.emails.as_str().into());
    payload.insert("retry".into(), spec.retry.into());

    match spec.kind() {
        JobKind::Continuous => {
            payload.insert("continuous".into(), "true".into());
        }
        JobKind::Scheduled(schedule) => {
            payload.insert("schedule".into(), schedule.into());
        }
        JobKind::OneShot => {}
    }

    if !spec.no_filelog {
        // the default is to request the filelog
        payload.insert("filelog".into(), "true".into());
    }
    if let Some(stdout) = &spec.filelog_stdout {
        payload.insert("filelog_stdout".into(), stdout.clone().into());
    }
    if let Some(stderr) = &spec.filelog_stderr {
        payload.insert("filelog_stderr".into(), stderr.clone().into());
    }
    if let Some(memory) = &spec.memory {
        payload.insert("memory".into(), memory.clone().into());
    }
    if let Some(cpu) = &spec.cpu {
        payload.insert("cpu".into(), cpu.clone().into());
    }

    Value::Object(payload)
}

fn transport(err: reqwest::Error) -> ServiceError {
    ServiceError::transport(format!("couldn't contact the API endpoint: {err}"))
}

async fn check(resp: reqwest::Response) -> ServiceResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let mut message = body.trim().to_string();
    let mut context = BTreeMap::new();
    if let Ok(json) = serde_json::from_str::<Value>(&body) {
        match json {
            Value::Object(map) => {
                if let Some(Value::String(error)) = map.get("error") {
                    message = error.clone();
                } else if let Some(Value::String(error)) = map.get("message") {
                    message = error.clone();
                }
                if let Some(Value::Object(data)) = map.get("data") {
                    context = data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                }
            }
            Value::String(error) => message = error,
            _ => {}
        }
    }

    Err(ServiceError::Http {
        status: status.as_u16(),
        message,
        context,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> ServiceResult<T> {
    resp.json()
        .await
        .map_err(|err| ServiceError::transport(format!("couldn't parse information from the API: {err}")))
}

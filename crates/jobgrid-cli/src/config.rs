//! Session configuration.
//!
//! The CLI reads a small YAML config (API URL, kubeconfig location,
//! optional extra headers) and then the kubeconfig itself, which supplies
//! the client TLS identity and the tool namespace. Everything the HTTP
//! client needs for one session ends up in [`Session`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CliConfig {
    api_url: String,
    #[serde(default = "default_kubeconfig")]
    kubeconfig: String,
    #[serde(default)]
    customhdr: HashMap<String, String>,
}

fn default_kubeconfig() -> String {
    "~/.kube/config".to_string()
}

#[derive(Debug, Deserialize)]
struct KubeConfig {
    #[serde(rename = "current-context")]
    current_context: String,
    contexts: Vec<NamedContext>,
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: KubeContext,
}

#[derive(Debug, Deserialize)]
struct KubeContext {
    namespace: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: KubeUser,
}

#[derive(Debug, Deserialize)]
struct KubeUser {
    #[serde(rename = "client-certificate")]
    client_certificate: String,
    #[serde(rename = "client-key")]
    client_key: String,
}

/// Configuration for one CLI session.
#[derive(Debug)]
pub struct Session {
    pub api_url: String,
    pub namespace: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub custom_headers: HashMap<String, String>,
}

impl Session {
    /// Loads the CLI config and the kubeconfig it points at.
    ///
    /// `cert_override`/`key_override` replace the kubeconfig's TLS paths
    /// when given.
    pub fn load(
        cfg_path: &Path,
        cert_override: Option<&Path>,
        key_override: Option<&Path>,
    ) -> Result<Self> {
        let raw = fs::read_to_string(cfg_path)
            .with_context(|| format!("couldn't read config file '{}'", cfg_path.display()))?;
        let cfg: CliConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("couldn't parse config file '{}'", cfg_path.display()))?;

        let kubeconfig_path = expand_home(&cfg.kubeconfig);
        let raw = fs::read_to_string(&kubeconfig_path).with_context(|| {
            format!(
                "couldn't read kubeconfig file '{}'",
                kubeconfig_path.display()
            )
        })?;
        let kube: KubeConfig = serde_yaml::from_str(&raw).with_context(|| {
            format!(
                "couldn't parse kubeconfig file '{}'",
                kubeconfig_path.display()
            )
        })?;
        tracing::debug!(path = %kubeconfig_path.display(), "loaded kubeconfig file");

        let context = kube
            .contexts
            .iter()
            .find(|c| c.name == kube.current_context)
            .map(|c| &c.context)
            .with_context(|| {
                format!(
                    "context '{}' not found in kubeconfig '{}'",
                    kube.current_context,
                    kubeconfig_path.display()
                )
            })?;
        let user = kube
            .users
            .iter()
            .find(|u| u.name == context.user)
            .map(|u| &u.user)
            .with_context(|| {
                format!(
                    "user '{}' not found in kubeconfig '{}'",
                    context.user,
                    kubeconfig_path.display()
                )
            })?;

        let cert_path = cert_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| expand_home(&user.client_certificate));
        let key_path = key_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| expand_home(&user.client_key));

        Ok(Self {
            api_url: cfg.api_url.trim_end_matches('/').to_string(),
            namespace: context.namespace.clone(),
            cert_path,
            key_path,
            custom_headers: cfg.customhdr,
        })
    }

    /// Client cert and key concatenated into one PEM bundle.
    pub fn identity_pem(&self) -> Result<Vec<u8>> {
        let mut pem = fs::read(&self.cert_path).with_context(|| {
            format!("couldn't read TLS cert '{}'", self.cert_path.display())
        })?;
        pem.extend(fs::read(&self.key_path).with_context(|| {
            format!("couldn't read TLS key '{}'", self.key_path.display())
        })?);
        Ok(pem)
    }

    pub fn user_agent(&self) -> String {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());
        format!("jobgrid-cli {}@{}", self.namespace, host)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

//! Error types for the reconciliation core.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde_json::Value;

/// Errors surfaced by a [`JobService`](crate::JobService) collaborator.
///
/// The distinction between variants matters to callers: a creation conflict
/// or a missing job is an actionable user-facing condition, while transport
/// and server-side failures call for contacting a platform admin.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A job with the same name already exists on the platform.
    #[error("a job with the same name '{name}' exists already")]
    AlreadyExists { name: String },

    /// The named job does not exist on the platform.
    #[error("job '{name}' does not exist")]
    NotFound { name: String },

    /// The API answered with a non-success status code.
    #[error("{message} (HTTP {status})")]
    Http {
        status: u16,
        message: String,
        /// Extra key/value context reported by the API alongside the error.
        context: BTreeMap<String, Value>,
    },

    /// The API endpoint could not be reached at all. The message carries
    /// the collaborator's full description of what went wrong.
    #[error("{message}")]
    Transport { message: String },
}

impl ServiceError {
    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a new `Http` error without context.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a creation conflict.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns `true` if this is a missing-job error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the failure was caused by the request itself
    /// rather than by the platform (HTTP 4xx, conflicts, missing jobs).
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::AlreadyExists { .. } | Self::NotFound { .. } => true,
            Self::Http { status, .. } => (400..=499).contains(status),
            Self::Transport { .. } => false,
        }
    }

    /// Extra context reported by the API, if any.
    #[must_use]
    pub fn context(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Http { context, .. } if !context.is_empty() => Some(context),
            _ => None,
        }
    }
}

/// Errors produced while applying a change-set.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// Deleted jobs were still reported live when the bounded wait elapsed.
    /// Already-issued deletions are not undone.
    #[error(
        "timed out after {} seconds waiting for {} old job(s) to be deleted",
        .waited.as_secs(),
        .pending.len()
    )]
    ConvergenceTimeout {
        /// Names that were still present at the last poll.
        pending: BTreeSet<String>,
        waited: Duration,
    },

    /// A recreation raced with an incompletely-observed deletion, or the
    /// desired list contained a job that already exists.
    #[error("a job with the same name '{name}' exists already")]
    CreateConflict { name: String },

    /// A collaborator call failed for infrastructure reasons.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::already_exists("myjob");
        assert_eq!(
            err.to_string(),
            "a job with the same name 'myjob' exists already"
        );

        let err = ServiceError::http(502, "upstream unavailable");
        assert_eq!(err.to_string(), "upstream unavailable (HTTP 502)");
    }

    #[test]
    fn test_error_predicates() {
        assert!(ServiceError::already_exists("a").is_already_exists());
        assert!(ServiceError::not_found("a").is_not_found());
        assert!(ServiceError::not_found("a").is_user_error());
        assert!(ServiceError::http(403, "denied").is_user_error());
        assert!(!ServiceError::http(500, "boom").is_user_error());
        assert!(!ServiceError::transport("connection refused").is_user_error());
    }

    #[test]
    fn test_http_context() {
        let mut context = BTreeMap::new();
        context.insert("k8s_error".to_string(), Value::String("timed out".into()));
        let err = ServiceError::Http {
            status: 500,
            message: "failed to load running jobs".to_string(),
            context,
        };
        assert!(err.context().is_some());
        assert!(ServiceError::http(500, "no context").context().is_none());
    }

    #[test]
    fn test_convergence_timeout_display() {
        let err = ApplyError::ConvergenceTimeout {
            pending: BTreeSet::from(["a".to_string(), "b".to_string()]),
            waited: Duration::from_secs(300),
        };
        assert_eq!(
            err.to_string(),
            "timed out after 300 seconds waiting for 2 old job(s) to be deleted"
        );
    }
}

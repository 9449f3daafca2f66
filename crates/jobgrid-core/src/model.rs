//! Job record model.
//!
//! A job exists in two shapes: the [`DesiredJobSpec`] a user declares in the
//! jobs file, and the [`LiveJobRecord`] the API reports for a running job.
//! The two use different field names for historic reasons (`command` vs
//! `cmd`, `memory` vs `mem`, dashes vs underscores), so the live shape is
//! translated into the desired-spec vocabulary through [`NormalizedView`]
//! before any comparison happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Email notification policy for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailPolicy {
    #[default]
    None,
    All,
    OnFinish,
    OnFailure,
}

impl EmailPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::All => "all",
            Self::OnFinish => "onfinish",
            Self::OnFailure => "onfailure",
        }
    }
}

/// The three mutually exclusive execution modes of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind<'a> {
    /// Runs once and finishes.
    OneShot,
    /// Runs on a cron-like schedule.
    Scheduled(&'a str),
    /// Restarted whenever it stops.
    Continuous,
}

/// One entry from the user-authored jobs file.
///
/// Field names follow the jobs-file vocabulary: `mem`, `no-filelog`,
/// `filelog-stdout`, `filelog-stderr`. Keys the file declares but this
/// struct does not know end up in `unknown_keys`, so the reconciler can
/// flag them without failing the load.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct DesiredJobSpec {
    pub name: String,
    pub command: String,
    pub image: String,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub continuous: bool,
    #[serde(default, rename = "mem")]
    pub memory: Option<String>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default)]
    pub retry: u8,
    #[serde(default)]
    pub emails: EmailPolicy,
    #[serde(default, rename = "no-filelog")]
    pub no_filelog: bool,
    #[serde(default, rename = "filelog-stdout")]
    pub filelog_stdout: Option<String>,
    #[serde(default, rename = "filelog-stderr")]
    pub filelog_stderr: Option<String>,
    /// Wait for completion. Only meaningful for one-shot jobs.
    #[serde(default)]
    pub wait: bool,
    #[serde(flatten)]
    pub unknown_keys: BTreeMap<String, Value>,
}

impl DesiredJobSpec {
    /// The execution mode this spec declares. `continuous` takes precedence
    /// over `schedule` if a hand-edited file sets both.
    #[must_use]
    pub fn kind(&self) -> JobKind<'_> {
        if self.continuous {
            JobKind::Continuous
        } else if let Some(schedule) = &self.schedule {
            JobKind::Scheduled(schedule)
        } else {
            JobKind::OneShot
        }
    }
}

/// One entry from the API job listing.
///
/// Mirrors [`DesiredJobSpec`] under API field names, plus the read-only
/// status fields. The API speaks Python on the wire: `filelog` and
/// `continuous` may arrive as JSON booleans or as the strings
/// `"True"`/`"true"`, both of which deserialize to `true` here.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct LiveJobRecord {
    pub name: String,
    pub cmd: String,
    pub image: String,
    #[serde(default)]
    pub image_state: Option<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub continuous: bool,
    #[serde(default)]
    pub mem: Option<String>,
    #[serde(default)]
    pub cpu: Option<String>,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub filelog: bool,
    #[serde(default)]
    pub filelog_stdout: Option<String>,
    #[serde(default)]
    pub filelog_stderr: Option<String>,
    #[serde(default)]
    pub emails: EmailPolicy,
    #[serde(default)]
    pub retry: u8,
    #[serde(default)]
    pub status_short: Option<String>,
    #[serde(default)]
    pub status_long: Option<String>,
}

impl LiveJobRecord {
    /// The execution mode the API reports for this job.
    #[must_use]
    pub fn kind(&self) -> JobKind<'_> {
        if self.continuous {
            JobKind::Continuous
        } else if let Some(schedule) = &self.schedule {
            JobKind::Scheduled(schedule)
        } else {
            JobKind::OneShot
        }
    }

    /// Translates this record into the desired-spec vocabulary.
    ///
    /// Produces a derived read-only view; the record itself is never
    /// mutated, so it stays safe to reuse for display afterwards.
    #[must_use]
    pub fn normalized(&self) -> NormalizedView<'_> {
        NormalizedView {
            command: &self.cmd,
            schedule: self.schedule.as_deref(),
            continuous: self.continuous,
            image: &self.image,
            memory: self.mem.as_deref(),
            cpu: self.cpu.as_deref(),
            filelog_stdout: self.filelog_stdout.as_deref(),
            filelog_stderr: self.filelog_stderr.as_deref(),
        }
    }
}

/// A [`LiveJobRecord`] seen through the desired-spec field names:
/// `cmd` becomes `command`, `mem` becomes `memory`, and the filelog
/// destinations drop their API-side underscores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedView<'a> {
    pub command: &'a str,
    pub schedule: Option<&'a str>,
    pub continuous: bool,
    pub image: &'a str,
    pub memory: Option<&'a str>,
    pub cpu: Option<&'a str>,
    pub filelog_stdout: Option<&'a str>,
    pub filelog_stderr: Option<&'a str>,
}

fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.as_str(), "True" | "true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_spec_from_yaml() {
        let yaml = r#"
name: daily-cleanup
command: ./cleanup.sh --all
image: bookworm
schedule: "0 3 * * *"
mem: 2Gi
no-filelog: true
filelog-stdout: /dev/null
"#;
        let spec: DesiredJobSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.name, "daily-cleanup");
        assert_eq!(spec.memory.as_deref(), Some("2Gi"));
        assert!(spec.no_filelog);
        assert_eq!(spec.filelog_stdout.as_deref(), Some("/dev/null"));
        assert_eq!(spec.retry, 0);
        assert_eq!(spec.emails, EmailPolicy::None);
        assert_eq!(spec.kind(), JobKind::Scheduled("0 3 * * *"));
        assert!(spec.unknown_keys.is_empty());
    }

    #[test]
    fn test_desired_spec_captures_unknown_keys() {
        let yaml = r#"
name: myjob
command: ./run.sh
image: bookworm
xyz: 42
"#;
        let spec: DesiredJobSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            spec.unknown_keys.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["xyz"]
        );
    }

    #[test]
    fn test_live_record_python_booleans() {
        let json = r#"{
            "name": "myjob",
            "cmd": "./run.sh",
            "image": "bookworm",
            "filelog": "True",
            "continuous": "true",
            "emails": "onfailure",
            "retry": 2
        }"#;
        let record: LiveJobRecord = serde_json::from_str(json).unwrap();
        assert!(record.filelog);
        assert!(record.continuous);
        assert_eq!(record.emails, EmailPolicy::OnFailure);
        assert_eq!(record.retry, 2);
        assert_eq!(record.kind(), JobKind::Continuous);
    }

    #[test]
    fn test_live_record_falsy_filelog() {
        let json = r#"{"name": "j", "cmd": "x", "image": "i", "filelog": "False"}"#;
        let record: LiveJobRecord = serde_json::from_str(json).unwrap();
        assert!(!record.filelog);

        let json = r#"{"name": "j", "cmd": "x", "image": "i"}"#;
        let record: LiveJobRecord = serde_json::from_str(json).unwrap();
        assert!(!record.filelog);
    }

    #[test]
    fn test_normalized_view_renames() {
        let record = LiveJobRecord {
            name: "myjob".into(),
            cmd: "./run.sh".into(),
            image: "bookworm".into(),
            mem: Some("4Gi".into()),
            filelog_stdout: Some("out.log".into()),
            ..Default::default()
        };
        let view = record.normalized();
        assert_eq!(view.command, "./run.sh");
        assert_eq!(view.memory, Some("4Gi"));
        assert_eq!(view.cpu, None);
        assert_eq!(view.filelog_stdout, Some("out.log"));
        assert_eq!(view.filelog_stderr, None);
    }
}

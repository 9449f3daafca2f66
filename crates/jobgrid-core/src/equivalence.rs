//! Equivalence checker.
//!
//! Decides whether a live job already matches its definition, i.e. whether
//! the reconciler can leave it alone. The check is deliberately ordered:
//! the high-signal plain fields (command, image) go first to fail fast,
//! while the fields that need default substitution or type coercion
//! (`emails`, `retry`, `filelog`) are compared in their own steps at the
//! end so the coercion rules stay auditable.

use tracing::debug;

use crate::model::{DesiredJobSpec, LiveJobRecord};

/// Returns `true` if the live job matches the desired spec field for field,
/// so no delete/recreate cycle is needed.
///
/// Absence and explicit null are the same thing; a present empty string is
/// not. Requesting the server-side default for `memory`/`cpu` explicitly is
/// the same as not requesting anything.
#[must_use]
pub fn is_equivalent(spec: &DesiredJobSpec, live: &LiveJobRecord) -> bool {
    let view = live.normalized();

    if spec.command != view.command {
        return mismatch(&live.name, "command");
    }
    if spec.schedule.as_deref() != view.schedule {
        return mismatch(&live.name, "schedule");
    }
    if spec.continuous != view.continuous {
        return mismatch(&live.name, "continuous");
    }
    if spec.image != view.image {
        return mismatch(&live.name, "image");
    }
    if resource(spec.memory.as_deref()) != resource(view.memory) {
        return mismatch(&live.name, "mem");
    }
    if resource(spec.cpu.as_deref()) != resource(view.cpu) {
        return mismatch(&live.name, "cpu");
    }
    if spec.filelog_stdout.as_deref() != view.filelog_stdout {
        return mismatch(&live.name, "filelog-stdout");
    }
    if spec.filelog_stderr.as_deref() != view.filelog_stderr {
        return mismatch(&live.name, "filelog-stderr");
    }

    if spec.emails != live.emails {
        return mismatch(&live.name, "emails");
    }
    if spec.retry != live.retry {
        return mismatch(&live.name, "retry");
    }

    let filelog_wanted = !spec.no_filelog;
    if filelog_wanted != live.filelog {
        return mismatch(&live.name, "no-filelog");
    }

    debug!(job = %live.name, "live job matches its definition");
    true
}

/// An explicit `"default"` requests the server-side default, which is what
/// an unset field gets anyway.
fn resource(value: Option<&str>) -> Option<&str> {
    match value {
        Some("default") => None,
        other => other,
    }
}

fn mismatch(name: &str, field: &str) -> bool {
    debug!(job = %name, field, "live job differs from its definition");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmailPolicy;

    fn sample_spec() -> DesiredJobSpec {
        DesiredJobSpec {
            name: "test-job".into(),
            command: "./myothercommand.py -v".into(),
            image: "bullseye".into(),
            ..Default::default()
        }
    }

    fn sample_live() -> LiveJobRecord {
        LiveJobRecord {
            name: "test-job".into(),
            cmd: "./myothercommand.py -v".into(),
            image: "bullseye".into(),
            image_state: Some("stable".into()),
            filelog: true,
            emails: EmailPolicy::None,
            retry: 0,
            status_short: Some("Running".into()),
            status_long: Some("Pod in 'Running' phase.".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_matching_job_is_equivalent() {
        assert!(is_equivalent(&sample_spec(), &sample_live()));
    }

    #[test]
    fn test_image_change_either_side() {
        let spec = DesiredJobSpec {
            image: "tf-foobar".into(),
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));

        let live = LiveJobRecord {
            image: "tf-foobar".into(),
            ..sample_live()
        };
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_schedule_change_either_side() {
        let spec = DesiredJobSpec {
            schedule: Some("* * * * *".into()),
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));

        let live = LiveJobRecord {
            schedule: Some("* * * * *".into()),
            ..sample_live()
        };
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_emails_defaults_to_none() {
        // spec omitting emails == live record with emails "none"
        assert_eq!(sample_spec().emails, EmailPolicy::None);
        assert!(is_equivalent(&sample_spec(), &sample_live()));

        let spec = DesiredJobSpec {
            emails: EmailPolicy::OnFailure,
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));

        let live = LiveJobRecord {
            emails: EmailPolicy::OnFailure,
            ..sample_live()
        };
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_retry_defaults_to_zero() {
        let spec = DesiredJobSpec {
            retry: 1,
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));

        let live = LiveJobRecord {
            retry: 2,
            ..sample_live()
        };
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_filelog_intent() {
        // no-filelog unset wants filelog, which the live job has
        let spec = DesiredJobSpec {
            no_filelog: false,
            ..sample_spec()
        };
        assert!(is_equivalent(&spec, &sample_live()));

        let spec = DesiredJobSpec {
            no_filelog: true,
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));

        // live job without file logging does not satisfy the default intent
        let live = LiveJobRecord {
            filelog: false,
            ..sample_live()
        };
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_filelog_destinations() {
        let spec = DesiredJobSpec {
            filelog_stdout: Some("xyz".into()),
            ..sample_spec()
        };
        let live = LiveJobRecord {
            filelog_stdout: Some("xyz".into()),
            ..sample_live()
        };
        assert!(is_equivalent(&spec, &live));
        assert!(!is_equivalent(&spec, &sample_live()));
        assert!(!is_equivalent(&sample_spec(), &live));

        let spec = DesiredJobSpec {
            filelog_stderr: Some("xyz".into()),
            ..sample_spec()
        };
        let live = LiveJobRecord {
            filelog_stderr: Some("xyz".into()),
            ..sample_live()
        };
        assert!(is_equivalent(&spec, &live));
        assert!(!is_equivalent(&spec, &sample_live()));
        assert!(!is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_empty_string_is_not_absent() {
        let spec = DesiredJobSpec {
            filelog_stdout: Some(String::new()),
            ..sample_spec()
        };
        assert!(!is_equivalent(&spec, &sample_live()));
    }

    #[test]
    fn test_explicit_default_resources_are_unset() {
        let spec = DesiredJobSpec {
            memory: Some("default".into()),
            cpu: Some("default".into()),
            ..sample_spec()
        };
        assert!(is_equivalent(&spec, &sample_live()));

        let live = LiveJobRecord {
            mem: Some("default".into()),
            ..sample_live()
        };
        assert!(is_equivalent(&sample_spec(), &live));
    }

    #[test]
    fn test_memory_change_is_a_difference() {
        let spec = DesiredJobSpec {
            memory: Some("4Gi".into()),
            ..sample_spec()
        };
        let live = LiveJobRecord {
            mem: Some("2Gi".into()),
            ..sample_live()
        };
        assert!(!is_equivalent(&spec, &live));
    }
}

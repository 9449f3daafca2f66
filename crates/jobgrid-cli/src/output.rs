//! Human-oriented rendering of API data.
//!
//! Jobs come out of the API in wire vocabulary; the tables speak the
//! user's: execution mode folded into a single "Job type" column, memory
//! and CPU folded into "Resources", Python-ish booleans turned into
//! yes/no.

use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use jobgrid_core::{JobKind, LiveJobRecord};

use crate::cli::ListDisplayMode;
use crate::client::ImageInfo;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn jobs_table(jobs: &[LiveJobRecord], mode: ListDisplayMode) -> String {
    let mut builder = Builder::default();
    match mode {
        ListDisplayMode::Normal => {
            builder.push_record(["Job name:", "Job type:", "Status:"]);
            for job in jobs {
                builder.push_record([
                    job.name.clone(),
                    job_type(job),
                    text_or_unknown(job.status_short.as_deref()),
                ]);
            }
        }
        ListDisplayMode::Long => {
            builder.push_record([
                "Job name:",
                "Command:",
                "Job type:",
                "Image:",
                "File log:",
                "Output log:",
                "Error log:",
                "Emails:",
                "Resources:",
                "Retry:",
                "Status:",
            ]);
            for job in jobs {
                builder.push_record(long_row(job));
            }
        }
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Key/value rendering of a single job, hints included.
pub fn job_details_table(job: &LiveJobRecord) -> String {
    let mut builder = Builder::default();
    let labels = [
        "Job name:",
        "Command:",
        "Job type:",
        "Image:",
        "File log:",
        "Output log:",
        "Error log:",
        "Emails:",
        "Resources:",
        "Retry:",
        "Status:",
    ];
    for (label, value) in labels.iter().zip(long_row(job)) {
        builder.push_record([(*label).to_string(), value]);
    }
    builder.push_record([
        "Hints:".to_string(),
        text_or_unknown(job.status_long.as_deref()),
    ]);
    builder.build().with(Style::modern()).to_string()
}

pub fn images_table(images: &[ImageInfo]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Short name", "Container image URL"]);
    for info in images {
        builder.push_record([info.shortname.as_str(), info.image.as_str()]);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn long_row(job: &LiveJobRecord) -> [String; 11] {
    [
        job.name.clone(),
        job.cmd.clone(),
        job_type(job),
        image_display(job),
        if job.filelog { "yes" } else { "no" }.to_string(),
        text_or_dash(job.filelog_stdout.as_deref()),
        text_or_dash(job.filelog_stderr.as_deref()),
        job.emails.as_str().to_string(),
        resources_display(job.mem.as_deref(), job.cpu.as_deref()),
        retry_display(job.retry),
        text_or_unknown(job.status_short.as_deref()),
    ]
}

fn job_type(job: &LiveJobRecord) -> String {
    match job.kind() {
        JobKind::OneShot => "normal".to_string(),
        JobKind::Continuous => "continuous".to_string(),
        JobKind::Scheduled(schedule) => format!("schedule: {schedule}"),
    }
}

/// Image shortname, flagged when the image is not in its stable state.
fn image_display(job: &LiveJobRecord) -> String {
    match job.image_state.as_deref() {
        Some(state) if state != "stable" => format!("{} ({state})", job.image),
        _ => job.image.clone(),
    }
}

fn resources_display(mem: Option<&str>, cpu: Option<&str>) -> String {
    match (mem, cpu) {
        (None, None) => "default".to_string(),
        (mem, cpu) => format!(
            "mem: {}, cpu: {}",
            mem.unwrap_or("default"),
            cpu.unwrap_or("default")
        ),
    }
}

fn retry_display(retry: u8) -> String {
    if retry == 0 {
        "no".to_string()
    } else {
        format!("yes: {retry} time(s)")
    }
}

fn text_or_unknown(value: Option<&str>) -> String {
    value.unwrap_or("Unknown").to_string()
}

fn text_or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobgrid_core::EmailPolicy;

    fn job() -> LiveJobRecord {
        LiveJobRecord {
            name: "myjob".into(),
            cmd: "./run.sh".into(),
            image: "bullseye".into(),
            image_state: Some("stable".into()),
            filelog: true,
            emails: EmailPolicy::None,
            status_short: Some("Running".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_job_type_display() {
        assert_eq!(job_type(&job()), "normal");

        let continuous = LiveJobRecord {
            continuous: true,
            ..job()
        };
        assert_eq!(job_type(&continuous), "continuous");

        let scheduled = LiveJobRecord {
            schedule: Some("1 * * * *".into()),
            ..job()
        };
        assert_eq!(job_type(&scheduled), "schedule: 1 * * * *");
    }

    #[test]
    fn test_image_display_flags_unstable_state() {
        assert_eq!(image_display(&job()), "bullseye");

        let deprecated = LiveJobRecord {
            image_state: Some("deprecated".into()),
            ..job()
        };
        assert_eq!(image_display(&deprecated), "bullseye (deprecated)");
    }

    #[test]
    fn test_resources_display() {
        assert_eq!(resources_display(None, None), "default");
        assert_eq!(resources_display(Some("2Gi"), None), "mem: 2Gi, cpu: default");
        assert_eq!(
            resources_display(Some("2Gi"), Some("500m")),
            "mem: 2Gi, cpu: 500m"
        );
    }

    #[test]
    fn test_retry_display() {
        assert_eq!(retry_display(0), "no");
        assert_eq!(retry_display(3), "yes: 3 time(s)");
    }

    #[test]
    fn test_jobs_table_contains_rows() {
        let rendered = jobs_table(&[job()], ListDisplayMode::Normal);
        assert!(rendered.contains("myjob"));
        assert!(rendered.contains("normal"));
        assert!(rendered.contains("Running"));

        let rendered = jobs_table(&[job()], ListDisplayMode::Long);
        assert!(rendered.contains("./run.sh"));
        assert!(rendered.contains("default"));
    }

    #[test]
    fn test_job_details_include_hints() {
        let detailed = LiveJobRecord {
            status_long: Some("Last run at 2022-10-08T09:28:37Z.".into()),
            ..job()
        };
        let rendered = job_details_table(&detailed);
        assert!(rendered.contains("Hints:"));
        assert!(rendered.contains("Last run at"));
    }
}

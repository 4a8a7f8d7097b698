//! Dry-run output.

use crate::backports::HolderJob;
use crate::target::ImportJob;

/// Number of payloads printed in full.
const SAMPLE_PAYLOADS: usize = 3;

/// Lines of each sample body shown.
const SAMPLE_BODY_LINES: usize = 10;

pub(super) fn print_dry_run_preview(
    repository: &str,
    payloads: &[(String, ImportJob)],
    holders: &[HolderJob],
) {
    println!("\n[DRY RUN] Target: {repository}");
    println!("  Would import {} issues", payloads.len());

    for (key, job) in payloads.iter().take(SAMPLE_PAYLOADS) {
        let issue = &job.issue;
        println!("\n  {key} -> \"{}\"", issue.title);
        println!(
            "    closed: {}, milestone: {}, labels: [{}], comments: {}",
            issue.closed,
            issue.milestone.map_or_else(|| "-".to_string(), |m| m.to_string()),
            issue.labels.join(", "),
            job.comments.len()
        );
        for line in issue.body.lines().take(SAMPLE_BODY_LINES) {
            println!("    | {line}");
        }
        if issue.body.lines().count() > SAMPLE_BODY_LINES {
            println!("    | ...");
        }
    }

    if payloads.len() > SAMPLE_PAYLOADS {
        println!("\n  ... and {} more", payloads.len() - SAMPLE_PAYLOADS);
    }

    if !holders.is_empty() {
        println!("\n  Backport holders:");
        for holder in holders {
            println!("    {}", holder.milestone);
            for line in holder.job.issue.body.lines().skip(1) {
                if !line.trim().is_empty() {
                    println!("      {line}");
                }
            }
        }
    }

    println!();
}

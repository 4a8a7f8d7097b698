mod common;

use common::{config, issue, runner, start, FakeTarget, BROWSE};
use issue_migrator::ledger::FailureKind;
use issue_migrator::{Ledger, ManualClock, RunnerError};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<FakeTarget>, Arc<ManualClock>) {
    (
        TempDir::new().unwrap(),
        FakeTarget::new(),
        Arc::new(ManualClock::new(start())),
    )
}

#[tokio::test]
async fn failed_submission_halts_and_resumes_on_next_run() {
    let (dir, target, clock) = setup();
    let issues = vec![
        issue("SEC-1", &["4.0.0"], json!({})),
        issue("SEC-2", &["4.0.0"], json!({})),
        issue("SEC-3", &["4.0.0"], json!({})),
    ];
    target.reject("Summary of SEC-2");

    let summary = runner(config(dir.path()), issues.clone(), &target, &clock, false)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.primary_imported, 2);
    assert_eq!(summary.primary_failed, 1);
    assert!(summary.halted);

    let ledger = Ledger::open(dir.path()).unwrap();
    assert_eq!(ledger.issue_number("SEC-1"), Some(1));
    assert_eq!(ledger.issue_number("SEC-2"), None);
    assert_eq!(ledger.issue_number("SEC-3"), Some(2));

    let failures: Vec<_> = ledger
        .failures()
        .unwrap()
        .into_iter()
        .filter(|entry| entry.kind == FailureKind::Job)
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].namespace, "issue");
    assert_eq!(failures[0].subject, "SEC-2");

    target.allow_all();
    target.state().submitted.clear();

    let summary = runner(config(dir.path()), issues, &target, &clock, false)
        .run()
        .await
        .unwrap();

    assert_eq!(target.submitted_titles(), vec!["Summary of SEC-2"]);
    assert_eq!(summary.already_migrated, 2);
    assert_eq!(summary.primary_imported, 1);
    assert!(!summary.halted);
    assert_eq!(
        Ledger::open(dir.path()).unwrap().issue_number("SEC-2"),
        Some(3)
    );
}

#[tokio::test]
async fn each_checkpoint_is_awaited_before_the_next_is_submitted() {
    let (dir, target, clock) = setup();
    let issues = vec![
        issue("SEC-1", &[], json!({})),
        issue("SEC-2", &[], json!({})),
        issue("SEC-3", &[], json!({})),
    ];

    runner(config(dir.path()), issues, &target, &clock, false)
        .run()
        .await
        .unwrap();

    assert_eq!(
        target.state().events,
        vec![
            "submit Summary of SEC-1",
            "submit Summary of SEC-2",
            "poll Summary of SEC-1",
            "poll Summary of SEC-1",
            "poll Summary of SEC-2",
            "poll Summary of SEC-2",
            "submit Summary of SEC-3",
            "poll Summary of SEC-3",
            "poll Summary of SEC-3",
        ]
    );
}

#[tokio::test]
async fn unterminated_code_block_does_not_halt_the_run() {
    let (dir, target, clock) = setup();
    let issues = vec![
        issue("SEC-1", &["5.0.9", "4.3.19"], json!({})),
        issue("SEC-2", &[], json!({ "description": "See:\n{code}\nfoo();" })),
    ];

    let summary = runner(config(dir.path()), issues, &target, &clock, false)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.primary_imported, 2);
    assert!(!summary.halted);
    assert_eq!(summary.holders_imported, 1);

    let (_, imported) = target.issue_titled("Summary of SEC-2").unwrap();
    assert!(imported.issue.body.contains("See:\n```\nfoo();\n```"));
    assert!(Ledger::open(dir.path()).unwrap().failures().unwrap().is_empty());
}

#[tokio::test]
async fn failed_import_is_logged_with_errors() {
    let (dir, target, clock) = setup();
    target.fail("Summary of SEC-1");

    let summary = runner(
        config(dir.path()),
        vec![issue("SEC-1", &[], json!({}))],
        &target,
        &clock,
        false,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(summary.primary_failed, 1);
    assert!(summary.halted);
    assert!(!clock.sleeps().is_empty());

    let failures = Ledger::open(dir.path()).unwrap().failures().unwrap();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].reason.contains("title"), "{}", failures[0].reason);
}

#[tokio::test]
async fn backports_share_one_holder_per_milestone() {
    let (dir, target, clock) = setup();
    let issues = vec![
        issue("SEC-1", &["5.0.9", "4.3.19"], json!({})),
        issue("SEC-2", &["4.3.19", "5.0.10"], json!({})),
    ];

    let summary = runner(config(dir.path()), issues.clone(), &target, &clock, false)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.primary_imported, 2);
    assert_eq!(summary.holders_imported, 1);

    let (number, holder) = target.issue_titled("4.3.19").unwrap();
    assert_eq!(number, 3);
    assert!(holder.issue.body.contains("- Summary of SEC-1 #1"));
    assert!(holder.issue.body.contains("- Summary of SEC-2 #2"));
    assert_eq!(holder.issue.labels, vec!["type: backport"]);

    let milestone = target
        .state()
        .milestones
        .iter()
        .find(|m| m.title == "4.3.19")
        .map(|m| m.number);
    assert_eq!(holder.issue.milestone, milestone);
    assert!(target.state().labels.contains(&"type: backport".to_string()));

    let (_, primary) = target.issue_titled("Summary of SEC-1").unwrap();
    assert!(primary.issue.body.contains("**Backported to:** 4.3.19"));
    assert_eq!(primary.issue.labels, vec!["type: bug"]);

    let submitted = target.state().submitted.len();
    let summary = runner(config(dir.path()), issues, &target, &clock, false)
        .run()
        .await
        .unwrap();
    assert_eq!(target.state().submitted.len(), submitted);
    assert_eq!(summary.holders_skipped, 1);
    assert_eq!(Ledger::open(dir.path()).unwrap().holder_number("4.3.19"), Some(3));
    assert!(Ledger::open(dir.path()).unwrap().failures().unwrap().is_empty());
}

#[tokio::test]
async fn cross_links_are_posted_once() {
    let (dir, target, clock) = setup();
    let issues = vec![
        issue(
            "SEC-1",
            &[],
            json!({ "links": [{ "kind": "depends on", "direction": "outward", "key": "SEC-2" }] }),
        ),
        issue(
            "SEC-2",
            &[],
            json!({ "links": [{ "kind": "depends on", "direction": "inward", "key": "SEC-1" }] }),
        ),
        issue("SEC-3", &[], json!({ "parent": "SEC-1" })),
        issue(
            "SEC-4",
            &[],
            json!({ "links": [{ "kind": "duplicates", "direction": "outward", "key": "SEC-99" }] }),
        ),
    ];

    let summary = runner(config(dir.path()), issues.clone(), &target, &clock, false)
        .run()
        .await
        .unwrap();
    assert_eq!(summary.links_posted, 3);

    let comments = target.state().comments.clone();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0].0, 1);
    assert!(comments[0].1.contains("- depends on #2"));
    assert_eq!(comments[1].0, 3);
    assert!(comments[1].1.contains("- sub-task of #1"));
    assert_eq!(comments[2].0, 4);
    assert!(comments[2]
        .1
        .contains(&format!("- duplicates [SEC-99]({BROWSE}/SEC-99)")));

    let summary = runner(config(dir.path()), issues, &target, &clock, false)
        .run()
        .await
        .unwrap();
    assert_eq!(summary.links_posted, 0);
    assert_eq!(target.state().comments.len(), 3);
}

#[tokio::test]
async fn dry_run_changes_nothing() {
    let (dir, target, clock) = setup();
    let mut config = config(dir.path());
    config.target.create_repository = true;
    let issues = vec![
        issue("SEC-1", &["5.0.9", "4.3.19"], json!({})),
        issue("SEC-2", &["4.3.19"], json!({})),
    ];

    let summary = runner(config, issues, &target, &clock, true)
        .run()
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.primary_imported, 0);

    let state = target.state();
    assert!(!state.repository_created);
    assert!(state.milestones.is_empty());
    assert!(state.labels.is_empty());
    assert!(state.submitted.is_empty());
    assert!(state.comments.is_empty());
    drop(state);

    let ledger = Ledger::open(dir.path()).unwrap();
    assert!(ledger.is_empty());
    assert!(ledger.failures().unwrap().is_empty());
}

#[tokio::test]
async fn repository_is_created_only_for_an_empty_ledger() {
    let (dir, target, clock) = setup();
    let mut config = config(dir.path());
    config.target.create_repository = true;
    let issues = vec![issue("SEC-1", &[], json!({}))];

    runner(config.clone(), issues.clone(), &target, &clock, false)
        .run()
        .await
        .unwrap();
    assert!(target.state().repository_created);

    target.state().repository_created = false;
    runner(config.clone(), issues.clone(), &target, &clock, false)
        .run()
        .await
        .unwrap();
    assert!(!target.state().repository_created);

    config.target.recreate_repository = true;
    let result = runner(config, issues, &target, &clock, false).run().await;
    assert!(matches!(result, Err(RunnerError::RecreateRefused { entries: 1 })));
    assert!(!target.state().repository_deleted);
}

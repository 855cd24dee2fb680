use crate::{
    Harness,
    fixtures::{at, legacy_resume, legacy_user, legacy_users},
    memory::{MemorySource, MemoryTarget},
    settings,
};
use engine_core::shutdown::ShutdownHandle;
use engine_processing::error::ProducerError;
use engine_runtime::{
    error::MigrationError,
    execution::{
        runner::Selection,
        settings::{ExecutorSettings, WriteErrorPolicy},
        summary::RunStatus,
    },
};
use model::{pagination::cursor::Cursor, records::key::NaturalKey};
use std::collections::BTreeSet;
use tracing_test::traced_test;

fn halting(batch_size: usize, chunk_size: usize) -> ExecutorSettings {
    ExecutorSettings {
        on_write_error: WriteErrorPolicy::Halt,
        ..settings(batch_size, chunk_size)
    }
}

#[traced_test]
#[tokio::test]
async fn three_users_in_batches_of_two_complete_and_clear_checkpoint() {
    let mut h = Harness::new(Vec::new(), Vec::new());
    let shutdown = ShutdownHandle::new();
    h.users_source = MemorySource::new(legacy_users(3)).shutdown_after(1, shutdown.clone());

    let outcomes = h
        .run(Selection::Users, settings(2, 100), shutdown)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), RunStatus::Paused);
    assert_eq!(outcomes[0].summary().created, 2);

    let checkpoint = h.checkpoint("users").await.unwrap();
    assert_eq!(checkpoint.cursor, Some(Cursor::new(at(10), "u2")));
    assert_eq!(checkpoint.created_count, 2);
    assert_eq!(checkpoint.total_processed, 2);

    let outcome = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    let summary = outcome.summary();
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.totals.created_count, 3);
    assert_eq!(summary.totals.total_processed, 3);
    assert_eq!(summary.totals.cursor, Some(Cursor::new(at(0), "u3")));

    assert!(h.checkpoint("users").await.is_none());
    assert_eq!(h.users_target.len(), 3);
    assert_eq!(h.identities("users").await.len(), 3);
    assert_eq!(
        h.users_source.cursors_seen(),
        vec![
            None,
            Some(Cursor::new(at(10), "u2")),
            Some(Cursor::new(at(0), "u3")),
        ]
    );
    assert!(logs_contain("Shutdown honored"));
}

#[traced_test]
#[tokio::test]
async fn cursor_strictly_decreases_across_batches() {
    let h = Harness::new(legacy_users(7), Vec::new());

    let outcome = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert_eq!(outcome.summary().batches, 4);

    let cursors: Vec<Cursor> = h.users_source.cursors_seen().into_iter().flatten().collect();
    assert_eq!(cursors.len(), 4);
    for pair in cursors.windows(2) {
        assert!(pair[0].precedes(&pair[1]), "{} then {}", pair[0], pair[1]);
    }
}

#[traced_test]
#[tokio::test]
async fn equal_timestamps_are_paged_by_id() {
    let users = vec![
        legacy_user("a", 0, "a@example.com"),
        legacy_user("c", 0, "c@example.com"),
        legacy_user("b", 0, "b@example.com"),
    ];
    let h = Harness::new(users, Vec::new());

    h.run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();

    assert_eq!(h.users_target.len(), 3);
    assert_eq!(
        h.users_source.cursors_seen(),
        vec![
            None,
            Some(Cursor::new(at(0), "b")),
            Some(Cursor::new(at(0), "a")),
        ]
    );
}

#[traced_test]
#[tokio::test]
async fn second_run_creates_nothing() {
    let h = Harness::new(legacy_users(3), Vec::new());

    let first = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert_eq!(first.summary().created, 3);

    let second = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert!(second.is_completed());
    assert_eq!(second.summary().created, 0);
    assert_eq!(second.summary().skipped, 3);
    assert_eq!(h.users_target.len(), 3);
}

#[traced_test]
#[tokio::test]
async fn lost_checkpoint_replays_without_duplicates() {
    let mut h = Harness::new(Vec::new(), Vec::new());
    let shutdown = ShutdownHandle::new();
    h.users_source = MemorySource::new(legacy_users(3)).shutdown_after(1, shutdown.clone());
    h.run(Selection::Users, settings(2, 100), shutdown)
        .await
        .unwrap();

    // Simulates a kill after the identity map was saved but before the
    // checkpoint was.
    std::fs::remove_file(h.layout().checkpoint_path("users")).unwrap();

    let outcome = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().created, 1);
    assert_eq!(outcome.summary().skipped, 2);
    assert_eq!(h.users_target.len(), 3);
}

#[traced_test]
#[tokio::test]
async fn lost_identity_map_is_rebuilt_from_natural_keys() {
    let h = Harness::new(legacy_users(3), Vec::new());
    h.run_family(Selection::Users, settings(10, 100))
        .await
        .unwrap();

    std::fs::remove_file(h.layout().identity_path("users")).unwrap();

    let outcome = h
        .run_family(Selection::Users, settings(10, 100))
        .await
        .unwrap();
    assert_eq!(outcome.summary().created, 0);
    assert_eq!(outcome.summary().skipped, 3);

    let identities = h.identities("users").await;
    assert_eq!(identities.len(), 3);
    for row in h.users_target.rows() {
        let legacy_id = row.email.trim_end_matches("@example.com");
        assert_eq!(identities.get(legacy_id), Some(row.id.as_str()));
    }
}

#[traced_test]
#[tokio::test]
async fn duplicate_email_within_a_batch_is_written_once() {
    let users = vec![
        legacy_user("a", 10, "dup@example.com"),
        legacy_user("b", 0, "DUP@example.com"),
    ];
    let h = Harness::new(users, Vec::new());

    let outcome = h
        .run_family(Selection::Users, settings(10, 100))
        .await
        .unwrap();
    assert_eq!(outcome.summary().created, 1);
    assert_eq!(outcome.summary().skipped, 1);
    assert_eq!(h.users_target.rows()[0].username, "a");
}

#[traced_test]
#[tokio::test]
async fn existing_account_is_adopted_and_keeps_its_resumes() {
    let users = vec![legacy_user("u1", 0, "Ada@Example.com")];
    let resumes = vec![legacy_resume("r1", 0, "cv", "u1")];
    let h = Harness::new(users, resumes);
    h.users_target
        .seed("existing-1", vec![NaturalKey::Email("ada@example.com".into())]);

    let outcomes = h
        .run(Selection::All, settings(10, 100), ShutdownHandle::new())
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].summary().created, 0);
    assert_eq!(outcomes[0].summary().skipped, 1);
    assert!(h.users_target.is_empty());

    assert_eq!(h.identities("users").await.get("u1"), Some("existing-1"));
    let resumes = h.resumes_target.rows();
    assert_eq!(resumes.len(), 1);
    assert_eq!(resumes[0].user_id, "existing-1");
    assert!(logs_contain("Adopted existing target record"));
}

#[traced_test]
#[tokio::test]
async fn shared_username_across_batches_is_not_adopted() {
    let mut first = legacy_user("ua", 10, "alice@example.com");
    first.username = "bob".into();
    let mut second = legacy_user("ub", 0, "bobby@example.com");
    second.username = "Bob".into();
    let resumes = vec![legacy_resume("r1", 0, "bobs-cv", "ub")];
    let h = Harness::new(vec![first, second], resumes);

    let outcomes = h
        .run(Selection::All, settings(1, 100), ShutdownHandle::new())
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].summary().created, 1);
    assert_eq!(outcomes[0].summary().skipped, 1);
    assert_eq!(h.users_target.len(), 1);

    let users = h.identities("users").await;
    assert!(users.contains("ua"));
    assert!(!users.contains("ub"));
    assert!(!logs_contain("Adopted existing target record"));

    assert_eq!(outcomes[1].summary().created, 0);
    assert_eq!(outcomes[1].summary().skipped, 1);
    assert!(h.resumes_target.is_empty());
}

#[traced_test]
#[tokio::test]
async fn existing_account_is_adopted_by_one_legacy_user_only() {
    let users = vec![
        legacy_user("u1", 10, "Ada@Example.com"),
        legacy_user("u2", 0, "ada@example.com"),
    ];
    let h = Harness::new(users, Vec::new());
    h.users_target
        .seed("existing-1", vec![NaturalKey::Email("ada@example.com".into())]);

    let outcome = h
        .run_family(Selection::Users, settings(1, 100))
        .await
        .unwrap();
    assert_eq!(outcome.summary().created, 0);
    assert_eq!(outcome.summary().skipped, 2);

    let users = h.identities("users").await;
    assert_eq!(users.get("u1"), Some("existing-1"));
    assert!(!users.contains("u2"));
    assert!(logs_contain("already claimed by another legacy id"));
}

#[traced_test]
#[tokio::test]
async fn resumes_follow_their_owners_new_ids() {
    let resumes = vec![
        legacy_resume("r1", 20, "cv", "u1"),
        legacy_resume("r2", 10, "cv", "u2"),
        legacy_resume("r3", 0, "orphan", "u3"),
    ];
    let h = Harness::new(legacy_users(2), resumes);

    let outcomes = h
        .run(Selection::All, settings(2, 100), ShutdownHandle::new())
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_completed()));

    let summary = outcomes[1].summary();
    assert_eq!(summary.family, "resumes");
    assert_eq!(summary.created, 2);
    assert_eq!(summary.skipped, 1);

    let users = h.identities("users").await;
    let resumes = h.identities("resumes").await;
    assert!(resumes.contains("r1"));
    assert!(resumes.contains("r2"));
    assert!(!resumes.contains("r3"));

    for row in h.resumes_target.rows() {
        let owner = if row.name == "Resume r1" { "u1" } else { "u2" };
        assert_eq!(Some(row.user_id.as_str()), users.get(owner));
        assert_eq!(row.statistics.resume_id, row.id);
    }
    assert_eq!(h.resumes_target.dependents(), 2);
}

#[traced_test]
#[tokio::test]
async fn slug_taken_by_the_same_owner_is_skipped() {
    let resumes = vec![
        legacy_resume("r1", 10, "cv", "u1"),
        legacy_resume("r2", 0, "portfolio", "u1"),
    ];
    let h = Harness::new(vec![legacy_user("u1", 0, "u1@example.com")], resumes);
    h.run_family(Selection::Users, settings(10, 100))
        .await
        .unwrap();

    let owner = h.identities("users").await.get("u1").unwrap().to_string();
    h.resumes_target.seed(
        "resume-existing",
        vec![NaturalKey::Slug {
            slug: "cv".into(),
            user_id: owner,
        }],
    );

    let outcome = h
        .run_family(Selection::Resumes, settings(10, 100))
        .await
        .unwrap();
    assert_eq!(outcome.summary().created, 1);
    assert_eq!(outcome.summary().skipped, 1);

    let resumes = h.identities("resumes").await;
    assert!(!resumes.contains("r1"));
    assert!(resumes.contains("r2"));
}

#[traced_test]
#[tokio::test]
async fn resumes_without_migrated_users_are_all_skipped() {
    let resumes = vec![legacy_resume("r1", 0, "cv", "u1")];
    let h = Harness::new(legacy_users(1), resumes);

    let outcome = h
        .run_family(Selection::Resumes, settings(10, 100))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().skipped, 1);
    assert!(h.resumes_target.is_empty());
    assert!(logs_contain("User identity map is empty"));
}

#[traced_test]
#[tokio::test]
async fn chunk_size_does_not_change_the_result() {
    let one = Harness::new(legacy_users(5), Vec::new());
    let many = Harness::new(legacy_users(5), Vec::new());

    one.run_family(Selection::Users, settings(5, 1))
        .await
        .unwrap();
    many.run_family(Selection::Users, settings(5, 5))
        .await
        .unwrap();

    assert_eq!(one.users_target.chunk_sizes(), vec![1, 1, 1, 1, 1]);
    assert_eq!(many.users_target.chunk_sizes(), vec![5]);

    let emails = |h: &Harness| {
        h.users_target
            .rows()
            .into_iter()
            .map(|u| u.email)
            .collect::<BTreeSet<_>>()
    };
    assert_eq!(emails(&one), emails(&many));

    for ids in [one.identities("users").await, many.identities("users").await] {
        assert_eq!(ids.len(), 5);
        for n in 1..=5 {
            assert!(ids.contains(&format!("u{n}")));
        }
    }
}

#[traced_test]
#[tokio::test]
async fn failed_chunk_is_counted_and_the_cursor_moves_on() {
    let mut h = Harness::new(legacy_users(4), Vec::new());
    h.users_target = MemoryTarget::new().fail_insert(2);

    let outcome = h
        .run_family(Selection::Users, settings(4, 2))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    let summary = outcome.summary();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.totals.error_count, 2);
    assert_eq!(
        summary.totals.created_count + summary.totals.skipped_count + summary.totals.error_count,
        summary.totals.total_processed
    );

    let identities = h.identities("users").await;
    assert!(identities.contains("u1") && identities.contains("u2"));
    assert!(!identities.contains("u3") && !identities.contains("u4"));
    assert!(logs_contain("Batch write failed"));

    // A fresh pass picks up the rows that failed.
    let retry = h
        .run_family(Selection::Users, settings(4, 2))
        .await
        .unwrap();
    assert_eq!(retry.summary().created, 2);
    assert_eq!(retry.summary().skipped, 2);
    assert_eq!(h.users_target.len(), 4);
}

#[traced_test]
#[tokio::test]
async fn halt_policy_keeps_the_checkpoint_at_the_last_good_batch() {
    let mut h = Harness::new(legacy_users(4), Vec::new());
    h.users_target = MemoryTarget::new().fail_insert(4);

    let err = h
        .run_family(Selection::Users, halting(2, 1))
        .await
        .unwrap_err();
    match err {
        MigrationError::WriteHalted {
            family,
            batch,
            source,
        } => {
            assert_eq!(family, "users");
            assert_eq!(batch, 2);
            assert_eq!(source.chunk, 1);
            assert_eq!(source.committed, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    let checkpoint = h.checkpoint("users").await.unwrap();
    assert_eq!(checkpoint.cursor, Some(Cursor::new(at(20), "u2")));
    assert_eq!(checkpoint.created_count, 2);

    // The committed prefix of the failed batch is already mapped.
    assert!(h.identities("users").await.contains("u3"));

    let outcome = h
        .run_family(Selection::Users, halting(2, 1))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().created, 1);
    assert_eq!(outcome.summary().skipped, 1);
    assert_eq!(h.users_target.len(), 4);
}

#[traced_test]
#[tokio::test]
async fn existence_check_failure_counts_the_whole_batch() {
    let mut h = Harness::new(legacy_users(3), Vec::new());
    h.users_target = MemoryTarget::new().fail_existence();

    let outcome = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap();
    assert!(outcome.is_completed());
    assert_eq!(outcome.summary().errors, 3);
    assert_eq!(outcome.summary().created, 0);
    assert!(h.users_target.is_empty());
    assert_eq!(h.users_target.existence_calls(), 2);
}

#[traced_test]
#[tokio::test]
async fn existence_check_failure_keeps_earlier_skips() {
    let resumes = vec![
        legacy_resume("r1", 20, "cv-1", "u1"),
        legacy_resume("r2", 10, "cv-2", "u2"),
        legacy_resume("r3", 0, "orphan", "u3"),
    ];
    let mut h = Harness::new(legacy_users(2), resumes);
    h.resumes_target = MemoryTarget::new().fail_existence();

    let outcomes = h
        .run(Selection::All, settings(10, 100), ShutdownHandle::new())
        .await
        .unwrap();
    let summary = outcomes[1].summary();
    assert_eq!(summary.family, "resumes");
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.created, 0);
    assert_eq!(
        summary.totals.created_count + summary.totals.skipped_count + summary.totals.error_count,
        summary.totals.total_processed
    );
    assert!(h.resumes_target.is_empty());
}

#[traced_test]
#[tokio::test]
async fn existence_check_failure_halts_under_halt_policy() {
    let mut h = Harness::new(legacy_users(3), Vec::new());
    h.users_target = MemoryTarget::new().fail_existence();

    let err = h
        .run_family(Selection::Users, halting(2, 100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MigrationError::ExistenceCheck { batch: 1, .. }
    ));
    assert!(h.checkpoint("users").await.is_none());
}

#[traced_test]
#[tokio::test]
async fn read_failure_is_fatal_and_leaves_the_checkpoint() {
    let mut h = Harness::new(Vec::new(), Vec::new());
    h.users_source = MemorySource::new(legacy_users(3)).fail_on_fetch(2);

    let err = h
        .run_family(Selection::Users, settings(2, 100))
        .await
        .unwrap_err();
    match err {
        MigrationError::Producer(ProducerError::Fetch { cursor, .. }) => {
            assert_eq!(cursor, Some(Cursor::new(at(10), "u2")));
        }
        other => panic!("unexpected error: {other}"),
    }

    let checkpoint = h.checkpoint("users").await.unwrap();
    assert_eq!(checkpoint.cursor, Some(Cursor::new(at(10), "u2")));
    assert_eq!(h.users_target.len(), 2);
}

#[traced_test]
#[tokio::test]
async fn unreadable_document_is_migrated_with_defaults() {
    let mut broken = legacy_resume("r1", 0, "cv", "u1");
    broken.data = None;
    let h = Harness::new(legacy_users(1), vec![broken]);

    let outcomes = h
        .run(Selection::All, settings(10, 100), ShutdownHandle::new())
        .await
        .unwrap();
    let summary = outcomes[1].summary();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.degraded, 1);
    assert!(logs_contain("Record degraded to defaults"));
}

#[traced_test]
#[tokio::test]
async fn dependent_failures_do_not_fail_the_batch() {
    let mut h = Harness::new(legacy_users(3), Vec::new());
    h.users_target = MemoryTarget::new().fail_dependents();

    let outcome = h
        .run_family(Selection::Users, settings(10, 2))
        .await
        .unwrap();
    assert_eq!(outcome.summary().created, 3);
    assert_eq!(outcome.summary().errors, 0);
    assert_eq!(outcome.summary().dependent_failures, 3);
    assert_eq!(h.identities("users").await.len(), 3);
    assert!(logs_contain("Dependent rows not written"));
}

#[traced_test]
#[tokio::test]
async fn all_stops_after_users_when_paused() {
    let h = Harness::new(legacy_users(2), vec![legacy_resume("r1", 0, "cv", "u1")]);
    let shutdown = ShutdownHandle::new();
    shutdown.request();

    let outcomes = h
        .run(Selection::All, settings(10, 100), shutdown)
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status(), RunStatus::Paused);
    assert_eq!(outcomes[0].summary().batches, 0);
    assert_eq!(h.users_source.fetches(), 0);
    assert_eq!(h.resumes_source.fetches(), 0);
    assert!(h.users_target.is_empty());
}

#[traced_test]
#[tokio::test]
async fn progress_reports_stored_state() {
    let mut h = Harness::new(Vec::new(), Vec::new());
    let shutdown = ShutdownHandle::new();
    h.users_source = MemorySource::new(legacy_users(3)).shutdown_after(1, shutdown.clone());
    h.run(Selection::Users, settings(2, 100), shutdown)
        .await
        .unwrap();

    let runner = engine_runtime::execution::runner::MigrationRunner::new(
        h.layout(),
        ExecutorSettings::default(),
        ShutdownHandle::new(),
    );
    let reports = runner.progress(Selection::All).await.unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].family, "users");
    assert_eq!(reports[0].mapped, 2);
    assert_eq!(
        reports[0].checkpoint.as_ref().map(|c| c.total_processed),
        Some(2)
    );
    assert_eq!(reports[1].family, "resumes");
    assert!(reports[1].checkpoint.is_none());
    assert_eq!(reports[1].mapped, 0);
}

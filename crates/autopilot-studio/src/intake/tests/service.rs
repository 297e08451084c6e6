use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::common::*;

use crate::intake::domain::{IntakeFormPatch, IntakeId, IntakePriority, IntakeStatus};
use crate::intake::notify::{NotificationKind, RecordingNotifier};
use crate::intake::query::{IntakeOrder, IntakeQuery};
use crate::intake::repository::{MemoryIntakeStore, RepositoryError};
use crate::intake::scoring::SubmissionOutcome;
use crate::intake::service::{IntakeService, IntakeServiceError};

#[tokio::test]
async fn submission_is_scored_and_moved_to_review() {
    let (service, store, notifier) = build_service(StubScoringClient::scoring(72));

    let receipt = service.submit(submission()).await.expect("submission stored");

    assert_eq!(receipt.form.status, IntakeStatus::UnderReview);
    assert_eq!(receipt.form.qualification_score, Some(72));
    assert_eq!(receipt.form.confidence_score, Some(75));
    assert_eq!(receipt.form.priority, IntakePriority::Medium);
    assert_eq!(receipt.form.ai_recommendation.as_deref(), Some("Proceed"));
    assert_eq!(receipt.outcome, Some(SubmissionOutcome::Qualified));
    assert!(receipt.scoring_error.is_none());

    let score = receipt.score.expect("score stored");
    assert_eq!(score.intake_form_id, receipt.form.id);
    assert_eq!(store.form_count(), 1);
    assert_eq!(store.score_count(), 1);

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, NotificationKind::Success);
    assert!(events[0].description.contains("72/100"));
}

#[tokio::test]
async fn submitted_fields_read_back_unchanged() {
    let (service, _, _) = build_service(StubScoringClient::scoring(72));
    let raw = submission();

    let id = service.submit(raw.clone()).await.expect("stored").form.id;
    let form = service.get(&id).await.expect("readable");

    assert_eq!(form.contact_name, raw.contact_name);
    assert_eq!(form.contact_email, "ada@example.com");
    assert_eq!(form.contact_phone, raw.contact_phone);
    assert_eq!(form.company_name, raw.company_name);
    assert_eq!(form.project_name, raw.project_name);
    assert_eq!(form.project_type.as_str(), raw.project_type);
    assert_eq!(form.project_description, raw.project_description);
    assert_eq!(form.key_requirements, raw.key_requirements);
    assert_eq!(form.tech_stack_preferences, raw.tech_stack_preferences);
    assert_eq!(form.timeline.as_str(), raw.timeline);
    assert_eq!(form.budget_range.as_str(), raw.budget_range);
    assert_eq!(form.timezone, "UTC");
    assert_eq!(form.user_id, None);
}

#[tokio::test]
async fn low_scores_need_review_with_low_priority() {
    let (service, _, notifier) = build_service(StubScoringClient::scoring(45));

    let receipt = service.submit(submission()).await.expect("submission stored");

    assert_eq!(receipt.outcome, Some(SubmissionOutcome::NeedsReview));
    assert_eq!(receipt.form.priority, IntakePriority::Low);
    assert_eq!(notifier.events()[0].kind, NotificationKind::Info);
}

#[tokio::test]
async fn high_scores_raise_priority() {
    let (service, _, _) = build_service(StubScoringClient::scoring(91));

    let receipt = service.submit(submission()).await.expect("submission stored");

    assert_eq!(receipt.form.priority, IntakePriority::High);
}

#[tokio::test]
async fn scoring_failure_keeps_the_form_submitted() {
    let (service, store, notifier) = build_service(StubScoringClient::failing("webhook down"));

    let receipt = service.submit(submission()).await.expect("form still stored");

    assert_eq!(receipt.form.status, IntakeStatus::Submitted);
    assert_eq!(receipt.form.qualification_score, None);
    assert!(receipt.score.is_none());
    assert!(receipt
        .scoring_error
        .as_deref()
        .is_some_and(|message| message.contains("webhook down")));
    assert_eq!(store.form_count(), 1);
    assert_eq!(store.score_count(), 0);
    assert_eq!(notifier.events()[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn scoring_failure_still_returns_the_stored_form_when_reads_fail() {
    let inner = MemoryIntakeStore::default();
    let notifier = RecordingNotifier::default();
    let service = IntakeService::new(
        Arc::new(UnreadableStore {
            inner: inner.clone(),
        }),
        Arc::new(StubScoringClient::failing("webhook down")),
        Arc::new(notifier.clone()),
        cache(),
    );

    let receipt = service.submit(submission()).await.expect("form still stored");

    assert_eq!(receipt.form.status, IntakeStatus::Submitted);
    assert_eq!(receipt.form.project_name, "Client Portal");
    assert!(receipt.scoring_error.is_some());
    assert_eq!(inner.form_count(), 1);
    assert_eq!(notifier.events()[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn out_of_range_scores_are_not_stored() {
    let (service, store, _) = build_service(StubScoringClient::scoring(130));

    let receipt = service.submit(submission()).await.expect("form still stored");

    assert_eq!(receipt.form.status, IntakeStatus::Submitted);
    assert!(receipt
        .scoring_error
        .as_deref()
        .is_some_and(|message| message.contains("overall_score")));
    assert_eq!(store.score_count(), 0);
}

#[tokio::test]
async fn invalid_submissions_are_never_stored() {
    let (service, store, notifier) = build_service(StubScoringClient::scoring(80));
    let mut raw = submission();
    raw.project_description = "short".to_string();

    let err = service.submit(raw).await.expect_err("rejected");

    assert!(matches!(err, IntakeServiceError::Validation(_)));
    assert_eq!(store.form_count(), 0);
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn disallowed_transition_leaves_status_unchanged() {
    let (service, _, _) = build_service(StubScoringClient::scoring(80));
    let id = service.submit(submission()).await.expect("stored").form.id;

    service
        .transition(&id, IntakeStatus::Qualified)
        .await
        .expect("under_review -> qualified");
    service
        .transition(&id, IntakeStatus::Scheduled)
        .await
        .expect("qualified -> scheduled");
    service
        .transition(&id, IntakeStatus::Completed)
        .await
        .expect("scheduled -> completed");

    let err = service
        .transition(&id, IntakeStatus::Qualified)
        .await
        .expect_err("completed -> qualified rejected");
    match err {
        IntakeServiceError::Transition(err) => {
            assert_eq!(err.from, IntakeStatus::Completed);
            assert_eq!(err.to, IntakeStatus::Qualified);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let form = service.get(&id).await.expect("form readable");
    assert_eq!(form.status, IntakeStatus::Completed);
}

#[tokio::test]
async fn archive_is_reachable_from_active_states() {
    let (service, _, _) = build_service(StubScoringClient::scoring(80));

    let under_review = service.submit(submission()).await.expect("stored").form.id;
    let archived = service
        .transition(&under_review, IntakeStatus::Archived)
        .await
        .expect("under_review -> archived");
    assert_eq!(archived.status, IntakeStatus::Archived);

    let qualified = service.submit(submission()).await.expect("stored").form.id;
    for target in [IntakeStatus::Qualified, IntakeStatus::Archived] {
        service
            .transition(&qualified, target)
            .await
            .expect("allowed transition");
    }

    let scheduled = service.submit(submission()).await.expect("stored").form.id;
    for target in [IntakeStatus::Qualified, IntakeStatus::Scheduled, IntakeStatus::Archived] {
        service
            .transition(&scheduled, target)
            .await
            .expect("allowed transition");
    }

    let err = service
        .transition(&scheduled, IntakeStatus::Archived)
        .await
        .expect_err("archived is terminal");
    assert!(matches!(err, IntakeServiceError::Transition(_)));
}

#[tokio::test]
async fn updates_are_visible_through_cached_reads() {
    let (service, _, notifier) = build_service(StubScoringClient::scoring(80));
    let id = service.submit(submission()).await.expect("stored").form.id;

    let before = service.list(&IntakeQuery::default()).await.expect("list");
    assert_eq!(before[0].project_name, "Client Portal");
    service.get(&id).await.expect("warm single read");

    let patch = IntakeFormPatch {
        project_name: Some("Client Portal v2".to_string()),
        priority: Some(IntakePriority::Urgent),
        ..IntakeFormPatch::default()
    };
    let updated = service.update(&id, patch).await.expect("update applied");
    assert_eq!(updated.project_name, "Client Portal v2");
    assert_eq!(updated.priority, IntakePriority::Urgent);
    assert!(updated.updated_at >= updated.created_at);

    let listed = service.list(&IntakeQuery::default()).await.expect("list");
    assert_eq!(listed[0].project_name, "Client Portal v2");
    let single = service.get(&id).await.expect("get");
    assert_eq!(single.project_name, "Client Portal v2");
    assert_eq!(
        notifier.events().last().map(|event| event.title.as_str()),
        Some("Intake updated")
    );
}

#[tokio::test]
async fn invalid_updates_are_rejected_without_mutation() {
    let (service, _, _) = build_service(StubScoringClient::scoring(80));
    let id = service.submit(submission()).await.expect("stored").form.id;

    let err = service
        .update(
            &id,
            IntakeFormPatch {
                contact_email: Some("broken".to_string()),
                ..IntakeFormPatch::default()
            },
        )
        .await
        .expect_err("invalid email");

    assert!(matches!(err, IntakeServiceError::Validation(_)));
    let form = service.get(&id).await.expect("get");
    assert_eq!(form.contact_email, "ada@example.com");
}

#[tokio::test]
async fn rescoring_replaces_the_score_in_place() {
    let scorer = StubScoringClient::sequence(vec![Ok(assessment(62)), Ok(assessment(88))]);
    let calls = Arc::clone(&scorer.calls);
    let (service, store, _) = build_service(scorer);
    let receipt = service.submit(submission()).await.expect("stored");
    let first = receipt.score.expect("first score");
    let id = receipt.form.id;

    let cached = service.score(&id).await.expect("score readable");
    assert_eq!(cached.assessment.overall_score, 62);

    let (form, second) = service.rescore(&id).await.expect("rescored");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.assessment.overall_score, 88);
    assert_eq!(form.qualification_score, Some(88));
    assert_eq!(form.priority, IntakePriority::High);
    assert_eq!(store.score_count(), 1);
    assert_eq!(
        service.score(&id).await.expect("fresh score").assessment.overall_score,
        88
    );
}

#[tokio::test]
async fn rescoring_keeps_a_status_set_while_scoring_ran() {
    let (service, store, _) = build_service(StubScoringClient::scoring(72));
    let id = service.submit(submission()).await.expect("stored").form.id;

    let racing = IntakeService::new(
        Arc::new(store.clone()),
        Arc::new(ReviewerRacingScorer {
            store: store.clone(),
            overall: 91,
        }),
        Arc::new(RecordingNotifier::default()),
        cache(),
    );
    let (form, score) = racing.rescore(&id).await.expect("rescored");

    assert_eq!(score.assessment.overall_score, 91);
    assert_eq!(form.status, IntakeStatus::Qualified);
    assert_eq!(form.qualification_score, Some(91));
    assert_eq!(form.priority, IntakePriority::High);
    let stored = racing.get(&id).await.expect("readable");
    assert_eq!(stored.status, IntakeStatus::Qualified);
}

#[tokio::test]
async fn review_cannot_be_entered_by_hand() {
    let (service, store, _) = build_service(StubScoringClient::failing("webhook down"));
    let id = service.submit(submission()).await.expect("stored").form.id;

    let err = service
        .transition(&id, IntakeStatus::UnderReview)
        .await
        .expect_err("review follows scoring");
    assert!(matches!(err, IntakeServiceError::Transition(_)));
    assert_eq!(
        service.get(&id).await.expect("readable").status,
        IntakeStatus::Submitted
    );

    let scored = IntakeService::new(
        Arc::new(store.clone()),
        Arc::new(StubScoringClient::scoring(72)),
        Arc::new(RecordingNotifier::default()),
        cache(),
    );
    let (form, _) = scored.rescore(&id).await.expect("rescored");
    assert_eq!(form.status, IntakeStatus::UnderReview);
}

#[tokio::test]
async fn rescoring_keeps_manual_urgent_priority() {
    let (service, _, _) = build_service(StubScoringClient::scoring(40));
    let id = service.submit(submission()).await.expect("stored").form.id;
    service
        .update(
            &id,
            IntakeFormPatch {
                priority: Some(IntakePriority::Urgent),
                ..IntakeFormPatch::default()
            },
        )
        .await
        .expect("escalated");

    let (form, _) = service.rescore(&id).await.expect("rescored");

    assert_eq!(form.priority, IntakePriority::Urgent);
}

#[tokio::test]
async fn delete_cascades_to_the_score() {
    let (service, store, _) = build_service(StubScoringClient::scoring(80));
    let id = service.submit(submission()).await.expect("stored").form.id;
    service.score(&id).await.expect("warm score cache");

    service.delete(&id).await.expect("deleted");

    assert_eq!(store.form_count(), 0);
    assert_eq!(store.score_count(), 0);
    assert!(matches!(
        service.get(&id).await,
        Err(IntakeServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.score(&id).await,
        Err(IntakeServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete(&id).await,
        Err(IntakeServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn list_filters_and_orders_by_score() {
    let scorer = StubScoringClient::sequence(vec![
        Ok(assessment(50)),
        Ok(assessment(90)),
        Ok(assessment(70)),
    ]);
    let (service, _, _) = build_service(scorer);
    for _ in 0..3 {
        service.submit(submission()).await.expect("stored");
    }

    let ranked = service
        .list(&IntakeQuery {
            order_by: IntakeOrder::QualificationScore,
            ..IntakeQuery::default()
        })
        .await
        .expect("list");
    let scores: Vec<_> = ranked.iter().map(|form| form.qualification_score).collect();
    assert_eq!(scores, vec![Some(90), Some(70), Some(50)]);

    let qualified = service
        .list(&IntakeQuery {
            min_score: Some(70),
            ..IntakeQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(qualified.len(), 2);

    let high = service
        .list(&IntakeQuery {
            priority: Some(IntakePriority::High),
            ..IntakeQuery::default()
        })
        .await
        .expect("list");
    assert_eq!(high.len(), 1);
}

#[tokio::test]
async fn unknown_ids_report_not_found() {
    let (service, _, _) = build_service(StubScoringClient::scoring(80));
    let missing = IntakeId("missing".to_string());

    assert!(matches!(
        service.get(&missing).await,
        Err(IntakeServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.transition(&missing, IntakeStatus::Archived).await,
        Err(IntakeServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.rescore(&missing).await,
        Err(IntakeServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn repeated_misses_keep_the_cache_bounded() {
    let (service, _, _) = build_service(StubScoringClient::scoring(80));

    for n in 0..500 {
        let missing = IntakeId(format!("missing-{n}"));
        assert!(matches!(
            service.get(&missing).await,
            Err(IntakeServiceError::NotFound(_))
        ));
    }

    assert!(service.cache().len() <= service.cache().config().max_entries);
}

#[tokio::test]
async fn store_outage_surfaces_as_repository_error() {
    let service = IntakeService::new(
        Arc::new(UnavailableStore),
        Arc::new(StubScoringClient::scoring(80)),
        Arc::new(RecordingNotifier::default()),
        cache(),
    );

    let err = service.submit(submission()).await.expect_err("store down");
    assert!(matches!(
        err,
        IntakeServiceError::Repository(RepositoryError::Unavailable(_))
    ));

    let err = service
        .list(&IntakeQuery::default())
        .await
        .expect_err("store down");
    assert!(matches!(err, IntakeServiceError::Repository(_)));
}

#[tokio::test]
async fn notification_failures_do_not_fail_mutations() {
    let store = MemoryIntakeStore::default();
    let service = IntakeService::new(
        Arc::new(store.clone()),
        Arc::new(StubScoringClient::scoring(80)),
        Arc::new(FailingNotifier),
        cache(),
    );

    let receipt = service.submit(submission()).await.expect("stored");

    assert_eq!(receipt.form.status, IntakeStatus::UnderReview);
    assert_eq!(store.form_count(), 1);
}

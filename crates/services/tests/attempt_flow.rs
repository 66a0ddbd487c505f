use std::sync::Arc;
use std::time::Duration;

use exam_core::model::{
    BankEntry, ContextBlock, ContextGroupDraft, QuestionBody, QuestionDraft, QuestionId,
    Selection, SubQuestionDraft,
};
use exam_core::time::fixed_clock;
use exam_core::{AttemptError, SubmitReason};
use services::{AttemptService, AttemptServiceError};
use storage::InMemoryQuestionBank;

fn single(id: u64, subject: &str) -> BankEntry {
    BankEntry::Question(QuestionDraft {
        id: QuestionId::new(id),
        subject: subject.into(),
        prompt: format!("Question {id}"),
        body: QuestionBody::SingleChoice {
            options: vec!["A".into(), "B".into(), "C".into()],
        },
    })
}

fn bank() -> Arc<InMemoryQuestionBank> {
    let reading = BankEntry::ContextGroup(ContextGroupDraft {
        subject: "Reading Literacy".into(),
        context: ContextBlock {
            text: "The Aral Sea has shrunk since the 1960s.".into(),
            image: None,
        },
        questions: vec![
            SubQuestionDraft {
                id: QuestionId::new(10),
                prompt: "Main idea?".into(),
                body: QuestionBody::SingleChoice {
                    options: vec!["A".into(), "B".into()],
                },
            },
            SubQuestionDraft {
                id: QuestionId::new(11),
                prompt: "Match causes and effects.".into(),
                body: QuestionBody::Matching {
                    left_items: vec!["Diverted rivers".into()],
                    right_options: vec!["Less inflow".into(), "Dust storms".into()],
                },
            },
        ],
    });
    Arc::new(
        InMemoryQuestionBank::from_entries(vec![
            single(1, "Math Literacy"),
            reading,
            single(2, "Physics"),
        ])
        .unwrap(),
    )
}

fn service(duration: u32) -> AttemptService {
    AttemptService::new(fixed_clock(), bank()).with_duration(duration)
}

#[tokio::test]
async fn subjects_come_in_bank_order() {
    assert_eq!(
        service(60).subjects().await.unwrap(),
        vec!["Math Literacy", "Reading Literacy", "Physics"]
    );
}

#[tokio::test]
async fn chosen_subjects_limit_the_attempt() {
    let subjects = vec!["Reading Literacy".to_string(), "Physics".to_string()];
    let attempt = service(60).prepare(&subjects).await.unwrap();

    let ids: Vec<u64> = attempt.items().iter().map(|i| i.id.value()).collect();
    assert_eq!(ids, vec![10, 11, 2]);
    let first = attempt.items()[0].context.as_ref().unwrap();
    let second = attempt.items()[1].context.as_ref().unwrap();
    assert!(first.shares_context_with(second));
}

#[tokio::test]
async fn empty_choice_and_unknown_subject_are_rejected() {
    let service = service(60);
    assert!(matches!(
        service.prepare(&[]).await.unwrap_err(),
        AttemptServiceError::NoSubjects
    ));
    assert!(matches!(
        service.prepare(&["History".to_string()]).await.unwrap_err(),
        AttemptServiceError::Attempt(AttemptError::EmptyBank)
    ));
}

#[tokio::test]
async fn shuffle_keeps_context_groups_together() {
    let attempt = AttemptService::new(fixed_clock(), bank())
        .with_shuffle(true)
        .prepare(&["Reading Literacy".to_string(), "Math Literacy".to_string()])
        .await
        .unwrap();

    let ids: Vec<u64> = attempt.items().iter().map(|i| i.id.value()).collect();
    assert_eq!(ids.len(), 3);
    let at = ids.iter().position(|id| *id == 10).unwrap();
    assert_eq!(ids[at + 1], 11);
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempt_is_submitted_with_answers() {
    let (live, mut results) = service(3).start_full_attempt().await.unwrap();
    live.select_answer(QuestionId::new(1), Selection::option("B"))
        .unwrap();
    live.toggle_mark(2).unwrap();

    let result = results.recv().await.unwrap();
    assert!(matches!(result.reason, SubmitReason::TimeExpired));
    assert_eq!(result.elapsed_seconds, 3);
    assert!(result.answers.has_answer(QuestionId::new(1)));
    assert!(result.marks.contains(2));
    assert!(!live.is_running());
}

#[tokio::test(start_paused = true)]
async fn manual_submit_before_expiry() {
    let subjects = vec!["Physics".to_string()];
    let (mut live, mut results) = service(60).start_attempt(&subjects).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10_500)).await;
    live.select_answer(QuestionId::new(2), Selection::option("A"))
        .unwrap();
    let result = live.submit().unwrap();
    assert!(matches!(result.reason, SubmitReason::Manual));
    assert_eq!(result.elapsed_seconds, 10);

    let delivered = results.recv().await.unwrap();
    assert_eq!(delivered.attempt_id, result.attempt_id);
    assert!(matches!(
        live.submit().unwrap_err(),
        AttemptServiceError::Attempt(AttemptError::AlreadySubmitted)
    ));
}

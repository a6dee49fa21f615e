use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{QuestionId, SessionId};
use services::{
    ClientConfig, ClientError, InMemoryBackend, ParticipantView, QuizClient, SubmitMode,
};
use storage::{InMemoryStore, ProgressStore};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};

fn demo_id() -> SessionId {
    SessionId::new("demo")
}

fn client(backend: &InMemoryBackend, kv: &InMemoryStore, config: ClientConfig) -> QuizClient {
    QuizClient::new(
        config,
        Arc::new(backend.clone()),
        ProgressStore::new(Arc::new(kv.clone())),
        Handle::current(),
    )
}

async fn wait_for(
    rx: &mut watch::Receiver<ParticipantView>,
    what: impl FnMut(&ParticipantView) -> bool,
) -> ParticipantView {
    let view = timeout(Duration::from_secs(120), rx.wait_for(what))
        .await
        .expect("view never reached the expected state")
        .expect("session task stopped");
    view.clone()
}

#[tokio::test(start_paused = true)]
async fn join_and_answer_through_the_handle() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let handle = client(&backend, &kv, ClientConfig::default()).open(demo_id());
    let mut rx = handle.subscribe();

    wait_for(&mut rx, |v| v.progress.total == 3).await;
    handle.join("Ada").unwrap();
    wait_for(&mut rx, |v| v.can_answer).await;

    for option in [1, 2, 1] {
        let index = handle.view().progress.current_index;
        handle.answer(option).unwrap();
        wait_for(&mut rx, |v| v.progress.current_index > index).await;
    }

    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert_eq!(view.score, 30);
    assert_eq!(view.answers.len(), 3);
    assert_eq!(view.participant_name.as_deref(), Some("Ada"));
    handle.shutdown();
}

#[tokio::test(start_paused = true)]
async fn reopening_restores_progress() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let quiz = client(&backend, &kv, ClientConfig::default());

    let handle = quiz.open(demo_id());
    let mut rx = handle.subscribe();
    wait_for(&mut rx, |v| v.progress.total == 3).await;
    handle.join("Ada").unwrap();
    wait_for(&mut rx, |v| v.can_answer).await;
    handle.answer(1).unwrap();
    wait_for(&mut rx, |v| v.progress.current_index == 1).await;
    handle.shutdown();

    let reopened = quiz.open(demo_id());
    let initial = reopened.view();
    assert_eq!(initial.participant_name.as_deref(), Some("Ada"));
    assert_eq!(initial.progress.current_index, 1);

    let mut rx = reopened.subscribe();
    let view = wait_for(&mut rx, |v| v.can_answer).await;
    assert_eq!(view.question.unwrap().id, QuestionId::new("q2"));
    assert_eq!(view.score, 10);
}

#[tokio::test(start_paused = true)]
async fn polling_recovers_after_a_failed_fetch() {
    let backend = InMemoryBackend::demo();
    backend.fail_next_fetches(1);
    let kv = InMemoryStore::new();
    let handle = client(&backend, &kv, ClientConfig::default()).open(demo_id());
    let mut rx = handle.subscribe();

    let failed = wait_for(&mut rx, |v| v.notice.is_some()).await;
    assert_eq!(
        failed.notice.unwrap().message,
        "Could not reach the quiz server"
    );

    let recovered = wait_for(&mut rx, |v| v.notice.is_none() && v.progress.total == 3).await;
    assert_eq!(recovered.questions.len(), 3);
    assert!(backend.fetch_calls() >= 2);
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_finishes_the_quiz() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let config = ClientConfig::default().with_time_limit_override(Some(Duration::from_secs(5)));
    let handle = client(&backend, &kv, config).open(demo_id());
    let mut rx = handle.subscribe();

    handle.join("Ada").unwrap();
    let answering = wait_for(&mut rx, |v| v.can_answer).await;
    assert!(answering.timer.unwrap().running);

    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert!(view.answers.is_empty());
    let timer = view.timer.unwrap();
    assert_eq!(timer.remaining_secs, 0);
    assert!(!timer.running);
    assert_eq!(backend.submit_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn bulk_sheet_is_submitted_when_time_runs_out() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let config = ClientConfig::default()
        .with_mode(SubmitMode::Bulk)
        .with_time_limit_override(Some(Duration::from_secs(10)));
    let handle = client(&backend, &kv, config).open(demo_id());
    let mut rx = handle.subscribe();

    handle.join("Ada").unwrap();
    wait_for(&mut rx, |v| v.can_select).await;
    handle.select(QuestionId::new("q1"), 1).unwrap();
    handle.select(QuestionId::new("q3"), 0).unwrap();
    wait_for(&mut rx, |v| v.selected.len() == 2).await;

    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert_eq!(view.score, 10);
    assert!(view.sheet_submitted);
    assert_eq!(backend.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn late_joiner_is_submitted_once_time_is_up() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let config = ClientConfig::default()
        .with_mode(SubmitMode::Bulk)
        .with_time_limit_override(Some(Duration::from_secs(2)));
    let handle = client(&backend, &kv, config).open(demo_id());
    let mut rx = handle.subscribe();

    wait_for(&mut rx, |v| v.timer.is_some_and(|t| t.remaining_secs == 0)).await;
    assert_eq!(backend.submit_calls(), 0);

    handle.join("Ada").unwrap();
    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert!(view.sheet_submitted);
    assert!(!view.can_select);
    assert_eq!(view.score, 0);
    assert_eq!(backend.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_sheet_after_time_is_up_is_retried_and_stays_locked() {
    let backend = InMemoryBackend::demo();
    backend.fail_next_submits(1);
    let kv = InMemoryStore::new();
    let config = ClientConfig::default()
        .with_mode(SubmitMode::Bulk)
        .with_time_limit_override(Some(Duration::from_secs(5)));
    let handle = client(&backend, &kv, config).open(demo_id());
    let mut rx = handle.subscribe();

    handle.join("Ada").unwrap();
    wait_for(&mut rx, |v| v.can_select).await;
    handle.select(QuestionId::new("q1"), 1).unwrap();
    wait_for(&mut rx, |v| v.selected.len() == 1).await;

    let failed = wait_for(&mut rx, |v| v.notice.is_some() && !v.sheet_submitted).await;
    assert!(!failed.can_select);
    assert_eq!(backend.submit_calls(), 1);

    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert_eq!(view.score, 10);
    assert_eq!(backend.submit_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn bulk_sheet_can_be_submitted_early() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let config = ClientConfig::default().with_mode(SubmitMode::Bulk);
    let handle = client(&backend, &kv, config).open(demo_id());
    let mut rx = handle.subscribe();

    handle.join("Ada").unwrap();
    wait_for(&mut rx, |v| v.can_select).await;
    handle.select(QuestionId::new("q2"), 2).unwrap();
    handle.submit_all().unwrap();

    let view = wait_for(&mut rx, ParticipantView::is_finished).await;
    assert_eq!(view.score, 10);
    assert!(!view.timer.unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling_and_closes_the_handle() {
    let backend = InMemoryBackend::demo();
    let kv = InMemoryStore::new();
    let handle = client(&backend, &kv, ClientConfig::default()).open(demo_id());
    let mut rx = handle.subscribe();
    wait_for(&mut rx, |v| v.progress.total == 3).await;

    handle.shutdown();
    while !handle.is_closed() {
        sleep(Duration::from_millis(10)).await;
    }
    sleep(Duration::from_millis(10)).await;

    let calls = backend.fetch_calls();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(backend.fetch_calls(), calls);
    assert!(matches!(handle.join("Ada"), Err(ClientError::Closed)));
    handle.shutdown();
}

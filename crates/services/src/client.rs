//! Participant client: one task per open session.
//!
//! `QuizClient::open` spawns a task that owns a `ParticipantSession` and its
//! `Scheduler`. Everything that touches the machine (user intents, poll
//! results, countdown ticks, backend replies) arrives as a message on that
//! task, so the machine is never shared. Each change is published as a
//! `ParticipantView` on a `watch` channel.

use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{AnswerOutcome, BulkOutcome, Participant, QuestionId, Session, SessionId};
use storage::ProgressStore;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::backend::QuizBackend;
use crate::config::ClientConfig;
use crate::error::{BackendError, ClientError};
use crate::participant::{
    AnswerRequest, BulkRequest, CountdownTick, ParticipantSession, ParticipantView,
};
use crate::scheduler::{COUNTDOWN_TICK, Scheduler};

//
// ─── MESSAGES ──────────────────────────────────────────────────────────────────
//

/// What a participant can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Join(String),
    /// Answer the current question (per-question mode).
    Answer(usize),
    /// Pick an option on the answer sheet (bulk mode).
    Select {
        question_id: QuestionId,
        option_index: usize,
    },
    SubmitAll,
    DismissNotice,
    Shutdown,
}

enum Event {
    Snapshot(Result<Session, BackendError>),
    Tick,
    Joined(Result<Participant, BackendError>),
    Answered(AnswerRequest, Result<AnswerOutcome, BackendError>),
    SheetSubmitted(BulkRequest, Result<BulkOutcome, BackendError>),
}

//
// ─── CLIENT ────────────────────────────────────────────────────────────────────
//

/// Opens participant sessions against one backend and one progress store.
pub struct QuizClient {
    config: ClientConfig,
    backend: Arc<dyn QuizBackend>,
    store: ProgressStore,
    runtime: Handle,
}

impl QuizClient {
    #[must_use]
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn QuizBackend>,
        store: ProgressStore,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            backend,
            store,
            runtime,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Restore local progress for `session_id` and start its task.
    ///
    /// Polling starts immediately. The task runs until `shutdown` is
    /// requested or every handle is dropped.
    #[must_use]
    pub fn open(&self, session_id: SessionId) -> ParticipantHandle {
        let machine = ParticipantSession::restore(session_id.clone(), self.store.clone())
            .with_mode(self.config.mode)
            .with_time_limit(self.config.time_limit_secs());

        let (view_tx, view_rx) = watch::channel(machine.view());
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let task = SessionTask {
            machine,
            backend: Arc::clone(&self.backend),
            scheduler: Scheduler::new(self.runtime.clone()),
            runtime: self.runtime.clone(),
            events: event_tx,
            view: view_tx,
        };
        info!(%session_id, mode = %self.config.mode, "opening participant session");
        self.runtime
            .spawn(task.run(self.config.poll_interval, intent_rx, event_rx));

        ParticipantHandle {
            session_id,
            intents: intent_tx,
            view: view_rx,
        }
    }
}

//
// ─── HANDLE ────────────────────────────────────────────────────────────────────
//

/// Cheap, clonable front of a running session task.
#[derive(Clone)]
pub struct ParticipantHandle {
    session_id: SessionId,
    intents: mpsc::UnboundedSender<Intent>,
    view: watch::Receiver<ParticipantView>,
}

impl ParticipantHandle {
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Queue an intent for the session task.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn send(&self, intent: Intent) -> Result<(), ClientError> {
        self.intents.send(intent).map_err(|_| ClientError::Closed)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn join(&self, name: impl Into<String>) -> Result<(), ClientError> {
        self.send(Intent::Join(name.into()))
    }

    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn answer(&self, option_index: usize) -> Result<(), ClientError> {
        self.send(Intent::Answer(option_index))
    }

    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn select(&self, question_id: QuestionId, option_index: usize) -> Result<(), ClientError> {
        self.send(Intent::Select {
            question_id,
            option_index,
        })
    }

    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn submit_all(&self) -> Result<(), ClientError> {
        self.send(Intent::SubmitAll)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Closed` once the task has stopped.
    pub fn dismiss_notice(&self) -> Result<(), ClientError> {
        self.send(Intent::DismissNotice)
    }

    /// Stop the task and its timers. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.intents.send(Intent::Shutdown).is_err() {
            debug!(session_id = %self.session_id, "session already closed");
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.intents.is_closed()
    }

    /// Latest published view.
    #[must_use]
    pub fn view(&self) -> ParticipantView {
        self.view.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ParticipantView> {
        self.view.clone()
    }
}

//
// ─── SESSION TASK ──────────────────────────────────────────────────────────────
//

struct SessionTask {
    machine: ParticipantSession,
    backend: Arc<dyn QuizBackend>,
    scheduler: Scheduler,
    runtime: Handle,
    events: mpsc::UnboundedSender<Event>,
    view: watch::Sender<ParticipantView>,
}

impl SessionTask {
    async fn run(
        mut self,
        poll_interval: Duration,
        mut intents: mpsc::UnboundedReceiver<Intent>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        let tx = self.events.clone();
        self.scheduler.start_polling(
            Arc::clone(&self.backend),
            self.machine.session_id().clone(),
            poll_interval,
            move |result| {
                let _ = tx.send(Event::Snapshot(result));
            },
        );

        loop {
            tokio::select! {
                intent = intents.recv() => match intent {
                    None | Some(Intent::Shutdown) => break,
                    Some(intent) => self.on_intent(intent),
                },
                Some(event) = events.recv() => self.on_event(event),
            }
            self.sync_timers();
            self.view.send_replace(self.machine.view());
        }

        self.scheduler.shutdown();
        info!(session_id = %self.machine.session_id(), "participant session closed");
    }

    fn on_intent(&mut self, intent: Intent) {
        match intent {
            Intent::Join(name) => match self.machine.begin_join(&name) {
                Ok(Some(request)) => {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.events.clone();
                    self.runtime.spawn(async move {
                        let result = backend
                            .join_session(&request.session_id, &request.name)
                            .await;
                        let _ = tx.send(Event::Joined(result));
                    });
                }
                Ok(None) => {}
                Err(err) => debug!(error = %err, "join refused"),
            },
            Intent::Answer(option_index) => match self.machine.begin_submit(option_index) {
                Ok(Some(request)) => {
                    let backend = Arc::clone(&self.backend);
                    let tx = self.events.clone();
                    self.runtime.spawn(async move {
                        let result = backend
                            .submit_answer(
                                &request.session_id,
                                &request.participant_id,
                                request.option_index,
                                request.question_index,
                            )
                            .await;
                        let _ = tx.send(Event::Answered(request, result));
                    });
                }
                Ok(None) => {}
                Err(err) => debug!(error = %err, "answer refused"),
            },
            Intent::Select {
                question_id,
                option_index,
            } => {
                self.machine.select_answer(&question_id, option_index);
            }
            Intent::SubmitAll => self.submit_sheet(),
            Intent::DismissNotice => self.machine.clear_notice(),
            Intent::Shutdown => {}
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Snapshot(Ok(session)) => {
                self.machine.refresh(session);
                self.submit_if_due();
            }
            Event::Snapshot(Err(err)) => self.machine.fetch_failed(&err),
            Event::Tick => {
                if self.machine.tick_countdown() == CountdownTick::Expired {
                    info!(session_id = %self.machine.session_id(), "time is up");
                }
                self.submit_if_due();
            }
            Event::Joined(result) => {
                if let Err(err) = self.machine.finish_join(result) {
                    debug!(error = %err, "join did not complete");
                }
                self.submit_if_due();
            }
            Event::Answered(request, result) => {
                match self.machine.finish_submit(&request, result) {
                    Ok(feedback) => debug!(
                        is_correct = feedback.is_correct,
                        score = feedback.score,
                        finished = feedback.finished,
                        "answer applied"
                    ),
                    Err(err) => debug!(error = %err, "answer did not complete"),
                }
            }
            Event::SheetSubmitted(request, result) => {
                if let Err(err) = self.machine.finish_submit_all(&request, result) {
                    debug!(error = %err, "answer sheet did not complete");
                }
            }
        }
    }

    // Once time is up the sheet goes out without waiting for the participant.
    // A failed attempt is retried on the next poll rather than straight away.
    fn submit_if_due(&mut self) {
        if self.machine.submission_due() {
            info!(session_id = %self.machine.session_id(), "submitting answer sheet after time ran out");
            self.submit_sheet();
        }
    }

    fn submit_sheet(&mut self) {
        let Some(request) = self.machine.begin_submit_all() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        let tx = self.events.clone();
        self.runtime.spawn(async move {
            let result = backend
                .submit_all_answers(&request.session_id, &request.participant_id, &request.answers)
                .await;
            let _ = tx.send(Event::SheetSubmitted(request, result));
        });
    }

    // Keeps the 1 s ticker alive exactly while the machine's countdown runs.
    fn sync_timers(&mut self) {
        let running = self.machine.countdown_running();
        if running && !self.scheduler.is_counting_down() {
            let tx = self.events.clone();
            self.scheduler.start_countdown(COUNTDOWN_TICK, move || {
                let _ = tx.send(Event::Tick);
            });
        } else if !running && self.scheduler.is_counting_down() {
            self.scheduler.stop_countdown();
        }
    }
}

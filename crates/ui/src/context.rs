use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use quiz_core::model::SessionId;
use services::QuizClient;

pub trait UiApp: Send + Sync {
    fn quiz_client(&self) -> Arc<QuizClient>;

    /// Session to open on launch instead of staying on the home page.
    fn initial_session(&self) -> Option<SessionId>;
}

#[derive(Clone)]
pub struct AppContext {
    quiz_client: Arc<QuizClient>,
    initial_session: Option<SessionId>,
    initial_session_pending: Arc<AtomicBool>,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        let initial_session = app.initial_session();
        Self {
            quiz_client: app.quiz_client(),
            initial_session_pending: Arc::new(AtomicBool::new(initial_session.is_some())),
            initial_session,
        }
    }

    #[must_use]
    pub fn quiz_client(&self) -> Arc<QuizClient> {
        Arc::clone(&self.quiz_client)
    }

    /// The launch session, handed out once.
    #[must_use]
    pub fn take_initial_session(&self) -> Option<SessionId> {
        if self.initial_session_pending.swap(false, Ordering::AcqRel) {
            self.initial_session.clone()
        } else {
            None
        }
    }
}

// This context is provided by the application composition root (`crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}

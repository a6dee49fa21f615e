use crate::error::BackendError;

/// Which operation raised a notice. A later success of the same kind clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    Fetch,
    Join,
    Submit,
    Storage,
}

/// User-visible error overlay. It never replaces the progression state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn empty_name() -> Self {
        Self::new(NoticeKind::Validation, "Please enter your name")
    }

    #[must_use]
    pub fn invalid_option() -> Self {
        Self::new(NoticeKind::Validation, "Please pick one of the listed options")
    }

    #[must_use]
    pub fn fetch_failed(err: &BackendError) -> Self {
        match err {
            BackendError::NotFound => Self::new(NoticeKind::Fetch, "Session not found"),
            _ => Self::new(NoticeKind::Fetch, "Could not reach the quiz server"),
        }
    }

    #[must_use]
    pub fn join_failed() -> Self {
        Self::new(NoticeKind::Join, "Failed to join session")
    }

    #[must_use]
    pub fn submit_failed() -> Self {
        Self::new(NoticeKind::Submit, "Failed to submit answer")
    }

    #[must_use]
    pub fn storage_failed() -> Self {
        Self::new(NoticeKind::Storage, "Failed to save progress")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_messages_distinguish_not_found() {
        assert_eq!(
            Notice::fetch_failed(&BackendError::NotFound).message,
            "Session not found"
        );
        assert_eq!(
            Notice::fetch_failed(&BackendError::Rejected("down".into())).message,
            "Could not reach the quiz server"
        );
    }
}

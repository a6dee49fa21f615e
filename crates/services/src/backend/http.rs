use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use quiz_core::model::{
    AnswerOutcome, AnswerPayload, BulkOutcome, Participant, ParticipantId, Session, SessionId,
};

use super::QuizBackend;
use crate::error::BackendError;

/// REST binding of `QuizBackend`.
#[derive(Clone)]
pub struct HttpQuizBackend {
    client: Client,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl HttpQuizBackend {
    /// Backend whose every request, connecting included, gives up after
    /// `request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()?;
        let mut backend = Self::with_client(client, base_url);
        backend.request_timeout = Some(request_timeout);
        Ok(backend)
    }

    /// Wrap a preconfigured client; its own timeouts apply.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            client,
            base_url,
            request_timeout: None,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    fn session_url(&self, session_id: &SessionId, suffix: &str) -> String {
        format!("{}/sessions/{}{suffix}", self.base_url, session_id.as_str())
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, BackendError> {
        debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(BackendError::NotFound);
    }
    if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
        let message = response.text().await.unwrap_or_default();
        return Err(BackendError::Rejected(message));
    }
    if !status.is_success() {
        return Err(BackendError::HttpStatus(status));
    }
    Ok(response.json().await?)
}

#[derive(Debug, Serialize)]
struct JoinRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerRequest<'a> {
    participant_id: &'a ParticipantId,
    option_index: usize,
    question_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitAllRequest<'a> {
    participant_id: &'a ParticipantId,
    answers: &'a [AnswerPayload],
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn get_session(&self, session_id: &SessionId) -> Result<Session, BackendError> {
        let url = self.session_url(session_id, "");
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn join_session(
        &self,
        session_id: &SessionId,
        name: &str,
    ) -> Result<Participant, BackendError> {
        let url = self.session_url(session_id, "/join");
        match self.post(url, &JoinRequest { name }).await {
            Ok(participant) => Ok(participant),
            Err(BackendError::Rejected(message)) => Err(BackendError::Join(message)),
            Err(BackendError::HttpStatus(status)) => Err(BackendError::Join(status.to_string())),
            Err(other) => Err(other),
        }
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        option_index: usize,
        question_index: usize,
    ) -> Result<AnswerOutcome, BackendError> {
        let url = self.session_url(session_id, "/answers");
        let body = AnswerRequest {
            participant_id,
            option_index,
            question_index,
        };
        self.post(url, &body).await
    }

    async fn submit_all_answers(
        &self,
        session_id: &SessionId,
        participant_id: &ParticipantId,
        answers: &[AnswerPayload],
    ) -> Result<BulkOutcome, BackendError> {
        let url = self.session_url(session_id, "/submit");
        let body = SubmitAllRequest {
            participant_id,
            answers,
        };
        self.post(url, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let backend =
            HttpQuizBackend::new("http://localhost:8080/api/", Duration::from_secs(3)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8080/api");
        assert_eq!(backend.request_timeout(), Some(Duration::from_secs(3)));
        assert_eq!(
            backend.session_url(&SessionId::new("s1"), "/join"),
            "http://localhost:8080/api/sessions/s1/join"
        );
    }

    #[test]
    fn answer_request_is_camel_case() {
        let participant_id = ParticipantId::new("p1");
        let body = AnswerRequest {
            participant_id: &participant_id,
            option_index: 2,
            question_index: 0,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"participantId":"p1","optionIndex":2,"questionIndex":0}"#
        );
    }

    #[tokio::test]
    async fn silent_server_times_out_instead_of_hanging() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend =
            HttpQuizBackend::new(format!("http://{addr}"), Duration::from_millis(200)).unwrap();
        let result = tokio::time::timeout(
            Duration::from_secs(10),
            backend.get_session(&SessionId::new("s1")),
        )
        .await
        .expect("request kept waiting past its own timeout");

        assert!(matches!(result, Err(BackendError::Http(ref err)) if err.is_timeout()));
        server.abort();
    }
}

//! PostgREST-style HTTP backend.
//!
//! Speaks the REST conventions of the hosted relational store: tables are
//! resources, filters are query parameters (`user_id=eq.<id>`), and the
//! `Prefer` header controls representation and upsert behavior.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

use async_trait::async_trait;
use serde_json::json;

use super::wire::{GoalsRow, SessionRow};
use super::StudyBackend;
use crate::error::StorageError;
use crate::model::{Goals, SessionId, SessionPatch, StudySession, UserId};

/// HTTP gateway to the remote `goals` and `study_sessions` tables.
pub struct RestBackend {
    http: reqwest::Client,
    base: Url,
    /// Resolved out of band by the identity provider; `None` when signed out.
    user: Option<UserId>,
}

impl RestBackend {
    /// Build a backend against the given REST base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the client cannot be built.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StorageError> {
        let base = Url::parse(base_url)
            .map_err(|e| StorageError::Request(format!("invalid base URL: {e}")))?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| StorageError::Request(format!("invalid api key: {e}")))?;
        headers.insert("apikey", key);
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| StorageError::Request(format!("invalid api key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base,
            user: None,
        })
    }

    /// Attach the authenticated user id.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), table)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_goals_row(&self, user: &UserId) -> Result<Option<GoalsRow>, StorageError> {
        let response = self
            .http
            .get(self.endpoint("goals"))
            .query(&[("user_id", format!("eq.{user}"))])
            .send()
            .await?;
        let rows: Vec<GoalsRow> = Self::check(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl StudyBackend for RestBackend {
    async fn authenticated_user(&self) -> Result<Option<UserId>, StorageError> {
        Ok(self.user.clone())
    }

    async fn fetch_goals_for(&self, user: &UserId) -> Result<Goals, StorageError> {
        if let Some(row) = self.read_goals_row(user).await? {
            return row.into_goals();
        }

        tracing::debug!(%user, "no goals row, creating defaults");
        let default_row = GoalsRow::from_goals(user, &Goals::default());
        let response = self
            .http
            .post(self.endpoint("goals"))
            .header("Prefer", "return=representation")
            .json(&default_row)
            .send()
            .await?;

        // A concurrent creator may have won the race; the unique key on
        // user_id turns that into a conflict, and the existing row stands.
        if response.status() == StatusCode::CONFLICT {
            return self
                .read_goals_row(user)
                .await?
                .ok_or_else(|| StorageError::NotFound(format!("goals for {user}")))?
                .into_goals();
        }

        let rows: Vec<GoalsRow> = Self::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::Decode("insert returned no goals row".into()))?
            .into_goals()
    }

    async fn upsert_goals(&self, user: &UserId, goals: &Goals) -> Result<(), StorageError> {
        let row = GoalsRow::from_goals(user, goals);
        let response = self
            .http
            .post(self.endpoint("goals"))
            .header("Prefer", "resolution=merge-duplicates")
            .json(&row)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn insert_session(
        &self,
        session: &StudySession,
    ) -> Result<StudySession, StorageError> {
        let row = SessionRow::from_session(session);
        let response = self
            .http
            .post(self.endpoint("study_sessions"))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        let rows: Vec<SessionRow> = Self::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::Decode("insert returned no session row".into()))?
            .into_session()
    }

    async fn fetch_sessions(&self, user: &UserId) -> Result<Vec<StudySession>, StorageError> {
        let response = self
            .http
            .get(self.endpoint("study_sessions"))
            .query(&[
                ("user_id", format!("eq.{user}")),
                ("order", "date.desc".to_string()),
            ])
            .send()
            .await?;
        let rows: Vec<SessionRow> = Self::check(response).await?.json().await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn delete_session(&self, id: SessionId, user: &UserId) -> Result<(), StorageError> {
        let response = self
            .http
            .delete(self.endpoint("study_sessions"))
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user}")),
            ])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn update_session(
        &self,
        id: SessionId,
        user: &UserId,
        patch: &SessionPatch,
    ) -> Result<StudySession, StorageError> {
        let mut body = serde_json::Map::new();
        if let Some(duration_min) = patch.duration_min {
            body.insert("duration".into(), json!(duration_min));
        }
        if let Some(note) = &patch.note {
            body.insert("note".into(), json!(note));
        }

        let response = self
            .http
            .patch(self.endpoint("study_sessions"))
            .query(&[
                ("id", format!("eq.{id}")),
                ("user_id", format!("eq.{user}")),
            ])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<SessionRow> = Self::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(format!("session {id}")))?
            .into_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn backend(server: &mockito::Server) -> RestBackend {
        RestBackend::new(&server.url(), "test-key")
            .unwrap()
            .with_user(UserId("u-1".into()))
    }

    fn sample_session() -> StudySession {
        StudySession {
            id: SessionId::new(),
            user_id: UserId("u-1".into()),
            subject: "language".into(),
            duration_min: 25,
            note: None,
            recorded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_goals_reads_existing_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/goals")
            .match_query(mockito::Matcher::UrlEncoded(
                "user_id".into(),
                "eq.u-1".into(),
            ))
            .with_body(r#"[{"user_id":"u-1","daily_goal":90,"weekly_goal":600,"daily_todo":"read"}]"#)
            .create_async()
            .await;

        let goals = backend(&server)
            .fetch_goals_for(&UserId("u-1".into()))
            .await
            .unwrap();
        assert_eq!(goals.daily_goal_min, 90);
        assert_eq!(goals.daily_todo, "read");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_goals_creates_defaults_when_absent() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/goals")
            .match_query(mockito::Matcher::Any)
            .with_body("[]")
            .create_async()
            .await;
        let post = server
            .mock("POST", "/goals")
            .match_header("prefer", "return=representation")
            .with_status(201)
            .with_body(
                r#"[{"user_id":"u-1","daily_goal":120,"weekly_goal":840,"daily_todo":null}]"#,
            )
            .create_async()
            .await;

        let goals = backend(&server)
            .fetch_goals_for(&UserId("u-1".into()))
            .await
            .unwrap();
        assert_eq!(goals, Goals::default());
        get.assert_async().await;
        post.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_goals_conflict_rereads_existing_row() {
        use std::io::Write;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut server = mockito::Server::new_async().await;
        // First read sees no row; a concurrent creator wins the insert race,
        // and the re-read after the 409 returns the existing record.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _get = server
            .mock("GET", "/goals")
            .match_query(mockito::Matcher::Any)
            .with_chunked_body(move |w| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    w.write_all(b"[]")
                } else {
                    w.write_all(
                        br#"[{"user_id":"u-1","daily_goal":120,"weekly_goal":840,"daily_todo":null}]"#,
                    )
                }
            })
            .expect(2)
            .create_async()
            .await;
        let _post = server
            .mock("POST", "/goals")
            .with_status(409)
            .with_body(r#"{"message":"duplicate key value"}"#)
            .create_async()
            .await;

        let goals = backend(&server)
            .fetch_goals_for(&UserId("u-1".into()))
            .await
            .unwrap();
        assert_eq!(goals.daily_goal_min, 120);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn insert_session_returns_confirmed_row() {
        let mut server = mockito::Server::new_async().await;
        let session = sample_session();
        let body = serde_json::to_string(&vec![SessionRow::from_session(&session)]).unwrap();
        let mock = server
            .mock("POST", "/study_sessions")
            .with_status(201)
            .with_body(body)
            .create_async()
            .await;

        let confirmed = backend(&server).insert_session(&session).await.unwrap();
        assert_eq!(confirmed.id, session.id);
        assert_eq!(confirmed.duration_min, 25);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_surfaces_as_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/study_sessions")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("service unavailable")
            .create_async()
            .await;

        let err = backend(&server)
            .fetch_sessions(&UserId("u-1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected { status: 503, .. }));
    }

    #[tokio::test]
    async fn delete_session_filters_by_user() {
        let mut server = mockito::Server::new_async().await;
        let id = SessionId::new();
        let mock = server
            .mock("DELETE", "/study_sessions")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("id".into(), format!("eq.{id}")),
                mockito::Matcher::UrlEncoded("user_id".into(), "eq.u-1".into()),
            ]))
            .with_status(204)
            .create_async()
            .await;

        backend(&server)
            .delete_session(id, &UserId("u-1".into()))
            .await
            .unwrap();
        mock.assert_async().await;
    }
}

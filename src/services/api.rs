//! HTTP implementation of the service traits.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{Quiz, QuizId};
use crate::protocol::{AttemptSubmission, CooldownRejection, CooldownStatus, SubmissionResult};

use super::{CooldownService, QuizLookup, ServiceError, SubmissionService};

/// Longest server message kept in a [`ServiceError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Connection settings shared by every API call.
///
/// Built once at start-up and passed to whatever needs to reach the API;
/// dropping it is the equivalent of logging out.
#[derive(Debug, Clone)]
pub struct ApiContext {
    base_url: Url,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiContext {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ServiceError::InvalidBaseUrl(base_url.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            token,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Absolute URL for the given path segments, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Quiz API client over HTTP.
#[derive(Debug, Clone)]
pub struct ApiClient {
    context: ApiContext,
}

impl ApiClient {
    pub fn new(context: ApiContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ApiContext {
        &self.context
    }

    fn quiz_endpoint(&self, id: &QuizId, action: Option<&str>) -> Result<Url, ServiceError> {
        match action {
            Some(action) => self
                .context
                .endpoint(&["api", "v1", "quizzes", id.as_str(), action]),
            None => self.context.endpoint(&["api", "v1", "quizzes", id.as_str()]),
        }
    }
}

#[async_trait]
impl QuizLookup for ApiClient {
    async fn get_quiz(&self, id: &QuizId) -> Result<Quiz, ServiceError> {
        let url = self.quiz_endpoint(id, None)?;
        debug!(%url, "fetching quiz");
        let response = self.context.request(Method::GET, url).send().await?;
        read_json(response, request_failure).await
    }
}

#[async_trait]
impl CooldownService for ApiClient {
    async fn get_cooldown_status(&self, quiz_id: &QuizId) -> Result<CooldownStatus, ServiceError> {
        let url = self.quiz_endpoint(quiz_id, Some("cooldown"))?;
        debug!(%url, "checking cooldown");
        let response = self.context.request(Method::GET, url).send().await?;
        read_json(response, request_failure).await
    }
}

#[async_trait]
impl SubmissionService for ApiClient {
    async fn submit_attempt(
        &self,
        quiz_id: &QuizId,
        submission: &AttemptSubmission,
    ) -> Result<SubmissionResult, ServiceError> {
        let url = self.quiz_endpoint(quiz_id, Some("submit"))?;
        debug!(%url, answers = submission.answers.len(), "submitting attempt");
        let response = self
            .context
            .request(Method::POST, url)
            .json(submission)
            .send()
            .await?;
        read_json(response, submit_failure).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    on_failure: fn(StatusCode, &str) -> ServiceError,
) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let err = on_failure(status, &body);
        warn!(status = status.as_u16(), error = %err, "API request failed");
        return Err(err);
    }

    Ok(serde_json::from_str(&body)?)
}

/// Map a failed submit response; 403 is the cooldown refusal.
fn submit_failure(status: StatusCode, body: &str) -> ServiceError {
    if status == StatusCode::FORBIDDEN {
        let next_attempt_at = serde_json::from_str::<CooldownRejection>(body)
            .ok()
            .map(|rejection| rejection.next_attempt_at);
        return ServiceError::Cooldown { next_attempt_at };
    }
    request_failure(status, body)
}

fn request_failure(status: StatusCode, body: &str) -> ServiceError {
    if status == StatusCode::NOT_FOUND {
        return ServiceError::NotFound(truncate(body));
    }
    ServiceError::Status {
        status: status.as_u16(),
        message: truncate(body),
    }
}

fn truncate(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

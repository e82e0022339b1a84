//! REST client.
//!
//! Thin wrapper over `reqwest` for the four endpoints the session consumes.
//! Every request carries the bearer token. Responses are decoded into the
//! proto payload types; nothing here touches session state.

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use studybuddy_app::{ApiRequest, AppEvent, FailedRequest};
use studybuddy_proto::{
    CourseId, CourseProgressResponse, GroupId, GroupSummary, HistoricalMessage, LessonId,
    LessonProgressRecord, LessonProgressUpdate,
};

use crate::error::ApiError;

/// REST API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: String,
}

impl ApiClient {
    /// Create a client for `base_url`, authenticating with `token`.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http: Client::new(), base, token: token.into() })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET /groups/user/my`
    pub async fn fetch_groups(&self) -> Result<Vec<GroupSummary>, ApiError> {
        let url = self.endpoint(&["groups", "user", "my"])?;
        self.send(self.request(Method::GET, url.clone()), &url).await
    }

    /// `GET /groups/:id/messages`
    pub async fn fetch_history(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<HistoricalMessage>, ApiError> {
        let url = self.endpoint(&["groups", group_id.as_str(), "messages"])?;
        self.send(self.request(Method::GET, url.clone()), &url).await
    }

    /// `GET /progress/courses/:id`
    ///
    /// Fills in `course_id` when the server leaves it out.
    pub async fn fetch_progress(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseProgressResponse, ApiError> {
        let url = self.endpoint(&["progress", "courses", course_id.as_str()])?;
        let mut response: CourseProgressResponse =
            self.send(self.request(Method::GET, url.clone()), &url).await?;
        response.course_id.get_or_insert_with(|| course_id.clone());
        Ok(response)
    }

    /// `PUT /progress/courses/:id/lessons/:lesson`
    pub async fn save_lesson_progress(
        &self,
        course_id: &CourseId,
        lesson_id: &LessonId,
        update: LessonProgressUpdate,
    ) -> Result<LessonProgressRecord, ApiError> {
        let url =
            self.endpoint(&["progress", "courses", course_id.as_str(), "lessons", lesson_id.as_str()])?;
        let request = self.request(Method::PUT, url.clone()).json(&update);
        self.send(request, &url).await
    }

    /// Run `request` and turn the outcome into the event the runtime feeds
    /// back to the App. Failures become [`AppEvent::RequestFailed`].
    ///
    /// `received_at` is read after the response arrives.
    pub async fn perform(&self, request: ApiRequest, received_at: impl FnOnce() -> i64) -> AppEvent {
        match request {
            ApiRequest::FetchGroups => match self.fetch_groups().await {
                Ok(groups) => AppEvent::GroupsLoaded { groups },
                Err(e) => failed(FailedRequest::Groups, &e),
            },
            ApiRequest::FetchHistory { group_id } => match self.fetch_history(&group_id).await {
                Ok(messages) => {
                    AppEvent::HistoryLoaded { group_id, messages, received_at: received_at() }
                },
                Err(e) => failed(FailedRequest::History(group_id), &e),
            },
            ApiRequest::FetchProgress { course_id } => match self.fetch_progress(&course_id).await
            {
                Ok(response) => AppEvent::ProgressLoaded { course_id, response },
                Err(e) => failed(FailedRequest::Progress(course_id), &e),
            },
            ApiRequest::SaveLessonProgress { course_id, lesson_id, update } => {
                match self.save_lesson_progress(&course_id, &lesson_id, update).await {
                    Ok(record) => AppEvent::LessonProgressSaved { course_id, record },
                    Err(e) => failed(FailedRequest::LessonProgress(course_id, lesson_id), &e),
                }
            },
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(&self.token)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16(), path: url.path().to_string() });
        }

        response.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn failed(request: FailedRequest, error: &ApiError) -> AppEvent {
    tracing::warn!(?request, transient = error.is_transient(), %error, "api request failed");
    AppEvent::RequestFailed { request, message: error.to_string() }
}

//! Jira Cloud REST v3 client implementing `IssueGateway`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::instrument;

use crate::error::JiraError;
use crate::gateway::IssueGateway;
use crate::retry::{retry_after, with_retry, RetryConfig};
use crate::types::*;

const API_PATH: &str = "rest/api/3";
const CHILD_PAGE_SIZE: usize = 100;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Connection settings for a Jira site.
#[derive(Debug, Clone)]
pub struct JiraClientOptions {
    /// Site root, e.g. `https://acme.atlassian.net`
    pub base_url: String,
    pub email: String,
    pub token: String,
}

pub struct JiraClient {
    client: reqwest::Client,
    api_base: String,
    email: String,
    token: String,
    retry: RetryConfig,
    /// Subtask issue type id per project, filled on first use.
    subtask_types: Mutex<HashMap<String, String>>,
}

impl JiraClient {
    pub fn new(opts: JiraClientOptions) -> Result<Self, JiraError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("taskbridge/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: format!("{}/{}", opts.base_url.trim_end_matches('/'), API_PATH),
            email: opts.email,
            token: opts.token,
            retry: RetryConfig::default(),
            subtask_types: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the backoff policy used for read-only calls.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.api_base, path))
            .basic_auth(&self.email, Some(&self.token))
            .header("Accept", "application/json")
    }

    async fn search(
        &self,
        body: &SearchRequest<'_>,
        retry: &RetryConfig,
    ) -> Result<SearchResponse, JiraError> {
        tracing::debug!(jql = body.jql, start_at = ?body.start_at, max_results = body.max_results, "search");

        let response =
            with_retry(retry, || self.request(Method::POST, "search").json(body).send()).await?;

        self.handle_response(response).await
    }

    /// Issue types available in a project.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_issue_types(&self, project_key: &str) -> Result<Vec<IssueType>, JiraError> {
        let path = format!("project/{}", urlencoding::encode(project_key));

        let response =
            with_retry(&self.retry, || self.request(Method::GET, &path).send()).await?;

        let project: ProjectResponse = self.handle_response(response).await?;
        Ok(project.issue_types)
    }

    /// Helper to handle API responses and errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, JiraError> {
        let response = self.check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| JiraError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    async fn check_status(&self, response: Response) -> Result<Response, JiraError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(JiraError::Unauthorized),
            StatusCode::FORBIDDEN => Err(JiraError::Forbidden),
            StatusCode::NOT_FOUND => {
                let text = response.text().await.unwrap_or_default();
                Err(JiraError::NotFound(error_message(&text)))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let wait = retry_after(&response)
                    .map(|d| d.as_secs())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                Err(JiraError::RateLimited(wait))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(JiraError::RemoteQuery {
                    status: status.as_u16(),
                    message: error_message(&text),
                })
            }
        }
    }

    async fn create_issue(&self, fields: &serde_json::Value) -> Result<String, JiraError> {
        let response = self
            .request(Method::POST, "issue")
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        let created: CreatedIssue = self.handle_response(response).await?;
        Ok(created.key)
    }

    async fn update_issue(&self, key: &str, fields: &serde_json::Value) -> Result<(), JiraError> {
        let path = format!("issue/{}", urlencoding::encode(key));
        let response = self
            .request(Method::PUT, &path)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await?;

        self.check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueGateway for JiraClient {
    #[instrument(skip(self), level = "debug")]
    async fn count_issues(
        &self,
        project_key: &str,
        include_subtasks: bool,
    ) -> Result<usize, JiraError> {
        let jql = project_predicate(project_key, include_subtasks);
        let body = SearchRequest {
            jql: &jql,
            fields: None,
            start_at: None,
            max_results: 0,
        };

        let res = self.search(&body, &self.retry).await?;
        Ok(res.total)
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_issues_page(
        &self,
        project_key: &str,
        start_at: usize,
        page_size: usize,
        include_subtasks: bool,
    ) -> Result<Vec<RemoteIssue>, JiraError> {
        let jql = format!(
            "{} ORDER BY key ASC",
            project_predicate(project_key, include_subtasks)
        );
        let body = SearchRequest {
            jql: &jql,
            fields: Some(&ISSUE_FIELDS[..]),
            start_at: Some(start_at),
            max_results: page_size,
        };

        let res = self.search(&body, &self.retry).await?;
        Ok(res.issues)
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_children(&self, parent_key: &str) -> Result<Vec<RemoteIssue>, JiraError> {
        let jql = format!("parent = {} ORDER BY key ASC", parent_key);
        let mut children = Vec::new();

        loop {
            let body = SearchRequest {
                jql: &jql,
                fields: Some(&ISSUE_FIELDS[..]),
                start_at: Some(children.len()),
                max_results: CHILD_PAGE_SIZE,
            };

            let res = self.search(&body, &self.retry).await?;
            let returned = res.issues.len();
            children.extend(res.issues);

            if returned == 0 || children.len() >= res.total {
                break;
            }
        }

        Ok(children)
    }

    #[instrument(skip(self), level = "debug")]
    async fn resolve_subtask_type_id(&self, project_key: &str) -> Result<String, JiraError> {
        let cached = self.subtask_types.lock().get(project_key).cloned();
        if let Some(id) = cached {
            return Ok(id);
        }

        let issue_types = self.get_issue_types(project_key).await?;
        let chosen = select_subtask_type(&issue_types)
            .ok_or_else(|| JiraError::NoIssueTypesFound(project_key.to_string()))?;

        tracing::debug!(
            "Using subtask type {} ({}) for project {}",
            chosen.name,
            chosen.id,
            project_key
        );

        self.subtask_types
            .lock()
            .insert(project_key.to_string(), chosen.id.clone());
        Ok(chosen.id.clone())
    }

    #[instrument(skip_all, level = "debug")]
    async fn upsert_issue(&self, draft: &IssueDraft) -> Result<UpsertResult, JiraError> {
        let fields = draft.to_fields_json();

        if let Some(label) = draft.identity_tag() {
            let jql = format!(
                "labels = \"{}\" AND project = \"{}\"",
                label, draft.project_key
            );
            let body = SearchRequest {
                jql: &jql,
                fields: None,
                start_at: None,
                max_results: 2,
            };

            let found = self.search(&body, &RetryConfig::disabled()).await?;
            match found.issues.as_slice() {
                [] => {}
                [existing] => {
                    self.update_issue(&existing.key, &fields).await?;
                    tracing::debug!("Updated {} ({})", existing.key, label);
                    return Ok(UpsertResult {
                        outcome: UpsertOutcome::Updated,
                        key: existing.key.clone(),
                    });
                }
                many => {
                    return Err(JiraError::DuplicateIdentity {
                        label: label.to_string(),
                        keys: many.iter().map(|issue| issue.key.clone()).collect(),
                    });
                }
            }
        }

        let key = self.create_issue(&fields).await?;
        tracing::debug!("Created {}", key);
        Ok(UpsertResult {
            outcome: UpsertOutcome::Created,
            key,
        })
    }
}

fn project_predicate(project_key: &str, include_subtasks: bool) -> String {
    if include_subtasks {
        format!("project = {}", project_key)
    } else {
        format!(
            "project = {} AND issuetype NOT IN subTaskIssueTypes()",
            project_key
        )
    }
}

/// Pick the issue type used for child issues.
///
/// Preference: a type flagged as subtask, then one whose name mentions
/// "sub" or "child", then whatever comes first.
pub fn select_subtask_type(issue_types: &[IssueType]) -> Option<&IssueType> {
    issue_types
        .iter()
        .find(|t| t.subtask)
        .or_else(|| {
            issue_types.iter().find(|t| {
                let name = t.name.to_lowercase();
                name.contains("sub") || name.contains("child")
            })
        })
        .or_else(|| issue_types.first())
}

/// Jira error bodies carry `errorMessages` and a field map in `errors`.
fn error_message(text: &str) -> String {
    let Ok(body) = serde_json::from_str::<serde_json::Value>(text) else {
        return text.to_string();
    };

    let mut messages: Vec<String> = body
        .get("errorMessages")
        .and_then(|v| v.as_array())
        .map(|msgs| {
            msgs.iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    if let Some(errors) = body.get("errors").and_then(|v| v.as_object()) {
        messages.extend(
            errors
                .iter()
                .filter_map(|(field, msg)| msg.as_str().map(|m| format!("{}: {}", field, m))),
        );
    }

    if messages.is_empty() {
        text.to_string()
    } else {
        messages.join("; ")
    }
}

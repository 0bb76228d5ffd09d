use async_trait::async_trait;

use crate::error::JiraError;
use crate::types::{IssueDraft, RemoteIssue, UpsertResult};

/// Capability interface over the remote tracker.
///
/// Calls are issued one at a time by the reconcilers; implementations do not
/// need to support concurrent use beyond being `Send + Sync`.
#[async_trait]
pub trait IssueGateway: Send + Sync {
    /// Total number of matching issues, without fetching any.
    async fn count_issues(&self, project_key: &str, include_subtasks: bool)
        -> Result<usize, JiraError>;

    /// One page of issues ordered by key ascending.
    ///
    /// The page may be shorter than `page_size`; callers advance `start_at`
    /// by the number actually returned.
    async fn fetch_issues_page(
        &self,
        project_key: &str,
        start_at: usize,
        page_size: usize,
        include_subtasks: bool,
    ) -> Result<Vec<RemoteIssue>, JiraError>;

    /// Every issue whose parent is `parent_key`, ordered by key ascending.
    async fn fetch_children(&self, parent_key: &str) -> Result<Vec<RemoteIssue>, JiraError>;

    /// Issue type id to use for child issues in `project_key`.
    ///
    /// Resolved once per project and cached for the life of the gateway.
    async fn resolve_subtask_type_id(&self, project_key: &str) -> Result<String, JiraError>;

    /// Update the issue carrying the draft's identity label, or create one.
    async fn upsert_issue(&self, draft: &IssueDraft) -> Result<UpsertResult, JiraError>;
}

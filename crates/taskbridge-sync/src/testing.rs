#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! In-memory `IssueGateway` for reconciler tests.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use taskbridge_jira::{
    IssueDraft, IssueGateway, IssueTypeSelector, JiraError, RemoteIssue, UpsertOutcome,
    UpsertResult,
};

fn boom(what: &str) -> JiraError {
    JiraError::RemoteQuery {
        status: 500,
        message: format!("{} failed", what),
    }
}

pub(crate) fn remote(key: &str, summary: &str, parent: Option<&str>) -> RemoteIssue {
    let mut fields = json!({ "summary": summary, "status": { "name": "To Do" } });
    if let Some(parent) = parent {
        fields["parent"] = json!({ "key": parent });
    }
    serde_json::from_value(json!({ "key": key, "fields": fields })).unwrap()
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    /// Issues created or updated through `upsert_issue`, keyed by identity label.
    pub stored: Mutex<HashMap<String, (String, IssueDraft)>>,
    pub calls: Mutex<Vec<String>>,
    next_number: Mutex<u64>,
    fail_summaries: HashSet<String>,
    fail_type_resolution: bool,
    count: Option<usize>,
    pages: Mutex<VecDeque<Vec<RemoteIssue>>>,
    fail_pages: bool,
    children: HashMap<String, Vec<RemoteIssue>>,
    fail_children: HashSet<String>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_upsert_for(mut self, summary: &str) -> Self {
        self.fail_summaries.insert(summary.to_string());
        self
    }

    pub fn failing_type_resolution(mut self) -> Self {
        self.fail_type_resolution = true;
        self
    }

    pub fn with_existing(self, label: &str, key: &str) -> Self {
        let draft = IssueDraft {
            project_key: String::new(),
            summary: String::new(),
            description: None,
            issue_type: IssueTypeSelector::Name("Story".into()),
            parent_key: None,
            labels: vec![label.to_string()],
        };
        self.stored
            .lock()
            .insert(label.to_string(), (key.to_string(), draft));
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_page(self, page: Vec<RemoteIssue>) -> Self {
        self.pages.lock().push_back(page);
        self
    }

    pub fn failing_pages(mut self) -> Self {
        self.fail_pages = true;
        self
    }

    pub fn with_children(mut self, parent_key: &str, children: Vec<RemoteIssue>) -> Self {
        self.children.insert(parent_key.to_string(), children);
        self
    }

    pub fn failing_children_of(mut self, parent_key: &str) -> Self {
        self.fail_children.insert(parent_key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl IssueGateway for FakeGateway {
    async fn count_issues(
        &self,
        project_key: &str,
        _include_subtasks: bool,
    ) -> Result<usize, JiraError> {
        self.record(format!("count:{}", project_key));
        self.count.ok_or_else(|| boom("count"))
    }

    async fn fetch_issues_page(
        &self,
        _project_key: &str,
        start_at: usize,
        page_size: usize,
        _include_subtasks: bool,
    ) -> Result<Vec<RemoteIssue>, JiraError> {
        self.record(format!("page:{}:{}", start_at, page_size));
        if self.fail_pages {
            return Err(boom("page"));
        }
        Ok(self.pages.lock().pop_front().unwrap_or_default())
    }

    async fn fetch_children(&self, parent_key: &str) -> Result<Vec<RemoteIssue>, JiraError> {
        self.record(format!("children:{}", parent_key));
        if self.fail_children.contains(parent_key) {
            return Err(boom("children"));
        }
        Ok(self.children.get(parent_key).cloned().unwrap_or_default())
    }

    async fn resolve_subtask_type_id(&self, project_key: &str) -> Result<String, JiraError> {
        self.record(format!("resolve:{}", project_key));
        if self.fail_type_resolution {
            return Err(JiraError::NoIssueTypesFound(project_key.to_string()));
        }
        Ok("10003".to_string())
    }

    async fn upsert_issue(&self, draft: &IssueDraft) -> Result<UpsertResult, JiraError> {
        let label = draft.identity_tag().unwrap_or_default().to_string();
        self.record(format!("upsert:{}", label));

        if self.fail_summaries.contains(&draft.summary) {
            return Err(boom("upsert"));
        }

        let mut stored = self.stored.lock();
        if let Some((key, existing)) = stored.get_mut(&label) {
            *existing = draft.clone();
            return Ok(UpsertResult {
                outcome: UpsertOutcome::Updated,
                key: key.clone(),
            });
        }

        let mut next = self.next_number.lock();
        *next += 1;
        let key = format!("{}-{}", draft.project_key, 100 + *next);
        stored.insert(label, (key.clone(), draft.clone()));
        Ok(UpsertResult {
            outcome: UpsertOutcome::Created,
            key,
        })
    }
}

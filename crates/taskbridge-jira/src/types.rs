//! Jira REST v3 wire types used by the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix shared by every label the bridge uses as a cross-system identity.
pub const IDENTITY_LABEL_PREFIX: &str = "taskmaster-";

/// Fields requested on every issue search.
pub const ISSUE_FIELDS: [&str; 6] = [
    "summary",
    "description",
    "labels",
    "parent",
    "issuetype",
    "status",
];

/// An issue as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    /// ADF document, a plain string on older sites, or null.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub status: Option<StatusRef>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub parent: Option<IssueRef>,
    #[serde(default)]
    pub issuetype: Option<IssueTypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: String,
}

/// Issue type as embedded in an issue or listed on a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

/// Project issue types share the embedded shape.
pub type IssueType = IssueTypeRef;

/// How a draft names its issue type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueTypeSelector {
    Name(String),
    Id(String),
}

impl IssueTypeSelector {
    fn to_json(&self) -> Value {
        match self {
            IssueTypeSelector::Name(name) => serde_json::json!({ "name": name }),
            IssueTypeSelector::Id(id) => serde_json::json!({ "id": id }),
        }
    }
}

/// Issue fields the bridge writes on create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueDraft {
    pub project_key: String,
    pub summary: String,
    pub description: Option<Value>,
    pub issue_type: IssueTypeSelector,
    pub parent_key: Option<String>,
    pub labels: Vec<String>,
}

impl IssueDraft {
    /// The `fields` object sent to create and update endpoints.
    pub fn to_fields_json(&self) -> Value {
        let mut fields = serde_json::json!({
            "project": { "key": self.project_key },
            "summary": self.summary,
            "description": self.description,
            "issuetype": self.issue_type.to_json(),
            "labels": self.labels,
        });

        if let Some(parent) = &self.parent_key {
            fields["parent"] = serde_json::json!({ "key": parent });
        }

        fields
    }

    /// The identity label this draft is keyed by, if any.
    pub fn identity_tag(&self) -> Option<&str> {
        identity_tag(&self.labels)
    }
}

/// First label carrying the identity prefix.
///
/// Covers both `taskmaster-<id>` and `taskmaster-subtask-<id>`.
pub fn identity_tag(labels: &[String]) -> Option<&str> {
    labels
        .iter()
        .map(String::as_str)
        .find(|label| label.starts_with(IDENTITY_LABEL_PREFIX))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest<'a> {
    pub jql: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<&'a [&'a str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<usize>,
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub issues: Vec<RemoteIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedIssue {
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectResponse {
    #[serde(default)]
    pub issue_types: Vec<IssueType>,
}

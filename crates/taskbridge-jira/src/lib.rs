//! Jira integration for taskbridge.
//!
//! Provides the `IssueGateway` capability used by the reconcilers, its
//! reqwest-backed `JiraClient`, the wire types, and the Atlassian Document
//! Format helpers.

pub mod adf;
pub mod client;
pub mod error;
pub mod gateway;
pub mod retry;
pub mod types;

pub use adf::{doc_to_text, text_to_doc};
pub use client::{JiraClient, JiraClientOptions};
pub use error::JiraError;
pub use gateway::IssueGateway;
pub use retry::RetryConfig;
pub use types::{
    identity_tag, IssueDraft, IssueFields, IssueType, IssueTypeRef, IssueTypeSelector, IssueRef,
    RemoteIssue, StatusRef, UpsertOutcome, UpsertResult, IDENTITY_LABEL_PREFIX,
};

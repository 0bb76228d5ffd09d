//! Jira-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JiraError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized - email or API token rejected")]
    Unauthorized,

    #[error("Forbidden - insufficient permissions")]
    Forbidden,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Query rejected ({status}): {message}")]
    RemoteQuery { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No issue types found for project {0}")]
    NoIssueTypesFound(String),

    #[error("Label {label} is carried by more than one issue: {}", .keys.join(", "))]
    DuplicateIdentity { label: String, keys: Vec<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl JiraError {
    /// User-friendly error message for terminal output.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Network error. Check your connection and base URL.".to_string(),
            Self::Unauthorized => "Jira rejected the credentials. Check email and API token.".to_string(),
            Self::Forbidden => "Your Jira account lacks permission for this project.".to_string(),
            Self::RateLimited(secs) => format!("Jira is rate limiting requests. Wait {} seconds.", secs),
            Self::RemoteQuery { message, .. } => format!("Jira rejected the query: {}", message),
            Self::NotFound(what) => format!("Not found in Jira: {}", what),
            Self::NoIssueTypesFound(project) => {
                format!("Project {} has no issue types available.", project)
            }
            Self::DuplicateIdentity { label, .. } => {
                format!("More than one Jira issue carries label {}.", label)
            }
            Self::InvalidResponse(_) => "Jira returned an unexpected response.".to_string(),
        }
    }

    /// Network or authentication failure, as opposed to a rejected query.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Unauthorized | Self::Forbidden | Self::RateLimited(_)
        )
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) => true,
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = JiraError::Unauthorized;
        assert!(err.user_message().contains("credentials"));

        let err = JiraError::RateLimited(30);
        assert!(err.user_message().contains("30"));
    }

    #[test]
    fn test_is_transport() {
        assert!(JiraError::Unauthorized.is_transport());
        assert!(JiraError::RateLimited(1).is_transport());
        assert!(!JiraError::RemoteQuery {
            status: 400,
            message: "bad jql".into()
        }
        .is_transport());
        assert!(!JiraError::NoIssueTypesFound("P".into()).is_transport());
    }

    #[test]
    fn test_is_retryable() {
        assert!(JiraError::RateLimited(10).is_retryable());
        assert!(!JiraError::NotFound("x".into()).is_retryable());
        assert!(!JiraError::Unauthorized.is_retryable());
    }

    #[test]
    fn test_duplicate_identity_display() {
        let err = JiraError::DuplicateIdentity {
            label: "taskmaster-3".into(),
            keys: vec!["P-3".into(), "P-9".into()],
        };
        assert_eq!(
            err.to_string(),
            "Label taskmaster-3 is carried by more than one issue: P-3, P-9"
        );
    }
}

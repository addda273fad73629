use serde::Serialize;
use uuid::Uuid;

/// Failures talking to the text-generation endpoint.
///
/// Timeouts get their own variant: the caller's correct reaction to a timeout
/// is "shrink the request", not "retry identically".
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("model returned no choices")]
    EmptyResponse,
}

/// Failures extracting JSON from the raw model output.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The payload looks like it was cut off mid-object. Distinct from
    /// [`ParseError::Malformed`] so the caller can reduce the request size
    /// instead of retrying the same prompt.
    #[error("response truncated")]
    Truncated,
    #[error("could not parse JSON from response: {0}")]
    Malformed(String),
}

/// Context-building failures. Fail-fast: one missing group aborts the build.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("group not found: {group_id}")]
    GroupNotFound { group_id: Uuid },
}

/// Machine-readable classification for accumulated generation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    NoGroups,
    NoMealsRequested,
    MealLimitExceeded,
    ApiFailure,
    GroupGenerationFailed,
    UnexpectedError,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::NoGroups => "NO_GROUPS",
            IssueCode::NoMealsRequested => "NO_MEALS_REQUESTED",
            IssueCode::MealLimitExceeded => "MEAL_LIMIT_EXCEEDED",
            IssueCode::ApiFailure => "API_FAILURE",
            IssueCode::GroupGenerationFailed => "GROUP_GENERATION_FAILED",
            IssueCode::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

/// One recorded problem during a generation run. Issues are accumulated and
/// attached to the final outcome, never thrown.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationIssue {
    pub code: IssueCode,
    pub group_id: Option<Uuid>,
    pub message: String,
}

impl GenerationIssue {
    pub fn job_level(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            group_id: None,
            message: message.into(),
        }
    }

    pub fn for_group(code: IssueCode, group_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            code,
            group_id: Some(group_id),
            message: message.into(),
        }
    }
}

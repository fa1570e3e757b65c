use reqwest::StatusCode;
use std::fmt;

use super::api::ApiFailure;

/// Store operation a failure happened in; picks the fallback wording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Fetch,
    Create,
    Update,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOperation::Fetch => "fetch",
            StoreOperation::Create => "create",
            StoreOperation::Update => "update",
        })
    }
}

impl StoreOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            StoreOperation::Fetch => "Failed to load prompts. Please try again.",
            StoreOperation::Create => "Failed to create prompt. Please try again.",
            StoreOperation::Update => "Failed to update prompt. Please try again.",
        }
    }
}

/// Set when `update` targets an id the store does not hold
pub const LOCAL_PROMPT_NOT_FOUND: &str = "Prompt not found";

/// Set when an update patch breaks a field rule; nothing is sent
pub const LOCAL_INVALID_PATCH: &str =
    "Invalid prompt data. Please check your input and try again.";

/// User-facing sentence for a failed store operation.
///
/// The wording depends only on the failure kind (and HTTP status), never on
/// text received from the network.
pub fn user_message(failure: &ApiFailure, operation: StoreOperation) -> String {
    match failure {
        ApiFailure::Http { status } => status_message(*status),
        ApiFailure::Transport(_) => {
            "Network error. Please check your internet connection and try again.".to_string()
        }
        ApiFailure::Timeout => "Request timed out. Please try again.".to_string(),
        ApiFailure::Decode(_) => "Invalid response from server. Please try again.".to_string(),
        ApiFailure::Unexpected(_) => operation.fallback_message().to_string(),
    }
}

fn status_message(status: StatusCode) -> String {
    let message = match status {
        StatusCode::BAD_REQUEST => "Invalid request data. Please check your input and try again.",
        StatusCode::UNAUTHORIZED => {
            "Authentication failed. Please verify the API key is valid and active."
        }
        StatusCode::FORBIDDEN => {
            "Access denied. The API key may not have permission to manage prompts."
        }
        StatusCode::NOT_FOUND => "Prompt not found. It may have been deleted or moved.",
        StatusCode::TOO_MANY_REQUESTS => {
            "Too many requests. Please wait a moment before trying again."
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            "Server error occurred. Please try again in a few minutes."
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            "The prompts service is temporarily unavailable. Please try again later."
        }
        StatusCode::GATEWAY_TIMEOUT => {
            "Request timed out. Please check your connection and try again."
        }
        other => {
            return format!(
                "Server error ({}). Please try again or contact support.",
                other.as_u16()
            )
        }
    };
    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_failure_kind_has_distinct_wording() {
        let messages = [
            user_message(
                &ApiFailure::Http {
                    status: StatusCode::UNAUTHORIZED,
                },
                StoreOperation::Fetch,
            ),
            user_message(
                &ApiFailure::Transport("connection refused".into()),
                StoreOperation::Fetch,
            ),
            user_message(&ApiFailure::Timeout, StoreOperation::Fetch),
            user_message(
                &ApiFailure::Decode("expected value".into()),
                StoreOperation::Fetch,
            ),
            user_message(
                &ApiFailure::Unexpected("boom".into()),
                StoreOperation::Fetch,
            ),
        ];

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_network_text_never_reaches_the_message() {
        let message = user_message(
            &ApiFailure::Transport("dns error: vendor.example".into()),
            StoreOperation::Update,
        );

        assert!(!message.contains("vendor.example"));
    }

    #[test]
    fn test_unlisted_status_includes_code() {
        let message = status_message(StatusCode::IM_A_TEAPOT);

        assert_eq!(
            message,
            "Server error (418). Please try again or contact support."
        );
    }

    #[test]
    fn test_unexpected_failure_uses_operation_fallback() {
        let failure = ApiFailure::Unexpected("boom".into());

        assert_eq!(
            user_message(&failure, StoreOperation::Create),
            "Failed to create prompt. Please try again."
        );
        assert_eq!(
            user_message(&failure, StoreOperation::Update),
            "Failed to update prompt. Please try again."
        );
    }
}

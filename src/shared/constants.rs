use std::time::Duration;

// =============================================================================
// CONTENT LIMITS
// =============================================================================

/// Maximum prompt name length, in characters
pub const MAX_NAME_LENGTH: u64 = 100;

/// Maximum opening line length, in characters
pub const MAX_OPENING_LINE_LENGTH: u64 = 1_500;

/// Maximum custom prompt length, in characters
pub const MAX_CUSTOM_PROMPT_LENGTH: u64 = 15_000;

// =============================================================================
// CACHING
// =============================================================================

/// Browser/intermediate cache lifetime advertised on successful responses
pub const RESPONSE_CACHE_CONTROL: &str = "private, max-age=60";

/// Default freshness window of the client store's list cache
pub const STORE_CACHE_WINDOW: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// USER-FACING MESSAGES
// =============================================================================
//
// Every message a caller can see is owned here. Upstream error text is never
// forwarded, so none of these name the upstream provider.

pub const API_CONFIG_ERROR: &str = "API configuration error";
pub const INVALID_API_KEY: &str = "Invalid API key";
pub const NETWORK_ERROR: &str = "Network error connecting to the prompts service";
pub const SERVICE_UNAVAILABLE: &str =
    "The prompts service is temporarily unavailable. Please try again later.";
pub const RATE_LIMITED: &str = "Too many requests. Please wait a moment before trying again.";

pub const FETCH_PROMPTS_FAILED: &str = "Failed to fetch prompts";
pub const CREATE_PROMPT_FAILED: &str = "Failed to create prompt";
pub const UPDATE_PROMPT_FAILED: &str = "Failed to update prompt";
pub const PROMPT_NOT_FOUND: &str = "Prompt not found";
pub const ENDPOINT_NOT_FOUND: &str = "Endpoint not found";
pub const INVALID_PROMPT_DATA: &str = "Invalid prompt data provided";

pub const PROMPT_NAME_REQUIRED: &str = "Prompt name is required";
pub const PROMPT_ID_REQUIRED: &str = "Prompt ID is required";
pub const NO_VALID_FIELDS: &str = "No valid fields provided for update";
pub const VALIDATION_ERRORS: &str = "Validation errors";

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const INVALID_JSON: &str = "Invalid JSON in request body";
pub const INVALID_RESPONSE_FORMAT: &str = "Invalid response format from service";
pub const INVALID_RESPONSE: &str = "Invalid response from service";

pub const CREATED_WITHOUT_DETAILS: &str =
    "Prompt created successfully, but unable to retrieve details";
pub const CREATED_IDENTITY_UNCERTAIN: &str =
    "Prompt created, but more than one prompt shares this name";

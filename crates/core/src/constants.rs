//! Constants used throughout the serolab core crate.
//!
//! Descriptor tags, default endpoints and environment variable names live here so the codec,
//! the HTTP client and the binaries agree on them.

/// Opening tag of the category segment.
pub const TAG_CATEGORY: &str = "[CAT]";

/// Opening tag of the sub-category segment.
pub const TAG_SUB_CATEGORY: &str = "[SUB]";

/// Opening tag of the test name segment.
pub const TAG_NAME: &str = "[NAME]";

/// Opening tag of the optional type segment.
pub const TAG_TYPE: &str = "[TYPE]";

/// Opening tag of the normal range segment (runs to the end of the string).
pub const TAG_RANGE: &str = "[RANGE]";

/// Every reserved tag, in encoding order.
pub const RESERVED_TAGS: [&str; 5] = [TAG_CATEGORY, TAG_SUB_CATEGORY, TAG_NAME, TAG_TYPE, TAG_RANGE];

/// Grouping bucket for analyses with a blank category, sub-category or name.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Result label printed for analyses that have no result yet.
pub const PENDING_RESULT: &str = "Pending";

/// Path prefix of the results-entry view encoded into the printed barcode.
pub const RESULTS_PATH_PREFIX: &str = "/test-results/";

/// Default base URL of the lab backend REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://localhost:7148/api";

/// Default origin used to build results-entry URLs.
pub const DEFAULT_RESULTS_ORIGIN: &str = "http://localhost:3000";

/// Default HTTP timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default filename of the persisted login token.
pub const DEFAULT_TOKEN_FILENAME: &str = ".serolab-token.json";

pub const ENV_API_BASE_URL: &str = "SEROLAB_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SEROLAB_REQUEST_TIMEOUT_SECS";
pub const ENV_RESULTS_ORIGIN: &str = "SEROLAB_RESULTS_ORIGIN";
pub const ENV_TOKEN_FILE: &str = "SEROLAB_TOKEN_FILE";
pub const ENV_CATALOG_FILE: &str = "SEROLAB_CATALOG_FILE";

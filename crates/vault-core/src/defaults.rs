//! Centralized default constants for docvault.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers; environment overrides are parsed against them.

// =============================================================================
// UPLOAD SCREENING
// =============================================================================

/// Maximum upload size in bytes (50 MB).
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Media types accepted by the default policy.
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/tiff",
    "text/plain",
    "text/csv",
    "text/markdown",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Length of a rate-limit window in seconds.
pub const RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Uploads allowed per actor per window.
pub const RATE_LIMIT_UPLOAD: u32 = 10;

/// Deletes allowed per actor per window.
pub const RATE_LIMIT_DELETE: u32 = 20;

/// Searches allowed per actor per window.
pub const RATE_LIMIT_SEARCH: u32 = 100;

/// Login attempts allowed per actor per window.
pub const RATE_LIMIT_LOGIN: u32 = 5;

/// Limit applied to any action without an explicit entry.
pub const RATE_LIMIT_DEFAULT: u32 = 50;

// =============================================================================
// LOGIN LOCKOUT
// =============================================================================

/// Consecutive failures before an identifier is locked out.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Lockout duration in milliseconds (15 minutes).
pub const LOCKOUT_DURATION_MS: i64 = 15 * 60 * 1000;

// =============================================================================
// VIOLATIONS & SWEEPING
// =============================================================================

/// Violations older than this are purged by the sweeper.
pub const VIOLATION_RETENTION_DAYS: i64 = 7;

/// Default look-back window for the violation feed.
pub const VIOLATION_FEED_HOURS: i64 = 24;

/// Interval between background sweeps in seconds (5 minutes).
pub const SWEEP_INTERVAL_SECS: u64 = 300;

// =============================================================================
// EXTRACTION
// =============================================================================

/// Timeout for a single extraction collaborator call in seconds.
pub const EXTRACTION_TIMEOUT_SECS: u64 = 30;

/// Per-command timeout for external extraction tools (seconds).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

/// Environment variable for the OCR service base URL.
pub const ENV_OCR_SERVICE_URL: &str = "OCR_SERVICE_URL";

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Weight of the keyword scorer in the blended confidence.
pub const CLASSIFIER_KEYWORD_WEIGHT: f64 = 0.4;

/// Weight of the feature scorer in the blended confidence.
pub const CLASSIFIER_FEATURE_WEIGHT: f64 = 0.6;

/// Feature confidence above which the feature category overrides the keyword category.
pub const CLASSIFIER_FEATURE_THRESHOLD: f64 = 0.7;

/// Half-width of the uniform noise added by the heuristic feature scorer.
pub const CLASSIFIER_FEATURE_JITTER: f64 = 0.05;

/// Keyword hits that saturate keyword confidence at 1.0.
pub const KEYWORD_SATURATION_HITS: usize = 3;

/// Maximum number of keywords attached to a document.
pub const MAX_DOCUMENT_KEYWORDS: usize = 10;

/// Language code used when detection is inconclusive.
pub const DEFAULT_LANGUAGE: &str = "en";

// =============================================================================
// SEARCH
// =============================================================================

/// Default page size for search.
pub const PAGE_LIMIT_SEARCH: i64 = 20;

/// Largest page size a caller may request.
pub const PAGE_LIMIT_MAX: i64 = 100;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

/// Number of result pages held by the search cache.
pub const SEARCH_CACHE_CAPACITY: usize = 1000;

/// Lifetime of a cached result page in seconds.
pub const SEARCH_CACHE_TTL_SECS: u64 = 60;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default event bus broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Default blob storage directory.
pub const BLOB_STORAGE_PATH: &str = "./data";

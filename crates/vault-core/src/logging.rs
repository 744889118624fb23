//! Structured logging schema and field name constants for docvault.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Policy rejection or recoverable issue with automatic fallback |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (search hits, scores) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "guard", "jobs", "inference", "search", "db"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "rate_limiter", "login_guard", "validator", "extractor"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

/// Actor an action is attributed to.
pub const ACTOR_ID: &str = "actor_id";

/// Rate-limited action name.
pub const ACTION: &str = "action";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Media type of an uploaded file.
pub const MEDIA_TYPE: &str = "media_type";

/// Violation type recorded.
pub const VIOLATION_TYPE: &str = "violation_type";

/// Violation severity recorded.
pub const SEVERITY: &str = "severity";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of entries removed by a sweep.
pub const PURGED: &str = "purged";

// ─── Classification fields ─────────────────────────────────────────────────

/// Category assigned by the classifier.
pub const CATEGORY: &str = "category";

/// Blended classification confidence.
pub const CONFIDENCE: &str = "confidence";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

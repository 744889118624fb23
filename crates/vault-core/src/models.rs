//! Core data models for docvault.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Category assigned to a document by the classifier.
///
/// Declaration order matters: it is the tie-break order for every scorer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Financial,
    Legal,
    Medical,
    Insurance,
    Tax,
    Employment,
    Education,
    Identity,
    Property,
    Correspondence,
    #[default]
    Other,
}

impl DocumentCategory {
    /// Every category a scorer can select, in tie-break order (excludes `Other`).
    pub const CLASSIFIED: [DocumentCategory; 10] = [
        Self::Financial,
        Self::Legal,
        Self::Medical,
        Self::Insurance,
        Self::Tax,
        Self::Employment,
        Self::Education,
        Self::Identity,
        Self::Property,
        Self::Correspondence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Legal => "legal",
            Self::Medical => "medical",
            Self::Insurance => "insurance",
            Self::Tax => "tax",
            Self::Employment => "employment",
            Self::Education => "education",
            Self::Identity => "identity",
            Self::Property => "property",
            Self::Correspondence => "correspondence",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::CLASSIFIED
            .into_iter()
            .chain(std::iter::once(Self::Other))
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Invalid document category: {}", s))
    }
}

/// Coarse kind of document (`documentType`), detected from name and text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Receipt,
    Contract,
    Statement,
    Report,
    Letter,
    Form,
    Certificate,
    Prescription,
    Policy,
    /// Fallbacks by media family when no term matched.
    Pdf,
    Image,
    Text,
    #[default]
    Other,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Receipt => "receipt",
            Self::Contract => "contract",
            Self::Statement => "statement",
            Self::Report => "report",
            Self::Letter => "letter",
            Self::Form => "form",
            Self::Certificate => "certificate",
            Self::Prescription => "prescription",
            Self::Policy => "policy",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    /// Fallback kind for a media family.
    pub fn for_family(family: MediaFamily) -> Self {
        match family {
            MediaFamily::Pdf => Self::Pdf,
            MediaFamily::Image => Self::Image,
            MediaFamily::Text => Self::Text,
            MediaFamily::Other => Self::Other,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_json::from_value(JsonValue::String(s.trim().to_lowercase()))
            .map_err(|_| format!("Invalid document kind: {}", s))
    }
}

/// Media type family used to pick an extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFamily {
    Pdf,
    Image,
    Text,
    Other,
}

impl MediaFamily {
    /// Classify a media type string (parameters such as `; charset=` are ignored).
    pub fn of(media_type: &str) -> Self {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => Self::Pdf,
            m if m.starts_with("image/") => Self::Image,
            m if m.starts_with("text/") => Self::Text,
            _ => Self::Other,
        }
    }
}

/// Strategy used to turn file bytes into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Decode bytes directly as UTF-8.
    TextNative,
    /// Delegate to the PDF-text collaborator.
    PdfText,
    /// Delegate to the OCR collaborator.
    Ocr,
}

impl ExtractionStrategy {
    /// Strategy for a media type, or `None` when the type carries no extractable text.
    pub fn for_media_type(media_type: &str) -> Option<Self> {
        match MediaFamily::of(media_type) {
            MediaFamily::Pdf => Some(Self::PdfText),
            MediaFamily::Image => Some(Self::Ocr),
            MediaFamily::Text => Some(Self::TextNative),
            MediaFamily::Other => None,
        }
    }
}

/// A file as it arrives at the upload entrypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    pub media_type: String,
    /// Size declared by the client.
    pub size_bytes: u64,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub owner_id: String,
}

impl FileUpload {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size_bytes: bytes.len() as u64,
            bytes,
            owner_id: owner_id.into(),
        }
    }

    /// Size used for policy checks: the larger of the declared and actual sizes.
    pub fn effective_size(&self) -> u64 {
        self.size_bytes.max(self.bytes.len() as u64)
    }
}

/// Output of the classification engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: DocumentCategory,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub document_type: DocumentKind,
    pub language: String,
}

impl ClassificationResult {
    /// Result for a document nothing could be said about.
    pub fn unclassified() -> Self {
        Self {
            category: DocumentCategory::Other,
            confidence: 0.0,
            keywords: Vec::new(),
            document_type: DocumentKind::Other,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// A stored, fully classified document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub media_type: String,
    pub size_bytes: i64,
    pub owner_id: String,
    pub category: DocumentCategory,
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub document_type: DocumentKind,
    pub language: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub extracted_text: String,
    /// BLAKE3 hash of the stored bytes (`blake3:{hex}`).
    pub content_hash: String,
    /// Blob store path of the original bytes.
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from an accepted upload and its classification.
    ///
    /// Confidence is clamped to `[0, 1]` and keywords are deduplicated.
    pub fn from_upload(
        id: Uuid,
        upload: &FileUpload,
        classification: ClassificationResult,
        extracted_text: String,
        content_hash: String,
        storage_path: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut seen = BTreeSet::new();
        let keywords = classification
            .keywords
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();
        Self {
            id,
            name: upload.name.clone(),
            media_type: upload.media_type.clone(),
            size_bytes: upload.bytes.len() as i64,
            owner_id: upload.owner_id.clone(),
            category: classification.category,
            confidence: classification.confidence.clamp(0.0, 1.0),
            keywords,
            document_type: classification.document_type,
            language: classification.language,
            extracted_text,
            content_hash,
            storage_path,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// SECURITY POLICY
// =============================================================================

/// Well-known rate-limited action names.
pub mod actions {
    pub const UPLOAD: &str = "upload";
    pub const DELETE: &str = "delete";
    pub const SEARCH: &str = "search";
    pub const LOGIN: &str = "login";
}

/// Immutable policy snapshot shared by the validator, rate limiter and login guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub max_file_size_bytes: u64,
    pub allowed_media_types: BTreeSet<String>,
    /// Per-action limits per window.
    pub rate_limits: BTreeMap<String, u32>,
    /// Limit for actions missing from `rate_limits`.
    pub default_rate_limit: u32,
    pub max_login_attempts: u32,
    pub lockout_duration_ms: i64,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        let rate_limits = [
            (actions::UPLOAD, defaults::RATE_LIMIT_UPLOAD),
            (actions::DELETE, defaults::RATE_LIMIT_DELETE),
            (actions::SEARCH, defaults::RATE_LIMIT_SEARCH),
            (actions::LOGIN, defaults::RATE_LIMIT_LOGIN),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            max_file_size_bytes: defaults::MAX_UPLOAD_SIZE_BYTES,
            allowed_media_types: defaults::ALLOWED_MEDIA_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_limits,
            default_rate_limit: defaults::RATE_LIMIT_DEFAULT,
            max_login_attempts: defaults::MAX_LOGIN_ATTEMPTS,
            lockout_duration_ms: defaults::LOCKOUT_DURATION_MS,
        }
    }
}

impl SecurityPolicy {
    /// Build the policy from environment variables, falling back to defaults.
    ///
    /// Reads `MAX_UPLOAD_SIZE_BYTES`, `ALLOWED_MEDIA_TYPES` (comma separated),
    /// `MAX_LOGIN_ATTEMPTS`, `LOCKOUT_DURATION_MS` and `RATE_LIMIT_<ACTION>`
    /// for each known action.
    pub fn from_env() -> Self {
        let mut policy = Self::default();

        if let Some(v) = env_parse::<u64>("MAX_UPLOAD_SIZE_BYTES") {
            policy.max_file_size_bytes = v;
        }
        if let Ok(v) = std::env::var("ALLOWED_MEDIA_TYPES") {
            let types = normalize_media_types(v.split(','));
            if types.is_empty() {
                tracing::warn!("ALLOWED_MEDIA_TYPES is empty, keeping defaults");
            } else {
                policy.allowed_media_types = types;
            }
        }
        if let Some(v) = env_parse::<u32>("MAX_LOGIN_ATTEMPTS") {
            policy.max_login_attempts = v.max(1);
        }
        if let Some(v) = env_parse::<i64>("LOCKOUT_DURATION_MS") {
            policy.lockout_duration_ms = v.max(0);
        }
        for action in [
            actions::UPLOAD,
            actions::DELETE,
            actions::SEARCH,
            actions::LOGIN,
        ] {
            let key = format!("RATE_LIMIT_{}", action.to_uppercase());
            if let Some(v) = env_parse::<u32>(&key) {
                policy.rate_limits.insert(action.to_string(), v);
            }
        }
        if let Some(v) = env_parse::<u32>("RATE_LIMIT_DEFAULT") {
            policy.default_rate_limit = v;
        }
        policy
    }

    /// Limit for an action within one window.
    pub fn rate_limit_for(&self, action: &str) -> u32 {
        self.rate_limits
            .get(action)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    /// Lowercase and trim the allow list so lookups match
    /// [`is_media_type_allowed`](Self::is_media_type_allowed).
    pub fn normalized(mut self) -> Self {
        self.allowed_media_types = normalize_media_types(self.allowed_media_types.iter());
        self
    }

    /// How long an unlocked failure count is remembered after the last
    /// failure. Never shorter than one rate-limit window.
    pub fn failure_memory(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(
            self.lockout_duration_ms
                .max(defaults::RATE_LIMIT_WINDOW_SECS * 1000),
        )
    }

    /// Whether a media type (ignoring parameters and case) is on the allow list.
    pub fn is_media_type_allowed(&self, media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        self.allowed_media_types.contains(&essence)
    }
}

fn normalize_media_types<I, S>(types: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    types
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse an environment variable, warning and returning `None` on malformed values.
pub fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid numeric environment value, using default");
            None
        }
    }
}

/// Counter state for one (actor, action) window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

/// Consecutive-failure record for one login identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginAttemptRecord {
    pub identifier: String,
    pub count: u32,
    pub lockout_until: Option<DateTime<Utc>>,
    /// Most recent counted failure. `None` when the backend expires failure
    /// counts itself (Redis key TTL).
    #[serde(default)]
    pub last_failure_at: Option<DateTime<Utc>>,
}

// =============================================================================
// VIOLATIONS
// =============================================================================

/// Kind of policy breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    FileSize,
    FileType,
    RateLimit,
    SuspiciousActivity,
    UnauthorizedAccess,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileSize => "file_size",
            Self::FileType => "file_type",
            Self::RateLimit => "rate_limit",
            Self::SuspiciousActivity => "suspicious_activity",
            Self::UnauthorizedAccess => "unauthorized_access",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViolationType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file_size" => Ok(Self::FileSize),
            "file_type" => Ok(Self::FileType),
            "rate_limit" => Ok(Self::RateLimit),
            "suspicious_activity" => Ok(Self::SuspiciousActivity),
            "unauthorized_access" => Ok(Self::UnauthorizedAccess),
            _ => Err(format!("Invalid violation type: {}", s)),
        }
    }
}

/// Violation severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid severity: {}", s)),
        }
    }
}

/// An append-only record of a policy breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: Uuid,
    pub violation_type: ViolationType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub details: JsonValue,
    pub timestamp: DateTime<Utc>,
}

/// Filter for reading the violation feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationQuery {
    pub actor_id: Option<String>,
    pub violation_type: Option<ViolationType>,
    /// Only violations at or after this instant.
    pub since: DateTime<Utc>,
}

impl ViolationQuery {
    pub fn matches(&self, v: &Violation) -> bool {
        v.timestamp >= self.since
            && self
                .actor_id
                .as_ref()
                .map_or(true, |a| v.actor_id.as_deref() == Some(a.as_str()))
            && self.violation_type.map_or(true, |t| v.violation_type == t)
    }
}

/// Aggregate view over recorded violations and login state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViolationMetrics {
    pub total: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
    pub suspicious_ip_count: u64,
    pub locked_out_count: u64,
}

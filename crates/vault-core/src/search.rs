//! Search request and filter types.
//!
//! A [`SearchQuery`] is constructed per call and never persisted. Stores
//! receive the lowered form, a [`DocumentFilter`], which carries the owner
//! scope, the normalised free text and the optional structured filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::models::{Document, DocumentCategory};

/// Field a result page is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Name,
    Size,
    Confidence,
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "created_at" | "createdat" => Ok(Self::CreatedAt),
            "name" => Ok(Self::Name),
            "size" | "size_bytes" => Ok(Self::Size),
            "confidence" => Ok(Self::Confidence),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

/// Optional structured filters. Absent fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A search request as received from a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub free_text: String,
    pub owner_id: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    defaults::PAGE_LIMIT_SEARCH
}

impl SearchQuery {
    /// Query with default filters, ordering and pagination.
    pub fn new(free_text: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            free_text: free_text.into(),
            owner_id: owner_id.into(),
            filters: SearchFilters::default(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            limit: defaults::PAGE_LIMIT_SEARCH,
            offset: defaults::PAGE_OFFSET,
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Trim and lowercase free text; the normalised form is used for matching
/// and cache keys.
pub fn normalize_query(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Store-level predicate built from a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFilter {
    pub owner_id: String,
    /// Normalised free text; `None` when the caller sent none.
    pub text: Option<String>,
    pub filters: SearchFilters,
}

impl DocumentFilter {
    /// Lower a query into a predicate. Empty free text means "no text constraint".
    pub fn from_query(query: &SearchQuery) -> Self {
        let text = normalize_query(&query.free_text);
        Self {
            owner_id: query.owner_id.clone(),
            text: (!text.is_empty()).then_some(text),
            filters: query.filters.clone(),
        }
    }

    /// Evaluate the predicate against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        if doc.owner_id != self.owner_id {
            return false;
        }
        if let Some(text) = &self.text {
            let hit = doc.name.to_lowercase().contains(text)
                || doc.extracted_text.to_lowercase().contains(text)
                || doc.keywords.iter().any(|k| k.to_lowercase().contains(text));
            if !hit {
                return false;
            }
        }
        let f = &self.filters;
        if f.category.is_some_and(|c| c != doc.category) {
            return false;
        }
        if f.date_from.is_some_and(|from| doc.created_at < from) {
            return false;
        }
        if f.date_to.is_some_and(|to| doc.created_at > to) {
            return false;
        }
        if let Some(media_type) = &f.media_type {
            if !doc.media_type.eq_ignore_ascii_case(media_type) {
                return false;
            }
        }
        if f.min_size.is_some_and(|min| doc.size_bytes < min) {
            return false;
        }
        if f.max_size.is_some_and(|max| doc.size_bytes > max) {
            return false;
        }
        if let Some(language) = &f.language {
            if !doc.language.eq_ignore_ascii_case(language) {
                return false;
            }
        }
        true
    }
}

/// Ordering and window for a store query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub limit: i64,
    pub offset: i64,
}

/// One page of documents plus the total number of matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total_count: i64,
}

/// Response of the search entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub documents: Vec<Document>,
    pub total_count: i64,
    pub elapsed_ms: u64,
}

/// Compare two documents by the requested sort key, breaking ties by id.
pub fn compare_documents(
    a: &Document,
    b: &Document,
    field: SortField,
    direction: SortDirection,
) -> std::cmp::Ordering {
    let ord = match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Size => a.size_bytes.cmp(&b.size_bytes),
        SortField::Confidence => a.confidence.total_cmp(&b.confidence),
    }
    .then_with(|| a.id.cmp(&b.id));
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;
    use uuid::Uuid;

    fn doc(name: &str, text: &str) -> Document {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            media_type: "text/plain".to_string(),
            size_bytes: 120,
            owner_id: "owner-1".to_string(),
            category: DocumentCategory::Financial,
            confidence: 0.5,
            keywords: vec!["invoice".to_string()],
            document_type: DocumentKind::Invoice,
            language: "en".to_string(),
            extracted_text: text.to_string(),
            content_hash: String::new(),
            storage_path: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_query("  Invoice  "), "invoice");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn empty_text_is_no_constraint() {
        let filter = DocumentFilter::from_query(&SearchQuery::new("  ", "owner-1"));
        assert!(filter.text.is_none());
        assert!(filter.matches(&doc("a.txt", "")));
    }

    #[test]
    fn owner_scope_is_enforced() {
        let filter = DocumentFilter::from_query(&SearchQuery::new("", "owner-2"));
        assert!(!filter.matches(&doc("a.txt", "")));
    }

    #[test]
    fn text_matches_name_body_or_keywords() {
        let d = doc("Q3 Report.txt", "quarterly revenue");
        for q in ["report", "REVENUE", "invoice"] {
            let filter = DocumentFilter::from_query(&SearchQuery::new(q, "owner-1"));
            assert!(filter.matches(&d), "expected match for {q}");
        }
        let filter = DocumentFilter::from_query(&SearchQuery::new("contract", "owner-1"));
        assert!(!filter.matches(&d));
    }

    #[test]
    fn structured_filters_apply() {
        let d = doc("a.txt", "");
        let mut filters = SearchFilters {
            category: Some(DocumentCategory::Financial),
            min_size: Some(100),
            max_size: Some(200),
            language: Some("EN".to_string()),
            media_type: Some("TEXT/PLAIN".to_string()),
            ..Default::default()
        };
        let q = SearchQuery::new("", "owner-1").with_filters(filters.clone());
        assert!(DocumentFilter::from_query(&q).matches(&d));

        filters.category = Some(DocumentCategory::Legal);
        let q = SearchQuery::new("", "owner-1").with_filters(filters.clone());
        assert!(!DocumentFilter::from_query(&q).matches(&d));

        filters.category = None;
        filters.max_size = Some(50);
        let q = SearchQuery::new("", "owner-1").with_filters(filters);
        assert!(!DocumentFilter::from_query(&q).matches(&d));
    }

    #[test]
    fn date_range_filter() {
        let d = doc("a.txt", "");
        let filters = SearchFilters {
            date_from: Some(d.created_at + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        let q = SearchQuery::new("", "owner-1").with_filters(filters);
        assert!(!DocumentFilter::from_query(&q).matches(&d));
    }

    #[test]
    fn sort_comparator_respects_direction() {
        let mut a = doc("alpha", "");
        let mut b = doc("beta", "");
        a.size_bytes = 1;
        b.size_bytes = 2;
        assert_eq!(
            compare_documents(&a, &b, SortField::Size, SortDirection::Asc),
            std::cmp::Ordering::Less
        );
        assert_eq!(
            compare_documents(&a, &b, SortField::Name, SortDirection::Desc),
            std::cmp::Ordering::Greater
        );
    }

    #[test]
    fn sort_field_parses() {
        assert_eq!("createdAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("size".parse::<SortField>().unwrap(), SortField::Size);
        assert!("weight".parse::<SortField>().is_err());
    }
}

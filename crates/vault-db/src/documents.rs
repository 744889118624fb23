//! PostgreSQL document repository.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use vault_core::{
    Document, DocumentFilter, DocumentPage, DocumentRepository, Error, PageRequest, Result,
    SortDirection, SortField,
};

use crate::escape_like;

const DOCUMENT_COLUMNS: &str = "id, name, media_type, size_bytes, owner_id, category, confidence, \
     keywords, document_type, language, extracted_text, content_hash, storage_path, \
     created_at, updated_at";

pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &sqlx::postgres::PgRow) -> Document {
        let category: String = r.get("category");
        let document_type: String = r.get("document_type");
        Document {
            id: r.get("id"),
            name: r.get("name"),
            media_type: r.get("media_type"),
            size_bytes: r.get("size_bytes"),
            owner_id: r.get("owner_id"),
            category: category.parse().unwrap_or_default(),
            confidence: r.get("confidence"),
            keywords: r.get("keywords"),
            document_type: document_type.parse().unwrap_or_default(),
            language: r.get("language"),
            extracted_text: r.get("extracted_text"),
            content_hash: r.get("content_hash"),
            storage_path: r.get("storage_path"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    /// Append the WHERE clause for `filter` to `qb`.
    fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
        qb.push(" WHERE owner_id = ").push_bind(filter.owner_id.clone());

        if let Some(text) = &filter.text {
            let pattern = format!("%{}%", escape_like(text));
            qb.push(" AND (lower(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(extracted_text) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR EXISTS (SELECT 1 FROM unnest(keywords) AS k WHERE lower(k) LIKE ")
                .push_bind(pattern)
                .push("))");
        }

        let f = &filter.filters;
        if let Some(category) = f.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(from) = f.date_from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = f.date_to {
            qb.push(" AND created_at <= ").push_bind(to);
        }
        if let Some(media_type) = &f.media_type {
            qb.push(" AND lower(media_type) = ")
                .push_bind(media_type.to_lowercase());
        }
        if let Some(min) = f.min_size {
            qb.push(" AND size_bytes >= ").push_bind(min);
        }
        if let Some(max) = f.max_size {
            qb.push(" AND size_bytes <= ").push_bind(max);
        }
        if let Some(language) = &f.language {
            qb.push(" AND lower(language) = ")
                .push_bind(language.to_lowercase());
        }
    }
}

fn order_clause(field: SortField, direction: SortDirection) -> String {
    let column = match field {
        SortField::CreatedAt => "created_at",
        SortField::Name => "lower(name)",
        SortField::Size => "size_bytes",
        SortField::Confidence => "confidence",
    };
    let dir = match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!(" ORDER BY {column} {dir}, id {dir}")
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            "INSERT INTO document (id, name, media_type, size_bytes, owner_id, category, confidence,
                                   keywords, document_type, language, extracted_text, content_hash,
                                   storage_path, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(doc.id)
        .bind(&doc.name)
        .bind(&doc.media_type)
        .bind(doc.size_bytes)
        .bind(&doc.owner_id)
        .bind(doc.category.as_str())
        .bind(doc.confidence)
        .bind(&doc.keywords)
        .bind(doc.document_type.as_str())
        .bind(&doc.language)
        .bind(&doc.extracted_text)
        .bind(&doc.content_hash)
        .bind(&doc.storage_path)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fetch(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM document WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "DELETE FROM document WHERE id = $1 AND owner_id = $2 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn search(&self, filter: &DocumentFilter, page: PageRequest) -> Result<DocumentPage> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) AS total FROM document");
        Self::push_filter(&mut count_qb, filter);
        let total_count: i64 = count_qb
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
            .get("total");

        let mut qb = QueryBuilder::new(format!("SELECT {DOCUMENT_COLUMNS} FROM document"));
        Self::push_filter(&mut qb, filter);
        qb.push(order_clause(page.sort_field, page.sort_direction));
        qb.push(" LIMIT ").push_bind(page.limit.max(0));
        qb.push(" OFFSET ").push_bind(page.offset.max(0));

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(DocumentPage {
            documents: rows.iter().map(Self::parse_row).collect(),
            total_count,
        })
    }
}

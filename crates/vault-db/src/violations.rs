//! PostgreSQL violation log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, QueryBuilder, Row};
use tracing::warn;

use vault_core::{
    Error, Result, Severity, Violation, ViolationQuery, ViolationRepository, ViolationTally,
    ViolationType,
};

pub struct PgViolationRepository {
    pool: Pool<Postgres>,
}

impl PgViolationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(r: &sqlx::postgres::PgRow) -> Option<Violation> {
        let violation_type: String = r.get("violation_type");
        let severity: String = r.get("severity");
        let (Ok(violation_type), Ok(severity)) = (
            violation_type.parse::<ViolationType>(),
            severity.parse::<Severity>(),
        ) else {
            warn!(
                subsystem = "db",
                component = "violations",
                violation_type = %violation_type,
                severity = %severity,
                "Skipping violation row with unknown type or severity"
            );
            return None;
        };
        Some(Violation {
            id: r.get("id"),
            violation_type,
            severity,
            actor_id: r.get("actor_id"),
            details: r.get("details"),
            timestamp: r.get("occurred_at"),
        })
    }
}

#[async_trait]
impl ViolationRepository for PgViolationRepository {
    async fn append(&self, violation: &Violation) -> Result<()> {
        sqlx::query(
            "INSERT INTO violation (id, violation_type, severity, actor_id, details, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(violation.id)
        .bind(violation.violation_type.as_str())
        .bind(violation.severity.as_str())
        .bind(&violation.actor_id)
        .bind(&violation.details)
        .bind(violation.timestamp)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn query(&self, query: &ViolationQuery) -> Result<Vec<Violation>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, violation_type, severity, actor_id, details, occurred_at
             FROM violation WHERE occurred_at >= ",
        );
        qb.push_bind(query.since);
        if let Some(actor_id) = &query.actor_id {
            qb.push(" AND actor_id = ").push_bind(actor_id.clone());
        }
        if let Some(violation_type) = query.violation_type {
            qb.push(" AND violation_type = ")
                .push_bind(violation_type.as_str());
        }
        qb.push(" ORDER BY occurred_at DESC");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().filter_map(Self::parse_row).collect())
    }

    async fn tally(&self) -> Result<Vec<ViolationTally>> {
        let rows = sqlx::query(
            "SELECT violation_type, severity, COUNT(*) AS n
             FROM violation GROUP BY violation_type, severity",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .filter_map(|r| {
                let violation_type: String = r.get("violation_type");
                let severity: String = r.get("severity");
                let count: i64 = r.get("n");
                Some(ViolationTally {
                    violation_type: violation_type.parse().ok()?,
                    severity: severity.parse().ok()?,
                    count: count.max(0) as u64,
                })
            })
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM violation WHERE occurred_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

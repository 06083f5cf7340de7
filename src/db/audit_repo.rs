// src/db/audit_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::audit::{AuditAction, AuditFilters, AuditLog, AuditStats, NewAuditEntry},
};

const SELECT_WITH_ACTOR: &str = r#"
    SELECT a.*, u.email AS user_email, u.role AS user_role
    FROM audit_logs a
    LEFT JOIN users u ON u.id = a.user_id
"#;

// Trilha de auditoria: só INSERT e SELECT (o banco bloqueia UPDATE/DELETE).
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(&self, executor: E, entry: &NewAuditEntry) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                user_id, action_type, resource_type, resource_id, resource_name,
                old_values, new_values, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.action_type)
        .bind(entry.resource_type)
        .bind(&entry.resource_id)
        .bind(&entry.resource_name)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.description)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// `only_user = None` lista de todos os usuários (Global).
    pub async fn list(
        &self,
        only_user: Option<Uuid>,
        filters: &AuditFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let sql = format!(
            r#"
            {SELECT_WITH_ACTOR}
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
              AND ($2::timestamptz IS NULL OR a.created_at >= $2)
              AND ($3::timestamptz IS NULL OR a.created_at <= $3)
              AND ($4::audit_action IS NULL OR a.action_type = $4)
              AND ($5::text IS NULL OR a.resource_type = $5)
            ORDER BY a.created_at DESC
            LIMIT $6 OFFSET $7
            "#
        );
        let logs = sqlx::query_as::<_, AuditLog>(&sql)
            .bind(only_user)
            .bind(filters.start_date)
            .bind(filters.end_date)
            .bind(filters.action_type)
            .bind(&filters.resource_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }

    pub async fn stats(&self, only_user: Option<Uuid>, since: DateTime<Utc>) -> Result<AuditStats, AppError> {
        let (total_actions, actions_today): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE created_at >= date_trunc('day', NOW()))
            FROM audit_logs
            WHERE ($1::uuid IS NULL OR user_id = $1) AND created_at >= $2
            "#,
        )
        .bind(only_user)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let by_action: Vec<(AuditAction, i64)> = sqlx::query_as(
            r#"
            SELECT action_type, COUNT(*)
            FROM audit_logs
            WHERE ($1::uuid IS NULL OR user_id = $1) AND created_at >= $2
            GROUP BY action_type
            "#,
        )
        .bind(only_user)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let by_resource: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT resource_type, COUNT(*)
            FROM audit_logs
            WHERE ($1::uuid IS NULL OR user_id = $1) AND created_at >= $2
            GROUP BY resource_type
            "#,
        )
        .bind(only_user)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(AuditStats {
            total_actions,
            actions_today,
            action_types_count: by_action
                .into_iter()
                .map(|(action, count)| (action.as_str().to_string(), count))
                .collect(),
            resource_types_count: by_resource.into_iter().collect(),
        })
    }
}

// src/db/investment_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        debenture::InterestType,
        investment::{Investment, InvestmentFilters, InvestmentListItem, InvestmentStatus},
    },
};

/// Linha pronta para INSERT, com a cadeia hierárquica já resolvida.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub series_id: Uuid,
    pub investor_user_id: Uuid,
    pub assessor_user_id: Uuid,
    pub escritorio_user_id: Option<Uuid>,
    pub master_user_id: Option<Uuid>,
    pub global_user_id: Option<Uuid>,
    pub invested_amount: Decimal,
    pub investment_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub interest_rate: Decimal,
    pub interest_type: InterestType,
    pub commission_master: Decimal,
    pub commission_escritorio: Decimal,
    pub commission_assessor: Decimal,
    pub commission_global: Decimal,
}

/// Investimento ativo com os dados de série/investidor usados na sincronização.
#[derive(Debug, Clone, FromRow)]
pub struct SyncSource {
    #[sqlx(flatten)]
    pub investment: Investment,
    pub duration_months: i32,
    pub investor_name: String,
    pub investor_pix: Option<String>,
    pub debenture_name: String,
    pub series_code: String,
}

const LIST_FROM: &str = r#"
    FROM investments i
    JOIN users inv ON inv.id = i.investor_user_id
    JOIN users a ON a.id = i.assessor_user_id
    JOIN series s ON s.id = i.series_id
    JOIN debentures d ON d.id = s.debenture_id
    WHERE ($1::uuid[] IS NULL OR i.investor_user_id = ANY($1) OR i.assessor_user_id = $2)
      AND ($3::investment_status IS NULL OR i.status = $3)
      AND ($4::uuid IS NULL OR i.series_id = $4)
      AND ($5::numeric IS NULL OR i.invested_amount >= $5)
      AND ($6::numeric IS NULL OR i.invested_amount <= $6)
      AND ($7::date IS NULL OR i.investment_date >= $7)
      AND ($8::date IS NULL OR i.investment_date <= $8)
"#;

#[derive(Clone)]
pub struct InvestmentRepository {
    pool: PgPool,
}

impl InvestmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(&self, executor: E, new: &NewInvestment) -> Result<Investment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let investment = sqlx::query_as::<_, Investment>(
            r#"
            INSERT INTO investments (
                series_id, investor_user_id, assessor_user_id, escritorio_user_id,
                master_user_id, global_user_id, invested_amount, investment_date,
                maturity_date, interest_rate, interest_type, status,
                commission_master, commission_escritorio, commission_assessor, commission_global
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'ativo', $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(new.series_id)
        .bind(new.investor_user_id)
        .bind(new.assessor_user_id)
        .bind(new.escritorio_user_id)
        .bind(new.master_user_id)
        .bind(new.global_user_id)
        .bind(new.invested_amount)
        .bind(new.investment_date)
        .bind(new.maturity_date)
        .bind(new.interest_rate)
        .bind(new.interest_type)
        .bind(new.commission_master)
        .bind(new.commission_escritorio)
        .bind(new.commission_assessor)
        .bind(new.commission_global)
        .fetch_one(executor)
        .await?;
        Ok(investment)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Investment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Investment>("SELECT * FROM investments WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Investimento"))
    }

    /// Listagem filtrada. `visible_investors = None` não restringe (Global).
    pub async fn list(
        &self,
        visible_investors: Option<Vec<Uuid>>,
        caller_id: Uuid,
        filters: &InvestmentFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<InvestmentListItem>, i64), AppError> {
        let select = format!(
            r#"
            SELECT i.*,
                   inv.full_name AS investor_name,
                   a.full_name AS assessor_name,
                   s.series_code,
                   d.name AS debenture_name
            {LIST_FROM}
            ORDER BY i.investment_date DESC, i.created_at DESC
            LIMIT $9 OFFSET $10
            "#
        );
        let items = sqlx::query_as::<_, InvestmentListItem>(&select)
            .bind(visible_investors.clone())
            .bind(caller_id)
            .bind(filters.status)
            .bind(filters.series_id)
            .bind(filters.min_amount)
            .bind(filters.max_amount)
            .bind(filters.date_from)
            .bind(filters.date_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count = format!("SELECT COUNT(*) {LIST_FROM}");
        let total: i64 = sqlx::query_scalar(&count)
            .bind(visible_investors)
            .bind(caller_id)
            .bind(filters.status)
            .bind(filters.series_id)
            .bind(filters.min_amount)
            .bind(filters.max_amount)
            .bind(filters.date_from)
            .bind(filters.date_to)
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    pub async fn count_by_series<'e, E>(&self, executor: E, series_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM investments WHERE series_id = $1")
            .bind(series_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: InvestmentStatus,
    ) -> Result<Investment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Investment>(
            "UPDATE investments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Investimento"))
    }

    /// Remove o investimento; comissões e remunerações caem em cascata.
    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM investments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Investimento"));
        }
        Ok(())
    }

    /// Investimentos ativos candidatos à sincronização de cronogramas.
    pub async fn list_sync_sources<'e, E>(&self, executor: E) -> Result<Vec<SyncSource>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sources = sqlx::query_as::<_, SyncSource>(
            r#"
            SELECT i.*,
                   s.duration_months,
                   inv.full_name AS investor_name,
                   inv.pix AS investor_pix,
                   d.name AS debenture_name,
                   s.series_code
            FROM investments i
            JOIN series s ON s.id = i.series_id
            JOIN debentures d ON d.id = s.debenture_id
            JOIN users inv ON inv.id = i.investor_user_id
            WHERE i.status = 'ativo'
            ORDER BY i.created_at ASC
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(sources)
    }
}

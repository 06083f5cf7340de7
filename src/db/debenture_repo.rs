// src/db/debenture_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::debenture::{
        CreateDebenturePayload, CreateSeriesPayload, Debenture, Series, UpdateDebenturePayload,
        UpdateSeriesPayload,
    },
};

// Debêntures e suas séries. Exclusão é sempre lógica (status = 'deleted').
#[derive(Clone)]
pub struct DebentureRepository {
    pool: PgPool,
}

impl DebentureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Debêntures
    // ---

    pub async fn list_debentures(&self) -> Result<Vec<Debenture>, AppError> {
        let debentures = sqlx::query_as::<_, Debenture>(
            "SELECT * FROM debentures WHERE status = 'active' ORDER BY emission_date DESC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(debentures)
    }

    pub async fn find_debenture<'e, E>(&self, executor: E, id: Uuid) -> Result<Debenture, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Debenture>("SELECT * FROM debentures WHERE id = $1 AND status = 'active'")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Debênture"))
    }

    pub async fn create_debenture<'e, E>(
        &self,
        executor: E,
        payload: &CreateDebenturePayload,
        created_by: Uuid,
    ) -> Result<Debenture, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let debenture = sqlx::query_as::<_, Debenture>(
            r#"
            INSERT INTO debentures (name, issuer_name, total_emission_value, emission_date, maturity_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.issuer_name)
        .bind(payload.total_emission_value)
        .bind(payload.emission_date)
        .bind(payload.maturity_date)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(debenture)
    }

    pub async fn update_debenture<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateDebenturePayload,
    ) -> Result<Debenture, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Debenture>(
            r#"
            UPDATE debentures SET
                name = COALESCE($2, name),
                issuer_name = COALESCE($3, issuer_name),
                total_emission_value = COALESCE($4, total_emission_value),
                emission_date = COALESCE($5, emission_date),
                maturity_date = COALESCE($6, maturity_date),
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.issuer_name)
        .bind(payload.total_emission_value)
        .bind(payload.emission_date)
        .bind(payload.maturity_date)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Debênture"))
    }

    pub async fn soft_delete_debenture<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE debentures SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Debênture"));
        }
        Ok(())
    }

    // ---
    // Séries
    // ---

    pub async fn list_series(&self, debenture_id: Uuid) -> Result<Vec<Series>, AppError> {
        let series = sqlx::query_as::<_, Series>(
            "SELECT * FROM series WHERE debenture_id = $1 AND status = 'active' ORDER BY series_code ASC",
        )
        .bind(debenture_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(series)
    }

    pub async fn count_active_series<'e, E>(&self, executor: E, debenture_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM series WHERE debenture_id = $1 AND status = 'active'",
        )
        .bind(debenture_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn find_series<'e, E>(&self, executor: E, id: Uuid) -> Result<Series, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Series>("SELECT * FROM series WHERE id = $1 AND status = 'active'")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Série"))
    }

    /// Mesma busca, travando a linha até o fim da transação (captação).
    pub async fn lock_series<'e, E>(&self, executor: E, id: Uuid) -> Result<Series, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Series>(
            "SELECT * FROM series WHERE id = $1 AND status = 'active' FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Série"))
    }

    pub async fn create_series<'e, E>(
        &self,
        executor: E,
        debenture_id: Uuid,
        payload: &CreateSeriesPayload,
    ) -> Result<Series, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Series>(
            r#"
            INSERT INTO series (
                debenture_id, series_code, name, minimum_investment, maximum_investment,
                max_total_captation, duration_months, interest_rate, interest_type,
                max_commission_percentage
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(debenture_id)
        .bind(&payload.series_code)
        .bind(&payload.name)
        .bind(payload.minimum_investment)
        .bind(payload.maximum_investment)
        .bind(payload.max_total_captation)
        .bind(payload.duration_months)
        .bind(payload.interest_rate)
        .bind(payload.interest_type)
        .bind(payload.max_commission_percentage)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &format!("Já existe uma série '{}' nesta debênture.", payload.series_code),
            )
        })
    }

    pub async fn update_series<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &UpdateSeriesPayload,
    ) -> Result<Series, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Series>(
            r#"
            UPDATE series SET
                name = COALESCE($2, name),
                minimum_investment = COALESCE($3, minimum_investment),
                maximum_investment = COALESCE($4, maximum_investment),
                max_total_captation = COALESCE($5, max_total_captation),
                interest_rate = COALESCE($6, interest_rate),
                max_commission_percentage = COALESCE($7, max_commission_percentage),
                updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(payload.minimum_investment)
        .bind(payload.maximum_investment)
        .bind(payload.max_total_captation)
        .bind(payload.interest_rate)
        .bind(payload.max_commission_percentage)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Série"))
    }

    /// Soma (ou subtrai, com valor negativo) da captação corrente.
    pub async fn add_captation<'e, E>(&self, executor: E, id: Uuid, amount: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE series
            SET current_captation = GREATEST(current_captation + $2, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(amount)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn soft_delete_series<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE series SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status = 'active'",
        )
        .bind(id)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Série"));
        }
        Ok(())
    }
}

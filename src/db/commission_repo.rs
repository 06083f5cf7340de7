// src/db/commission_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::commission::{
        Commission, CommissionExportRow, CommissionFilters, NewCommission, PaymentStatus, PaymentSummary,
    },
};

// Linhas por INSERT em lote (10 binds cada; o Postgres aceita até 65535).
const INSERT_CHUNK: usize = 1000;

const FILTERS: &str = r#"
    WHERE ($1::uuid[] IS NULL OR recipient_user_id = ANY($1))
      AND ($2::payment_status IS NULL OR status = $2)
      AND ($3::uuid IS NULL OR recipient_user_id = $3)
      AND ($4::uuid IS NULL OR investment_id = $4)
      AND ($5::date IS NULL OR payment_month >= $5)
      AND ($6::date IS NULL OR payment_month <= $6)
"#;

#[derive(Clone)]
pub struct CommissionRepository {
    pool: PgPool,
}

impl CommissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere em lote ignorando linhas que já existem
    /// (investment_id, recipient_user_id, installment_number). Devolve quantas entraram.
    pub async fn insert_many(&self, conn: &mut PgConnection, rows: &[NewCommission]) -> Result<u64, AppError> {
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO commissions (investment_id, recipient_user_id, recipient_role, \
                 commission_percentage, base_amount, monthly_amount, payment_month, \
                 installment_number, total_installments, due_date) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.investment_id)
                    .push_bind(row.recipient_user_id)
                    .push_bind(row.recipient_role)
                    .push_bind(row.commission_percentage)
                    .push_bind(row.base_amount)
                    .push_bind(row.monthly_amount)
                    .push_bind(row.payment_month)
                    .push_bind(row.installment_number)
                    .push_bind(row.total_installments)
                    .push_bind(row.due_date);
            });
            builder.push(
                " ON CONFLICT ON CONSTRAINT uq_commission_installment DO NOTHING",
            );

            inserted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(inserted)
    }

    /// Chaves já gravadas, para o plano de sincronização.
    pub async fn existing_keys<'e, E>(&self, executor: E) -> Result<Vec<(Uuid, Uuid, i32)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let keys = sqlx::query_as::<_, (Uuid, Uuid, i32)>(
            "SELECT investment_id, recipient_user_id, installment_number FROM commissions",
        )
        .fetch_all(executor)
        .await?;
        Ok(keys)
    }

    pub async fn list(
        &self,
        visible_recipients: Option<Vec<Uuid>>,
        filters: &CommissionFilters,
    ) -> Result<Vec<Commission>, AppError> {
        let sql = format!(
            "SELECT * FROM commissions {FILTERS} ORDER BY payment_month ASC, recipient_role ASC, installment_number ASC"
        );
        let rows = sqlx::query_as::<_, Commission>(&sql)
            .bind(visible_recipients)
            .bind(filters.status)
            .bind(filters.recipient_user_id)
            .bind(filters.investment_id)
            .bind(filters.month_from)
            .bind(filters.month_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn summary(
        &self,
        visible_recipients: Option<Vec<Uuid>>,
        filters: &CommissionFilters,
    ) -> Result<PaymentSummary, AppError> {
        let sql = format!(
            r#"
            SELECT COUNT(*) AS total_records,
                   COALESCE(SUM(monthly_amount), 0) AS total_amount,
                   COALESCE(SUM(monthly_amount) FILTER (WHERE status = 'PAGO'), 0) AS paid_amount,
                   COALESCE(SUM(monthly_amount) FILTER (WHERE status = 'PENDENTE'), 0) AS pending_amount,
                   COALESCE(SUM(monthly_amount) FILTER (WHERE status = 'ERRO'), 0) AS error_amount,
                   COALESCE(SUM(monthly_amount) FILTER (WHERE status = 'CANCELADO'), 0) AS canceled_amount
            FROM commissions {FILTERS}
            "#
        );
        let summary = sqlx::query_as::<_, PaymentSummary>(&sql)
            .bind(visible_recipients)
            .bind(filters.status)
            .bind(filters.recipient_user_id)
            .bind(filters.investment_id)
            .bind(filters.month_from)
            .bind(filters.month_to)
            .fetch_one(&self.pool)
            .await?;
        Ok(summary)
    }

    /// Parcelas com investidor, destinatário e PIX para o arquivo de pagamento.
    pub async fn export_rows(
        &self,
        visible_recipients: Option<Vec<Uuid>>,
        filters: &CommissionFilters,
    ) -> Result<Vec<CommissionExportRow>, AppError> {
        let sql = format!(
            r#"
            SELECT c.id,
                   investor.full_name AS investor_name,
                   i.invested_amount,
                   recipient.full_name AS recipient_name,
                   c.recipient_role,
                   c.installment_number,
                   c.total_installments,
                   c.monthly_amount,
                   recipient.pix_key_type,
                   recipient.pix,
                   c.due_date,
                   c.status,
                   c.payment_date
            FROM (SELECT * FROM commissions {FILTERS}) c
            JOIN investments i ON i.id = c.investment_id
            JOIN users investor ON investor.id = i.investor_user_id
            JOIN users recipient ON recipient.id = c.recipient_user_id
            ORDER BY c.payment_month ASC, c.recipient_role ASC, recipient.full_name ASC, c.installment_number ASC
            "#
        );
        let rows = sqlx::query_as::<_, CommissionExportRow>(&sql)
            .bind(visible_recipients)
            .bind(filters.status)
            .bind(filters.recipient_user_id)
            .bind(filters.investment_id)
            .bind(filters.month_from)
            .bind(filters.month_to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Status atual das parcelas informadas, travadas para a importação.
    pub async fn statuses_by_ids<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<(Uuid, PaymentStatus)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (Uuid, PaymentStatus)>(
            "SELECT id, status FROM commissions WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn find<'e, E>(&self, executor: E, id: Uuid) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Commission>("SELECT * FROM commissions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::not_found("Comissão"))
    }

    /// Só status e data de pagamento mudam; valores nunca são editados.
    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: PaymentStatus,
        payment_date: Option<NaiveDate>,
    ) -> Result<Commission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Commission>(
            r#"
            UPDATE commissions
            SET status = $2, payment_date = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(payment_date)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Comissão"))
    }

    pub async fn count_paid_for_investment<'e, E>(&self, executor: E, investment_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM commissions WHERE investment_id = $1 AND status = 'PAGO'",
        )
        .bind(investment_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}

// src/db/remuneracao_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        commission::{PaymentStatus, PaymentStatusUpdate, PaymentSummary},
        remuneracao::{NewRemuneracao, Remuneracao, RemuneracaoFilters},
    },
};

const INSERT_CHUNK: usize = 1000;

const FILTERS: &str = r#"
    WHERE ($1::uuid[] IS NULL OR user_id = ANY($1))
      AND ($2::payment_status IS NULL OR status = $2)
      AND ($3::uuid IS NULL OR investment_id = $3)
      AND ($4::uuid IS NULL OR user_id = $4)
      AND ($5::date IS NULL OR data_vencimento >= $5)
      AND ($6::date IS NULL OR data_vencimento <= $6)
      AND ($7::text IS NULL OR nome_investidor ILIKE '%' || $7 || '%')
"#;

#[derive(Clone)]
pub struct RemuneracaoRepository {
    pool: PgPool,
}

impl RemuneracaoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere ignorando `id_pagamento` já existente. Devolve quantas entraram.
    pub async fn insert_many(&self, conn: &mut PgConnection, rows: &[NewRemuneracao]) -> Result<u64, AppError> {
        let mut inserted = 0;

        for chunk in rows.chunks(INSERT_CHUNK) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO remuneracoes (id_pagamento, investment_id, user_id, nome_investidor, \
                 debenture, serie, valor_remuneracao, installment_number, total_installments, \
                 data_vencimento, pix) ",
            );
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(&row.id_pagamento)
                    .push_bind(row.investment_id)
                    .push_bind(row.user_id)
                    .push_bind(&row.nome_investidor)
                    .push_bind(&row.debenture)
                    .push_bind(&row.serie)
                    .push_bind(row.valor_remuneracao)
                    .push_bind(row.installment_number)
                    .push_bind(row.total_installments)
                    .push_bind(row.data_vencimento)
                    .push_bind(&row.pix);
            });
            builder.push(" ON CONFLICT (id_pagamento) DO NOTHING");

            inserted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        Ok(inserted)
    }

    pub async fn existing_payment_ids<'e, E>(&self, executor: E) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id_pagamento FROM remuneracoes")
            .fetch_all(executor)
            .await?;
        Ok(ids)
    }

    pub async fn list(
        &self,
        visible_users: Option<Vec<Uuid>>,
        filters: &RemuneracaoFilters,
    ) -> Result<Vec<Remuneracao>, AppError> {
        let sql = format!(
            "SELECT * FROM remuneracoes {FILTERS} ORDER BY data_vencimento ASC, nome_investidor ASC"
        );
        let rows = sqlx::query_as::<_, Remuneracao>(&sql)
            .bind(visible_users)
            .bind(filters.status)
            .bind(filters.investment_id)
            .bind(filters.user_id)
            .bind(filters.due_from)
            .bind(filters.due_to)
            .bind(filters.search.as_deref().filter(|s| !s.trim().is_empty()))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn summary(
        &self,
        visible_users: Option<Vec<Uuid>>,
        filters: &RemuneracaoFilters,
    ) -> Result<PaymentSummary, AppError> {
        let sql = format!(
            r#"
            SELECT COUNT(*) AS total_records,
                   COALESCE(SUM(valor_remuneracao), 0) AS total_amount,
                   COALESCE(SUM(valor_remuneracao) FILTER (WHERE status = 'PAGO'), 0) AS paid_amount,
                   COALESCE(SUM(valor_remuneracao) FILTER (WHERE status = 'PENDENTE'), 0) AS pending_amount,
                   COALESCE(SUM(valor_remuneracao) FILTER (WHERE status = 'ERRO'), 0) AS error_amount,
                   COALESCE(SUM(valor_remuneracao) FILTER (WHERE status = 'CANCELADO'), 0) AS canceled_amount
            FROM remuneracoes {FILTERS}
            "#
        );
        let summary = sqlx::query_as::<_, PaymentSummary>(&sql)
            .bind(visible_users)
            .bind(filters.status)
            .bind(filters.investment_id)
            .bind(filters.user_id)
            .bind(filters.due_from)
            .bind(filters.due_to)
            .bind(filters.search.as_deref().filter(|s| !s.trim().is_empty()))
            .fetch_one(&self.pool)
            .await?;
        Ok(summary)
    }

    /// Status atual de cada id informado (ids desconhecidos simplesmente não voltam).
    pub async fn statuses_by_payment_id<'e, E>(
        &self,
        executor: E,
        ids: &[String],
    ) -> Result<Vec<(String, PaymentStatus)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, (String, PaymentStatus)>(
            "SELECT id_pagamento, status FROM remuneracoes WHERE id_pagamento = ANY($1) FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Atualiza apenas status e data de pagamento.
    pub async fn apply_status_update<'e, E>(
        &self,
        executor: E,
        update: &PaymentStatusUpdate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE remuneracoes
            SET status = $2, data_pagamento = $3, updated_at = NOW()
            WHERE id_pagamento = $1
            "#,
        )
        .bind(&update.payment_id)
        .bind(update.status)
        .bind(update.payment_date)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn count_paid_for_investment<'e, E>(&self, executor: E, investment_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM remuneracoes WHERE investment_id = $1 AND status = 'PAGO'",
        )
        .bind(investment_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}

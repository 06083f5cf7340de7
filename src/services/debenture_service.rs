// src/services/debenture_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{DebentureRepository, InvestmentRepository},
    models::{
        audit::{AuditAction, NewAuditEntry},
        auth::AuthContext,
        debenture::{
            CreateDebenturePayload, CreateSeriesPayload, DebentureLifecycle, DebentureView, Series,
            UpdateDebenturePayload, UpdateSeriesPayload,
        },
    },
    services::{
        access::{require_global, Action},
        AuditService,
    },
};

#[derive(Clone)]
pub struct DebentureService {
    debenture_repo: DebentureRepository,
    investment_repo: InvestmentRepository,
    audit: AuditService,
    pool: PgPool,
}

impl DebentureService {
    pub fn new(
        debenture_repo: DebentureRepository,
        investment_repo: InvestmentRepository,
        audit: AuditService,
        pool: PgPool,
    ) -> Self {
        Self { debenture_repo, investment_repo, audit, pool }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // --- DEBÊNTURES ---

    pub async fn list_debentures(&self) -> Result<Vec<DebentureView>, AppError> {
        let today = Self::today();
        Ok(self
            .debenture_repo
            .list_debentures()
            .await?
            .into_iter()
            .map(|d| DebentureView::new(d, today))
            .collect())
    }

    pub async fn get_debenture(&self, id: Uuid) -> Result<DebentureView, AppError> {
        let debenture = self.debenture_repo.find_debenture(&self.pool, id).await?;
        Ok(DebentureView::new(debenture, Self::today()))
    }

    pub async fn create_debenture(
        &self,
        ctx: &AuthContext,
        payload: CreateDebenturePayload,
    ) -> Result<DebentureView, AppError> {
        require_global(ctx, Action::ManageCatalog)?;
        payload.validate()?;
        ensure_dates(payload.emission_date, payload.maturity_date)?;

        let debenture = self
            .debenture_repo
            .create_debenture(&self.pool, &payload, ctx.user_id)
            .await?;

        tracing::info!("✅ Debênture '{}' criada", debenture.name);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Create, "DEBENTURE", "Debênture criada")
                    .resource(debenture.id, debenture.name.clone())
                    .new_values(serde_json::to_value(&debenture).unwrap_or_default()),
            )
            .await;

        Ok(DebentureView::new(debenture, Self::today()))
    }

    pub async fn update_debenture(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        payload: UpdateDebenturePayload,
    ) -> Result<DebentureView, AppError> {
        require_global(ctx, Action::ManageCatalog)?;
        payload.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = self.debenture_repo.find_debenture(&mut *tx, id).await?;
        ensure_dates(
            payload.emission_date.unwrap_or(current.emission_date),
            payload.maturity_date.unwrap_or(current.maturity_date),
        )?;
        let updated = self.debenture_repo.update_debenture(&mut *tx, id, &payload).await?;
        tx.commit().await?;

        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Update, "DEBENTURE", "Debênture atualizada")
                    .resource(updated.id, updated.name.clone())
                    .old_values(serde_json::to_value(&current).unwrap_or_default())
                    .new_values(serde_json::to_value(&updated).unwrap_or_default()),
            )
            .await;

        Ok(DebentureView::new(updated, Self::today()))
    }

    pub async fn delete_debenture(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        require_global(ctx, Action::ManageCatalog)?;

        let mut tx = self.pool.begin().await?;
        let current = self.debenture_repo.find_debenture(&mut *tx, id).await?;
        let active_series = self.debenture_repo.count_active_series(&mut *tx, id).await?;
        if active_series > 0 {
            return Err(AppError::Conflict(format!(
                "A debênture possui {} série(s) ativa(s). Exclua as séries primeiro.",
                active_series
            )));
        }
        self.debenture_repo.soft_delete_debenture(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Debênture {} excluída", id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Delete, "DEBENTURE", "Debênture excluída")
                    .resource(current.id, current.name.clone()),
            )
            .await;

        Ok(())
    }

    // --- SÉRIES ---

    pub async fn list_series(&self, debenture_id: Uuid) -> Result<Vec<Series>, AppError> {
        self.debenture_repo.find_debenture(&self.pool, debenture_id).await?;
        self.debenture_repo.list_series(debenture_id).await
    }

    pub async fn create_series(
        &self,
        ctx: &AuthContext,
        debenture_id: Uuid,
        payload: CreateSeriesPayload,
    ) -> Result<Series, AppError> {
        require_global(ctx, Action::ManageCatalog)?;
        payload.validate()?;
        ensure_investment_bounds(payload.minimum_investment, payload.maximum_investment)?;

        let mut tx = self.pool.begin().await?;
        let debenture = self.debenture_repo.find_debenture(&mut *tx, debenture_id).await?;
        if debenture.lifecycle(Self::today()) == DebentureLifecycle::Expired {
            return Err(AppError::rule("Não é possível criar séries em uma debênture vencida."));
        }
        let series = self.debenture_repo.create_series(&mut *tx, debenture_id, &payload).await?;
        tx.commit().await?;

        tracing::info!("✅ Série {} criada na debênture '{}'", series.series_code, debenture.name);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Create, "SERIES", "Série criada")
                    .resource(series.id, format!("{} - {}", debenture.name, series.series_code))
                    .new_values(serde_json::to_value(&series).unwrap_or_default()),
            )
            .await;

        Ok(series)
    }

    pub async fn update_series(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        payload: UpdateSeriesPayload,
    ) -> Result<Series, AppError> {
        require_global(ctx, Action::ManageCatalog)?;
        payload.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = self.debenture_repo.lock_series(&mut *tx, id).await?;

        ensure_investment_bounds(
            payload.minimum_investment.unwrap_or(current.minimum_investment),
            payload.maximum_investment.or(current.maximum_investment),
        )?;
        if let Some(max_total) = payload.max_total_captation {
            if max_total < current.current_captation {
                return Err(AppError::rule(format!(
                    "A captação máxima não pode ficar abaixo do já captado ({}).",
                    current.current_captation
                )));
            }
        }

        let updated = self.debenture_repo.update_series(&mut *tx, id, &payload).await?;
        tx.commit().await?;

        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Update, "SERIES", "Série atualizada")
                    .resource(updated.id, updated.series_code.clone())
                    .old_values(serde_json::to_value(&current).unwrap_or_default())
                    .new_values(serde_json::to_value(&updated).unwrap_or_default()),
            )
            .await;

        Ok(updated)
    }

    pub async fn delete_series(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        require_global(ctx, Action::ManageCatalog)?;

        let mut tx = self.pool.begin().await?;
        let current = self.debenture_repo.lock_series(&mut *tx, id).await?;
        let investments = self.investment_repo.count_by_series(&mut *tx, id).await?;
        if investments > 0 {
            return Err(AppError::Conflict(format!(
                "A série possui {} investimento(s) e não pode ser excluída.",
                investments
            )));
        }
        self.debenture_repo.soft_delete_series(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("🗑️ Série {} excluída", id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Delete, "SERIES", "Série excluída")
                    .resource(current.id, current.series_code.clone()),
            )
            .await;

        Ok(())
    }
}

fn ensure_dates(emission: NaiveDate, maturity: NaiveDate) -> Result<(), AppError> {
    if maturity <= emission {
        return Err(AppError::rule("A data de vencimento deve ser posterior à data de emissão."));
    }
    Ok(())
}

fn ensure_investment_bounds(minimum: Decimal, maximum: Option<Decimal>) -> Result<(), AppError> {
    if maximum.is_some_and(|max| max < minimum) {
        return Err(AppError::rule("O investimento máximo deve ser maior ou igual ao mínimo."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn maturity_must_follow_emission() {
        let emission = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(ensure_dates(emission, emission).is_err());
        assert!(ensure_dates(emission, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).is_ok());
    }

    #[test]
    fn maximum_investment_cannot_be_below_minimum() {
        assert!(ensure_investment_bounds(dec!(1000), Some(dec!(999))).is_err());
        assert!(ensure_investment_bounds(dec!(1000), Some(dec!(1000))).is_ok());
        assert!(ensure_investment_bounds(dec!(1000), None).is_ok());
    }
}

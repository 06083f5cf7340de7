// src/services/commission_service.rs

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CommissionRepository, UserRepository},
    models::{
        audit::{AuditAction, NewAuditEntry},
        auth::AuthContext,
        commission::{
            Commission, CommissionFilters, CommissionReport, ExportFile, ImportReport, PaymentStatus,
            PaymentSummary, UpdatePaymentStatusPayload,
        },
    },
    services::{
        access::{require_global, AccessGate, Action},
        commission_report::build_commission_report,
        load_tree,
        reconciliation::{build_report, export_commission_csv, parse_import, reconcile_import, COMMISSION_CSV},
        schedule::{commission_payment_id, parse_commission_payment_id},
        AuditService,
    },
};

const RESOURCE: &str = "COMMISSION";

#[derive(Clone)]
pub struct CommissionService {
    commission_repo: CommissionRepository,
    user_repo: UserRepository,
    audit: AuditService,
    pool: PgPool,
}

impl CommissionService {
    pub fn new(
        commission_repo: CommissionRepository,
        user_repo: UserRepository,
        audit: AuditService,
        pool: PgPool,
    ) -> Self {
        Self { commission_repo, user_repo, audit, pool }
    }

    async fn visible_recipients(&self, ctx: &AuthContext) -> Result<Option<Vec<Uuid>>, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        Ok(AccessGate::new(&tree).visible_users(ctx).user_ids())
    }

    pub async fn list(&self, ctx: &AuthContext, filters: &CommissionFilters) -> Result<Vec<Commission>, AppError> {
        let visible = self.visible_recipients(ctx).await?;
        self.commission_repo.list(visible, filters).await
    }

    pub async fn summary(&self, ctx: &AuthContext, filters: &CommissionFilters) -> Result<PaymentSummary, AppError> {
        let visible = self.visible_recipients(ctx).await?;
        self.commission_repo.summary(visible, filters).await
    }

    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        payload: UpdatePaymentStatusPayload,
    ) -> Result<Commission, AppError> {
        require_global(ctx, Action::UpdatePaymentStatus)?;

        let mut tx = self.pool.begin().await?;
        let current = self.commission_repo.find(&mut *tx, id).await?;
        current.status.ensure_transition(payload.status)?;

        let payment_date = resolve_payment_date(payload.status, payload.payment_date, Utc::now().date_naive());
        let updated = self
            .commission_repo
            .update_status(&mut *tx, id, payload.status, payment_date)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "🔄 Comissão {} ({}): {} -> {}",
            id,
            updated.recipient_role,
            current.status.as_str(),
            updated.status.as_str()
        );
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Update, RESOURCE, "Status da comissão alterado")
                    .resource(id, format!("Parcela {}/{}", updated.installment_number, updated.total_installments))
                    .old_values(serde_json::json!({
                        "status": current.status,
                        "paymentDate": current.payment_date,
                    }))
                    .new_values(serde_json::json!({
                        "status": updated.status,
                        "paymentDate": updated.payment_date,
                    })),
            )
            .await;

        Ok(updated)
    }

    pub async fn report(&self, ctx: &AuthContext, filters: &CommissionFilters) -> Result<CommissionReport, AppError> {
        let rows = self.list(ctx, filters).await?;
        Ok(build_commission_report(&rows, Utc::now().date_naive()))
    }

    // --- CSV ---

    pub async fn export(&self, ctx: &AuthContext, filters: &CommissionFilters) -> Result<ExportFile, AppError> {
        let visible = self.visible_recipients(ctx).await?;
        let rows = self.commission_repo.export_rows(visible, filters).await?;
        if rows.is_empty() {
            return Err(AppError::rule("Nenhuma comissão encontrada para exportar."));
        }

        let csv_content = export_commission_csv(&rows)?;
        let total_amount: Decimal = rows.iter().map(|r| r.monthly_amount).sum();
        let file = ExportFile {
            csv_content,
            file_name: export_file_name(Utc::now().date_naive()),
            total_records: rows.len(),
            total_amount,
        };

        tracing::info!("📤 {} comissões exportadas ({})", file.total_records, file.file_name);
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Export,
                    RESOURCE,
                    format!("Exportação de {} comissões", file.total_records),
                )
                .resource(&file.file_name, file.file_name.clone()),
            )
            .await;

        Ok(file)
    }

    /// Aplica status e data de pagamento do arquivo de comissões. Ids que não
    /// seguem o formato `COM-<uuid>` caem no mesmo erro de id desconhecido.
    pub async fn import(&self, ctx: &AuthContext, content: &str) -> Result<ImportReport, AppError> {
        require_global(ctx, Action::ImportPayments)?;

        let parsed = parse_import(content, &COMMISSION_CSV, Utc::now().date_naive())?;
        let ids: Vec<Uuid> = parsed
            .rows
            .iter()
            .filter_map(|r| parse_commission_payment_id(&r.update.payment_id))
            .collect();

        let mut tx = self.pool.begin().await?;
        let current: HashMap<String, PaymentStatus> = self
            .commission_repo
            .statuses_by_ids(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|(id, status)| (commission_payment_id(id), status))
            .collect();

        let (updates, rejected) = reconcile_import(&parsed, &current, &COMMISSION_CSV);
        let mut errors = parsed.errors.clone();
        errors.extend(rejected);

        let mut success_count = 0;
        for update in &updates {
            let Some(id) = parse_commission_payment_id(&update.payment_id) else {
                continue;
            };
            self.commission_repo
                .update_status(&mut *tx, id, update.status, update.payment_date)
                .await?;
            success_count += 1;
        }
        tx.commit().await?;

        let report = build_report(parsed.total, success_count, errors);
        tracing::info!(
            "📥 Importação de comissões: {} linhas, {} atualizadas, {} com erro",
            report.total_processed,
            report.success_count,
            report.error_count
        );
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Import,
                    RESOURCE,
                    format!(
                        "Importação CSV de comissões: {} atualizadas, {} com erro",
                        report.success_count, report.error_count
                    ),
                )
                .new_values(serde_json::to_value(&report).unwrap_or_default()),
            )
            .await;

        Ok(report)
    }
}

pub(crate) fn export_file_name(today: NaiveDate) -> String {
    format!("comissoes_{}.csv", today.format("%Y-%m-%d"))
}

/// PAGO sem data assume hoje; qualquer outro status limpa a data.
pub(crate) fn resolve_payment_date(
    status: PaymentStatus,
    informed: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<NaiveDate> {
    match status {
        PaymentStatus::Pago => Some(informed.unwrap_or(today)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_date_only_sticks_to_paid_rows() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let informed = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();

        assert_eq!(resolve_payment_date(PaymentStatus::Pago, None, today), Some(today));
        assert_eq!(resolve_payment_date(PaymentStatus::Pago, Some(informed), today), Some(informed));
        assert_eq!(resolve_payment_date(PaymentStatus::Erro, Some(informed), today), None);
        assert_eq!(resolve_payment_date(PaymentStatus::Pendente, None, today), None);
    }

    #[test]
    fn export_file_is_named_after_the_day() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        assert_eq!(export_file_name(today), "comissoes_2025-07-03.csv");
    }
}
